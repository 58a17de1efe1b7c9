#![forbid(unsafe_code)]

//! Coarse, observational activity label.
//!
//! Drives a status label such as "scrolling" or "clicking". Every non-idle
//! [`set`](ActivityTracker::set) pushes the return-to-idle deadline out again.
//! Nothing else in the engine reads this state.

use serde::{Deserialize, Serialize};
use web_time::{Duration, Instant};

/// Default delay before a non-idle activity returns to idle (200ms).
pub const DEFAULT_IDLE_DELAY: Duration = Duration::from_millis(200);

/// What the user appears to be doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    #[default]
    Idle,
    Scrolling,
    Zooming,
    Pinching,
    Swiping,
    Moving,
    Clicking,
}

impl Activity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scrolling => "scrolling",
            Self::Zooming => "zooming",
            Self::Pinching => "pinching",
            Self::Swiping => "swiping",
            Self::Moving => "moving",
            Self::Clicking => "clicking",
        }
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holds the current activity and its idle deadline.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    idle_delay: Duration,
    current: Activity,
    idle_at: Option<Instant>,
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_DELAY)
    }
}

impl ActivityTracker {
    #[must_use]
    pub fn new(idle_delay: Duration) -> Self {
        Self {
            idle_delay,
            current: Activity::Idle,
            idle_at: None,
        }
    }

    /// Set the activity. Returns the new idle deadline for non-idle activities.
    pub fn set(&mut self, activity: Activity, now: Instant) -> Option<Instant> {
        self.current = activity;
        self.idle_at = (activity != Activity::Idle).then(|| now + self.idle_delay);
        self.idle_at
    }

    /// Return to idle if the deadline has passed. Returns whether it changed.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.idle_at {
            Some(at) if now >= at => {
                self.idle_at = None;
                let changed = self.current != Activity::Idle;
                self.current = Activity::Idle;
                changed
            }
            _ => false,
        }
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> Activity {
        self.current
    }

    #[inline]
    #[must_use]
    pub fn idle_at(&self) -> Option<Instant> {
        self.idle_at
    }

    #[inline]
    #[must_use]
    pub fn idle_delay(&self) -> Duration {
        self.idle_delay
    }
}
