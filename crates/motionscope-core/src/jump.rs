#![forbid(unsafe_code)]

//! Jump detection: telling programmatic teleports from real gestures.
//!
//! Anchor navigation, `scrollTo` and similar calls move a scroll position by
//! hundreds of pixels in one step. Such a step must not be counted as a user
//! gesture, and nothing that was in flight when it happened may be trusted.
//!
//! [`JumpDetector`] only decides and remembers; invalidating motions, timers
//! and direction state is the session's job when [`JumpDetector::raise`]
//! reports a new jump.
//!
//! # Invariants
//!
//! 1. While `now < disabled_until`, tracking is disabled.
//! 2. A motion whose start predates the last jump is stale forever, even after
//!    the cooldown has elapsed.

use serde::{Deserialize, Serialize};
use tracing::debug;
use web_time::{Duration, Instant};

use crate::sample::{Sample, Source};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds for jump detection.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpConfig {
    /// Per-axis delta above which a sample is a jump (default: 500px).
    pub threshold: f64,
    /// How long tracking stays disabled after a jump (default: 300ms).
    pub cooldown: Duration,
    /// Whether wheel samples can be jumps too (default: true).
    pub include_wheel: bool,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            threshold: 500.0,
            cooldown: Duration::from_millis(300),
            include_wheel: true,
        }
    }
}

/// Verdict for a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accept,
    Jump,
}

/// Process-wide jump bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JumpGuard {
    pub last_jump: Option<Instant>,
    pub disabled_until: Option<Instant>,
}

// ---------------------------------------------------------------------------
// JumpDetector
// ---------------------------------------------------------------------------

/// Classifies samples and owns the [`JumpGuard`].
#[derive(Debug, Clone, Default)]
pub struct JumpDetector {
    config: JumpConfig,
    guard: JumpGuard,
}

impl JumpDetector {
    #[must_use]
    pub fn new(config: JumpConfig) -> Self {
        Self {
            config,
            guard: JumpGuard::default(),
        }
    }

    /// Classify a sample. Pure: recording the jump is [`raise`](Self::raise).
    #[must_use]
    pub fn classify(&self, sample: &Sample) -> Verdict {
        if sample.source == Source::Wheel && !self.config.include_wheel {
            return Verdict::Accept;
        }
        if sample.dx.abs() > self.config.threshold || sample.dy.abs() > self.config.threshold {
            Verdict::Jump
        } else {
            Verdict::Accept
        }
    }

    /// Record a jump at `now` and disable tracking. Returns the instant at
    /// which the cooldown ends.
    pub fn raise(&mut self, now: Instant) -> Instant {
        let until = now + self.config.cooldown;
        self.guard.last_jump = Some(now);
        self.guard.disabled_until = Some(until);
        let cooldown_ms = self.config.cooldown.as_millis() as u64;
        debug!(cooldown_ms, "jump detected, tracking disabled");
        until
    }

    /// Re-enable tracking if the cooldown has elapsed. Returns whether it did.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.guard.disabled_until {
            Some(until) if now >= until => {
                self.guard.disabled_until = None;
                debug!("jump cooldown elapsed, tracking re-enabled");
                true
            }
            _ => false,
        }
    }

    /// Whether tracking is disabled at `now`.
    #[inline]
    #[must_use]
    pub fn is_disabled(&self, now: Instant) -> bool {
        self.guard.disabled_until.is_some_and(|until| now < until)
    }

    /// Whether something that began at `start` predates the last jump.
    #[inline]
    #[must_use]
    pub fn predates_jump(&self, start: Instant) -> bool {
        self.guard.last_jump.is_some_and(|jump| start < jump)
    }

    #[inline]
    #[must_use]
    pub fn guard(&self) -> &JumpGuard {
        &self.guard
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &JumpConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: JumpConfig) {
        self.config = config;
    }
}
