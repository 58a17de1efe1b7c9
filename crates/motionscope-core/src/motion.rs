#![forbid(unsafe_code)]

//! Motion accumulation and end-of-motion bookkeeping.
//!
//! A *motion* is a contiguous run of accepted samples of one kind, bounded by
//! quiet periods. [`MotionAccumulator`] owns the in-flight [`MotionState`], a
//! lifetime [`Totals`] counter, and a bounded history of finished motions.
//!
//! The accumulator does not own its quiet-period timer. The caller re-arms a
//! deadline at `now + quiet_period` after every [`update`](MotionAccumulator::update)
//! and calls [`finish`](MotionAccumulator::finish) when it fires.
//!
//! # Invariants
//!
//! 1. `accumulated_x/y` are signed sums of the current motion only.
//! 2. `Totals` are absolute sums over every scroll sample since the last
//!    [`reset_totals`](MotionAccumulator::reset_totals), independent of motions.
//! 3. A finished motion's duration is `last_event - start`, never including
//!    the trailing quiet period.
//! 4. Interrupted motions never reach the history.
//! 5. History holds at most `history_capacity` entries, newest first.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;
use web_time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timing and capacity for motion tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionConfig {
    /// Silence after which a motion is finished (default: 500ms).
    pub quiet_period: Duration,
    /// Finished motions retained (default: 20).
    pub history_capacity: usize,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(500),
            history_capacity: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What a motion is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionKind {
    #[default]
    None,
    Scroll,
    Zoom,
    Move,
}

impl MotionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Scroll => "scroll",
            Self::Zoom => "zoom",
            Self::Move => "move",
        }
    }
}

/// The single in-flight motion of one view.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionState {
    pub kind: MotionKind,
    pub start: Option<Instant>,
    pub last_event: Option<Instant>,
    pub accumulated_x: f64,
    pub accumulated_y: f64,
    pub active: bool,
}

impl MotionState {
    /// Time from start to the last accepted sample.
    #[must_use]
    pub fn span(&self) -> Duration {
        match (self.start, self.last_event) {
            (Some(start), Some(last)) => last.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }

    /// Time from start to `now`, for live progress displays.
    #[must_use]
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.start
            .map_or(Duration::ZERO, |start| now.saturating_duration_since(start))
    }
}

/// Lifetime absolute scroll totals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub x: f64,
    pub y: f64,
}

/// Snapshot of a finished motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    pub kind: MotionKind,
    pub accumulated_x: f64,
    pub accumulated_y: f64,
    /// Zoom level at the end, for zoom motions.
    pub zoom_level: Option<f64>,
    pub duration: Duration,
    pub ended_at: Instant,
}

/// What an [`update`](MotionAccumulator::update) did to the motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionUpdate {
    /// A new motion began with this sample.
    Started,
    /// The sample extended the active motion.
    Continued,
    /// A motion of another kind was finished and a new one began.
    Switched(HistoryEntry),
}

impl MotionUpdate {
    #[must_use]
    pub const fn started(&self) -> bool {
        matches!(self, Self::Started | Self::Switched(_))
    }
}

// ---------------------------------------------------------------------------
// MotionAccumulator
// ---------------------------------------------------------------------------

/// Per-view motion state, totals and history.
#[derive(Debug, Clone, Default)]
pub struct MotionAccumulator {
    config: MotionConfig,
    state: MotionState,
    totals: Totals,
    history: VecDeque<HistoryEntry>,
}

impl MotionAccumulator {
    #[must_use]
    pub fn new(config: MotionConfig) -> Self {
        let history = VecDeque::with_capacity(config.history_capacity);
        Self {
            config,
            state: MotionState::default(),
            totals: Totals::default(),
            history,
        }
    }

    /// Fold one accepted sample into the motion of `kind`.
    ///
    /// Starts a motion when idle. When a motion of a different kind is active
    /// it is finished first (with history) and a fresh one starts.
    pub fn update(&mut self, kind: MotionKind, dx: f64, dy: f64, now: Instant) -> MotionUpdate {
        let mut outcome = MotionUpdate::Continued;
        if self.state.active
            && self.state.kind != kind
            && let Some(entry) = self.finish(None)
        {
            outcome = MotionUpdate::Switched(entry);
        }
        if !self.state.active {
            self.state = MotionState {
                kind,
                start: Some(now),
                last_event: Some(now),
                accumulated_x: 0.0,
                accumulated_y: 0.0,
                active: true,
            };
            if outcome == MotionUpdate::Continued {
                outcome = MotionUpdate::Started;
            }
        }

        self.state.accumulated_x += dx;
        self.state.accumulated_y += dy;
        self.state.last_event = Some(now);
        if kind == MotionKind::Scroll {
            self.totals.x += dx.abs();
            self.totals.y += dy.abs();
        }
        outcome
    }

    /// Finish the active motion after its quiet period and record it.
    ///
    /// `zoom_level` is stored with the entry when given. Returns `None` when
    /// nothing was active.
    pub fn finish(&mut self, zoom_level: Option<f64>) -> Option<HistoryEntry> {
        if !self.state.active {
            return None;
        }
        let ended_at = self.state.last_event?;
        let entry = HistoryEntry {
            kind: self.state.kind,
            accumulated_x: self.state.accumulated_x,
            accumulated_y: self.state.accumulated_y,
            zoom_level,
            duration: self.state.span(),
            ended_at,
        };
        debug!(
            kind = entry.kind.as_str(),
            dx = entry.accumulated_x,
            dy = entry.accumulated_y,
            duration_ms = entry.duration.as_millis() as u64,
            "motion finished"
        );
        self.state = MotionState::default();
        if self.config.history_capacity > 0 {
            self.history.push_front(entry);
            self.history.truncate(self.config.history_capacity);
        }
        Some(entry)
    }

    /// Drop the active motion without recording it. Returns whether one was active.
    pub fn interrupt(&mut self) -> bool {
        let was_active = self.state.active;
        if was_active {
            debug!(kind = self.state.kind.as_str(), "motion interrupted");
        }
        self.state = MotionState::default();
        was_active
    }

    /// Zero the lifetime totals. The in-flight motion is untouched.
    pub fn reset_totals(&mut self) {
        self.totals = Totals::default();
    }

    /// Forget all history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &MotionState {
        &self.state
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.active
    }

    #[inline]
    #[must_use]
    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Finished motions, newest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    /// The most recently finished motion.
    #[must_use]
    pub fn last_entry(&self) -> Option<&HistoryEntry> {
        self.history.front()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &MotionConfig {
        &self.config
    }
}
