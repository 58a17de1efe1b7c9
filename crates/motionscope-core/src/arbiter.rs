#![forbid(unsafe_code)]

//! Source arbitration: many raw channels in, one sample stream out.
//!
//! Wheel deltas, document and element scroll positions, touch and pointer
//! contacts, and two kinds of position polling all describe the same user
//! intent. [`SourceArbiter`] turns each raw observation into at most one
//! [`Sample`] and drops the observations that add nothing.
//!
//! # Rules
//!
//! - Position-reporting sources keep a per-`(source, region)` baseline. The
//!   delta is `current - baseline`, or `baseline - current` for contact
//!   sources (a finger dragging up scrolls content down).
//! - The baseline is overwritten after every observation, accepted or not.
//! - The first observation of a key only establishes its baseline.
//! - Non-wheel deltas with both components under the noise floor are dropped.
//! - Non-wheel observations within the debounce window of the last wheel
//!   event are echoes of that wheel event and are dropped.
//! - While tracking is disabled, nothing is emitted, but baselines still move.
//!
//! # Invariants
//!
//! 1. Wheel samples are never noise-filtered.
//! 2. A baseline always equals the last observed position for its key.

use ahash::AHashMap;
use tracing::trace;
use web_time::{Duration, Instant};

use crate::event::Point;
use crate::sample::{Sample, Source};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Noise and echo thresholds for source arbitration.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbiterConfig {
    /// Per-axis magnitude below which non-wheel deltas are noise (default: 2.0px).
    pub noise_floor: f64,
    /// Window after a wheel event in which other sources are echoes (default: 50ms).
    pub wheel_debounce: Duration,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            noise_floor: 2.0,
            wheel_debounce: Duration::from_millis(50),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Identifies one position baseline: a source plus a region or contact id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaselineKey {
    pub source: Source,
    pub id: u32,
}

impl BaselineKey {
    #[must_use]
    pub const fn new(source: Source, id: u32) -> Self {
        Self { source, id }
    }
}

/// Why an observation produced no sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    /// Tracking is disabled by a jump cooldown.
    Disabled,
    /// Both components under the noise floor.
    Noise,
    /// Arrived within the debounce window of a wheel event.
    WheelEcho,
}

/// Result of feeding one raw observation to the arbiter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arbitration {
    Accepted(Sample),
    /// First sighting of a key; its baseline is now set.
    Baselined,
    Suppressed(Suppression),
}

impl Arbitration {
    /// The accepted sample, if any.
    #[must_use]
    pub fn sample(self) -> Option<Sample> {
        match self {
            Self::Accepted(s) => Some(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// SourceArbiter
// ---------------------------------------------------------------------------

/// Reconciles every raw input channel into one normalized sample stream.
#[derive(Debug, Clone, Default)]
pub struct SourceArbiter {
    config: ArbiterConfig,
    baselines: AHashMap<BaselineKey, Point>,
    last_wheel: Option<Instant>,
}

impl SourceArbiter {
    #[must_use]
    pub fn new(config: ArbiterConfig) -> Self {
        Self {
            config,
            baselines: AHashMap::new(),
            last_wheel: None,
        }
    }

    /// Arbitrate a wheel delta. Wheel deltas are trusted as-is.
    ///
    /// The wheel time is recorded even while disabled so that position echoes
    /// of a suppressed wheel event stay suppressed too.
    pub fn wheel(&mut self, dx: f64, dy: f64, disabled: bool, now: Instant) -> Arbitration {
        self.last_wheel = Some(now);
        if disabled {
            trace!(dx, dy, "wheel suppressed while tracking disabled");
            return Arbitration::Suppressed(Suppression::Disabled);
        }
        Arbitration::Accepted(Sample::new(dx, dy, Source::Wheel, now))
    }

    /// Arbitrate a position observation for a non-wheel source.
    pub fn observe(
        &mut self,
        source: Source,
        id: u32,
        position: Point,
        disabled: bool,
        now: Instant,
    ) -> Arbitration {
        let key = BaselineKey::new(source, id);
        let Some(baseline) = self.baselines.insert(key, position) else {
            return Arbitration::Baselined;
        };

        let (dx, dy) = if source.is_contact() {
            (baseline.x - position.x, baseline.y - position.y)
        } else {
            (position.x - baseline.x, position.y - baseline.y)
        };

        if disabled {
            trace!(%source, dx, dy, "observation suppressed while tracking disabled");
            return Arbitration::Suppressed(Suppression::Disabled);
        }
        if dx.abs() < self.config.noise_floor && dy.abs() < self.config.noise_floor {
            return Arbitration::Suppressed(Suppression::Noise);
        }
        if self.within_wheel_window(now) {
            trace!(%source, dx, dy, "observation dropped as wheel echo");
            return Arbitration::Suppressed(Suppression::WheelEcho);
        }
        Arbitration::Accepted(Sample::new(dx, dy, source, now))
    }

    /// Drop the baseline of one key, e.g. when a contact lifts.
    pub fn forget(&mut self, source: Source, id: u32) {
        self.baselines.remove(&BaselineKey::new(source, id));
    }

    /// Drop every baseline of one source. Returns how many were dropped.
    pub fn forget_source(&mut self, source: Source) -> usize {
        let before = self.baselines.len();
        self.baselines.retain(|key, _| key.source != source);
        before - self.baselines.len()
    }

    /// Drop every baseline. The next observation of each key re-baselines at
    /// whatever position it reports.
    pub fn clear_baselines(&mut self) {
        self.baselines.clear();
    }

    /// Current baseline of a key.
    #[must_use]
    pub fn baseline(&self, source: Source, id: u32) -> Option<Point> {
        self.baselines.get(&BaselineKey::new(source, id)).copied()
    }

    /// Number of tracked baselines.
    #[inline]
    #[must_use]
    pub fn baseline_count(&self) -> usize {
        self.baselines.len()
    }

    /// Time of the last wheel event.
    #[inline]
    #[must_use]
    pub fn last_wheel(&self) -> Option<Instant> {
        self.last_wheel
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ArbiterConfig) {
        self.config = config;
    }

    fn within_wheel_window(&self, now: Instant) -> bool {
        self.last_wheel
            .is_some_and(|w| now.saturating_duration_since(w) < self.config.wheel_debounce)
    }
}
