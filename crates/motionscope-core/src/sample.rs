#![forbid(unsafe_code)]

//! Normalized delta observations.
//!
//! Every accepted input, whatever channel it came from, is reduced to a
//! [`Sample`] before it reaches the jump detector or any motion accumulator.
//! Samples live for one dispatch cycle and are never stored.

use serde::{Deserialize, Serialize};
use web_time::Instant;

/// Input channel a sample was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Wheel or trackpad delta. Authoritative, no noise floor.
    Wheel,
    /// Document scroll position.
    NativeScroll,
    /// Scroll position of an inner scrollable element.
    ElementScroll,
    /// Single-finger touch drag.
    Touch,
    /// Pointer contact drag (touch, pen or XR controller).
    PointerXr,
    /// Low-frequency position monitor.
    PositionMonitor,
    /// Per-frame position poll catching scrolls that fire no event.
    AggressivePoll,
}

impl Source {
    /// All sources, in arbitration priority order.
    pub const ALL: [Self; 7] = [
        Self::Wheel,
        Self::NativeScroll,
        Self::ElementScroll,
        Self::Touch,
        Self::PointerXr,
        Self::PositionMonitor,
        Self::AggressivePoll,
    ];

    /// Name used in log lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wheel => "wheel",
            Self::NativeScroll => "native-scroll",
            Self::ElementScroll => "element-scroll",
            Self::Touch => "touch",
            Self::PointerXr => "pointer-xr",
            Self::PositionMonitor => "position-monitor",
            Self::AggressivePoll => "aggressive-poll",
        }
    }

    /// Contact sources report finger position; content moves the other way.
    #[inline]
    #[must_use]
    pub const fn is_contact(self) -> bool {
        matches!(self, Self::Touch | Self::PointerXr)
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The subset of sources that report absolute scroll positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PositionSource {
    NativeScroll,
    ElementScroll,
    PositionMonitor,
    AggressivePoll,
}

impl From<PositionSource> for Source {
    fn from(value: PositionSource) -> Self {
        match value {
            PositionSource::NativeScroll => Self::NativeScroll,
            PositionSource::ElementScroll => Self::ElementScroll,
            PositionSource::PositionMonitor => Self::PositionMonitor,
            PositionSource::AggressivePoll => Self::AggressivePoll,
        }
    }
}

/// One normalized delta observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub dx: f64,
    pub dy: f64,
    pub source: Source,
    pub at: Instant,
}

impl Sample {
    #[must_use]
    pub const fn new(dx: f64, dy: f64, source: Source, at: Instant) -> Self {
        Self { dx, dy, source, at }
    }

    /// Largest absolute component.
    #[inline]
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.dx.abs().max(self.dy.abs())
    }

    /// Which axes this sample moves along.
    #[must_use]
    pub fn axes(&self) -> AxisUse {
        AxisUse::of(self.dx, self.dy)
    }
}

/// Which axes a delta uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisUse {
    None,
    XOnly,
    YOnly,
    Both,
}

impl AxisUse {
    #[must_use]
    pub fn of(dx: f64, dy: f64) -> Self {
        match (dx != 0.0, dy != 0.0) {
            (false, false) => Self::None,
            (true, false) => Self::XOnly,
            (false, true) => Self::YOnly,
            (true, true) => Self::Both,
        }
    }
}

/// `-1`, `0` or `1` by the sign of `d`. Zero and NaN map to `0`.
#[inline]
#[must_use]
pub fn sign(d: f64) -> i8 {
    if d > 0.0 {
        1
    } else if d < 0.0 {
        -1
    } else {
        0
    }
}
