#![forbid(unsafe_code)]

//! Multi-touch and trackpad gesture recognition.
//!
//! [`GestureRecognizer`] runs beside the sample pipeline and looks at raw
//! touch lists and wheel events directly. It reports a [`GestureReport`]:
//! the current [`Gesture`], finger count, pinch multiplier and the last swipe.
//!
//! # State Machine
//!
//! ```text
//! idle ── touch start ──> touching(n)
//!   touching(2)  ── scale crosses band ──> pinch in / pinch out
//!   touching(2)  ── centroid moves, scale ~1 ──> 2-finger scroll
//!   touching(3+) ── centroid travels past swipe threshold ──> swipe
//!   any ── all fingers lifted, reset delay ──> idle
//! ```
//!
//! Ctrl-wheel events emulate pinches; plain wheel events are trackpad
//! two-finger scrolls.
//!
//! # Invariants
//!
//! 1. Inside the hysteresis band (`pinch_in_below..=pinch_out_above`) the
//!    pinch classification never changes.
//! 2. A swipe is measured from the touch-start centroid, not the last sample.
//! 3. The pinch scale is clamped for wheel emulation and reset to 1.0 when
//!    the previous pinch wheel is older than the pinch-wheel timeout.
//! 4. Reset clears the gesture and finger count but keeps the last pinch
//!    scale and swipe so they stay visible.
//!
//! # Failure Modes
//!
//! - Two fingers starting at the same spot give an initial distance of zero;
//!   pinch scale is not updated until a later touch start re-measures it.

use serde::{Deserialize, Serialize};
use web_time::{Duration, Instant};

use crate::activity::Activity;
use crate::event::{Point, TouchInput, TouchPhase, WheelInput};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds for gesture recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Scale above which a two-finger move is a pinch out (default: 1.05).
    pub pinch_out_above: f64,
    /// Scale below which a two-finger move is a pinch in (default: 0.95).
    pub pinch_in_below: f64,
    /// `|scale - 1|` under which two fingers may be scrolling (default: 0.1).
    pub scroll_scale_tolerance: f64,
    /// Per-sample centroid travel for a two-finger scroll (default: 5px).
    pub two_finger_scroll_threshold: f64,
    /// Centroid travel since touch start for a swipe (default: 30px).
    pub swipe_threshold: f64,
    /// Gap after which a ctrl-wheel starts a new pinch (default: 500ms).
    pub pinch_wheel_timeout: Duration,
    /// Scale change per wheel pixel (default: 0.01).
    pub wheel_sensitivity: f64,
    /// Lowest wheel-emulated scale (default: 0.1).
    pub min_scale: f64,
    /// Highest wheel-emulated scale (default: 10.0).
    pub max_scale: f64,
    /// Inactivity before the gesture label clears (default: 300ms).
    pub reset_delay: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_out_above: 1.05,
            pinch_in_below: 0.95,
            scroll_scale_tolerance: 0.1,
            two_finger_scroll_threshold: 5.0,
            swipe_threshold: 30.0,
            pinch_wheel_timeout: Duration::from_millis(500),
            wheel_sensitivity: 0.01,
            min_scale: 0.1,
            max_scale: 10.0,
            reset_delay: Duration::from_millis(300),
        }
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Screen direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinal {
    Up,
    Down,
    Left,
    Right,
}

impl Cardinal {
    /// Dominant direction of a displacement. Ties go to the horizontal axis.
    #[must_use]
    pub fn dominant(dx: f64, dy: f64) -> Self {
        if dy.abs() > dx.abs() {
            if dy > 0.0 { Self::Down } else { Self::Up }
        } else if dx > 0.0 {
            Self::Right
        } else {
            Self::Left
        }
    }

    /// Dominant direction of a swipe. Ties go to the vertical axis.
    #[must_use]
    pub fn of_swipe(dx: f64, dy: f64) -> Self {
        if dx.abs() > dy.abs() {
            if dx > 0.0 { Self::Right } else { Self::Left }
        } else if dy > 0.0 {
            Self::Down
        } else {
            Self::Up
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    #[must_use]
    pub const fn arrow(self) -> &'static str {
        match self {
            Self::Up => "↑",
            Self::Down => "↓",
            Self::Left => "←",
            Self::Right => "→",
        }
    }
}

/// A completed multi-finger swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swipe {
    pub fingers: usize,
    pub direction: Cardinal,
}

impl std::fmt::Display for Swipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}f {}", self.fingers, self.direction.as_str())
    }
}

/// Current gesture classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "gesture", rename_all = "snake_case")]
pub enum Gesture {
    /// Neutral, shown as `-`.
    #[default]
    None,
    /// One finger down.
    Touch,
    /// Two fingers down, not yet a pinch or a scroll.
    PinchCandidate,
    /// Three or more fingers down, not yet a swipe.
    MultiFinger { fingers: usize },
    PinchIn,
    PinchOut,
    TwoFingerScroll { direction: Cardinal },
    Swipe { fingers: usize },
}

impl Gesture {
    /// Whether this is a pinch classification.
    #[must_use]
    pub const fn is_pinch(self) -> bool {
        matches!(self, Self::PinchIn | Self::PinchOut)
    }
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("-"),
            Self::Touch => f.write_str("touch"),
            Self::PinchCandidate => f.write_str("pinch/scroll"),
            Self::MultiFinger { fingers } => write!(f, "{fingers}-finger"),
            Self::PinchIn => f.write_str("pinch in"),
            Self::PinchOut => f.write_str("pinch out"),
            Self::TwoFingerScroll { direction } => {
                write!(f, "2-finger scroll {}", direction.arrow())
            }
            Self::Swipe { fingers } => write!(f, "{fingers}-finger swipe"),
        }
    }
}

/// Snapshot delivered to the display after every gesture input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureReport {
    pub gesture: Gesture,
    pub finger_count: usize,
    pub pinch_scale: f64,
    pub swipe: Option<Swipe>,
}

impl GestureReport {
    /// Pinch multiplier formatted as `1.23x`.
    #[must_use]
    pub fn pinch_label(&self) -> String {
        format!("{:.2}x", self.pinch_scale)
    }

    /// Last swipe formatted as `3f left`, or `-`.
    #[must_use]
    pub fn swipe_label(&self) -> String {
        self.swipe.map_or_else(|| "-".to_string(), |s| s.to_string())
    }
}

/// Result of feeding one input to the recognizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureOutcome {
    pub report: GestureReport,
    /// Activity the input implies, if any.
    pub activity: Option<Activity>,
}

/// Raw multi-touch bookkeeping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GestureState {
    pub finger_count: usize,
    pub initial_pinch_distance: f64,
    pub current_scale: f64,
    pub touch_start_points: Vec<Point>,
    pub last_touch_points: Vec<Point>,
}

// ---------------------------------------------------------------------------
// GestureRecognizer
// ---------------------------------------------------------------------------

/// Stateful multi-touch and ctrl-wheel recognizer.
///
/// Feed touch events to [`touch`](Self::touch) and wheel events to
/// [`wheel`](Self::wheel). The owner arms a timer at
/// [`reset_at`](Self::reset_at) and calls [`expire`](Self::expire) when it fires.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    config: GestureConfig,
    state: GestureState,
    gesture: Gesture,
    swipe: Option<Swipe>,
    last_pinch_wheel: Option<Instant>,
    reset_at: Option<Instant>,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureRecognizer {
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: GestureState {
                current_scale: 1.0,
                ..GestureState::default()
            },
            gesture: Gesture::None,
            swipe: None,
            last_pinch_wheel: None,
            reset_at: None,
        }
    }

    /// Process a touch event. `touches` must list every contact still down.
    pub fn touch(&mut self, input: &TouchInput, now: Instant) -> GestureOutcome {
        let points: Vec<Point> = input.touches.iter().map(|t| t.point()).collect();
        let fingers = points.len();
        self.state.finger_count = fingers;

        let activity = match input.phase {
            TouchPhase::Start => self.on_start(points),
            TouchPhase::Move => self.on_move(points),
            TouchPhase::End | TouchPhase::Cancel => self.on_end(points, now),
        };
        GestureOutcome {
            report: self.report(),
            activity,
        }
    }

    /// Process a wheel event: ctrl-wheel pinch emulation or trackpad scroll.
    pub fn wheel(&mut self, input: &WheelInput, now: Instant) -> GestureOutcome {
        let mut activity = None;
        if input.is_zoom() {
            let fresh = self.last_pinch_wheel.is_none_or(|last| {
                now.saturating_duration_since(last) > self.config.pinch_wheel_timeout
            });
            if fresh {
                self.state.current_scale = 1.0;
            }
            self.last_pinch_wheel = Some(now);
            self.gesture = if input.dy < 0.0 {
                Gesture::PinchOut
            } else {
                Gesture::PinchIn
            };
            let scale = self.state.current_scale - input.dy * self.config.wheel_sensitivity;
            self.state.current_scale = scale.clamp(self.config.min_scale, self.config.max_scale);
            self.state.finger_count = 2;
            activity = Some(Activity::Pinching);
        } else if input.dx != 0.0 || input.dy != 0.0 {
            self.gesture = Gesture::TwoFingerScroll {
                direction: Cardinal::dominant(input.dx, input.dy),
            };
            self.state.finger_count = 2;
        }
        self.reset_at = Some(now + self.config.reset_delay);
        GestureOutcome {
            report: self.report(),
            activity,
        }
    }

    /// Clear the gesture if the reset deadline has passed.
    ///
    /// Returns the neutral report when a reset happened.
    pub fn expire(&mut self, now: Instant) -> Option<GestureReport> {
        let at = self.reset_at?;
        if now < at {
            return None;
        }
        self.reset_at = None;
        self.gesture = Gesture::None;
        self.state.finger_count = 0;
        Some(self.report())
    }

    /// Current report.
    #[must_use]
    pub fn report(&self) -> GestureReport {
        GestureReport {
            gesture: self.gesture,
            finger_count: self.state.finger_count,
            pinch_scale: self.state.current_scale,
            swipe: self.swipe,
        }
    }

    #[inline]
    #[must_use]
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Pending reset deadline.
    #[inline]
    #[must_use]
    pub fn reset_at(&self) -> Option<Instant> {
        self.reset_at
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    /// Return to idle, keeping nothing.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}

// ---------------------------------------------------------------------------
// Internal handlers
// ---------------------------------------------------------------------------

impl GestureRecognizer {
    fn on_start(&mut self, points: Vec<Point>) -> Option<Activity> {
        self.reset_at = None;
        let fingers = points.len();
        if fingers == 2 {
            self.state.initial_pinch_distance = points[0].distance(points[1]);
            self.state.current_scale = 1.0;
        }
        self.gesture = match fingers {
            0 => Gesture::None,
            1 => Gesture::Touch,
            2 => Gesture::PinchCandidate,
            n => Gesture::MultiFinger { fingers: n },
        };
        self.state.touch_start_points.clone_from(&points);
        self.state.last_touch_points = points;
        match fingers {
            0 => None,
            1 => Some(Activity::Moving),
            _ => Some(Activity::Pinching),
        }
    }

    fn on_move(&mut self, points: Vec<Point>) -> Option<Activity> {
        let fingers = points.len();
        let mut activity = None;
        if fingers == 2 {
            activity = self.classify_two_finger(&points);
        } else if fingers >= 3 {
            activity = self.classify_swipe(&points);
        }
        self.state.last_touch_points = points;
        activity
    }

    fn on_end(&mut self, points: Vec<Point>, now: Instant) -> Option<Activity> {
        if points.is_empty() {
            self.reset_at = Some(now + self.config.reset_delay);
        } else if points.len() == 2 {
            self.state.initial_pinch_distance = points[0].distance(points[1]);
        }
        self.state.last_touch_points = points;
        None
    }

    fn classify_two_finger(&mut self, points: &[Point]) -> Option<Activity> {
        let mut activity = None;
        let initial = self.state.initial_pinch_distance;
        if initial > 0.0 {
            let scale = points[0].distance(points[1]) / initial;
            self.state.current_scale = scale;
            if scale > self.config.pinch_out_above {
                self.gesture = Gesture::PinchOut;
                activity = Some(Activity::Pinching);
            } else if scale < self.config.pinch_in_below {
                self.gesture = Gesture::PinchIn;
                activity = Some(Activity::Pinching);
            }
        }

        let scale = self.state.current_scale;
        if self.state.last_touch_points.len() == 2
            && (scale - 1.0).abs() < self.config.scroll_scale_tolerance
            && let (Some(now_c), Some(last_c)) = (
                Point::centroid(points),
                Point::centroid(&self.state.last_touch_points),
            )
        {
            let (dx, dy) = (now_c.x - last_c.x, now_c.y - last_c.y);
            let threshold = self.config.two_finger_scroll_threshold;
            let dominant = dx.abs().max(dy.abs());
            if dx.abs() != dy.abs() && dominant > threshold {
                self.gesture = Gesture::TwoFingerScroll {
                    direction: Cardinal::dominant(dx, dy),
                };
                activity = Some(Activity::Scrolling);
            }
        }
        activity
    }

    fn classify_swipe(&mut self, points: &[Point]) -> Option<Activity> {
        let (Some(start), Some(now_c)) = (
            Point::centroid(&self.state.touch_start_points),
            Point::centroid(points),
        ) else {
            return None;
        };
        let (dx, dy) = (now_c.x - start.x, now_c.y - start.y);
        let threshold = self.config.swipe_threshold;
        if dx.abs() <= threshold && dy.abs() <= threshold {
            return None;
        }
        let fingers = points.len();
        self.gesture = Gesture::Swipe { fingers };
        self.swipe = Some(Swipe {
            fingers,
            direction: Cardinal::of_swipe(dx, dy),
        });
        Some(Activity::Swiping)
    }
}
