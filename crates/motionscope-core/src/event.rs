#![forbid(unsafe_code)]

//! Canonical host input events.
//!
//! The host (browser glue, a replayed trace, a test) translates whatever its
//! input API delivers into an [`InputEvent`]. Presence checks on loosely typed
//! event objects become explicit variants here: a pointer event carries
//! `Option<f32>` pressure instead of "maybe has a pressure field".
//!
//! # Design Notes
//!
//! - Coordinates are client pixels as `f64`; scroll positions are pixels from
//!   the region origin.
//! - Touch events carry every contact still on the surface, mirroring the
//!   DOM `touches` list, not only the changed ones.
//! - All types are serde-serializable so traces can be recorded and replayed.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::sample::PositionSource;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    /// Wheel or trackpad delta. Ctrl-modified wheels are pinch emulation.
    Wheel(WheelInput),

    /// Pointer event (mouse, pen, touch, or XR controller).
    Pointer(PointerInput),

    /// Multi-touch event with the full list of active contacts.
    Touch(TouchInput),

    /// Classic mouse button/move event.
    Mouse(MouseInput),

    /// Scroll position snapshot of a scrollable region.
    ScrollPosition(ScrollPositionInput),
}

impl InputEvent {
    /// Short lowercase name, used in log lines and traces.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Wheel(_) => "wheel",
            Self::Pointer(_) => "pointer",
            Self::Touch(_) => "touch",
            Self::Mouse(_) => "mouse",
            Self::ScrollPosition(_) => "scroll-position",
        }
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point in client pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Centroid of a set of points, or `None` when empty.
    #[must_use]
    pub fn centroid(points: &[Self]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let (sx, sy) = points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Self::new(sx / n, sy / n))
    }
}

// ---------------------------------------------------------------------------
// Modifiers and buttons
// ---------------------------------------------------------------------------

bitflags! {
    /// Modifier keys held during an input event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key. Trackpads report pinch as ctrl+wheel.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// Mouse buttons, numbered as the DOM numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Back,
    Forward,
    Other(u8),
}

impl MouseButton {
    #[must_use]
    pub const fn from_u8(n: u8) -> Self {
        match n {
            0 => Self::Left,
            1 => Self::Middle,
            2 => Self::Right,
            3 => Self::Back,
            4 => Self::Forward,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Left => 0,
            Self::Middle => 1,
            Self::Right => 2,
            Self::Back => 3,
            Self::Forward => 4,
            Self::Other(n) => n,
        }
    }

    /// The primary (left) button.
    #[must_use]
    pub const fn is_primary(self) -> bool {
        matches!(self, Self::Left)
    }

    /// Human-readable name for status displays.
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::Left => "Left".to_string(),
            Self::Middle => "Middle".to_string(),
            Self::Right => "Right".to_string(),
            Self::Back => "Back".to_string(),
            Self::Forward => "Forward".to_string(),
            Self::Other(n) => format!("Button {n}"),
        }
    }
}

/// What kind of element a press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    #[default]
    Surface,
    /// A link with an `href`. Pressing it navigates and scrolls programmatically.
    Anchor,
}

// ---------------------------------------------------------------------------
// Wheel
// ---------------------------------------------------------------------------

/// Wheel or trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelInput {
    pub dx: f64,
    pub dy: f64,
    /// Cursor position at the time of the wheel event.
    #[serde(default)]
    pub at: Point,
    #[serde(default)]
    pub mods: Modifiers,
}

impl WheelInput {
    /// A plain (unmodified) wheel delta at the origin.
    #[must_use]
    pub fn new(dx: f64, dy: f64) -> Self {
        Self {
            dx,
            dy,
            at: Point::default(),
            mods: Modifiers::NONE,
        }
    }

    /// Set the cursor position.
    #[must_use]
    pub const fn at(mut self, at: Point) -> Self {
        self.at = at;
        self
    }

    /// Set modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, mods: Modifiers) -> Self {
        self.mods = mods;
        self
    }

    /// Ctrl-modified wheels are trackpad pinches or ctrl+wheel zoom.
    #[must_use]
    pub const fn is_zoom(&self) -> bool {
        self.mods.contains(Modifiers::CTRL)
    }
}

// ---------------------------------------------------------------------------
// Pointer
// ---------------------------------------------------------------------------

/// Pointer device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    Mouse,
    Pen,
    Touch,
    /// XR controller ray (`xr-standard`).
    Xr,
}

impl PointerKind {
    /// Pointer kinds whose drags scroll the content under them.
    #[must_use]
    pub const fn drags_content(self) -> bool {
        matches!(self, Self::Pen | Self::Touch | Self::Xr)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mouse => "mouse",
            Self::Pen => "pen",
            Self::Touch => "touch",
            Self::Xr => "xr-standard",
        }
    }
}

/// Pointer lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// Pen tilt in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tilt {
    pub x: f32,
    pub y: f32,
}

/// Pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    pub phase: PointerPhase,
    /// Stable identifier for the duration of the contact.
    pub id: u32,
    pub pointer: PointerKind,
    pub at: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<MouseButton>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt: Option<Tilt>,
    #[serde(default)]
    pub primary: bool,
}

impl PointerInput {
    /// A pointer event without button, pressure, or tilt.
    #[must_use]
    pub const fn new(phase: PointerPhase, id: u32, pointer: PointerKind, at: Point) -> Self {
        Self {
            phase,
            id,
            pointer,
            at,
            button: None,
            pressure: None,
            tilt: None,
            primary: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Touch
// ---------------------------------------------------------------------------

/// Phase for touch events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// One contact on a touch surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: u32,
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    #[must_use]
    pub const fn new(id: u32, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }

    #[must_use]
    pub const fn point(self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Multi-touch event. `touches` holds every contact still down after the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchInput {
    pub phase: TouchPhase,
    pub touches: Vec<TouchPoint>,
}

impl TouchInput {
    #[must_use]
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>) -> Self {
        Self { phase, touches }
    }

    /// Number of fingers currently down.
    #[must_use]
    pub fn finger_count(&self) -> usize {
        self.touches.len()
    }
}

// ---------------------------------------------------------------------------
// Mouse
// ---------------------------------------------------------------------------

/// Phase for mouse events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MousePhase {
    Down,
    Up,
    Move,
}

/// Mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseInput {
    pub phase: MousePhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<MouseButton>,
    pub at: Point,
    #[serde(default)]
    pub target: Target,
}

impl MouseInput {
    #[must_use]
    pub const fn new(phase: MousePhase, button: Option<MouseButton>, at: Point) -> Self {
        Self {
            phase,
            button,
            at,
            target: Target::Surface,
        }
    }

    /// Mark the press as landing on an anchor element.
    #[must_use]
    pub const fn on_anchor(mut self) -> Self {
        self.target = Target::Anchor;
        self
    }
}

// ---------------------------------------------------------------------------
// Scroll positions
// ---------------------------------------------------------------------------

/// Scroll position snapshot for one scrollable region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollPositionInput {
    pub source: PositionSource,
    /// Host-assigned identifier of the scrollable region.
    pub region: u32,
    pub top: f64,
    pub left: f64,
}

impl ScrollPositionInput {
    #[must_use]
    pub const fn new(source: PositionSource, region: u32, top: f64, left: f64) -> Self {
        Self {
            source,
            region,
            top,
            left,
        }
    }

    /// The snapshot as an `(x, y)` point.
    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.left, self.top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_square() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert_eq!(Point::centroid(&pts), Some(Point::new(5.0, 5.0)));
        assert_eq!(Point::centroid(&[]), None);
    }

    #[test]
    fn distance_is_euclidean() {
        let d = Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn button_numbering_roundtrip() {
        for n in 0..8u8 {
            assert_eq!(MouseButton::from_u8(n).to_u8(), n);
        }
        assert_eq!(MouseButton::from_u8(7).label(), "Button 7");
        assert_eq!(MouseButton::Back.label(), "Back");
    }

    #[test]
    fn ctrl_wheel_is_zoom() {
        assert!(!WheelInput::new(0.0, 10.0).is_zoom());
        assert!(
            WheelInput::new(0.0, 10.0)
                .with_modifiers(Modifiers::CTRL | Modifiers::SHIFT)
                .is_zoom()
        );
    }

    #[test]
    fn only_contact_pointers_drag_content() {
        assert!(!PointerKind::Mouse.drags_content());
        assert!(PointerKind::Pen.drags_content());
        assert!(PointerKind::Touch.drags_content());
        assert!(PointerKind::Xr.drags_content());
    }

    #[test]
    fn event_json_is_tagged() {
        let ev = InputEvent::Wheel(WheelInput::new(0.0, 100.0));
        let json = serde_json::to_string(&ev).expect("serialize");
        assert!(json.contains("\"kind\":\"wheel\""));
        let back: InputEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(ev, back);
    }
}
