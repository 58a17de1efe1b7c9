#![forbid(unsafe_code)]

//! Pan and zoom-around-cursor math for the article and map views.
//!
//! A [`ZoomViewport`] maps content coordinates to screen coordinates as
//! `screen = content * zoom + pan`. Zooming at a cursor keeps the content
//! point under the cursor stationary.
//!
//! [`MapController`] adds left-button drag panning and click-to-pin on top.

use serde::{Deserialize, Serialize};

use crate::event::{MouseButton, Point};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Zoom bounds and wheel sensitivity of a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom change per wheel pixel.
    pub sensitivity: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.25,
            max_zoom: 5.0,
            sensitivity: 0.01,
        }
    }
}

/// Largest pointer travel between press and release that still counts as a click.
pub const CLICK_SLOP: f64 = 5.0;

// ---------------------------------------------------------------------------
// ZoomViewport
// ---------------------------------------------------------------------------

/// Zoom level and pan offset of a zoomable surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomViewport {
    config: ViewportConfig,
    zoom: f64,
    pan: Point,
}

impl Default for ZoomViewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl ZoomViewport {
    #[must_use]
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            zoom: 1.0,
            pan: Point::default(),
        }
    }

    /// Apply a ctrl-wheel delta around `cursor`. Returns the zoom change.
    pub fn zoom_at(&mut self, cursor: Point, dy: f64) -> f64 {
        let old = self.zoom;
        let new = (old - dy * self.config.sensitivity).clamp(self.config.min_zoom, self.config.max_zoom);
        let anchor = self.to_content(cursor);
        self.zoom = new;
        self.pan = Point::new(cursor.x - anchor.x * new, cursor.y - anchor.y * new);
        new - old
    }

    /// Shift the pan offset.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan.x += dx;
        self.pan.y += dy;
    }

    pub fn set_pan(&mut self, pan: Point) {
        self.pan = pan;
    }

    /// Back to 100% with no pan.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = Point::default();
    }

    /// Screen point to content coordinates.
    #[must_use]
    pub fn to_content(&self, screen: Point) -> Point {
        Point::new((screen.x - self.pan.x) / self.zoom, (screen.y - self.pan.y) / self.zoom)
    }

    #[inline]
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Zoom as a rounded percentage.
    #[must_use]
    pub fn zoom_percent(&self) -> i64 {
        (self.zoom * 100.0).round() as i64
    }

    #[inline]
    #[must_use]
    pub fn pan(&self) -> Point {
        self.pan
    }
}

// ---------------------------------------------------------------------------
// MapController
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    cursor_start: Point,
    pan_start: Point,
}

/// What a map interaction did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapAction {
    DragStart,
    Panned { pan: Point },
    DragEnd { pan: Point },
    PinPlaced { at: Point },
    Zoomed { percent: i64, zoom_in: bool },
}

/// Drag-to-pan, wheel pan and zoom, and click-to-pin for the map view.
#[derive(Debug, Clone, Default)]
pub struct MapController {
    viewport: ZoomViewport,
    drag: Option<Drag>,
    press: Option<Point>,
    pin: Option<Point>,
}

impl MapController {
    #[must_use]
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            viewport: ZoomViewport::new(config),
            drag: None,
            press: None,
            pin: None,
        }
    }

    /// Mouse press. Any button arms click detection; the left button also starts a drag.
    pub fn mouse_down(&mut self, button: MouseButton, at: Point) -> Option<MapAction> {
        self.press = Some(at);
        if !button.is_primary() {
            return None;
        }
        self.drag = Some(Drag {
            cursor_start: at,
            pan_start: self.viewport.pan(),
        });
        Some(MapAction::DragStart)
    }

    /// Mouse move. Pans while dragging.
    pub fn mouse_move(&mut self, at: Point) -> Option<MapAction> {
        let drag = self.drag?;
        let pan = Point::new(
            drag.pan_start.x + (at.x - drag.cursor_start.x),
            drag.pan_start.y + (at.y - drag.cursor_start.y),
        );
        self.viewport.set_pan(pan);
        Some(MapAction::Panned { pan })
    }

    /// Mouse release. Ends a drag; a press that stayed within the click slop
    /// also drops a pin.
    pub fn mouse_up(&mut self, at: Point) -> Vec<MapAction> {
        let mut out = Vec::with_capacity(2);
        if self.drag.take().is_some() {
            out.push(MapAction::DragEnd {
                pan: self.viewport.pan(),
            });
        }
        if let Some(press) = self.press.take()
            && press.distance(at) <= CLICK_SLOP
        {
            let pin = self.viewport.to_content(at);
            self.pin = Some(pin);
            out.push(MapAction::PinPlaced { at: pin });
        }
        out
    }

    /// Wheel over the map: ctrl zooms at the cursor, plain wheel pans.
    pub fn wheel(&mut self, dx: f64, dy: f64, ctrl: bool, cursor: Point) -> Option<MapAction> {
        if ctrl {
            let change = self.viewport.zoom_at(cursor, dy);
            (change.abs() > 0.01).then(|| MapAction::Zoomed {
                percent: self.viewport.zoom_percent(),
                zoom_in: dy < 0.0,
            })
        } else {
            self.viewport.pan_by(-dx, -dy);
            None
        }
    }

    pub fn reset_zoom(&mut self) {
        self.viewport.reset();
    }

    pub fn clear_pin(&mut self) {
        self.pin = None;
    }

    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    #[inline]
    #[must_use]
    pub fn pin(&self) -> Option<Point> {
        self.pin
    }

    #[inline]
    #[must_use]
    pub fn viewport(&self) -> &ZoomViewport {
        &self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn zoom_keeps_cursor_point_fixed() {
        let mut v = ZoomViewport::default();
        v.pan_by(30.0, -10.0);
        let cursor = Point::new(200.0, 120.0);
        let before = v.to_content(cursor);
        v.zoom_at(cursor, -50.0);
        assert!((v.zoom() - 1.5).abs() < 1e-9);
        assert!(approx(v.to_content(cursor), before));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut v = ZoomViewport::default();
        v.zoom_at(Point::default(), 10_000.0);
        assert_eq!(v.zoom(), 0.25);
        v.zoom_at(Point::default(), -10_000.0);
        assert_eq!(v.zoom(), 5.0);
        assert_eq!(v.zoom_percent(), 500);
        v.reset();
        assert_eq!(v.zoom(), 1.0);
        assert_eq!(v.pan(), Point::default());
    }

    #[test]
    fn drag_pans_by_displacement() {
        let mut m = MapController::default();
        m.wheel(10.0, 20.0, false, Point::default());
        assert_eq!(m.viewport().pan(), Point::new(-10.0, -20.0));

        assert_eq!(
            m.mouse_down(MouseButton::Left, Point::new(100.0, 100.0)),
            Some(MapAction::DragStart)
        );
        assert!(m.is_dragging());
        let moved = m.mouse_move(Point::new(140.0, 90.0));
        assert_eq!(
            moved,
            Some(MapAction::Panned {
                pan: Point::new(30.0, -30.0)
            })
        );
        let out = m.mouse_up(Point::new(140.0, 90.0));
        assert_eq!(
            out,
            vec![MapAction::DragEnd {
                pan: Point::new(30.0, -30.0)
            }]
        );
        assert_eq!(m.pin(), None);
    }

    #[test]
    fn short_click_drops_pin_in_map_coordinates() {
        let mut m = MapController::default();
        m.wheel(0.0, -100.0, true, Point::default());
        assert!((m.viewport().zoom() - 2.0).abs() < 1e-9);
        m.mouse_down(MouseButton::Left, Point::new(100.0, 60.0));
        m.mouse_move(Point::new(103.0, 60.0));
        let out = m.mouse_up(Point::new(103.0, 60.0));
        assert_eq!(out.len(), 2);
        let pin = m.pin().expect("pin placed");
        let expected = m.viewport().to_content(Point::new(103.0, 60.0));
        assert!(approx(pin, expected));
    }

    #[test]
    fn right_button_does_not_drag() {
        let mut m = MapController::default();
        assert_eq!(m.mouse_down(MouseButton::Right, Point::new(5.0, 5.0)), None);
        assert_eq!(m.mouse_move(Point::new(50.0, 5.0)), None);
        assert!(m.mouse_up(Point::new(50.0, 5.0)).is_empty());
    }

    #[test]
    fn tiny_zoom_change_reports_nothing() {
        let mut m = MapController::default();
        assert_eq!(m.wheel(0.0, -0.5, true, Point::default()), None);
        m.reset_zoom();
        assert_eq!(
            m.wheel(0.0, -10.0, true, Point::default()),
            Some(MapAction::Zoomed {
                percent: 110,
                zoom_in: true
            })
        );
    }
}
