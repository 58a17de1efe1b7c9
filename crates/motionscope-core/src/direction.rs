#![forbid(unsafe_code)]

//! Direction classification for the scroll and zoom channels.
//!
//! [`DirectionTracker`] keeps the last known sign per axis and turns a stream
//! of accepted deltas into discrete [`DirectionEvent`]s: a start, axis
//! switches, reversals, and an end when the channel's short end timer fires.
//!
//! # Invariants
//!
//! 1. A zero component never overwrites a stored direction.
//! 2. A reversal is reported only when the stored direction is nonzero and
//!    the new nonzero sign differs from it.
//! 3. Ending a channel zeroes its stored directions.

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::sample::{AxisUse, sign};

/// How long a channel stays active after its last sample (default: 150ms).
pub const DEFAULT_END_DELAY: Duration = Duration::from_millis(150);

/// Independent direction channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Scroll,
    Zoom,
}

/// Scroll axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }

    /// Word for a signed direction along this axis.
    #[must_use]
    pub const fn direction_name(self, dir: i8) -> &'static str {
        match (self, dir > 0) {
            (Self::Horizontal, true) => "right",
            (Self::Horizontal, false) => "left",
            (Self::Vertical, true) => "down",
            (Self::Vertical, false) => "up",
        }
    }
}

/// Last known signs: X and Y for scroll, and zoom (`+1` in, `-1` out).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirectionState {
    pub x: i8,
    pub y: i8,
    pub zoom: i8,
}

/// Describe a scroll direction pair, e.g. `down-left`, or `none`.
#[must_use]
pub fn describe(x: i8, y: i8) -> String {
    let parts: Vec<&str> = [
        (y != 0).then(|| Axis::Vertical.direction_name(y)),
        (x != 0).then(|| Axis::Horizontal.direction_name(x)),
    ]
    .into_iter()
    .flatten()
    .collect();
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join("-")
    }
}

/// Zoom direction for a ctrl-wheel delta: negative `dy` zooms in.
#[inline]
#[must_use]
pub fn zoom_sign(dy: f64) -> i8 {
    -sign(dy)
}

/// Lifecycle events of a direction channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectionEvent {
    /// Scroll channel became active.
    ScrollStart { x: i8, y: i8 },
    /// Scrolling moved from one axis to the other.
    AxisChange { to: Axis },
    /// A scroll axis reversed.
    ScrollChange { axis: Axis, dir: i8 },
    /// Scroll channel went quiet.
    ScrollEnd,
    /// Zoom channel became active.
    ZoomStart { dir: i8 },
    /// Zoom reversed between in and out.
    ZoomChange { dir: i8 },
    /// Zoom channel went quiet.
    ZoomEnd,
}

/// Direction bookkeeping for one view.
#[derive(Debug, Clone, Default)]
pub struct DirectionTracker {
    state: DirectionState,
    scrolling: bool,
    zooming: bool,
    last_axes: Option<AxisUse>,
}

impl DirectionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one accepted scroll delta.
    pub fn observe_scroll(&mut self, dx: f64, dy: f64) -> Vec<DirectionEvent> {
        let mut out = Vec::with_capacity(2);
        let (sx, sy) = (sign(dx), sign(dy));
        let axes = AxisUse::of(dx, dy);

        if !self.scrolling {
            self.scrolling = true;
            self.state.x = sx;
            self.state.y = sy;
            out.push(DirectionEvent::ScrollStart { x: sx, y: sy });
        } else {
            match (self.last_axes, axes) {
                (Some(AxisUse::YOnly), AxisUse::XOnly) => out.push(DirectionEvent::AxisChange {
                    to: Axis::Horizontal,
                }),
                (Some(AxisUse::XOnly), AxisUse::YOnly) => out.push(DirectionEvent::AxisChange {
                    to: Axis::Vertical,
                }),
                _ => {}
            }
            if sx != 0 && self.state.x != 0 && sx != self.state.x {
                out.push(DirectionEvent::ScrollChange {
                    axis: Axis::Horizontal,
                    dir: sx,
                });
            }
            if sy != 0 && self.state.y != 0 && sy != self.state.y {
                out.push(DirectionEvent::ScrollChange {
                    axis: Axis::Vertical,
                    dir: sy,
                });
            }
            if sx != 0 {
                self.state.x = sx;
            }
            if sy != 0 {
                self.state.y = sy;
            }
        }

        if axes != AxisUse::None {
            self.last_axes = Some(axes);
        }
        out
    }

    /// Feed one ctrl-wheel delta.
    pub fn observe_zoom(&mut self, dy: f64) -> Vec<DirectionEvent> {
        let dir = zoom_sign(dy);
        if !self.zooming {
            self.zooming = true;
            self.state.zoom = dir;
            return vec![DirectionEvent::ZoomStart { dir }];
        }
        let mut out = Vec::new();
        if dir != 0 && self.state.zoom != 0 && dir != self.state.zoom {
            out.push(DirectionEvent::ZoomChange { dir });
        }
        if dir != 0 {
            self.state.zoom = dir;
        }
        out
    }

    /// End a channel after its quiet delay. Returns `None` if it was idle.
    pub fn end(&mut self, channel: Channel) -> Option<DirectionEvent> {
        match channel {
            Channel::Scroll if self.scrolling => {
                self.scrolling = false;
                self.state.x = 0;
                self.state.y = 0;
                self.last_axes = None;
                Some(DirectionEvent::ScrollEnd)
            }
            Channel::Zoom if self.zooming => {
                self.zooming = false;
                self.state.zoom = 0;
                Some(DirectionEvent::ZoomEnd)
            }
            _ => None,
        }
    }

    /// Zero every direction and deactivate both channels without events.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> DirectionState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self, channel: Channel) -> bool {
        match channel {
            Channel::Scroll => self.scrolling,
            Channel::Zoom => self.zooming,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changes(events: &[DirectionEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, DirectionEvent::ScrollChange { .. }))
            .count()
    }

    #[test]
    fn start_records_signs() {
        let mut d = DirectionTracker::new();
        let ev = d.observe_scroll(-3.0, 0.0);
        assert_eq!(ev, vec![DirectionEvent::ScrollStart { x: -1, y: 0 }]);
        assert_eq!(d.state(), DirectionState { x: -1, y: 0, zoom: 0 });
        assert!(d.is_active(Channel::Scroll));
    }

    #[test]
    fn reversal_reported_once_at_third_sample() {
        let mut d = DirectionTracker::new();
        let per_sample: Vec<usize> = [5.0, 4.0, -3.0, -6.0]
            .iter()
            .map(|&dx| changes(&d.observe_scroll(dx, 0.0)))
            .collect();
        assert_eq!(per_sample, vec![0, 0, 1, 0]);
    }

    #[test]
    fn reversal_names_new_direction() {
        let mut d = DirectionTracker::new();
        d.observe_scroll(0.0, 10.0);
        let ev = d.observe_scroll(0.0, -10.0);
        assert_eq!(
            ev,
            vec![DirectionEvent::ScrollChange {
                axis: Axis::Vertical,
                dir: -1
            }]
        );
        assert_eq!(Axis::Vertical.direction_name(-1), "up");
    }

    #[test]
    fn zero_component_preserves_direction() {
        let mut d = DirectionTracker::new();
        d.observe_scroll(4.0, 4.0);
        d.observe_scroll(0.0, 4.0);
        assert_eq!(d.state().x, 1);
        let ev = d.observe_scroll(4.0, 0.0);
        assert_eq!(changes(&ev), 0);
    }

    #[test]
    fn newly_used_axis_is_not_a_reversal() {
        let mut d = DirectionTracker::new();
        d.observe_scroll(0.0, 10.0);
        let ev = d.observe_scroll(-10.0, 0.0);
        assert_eq!(changes(&ev), 0);
        assert_eq!(d.state().x, -1);
    }

    #[test]
    fn axis_switch_reported_before_reversal() {
        let mut d = DirectionTracker::new();
        d.observe_scroll(10.0, 0.0);
        d.observe_scroll(0.0, 10.0);
        let ev = d.observe_scroll(-10.0, 0.0);
        assert_eq!(
            ev,
            vec![
                DirectionEvent::AxisChange {
                    to: Axis::Horizontal
                },
                DirectionEvent::ScrollChange {
                    axis: Axis::Horizontal,
                    dir: -1
                },
            ]
        );
    }

    #[test]
    fn diagonal_samples_do_not_switch_axis() {
        let mut d = DirectionTracker::new();
        d.observe_scroll(10.0, 10.0);
        let ev = d.observe_scroll(0.0, 10.0);
        assert!(ev.is_empty());
    }

    #[test]
    fn end_zeroes_channel() {
        let mut d = DirectionTracker::new();
        d.observe_scroll(1.0, 1.0);
        d.observe_zoom(-1.0);
        assert_eq!(d.end(Channel::Scroll), Some(DirectionEvent::ScrollEnd));
        assert_eq!(d.end(Channel::Scroll), None);
        assert_eq!(d.state(), DirectionState { x: 0, y: 0, zoom: 1 });
        assert_eq!(d.end(Channel::Zoom), Some(DirectionEvent::ZoomEnd));
        assert_eq!(d.state(), DirectionState::default());
    }

    #[test]
    fn zoom_direction_follows_negative_dy() {
        let mut d = DirectionTracker::new();
        assert_eq!(d.observe_zoom(-5.0), vec![DirectionEvent::ZoomStart { dir: 1 }]);
        assert!(d.observe_zoom(-5.0).is_empty());
        assert_eq!(d.observe_zoom(5.0), vec![DirectionEvent::ZoomChange { dir: -1 }]);
    }

    #[test]
    fn reset_is_silent() {
        let mut d = DirectionTracker::new();
        d.observe_scroll(1.0, 1.0);
        d.reset();
        assert!(!d.is_active(Channel::Scroll));
        assert_eq!(d.state(), DirectionState::default());
        assert_eq!(d.end(Channel::Scroll), None);
    }

    #[test]
    fn describe_joins_vertical_then_horizontal() {
        assert_eq!(describe(0, 0), "none");
        assert_eq!(describe(1, 0), "right");
        assert_eq!(describe(-1, 1), "down-left");
        assert_eq!(describe(0, -1), "up");
    }
}
