#![forbid(unsafe_code)]

//! Output collaborators.
//!
//! The engine pushes display values, log lines and graph points into
//! optional sinks. A host that has no display element for a value simply
//! leaves that sink unset: every delivery is guarded, and a missing sink
//! never affects engine state.
//!
//! [`RecordingSink`] implements all three traits over shared storage and is
//! what tests and the CLI use.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::activity::Activity;
use crate::direction::DirectionState;
use crate::event::{MouseButton, Point, PointerKind, Tilt};
use crate::gesture::GestureReport;
use crate::graph::{ScrollPoint, ZoomPoint};
use crate::log::LogEntry;
use crate::motion::MotionKind;
use crate::view::ViewKind;

/// A discrete value pushed to the display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayUpdate {
    /// Latest accepted delta.
    Delta { dx: f64, dy: f64 },
    /// Lifetime absolute scroll totals.
    Totals { x: f64, y: f64 },
    /// In-flight motion vector.
    MotionProgress {
        kind: MotionKind,
        x: f64,
        y: f64,
        elapsed_ms: u64,
    },
    /// Direction signs of both channels.
    Direction(DirectionState),
    /// Zoom of the view's surface, in percent.
    ZoomPercent { percent: i64 },
    Activity { activity: Activity },
    Gesture(GestureReport),
    Pointer {
        kind: PointerKind,
        at: Point,
        pressure: Option<f32>,
        tilt: Option<Tilt>,
    },
    LastClick { button: MouseButton },
    MapTransform { zoom: f64, pan: Point },
    MapPin { at: Point },
    TrackingDisabled { disabled: bool },
}

/// Receives display values.
pub trait DisplaySink {
    fn update(&mut self, view: ViewKind, update: &DisplayUpdate);
}

/// Receives log lines.
pub trait LogSink {
    fn append(&mut self, view: ViewKind, entry: &LogEntry);

    /// The view's log was cleared.
    fn cleared(&mut self, _view: ViewKind) {}
}

/// Receives graph series points.
pub trait GraphSink {
    fn scroll_point(&mut self, point: &ScrollPoint);
    fn zoom_point(&mut self, point: &ZoomPoint);

    /// Both series were cleared.
    fn cleared(&mut self) {}
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The optional sinks attached to a session.
#[derive(Default)]
pub struct Collaborators {
    pub display: Option<Box<dyn DisplaySink>>,
    pub log: Option<Box<dyn LogSink>>,
    pub graph: Option<Box<dyn GraphSink>>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("display", &self.display.is_some())
            .field("log", &self.log.is_some())
            .field("graph", &self.graph.is_some())
            .finish()
    }
}

impl Collaborators {
    /// No sinks attached.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Attach one recorder as every sink.
    #[must_use]
    pub fn recording(recorder: &RecordingSink) -> Self {
        Self {
            display: Some(Box::new(recorder.clone())),
            log: Some(Box::new(recorder.clone())),
            graph: Some(Box::new(recorder.clone())),
        }
    }

    pub(crate) fn display(&mut self, view: ViewKind, update: DisplayUpdate) {
        if let Some(sink) = self.display.as_mut() {
            sink.update(view, &update);
        }
    }

    pub(crate) fn log(&mut self, view: ViewKind, entry: &LogEntry) {
        if let Some(sink) = self.log.as_mut() {
            sink.append(view, entry);
        }
    }

    pub(crate) fn log_cleared(&mut self, view: ViewKind) {
        if let Some(sink) = self.log.as_mut() {
            sink.cleared(view);
        }
    }

    pub(crate) fn scroll_point(&mut self, point: &ScrollPoint) {
        if let Some(sink) = self.graph.as_mut() {
            sink.scroll_point(point);
        }
    }

    pub(crate) fn zoom_point(&mut self, point: &ZoomPoint) {
        if let Some(sink) = self.graph.as_mut() {
            sink.zoom_point(point);
        }
    }

    pub(crate) fn graph_cleared(&mut self) {
        if let Some(sink) = self.graph.as_mut() {
            sink.cleared();
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// Everything a [`RecordingSink`] has received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recorded {
    pub display: Vec<(ViewKind, DisplayUpdate)>,
    pub log: Vec<(ViewKind, LogEntry)>,
    pub scroll_points: Vec<ScrollPoint>,
    pub zoom_points: Vec<ZoomPoint>,
    pub log_clears: usize,
    pub graph_clears: usize,
}

/// Shared-handle sink that records every delivery.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Rc<RefCell<Recorded>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn snapshot(&self) -> Recorded {
        self.inner.borrow().clone()
    }

    /// Log messages for one view, oldest first.
    #[must_use]
    pub fn messages(&self, view: ViewKind) -> Vec<String> {
        self.inner
            .borrow()
            .log
            .iter()
            .filter(|(v, _)| *v == view)
            .map(|(_, e)| e.message.clone())
            .collect()
    }

    /// Most recent display value matching `pick`.
    pub fn last_display<T>(&self, pick: impl Fn(&DisplayUpdate) -> Option<T>) -> Option<T> {
        self.inner
            .borrow()
            .display
            .iter()
            .rev()
            .find_map(|(_, u)| pick(u))
    }

    pub fn reset(&self) {
        *self.inner.borrow_mut() = Recorded::default();
    }
}

impl DisplaySink for RecordingSink {
    fn update(&mut self, view: ViewKind, update: &DisplayUpdate) {
        self.inner.borrow_mut().display.push((view, *update));
    }
}

impl LogSink for RecordingSink {
    fn append(&mut self, view: ViewKind, entry: &LogEntry) {
        self.inner.borrow_mut().log.push((view, entry.clone()));
    }

    fn cleared(&mut self, _view: ViewKind) {
        self.inner.borrow_mut().log_clears += 1;
    }
}

impl GraphSink for RecordingSink {
    fn scroll_point(&mut self, point: &ScrollPoint) {
        self.inner.borrow_mut().scroll_points.push(*point);
    }

    fn zoom_point(&mut self, point: &ZoomPoint) {
        self.inner.borrow_mut().zoom_points.push(*point);
    }

    fn cleared(&mut self) {
        self.inner.borrow_mut().graph_clears += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogCategory;

    #[test]
    fn missing_sinks_are_no_ops() {
        let mut c = Collaborators::none();
        c.display(ViewKind::Debug, DisplayUpdate::Delta { dx: 1.0, dy: 2.0 });
        c.scroll_point(&ScrollPoint {
            time_ms: 0,
            dx: 0.0,
            dy: 0.0,
            total_x: 0.0,
            total_y: 0.0,
        });
        c.graph_cleared();
        assert_eq!(
            format!("{c:?}"),
            "Collaborators { display: false, log: false, graph: false }"
        );
    }

    #[test]
    fn recorder_shares_storage_across_clones() {
        let rec = RecordingSink::new();
        let mut c = Collaborators::recording(&rec);
        c.display(ViewKind::Maps, DisplayUpdate::ZoomPercent { percent: 150 });
        c.log(
            ViewKind::Maps,
            &LogEntry {
                timestamp: "00:00:00.000".into(),
                category: LogCategory::Mouse,
                message: "drag start".into(),
            },
        );
        c.log_cleared(ViewKind::Maps);
        assert_eq!(rec.messages(ViewKind::Maps), vec!["drag start"]);
        assert!(rec.messages(ViewKind::Debug).is_empty());
        assert_eq!(
            rec.last_display(|u| match u {
                DisplayUpdate::ZoomPercent { percent } => Some(*percent),
                _ => None,
            }),
            Some(150)
        );
        assert_eq!(rec.snapshot().log_clears, 1);
        rec.reset();
        assert_eq!(rec.snapshot(), Recorded::default());
    }

    #[test]
    fn display_updates_serialize_tagged() {
        let json = serde_json::to_string(&DisplayUpdate::TrackingDisabled { disabled: true })
            .expect("serialize");
        assert_eq!(json, r#"{"type":"tracking_disabled","disabled":true}"#);
    }
}
