#![forbid(unsafe_code)]

//! Motion graph recording and export.
//!
//! [`GraphRecorder`] buffers the samples of the current graph-view motion as
//! two bounded time series, one for scroll deltas and one for zoom level.
//! Each new motion clears both series and restarts its clock, so a chart
//! collaborator always plots exactly one motion.
//!
//! # Invariants
//!
//! 1. Each series holds at most `max_points` points; the oldest go first.
//! 2. `time_ms` is measured from the start of the current motion.
//! 3. The zoom level restarts at 1.0 with every motion and stays within
//!    `[min_level, max_level]`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::clock::SessionClock;
use crate::motion::{HistoryEntry, MotionKind};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Capacity and zoom bounds for graph recording.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    /// Points retained per series (default: 500).
    pub max_points: usize,
    /// Lowest zoom level (default: 0.1).
    pub min_level: f64,
    /// Highest zoom level (default: 5.0).
    pub max_level: f64,
    /// Level change per wheel pixel (default: 0.01).
    pub sensitivity: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_points: 500,
            min_level: 0.1,
            max_level: 5.0,
            sensitivity: 0.01,
        }
    }
}

// ---------------------------------------------------------------------------
// Series points
// ---------------------------------------------------------------------------

/// One scroll series point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollPoint {
    pub time_ms: u64,
    pub dx: f64,
    pub dy: f64,
    pub total_x: f64,
    pub total_y: f64,
}

/// One zoom series point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomPoint {
    pub time_ms: u64,
    pub delta: f64,
    pub level: f64,
}

/// A finished motion as written to an export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedMotion {
    pub kind: MotionKind,
    pub x: f64,
    pub y: f64,
    pub zoom_level: Option<f64>,
    pub duration_ms: u64,
    /// RFC 3339.
    pub time: String,
}

impl ExportedMotion {
    /// Convert a history entry, stamping it with its wall-clock end time.
    #[must_use]
    pub fn from_entry(entry: &HistoryEntry, clock: &SessionClock) -> Self {
        Self {
            kind: entry.kind,
            x: entry.accumulated_x,
            y: entry.accumulated_y,
            zoom_level: entry.zoom_level,
            duration_ms: u64::try_from(entry.duration.as_millis()).unwrap_or(u64::MAX),
            time: clock.rfc3339(entry.ended_at),
        }
    }
}

/// Serializable snapshot of both series plus motion history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    /// RFC 3339.
    pub export_time: String,
    pub scroll_data: Vec<ScrollPoint>,
    pub zoom_data: Vec<ZoomPoint>,
    pub history: Vec<ExportedMotion>,
}

impl GraphExport {
    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Suggested download name, e.g. `motion-data-1700000000000.json`.
    #[must_use]
    pub fn file_name(&self, unix_millis: i64) -> String {
        format!("motion-data-{unix_millis}.json")
    }
}

// ---------------------------------------------------------------------------
// GraphRecorder
// ---------------------------------------------------------------------------

/// Bounded scroll and zoom series for the current graph motion.
#[derive(Debug, Clone)]
pub struct GraphRecorder {
    config: GraphConfig,
    scroll: VecDeque<ScrollPoint>,
    zoom: VecDeque<ZoomPoint>,
    started: Option<Instant>,
    level: f64,
}

impl Default for GraphRecorder {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}

impl GraphRecorder {
    #[must_use]
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            scroll: VecDeque::new(),
            zoom: VecDeque::new(),
            started: None,
            level: 1.0,
        }
    }

    /// Start recording a new motion: clear both series and restart the clock.
    pub fn begin(&mut self, now: Instant) {
        self.scroll.clear();
        self.zoom.clear();
        self.started = Some(now);
        self.level = 1.0;
    }

    /// Append a scroll point. `total_*` are the motion's running sums.
    pub fn record_scroll(
        &mut self,
        dx: f64,
        dy: f64,
        total_x: f64,
        total_y: f64,
        now: Instant,
    ) -> ScrollPoint {
        let point = ScrollPoint {
            time_ms: self.elapsed_ms(now),
            dx,
            dy,
            total_x,
            total_y,
        };
        push_bounded(&mut self.scroll, point, self.config.max_points);
        point
    }

    /// Apply a ctrl-wheel delta to the zoom level and append a point.
    pub fn record_zoom(&mut self, dy: f64, now: Instant) -> ZoomPoint {
        let delta = -dy * self.config.sensitivity;
        self.level = (self.level + delta).clamp(self.config.min_level, self.config.max_level);
        let point = ZoomPoint {
            time_ms: self.elapsed_ms(now),
            delta,
            level: self.level,
        };
        push_bounded(&mut self.zoom, point, self.config.max_points);
        point
    }

    /// Drop both series.
    pub fn clear(&mut self) {
        self.scroll.clear();
        self.zoom.clear();
        self.started = None;
    }

    /// Build an export document from the series and the given history.
    pub fn export<'a>(
        &self,
        clock: &SessionClock,
        now: Instant,
        history: impl IntoIterator<Item = &'a HistoryEntry>,
    ) -> GraphExport {
        GraphExport {
            export_time: clock.rfc3339(now),
            scroll_data: self.scroll.iter().copied().collect(),
            zoom_data: self.zoom.iter().copied().collect(),
            history: history
                .into_iter()
                .map(|h| ExportedMotion::from_entry(h, clock))
                .collect(),
        }
    }

    #[must_use]
    pub fn scroll_points(&self) -> &VecDeque<ScrollPoint> {
        &self.scroll
    }

    #[must_use]
    pub fn zoom_points(&self) -> &VecDeque<ZoomPoint> {
        &self.zoom
    }

    /// Zoom level of the current motion.
    #[inline]
    #[must_use]
    pub fn level(&self) -> f64 {
        self.level
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn elapsed_ms(&self, now: Instant) -> u64 {
        self.started.map_or(0, |s| {
            u64::try_from(now.saturating_duration_since(s).as_millis()).unwrap_or(u64::MAX)
        })
    }
}

fn push_bounded<T>(buf: &mut VecDeque<T>, item: T, cap: usize) {
    if cap == 0 {
        return;
    }
    if buf.len() == cap {
        buf.pop_front();
    }
    buf.push_back(item);
}
