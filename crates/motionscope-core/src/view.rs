#![forbid(unsafe_code)]

//! Per-view input state.
//!
//! Each demo view owns an independent [`ViewState`]: its own motion,
//! direction channels, activity label and event log. Views never read or
//! write each other's state; only the jump guard is shared, and that lives in
//! the session.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activity::ActivityTracker;
use crate::config::EngineConfig;
use crate::direction::DirectionTracker;
use crate::event::{MouseButton, Point};
use crate::log::EventLog;
use crate::motion::MotionAccumulator;
use crate::sample::Source;
use crate::viewport::{MapController, ZoomViewport};

/// The demo views that track input independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// Raw event dashboard.
    #[default]
    Debug,
    /// Simulated document with a zoomable article.
    Browse,
    /// Simulated map with drag, zoom and pins.
    Maps,
    /// Live motion graphs.
    Graph,
}

impl ViewKind {
    pub const ALL: [Self; 4] = [Self::Debug, Self::Browse, Self::Maps, Self::Graph];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Browse => "browse",
            Self::Maps => "maps",
            Self::Graph => "graph",
        }
    }

    #[must_use]
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Debug => 0,
            Self::Browse => 1,
            Self::Maps => 2,
            Self::Graph => 3,
        }
    }
}

impl std::fmt::Display for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown view name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown view `{0}` (expected debug, browse, maps or graph)")]
pub struct ParseViewError(pub String);

impl FromStr for ViewKind {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseViewError(s.to_string()))
    }
}

/// The zoomable surface a view carries, if any.
#[derive(Debug, Clone)]
pub enum Surface {
    Plain,
    Article(ZoomViewport),
    Map(MapController),
}

impl Surface {
    /// Current zoom of the surface, `None` for plain views.
    #[must_use]
    pub fn zoom(&self) -> Option<f64> {
        match self {
            Self::Plain => None,
            Self::Article(v) => Some(v.zoom()),
            Self::Map(m) => Some(m.viewport().zoom()),
        }
    }
}

/// Everything one view tracks.
#[derive(Debug, Clone)]
pub struct ViewState {
    kind: ViewKind,
    pub(crate) motion: MotionAccumulator,
    pub(crate) direction: DirectionTracker,
    pub(crate) activity: ActivityTracker,
    pub(crate) log: EventLog,
    pub(crate) surface: Surface,
    pub(crate) last_source: Option<Source>,
    pub(crate) last_button: Option<MouseButton>,
    pub(crate) last_mouse: Option<Point>,
}

impl ViewState {
    /// Fresh state for `kind` built from `config`.
    #[must_use]
    pub fn new(kind: ViewKind, config: &EngineConfig) -> Self {
        let surface = match kind {
            ViewKind::Browse => Surface::Article(ZoomViewport::new(config.viewport.article)),
            ViewKind::Maps => Surface::Map(MapController::new(config.viewport.map)),
            ViewKind::Debug | ViewKind::Graph => Surface::Plain,
        };
        Self {
            kind,
            motion: MotionAccumulator::new(config.to_motion_config()),
            direction: DirectionTracker::new(),
            activity: ActivityTracker::new(config.activity_idle_delay()),
            log: EventLog::new(config.log.capacity),
            surface,
            last_source: None,
            last_button: None,
            last_mouse: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn motion(&self) -> &MotionAccumulator {
        &self.motion
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> &DirectionTracker {
        &self.direction
    }

    #[inline]
    #[must_use]
    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    #[inline]
    #[must_use]
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    #[inline]
    #[must_use]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Source of the most recent accepted scroll sample.
    #[inline]
    #[must_use]
    pub fn last_source(&self) -> Option<Source> {
        self.last_source
    }

    /// Button of the most recent press.
    #[inline]
    #[must_use]
    pub fn last_button(&self) -> Option<MouseButton> {
        self.last_button
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_view_names() {
        assert_eq!("maps".parse::<ViewKind>(), Ok(ViewKind::Maps));
        assert_eq!(" Graph ".parse::<ViewKind>(), Ok(ViewKind::Graph));
        let err = "shapes".parse::<ViewKind>().unwrap_err();
        assert!(err.to_string().contains("shapes"));
    }

    #[test]
    fn surfaces_follow_view_kind() {
        let config = EngineConfig::default();
        assert!(matches!(
            ViewState::new(ViewKind::Browse, &config).surface(),
            Surface::Article(_)
        ));
        assert!(matches!(
            ViewState::new(ViewKind::Maps, &config).surface(),
            Surface::Map(_)
        ));
        let debug = ViewState::new(ViewKind::Debug, &config);
        assert_eq!(debug.surface().zoom(), None);
        assert_eq!(debug.log().capacity(), 50);
    }

    #[test]
    fn indices_are_distinct() {
        let mut seen: Vec<usize> = ViewKind::ALL.iter().map(|v| v.index()).collect();
        seen.dedup();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }
}
