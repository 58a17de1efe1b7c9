#![forbid(unsafe_code)]

//! Engine configuration as data.
//!
//! Every threshold, delay and capacity the engine uses lives in one
//! [`EngineConfig`] that can be loaded from TOML or JSON. Sections map onto
//! the per-component config structs through the `to_*` methods.
//!
//! # Loading
//!
//! ```toml
//! # motionscope.toml
//! [jump]
//! threshold = 800.0
//!
//! [motion]
//! quiet_period_ms = 400
//! ```
//!
//! ```rust,ignore
//! let config = EngineConfig::from_toml_file("motionscope.toml")?;
//! let config = EngineConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! `EngineConfig::default()` reproduces the built-in defaults of every
//! component. Partial files override only the fields they name.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::Duration;

use crate::arbiter::ArbiterConfig;
use crate::gesture::GestureConfig;
use crate::graph::GraphConfig;
use crate::jump::JumpConfig;
use crate::motion::MotionConfig;
use crate::viewport::ViewportConfig;

// ---------------------------------------------------------------------------
// Top-level EngineConfig
// ---------------------------------------------------------------------------

/// All tunables of the input engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub arbiter: ArbiterSection,
    pub jump: JumpSection,
    pub motion: MotionSection,
    pub direction: DirectionSection,
    pub activity: ActivitySection,
    pub gesture: GestureSection,
    pub log: LogSection,
    pub graph: GraphSection,
    pub viewport: ViewportSection,
}

impl EngineConfig {
    /// Parse from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = read(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Parse from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = read(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Load by extension: `.json` is JSON, anything else TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            Self::from_json_file(path)
        } else {
            Self::from_toml_file(path)
        }
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Collect every problem with the values. Empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(self.arbiter.noise_floor >= 0.0) {
            errors.push(format!(
                "arbiter.noise_floor must be >= 0, got {}",
                self.arbiter.noise_floor
            ));
        }
        if !(self.jump.threshold > 0.0) {
            errors.push(format!("jump.threshold must be > 0, got {}", self.jump.threshold));
        }
        if self.jump.threshold <= self.arbiter.noise_floor {
            errors.push(format!(
                "jump.threshold ({}) must exceed arbiter.noise_floor ({})",
                self.jump.threshold, self.arbiter.noise_floor
            ));
        }
        if self.motion.quiet_period_ms == 0 {
            errors.push("motion.quiet_period_ms must be > 0".to_string());
        }
        if self.direction.end_delay_ms == 0 {
            errors.push("direction.end_delay_ms must be > 0".to_string());
        }
        if self.activity.idle_delay_ms == 0 {
            errors.push("activity.idle_delay_ms must be > 0".to_string());
        }

        let g = &self.gesture;
        if !(g.pinch_in_below > 0.0 && g.pinch_in_below < 1.0) {
            errors.push(format!(
                "gesture.pinch_in_below must be in (0, 1), got {}",
                g.pinch_in_below
            ));
        }
        if !(g.pinch_out_above > 1.0) {
            errors.push(format!(
                "gesture.pinch_out_above must be > 1, got {}",
                g.pinch_out_above
            ));
        }
        if !(g.min_scale > 0.0 && g.min_scale < g.max_scale) {
            errors.push(format!(
                "gesture scale bounds must satisfy 0 < min_scale < max_scale, got [{}, {}]",
                g.min_scale, g.max_scale
            ));
        }
        if g.swipe_threshold < 0.0 || g.two_finger_scroll_threshold < 0.0 {
            errors.push("gesture thresholds must be >= 0".to_string());
        }

        if self.log.capacity == 0 {
            errors.push("log.capacity must be > 0".to_string());
        }
        if self.graph.max_points == 0 {
            errors.push("graph.max_points must be > 0".to_string());
        }
        if !(self.graph.min_level > 0.0 && self.graph.min_level < self.graph.max_level) {
            errors.push(format!(
                "graph level bounds must satisfy 0 < min_level < max_level, got [{}, {}]",
                self.graph.min_level, self.graph.max_level
            ));
        }
        for (name, vp) in [("article", &self.viewport.article), ("map", &self.viewport.map)] {
            if !(vp.min_zoom > 0.0 && vp.min_zoom <= 1.0 && vp.max_zoom >= 1.0) {
                errors.push(format!(
                    "viewport.{name} zoom bounds must bracket 1.0 with min_zoom > 0, got [{}, {}]",
                    vp.min_zoom, vp.max_zoom
                ));
            }
        }

        errors
    }

    /// Load and validate in one step.
    pub fn load_validated(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::from_file(path)?;
        let problems = config.validate();
        if problems.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    #[must_use]
    pub fn to_arbiter_config(&self) -> ArbiterConfig {
        ArbiterConfig {
            noise_floor: self.arbiter.noise_floor,
            wheel_debounce: ms(self.arbiter.wheel_debounce_ms),
        }
    }

    #[must_use]
    pub fn to_jump_config(&self) -> JumpConfig {
        JumpConfig {
            threshold: self.jump.threshold,
            cooldown: ms(self.jump.cooldown_ms),
            include_wheel: self.jump.include_wheel,
        }
    }

    #[must_use]
    pub fn to_motion_config(&self) -> MotionConfig {
        MotionConfig {
            quiet_period: ms(self.motion.quiet_period_ms),
            history_capacity: self.motion.history_capacity,
        }
    }

    #[must_use]
    pub fn direction_end_delay(&self) -> Duration {
        ms(self.direction.end_delay_ms)
    }

    #[must_use]
    pub fn activity_idle_delay(&self) -> Duration {
        ms(self.activity.idle_delay_ms)
    }

    #[must_use]
    pub fn to_gesture_config(&self) -> GestureConfig {
        let g = &self.gesture;
        GestureConfig {
            pinch_out_above: g.pinch_out_above,
            pinch_in_below: g.pinch_in_below,
            scroll_scale_tolerance: g.scroll_scale_tolerance,
            two_finger_scroll_threshold: g.two_finger_scroll_threshold,
            swipe_threshold: g.swipe_threshold,
            pinch_wheel_timeout: ms(g.pinch_wheel_timeout_ms),
            wheel_sensitivity: g.wheel_sensitivity,
            min_scale: g.min_scale,
            max_scale: g.max_scale,
            reset_delay: ms(g.reset_delay_ms),
        }
    }

    #[must_use]
    pub fn to_graph_config(&self) -> GraphConfig {
        GraphConfig {
            max_points: self.graph.max_points,
            min_level: self.graph.min_level,
            max_level: self.graph.max_level,
            sensitivity: self.graph.sensitivity,
        }
    }
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Source arbitration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterSection {
    /// Per-axis noise floor for non-wheel sources, in pixels.
    pub noise_floor: f64,
    /// Window after a wheel event in which other sources are echoes.
    pub wheel_debounce_ms: u64,
}

impl Default for ArbiterSection {
    fn default() -> Self {
        let c = ArbiterConfig::default();
        Self {
            noise_floor: c.noise_floor,
            wheel_debounce_ms: c.wheel_debounce.as_millis() as u64,
        }
    }
}

/// Jump detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpSection {
    pub threshold: f64,
    pub cooldown_ms: u64,
    pub include_wheel: bool,
}

impl Default for JumpSection {
    fn default() -> Self {
        let c = JumpConfig::default();
        Self {
            threshold: c.threshold,
            cooldown_ms: c.cooldown.as_millis() as u64,
            include_wheel: c.include_wheel,
        }
    }
}

/// Motion accumulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSection {
    pub quiet_period_ms: u64,
    pub history_capacity: usize,
}

impl Default for MotionSection {
    fn default() -> Self {
        let c = MotionConfig::default();
        Self {
            quiet_period_ms: c.quiet_period.as_millis() as u64,
            history_capacity: c.history_capacity,
        }
    }
}

/// Direction channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionSection {
    pub end_delay_ms: u64,
}

impl Default for DirectionSection {
    fn default() -> Self {
        Self {
            end_delay_ms: crate::direction::DEFAULT_END_DELAY.as_millis() as u64,
        }
    }
}

/// Activity label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivitySection {
    pub idle_delay_ms: u64,
}

impl Default for ActivitySection {
    fn default() -> Self {
        Self {
            idle_delay_ms: crate::activity::DEFAULT_IDLE_DELAY.as_millis() as u64,
        }
    }
}

/// Gesture recognition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSection {
    pub pinch_out_above: f64,
    pub pinch_in_below: f64,
    pub scroll_scale_tolerance: f64,
    pub two_finger_scroll_threshold: f64,
    pub swipe_threshold: f64,
    pub pinch_wheel_timeout_ms: u64,
    pub wheel_sensitivity: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub reset_delay_ms: u64,
}

impl Default for GestureSection {
    fn default() -> Self {
        let c = GestureConfig::default();
        Self {
            pinch_out_above: c.pinch_out_above,
            pinch_in_below: c.pinch_in_below,
            scroll_scale_tolerance: c.scroll_scale_tolerance,
            two_finger_scroll_threshold: c.two_finger_scroll_threshold,
            swipe_threshold: c.swipe_threshold,
            pinch_wheel_timeout_ms: c.pinch_wheel_timeout.as_millis() as u64,
            wheel_sensitivity: c.wheel_sensitivity,
            min_scale: c.min_scale,
            max_scale: c.max_scale,
            reset_delay_ms: c.reset_delay.as_millis() as u64,
        }
    }
}

/// User-facing event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub capacity: usize,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            capacity: crate::log::DEFAULT_LOG_CAPACITY,
        }
    }
}

/// Graph recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSection {
    pub max_points: usize,
    pub min_level: f64,
    pub max_level: f64,
    pub sensitivity: f64,
}

impl Default for GraphSection {
    fn default() -> Self {
        let c = GraphConfig::default();
        Self {
            max_points: c.max_points,
            min_level: c.min_level,
            max_level: c.max_level,
            sensitivity: c.sensitivity,
        }
    }
}

/// Article and map zoom bounds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSection {
    pub article: ViewportConfig,
    pub map: ViewportConfig,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from loading an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {}", .0.join("; "))]
    Invalid(Vec<String>),
}
