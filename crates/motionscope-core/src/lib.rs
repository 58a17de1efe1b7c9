#![forbid(unsafe_code)]

//! Core: scroll, zoom and gesture classification with end-of-motion detection.
//!
//! # Role in MotionScope
//! `motionscope-core` turns a noisy, multi-source stream of browser input
//! (wheel deltas, scroll-position snapshots, touch contacts, pointer and mouse
//! events) into semantic state: which motion is in flight, in which
//! direction, when it ended, and whether a position change was a programmatic
//! jump rather than a gesture.
//!
//! # Primary responsibilities
//! - **SourceArbiter**: one normalized sample stream from seven sources, with
//!   a noise floor and wheel-echo debounce.
//! - **JumpDetector**: teleport detection and the tracking cooldown.
//! - **MotionAccumulator**: per-view motions, lifetime totals, history.
//! - **DirectionTracker / ActivityTracker**: discrete lifecycle events and a
//!   status label.
//! - **GestureRecognizer**: pinch, two-finger scroll, N-finger swipe and
//!   ctrl-wheel pinch emulation.
//! - **InputSession**: the single dispatch loop tying it all together.
//!
//! # How it fits in the system
//! Hosts translate platform events into [`InputEvent`]s and feed them to an
//! [`InputSession`] with an explicit timestamp. Output leaves through
//! [`Notification`]s and the optional sinks in [`sink`]. The `motionscope`
//! binary replays recorded [`trace`] files through the same session.

pub mod activity;
pub mod arbiter;
pub mod clock;
pub mod config;
pub mod direction;
pub mod event;
pub mod gesture;
pub mod graph;
pub mod jump;
pub mod log;
pub mod motion;
pub mod sample;
pub mod session;
pub mod sink;
pub mod timer;
pub mod trace;
pub mod view;
pub mod viewport;

pub use clock::SessionClock;
pub use config::{ConfigError, EngineConfig};
pub use event::InputEvent;
pub use session::{InputSession, Notification};
pub use view::ViewKind;
