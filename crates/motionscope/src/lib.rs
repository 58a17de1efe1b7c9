#![forbid(unsafe_code)]

//! Command-line front end for `motionscope-core`.
//!
//! Replays JSONL input traces through an `InputSession`, prints the per-view
//! event log and motion history, exports graph data, and prints or checks
//! engine configuration.

pub mod cli;
pub mod config_cmd;
pub mod error;
pub mod inspect;
pub mod replay;

pub use cli::run_from_env;
pub use error::{CliError, Result};
