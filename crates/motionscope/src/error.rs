use std::io;
use std::path::PathBuf;

use motionscope_core::ConfigError;
use motionscope_core::trace::TraceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("trace {path}: {source}")]
    Trace {
        path: PathBuf,
        #[source]
        source: TraceError,
    },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),

    #[error("{message}")]
    Exit { code: i32, message: String },
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn trace(path: impl Into<PathBuf>, source: TraceError) -> Self {
        Self::Trace {
            path: path.into(),
            source,
        }
    }

    pub fn exit(code: i32, message: impl Into<String>) -> Self {
        Self::Exit {
            code,
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::Config(_) => 3,
            Self::Trace { .. } => 4,
            Self::Io { .. } => 5,
            Self::Json(_) => 6,
            Self::Exit { code, .. } => *code,
        }
    }
}
