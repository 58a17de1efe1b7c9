#![forbid(unsafe_code)]

//! Bounded, categorized event log shown to the user.
//!
//! This is product output, not diagnostics: diagnostics go through `tracing`.
//! Each view keeps its own [`EventLog`]; entries are stored newest first and
//! the oldest entry is evicted once the capacity is reached.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default number of retained log entries.
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// Category tag of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogCategory {
    Scroll,
    ScrollX,
    ScrollY,
    Zoom,
    Pointer,
    Touch,
    Mouse,
}

impl LogCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scroll => "scroll",
            Self::ScrollX => "scroll-x",
            Self::ScrollY => "scroll-y",
            Self::Zoom => "zoom",
            Self::Pointer => "pointer",
            Self::Touch => "touch",
            Self::Mouse => "mouse",
        }
    }
}

impl std::fmt::Display for LogCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// `HH:MM:SS.mmm`.
    pub timestamp: String,
    pub category: LogCategory,
    pub message: String,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {:<8} {}", self.timestamp, self.category, self.message)
    }
}

/// Ring buffer of log entries, newest first.
#[derive(Debug, Clone)]
pub struct EventLog {
    capacity: usize,
    entries: VecDeque<LogEntry>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl EventLog {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Prepend an entry, evicting the oldest past capacity.
    pub fn push(&mut self, entry: LogEntry) {
        if self.capacity == 0 {
            return;
        }
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
