#![forbid(unsafe_code)]

//! Input trace recording and replay.
//!
//! A trace is JSONL: one [`TraceRecord`] per line, tagged by `event`. The
//! first line is a `trace_header`, the last a `trace_summary`. Input records
//! carry a millisecond offset from the start of the recording, so a replay
//! reproduces every quiet period and cooldown exactly.
//!
//! # Example
//!
//! ```ignore
//! let mut writer = TraceWriter::new(Vec::new(), "scroll-then-pinch")?;
//! writer.input(0, &InputEvent::Wheel(WheelInput::new(0.0, 40.0)))?;
//! writer.advance(800)?;
//! let bytes = writer.finish()?;
//!
//! let trace = TraceFile::parse(std::str::from_utf8(&bytes)?)?;
//! let mut replayer = Replayer::from_trace(&trace);
//! while let Some(step) = replayer.next_step() { /* feed the session */ }
//! ```

use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use web_time::{Duration, Instant};

use crate::event::InputEvent;
use crate::session::{InputSession, Notification};
use crate::view::ViewKind;

/// Current schema version for trace files.
pub const SCHEMA_VERSION: &str = "motion-trace-v1";

/// Longest offset a trace may carry (one week).
pub const MAX_OFFSET_MS: u64 = 7 * 24 * 60 * 60 * 1000;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One line of a trace file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum TraceRecord {
    #[serde(rename = "trace_header")]
    Header {
        schema_version: String,
        session_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        view: Option<ViewKind>,
    },

    /// An input event at `t_ms` after the start.
    #[serde(rename = "input")]
    Input { t_ms: u64, input: InputEvent },

    /// The host switched views.
    #[serde(rename = "view")]
    View { t_ms: u64, view: ViewKind },

    /// Time passed with no input; timers due by `t_ms` fire.
    #[serde(rename = "advance")]
    Advance { t_ms: u64 },

    #[serde(rename = "trace_summary")]
    Summary {
        total_events: u64,
        total_duration_ms: u64,
    },
}

impl TraceRecord {
    /// Offset of a timed record.
    #[must_use]
    pub fn t_ms(&self) -> Option<u64> {
        match self {
            Self::Input { t_ms, .. } | Self::View { t_ms, .. } | Self::Advance { t_ms } => {
                Some(*t_ms)
            }
            Self::Header { .. } | Self::Summary { .. } => None,
        }
    }
}

/// Errors reading a trace.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: timestamp {t_ms}ms goes backwards (previous {previous}ms)")]
    OutOfOrder { line: usize, t_ms: u64, previous: u64 },
    #[error("unsupported trace schema `{0}`")]
    Schema(String),
    #[error("line {line}: offset {t_ms}ms exceeds {MAX_OFFSET_MS}ms")]
    OutOfRange { line: usize, t_ms: u64 },
}

// ---------------------------------------------------------------------------
// TraceWriter
// ---------------------------------------------------------------------------

/// Writes trace records as JSONL.
pub struct TraceWriter<W: Write> {
    writer: BufWriter<W>,
    event_count: u64,
    last_t_ms: u64,
}

impl TraceWriter<std::fs::File> {
    /// Create a trace file at `path`.
    pub fn create(path: impl AsRef<Path>, session_name: &str) -> io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Self::new(file, session_name)
    }
}

impl<W: Write> TraceWriter<W> {
    /// Wrap a writer and emit the header.
    pub fn new(writer: W, session_name: &str) -> io::Result<Self> {
        let mut this = Self {
            writer: BufWriter::new(writer),
            event_count: 0,
            last_t_ms: 0,
        };
        this.write_record(&TraceRecord::Header {
            schema_version: SCHEMA_VERSION.to_string(),
            session_name: session_name.to_string(),
            view: None,
        })?;
        Ok(this)
    }

    pub fn input(&mut self, t_ms: u64, input: &InputEvent) -> io::Result<()> {
        self.write_record(&TraceRecord::Input {
            t_ms,
            input: input.clone(),
        })
    }

    pub fn view(&mut self, t_ms: u64, view: ViewKind) -> io::Result<()> {
        self.write_record(&TraceRecord::View { t_ms, view })
    }

    pub fn advance(&mut self, t_ms: u64) -> io::Result<()> {
        self.write_record(&TraceRecord::Advance { t_ms })
    }

    /// Write any record.
    pub fn write_record(&mut self, record: &TraceRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record).map_err(io::Error::other)?;
        self.writer.write_all(b"\n")?;
        if let Some(t) = record.t_ms() {
            self.last_t_ms = self.last_t_ms.max(t);
            self.event_count += 1;
        }
        Ok(())
    }

    #[inline]
    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Write the summary, flush, and return the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        let summary = TraceRecord::Summary {
            total_events: self.event_count,
            total_duration_ms: self.last_t_ms,
        };
        serde_json::to_writer(&mut self.writer, &summary).map_err(io::Error::other)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// TraceFile
// ---------------------------------------------------------------------------

/// A parsed trace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceFile {
    records: Vec<TraceRecord>,
}

impl TraceFile {
    /// Parse JSONL text. Blank lines are skipped.
    ///
    /// Timed records must be in non-decreasing `t_ms` order and no later than
    /// [`MAX_OFFSET_MS`]. A header, if present, must carry the current schema
    /// version.
    pub fn parse(text: &str) -> Result<Self, TraceError> {
        let mut records = Vec::new();
        let mut previous = 0u64;
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            if raw.trim().is_empty() {
                continue;
            }
            let record: TraceRecord = serde_json::from_str(raw)
                .map_err(|source| TraceError::Parse { line, source })?;
            if let TraceRecord::Header { schema_version, .. } = &record
                && schema_version != SCHEMA_VERSION
            {
                return Err(TraceError::Schema(schema_version.clone()));
            }
            if let Some(t_ms) = record.t_ms() {
                if t_ms > MAX_OFFSET_MS {
                    return Err(TraceError::OutOfRange { line, t_ms });
                }
                if t_ms < previous {
                    return Err(TraceError::OutOfOrder {
                        line,
                        t_ms,
                        previous,
                    });
                }
                previous = t_ms;
            }
            records.push(record);
        }
        Ok(Self { records })
    }

    /// Read and parse a trace file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    #[inline]
    #[must_use]
    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    #[must_use]
    pub fn header(&self) -> Option<&TraceRecord> {
        self.records
            .first()
            .filter(|r| matches!(r, TraceRecord::Header { .. }))
    }

    #[must_use]
    pub fn session_name(&self) -> Option<&str> {
        match self.header()? {
            TraceRecord::Header { session_name, .. } => Some(session_name),
            _ => None,
        }
    }

    /// Initial view named by the header.
    #[must_use]
    pub fn initial_view(&self) -> Option<ViewKind> {
        match self.header()? {
            TraceRecord::Header { view, .. } => *view,
            _ => None,
        }
    }

    /// Timed steps in order.
    #[must_use]
    pub fn steps(&self) -> Vec<Step> {
        self.records.iter().filter_map(Step::from_record).collect()
    }

    /// Offset of the last timed record.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.records.iter().filter_map(TraceRecord::t_ms).max().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Replayer
// ---------------------------------------------------------------------------

/// What to do at one point of a replay.
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    Input(InputEvent),
    View(ViewKind),
    Advance,
}

/// A timed replay step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub t_ms: u64,
    pub kind: StepKind,
}

impl Step {
    fn from_record(record: &TraceRecord) -> Option<Self> {
        let (t_ms, kind) = match record {
            TraceRecord::Input { t_ms, input } => (*t_ms, StepKind::Input(input.clone())),
            TraceRecord::View { t_ms, view } => (*t_ms, StepKind::View(*view)),
            TraceRecord::Advance { t_ms } => (*t_ms, StepKind::Advance),
            TraceRecord::Header { .. } | TraceRecord::Summary { .. } => return None,
        };
        Some(Self { t_ms, kind })
    }

    /// Instant of this step for a replay started at `origin`.
    #[must_use]
    pub fn at(&self, origin: Instant) -> Instant {
        origin + Duration::from_millis(self.t_ms)
    }

    /// Feed this step to `session` as if it happened now.
    pub fn apply(&self, session: &mut InputSession, origin: Instant) -> Vec<Notification> {
        let now = self.at(origin);
        match &self.kind {
            StepKind::Input(input) => session.dispatch(input, now),
            StepKind::View(view) => {
                let out = session.advance(now);
                session.set_active_view(*view);
                out
            }
            StepKind::Advance => session.advance(now),
        }
    }
}

/// Yields trace steps in recorded order.
#[derive(Debug, Clone)]
pub struct Replayer {
    steps: Vec<Step>,
    position: usize,
}

impl Replayer {
    #[must_use]
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps, position: 0 }
    }

    #[must_use]
    pub fn from_trace(trace: &TraceFile) -> Self {
        Self::new(trace.steps())
    }

    pub fn next_step(&mut self) -> Option<Step> {
        let step = self.steps.get(self.position)?.clone();
        self.position += 1;
        Some(step)
    }

    #[must_use]
    pub fn peek(&self) -> Option<&Step> {
        self.steps.get(self.position)
    }

    /// Consume every step with `t_ms <= until_ms`.
    pub fn advance_until(&mut self, until_ms: u64) -> Vec<Step> {
        let mut out = Vec::new();
        while self.peek().is_some_and(|s| s.t_ms <= until_ms) {
            if let Some(step) = self.next_step() {
                out.push(step);
            }
        }
        out
    }

    /// Consume everything left.
    pub fn drain_all(&mut self) -> Vec<Step> {
        let rest = self.steps[self.position..].to_vec();
        self.position = self.steps.len();
        rest
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.position >= self.steps.len()
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.steps.len()
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }
}
