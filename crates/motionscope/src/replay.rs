//! `motionscope replay`: run a recorded trace through an `InputSession`.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::Args;
use motionscope_core::activity::Activity;
use motionscope_core::graph::ExportedMotion;
use motionscope_core::motion::Totals;
use motionscope_core::trace::{Replayer, TraceFile};
use motionscope_core::{EngineConfig, InputSession, Notification, SessionClock, ViewKind};
use serde::Serialize;
use tracing::{debug, info};
use web_time::{Duration, Instant};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// JSONL trace to replay.
    pub trace: PathBuf,

    /// Engine configuration (TOML or JSON).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Start in this view instead of the trace's own.
    #[arg(long)]
    pub view: Option<ViewKind>,

    /// Wall-clock start of the replay (RFC 3339); defaults to now.
    #[arg(long)]
    pub start: Option<DateTime<Utc>>,

    /// Write the graph export document to this file or directory.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Keep the final quiet periods from firing.
    #[arg(long = "no-settle")]
    pub no_settle: bool,
}

/// Per-view outcome of a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewReport {
    pub view: ViewKind,
    pub totals: Totals,
    pub activity: Activity,
    pub zoom: Option<f64>,
    pub log: Vec<String>,
    pub history: Vec<ExportedMotion>,
}

/// Everything `replay` prints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub session_name: Option<String>,
    pub steps: usize,
    pub duration_ms: u64,
    pub notifications: usize,
    pub motions_ended: usize,
    pub jumps: usize,
    pub views: Vec<ViewReport>,
}

/// Replay `trace` and return the finished session with its notifications.
///
/// When `settle` is set the session is advanced past every pending deadline
/// after the last step, so in-flight motions are finalized.
pub fn replay_session(
    trace: &TraceFile,
    config: EngineConfig,
    view: Option<ViewKind>,
    wall_start: DateTime<Utc>,
    settle: bool,
) -> (InputSession, Vec<Notification>, Instant) {
    let origin = Instant::now();
    let mut session = InputSession::new(config, SessionClock::new(origin, wall_start));
    if let Some(view) = view.or_else(|| trace.initial_view()) {
        session.set_active_view(view);
    }

    let mut out = Vec::new();
    let mut replayer = Replayer::from_trace(trace);
    while let Some(step) = replayer.next_step() {
        out.extend(step.apply(&mut session, origin));
    }

    let mut end = origin + Duration::from_millis(trace.duration_ms());
    if settle {
        while let Some(deadline) = session.next_deadline() {
            end = end.max(deadline);
            out.extend(session.advance(end));
        }
    }
    debug!(
        steps = replayer.total(),
        notifications = out.len(),
        "replay finished"
    );
    (session, out, end)
}

/// Summarize a finished session.
#[must_use]
pub fn build_report(trace: &TraceFile, session: &InputSession, out: &[Notification]) -> ReplayReport {
    let views = ViewKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let view = session.view(kind);
            let totals = view.motion().totals();
            let untouched = view.log().is_empty()
                && view.motion().history().len() == 0
                && totals.x == 0.0
                && totals.y == 0.0;
            if untouched && kind != session.active_view() {
                return None;
            }
            // Oldest first, like a console.
            let mut log: Vec<String> = view.log().entries().map(ToString::to_string).collect();
            log.reverse();
            Some(ViewReport {
                view: kind,
                totals,
                activity: view.activity().current(),
                zoom: view.surface().zoom(),
                log,
                history: view
                    .motion()
                    .history()
                    .map(|entry| ExportedMotion::from_entry(entry, session.clock()))
                    .collect(),
            })
        })
        .collect();

    ReplayReport {
        session_name: trace.session_name().map(str::to_string),
        steps: trace.steps().len(),
        duration_ms: trace.duration_ms(),
        notifications: out.len(),
        motions_ended: out
            .iter()
            .filter(|n| matches!(n, Notification::MotionEnded { .. }))
            .count(),
        jumps: out
            .iter()
            .filter(|n| matches!(n, Notification::Jump { .. }))
            .count(),
        views,
    }
}

/// Human-readable report.
#[must_use]
pub fn render_text(report: &ReplayReport) -> String {
    let mut s = String::new();
    let name = report.session_name.as_deref().unwrap_or("(unnamed)");
    let _ = writeln!(
        s,
        "trace {name}: {} steps over {}ms, {} notifications, {} motions, {} jumps",
        report.steps, report.duration_ms, report.notifications, report.motions_ended, report.jumps
    );
    for view in &report.views {
        let _ = writeln!(s);
        let _ = writeln!(
            s,
            "== {} == totals ({:.0}, {:.0}) activity {}",
            view.view, view.totals.x, view.totals.y, view.activity
        );
        if let Some(zoom) = view.zoom {
            let _ = writeln!(s, "zoom {:.0}%", zoom * 100.0);
        }
        for line in &view.log {
            let _ = writeln!(s, "  {line}");
        }
        if !view.history.is_empty() {
            let _ = writeln!(s, "history:");
            for m in &view.history {
                match m.zoom_level {
                    Some(level) => {
                        let _ = writeln!(s, "  {} {:.2}x {}ms", m.kind.as_str(), level, m.duration_ms);
                    }
                    None => {
                        let _ = writeln!(
                            s,
                            "  {} ({:.0}, {:.0}) {}ms",
                            m.kind.as_str(),
                            m.x,
                            m.y,
                            m.duration_ms
                        );
                    }
                }
            }
        }
    }
    s
}

fn export_path(target: &Path, file_name: &str) -> PathBuf {
    if target.is_dir() {
        target.join(file_name)
    } else {
        target.to_path_buf()
    }
}

pub fn run_replay(args: ReplayArgs) -> Result<()> {
    let trace = TraceFile::open(&args.trace).map_err(|e| CliError::trace(&args.trace, e))?;
    let config = match &args.config {
        Some(path) => EngineConfig::load_validated(path)?,
        None => EngineConfig::default(),
    };
    let wall_start = args.start.unwrap_or_else(Utc::now);
    info!(trace = %args.trace.display(), steps = trace.steps().len(), "replaying");

    let (session, out, end) = replay_session(&trace, config, args.view, wall_start, !args.no_settle);
    let report = build_report(&trace, &session, &out);

    if let Some(target) = &args.export {
        let doc = session.export_graph(end);
        let path = export_path(target, &doc.file_name(session.clock().wall(end).timestamp_millis()));
        fs::write(&path, doc.to_json_pretty()?).map_err(|e| CliError::io(&path, e))?;
        info!(path = %path.display(), "graph exported");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const TRACE: &str = r#"
{"event":"trace_header","schema_version":"motion-trace-v1","session_name":"unit"}
{"event":"input","t_ms":0,"input":{"kind":"wheel","dx":0.0,"dy":100.0}}
{"event":"input","t_ms":80,"input":{"kind":"wheel","dx":0.0,"dy":120.0}}
{"event":"advance","t_ms":200}
"#;

    fn wall() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
            .single()
            .expect("valid date")
    }

    #[test]
    fn settle_finalizes_trailing_motion() {
        let trace = TraceFile::parse(TRACE).expect("parse");
        let (session, out, _) = replay_session(&trace, EngineConfig::default(), None, wall(), true);
        let report = build_report(&trace, &session, &out);
        assert_eq!(report.motions_ended, 1);
        assert_eq!(report.views.len(), 1);
        let debug = &report.views[0];
        assert_eq!(debug.view, ViewKind::Debug);
        assert_eq!(debug.history.len(), 1);
        assert_eq!(debug.history[0].y, 220.0);
        assert_eq!(debug.history[0].duration_ms, 80);
        assert_eq!(debug.history[0].time, "2024-06-01T12:00:00.080Z");
    }

    #[test]
    fn no_settle_leaves_motion_open() {
        let trace = TraceFile::parse(TRACE).expect("parse");
        let (session, out, _) = replay_session(&trace, EngineConfig::default(), None, wall(), false);
        assert!(session.view(ViewKind::Debug).motion().is_active());
        assert_eq!(build_report(&trace, &session, &out).motions_ended, 0);
    }

    #[test]
    fn view_override_wins() {
        let trace = TraceFile::parse(TRACE).expect("parse");
        let (session, out, _) =
            replay_session(&trace, EngineConfig::default(), Some(ViewKind::Graph), wall(), true);
        assert_eq!(session.active_view(), ViewKind::Graph);
        let report = build_report(&trace, &session, &out);
        assert_eq!(report.views[0].view, ViewKind::Graph);
    }

    #[test]
    fn text_report_lists_log_and_history() {
        let trace = TraceFile::parse(TRACE).expect("parse");
        let (session, out, _) = replay_session(&trace, EngineConfig::default(), None, wall(), true);
        let text = render_text(&build_report(&trace, &session, &out));
        assert!(text.starts_with("trace unit: 3 steps over 200ms"));
        assert!(text.contains("== debug == totals (0, 220) activity idle"));
        assert!(text.contains("scroll start (wheel) dir: down"));
        assert!(text.contains("  scroll (0, 220) 80ms"));
    }
}
