#![forbid(unsafe_code)]

//! Recorded traces replay through a session exactly like live input.
//!
//! 1. A trace written to disk reopens with the same steps
//! 2. Replaying a trace reproduces the live session's notifications
//! 3. View switches inside a trace route input to the right view

use chrono::TimeZone;
use motionscope_core::event::{Modifiers, WheelInput};
use motionscope_core::motion::MotionKind;
use motionscope_core::trace::{Replayer, TraceFile, TraceWriter};
use motionscope_core::{EngineConfig, InputEvent, InputSession, Notification, SessionClock, ViewKind};
use pretty_assertions::assert_eq;
use web_time::{Duration, Instant};

fn session(t: Instant) -> InputSession {
    let wall = chrono::Utc
        .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .expect("valid date");
    InputSession::new(EngineConfig::default(), SessionClock::new(t, wall))
}

fn script() -> Vec<(u64, InputEvent)> {
    let wheel = |dy: f64| InputEvent::Wheel(WheelInput::new(0.0, dy));
    let ctrl = |dy: f64| InputEvent::Wheel(WheelInput::new(0.0, dy).with_modifiers(Modifiers::CTRL));
    vec![
        (0, wheel(40.0)),
        (30, wheel(40.0)),
        (60, wheel(-40.0)),
        (900, ctrl(-20.0)),
        (940, ctrl(-20.0)),
        (2000, wheel(900.0)),
        (2100, wheel(10.0)),
        (2400, wheel(10.0)),
    ]
}

#[test]
fn written_trace_reopens_identically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scroll.jsonl");

    let mut writer = TraceWriter::create(&path, "scroll").expect("create");
    for (t_ms, input) in script() {
        writer.input(t_ms, &input).expect("input");
    }
    writer.advance(3500).expect("advance");
    writer.finish().expect("finish");

    let trace = TraceFile::open(&path).expect("open");
    assert_eq!(trace.session_name(), Some("scroll"));
    assert_eq!(trace.duration_ms(), 3500);
    assert_eq!(trace.steps().len(), script().len() + 1);
}

#[test]
fn replay_matches_live_session() {
    let t = Instant::now();

    let mut live = session(t);
    let mut expected = Vec::new();
    for (t_ms, input) in script() {
        expected.extend(live.dispatch(&input, t + Duration::from_millis(t_ms)));
    }
    expected.extend(live.advance(t + Duration::from_millis(3500)));

    let mut writer = TraceWriter::new(Vec::new(), "live").expect("header");
    for (t_ms, input) in script() {
        writer.input(t_ms, &input).expect("input");
    }
    writer.advance(3500).expect("advance");
    let bytes = writer.finish().expect("finish");
    let trace = TraceFile::parse(std::str::from_utf8(&bytes).expect("utf8")).expect("parse");

    let mut replayed = session(t);
    let mut actual = Vec::new();
    let mut replayer = Replayer::from_trace(&trace);
    while let Some(step) = replayer.next_step() {
        actual.extend(step.apply(&mut replayed, t));
    }

    assert_eq!(actual, expected);
    assert!(actual.iter().any(|n| matches!(n, Notification::Jump { .. })));
    assert!(actual.contains(&Notification::TrackingResumed));

    let kinds: Vec<MotionKind> = replayed
        .view(ViewKind::Debug)
        .motion()
        .history()
        .map(|e| e.kind)
        .collect();
    assert_eq!(kinds, vec![MotionKind::Scroll, MotionKind::Zoom, MotionKind::Scroll]);
}

#[test]
fn view_records_switch_targets() {
    let text = r#"
{"event":"trace_header","schema_version":"motion-trace-v1","session_name":"views","view":"browse"}
{"event":"input","t_ms":0,"input":{"kind":"wheel","dx":0.0,"dy":25.0}}
{"event":"view","t_ms":100,"view":"graph"}
{"event":"input","t_ms":120,"input":{"kind":"wheel","dx":0.0,"dy":-15.0}}
{"event":"advance","t_ms":1500}
"#;
    let trace = TraceFile::parse(text).expect("parse");
    let t = Instant::now();
    let mut s = session(t);
    if let Some(view) = trace.initial_view() {
        s.set_active_view(view);
    }
    for step in Replayer::from_trace(&trace).drain_all() {
        step.apply(&mut s, t);
    }

    let browse = s.view(ViewKind::Browse).motion().last_entry().copied().expect("browse");
    let graph = s.view(ViewKind::Graph).motion().last_entry().copied().expect("graph");
    assert_eq!(browse.accumulated_y, 25.0);
    assert_eq!(graph.accumulated_y, -15.0);
    assert_eq!(s.graph().scroll_points().len(), 1);
}
