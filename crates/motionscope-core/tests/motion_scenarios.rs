#![forbid(unsafe_code)]

//! End-to-end scenarios through `InputSession`.
//!
//! Each test drives the session with explicit timestamps and checks one
//! observable behavior:
//!   1. Noise floor on position sources
//!   2. Wheel wins over an echoing position poll
//!   3. Jump isolation and cooldown resync
//!   4. Quiet-period finalization and duration
//!   5. Direction reversal events
//!   6. Pinch hysteresis band
//!   7. Totals reset leaves the in-flight motion alone
//!   8. Wheel scenario and ctrl-wheel pinch reset

use chrono::TimeZone;
use motionscope_core::direction::{Axis, DirectionEvent, DirectionState};
use motionscope_core::event::{
    Modifiers, ScrollPositionInput, TouchInput, TouchPhase, TouchPoint, WheelInput,
};
use motionscope_core::gesture::{Gesture, GestureRecognizer};
use motionscope_core::motion::{HistoryEntry, MotionKind};
use motionscope_core::sample::PositionSource;
use motionscope_core::sink::{Collaborators, RecordingSink};
use motionscope_core::{EngineConfig, InputEvent, InputSession, Notification, SessionClock, ViewKind};
use pretty_assertions::assert_eq;
use web_time::{Duration, Instant};

const MS_30: Duration = Duration::from_millis(30);
const MS_80: Duration = Duration::from_millis(80);
const MS_100: Duration = Duration::from_millis(100);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn session() -> (InputSession, RecordingSink, Instant) {
    let t = Instant::now();
    let wall = chrono::Utc
        .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .expect("valid date");
    let rec = RecordingSink::new();
    let s = InputSession::new(EngineConfig::default(), SessionClock::new(t, wall))
        .with_collaborators(Collaborators::recording(&rec));
    (s, rec, t)
}

fn wheel(dx: f64, dy: f64) -> InputEvent {
    InputEvent::Wheel(WheelInput::new(dx, dy))
}

fn poll(top: f64, left: f64) -> InputEvent {
    InputEvent::ScrollPosition(ScrollPositionInput::new(
        PositionSource::AggressivePoll,
        0,
        top,
        left,
    ))
}

fn entries(out: &[Notification]) -> Vec<HistoryEntry> {
    out.iter()
        .filter_map(|n| match n {
            Notification::MotionEnded { entry, .. } => Some(*entry),
            _ => None,
        })
        .collect()
}

fn starts(out: &[Notification]) -> usize {
    out.iter()
        .filter(|n| matches!(n, Notification::MotionStarted { .. }))
        .count()
}

// ============================================================================
// Source arbitration
// ============================================================================

#[test]
fn tiny_position_changes_never_reach_a_view() {
    let (mut s, rec, t) = session();
    let mut out = s.dispatch(&poll(100.0, 50.0), t);
    for i in 1..20u32 {
        // Each step is 1.5px from the previous baseline, under the 2px floor.
        let jitter = if i % 2 == 0 { 0.0 } else { 1.5 };
        out.extend(s.dispatch(&poll(100.0 + jitter, 50.0 - jitter), t + MS_30 * i));
    }
    assert!(out.is_empty(), "{out:?}");
    assert!(!s.view(ViewKind::Debug).motion().is_active());
    assert!(rec.messages(ViewKind::Debug).is_empty());
}

#[test]
fn wheel_wins_over_echoing_poll() {
    let (mut s, _rec, t) = session();
    s.dispatch(&poll(0.0, 0.0), t);
    let mut out = s.dispatch(&wheel(0.0, 30.0), t + MS_100);
    out.extend(s.dispatch(&poll(30.0, 0.0), t + MS_100 + MS_30));
    assert_eq!(starts(&out), 1);
    let motion = s.view(ViewKind::Debug).motion().state();
    assert_eq!(motion.accumulated_y, 30.0);

    // Outside the window the poll counts again.
    s.dispatch(&poll(60.0, 0.0), t + MS_100 * 3);
    assert_eq!(s.view(ViewKind::Debug).motion().state().accumulated_y, 60.0);
}

// ============================================================================
// Jump detection
// ============================================================================

#[test]
fn jump_is_isolated_and_tracking_resumes_after_cooldown() {
    let (mut s, rec, t) = session();
    s.dispatch(&wheel(0.0, 20.0), t);
    let out = s.dispatch(&wheel(0.0, 800.0), t + MS_100);
    assert!(out.iter().any(|n| matches!(n, Notification::Jump { .. })));

    let view = s.view(ViewKind::Debug);
    assert!(!view.motion().is_active());
    assert_eq!(view.direction().state(), DirectionState::default());
    assert_eq!(view.motion().history().len(), 0);

    for offset in [0, 50, 150, 299] {
        let out = s.dispatch(&wheel(0.0, 10.0), t + MS_100 + ms(offset));
        assert_eq!(starts(&out), 0, "sample at +{offset}ms must be dropped");
    }
    assert!(!s.view(ViewKind::Debug).motion().is_active());

    let out = s.dispatch(&wheel(0.0, 10.0), t + MS_100 + ms(300));
    assert!(out.contains(&Notification::TrackingResumed));
    assert_eq!(starts(&out), 1);
    assert_eq!(s.view(ViewKind::Debug).motion().state().accumulated_y, 10.0);
    assert!(rec.messages(ViewKind::Debug).contains(&"jump detected".to_string()));
}

#[test]
fn position_jump_resynchronizes_baselines() {
    let (mut s, _rec, t) = session();
    s.dispatch(&poll(0.0, 0.0), t);
    s.dispatch(&poll(2000.0, 0.0), t + MS_100);
    assert!(s.is_tracking_disabled(t + MS_100));
    // Position keeps drifting while disabled.
    s.dispatch(&poll(2100.0, 0.0), t + ms(200));

    let out = s.dispatch(&poll(2110.0, 0.0), t + ms(400));
    assert!(out.contains(&Notification::TrackingResumed));
    assert_eq!(starts(&out), 0);
    s.dispatch(&poll(2120.0, 0.0), t + ms(420));
    let motion = s.view(ViewKind::Debug).motion().state();
    assert!(motion.active);
    assert_eq!(motion.accumulated_y, 10.0);
}

// ============================================================================
// Motion accumulation
// ============================================================================

#[test]
fn quiet_period_finalizes_once_with_sample_span() {
    let (mut s, rec, t) = session();
    for i in 0..3u32 {
        s.dispatch(&wheel(0.0, 10.0), t + MS_100 * i);
    }
    assert!(entries(&s.advance(t + ms(699))).is_empty());
    let out = s.advance(t + ms(700));
    let done = entries(&out);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].kind, MotionKind::Scroll);
    assert_eq!(done[0].accumulated_y, 30.0);
    assert_eq!(done[0].duration, ms(200));
    assert!(entries(&s.advance(t + ms(5000))).is_empty());
    assert_eq!(
        rec.messages(ViewKind::Debug).last().map(String::as_str),
        Some("scroll motion: Δ(0, 30) in 200ms")
    );
}

#[test]
fn wheel_scenario_records_sum_and_span() {
    let (mut s, _rec, t) = session();
    s.dispatch(&wheel(0.0, 100.0), t);
    s.dispatch(&wheel(0.0, 120.0), t + MS_80);
    let out = s.advance(t + MS_80 + ms(600));
    let done = entries(&out);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].kind, MotionKind::Scroll);
    assert_eq!(done[0].accumulated_y, 220.0);
    assert_eq!(done[0].duration, MS_80);
}

#[test]
fn totals_reset_leaves_motion_vector() {
    let (mut s, _rec, t) = session();
    s.dispatch(&wheel(5.0, -40.0), t);
    s.dispatch(&wheel(-5.0, -40.0), t + MS_30);
    assert_eq!(s.view(ViewKind::Debug).motion().totals().x, 10.0);
    assert_eq!(s.view(ViewKind::Debug).motion().totals().y, 80.0);

    s.reset_scroll_totals();
    let view = s.view(ViewKind::Debug);
    assert_eq!(view.motion().totals().x, 0.0);
    assert_eq!(view.motion().totals().y, 0.0);
    assert_eq!(view.motion().state().accumulated_x, 0.0);
    assert_eq!(view.motion().state().accumulated_y, -80.0);

    s.dispatch(&wheel(0.0, 10.0), t + MS_30 * 2);
    assert_eq!(s.view(ViewKind::Debug).motion().totals().y, 10.0);
}

// ============================================================================
// Direction classification
// ============================================================================

#[test]
fn reversal_fires_once_at_third_sample() {
    let (mut s, rec, t) = session();
    let mut changes = Vec::new();
    for (i, dx) in [10.0, 10.0, -10.0, -10.0].into_iter().enumerate() {
        let out = s.dispatch(&wheel(dx, 0.0), t + ms(20 * i as u64));
        for n in out {
            if let Notification::Direction {
                event: DirectionEvent::ScrollChange { axis, dir },
                ..
            } = n
            {
                changes.push((i, axis, dir));
            }
        }
    }
    assert_eq!(changes, vec![(2, Axis::Horizontal, -1)]);
    assert_eq!(
        rec.messages(ViewKind::Debug),
        vec!["scroll start (wheel) dir: right", "scroll X → left"]
    );
}

#[test]
fn axis_switch_is_reported() {
    let (mut s, rec, t) = session();
    s.dispatch(&wheel(0.0, 10.0), t);
    let out = s.dispatch(&wheel(10.0, 0.0), t + MS_30);
    assert!(out.iter().any(|n| matches!(
        n,
        Notification::Direction {
            event: DirectionEvent::AxisChange { to: Axis::Horizontal },
            ..
        }
    )));
    assert!(rec
        .messages(ViewKind::Debug)
        .contains(&"scroll axis change (wheel) to: horizontal".to_string()));
}

#[test]
fn log_is_capped_at_fifty() {
    let (mut s, _rec, t) = session();
    for i in 0..120u32 {
        let dx = if i % 2 == 0 { 10.0 } else { -10.0 };
        s.dispatch(&wheel(dx, 0.0), t + ms(u64::from(i) * 10));
    }
    let log = s.view(ViewKind::Debug).log();
    assert_eq!(log.len(), 50);
    assert_eq!(log.latest().map(|e| e.message.as_str()), Some("scroll X → left"));
}

// ============================================================================
// Gesture recognition
// ============================================================================

fn spread(d: f64) -> Vec<TouchPoint> {
    vec![
        TouchPoint::new(1, 200.0 - d / 2.0, 300.0),
        TouchPoint::new(2, 200.0 + d / 2.0, 300.0),
    ]
}

#[test]
fn pinch_hysteresis_band_holds_classification() {
    let mut g = GestureRecognizer::default();
    let t = Instant::now();
    g.touch(&TouchInput::new(TouchPhase::Start, spread(100.0)), t);
    let held = g.gesture();
    assert_eq!(held, Gesture::PinchCandidate);

    let mut seen = Vec::new();
    for d in [100.0, 102.0, 104.0, 106.0] {
        let out = g.touch(&TouchInput::new(TouchPhase::Move, spread(d)), t);
        seen.push(out.report.gesture);
    }
    assert_eq!(
        seen,
        vec![held, held, held, Gesture::PinchOut],
        "only the sample past 1.05 flips the classification"
    );
}

#[test]
fn ctrl_wheel_after_idle_restarts_pinch_scale() {
    let (mut s, _rec, t) = session();
    let ctrl = |dy: f64| InputEvent::Wheel(WheelInput::new(0.0, dy).with_modifiers(Modifiers::CTRL));
    s.dispatch(&ctrl(-30.0), t);
    assert!((s.gesture().report().pinch_scale - 1.3).abs() < 1e-9);

    s.dispatch(&ctrl(-50.0), t + ms(600));
    let report = s.gesture().report();
    assert!((report.pinch_scale - 1.5).abs() < 1e-9, "{report:?}");
    assert_eq!(report.gesture, Gesture::PinchOut);
    assert_eq!(report.finger_count, 2);
}

#[test]
fn three_finger_swipe_through_session() {
    let (mut s, _rec, t) = session();
    let fingers = |dx: f64| {
        vec![
            TouchPoint::new(1, 100.0 + dx, 100.0),
            TouchPoint::new(2, 150.0 + dx, 100.0),
            TouchPoint::new(3, 200.0 + dx, 100.0),
        ]
    };
    s.dispatch(&InputEvent::Touch(TouchInput::new(TouchPhase::Start, fingers(0.0))), t);
    s.dispatch(&InputEvent::Touch(TouchInput::new(TouchPhase::Move, fingers(-40.0))), t + MS_30);
    let report = s.gesture().report();
    assert_eq!(report.gesture, Gesture::Swipe { fingers: 3 });
    assert_eq!(report.swipe_label(), "3f left");
    assert!(!s.view(ViewKind::Debug).motion().is_active());

    s.dispatch(&InputEvent::Touch(TouchInput::new(TouchPhase::End, Vec::new())), t + MS_100);
    let out = s.advance(t + MS_100 + ms(300));
    assert!(out.iter().any(|n| matches!(n, Notification::Gesture(r) if r.gesture == Gesture::None)));
}

#[test]
fn views_do_not_cross_contaminate() {
    let (mut s, _rec, t) = session();
    s.set_active_view(ViewKind::Browse);
    s.dispatch(&wheel(0.0, 50.0), t);
    s.set_active_view(ViewKind::Graph);
    s.dispatch(&wheel(0.0, -20.0), t + MS_30);
    s.advance(t + ms(1000));

    let browse = s.view(ViewKind::Browse).motion().last_entry().copied().expect("browse entry");
    let graph = s.view(ViewKind::Graph).motion().last_entry().copied().expect("graph entry");
    assert_eq!(browse.accumulated_y, 50.0);
    assert_eq!(graph.accumulated_y, -20.0);
    assert_eq!(s.view(ViewKind::Debug).motion().history().len(), 0);
    assert_eq!(s.view(ViewKind::Maps).motion().history().len(), 0);
}
