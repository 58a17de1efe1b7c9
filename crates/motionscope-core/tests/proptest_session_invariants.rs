//! Property-based invariant tests for `InputSession`.
//!
//! These tests drive the session with arbitrary, time-ordered input and check:
//!
//! 1. No panics on arbitrary event sequences
//! 2. Log, history and graph series stay within their capacities
//! 3. Lifetime scroll totals never decrease without a reset
//! 4. Sub-noise position changes never start a motion
//! 5. Quiescence: once every timer has fired nothing is left in flight
//! 6. Graph zoom level stays inside its configured bounds
//! 7. Determinism: same input yields same notifications

use chrono::TimeZone;
use motionscope_core::event::{
    Modifiers, MouseButton, MouseInput, MousePhase, Point, PointerInput, PointerKind,
    PointerPhase, ScrollPositionInput, TouchInput, TouchPhase, TouchPoint, WheelInput,
};
use motionscope_core::activity::Activity;
use motionscope_core::direction::DirectionState;
use motionscope_core::sample::PositionSource;
use motionscope_core::{EngineConfig, InputEvent, InputSession, Notification, SessionClock, ViewKind};
use proptest::prelude::*;
use web_time::{Duration, Instant};

// ── Strategies ──────────────────────────────────────────────────────────

/// One step of a generated session.
#[derive(Debug, Clone)]
enum Op {
    Wheel { dx: f64, dy: f64, ctrl: bool },
    Poll { top: f64, left: f64 },
    Touch { phase: u8, fingers: usize, offset: f64 },
    Mouse { phase: u8, button: u8, x: f64, y: f64, anchor: bool },
    Pointer { phase: u8, id: u32, kind: u8, x: f64, y: f64 },
    Wait(u64),
    SwitchView(usize),
    DisposeView(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (-1200.0f64..1200.0, -1200.0f64..1200.0, any::<bool>())
            .prop_map(|(dx, dy, ctrl)| Op::Wheel { dx, dy, ctrl }),
        3 => (0.0f64..5000.0, 0.0f64..2000.0).prop_map(|(top, left)| Op::Poll { top, left }),
        2 => (0u8..4, 0usize..5, -80.0f64..80.0)
            .prop_map(|(phase, fingers, offset)| Op::Touch { phase, fingers, offset }),
        2 => (0u8..3, 0u8..5, 0.0f64..800.0, 0.0f64..600.0, any::<bool>())
            .prop_map(|(phase, button, x, y, anchor)| Op::Mouse { phase, button, x, y, anchor }),
        2 => (0u8..4, 0u32..3, 0u8..4, 0.0f64..800.0, 0.0f64..600.0)
            .prop_map(|(phase, id, kind, x, y)| Op::Pointer { phase, id, kind, x, y }),
        3 => (0u64..800).prop_map(Op::Wait),
        1 => (0usize..4).prop_map(Op::SwitchView),
        1 => (0usize..4).prop_map(Op::DisposeView),
    ]
}

fn session(t: Instant) -> InputSession {
    let wall = chrono::Utc
        .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .expect("valid date");
    InputSession::new(EngineConfig::default(), SessionClock::new(t, wall))
}

fn touch_phase(n: u8) -> TouchPhase {
    match n {
        0 => TouchPhase::Start,
        1 => TouchPhase::Move,
        2 => TouchPhase::End,
        _ => TouchPhase::Cancel,
    }
}

fn fingers(count: usize, offset: f64) -> Vec<TouchPoint> {
    (0..count)
        .map(|i| TouchPoint::new(i as u32, 100.0 + 60.0 * i as f64 + offset, 300.0 - offset))
        .collect()
}

fn to_event(op: &Op) -> Option<InputEvent> {
    Some(match *op {
        Op::Wheel { dx, dy, ctrl } => {
            let mods = if ctrl { Modifiers::CTRL } else { Modifiers::NONE };
            InputEvent::Wheel(WheelInput::new(dx, dy).with_modifiers(mods))
        }
        Op::Poll { top, left } => InputEvent::ScrollPosition(ScrollPositionInput::new(
            PositionSource::AggressivePoll,
            0,
            top,
            left,
        )),
        Op::Touch { phase, fingers: n, offset } => {
            InputEvent::Touch(TouchInput::new(touch_phase(phase), fingers(n, offset)))
        }
        Op::Mouse { phase, button, x, y, anchor } => {
            let phase = match phase {
                0 => MousePhase::Down,
                1 => MousePhase::Move,
                _ => MousePhase::Up,
            };
            let m = MouseInput::new(phase, Some(MouseButton::from_u8(button)), Point::new(x, y));
            InputEvent::Mouse(if anchor { m.on_anchor() } else { m })
        }
        Op::Pointer { phase, id, kind, x, y } => {
            let phase = match phase {
                0 => PointerPhase::Down,
                1 => PointerPhase::Move,
                2 => PointerPhase::Up,
                _ => PointerPhase::Cancel,
            };
            let kind = match kind {
                0 => PointerKind::Mouse,
                1 => PointerKind::Pen,
                2 => PointerKind::Touch,
                _ => PointerKind::Xr,
            };
            InputEvent::Pointer(PointerInput::new(phase, id, kind, Point::new(x, y)))
        }
        Op::Wait(_) | Op::SwitchView(_) | Op::DisposeView(_) => return None,
    })
}

/// Apply ops, 16ms apart plus any explicit waits. Returns the final time.
fn run(
    s: &mut InputSession,
    t: Instant,
    ops: &[Op],
    mut check: impl FnMut(&InputSession, &[Notification]),
) -> Instant {
    let mut now = t;
    for op in ops {
        now += Duration::from_millis(16);
        let out = match op {
            Op::Wait(ms) => {
                now += Duration::from_millis(*ms);
                s.advance(now)
            }
            Op::SwitchView(i) => {
                s.set_active_view(ViewKind::ALL[*i]);
                Vec::new()
            }
            Op::DisposeView(i) => {
                s.dispose_view(ViewKind::ALL[*i]);
                Vec::new()
            }
            other => match to_event(other) {
                Some(event) => s.dispatch(&event, now),
                None => Vec::new(),
            },
        };
        check(s, &out);
    }
    now
}

// ═══════════════════════════════════════════════════════════════════════
// 1–2. No panics, bounded collections
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn collections_stay_bounded(ops in proptest::collection::vec(op_strategy(), 1..300)) {
        let t = Instant::now();
        let mut s = session(t);
        let cfg = s.config().clone();
        run(&mut s, t, &ops, |s, _| {
            for kind in ViewKind::ALL {
                let view = s.view(kind);
                assert!(view.log().len() <= cfg.log.capacity);
                assert!(view.motion().history().len() <= cfg.motion.history_capacity);
            }
            assert!(s.graph().scroll_points().len() <= cfg.graph.max_points);
            assert!(s.graph().zoom_points().len() <= cfg.graph.max_points);
        });
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3. Totals are monotonic
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn totals_never_decrease(ops in proptest::collection::vec(op_strategy(), 1..200)) {
        let t = Instant::now();
        let mut s = session(t);
        let mut last = [(0.0f64, 0.0f64); 4];
        run(&mut s, t, &ops, |s, _| {
            for (i, kind) in ViewKind::ALL.into_iter().enumerate() {
                let totals = s.view(kind).motion().totals();
                if totals.x == 0.0 && totals.y == 0.0 {
                    // Disposal starts the view over.
                    last[i] = (0.0, 0.0);
                    continue;
                }
                assert!(totals.x >= last[i].0 && totals.y >= last[i].1);
                last[i] = (totals.x, totals.y);
            }
        });
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 4. Noise floor
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn sub_noise_polls_never_start_motion(
        steps in proptest::collection::vec((-1.99f64..1.99, -1.99f64..1.99), 1..100),
    ) {
        let t = Instant::now();
        let mut s = session(t);
        s.dispatch(
            &InputEvent::ScrollPosition(ScrollPositionInput::new(PositionSource::NativeScroll, 0, 500.0, 500.0)),
            t,
        );
        let mut now = t;
        let (mut top, mut left) = (500.0, 500.0);
        for (dy, dx) in steps {
            now += Duration::from_millis(20);
            top += dy;
            left += dx;
            let out = s.dispatch(
                &InputEvent::ScrollPosition(ScrollPositionInput::new(
                    PositionSource::NativeScroll,
                    0,
                    top,
                    left,
                )),
                now,
            );
            let started = out
                .iter()
                .any(|n| matches!(n, Notification::MotionStarted { .. }));
            prop_assert!(!started, "motion started at {:?}", now - t);
        }
        prop_assert!(!s.view(ViewKind::Debug).motion().is_active());
        prop_assert_eq!(s.view(ViewKind::Debug).log().len(), 0);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 5–6. Quiescence and zoom bounds
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn everything_settles_after_silence(ops in proptest::collection::vec(op_strategy(), 1..200)) {
        let t = Instant::now();
        let mut s = session(t);
        let end = run(&mut s, t, &ops, |_, _| {});
        s.advance(end + Duration::from_secs(10));

        prop_assert_eq!(s.pending_timers(), 0);
        prop_assert!(!s.is_tracking_disabled(end + Duration::from_secs(10)));
        for kind in ViewKind::ALL {
            let view = s.view(kind);
            prop_assert!(!view.motion().is_active());
            prop_assert_eq!(view.direction().state(), DirectionState::default());
            prop_assert_eq!(view.activity().current(), Activity::Idle);
        }
    }

    #[test]
    fn graph_level_stays_in_bounds(ops in proptest::collection::vec(op_strategy(), 1..200)) {
        let t = Instant::now();
        let mut s = session(t);
        s.set_active_view(ViewKind::Graph);
        let (lo, hi) = (s.config().graph.min_level, s.config().graph.max_level);
        run(&mut s, t, &ops, |s, _| {
            let level = s.graph().level();
            assert!((lo..=hi).contains(&level), "level {level} outside [{lo}, {hi}]");
        });
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 7. Determinism
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn same_input_same_notifications(ops in proptest::collection::vec(op_strategy(), 1..150)) {
        let t = Instant::now();
        let mut a = session(t);
        let mut b = session(t);
        let mut seen_a = Vec::new();
        let mut seen_b = Vec::new();
        run(&mut a, t, &ops, |_, out| seen_a.extend_from_slice(out));
        run(&mut b, t, &ops, |_, out| seen_b.extend_from_slice(out));
        prop_assert_eq!(seen_a, seen_b);
    }
}
