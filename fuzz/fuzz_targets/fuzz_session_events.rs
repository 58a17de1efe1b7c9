#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use motionscope_core::event::{
    Modifiers, MouseButton, MouseInput, MousePhase, Point, PointerInput, PointerKind,
    PointerPhase, ScrollPositionInput, TouchInput, TouchPhase, TouchPoint, WheelInput,
};
use motionscope_core::sample::PositionSource;
use motionscope_core::{EngineConfig, InputEvent, InputSession, SessionClock, ViewKind};
use web_time::{Duration, Instant};

#[derive(Debug, Arbitrary)]
enum Op {
    Wheel { dx: i16, dy: i16, ctrl: bool },
    Poll { top: u16, left: u16, region: u8 },
    Touch { phase: u8, fingers: u8, spread: i8 },
    Mouse { phase: u8, button: u8, x: u16, y: u16 },
    Pointer { phase: u8, id: u8, kind: u8, x: u16, y: u16 },
    Wait(u16),
    View(u8),
    Dispose(u8),
    ResetTotals,
    ResetZoom,
}

fn event(op: &Op) -> Option<InputEvent> {
    Some(match *op {
        Op::Wheel { dx, dy, ctrl } => {
            let mods = if ctrl { Modifiers::CTRL } else { Modifiers::NONE };
            InputEvent::Wheel(WheelInput::new(f64::from(dx), f64::from(dy)).with_modifiers(mods))
        }
        Op::Poll { top, left, region } => InputEvent::ScrollPosition(ScrollPositionInput::new(
            PositionSource::ElementScroll,
            u32::from(region % 4),
            f64::from(top),
            f64::from(left),
        )),
        Op::Touch { phase, fingers, spread } => {
            let phase = match phase % 4 {
                0 => TouchPhase::Start,
                1 => TouchPhase::Move,
                2 => TouchPhase::End,
                _ => TouchPhase::Cancel,
            };
            let touches = (0..fingers % 6)
                .map(|i| {
                    let offset = f64::from(i) * f64::from(spread);
                    TouchPoint::new(u32::from(i), 200.0 + offset, 200.0 - offset)
                })
                .collect();
            InputEvent::Touch(TouchInput::new(phase, touches))
        }
        Op::Mouse { phase, button, x, y } => {
            let phase = match phase % 3 {
                0 => MousePhase::Down,
                1 => MousePhase::Move,
                _ => MousePhase::Up,
            };
            let at = Point::new(f64::from(x), f64::from(y));
            InputEvent::Mouse(MouseInput::new(phase, Some(MouseButton::from_u8(button)), at))
        }
        Op::Pointer { phase, id, kind, x, y } => {
            let phase = match phase % 4 {
                0 => PointerPhase::Down,
                1 => PointerPhase::Move,
                2 => PointerPhase::Up,
                _ => PointerPhase::Cancel,
            };
            let kind = match kind % 4 {
                0 => PointerKind::Mouse,
                1 => PointerKind::Pen,
                2 => PointerKind::Touch,
                _ => PointerKind::Xr,
            };
            let at = Point::new(f64::from(x), f64::from(y));
            InputEvent::Pointer(PointerInput::new(phase, u32::from(id), kind, at))
        }
        _ => return None,
    })
}

fuzz_target!(|ops: Vec<Op>| {
    let config = EngineConfig::default();
    let t = Instant::now();
    let mut session = InputSession::new(config.clone(), SessionClock::start());
    let mut now = t;

    for op in &ops {
        now += Duration::from_millis(8);
        match op {
            Op::Wait(ms) => {
                now += Duration::from_millis(u64::from(*ms));
                let _ = session.advance(now);
            }
            Op::View(i) => session.set_active_view(ViewKind::ALL[usize::from(*i) % 4]),
            Op::Dispose(i) => session.dispose_view(ViewKind::ALL[usize::from(*i) % 4]),
            Op::ResetTotals => session.reset_scroll_totals(),
            Op::ResetZoom => session.reset_zoom(),
            other => {
                if let Some(e) = event(other) {
                    let _ = session.dispatch(&e, now);
                }
            }
        }

        for kind in ViewKind::ALL {
            let view = session.view(kind);
            assert!(view.log().len() <= config.log.capacity);
            assert!(view.motion().history().len() <= config.motion.history_capacity);
            let totals = view.motion().totals();
            assert!(totals.x >= 0.0 && totals.y >= 0.0);
        }
        let level = session.graph().level();
        assert!(level >= config.graph.min_level && level <= config.graph.max_level);
    }

    let _ = session.advance(now + Duration::from_secs(10));
    assert_eq!(session.pending_timers(), 0);
});
