#![no_main]

use libfuzzer_sys::fuzz_target;
use motionscope_core::trace::{Replayer, TraceFile};
use motionscope_core::{EngineConfig, InputSession, SessionClock};
use web_time::Instant;

fuzz_target!(|data: &[u8]| {
    // Arbitrary text must either fail to parse or replay without panicking.
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(trace) = TraceFile::parse(text) else {
        return;
    };

    let origin = Instant::now();
    let mut session = InputSession::new(EngineConfig::default(), SessionClock::start());
    if let Some(view) = trace.initial_view() {
        session.set_active_view(view);
    }
    let mut replayer = Replayer::from_trace(&trace);
    let mut previous = 0;
    while let Some(step) = replayer.next_step() {
        assert!(step.t_ms >= previous, "steps out of order");
        previous = step.t_ms;
        let _ = step.apply(&mut session, origin);
    }
    assert!(replayer.is_done());
});
