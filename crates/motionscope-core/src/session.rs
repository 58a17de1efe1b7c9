#![forbid(unsafe_code)]

//! The input session: one dispatch loop over every component.
//!
//! [`InputSession`] owns the source arbiter, the jump detector, the gesture
//! recognizer, the graph recorder and one [`ViewState`] per view. Input
//! events arrive through [`dispatch`](InputSession::dispatch); deferred work
//! (quiet periods, channel ends, idle labels, gesture resets, the jump
//! cooldown) lives in a single [`TimerQueue`] and fires from
//! [`advance`](InputSession::advance).
//!
//! # Pipeline
//!
//! ```text
//! InputEvent ─► SourceArbiter ─► JumpDetector ─► MotionAccumulator ─► DirectionTracker
//!      │                              │                                     │
//!      └─► GestureRecognizer          └─► raise: interrupt every view       └─► sinks
//! ```
//!
//! # Invariants
//!
//! 1. Every timer due at or before `now` fires, in deadline order, before an
//!    event dispatched at `now` is processed.
//! 2. A jump interrupts the in-flight motion of every view, cancels every
//!    motion and channel timer, and zeroes every direction state.
//! 3. While the jump cooldown runs no sample reaches any view; baselines
//!    keep moving and are dropped when the cooldown ends.
//! 4. Events only touch the active view; views never share motion state.
//!
//! # Failure Modes
//!
//! Dispatch is infallible. Missing sinks drop output silently. A motion end
//! that fires for a motion older than the last jump is discarded without a
//! history entry.

use ahash::AHashSet;
use tracing::{debug, trace};
use web_time::{Duration, Instant};

use crate::activity::Activity;
use crate::arbiter::SourceArbiter;
use crate::clock::SessionClock;
use crate::config::EngineConfig;
use crate::direction::{Axis, Channel, DirectionEvent, describe};
use crate::event::{
    InputEvent, MouseButton, MouseInput, MousePhase, PointerInput, PointerPhase,
    ScrollPositionInput, Target, TouchInput, TouchPhase, WheelInput,
};
use crate::gesture::{GestureRecognizer, GestureReport};
use crate::graph::{GraphExport, GraphRecorder, ScrollPoint, ZoomPoint};
use crate::jump::{JumpDetector, JumpGuard, Verdict};
use crate::log::{LogCategory, LogEntry};
use crate::motion::{HistoryEntry, MotionKind};
use crate::sample::{Sample, Source};
use crate::sink::{Collaborators, DisplayUpdate};
use crate::timer::TimerQueue;
use crate::view::{Surface, ViewKind, ViewState};
use crate::viewport::MapAction;

// ---------------------------------------------------------------------------
// Timers and notifications
// ---------------------------------------------------------------------------

/// Purpose of a pending timer. One slot per purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Quiet period of a view's motion.
    MotionEnd(ViewKind),
    /// End delay of a view's scroll or zoom channel.
    DirectionEnd(ViewKind, Channel),
    /// Return of a view's activity label to idle.
    ActivityIdle(ViewKind),
    /// Gesture classification back to neutral.
    GestureReset,
    /// End of the post-jump tracking freeze.
    JumpCooldown,
}

impl TimerId {
    /// The view this timer belongs to, if any.
    #[must_use]
    pub const fn view(self) -> Option<ViewKind> {
        match self {
            Self::MotionEnd(v) | Self::DirectionEnd(v, _) | Self::ActivityIdle(v) => Some(v),
            Self::GestureReset | Self::JumpCooldown => None,
        }
    }
}

/// Semantic output of one dispatch or advance.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Direction {
        view: ViewKind,
        event: DirectionEvent,
    },
    MotionStarted {
        view: ViewKind,
        kind: MotionKind,
    },
    MotionEnded {
        view: ViewKind,
        entry: HistoryEntry,
    },
    /// A jump cut the motion short; nothing was recorded.
    MotionInterrupted {
        view: ViewKind,
    },
    /// A motion older than the last jump was dropped.
    MotionDiscarded {
        view: ViewKind,
    },
    Jump {
        at: Instant,
    },
    TrackingResumed,
    Gesture(GestureReport),
    Activity {
        view: ViewKind,
        activity: Activity,
    },
    ScrollPoint(ScrollPoint),
    ZoomPoint(ZoomPoint),
    Map(MapAction),
}

// ---------------------------------------------------------------------------
// InputSession
// ---------------------------------------------------------------------------

/// Single owner of all input state for one session.
#[derive(Debug)]
pub struct InputSession {
    config: EngineConfig,
    clock: SessionClock,
    arbiter: SourceArbiter,
    jump: JumpDetector,
    recognizer: GestureRecognizer,
    graph: GraphRecorder,
    views: [ViewState; 4],
    active: ViewKind,
    contacts: AHashSet<u32>,
    timers: TimerQueue<TimerId>,
    sinks: Collaborators,
    end_delay: Duration,
}

impl InputSession {
    #[must_use]
    pub fn new(config: EngineConfig, clock: SessionClock) -> Self {
        let views = ViewKind::ALL.map(|kind| ViewState::new(kind, &config));
        Self {
            arbiter: SourceArbiter::new(config.to_arbiter_config()),
            jump: JumpDetector::new(config.to_jump_config()),
            recognizer: GestureRecognizer::new(config.to_gesture_config()),
            graph: GraphRecorder::new(config.to_graph_config()),
            end_delay: config.direction_end_delay(),
            views,
            active: ViewKind::default(),
            contacts: AHashSet::new(),
            timers: TimerQueue::new(),
            sinks: Collaborators::none(),
            clock,
            config,
        }
    }

    /// Attach output sinks.
    #[must_use]
    pub fn with_collaborators(mut self, sinks: Collaborators) -> Self {
        self.sinks = sinks;
        self
    }

    pub fn set_collaborators(&mut self, sinks: Collaborators) {
        self.sinks = sinks;
    }

    /// Route subsequent events to `view`.
    pub fn set_active_view(&mut self, view: ViewKind) {
        trace!(from = %self.active, to = %view, "active view changed");
        self.active = view;
    }

    #[inline]
    #[must_use]
    pub fn active_view(&self) -> ViewKind {
        self.active
    }

    /// Tear a view down to its initial state and cancel its timers.
    pub fn dispose_view(&mut self, view: ViewKind) {
        self.views[view.index()] = ViewState::new(view, &self.config);
        let cancelled = self.timers.cancel_where(|id| id.view() == Some(view));
        if view == ViewKind::Graph {
            self.graph.clear();
            self.sinks.graph_cleared();
        }
        debug!(%view, cancelled, "view disposed");
    }

    /// Process one input event at `now`, firing due timers first.
    pub fn dispatch(&mut self, event: &InputEvent, now: Instant) -> Vec<Notification> {
        let mut out = self.advance(now);
        let view = self.active;
        match event {
            InputEvent::Wheel(w) => self.on_wheel(view, w, now, &mut out),
            InputEvent::ScrollPosition(p) => self.on_position(view, p, now, &mut out),
            InputEvent::Pointer(p) => self.on_pointer(view, p, now, &mut out),
            InputEvent::Touch(t) => self.on_touch(view, t, now, &mut out),
            InputEvent::Mouse(m) => self.on_mouse(view, m, now, &mut out),
        }
        out
    }

    /// Fire every timer due at or before `now`.
    pub fn advance(&mut self, now: Instant) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Some((id, at)) = self.timers.pop_due(now) {
            self.fire(id, at, &mut out);
        }
        out
    }

    /// Earliest pending timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Zero the lifetime totals of the active view.
    pub fn reset_scroll_totals(&mut self) {
        let view = self.active;
        self.views[view.index()].motion.reset_totals();
        self.sinks
            .display(view, DisplayUpdate::Totals { x: 0.0, y: 0.0 });
    }

    /// Restore the active view's zoom to 100%.
    pub fn reset_zoom(&mut self) {
        let view = self.active;
        match &mut self.views[view.index()].surface {
            Surface::Article(article) => article.reset(),
            Surface::Map(map) => {
                map.reset_zoom();
                let vp = *map.viewport();
                self.sinks.display(
                    view,
                    DisplayUpdate::MapTransform {
                        zoom: vp.zoom(),
                        pan: vp.pan(),
                    },
                );
            }
            Surface::Plain => {
                self.recognizer.reset();
                self.sync_gesture_timer();
                let report = self.recognizer.report();
                self.sinks.display(view, DisplayUpdate::Gesture(report));
            }
        }
        self.sinks
            .display(view, DisplayUpdate::ZoomPercent { percent: 100 });
    }

    /// Drop both graph series and the graph view's motion history.
    pub fn clear_graph(&mut self) {
        self.graph.clear();
        self.views[ViewKind::Graph.index()].motion.clear_history();
        self.sinks.graph_cleared();
    }

    pub fn clear_log(&mut self, view: ViewKind) {
        self.views[view.index()].log.clear();
        self.sinks.log_cleared(view);
    }

    /// Snapshot of the graph series and graph-view history.
    #[must_use]
    pub fn export_graph(&self, now: Instant) -> GraphExport {
        let history = self.views[ViewKind::Graph.index()].motion.history();
        self.graph.export(&self.clock, now, history)
    }

    #[must_use]
    pub fn view(&self, view: ViewKind) -> &ViewState {
        &self.views[view.index()]
    }

    #[inline]
    #[must_use]
    pub fn gesture(&self) -> &GestureRecognizer {
        &self.recognizer
    }

    #[inline]
    #[must_use]
    pub fn jump_guard(&self) -> &JumpGuard {
        self.jump.guard()
    }

    #[inline]
    #[must_use]
    pub fn is_tracking_disabled(&self, now: Instant) -> bool {
        self.jump.is_disabled(now)
    }

    #[inline]
    #[must_use]
    pub fn arbiter(&self) -> &SourceArbiter {
        &self.arbiter
    }

    #[inline]
    #[must_use]
    pub fn graph(&self) -> &GraphRecorder {
        &self.graph
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    /// Number of pending timers.
    #[inline]
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

// ---------------------------------------------------------------------------
// Event handlers
// ---------------------------------------------------------------------------

impl InputSession {
    fn on_wheel(&mut self, view: ViewKind, w: &WheelInput, now: Instant, out: &mut Vec<Notification>) {
        let zoom = w.is_zoom();
        self.wheel_surface(view, w, now, out);

        let disabled = self.jump.is_disabled(now);
        if let Some(sample) = self.arbiter.wheel(w.dx, w.dy, disabled, now).sample() {
            self.admit(view, sample, zoom, now, out);
        }

        let outcome = self.recognizer.wheel(w, now);
        self.sync_gesture_timer();
        self.emit_gesture(view, outcome.report, out);
    }

    fn on_position(
        &mut self,
        view: ViewKind,
        p: &ScrollPositionInput,
        now: Instant,
        out: &mut Vec<Notification>,
    ) {
        let disabled = self.jump.is_disabled(now);
        let source = Source::from(p.source);
        if let Some(sample) = self
            .arbiter
            .observe(source, p.region, p.position(), disabled, now)
            .sample()
        {
            self.admit(view, sample, false, now, out);
        }
    }

    fn on_pointer(&mut self, view: ViewKind, p: &PointerInput, now: Instant, out: &mut Vec<Notification>) {
        self.sinks.display(
            view,
            DisplayUpdate::Pointer {
                kind: p.pointer,
                at: p.at,
                pressure: p.pressure,
                tilt: p.tilt,
            },
        );
        let contact = p.pointer.drags_content();
        let label = format!("{} #{}", p.pointer.as_str(), p.id);
        match p.phase {
            PointerPhase::Down => {
                self.log(view, LogCategory::Pointer, format!("pointer down ({label})"), now);
                if contact {
                    self.contacts.insert(p.id);
                    self.observe_contact(view, Source::PointerXr, p.id, p.at, now, out);
                }
            }
            PointerPhase::Move => {
                let state = &self.views[view.index()];
                if !state.direction.is_active(Channel::Scroll) && !state.direction.is_active(Channel::Zoom) {
                    self.set_activity(view, Activity::Moving, now, out);
                }
                if contact && self.contacts.contains(&p.id) {
                    self.observe_contact(view, Source::PointerXr, p.id, p.at, now, out);
                }
            }
            PointerPhase::Up | PointerPhase::Cancel => {
                let verb = if p.phase == PointerPhase::Up { "up" } else { "cancel" };
                self.log(view, LogCategory::Pointer, format!("pointer {verb} ({label})"), now);
                if contact {
                    self.contacts.remove(&p.id);
                    self.arbiter.forget(Source::PointerXr, p.id);
                }
            }
        }
    }

    fn on_touch(&mut self, view: ViewKind, t: &TouchInput, now: Instant, out: &mut Vec<Notification>) {
        let fingers = t.finger_count();
        let line = match t.phase {
            TouchPhase::Start => Some(format!("touchstart ({fingers} touches)")),
            TouchPhase::End => Some(format!("touchend ({fingers} remaining)")),
            TouchPhase::Cancel => Some(format!("touchcancel ({fingers} remaining)")),
            TouchPhase::Move => None,
        };
        if let Some(line) = line {
            self.log(view, LogCategory::Touch, line, now);
        }

        let outcome = self.recognizer.touch(t, now);
        self.sync_gesture_timer();
        if let Some(activity) = outcome.activity {
            self.set_activity(view, activity, now, out);
        }
        self.emit_gesture(view, outcome.report, out);

        // Only a lone finger scrolls; multi-finger input belongs to the recognizer.
        match (t.phase, t.touches.as_slice()) {
            (TouchPhase::Start | TouchPhase::Move, [only]) => {
                self.observe_contact(view, Source::Touch, only.id, only.point(), now, out);
            }
            _ => {
                self.arbiter.forget_source(Source::Touch);
            }
        }
    }

    fn on_mouse(&mut self, view: ViewKind, m: &MouseInput, now: Instant, out: &mut Vec<Notification>) {
        let i = view.index();
        match m.phase {
            MousePhase::Down => {
                let button = m.button.unwrap_or(MouseButton::Left);
                self.views[i].last_button = Some(button);
                self.views[i].last_mouse = Some(m.at);
                self.sinks.display(view, DisplayUpdate::LastClick { button });
                self.set_activity(view, Activity::Clicking, now, out);
                self.log(view, LogCategory::Mouse, format!("mouse down ({})", button.label()), now);

                if m.target == Target::Anchor && button.is_primary() {
                    debug!(%view, "anchor press, raising synthetic jump");
                    self.raise_jump(view, now, out);
                }
                if let Surface::Map(map) = &mut self.views[i].surface
                    && let Some(action) = map.mouse_down(button, m.at)
                {
                    out.push(Notification::Map(action));
                    self.log(view, LogCategory::Mouse, "drag start".to_string(), now);
                }
            }
            MousePhase::Move => {
                let previous = self.views[i].last_mouse.replace(m.at);
                if let Surface::Map(map) = &mut self.views[i].surface
                    && let Some(action) = map.mouse_move(m.at)
                {
                    let vp = *map.viewport();
                    out.push(Notification::Map(action));
                    self.sinks.display(
                        view,
                        DisplayUpdate::MapTransform {
                            zoom: vp.zoom(),
                            pan: vp.pan(),
                        },
                    );
                }
                if view == ViewKind::Graph
                    && let Some(prev) = previous
                {
                    self.pointer_motion(view, m.at.x - prev.x, m.at.y - prev.y, now, out);
                }
            }
            MousePhase::Up => {
                let button = m.button.unwrap_or(MouseButton::Left);
                self.log(view, LogCategory::Mouse, format!("mouse up ({})", button.label()), now);
                let actions = match &mut self.views[i].surface {
                    Surface::Map(map) => map.mouse_up(m.at),
                    _ => Vec::new(),
                };
                for action in actions {
                    match action {
                        MapAction::DragEnd { pan } => self.log(
                            view,
                            LogCategory::Mouse,
                            format!("drag end ({:.0}, {:.0})", pan.x, pan.y),
                            now,
                        ),
                        MapAction::PinPlaced { at } => {
                            self.sinks.display(view, DisplayUpdate::MapPin { at });
                            self.log(
                                view,
                                LogCategory::Mouse,
                                format!("pin placed ({:.0}, {:.0})", at.x, at.y),
                                now,
                            );
                        }
                        _ => {}
                    }
                    out.push(Notification::Map(action));
                }
            }
        }
    }

    /// Zoom or pan the view's surface. Runs whether or not tracking is enabled.
    fn wheel_surface(&mut self, view: ViewKind, w: &WheelInput, now: Instant, out: &mut Vec<Notification>) {
        let zoom = w.is_zoom();
        match &mut self.views[view.index()].surface {
            Surface::Article(article) if zoom => {
                article.zoom_at(w.at, w.dy);
                let percent = article.zoom_percent();
                self.sinks.display(view, DisplayUpdate::ZoomPercent { percent });
            }
            Surface::Map(map) => {
                let action = map.wheel(w.dx, w.dy, zoom, w.at);
                let vp = *map.viewport();
                self.sinks.display(
                    view,
                    DisplayUpdate::MapTransform {
                        zoom: vp.zoom(),
                        pan: vp.pan(),
                    },
                );
                if let Some(action @ MapAction::Zoomed { percent, zoom_in }) = action {
                    self.sinks.display(view, DisplayUpdate::ZoomPercent { percent });
                    let word = if zoom_in { "in" } else { "out" };
                    self.log(view, LogCategory::Zoom, format!("zoom {word} ({percent}%)"), now);
                    out.push(Notification::Map(action));
                }
            }
            _ => {}
        }
    }

    fn observe_contact(
        &mut self,
        view: ViewKind,
        source: Source,
        id: u32,
        at: crate::event::Point,
        now: Instant,
        out: &mut Vec<Notification>,
    ) {
        let disabled = self.jump.is_disabled(now);
        if let Some(sample) = self.arbiter.observe(source, id, at, disabled, now).sample() {
            self.admit(view, sample, false, now, out);
        }
    }
}

// ---------------------------------------------------------------------------
// Sample pipeline
// ---------------------------------------------------------------------------

impl InputSession {
    /// Jump-check an accepted sample and route it to the view.
    fn admit(&mut self, view: ViewKind, sample: Sample, zoom: bool, now: Instant, out: &mut Vec<Notification>) {
        if self.jump.classify(&sample) == Verdict::Jump {
            self.raise_jump(view, now, out);
            return;
        }
        if self.rejects_stale_motion(view, out) {
            return;
        }
        if zoom {
            self.zoom_sample(view, sample, now, out);
        } else {
            self.scroll_sample(view, sample, now, out);
        }
    }

    /// Drop the active motion when it started before the last jump.
    fn rejects_stale_motion(&mut self, view: ViewKind, out: &mut Vec<Notification>) -> bool {
        let state = &mut self.views[view.index()];
        let stale = state
            .motion
            .state()
            .start
            .is_some_and(|start| self.jump.predates_jump(start));
        if stale {
            state.motion.interrupt();
            self.timers.cancel(TimerId::MotionEnd(view));
            debug!(%view, "sample rejected, motion predates last jump");
            out.push(Notification::MotionDiscarded { view });
        }
        stale
    }

    fn scroll_sample(&mut self, view: ViewKind, sample: Sample, now: Instant, out: &mut Vec<Notification>) {
        let i = view.index();
        let source = sample.source;
        self.views[i].last_source = Some(source);

        let events = self.views[i].direction.observe_scroll(sample.dx, sample.dy);
        for event in events {
            let line = match event {
                DirectionEvent::ScrollStart { x, y } => Some((
                    LogCategory::Scroll,
                    format!("scroll start ({source}) dir: {}", describe(x, y)),
                )),
                DirectionEvent::AxisChange { to } => Some((
                    LogCategory::Scroll,
                    format!("scroll axis change ({source}) to: {}", to.as_str()),
                )),
                DirectionEvent::ScrollChange {
                    axis: Axis::Horizontal,
                    dir,
                } => Some((
                    LogCategory::ScrollX,
                    format!("scroll X → {}", Axis::Horizontal.direction_name(dir)),
                )),
                DirectionEvent::ScrollChange {
                    axis: Axis::Vertical,
                    dir,
                } => Some((
                    LogCategory::ScrollY,
                    format!("scroll Y → {}", Axis::Vertical.direction_name(dir)),
                )),
                _ => None,
            };
            if let Some((category, message)) = line {
                self.log(view, category, message, now);
            }
            out.push(Notification::Direction { view, event });
        }
        self.timers
            .schedule_once(TimerId::DirectionEnd(view, Channel::Scroll), now + self.end_delay);

        self.advance_motion(view, MotionKind::Scroll, sample.dx, sample.dy, now, out);
        self.set_activity(view, Activity::Scrolling, now, out);

        let state = &self.views[i];
        let totals = state.motion.totals();
        let motion = *state.motion.state();
        let direction = state.direction.state();
        self.sinks.display(
            view,
            DisplayUpdate::Delta {
                dx: sample.dx,
                dy: sample.dy,
            },
        );
        self.sinks.display(
            view,
            DisplayUpdate::Totals {
                x: totals.x,
                y: totals.y,
            },
        );
        self.sinks.display(view, DisplayUpdate::Direction(direction));
        self.sinks.display(
            view,
            DisplayUpdate::MotionProgress {
                kind: motion.kind,
                x: motion.accumulated_x,
                y: motion.accumulated_y,
                elapsed_ms: millis(motion.elapsed(now)),
            },
        );

        if view == ViewKind::Graph {
            let point = self.graph.record_scroll(
                sample.dx,
                sample.dy,
                motion.accumulated_x,
                motion.accumulated_y,
                now,
            );
            self.sinks.scroll_point(&point);
            out.push(Notification::ScrollPoint(point));
        }
    }

    fn zoom_sample(&mut self, view: ViewKind, sample: Sample, now: Instant, out: &mut Vec<Notification>) {
        let i = view.index();
        let scale = self.recognizer.report().pinch_scale;
        let events = self.views[i].direction.observe_zoom(sample.dy);
        for event in events {
            let line = match event {
                DirectionEvent::ZoomStart { .. } => Some(format!("zoom start ({scale:.2}x)")),
                DirectionEvent::ZoomChange { dir } => {
                    Some(format!("zoom direction → {}", if dir > 0 { "in" } else { "out" }))
                }
                _ => None,
            };
            if let Some(message) = line {
                self.log(view, LogCategory::Zoom, message, now);
            }
            out.push(Notification::Direction { view, event });
        }
        self.timers
            .schedule_once(TimerId::DirectionEnd(view, Channel::Zoom), now + self.end_delay);

        self.advance_motion(view, MotionKind::Zoom, sample.dx, sample.dy, now, out);
        self.set_activity(view, Activity::Zooming, now, out);
        let direction = self.views[i].direction.state();
        self.sinks.display(view, DisplayUpdate::Direction(direction));

        if view == ViewKind::Graph {
            let point = self.graph.record_zoom(sample.dy, now);
            self.sinks.zoom_point(&point);
            out.push(Notification::ZoomPoint(point));
        }
    }

    /// Mouse movement in the graph view. Never preempts a scroll or zoom motion.
    fn pointer_motion(&mut self, view: ViewKind, dx: f64, dy: f64, now: Instant, out: &mut Vec<Notification>) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let state = self.views[view.index()].motion.state();
        if state.active && state.kind != MotionKind::Move {
            return;
        }
        self.advance_motion(view, MotionKind::Move, dx, dy, now, out);
    }

    /// Fold a sample into the view's motion and re-arm its quiet period.
    fn advance_motion(
        &mut self,
        view: ViewKind,
        kind: MotionKind,
        dx: f64,
        dy: f64,
        now: Instant,
        out: &mut Vec<Notification>,
    ) {
        let i = view.index();
        let current = *self.views[i].motion.state();
        if current.active && current.kind != kind {
            let zoom_level = self.zoom_level(view);
            if let Some(entry) = self.views[i].motion.finish(zoom_level) {
                self.motion_ended(view, entry, now, out);
            }
        }

        let update = self.views[i].motion.update(kind, dx, dy, now);
        if update.started() {
            out.push(Notification::MotionStarted { view, kind });
            if view == ViewKind::Graph && kind != MotionKind::Move {
                self.graph.begin(now);
                self.sinks.graph_cleared();
            }
        }
        let quiet = self.views[i].motion.config().quiet_period;
        self.timers.schedule_once(TimerId::MotionEnd(view), now + quiet);
    }

    /// Zoom level recorded with a finishing zoom motion.
    fn zoom_level(&self, view: ViewKind) -> Option<f64> {
        let state = &self.views[view.index()];
        if state.motion.state().kind != MotionKind::Zoom {
            return None;
        }
        match view {
            ViewKind::Graph => Some(self.graph.level()),
            ViewKind::Debug => Some(self.recognizer.report().pinch_scale),
            ViewKind::Browse | ViewKind::Maps => state.surface.zoom(),
        }
    }

    fn motion_ended(&mut self, view: ViewKind, entry: HistoryEntry, at: Instant, out: &mut Vec<Notification>) {
        let ms = millis(entry.duration);
        let (x, y) = (entry.accumulated_x, entry.accumulated_y);
        let line = match entry.kind {
            MotionKind::Scroll => Some((
                LogCategory::Scroll,
                format!("scroll motion: Δ({x:.0}, {y:.0}) in {ms}ms"),
            )),
            MotionKind::Zoom => Some((
                LogCategory::Zoom,
                match entry.zoom_level {
                    Some(level) => format!("zoom motion: {level:.2}x in {ms}ms"),
                    None => format!("zoom motion in {ms}ms"),
                },
            )),
            MotionKind::Move => Some((
                LogCategory::Pointer,
                format!("move motion: Δ({x:.0}, {y:.0}) in {ms}ms"),
            )),
            MotionKind::None => None,
        };
        if let Some((category, message)) = line {
            self.log(view, category, message, at);
        }
        out.push(Notification::MotionEnded { view, entry });
    }

    /// Record a jump: freeze tracking and invalidate every view's motion.
    fn raise_jump(&mut self, view: ViewKind, now: Instant, out: &mut Vec<Notification>) {
        let until = self.jump.raise(now);
        self.timers.schedule_once(TimerId::JumpCooldown, until);
        let cancelled = self.timers.cancel_where(|id| {
            matches!(id, TimerId::MotionEnd(_) | TimerId::DirectionEnd(..))
        });
        trace!(cancelled, "motion and channel timers cancelled by jump");

        for state in &mut self.views {
            state.direction.reset();
            if state.motion.interrupt() {
                out.push(Notification::MotionInterrupted { view: state.kind() });
            }
        }
        self.log(view, LogCategory::Scroll, "jump detected".to_string(), now);
        self.sinks
            .display(view, DisplayUpdate::TrackingDisabled { disabled: true });
        out.push(Notification::Jump { at: now });
    }
}

// ---------------------------------------------------------------------------
// Timers and output helpers
// ---------------------------------------------------------------------------

impl InputSession {
    fn fire(&mut self, id: TimerId, at: Instant, out: &mut Vec<Notification>) {
        trace!(?id, "timer fired");
        match id {
            TimerId::MotionEnd(view) => self.finish_motion(view, at, out),
            TimerId::DirectionEnd(view, channel) => self.end_channel(view, channel, at, out),
            TimerId::ActivityIdle(view) => {
                if self.views[view.index()].activity.expire(at) {
                    self.announce_activity(view, Activity::Idle, out);
                }
            }
            TimerId::GestureReset => {
                if let Some(report) = self.recognizer.expire(at) {
                    self.emit_gesture(self.active, report, out);
                }
            }
            TimerId::JumpCooldown => {
                if self.jump.expire(at) {
                    self.arbiter.clear_baselines();
                    self.sinks
                        .display(self.active, DisplayUpdate::TrackingDisabled { disabled: false });
                    out.push(Notification::TrackingResumed);
                }
            }
        }
    }

    fn finish_motion(&mut self, view: ViewKind, at: Instant, out: &mut Vec<Notification>) {
        let i = view.index();
        let Some(start) = self.views[i].motion.state().start else {
            return;
        };
        if self.jump.predates_jump(start) {
            self.views[i].motion.interrupt();
            debug!(%view, "motion end discarded, motion predates last jump");
            out.push(Notification::MotionDiscarded { view });
            return;
        }
        let zoom_level = self.zoom_level(view);
        if let Some(entry) = self.views[i].motion.finish(zoom_level) {
            self.motion_ended(view, entry, at, out);
        }
    }

    fn end_channel(&mut self, view: ViewKind, channel: Channel, at: Instant, out: &mut Vec<Notification>) {
        let i = view.index();
        let Some(event) = self.views[i].direction.end(channel) else {
            return;
        };
        let line = match event {
            DirectionEvent::ScrollEnd => {
                let source = self.views[i]
                    .last_source
                    .map_or("unknown", |s| s.as_str());
                Some((LogCategory::Scroll, format!("scroll end ({source})")))
            }
            DirectionEvent::ZoomEnd => {
                let scale = self.recognizer.report().pinch_scale;
                Some((LogCategory::Zoom, format!("zoom end ({scale:.2}x)")))
            }
            _ => None,
        };
        if let Some((category, message)) = line {
            self.log(view, category, message, at);
        }
        let direction = self.views[i].direction.state();
        self.sinks.display(view, DisplayUpdate::Direction(direction));
        out.push(Notification::Direction { view, event });
    }

    fn set_activity(&mut self, view: ViewKind, activity: Activity, now: Instant, out: &mut Vec<Notification>) {
        let tracker = &mut self.views[view.index()].activity;
        let changed = tracker.current() != activity;
        match tracker.set(activity, now) {
            Some(deadline) => self.timers.schedule_once(TimerId::ActivityIdle(view), deadline),
            None => {
                self.timers.cancel(TimerId::ActivityIdle(view));
            }
        }
        if changed {
            self.announce_activity(view, activity, out);
        }
    }

    fn announce_activity(&mut self, view: ViewKind, activity: Activity, out: &mut Vec<Notification>) {
        self.sinks.display(view, DisplayUpdate::Activity { activity });
        out.push(Notification::Activity { view, activity });
    }

    fn emit_gesture(&mut self, view: ViewKind, report: GestureReport, out: &mut Vec<Notification>) {
        self.sinks.display(view, DisplayUpdate::Gesture(report));
        out.push(Notification::Gesture(report));
    }

    fn sync_gesture_timer(&mut self) {
        match self.recognizer.reset_at() {
            Some(at) => self.timers.schedule_once(TimerId::GestureReset, at),
            None => {
                self.timers.cancel(TimerId::GestureReset);
            }
        }
    }

    fn log(&mut self, view: ViewKind, category: LogCategory, message: String, at: Instant) {
        let entry = LogEntry {
            timestamp: self.clock.log_stamp(at),
            category,
            message,
        };
        self.sinks.log(view, &entry);
        self.views[view.index()].log.push(entry);
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
