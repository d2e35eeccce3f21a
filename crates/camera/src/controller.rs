//! First-person camera controller.
//!
//! Turns pan/wheel/tap/key events into camera motion:
//! - drag pans the camera in meters, anchored on the world point grabbed at
//!   drag start and scaled with distance from the origin
//! - alternate drag (modifier or right button) looks around the camera position
//! - wheel and double-tap dolly along the view direction
//! - a release with velocity adds one extrapolated step, animated by the host
//!
//! Every handled event produces a new [`ControllerState`] and a
//! [`ViewportUpdate`] for the sink; unhandled events return `false` so the
//! host can offer them elsewhere.

use foundation::math::{Vec2, Vec3};
use foundation::Aabb2;
use tracing::{debug, trace};

use crate::event::{EventKind, EventType, InputEvent, Key};
use crate::options::{ControllerOptions, DragMode, INSTANT_WHEEL_MS, SMOOTH_WHEEL_MS};
use crate::state::{ControllerState, ViewportState};
use crate::transition::{
    InteractionFlags, SCREEN_SCALE_FACTOR, TransitionSpec, ViewportSink, ViewportUpdate,
};
use crate::viewport::{FirstPersonViewport, Viewport};

/// View-space depth (meters) at which pan pointers are unprojected.
pub const CAMERA_SCREEN_DEPTH: f64 = 0.1;

/// Multiplicative zoom for a wheel delta.
///
/// Logistic in `|delta * speed|`, so a single tick never zooms by more than 2x
/// however large the delta; negative deltas zoom out by the reciprocal.
pub fn wheel_scale(delta: f64, speed: f64) -> f64 {
    let mut scale = 2.0 / (1.0 + (-(delta * speed).abs()).exp());
    if delta < 0.0 && scale != 0.0 {
        scale = 1.0 / scale;
    }
    scale
}

/// Memory of a pan drag, valid from drag start to drag end.
#[derive(Debug, Clone)]
struct PanSession<V> {
    start_pos: [f64; 2],
    /// `[lon, lat, alt]` under the pointer at drag start.
    start_anchor: Option<[f64; 3]>,
    start_camera_position: Vec3,
    /// Projection frozen at drag start; every move unprojects through it.
    viewport: V,
}

#[derive(Debug, Clone)]
enum Gesture<V> {
    Pan(PanSession<V>),
    Rotate,
}

#[derive(Debug, Clone)]
enum Phase<V> {
    Idle,
    Dragging(Gesture<V>),
    /// Post double-tap cooldown, until the given event timestamp (ms).
    Blocked { until_ms: f64 },
}

type Handler<V> = fn(&mut CameraController<V>, &InputEvent, &mut dyn ViewportSink) -> bool;

#[derive(Debug, Clone)]
pub struct CameraController<V = FirstPersonViewport> {
    options: ControllerOptions,
    state: ControllerState,
    phase: Phase<V>,
}

impl<V: Viewport> CameraController<V> {
    const HANDLERS: [(EventType, Handler<V>); 6] = [
        (EventType::PanStart, Self::handle_drag_start),
        (EventType::PanMove, Self::handle_drag_move),
        (EventType::PanEnd, Self::handle_drag_end),
        (EventType::Wheel, Self::handle_wheel),
        (EventType::DoubleTap, Self::handle_double_tap),
        (EventType::KeyDown, Self::handle_key_down),
    ];

    pub fn new(state: ViewportState, options: ControllerOptions) -> Self {
        Self {
            options,
            state: ControllerState::new(state),
            phase: Phase::Idle,
        }
    }

    pub fn state(&self) -> &ViewportState {
        self.state.viewport()
    }

    pub fn controller_state(&self) -> &ControllerState {
        &self.state
    }

    /// Adopt a state committed by the host (after clamping or mirroring).
    /// A drag in progress keeps its session.
    pub fn set_state(&mut self, state: ViewportState) {
        self.state = self.state.with_viewport(state);
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ControllerOptions) {
        self.options = options;
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging(_))
    }

    pub fn is_blocked(&self, now_ms: f64) -> bool {
        matches!(self.phase, Phase::Blocked { until_ms } if now_ms < until_ms)
    }

    /// Abandon a drag in progress without emitting an update. Used by hosts
    /// when the matching drag end will never reach this controller.
    pub fn cancel_gesture(&mut self) {
        if let Phase::Dragging(_) = self.phase {
            debug!("drag cancelled");
            self.phase = Phase::Idle;
            self.state = self.state.rotate_end();
        }
    }

    /// Interpret one input event. Returns whether it was consumed.
    pub fn handle_event(&mut self, event: &InputEvent, sink: &mut dyn ViewportSink) -> bool {
        if let Phase::Blocked { until_ms } = self.phase {
            if event.timestamp_ms >= until_ms {
                self.phase = Phase::Idle;
            }
        }

        let ty = event.event_type();
        match Self::HANDLERS.iter().find(|(t, _)| *t == ty) {
            Some((_, handler)) => handler(self, event, sink),
            None => false,
        }
    }

    fn bounds(&self) -> Aabb2 {
        self.options.bounds.unwrap_or_else(|| {
            let s = self.state.viewport();
            Aabb2::new([0.0, 0.0], [s.width, s.height])
        })
    }

    fn in_bounds(&self, pos: [f64; 2]) -> bool {
        self.bounds().contains(pos)
    }

    fn emit(
        &mut self,
        state: ControllerState,
        transition: Option<TransitionSpec>,
        interaction: InteractionFlags,
        sink: &mut dyn ViewportSink,
    ) {
        self.state = state;
        sink.update_viewport(ViewportUpdate {
            state: *state.viewport(),
            transition,
            interaction,
            screen_scale_factor: SCREEN_SCALE_FACTOR,
        });
    }

    fn handle_drag_start(&mut self, event: &InputEvent, sink: &mut dyn ViewportSink) -> bool {
        let EventKind::PanStart {
            pos,
            right_button,
            modifiers,
        } = event.kind
        else {
            return false;
        };
        if let Phase::Blocked { .. } = self.phase {
            debug!("drag start ignored during cooldown");
            return false;
        }
        if !self.in_bounds(pos) {
            return false;
        }

        let mut rotate = modifiers.any() || right_button;
        if self.options.invert_pan || self.options.drag_mode == DragMode::Pan {
            rotate = !rotate;
        }
        if (rotate && !self.options.drag_rotate) || (!rotate && !self.options.drag_pan) {
            return false;
        }

        // Any residual session from an abandoned drag is replaced here.
        let next = if rotate {
            self.phase = Phase::Dragging(Gesture::Rotate);
            self.state.rotate_start(pos)
        } else {
            let viewport = V::from_state(self.state.viewport());
            let start_anchor = viewport.unproject([pos[0], pos[1], CAMERA_SCREEN_DEPTH]);
            if start_anchor.is_none() {
                debug!(?pos, "pan anchor did not unproject");
            }
            self.phase = Phase::Dragging(Gesture::Pan(PanSession {
                start_pos: pos,
                start_anchor,
                start_camera_position: self.state.position(),
                viewport,
            }));
            self.state.rotate_end()
        };
        debug!(?pos, rotate, "drag started");

        self.emit(next, None, InteractionFlags::dragging(), sink);
        true
    }

    fn handle_drag_move(&mut self, event: &InputEvent, sink: &mut dyn ViewportSink) -> bool {
        let EventKind::PanMove { pos } = event.kind else {
            return false;
        };

        let (next, interaction) = match &self.phase {
            Phase::Dragging(Gesture::Pan(session)) => (
                self.pan_step(session, pos),
                InteractionFlags::dragging().panning(),
            ),
            Phase::Dragging(Gesture::Rotate) => (
                self.state.rotate(pos),
                InteractionFlags::dragging().rotating(),
            ),
            _ => return false,
        };

        self.emit(next, None, interaction, sink);
        true
    }

    fn handle_drag_end(&mut self, event: &InputEvent, sink: &mut dyn ViewportSink) -> bool {
        let EventKind::PanEnd {
            pos,
            velocity,
            velocity_x,
            velocity_y,
        } = event.kind
        else {
            return false;
        };

        let gesture = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Dragging(gesture) => gesture,
            other => {
                self.phase = other;
                return false;
            }
        };

        let inertia = self.options.inertia_ms;
        let fling = inertia > 0.0 && velocity != 0.0 && velocity.is_finite();
        // Extrapolate half the inertia window along the release velocity.
        let end_pos =
            (Vec2::from(pos) + Vec2::new(velocity_x, velocity_y) * (inertia / 2.0)).as_array();
        debug!(?pos, fling, "drag ended");

        match gesture {
            Gesture::Pan(session) if fling => {
                let next = self.pan_step(&session, end_pos);
                self.emit(
                    next,
                    Some(TransitionSpec::inertia(inertia)),
                    InteractionFlags::IDLE.panning(),
                    sink,
                );
            }
            Gesture::Pan(_) => {
                self.emit(self.state, None, InteractionFlags::IDLE, sink);
            }
            Gesture::Rotate if fling => {
                let next = self.state.rotate(end_pos).rotate_end();
                self.emit(
                    next,
                    Some(TransitionSpec::inertia(inertia)),
                    InteractionFlags::IDLE.rotating(),
                    sink,
                );
            }
            Gesture::Rotate => {
                self.emit(self.state.rotate_end(), None, InteractionFlags::IDLE, sink);
            }
        }
        true
    }

    /// Camera state that keeps the drag-start anchor under `pos`.
    ///
    /// The lon/lat/alt delta between anchor and pointer (both unprojected
    /// through the frozen viewport) is converted to meters at the anchor,
    /// scaled by `pan_speed * (1 + |camera position|)` and subtracted from the
    /// drag-start camera position. Anything that fails to unproject leaves the
    /// state as it is.
    fn pan_step(&self, session: &PanSession<V>, pos: [f64; 2]) -> ControllerState {
        let Some(anchor) = session.start_anchor else {
            return self.state;
        };
        let Some(current) = session
            .viewport
            .unproject([pos[0], pos[1], CAMERA_SCREEN_DEPTH])
        else {
            trace!(?pos, start = ?session.start_pos, "pan pointer did not unproject");
            return self.state;
        };

        let [mx, my] = session
            .viewport
            .distance_scales([anchor[0], anchor[1]])
            .meters_per_unit;
        let shift = Vec3::new(
            (current[0] - anchor[0]) * mx,
            (current[1] - anchor[1]) * my,
            current[2] - anchor[2],
        );

        let distance = self.state.position().length();
        let speed = self.options.pan_speed * (1.0 + distance);
        self.state
            .with_position(session.start_camera_position - shift * speed)
    }

    fn handle_wheel(&mut self, event: &InputEvent, sink: &mut dyn ViewportSink) -> bool {
        let EventKind::Wheel { pos, delta, .. } = event.kind else {
            return false;
        };
        let Some(settings) = self.options.scroll_zoom.settings() else {
            return false;
        };
        sink.suppress_default();
        if !self.in_bounds(pos) {
            return false;
        }

        let scale = wheel_scale(delta, settings.speed);
        let next = self.state.zoom(scale, self.options.zoom_speed);
        let duration = if settings.smooth {
            SMOOTH_WHEEL_MS
        } else {
            INSTANT_WHEEL_MS
        };
        self.emit(
            next,
            Some(TransitionSpec::linear(duration).around(pos)),
            InteractionFlags::IDLE.zooming().panning(),
            sink,
        );
        true
    }

    fn handle_double_tap(&mut self, event: &InputEvent, sink: &mut dyn ViewportSink) -> bool {
        let EventKind::DoubleTap { pos, modifiers } = event.kind else {
            return false;
        };
        if !self.options.double_click_zoom {
            return false;
        }
        if let Phase::Blocked { .. } = self.phase {
            debug!("double tap ignored during cooldown");
            return false;
        }
        if !self.in_bounds(pos) {
            return false;
        }

        // A tap ends any drag the recognizer had started; the cooldown below
        // replaces the drag phase.
        let current = self.state.rotate_end();
        // Zoom distance grows with distance from the origin.
        let scale = 1.0 + current.position().length();
        let scale = if modifiers.any() { 1.0 / scale } else { scale };
        let next = current.zoom(scale, self.options.zoom_speed);

        self.emit(
            next,
            Some(TransitionSpec::linear(self.options.transition_ms).around(pos)),
            InteractionFlags::IDLE.zooming().panning(),
            sink,
        );
        self.phase = Phase::Blocked {
            until_ms: event.timestamp_ms + self.options.block_ms,
        };
        true
    }

    fn handle_key_down(&mut self, event: &InputEvent, sink: &mut dyn ViewportSink) -> bool {
        let EventKind::KeyDown { key, modifiers } = &event.kind else {
            return false;
        };
        let Some(speeds) = self.options.keyboard.speeds() else {
            return false;
        };
        if self.is_dragging() {
            return false;
        }

        let func = modifiers.any();
        let zoom_speed = self.options.zoom_speed;
        let s = self.state;
        let zoom_by = |scale: f64| {
            let once = s.zoom(scale, zoom_speed);
            if func { once.zoom(scale, zoom_speed) } else { once }
        };

        let (next, interaction) = match key {
            Key::Minus => (zoom_by(1.0 / speeds.zoom_speed), InteractionFlags::IDLE.zooming()),
            Key::Equal => (zoom_by(speeds.zoom_speed), InteractionFlags::IDLE.zooming()),
            Key::ArrowLeft if func => (
                s.rotate_left(speeds.rotate_speed_x),
                InteractionFlags::IDLE.rotating(),
            ),
            Key::ArrowLeft => (s.move_left(speeds.move_speed), InteractionFlags::IDLE.panning()),
            Key::ArrowRight if func => (
                s.rotate_right(speeds.rotate_speed_x),
                InteractionFlags::IDLE.rotating(),
            ),
            Key::ArrowRight => (s.move_right(speeds.move_speed), InteractionFlags::IDLE.panning()),
            Key::ArrowUp if func => (
                s.rotate_up(speeds.rotate_speed_y),
                InteractionFlags::IDLE.rotating(),
            ),
            Key::ArrowUp => (s.move_forward(speeds.move_speed), InteractionFlags::IDLE.panning()),
            Key::ArrowDown if func => (
                s.rotate_down(speeds.rotate_speed_y),
                InteractionFlags::IDLE.rotating(),
            ),
            Key::ArrowDown => (s.move_backward(speeds.move_speed), InteractionFlags::IDLE.panning()),
            Key::Other(_) => return false,
        };

        self.emit(
            next,
            Some(TransitionSpec::linear(self.options.transition_ms)),
            interaction,
            sink,
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{CAMERA_SCREEN_DEPTH, CameraController, wheel_scale};
    use crate::event::{EventKind, InputEvent, Key, Modifiers};
    use crate::options::{ControllerOptions, DragMode, ScrollSettings, ScrollZoom};
    use crate::state::ViewportState;
    use crate::transition::{
        Easing, InteractionFlags, SCREEN_SCALE_FACTOR, ViewportSink, ViewportUpdate,
    };
    use crate::viewport::{DistanceScales, Viewport};
    use foundation::Aabb2;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[derive(Default)]
    struct Recorder {
        updates: Vec<ViewportUpdate>,
        suppressed: usize,
    }

    impl ViewportSink for Recorder {
        fn update_viewport(&mut self, update: ViewportUpdate) {
            self.updates.push(update);
        }

        fn suppress_default(&mut self) {
            self.suppressed += 1;
        }
    }

    /// Viewport whose pointer ray never hits anything.
    struct Blind;

    impl Viewport for Blind {
        fn from_state(_: &ViewportState) -> Self {
            Blind
        }

        fn unproject(&self, _: [f64; 3]) -> Option<[f64; 3]> {
            None
        }

        fn distance_scales(&self, _: [f64; 2]) -> DistanceScales {
            DistanceScales {
                meters_per_unit: [1.0, 1.0],
            }
        }
    }

    fn start_state(position: [f64; 3]) -> ViewportState {
        ViewportState {
            longitude: -100.0,
            latitude: 40.0,
            position,
            width: 800.0,
            height: 600.0,
            ..ViewportState::default()
        }
    }

    fn controller_at(position: [f64; 3]) -> CameraController {
        CameraController::new(start_state(position), ControllerOptions::default())
    }

    fn pan_start(t: f64, pos: [f64; 2]) -> InputEvent {
        InputEvent::new(
            t,
            EventKind::PanStart {
                pos,
                right_button: false,
                modifiers: Modifiers::NONE,
            },
        )
    }

    fn pan_move(t: f64, pos: [f64; 2]) -> InputEvent {
        InputEvent::new(t, EventKind::PanMove { pos })
    }

    fn pan_end(t: f64, pos: [f64; 2], velocity: [f64; 2]) -> InputEvent {
        InputEvent::new(
            t,
            EventKind::PanEnd {
                pos,
                velocity: velocity[0].hypot(velocity[1]),
                velocity_x: velocity[0],
                velocity_y: velocity[1],
            },
        )
    }

    fn wheel(t: f64, pos: [f64; 2], delta: f64) -> InputEvent {
        InputEvent::new(
            t,
            EventKind::Wheel {
                pos,
                delta,
                delta_x: 0.0,
                delta_y: -delta,
            },
        )
    }

    fn double_tap(t: f64, pos: [f64; 2], modifiers: Modifiers) -> InputEvent {
        InputEvent::new(t, EventKind::DoubleTap { pos, modifiers })
    }

    fn key(t: f64, key: Key, modifiers: Modifiers) -> InputEvent {
        InputEvent::new(t, EventKind::KeyDown { key, modifiers })
    }

    const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    /// Full drag from `from` to `to` with no release velocity.
    fn drag(ctrl: &mut CameraController, from: [f64; 2], to: [f64; 2]) {
        let mut sink = Recorder::default();
        assert!(ctrl.handle_event(&pan_start(0.0, from), &mut sink));
        assert!(ctrl.handle_event(&pan_move(16.0, to), &mut sink));
        assert!(ctrl.handle_event(&pan_end(32.0, to, [0.0, 0.0]), &mut sink));
    }

    #[test]
    fn pan_move_while_idle_is_not_consumed() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let before = *ctrl.state();
        let mut sink = Recorder::default();

        assert!(!ctrl.handle_event(&pan_move(0.0, [10.0, 10.0]), &mut sink));
        assert!(!ctrl.handle_event(&pan_end(0.0, [10.0, 10.0], [1.0, 0.0]), &mut sink));
        assert!(sink.updates.is_empty());
        assert_eq!(*ctrl.state(), before);
    }

    #[test]
    fn drag_start_outside_bounds_is_not_consumed() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        assert!(!ctrl.handle_event(&pan_start(0.0, [900.0, 10.0]), &mut sink));
        assert!(!ctrl.is_dragging());
        assert!(sink.updates.is_empty());
    }

    #[test]
    fn configured_bounds_replace_viewport_rect() {
        let options = ControllerOptions {
            bounds: Some(Aabb2::new([100.0, 100.0], [200.0, 200.0])),
            ..ControllerOptions::default()
        };
        let mut ctrl: CameraController = CameraController::new(start_state([0.0, 0.0, 100.0]), options);
        let mut sink = Recorder::default();
        assert!(!ctrl.handle_event(&pan_start(0.0, [400.0, 300.0]), &mut sink));
        assert!(!ctrl.handle_event(&wheel(0.0, [50.0, 50.0], 10.0), &mut sink));
        assert!(ctrl.handle_event(&pan_start(10.0, [150.0, 150.0]), &mut sink));
    }

    #[test]
    fn drag_start_emits_untransitioned_dragging_update() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        assert!(ctrl.handle_event(&pan_start(0.0, [400.0, 300.0]), &mut sink));
        assert!(ctrl.is_dragging());

        let update = sink.updates[0];
        assert!(update.transition.is_none());
        assert_eq!(update.interaction, InteractionFlags::dragging());
        assert_eq!(update.state.position, [0.0, 0.0, 100.0]);
        assert_eq!(update.screen_scale_factor, SCREEN_SCALE_FACTOR);
    }

    #[test]
    fn pan_moves_camera_against_the_pointer() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        ctrl.handle_event(&pan_start(0.0, [400.0, 300.0]), &mut sink);
        ctrl.handle_event(&pan_move(16.0, [450.0, 300.0]), &mut sink);

        let update = sink.updates[1];
        assert_eq!(update.interaction, InteractionFlags::dragging().panning());
        assert!(update.transition.is_none());
        // Pointer moved right: the camera slides west, lon/lat stay put.
        assert!(update.state.position[0] < 0.0);
        assert_close(update.state.position[1], 0.0, 1e-9);
        assert_close(update.state.position[2], 100.0, 1e-9);
        assert_eq!(update.state.longitude, -100.0);
        assert_eq!(update.state.latitude, 40.0);
    }

    #[test]
    fn pan_displacement_matches_scaled_screen_plane_delta() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        drag(&mut ctrl, [400.0, 300.0], [500.0, 300.0]);

        // 100 px at depth 0.1 m with a 50 degree vertical fov over 600 px.
        let half_h = (25.0_f64).to_radians().tan();
        let half_w = half_h * 800.0 / 600.0;
        let meters = 2.0 * 100.0 / 800.0 * half_w * CAMERA_SCREEN_DEPTH;
        let expected = -meters * 4.0 * (1.0 + 100.0);
        assert_close(ctrl.state().position[0], expected, 1e-6);
    }

    #[test]
    fn pan_is_reversible() {
        let start = [0.0, 0.0, 100.0];
        let mut ctrl = controller_at(start);
        drag(&mut ctrl, [400.0, 300.0], [410.0, 300.0]);
        assert!(ctrl.state().position[0] < -0.1);

        drag(&mut ctrl, [400.0, 300.0], [390.0, 300.0]);
        let end = ctrl.state().position;
        for i in 0..3 {
            assert_close(end[i], start[i], 1e-3);
        }
    }

    #[test]
    fn pan_speed_grows_with_altitude() {
        let mut low = controller_at([0.0, 0.0, 10.0]);
        let mut high = controller_at([0.0, 0.0, 1000.0]);
        drag(&mut low, [400.0, 300.0], [420.0, 300.0]);
        drag(&mut high, [400.0, 300.0], [420.0, 300.0]);

        let low_shift = low.state().position[0].abs();
        let high_shift = high.state().position[0].abs();
        assert!(low_shift > 0.0);
        assert!(high_shift > low_shift * 10.0);
    }

    #[test]
    fn unreachable_anchor_keeps_current_state() {
        let mut ctrl: CameraController<Blind> =
            CameraController::new(start_state([3.0, 4.0, 50.0]), ControllerOptions::default());
        let before = *ctrl.state();
        let mut sink = Recorder::default();

        assert!(ctrl.handle_event(&pan_start(0.0, [400.0, 300.0]), &mut sink));
        assert!(ctrl.handle_event(&pan_move(16.0, [500.0, 100.0]), &mut sink));
        assert!(ctrl.handle_event(&pan_end(32.0, [500.0, 100.0], [2.0, 2.0]), &mut sink));

        for update in &sink.updates {
            assert_eq!(update.state, before);
            assert!(update.state.position.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn release_velocity_adds_one_extrapolated_step() {
        let mut flung = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        flung.handle_event(&pan_start(0.0, [400.0, 300.0]), &mut sink);
        flung.handle_event(&pan_move(16.0, [420.0, 300.0]), &mut sink);
        let before_end = sink.updates.len();
        assert!(flung.handle_event(&pan_end(32.0, [420.0, 300.0], [0.5, 0.0]), &mut sink));
        assert_eq!(sink.updates.len(), before_end + 1);

        let update = sink.updates[before_end];
        let transition = update.transition.expect("inertia transition");
        assert_eq!(transition.duration_ms, 200.0);
        assert_eq!(transition.easing, Easing::EaseOutQuad);
        assert_eq!(update.interaction, InteractionFlags::IDLE.panning());

        // Same as moving the pointer 0.5 px/ms * 200 ms / 2 = 50 px further.
        let mut manual = controller_at([0.0, 0.0, 100.0]);
        let mut scratch = Recorder::default();
        manual.handle_event(&pan_start(0.0, [400.0, 300.0]), &mut scratch);
        manual.handle_event(&pan_move(16.0, [420.0, 300.0]), &mut scratch);
        manual.handle_event(&pan_move(32.0, [470.0, 300.0]), &mut scratch);
        assert_eq!(update.state.position, manual.state().position);

        assert!(!flung.is_dragging());
        assert!(!flung.handle_event(&pan_move(48.0, [500.0, 300.0]), &mut sink));
    }

    #[test]
    fn still_release_emits_final_state_without_transition() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        ctrl.handle_event(&pan_start(0.0, [400.0, 300.0]), &mut sink);
        ctrl.handle_event(&pan_move(16.0, [420.0, 300.0]), &mut sink);
        let moved = *ctrl.state();
        ctrl.handle_event(&pan_end(32.0, [420.0, 300.0], [0.0, 0.0]), &mut sink);

        let last = sink.updates.last().expect("update");
        assert!(last.transition.is_none());
        assert_eq!(last.interaction, InteractionFlags::IDLE);
        assert_eq!(last.state, moved);
    }

    #[test]
    fn fresh_drag_start_replaces_abandoned_session() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        ctrl.handle_event(&pan_start(0.0, [400.0, 300.0]), &mut sink);
        ctrl.handle_event(&pan_move(16.0, [500.0, 300.0]), &mut sink);
        let after_first = *ctrl.state();

        // No pan end; a new gesture starts elsewhere and does not move yet.
        assert!(ctrl.handle_event(&pan_start(100.0, [100.0, 100.0]), &mut sink));
        assert!(ctrl.handle_event(&pan_move(116.0, [100.0, 100.0]), &mut sink));
        let now = ctrl.state().position;
        for i in 0..3 {
            assert_close(now[i], after_first.position[i], 1e-9);
        }
    }

    #[test]
    fn alternate_drag_rotates_around_camera() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        let start = InputEvent::new(
            0.0,
            EventKind::PanStart {
                pos: [400.0, 300.0],
                right_button: true,
                modifiers: Modifiers::NONE,
            },
        );
        assert!(ctrl.handle_event(&start, &mut sink));
        assert!(ctrl.controller_state().is_rotating());

        ctrl.handle_event(&pan_move(16.0, [600.0, 300.0]), &mut sink);
        let update = sink.updates.last().expect("update");
        assert_eq!(update.interaction, InteractionFlags::dragging().rotating());
        assert_close(update.state.bearing, -45.0, 1e-9);
        assert_eq!(update.state.position, [0.0, 0.0, 100.0]);

        ctrl.handle_event(&pan_end(32.0, [600.0, 300.0], [0.0, 0.0]), &mut sink);
        assert!(!ctrl.controller_state().is_rotating());
    }

    #[test]
    fn rotate_release_velocity_extrapolates_once() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        let start = InputEvent::new(
            0.0,
            EventKind::PanStart {
                pos: [400.0, 300.0],
                right_button: false,
                modifiers: SHIFT,
            },
        );
        ctrl.handle_event(&start, &mut sink);
        ctrl.handle_event(&pan_end(16.0, [400.0, 300.0], [1.0, 0.0]), &mut sink);

        let update = sink.updates.last().expect("update");
        // 1 px/ms * 100 ms = 100 px = 22.5 degrees.
        assert_close(update.state.bearing, -22.5, 1e-9);
        assert_eq!(update.transition.map(|t| t.duration_ms), Some(200.0));
        assert!(!ctrl.controller_state().is_rotating());
    }

    #[test]
    fn drag_mode_pan_swaps_plain_and_alternate_drags() {
        let options = ControllerOptions {
            drag_mode: DragMode::Pan,
            ..ControllerOptions::default()
        };
        let mut ctrl: CameraController = CameraController::new(start_state([0.0, 0.0, 100.0]), options);
        let mut sink = Recorder::default();
        ctrl.handle_event(&pan_start(0.0, [400.0, 300.0]), &mut sink);
        assert!(ctrl.controller_state().is_rotating());
    }

    #[test]
    fn disabled_drag_is_not_consumed() {
        let options = ControllerOptions {
            drag_pan: false,
            ..ControllerOptions::default()
        };
        let mut ctrl: CameraController = CameraController::new(start_state([0.0, 0.0, 100.0]), options);
        let mut sink = Recorder::default();
        assert!(!ctrl.handle_event(&pan_start(0.0, [400.0, 300.0]), &mut sink));
        assert!(!ctrl.is_dragging());
    }

    #[test]
    fn wheel_scale_is_logistic_and_bounded() {
        let mut last = 1.0;
        for delta in [10.0, 50.0, 200.0, 1000.0] {
            let s = wheel_scale(delta, 0.01);
            assert!(s > last && s < 2.0, "scale {s} for delta {delta}");
            last = s;
        }
        let out = wheel_scale(-50.0, 0.01);
        assert_close(out * wheel_scale(50.0, 0.01), 1.0, 1e-12);
        assert_eq!(wheel_scale(0.0, 0.01), 1.0);
    }

    #[test]
    fn larger_wheel_deltas_move_closer() {
        let mut last_forward = 0.0;
        for delta in [10.0, 50.0, 200.0, 1000.0] {
            let mut ctrl = controller_at([0.0, 0.0, 100.0]);
            let mut sink = Recorder::default();
            assert!(ctrl.handle_event(&wheel(0.0, [400.0, 300.0], delta), &mut sink));
            // Looking north: forward progress is the y coordinate.
            let forward = ctrl.state().position[1];
            assert!(forward > last_forward);
            last_forward = forward;
        }
        assert!(last_forward < 4.0);
    }

    #[test]
    fn wheel_in_then_out_returns_to_start() {
        let mut state = start_state([5.0, -3.0, 100.0]);
        state.pitch = -25.0;
        state.bearing = 30.0;
        let mut ctrl: CameraController = CameraController::new(state, ControllerOptions::default());
        let mut sink = Recorder::default();
        ctrl.handle_event(&wheel(0.0, [400.0, 300.0], 120.0), &mut sink);
        assert!(ctrl.state().position[2] < 100.0);
        ctrl.handle_event(&wheel(20.0, [400.0, 300.0], -120.0), &mut sink);

        let end = ctrl.state().position;
        assert_close(end[0], 5.0, 1e-9);
        assert_close(end[1], -3.0, 1e-9);
        assert_close(end[2], 100.0, 1e-9);
    }

    #[test]
    fn wheel_transition_depends_on_smooth_flag() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        ctrl.handle_event(&wheel(0.0, [100.0, 200.0], 10.0), &mut sink);
        let t = sink.updates[0].transition.expect("transition");
        assert_eq!(t.duration_ms, 1.0);
        assert_eq!(t.around, Some([100.0, 200.0]));
        assert_eq!(
            sink.updates[0].interaction,
            InteractionFlags::IDLE.zooming().panning()
        );

        ctrl.set_options(ControllerOptions {
            scroll_zoom: ScrollZoom::Tuned(ScrollSettings {
                speed: 0.01,
                smooth: true,
            }),
            ..ControllerOptions::default()
        });
        ctrl.handle_event(&wheel(10.0, [100.0, 200.0], 10.0), &mut sink);
        assert_eq!(sink.updates[1].transition.map(|t| t.duration_ms), Some(250.0));
    }

    #[test]
    fn wheel_suppresses_default_even_out_of_bounds() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        assert!(!ctrl.handle_event(&wheel(0.0, [-10.0, 300.0], 10.0), &mut sink));
        assert_eq!(sink.suppressed, 1);
        assert!(sink.updates.is_empty());

        ctrl.set_options(ControllerOptions {
            scroll_zoom: ScrollZoom::Enabled(false),
            ..ControllerOptions::default()
        });
        assert!(!ctrl.handle_event(&wheel(0.0, [400.0, 300.0], 10.0), &mut sink));
        assert_eq!(sink.suppressed, 1);
    }

    #[test]
    fn double_tap_zooms_then_blocks() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        assert!(ctrl.handle_event(&double_tap(0.0, [400.0, 300.0], Modifiers::NONE), &mut sink));
        // log2(101) * 4 meters forward.
        assert_close(ctrl.state().position[1], 101.0_f64.log2() * 4.0, 1e-9);
        assert_eq!(sink.updates[0].transition.map(|t| t.duration_ms), Some(300.0));
        assert!(ctrl.is_blocked(50.0));

        assert!(!ctrl.handle_event(&double_tap(50.0, [400.0, 300.0], Modifiers::NONE), &mut sink));
        assert!(!ctrl.handle_event(&pan_start(60.0, [400.0, 300.0]), &mut sink));
        assert_eq!(sink.updates.len(), 1);

        assert!(ctrl.handle_event(&double_tap(150.0, [400.0, 300.0], Modifiers::NONE), &mut sink));
        assert_eq!(sink.updates.len(), 2);
    }

    #[test]
    fn cooldown_ends_exactly_block_ms_after_tap() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        assert!(ctrl.handle_event(&double_tap(50.0, [400.0, 300.0], Modifiers::NONE), &mut sink));
        assert!(ctrl.is_blocked(149.0));
        assert!(!ctrl.is_blocked(150.0));
        assert!(ctrl.handle_event(&double_tap(150.0, [400.0, 300.0], Modifiers::NONE), &mut sink));
        assert_eq!(sink.updates.len(), 2);
    }

    #[test]
    fn double_tap_during_drag_ends_the_drag_and_zooms() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        ctrl.handle_event(&pan_start(0.0, [400.0, 300.0]), &mut sink);
        assert!(ctrl.is_dragging());

        assert!(ctrl.handle_event(&double_tap(10.0, [400.0, 300.0], Modifiers::NONE), &mut sink));
        assert!(!ctrl.is_dragging());
        assert!(ctrl.state().position[1] > 0.0);
        assert!(!ctrl.handle_event(&pan_move(20.0, [500.0, 300.0]), &mut sink));
    }

    #[test]
    fn cancel_gesture_drops_drag_silently() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        let start = InputEvent::new(
            0.0,
            EventKind::PanStart {
                pos: [400.0, 300.0],
                right_button: true,
                modifiers: Modifiers::NONE,
            },
        );
        ctrl.handle_event(&start, &mut sink);
        assert!(ctrl.controller_state().is_rotating());
        let updates = sink.updates.len();

        ctrl.cancel_gesture();
        assert!(!ctrl.is_dragging());
        assert!(!ctrl.controller_state().is_rotating());
        assert_eq!(sink.updates.len(), updates);
        assert!(!ctrl.handle_event(&pan_move(10.0, [500.0, 300.0]), &mut sink));
        assert!(ctrl.handle_event(&key(20.0, Key::ArrowUp, Modifiers::NONE), &mut sink));
    }

    #[test]
    fn wheel_is_accepted_during_cooldown() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        ctrl.handle_event(&double_tap(0.0, [400.0, 300.0], Modifiers::NONE), &mut sink);
        assert!(ctrl.handle_event(&wheel(20.0, [400.0, 300.0], 10.0), &mut sink));
    }

    #[test]
    fn double_tap_with_modifier_zooms_out() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        ctrl.handle_event(&double_tap(0.0, [400.0, 300.0], SHIFT), &mut sink);
        assert!(ctrl.state().position[1] < 0.0);
    }

    #[test]
    fn controller_never_requests_negative_altitude() {
        let mut state = start_state([0.0, 0.0, 2.0]);
        state.pitch = -90.0;
        let mut ctrl: CameraController = CameraController::new(state, ControllerOptions::default());
        let mut sink = Recorder::default();
        for i in 0..5 {
            ctrl.handle_event(
                &double_tap(i as f64 * 200.0, [400.0, 300.0], Modifiers::NONE),
                &mut sink,
            );
        }
        ctrl.handle_event(&wheel(2000.0, [400.0, 300.0], 1000.0), &mut sink);
        // Dragging the pointer up while looking straight down pushes the camera down too.
        drag(&mut ctrl, [400.0, 300.0], [400.0, 0.0]);

        assert!(!sink.updates.is_empty());
        assert!(sink.updates.iter().all(|u| u.state.position[2] >= 0.0));
        assert!(ctrl.state().position[2] >= 0.0);
    }

    #[test]
    fn keyboard_moves_and_rotates() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut sink = Recorder::default();
        assert!(ctrl.handle_event(&key(0.0, Key::ArrowUp, Modifiers::NONE), &mut sink));
        assert_close(ctrl.state().position[1], 20.0, 1e-9);
        assert_eq!(sink.updates[0].interaction, InteractionFlags::IDLE.panning());
        assert_eq!(sink.updates[0].transition.map(|t| t.duration_ms), Some(300.0));

        assert!(ctrl.handle_event(&key(10.0, Key::ArrowLeft, SHIFT), &mut sink));
        assert_close(ctrl.state().bearing, -2.0, 1e-9);
        assert_eq!(sink.updates[1].interaction, InteractionFlags::IDLE.rotating());

        assert!(ctrl.handle_event(&key(20.0, Key::Equal, Modifiers::NONE), &mut sink));
        assert!(!ctrl.handle_event(&key(30.0, Key::Other("Tab".into()), Modifiers::NONE), &mut sink));
        assert_eq!(sink.updates.len(), 3);
    }

    #[test]
    fn set_state_is_used_by_the_next_gesture() {
        let mut ctrl = controller_at([0.0, 0.0, 100.0]);
        let mut committed = *ctrl.state();
        committed.position = [10.0, 10.0, 1.0];
        ctrl.set_state(committed);

        let mut sink = Recorder::default();
        ctrl.handle_event(&pan_start(0.0, [400.0, 300.0]), &mut sink);
        assert_eq!(sink.updates[0].state.position, [10.0, 10.0, 1.0]);
    }
}
