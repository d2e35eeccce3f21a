//! Headless two-view host.
//!
//! Owns a first-person `main` view and a `minimap` overlay, each driven by
//! its own [`CameraController`]. Page-space events are routed to the view
//! under the pointer (the minimap sits on top), every committed update is
//! mirrored into both views and the controllers are re-synced with the
//! result.
//!
//! The minimap is another first-person camera at the same position, not a
//! map-style overhead projection: its pitch is limited to `[0, 80]`, so pitch
//! 0 looks at the horizon, and its drags move the camera in meters just like
//! the main view's.

use camera::{
    CameraController, EventKind, InputEvent, InteractionFlags, SCREEN_SCALE_FACTOR,
    TransitionSpec, ViewportSink, ViewportState, ViewportUpdate,
};
use foundation::Aabb2;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::ViewerConfig;

/// The host never commits a camera below this altitude (meters).
pub const MIN_HOST_ALTITUDE: f64 = 1.0;
/// Minimap zoom used when the source state carries none.
pub const FALLBACK_MINIMAP_ZOOM: f64 = 16.0;
/// Meters of altitude per wheel delta unit in the altitude strip.
pub const ALTITUDE_WHEEL_SCALE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewId {
    Main,
    Minimap,
}

/// Page region under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Segment {
    /// Over the minimap. Named for its role in the page layout; the view
    /// itself is first-person and never looks straight down.
    TopDown,
    /// Top quarter of the page outside the minimap: the main controller is
    /// off and the wheel raises or lowers the camera.
    Altitude,
    FirstPerson,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Views {
    pub main: ViewportState,
    pub minimap: ViewportState,
}

/// Both views after applying an update from `source`.
///
/// Main takes the geographic anchor, orientation and position; the minimap
/// additionally takes zoom and never looks below the horizon. The altitude
/// floor applies to both.
pub fn mirror(source: &ViewportState, current: &Views) -> Views {
    let mut position = source.position;
    if !(position[2] >= MIN_HOST_ALTITUDE) {
        position[2] = MIN_HOST_ALTITUDE;
    }

    let main = ViewportState {
        longitude: source.longitude,
        latitude: source.latitude,
        bearing: source.bearing,
        pitch: source.pitch,
        position,
        ..current.main
    };

    let zoom = if source.zoom.is_finite() && source.zoom != 0.0 {
        source.zoom
    } else {
        FALLBACK_MINIMAP_ZOOM
    };
    let minimap = ViewportState {
        longitude: source.longitude,
        latitude: source.latitude,
        bearing: source.bearing,
        zoom,
        pitch: source.pitch.max(0.0),
        position,
        ..current.minimap
    };

    Views { main, minimap }
}

/// One committed state change, with the states it replaced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Commit {
    pub source: ViewId,
    pub before: Views,
    pub after: Views,
    pub transition: Option<TransitionSpec>,
    pub interaction: InteractionFlags,
    pub screen_scale_factor: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    pub consumed_by: Option<ViewId>,
    /// The page's default action for this event (scrolling) was suppressed.
    pub default_prevented: bool,
    pub commits: Vec<Commit>,
}

#[derive(Default)]
struct Collected {
    updates: Vec<ViewportUpdate>,
    default_prevented: bool,
}

impl ViewportSink for Collected {
    fn update_viewport(&mut self, update: ViewportUpdate) {
        self.updates.push(update);
    }

    fn suppress_default(&mut self) {
        self.default_prevented = true;
    }
}

#[derive(Debug)]
struct View {
    rect: Aabb2,
    controller: CameraController,
}

#[derive(Debug)]
pub struct ViewHost {
    page: [f64; 2],
    main: View,
    minimap: View,
    views: Views,
    segment: Segment,
    drag_owner: Option<ViewId>,
}

fn sized(mut state: ViewportState, rect: Aabb2) -> ViewportState {
    state.width = rect.width();
    state.height = rect.height();
    state
}

impl ViewHost {
    pub fn new(config: &ViewerConfig) -> Self {
        let main_rect = config.main_rect().bounds();
        let minimap_rect = config.minimap_rect.bounds();
        let main = CameraController::new(sized(config.main_state, main_rect), config.main_options);
        let minimap = CameraController::new(
            sized(config.minimap_state, minimap_rect),
            config.minimap_options,
        );
        let views = Views {
            main: *main.state(),
            minimap: *minimap.state(),
        };

        Self {
            page: config.page,
            main: View {
                rect: main_rect,
                controller: main,
            },
            minimap: View {
                rect: minimap_rect,
                controller: minimap,
            },
            views,
            segment: Segment::FirstPerson,
            drag_owner: None,
        }
    }

    pub fn views(&self) -> &Views {
        &self.views
    }

    /// Segment of the last pointer event.
    pub fn segment(&self) -> Segment {
        self.segment
    }

    pub fn drag_owner(&self) -> Option<ViewId> {
        self.drag_owner
    }

    pub fn segment_at(&self, pos: [f64; 2]) -> Segment {
        if self.minimap.rect.contains(pos) {
            Segment::TopDown
        } else if pos[1] < self.page[1] / 4.0 {
            Segment::Altitude
        } else {
            Segment::FirstPerson
        }
    }

    fn view_mut(&mut self, id: ViewId) -> &mut View {
        match id {
            ViewId::Main => &mut self.main,
            ViewId::Minimap => &mut self.minimap,
        }
    }

    /// Route one page-space event.
    ///
    /// Keys go to the main view. Drag moves and ends follow the view that
    /// accepted the drag start, wherever the pointer is now. A drag start
    /// cancels any drag still open in either view.
    pub fn handle_event(&mut self, event: &InputEvent) -> Dispatch {
        let Some(pos) = event.pos() else {
            if self.segment == Segment::Altitude {
                return Dispatch::default();
            }
            return self.offer(ViewId::Main, event);
        };
        self.segment = self.segment_at(pos);

        // A new drag supersedes the previous one even when nothing accepts it;
        // the old owner will not see its drag end.
        if let EventKind::PanStart { .. } = event.kind {
            if let Some(previous) = self.drag_owner.take() {
                debug!(view = ?previous, "superseded drag cancelled");
                self.view_mut(previous).controller.cancel_gesture();
            }
        }

        match event.kind {
            EventKind::PanMove { .. } | EventKind::PanEnd { .. } => {
                let Some(owner) = self.drag_owner else {
                    return Dispatch::default();
                };
                if let EventKind::PanEnd { .. } = event.kind {
                    self.drag_owner = None;
                }
                self.offer(owner, event)
            }
            EventKind::Wheel {
                delta_x, delta_y, ..
            } if self.segment == Segment::Altitude => {
                let commit = self.adjust_altitude(delta_x, delta_y);
                Dispatch {
                    consumed_by: Some(ViewId::Main),
                    default_prevented: false,
                    commits: vec![commit],
                }
            }
            _ => {
                let target = match self.segment {
                    Segment::TopDown => ViewId::Minimap,
                    Segment::FirstPerson => ViewId::Main,
                    Segment::Altitude => {
                        trace!(?pos, "main controller disabled in altitude strip");
                        return Dispatch::default();
                    }
                };
                let dispatch = self.offer(target, event);
                if let EventKind::PanStart { .. } = event.kind {
                    if dispatch.consumed_by.is_some() {
                        self.drag_owner = Some(target);
                    }
                } else if self.drag_owner == Some(target)
                    && !self.view_mut(target).controller.is_dragging()
                {
                    // A double-tap ends the drag it lands on.
                    self.drag_owner = None;
                }
                dispatch
            }
        }
    }

    fn offer(&mut self, id: ViewId, event: &InputEvent) -> Dispatch {
        let view = self.view_mut(id);
        let rect = view.rect;
        let local = event.map_pos(|p| rect.to_local(p));

        let mut sink = Collected::default();
        let consumed = view.controller.handle_event(&local, &mut sink);
        trace!(view = ?id, kind = ?event.event_type(), consumed, "event offered");

        let commits = sink
            .updates
            .iter()
            .map(|update| self.commit(id, update))
            .collect();

        Dispatch {
            consumed_by: consumed.then_some(id),
            default_prevented: sink.default_prevented,
            commits,
        }
    }

    fn commit(&mut self, source: ViewId, update: &ViewportUpdate) -> Commit {
        let before = self.views;
        let mirrored = mirror(&update.state, &before);

        self.main.controller.set_state(mirrored.main);
        self.minimap.controller.set_state(mirrored.minimap);
        // Read back: the controllers apply their own pitch ranges.
        self.views = Views {
            main: *self.main.controller.state(),
            minimap: *self.minimap.controller.state(),
        };

        Commit {
            source,
            before,
            after: self.views,
            transition: update.transition,
            interaction: update.interaction,
            screen_scale_factor: update.screen_scale_factor,
        }
    }

    fn adjust_altitude(&mut self, delta_x: f64, delta_y: f64) -> Commit {
        let mut state = self.views.main;
        let dy = ALTITUDE_WHEEL_SCALE * delta_y;
        let dx = -ALTITUDE_WHEEL_SCALE * delta_x;
        state.position[0] -= dx * state.bearing.to_radians().cos();
        state.position[2] = (state.position[2] - dy).max(MIN_HOST_ALTITUDE);
        debug!(altitude = state.position[2], "altitude adjusted");

        self.commit(
            ViewId::Main,
            &ViewportUpdate {
                state,
                transition: None,
                interaction: InteractionFlags::IDLE,
                screen_scale_factor: SCREEN_SCALE_FACTOR,
            },
        )
    }
}
