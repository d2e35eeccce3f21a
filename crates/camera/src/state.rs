//! Camera parameters as immutable values.
//!
//! [`ViewportState`] is the record exchanged with the host. [`ControllerState`]
//! wraps it with the transient rotation anchor a drag-rotate needs; every
//! operation returns a new value.

use foundation::math::{Vec3, direction_from_bearing_pitch, right_from_bearing, wrap_degrees};
use serde::{Deserialize, Serialize};

/// Lowest altitude the controller will request on its own. Hosts are expected
/// to apply their own (higher) floor before committing a state.
pub const MIN_CONTROLLER_ALTITUDE: f64 = 0.0;

pub const DEFAULT_FOVY: f64 = 50.0;

/// Camera snapshot: a geographic anchor plus a first-person camera placed in
/// meters relative to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportState {
    pub longitude: f64,
    pub latitude: f64,
    /// Meters east, north and up of (`longitude`, `latitude`, 0).
    pub position: [f64; 3],
    /// Degrees clockwise from north.
    pub bearing: f64,
    /// Degrees; positive looks up.
    pub pitch: f64,
    pub min_pitch: f64,
    pub max_pitch: f64,
    pub zoom: f64,
    /// Viewport size in pixels.
    pub width: f64,
    pub height: f64,
    /// Vertical field of view in degrees.
    pub fovy: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            longitude: 0.0,
            latitude: 0.0,
            position: [0.0, 0.0, 0.0],
            bearing: 0.0,
            pitch: 0.0,
            min_pitch: -90.0,
            max_pitch: 90.0,
            zoom: 0.0,
            width: 800.0,
            height: 600.0,
            fovy: DEFAULT_FOVY,
        }
    }
}

impl ViewportState {
    pub fn position_vec(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Pitch clamped into its range, bearing and longitude wrapped into
    /// `[-180, 180)`.
    pub fn constrained(mut self) -> Self {
        let (lo, hi) = if self.min_pitch <= self.max_pitch {
            (self.min_pitch, self.max_pitch)
        } else {
            (self.max_pitch, self.min_pitch)
        };
        self.pitch = self.pitch.clamp(lo, hi);
        self.bearing = wrap_degrees(self.bearing);
        if !(-180.0..=180.0).contains(&self.longitude) {
            self.longitude = wrap_degrees(self.longitude);
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RotateAnchor {
    pos: [f64; 2],
    bearing: f64,
    pitch: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerState {
    viewport: ViewportState,
    rotate: Option<RotateAnchor>,
}

impl ControllerState {
    pub fn new(viewport: ViewportState) -> Self {
        Self {
            viewport: viewport.constrained(),
            rotate: None,
        }
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn position(&self) -> Vec3 {
        self.viewport.position_vec()
    }

    pub fn is_rotating(&self) -> bool {
        self.rotate.is_some()
    }

    /// Unit view direction.
    pub fn direction(&self) -> Vec3 {
        direction_from_bearing_pitch(self.viewport.bearing, self.viewport.pitch)
    }

    /// Unit heading on the ground plane, ignoring pitch.
    pub fn horizontal_direction(&self) -> Vec3 {
        direction_from_bearing_pitch(self.viewport.bearing, 0.0)
    }

    /// Replace the camera parameters, keeping any rotation in progress.
    pub fn with_viewport(&self, viewport: ViewportState) -> Self {
        self.updated(viewport)
    }

    fn updated(&self, viewport: ViewportState) -> Self {
        Self {
            viewport: viewport.constrained(),
            rotate: self.rotate,
        }
    }

    /// Copy of this state with the camera at `position`. Longitude and latitude
    /// are kept. Non-finite positions leave the state unchanged and the
    /// altitude never drops below [`MIN_CONTROLLER_ALTITUDE`].
    pub fn with_position(&self, position: Vec3) -> Self {
        if !position.is_finite() {
            return *self;
        }
        let mut viewport = self.viewport;
        viewport.position = [position.x, position.y, position.z.max(MIN_CONTROLLER_ALTITUDE)];
        self.updated(viewport)
    }

    /// Translate the camera by `distance` meters along `direction`.
    pub fn moved(&self, direction: Vec3, distance: f64) -> Self {
        self.with_position(self.position() + direction * distance)
    }

    /// Dolly along the view direction by `log2(scale) * zoom_speed` meters.
    pub fn zoom(&self, scale: f64, zoom_speed: f64) -> Self {
        if !(scale > 0.0) || !scale.is_finite() {
            return *self;
        }
        self.moved(self.direction(), scale.log2() * zoom_speed)
    }

    pub fn rotate_start(&self, pos: [f64; 2]) -> Self {
        Self {
            viewport: self.viewport,
            rotate: Some(RotateAnchor {
                pos,
                bearing: self.viewport.bearing,
                pitch: self.viewport.pitch,
            }),
        }
    }

    /// Look around the camera position. A full-width horizontal drag turns
    /// the bearing by 180 degrees, a full-height vertical drag tilts by 90.
    pub fn rotate(&self, pos: [f64; 2]) -> Self {
        let Some(anchor) = self.rotate else {
            return *self;
        };
        let ViewportState { width, height, .. } = self.viewport;
        if !(width > 0.0 && height > 0.0) {
            return *self;
        }

        let mut viewport = self.viewport;
        viewport.bearing = anchor.bearing - (pos[0] - anchor.pos[0]) / width * 180.0;
        viewport.pitch = anchor.pitch - (pos[1] - anchor.pos[1]) / height * 90.0;
        self.updated(viewport)
    }

    pub fn rotate_end(&self) -> Self {
        Self {
            viewport: self.viewport,
            rotate: None,
        }
    }

    pub fn move_left(&self, speed: f64) -> Self {
        self.moved(-right_from_bearing(self.viewport.bearing), speed)
    }

    pub fn move_right(&self, speed: f64) -> Self {
        self.moved(right_from_bearing(self.viewport.bearing), speed)
    }

    pub fn move_forward(&self, speed: f64) -> Self {
        self.moved(self.horizontal_direction(), speed)
    }

    pub fn move_backward(&self, speed: f64) -> Self {
        self.moved(-self.horizontal_direction(), speed)
    }

    pub fn rotate_left(&self, speed: f64) -> Self {
        let mut viewport = self.viewport;
        viewport.bearing -= speed;
        self.updated(viewport)
    }

    pub fn rotate_right(&self, speed: f64) -> Self {
        let mut viewport = self.viewport;
        viewport.bearing += speed;
        self.updated(viewport)
    }

    pub fn rotate_up(&self, speed: f64) -> Self {
        let mut viewport = self.viewport;
        viewport.pitch += speed;
        self.updated(viewport)
    }

    pub fn rotate_down(&self, speed: f64) -> Self {
        let mut viewport = self.viewport;
        viewport.pitch -= speed;
        self.updated(viewport)
    }
}
