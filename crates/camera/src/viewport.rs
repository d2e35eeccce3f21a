//! The projection capability the controller consumes.

use foundation::math::{FirstPersonProjection, meters_per_degree};

use crate::state::ViewportState;

/// Per-axis conversion from degree deltas to meters at some latitude.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DistanceScales {
    /// `[meters per degree of longitude, meters per degree of latitude]`.
    pub meters_per_unit: [f64; 2],
}

/// A projection built from a [`ViewportState`] snapshot.
///
/// Implementations must be pure functions of the snapshot: the controller
/// freezes one at drag start and unprojects through it for the whole drag.
pub trait Viewport {
    fn from_state(state: &ViewportState) -> Self
    where
        Self: Sized;

    /// `[x, y, depth]` in pixels/meters to `[lon, lat, alt]`, or `None` when the
    /// pixel has no world position.
    fn unproject(&self, screen: [f64; 3]) -> Option<[f64; 3]>;

    fn distance_scales(&self, lon_lat: [f64; 2]) -> DistanceScales;
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FirstPersonViewport {
    projection: FirstPersonProjection,
}

impl Viewport for FirstPersonViewport {
    fn from_state(state: &ViewportState) -> Self {
        Self {
            projection: FirstPersonProjection {
                origin_lon_deg: state.longitude,
                origin_lat_deg: state.latitude,
                position: state.position_vec(),
                bearing_deg: state.bearing,
                pitch_deg: state.pitch,
                fovy_deg: state.fovy,
                width: state.width,
                height: state.height,
            },
        }
    }

    fn unproject(&self, screen: [f64; 3]) -> Option<[f64; 3]> {
        self.projection.unproject(screen[0], screen[1], screen[2])
    }

    fn distance_scales(&self, lon_lat: [f64; 2]) -> DistanceScales {
        DistanceScales {
            meters_per_unit: meters_per_degree(lon_lat[1]),
        }
    }
}
