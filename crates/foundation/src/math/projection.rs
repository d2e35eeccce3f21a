//! First-person pinhole projection over a local east/north/up frame.
//!
//! The frame is anchored at a geographic origin (`origin_lon_deg`,
//! `origin_lat_deg`, altitude 0). Camera positions are meters in that frame.
//! Screen coordinates are pixels with the origin at the top-left corner.

use super::{Vec3, meters_per_degree};

/// Unit view direction for a bearing (clockwise from north) and pitch
/// (positive looks up), both in degrees.
pub fn direction_from_bearing_pitch(bearing_deg: f64, pitch_deg: f64) -> Vec3 {
    let b = bearing_deg.to_radians();
    let p = pitch_deg.to_radians();
    Vec3::new(b.sin() * p.cos(), b.cos() * p.cos(), p.sin())
}

/// Screen-right axis for a bearing; always horizontal, so it stays defined
/// when looking straight up or down.
pub fn right_from_bearing(bearing_deg: f64) -> Vec3 {
    let b = bearing_deg.to_radians();
    Vec3::new(b.cos(), -b.sin(), 0.0)
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FirstPersonProjection {
    pub origin_lon_deg: f64,
    pub origin_lat_deg: f64,
    pub position: Vec3,
    pub bearing_deg: f64,
    pub pitch_deg: f64,
    pub fovy_deg: f64,
    pub width: f64,
    pub height: f64,
}

impl FirstPersonProjection {
    pub fn forward(&self) -> Vec3 {
        direction_from_bearing_pitch(self.bearing_deg, self.pitch_deg)
    }

    pub fn right(&self) -> Vec3 {
        right_from_bearing(self.bearing_deg)
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    /// Local-frame point (meters) under pixel `(x, y)` at `depth` meters in
    /// front of the camera.
    ///
    /// Returns `None` for a degenerate viewport, non-positive depth, or
    /// non-finite input.
    pub fn unproject_local(&self, x: f64, y: f64, depth: f64) -> Option<Vec3> {
        if !(self.width > 0.0 && self.height > 0.0) || !(depth > 0.0) {
            return None;
        }
        if !(x.is_finite() && y.is_finite() && depth.is_finite()) {
            return None;
        }

        let ndc_x = 2.0 * x / self.width - 1.0;
        let ndc_y = 1.0 - 2.0 * y / self.height;

        let half_h = (0.5 * self.fovy_deg.to_radians()).tan();
        let half_w = half_h * self.width / self.height;

        let offset = self.right() * (ndc_x * half_w * depth)
            + self.up() * (ndc_y * half_h * depth)
            + self.forward() * depth;
        let point = self.position + offset;
        point.is_finite().then_some(point)
    }

    /// Convert a local-frame point into `[lon_deg, lat_deg, alt_m]`.
    pub fn local_to_geographic(&self, local: Vec3) -> Option<[f64; 3]> {
        let [mx, my] = meters_per_degree(self.origin_lat_deg);
        if mx < 1e-6 || my < 1e-6 {
            return None;
        }
        Some([
            self.origin_lon_deg + local.x / mx,
            self.origin_lat_deg + local.y / my,
            local.z,
        ])
    }

    /// Geographic point under pixel `(x, y)` at `depth` meters.
    pub fn unproject(&self, x: f64, y: f64, depth: f64) -> Option<[f64; 3]> {
        self.unproject_local(x, y, depth)
            .and_then(|local| self.local_to_geographic(local))
    }
}
