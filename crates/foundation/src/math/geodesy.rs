/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Ground distance covered by one degree of longitude and latitude.
///
/// `[meters per degree east, meters per degree north]` at `lat_deg`, using the
/// prime-vertical and meridional radii of curvature of the ellipsoid.
pub fn meters_per_degree(lat_deg: f64) -> [f64; 2] {
    let lat = lat_deg.to_radians();
    let sin_lat = lat.sin();
    let w2 = 1.0 - WGS84_E2 * sin_lat * sin_lat;
    let w = w2.sqrt();

    let n = WGS84_A / w;
    let m = WGS84_A * (1.0 - WGS84_E2) / (w2 * w);

    let per_rad = std::f64::consts::PI / 180.0;
    [per_rad * n * lat.cos(), per_rad * m]
}

/// Wrap an angle in degrees into `[-180, 180)`.
pub fn wrap_degrees(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}
