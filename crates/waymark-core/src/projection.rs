//! Coordinate conversions between geographic, scene, and Web-Mercator frames.
//!
//! Geographic points store longitude in `x` and latitude in `y`, both in
//! degrees. Scene points are local planar meters around a [`SceneOrigin`];
//! Mercator points are spherical Web-Mercator meters.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Meters covered by one degree of latitude.
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Spherical Web-Mercator earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude band in which Web-Mercator is defined, in degrees.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_78;

/// Geographic anchor of the locally-planar scene frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneOrigin {
    /// Origin longitude in degrees.
    pub lon: f64,
    /// Origin latitude in degrees.
    pub lat: f64,
}

impl Default for SceneOrigin {
    fn default() -> Self {
        Self { lon: 0.0, lat: 0.0 }
    }
}

impl SceneOrigin {
    /// Create an origin at the given geographic position.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Project a geographic point into scene meters around `origin`.
///
/// Equirectangular local projection: the longitude axis is shortened by
/// `cos(lat)` so both axes are in meters.
pub fn geographic_to_scene(geo: Point, origin: SceneOrigin) -> Point {
    let meters_per_degree_lon = METERS_PER_DEGREE_LAT * geo.y.to_radians().cos();
    Point::new(
        (geo.x - origin.lon) * meters_per_degree_lon,
        (geo.y - origin.lat) * METERS_PER_DEGREE_LAT,
    )
}

/// Exact inverse of [`geographic_to_scene`] for the same origin.
///
/// Latitude is recovered first so the longitude correction uses the same
/// `cos(lat)` the forward projection did.
pub fn scene_to_geographic(scene: Point, origin: SceneOrigin) -> Point {
    let lat = origin.lat + scene.y / METERS_PER_DEGREE_LAT;
    let meters_per_degree_lon = METERS_PER_DEGREE_LAT * lat.to_radians().cos();
    Point::new(origin.lon + scene.x / meters_per_degree_lon, lat)
}

/// Clamp a latitude to the band where Web-Mercator is defined.
pub fn clamp_mercator_lat(lat: f64) -> f64 {
    lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT)
}

/// Project a geographic point to spherical Web-Mercator meters.
///
/// Latitude is clamped to ±[`MERCATOR_MAX_LAT`] first; out-of-band inputs
/// project to the band edge rather than erroring.
pub fn geographic_to_mercator(geo: Point) -> Point {
    let lat = clamp_mercator_lat(geo.y).to_radians();
    Point::new(
        EARTH_RADIUS_M * geo.x.to_radians(),
        EARTH_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln(),
    )
}

/// Inverse of [`geographic_to_mercator`].
pub fn mercator_to_geographic(mercator: Point) -> Point {
    let lon = (mercator.x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (mercator.y / EARTH_RADIUS_M).exp().atan() - FRAC_PI_2).to_degrees();
    Point::new(lon, lat)
}

/// Approximate ground distance in meters between two geographic points.
///
/// Equirectangular with the longitude axis corrected at the mid-latitude;
/// good enough at editing scales, not a geodesic.
pub fn ground_distance_m(a: Point, b: Point) -> f64 {
    let mid_lat = (a.y + b.y) / 2.0;
    let meters_per_degree_lon = METERS_PER_DEGREE_LAT * mid_lat.to_radians().cos();
    let dx = (b.x - a.x) * meters_per_degree_lon;
    let dy = (b.y - a.y) * METERS_PER_DEGREE_LAT;
    dx.hypot(dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_roundtrip() {
        let origin = SceneOrigin::new(116.404, 39.915);
        let geo = Point::new(116.41, 39.92);
        let scene = geographic_to_scene(geo, origin);
        let back = scene_to_geographic(scene, origin);
        assert!((back.x - geo.x).abs() < 1e-9);
        assert!((back.y - geo.y).abs() < 1e-9);
    }

    #[test]
    fn test_scene_origin_maps_to_zero() {
        let origin = SceneOrigin::new(10.0, 50.0);
        let scene = geographic_to_scene(Point::new(10.0, 50.0), origin);
        assert!(scene.x.abs() < 1e-12);
        assert!(scene.y.abs() < 1e-12);
    }

    #[test]
    fn test_scene_latitude_degree_is_fixed_meters() {
        let origin = SceneOrigin::default();
        let scene = geographic_to_scene(Point::new(0.0, 1.0), origin);
        assert!((scene.y - METERS_PER_DEGREE_LAT).abs() < 1e-6);
    }

    #[test]
    fn test_mercator_roundtrip() {
        for &(lon, lat) in &[
            (0.0, 0.0),
            (116.404, 39.915),
            (-73.9857, 40.7484),
            (179.9, -85.0),
            (-180.0, 85.0511),
        ] {
            let m = geographic_to_mercator(Point::new(lon, lat));
            let back = mercator_to_geographic(m);
            assert!((back.x - lon).abs() < 1e-7, "lon {lon} -> {}", back.x);
            assert!((back.y - lat).abs() < 1e-7, "lat {lat} -> {}", back.y);
        }
    }

    #[test]
    fn test_mercator_clamps_out_of_band_latitude() {
        let pole = geographic_to_mercator(Point::new(0.0, 90.0));
        let edge = geographic_to_mercator(Point::new(0.0, MERCATOR_MAX_LAT));
        assert!(pole.y.is_finite());
        assert!((pole.y - edge.y).abs() < 1e-9);
    }

    #[test]
    fn test_mercator_equator_x_scale() {
        let m = geographic_to_mercator(Point::new(180.0, 0.0));
        assert!((m.x - EARTH_RADIUS_M * std::f64::consts::PI).abs() < 1e-6);
        assert!(m.y.abs() < 1e-9);
    }

    #[test]
    fn test_ground_distance_along_meridian() {
        let d = ground_distance_m(Point::new(0.0, 0.0), Point::new(0.0, 1.0));
        assert!((d - METERS_PER_DEGREE_LAT).abs() < 1e-6);
    }
}
