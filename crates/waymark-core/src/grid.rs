//! Grid settings and snap-to-grid.

use crate::projection::METERS_PER_DEGREE_LAT;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Grid display and snapping configuration.
///
/// The origin is geographic; spacing is in ground meters, so the longitude
/// step shrinks with latitude like everything else in the local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    /// Grid origin (lon/lat degrees).
    pub origin: Point,
    /// Grid cell size in meters.
    pub spacing_m: f64,
    /// Whether new and dragged points snap to the grid.
    pub snap_enabled: bool,
    /// Whether the renderer should draw the grid.
    pub show_grid: bool,
    /// Whether the renderer should label the origin.
    pub show_coordinates: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            origin: Point::ZERO,
            spacing_m: 100.0,
            snap_enabled: false,
            show_grid: true,
            show_coordinates: true,
        }
    }
}

impl GridSettings {
    /// Move the origin to a geographic position.
    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    /// Reset the origin to (0, 0).
    pub fn reset_origin(&mut self) {
        self.origin = Point::ZERO;
    }

    /// Snap a geographic point to the nearest grid intersection.
    ///
    /// The offset from the origin is rounded in meters (longitude corrected
    /// by `cos(lat)`) and mapped back to degrees.
    pub fn snap(&self, geo: Point) -> Point {
        let meters_per_degree_lon = METERS_PER_DEGREE_LAT * geo.y.to_radians().cos();
        let dx_m = (geo.x - self.origin.x) * meters_per_degree_lon;
        let dy_m = (geo.y - self.origin.y) * METERS_PER_DEGREE_LAT;
        let snapped_x = (dx_m / self.spacing_m).round() * self.spacing_m;
        let snapped_y = (dy_m / self.spacing_m).round() * self.spacing_m;
        Point::new(
            self.origin.x + snapped_x / meters_per_degree_lon,
            self.origin.y + snapped_y / METERS_PER_DEGREE_LAT,
        )
    }
}
