//! Slippy-map tile index math.
//!
//! Tile columns wrap modulo `2^z` because longitude is cyclic; rows are
//! clamped to `[0, 2^z - 1]`. Image fetch and caching are the caller's
//! concern; the core only computes indices and corner coordinates.

use crate::projection::clamp_mercator_lat;
use kurbo::Rect;
use std::f64::consts::PI;

/// Highest tile zoom level the editor drives.
pub const MAX_TILE_ZOOM: u8 = 19;

/// Number of tile columns (or rows) at a zoom level.
pub fn tile_count(zoom: u8) -> i64 {
    1i64 << zoom
}

/// Fractional tile column for a longitude.
pub fn lon_to_tile_x(lon: f64, zoom: u8) -> f64 {
    (lon + 180.0) / 360.0 * tile_count(zoom) as f64
}

/// Fractional tile row for a latitude, clamped to the Mercator band.
pub fn lat_to_tile_y(lat: f64, zoom: u8) -> f64 {
    let rad = clamp_mercator_lat(lat).to_radians();
    (1.0 - (rad.tan() + 1.0 / rad.cos()).ln() / PI) / 2.0 * tile_count(zoom) as f64
}

/// Longitude of the left edge of tile column `x`.
pub fn tile_x_to_lon(x: f64, zoom: u8) -> f64 {
    x / tile_count(zoom) as f64 * 360.0 - 180.0
}

/// Latitude of the top edge of tile row `y`.
pub fn tile_y_to_lat(y: f64, zoom: u8) -> f64 {
    let n = PI - 2.0 * PI * y / tile_count(zoom) as f64;
    (0.5 * (n.exp() - (-n).exp())).atan().to_degrees()
}

/// Wrap a tile column into `[0, 2^z)`.
pub fn wrap_tile_x(x: i64, zoom: u8) -> u32 {
    x.rem_euclid(tile_count(zoom)) as u32
}

/// Clamp a tile row into `[0, 2^z - 1]`.
pub fn clamp_tile_y(y: i64, zoom: u8) -> u32 {
    y.clamp(0, tile_count(zoom) - 1) as u32
}

/// Address of one raster tile in the slippy scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileIndex {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

/// Inclusive tile index range covering a geographic bounding box.
///
/// Columns may run outside `[0, 2^z)` before wrapping so a view that spans
/// the antimeridian still enumerates contiguously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
}

impl TileRange {
    /// Tiles covering `bounds` (x0/x1 = lon, y0/y1 = lat) at `zoom`, which
    /// is clamped to [`MAX_TILE_ZOOM`].
    pub fn covering(bounds: Rect, zoom: u8) -> Self {
        let zoom = zoom.min(MAX_TILE_ZOOM);
        let min_lat = clamp_mercator_lat(bounds.y0.min(bounds.y1));
        let max_lat = clamp_mercator_lat(bounds.y0.max(bounds.y1));
        let min_lon = bounds.x0.min(bounds.x1);
        let max_lon = bounds.x0.max(bounds.x1);

        let mut min_x = lon_to_tile_x(min_lon, zoom).floor() as i64;
        let mut max_x = lon_to_tile_x(max_lon, zoom).floor() as i64;
        // Top edge of the box is the smallest row index.
        let min_y = lat_to_tile_y(max_lat, zoom).floor() as i64;
        let max_y = lat_to_tile_y(min_lat, zoom).floor() as i64;

        // A span wider than half the world means the view wrapped; take it all.
        let count = tile_count(zoom);
        if max_x - min_x > count / 2 {
            min_x = 0;
            max_x = count - 1;
        }

        Self { zoom, min_x, max_x, min_y, max_y }
    }

    /// Number of tiles in the range.
    pub fn len(&self) -> usize {
        let cols = (self.max_x - self.min_x + 1).max(0) as usize;
        let rows = (self.max_y - self.min_y + 1).max(0) as usize;
        cols * rows
    }

    /// Whether the range is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enumerate the range as wrapped/clamped tile addresses.
    pub fn tiles(&self) -> impl Iterator<Item = TileIndex> + '_ {
        let zoom = self.zoom;
        let (min_y, max_y) = (self.min_y, self.max_y);
        (self.min_x..=self.max_x).flat_map(move |x| {
            (min_y..=max_y).map(move |y| TileIndex {
                zoom,
                x: wrap_tile_x(x, zoom),
                y: clamp_tile_y(y, zoom),
            })
        })
    }
}
