//! Viewport module for pan/zoom/rotate transforms between canvas pixels and
//! world coordinates.
//!
//! World positions are always geographic (lon/lat degrees); the active
//! [`ProjectionFrame`] decides which linear units the transform scales:
//! Mercator meters, or degrees treated as pseudo-meters for the geographic
//! and scene frames.

use crate::projection::{geographic_to_mercator, mercator_to_geographic};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Scale bounds for the Web-Mercator frame, in pixels per meter.
pub const MERCATOR_SCALE_RANGE: (f64, f64) = (1e-5, 1e4);

/// Scale bounds for the geographic and scene frames, in pixels per degree.
pub const PLANAR_SCALE_RANGE: (f64, f64) = (10.0, 1e8);

/// Which projection the viewport scales against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionFrame {
    /// Raw lon/lat degrees.
    #[default]
    Geographic,
    /// Locally-planar meters; the transform itself behaves like geographic.
    Scene,
    /// Spherical Web-Mercator meters.
    WebMercator,
}

/// UX defaults for scale recomputation.
///
/// These are the original editor's constants, kept configurable because they
/// are sensible defaults rather than derived invariants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewDefaults {
    /// Scale applied when entering the geographic frame, px/degree.
    pub geographic_scale: f64,
    /// Scale applied when entering Mercator without a basemap, px/meter.
    pub mercator_scale: f64,
    /// Equatorial ground resolution of tile zoom 0, meters per pixel.
    pub ground_resolution: f64,
    /// Pixel margin kept around content by [`Viewport::fit_to_window`].
    pub fit_margin: f64,
}

impl Default for ViewDefaults {
    fn default() -> Self {
        Self {
            geographic_scale: 100_000.0,
            mercator_scale: 1.0,
            ground_resolution: 156_543.033_928_040_97,
            fit_margin: 40.0,
        }
    }
}

/// Pixels per meter that makes raster tiles at `zoom` render 1:1 at `lat`.
pub fn scale_for_tile_zoom(zoom: u8, lat: f64, ground_resolution: f64) -> f64 {
    let cos = lat.to_radians().cos().max(1e-6);
    let meters_per_pixel = ground_resolution * cos / 2f64.powi(zoom as i32);
    1.0 / meters_per_pixel
}

/// View transform state: frame, scale, rotation, and world-space focus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Active projection frame.
    pub frame: ProjectionFrame,
    /// Pixels per world unit (meters or degrees depending on `frame`).
    pub scale: f64,
    /// Clockwise view rotation in degrees, normalized to `[0, 360)`.
    pub rotation: f64,
    /// Geographic focus point (lon/lat degrees).
    pub center: Point,
    /// Canvas extent in pixels.
    pub canvas_size: Size,
    /// Configurable scale heuristics.
    pub defaults: ViewDefaults,
}

impl Default for Viewport {
    fn default() -> Self {
        let defaults = ViewDefaults::default();
        Self {
            frame: ProjectionFrame::Geographic,
            scale: defaults.geographic_scale,
            rotation: 0.0,
            center: Point::ZERO,
            canvas_size: Size::new(800.0, 600.0),
            defaults,
        }
    }
}

impl Viewport {
    /// Create a viewport with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the canvas extent in pixels.
    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        self.canvas_size = Size::new(width, height);
    }

    /// Clamp a scale into the active frame's range. Idempotent.
    pub fn clamp_scale(&self, scale: f64) -> f64 {
        let (min, max) = match self.frame {
            ProjectionFrame::WebMercator => MERCATOR_SCALE_RANGE,
            _ => PLANAR_SCALE_RANGE,
        };
        scale.clamp(min, max)
    }

    /// Set the scale, clamped to the active frame's range.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = self.clamp_scale(scale);
    }

    /// Multiply the scale by `factor` (wheel zoom), then clamp.
    pub fn zoom_by(&mut self, factor: f64) {
        self.set_scale(self.scale * factor);
    }

    /// Rotate the view by `degrees`, keeping rotation in `[0, 360)`.
    pub fn rotate_by(&mut self, degrees: f64) {
        self.rotation = (self.rotation + degrees).rem_euclid(360.0);
    }

    /// Project a geographic point to canvas pixels.
    ///
    /// North maps to decreasing pixel Y; rotation is applied after the
    /// center-relative scaling.
    pub fn world_to_canvas(&self, world: Point) -> Point {
        let (dx, dy) = match self.frame {
            ProjectionFrame::WebMercator => {
                let m = geographic_to_mercator(world);
                let c = geographic_to_mercator(self.center);
                ((m.x - c.x) * self.scale, -(m.y - c.y) * self.scale)
            }
            _ => (
                (world.x - self.center.x) * self.scale,
                -(world.y - self.center.y) * self.scale,
            ),
        };
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let rx = dx * cos - dy * sin;
        let ry = dx * sin + dy * cos;
        Point::new(
            self.canvas_size.width / 2.0 + rx,
            self.canvas_size.height / 2.0 + ry,
        )
    }

    /// Exact algebraic inverse of [`Viewport::world_to_canvas`].
    pub fn canvas_to_world(&self, canvas: Point) -> Point {
        let rel_x = canvas.x - self.canvas_size.width / 2.0;
        let rel_y = canvas.y - self.canvas_size.height / 2.0;
        let (sin, cos) = (-self.rotation).to_radians().sin_cos();
        let rx = rel_x * cos - rel_y * sin;
        let ry = rel_x * sin + rel_y * cos;
        let dx = rx / self.scale;
        let dy = -ry / self.scale;
        match self.frame {
            ProjectionFrame::WebMercator => {
                let c = geographic_to_mercator(self.center);
                mercator_to_geographic(Point::new(c.x + dx, c.y + dy))
            }
            _ => Point::new(self.center.x + dx, self.center.y + dy),
        }
    }

    /// Drag the view by a pixel delta, moving the center the opposite way.
    pub fn pan_pixels(&mut self, delta: Vec2) {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let ux = (delta.x * cos + delta.y * sin) / self.scale;
        let uy = (-delta.x * sin + delta.y * cos) / self.scale;
        match self.frame {
            ProjectionFrame::WebMercator => {
                let c = geographic_to_mercator(self.center);
                self.center = mercator_to_geographic(Point::new(c.x - ux, c.y + uy));
            }
            _ => {
                self.center.x -= ux;
                self.center.y += uy;
            }
        }
    }

    /// Switch the active projection frame, re-deriving a sane scale.
    ///
    /// `basemap_zoom` is the current tile zoom level when any base imagery
    /// layer is enabled; entering Mercator with it set matches tile
    /// resolution at the current latitude. The scene frame keeps the scale
    /// it had.
    pub fn set_frame(&mut self, frame: ProjectionFrame, basemap_zoom: Option<u8>) {
        self.frame = frame;
        match frame {
            ProjectionFrame::WebMercator => {
                self.scale = match basemap_zoom {
                    Some(zoom) => {
                        scale_for_tile_zoom(zoom, self.center.y, self.defaults.ground_resolution)
                    }
                    None => self.defaults.mercator_scale,
                };
            }
            ProjectionFrame::Geographic => {
                self.scale = self.defaults.geographic_scale;
            }
            ProjectionFrame::Scene => {}
        }
        self.scale = self.clamp_scale(self.scale);
        log::debug!("projection frame -> {:?}, scale {}", frame, self.scale);
    }

    /// Re-derive the scale from a tile zoom change while in Mercator.
    pub fn apply_tile_zoom(&mut self, zoom: u8) {
        if self.frame == ProjectionFrame::WebMercator {
            self.set_scale(scale_for_tile_zoom(
                zoom,
                self.center.y,
                self.defaults.ground_resolution,
            ));
        }
    }

    /// Center on a geographic bounding box and scale so it fits the canvas
    /// with the configured pixel margin.
    pub fn fit_to_window(&mut self, bounds: Rect) {
        self.center = bounds.center();
        let a = self.world_to_canvas(Point::new(bounds.x0, bounds.y0));
        let b = self.world_to_canvas(Point::new(bounds.x1, bounds.y1));
        let w = (b.x - a.x).abs();
        let h = (b.y - a.y).abs();
        let margin = self.defaults.fit_margin;
        let sx = (self.canvas_size.width - margin) / w.max(1.0);
        let sy = (self.canvas_size.height - margin) / h.max(1.0);
        self.set_scale(self.scale * sx.min(sy));
    }

    /// Reset to the geographic frame's default view.
    pub fn reset(&mut self) {
        self.scale = self.defaults.geographic_scale;
        self.center = Point::ZERO;
        self.rotation = 0.0;
    }
}
