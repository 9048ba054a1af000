//! Mapping between layer coordinates and canvas pixels.

use prism_common::BoundingBox;

/// A data extent placed into a pixel rectangle on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Layer-coordinate extent shown in the plot area
    pub extent: BoundingBox,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Largest plot area inside the frame that keeps the data aspect.
    ///
    /// `y_stretch` scales the vertical axis relative to the horizontal one;
    /// 1.0 for projected layers, `1 / cos(mean latitude)` for lon/lat.
    pub fn fit(
        extent: BoundingBox,
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        y_stretch: f64,
    ) -> Self {
        let data_w = extent.width().max(f64::EPSILON);
        let data_h = (extent.height() * y_stretch).max(f64::EPSILON);
        let scale = (width as f64 / data_w).min(height as f64 / data_h);

        let plot_w = (data_w * scale) as f32;
        let plot_h = (data_h * scale) as f32;

        Self {
            extent,
            left: left + (width - plot_w) / 2.0,
            top: top + (height - plot_h) / 2.0,
            width: plot_w,
            height: plot_h,
        }
    }

    /// Pixel position of a layer coordinate.
    pub fn to_pixel(&self, x: f64, y: f64) -> (f32, f32) {
        let e = &self.extent;
        let px = self.left as f64 + (x - e.min_x) / e.width() * self.width as f64;
        let py = self.top as f64 + (e.max_y - y) / e.height() * self.height as f64;
        (px as f32, py as f32)
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Scale to go from layer units to pixels horizontally.
    pub fn pixels_per_unit(&self) -> f64 {
        self.width as f64 / self.extent.width()
    }
}

/// Vertical stretch matching a lon/lat plot at the extent's mean latitude.
pub fn geographic_aspect(extent: &BoundingBox) -> f64 {
    let mean_lat = (extent.min_y + extent.max_y) / 2.0;
    let cos = mean_lat.to_radians().cos();
    if cos.abs() < 1e-6 {
        1.0
    } else {
        1.0 / cos
    }
}
