//! Web Mercator (Google/OSM) tile addressing for basemaps.

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Half the width of the web-mercator square (meters).
pub const WEB_MERCATOR_MAX_EXTENT: f64 = 20037508.342789244;

/// Highest zoom level basemap providers serve.
pub const MAX_ZOOM: u32 = 19;

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y), counted from the north edge
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Width of one tile at this zoom level (meters).
    pub fn span(z: u32) -> f64 {
        2.0 * WEB_MERCATOR_MAX_EXTENT / 2f64.powi(z as i32)
    }

    /// Web-mercator bounds of this tile.
    pub fn bbox(&self) -> BoundingBox {
        let span = Self::span(self.z);
        let min_x = -WEB_MERCATOR_MAX_EXTENT + self.x as f64 * span;
        let max_y = WEB_MERCATOR_MAX_EXTENT - self.y as f64 * span;
        BoundingBox::new(min_x, max_y - span, min_x + span, max_y)
    }

    /// All tiles at `z` that intersect a web-mercator bbox, row by row.
    pub fn covering(bbox: &BoundingBox, z: u32) -> Vec<TileCoord> {
        let span = Self::span(z);
        let n = 2u32.pow(z) as i64;
        let index = |offset: f64| ((offset / span).floor() as i64).clamp(0, n - 1);
        let to_col = |x: f64| index(x + WEB_MERCATOR_MAX_EXTENT);
        let to_row = |y: f64| index(WEB_MERCATOR_MAX_EXTENT - y);

        let (col_min, col_max) = (to_col(bbox.min_x), to_col(bbox.max_x));
        let (row_min, row_max) = (to_row(bbox.max_y), to_row(bbox.min_y));

        let mut tiles = Vec::new();
        for row in row_min..=row_max {
            for col in col_min..=col_max {
                tiles.push(TileCoord::new(z, col as u32, row as u32));
            }
        }
        tiles
    }

    /// Fill a `{z}/{x}/{y}` URL template.
    pub fn format_url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

/// Pick the zoom whose 256px tiles best match the requested pixel density.
pub fn web_mercator_zoom_for(bbox: &BoundingBox, width_px: u32) -> u32 {
    if bbox.width() <= 0.0 || width_px == 0 {
        return 0;
    }
    let meters_per_px = bbox.width() / width_px as f64;
    let zoom0_meters_per_px = 2.0 * WEB_MERCATOR_MAX_EXTENT / 256.0;
    let zoom = (zoom0_meters_per_px / meters_per_px).log2().round();
    zoom.clamp(0.0, MAX_ZOOM as f64) as u32
}
