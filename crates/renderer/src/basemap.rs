//! Web-tile basemaps drawn beneath a web-mercator layer.

use std::time::Duration;

use prism_common::{web_mercator_zoom_for, TileCoord};
use tiny_skia::{FillRule, FilterQuality, Mask, PathBuilder, Pixmap, PixmapPaint, Rect, Transform};
use tracing::{debug, info, warn};

use crate::error::{RenderError, RenderResult};
use crate::viewport::Viewport;

/// CartoDB Positron, a light gray basemap.
pub const CARTO_POSITRON_URL: &str = "https://a.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png";

/// Upper bound on tiles fetched for one map; zoom is lowered to stay under it.
pub const MAX_TILES: usize = 64;

/// Provider of 256px web-mercator tiles as encoded image bytes.
pub trait TileSource {
    fn fetch(&self, tile: &TileCoord) -> RenderResult<Vec<u8>>;
}

/// Tiles fetched over HTTP from a `{z}/{x}/{y}` URL template.
pub struct HttpTileSource {
    client: reqwest::blocking::Client,
    url_template: String,
}

impl HttpTileSource {
    pub fn new(url_template: impl Into<String>) -> RenderResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("prism-trends/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RenderError::Basemap(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url_template: url_template.into(),
        })
    }

    pub fn positron() -> RenderResult<Self> {
        Self::new(CARTO_POSITRON_URL)
    }
}

impl TileSource for HttpTileSource {
    fn fetch(&self, tile: &TileCoord) -> RenderResult<Vec<u8>> {
        let url = tile.format_url(&self.url_template);
        debug!(url = %url, "Fetching basemap tile");

        let response = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| RenderError::Basemap(format!("{}: {}", url, e)))?;

        let bytes = response
            .bytes()
            .map_err(|e| RenderError::Basemap(format!("{}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}

/// Choose a zoom for the viewport, lowered until at most `MAX_TILES` cover it.
pub fn choose_zoom(viewport: &Viewport) -> u32 {
    let mut zoom = web_mercator_zoom_for(&viewport.extent, viewport.width.max(1.0) as u32);
    while zoom > 0 && TileCoord::covering(&viewport.extent, zoom).len() > MAX_TILES {
        zoom -= 1;
    }
    zoom
}

/// Draw basemap tiles into the viewport's plot area.
///
/// The viewport extent must be in web mercator. Tiles that fail to fetch or
/// decode are skipped; one warning per failure is returned.
pub fn draw_basemap(
    pixmap: &mut Pixmap,
    viewport: &Viewport,
    source: &dyn TileSource,
) -> RenderResult<Vec<String>> {
    let zoom = choose_zoom(viewport);
    let tiles = TileCoord::covering(&viewport.extent, zoom);
    info!(zoom = zoom, tiles = tiles.len(), "Drawing basemap");

    let clip = plot_mask(pixmap, viewport)?;
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };

    let mut warnings = Vec::new();
    for tile in &tiles {
        let image = match source.fetch(tile).and_then(|bytes| decode_tile(&bytes)) {
            Ok(image) => image,
            Err(e) => {
                warn!(z = tile.z, x = tile.x, y = tile.y, error = %e, "Skipping basemap tile");
                warnings.push(format!(
                    "Basemap tile {}/{}/{} unavailable: {}",
                    tile.z, tile.x, tile.y, e
                ));
                continue;
            }
        };

        let bbox = tile.bbox();
        let (x0, y0) = viewport.to_pixel(bbox.min_x, bbox.max_y);
        let (x1, y1) = viewport.to_pixel(bbox.max_x, bbox.min_y);
        let sx = (x1 - x0) / image.width() as f32;
        let sy = (y1 - y0) / image.height() as f32;

        pixmap.draw_pixmap(
            0,
            0,
            image.as_ref(),
            &paint,
            Transform::from_row(sx, 0.0, 0.0, sy, x0, y0),
            Some(&clip),
        );
    }

    Ok(warnings)
}

fn plot_mask(pixmap: &Pixmap, viewport: &Viewport) -> RenderResult<Mask> {
    let mut mask = Mask::new(pixmap.width(), pixmap.height())
        .ok_or_else(|| RenderError::Canvas("Failed to allocate basemap mask".to_string()))?;
    let rect = Rect::from_xywh(viewport.left, viewport.top, viewport.width, viewport.height)
        .ok_or_else(|| RenderError::Canvas("Degenerate plot area".to_string()))?;
    let path = PathBuilder::from_rect(rect);
    mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
    Ok(mask)
}

/// Decode PNG/JPEG tile bytes into a premultiplied pixmap.
fn decode_tile(bytes: &[u8]) -> RenderResult<Pixmap> {
    let rgba = image::load_from_memory(bytes)
        .map_err(|e| RenderError::Basemap(format!("Failed to decode tile: {}", e)))?
        .to_rgba8();
    let (w, h) = rgba.dimensions();

    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a < 255 {
            px[0] = (px[0] as u16 * a / 255) as u8;
            px[1] = (px[1] as u16 * a / 255) as u8;
            px[2] = (px[2] as u16 * a / 255) as u8;
        }
    }

    let size = tiny_skia::IntSize::from_wh(w, h)
        .ok_or_else(|| RenderError::Basemap("Empty tile image".to_string()))?;
    Pixmap::from_vec(data, size)
        .ok_or_else(|| RenderError::Basemap("Invalid tile buffer".to_string()))
}
