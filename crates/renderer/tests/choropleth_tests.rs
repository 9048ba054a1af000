//! Tests for choropleth rendering.
//!
//! Figures are rendered small (a few inches at low dpi) so that pixel checks
//! stay fast. Checks sample feature interiors, which no overlay or text
//! reaches unless the test enables it.

use image::Rgba;
use prism_common::CrsCode;
use renderer::{
    render_map, Color, Colormap, MapConfig, RenderError, RenderResult, RenderedMap, SpatialLayer,
    TextRenderer, TileSource, NO_FONT_WARNING,
};
use test_utils::layers;

fn three_units() -> SpatialLayer {
    SpatialLayer::from_geojson_str(layers::THREE_UNITS_GEOJSON, CrsCode::Epsg4326).unwrap()
}

fn small(mut config: MapConfig, dpi: u32) -> MapConfig {
    config.width_in = 4.0;
    config.height_in = 3.0;
    config.dpi = dpi;
    config
}

/// Warnings other than the missing-font notice, which depends on the host.
fn data_warnings(map: &RenderedMap) -> Vec<&str> {
    map.warnings
        .iter()
        .map(String::as_str)
        .filter(|w| *w != NO_FONT_WARNING)
        .collect()
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, color.a])
}

/// Serves solid tiles of one color.
struct SolidTiles([u8; 4]);

impl TileSource for SolidTiles {
    fn fetch(&self, _tile: &prism_common::TileCoord) -> RenderResult<Vec<u8>> {
        let img = image::RgbaImage::from_pixel(256, 256, image::Rgba(self.0));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageOutputFormat::Png)
            .map_err(|e| RenderError::Basemap(e.to_string()))?;
        Ok(out.into_inner())
    }
}

// ============================================================================
// Color scale
// ============================================================================

#[test]
fn test_trend_map_colors_by_slope() {
    let config = small(MapConfig::trend_map("ppt_slope", "ppt_p"), 60);
    let map = render_map(&three_units(), &config, None).unwrap();

    assert!(data_warnings(&map).is_empty());
    assert_eq!(map.color_scale.cmap, "RdBu");

    let rdbu = Colormap::from_name("RdBu").unwrap();
    assert_eq!(map.pixel_at(-111.5, 40.5), Some(rgba(rdbu.sample(1.0))));
    assert_eq!(map.pixel_at(-110.5, 40.5), Some(rgba(rdbu.sample(0.5))));
    assert_eq!(map.pixel_at(-109.5, 40.5), Some(rgba(rdbu.sample(0.0))));
}

#[test]
fn test_missing_font_is_reported() {
    let config = small(MapConfig::trend_map("ppt_slope", "ppt_p"), 40);
    let map = render_map(&three_units(), &config, None).unwrap();

    let font_found = TextRenderer::load(None).unwrap().has_font();
    let reported = map.warnings.iter().any(|w| w == NO_FONT_WARNING);
    assert_eq!(reported, !font_found);
}

#[test]
fn test_all_positive_center_zero_falls_back_to_blues() {
    let layer =
        SpatialLayer::from_geojson_str(layers::ALL_POSITIVE_GEOJSON, CrsCode::Epsg4326).unwrap();
    let config = small(MapConfig::trend_map("ppt_slope", "ppt_p"), 40);

    let map = render_map(&layer, &config, None).unwrap();
    assert_eq!(map.color_scale.cmap, "Blues");
    let warnings = data_warnings(&map);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("does not cross 0"));

    // Linear over (0.5, 3.0): B at the top of the scale
    let blues = Colormap::from_name("Blues").unwrap();
    assert_eq!(map.pixel_at(-110.5, 40.5), Some(rgba(blues.sample(1.0))));
}

#[test]
fn test_explicit_bounds_clamp() {
    let mut config = small(MapConfig::attribute_map("ppt_slope"), 40);
    config.vmin = Some(0.0);
    config.vmax = Some(1.0);

    let map = render_map(&three_units(), &config, None).unwrap();
    let blues = Colormap::from_name("Blues").unwrap();
    assert_eq!(map.pixel_at(-111.5, 40.5), Some(rgba(blues.sample(1.0))));
    assert_eq!(map.pixel_at(-109.5, 40.5), Some(rgba(blues.sample(0.0))));
}

// ============================================================================
// Overlays
// ============================================================================

#[test]
fn test_hatch_only_non_significant() {
    let mut config = small(MapConfig::trend_map("ppt_slope", "ppt_p"), 60);
    if let Some(sig) = config.significance.as_mut() {
        sig.hatch_non_significant = true;
    }
    let map = render_map(&three_units(), &config, None).unwrap();

    let fill_b = rgba(Colormap::from_name("RdBu").unwrap().sample(0.5));
    let fill_a = rgba(Colormap::from_name("RdBu").unwrap().sample(1.0));

    let sample = |lon0: f64| -> Vec<Rgba<u8>> {
        let mut pixels = Vec::new();
        for i in 0..20 {
            for j in 0..20 {
                let lon = lon0 + 0.2 + 0.6 * i as f64 / 19.0;
                let lat = 40.2 + 0.6 * j as f64 / 19.0;
                pixels.extend(map.pixel_at(lon, lat));
            }
        }
        pixels
    };

    // B (p = 1.0) carries dots, A (p = 0.001) stays flat
    assert!(sample(-111.0).iter().any(|p| *p != fill_b));
    assert!(sample(-112.0).iter().all(|p| *p == fill_a));
}

#[test]
fn test_marker_at_significant_centroid() {
    let mut config = small(MapConfig::trend_map("ppt_slope", "ppt_p"), 200);
    if let Some(sig) = config.significance.as_mut() {
        sig.show_marker = true;
        sig.show_border = false;
    }
    let map = render_map(&three_units(), &config, None).unwrap();

    assert_eq!(map.pixel_at(-111.5, 40.5), Some(Rgba([0, 0, 0, 255])));
    // B is not significant
    assert_ne!(map.pixel_at(-110.5, 40.5), Some(Rgba([0, 0, 0, 255])));
}

// ============================================================================
// Basemap
// ============================================================================

#[test]
fn test_basemap_reprojects_and_draws_tiles() {
    let config = small(MapConfig::trend_map("ppt_slope", "ppt_p"), 40);
    let tiles = SolidTiles([10, 200, 30, 255]);

    let map = render_map(&three_units(), &config, Some(&tiles)).unwrap();
    assert!(data_warnings(&map).is_empty());
    assert!(map.viewport.extent.min_x < -1.0e7);

    // Padding west of A shows the basemap; A itself is filled
    let (x, y) = CrsCode::Epsg4326.to_web_mercator(-112.1, 40.5);
    let tile_pixel = map.pixel_at(x, y).unwrap();
    let expected = [10u8, 200, 30, 255];
    for (got, want) in tile_pixel.0.iter().zip(expected) {
        assert!(got.abs_diff(want) <= 2, "basemap pixel {:?}", tile_pixel);
    }

    let (x, y) = CrsCode::Epsg4326.to_web_mercator(-111.5, 40.5);
    let rdbu = Colormap::from_name("RdBu").unwrap();
    assert_eq!(map.pixel_at(x, y), Some(rgba(rdbu.sample(1.0))));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_missing_columns() {
    let config = small(MapConfig::trend_map("et_slope", "et_p"), 40);
    let err = render_map(&three_units(), &config, None).unwrap_err();
    assert!(matches!(err, RenderError::MissingColumn(ref c) if c == "et_slope"));

    let config = small(MapConfig::trend_map("ppt_slope", "et_p"), 40);
    let err = render_map(&three_units(), &config, None).unwrap_err();
    assert!(matches!(err, RenderError::MissingColumn(ref c) if c == "et_p"));
}

#[test]
fn test_empty_layer() {
    let layer = SpatialLayer::new(CrsCode::Epsg4326, Vec::new());
    let config = small(MapConfig::attribute_map("ppt"), 40);
    assert!(matches!(render_map(&layer, &config, None), Err(RenderError::EmptyLayer(_))));
}

#[test]
fn test_unknown_colormap() {
    let mut config = small(MapConfig::attribute_map("ppt_slope"), 40);
    config.cmap = "jet".to_string();
    assert!(matches!(
        render_map(&three_units(), &config, None),
        Err(RenderError::UnknownColormap(_))
    ));
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_save_crops_and_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("maps").join("ppt_trend.png");

    let config = small(MapConfig::trend_map("ppt_slope", "ppt_p"), 60);
    let map = render_map(&three_units(), &config, None).unwrap();
    map.save(&path).unwrap();

    let decoded = image::open(&path).unwrap().to_rgba8();
    let (w, h) = decoded.dimensions();
    assert!(w > 0 && h > 0);
    assert!(w <= map.width() && h <= map.height());
    assert!(w < map.width() || h < map.height());
}
