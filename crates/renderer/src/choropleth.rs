//! Choropleth maps of a polygon layer.
//!
//! Features are filled by one numeric column through a colormap and a
//! normalization, with optional significance overlays driven by a p-value
//! column:
//! - dot hatching on features whose p-value is above the threshold
//! - a bold black border on features at or below it
//! - a star marker at the centroid of features at or below it
//!
//! Without a basemap the axes carry lon/lat ticks, a dashed grid and
//! `Longitude`/`Latitude` labels. With one, the layer is drawn in web mercator
//! over the tiles and the axes have no ticks.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use geo::{LineString, MultiPolygon};
use image::{Rgba, RgbaImage};
use tiny_skia::{
    FillRule, Mask, Paint, PathBuilder, Pixmap, Rect, Stroke, StrokeDash, Transform,
};
use tracing::{debug, info, warn};

use crate::basemap::{draw_basemap, TileSource};
use crate::colormap::{Color, Colormap};
use crate::error::{RenderError, RenderResult};
use crate::layer::SpatialLayer;
use crate::norm::{data_bounds, resolve_color_scale, ColorScale};
use crate::png::create_png_auto;
use crate::text::{Anchor, Label, TextRenderer, NO_FONT_WARNING};
use crate::ticks::{format_ticks, nice_ticks};
use crate::viewport::{geographic_aspect, Viewport};

/// Points per inch.
const POINTS_PER_INCH: f32 = 72.0;

const TITLE_SIZE_PT: f32 = 15.0;
const COLORBAR_LABEL_SIZE_PT: f32 = 12.0;
const AXIS_LABEL_SIZE_PT: f32 = 10.0;
const TICK_LABEL_SIZE_PT: f32 = 10.0;
const TICK_LENGTH_PT: f32 = 3.5;
const SPINE_WIDTH_PT: f32 = 0.8;
const GRID_WIDTH_PT: f32 = 0.5;
const BORDER_WIDTH_PT: f32 = 1.2;
const HATCH_EDGE_WIDTH_PT: f32 = 1.0;
/// Marker area in square points
const MARKER_AREA_PT2: f32 = 30.0;
/// Rows of hatch dots per inch
const HATCH_DENSITY: f32 = 18.0;
/// Whitespace kept around content when cropping (inches)
const CROP_PAD_IN: f32 = 0.1;

/// Significance overlays driven by a p-value column.
#[derive(Debug, Clone, PartialEq)]
pub struct SignificanceConfig {
    pub column: String,
    /// Features with p <= level are significant
    pub level: f64,
    pub hatch_non_significant: bool,
    pub show_border: bool,
    pub show_marker: bool,
}

impl SignificanceConfig {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            level: 0.05,
            hatch_non_significant: false,
            show_border: true,
            show_marker: false,
        }
    }
}

/// Figure configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Numeric column that colors the features
    pub column: String,
    pub cmap: String,
    /// Color bounds; data min/max when unset
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
    /// Center the colormap on zero when the bounds straddle it
    pub center_zero: bool,
    pub title: Option<String>,
    pub colorbar_label: Option<String>,
    pub significance: Option<SignificanceConfig>,
    pub edge_color: Color,
    /// Feature outline width (points)
    pub edge_width: f32,
    /// Figure size (inches)
    pub width_in: f32,
    pub height_in: f32,
    pub dpi: u32,
    pub font_path: Option<PathBuf>,
}

impl MapConfig {
    /// Slope map with significance borders, centered on zero.
    pub fn trend_map(slope_column: impl Into<String>, p_column: impl Into<String>) -> Self {
        Self {
            column: slope_column.into(),
            cmap: "RdBu".to_string(),
            vmin: None,
            vmax: None,
            center_zero: true,
            title: Some("Trend Map".to_string()),
            colorbar_label: Some("Sen's Slope".to_string()),
            significance: Some(SignificanceConfig::new(p_column)),
            edge_color: Color::GRAY,
            edge_width: 0.5,
            width_in: 12.0,
            height_in: 8.0,
            dpi: 300,
            font_path: None,
        }
    }

    /// Plain map of one attribute.
    pub fn attribute_map(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            cmap: "Blues".to_string(),
            vmin: None,
            vmax: None,
            center_zero: false,
            title: None,
            colorbar_label: None,
            significance: None,
            edge_color: Color::GRAY,
            edge_width: 0.5,
            width_in: 12.0,
            height_in: 10.0,
            dpi: 300,
            font_path: None,
        }
    }

    fn pixel_size(&self) -> RenderResult<(u32, u32)> {
        let w = (self.width_in * self.dpi as f32).round();
        let h = (self.height_in * self.dpi as f32).round();
        if !(w >= 1.0 && h >= 1.0) {
            return Err(RenderError::Canvas(format!(
                "figure {}x{} in at {} dpi has no pixels",
                self.width_in, self.height_in, self.dpi
            )));
        }
        Ok((w as u32, h as u32))
    }
}

/// A rendered figure.
#[derive(Debug, Clone)]
pub struct RenderedMap {
    pub image: RgbaImage,
    /// Placement of the drawn layer's coordinates on the image
    pub viewport: Viewport,
    pub color_scale: ColorScale,
    /// Recovered problems: color-scale fallback, missing basemap tiles
    pub warnings: Vec<String>,
    pub dpi: u32,
}

impl RenderedMap {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel under a coordinate of the drawn layer.
    pub fn pixel_at(&self, x: f64, y: f64) -> Option<Rgba<u8>> {
        let (px, py) = self.viewport.to_pixel(x, y);
        if px < 0.0 || py < 0.0 {
            return None;
        }
        self.image.get_pixel_checked(px as u32, py as u32).copied()
    }

    /// Image trimmed to its non-white content plus a small margin.
    pub fn cropped(&self) -> RgbaImage {
        let white = Rgba([255, 255, 255, 255]);
        let (w, h) = self.image.dimensions();
        let (mut x0, mut y0, mut x1, mut y1) = (w, h, 0u32, 0u32);

        for (x, y, p) in self.image.enumerate_pixels() {
            if *p != white {
                x0 = x0.min(x);
                y0 = y0.min(y);
                x1 = x1.max(x);
                y1 = y1.max(y);
            }
        }
        if x0 > x1 || y0 > y1 {
            return self.image.clone();
        }

        let pad = (CROP_PAD_IN * self.dpi as f32).round() as u32;
        let left = x0.saturating_sub(pad);
        let top = y0.saturating_sub(pad);
        let right = (x1 + pad).min(w - 1);
        let bottom = (y1 + pad).min(h - 1);

        image::imageops::crop_imm(&self.image, left, top, right - left + 1, bottom - top + 1)
            .to_image()
    }

    /// Cropped figure as PNG bytes with the figure dpi recorded.
    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        let cropped = self.cropped();
        let (w, h) = cropped.dimensions();
        create_png_auto(cropped.as_raw(), w as usize, h as usize, Some(self.dpi))
    }

    /// Write the cropped PNG, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> RenderResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let png = self.to_png()?;
        std::fs::write(path, &png)?;
        info!(path = %path.display(), bytes = png.len(), dpi = self.dpi, "Saved map");
        Ok(())
    }
}

/// Render a choropleth of `config.column`.
///
/// With a basemap source the layer is reprojected to web mercator first.
/// Features whose value is missing are not drawn.
pub fn render_map(
    layer: &SpatialLayer,
    config: &MapConfig,
    basemap: Option<&dyn TileSource>,
) -> RenderResult<RenderedMap> {
    if layer.is_empty() {
        return Err(RenderError::EmptyLayer("layer has no polygon features".to_string()));
    }

    let values = layer.values(&config.column)?;
    let p_values = match &config.significance {
        Some(sig) => Some(layer.values(&sig.column)?),
        None => None,
    };

    let layer: Cow<'_, SpatialLayer> = if basemap.is_some() {
        Cow::Owned(layer.to_web_mercator()?)
    } else {
        Cow::Borrowed(layer)
    };

    let (data_min, data_max) = data_bounds(&values)
        .ok_or_else(|| {
            RenderError::EmptyLayer(format!("no finite values in column '{}'", config.column))
        })?;
    let vmin = config.vmin.unwrap_or(data_min);
    let vmax = config.vmax.unwrap_or(data_max);

    let mut warnings = Vec::new();
    let scale = resolve_color_scale(config.center_zero, vmin, vmax, &config.cmap);
    if let Some(message) = &scale.warning {
        warn!(column = %config.column, "{}", message);
        warnings.push(message.clone());
    }
    let cmap = Colormap::from_name(&scale.cmap)
        .ok_or_else(|| RenderError::UnknownColormap(scale.cmap.clone()))?;

    let extent = layer.bounds();
    if extent.is_empty() || extent.width() <= 0.0 || extent.height() <= 0.0 {
        return Err(RenderError::EmptyLayer("layer has zero extent".to_string()));
    }
    let extent = extent.padded(0.05);

    let (width, height) = config.pixel_size()?;
    let pt = config.dpi as f32 / POINTS_PER_INCH;
    let text = TextRenderer::load(config.font_path.as_deref())?;
    if !text.has_font() {
        warnings.push(NO_FONT_WARNING.to_string());
    }
    let show_axes = basemap.is_none();

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| {
            RenderError::Canvas(format!("Failed to allocate {}x{} canvas", width, height))
        })?;
    pixmap.fill(tiny_skia::Color::WHITE);
    let mut labels = Vec::new();

    // Layout: title above, colorbar right, tick labels left and below
    let pad = 6.0 * pt;
    let tick_len = TICK_LENGTH_PT * pt;
    let tick_px = TICK_LABEL_SIZE_PT * pt;
    let axis_label_px = AXIS_LABEL_SIZE_PT * pt;
    let (tick_label_w, tick_label_h) = text.measure("-000.0", tick_px);

    let top_margin = pad + config.title.as_ref().map_or(0.0, |_| TITLE_SIZE_PT * pt * 1.6);
    let (left_margin, bottom_margin) = if show_axes {
        (
            pad + axis_label_px * 1.5 + tick_label_w + tick_len,
            pad + tick_len + tick_label_h * 1.4 + axis_label_px * 1.5,
        )
    } else {
        (pad, pad)
    };
    let colorbar = ColorbarLayout {
        gap: width as f32 * 0.02,
        width: width as f32 * 0.025,
        tick_label_w: text.measure("-0.000", tick_px).0,
    };
    let right_margin = pad
        + colorbar.gap
        + colorbar.width
        + tick_len
        + colorbar.tick_label_w
        + config.colorbar_label.as_ref().map_or(0.0, |_| COLORBAR_LABEL_SIZE_PT * pt * 1.6);

    let frame_w = width as f32 - left_margin - right_margin;
    let frame_h = height as f32 - top_margin - bottom_margin;
    if frame_w <= 1.0 || frame_h <= 1.0 {
        return Err(RenderError::Canvas(format!(
            "figure {}x{} px too small for map",
            width, height
        )));
    }

    let y_stretch = if layer.crs.is_geographic() { geographic_aspect(&extent) } else { 1.0 };
    let viewport = Viewport::fit(extent, left_margin, top_margin, frame_w, frame_h, y_stretch);

    if let Some(source) = basemap {
        warnings.extend(draw_basemap(&mut pixmap, &viewport, source)?);
    } else {
        draw_grid(&mut pixmap, &viewport, pt, &mut labels);
    }

    // Base fill and outlines
    let mut paths = Vec::with_capacity(layer.features.len());
    let mut drawn = 0usize;
    for (feature, value) in layer.features.iter().zip(&values) {
        let path = feature_path(&feature.geometry, &viewport);
        let t = scale.normalization.normalize(*value);
        if let (Some(path), false) = (&path, t.is_nan()) {
            let color = cmap.sample(t);
            pixmap.fill_path(path, &solid(color), FillRule::EvenOdd, Transform::identity(), None);
            stroke(&mut pixmap, path, config.edge_color, config.edge_width * pt);
            drawn += 1;
        }
        paths.push(path);
    }
    debug!(features = layer.features.len(), drawn = drawn, "Filled features");

    if let (Some(sig), Some(p_values)) = (&config.significance, &p_values) {
        let significant: Vec<bool> = p_values.iter().map(|p| *p <= sig.level).collect();

        if sig.hatch_non_significant {
            let spacing = config.dpi as f32 / HATCH_DENSITY;
            for (path, _) in paths.iter().zip(&significant).filter(|(_, s)| !**s) {
                if let Some(path) = path {
                    draw_hatch(&mut pixmap, path, spacing, (0.6 * pt).max(0.5))?;
                    stroke(&mut pixmap, path, Color::GRAY, HATCH_EDGE_WIDTH_PT * pt);
                }
            }
        }

        if sig.show_border {
            for (path, _) in paths.iter().zip(&significant).filter(|(_, s)| **s) {
                if let Some(path) = path {
                    stroke(&mut pixmap, path, Color::BLACK, BORDER_WIDTH_PT * pt);
                }
            }
        }

        if sig.show_marker {
            let radius = MARKER_AREA_PT2.sqrt() / 2.0 * pt;
            for (feature, _) in layer.features.iter().zip(&significant).filter(|(_, s)| **s) {
                let Some(centroid) = feature.centroid() else { continue };
                let (cx, cy) = viewport.to_pixel(centroid.x(), centroid.y());
                if let Some(star) = star_path(cx, cy, radius) {
                    pixmap.fill_path(
                        &star,
                        &solid(Color::BLACK),
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                }
            }
        }

        let count = significant.iter().filter(|s| **s).count();
        debug!(significant = count, level = sig.level, "Significance overlays drawn");
    }

    draw_spines(&mut pixmap, &viewport, pt)?;
    draw_colorbar(&mut pixmap, &viewport, &colorbar, &scale, &cmap, config, pt, &mut labels)?;

    if let Some(title) = &config.title {
        labels.push(Label::new(
            title.clone(),
            viewport.left + viewport.width / 2.0,
            viewport.top - 6.0 * pt,
            TITLE_SIZE_PT * pt,
            Anchor::BottomCenter,
        ));
    }

    if show_axes {
        labels.push(Label::new(
            "Longitude",
            viewport.left + viewport.width / 2.0,
            viewport.bottom() + tick_len + tick_label_h * 1.4,
            axis_label_px,
            Anchor::TopCenter,
        ));
        labels.push(
            Label::new(
                "Latitude",
                viewport.left - tick_len - tick_label_w - 4.0 * pt,
                viewport.top + viewport.height / 2.0,
                axis_label_px,
                Anchor::CenterRight,
            )
            .vertical(),
        );
    }

    let image = text.finish(pixmap, &labels);

    info!(
        column = %config.column,
        width = width,
        height = height,
        features = drawn,
        cmap = %scale.cmap,
        basemap = basemap.is_some(),
        "Rendered map"
    );

    Ok(RenderedMap {
        image,
        viewport,
        color_scale: scale,
        warnings,
        dpi: config.dpi,
    })
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn stroke(pixmap: &mut Pixmap, path: &tiny_skia::Path, color: Color, width: f32) {
    let stroke = Stroke {
        width,
        ..Stroke::default()
    };
    pixmap.stroke_path(path, &solid(color), &stroke, Transform::identity(), None);
}

fn push_ring(pb: &mut PathBuilder, ring: &LineString<f64>, viewport: &Viewport) {
    let mut coords = ring.coords();
    let Some(first) = coords.next() else { return };
    let (x, y) = viewport.to_pixel(first.x, first.y);
    pb.move_to(x, y);
    for c in coords {
        let (x, y) = viewport.to_pixel(c.x, c.y);
        pb.line_to(x, y);
    }
    pb.close();
}

/// Pixel-space outline of every ring of a feature.
fn feature_path(geometry: &MultiPolygon<f64>, viewport: &Viewport) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for polygon in &geometry.0 {
        push_ring(&mut pb, polygon.exterior(), viewport);
        for interior in polygon.interiors() {
            push_ring(&mut pb, interior, viewport);
        }
    }
    pb.finish()
}

/// Staggered gray dots clipped to a feature.
fn draw_hatch(
    pixmap: &mut Pixmap,
    path: &tiny_skia::Path,
    spacing: f32,
    radius: f32,
) -> RenderResult<()> {
    let mut mask = Mask::new(pixmap.width(), pixmap.height())
        .ok_or_else(|| RenderError::Canvas("Failed to allocate hatch mask".to_string()))?;
    mask.fill_path(path, FillRule::EvenOdd, true, Transform::identity());

    let bounds = path.bounds();
    let mut pb = PathBuilder::new();
    let mut row = (bounds.top() / spacing).floor() as i64;
    while row as f32 * spacing <= bounds.bottom() + spacing {
        let y = row as f32 * spacing;
        let offset = if row % 2 == 0 { 0.0 } else { spacing / 2.0 };
        let mut x = (bounds.left() / spacing).floor() * spacing - offset;
        while x <= bounds.right() + spacing {
            pb.push_circle(x, y, radius);
            x += spacing;
        }
        row += 1;
    }

    if let Some(dots) = pb.finish() {
        pixmap.fill_path(
            &dots,
            &solid(Color::GRAY),
            FillRule::Winding,
            Transform::identity(),
            Some(&mask),
        );
    }
    Ok(())
}

/// Five-pointed star centered on (cx, cy).
fn star_path(cx: f32, cy: f32, outer: f32) -> Option<tiny_skia::Path> {
    let inner = outer * 0.381_966;
    let mut pb = PathBuilder::new();
    for i in 0..10 {
        let r = if i % 2 == 0 { outer } else { inner };
        let angle = -std::f32::consts::FRAC_PI_2 + i as f32 * std::f32::consts::PI / 5.0;
        let (x, y) = (cx + r * angle.cos(), cy + r * angle.sin());
        if i == 0 {
            pb.move_to(x, y);
        } else {
            pb.line_to(x, y);
        }
    }
    pb.close();
    pb.finish()
}

/// Dashed grid at lon/lat ticks, with tick marks and labels.
fn draw_grid(pixmap: &mut Pixmap, viewport: &Viewport, pt: f32, labels: &mut Vec<Label>) {
    let extent = viewport.extent;
    let x_ticks = nice_ticks(extent.min_x, extent.max_x, 6);
    let y_ticks = nice_ticks(extent.min_y, extent.max_y, 6);

    let mut grid = PathBuilder::new();
    let mut marks = PathBuilder::new();
    let tick_len = TICK_LENGTH_PT * pt;

    for (tick, text) in x_ticks.iter().zip(format_ticks(&x_ticks)) {
        let (x, _) = viewport.to_pixel(*tick, extent.min_y);
        grid.move_to(x, viewport.top);
        grid.line_to(x, viewport.bottom());
        marks.move_to(x, viewport.bottom());
        marks.line_to(x, viewport.bottom() + tick_len);
        labels.push(Label::new(
            text,
            x,
            viewport.bottom() + tick_len + 2.0 * pt,
            TICK_LABEL_SIZE_PT * pt,
            Anchor::TopCenter,
        ));
    }
    for (tick, text) in y_ticks.iter().zip(format_ticks(&y_ticks)) {
        let (_, y) = viewport.to_pixel(extent.min_x, *tick);
        grid.move_to(viewport.left, y);
        grid.line_to(viewport.right(), y);
        marks.move_to(viewport.left, y);
        marks.line_to(viewport.left - tick_len, y);
        labels.push(Label::new(
            text,
            viewport.left - tick_len - 2.0 * pt,
            y,
            TICK_LABEL_SIZE_PT * pt,
            Anchor::CenterRight,
        ));
    }

    if let Some(path) = grid.finish() {
        let dashed = Stroke {
            width: GRID_WIDTH_PT * pt,
            dash: StrokeDash::new(vec![3.7 * pt, 1.6 * pt], 0.0),
            ..Stroke::default()
        };
        // #b0b0b0 at half opacity
        let paint = solid(Color::new(176, 176, 176, 128));
        pixmap.stroke_path(&path, &paint, &dashed, Transform::identity(), None);
    }
    if let Some(path) = marks.finish() {
        stroke(pixmap, &path, Color::BLACK, SPINE_WIDTH_PT * pt);
    }
}

fn draw_spines(pixmap: &mut Pixmap, viewport: &Viewport, pt: f32) -> RenderResult<()> {
    let rect = Rect::from_xywh(viewport.left, viewport.top, viewport.width, viewport.height)
        .ok_or_else(|| RenderError::Canvas("Degenerate plot area".to_string()))?;
    stroke(pixmap, &PathBuilder::from_rect(rect), Color::BLACK, SPINE_WIDTH_PT * pt);
    Ok(())
}

/// Horizontal placement of the colorbar, in pixels.
struct ColorbarLayout {
    gap: f32,
    width: f32,
    tick_label_w: f32,
}

/// Vertical colorbar to the right of the plot area, matching its height.
#[allow(clippy::too_many_arguments)]
fn draw_colorbar(
    pixmap: &mut Pixmap,
    viewport: &Viewport,
    layout: &ColorbarLayout,
    scale: &ColorScale,
    cmap: &Colormap,
    config: &MapConfig,
    pt: f32,
    labels: &mut Vec<Label>,
) -> RenderResult<()> {
    let left = viewport.right() + layout.gap;
    let bar_width = layout.width;
    let top = viewport.top;
    let bar_height = viewport.height;

    let rows = bar_height.ceil().max(1.0) as u32;
    for i in 0..rows {
        let t = 1.0 - (i as f64 + 0.5) / rows as f64;
        if let Some(rect) = Rect::from_xywh(left, top + i as f32, bar_width, 1.0) {
            let mut paint = solid(cmap.sample(t));
            paint.anti_alias = false;
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    let outline = Rect::from_xywh(left, top, bar_width, bar_height)
        .ok_or_else(|| RenderError::Canvas("Degenerate colorbar".to_string()))?;
    stroke(pixmap, &PathBuilder::from_rect(outline), Color::BLACK, SPINE_WIDTH_PT * pt);

    let (vmin, vmax) = scale.normalization.bounds();
    let ticks = nice_ticks(vmin, vmax, 5);
    let tick_len = TICK_LENGTH_PT * pt;
    let right = left + bar_width;

    let mut marks = PathBuilder::new();
    for (tick, text) in ticks.iter().zip(format_ticks(&ticks)) {
        let t = scale.normalization.normalize(*tick) as f32;
        let y = top + (1.0 - t) * bar_height;
        marks.move_to(right, y);
        marks.line_to(right + tick_len, y);
        labels.push(Label::new(
            text,
            right + tick_len + 2.0 * pt,
            y,
            TICK_LABEL_SIZE_PT * pt,
            Anchor::CenterLeft,
        ));
    }
    if let Some(path) = marks.finish() {
        stroke(pixmap, &path, Color::BLACK, SPINE_WIDTH_PT * pt);
    }

    if let Some(label) = &config.colorbar_label {
        labels.push(
            Label::new(
                label.clone(),
                right + tick_len + 4.0 * pt + layout.tick_label_w,
                top + bar_height / 2.0,
                COLORBAR_LABEL_SIZE_PT * pt,
                Anchor::CenterLeft,
            )
            .vertical(),
        );
    }
    Ok(())
}
