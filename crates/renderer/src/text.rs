//! Text labels for map figures.
//!
//! Labels are collected while a figure is laid out and drawn in a last pass.
//! With a TrueType font they are rasterized with rusttype; without one,
//! numeric labels fall back to stroked seven-segment glyphs and other text
//! is dropped.

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::{debug, warn};

use crate::colormap::Color;
use crate::error::{RenderError, RenderResult};

/// Fonts tried, in order, when no font path is configured.
pub const DEFAULT_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Which point of the text box sits at the label position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopCenter,
    BottomCenter,
    CenterLeft,
    CenterRight,
}

/// A label placed on the figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Font size in pixels
    pub size: f32,
    pub anchor: Anchor,
    pub color: Color,
    /// Rotated 90 degrees counterclockwise (reads bottom to top)
    pub vertical: bool,
}

impl Label {
    pub fn new(text: impl Into<String>, x: f32, y: f32, size: f32, anchor: Anchor) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            size,
            anchor,
            color: Color::BLACK,
            vertical: false,
        }
    }

    pub fn vertical(mut self) -> Self {
        self.vertical = true;
        self
    }
}

/// Reported on a map drawn without a TrueType font.
pub const NO_FONT_WARNING: &str =
    "No TrueType font found; title and axis labels were omitted (set font_path)";

/// Draws labels with a TrueType font when one is available.
pub struct TextRenderer {
    font: Option<Font<'static>>,
}

impl TextRenderer {
    /// Load `font_path`, or the first of `DEFAULT_FONT_PATHS` that exists.
    ///
    /// An explicit path that cannot be read or parsed is an error; a missing
    /// system font is not.
    pub fn load(font_path: Option<&Path>) -> RenderResult<Self> {
        if let Some(path) = font_path {
            let font = read_font(path)?;
            return Ok(Self { font: Some(font) });
        }

        for candidate in DEFAULT_FONT_PATHS.iter().map(PathBuf::from) {
            if candidate.is_file() {
                match read_font(&candidate) {
                    Ok(font) => {
                        debug!(path = %candidate.display(), "Loaded label font");
                        return Ok(Self { font: Some(font) });
                    }
                    Err(e) => debug!(path = %candidate.display(), error = %e, "Skipping font"),
                }
            }
        }

        warn!(candidates = DEFAULT_FONT_PATHS.len(), "{}", NO_FONT_WARNING);
        Ok(Self::without_font())
    }

    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Width and height of `text` in pixels.
    pub fn measure(&self, text: &str, size: f32) -> (f32, f32) {
        match &self.font {
            Some(font) => {
                let (w, h) = text_size(Scale::uniform(size), font, text);
                (w as f32, h as f32)
            }
            None => (text.chars().count() as f32 * size * SEGMENT_ADVANCE, size * SEGMENT_HEIGHT),
        }
    }

    /// Convert the canvas to an image and draw every label on it.
    pub fn finish(&self, mut pixmap: Pixmap, labels: &[Label]) -> RgbaImage {
        if self.font.is_none() {
            for label in labels {
                draw_segment_label(&mut pixmap, label);
            }
        }

        let mut image = pixmap_to_image(&pixmap);

        if let Some(font) = &self.font {
            for label in labels.iter().filter(|l| !l.text.is_empty()) {
                self.draw_label(&mut image, font, label);
            }
        }
        image
    }

    fn draw_label(&self, image: &mut RgbaImage, font: &Font<'static>, label: &Label) {
        let scale = Scale::uniform(label.size);
        let (w, h) = text_size(scale, font, &label.text);
        let color = Rgba([label.color.r, label.color.g, label.color.b, 255]);

        if !label.vertical {
            let (x, y) = anchored(label, w as f32, h as f32);
            draw_text_mut(image, color, x as i32, y as i32, scale, font, &label.text);
            return;
        }

        // Rasterize horizontally on a transparent patch, then rotate it in
        let mut patch = RgbaImage::from_pixel(w.max(1) as u32, h.max(1) as u32, Rgba([0, 0, 0, 0]));
        draw_text_mut(&mut patch, color, 0, 0, scale, font, &label.text);
        let rotated = image::imageops::rotate270(&patch);
        let (x, y) = anchored(label, h as f32, w as f32);
        image::imageops::overlay(image, &rotated, x as i64, y as i64);
    }
}

fn read_font(path: &Path) -> RenderResult<Font<'static>> {
    let data =
        std::fs::read(path).map_err(|e| RenderError::Font(format!("{}: {}", path.display(), e)))?;
    Font::try_from_vec(data)
        .ok_or_else(|| RenderError::Font(format!("{}: not a TrueType font", path.display())))
}

/// Top-left corner for a box of `w` x `h` anchored at the label position.
fn anchored(label: &Label, w: f32, h: f32) -> (f32, f32) {
    match label.anchor {
        Anchor::TopCenter => (label.x - w / 2.0, label.y),
        Anchor::BottomCenter => (label.x - w / 2.0, label.y - h),
        Anchor::CenterLeft => (label.x, label.y - h / 2.0),
        Anchor::CenterRight => (label.x - w, label.y - h / 2.0),
    }
}

/// Demultiply the canvas into a straight-alpha RGBA image.
pub fn pixmap_to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image
}

/// Horizontal advance per stroked glyph, relative to font size.
const SEGMENT_ADVANCE: f32 = 0.6;
/// Glyph height relative to font size.
const SEGMENT_HEIGHT: f32 = 0.7;

/// Stroke a label whose text is made of digits, '-', '.' and spaces.
fn draw_segment_label(pixmap: &mut Pixmap, label: &Label) {
    let supported = |c: char| c.is_ascii_digit() || matches!(c, '-' | '.' | ' ' | '\u{2212}');
    if label.text.is_empty() || label.vertical || !label.text.chars().all(supported) {
        return;
    }

    let advance = label.size * SEGMENT_ADVANCE;
    let w = label.text.chars().count() as f32 * advance;
    let h = label.size * SEGMENT_HEIGHT;
    let (x, y) = anchored(label, w, h);

    let mut paint = Paint::default();
    paint.set_color_rgba8(label.color.r, label.color.g, label.color.b, 255);
    paint.anti_alias = true;

    for (i, ch) in label.text.chars().enumerate() {
        let cx = x + (i as f32 + 0.5) * advance;
        let cy = y + h / 2.0;
        draw_character(pixmap, cx, cy, ch, advance * 0.7, h, &paint);
    }
}

/// Draw a single character as seven-segment strokes centered on (x, y).
fn draw_character(
    pixmap: &mut Pixmap,
    x: f32,
    y: f32,
    ch: char,
    width: f32,
    height: f32,
    paint: &Paint,
) {
    let half_w = width / 2.0;
    let half_h = height / 2.0;

    let stroke = Stroke {
        width: (width * 0.15).max(1.0),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    let top = ((-half_w, -half_h), (half_w, -half_h));
    let middle = ((-half_w, 0.0), (half_w, 0.0));
    let bottom = ((-half_w, half_h), (half_w, half_h));
    let upper_left = ((-half_w, -half_h), (-half_w, 0.0));
    let lower_left = ((-half_w, 0.0), (-half_w, half_h));
    let upper_right = ((half_w, -half_h), (half_w, 0.0));
    let lower_right = ((half_w, 0.0), (half_w, half_h));

    let segments: Vec<((f32, f32), (f32, f32))> = match ch {
        '0' => vec![top, upper_right, lower_right, bottom, lower_left, upper_left],
        '1' => vec![upper_right, lower_right],
        '2' => vec![top, upper_right, middle, lower_left, bottom],
        '3' => vec![top, upper_right, middle, lower_right, bottom],
        '4' => vec![upper_left, middle, upper_right, lower_right],
        '5' => vec![top, upper_left, middle, lower_right, bottom],
        '6' => vec![top, upper_left, lower_left, bottom, lower_right, middle],
        '7' => vec![top, upper_right, lower_right],
        '8' => vec![top, upper_right, lower_right, bottom, lower_left, upper_left, middle],
        '9' => vec![middle, upper_left, top, upper_right, lower_right, bottom],
        '-' | '\u{2212}' => vec![middle],
        '.' => vec![((0.0, half_h * 0.8), (0.0, half_h))],
        _ => vec![],
    };

    for ((x1, y1), (x2, y2)) in segments {
        let mut pb = PathBuilder::new();
        pb.move_to(x + x1, y + y1);
        pb.line_to(x + x2, y + y2);

        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, paint, &stroke, Transform::identity(), None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_canvas(w: u32, h: u32) -> Pixmap {
        let mut pixmap = Pixmap::new(w, h).unwrap();
        pixmap.fill(tiny_skia::Color::WHITE);
        pixmap
    }

    fn dark_pixels(image: &RgbaImage) -> usize {
        image.pixels().filter(|p| p.0[0] < 128).count()
    }

    #[test]
    fn test_segment_digits_drawn_without_font() {
        let text = TextRenderer::without_font();
        let label = Label::new("-1.5", 50.0, 25.0, 20.0, Anchor::CenterLeft);
        let image = text.finish(white_canvas(120, 50), &[label]);
        assert!(dark_pixels(&image) > 0);
    }

    #[test]
    fn test_words_dropped_without_font() {
        let text = TextRenderer::without_font();
        let label = Label::new("Latitude", 10.0, 25.0, 20.0, Anchor::CenterLeft);
        let image = text.finish(white_canvas(120, 50), &[label]);
        assert_eq!(dark_pixels(&image), 0);
    }

    #[test]
    fn test_explicit_missing_font_is_error() {
        let err = TextRenderer::load(Some(Path::new("/nonexistent/font.ttf"))).err().unwrap();
        assert!(matches!(err, RenderError::Font(_)));
    }

    #[test]
    fn test_anchor_offsets() {
        let label = Label::new("x", 100.0, 50.0, 10.0, Anchor::CenterRight);
        assert_eq!(anchored(&label, 20.0, 10.0), (80.0, 45.0));
        let label = Label::new("x", 100.0, 50.0, 10.0, Anchor::TopCenter);
        assert_eq!(anchored(&label, 20.0, 10.0), (90.0, 50.0));
    }
}
