//! Tests for PNG encoding functionality.
//!
//! Tests the indexed PNG and RGBA PNG encoders, including:
//! - PNG format selection (auto mode)
//! - Decodability of both color types
//! - Physical resolution metadata

use renderer::png::{create_png, create_png_auto};

// ============================================================================
// Helper functions
// ============================================================================

/// Byte offset of a chunk's type field, if present.
fn find_chunk(png: &[u8], chunk_type: &[u8; 4]) -> Option<usize> {
    let mut pos = 8;
    while pos + 8 <= png.len() {
        let len = u32::from_be_bytes([png[pos], png[pos + 1], png[pos + 2], png[pos + 3]]) as usize;
        if &png[pos + 4..pos + 8] == chunk_type {
            return Some(pos + 4);
        }
        pos += 12 + len;
    }
    None
}

/// IHDR color type byte.
fn color_type(png: &[u8]) -> u8 {
    png[8 + 4 + 4 + 9]
}

/// Choropleth-like pixels: a handful of flat fills on white.
fn flat_fill_pixels(width: usize, height: usize) -> Vec<u8> {
    let fills = [[255, 255, 255, 255], [5, 48, 97, 255], [247, 247, 247, 255], [103, 0, 31, 255]];
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let idx = (x * 4 / width + y) % fills.len();
            pixels.extend_from_slice(&fills[idx]);
        }
    }
    pixels
}

// ============================================================================
// Basic PNG creation tests
// ============================================================================

#[test]
fn test_create_png_simple() {
    let pixels = [
        255, 0, 0, 255, // red
        0, 255, 0, 255, // green
        0, 255, 0, 255, // green
        255, 0, 0, 255, // red
    ];

    let png = create_png_auto(&pixels, 2, 2, None).unwrap();
    assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    assert_eq!(color_type(&png), 3);
    assert!(find_chunk(&png, b"pHYs").is_none());
}

#[test]
fn test_indexed_png_decodes_to_same_pixels() {
    let pixels = flat_fill_pixels(64, 48);
    let png = create_png_auto(&pixels, 64, 48, None).unwrap();

    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (64, 48));
    assert_eq!(decoded.as_raw(), &pixels);
}

#[test]
fn test_rgba_fallback_many_colors() {
    // 32x32 gradient with 1024 distinct colors
    let mut pixels = Vec::with_capacity(32 * 32 * 4);
    for y in 0..32u8 {
        for x in 0..32u8 {
            pixels.extend_from_slice(&[x * 8, y * 8, x.wrapping_add(y), 255]);
        }
    }

    let png = create_png_auto(&pixels, 32, 32, None).unwrap();
    assert_eq!(color_type(&png), 6);

    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.as_raw(), &pixels);
}

#[test]
fn test_transparency_kept_in_palette() {
    let pixels = [255, 0, 0, 255, 0, 0, 0, 0];
    let png = create_png_auto(&pixels, 2, 1, None).unwrap();
    assert!(find_chunk(&png, b"tRNS").is_some());

    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(1, 0).0[3], 0);
}

// ============================================================================
// Metadata
// ============================================================================

#[test]
fn test_dpi_written_as_phys() {
    let pixels = flat_fill_pixels(8, 8);
    let png = create_png(&pixels, 8, 8, Some(300)).unwrap();

    let pos = find_chunk(&png, b"pHYs").expect("pHYs chunk");
    let data = &png[pos + 4..pos + 13];
    let x_ppm = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    let y_ppm = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
    assert_eq!(x_ppm, 11811);
    assert_eq!(y_ppm, 11811);
    assert_eq!(data[8], 1);

    // pHYs must precede IDAT
    assert!(pos < find_chunk(&png, b"IDAT").unwrap());
}

#[test]
fn test_empty_image_rejected() {
    assert!(create_png_auto(&[], 0, 0, None).is_err());
}
