//! PNG encoding for RGBA image data.
//!
//! Supports two encoding modes:
//! - **Indexed PNG (color type 3)**: used when the image has at most 256
//!   unique colors. Flat-colored choropleths without a basemap usually do.
//! - **RGBA PNG (color type 6)**: fallback for anti-aliased or tiled images.
//!
//! Both modes can carry a `pHYs` chunk recording the output resolution.

use std::collections::HashMap;
use std::io::Write;

use crate::error::{RenderError, RenderResult};

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

const METERS_PER_INCH: f64 = 0.0254;

/// Create a PNG image with automatic format selection.
///
/// `dpi`, when given, is written as physical pixel dimensions.
pub fn create_png_auto(
    pixels: &[u8],
    width: usize,
    height: usize,
    dpi: Option<u32>,
) -> RenderResult<Vec<u8>> {
    check_buffer(pixels, width, height)?;

    match extract_palette(pixels) {
        Some((palette, indices)) => create_png_indexed(width, height, &palette, &indices, dpi),
        None => create_png(pixels, width, height, dpi),
    }
}

/// Pack RGBA bytes into a u32 for faster hashing and comparison
#[inline(always)]
fn pack_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24)
}

/// Collect a palette and per-pixel indices, or None past 256 colors.
fn extract_palette(pixels: &[u8]) -> Option<(Vec<(u8, u8, u8, u8)>, Vec<u8>)> {
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<(u8, u8, u8, u8)> = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices: Vec<u8> = Vec::with_capacity(pixels.len() / 4);

    for chunk in pixels.chunks_exact(4) {
        let packed = pack_color(chunk[0], chunk[1], chunk[2], chunk[3]);

        let index = match color_to_index.get(&packed) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push((chunk[0], chunk[1], chunk[2], chunk[3]));
                color_to_index.insert(packed, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

fn check_buffer(pixels: &[u8], width: usize, height: usize) -> RenderResult<()> {
    if width == 0 || height == 0 {
        return Err(RenderError::Png(format!("empty image {}x{}", width, height)));
    }
    if pixels.len() != width * height * 4 {
        return Err(RenderError::Png(format!(
            "buffer holds {} bytes, expected {} for {}x{} RGBA",
            pixels.len(),
            width * height * 4,
            width,
            height
        )));
    }
    Ok(())
}

fn write_header(png: &mut Vec<u8>, width: usize, height: usize, color_type: u8, dpi: Option<u32>) {
    png.extend_from_slice(&PNG_SIGNATURE);

    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth
    ihdr_data.push(color_type);
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(png, b"IHDR", &ihdr_data);

    if let Some(dpi) = dpi {
        write_chunk(png, b"pHYs", &phys_data(dpi));
    }
}

/// pHYs payload: pixels per meter on both axes, unit specifier 1 (meter).
fn phys_data(dpi: u32) -> [u8; 9] {
    let ppm = (dpi as f64 / METERS_PER_INCH).round() as u32;
    let mut data = [0u8; 9];
    data[0..4].copy_from_slice(&ppm.to_be_bytes());
    data[4..8].copy_from_slice(&ppm.to_be_bytes());
    data[8] = 1;
    data
}

/// Create an indexed PNG (color type 3) from palette and indices.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[(u8, u8, u8, u8)],
    indices: &[u8],
    dpi: Option<u32>,
) -> RenderResult<Vec<u8>> {
    if indices.len() != width * height {
        return Err(RenderError::Png(format!(
            "{} palette indices for {}x{} image",
            indices.len(),
            width,
            height
        )));
    }

    let mut png = Vec::new();
    write_header(&mut png, width, height, 3, dpi);

    let mut plte_data = Vec::with_capacity(palette.len() * 3);
    for (r, g, b, _) in palette {
        plte_data.extend_from_slice(&[*r, *g, *b]);
    }
    write_chunk(&mut png, b"PLTE", &plte_data);

    // tRNS only when some entry is not opaque
    if palette.iter().any(|(_, _, _, a)| *a < 255) {
        let trns_data: Vec<u8> = palette.iter().map(|(_, _, _, a)| *a).collect();
        write_chunk(&mut png, b"tRNS", &trns_data);
    }

    let idat_data = deflate_scanlines(indices, width, height)
        .map_err(|e| RenderError::Png(format!("IDAT compression failed: {}", e)))?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Create a PNG image from RGBA pixel data (color type 6).
pub fn create_png(
    pixels: &[u8],
    width: usize,
    height: usize,
    dpi: Option<u32>,
) -> RenderResult<Vec<u8>> {
    check_buffer(pixels, width, height)?;

    let mut png = Vec::new();
    write_header(&mut png, width, height, 6, dpi);

    let idat_data = deflate_scanlines(pixels, width * 4, height)
        .map_err(|e| RenderError::Png(format!("IDAT compression failed: {}", e)))?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Write a PNG chunk
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each `row_bytes` scanline with filter type 0 and deflate.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> std::io::Result<Vec<u8>> {
    let mut uncompressed = Vec::with_capacity(height * (1 + row_bytes));
    for row in data.chunks_exact(row_bytes).take(height) {
        uncompressed.push(0);
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&uncompressed)?;
    encoder.finish()
}
