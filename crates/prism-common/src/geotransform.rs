//! Six-parameter affine georeferencing in GDAL order.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CommonError, CommonResult};

/// Affine transform from (column, row) pixel space to map coordinates.
///
/// Parameter order follows GDAL: origin-x, pixel-width, row-rotation,
/// origin-y, column-rotation, pixel-height. The origin is the outer corner of
/// the top-left pixel, not its center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub column_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            origin_x: coeffs[0],
            pixel_width: coeffs[1],
            row_rotation: coeffs[2],
            origin_y: coeffs[3],
            column_rotation: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    /// Parse a whitespace-separated GeoTransform attribute string such as
    /// `"-125.02 0.0416 0 49.94 0 -0.0416"`.
    pub fn from_gdal_str(s: &str) -> CommonResult<Self> {
        let values: Vec<f64> = s
            .split_whitespace()
            .map(|part| {
                part.parse::<f64>()
                    .map_err(|_| CommonError::InvalidGeoTransform(s.to_string()))
            })
            .collect::<CommonResult<_>>()?;

        let coeffs: [f64; 6] = values
            .try_into()
            .map_err(|_| CommonError::InvalidGeoTransform(s.to_string()))?;

        Ok(Self::from_gdal(coeffs))
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.column_rotation,
            self.pixel_height,
        ]
    }

    /// Map coordinates of a fractional pixel position.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.column_rotation + row * self.pixel_height,
        )
    }

    /// Map coordinates of a pixel center.
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    pub fn is_rotated(&self) -> bool {
        self.row_rotation != 0.0 || self.column_rotation != 0.0
    }

    /// Pixel-center coordinate vectors for a north-up grid.
    pub fn axis_coordinates(&self, width: usize, height: usize) -> (Vec<f64>, Vec<f64>) {
        let xs = (0..width).map(|c| self.pixel_center(c, 0).0).collect();
        let ys = (0..height).map(|r| self.pixel_center(0, r).1).collect();
        (xs, ys)
    }
}

impl fmt::Display for GeoTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.to_gdal().iter().map(|v| v.to_string()).collect();
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gdal_string() {
        let gt = GeoTransform::from_gdal_str("-125.0 0.5 0 50.0 0 -0.5").unwrap();
        assert_eq!(gt.origin_x, -125.0);
        assert_eq!(gt.pixel_width, 0.5);
        assert_eq!(gt.origin_y, 50.0);
        assert_eq!(gt.pixel_height, -0.5);
        assert!(!gt.is_rotated());
    }

    #[test]
    fn test_parse_rejects_wrong_count() {
        assert!(GeoTransform::from_gdal_str("1 2 3").is_err());
        assert!(GeoTransform::from_gdal_str("1 2 3 4 5 x").is_err());
        assert!(GeoTransform::from_gdal_str("").is_err());
    }

    #[test]
    fn test_pixel_center() {
        let gt = GeoTransform::from_gdal([-125.0, 0.5, 0.0, 50.0, 0.0, -0.5]);
        assert_eq!(gt.pixel_center(0, 0), (-124.75, 49.75));
        assert_eq!(gt.pixel_center(2, 1), (-123.75, 49.25));
    }

    #[test]
    fn test_display_roundtrip() {
        let gt = GeoTransform::from_gdal([-125.0, 0.5, 0.0, 50.0, 0.0, -0.5]);
        let parsed = GeoTransform::from_gdal_str(&gt.to_string()).unwrap();
        assert_eq!(parsed, gt);
    }
}
