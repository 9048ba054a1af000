//! Coordinate Reference System codes and web-mercator math.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CommonError, CommonResult};

/// Earth radius used by the spherical web-mercator projection (meters).
pub const WEB_MERCATOR_RADIUS: f64 = 6378137.0;

/// Latitude limit of the web-mercator square (degrees).
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Well-known CRS codes handled by the toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// NAD83 Geographic, used by PRISM grids
    Epsg4269,
    /// Web Mercator (meters), used by tile basemaps
    Epsg3857,
}

impl CrsCode {
    /// Parse strings like "EPSG:4326", "epsg:3857" or "CRS:84".
    pub fn from_code_string(s: &str) -> CommonResult<Self> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "EPSG:4326" | "CRS:84" | "OGC:CRS84" | "4326" => Ok(CrsCode::Epsg4326),
            "EPSG:4269" | "4269" => Ok(CrsCode::Epsg4269),
            "EPSG:3857" | "EPSG:900913" | "3857" => Ok(CrsCode::Epsg3857),
            _ => Err(CommonError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg4269 => 4269,
            CrsCode::Epsg3857 => 3857,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Epsg4269)
    }

    /// Project a coordinate from this CRS into web mercator.
    ///
    /// NAD83 and WGS84 differ by well under a meter, which is below tile
    /// resolution, so both are projected with the same spherical formula.
    pub fn to_web_mercator(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            CrsCode::Epsg3857 => (x, y),
            CrsCode::Epsg4326 | CrsCode::Epsg4269 => (lon_to_mercator_x(x), lat_to_mercator_y(y)),
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Convert longitude (degrees) to web mercator X (meters).
pub fn lon_to_mercator_x(lon: f64) -> f64 {
    lon.to_radians() * WEB_MERCATOR_RADIUS
}

/// Convert latitude (degrees) to web mercator Y (meters).
///
/// Latitudes beyond the web-mercator square are clamped.
pub fn lat_to_mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT).to_radians();
    let y = ((std::f64::consts::PI / 4.0) + (lat_rad / 2.0)).tan().ln();
    y * WEB_MERCATOR_RADIUS
}

/// Convert web mercator Y (meters) back to latitude (degrees).
pub fn mercator_y_to_lat(y: f64) -> f64 {
    let y_normalized = y / WEB_MERCATOR_RADIUS;
    (2.0 * y_normalized.exp().atan() - std::f64::consts::PI / 2.0).to_degrees()
}
