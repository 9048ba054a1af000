//! Common test fixtures for PRISM trend tests.

/// A NAD83 geographic CRS definition in the form PRISM grids carry.
pub const PRISM_CRS_WKT: &str = r#"GEOGCS["NAD83",DATUM["North_American_Datum_1983",SPHEROID["GRS 1980",6378137,298.257222101]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AXIS["Latitude",NORTH],AXIS["Longitude",EAST],AUTHORITY["EPSG","4269"]]"#;

/// A different CRS, for mismatch tests.
pub const WGS84_CRS_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#;

/// Small synthetic grid shared by the slice fixtures.
pub mod grid {
    /// Western edge of the synthetic grid (degrees)
    pub const ORIGIN_LON: f64 = -125.0;
    /// Northern edge of the synthetic grid (degrees)
    pub const ORIGIN_LAT: f64 = 50.0;
    /// Cell size (degrees)
    pub const RESOLUTION: f64 = 0.5;

    /// GDAL GeoTransform string matching the constants above.
    pub const GEOTRANSFORM: &str = "-125 0.5 0 50 0 -0.5";

    /// Cell-center longitudes for `width` columns.
    pub fn lon_centers(width: usize) -> Vec<f64> {
        (0..width)
            .map(|c| ORIGIN_LON + (c as f64 + 0.5) * RESOLUTION)
            .collect()
    }

    /// Cell-center latitudes for `height` rows, north first.
    pub fn lat_centers(height: usize) -> Vec<f64> {
        (0..height)
            .map(|r| ORIGIN_LAT - (r as f64 + 0.5) * RESOLUTION)
            .collect()
    }
}

/// GeoJSON layers for map tests.
pub mod layers {
    /// Three adjacent 1-degree squares in lon/lat keyed by `unit_id`, with
    /// trend attributes: A increasing and significant, B flat, C decreasing
    /// and significant.
    pub const THREE_UNITS_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {"unit_id": "A", "ppt_slope": 2.5, "ppt_p": 0.001},
      "geometry": {"type": "Polygon", "coordinates": [[[-112.0, 40.0], [-111.0, 40.0], [-111.0, 41.0], [-112.0, 41.0], [-112.0, 40.0]]]}
    },
    {
      "type": "Feature",
      "properties": {"unit_id": "B", "ppt_slope": 0.0, "ppt_p": 1.0},
      "geometry": {"type": "Polygon", "coordinates": [[[-111.0, 40.0], [-110.0, 40.0], [-110.0, 41.0], [-111.0, 41.0], [-111.0, 40.0]]]}
    },
    {
      "type": "Feature",
      "properties": {"unit_id": "C", "ppt_slope": -1.5, "ppt_p": 0.01},
      "geometry": {"type": "MultiPolygon", "coordinates": [[[[-110.0, 40.0], [-109.0, 40.0], [-109.0, 41.0], [-110.0, 41.0], [-110.0, 40.0]]]]}
    }
  ]
}"#;

    /// Same geometry with only positive slopes.
    pub const ALL_POSITIVE_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {"unit_id": "A", "ppt_slope": 0.5, "ppt_p": 0.02},
      "geometry": {"type": "Polygon", "coordinates": [[[-112.0, 40.0], [-111.0, 40.0], [-111.0, 41.0], [-112.0, 41.0], [-112.0, 40.0]]]}
    },
    {
      "type": "Feature",
      "properties": {"unit_id": "B", "ppt_slope": 3.0, "ppt_p": 0.4},
      "geometry": {"type": "Polygon", "coordinates": [[[-111.0, 40.0], [-110.0, 40.0], [-110.0, 41.0], [-111.0, 41.0], [-111.0, 40.0]]]}
    }
  ]
}"#;
}
