//! In-memory time cube assembled from monthly slices.

use prism_common::{GeoTransform, YearMonth};
use tracing::{info, warn};

use crate::error::{CubeError, CubeResult};
use crate::slice::{Georeference, RasterSlice};

/// Unit tag written on the stacked variable.
pub const DEFAULT_UNITS: &str = "mm";

/// A (time, lat, lon) grid with the georeferencing of its first slice.
#[derive(Debug, Clone)]
pub struct RasterCube {
    /// Output variable name (for example `ppt`)
    pub variable: String,
    pub units: String,
    /// Strictly increasing month of each time step
    pub times: Vec<YearMonth>,
    pub height: usize,
    pub width: usize,
    /// Time-major, then row-major values
    pub data: Vec<f32>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub georeference: Georeference,
}

impl RasterCube {
    /// Stack slices in the order given.
    ///
    /// The first slice supplies the CRS and transform; later slices with a
    /// different georeference are logged and stacked anyway. A slice with a
    /// different grid shape, or a timestamp that does not increase, fails
    /// the whole assembly.
    pub fn assemble(variable: &str, units: &str, slices: Vec<RasterSlice>) -> CubeResult<Self> {
        let first = slices
            .first()
            .ok_or_else(|| CubeError::MissingData("at least one slice".to_string()))?;

        let georeference = first
            .georeference
            .clone()
            .ok_or_else(|| CubeError::MissingGeoreference {
                path: first.path.clone(),
                detail: "crs variable needs crs_wkt and GeoTransform attributes".to_string(),
            })?;

        let (height, width) = first.shape();
        let (lon, lat) = match (&first.lon, &first.lat) {
            (Some(lon), Some(lat)) => (lon.clone(), lat.clone()),
            _ => georeference.geotransform.axis_coordinates(width, height),
        };

        let mut times: Vec<YearMonth> = Vec::with_capacity(slices.len());
        let mut data = Vec::with_capacity(slices.len() * height * width);

        for slice in &slices {
            if slice.shape() != (height, width) {
                return Err(CubeError::ShapeMismatch {
                    path: slice.path.clone(),
                    expected: (height, width),
                    found: slice.shape(),
                });
            }

            if let Some(prev) = times.last() {
                if slice.time <= *prev {
                    return Err(CubeError::UnorderedTime(format!(
                        "{} ({} follows {})",
                        slice.path.display(),
                        slice.time,
                        prev
                    )));
                }
            }

            match &slice.georeference {
                Some(georef) if georef.matches(&georeference) => {}
                Some(_) => warn!(
                    path = %slice.path.display(),
                    "Slice georeference differs from first file; using the first"
                ),
                None => warn!(
                    path = %slice.path.display(),
                    "Slice has no georeference; using the first file's"
                ),
            }

            times.push(slice.time);
            data.extend_from_slice(&slice.data);
        }

        info!(
            variable = variable,
            steps = times.len(),
            height = height,
            width = width,
            "Assembled raster cube"
        );

        Ok(Self {
            variable: variable.to_string(),
            units: units.to_string(),
            times,
            height,
            width,
            data,
            lat,
            lon,
            georeference,
        })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn geotransform(&self) -> GeoTransform {
        self.georeference.geotransform
    }

    /// The grid at time index `t`.
    pub fn slice(&self, t: usize) -> Option<&[f32]> {
        let size = self.height * self.width;
        self.data.get(t * size..(t + 1) * size)
    }

    pub fn value(&self, t: usize, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.slice(t).map(|grid| grid[row * self.width + col])
    }

    /// Time coordinate as days since 1970-01-01.
    pub fn time_values(&self) -> CubeResult<Vec<f64>> {
        self.times
            .iter()
            .map(|ym| {
                ym.days_since_epoch()
                    .map(|d| d as f64)
                    .ok_or_else(|| CubeError::UnorderedTime(ym.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn georef(wkt: &str) -> Georeference {
        Georeference {
            crs_wkt: wkt.to_string(),
            geotransform: GeoTransform::from_gdal([-100.0, 1.0, 0.0, 40.0, 0.0, -1.0]),
            attributes: Vec::new(),
        }
    }

    fn slice(
        token: &str,
        height: usize,
        width: usize,
        value: f32,
        wkt: Option<&str>,
    ) -> RasterSlice {
        RasterSlice {
            path: PathBuf::from(format!("prism_ppt_us_25m_{}.nc", token)),
            time: YearMonth::from_token(token).unwrap(),
            height,
            width,
            data: vec![value; height * width],
            lat: None,
            lon: None,
            georeference: wkt.map(georef),
        }
    }

    #[test]
    fn test_assemble_stacks_in_order() {
        let cube = RasterCube::assemble(
            "ppt",
            DEFAULT_UNITS,
            vec![
                slice("202201", 2, 3, 1.0, Some("WKT")),
                slice("202202", 2, 3, 2.0, Some("WKT")),
            ],
        )
        .unwrap();

        assert_eq!(cube.len(), 2);
        assert_eq!(cube.value(1, 1, 2), Some(2.0));
        assert_eq!(cube.value(0, 2, 0), None);
        assert_eq!(cube.lon, vec![-99.5, -98.5, -97.5]);
        assert_eq!(cube.lat, vec![39.5, 38.5]);
        assert_eq!(cube.time_values().unwrap(), vec![18993.0, 19024.0]);
    }

    #[test]
    fn test_first_slice_needs_georeference() {
        let err = RasterCube::assemble("ppt", DEFAULT_UNITS, vec![slice("202201", 2, 2, 1.0, None)])
            .unwrap_err();
        assert!(matches!(err, CubeError::MissingGeoreference { .. }));
    }

    #[test]
    fn test_later_georeference_mismatch_is_tolerated() {
        let cube = RasterCube::assemble(
            "ppt",
            DEFAULT_UNITS,
            vec![
                slice("202201", 2, 2, 1.0, Some("WKT")),
                slice("202202", 2, 2, 1.0, Some("OTHER")),
                slice("202203", 2, 2, 1.0, None),
            ],
        )
        .unwrap();
        assert_eq!(cube.georeference.crs_wkt, "WKT");
        assert_eq!(cube.len(), 3);
    }

    #[test]
    fn test_shape_mismatch_fails() {
        let err = RasterCube::assemble(
            "ppt",
            DEFAULT_UNITS,
            vec![slice("202201", 2, 2, 1.0, Some("WKT")), slice("202202", 3, 2, 1.0, Some("WKT"))],
        )
        .unwrap_err();
        assert!(matches!(err, CubeError::ShapeMismatch { expected: (2, 2), found: (3, 2), .. }));
    }

    #[test]
    fn test_duplicate_month_fails() {
        let err = RasterCube::assemble(
            "ppt",
            DEFAULT_UNITS,
            vec![slice("202201", 2, 2, 1.0, Some("WKT")), slice("202201", 2, 2, 1.0, Some("WKT"))],
        )
        .unwrap_err();
        assert!(matches!(err, CubeError::UnorderedTime(_)));
    }
}
