//! Synthetic monthly slices shaped like PRISM NetCDF conversions.

use std::path::Path;

use crate::fixtures::{grid, PRISM_CRS_WKT};

/// Description of one synthetic `Band1` slice.
#[derive(Debug, Clone)]
pub struct SyntheticSlice<'a> {
    pub width: usize,
    pub height: usize,
    /// Row-major values, north row first
    pub data: &'a [f32],
    /// `crs_wkt` attribute; `None` omits it
    pub crs_wkt: Option<&'a str>,
    /// `GeoTransform` attribute; `None` omits it
    pub geotransform: Option<&'a str>,
    /// Written as `_FillValue` on `Band1`
    pub fill_value: Option<f32>,
    /// Write lat/lon coordinate variables
    pub coordinates: bool,
}

impl<'a> SyntheticSlice<'a> {
    /// A fully georeferenced slice on the shared synthetic grid.
    pub fn prism(width: usize, height: usize, data: &'a [f32]) -> Self {
        Self {
            width,
            height,
            data,
            crs_wkt: Some(PRISM_CRS_WKT),
            geotransform: Some(grid::GEOTRANSFORM),
            fill_value: Some(-9999.0),
            coordinates: true,
        }
    }

    pub fn without_georeference(mut self) -> Self {
        self.crs_wkt = None;
        self.geotransform = None;
        self
    }

    pub fn with_crs_wkt(mut self, wkt: &'a str) -> Self {
        self.crs_wkt = Some(wkt);
        self
    }

    /// Write the slice to `path`.
    pub fn write(&self, path: &Path) -> Result<(), netcdf::Error> {
        let mut file = netcdf::create(path)?;
        file.add_dimension("lat", self.height)?;
        file.add_dimension("lon", self.width)?;
        file.add_attribute("Conventions", "CF-1.5")?;

        if self.coordinates {
            {
                let mut lat = file.add_variable::<f64>("lat", &["lat"])?;
                lat.put_attribute("units", "degrees_north")?;
                lat.put_values(&grid::lat_centers(self.height), ..)?;
            }
            {
                let mut lon = file.add_variable::<f64>("lon", &["lon"])?;
                lon.put_attribute("units", "degrees_east")?;
                lon.put_values(&grid::lon_centers(self.width), ..)?;
            }
        }

        {
            let scalar: [&str; 0] = [];
            let mut crs = file.add_variable::<i32>("crs", &scalar)?;
            crs.put_attribute("grid_mapping_name", "latitude_longitude")?;
            if let Some(wkt) = self.crs_wkt {
                crs.put_attribute("crs_wkt", wkt)?;
                crs.put_attribute("spatial_ref", wkt)?;
            }
            if let Some(gt) = self.geotransform {
                crs.put_attribute("GeoTransform", gt)?;
            }
        }

        let mut band = file.add_variable::<f32>("Band1", &["lat", "lon"])?;
        if let Some(fill) = self.fill_value {
            band.put_attribute("_FillValue", fill)?;
        }
        band.put_attribute("long_name", "GDAL Band Number 1")?;
        band.put_attribute("grid_mapping", "crs")?;
        band.put_values(self.data, ..)?;

        Ok(())
    }
}

/// Write a georeferenced slice named `prism_{variable}_us_25m_{token}.nc`
/// into `dir`, filled with `value` plus the cell index.
pub fn write_band1_slice(
    dir: &Path,
    variable: &str,
    token: &str,
    width: usize,
    height: usize,
    value: f32,
) -> Result<std::path::PathBuf, netcdf::Error> {
    let data: Vec<f32> = (0..width * height).map(|i| value + i as f32).collect();
    let path = dir.join(format!("prism_{}_us_25m_{}.nc", variable, token));
    SyntheticSlice::prism(width, height, &data).write(&path)?;
    Ok(path)
}
