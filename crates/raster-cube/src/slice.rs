//! Reading single-time-slice rasters (`Band1` + `crs`) from NetCDF.

use std::path::{Path, PathBuf};
use std::sync::Once;

use netcdf::AttributeValue;
use prism_common::{GeoTransform, YearMonth};
use tracing::debug;

use crate::discover::slice_time;
use crate::error::{CubeError, CubeResult};

/// Name of the data variable in each monthly slice.
pub const BAND_VARIABLE: &str = "Band1";

/// Name of the grid-mapping variable carrying CRS metadata.
pub const CRS_VARIABLE: &str = "crs";

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints diagnostics even when a missing attribute is
/// handled gracefully on the Rust side. Call once early in `main()`; repeated
/// calls are no-ops.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable automatic error printing.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Georeferencing carried by the `crs` variable of a slice.
#[derive(Debug, Clone)]
pub struct Georeference {
    /// Well-known-text CRS definition (`crs_wkt`)
    pub crs_wkt: String,
    /// Affine transform (`GeoTransform`)
    pub geotransform: GeoTransform,
    /// Every attribute of the `crs` variable, copied verbatim into the cube
    pub attributes: Vec<(String, AttributeValue)>,
}

impl Georeference {
    /// Same CRS text and same transform.
    pub fn matches(&self, other: &Georeference) -> bool {
        self.crs_wkt == other.crs_wkt && self.geotransform == other.geotransform
    }
}

/// One monthly grid.
#[derive(Debug, Clone)]
pub struct RasterSlice {
    pub path: PathBuf,
    pub time: YearMonth,
    pub height: usize,
    pub width: usize,
    /// Row-major values, fill values replaced by NaN
    pub data: Vec<f32>,
    /// Latitude of each row, if the file has a `lat` coordinate
    pub lat: Option<Vec<f64>>,
    /// Longitude of each column, if the file has a `lon` coordinate
    pub lon: Option<Vec<f64>>,
    /// `None` when the `crs` variable or its attributes are absent
    pub georeference: Option<Georeference>,
}

impl RasterSlice {
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}

/// Read a slice file. The timestamp comes from the filename.
pub fn read_slice(path: &Path) -> CubeResult<RasterSlice> {
    silence_hdf5_errors();

    let time = slice_time(path)?;
    let file = netcdf::open(path)?;

    let band = file
        .variable(BAND_VARIABLE)
        .ok_or_else(|| {
            CubeError::MissingData(format!("{} variable in {}", BAND_VARIABLE, path.display()))
        })?;

    let dims = band.dimensions();
    if dims.len() < 2 {
        return Err(CubeError::MissingData(format!(
            "2-D grid for {} in {}",
            BAND_VARIABLE,
            path.display()
        )));
    }
    let height = dims[dims.len() - 2].len();
    let width = dims[dims.len() - 1].len();

    let raw: Vec<f32> = band.get_values(..)?;
    if raw.len() != height * width {
        return Err(CubeError::MissingData(format!(
            "single time slice in {} ({} values for a {}x{} grid)",
            path.display(),
            raw.len(),
            height,
            width
        )));
    }

    let fill = get_f64_attr(&band, "_FillValue").or_else(|| get_f64_attr(&band, "missing_value"));
    let data = match fill {
        Some(fill) => {
            let fill = fill as f32;
            raw.into_iter()
                .map(|v| if v == fill { f32::NAN } else { v })
                .collect()
        }
        None => raw,
    };

    let lat = read_coordinate(&file, "lat", height);
    let lon = read_coordinate(&file, "lon", width);

    let georeference = read_georeference(&file);

    debug!(
        path = %path.display(),
        time = %time,
        height = height,
        width = width,
        georeferenced = georeference.is_some(),
        "Read raster slice"
    );

    Ok(RasterSlice {
        path: path.to_path_buf(),
        time,
        height,
        width,
        data,
        lat,
        lon,
        georeference,
    })
}

fn read_coordinate(file: &netcdf::File, name: &str, expected_len: usize) -> Option<Vec<f64>> {
    let var = file.variable(name)?;
    let values: Vec<f64> = var.get_values(..).ok()?;
    (values.len() == expected_len).then_some(values)
}

fn read_georeference(file: &netcdf::File) -> Option<Georeference> {
    let crs = file.variable(CRS_VARIABLE)?;
    let crs_wkt = get_string_attr(&crs, "crs_wkt")?;
    let geotransform = GeoTransform::from_gdal_str(&get_string_attr(&crs, "GeoTransform")?).ok()?;

    let attributes = crs
        .attributes()
        .filter_map(|attr| Some((attr.name().to_string(), attr.value().ok()?)))
        .collect();

    Some(Georeference {
        crs_wkt,
        geotransform,
        attributes,
    })
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(s) => Some(s),
        AttributeValue::Strs(parts) => Some(parts.join("")),
        _ => None,
    }
}
