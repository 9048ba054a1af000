//! Writing an assembled cube as a CF-style NetCDF file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::cube::RasterCube;
use crate::error::{CubeError, CubeResult};
use crate::slice::CRS_VARIABLE;

/// Write `cube` to `output`, creating parent directories as needed.
///
/// The file is built next to its destination and renamed into place once
/// complete, so a failure leaves no output file behind.
pub fn write_cube(cube: &RasterCube, output: &Path) -> CubeResult<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let partial = partial_path(output);
    match write_netcdf(cube, &partial) {
        Ok(()) => {
            fs::rename(&partial, output)?;
            info!(
                path = %output.display(),
                variable = %cube.variable,
                steps = cube.len(),
                "Wrote raster cube"
            );
            Ok(())
        }
        Err(e) => {
            if partial.exists() {
                if let Err(rm) = fs::remove_file(&partial) {
                    warn!(path = %partial.display(), error = %rm, "Failed to remove partial cube");
                }
            }
            Err(e)
        }
    }
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    output.with_file_name(name)
}

fn write_netcdf(cube: &RasterCube, path: &Path) -> CubeResult<()> {
    if cube.data.len() != cube.len() * cube.height * cube.width {
        return Err(CubeError::MissingData(format!(
            "{} values for {} steps of {}x{}",
            cube.data.len(),
            cube.len(),
            cube.height,
            cube.width
        )));
    }

    let time_values = cube.time_values()?;

    let mut file = netcdf::create(path)?;

    file.add_dimension("time", cube.len())?;
    file.add_dimension("lat", cube.height)?;
    file.add_dimension("lon", cube.width)?;

    file.add_attribute("Conventions", "CF-1.6")?;
    file.add_attribute("title", format!("Monthly {} cube", cube.variable))?;

    {
        let mut var = file.add_variable::<f64>("time", &["time"])?;
        var.put_attribute("units", "days since 1970-01-01")?;
        var.put_attribute("calendar", "proleptic_gregorian")?;
        var.put_attribute("standard_name", "time")?;
        var.put_values(&time_values, ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("lat", &["lat"])?;
        var.put_attribute("units", "degrees_north")?;
        var.put_attribute("standard_name", "latitude")?;
        var.put_values(&cube.lat, ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("lon", &["lon"])?;
        var.put_attribute("units", "degrees_east")?;
        var.put_attribute("standard_name", "longitude")?;
        var.put_values(&cube.lon, ..)?;
    }
    {
        let scalar: [&str; 0] = [];
        let mut var = file.add_variable::<i32>(CRS_VARIABLE, &scalar)?;
        for (name, value) in &cube.georeference.attributes {
            var.put_attribute(name, value.clone())?;
        }
        if !cube.georeference.attributes.iter().any(|(n, _)| n == "crs_wkt") {
            var.put_attribute("crs_wkt", cube.georeference.crs_wkt.as_str())?;
        }
        if !cube.georeference.attributes.iter().any(|(n, _)| n == "GeoTransform") {
            var.put_attribute("GeoTransform", cube.georeference.geotransform.to_string())?;
        }
    }
    {
        let mut var = file.add_variable::<f32>(&cube.variable, &["time", "lat", "lon"])?;
        var.put_attribute("_FillValue", f32::NAN)?;
        var.put_attribute("units", cube.units.as_str())?;
        var.put_attribute("grid_mapping", CRS_VARIABLE)?;
        var.put_values(&cube.data, ..)?;
    }

    Ok(())
}
