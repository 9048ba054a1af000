//! Monthly raster cube assembly.
//!
//! PRISM monthly grids arrive as one NetCDF file per month, each holding a
//! 2-D `Band1` grid and a `crs` grid-mapping variable with `crs_wkt` and a
//! GDAL `GeoTransform`. This crate stacks those slices along a time axis
//! derived from the `_YYYYMM` filename suffix and writes a single cube file.

pub mod cube;
pub mod discover;
pub mod error;
pub mod slice;
pub mod writer;

use std::path::Path;

use tracing::info;

pub use cube::{RasterCube, DEFAULT_UNITS};
pub use discover::{discover_slices, filter_monthly_files_for_water_year, slice_time};
pub use error::{CubeError, CubeResult};
pub use slice::{
    read_slice, silence_hdf5_errors, Georeference, RasterSlice, BAND_VARIABLE, CRS_VARIABLE,
};
pub use writer::write_cube;

/// Combine every `.nc` slice in `folder` into one cube written to `output`.
///
/// Slices are taken in lexicographic filename order. Returns the assembled
/// cube. Nothing is written when no slices exist or the first slice lacks
/// georeferencing.
pub fn combine_monthly_to_cube(
    folder: &Path,
    output: &Path,
    variable: &str,
    units: &str,
) -> CubeResult<RasterCube> {
    let files = discover_slices(folder)?;
    if files.is_empty() {
        return Err(CubeError::NoInput(folder.to_path_buf()));
    }

    info!(folder = %folder.display(), files = files.len(), "Combining monthly slices");

    let first = read_slice(&files[0])?;
    if first.georeference.is_none() {
        return Err(CubeError::MissingGeoreference {
            path: first.path,
            detail: "crs variable needs crs_wkt and GeoTransform attributes".to_string(),
        });
    }

    let mut slices = Vec::with_capacity(files.len());
    slices.push(first);
    for path in &files[1..] {
        slices.push(read_slice(path)?);
    }

    let cube = RasterCube::assemble(variable, units, slices)?;
    write_cube(&cube, output)?;
    Ok(cube)
}
