//! End-to-end cube assembly against synthetic NetCDF slices.

use std::fs;

use netcdf::AttributeValue;
use prism_common::YearMonth;
use raster_cube::{combine_monthly_to_cube, read_slice, CubeError, DEFAULT_UNITS};
use test_utils::{
    assert_approx_eq, grid, require_test_file, write_band1_slice, SyntheticSlice, PRISM_CRS_WKT,
    WGS84_CRS_WKT,
};

fn string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

#[test]
fn test_slices_written_out_of_order_stack_chronologically() {
    let input = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("nested/cubes/ppt_2022.nc");

    write_band1_slice(input.path(), "ppt", "202203", 4, 3, 300.0).unwrap();
    write_band1_slice(input.path(), "ppt", "202201", 4, 3, 100.0).unwrap();
    write_band1_slice(input.path(), "ppt", "202202", 4, 3, 200.0).unwrap();

    let cube = combine_monthly_to_cube(input.path(), &output, "ppt", DEFAULT_UNITS).unwrap();

    assert_eq!(
        cube.times,
        vec![
            YearMonth::new(2022, 1).unwrap(),
            YearMonth::new(2022, 2).unwrap(),
            YearMonth::new(2022, 3).unwrap(),
        ]
    );
    assert_eq!((cube.height, cube.width), (3, 4));
    assert_eq!(cube.value(0, 0, 0), Some(100.0));
    assert_eq!(cube.value(2, 2, 3), Some(311.0));
    assert_eq!(cube.georeference.crs_wkt, PRISM_CRS_WKT);
    assert!(output.exists(), "parent directories should be created");
}

#[test]
fn test_written_cube_layout() {
    let input = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("ppt_cube.nc");

    write_band1_slice(input.path(), "ppt", "202201", 3, 2, 1.0).unwrap();
    write_band1_slice(input.path(), "ppt", "202202", 3, 2, 2.0).unwrap();

    combine_monthly_to_cube(input.path(), &output, "ppt", DEFAULT_UNITS).unwrap();

    let file = netcdf::open(&output).unwrap();
    let var = file.variable("ppt").expect("stacked variable");
    let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
    assert_eq!(dims, vec!["time", "lat", "lon"]);
    assert_eq!(string_attr(&var, "units").as_deref(), Some("mm"));
    assert_eq!(string_attr(&var, "grid_mapping").as_deref(), Some("crs"));

    let crs = file.variable("crs").expect("crs variable");
    assert_eq!(string_attr(&crs, "crs_wkt").as_deref(), Some(PRISM_CRS_WKT));
    assert_eq!(string_attr(&crs, "GeoTransform").as_deref(), Some(grid::GEOTRANSFORM));

    let time: Vec<f64> = file.variable("time").unwrap().get_values(..).unwrap();
    assert_eq!(time, vec![18993.0, 19024.0]);

    let lon: Vec<f64> = file.variable("lon").unwrap().get_values(..).unwrap();
    assert_approx_eq!(lon[0], -124.75, 1e-9);

    let values: Vec<f32> = var.get_values(..).unwrap();
    assert_eq!(values.len(), 12);
    assert_eq!(values[6], 2.0);
}

#[test]
fn test_empty_folder_is_no_input_and_writes_nothing() {
    let input = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("cube.nc");

    fs::write(input.path().join("readme.txt"), b"not a raster").unwrap();

    let err = combine_monthly_to_cube(input.path(), &output, "ppt", DEFAULT_UNITS).unwrap_err();
    assert!(matches!(err, CubeError::NoInput(_)));
    assert!(!output.exists());
}

#[test]
fn test_first_slice_without_georeference_fails() {
    let input = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("cube.nc");

    let data = vec![1.0f32; 4];
    SyntheticSlice::prism(2, 2, &data)
        .without_georeference()
        .write(&input.path().join("prism_ppt_us_25m_202201.nc"))
        .unwrap();
    write_band1_slice(input.path(), "ppt", "202202", 2, 2, 1.0).unwrap();

    let err = combine_monthly_to_cube(input.path(), &output, "ppt", DEFAULT_UNITS).unwrap_err();
    assert!(matches!(err, CubeError::MissingGeoreference { .. }));
    assert!(!output.exists());
}

#[test]
fn test_missing_georeference_reported_before_later_files_are_read() {
    let input = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("cube.nc");

    let data = vec![1.0f32; 4];
    SyntheticSlice::prism(2, 2, &data)
        .without_georeference()
        .write(&input.path().join("prism_ppt_us_25m_202201.nc"))
        .unwrap();
    fs::write(input.path().join("prism_ppt_us_25m_202202.nc"), b"not a netcdf file").unwrap();

    let err = combine_monthly_to_cube(input.path(), &output, "ppt", DEFAULT_UNITS).unwrap_err();
    assert!(matches!(err, CubeError::MissingGeoreference { .. }), "got {:?}", err);
    assert!(!output.exists());
}

#[test]
fn test_later_crs_mismatch_keeps_first_georeference() {
    let input = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("cube.nc");

    write_band1_slice(input.path(), "ppt", "202201", 2, 2, 1.0).unwrap();
    let data = vec![5.0f32; 4];
    SyntheticSlice::prism(2, 2, &data)
        .with_crs_wkt(WGS84_CRS_WKT)
        .write(&input.path().join("prism_ppt_us_25m_202202.nc"))
        .unwrap();

    let cube = combine_monthly_to_cube(input.path(), &output, "ppt", DEFAULT_UNITS).unwrap();
    assert_eq!(cube.len(), 2);
    assert_eq!(cube.georeference.crs_wkt, PRISM_CRS_WKT);
}

#[test]
fn test_shape_mismatch_fails() {
    let input = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("cube.nc");

    write_band1_slice(input.path(), "ppt", "202201", 2, 2, 1.0).unwrap();
    write_band1_slice(input.path(), "ppt", "202202", 3, 2, 1.0).unwrap();

    let err = combine_monthly_to_cube(input.path(), &output, "ppt", DEFAULT_UNITS).unwrap_err();
    assert!(matches!(err, CubeError::ShapeMismatch { .. }));
    assert!(!output.exists());
}

#[test]
fn test_fill_values_become_nan() {
    let input = tempfile::tempdir().unwrap();
    let path = input.path().join("prism_ppt_us_25m_202207.nc");
    let data = vec![1.0, -9999.0, 3.0, 4.0];
    SyntheticSlice::prism(2, 2, &data).write(&path).unwrap();

    let slice = read_slice(&path).unwrap();
    assert_eq!(slice.time, YearMonth::new(2022, 7).unwrap());
    assert!(slice.data[1].is_nan());
    assert_eq!(slice.data[3], 4.0);
    assert_eq!(slice.lat.as_deref(), Some(&grid::lat_centers(2)[..]));
}

#[test]
fn test_real_prism_slice() {
    let path = require_test_file!("prism_ppt_us_25m_202201.nc");
    let slice = read_slice(&path).unwrap();
    assert!(slice.georeference.is_some());
    assert!(slice.width > 0 && slice.height > 0);
}
