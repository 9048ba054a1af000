//! Locating monthly raster files on disk.

use std::path::{Path, PathBuf};

use prism_common::{WaterYear, YearMonth};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{CubeError, CubeResult};

/// List the `.nc` files directly inside `folder`, sorted lexicographically.
///
/// Subdirectories are not descended into. A missing folder yields an empty
/// list so callers report it the same way as an empty one.
pub fn discover_slices(folder: &Path) -> CubeResult<Vec<PathBuf>> {
    list_files(folder, |name| name.ends_with(".nc"))
}

/// Select monthly PRISM archives that fall inside a water year.
///
/// Files must be named `prism_{variable}_us_{resolution}_YYYYMM.zip`; those
/// whose month lies between October of `year - 1` and September of `year`
/// (inclusive) are returned in lexicographic order. Files that do not match
/// the pattern are ignored.
pub fn filter_monthly_files_for_water_year(
    folder: &Path,
    variable: &str,
    resolution: &str,
    year: i32,
) -> CubeResult<Vec<PathBuf>> {
    let prefix = format!("prism_{}_us_{}_", variable, resolution);
    let water_year = WaterYear(year);

    let candidates =
        list_files(folder, |name| name.starts_with(&prefix) && name.ends_with(".zip"))?;

    let selected: Vec<PathBuf> = candidates
        .into_iter()
        .filter(|path| {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                return false;
            };
            let token = &name[prefix.len()..name.len() - ".zip".len()];
            match YearMonth::from_token(token) {
                Ok(ym) => water_year.contains(ym),
                Err(_) => {
                    debug!(file = %name, "Skipping archive without YYYYMM token");
                    false
                }
            }
        })
        .collect();

    debug!(
        variable = variable,
        resolution = resolution,
        water_year = year,
        count = selected.len(),
        "Selected monthly archives"
    );

    Ok(selected)
}

fn list_files<F>(folder: &Path, matches: F) -> CubeResult<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    if !folder.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_str().map(&matches).unwrap_or(false) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Derive the slice timestamp from a `_YYYYMM` filename suffix.
pub fn slice_time(path: &Path) -> CubeResult<YearMonth> {
    YearMonth::from_filename(path).map_err(|e| CubeError::InvalidFilename {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_discover_sorts_and_filters_extension() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "prism_ppt_us_25m_202203.nc");
        touch(dir.path(), "prism_ppt_us_25m_202201.nc");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "prism_ppt_us_25m_202202.nc");
        fs::create_dir(dir.path().join("nested.nc")).unwrap();

        let files = discover_slices(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "prism_ppt_us_25m_202201.nc",
                "prism_ppt_us_25m_202202.nc",
                "prism_ppt_us_25m_202203.nc"
            ]
        );
    }

    #[test]
    fn test_discover_missing_folder_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = discover_slices(&dir.path().join("absent")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_water_year_filter() {
        let dir = tempfile::tempdir().unwrap();
        for token in ["201509", "201510", "201512", "201601", "201609", "201610"] {
            touch(dir.path(), &format!("prism_ppt_us_4km_{}.zip", token));
        }
        touch(dir.path(), "prism_tmean_us_4km_201511.zip");
        touch(dir.path(), "prism_ppt_us_800m_201511.zip");
        touch(dir.path(), "prism_ppt_us_4km_2015xx.zip");

        let files = filter_monthly_files_for_water_year(dir.path(), "ppt", "4km", 2016).unwrap();
        let tokens: Vec<_> = files
            .iter()
            .map(|p| slice_time(&p.with_extension("nc")).unwrap().token())
            .collect();
        assert_eq!(tokens, vec!["201510", "201512", "201601", "201609"]);
    }

    #[test]
    fn test_slice_time_rejects_bad_name() {
        let err = slice_time(Path::new("/tmp/band1.nc")).unwrap_err();
        assert!(matches!(err, CubeError::InvalidFilename { .. }));
    }
}
