//! Locating optional real-data test files.
//!
//! Real PRISM slices are large and not committed. Tests that want one call
//! `require_test_file!` and skip when it is absent.

use std::path::PathBuf;

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Returns `crates/{crate_name}/testdata/`.
pub fn crate_testdata_dir(crate_name: &str) -> PathBuf {
    workspace_root()
        .join("crates")
        .join(crate_name)
        .join("testdata")
}

/// Searches for a test file in multiple locations.
///
/// Checked in order:
/// 1. Environment variable `TEST_DATA_DIR` (if set)
/// 2. `crates/raster-cube/testdata/`
/// 3. `crates/trend-analysis/testdata/`
/// 4. workspace-level `testdata/`
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(test_data_dir) = std::env::var("TEST_DATA_DIR") {
        candidates.push(PathBuf::from(test_data_dir).join(name));
    }

    let root = workspace_root();
    candidates.extend([
        crate_testdata_dir("raster-cube").join(name),
        crate_testdata_dir("trend-analysis").join(name),
        root.join("testdata").join(name),
    ]);

    candidates.into_iter().find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_is_valid() {
        let root = workspace_root();
        assert!(
            root.join("Cargo.toml").exists(),
            "Workspace root should contain Cargo.toml: {:?}",
            root
        );
    }

    #[test]
    fn test_crate_testdata_dir() {
        let dir = crate_testdata_dir("raster-cube");
        assert!(dir.to_string_lossy().contains("raster-cube"));
        assert!(dir.ends_with("testdata"));
    }

    #[test]
    fn test_missing_file_is_none() {
        assert!(find_test_file("definitely_not_here_197001.nc").is_none());
    }
}
