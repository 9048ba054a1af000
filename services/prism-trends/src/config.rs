//! Pipeline configuration loaded from YAML.
//!
//! Every section and field has a default, so an empty file (or no file) is a
//! valid configuration. Command-line flags override file values.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use renderer::{MapConfig, SignificanceConfig, CARTO_POSITRON_URL};
use serde::Deserialize;
use tracing::debug;
use trend_analysis::{is_valid_alpha, AnalysisOptions, SortKey, TableSchema, DEFAULT_ALPHA};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cube: CubeSettings,
    pub trends: TrendSettings,
    pub map: MapSettings,
}

/// Cube assembly settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CubeSettings {
    /// Unit tag written on the stacked variable
    pub units: String,
}

impl Default for CubeSettings {
    fn default() -> Self {
        Self {
            units: raster_cube::DEFAULT_UNITS.to_string(),
        }
    }
}

/// Trend table settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrendSettings {
    pub unit_column: String,
    /// Column holding each row's date; `None` when the table has no dates
    pub date_column: Option<String>,
    /// `irr_year` (default), `year`, `Date` or any numeric column
    pub sort_key: String,
    pub variables: Vec<String>,
    pub alpha: f64,
    /// Also export intercept, tau, S, var(S), z and n
    pub full_columns: bool,
}

impl Default for TrendSettings {
    fn default() -> Self {
        let schema = TableSchema::default();
        Self {
            unit_column: schema.unit_column,
            date_column: schema.date_column,
            sort_key: trend_analysis::IRR_YEAR_COLUMN.to_string(),
            variables: Vec::new(),
            alpha: DEFAULT_ALPHA,
            full_columns: false,
        }
    }
}

impl TrendSettings {
    pub fn schema(&self) -> TableSchema {
        TableSchema {
            unit_column: self.unit_column.clone(),
            date_column: self.date_column.clone(),
        }
    }

    /// Reject settings the trend test cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_alpha(self.alpha) {
            bail!("Significance level alpha must be between 0 and 1, got {}", self.alpha);
        }
        Ok(())
    }

    pub fn options(&self) -> AnalysisOptions {
        AnalysisOptions {
            sort_key: SortKey::from_column_name(&self.sort_key),
            alpha: self.alpha,
        }
    }
}

/// Map figure settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Colormap; `RdBu` for trend maps and `Blues` for attribute maps when unset
    pub cmap: Option<String>,
    /// Defaults to true for trend maps and false for attribute maps
    pub center_zero: Option<bool>,
    pub significance_level: f64,
    pub hatch_non_significant: bool,
    pub show_border: bool,
    pub show_marker: bool,
    /// Figure size (inches); 12 x 8 for trend maps, 12 x 10 for attribute maps
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub dpi: u32,
    pub basemap: bool,
    /// `{z}/{x}/{y}` tile URL template
    pub basemap_url: String,
    pub font_path: Option<PathBuf>,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            cmap: None,
            center_zero: None,
            significance_level: 0.05,
            hatch_non_significant: false,
            show_border: true,
            show_marker: false,
            width: None,
            height: None,
            dpi: 300,
            basemap: false,
            basemap_url: CARTO_POSITRON_URL.to_string(),
            font_path: None,
        }
    }
}

impl MapSettings {
    /// Figure configuration for `column`, with significance overlays when a
    /// p-value column is given.
    pub fn map_config(&self, column: &str, p_column: Option<&str>) -> MapConfig {
        let mut config = match p_column {
            Some(p) => MapConfig::trend_map(column, p),
            None => MapConfig::attribute_map(column),
        };

        if let Some(cmap) = &self.cmap {
            config.cmap = cmap.clone();
        }
        if let Some(center_zero) = self.center_zero {
            config.center_zero = center_zero;
        }
        if let Some(width) = self.width {
            config.width_in = width;
        }
        if let Some(height) = self.height {
            config.height_in = height;
        }
        config.dpi = self.dpi;
        config.font_path = self.font_path.clone();

        if let Some(p) = p_column {
            config.significance = Some(SignificanceConfig {
                column: p.to_string(),
                level: self.significance_level,
                hatch_non_significant: self.hatch_non_significant,
                show_border: self.show_border,
                show_marker: self.show_marker,
            });
        }
        config
    }
}

impl PipelineConfig {
    /// Load from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "Loaded pipeline config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
