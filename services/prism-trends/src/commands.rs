//! Subcommand implementations.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use prism_common::CrsCode;
use raster_cube::{
    combine_monthly_to_cube, filter_monthly_files_for_water_year, silence_hdf5_errors, RasterCube,
};
use renderer::{render_map, HttpTileSource, RenderedMap, SpatialLayer, TileSource};
use tracing::{info, warn};
use trend_analysis::{
    analyze_trends, read_table, summarize_trends, write_summary, write_trend_table, TableSchema,
    TrendColumns, TrendSummary,
};

use crate::config::PipelineConfig;

/// Stack monthly NetCDF slices into one cube file.
#[derive(Debug, Clone, Args)]
pub struct CubeArgs {
    /// Folder of `*_YYYYMM.nc` slices
    #[arg(short, long)]
    pub input: PathBuf,

    /// Cube file to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Name of the stacked variable
    #[arg(long, default_value = "ppt")]
    pub variable: String,

    /// Unit tag (overrides config)
    #[arg(long)]
    pub units: Option<String>,
}

pub fn run_cube(args: &CubeArgs, config: &PipelineConfig) -> Result<RasterCube> {
    silence_hdf5_errors();

    let units = args.units.as_deref().unwrap_or(&config.cube.units);
    let cube = combine_monthly_to_cube(&args.input, &args.output, &args.variable, units)
        .with_context(|| format!("Failed to build cube from {}", args.input.display()))?;

    info!(
        output = %args.output.display(),
        variable = %cube.variable,
        times = cube.len(),
        height = cube.height,
        width = cube.width,
        "Cube written"
    );
    Ok(cube)
}

/// List monthly archives belonging to one water year.
#[derive(Debug, Clone, Args)]
pub struct WaterYearArgs {
    /// Folder of `prism_{var}_us_{res}_YYYYMM.zip` archives
    #[arg(short, long)]
    pub folder: PathBuf,

    #[arg(long, default_value = "ppt")]
    pub variable: String,

    #[arg(long, default_value = "4kmM")]
    pub resolution: String,

    /// Water year (October of the previous year through September)
    #[arg(short, long)]
    pub year: i32,
}

pub fn run_water_year_files(args: &WaterYearArgs) -> Result<Vec<PathBuf>> {
    let files = filter_monthly_files_for_water_year(
        &args.folder,
        &args.variable,
        &args.resolution,
        args.year,
    )
    .with_context(|| format!("Failed to list {}", args.folder.display()))?;
    info!(year = args.year, files = files.len(), "Selected water-year files");
    Ok(files)
}

/// Per-unit trend table and label summary from a CSV time series.
#[derive(Debug, Clone, Args)]
pub struct TrendsArgs {
    /// Input CSV with one row per unit and date
    #[arg(short, long)]
    pub input: PathBuf,

    /// Trend table CSV to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Label summary CSV to write
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Variables to test (comma separated; overrides config)
    #[arg(long, value_delimiter = ',')]
    pub variables: Vec<String>,

    #[arg(long)]
    pub unit_column: Option<String>,

    #[arg(long)]
    pub date_column: Option<String>,

    /// Input has no date column; sort on an existing numeric column instead
    #[arg(long)]
    pub no_date: bool,

    /// `irr_year`, `year`, `Date` or a numeric column
    #[arg(long)]
    pub sort_key: Option<String>,

    #[arg(long)]
    pub alpha: Option<f64>,

    /// Export intercept, tau, S, var(S), z and n as well
    #[arg(long)]
    pub full: bool,
}

pub fn run_trends(args: &TrendsArgs, config: &PipelineConfig) -> Result<Vec<TrendSummary>> {
    let mut settings = config.trends.clone();
    if let Some(c) = &args.unit_column {
        settings.unit_column = c.clone();
    }
    if let Some(c) = &args.date_column {
        settings.date_column = Some(c.clone());
    }
    if args.no_date {
        settings.date_column = None;
    }
    if let Some(k) = &args.sort_key {
        settings.sort_key = k.clone();
    }
    if let Some(a) = args.alpha {
        settings.alpha = a;
    }
    if !args.variables.is_empty() {
        settings.variables = args.variables.clone();
    }
    if settings.variables.is_empty() {
        bail!("No variables to analyze; pass --variables or set trends.variables");
    }
    settings.validate()?;

    let table = read_table(&args.input, &settings.schema())
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    table
        .require_columns(&settings.variables)
        .with_context(|| format!("Input {} lacks a requested variable", args.input.display()))?;

    let options = settings.options();
    info!(
        units_column = %settings.unit_column,
        sort_key = %options.sort_key,
        variables = ?settings.variables,
        "Analyzing trends"
    );
    let rows = analyze_trends(&table.records, &settings.variables, &options);

    let columns = if args.full || settings.full_columns {
        TrendColumns::Full
    } else {
        TrendColumns::Basic
    };
    write_trend_table(
        create_file(&args.output)?,
        &settings.unit_column,
        &rows,
        &settings.variables,
        columns,
    )
    .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!(path = %args.output.display(), units = rows.len(), "Trend table written");

    let summaries = summarize_trends(&rows, &settings.variables);
    for s in &summaries {
        info!(
            variable = %s.variable,
            increasing = s.increasing,
            decreasing = s.decreasing,
            no_trend = s.no_trend,
            "Trend summary"
        );
    }

    if let Some(path) = &args.summary {
        write_summary(create_file(path)?, &summaries)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Summary written");
    }

    Ok(summaries)
}

/// Choropleth of a layer attribute, optionally with significance overlays.
#[derive(Debug, Clone, Args)]
pub struct MapArgs {
    /// GeoJSON polygon layer
    #[arg(short, long)]
    pub layer: PathBuf,

    /// CRS of the layer coordinates
    #[arg(long, default_value = "EPSG:4326")]
    pub crs: String,

    /// Numeric column to color by
    #[arg(short, long)]
    pub column: String,

    /// P-value column; enables significance overlays
    #[arg(short, long)]
    pub p_column: Option<String>,

    /// Trend table to join onto the layer before drawing
    #[arg(long)]
    pub table: Option<PathBuf>,

    /// Feature property matched against the table's unit column
    #[arg(long)]
    pub key: Option<String>,

    /// PNG to write
    #[arg(short, long)]
    pub output: PathBuf,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub colorbar_label: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    pub vmin: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub vmax: Option<f64>,

    #[arg(long)]
    pub cmap: Option<String>,

    /// Center the colormap on zero (true/false)
    #[arg(long)]
    pub center_zero: Option<bool>,

    /// Hatch features that are not significant
    #[arg(long)]
    pub hatch: bool,

    /// Star marker on significant features
    #[arg(long)]
    pub marker: bool,

    /// No bold border on significant features
    #[arg(long)]
    pub no_border: bool,

    /// Draw web tiles beneath the layer
    #[arg(long)]
    pub basemap: bool,

    #[arg(long)]
    pub dpi: Option<u32>,
}

pub fn run_map(args: &MapArgs, config: &PipelineConfig) -> Result<RenderedMap> {
    let crs = CrsCode::from_code_string(&args.crs)?;
    let mut layer = SpatialLayer::from_geojson_file(&args.layer, crs)
        .with_context(|| format!("Failed to load layer {}", args.layer.display()))?;

    if let Some(table_path) = &args.table {
        let key = args.key.clone().unwrap_or_else(|| config.trends.unit_column.clone());
        let schema = TableSchema {
            unit_column: key.clone(),
            date_column: None,
        };
        let table = read_table(table_path, &schema)
            .with_context(|| format!("Failed to read {}", table_path.display()))?;

        let matched = layer.join_attributes(&key, &table.values_by_unit());
        if matched == 0 {
            warn!(key = %key, table = %table_path.display(), "No layer feature matched the table");
        }
        info!(key = %key, matched = matched, features = layer.len(), "Joined table onto layer");
    }

    let mut settings = config.map.clone();
    if let Some(cmap) = &args.cmap {
        settings.cmap = Some(cmap.clone());
    }
    if let Some(center_zero) = args.center_zero {
        settings.center_zero = Some(center_zero);
    }
    if let Some(dpi) = args.dpi {
        settings.dpi = dpi;
    }
    settings.hatch_non_significant |= args.hatch;
    settings.show_marker |= args.marker;
    settings.show_border &= !args.no_border;
    settings.basemap |= args.basemap;

    let mut map_config = settings.map_config(&args.column, args.p_column.as_deref());
    if args.title.is_some() {
        map_config.title = args.title.clone();
    }
    if args.colorbar_label.is_some() {
        map_config.colorbar_label = args.colorbar_label.clone();
    }
    map_config.vmin = args.vmin;
    map_config.vmax = args.vmax;

    let source = if settings.basemap {
        Some(HttpTileSource::new(settings.basemap_url.clone())?)
    } else {
        None
    };
    let map = render_map(&layer, &map_config, source.as_ref().map(|s| s as &dyn TileSource))?;

    map.save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    Ok(map)
}

fn create_file(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}
