//! PRISM irrigation-year trend pipeline.
//!
//! The binary wires these commands to a CLI; they are exposed here so the
//! pipeline can be driven from tests.

pub mod commands;
pub mod config;

pub use commands::{
    run_cube, run_map, run_trends, run_water_year_files, CubeArgs, MapArgs, TrendsArgs,
    WaterYearArgs,
};
pub use config::{CubeSettings, MapSettings, PipelineConfig, TrendSettings};
