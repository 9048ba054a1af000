//! Monotonic trend analysis of per-unit climate series.
//!
//! Records are grouped by spatial unit, ordered chronologically (by default
//! on the irrigation year derived from each record's date) and tested per
//! variable with the original Mann-Kendall test. Sen's slope is reported in
//! variable units per step of the sort key.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use trend_analysis::{analyze_trends, summarize_trends, AnalysisOptions, TimeSeriesRecord};
//!
//! let records: Vec<_> = (2001..2011)
//!     .map(|year| {
//!         TimeSeriesRecord::new("A", NaiveDate::from_ymd_opt(year, 3, 1))
//!             .with_value("ppt", year as f64)
//!     })
//!     .collect();
//!
//! let rows = analyze_trends(&records, &["ppt"], &AnalysisOptions::default());
//! let summary = summarize_trends(&rows, &["ppt"]);
//! assert_eq!(summary[0].increasing, 1);
//! ```

pub mod analyzer;
pub mod error;
pub mod mann_kendall;
pub mod outcome;
pub mod record;
pub mod summary;
pub mod table;

pub use analyzer::{analyze_trends, AnalysisOptions, UnitTrends, VariableTrend};
pub use error::{TrendError, TrendResult};
pub use mann_kendall::{is_valid_alpha, original_test, sens_slope, DEFAULT_ALPHA, MIN_OBSERVATIONS};
pub use outcome::{TrendDirection, TrendFailure, TrendOutcome, TrendStats};
pub use record::{SortKey, TimeSeriesRecord, CALENDAR_YEAR_COLUMN, IRR_YEAR_COLUMN, MONTH_COLUMN};
pub use summary::{summarize_trends, TrendSummary};
pub use table::{
    read_table, read_table_from, write_summary, write_trend_table, TableSchema, TimeSeriesTable,
    TrendColumns,
};
