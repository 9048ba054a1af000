//! Time series records and chronological sort keys.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use prism_common::{irrigation_labels, IrrigationLabels};
use serde::{Deserialize, Serialize};

/// Column name of the derived irrigation year.
pub const IRR_YEAR_COLUMN: &str = "irr_year";

/// Column name of the derived calendar year.
pub const CALENDAR_YEAR_COLUMN: &str = "year";

/// Column name of the derived calendar month.
pub const MONTH_COLUMN: &str = "month";

/// One observation of one spatial unit.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRecord {
    /// Spatial-unit identifier (for example a HUC12 code)
    pub unit: String,
    pub date: Option<NaiveDate>,
    /// Numeric columns; missing cells are NaN
    pub values: BTreeMap<String, f64>,
}

impl TimeSeriesRecord {
    pub fn new(unit: impl Into<String>, date: Option<NaiveDate>) -> Self {
        Self {
            unit: unit.into(),
            date,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Value of a numeric column, NaN when absent.
    pub fn value(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(f64::NAN)
    }

    /// Calendar labels, recomputed from the date.
    pub fn labels(&self) -> Option<IrrigationLabels> {
        self.date.map(irrigation_labels)
    }

    pub fn month(&self) -> Option<u32> {
        self.labels().map(|l| l.month)
    }

    pub fn calendar_year(&self) -> Option<i32> {
        self.labels().map(|l| l.calendar_year)
    }

    /// Irrigation year from the date, or from an `irr_year` column when the
    /// record has no date.
    pub fn irrigation_year(&self) -> Option<i32> {
        self.labels().map(|l| l.irrigation_year).or_else(|| {
            self.values
                .get(IRR_YEAR_COLUMN)
                .filter(|v| v.is_finite())
                .map(|v| *v as i32)
        })
    }

    /// Sort value under `key`; `None` when the key cannot be resolved.
    pub fn sort_value(&self, key: &SortKey) -> Option<f64> {
        match key {
            SortKey::IrrigationYear => self.irrigation_year().map(f64::from),
            SortKey::CalendarYear => self.calendar_year().map(f64::from).or_else(|| {
                self.values
                    .get(CALENDAR_YEAR_COLUMN)
                    .copied()
                    .filter(|v| v.is_finite())
            }),
            SortKey::Date => self.date.map(|d| f64::from(d.num_days_from_ce())),
            SortKey::Column(name) => self.values.get(name).copied().filter(|v| !v.is_nan()),
        }
    }
}

/// Chronological ordering applied within each spatial unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Derived irrigation year (November through October)
    #[default]
    IrrigationYear,
    /// Derived calendar year
    CalendarYear,
    /// The record date itself
    Date,
    /// Any numeric column of the table
    Column(String),
}

impl SortKey {
    /// Map a column name to a key: derived names select derived labels.
    pub fn from_column_name(name: &str) -> Self {
        match name {
            IRR_YEAR_COLUMN => SortKey::IrrigationYear,
            CALENDAR_YEAR_COLUMN => SortKey::CalendarYear,
            "date" | "Date" => SortKey::Date,
            other => SortKey::Column(other.to_string()),
        }
    }

    /// Compare two records. Records without a key sort after those with one.
    pub fn compare(&self, a: &TimeSeriesRecord, b: &TimeSeriesRecord) -> Ordering {
        match (a.sort_value(self), b.sort_value(self)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::IrrigationYear => f.write_str(IRR_YEAR_COLUMN),
            SortKey::CalendarYear => f.write_str(CALENDAR_YEAR_COLUMN),
            SortKey::Date => f.write_str("date"),
            SortKey::Column(name) => f.write_str(name),
        }
    }
}
