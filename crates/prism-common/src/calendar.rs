//! Calendar handling for monthly climate data.
//!
//! Two accounting years are used across the toolkit:
//! - The irrigation year runs November through October and is labeled by the
//!   calendar year that contains its final ten months.
//! - The water year runs October through September and is labeled by the
//!   calendar year in which it ends. Monthly PRISM archives are selected by it.

use std::fmt;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// First month of the irrigation year.
pub const IRRIGATION_YEAR_START_MONTH: u32 = 11;

/// First month of the water year.
pub const WATER_YEAR_START_MONTH: u32 = 10;

/// Calendar labels derived from a single date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IrrigationLabels {
    /// Calendar month (1-12)
    pub month: u32,
    /// Calendar year of the date
    pub calendar_year: i32,
    /// Irrigation year the date belongs to
    pub irrigation_year: i32,
}

/// Label a date with (month, calendar year, irrigation year).
///
/// November and December belong to the next irrigation year, so
/// 2022-11-15 is labeled 2023 while 2023-03-10 is also 2023.
pub fn irrigation_labels(date: NaiveDate) -> IrrigationLabels {
    let month = date.month();
    let calendar_year = date.year();
    let irrigation_year = if month >= IRRIGATION_YEAR_START_MONTH {
        calendar_year + 1
    } else {
        calendar_year
    };

    IrrigationLabels {
        month,
        calendar_year,
        irrigation_year,
    }
}

/// An irrigation year label (November of the previous year through October).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IrrigationYear(pub i32);

impl IrrigationYear {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(irrigation_labels(date).irrigation_year)
    }

    /// First day of the irrigation year (November 1 of the previous year).
    pub fn start(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0 - 1, IRRIGATION_YEAR_START_MONTH, 1)
    }

    /// Last day of the irrigation year (October 31).
    pub fn end(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0, IRRIGATION_YEAR_START_MONTH - 1, 31)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::from_date(date) == *self
    }
}

impl fmt::Display for IrrigationYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IY{}", self.0)
    }
}

/// A water year label (October of the previous year through September).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WaterYear(pub i32);

impl WaterYear {
    /// First month of the water year.
    pub fn first_month(&self) -> YearMonth {
        YearMonth {
            year: self.0 - 1,
            month: WATER_YEAR_START_MONTH,
        }
    }

    /// Last month of the water year.
    pub fn last_month(&self) -> YearMonth {
        YearMonth {
            year: self.0,
            month: WATER_YEAR_START_MONTH - 1,
        }
    }

    pub fn contains(&self, ym: YearMonth) -> bool {
        ym >= self.first_month() && ym <= self.last_month()
    }

    /// The twelve months of the water year in order.
    pub fn months(&self) -> Vec<YearMonth> {
        let mut months = Vec::with_capacity(12);
        let mut current = self.first_month();
        for _ in 0..12 {
            months.push(current);
            current = current.next();
        }
        months
    }
}

/// A calendar month identified by year and month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> CommonResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(CommonError::InvalidYearMonth(format!("{:04}{:02}", year, month)));
        }
        Ok(Self { year, month })
    }

    /// Parse a six-digit `YYYYMM` token.
    pub fn from_token(token: &str) -> CommonResult<Self> {
        if token.len() != 6 || !token.chars().all(|c| c.is_ascii_digit()) {
            return Err(CommonError::InvalidYearMonth(token.to_string()));
        }
        let year: i32 = token[0..4]
            .parse()
            .map_err(|_| CommonError::InvalidYearMonth(token.to_string()))?;
        let month: u32 = token[4..6]
            .parse()
            .map_err(|_| CommonError::InvalidYearMonth(token.to_string()))?;
        Self::new(year, month).map_err(|_| CommonError::InvalidYearMonth(token.to_string()))
    }

    /// Extract the trailing `_YYYYMM` token from a filename such as
    /// `prism_ppt_us_25m_202201.nc`.
    pub fn from_filename<P: AsRef<Path>>(path: P) -> CommonResult<Self> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| CommonError::InvalidYearMonth(path.display().to_string()))?;

        let token = stem.rsplit('_').next().unwrap_or(stem);
        Self::from_token(token)
    }

    /// First day of the month.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Days from 1970-01-01 to the first day of the month.
    pub fn days_since_epoch(&self) -> Option<i64> {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
        Some((self.first_day()? - epoch).num_days())
    }

    pub fn token(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
