//! CSV input and output for record tables, trend tables and summaries.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::analyzer::UnitTrends;
use crate::error::{TrendError, TrendResult};
use crate::outcome::TrendOutcome;
use crate::record::TimeSeriesRecord;
use crate::summary::TrendSummary;

/// Which columns identify units and dates in an input table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub unit_column: String,
    /// When set, each row's date is parsed from this column
    pub date_column: Option<String>,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            unit_column: "huc12".to_string(),
            date_column: Some("Date".to_string()),
        }
    }
}

/// Records read from a CSV file, with the header kept for validation.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesTable {
    pub columns: Vec<String>,
    pub records: Vec<TimeSeriesRecord>,
}

impl TimeSeriesTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Fail if any of `names` is not a column of the table.
    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> TrendResult<()> {
        match names.iter().find(|n| !self.has_column(n.as_ref())) {
            Some(missing) => Err(TrendError::MissingColumn(missing.as_ref().to_string())),
            None => Ok(()),
        }
    }

    /// Numeric columns of each unit, last row per unit winning.
    pub fn values_by_unit(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        self.records
            .iter()
            .map(|r| (r.unit.clone(), r.values.clone()))
            .collect()
    }
}

/// Read a table from a CSV file.
pub fn read_table(path: &Path, schema: &TableSchema) -> TrendResult<TimeSeriesTable> {
    let reader = csv::Reader::from_path(path)?;
    let table = read_table_from(reader, schema)?;
    info!(path = %path.display(), rows = table.records.len(), "Read table");
    Ok(table)
}

/// Read a table from any CSV reader.
///
/// Every column other than the unit and date columns is parsed as a number.
/// Empty cells become NaN, as do cells that do not parse.
pub fn read_table_from<R: io::Read>(
    mut reader: csv::Reader<R>,
    schema: &TableSchema,
) -> TrendResult<TimeSeriesTable> {
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let unit_idx = columns
        .iter()
        .position(|c| *c == schema.unit_column)
        .ok_or_else(|| TrendError::MissingColumn(schema.unit_column.clone()))?;

    let date_idx = match &schema.date_column {
        Some(name) => Some(
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| TrendError::MissingColumn(name.clone()))?,
        ),
        None => None,
    };

    let mut records = Vec::new();
    let mut unparsed = 0usize;
    let mut unlabeled = 0usize;

    for row in reader.records() {
        let row = row?;
        let unit = row.get(unit_idx).unwrap_or_default().trim().to_string();
        if unit.is_empty() {
            unlabeled += 1;
            continue;
        }

        let date = match date_idx.and_then(|i| row.get(i)) {
            Some(cell) => {
                let parsed = parse_date(cell);
                if parsed.is_none() && !cell.trim().is_empty() {
                    warn!(unit = %unit, value = cell, "Unparseable date");
                }
                parsed
            }
            None => None,
        };

        let mut record = TimeSeriesRecord::new(unit, date);
        for (idx, cell) in row.iter().enumerate() {
            if idx == unit_idx || Some(idx) == date_idx {
                continue;
            }
            let cell = cell.trim();
            let value = if cell.is_empty() {
                f64::NAN
            } else {
                cell.parse::<f64>().unwrap_or_else(|_| {
                    unparsed += 1;
                    f64::NAN
                })
            };
            record.values.insert(columns[idx].clone(), value);
        }
        records.push(record);
    }

    if unparsed > 0 {
        debug!(cells = unparsed, "Non-numeric cells read as missing");
    }
    if unlabeled > 0 {
        debug!(rows = unlabeled, column = %schema.unit_column, "Rows without a unit id skipped");
    }

    Ok(TimeSeriesTable { columns, records })
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(cell, "%m/%d/%Y"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(cell, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(cell, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .map(|dt| dt.date())
        })
}

/// Column layout of an exported trend table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendColumns {
    /// `{var}_slope`, `{var}_p`, `{var}_trend`
    #[default]
    Basic,
    /// Basic plus intercept, tau, S, var(S), z and n
    Full,
}

/// Write one row per unit. Unset outcomes produce empty cells.
pub fn write_trend_table<W: io::Write, S: AsRef<str>>(
    writer: W,
    unit_column: &str,
    rows: &[UnitTrends],
    variables: &[S],
    columns: TrendColumns,
) -> TrendResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec![unit_column.to_string()];
    for variable in variables {
        let v = variable.as_ref();
        header.extend([format!("{}_slope", v), format!("{}_p", v), format!("{}_trend", v)]);
        if columns == TrendColumns::Full {
            header.extend([
                format!("{}_intercept", v),
                format!("{}_tau", v),
                format!("{}_s", v),
                format!("{}_var_s", v),
                format!("{}_z", v),
                format!("{}_n", v),
            ]);
        }
    }
    wtr.write_record(&header)?;

    let width = match columns {
        TrendColumns::Basic => 3,
        TrendColumns::Full => 9,
    };

    for row in rows {
        let mut record = vec![row.unit.clone()];
        for variable in variables {
            match row.get(variable.as_ref()).and_then(TrendOutcome::stats) {
                Some(s) => {
                    record.extend([s.slope.to_string(), s.p.to_string(), s.trend.to_string()]);
                    if columns == TrendColumns::Full {
                        record.extend([
                            s.intercept.to_string(),
                            s.tau.to_string(),
                            s.s.to_string(),
                            s.var_s.to_string(),
                            s.z.to_string(),
                            s.n.to_string(),
                        ]);
                    }
                }
                None => record.extend(std::iter::repeat(String::new()).take(width)),
            }
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write `Variable,Increasing,Decreasing,No Trend` rows.
pub fn write_summary<W: io::Write>(writer: W, summaries: &[TrendSummary]) -> TrendResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Variable", "Increasing", "Decreasing", "No Trend"])?;
    for s in summaries {
        wtr.write_record([
            s.variable.clone(),
            s.increasing.to_string(),
            s.decreasing.to_string(),
            s.no_trend.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::VariableTrend;
    use crate::outcome::{TrendDirection, TrendFailure, TrendStats};

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::Reader::from_reader(data.as_bytes())
    }

    #[test]
    fn test_read_table_parses_dates_and_missing() {
        let data = "huc12,Date,ppt,et\n\
                    101,2022-11-15,12.5,\n\
                    101,2023-03-10,n/a,3.0\n";
        let table = read_table_from(reader(data), &TableSchema::default()).unwrap();
        assert_eq!(table.records.len(), 2);

        let first = &table.records[0];
        assert_eq!(first.unit, "101");
        assert_eq!(first.irrigation_year(), Some(2023));
        assert_eq!(first.value("ppt"), 12.5);
        assert!(first.value("et").is_nan());
        assert!(table.records[1].value("ppt").is_nan());
        assert!(!first.values.contains_key("Date"));
    }

    #[test]
    fn test_rows_without_unit_are_skipped() {
        let data = "huc12,Date,ppt\n\
                    101,2022-11-15,1.0\n\
                    ,2022-12-15,2.0\n\
                    \x20,2023-01-15,3.0\n";
        let table = read_table_from(reader(data), &TableSchema::default()).unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].unit, "101");
    }

    #[test]
    fn test_missing_unit_column() {
        let err = read_table_from(reader("id,Date,ppt\n"), &TableSchema::default()).unwrap_err();
        assert!(matches!(err, TrendError::MissingColumn(c) if c == "huc12"));
    }

    #[test]
    fn test_require_columns() {
        let table = read_table_from(reader("huc12,Date,ppt\n"), &TableSchema::default()).unwrap();
        assert!(table.require_columns(&["ppt"]).is_ok());
        assert!(matches!(
            table.require_columns(&["ppt", "tmax"]),
            Err(TrendError::MissingColumn(c)) if c == "tmax"
        ));
    }

    #[test]
    fn test_table_without_date_column() {
        let schema = TableSchema {
            unit_column: "huc12".to_string(),
            date_column: None,
        };
        let table = read_table_from(reader("huc12,irr_year,ppt\nA,2004,1.5\n"), &schema).unwrap();
        assert_eq!(table.records[0].irrigation_year(), Some(2004));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2020-01-31"), NaiveDate::from_ymd_opt(2020, 1, 31));
        assert_eq!(parse_date("01/31/2020"), NaiveDate::from_ymd_opt(2020, 1, 31));
        assert_eq!(parse_date("2020-01-31 00:00:00"), NaiveDate::from_ymd_opt(2020, 1, 31));
        assert_eq!(parse_date("January"), None);
    }

    #[test]
    fn test_write_trend_table_with_unset() {
        let stats = TrendStats {
            trend: TrendDirection::Increasing,
            h: true,
            p: 0.01,
            z: 2.5,
            tau: 0.8,
            s: 20.0,
            var_s: 60.0,
            slope: 1.5,
            intercept: 0.5,
            n: 10,
        };
        let rows = vec![
            UnitTrends {
                unit: "A".to_string(),
                trends: vec![VariableTrend {
                    variable: "ppt".to_string(),
                    outcome: TrendOutcome::Computed(stats),
                }],
            },
            UnitTrends {
                unit: "B".to_string(),
                trends: vec![VariableTrend {
                    variable: "ppt".to_string(),
                    outcome: TrendOutcome::Failed(TrendFailure::NonFiniteValue),
                }],
            },
        ];

        let mut out = Vec::new();
        write_trend_table(&mut out, "huc12", &rows, &["ppt"], TrendColumns::Basic).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "huc12,ppt_slope,ppt_p,ppt_trend\nA,1.5,0.01,increasing\nB,,,\n");

        let mut out = Vec::new();
        write_trend_table(&mut out, "huc12", &rows, &["ppt"], TrendColumns::Full).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("huc12,ppt_slope,ppt_p,ppt_trend,ppt_intercept,ppt_tau"));
        assert!(text.contains("A,1.5,0.01,increasing,0.5,0.8,20,60,2.5,10\n"));
    }

    #[test]
    fn test_write_summary() {
        let summaries = vec![TrendSummary {
            variable: "ppt".to_string(),
            increasing: 1,
            decreasing: 2,
            no_trend: 3,
        }];
        let mut out = Vec::new();
        write_summary(&mut out, &summaries).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Variable,Increasing,Decreasing,No Trend\nppt,1,2,3\n"
        );
    }
}
