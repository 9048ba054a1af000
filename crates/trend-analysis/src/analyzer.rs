//! Per-unit trend analysis over a table of records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::mann_kendall::{original_test, DEFAULT_ALPHA};
use crate::outcome::TrendOutcome;
use crate::record::{SortKey, TimeSeriesRecord};

/// Options for [`analyze_trends`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Chronological key used to order each unit's records
    pub sort_key: SortKey,
    /// Significance level of the test
    pub alpha: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            sort_key: SortKey::IrrigationYear,
            alpha: DEFAULT_ALPHA,
        }
    }
}

/// Result of one variable for one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableTrend {
    pub variable: String,
    pub outcome: TrendOutcome,
}

/// One result row: every requested variable for a single spatial unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTrends {
    pub unit: String,
    /// In requested variable order
    pub trends: Vec<VariableTrend>,
}

impl UnitTrends {
    pub fn get(&self, variable: &str) -> Option<&TrendOutcome> {
        self.trends
            .iter()
            .find(|t| t.variable == variable)
            .map(|t| &t.outcome)
    }
}

/// Run the trend test for every (unit, variable) pair.
///
/// Records are grouped by unit (rows come back in ascending unit order,
/// records with an empty unit id are dropped),
/// sorted stably by the key, and each variable's ordered values are tested.
/// A failing pair is recorded as [`TrendOutcome::Failed`] and the run
/// continues.
pub fn analyze_trends<S: AsRef<str>>(
    records: &[TimeSeriesRecord],
    variables: &[S],
    options: &AnalysisOptions,
) -> Vec<UnitTrends> {
    let mut groups: BTreeMap<&str, Vec<&TimeSeriesRecord>> = BTreeMap::new();
    let mut unlabeled = 0usize;
    for record in records {
        if record.unit.trim().is_empty() {
            unlabeled += 1;
            continue;
        }
        groups.entry(record.unit.as_str()).or_default().push(record);
    }
    if unlabeled > 0 {
        debug!(records = unlabeled, "Records without a unit id skipped");
    }

    let mut rows = Vec::with_capacity(groups.len());
    let mut failures = 0usize;

    for (unit, mut group) in groups {
        group.sort_by(|a, b| options.sort_key.compare(a, b));

        let trends = variables
            .iter()
            .map(|variable| {
                let variable = variable.as_ref();
                let series: Vec<f64> = group.iter().map(|r| r.value(variable)).collect();
                let outcome = TrendOutcome::from(original_test(&series, options.alpha));

                if let Some(reason) = outcome.failure() {
                    failures += 1;
                    debug!(unit = unit, variable = variable, reason = %reason, "Trend left unset");
                }

                VariableTrend {
                    variable: variable.to_string(),
                    outcome,
                }
            })
            .collect();

        rows.push(UnitTrends {
            unit: unit.to_string(),
            trends,
        });
    }

    info!(
        units = rows.len(),
        variables = variables.len(),
        sort_key = %options.sort_key,
        unset = failures,
        "Trend analysis complete"
    );

    rows
}
