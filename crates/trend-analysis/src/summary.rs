//! Counting trend labels across units.

use serde::{Deserialize, Serialize};

use crate::analyzer::UnitTrends;
use crate::outcome::TrendDirection;

/// Label counts for one variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub variable: String,
    pub increasing: usize,
    pub decreasing: usize,
    pub no_trend: usize,
}

impl TrendSummary {
    /// Units with a set label for this variable.
    pub fn total(&self) -> usize {
        self.increasing + self.decreasing + self.no_trend
    }
}

/// Count labels per variable, in the order requested. Unset labels are ignored.
pub fn summarize_trends<S: AsRef<str>>(rows: &[UnitTrends], variables: &[S]) -> Vec<TrendSummary> {
    variables
        .iter()
        .map(|variable| {
            let variable = variable.as_ref();
            let mut summary = TrendSummary {
                variable: variable.to_string(),
                increasing: 0,
                decreasing: 0,
                no_trend: 0,
            };
            for trend in rows.iter().filter_map(|row| row.get(variable)?.trend()) {
                match trend {
                    TrendDirection::Increasing => summary.increasing += 1,
                    TrendDirection::Decreasing => summary.decreasing += 1,
                    TrendDirection::NoTrend => summary.no_trend += 1,
                }
            }
            summary
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::VariableTrend;
    use crate::outcome::{TrendFailure, TrendOutcome, TrendStats};

    fn computed(trend: TrendDirection) -> TrendOutcome {
        TrendOutcome::Computed(TrendStats {
            trend,
            h: trend != TrendDirection::NoTrend,
            p: 0.5,
            z: 0.0,
            tau: 0.0,
            s: 0.0,
            var_s: 1.0,
            slope: 0.0,
            intercept: 0.0,
            n: 10,
        })
    }

    fn row(unit: &str, outcomes: Vec<(&str, TrendOutcome)>) -> UnitTrends {
        UnitTrends {
            unit: unit.to_string(),
            trends: outcomes
                .into_iter()
                .map(|(v, outcome)| VariableTrend {
                    variable: v.to_string(),
                    outcome,
                })
                .collect(),
        }
    }

    #[test]
    fn test_counts_ignore_unset() {
        let rows = vec![
            row("A", vec![("ppt", computed(TrendDirection::Increasing))]),
            row("B", vec![("ppt", computed(TrendDirection::Increasing))]),
            row("C", vec![("ppt", TrendOutcome::Failed(TrendFailure::NonFiniteValue))]),
            row("D", vec![("ppt", computed(TrendDirection::NoTrend))]),
        ];
        let summary = summarize_trends(&rows, &["ppt"]);
        assert_eq!(summary[0].increasing, 2);
        assert_eq!(summary[0].decreasing, 0);
        assert_eq!(summary[0].no_trend, 1);
        assert_eq!(summary[0].total(), 3);
    }

    #[test]
    fn test_requested_order_and_zero_counts() {
        let rows = vec![row("A", vec![("ppt", computed(TrendDirection::Decreasing))])];
        let summary = summarize_trends(&rows, &["tmax", "ppt"]);
        assert_eq!(summary[0].variable, "tmax");
        assert_eq!(summary[0].total(), 0);
        assert_eq!(summary[1].variable, "ppt");
        assert_eq!(summary[1].decreasing, 1);
    }
}
