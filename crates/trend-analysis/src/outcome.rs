//! Per-(unit, variable) trend results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Direction reported by the Mann-Kendall test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendDirection {
    #[serde(rename = "increasing")]
    Increasing,
    #[serde(rename = "decreasing")]
    Decreasing,
    #[serde(rename = "no trend")]
    NoTrend,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::NoTrend => "no trend",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increasing" => Ok(TrendDirection::Increasing),
            "decreasing" => Ok(TrendDirection::Decreasing),
            "no trend" => Ok(TrendDirection::NoTrend),
            other => Err(format!("unknown trend label: {}", other)),
        }
    }
}

/// Full result of the original Mann-Kendall test with Sen's slope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendStats {
    pub trend: TrendDirection,
    /// Whether the null hypothesis of no trend is rejected
    pub h: bool,
    /// Two-sided p-value
    pub p: f64,
    /// Normalized test statistic
    pub z: f64,
    /// Kendall's tau
    pub tau: f64,
    /// Mann-Kendall score
    pub s: f64,
    /// Variance of S, tie-corrected
    pub var_s: f64,
    /// Sen's slope (units per step)
    pub slope: f64,
    /// Sen's intercept
    pub intercept: f64,
    /// Number of non-missing values tested
    pub n: usize,
}

/// Why a trend could not be computed for one (unit, variable) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrendFailure {
    /// Fewer non-missing values than the test needs
    InsufficientData { valid: usize, required: usize },
    /// The series contains an infinite value
    NonFiniteValue,
    /// The statistics backend rejected its input
    Statistics(String),
}

impl fmt::Display for TrendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendFailure::InsufficientData { valid, required } => {
                write!(f, "insufficient data: {} valid values, {} required", valid, required)
            }
            TrendFailure::NonFiniteValue => f.write_str("series contains an infinite value"),
            TrendFailure::Statistics(msg) => write!(f, "statistics error: {}", msg),
        }
    }
}

/// A computed result or the typed reason it is unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrendOutcome {
    Computed(TrendStats),
    Failed(TrendFailure),
}

impl TrendOutcome {
    pub fn stats(&self) -> Option<&TrendStats> {
        match self {
            TrendOutcome::Computed(stats) => Some(stats),
            TrendOutcome::Failed(_) => None,
        }
    }

    pub fn slope(&self) -> Option<f64> {
        self.stats().map(|s| s.slope)
    }

    pub fn p_value(&self) -> Option<f64> {
        self.stats().map(|s| s.p)
    }

    pub fn trend(&self) -> Option<TrendDirection> {
        self.stats().map(|s| s.trend)
    }

    pub fn failure(&self) -> Option<&TrendFailure> {
        match self {
            TrendOutcome::Computed(_) => None,
            TrendOutcome::Failed(reason) => Some(reason),
        }
    }
}

impl From<Result<TrendStats, TrendFailure>> for TrendOutcome {
    fn from(result: Result<TrendStats, TrendFailure>) -> Self {
        match result {
            Ok(stats) => TrendOutcome::Computed(stats),
            Err(reason) => TrendOutcome::Failed(reason),
        }
    }
}
