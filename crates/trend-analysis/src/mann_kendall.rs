//! Original Mann-Kendall test and Sen's slope estimator.
//!
//! Missing values (NaN) are skipped for the test statistic. Sen's slope uses
//! the original positions, so a gap still counts as a step.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::outcome::{TrendDirection, TrendFailure, TrendStats};

/// Default significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Fewest non-missing values for which a result is reported.
pub const MIN_OBSERVATIONS: usize = 3;

/// Run the original (non-seasonal, no autocorrelation correction) test.
pub fn original_test(x: &[f64], alpha: f64) -> Result<TrendStats, TrendFailure> {
    if !is_valid_alpha(alpha) {
        return Err(TrendFailure::Statistics(format!(
            "significance level {} is outside (0, 1)",
            alpha
        )));
    }
    if x.iter().any(|v| v.is_infinite()) {
        return Err(TrendFailure::NonFiniteValue);
    }

    let valid: Vec<f64> = x.iter().copied().filter(|v| !v.is_nan()).collect();
    let n = valid.len();
    if n < MIN_OBSERVATIONS {
        return Err(TrendFailure::InsufficientData {
            valid: n,
            required: MIN_OBSERVATIONS,
        });
    }

    let s = mk_score(&valid);
    let var_s = variance_s(&valid);
    let tau = s / (0.5 * n as f64 * (n as f64 - 1.0));
    let z = z_score(s, var_s);

    let normal = Normal::new(0.0, 1.0).map_err(|e| TrendFailure::Statistics(e.to_string()))?;
    let p = 2.0 * (1.0 - normal.cdf(z.abs()));
    let h = z.abs() > normal.inverse_cdf(1.0 - alpha / 2.0);

    let trend = if z < 0.0 && h {
        TrendDirection::Decreasing
    } else if z > 0.0 && h {
        TrendDirection::Increasing
    } else {
        TrendDirection::NoTrend
    };

    let (slope, intercept) = sens_slope(x);

    Ok(TrendStats {
        trend,
        h,
        p,
        z,
        tau,
        s,
        var_s,
        slope,
        intercept,
        n,
    })
}

/// True when `alpha` lies strictly between 0 and 1.
pub fn is_valid_alpha(alpha: f64) -> bool {
    alpha > 0.0 && alpha < 1.0
}

/// S = sum over i < j of sign(x_j - x_i).
fn mk_score(x: &[f64]) -> f64 {
    let mut s = 0.0;
    for i in 0..x.len() {
        for j in i + 1..x.len() {
            let d = x[j] - x[i];
            if d > 0.0 {
                s += 1.0;
            } else if d < 0.0 {
                s -= 1.0;
            }
        }
    }
    s
}

/// Var(S) with the tie correction.
fn variance_s(x: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mut sorted = x.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut tie_term = 0.0;
    let mut start = 0;
    while start < sorted.len() {
        let mut end = start + 1;
        while end < sorted.len() && sorted[end] == sorted[start] {
            end += 1;
        }
        let tp = (end - start) as f64;
        tie_term += tp * (tp - 1.0) * (2.0 * tp + 5.0);
        start = end;
    }

    (n * (n - 1.0) * (2.0 * n + 5.0) - tie_term) / 18.0
}

fn z_score(s: f64, var_s: f64) -> f64 {
    if s > 0.0 {
        (s - 1.0) / var_s.sqrt()
    } else if s < 0.0 {
        (s + 1.0) / var_s.sqrt()
    } else {
        0.0
    }
}

/// Sen's slope and intercept over the original index positions.
pub fn sens_slope(x: &[f64]) -> (f64, f64) {
    let mut slopes = Vec::with_capacity(x.len() * x.len().saturating_sub(1) / 2);
    for i in 0..x.len() {
        if x[i].is_nan() {
            continue;
        }
        for j in i + 1..x.len() {
            if x[j].is_nan() {
                continue;
            }
            slopes.push((x[j] - x[i]) / (j - i) as f64);
        }
    }

    let slope = median(&mut slopes);

    let mut values: Vec<f64> = x.iter().copied().filter(|v| !v.is_nan()).collect();
    let mut positions: Vec<f64> = x
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(i, _)| i as f64)
        .collect();

    let intercept = median(&mut values) - median(&mut positions) * slope;
    (slope, intercept)
}

/// Median of finite values; NaN for an empty slice.
fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
