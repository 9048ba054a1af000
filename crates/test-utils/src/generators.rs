//! Synthetic data generators with predictable, verifiable patterns.

/// `start, start + step, start + 2*step, ...` of length `n`.
///
/// # Example
///
/// ```
/// use test_utils::linear_series;
///
/// assert_eq!(linear_series(3, 1.0, 0.5), vec![1.0, 1.5, 2.0]);
/// ```
pub fn linear_series(n: usize, start: f64, step: f64) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// `n` copies of `value`.
pub fn constant_series(n: usize, value: f64) -> Vec<f64> {
    vec![value; n]
}

/// Linear trend with a deterministic zig-zag of amplitude `noise`.
///
/// Even positions are nudged up, odd positions down, so the series keeps its
/// overall direction but is not perfectly monotonic once `noise` exceeds
/// half of `step`.
pub fn noisy_linear_series(n: usize, start: f64, step: f64, noise: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let wiggle = if i % 2 == 0 { noise } else { -noise };
            start + step * i as f64 + wiggle
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_series() {
        let s = linear_series(5, 10.0, -2.0);
        assert_eq!(s, vec![10.0, 8.0, 6.0, 4.0, 2.0]);
    }

    #[test]
    fn test_constant_series() {
        assert!(constant_series(4, 7.5).iter().all(|&v| v == 7.5));
    }

    #[test]
    fn test_noisy_series_keeps_direction() {
        let s = noisy_linear_series(10, 0.0, 1.0, 0.2);
        assert!(s.last().unwrap() > s.first().unwrap());
        assert_eq!(s[0], 0.2);
        assert_eq!(s[1], 0.8);
    }
}
