//! Axis and colorbar tick placement.

/// Round tick values covering `[lo, hi]`, about `target` of them.
///
/// Steps are 1, 2, 2.5 or 5 times a power of ten.
pub fn nice_ticks(lo: f64, hi: f64, target: usize) -> Vec<f64> {
    if !lo.is_finite() || !hi.is_finite() || target == 0 {
        return Vec::new();
    }
    if hi <= lo {
        return vec![lo];
    }

    let step = nice_step((hi - lo) / target as f64);
    let eps = step * 1e-9;
    let first = (lo / step - 1e-9).ceil() * step;

    let mut ticks = Vec::new();
    let mut i = 0;
    loop {
        let v = first + i as f64 * step;
        if v > hi + eps {
            break;
        }
        // Avoid printing -0
        ticks.push(if v.abs() < eps { 0.0 } else { v });
        i += 1;
    }
    ticks
}

fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw * (1.0 - 1e-9))
        .unwrap_or(10.0 * magnitude)
}

/// Format ticks with a shared number of decimals, enough to tell them apart.
pub fn format_ticks(ticks: &[f64]) -> Vec<String> {
    let decimals = (0..=6)
        .find(|&d| {
            let scale = 10f64.powi(d);
            ticks.iter().all(|t| ((t * scale).round() - t * scale).abs() < 1e-6)
        })
        .unwrap_or(6) as usize;

    ticks.iter().map(|t| format!("{:.*}", decimals, t)).collect()
}
