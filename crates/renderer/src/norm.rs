//! Value normalization and the center-zero fallback decision.

use serde::{Deserialize, Serialize};

/// Maps data values onto [0, 1] colormap positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Normalization {
    /// `vmin -> 0`, `vmax -> 1`
    Linear { vmin: f64, vmax: f64 },
    /// `vmin -> 0`, `vcenter -> 0.5`, `vmax -> 1`, linear on each side
    TwoSlope { vmin: f64, vcenter: f64, vmax: f64 },
}

impl Normalization {
    /// Position of `value`, clamped to [0, 1]. NaN stays NaN.
    pub fn normalize(&self, value: f64) -> f64 {
        if value.is_nan() {
            return f64::NAN;
        }
        let t = match *self {
            Normalization::Linear { vmin, vmax } => {
                if vmax > vmin {
                    (value - vmin) / (vmax - vmin)
                } else {
                    0.0
                }
            }
            Normalization::TwoSlope { vmin, vcenter, vmax } => {
                if value < vcenter {
                    0.5 * (value - vmin) / (vcenter - vmin)
                } else {
                    0.5 + 0.5 * (value - vcenter) / (vmax - vcenter)
                }
            }
        };
        t.clamp(0.0, 1.0)
    }

    /// Data value at colormap position `t`.
    pub fn inverse(&self, t: f64) -> f64 {
        match *self {
            Normalization::Linear { vmin, vmax } => vmin + t * (vmax - vmin),
            Normalization::TwoSlope { vmin, vcenter, vmax } => {
                if t < 0.5 {
                    vmin + (t / 0.5) * (vcenter - vmin)
                } else {
                    vcenter + ((t - 0.5) / 0.5) * (vmax - vcenter)
                }
            }
        }
    }

    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            Normalization::Linear { vmin, vmax } => (vmin, vmax),
            Normalization::TwoSlope { vmin, vmax, .. } => (vmin, vmax),
        }
    }
}

/// Outcome of choosing a normalization and colormap.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    pub normalization: Normalization,
    pub cmap: String,
    /// Set when center-zero was requested but could not be honored
    pub warning: Option<String>,
}

/// Decide normalization and colormap for a value range.
///
/// Center-zero needs `vmin < 0 < vmax`. Otherwise the scale falls back to a
/// linear normalization with a single-hue colormap: `Blues` when `vmax > 0`,
/// `Reds` otherwise.
pub fn resolve_color_scale(center_zero: bool, vmin: f64, vmax: f64, cmap: &str) -> ColorScale {
    if !center_zero {
        return ColorScale {
            normalization: Normalization::Linear { vmin, vmax },
            cmap: cmap.to_string(),
            warning: None,
        };
    }

    if vmin < 0.0 && vmax > 0.0 {
        return ColorScale {
            normalization: Normalization::TwoSlope {
                vmin,
                vcenter: 0.0,
                vmax,
            },
            cmap: cmap.to_string(),
            warning: None,
        };
    }

    let fallback = if vmax > 0.0 { "Blues" } else { "Reds" };
    ColorScale {
        normalization: Normalization::Linear { vmin, vmax },
        cmap: fallback.to_string(),
        warning: Some(format!(
            "Data range ({:.2}, {:.2}) does not cross 0. Using linear normalization with {} instead.",
            vmin, vmax, fallback
        )),
    }
}

/// Minimum and maximum of the finite values, if any.
pub fn data_bounds(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
