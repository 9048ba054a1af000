//! Named colormaps sampled by linear interpolation between anchor colors.

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    /// matplotlib "gray" (#808080)
    pub const GRAY: Color = Color::new(128, 128, 128, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Parse `#rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Color> {
        let (r, g, b) = hex_to_rgb(hex)?;
        Some(Color::new(r, g, b, 255))
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Linear interpolation between two colors, `t` clamped to [0, 1].
pub fn interpolate_color(c1: Color, c2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f32 * (1.0 - t) + b as f32 * t).round() as u8;
    Color {
        r: lerp(c1.r, c2.r),
        g: lerp(c1.g, c2.g),
        b: lerp(c1.b, c2.b),
        a: lerp(c1.a, c2.a),
    }
}

// Anchor colors, low to high.
const RDBU: &[&str] = &[
    "#67001f", "#b2182b", "#d6604d", "#f4a582", "#fddbc7", "#f7f7f7", "#d1e5f0", "#92c5de",
    "#4393c3", "#2166ac", "#053061",
];
const BLUES: &[&str] = &[
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c",
    "#08306b",
];
const REDS: &[&str] = &[
    "#fff5f0", "#fee0d2", "#fcbba1", "#fc9272", "#fb6a4a", "#ef3b2c", "#cb181d", "#a50f15",
    "#67000d",
];
const COOLWARM: &[&str] = &[
    "#3b4cc0", "#6f92f3", "#aac7fd", "#dddddd", "#f7b89c", "#e7745b", "#b40426",
];
const VIRIDIS: &[&str] = &[
    "#440154", "#482878", "#3e4989", "#31688e", "#26828e", "#1f9e89", "#35b779", "#6ece58",
    "#b5de2b", "#fde725",
];
const GREENS: &[&str] = &[
    "#f7fcf5", "#e5f5e0", "#c7e9c0", "#a1d99b", "#74c476", "#41ab5d", "#238b45", "#006d2c",
    "#00441b",
];

/// A named sequence of anchor colors.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    pub name: String,
    stops: Vec<Color>,
}

impl Colormap {
    /// Look up a colormap by its matplotlib name. A `_r` suffix reverses it.
    pub fn from_name(name: &str) -> Option<Colormap> {
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (name, false),
        };

        let anchors = match base {
            "RdBu" => RDBU,
            "Blues" => BLUES,
            "Reds" => REDS,
            "Greens" => GREENS,
            "coolwarm" => COOLWARM,
            "viridis" => VIRIDIS,
            _ => return None,
        };

        let mut stops: Vec<Color> = anchors.iter().filter_map(|h| Color::from_hex(h)).collect();
        if reversed {
            stops.reverse();
        }

        Some(Colormap {
            name: name.to_string(),
            stops,
        })
    }

    /// Names accepted by [`Colormap::from_name`], without `_r` variants.
    pub fn available() -> &'static [&'static str] {
        &["RdBu", "Blues", "Reds", "Greens", "coolwarm", "viridis"]
    }

    /// Color at position `t` in [0, 1]; values outside are clamped.
    pub fn sample(&self, t: f64) -> Color {
        match self.stops.len() {
            0 => Color::transparent(),
            1 => self.stops[0],
            n => {
                let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
                let pos = t * (n - 1) as f64;
                let idx = (pos.floor() as usize).min(n - 2);
                interpolate_color(self.stops[idx], self.stops[idx + 1], (pos - idx as f64) as f32)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parse() {
        assert_eq!(hex_to_rgb("#ff8000"), Some((255, 128, 0)));
        assert_eq!(hex_to_rgb("ff8000"), Some((255, 128, 0)));
        assert_eq!(hex_to_rgb("#fff"), None);
    }

    #[test]
    fn test_rdbu_endpoints_and_center() {
        let cmap = Colormap::from_name("RdBu").unwrap();
        assert_eq!(cmap.sample(0.0), Color::from_hex("#67001f").unwrap());
        assert_eq!(cmap.sample(1.0), Color::from_hex("#053061").unwrap());
        assert_eq!(cmap.sample(0.5), Color::from_hex("#f7f7f7").unwrap());
    }

    #[test]
    fn test_reversed() {
        let fwd = Colormap::from_name("Blues").unwrap();
        let rev = Colormap::from_name("Blues_r").unwrap();
        assert_eq!(fwd.sample(0.0), rev.sample(1.0));
        assert_eq!(rev.name, "Blues_r");
    }

    #[test]
    fn test_unknown_name() {
        assert!(Colormap::from_name("jet").is_none());
    }

    #[test]
    fn test_sample_clamps() {
        let cmap = Colormap::from_name("Reds").unwrap();
        assert_eq!(cmap.sample(-3.0), cmap.sample(0.0));
        assert_eq!(cmap.sample(7.0), cmap.sample(1.0));
    }

    #[test]
    fn test_interpolate_midpoint() {
        let c = interpolate_color(Color::BLACK, Color::WHITE, 0.5);
        assert_eq!((c.r, c.g, c.b), (128, 128, 128));
    }
}
