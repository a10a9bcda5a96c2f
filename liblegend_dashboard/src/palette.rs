use serde::{Deserialize, Serialize};

/// An sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn from_unit(r: f64, g: f64, b: f64) -> Self {
        let to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(to_u8(r), to_u8(g), to_u8(b))
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

const CATEGORY20: [Rgb; 20] = [
    Rgb::new(0x1f, 0x77, 0xb4),
    Rgb::new(0xae, 0xc7, 0xe8),
    Rgb::new(0xff, 0x7f, 0x0e),
    Rgb::new(0xff, 0xbb, 0x78),
    Rgb::new(0x2c, 0xa0, 0x2c),
    Rgb::new(0x98, 0xdf, 0x8a),
    Rgb::new(0xd6, 0x27, 0x28),
    Rgb::new(0xff, 0x98, 0x96),
    Rgb::new(0x94, 0x67, 0xbd),
    Rgb::new(0xc5, 0xb0, 0xd5),
    Rgb::new(0x8c, 0x56, 0x4b),
    Rgb::new(0xc4, 0x9c, 0x94),
    Rgb::new(0xe3, 0x77, 0xc2),
    Rgb::new(0xf7, 0xb6, 0xd2),
    Rgb::new(0x7f, 0x7f, 0x7f),
    Rgb::new(0xc7, 0xc7, 0xc7),
    Rgb::new(0xbc, 0xbd, 0x22),
    Rgb::new(0xdb, 0xdb, 0x8d),
    Rgb::new(0x17, 0xbe, 0xcf),
    Rgb::new(0x9e, 0xda, 0xe5),
];

/// Largest group count served from the categorical palette
const MAX_CATEGORICAL: usize = 19;

/// Evenly spaced hues in HLS space (lightness 0.6, saturation 0.65, first hue 0.01)
pub fn hls_palette(n: usize) -> Vec<Rgb> {
    const HUE_START: f64 = 0.01;
    const LIGHTNESS: f64 = 0.6;
    const SATURATION: f64 = 0.65;
    (0..n)
        .map(|i| {
            let hue = (i as f64 / n as f64 + HUE_START).fract();
            let (r, g, b) = hls_to_rgb(hue, LIGHTNESS, SATURATION);
            Rgb::from_unit(r, g, b)
        })
        .collect()
}

/// A categorical palette for `n` groups: a Category20 prefix for small counts, otherwise `n`
/// colours sampled evenly from the Turbo map
pub fn categorical_palette(n: usize) -> Vec<Rgb> {
    if n <= MAX_CATEGORICAL {
        CATEGORY20[..n].to_vec()
    } else {
        turbo_palette(n)
    }
}

/// `n` colours sampled evenly along the 256 entry Turbo map
pub fn turbo_palette(n: usize) -> Vec<Rgb> {
    if n == 1 {
        return vec![turbo(0.0)];
    }
    (0..n)
        .map(|i| {
            let entry = (i as f64 * 255.0 / (n - 1) as f64).floor();
            turbo(entry / 255.0)
        })
        .collect()
}

// Polynomial approximation of the Turbo colour map
fn turbo(x: f64) -> Rgb {
    let x = x.clamp(0.0, 1.0);
    let r = 0.13572138
        + x * (4.61539260 + x * (-42.66032258 + x * (132.13108234 + x * (-152.94239396 + x * 59.28637943))));
    let g = 0.09140261
        + x * (2.19418839 + x * (4.84296658 + x * (-14.18503333 + x * (4.27729857 + x * 2.82956604))));
    let b = 0.10667330
        + x * (12.64194608 + x * (-60.58204836 + x * (110.36276771 + x * (-89.90310912 + x * 27.34824973))));
    Rgb::from_unit(r, g, b)
}

fn hls_to_rgb(h: f64, l: f64, s: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (l, l, l);
    }
    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;
    (
        hue_channel(m1, m2, h + 1.0 / 3.0),
        hue_channel(m1, m2, h),
        hue_channel(m1, m2, h - 1.0 / 3.0),
    )
}

fn hue_channel(m1: f64, m2: f64, hue: f64) -> f64 {
    let hue = hue.rem_euclid(1.0);
    if hue < 1.0 / 6.0 {
        m1 + (m2 - m1) * hue * 6.0
    } else if hue < 0.5 {
        m2
    } else if hue < 2.0 / 3.0 {
        m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
    } else {
        m1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hls_palette() {
        let colors = hls_palette(3);
        assert_eq!(colors.len(), 3);
        // Same values seaborn produces for hls_palette(3)
        assert_eq!(colors[0].hex(), "#db5f57");
        assert_eq!(colors[1].hex(), "#57db5f");
        assert_eq!(colors[2].hex(), "#5f57db");
    }

    #[test]
    fn test_categorical_switches_to_turbo() {
        assert_eq!(categorical_palette(2)[1].hex(), "#aec7e8");
        assert_eq!(categorical_palette(19).len(), 19);
        let many = categorical_palette(25);
        assert_eq!(many.len(), 25);
        assert_ne!(many[0], many[24]);
    }

    #[test]
    fn test_hex() {
        assert_eq!(Rgb::BLACK.hex(), "#000000");
        assert_eq!(Rgb::new(255, 16, 1).hex(), "#ff1001");
    }
}
