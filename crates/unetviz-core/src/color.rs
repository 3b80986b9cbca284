//! sRGB and HSL colors
//!
//! Diagram materials are flat colors. The highlight animator works in HSL so
//! that a lightness pulse keeps hue and saturation intact.

use serde::{Deserialize, Serialize};

/// sRGB color with components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Hue, saturation and lightness, all in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Parse "#RRGGBB" or "RRGGBB"
    pub fn parse_hex(s: &str) -> Option<Self> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::from_hex)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_hsl(self) -> Hsl {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let l = (min + max) / 2.0;

        if min == max {
            return Hsl { h: 0.0, s: 0.0, l };
        }

        let delta = max - min;
        let s = if l <= 0.5 {
            delta / (max + min)
        } else {
            delta / (2.0 - max - min)
        };

        let h = if max == self.r {
            (self.g - self.b) / delta + if self.g < self.b { 6.0 } else { 0.0 }
        } else if max == self.g {
            (self.b - self.r) / delta + 2.0
        } else {
            (self.r - self.g) / delta + 4.0
        };

        Hsl { h: h / 6.0, s, l }
    }

    pub fn from_hsl(hsl: Hsl) -> Self {
        let h = hsl.h.rem_euclid(1.0);
        let s = hsl.s.clamp(0.0, 1.0);
        let l = hsl.l.clamp(0.0, 1.0);

        if s == 0.0 {
            return Self::new(l, l, l);
        }

        let p = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let q = 2.0 * l - p;

        Self {
            r: hue_to_channel(q, p, h + 1.0 / 3.0),
            g: hue_to_channel(q, p, h),
            b: hue_to_channel(q, p, h - 1.0 / 3.0),
        }
    }
}

impl From<u32> for Rgb {
    fn from(hex: u32) -> Self {
        Rgb::from_hex(hex)
    }
}

impl Hsl {
    /// Raise lightness by `boost`, never past 1.0
    pub fn boosted(self, boost: f32) -> Hsl {
        Hsl {
            l: (self.l + boost).min(1.0),
            ..self
        }
    }

    /// Component-wise comparison with a tolerance
    pub fn approx_eq(&self, other: &Hsl, eps: f32) -> bool {
        (self.h - other.h).abs() <= eps
            && (self.s - other.s).abs() <= eps
            && (self.l - other.l).abs() <= eps
    }
}

fn hue_to_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 0.5 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * 6.0 * (2.0 / 3.0 - t);
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        let c = Rgb::from_hex(0xff8000);
        assert!((c.r - 1.0).abs() < 1e-6);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert!(c.b.abs() < 1e-6);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgb::parse_hex("#6495ED"), Some(Rgb::from_hex(0x6495ed)));
        assert_eq!(Rgb::parse_hex("00ff00"), Some(Rgb::from_hex(0x00ff00)));
        assert_eq!(Rgb::parse_hex("#fff"), None);
        assert_eq!(Rgb::parse_hex("zzzzzz"), None);
    }

    #[test]
    fn test_hsl_primaries() {
        let red = Rgb::from_hex(0xff0000).to_hsl();
        assert!(red.approx_eq(&Hsl { h: 0.0, s: 1.0, l: 0.5 }, 1e-6));

        let green = Rgb::from_hex(0x00ff00).to_hsl();
        assert!(green.approx_eq(&Hsl { h: 1.0 / 3.0, s: 1.0, l: 0.5 }, 1e-6));

        let grey = Rgb::from_hex(0x888888).to_hsl();
        assert_eq!(grey.s, 0.0);
        assert!((grey.l - 136.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_hsl_round_trip_diagram_palette() {
        for hex in [0x6495ed, 0x00ffff, 0xff3255, 0x085e28, 0x088569, 0xff4400] {
            let rgb = Rgb::from_hex(hex);
            let back = Rgb::from_hsl(rgb.to_hsl());
            assert!((rgb.r - back.r).abs() < 1e-5, "red drifted for {:06x}", hex);
            assert!((rgb.g - back.g).abs() < 1e-5, "green drifted for {:06x}", hex);
            assert!((rgb.b - back.b).abs() < 1e-5, "blue drifted for {:06x}", hex);
        }
    }

    #[test]
    fn test_boost_is_clamped() {
        let hsl = Hsl { h: 0.6, s: 0.5, l: 0.8 };
        let boosted = hsl.boosted(0.5);
        assert_eq!(boosted.l, 1.0);
        assert_eq!(boosted.h, 0.6);
        assert_eq!(boosted.s, 0.5);

        let small = Hsl { h: 0.1, s: 0.2, l: 0.3 }.boosted(0.2);
        assert!((small.l - 0.5).abs() < 1e-6);
    }
}
