use std::f32::consts::TAU;
use std::str::FromStr;

use rand::Rng;

use crate::errors::{Error, Result};
use crate::util::{jitter_with_cap, jitter_with_wrap};

/// Linear RGB color with channels in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Color {
    pub const fn from_rgb(red: f32, green: f32, blue: f32) -> Self {
        Self { red, green, blue }
    }

    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let [red, green, blue] = hsv_to_rgb(hue, saturation, value);
        Self { red, green, blue }
    }

    pub fn hue(&self) -> f32 {
        rgb_to_hue(self.red, self.green, self.blue)
    }

    pub fn saturation(&self) -> f32 {
        let cmax = self.red.max(self.green).max(self.blue);
        if cmax == 0.0 {
            return 0.0;
        }
        let cmin = self.red.min(self.green).min(self.blue);

        (cmax - cmin) / cmax
    }

    pub fn value(&self) -> f32 {
        self.red.max(self.green).max(self.blue)
    }

    /// Nudge all three HSV channels by at most `max_jitter`. Hue wraps,
    /// saturation and value saturate.
    pub fn jitter_hsv<R: Rng>(&self, rng: &mut R, max_jitter: f32) -> Self {
        self.jittered(rng, max_jitter, max_jitter, max_jitter)
    }

    pub fn jittered<R: Rng>(
        &self,
        rng: &mut R,
        hue_radius: f32,
        saturation_radius: f32,
        value_radius: f32,
    ) -> Self {
        let h = jitter_with_wrap(rng, self.hue(), hue_radius, 0.0, 1.0);
        let s = jitter_with_cap(rng, self.saturation(), saturation_radius, 0.0, 1.0);
        let v = jitter_with_cap(rng, self.value(), value_radius, 0.0, 1.0);

        Self::from_hsv(h, s, v)
    }

    // Embeds the HSV cylinder into a double cone so that euclidean distance
    // is a reasonable perceptual distance between colors.
    fn cone_coords(&self) -> [f32; 3] {
        let radius = 0.5 * self.saturation() * self.value();
        let angle = TAU * self.hue();

        [radius * angle.cos(), radius * angle.sin(), self.value()]
    }

    pub fn cone_distance(a: Self, b: Self) -> f32 {
        let [x1, y1, z1] = a.cone_coords();
        let [x2, y2, z2] = b.cone_coords();

        ((x1 - x2).powi(2) + (y1 - y2).powi(2) + (z1 - z2).powi(2)).sqrt()
    }

    // Used by clap; FromStr delegates here.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some(hex) = s.strip_prefix('#') {
            return Self::parse_hex(hex)
                .ok_or_else(|| Error::InvalidArgument(format!("cannot parse color \"{s}\"")));
        }

        if let Some(rgb) = s.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
            return Self::parse_rgb_components(rgb)
                .ok_or_else(|| Error::InvalidArgument(format!("cannot parse color \"{s}\"")));
        }

        Self::named(s).ok_or_else(|| Error::InvalidArgument(format!("unknown color \"{s}\"")))
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        let channels: Vec<u32> = match hex.len() {
            3 => hex
                .chars()
                .map(|c| c.to_digit(16).map(|d| d * 0x11))
                .collect::<Option<_>>()?,
            6 => (0..3)
                .map(|i| u32::from_str_radix(&hex[2 * i..2 * i + 2], 16).ok())
                .collect::<Option<_>>()?,
            _ => return None,
        };

        Some(Self::from_rgb(
            channels[0] as f32 / 255.0,
            channels[1] as f32 / 255.0,
            channels[2] as f32 / 255.0,
        ))
    }

    fn parse_rgb_components(s: &str) -> Option<Self> {
        let mut channels = [0.0f32; 3];
        let mut parts = s.split(',');

        for c in &mut channels {
            let v: f32 = parts.next()?.trim().parse().ok()?;
            if !(0.0..=255.0).contains(&v) {
                return None;
            }
            *c = v / 255.0;
        }

        if parts.next().is_some() {
            return None;
        }

        Some(Self::from_rgb(channels[0], channels[1], channels[2]))
    }

    fn named(name: &str) -> Option<Self> {
        let rgb = match name.to_ascii_lowercase().as_str() {
            "black" => (0, 0, 0),
            "white" => (255, 255, 255),
            "red" => (255, 0, 0),
            "green" => (0, 128, 0),
            "lime" => (0, 255, 0),
            "blue" => (0, 0, 255),
            "yellow" => (255, 255, 0),
            "cyan" | "aqua" => (0, 255, 255),
            "magenta" | "fuchsia" => (255, 0, 255),
            "gray" | "grey" => (128, 128, 128),
            "silver" => (192, 192, 192),
            "maroon" => (128, 0, 0),
            "olive" => (128, 128, 0),
            "navy" => (0, 0, 128),
            "teal" => (0, 128, 128),
            "purple" => (128, 0, 128),
            "orange" => (255, 165, 0),
            "brown" => (165, 42, 42),
            "pink" => (255, 192, 203),
            _ => return None,
        };

        Some(Self::from_rgb(
            rgb.0 as f32 / 255.0,
            rgb.1 as f32 / 255.0,
            rgb.2 as f32 / 255.0,
        ))
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Hue of an RGB triple in [0, 1). 0 is red, 1/3 green, 2/3 blue.
/// Achromatic input has no hue; returns 0.
pub fn rgb_to_hue(red: f32, green: f32, blue: f32) -> f32 {
    let max = red.max(green).max(blue);
    let min = red.min(green).min(blue);

    if max == min {
        return 0.0;
    }

    let r = (max - red) / (max - min);
    let g = (max - green) / (max - min);
    let b = (max - blue) / (max - min);

    let mut hue = if red == max {
        b - g
    } else if green == max {
        2.0 + r - b
    } else {
        4.0 + g - r
    };
    hue /= 6.0;

    if hue < 0.0 {
        hue += 1.0;
    }
    if hue >= 1.0 {
        hue -= 1.0;
    }

    hue
}

pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> [f32; 3] {
    let mut hue_prime = hue * 6.0;
    if hue_prime == 6.0 {
        hue_prime = 0.0;
    }

    let chroma = value * saturation;
    let x = chroma * (1.0 - ((hue_prime % 2.0) - 1.0).abs());

    let mut rgb = match hue_prime {
        h if h < 1.0 => [chroma, x, 0.0],
        h if h < 2.0 => [x, chroma, 0.0],
        h if h < 3.0 => [0.0, chroma, x],
        h if h < 4.0 => [0.0, x, chroma],
        h if h < 5.0 => [x, 0.0, chroma],
        _ => [chroma, 0.0, x],
    };

    let m = value - chroma;
    for c in &mut rgb {
        *c += m;
    }

    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hues() {
        assert_eq!(rgb_to_hue(1.0, 0.0, 0.0), 0.0);
        assert!((rgb_to_hue(0.0, 1.0, 0.0) - 1.0 / 3.0).abs() < 1e-6);
        assert!((rgb_to_hue(0.0, 0.0, 1.0) - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(rgb_to_hue(0.5, 0.5, 0.5), 0.0);
    }

    #[test]
    fn hsv_round_trip() {
        for i in 0..60 {
            let h = i as f32 / 60.0;
            for (s, v) in [(1.0, 1.0), (0.5, 0.75), (0.9, 0.2)] {
                let c = Color::from_hsv(h, s, v);
                assert!((c.hue() - h).abs() < 1e-5, "hue {h} round tripped to {}", c.hue());
                assert!((c.saturation() - s).abs() < 1e-5);
                assert!((c.value() - v).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn cone_distance_properties() {
        let red = Color::from_rgb(1.0, 0.0, 0.0);
        let cyan = Color::from_rgb(0.0, 1.0, 1.0);
        let black = Color::from_rgb(0.0, 0.0, 0.0);

        assert_eq!(Color::cone_distance(red, red), 0.0);
        assert_eq!(Color::cone_distance(red, cyan), Color::cone_distance(cyan, red));
        // Opposite hues at full saturation sit a cone diameter apart.
        assert!((Color::cone_distance(red, cyan) - 1.0).abs() < 1e-6);
        assert!(Color::cone_distance(red, black) > 0.0);
    }

    #[test]
    fn parse_forms() {
        assert_eq!(Color::parse("red").unwrap(), Color::from_rgb(1.0, 0.0, 0.0));
        assert_eq!(Color::parse("#ff0000").unwrap(), Color::from_rgb(1.0, 0.0, 0.0));
        assert_eq!(Color::parse("#f00").unwrap(), Color::from_rgb(1.0, 0.0, 0.0));
        assert_eq!(Color::parse("rgb(255, 0, 0)").unwrap(), Color::from_rgb(1.0, 0.0, 0.0));

        let teal = Color::parse("rgb(0,128,128)").unwrap();
        assert!((teal.green - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Color::parse("").is_err());
        assert!(Color::parse("#12345").is_err());
        assert!(Color::parse("#gggggg").is_err());
        assert!(Color::parse("rgb(1,2)").is_err());
        assert!(Color::parse("rgb(256,0,0)").is_err());
        assert!(Color::parse("vermilion").is_err());
    }

    #[test]
    fn jitter_is_bounded() {
        use rand::rngs::SmallRng;
        use rand::SeedableRng;

        let mut rng = SmallRng::seed_from_u64(7);
        let base = Color::from_hsv(0.5, 0.8, 0.6);
        for _ in 0..200 {
            let c = base.jitter_hsv(&mut rng, 0.02);
            assert!((c.saturation() - 0.8).abs() <= 0.02 + 1e-5);
            assert!((c.value() - 0.6).abs() <= 0.02 + 1e-5);
        }
    }
}
