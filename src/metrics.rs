// Physical lengths and pixels-per-length conversions. Stereo separations are
// specified as physical distances (62mm eye separation, 14in display) and
// converted to pixels based on the output image width.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{Error, Result};

const METERS_PER_CENTIMETER: f32 = 0.01;
const METERS_PER_MILLIMETER: f32 = 0.001;
const METERS_PER_INCH: f32 = 0.0254;

static LENGTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*([+-]?\d+(?:\.\d+)?)\s*([a-zA-Z"]+)\s*$"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Length {
    meters: f32,
}

impl Length {
    pub const fn from_meters(meters: f32) -> Self {
        Self { meters }
    }

    pub fn from_centimeters(centimeters: f32) -> Self {
        Self::from_meters(centimeters * METERS_PER_CENTIMETER)
    }

    pub fn from_millimeters(millimeters: f32) -> Self {
        Self::from_meters(millimeters * METERS_PER_MILLIMETER)
    }

    pub fn from_inches(inches: f32) -> Self {
        Self::from_meters(inches * METERS_PER_INCH)
    }

    pub const fn meters(self) -> f32 {
        self.meters
    }

    // Used by clap; FromStr delegates here.
    pub fn parse(s: &str) -> Result<Self> {
        let caps = LENGTH_RE
            .captures(s)
            .ok_or_else(|| Error::InvalidArgument(format!("cannot parse length \"{s}\"")))?;

        let scalar: f32 = caps[1]
            .parse()
            .map_err(|_| Error::InvalidArgument(format!("cannot parse length \"{s}\"")))?;

        match &caps[2] {
            "meters" | "meter" | "m" => Ok(Self::from_meters(scalar)),
            "centimeters" | "centimeter" | "cm" => Ok(Self::from_centimeters(scalar)),
            "millimeters" | "millimeter" | "mm" => Ok(Self::from_millimeters(scalar)),
            "inches" | "inch" | "in" | "\"" => Ok(Self::from_inches(scalar)),
            unit => Err(Error::InvalidArgument(format!("unrecognized length unit \"{unit}\""))),
        }
    }
}

impl FromStr for Length {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A count of things (pixels) per physical length.
#[derive(Debug, Clone, Copy)]
pub struct LinearDensity {
    count: f32,
    length: Length,
}

impl LinearDensity {
    pub const fn new(count: f32, length: Length) -> Self {
        Self { count, length }
    }

    /// How many counts fit in `length` at this density.
    pub fn count_per_length(self, length: Length) -> f32 {
        length.meters() / self.length.meters() * self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_meters(s: &str, expected: f32) {
        let len = Length::parse(s).unwrap();
        assert!(
            (len.meters() - expected).abs() < 1e-3,
            "{s} parsed to {}m, expected {expected}m",
            len.meters()
        );
    }

    #[test]
    fn parse_equivalent_forms() {
        assert_meters("43.8 meters", 43.8);
        assert_meters("43.8meters", 43.8);
        assert_meters("43.8m", 43.8);
        assert_meters("4380cm", 43.8);
        assert_meters("43800 mm", 43.8);
        assert_meters("1724.409 inches", 43.8);
        assert_meters("1724.409\"", 43.8);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Length::parse("").is_err());
        assert!(Length::parse("43.8").is_err());
        assert!(Length::parse("meters").is_err());
        assert!(Length::parse("12 parsecs").is_err());
        assert!(Length::parse("1x2cm").is_err());
    }

    #[test]
    fn unit_conversions() {
        assert!((Length::from_inches(1.0).meters() - 0.0254).abs() < 1e-6);
        assert!((Length::from_millimeters(62.0).meters() - 0.062).abs() < 1e-6);
        assert!((Length::from_centimeters(100.0).meters() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn density_conversions() {
        // A 1400px wide image on a 14in display is 100dpi.
        let density = LinearDensity::new(1400.0, Length::from_inches(14.0));
        assert!((density.count_per_length(Length::from_inches(1.0)) - 100.0).abs() < 1e-3);
        assert!((density.count_per_length(Length::from_millimeters(62.0)) - 244.094).abs() < 0.01);
    }
}
