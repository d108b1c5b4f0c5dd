use std::path::PathBuf;

use clap::Parser;
use once_cell::sync::Lazy;

use crate::color::Color;
use crate::errors::{Error, Result};
use crate::metrics::{Length, LinearDensity};
use crate::raster::pattern::Pattern;
use crate::render::StereoParams;

// A good maximum separation puts the image plane at about the same distance
// as the viewer's reflection in the screen. The minimum can't be too close
// to the maximum or the viewer misconverges.
const MAX_SEPARATION_EYE_RATIO: f32 = 0.6;
const MIN_MAX_SEPARATION_RATIO: f32 = 0.65;

// This value times the max separation = how many rows down to go in the
// texture image to prevent echo at de-occlusion boundaries.
const EDGE_ECHO_OFFSET_RATIO: f32 = 0.1;

fn eye_separation_default() -> Length {
    Length::from_millimeters(62.0)
}

fn screen_width_default() -> Length {
    Length::from_inches(14.0)
}

#[derive(Debug, Parser)]
#[command(
    name = "sirds",
    about = "Generates single-image random-dot stereograms from depthmaps.",
    long_about = "Generates single-image random-dot stereograms from depthmaps.\n\n\
        The depthmap is either grayscale, where brighter pixels are nearer the\n\
        viewer, or rainbow, where redder hues are nearer. Rainbow depthmaps\n\
        give far more depth resolution than 8-bit grayscale.\n\n\
        Lengths are physical distances with a unit, like \"35mm\", \"1.5in\"\n\
        or \"2cm\", and are converted to pixels using the screen width."
)]
pub struct Opt {
    /// Depthmap image.
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output image.
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Maximum stereo separation. Defaults to 0.6 times the eye separation.
    #[arg(short = 'f', long, value_name = "LENGTH", value_parser = Length::parse)]
    pub separation_max: Option<Length>,

    /// Minimum stereo separation. Defaults to 0.65 times the maximum
    /// separation.
    #[arg(short = 'n', long, value_name = "LENGTH", value_parser = Length::parse)]
    pub separation_min: Option<Length>,

    /// Distance between the viewer's eyes. You probably want to leave this
    /// alone unless you're printing a poster.
    #[arg(short, long, value_name = "LENGTH", value_parser = Length::parse)]
    pub eye_separation: Option<Length>,

    /// Physical width of the display or print the stereogram is sized for.
    #[arg(short, long, value_name = "LENGTH", value_parser = Length::parse)]
    pub screen_width: Option<Length>,

    /// Texture image to use. A random texture is generated when omitted.
    #[arg(short, long, value_name = "FILE")]
    pub texture: Option<PathBuf>,

    /// Keep the texture image's height instead of rescaling it to preserve
    /// its aspect ratio in the output.
    #[arg(short, long)]
    pub preserve_height: bool,

    /// Add Poisson noise to the texture.
    #[arg(short = 'N', long)]
    pub noise: bool,

    /// Texture pattern to generate when no texture image is given: perlin,
    /// polygons, ellipses or dots. Picked at random when omitted.
    #[arg(short = 'P', long, value_name = "PATTERN", value_parser = Pattern::from_name)]
    pub pattern: Option<Pattern>,

    /// Seed color for generated textures: a name, "#rrggbb" or "rgb(r,g,b)".
    #[arg(short, long, value_name = "COLOR", value_parser = Color::parse)]
    pub color: Option<Color>,

    /// For texture inserted at the edges of foreground objects, how many
    /// rows to offset in the texture to prevent artifacts. Calculated from
    /// the maximum separation when omitted.
    #[arg(short = 'r', long, value_name = "ROWS", allow_hyphen_values = true)]
    pub echo_offset: Option<i64>,

    /// Random number generator seed, for reproducible textures.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

pub static OPTIONS: Lazy<Opt> = Lazy::new(Opt::parse);

pub fn init() {
    Lazy::force(&OPTIONS);
}

#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub stereo: StereoParams,
    pub density: LinearDensity,
}

/// Convert the physical lengths into pixels for the given output width and
/// check the stereo geometry preconditions.
pub fn resolve(opt: &Opt, output_width: usize) -> Result<Settings> {
    let screen_width = opt.screen_width.unwrap_or_else(screen_width_default);
    let density = LinearDensity::new(output_width as f32, screen_width);

    let eye_separation =
        density.count_per_length(opt.eye_separation.unwrap_or_else(eye_separation_default));

    let separation_max = opt
        .separation_max
        .map_or(MAX_SEPARATION_EYE_RATIO * eye_separation, |l| density.count_per_length(l));
    let separation_min = opt
        .separation_min
        .map_or(MIN_MAX_SEPARATION_RATIO * separation_max, |l| density.count_per_length(l));

    if separation_max <= 1.0 {
        return Err(Error::InvalidArgument(format!(
            "maximum separation ({separation_max:.2} pixels) must be more than one pixel"
        )));
    }
    if separation_min <= 0.0 || separation_min >= separation_max {
        return Err(Error::InvalidArgument(format!(
            "minimum separation ({separation_min:.2} pixels) must be positive and less than \
             the maximum separation ({separation_max:.2} pixels)"
        )));
    }
    if eye_separation <= separation_max {
        return Err(Error::InvalidArgument(format!(
            "eye separation ({eye_separation:.2} pixels) must be greater than the maximum \
             separation ({separation_max:.2} pixels)"
        )));
    }

    let edge_echo_offset =
        opt.echo_offset.unwrap_or((EDGE_ECHO_OFFSET_RATIO * separation_max) as i64);
    if edge_echo_offset == 0 {
        return Err(Error::InvalidArgument("edge echo offset must be nonzero".to_string()));
    }

    Ok(Settings {
        stereo: StereoParams { eye_separation, separation_min, separation_max, edge_echo_offset },
        density,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(extra: &[&str]) -> Opt {
        let mut args = vec!["sirds", "-i", "depth.png", "-o", "out.png"];
        args.extend_from_slice(extra);
        Opt::parse_from(args)
    }

    #[test]
    fn defaults_at_100dpi() {
        // 1400px on a 14in screen is 100 pixels per inch.
        let settings = resolve(&opt(&[]), 1400).unwrap();
        let stereo = settings.stereo;

        assert!((stereo.eye_separation - 244.094).abs() < 0.01);
        assert!((stereo.separation_max - 0.6 * stereo.eye_separation).abs() < 1e-3);
        assert!((stereo.separation_min - 0.65 * stereo.separation_max).abs() < 1e-3);
        assert_eq!(stereo.edge_echo_offset, (0.1 * stereo.separation_max) as i64);
    }

    #[test]
    fn explicit_separations() {
        let settings = resolve(&opt(&["-f", "2in", "-n", "1in", "-s", "14in"]), 1400).unwrap();
        assert!((settings.stereo.separation_max - 200.0).abs() < 1e-3);
        assert!((settings.stereo.separation_min - 100.0).abs() < 1e-3);
    }

    #[test]
    fn min_must_be_below_max() {
        let err = resolve(&opt(&["-f", "30mm", "-n", "40mm"]), 1400).unwrap_err();
        assert!(err.to_string().contains("minimum separation"), "{err}");
    }

    #[test]
    fn max_must_be_below_eye_separation() {
        let err = resolve(&opt(&["-f", "70mm"]), 1400).unwrap_err();
        assert!(err.to_string().contains("eye separation"), "{err}");
    }

    #[test]
    fn max_must_be_over_a_pixel() {
        let err = resolve(&opt(&["-f", "0.005in", "-n", "0.001in"]), 1400).unwrap_err();
        assert!(err.to_string().contains("more than one pixel"), "{err}");
    }

    #[test]
    fn echo_offset_must_be_nonzero() {
        let err = resolve(&opt(&["-r", "0"]), 1400).unwrap_err();
        assert!(err.to_string().contains("edge echo offset"), "{err}");

        let settings = resolve(&opt(&["-r", "-3"]), 1400).unwrap();
        assert_eq!(settings.stereo.edge_echo_offset, -3);
    }

    #[test]
    fn bad_values_are_rejected_by_the_parser() {
        assert!(Opt::try_parse_from(["sirds", "-i", "a", "-o", "b", "-f", "37"]).is_err());
        assert!(Opt::try_parse_from(["sirds", "-i", "a", "-o", "b", "-P", "tartan"]).is_err());
        assert!(Opt::try_parse_from(["sirds", "-i", "a", "-o", "b", "-c", "blurple"]).is_err());
    }
}
