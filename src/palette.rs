use rand::Rng;

use crate::color::Color;
use crate::util::{rand_in_range, rand_index};

const PALETTE_COLOR_MAX: usize = 256;

const MAX_JITTER: f32 = 0.02;
const MIN_COLOR_DISTANCE: f32 = 0.15;
const HUE_RADIUS: f32 = 0.17;
const SATURATION_RADIUS: f32 = 0.5;
const VALUE_RADIUS: f32 = 0.5;
const MIN_SATURATION: f32 = 0.2;
const MAX_COLOR_TRY_COUNT: usize = 50;

/// A set of colors scattered around a base color, far enough apart from each
/// other to read as distinct in the finished texture.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    pub fn around_color<R: Rng>(base: Color, rng: &mut R) -> Self {
        let mut colors: Vec<Color> = Vec::with_capacity(PALETTE_COLOR_MAX);

        for _ in 0..PALETTE_COLOR_MAX {
            let mut color = base;
            for try_count in 0.. {
                if try_count >= MAX_COLOR_TRY_COUNT {
                    // Accept a crowded color rather than spin forever.
                    break;
                }
                color = base.jittered(rng, HUE_RADIUS, SATURATION_RADIUS, VALUE_RADIUS);
                if !too_close(&colors, color) {
                    break;
                }
            }
            colors.push(color);
        }

        Self { colors }
    }

    pub fn random_jittered_color<R: Rng>(&self, rng: &mut R) -> Color {
        let color = self.colors[rand_index(rng, self.colors.len())];

        color.jitter_hsv(rng, MAX_JITTER)
    }
}

fn too_close(colors: &[Color], candidate: Color) -> bool {
    colors.iter().any(|c| Color::cone_distance(*c, candidate) < MIN_COLOR_DISTANCE)
}

/// A random fully-usable seed color for when the user didn't pick one.
/// Low-saturation seeds wash the whole texture out, so saturation is floored.
pub fn random_base_color<R: Rng>(rng: &mut R) -> Color {
    let hue = rng.random::<f32>();
    let saturation = rand_in_range(rng, MIN_SATURATION, 1.0);
    let value = rng.random::<f32>();

    Color::from_hsv(hue, saturation, value)
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn full_palette_of_valid_colors() {
        let mut rng = SmallRng::seed_from_u64(3);
        let palette = Palette::around_color(Color::from_rgb(0.8, 0.3, 0.1), &mut rng);

        assert_eq!(palette.colors.len(), 256);
        for c in &palette.colors {
            for channel in [c.red, c.green, c.blue] {
                assert!((0.0..=1.0).contains(&channel));
            }
        }
    }

    #[test]
    fn deterministic_for_a_seed() {
        let base = Color::from_rgb(0.2, 0.5, 0.9);
        let a = Palette::around_color(base, &mut SmallRng::seed_from_u64(11));
        let b = Palette::around_color(base, &mut SmallRng::seed_from_u64(11));
        assert_eq!(a.colors, b.colors);
    }

    #[test]
    fn jittered_colors_stay_valid() {
        let mut rng = SmallRng::seed_from_u64(21);
        let palette = Palette::around_color(Color::from_rgb(0.1, 0.7, 0.4), &mut rng);
        for _ in 0..100 {
            let c = palette.random_jittered_color(&mut rng);
            for channel in [c.red, c.green, c.blue] {
                assert!((0.0..=1.0).contains(&channel));
            }
        }
    }

    #[test]
    fn base_color_saturation_floor() {
        let mut rng = SmallRng::seed_from_u64(8);
        for _ in 0..100 {
            let c = random_base_color(&mut rng);
            if c.value() > 0.01 {
                assert!(c.saturation() >= MIN_SATURATION - 1e-5);
            }
        }
    }
}
