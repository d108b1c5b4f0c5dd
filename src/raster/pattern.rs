// Synthetic texture generation. Every pattern tiles horizontally: objects
// crossing the left or right edge are redrawn shifted by one texture width,
// and the Perlin patterns sample noise around a closed circle.

use std::f32::consts::TAU;

use rand::Rng;

use super::Image;
use crate::color::Color;
use crate::errors::{Error, Result};
use crate::metrics::{Length, LinearDensity};
use crate::palette::Palette;
use crate::perlin::Perlin3d;
use crate::util::{lerp_float, rand_in_range, rand_in_range_int};

const OPACITY_MIN: f32 = 0.5;
const OPACITY_MAX: f32 = 1.0;

const OBJECT_RADIUS_MIN: Length = Length::from_meters(1.0e-3);
const OBJECT_RADIUS_MAX: Length = Length::from_meters(3.5e-3);

const PERLIN_INNER_LENGTH: Length = Length::from_meters(1.5e-3);
const PERLIN_OUTER_LENGTH: Length = Length::from_meters(6.0e-3);

const PERLIN_INNER_OPACITY: f32 = 0.6;
const PERLIN_OUTER_OPACITY: f32 = 0.8;

const DOT_WIDTH: Length = Length::from_meters(0.5e-3);

const CANVAS_GRAY: Color = Color::from_rgb(0.5, 0.5, 0.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Perlin,
    Polygons,
    Ellipses,
    Dots,
    Random,
}

impl Pattern {
    // Used by clap. "random" is spelled by omitting the flag.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "perlin" => Ok(Self::Perlin),
            "polygons" => Ok(Self::Polygons),
            "ellipses" => Ok(Self::Ellipses),
            "dots" => Ok(Self::Dots),
            _ => Err(Error::InvalidArgument(format!("invalid pattern type: {name}"))),
        }
    }
}

pub fn synthesize<R: Rng>(
    width: usize,
    height: usize,
    density: LinearDensity,
    pattern: Pattern,
    base_color: Color,
    rng: &mut R,
) -> Image {
    let pattern = match pattern {
        Pattern::Random => {
            const CHOICES: [Pattern; 4] =
                [Pattern::Perlin, Pattern::Polygons, Pattern::Ellipses, Pattern::Dots];
            CHOICES[(rng.random::<f32>() * CHOICES.len() as f32) as usize]
        }
        p => p,
    };

    if pattern == Pattern::Perlin {
        return perlin_texture(width, height, density, base_color, rng);
    }

    let palette = Palette::around_color(base_color, rng);

    match pattern {
        Pattern::Dots => dots_texture(width, height, density, &palette, rng),
        Pattern::Polygons | Pattern::Ellipses => {
            objects_texture(width, height, density, pattern, &palette, rng)
        }
        Pattern::Perlin | Pattern::Random => unreachable!(),
    }
}

fn objects_texture<R: Rng>(
    width: usize,
    height: usize,
    density: LinearDensity,
    pattern: Pattern,
    palette: &Palette,
    rng: &mut R,
) -> Image {
    let mut image = Image::new(width, height);
    image.fill(CANVAS_GRAY);

    let object_count = width * height / 20;
    let radius_min = density.count_per_length(OBJECT_RADIUS_MIN);
    let radius_max = density.count_per_length(OBJECT_RADIUS_MAX);

    for _ in 0..object_count {
        let x = rng.random::<f32>() * width as f32;
        let y = rng.random::<f32>() * height as f32;

        match pattern {
            Pattern::Ellipses => {
                draw_random_ellipse(&mut image, rng, palette, x, y, radius_min, radius_max);
            }
            Pattern::Polygons => {
                draw_random_polygon(&mut image, rng, palette, x, y, radius_min, radius_max);
            }
            _ => unreachable!(),
        }
    }

    image
}

fn draw_random_ellipse<R: Rng>(
    image: &mut Image,
    rng: &mut R,
    palette: &Palette,
    x: f32,
    y: f32,
    radius_min: f32,
    radius_max: f32,
) {
    let color = palette.random_jittered_color(rng);
    let opacity = rand_in_range(rng, OPACITY_MIN, OPACITY_MAX);

    let rx = rand_in_range(rng, radius_min, radius_max);
    let ry = rand_in_range(rng, radius_min, radius_max);

    let width = image.width() as f32;

    fill_ellipse(image, x, y, rx, ry, color, opacity);
    if x - rx < 0.0 {
        fill_ellipse(image, x + width, y, rx, ry, color, opacity);
    }
    if x + rx >= width {
        fill_ellipse(image, x - width, y, rx, ry, color, opacity);
    }
}

fn draw_random_polygon<R: Rng>(
    image: &mut Image,
    rng: &mut R,
    palette: &Palette,
    x: f32,
    y: f32,
    radius_min: f32,
    radius_max: f32,
) {
    let color = palette.random_jittered_color(rng);
    let opacity = rand_in_range(rng, OPACITY_MIN, OPACITY_MAX);

    let point_count = rand_in_range_int(rng, 3, 8) as usize;
    let mut points = Vec::with_capacity(point_count);
    for _ in 0..point_count {
        let angle = rng.random::<f32>() * TAU;
        let radius = rand_in_range(rng, radius_min, radius_max);
        points.push((x + radius * angle.cos(), y + radius * angle.sin()));
    }

    let width = image.width() as f32;

    fill_polygon(image, &points, color, opacity);
    if points.iter().any(|p| p.0 < 0.0) {
        let shifted: Vec<_> = points.iter().map(|p| (p.0 + width, p.1)).collect();
        fill_polygon(image, &shifted, color, opacity);
    }
    if points.iter().any(|p| p.0 >= width) {
        let shifted: Vec<_> = points.iter().map(|p| (p.0 - width, p.1)).collect();
        fill_polygon(image, &shifted, color, opacity);
    }
}

fn blend_pixel(image: &mut Image, x: usize, y: usize, color: Color, opacity: f32) {
    let mut pixel = image.pixel(x, y);
    pixel[0] = lerp_float(pixel[0], color.red, opacity);
    pixel[1] = lerp_float(pixel[1], color.green, opacity);
    pixel[2] = lerp_float(pixel[2], color.blue, opacity);
    pixel[3] = 1.0;
    image.set_pixel(x, y, pixel);
}

fn fill_span(image: &mut Image, x0: f32, x1: f32, y: i64, color: Color, opacity: f32) {
    if y < 0 || y >= image.height() as i64 || x1 < 0.0 || x0 >= image.width() as f32 {
        return;
    }

    let start = x0.max(0.0) as usize;
    let end = x1.min(image.width() as f32 - 1.0) as usize;

    for x in start..=end {
        blend_pixel(image, x, y as usize, color, opacity);
    }
}

fn fill_ellipse(image: &mut Image, cx: f32, cy: f32, rx: f32, ry: f32, color: Color, opacity: f32) {
    if rx <= 0.0 || ry <= 0.0 {
        return;
    }

    let y_min = (cy - ry).floor() as i64;
    let y_max = (cy + ry).ceil() as i64;

    for y in y_min..=y_max {
        let dy = (y as f32 + 0.5 - cy) / ry;
        if dy.abs() > 1.0 {
            continue;
        }
        let half = rx * (1.0 - dy * dy).sqrt();
        fill_span(image, cx - half, cx + half, y, color, opacity);
    }
}

// Scanline fill against pixel centers; even-odd rule.
fn fill_polygon(image: &mut Image, points: &[(f32, f32)], color: Color, opacity: f32) {
    if points.len() < 3 {
        return;
    }

    let mut y_min = f32::MAX;
    let mut y_max = f32::MIN;
    for (_, y) in points {
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }

    let y_min = (y_min.floor() as i64).max(0);
    let y_max = (y_max.ceil() as i64).min(image.height() as i64 - 1);

    let mut intersections = Vec::with_capacity(points.len());

    for y in y_min..=y_max {
        intersections.clear();
        let yf = y as f32 + 0.5;

        for i in 0..points.len() {
            let (x1, y1) = points[i];
            let (x2, y2) = points[(i + 1) % points.len()];

            if (y1 <= yf && y2 > yf) || (y2 <= yf && y1 > yf) {
                intersections.push(x1 + (yf - y1) / (y2 - y1) * (x2 - x1));
            }
        }

        intersections.sort_unstable_by(f32::total_cmp);
        for pair in intersections.chunks_exact(2) {
            fill_span(image, pair[0], pair[1], y, color, opacity);
        }
    }
}

fn dots_texture<R: Rng>(
    width: usize,
    height: usize,
    density: LinearDensity,
    palette: &Palette,
    rng: &mut R,
) -> Image {
    let mut image = Image::new(width, height);
    image.fill(CANVAS_GRAY);

    // At very low densities a dot can be under a pixel wide; round the spans
    // up so the grid still covers the canvas.
    let dot_width = density.count_per_length(DOT_WIDTH).max(1.0);

    let mut x = 0.0f32;
    while x < width as f32 {
        let mut y = 0.0f32;
        while y < height as f32 {
            let color = palette.random_jittered_color(rng);
            fill_rect(&mut image, x, y, x + dot_width, y + dot_width, color);
            y += dot_width;
        }
        x += dot_width;
    }

    image
}

fn fill_rect(image: &mut Image, x0: f32, y0: f32, x1: f32, y1: f32, color: Color) {
    let x_start = x0.max(0.0) as usize;
    let y_start = y0.max(0.0) as usize;
    if x_start >= image.width() || y_start >= image.height() {
        return;
    }
    let x_end = (x1.ceil() as usize).clamp(x_start + 1, image.width());
    let y_end = (y1.ceil() as usize).clamp(y_start + 1, image.height());

    for y in y_start..y_end {
        for x in x_start..x_end {
            image.set_pixel_color(x, y, color);
        }
    }
}

fn perlin_texture<R: Rng>(
    width: usize,
    height: usize,
    density: LinearDensity,
    base_color: Color,
    rng: &mut R,
) -> Image {
    let mut result = Image::new(width, height);
    result.fill(base_color);

    let mut overlay = Image::new(width, height);

    let inner_scale = density.count_per_length(PERLIN_INNER_LENGTH);
    let outer_scale = density.count_per_length(PERLIN_OUTER_LENGTH);

    render_perlin(&mut overlay, &Perlin3d::new(inner_scale, rng.random()), inner_color_map);
    result.blend_overlay(&overlay, PERLIN_INNER_OPACITY);

    render_perlin(&mut overlay, &Perlin3d::new(outer_scale, rng.random()), outer_color_map);
    result.blend_overlay(&overlay, PERLIN_OUTER_OPACITY);

    result
}

// Rows are sampled around a circle in the XZ plane whose circumference equals
// the texture width, so column 0 and column width-1 join up seamlessly and
// the noise's horizontal scale matches its vertical.
fn render_perlin(image: &mut Image, perlin: &Perlin3d, color_map: fn(f32) -> [f32; 4]) {
    let width = image.width();
    let radius = width as f32 / TAU;

    for row in 0..image.height() {
        for col in 0..width {
            let angle = col as f32 / width as f32 * TAU;
            let point = [radius * angle.cos(), row as f32, radius * angle.sin()];
            image.set_pixel(col, row, color_map(perlin.get(point)));
        }
    }
}

fn inner_color_map(input: f32) -> [f32; 4] {
    const THRESHOLD: f32 = 0.15;

    if input > -THRESHOLD && input < THRESHOLD {
        if input > 0.0 {
            [1.0, 1.0, 1.0, 1.0]
        } else {
            [0.0, 0.0, 0.0, 1.0]
        }
    } else {
        [0.0; 4]
    }
}

fn outer_color_map(input: f32) -> [f32; 4] {
    const INNER_THRESHOLD: f32 = 0.0;
    const OUTER_THRESHOLD: f32 = 0.1;

    if input.abs() > INNER_THRESHOLD && input.abs() < OUTER_THRESHOLD {
        if input > 0.0 {
            [1.0, 1.0, 1.0, 1.0]
        } else {
            [0.0, 0.0, 0.0, 1.0]
        }
    } else {
        [0.0; 4]
    }
}
