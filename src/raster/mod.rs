use std::path::Path;

use image::imageops::FilterType;
use image::{Rgba32FImage, RgbaImage};
use rand::Rng;

use crate::color::Color;
use crate::errors::Result;

pub mod pattern;

/// RGBA float pixel buffer, row major, channels in [0, 1].
#[derive(Debug, Clone)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<f32>,
}

impl Image {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0.0; 4 * width * height] }
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let decoded = image::open(path)?.into_rgba32f();
        let (width, height) = decoded.dimensions();

        Ok(Self {
            width: width as usize,
            height: height as usize,
            pixels: decoded.into_raw(),
        })
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes: Vec<u8> =
            self.pixels.iter().map(|v| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8).collect();

        let out = RgbaImage::from_raw(self.width as u32, self.height as u32, bytes)
            .expect("pixel buffer length matches dimensions");
        out.save(path)?;

        Ok(())
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> [f32; 4] {
        assert!(x < self.width, "x = {x} is outside the image, width = {}", self.width);
        assert!(y < self.height, "y = {y} is outside the image, height = {}", self.height);

        let base = 4 * (y * self.width + x);
        self.pixels[base..base + 4].try_into().unwrap()
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, pixel: [f32; 4]) {
        debug_assert!(x < self.width && y < self.height);

        let base = 4 * (y * self.width + x);
        self.pixels[base..base + 4].copy_from_slice(&pixel);
    }

    pub fn set_pixel_color(&mut self, x: usize, y: usize, color: Color) {
        self.set_pixel(x, y, [color.red, color.green, color.blue, 1.0]);
    }

    pub fn fill(&mut self, color: Color) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.red, color.green, color.blue, 1.0]);
        }
    }

    pub fn pixels_mut(&mut self) -> &mut [f32] {
        &mut self.pixels
    }

    /// Resample to the given dimensions, preserving the RGBA float layout.
    pub fn scale(&mut self, width: usize, height: usize) {
        if self.width == width && self.height == height {
            return;
        }

        let buf =
            Rgba32FImage::from_raw(self.width as u32, self.height as u32, self.pixels.clone())
                .expect("pixel buffer length matches dimensions");
        let resized = image::imageops::resize(&buf, width as u32, height as u32, FilterType::Triangle);

        self.width = width;
        self.height = height;
        self.pixels = resized.into_raw();
    }

    /// Source-over blend of `overlay` onto self, scaling the overlay's alpha
    /// by `overlay_opacity`. Only the overlapping region is touched.
    pub fn blend_overlay(&mut self, overlay: &Self, overlay_opacity: f32) {
        let rows = self.height.min(overlay.height);
        let cols = self.width.min(overlay.width);

        for row in 0..rows {
            for col in 0..cols {
                let mut dest = self.pixel(col, row);
                let over = overlay.pixel(col, row);

                let overlay_alpha = over[3] * overlay_opacity;
                let dest_alpha = 1.0 - overlay_alpha;
                for i in 0..3 {
                    dest[i] = dest_alpha * dest[i] + overlay_alpha * over[i];
                }

                self.set_pixel(col, row, dest);
            }
        }
    }

    /// Replace each color channel with a Poisson sample of its 8-bit
    /// intensity. Alpha is left alone.
    pub fn add_noise<R: Rng>(&mut self, rng: &mut R) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            for v in &mut chunk[..3] {
                let mean = f64::from(v.clamp(0.0, 1.0)) * 255.0;
                *v = (poisson_sample(rng, mean) / 255.0).min(1.0) as f32;
            }
        }
    }
}

// Knuth's product method. Fine for means up to 255.
fn poisson_sample<R: Rng>(rng: &mut R, mean: f64) -> f64 {
    let limit = (-mean).exp();

    let mut k = 0u32;
    let mut product = 1.0f64;
    loop {
        product *= rng.random::<f64>();
        if product <= limit {
            break;
        }
        k += 1;
    }

    f64::from(k)
}
