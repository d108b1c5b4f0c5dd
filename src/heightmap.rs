use std::path::Path;

use crate::color::rgb_to_hue;
use crate::errors::Result;
use crate::raster::Image;

/// A depth source wrapping an image. Depth samples are in [0, 1] with 1
/// nearest the viewer.
///
/// Two encodings are supported and detected at load time from the top-left
/// pixel: grayscale (depth is the red channel) and rainbow (depth is the hue,
/// which survives 8-bit quantization with far more depth resolution).
#[derive(Debug)]
pub struct Heightmap {
    image: Image,
    rainbow: bool,
}

impl Heightmap {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let image = Image::read(path)?;

        let pixel = image.pixel(0, 0);
        let rainbow = pixel[0] != pixel[1] || pixel[0] != pixel[2];

        Ok(Self { image, rainbow })
    }

    #[cfg(test)]
    pub fn from_image(image: Image) -> Self {
        let pixel = image.pixel(0, 0);
        let rainbow = pixel[0] != pixel[1] || pixel[0] != pixel[2];
        Self { image, rainbow }
    }

    pub const fn rainbow(&self) -> bool {
        self.rainbow
    }

    pub fn width(&self) -> usize {
        self.image.width()
    }

    pub fn height(&self) -> usize {
        self.image.height()
    }

    /// A sampling view for one row solver. The solver flips `reflected` back
    /// and forth mid-row, so each worker gets its own copy of that state.
    pub fn view(&self) -> HeightmapView {
        HeightmapView { map: self, reflected: false }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HeightmapView<'a> {
    map: &'a Heightmap,
    reflected: bool,
}

impl HeightmapView<'_> {
    pub fn set_reflected(&mut self, reflected: bool) {
        self.reflected = reflected;
    }

    pub fn width(&self) -> usize {
        self.map.width()
    }

    pub fn get(&self, x: f32, row: usize) -> f32 {
        let x = if self.reflected { self.map.width() as f32 - x } else { x };

        let pixel = self.map.image.pixel(x as usize, row);

        if self.map.rainbow {
            rgb_to_hue(pixel[0], pixel[1], pixel[2])
        } else {
            pixel[0]
        }
    }
}
