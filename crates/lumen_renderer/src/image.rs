//! Output image buffer and writers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::Color;

/// 8-bit RGB pixel.
pub type Pixel = [u8; 3];

/// Largest channel value written to PPM headers.
pub const MAX_COLOR: u8 = 255;

/// Errors that can occur while writing an image.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Buffer of {len} pixels does not match {width}x{height}")]
    SizeMismatch { width: u32, height: u32, len: usize },
}

/// Clamp a value to [0, 1] range.
#[inline]
pub fn clamp_01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Convert a linear color to 8-bit RGB, clamping out-of-range channels.
pub fn color_to_rgb(color: Color) -> Pixel {
    let channel = |c: f32| (f32::from(MAX_COLOR) * clamp_01(c)) as u8;
    [channel(color.x), channel(color.y), channel(color.z)]
}

/// Row-major RGB image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Pixel>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 3]; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Pixel {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, pixel: Pixel) {
        let index = self.index(x, y);
        self.pixels[index] = pixel;
    }

    /// Row-major offset of (x, y), computed in `usize` so large images don't overflow.
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    /// Write an ASCII (P3) PPM to `writer`, one image row per line.
    pub fn write_ppm_to<W: Write>(&self, mut writer: W) -> Result<(), ImageError> {
        writeln!(writer, "P3")?;
        writeln!(writer, "{} {}", self.width, self.height)?;
        writeln!(writer, "{}", MAX_COLOR)?;

        for row in self.pixels.chunks(self.width.max(1) as usize) {
            let line: Vec<String> = row
                .iter()
                .map(|[r, g, b]| format!("{r} {g} {b}"))
                .collect();
            writeln!(writer, "{}", line.join("\t"))?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write an ASCII PPM file.
    pub fn write_ppm<P: AsRef<Path>>(&self, path: P) -> Result<(), ImageError> {
        let file = File::create(path)?;
        self.write_ppm_to(BufWriter::new(file))
    }

    /// Save the image; `.ppm` is written as ASCII PPM, anything else goes
    /// through the `image` crate's encoders (PNG, JPEG, ...).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ImageError> {
        let path = path.as_ref();
        let is_ppm = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ppm"));

        if is_ppm {
            self.write_ppm(path)?;
        } else {
            self.to_rgb_image()?.save(path)?;
        }

        log::info!("Saved {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }

    /// Copy into an `image::RgbImage`.
    pub fn to_rgb_image(&self) -> Result<image::RgbImage, ImageError> {
        let raw: Vec<u8> = self.pixels.iter().flatten().copied().collect();
        image::RgbImage::from_raw(self.width, self.height, raw).ok_or(ImageError::SizeMismatch {
            width: self.width,
            height: self.height,
            len: self.pixels.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_to_rgb_clamps() {
        assert_eq!(color_to_rgb(Color::ZERO), [0, 0, 0]);
        assert_eq!(color_to_rgb(Color::ONE), [255, 255, 255]);
        assert_eq!(color_to_rgb(Color::new(2.0, -1.0, 0.5)), [255, 0, 127]);
    }

    #[test]
    fn test_set_get() {
        let mut image = ImageBuffer::new(3, 2);
        image.set(2, 1, [1, 2, 3]);

        assert_eq!(image.get(2, 1), [1, 2, 3]);
        assert_eq!(image.pixels()[5], [1, 2, 3]);
        assert_eq!(image.get(0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_index_does_not_overflow_u32() {
        let image = ImageBuffer {
            width: 70_000,
            height: 70_000,
            pixels: Vec::new(),
        };
        assert_eq!(image.index(5, 69_999), 69_999usize * 70_000 + 5);
    }

    #[test]
    fn test_write_ppm() {
        let mut image = ImageBuffer::new(2, 2);
        image.set(1, 0, [255, 0, 0]);
        image.set(0, 1, [0, 0, 255]);

        let mut out = Vec::new();
        image.write_ppm_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text, "P3\n2 2\n255\n0 0 0\t255 0 0\n0 0 255\t0 0 0\n");
    }

    #[test]
    fn test_to_rgb_image() {
        let mut image = ImageBuffer::new(2, 1);
        image.set(1, 0, [10, 20, 30]);

        let rgb = image.to_rgb_image().unwrap();
        assert_eq!(rgb.get_pixel(1, 0).0, [10, 20, 30]);
    }
}
