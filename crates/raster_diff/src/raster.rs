//! Owned RGBA8 rasters and their PNG codec.

use crate::error::ComparisonError;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder as _, RgbaImage, load_from_memory};
use serde::Serialize;

/// Bytes per RGBA8 pixel.
pub const CHANNELS: usize = 4;

/// Width and height of a raster, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RasterSize {
    pub width: u32,
    pub height: u32,
}

impl RasterSize {
    /// Number of pixels covered by this size.
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether either dimension is zero.
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Elementwise minimum of two sizes.
    pub fn overlap(self, other: Self) -> Self {
        Self {
            width: self.width.min(other.width),
            height: self.height.min(other.height),
        }
    }
}

/// Raw RGBA image data with dimensions.
///
/// The pixel buffer length always equals `width * height * 4`; every
/// constructor checks it, so a `Raster` that exists is well formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// Wrap a row-major RGBA8 buffer.
    ///
    /// # Errors
    ///
    /// Returns `ComparisonError::MalformedRaster` if the buffer length does not
    /// match the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ComparisonError> {
        let expected = width as usize * height as usize * CHANNELS;
        if pixels.len() != expected {
            return Err(ComparisonError::MalformedRaster {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A raster filled with a single colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * CHANNELS);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Decode PNG (or any format enabled on the `image` crate) into RGBA8.
    ///
    /// # Errors
    ///
    /// Returns `ComparisonError::Decode` if the bytes are not a readable image.
    pub fn decode_png(bytes: &[u8]) -> Result<Self, ComparisonError> {
        let decoded = load_from_memory(bytes)
            .map_err(|err| ComparisonError::Decode(err.to_string()))?;
        Ok(decoded.to_rgba8().into())
    }

    /// Encode this raster as PNG.
    ///
    /// # Errors
    ///
    /// Returns `ComparisonError::Encode` if PNG encoding fails.
    pub fn encode_png(&self) -> Result<Vec<u8>, ComparisonError> {
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(&self.pixels, self.width, self.height, ColorType::Rgba8.into())
            .map_err(|err| ComparisonError::Encode(err.to_string()))?;
        Ok(buf)
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn size(&self) -> RasterSize {
        RasterSize {
            width: self.width,
            height: self.height,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The RGBA value at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x_pos: u32, y_pos: u32) -> Option<[u8; 4]> {
        if x_pos >= self.width || y_pos >= self.height {
            return None;
        }
        let idx = (y_pos as usize * self.width as usize + x_pos as usize) * CHANNELS;
        let px = self.pixels.get(idx..idx + CHANNELS)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Overwrite the pixel at `(x, y)`; writes outside the canvas are ignored.
    pub fn set_pixel(&mut self, x_pos: u32, y_pos: u32, rgba: [u8; 4]) {
        if x_pos >= self.width || y_pos >= self.height {
            return;
        }
        let idx = (y_pos as usize * self.width as usize + x_pos as usize) * CHANNELS;
        if let Some(px) = self.pixels.get_mut(idx..idx + CHANNELS) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Row `y` restricted to the first `width` pixels.
    pub(crate) fn row_prefix(&self, y_pos: u32, width: u32) -> &[u8] {
        let start = y_pos as usize * self.width as usize * CHANNELS;
        let len = width.min(self.width) as usize * CHANNELS;
        self.pixels.get(start..start + len).unwrap_or(&[])
    }
}

impl From<RgbaImage> for Raster {
    fn from(img: RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            pixels: img.into_raw(),
        }
    }
}
