//! # Rasterizer
//!
//! Converts an 8-bit [`LabelImage`] into the 1-bit packed bitmap the print
//! head consumes.
//!
//! ## Bit Layout
//!
//! ```text
//! Byte:    [b7 b6 b5 b4 b3 b2 b1 b0]
//! Pixel:   [x0 x1 x2 x3 x4 x5 x6 x7]
//! ```
//!
//! MSB is the leftmost dot, 1 is black. Rows are padded to whole bytes, so a
//! 1518-dot head takes 190 bytes per row with two spare bits.
//!
//! Binarization is a plain threshold (ink ≥ threshold is black). Text is the
//! only content, so there is no dithering.

use std::path::Path;

use image::{GrayImage, Luma};

use crate::error::ThermoError;
use crate::label::image::LabelImage;

/// Default ink threshold.
pub const DEFAULT_THRESHOLD: u8 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    /// Device raster width in dots
    pub width_dots: usize,
    /// Ink values at or above this print black. Must be at least 1.
    pub threshold: u8,
    /// Swap black and white
    pub invert: bool,
    /// Emit rows bottom-first for heads that feed upside down
    pub flip_vertical: bool,
}

impl RasterOptions {
    pub fn new(width_dots: usize) -> Self {
        Self {
            width_dots,
            threshold: DEFAULT_THRESHOLD,
            invert: false,
            flip_vertical: false,
        }
    }
}

/// Packed 1-bit image in device scan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    pub width_bytes: usize,
    pub data: Vec<u8>,
}

impl Bitmap {
    /// Packed bytes of row `y`.
    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.width_bytes..(y + 1) * self.width_bytes]
    }

    /// Whether dot (x, y) prints.
    pub fn is_black(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let byte = self.data[y * self.width_bytes + x / 8];
        (byte >> (7 - (x % 8))) & 1 == 1
    }

    /// Number of black dots.
    pub fn black_dots(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Grayscale preview image: black dots as 0, paper as 255.
    pub fn to_gray_image(&self) -> GrayImage {
        let mut img = GrayImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            for x in 0..self.width {
                let color = if self.is_black(x, y) { 0u8 } else { 255u8 };
                img.put_pixel(x as u32, y as u32, Luma([color]));
            }
        }
        img
    }

    /// Save a PNG preview.
    pub fn save_png(&self, path: &Path) -> Result<(), ThermoError> {
        self.to_gray_image()
            .save(path)
            .map_err(|e| ThermoError::Image(format!("Failed to save PNG: {}", e)))
    }
}

/// Pack a row of boolean pixels into bytes (MSB first).
///
/// ```
/// use thermopost::render::raster::pack_row;
///
/// let row = vec![true, true, true, true, false, false, false, false];
/// assert_eq!(pack_row(&row), vec![0xF0]);
///
/// let row = vec![true; 12];
/// assert_eq!(pack_row(&row), vec![0xFF, 0xF0]);
/// ```
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; pixels.len().div_ceil(8)];
    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            bytes[i / 8] |= 1 << (7 - (i % 8));
        }
    }
    bytes
}

/// Threshold and pack a label.
///
/// ## Errors
///
/// [`ThermoError::Raster`] when the label is not exactly `width_dots` wide,
/// its ink buffer disagrees with its dimensions, or the threshold is 0.
pub fn rasterize(label: &LabelImage, options: &RasterOptions) -> Result<Bitmap, ThermoError> {
    let (width, height) = (label.width(), label.height());
    if width != options.width_dots {
        return Err(ThermoError::Raster(format!(
            "Label is {} dots wide, device raster is {}",
            width, options.width_dots
        )));
    }
    if label.ink().len() != width * height {
        return Err(ThermoError::Raster(format!(
            "Ink buffer has {} values for a {}x{} label",
            label.ink().len(),
            width,
            height
        )));
    }
    if options.threshold == 0 {
        return Err(ThermoError::Raster("Threshold must be at least 1".to_string()));
    }

    let width_bytes = width.div_ceil(8);
    let mut data = Vec::with_capacity(width_bytes * height);
    let mut pixels = Vec::with_capacity(width);

    for row in 0..height {
        let y = if options.flip_vertical { height - 1 - row } else { row };
        pixels.clear();
        pixels.extend(
            label.ink()[y * width..(y + 1) * width]
                .iter()
                .map(|&ink| (ink >= options.threshold) != options.invert),
        );
        data.extend(pack_row(&pixels));
    }

    Ok(Bitmap {
        width,
        height,
        width_bytes,
        data,
    })
}
