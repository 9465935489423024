//! # Print Transport Encoder
//!
//! Frames a packed bitmap into the byte blocks sent to the device.
//!
//! ## Frame Sequence
//!
//! ```text
//! Setup   ESC @ · ESC 7 n · ESC 3 n · ESC s n
//! Raster  GS v 0 0 xL xH yL yH + rows[0..chunk]
//! Raster  GS v 0 0 xL xH yL yH + rows[chunk..2·chunk]
//! ...
//! Feed    LF × min(remaining, 255)   (none when feed_lines is 0)
//! ```
//!
//! Each frame is written to the device in one call, so a failed write
//! identifies the frame that broke.

use serde::{Deserialize, Serialize};

use super::{commands, graphics};
use crate::error::ThermoError;
use crate::printer::PrinterConfig;
use crate::render::raster::Bitmap;

/// Print head heat setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Low,
    Medium,
    #[default]
    High,
}

impl Density {
    /// Byte sent with `ESC 7 n`.
    pub fn command_byte(self) -> u8 {
        match self {
            Density::Low => 2,
            Density::Medium => 4,
            Density::High => commands::MAX_DENSITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub density: Density,
    /// 1 (slowest) to 5
    pub speed: u8,
    /// Line feeds after the image
    pub feed_lines: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            density: Density::High,
            speed: 2,
            feed_lines: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Setup,
    Raster,
    Feed,
}

/// One block of bytes written to the device in a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub bytes: Vec<u8>,
}

/// Encode a bitmap for `printer`.
///
/// ## Errors
///
/// - [`ThermoError::Raster`] if the bitmap width differs from the printer's
///   raster width or the bitmap has no rows
/// - [`ThermoError::Config`] if the speed is outside 1..=5
pub fn encode(
    bitmap: &Bitmap,
    printer: &PrinterConfig,
    options: &EncodeOptions,
) -> Result<Vec<Frame>, ThermoError> {
    if bitmap.width != printer.width_dots as usize
        || bitmap.width_bytes != printer.width_bytes as usize
    {
        return Err(ThermoError::Raster(format!(
            "Bitmap is {} dots ({} bytes) wide, {} expects {} dots ({} bytes)",
            bitmap.width,
            bitmap.width_bytes,
            printer.name,
            printer.width_dots,
            printer.width_bytes
        )));
    }
    if bitmap.height == 0 {
        return Err(ThermoError::Raster("Bitmap has no rows".to_string()));
    }
    if bitmap.data.len() != bitmap.width_bytes * bitmap.height {
        return Err(ThermoError::Raster(format!(
            "Bitmap has {} bytes, expected {}",
            bitmap.data.len(),
            bitmap.width_bytes * bitmap.height
        )));
    }
    if !commands::SPEED_RANGE.contains(&options.speed) {
        return Err(ThermoError::Config(format!(
            "Print speed {} is outside {}..={}",
            options.speed,
            commands::SPEED_RANGE.start(),
            commands::SPEED_RANGE.end()
        )));
    }

    let mut frames = Vec::new();

    let mut setup = commands::init();
    setup.extend(commands::set_density(options.density.command_byte()));
    setup.extend(commands::line_spacing(printer.line_spacing));
    setup.extend(commands::set_speed(options.speed));
    frames.push(Frame {
        kind: FrameKind::Setup,
        bytes: setup,
    });

    let chunk_rows = printer.max_chunk_rows.max(1) as usize;
    let chunk_bytes = chunk_rows * bitmap.width_bytes;
    for chunk in bitmap.data.chunks(chunk_bytes) {
        let rows = (chunk.len() / bitmap.width_bytes) as u16;
        frames.push(Frame {
            kind: FrameKind::Raster,
            bytes: graphics::raster(printer.width_bytes, rows, chunk),
        });
    }

    for block in commands::line_feeds(options.feed_lines) {
        frames.push(Frame {
            kind: FrameKind::Feed,
            bytes: block,
        });
    }

    Ok(frames)
}
