//! # ESC/POS Protocol Implementation
//!
//! Command builders for the ESC/POS raster subset spoken by small thermal
//! printers, and the encoder that frames a label bitmap for the wire.
//!
//! ## Module Structure
//!
//! - [`commands`]: init, density, speed, line spacing, feeds
//! - [`graphics`]: `GS v 0` raster blocks
//! - [`encode`]: bitmap → setup, raster and feed frames
//!
//! ## Usage Example
//!
//! ```
//! use thermopost::printer::PrinterConfig;
//! use thermopost::protocol::encode::{EncodeOptions, FrameKind, encode};
//! use thermopost::render::raster::Bitmap;
//!
//! let printer = PrinterConfig::GENERIC_80MM;
//! let bitmap = Bitmap {
//!     width: 576,
//!     height: 300,
//!     width_bytes: 72,
//!     data: vec![0; 72 * 300],
//! };
//!
//! let frames = encode(&bitmap, &printer, &EncodeOptions::default()).unwrap();
//! assert_eq!(frames[0].kind, FrameKind::Setup);
//! // 300 rows at 255 per block
//! assert_eq!(frames.iter().filter(|f| f.kind == FrameKind::Raster).count(), 2);
//! ```

pub mod commands;
pub mod encode;
pub mod graphics;

pub use encode::{Density, EncodeOptions, Frame, FrameKind, encode};
