//! # Rendering Module
//!
//! Turns composed labels into device bitmaps.
//!
//! ## Modules
//!
//! - [`raster`]: threshold binarization, 1-bit packing and PNG previews
//!
//! ## Usage Example
//!
//! ```
//! use thermopost::label::LabelImage;
//! use thermopost::render::raster::{RasterOptions, rasterize};
//!
//! let mut label = LabelImage::new(576, 40);
//! label.fill_rect(10, 10, 100, 20);
//!
//! let bitmap = rasterize(&label, &RasterOptions::new(576)).unwrap();
//! assert_eq!(bitmap.width_bytes, 72);
//! assert_eq!(bitmap.black_dots(), 2000);
//! ```

pub mod raster;

pub use raster::{Bitmap, RasterOptions, rasterize};
