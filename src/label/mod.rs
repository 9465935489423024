//! # Label
//!
//! Turns a post into a composed ink image one printer-width wide.
//!
//! - [`style`]: the four named type styles
//! - [`image`]: the 8-bit label canvas and its regions
//! - [`compose`]: region layout (username, title, body, tags)

pub mod compose;
pub mod image;
pub mod style;

pub use compose::{LayoutMetrics, compose, compose_banner};
pub use image::{LabelImage, RegionKind};
pub use style::{Alignment, StyleName, StyleSheet, TypeStyle};
