//! # Text
//!
//! Glyph sources and the text shaper.
//!
//! - [`glyph`]: the [`GlyphSource`](glyph::GlyphSource) capability and the
//!   named [`GlyphLibrary`](glyph::GlyphLibrary) with its fallback chain
//! - [`spleen`]: built-in bitmap font source
//! - [`ttf`]: outline font files loaded at runtime (emoji fonts)
//! - [`shape`]: grapheme-cluster measuring and greedy line wrapping

pub mod glyph;
pub mod shape;
pub mod spleen;
pub mod ttf;

pub use glyph::{GlyphLibrary, GlyphSource};
pub use shape::{ShapedLine, shape, shape_tags};
