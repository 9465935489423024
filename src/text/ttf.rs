//! TrueType/OpenType glyph source.
//!
//! Loads an outline font file at runtime with ab_glyph (an emoji font such
//! as Noto Emoji, or a text face). Outline coverage is written as ink; the
//! rasterizer thresholds it, so edges never get dithered.
//!
//! There is no shaping engine here: a multi-codepoint cluster (skin tone,
//! ZWJ family) is drawn with the glyph of its base scalar and advances by
//! that glyph's width. It still moves as one unit.

use std::fs;
use std::path::Path;

use ab_glyph::{Font, FontVec, GlyphId, PxScale, ScaleFont, point};

use super::glyph::GlyphSource;
use crate::error::ThermoError;
use crate::label::image::LabelImage;

/// Glyph source backed by a font file.
pub struct TtfSource {
    name: String,
    font: FontVec,
}

impl TtfSource {
    /// Load a font file and register it under `name`.
    pub fn open(name: &str, path: impl AsRef<Path>) -> Result<Self, ThermoError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            ThermoError::Config(format!("Failed to read font {}: {}", path.display(), e))
        })?;
        Self::from_bytes(name, bytes).map_err(|e| match e {
            ThermoError::Config(msg) => ThermoError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse font data already in memory.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<Self, ThermoError> {
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| ThermoError::Config(format!("Invalid font data: {}", e)))?;
        Ok(Self {
            name: name.to_string(),
            font,
        })
    }

    /// Glyph for the cluster's base scalar, skipping `.notdef`.
    fn base_glyph(&self, cluster: &str) -> Option<GlyphId> {
        let base = cluster.chars().next()?;
        let id = self.font.glyph_id(base);
        (id.0 != 0).then_some(id)
    }
}

impl GlyphSource for TtfSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance(&self, cluster: &str, size: u32) -> Option<u32> {
        let id = self.base_glyph(cluster)?;
        let scaled = self.font.as_scaled(PxScale::from(size as f32));
        Some(scaled.h_advance(id).ceil().max(1.0) as u32)
    }

    fn line_height(&self, size: u32) -> u32 {
        let scaled = self.font.as_scaled(PxScale::from(size as f32));
        (scaled.ascent() - scaled.descent()).ceil().max(1.0) as u32
    }

    fn draw(&self, cluster: &str, size: u32, x: i32, y: i32, image: &mut LabelImage) {
        let Some(id) = self.base_glyph(cluster) else {
            return;
        };
        let pixel_height = size as f32;
        let scaled = self.font.as_scaled(PxScale::from(pixel_height));
        let baseline_y = y as f32 + scaled.ascent();

        let glyph = id.with_scale_and_position(pixel_height, point(x as f32, baseline_y));
        if let Some(outlined) = self.font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let gx = px as i32 + bounds.min.x as i32;
                let gy = py as i32 + bounds.min.y as i32;
                let ink = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                if ink > 0 {
                    image.put(gx, gy, ink);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_font_bytes() {
        let err = TtfSource::from_bytes("bad", vec![0, 1, 2, 3]).err().unwrap();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_missing_font_file() {
        let err = TtfSource::open("emoji", "/nonexistent/font.ttf").err().unwrap();
        assert!(err.to_string().contains("/nonexistent/font.ttf"));
    }
}
