//! Spleen bitmap font glyph source.
//!
//! Uses the Spleen bitmap font family, scaled by whole multiples so glyph
//! edges stay crisp on the print head. The base cell is picked to land
//! closest to the requested point size.

use spleen_font::{FONT_6X12, FONT_8X16, FONT_12X24, PSF2Font};

use super::glyph::GlyphSource;
use crate::label::image::LabelImage;

/// One of the embedded Spleen cell sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpleenCell {
    S6x12,
    S8x16,
    S12x24,
}

impl SpleenCell {
    const ALL: [SpleenCell; 3] = [Self::S6x12, Self::S8x16, Self::S12x24];

    pub fn dims(self) -> (u32, u32) {
        match self {
            Self::S6x12 => (6, 12),
            Self::S8x16 => (8, 16),
            Self::S12x24 => (12, 24),
        }
    }

    fn font_data(self) -> &'static [u8] {
        match self {
            Self::S6x12 => FONT_6X12,
            Self::S8x16 => FONT_8X16,
            Self::S12x24 => FONT_12X24,
        }
    }
}

/// Base cell and integer scale used to render one point size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellScale {
    pub cell: SpleenCell,
    pub scale: u32,
}

impl CellScale {
    /// Pick the cell/scale pair whose scaled height is closest to `size`.
    /// Ties go to the larger base cell.
    pub fn for_size(size: u32) -> Self {
        let mut best = CellScale {
            cell: SpleenCell::S6x12,
            scale: 1,
        };
        let mut best_err = u32::MAX;
        for cell in SpleenCell::ALL {
            let (_, h) = cell.dims();
            let scale = ((size + h / 2) / h).max(1);
            let err = (h * scale).abs_diff(size);
            if err <= best_err {
                best = CellScale { cell, scale };
                best_err = err;
            }
        }
        best
    }

    pub fn width(self) -> u32 {
        self.cell.dims().0 * self.scale
    }

    pub fn height(self) -> u32 {
        self.cell.dims().1 * self.scale
    }
}

/// Glyph source backed by the embedded Spleen fonts.
pub struct SpleenSource {
    name: String,
}

impl SpleenSource {
    pub fn new() -> Self {
        Self {
            name: "spleen".to_string(),
        }
    }

    /// Visit the lit pixels of a glyph in cell coordinates.
    /// Returns false if the font has no glyph for the cluster.
    fn for_each_pixel(cell: SpleenCell, cluster: &str, mut f: impl FnMut(u32, u32)) -> bool {
        let Ok(mut font) = PSF2Font::new(cell.font_data()) else {
            return false;
        };
        let Some(glyph) = font.glyph_for_utf8(cluster.as_bytes()) else {
            return false;
        };
        for (row_y, row) in glyph.enumerate() {
            for (col_x, on) in row.enumerate() {
                if on {
                    f(col_x as u32, row_y as u32);
                }
            }
        }
        true
    }
}

impl Default for SpleenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphSource for SpleenSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance(&self, cluster: &str, size: u32) -> Option<u32> {
        let cs = CellScale::for_size(size);
        // Spleen maps single code points only
        if cluster.chars().count() != 1 {
            return None;
        }
        Self::for_each_pixel(cs.cell, cluster, |_, _| {}).then(|| cs.width())
    }

    fn line_height(&self, size: u32) -> u32 {
        CellScale::for_size(size).height()
    }

    fn draw(&self, cluster: &str, size: u32, x: i32, y: i32, image: &mut LabelImage) {
        let cs = CellScale::for_size(size);
        let s = cs.scale;
        Self::for_each_pixel(cs.cell, cluster, |gx, gy| {
            image.fill_rect(x + (gx * s) as i32, y + (gy * s) as i32, s, s);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_for_exact_sizes() {
        assert_eq!(CellScale::for_size(24).cell, SpleenCell::S12x24);
        assert_eq!(CellScale::for_size(24).scale, 1);
        assert_eq!(CellScale::for_size(16).cell, SpleenCell::S8x16);
        assert_eq!(CellScale::for_size(12).cell, SpleenCell::S6x12);
    }

    #[test]
    fn test_cell_for_scaled_sizes() {
        // 48 = 24 × 2 = 16 × 3 = 12 × 4, larger cell wins the tie
        let cs = CellScale::for_size(48);
        assert_eq!(cs.cell, SpleenCell::S12x24);
        assert_eq!(cs.scale, 2);
        // 32 = 16 × 2
        assert_eq!(CellScale::for_size(32).height(), 32);
    }

    #[test]
    fn test_tiny_size_uses_smallest_cell() {
        let cs = CellScale::for_size(4);
        assert_eq!(cs.cell, SpleenCell::S6x12);
        assert_eq!(cs.scale, 1);
    }

    #[test]
    fn test_ascii_is_covered() {
        let source = SpleenSource::new();
        assert_eq!(source.advance("A", 24), Some(12));
        assert_eq!(source.advance(" ", 24), Some(12));
        assert_eq!(source.advance("A", 48), Some(24));
    }

    #[test]
    fn test_multi_scalar_cluster_not_covered() {
        let source = SpleenSource::new();
        assert_eq!(source.advance("👨‍👩‍👧‍👦", 24), None);
    }

    #[test]
    fn test_draw_marks_pixels() {
        let source = SpleenSource::new();
        let mut img = LabelImage::new(48, 48);
        source.draw("W", 24, 0, 0, &mut img);
        assert!(img.inked_in_rows(0, 24) > 0);
        assert_eq!(img.inked_in_rows(24, 48), 0);
    }
}
