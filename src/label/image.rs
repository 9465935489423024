//! # Label Image
//!
//! An 8-bit ink canvas one printer-width wide. Glyph sources draw into it;
//! the rasterizer turns it into a 1-bit [`Bitmap`](crate::render::raster::Bitmap).
//!
//! Ink values run from 0 (bare paper) to 255 (full ink). Bitmap fonts only
//! ever write 0 or 255; outline fonts write their coverage.

/// Named vertical band of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    Username,
    Title,
    Body,
    Tags,
    Banner,
    /// Blank spacing between two content regions
    Gap,
}

/// A vertical band `[y, y + height)` of the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub y: usize,
    pub height: usize,
}

/// Composed label, built by the composer and read by the rasterizer.
#[derive(Debug, Clone)]
pub struct LabelImage {
    width: usize,
    height: usize,
    ink: Vec<u8>,
    regions: Vec<Region>,
}

impl LabelImage {
    /// Blank label of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ink: vec![0; width * height],
            regions: Vec::new(),
        }
    }

    /// Wrap an existing ink buffer without checking its length.
    ///
    /// The rasterizer rejects buffers that disagree with `width × height`.
    pub fn from_raw(width: usize, height: usize, ink: Vec<u8>) -> Self {
        Self {
            width,
            height,
            ink,
            regions: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major ink buffer.
    pub fn ink(&self) -> &[u8] {
        &self.ink
    }

    /// Ink at (x, y), 0 outside the canvas.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.ink.get(y * self.width + x).copied().unwrap_or(0)
    }

    /// Add ink at (x, y). Overlapping glyphs keep the darker value.
    /// Coordinates outside the canvas are clipped.
    pub fn put(&mut self, x: i32, y: i32, ink: u8) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y * self.width + x;
        if let Some(px) = self.ink.get_mut(idx) {
            *px = (*px).max(ink);
        }
    }

    /// Fill the rectangle `[x, x + w) × [y, y + h)` with full ink.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32) {
        for py in y..y + h as i32 {
            for px in x..x + w as i32 {
                self.put(px, py, 255);
            }
        }
    }

    /// Number of pixels with any ink in the rows `[y0, y1)`.
    pub fn inked_in_rows(&self, y0: usize, y1: usize) -> usize {
        let y1 = y1.min(self.height);
        (y0..y1)
            .map(|y| {
                self.ink[y * self.width..(y + 1) * self.width]
                    .iter()
                    .filter(|&&v| v > 0)
                    .count()
            })
            .sum()
    }

    /// Rightmost inked column in rows `[y0, y1)`, if any.
    pub fn right_edge_in_rows(&self, y0: usize, y1: usize) -> Option<usize> {
        let y1 = y1.min(self.height);
        (y0..y1)
            .filter_map(|y| {
                let row = &self.ink[y * self.width..(y + 1) * self.width];
                row.iter().rposition(|&v| v > 0)
            })
            .max()
    }

    pub(crate) fn push_region(&mut self, kind: RegionKind, y: usize, height: usize) {
        self.regions.push(Region { kind, y, height });
    }

    /// All regions, top to bottom, including gaps.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// The content region of the given kind, if it has any lines.
    pub fn region(&self, kind: RegionKind) -> Option<&Region> {
        self.regions.iter().find(|r| r.kind == kind)
    }

    /// Height of a content region, 0 when it collapsed.
    pub fn region_height(&self, kind: RegionKind) -> usize {
        self.region(kind).map_or(0, |r| r.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_blank() {
        let img = LabelImage::new(16, 4);
        assert_eq!(img.ink().len(), 64);
        assert!(img.ink().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_put_clips_and_keeps_darkest() {
        let mut img = LabelImage::new(4, 4);
        img.put(-1, 0, 255);
        img.put(4, 0, 255);
        img.put(1, 1, 200);
        img.put(1, 1, 50);
        assert_eq!(img.get(1, 1), 200);
        assert_eq!(img.inked_in_rows(0, 4), 1);
    }

    #[test]
    fn test_right_edge() {
        let mut img = LabelImage::new(10, 3);
        img.fill_rect(2, 1, 5, 1);
        assert_eq!(img.right_edge_in_rows(0, 3), Some(6));
        assert_eq!(img.right_edge_in_rows(2, 3), None);
    }

    #[test]
    fn test_region_lookup() {
        let mut img = LabelImage::new(8, 20);
        img.push_region(RegionKind::Username, 0, 10);
        img.push_region(RegionKind::Gap, 10, 4);
        img.push_region(RegionKind::Body, 14, 6);
        assert_eq!(img.region_height(RegionKind::Body), 6);
        assert_eq!(img.region_height(RegionKind::Title), 0);
    }
}
