//! # Glyph Sources
//!
//! A glyph source is anything that can measure and draw a grapheme cluster
//! at a given point size. Sources are registered by name in a
//! [`GlyphLibrary`]; each type style names its primary source, and the
//! library's fallback list is tried next (typically an emoji font).
//!
//! ```text
//! cluster ──► primary source ──► fallback 1 ──► fallback 2 ──► placeholder
//!               (covers?)          (covers?)       (covers?)     (box, warn)
//! ```
//!
//! Point sizes are cell heights in printer dots.

use log::warn;

use crate::error::ThermoError;
use crate::label::image::LabelImage;

/// Capability: "can measure and render cluster C at size S".
pub trait GlyphSource: Send + Sync {
    /// Registry name of this source.
    fn name(&self) -> &str;

    /// Advance width of `cluster` at `size`, or `None` when the source has
    /// no glyph for it.
    fn advance(&self, cluster: &str, size: u32) -> Option<u32>;

    /// Height of one line box at `size`.
    fn line_height(&self, size: u32) -> u32;

    /// Draw a covered cluster with its line box's top-left corner at (x, y).
    fn draw(&self, cluster: &str, size: u32, x: i32, y: i32, image: &mut LabelImage);
}

/// Which source a shaped cluster was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphRef {
    /// Index into the library's source list
    Source(usize),
    /// No source covered the cluster
    Placeholder,
}

/// Result of resolving one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub glyph: GlyphRef,
    pub advance: u32,
}

/// Width used for clusters no source can measure.
///
/// Half the point size, so a missing glyph still occupies visible space.
pub fn placeholder_advance(size: u32) -> u32 {
    (size / 2).max(1)
}

/// Ordered collection of named glyph sources.
#[derive(Default)]
pub struct GlyphLibrary {
    sources: Vec<Box<dyn GlyphSource>>,
    fallbacks: Vec<usize>,
}

impl GlyphLibrary {
    /// Empty library; every cluster resolves to the placeholder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Library with the built-in Spleen bitmap source registered as `"spleen"`.
    pub fn with_builtin() -> Self {
        let mut lib = Self::new();
        lib.register(Box::new(super::spleen::SpleenSource::new()));
        lib
    }

    /// Register a source. A source with the same name is replaced in place.
    pub fn register(&mut self, source: Box<dyn GlyphSource>) -> usize {
        if let Some(idx) = self.index_of(source.name()) {
            self.sources[idx] = source;
            idx
        } else {
            self.sources.push(source);
            self.sources.len() - 1
        }
    }

    /// Append a registered source to the fallback chain.
    pub fn add_fallback(&mut self, name: &str) -> Result<(), ThermoError> {
        let idx = self
            .index_of(name)
            .ok_or_else(|| ThermoError::Config(format!("Unknown glyph source '{}'", name)))?;
        if !self.fallbacks.contains(&idx) {
            self.fallbacks.push(idx);
        }
        Ok(())
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.sources.iter().position(|s| s.name() == name)
    }

    /// Look up a source by name.
    pub fn source(&self, name: &str) -> Option<&dyn GlyphSource> {
        self.index_of(name).map(|idx| self.sources[idx].as_ref())
    }

    /// Names of all registered sources, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Resolve a cluster against `primary`, then the fallbacks.
    ///
    /// Falls back to [`placeholder_advance`] and logs a warning when no
    /// source covers the cluster.
    pub fn resolve(&self, cluster: &str, primary: &str, size: u32) -> Resolved {
        let primary_idx = self.index_of(primary);
        let order = primary_idx
            .into_iter()
            .chain(self.fallbacks.iter().copied().filter(|&i| Some(i) != primary_idx));

        for idx in order {
            if let Some(advance) = self.sources[idx].advance(cluster, size) {
                return Resolved {
                    glyph: GlyphRef::Source(idx),
                    advance,
                };
            }
        }

        let advance = placeholder_advance(size);
        let error = ThermoError::Shaping(format!(
            "no glyph for {:?} ({}) in any source",
            cluster,
            codepoints(cluster)
        ));
        warn!("{}, using placeholder width {}", error, advance);
        Resolved {
            glyph: GlyphRef::Placeholder,
            advance,
        }
    }

    /// Line box height for a style's primary source.
    pub fn line_height(&self, primary: &str, size: u32) -> u32 {
        self.source(primary)
            .map_or(size, |s| s.line_height(size))
            .max(1)
    }

    /// Line box height that fits `primary` and every source in `used`.
    ///
    /// A fallback face (an emoji font, typically) can be taller than the
    /// style's own source at the same point size.
    pub fn tallest_line_height(
        &self,
        primary: &str,
        size: u32,
        used: impl IntoIterator<Item = GlyphRef>,
    ) -> u32 {
        used.into_iter()
            .filter_map(|glyph| match glyph {
                GlyphRef::Source(idx) => self.sources.get(idx),
                GlyphRef::Placeholder => None,
            })
            .map(|source| source.line_height(size))
            .fold(self.line_height(primary, size), u32::max)
    }

    /// Draw a resolved cluster into the label.
    pub fn draw(
        &self,
        cluster: &str,
        resolved: Resolved,
        size: u32,
        x: i32,
        y: i32,
        image: &mut LabelImage,
    ) {
        match resolved.glyph {
            GlyphRef::Source(idx) => {
                if let Some(source) = self.sources.get(idx) {
                    source.draw(cluster, size, x, y, image);
                }
            }
            GlyphRef::Placeholder => draw_placeholder(resolved.advance, size, x, y, image),
        }
    }
}

/// Outlined box standing in for a missing glyph.
fn draw_placeholder(advance: u32, size: u32, x: i32, y: i32, image: &mut LabelImage) {
    if advance < 3 || size < 3 {
        return;
    }
    // One dot of side bearing on each side, a quarter of the size above
    let (bx, by) = (x + 1, y + (size / 4) as i32);
    let (w, h) = (advance - 2, size - size / 4 - 1);
    image.fill_rect(bx, by, w, 1);
    image.fill_rect(bx, by + h as i32 - 1, w, 1);
    image.fill_rect(bx, by, 1, h);
    image.fill_rect(bx + w as i32 - 1, by, 1, h);
}

fn codepoints(cluster: &str) -> String {
    cluster
        .chars()
        .map(|c| format!("U+{:04X}", c as u32))
        .collect::<Vec<_>>()
        .join(" ")
}
