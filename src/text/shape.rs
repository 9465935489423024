//! # Text Shaper
//!
//! Measures text as grapheme clusters and wraps it into lines that fit a
//! pixel width.
//!
//! ## Algorithm
//!
//! Greedy line fill over words:
//!
//! ```text
//! for each word:
//!     if line is empty       → start line with word (hard-break if too wide)
//!     elif line + ' ' + word fits → append
//!     else                   → emit line, start new line with word
//! ```
//!
//! A word wider than the limit is broken at the last cluster boundary that
//! still fits. Clusters are never split, so an emoji built from several code
//! points (skin tones, ZWJ families) always moves as one unit. Whitespace at
//! a break is dropped and runs of whitespace between words collapse to one
//! space.

use log::warn;
use unicode_segmentation::UnicodeSegmentation;

use super::glyph::{GlyphLibrary, Resolved};
use crate::label::style::TypeStyle;

/// One grapheme cluster with its resolved glyph and advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedCluster {
    pub text: String,
    pub resolved: Resolved,
}

impl ShapedCluster {
    pub fn advance(&self) -> u32 {
        self.resolved.advance
    }
}

/// A wrapped line: clusters in order plus their total advance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapedLine {
    pub clusters: Vec<ShapedCluster>,
    pub width: u32,
}

impl ShapedLine {
    /// The line's text, spaces included.
    pub fn text(&self) -> String {
        self.clusters.iter().map(|c| c.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    fn push(&mut self, cluster: ShapedCluster) {
        self.width += cluster.advance();
        self.clusters.push(cluster);
    }
}

type Word = Vec<ShapedCluster>;

fn word_width(word: &[ShapedCluster]) -> u32 {
    word.iter().map(ShapedCluster::advance).sum()
}

/// Wrap `text` in `style` to lines no wider than `max_width` dots.
///
/// Newlines separate paragraphs, each wrapped on its own. Empty and
/// whitespace-only text yields no lines.
pub fn shape(text: &str, style: &TypeStyle, max_width: u32, glyphs: &GlyphLibrary) -> Vec<ShapedLine> {
    let mut shaper = Shaper {
        style,
        glyphs,
        max_width,
        space: None,
        lines: Vec::new(),
    };
    for paragraph in text.lines() {
        shaper.paragraph(paragraph);
    }
    shaper.lines
}

/// Shape a tag list as one space-joined run.
///
/// A tag only breaks across lines when it alone is wider than `max_width`.
pub fn shape_tags(
    tags: &[String],
    style: &TypeStyle,
    max_width: u32,
    glyphs: &GlyphLibrary,
) -> Vec<ShapedLine> {
    let joined = tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    shape(&joined, style, max_width, glyphs)
}

struct Shaper<'a> {
    style: &'a TypeStyle,
    glyphs: &'a GlyphLibrary,
    max_width: u32,
    space: Option<ShapedCluster>,
    lines: Vec<ShapedLine>,
}

impl Shaper<'_> {
    fn cluster(&self, text: &str) -> ShapedCluster {
        let resolved = self
            .glyphs
            .resolve(text, &self.style.glyph_source, self.style.point_size);
        ShapedCluster {
            text: text.to_string(),
            resolved,
        }
    }

    fn space(&mut self) -> ShapedCluster {
        if let Some(space) = &self.space {
            return space.clone();
        }
        let space = self.cluster(" ");
        self.space = Some(space.clone());
        space
    }

    fn word(&self, word: &str) -> Word {
        word.graphemes(true).map(|g| self.cluster(g)).collect()
    }

    fn paragraph(&mut self, paragraph: &str) {
        let mut line = ShapedLine::default();

        for word in paragraph.split_whitespace() {
            let word = self.word(word);
            let width = word_width(&word);

            if !line.is_empty() {
                let space = self.space();
                if line.width + space.advance() + width <= self.max_width {
                    line.push(space);
                    word.into_iter().for_each(|c| line.push(c));
                    continue;
                }
                self.lines.push(std::mem::take(&mut line));
            }

            if width <= self.max_width {
                word.into_iter().for_each(|c| line.push(c));
            } else {
                line = self.hard_break(word);
            }
        }

        if !line.is_empty() {
            self.lines.push(line);
        }
    }

    /// Emit full-width pieces of an over-wide word; return the remainder.
    fn hard_break(&mut self, word: Word) -> ShapedLine {
        let mut piece = ShapedLine::default();
        for cluster in word {
            if piece.width + cluster.advance() > self.max_width && !piece.is_empty() {
                self.lines.push(std::mem::take(&mut piece));
            }
            if piece.is_empty() && cluster.advance() > self.max_width {
                warn!(
                    "cluster {:?} is {} dots wide, wider than the {} dot line",
                    cluster.text,
                    cluster.advance(),
                    self.max_width
                );
                piece.push(cluster);
                self.lines.push(std::mem::take(&mut piece));
                continue;
            }
            piece.push(cluster);
        }
        piece
    }
}
