//! # Type Styles
//!
//! The four named styles of a label and their defaults.
//!
//! | Style | Compact (576 dots) | Wide (M08F) | Alignment |
//! |-------|--------------------|-------------|-----------|
//! | Username | 24 | 36 | Left |
//! | Title | 32 | 52 | Left |
//! | Body | 24 | 46 | Left |
//! | Tags | 16 | 40 | Right |
//!
//! Point sizes are line-box heights in printer dots.

use serde::{Deserialize, Serialize};

/// Name of the built-in bitmap glyph source.
pub const DEFAULT_GLYPH_SOURCE: &str = "spleen";

/// Which label region a style applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleName {
    Username,
    Title,
    Body,
    Tags,
}

/// Horizontal placement of each wrapped line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Right,
    /// Only used for banner labels
    Center,
}

/// An immutable type style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeStyle {
    pub name: StyleName,
    pub point_size: u32,
    pub alignment: Alignment,
    /// Registry name of the primary glyph source
    pub glyph_source: String,
}

impl TypeStyle {
    pub fn new(name: StyleName, point_size: u32, alignment: Alignment) -> Self {
        Self {
            name,
            point_size,
            alignment,
            glyph_source: DEFAULT_GLYPH_SOURCE.to_string(),
        }
    }

    /// Same style, drawn from another primary glyph source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.glyph_source = source.into();
        self
    }
}

/// One style per label region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheet {
    pub username: TypeStyle,
    pub title: TypeStyle,
    pub body: TypeStyle,
    pub tags: TypeStyle,
}

impl StyleSheet {
    /// Sizes for 58/80mm heads.
    pub fn compact() -> Self {
        Self::with_sizes([24, 32, 24, 16])
    }

    /// Sizes for A4-wide heads.
    pub fn wide() -> Self {
        Self::with_sizes([36, 52, 46, 40])
    }

    /// Pick compact or wide by head width.
    pub fn for_width(width_dots: u32) -> Self {
        if width_dots >= 1000 {
            Self::wide()
        } else {
            Self::compact()
        }
    }

    fn with_sizes([username, title, body, tags]: [u32; 4]) -> Self {
        Self {
            username: TypeStyle::new(StyleName::Username, username, Alignment::Left),
            title: TypeStyle::new(StyleName::Title, title, Alignment::Left),
            body: TypeStyle::new(StyleName::Body, body, Alignment::Left),
            tags: TypeStyle::new(StyleName::Tags, tags, Alignment::Right),
        }
    }

    /// Point every style at another primary glyph source.
    pub fn with_source(self, source: &str) -> Self {
        Self {
            username: self.username.with_source(source),
            title: self.title.with_source(source),
            body: self.body.with_source(source),
            tags: self.tags.with_source(source),
        }
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::compact()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_right_aligned() {
        let sheet = StyleSheet::compact();
        assert_eq!(sheet.tags.alignment, Alignment::Right);
        assert_eq!(sheet.body.alignment, Alignment::Left);
    }

    #[test]
    fn test_for_width() {
        assert_eq!(StyleSheet::for_width(576), StyleSheet::compact());
        assert_eq!(StyleSheet::for_width(1518).title.point_size, 52);
    }

    #[test]
    fn test_fields_carry_their_names() {
        let sheet = StyleSheet::wide();
        assert_eq!(sheet.username.name, StyleName::Username);
        assert_eq!(sheet.title.name, StyleName::Title);
        assert_eq!(sheet.body.name, StyleName::Body);
        assert_eq!(sheet.tags.name, StyleName::Tags);
    }

    #[test]
    fn test_with_source() {
        let sheet = StyleSheet::compact().with_source("primary");
        assert_eq!(sheet.title.glyph_source, "primary");
        assert_eq!(sheet.tags.glyph_source, "primary");
    }
}
