//! # Label Composer
//!
//! Lays out the regions of one post into a single [`LabelImage`].
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │                top margin                │
//! │ @username                      10.10.2016│  Username (date in Tags style)
//! │                region gap                │
//! │ Title wrapped to the width budget        │  Title
//! │                region gap                │
//! │ Body text, one or more                   │  Body
//! │ paragraphs                               │
//! │                region gap                │
//! │                        #tags #right #edge│  Tags
//! │               bottom margin              │
//! └──────────────────────────────────────────┘
//! ```
//!
//! A region with no lines collapses to zero height and takes no gap, so two
//! content regions are always separated by exactly one gap.

use log::debug;

use super::image::{LabelImage, RegionKind};
use super::style::{Alignment, StyleSheet, TypeStyle};
use crate::error::ThermoError;
use crate::store::PostRecord;
use crate::text::glyph::GlyphLibrary;
use crate::text::shape::{ShapedLine, shape, shape_tags};

/// Upper bound on label height in dots.
pub const MAX_LABEL_HEIGHT: usize = 65535;

/// Date format drawn at the right of the username band.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Margins and spacing, all in dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutMetrics {
    pub side_margin: u32,
    pub top_margin: u32,
    pub bottom_margin: u32,
    pub region_gap: u32,
    /// Added below every line
    pub line_spacing: u32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            side_margin: 5,
            top_margin: 20,
            bottom_margin: 20,
            region_gap: 40,
            line_spacing: 8,
        }
    }
}

impl LayoutMetrics {
    /// Usable line width between the side margins.
    pub fn width_budget(&self, print_width: usize) -> Result<u32, ThermoError> {
        let budget = print_width as i64 - 2 * self.side_margin as i64;
        if budget <= 0 {
            return Err(ThermoError::Layout(format!(
                "No room for text: width {} with {} dot side margins",
                print_width, self.side_margin
            )));
        }
        Ok(budget as u32)
    }
}

/// Reject a print width the device cannot hold.
pub fn check_print_width(print_width: usize, device_width: usize) -> Result<(), ThermoError> {
    if print_width == 0 || print_width > device_width {
        return Err(ThermoError::Layout(format!(
            "Print width {} does not fit the {} dot device",
            print_width, device_width
        )));
    }
    Ok(())
}

/// Text drawn at the trailing edge of a region's first line.
struct Trailer {
    line: ShapedLine,
    style: TypeStyle,
    line_height: u32,
}

/// One laid-out content region before drawing.
struct Block<'a> {
    kind: RegionKind,
    style: &'a TypeStyle,
    lines: Vec<ShapedLine>,
    line_height: u32,
    trailer: Option<Trailer>,
}

impl Block<'_> {
    fn pitch(&self, layout: &LayoutMetrics) -> u32 {
        let trailer = self.trailer.as_ref().map_or(0, |t| t.line_height);
        self.line_height.max(trailer) + layout.line_spacing
    }

    fn height(&self, layout: &LayoutMetrics) -> usize {
        self.lines.len() * self.pitch(layout) as usize
    }
}

/// Line box tall enough for every source the lines were resolved against.
fn line_height(glyphs: &GlyphLibrary, style: &TypeStyle, lines: &[ShapedLine]) -> u32 {
    let used = lines
        .iter()
        .flat_map(|line| &line.clusters)
        .map(|cluster| cluster.resolved.glyph);
    glyphs.tallest_line_height(&style.glyph_source, style.point_size, used)
}

struct Composer<'a> {
    glyphs: &'a GlyphLibrary,
    print_width: usize,
    budget: u32,
    layout: LayoutMetrics,
}

impl<'a> Composer<'a> {
    fn block(&self, kind: RegionKind, style: &'a TypeStyle, lines: Vec<ShapedLine>) -> Block<'a> {
        Block {
            kind,
            style,
            line_height: line_height(self.glyphs, style, &lines),
            lines,
            trailer: None,
        }
    }

    fn line_x(&self, line: &ShapedLine, alignment: Alignment) -> i32 {
        let side = self.layout.side_margin as i32;
        let slack = self.budget.saturating_sub(line.width) as i32;
        match alignment {
            Alignment::Left => side,
            Alignment::Right => side + slack,
            Alignment::Center => side + slack / 2,
        }
    }

    fn draw_line(&self, line: &ShapedLine, style: &TypeStyle, x: i32, y: i32, image: &mut LabelImage) {
        let mut x = x;
        for cluster in &line.clusters {
            self.glyphs
                .draw(&cluster.text, cluster.resolved, style.point_size, x, y, image);
            x += cluster.advance() as i32;
        }
    }

    /// Stack the non-empty blocks, validate the height, and draw.
    fn render(&self, blocks: Vec<Block<'_>>) -> Result<LabelImage, ThermoError> {
        let blocks: Vec<_> = blocks.into_iter().filter(|b| !b.lines.is_empty()).collect();
        let gaps = blocks.len().saturating_sub(1);

        let height = self.layout.top_margin as usize
            + blocks.iter().map(|b| b.height(&self.layout)).sum::<usize>()
            + gaps * self.layout.region_gap as usize
            + self.layout.bottom_margin as usize;
        if height > MAX_LABEL_HEIGHT {
            return Err(ThermoError::Layout(format!(
                "Label is {} dots tall, limit is {}",
                height, MAX_LABEL_HEIGHT
            )));
        }

        let mut image = LabelImage::new(self.print_width, height);
        let mut y = self.layout.top_margin as usize;

        for (i, block) in blocks.iter().enumerate() {
            if i > 0 {
                let gap = self.layout.region_gap as usize;
                image.push_region(RegionKind::Gap, y, gap);
                y += gap;
            }
            let region_height = block.height(&self.layout);
            image.push_region(block.kind, y, region_height);

            let pitch = block.pitch(&self.layout) as usize;
            for (n, line) in block.lines.iter().enumerate() {
                let line_y = (y + n * pitch) as i32;
                let x = self.line_x(line, block.style.alignment);
                self.draw_line(line, block.style, x, line_y, &mut image);

                if n == 0 {
                    if let Some(trailer) = &block.trailer {
                        let tx = self.line_x(&trailer.line, Alignment::Right);
                        self.draw_line(&trailer.line, &trailer.style, tx, line_y, &mut image);
                    }
                }
            }
            y += region_height;
        }

        Ok(image)
    }
}

/// Compose the label for one record.
///
/// ## Errors
///
/// [`ThermoError::Layout`] when the margins leave no width, or the label
/// would be taller than [`MAX_LABEL_HEIGHT`].
pub fn compose(
    record: &PostRecord,
    styles: &StyleSheet,
    glyphs: &GlyphLibrary,
    print_width: usize,
    layout: &LayoutMetrics,
) -> Result<LabelImage, ThermoError> {
    let composer = Composer {
        glyphs,
        print_width,
        budget: layout.width_budget(print_width)?,
        layout: *layout,
    };
    let budget = composer.budget;

    let handle = format!("@{}", record.author_handle.trim());
    let mut username = composer.block(
        RegionKind::Username,
        &styles.username,
        shape(&handle, &styles.username, budget, glyphs),
    );
    username.trailer = date_trailer(record, styles, glyphs, &username.lines, budget);

    let blocks = vec![
        username,
        composer.block(
            RegionKind::Title,
            &styles.title,
            shape(&record.title, &styles.title, budget, glyphs),
        ),
        composer.block(
            RegionKind::Body,
            &styles.body,
            shape(&record.body, &styles.body, budget, glyphs),
        ),
        composer.block(
            RegionKind::Tags,
            &styles.tags,
            shape_tags(&record.tags, &styles.tags, budget, glyphs),
        ),
    ];

    composer.render(blocks)
}

/// The record date, if it fits beside the first username line.
fn date_trailer(
    record: &PostRecord,
    styles: &StyleSheet,
    glyphs: &GlyphLibrary,
    username: &[ShapedLine],
    budget: u32,
) -> Option<Trailer> {
    let first = username.first()?;
    let date = record.timestamp.format(DATE_FORMAT).to_string();
    let line = shape(&date, &styles.tags, u32::MAX, glyphs).into_iter().next()?;
    let space = glyphs
        .resolve(" ", &styles.tags.glyph_source, styles.tags.point_size)
        .advance;

    if first.width + space + line.width > budget {
        debug!("record {}: no room for date beside username", record.id);
        return None;
    }
    Some(Trailer {
        line_height: line_height(glyphs, &styles.tags, std::slice::from_ref(&line)),
        line,
        style: styles.tags.clone(),
    })
}

/// Compose a label holding a single block of text, such as a startup
/// message.
pub fn compose_banner(
    text: &str,
    style: &TypeStyle,
    glyphs: &GlyphLibrary,
    print_width: usize,
    layout: &LayoutMetrics,
) -> Result<LabelImage, ThermoError> {
    let composer = Composer {
        glyphs,
        print_width,
        budget: layout.width_budget(print_width)?,
        layout: *layout,
    };
    let lines = shape(text, style, composer.budget, glyphs);
    if lines.is_empty() {
        return Err(ThermoError::Layout("Banner text is empty".to_string()));
    }
    let block = composer.block(RegionKind::Banner, style, lines);
    composer.render(vec![block])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::style::StyleName;
    use crate::text::glyph::testing::FixedSource;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const WIDTH: usize = 200;

    fn library() -> GlyphLibrary {
        let mut lib = GlyphLibrary::new();
        lib.register(Box::new(FixedSource::ascii("text", 10)));
        lib.register(Box::new(FixedSource::any("emoji", 20)));
        lib.add_fallback("emoji").unwrap();
        lib
    }

    /// Line heights 20/30/20/10 with the fixed source.
    fn styles() -> StyleSheet {
        StyleSheet {
            username: TypeStyle::new(StyleName::Username, 20, Alignment::Left),
            title: TypeStyle::new(StyleName::Title, 30, Alignment::Left),
            body: TypeStyle::new(StyleName::Body, 20, Alignment::Left),
            tags: TypeStyle::new(StyleName::Tags, 10, Alignment::Right),
        }
        .with_source("text")
    }

    fn layout() -> LayoutMetrics {
        LayoutMetrics {
            side_margin: 5,
            top_margin: 10,
            bottom_margin: 10,
            region_gap: 40,
            line_spacing: 4,
        }
    }

    fn record() -> PostRecord {
        PostRecord::new(1, "ada", NaiveDate::from_ymd_opt(2016, 10, 10).unwrap())
            .with_title("Hello")
            .with_body("first post")
            .with_tags(&["#a", "#b"])
    }

    fn kinds(image: &LabelImage) -> Vec<RegionKind> {
        image.regions().iter().map(|r| r.kind).collect()
    }

    #[test]
    fn test_full_record_regions() {
        let image = compose(&record(), &styles(), &library(), WIDTH, &layout()).unwrap();
        assert_eq!(
            kinds(&image),
            vec![
                RegionKind::Username,
                RegionKind::Gap,
                RegionKind::Title,
                RegionKind::Gap,
                RegionKind::Body,
                RegionKind::Gap,
                RegionKind::Tags,
            ]
        );
        assert_eq!(image.width(), WIDTH);
        // username 24, title 34, body 24, tags 14, three gaps, two margins
        assert_eq!(image.height(), 10 + 24 + 34 + 24 + 14 + 3 * 40 + 10);
    }

    #[test]
    fn test_empty_title_single_gap() {
        let mut rec = record();
        rec.title = String::new();
        rec.tags.clear();
        let image = compose(&rec, &styles(), &library(), WIDTH, &layout()).unwrap();
        assert_eq!(
            kinds(&image),
            vec![RegionKind::Username, RegionKind::Gap, RegionKind::Body]
        );
        assert_eq!(image.region_height(RegionKind::Title), 0);
        let username = image.region(RegionKind::Username).unwrap();
        let body = image.region(RegionKind::Body).unwrap();
        assert_eq!(body.y, username.y + username.height + 40);
    }

    #[test]
    fn test_whitespace_body_collapses() {
        let mut rec = record();
        rec.body = "  \n\t ".to_string();
        let image = compose(&rec, &styles(), &library(), WIDTH, &layout()).unwrap();
        assert_eq!(image.region_height(RegionKind::Body), 0);
        let gaps = kinds(&image).iter().filter(|k| **k == RegionKind::Gap).count();
        assert_eq!(gaps, 2);
    }

    #[test]
    fn test_text_starts_at_side_margin() {
        let image = compose(&record(), &styles(), &library(), WIDTH, &layout()).unwrap();
        let title = image.region(RegionKind::Title).unwrap();
        let first_col = (0..WIDTH).find(|&x| (title.y..title.y + title.height).any(|y| image.get(x, y) > 0));
        // FixedSource leaves one dot of bearing
        assert_eq!(first_col, Some(6));
    }

    #[test]
    fn test_tags_right_aligned_per_line() {
        let mut rec = record();
        rec.tags = vec!["#a".into(), "#bbbbbbbbbbbbbbbbbbbbb".into()];
        let image = compose(&rec, &styles(), &library(), 110, &layout()).unwrap();

        // budget 100: "#a", then the long tag hard-broken into three lines
        let tags = image.region(RegionKind::Tags).unwrap();
        let pitch = 14;
        assert_eq!(tags.height, 4 * pitch);

        // Each line's last glyph block ends 2 dots before its advance edge
        let edge = 110 - 5 - 2;
        for n in 0..4 {
            let y0 = tags.y + n * pitch;
            assert_eq!(image.right_edge_in_rows(y0, y0 + 10), Some(edge), "line {}", n);
        }
    }

    #[test]
    fn test_date_drawn_right_of_username() {
        let image = compose(&record(), &styles(), &library(), WIDTH, &layout()).unwrap();
        let band = image.region(RegionKind::Username).unwrap();
        assert_eq!(image.right_edge_in_rows(band.y, band.y + band.height), Some(WIDTH - 5 - 2));
    }

    #[test]
    fn test_date_dropped_when_no_room() {
        let mut rec = record();
        rec.author_handle = "a".repeat(14);
        let image = compose(&rec, &styles(), &library(), WIDTH, &layout()).unwrap();
        let band = image.region(RegionKind::Username).unwrap();
        // "@" + 14 chars = 150 dots; no room for 100 dots of date
        assert_eq!(image.right_edge_in_rows(band.y, band.y + band.height), Some(5 + 150 - 2));
    }

    #[test]
    fn test_emoji_in_body_uses_fallback() {
        let mut rec = record();
        rec.body = "hi 👍🏽".to_string();
        let image = compose(&rec, &styles(), &library(), WIDTH, &layout()).unwrap();
        let body = image.region(RegionKind::Body).unwrap();
        // "hi " = 30 dots, emoji advance 20
        assert_eq!(image.right_edge_in_rows(body.y, body.y + body.height), Some(5 + 50 - 2));
    }

    #[test]
    fn test_tall_fallback_widens_line_pitch() {
        let mut lib = GlyphLibrary::new();
        lib.register(Box::new(FixedSource::ascii("text", 10)));
        lib.register(Box::new(FixedSource::any("emoji", 20).with_line_scale(2)));
        lib.add_fallback("emoji").unwrap();

        let mut rec = record();
        rec.body = "hi 👍🏽\nplain".to_string();
        let image = compose(&rec, &styles(), &lib, WIDTH, &layout()).unwrap();
        // Two lines at 2 × 20 plus spacing 4
        assert_eq!(image.region_height(RegionKind::Body), 2 * 44);
        // Title has no emoji and keeps its own line box
        assert_eq!(image.region_height(RegionKind::Title), 34);
    }

    #[test]
    fn test_no_width_budget() {
        let err = compose(&record(), &styles(), &library(), 10, &layout()).unwrap_err();
        assert_eq!(err.kind(), "layout");
    }

    #[test]
    fn test_too_tall() {
        let mut rec = record();
        rec.body = "word ".repeat(20_000);
        let err = compose(&rec, &styles(), &library(), WIDTH, &layout()).unwrap_err();
        assert_eq!(err.kind(), "layout");
    }

    #[test]
    fn test_check_print_width() {
        assert!(check_print_width(576, 576).is_ok());
        assert_eq!(check_print_width(600, 576).unwrap_err().kind(), "layout");
        assert!(check_print_width(0, 576).is_err());
    }

    #[test]
    fn test_banner_is_centered() {
        let style = TypeStyle::new(StyleName::Title, 20, Alignment::Center).with_source("text");
        let image = compose_banner("hi", &style, &library(), WIDTH, &layout()).unwrap();
        assert_eq!(kinds(&image), vec![RegionKind::Banner]);
        // budget 190, text 20, slack 170 → x = 5 + 85
        let band = image.region(RegionKind::Banner).unwrap();
        assert_eq!(image.right_edge_in_rows(band.y, band.y + band.height), Some(90 + 20 - 2));
    }

    #[test]
    fn test_empty_banner() {
        let style = TypeStyle::new(StyleName::Title, 20, Alignment::Center).with_source("text");
        assert!(compose_banner("  ", &style, &library(), WIDTH, &layout()).is_err());
    }
}
