//! # Pipeline Tests
//!
//! Drive the whole path from record store to device session:
//!
//! ```text
//! MemoryStore/JsonStore ─► Worker ─► compose ─► rasterize ─► encode ─► MemorySession
//! ```
//!
//! Layout assertions use a fixed-width glyph source so line breaks are
//! exact; the end-to-end tests use the built-in bitmap font.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

use thermopost::label::compose::{LayoutMetrics, compose};
use thermopost::label::image::{LabelImage, RegionKind};
use thermopost::label::style::{Alignment, StyleName, StyleSheet, TypeStyle};
use thermopost::pipeline::{CycleOutcome, RenderSettings, Selection, Worker, render_record};
use thermopost::printer::PrinterConfig;
use thermopost::protocol::commands;
use thermopost::protocol::encode::FrameKind;
use thermopost::protocol::graphics::RASTER_HEADER_LEN;
use thermopost::store::{JsonStore, MemoryStore, PostRecord, RecordStore};
use thermopost::text::glyph::{GlyphLibrary, GlyphSource};
use thermopost::transport::MemorySession;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// ASCII at 10 dots, or any cluster at 20 dots for the emoji stand-in.
struct Fixed {
    name: &'static str,
    advance: u32,
    ascii_only: bool,
}

impl GlyphSource for Fixed {
    fn name(&self) -> &str {
        self.name
    }

    fn advance(&self, cluster: &str, _size: u32) -> Option<u32> {
        (!self.ascii_only || cluster.is_ascii()).then_some(self.advance)
    }

    fn line_height(&self, size: u32) -> u32 {
        size
    }

    fn draw(&self, cluster: &str, size: u32, x: i32, y: i32, image: &mut LabelImage) {
        if !cluster.trim().is_empty() {
            image.fill_rect(x + 1, y + 1, self.advance - 2, size - 2);
        }
    }
}

fn fixed_library() -> GlyphLibrary {
    let mut lib = GlyphLibrary::new();
    lib.register(Box::new(Fixed {
        name: "text",
        advance: 10,
        ascii_only: true,
    }));
    lib.register(Box::new(Fixed {
        name: "emoji",
        advance: 20,
        ascii_only: false,
    }));
    lib.add_fallback("emoji").unwrap();
    lib
}

fn fixed_styles() -> StyleSheet {
    StyleSheet {
        username: TypeStyle::new(StyleName::Username, 20, Alignment::Left),
        title: TypeStyle::new(StyleName::Title, 20, Alignment::Left),
        body: TypeStyle::new(StyleName::Body, 20, Alignment::Left),
        tags: TypeStyle::new(StyleName::Tags, 10, Alignment::Right),
    }
    .with_source("text")
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 10, 10).unwrap()
}

fn post(id: u64) -> PostRecord {
    PostRecord::new(id, "ada", date())
        .with_title("Thermal printing")
        .with_body("A short body that wraps across a couple of lines.")
        .with_tags(&["#print", "#label"])
}

fn settings() -> RenderSettings {
    RenderSettings::for_printer(PrinterConfig::GENERIC_80MM)
}

fn worker(store: MemoryStore, session: MemorySession) -> Worker<MemoryStore, MemorySession> {
    Worker::new(store, session, GlyphLibrary::with_builtin(), settings())
}

// ============================================================================
// LAYOUT
// ============================================================================

#[test]
fn test_family_emoji_wraps_as_one_unit() {
    let layout = LayoutMetrics::default();
    // Budget 100: "Hello 👨‍👩‍👧‍👦" is 80 dots, " world" would make it 140
    let record = PostRecord::new(1, "a", date()).with_body("Hello 👨‍👩‍👧‍👦 world");
    let image = compose(&record, &fixed_styles(), &fixed_library(), 110, &layout).unwrap();

    let pitch = 20 + layout.line_spacing as usize;
    assert_eq!(image.region_height(RegionKind::Body), 2 * pitch);
}

#[test]
fn test_empty_title_has_one_gap() {
    let layout = LayoutMetrics::default();
    let record = PostRecord::new(1, "ada", date()).with_body("body");
    let image = compose(&record, &fixed_styles(), &fixed_library(), 300, &layout).unwrap();

    let kinds: Vec<RegionKind> = image.regions().iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![RegionKind::Username, RegionKind::Gap, RegionKind::Body]);
    assert_eq!(image.region_height(RegionKind::Title), 0);
}

#[test]
fn test_overwide_tag_lines_each_right_aligned() {
    let layout = LayoutMetrics::default();
    let record = PostRecord::new(1, "a", date()).with_tags(&["#a", "#bbbbbbbbbbbbbbbbbbbbb"]);
    let image = compose(&record, &fixed_styles(), &fixed_library(), 110, &layout).unwrap();

    let tags = *image.region(RegionKind::Tags).unwrap();
    let pitch = 10 + layout.line_spacing as usize;
    let lines = tags.height / pitch;
    assert_eq!(lines, 4);
    for n in 0..lines {
        let y0 = tags.y + n * pitch;
        assert_eq!(image.right_edge_in_rows(y0, y0 + 10), Some(110 - 5 - 2));
    }
}

// ============================================================================
// END TO END
// ============================================================================

#[test]
fn test_frames_for_m08f() {
    let settings = RenderSettings::for_printer(PrinterConfig::M08F);
    let frames = render_record(&post(1), &settings, &GlyphLibrary::with_builtin()).unwrap();

    assert_eq!(frames[0].kind, FrameKind::Setup);
    assert_eq!(frames.last().unwrap().kind, FrameKind::Feed);
    for frame in frames.iter().filter(|f| f.kind == FrameKind::Raster) {
        // GS v 0 0, then 190 bytes per row
        assert_eq!(&frame.bytes[..6], &[commands::GS, b'v', b'0', 0, 190, 0]);
        let rows = u16::from_le_bytes([frame.bytes[6], frame.bytes[7]]) as usize;
        assert!(rows > 0 && rows <= 255);
        assert_eq!(frame.bytes.len(), RASTER_HEADER_LEN + rows * 190);
    }
}

#[test]
fn test_printed_only_after_all_frames() {
    let store = MemoryStore::new(vec![post(1)]).unwrap();
    let session = MemorySession::new();
    let expected = render_record(&post(1), &settings(), &GlyphLibrary::with_builtin()).unwrap();

    assert!(!store.get(1).unwrap().printed);
    let mut w = worker(store.clone(), session.clone());
    assert!(matches!(w.run_cycle(), CycleOutcome::Printed { id: 1 }));

    assert!(store.get(1).unwrap().printed);
    let sent: Vec<Vec<u8>> = expected.into_iter().map(|f| f.bytes).collect();
    assert_eq!(session.writes(), sent);
}

#[test]
fn test_transport_failure_mid_label_leaves_record_unprinted() {
    let store = MemoryStore::new(vec![post(1)]).unwrap();
    // Write 0 is the setup frame, write 1 the first raster block
    let session = MemorySession::failing_at(1);
    let mut w = worker(store.clone(), session.clone());

    match w.run_cycle() {
        CycleOutcome::Failed { id, error } => {
            assert_eq!(id, 1);
            assert_eq!(error.kind(), "transport");
        }
        other => panic!("expected a failed cycle, got {:?}", other),
    }
    assert!(!store.get(1).unwrap().printed);
    assert_eq!(session.writes().len(), 1);

    // The next cycle retries and succeeds
    assert!(matches!(w.run_cycle(), CycleOutcome::Printed { id: 1 }));
    assert!(store.get(1).unwrap().printed);
}

#[test]
fn test_layout_failure_sends_nothing_and_moves_on() {
    let huge = PostRecord::new(1, "ada", date()).with_body(&"word ".repeat(40_000));
    let store = MemoryStore::new(vec![huge, post(2)]).unwrap();
    let session = MemorySession::new();
    let mut w = worker(store.clone(), session.clone());

    match w.run_cycle() {
        CycleOutcome::Failed { id, error } => {
            assert_eq!(id, 1);
            assert_eq!(error.kind(), "layout");
        }
        other => panic!("expected a failed cycle, got {:?}", other),
    }
    assert_eq!(session.attempts(), 0);

    assert!(matches!(w.run_cycle(), CycleOutcome::Printed { id: 2 }));
    assert_eq!(store.printed_ids(), vec![2]);
}

#[test]
fn test_json_store_round() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("posts.json");
    fs::write(
        &path,
        r##"[
            {"author_handle": "ada", "title": "One", "timestamp": "2016-10-10"},
            {"author_handle": "bob", "title": "Two", "body": "😀 hi", "tags": ["#x"], "timestamp": "2016-10-11"},
            {"author_handle": "cy", "title": "Three", "timestamp": "2016-10-12"}
        ]"##,
    )
    .unwrap();

    let store = JsonStore::new(&path);
    let mut w = Worker::new(
        store,
        MemorySession::new(),
        GlyphLibrary::with_builtin(),
        settings(),
    )
    .with_selection(Selection::Random { seed: Some(7) });

    let mut printed = Vec::new();
    for _ in 0..3 {
        match w.run_cycle() {
            CycleOutcome::Printed { id } => printed.push(id),
            other => panic!("unexpected {:?}", other),
        }
    }
    printed.sort();
    assert_eq!(printed, vec![1, 2, 3]);

    let reloaded = JsonStore::new(&path).load().unwrap();
    assert!(reloaded.iter().all(|r| r.printed));

    // Exhausted: everything is reset for the next round
    assert!(matches!(w.run_cycle(), CycleOutcome::Exhausted { reset: 3 }));
    assert!(w.store().load().unwrap().iter().all(|r| !r.printed));
}
