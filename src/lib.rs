//! # thermopost - Social-Media Posts on Thermal Printers
//!
//! thermopost picks an unprinted post from a record store, lays it out as a
//! label, and prints it on an ESC/POS thermal printer. It provides:
//!
//! - **Text shaping**: grapheme-cluster wrapping with emoji font fallback
//! - **Label layout**: username, title, body and right-aligned tags
//! - **Protocol implementation**: ESC/POS raster (`GS v 0`) framing
//! - **Transport**: USB serial devices with discovery by USB id
//!
//! ## Quick Start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use thermopost::{
//!     pipeline::{RenderSettings, render_record, transmit},
//!     printer::PrinterConfig,
//!     store::PostRecord,
//!     text::GlyphLibrary,
//!     transport::SerialTransport,
//! };
//!
//! let date = NaiveDate::from_ymd_opt(2016, 10, 10).unwrap();
//! let post = PostRecord::new(1, "ada", date)
//!     .with_title("Hello")
//!     .with_body("First post 🎉")
//!     .with_tags(&["#intro"]);
//!
//! let settings = RenderSettings::for_printer(PrinterConfig::M08F);
//! let glyphs = GlyphLibrary::with_builtin();
//! let frames = render_record(&post, &settings, &glyphs)?;
//!
//! let mut session = SerialTransport::open("/dev/ttyACM0")?;
//! transmit(&frames, &mut session)?;
//!
//! # Ok::<(), thermopost::error::ThermoError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`store`] | Post records and the printed flag |
//! | [`text`] | Glyph sources and the text shaper |
//! | [`label`] | Type styles, label image, composer |
//! | [`render`] | Rasterizer |
//! | [`protocol`] | ESC/POS command builders and frame encoder |
//! | [`transport`] | Device sessions |
//! | [`printer`] | Printer configurations |
//! | [`config`] | TOML configuration |
//! | [`pipeline`] | Print worker |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! - Phomemo M08F (A4, 1518 dots, USB serial `0483:5740`)
//! - Generic 80mm ESC/POS heads (576 dots)

pub mod config;
pub mod error;
pub mod label;
pub mod pipeline;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod store;
pub mod text;
pub mod transport;

// Re-exports for convenience
pub use error::ThermoError;
pub use printer::PrinterConfig;
pub use transport::SerialTransport;
