//! Configuration for thermopost.
//!
//! Loaded from a TOML file with defaults for every key:
//!
//! ```toml
//! debug = false
//!
//! [printer]
//! model = "m08f"              # or "generic-80mm"
//! device = "/dev/ttyACM0"     # omit to discover by USB id
//! print_speed = 2             # 1 (slow) to 5
//! density = "high"            # low | medium | high
//! feed_lines = 3
//! gap_lines = 0
//! raster_threshold = 128
//! invert_raster = false
//!
//! [fonts]
//! primary = "fonts/DejaVuSans.ttf"
//! emoji = "fonts/NotoEmoji-Regular.ttf"
//! # further entries register extra fallback fonts by name
//!
//! [schedule]
//! interval_minutes = 5.0
//! selection = "random"        # random | sequential
//! reset_when_exhausted = true
//! reset_on_start = false
//! startup_message = "Hello!"
//!
//! [store]
//! path = "posts.json"
//! ```
//!
//! Relative paths are resolved against the directory of the config file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ThermoError;
use crate::label::style::StyleSheet;
use crate::printer::PrinterConfig;
use crate::protocol::commands::SPEED_RANGE;
use crate::protocol::encode::{Density, EncodeOptions};
use crate::render::raster::{DEFAULT_THRESHOLD, RasterOptions};
use crate::text::glyph::GlyphLibrary;
use crate::text::ttf::TtfSource;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "THERMOPOST_CONFIG";

/// Config file used when neither a flag nor the environment names one.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Registry name of the `[fonts] primary` source.
pub const PRIMARY_FONT: &str = "primary";

/// Registry name of the `[fonts] emoji` source.
pub const EMOJI_FONT: &str = "emoji";

/// Longest accepted pause between prints (one week).
pub const MAX_INTERVAL_MINUTES: f64 = 7.0 * 24.0 * 60.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    pub printer: PrinterSection,
    pub fonts: FontsSection,
    pub schedule: ScheduleSection,
    pub store: StoreSection,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterSection {
    pub model: String,
    pub device: Option<PathBuf>,
    pub print_speed: u8,
    pub density: Density,
    pub feed_lines: usize,
    /// Extra blank lines between labels
    pub gap_lines: usize,
    pub raster_threshold: u8,
    pub invert_raster: bool,
}

impl Default for PrinterSection {
    fn default() -> Self {
        Self {
            model: "generic-80mm".to_string(),
            device: None,
            print_speed: 2,
            density: Density::High,
            feed_lines: 3,
            gap_lines: 0,
            raster_threshold: DEFAULT_THRESHOLD,
            invert_raster: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontsSection {
    /// Text face; the built-in bitmap font when absent
    pub primary: Option<PathBuf>,
    /// First fallback, for emoji
    pub emoji: Option<PathBuf>,
    /// Further fallbacks by name, tried in name order after `emoji`
    #[serde(flatten)]
    pub extra: BTreeMap<String, PathBuf>,
}

/// Order in which unprinted records are picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    Random,
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    pub interval_minutes: f64,
    pub selection: SelectionMode,
    /// Fixed seed for random selection
    pub seed: Option<u64>,
    pub reset_when_exhausted: bool,
    pub reset_on_start: bool,
    pub startup_message: Option<String>,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            interval_minutes: 5.0,
            selection: SelectionMode::Random,
            seed: None,
            reset_when_exhausted: true,
            reset_on_start: false,
            startup_message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub path: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("posts.json"),
        }
    }
}

impl Config {
    /// Config path from the command line, else the environment, else
    /// `./config.toml`.
    pub fn resolve_path(cli: Option<&Path>) -> PathBuf {
        if let Some(path) = cli {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Load and validate the config named by `cli` or the environment.
    pub fn load(cli: Option<&Path>) -> Result<Self, ThermoError> {
        let config = Self::load_from(&Self::resolve_path(cli))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file. Returns defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ThermoError> {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self {
                base_dir,
                ..Self::default()
            });
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            ThermoError::Config(format!("Failed to read config from {}: {}", path.display(), e))
        })?;
        let mut config = Self::parse(&contents).map_err(|e| match e {
            ThermoError::Config(msg) => ThermoError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        config.base_dir = base_dir;
        Ok(config)
    }

    /// Parse TOML text.
    pub fn parse(contents: &str) -> Result<Self, ThermoError> {
        toml::from_str(contents).map_err(|e| ThermoError::Config(format!("Invalid config: {}", e)))
    }

    /// Check every value before anything is printed.
    pub fn validate(&self) -> Result<(), ThermoError> {
        self.printer_config()?;

        let p = &self.printer;
        if !SPEED_RANGE.contains(&p.print_speed) {
            return Err(ThermoError::Config(format!(
                "printer.print_speed must be {}..={}, got {}",
                SPEED_RANGE.start(),
                SPEED_RANGE.end(),
                p.print_speed
            )));
        }
        if p.raster_threshold == 0 {
            return Err(ThermoError::Config(
                "printer.raster_threshold must be 1..=255".to_string(),
            ));
        }

        let interval = self.schedule.interval_minutes;
        if !(0.0..=MAX_INTERVAL_MINUTES).contains(&interval) {
            return Err(ThermoError::Config(format!(
                "schedule.interval_minutes must be 0..={}, got {}",
                MAX_INTERVAL_MINUTES, interval
            )));
        }

        for (name, path) in self.font_paths() {
            if !path.exists() {
                return Err(ThermoError::Config(format!(
                    "Font '{}' not found at {}",
                    name,
                    path.display()
                )));
            }
        }

        Ok(())
    }

    /// Resolve a configured path against the config directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Hardware preset named by `printer.model`.
    pub fn printer_config(&self) -> Result<PrinterConfig, ThermoError> {
        PrinterConfig::by_name(&self.printer.model).ok_or_else(|| {
            ThermoError::Config(format!(
                "Unknown printer model '{}' (known: {})",
                self.printer.model,
                PrinterConfig::list_models().join(", ")
            ))
        })
    }

    pub fn store_path(&self) -> PathBuf {
        self.resolve(&self.store.path)
    }

    pub fn device_path(&self) -> Option<PathBuf> {
        self.printer.device.as_deref().map(|p| self.resolve(p))
    }

    /// Pause between cycles, clamped to `0..=MAX_INTERVAL_MINUTES`.
    pub fn interval(&self) -> Duration {
        let minutes = self.schedule.interval_minutes;
        let minutes = if minutes.is_nan() {
            0.0
        } else {
            minutes.clamp(0.0, MAX_INTERVAL_MINUTES)
        };
        Duration::try_from_secs_f64(minutes * 60.0).unwrap_or_default()
    }

    /// Configured fonts as (registry name, resolved path), in fallback order.
    fn font_paths(&self) -> Vec<(String, PathBuf)> {
        let fonts = &self.fonts;
        let mut out = Vec::new();
        if let Some(path) = &fonts.primary {
            out.push((PRIMARY_FONT.to_string(), self.resolve(path)));
        }
        if let Some(path) = &fonts.emoji {
            out.push((EMOJI_FONT.to_string(), self.resolve(path)));
        }
        for (name, path) in &fonts.extra {
            out.push((name.clone(), self.resolve(path)));
        }
        out
    }

    /// Build the glyph library: the built-in bitmap font, the configured
    /// primary face, and the fallback chain.
    pub fn glyph_library(&self) -> Result<GlyphLibrary, ThermoError> {
        let mut lib = GlyphLibrary::with_builtin();
        for (name, path) in self.font_paths() {
            lib.register(Box::new(TtfSource::open(&name, &path)?));
            if name != PRIMARY_FONT {
                lib.add_fallback(&name)?;
            }
            debug!("loaded font '{}' from {}", name, path.display());
        }
        if self.fonts.primary.is_some() {
            // Bitmap font still covers ASCII the primary face lacks
            lib.add_fallback(crate::label::style::DEFAULT_GLYPH_SOURCE)?;
        }
        Ok(lib)
    }

    /// Style sheet sized for the printer, drawn from the primary face if one
    /// is configured.
    pub fn style_sheet(&self, printer: &PrinterConfig) -> StyleSheet {
        let sheet = StyleSheet::for_width(printer.width_dots as u32);
        if self.fonts.primary.is_some() {
            sheet.with_source(PRIMARY_FONT)
        } else {
            sheet
        }
    }

    pub fn raster_options(&self, printer: &PrinterConfig) -> RasterOptions {
        RasterOptions {
            width_dots: printer.width_dots as usize,
            threshold: self.printer.raster_threshold,
            invert: self.printer.invert_raster,
            flip_vertical: printer.flip_vertical,
        }
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            density: self.printer.density,
            speed: self.printer.print_speed,
            feed_lines: self.printer.feed_lines + self.printer.gap_lines,
        }
    }
}
