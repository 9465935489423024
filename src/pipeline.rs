//! # Print Pipeline
//!
//! One worker drives every stage for one record at a time:
//!
//! ```text
//! select ─► compose ─► rasterize ─► encode ─► transmit ─► mark printed
//!   │          └────── any error: log, skip record ──────┘
//!   └─ nothing unprinted: reset (optional), wait
//! ```
//!
//! A record is marked printed only after every frame was written. A failed
//! record stays unprinted and the worker moves on to the next one.
//!
//! Cancellation is checked when selecting, right before transmitting, and
//! while waiting between cycles. A label already being transmitted is
//! finished.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{Config, SelectionMode};
use crate::error::ThermoError;
use crate::label::compose::{LayoutMetrics, check_print_width, compose, compose_banner};
use crate::label::image::LabelImage;
use crate::label::style::{Alignment, StyleSheet};
use crate::printer::PrinterConfig;
use crate::protocol::encode::{EncodeOptions, Frame, encode};
use crate::render::raster::{Bitmap, RasterOptions, rasterize};
use crate::store::{PostRecord, RecordStore};
use crate::text::glyph::GlyphLibrary;
use crate::transport::DeviceSession;

/// Pause before looking again after the store ran out of records.
const EXHAUSTED_RETRY: Duration = Duration::from_secs(5);

/// Granularity of cancellable sleeps.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

// ============================================================================
// CANCELLATION
// ============================================================================

/// Shared abort flag, set by the operator (Ctrl-C).
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sleep up to `duration`. Returns false if cancelled meanwhile.
    ///
    /// A duration past the clock's range sleeps until cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now().checked_add(duration);
        loop {
            if self.is_cancelled() {
                return false;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return true;
                    }
                    SLEEP_SLICE.min(deadline - now)
                }
                None => SLEEP_SLICE,
            };
            thread::sleep(slice);
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

/// Everything needed to turn a record into frames.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub printer: PrinterConfig,
    pub styles: StyleSheet,
    pub layout: LayoutMetrics,
    pub raster: RasterOptions,
    pub encode: EncodeOptions,
}

impl RenderSettings {
    /// Defaults for a printer preset.
    pub fn for_printer(printer: PrinterConfig) -> Self {
        Self {
            printer,
            styles: StyleSheet::for_width(printer.width_dots as u32),
            layout: LayoutMetrics::default(),
            raster: RasterOptions {
                flip_vertical: printer.flip_vertical,
                ..RasterOptions::new(printer.width_dots as usize)
            },
            encode: EncodeOptions::default(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ThermoError> {
        let printer = config.printer_config()?;
        Ok(Self {
            printer,
            styles: config.style_sheet(&printer),
            layout: LayoutMetrics::default(),
            raster: config.raster_options(&printer),
            encode: config.encode_options(),
        })
    }

    fn print_width(&self) -> usize {
        self.raster.width_dots
    }
}

fn finish(label: &LabelImage, settings: &RenderSettings) -> Result<Bitmap, ThermoError> {
    rasterize(label, &settings.raster)
}

/// Compose and rasterize one record.
pub fn render_label(
    record: &PostRecord,
    settings: &RenderSettings,
    glyphs: &GlyphLibrary,
) -> Result<Bitmap, ThermoError> {
    check_print_width(settings.print_width(), settings.printer.width_dots as usize)?;
    let label = compose(
        record,
        &settings.styles,
        glyphs,
        settings.print_width(),
        &settings.layout,
    )?;
    finish(&label, settings)
}

/// Render one record all the way to device frames.
pub fn render_record(
    record: &PostRecord,
    settings: &RenderSettings,
    glyphs: &GlyphLibrary,
) -> Result<Vec<Frame>, ThermoError> {
    let bitmap = render_label(record, settings, glyphs)?;
    encode(&bitmap, &settings.printer, &settings.encode)
}

/// Frames for a centered one-off message in the title style.
pub fn render_banner(
    text: &str,
    settings: &RenderSettings,
    glyphs: &GlyphLibrary,
) -> Result<Vec<Frame>, ThermoError> {
    check_print_width(settings.print_width(), settings.printer.width_dots as usize)?;
    let mut style = settings.styles.title.clone();
    style.alignment = Alignment::Center;
    let label = compose_banner(text, &style, glyphs, settings.print_width(), &settings.layout)?;
    let bitmap = finish(&label, settings)?;
    encode(&bitmap, &settings.printer, &settings.encode)
}

/// Write every frame in order. Stops at the first failed write.
pub fn transmit<D: DeviceSession + ?Sized>(
    frames: &[Frame],
    session: &mut D,
) -> Result<(), ThermoError> {
    for (i, frame) in frames.iter().enumerate() {
        session.write(&frame.bytes).map_err(|e| match e {
            ThermoError::Transport(msg) => {
                ThermoError::Transport(format!("frame {} of {}: {}", i + 1, frames.len(), msg))
            }
            other => other,
        })?;
    }
    Ok(())
}

// ============================================================================
// WORKER
// ============================================================================

/// How the next unprinted record is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// First unprinted record in store order
    Sequential,
    /// Uniformly among unprinted records; seeded for reproducible runs
    Random { seed: Option<u64> },
}

impl Selection {
    pub fn from_config(config: &Config) -> Self {
        match config.schedule.selection {
            SelectionMode::Sequential => Selection::Sequential,
            SelectionMode::Random => Selection::Random {
                seed: config.schedule.seed,
            },
        }
    }
}

/// Result of one [`Worker::run_cycle`].
#[derive(Debug)]
pub enum CycleOutcome {
    Printed { id: u64 },
    /// The record was skipped and stays unprinted
    Failed { id: u64, error: ThermoError },
    /// No unprinted records; `reset` records were set unprinted again
    Exhausted { reset: usize },
    /// Store or device trouble not tied to one record
    Idle { error: ThermoError },
    Cancelled,
}

/// The print loop.
pub struct Worker<S, D> {
    store: S,
    session: D,
    glyphs: GlyphLibrary,
    settings: RenderSettings,
    selection: Selection,
    rng: StdRng,
    cancel: CancelToken,
    interval: Duration,
    reset_when_exhausted: bool,
    startup_message: Option<String>,
    /// Records that failed since the last full pass
    skipped: HashSet<u64>,
}

impl<S: RecordStore, D: DeviceSession> Worker<S, D> {
    pub fn new(store: S, session: D, glyphs: GlyphLibrary, settings: RenderSettings) -> Self {
        Self {
            store,
            session,
            glyphs,
            settings,
            selection: Selection::Sequential,
            rng: StdRng::seed_from_u64(0),
            cancel: CancelToken::new(),
            interval: Duration::ZERO,
            reset_when_exhausted: true,
            startup_message: None,
            skipped: HashSet::new(),
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.rng = match selection {
            Selection::Random { seed: Some(seed) } => StdRng::seed_from_u64(seed),
            _ => StdRng::from_os_rng(),
        };
        self.selection = selection;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn reset_when_exhausted(mut self, reset: bool) -> Self {
        self.reset_when_exhausted = reset;
        self
    }

    pub fn with_startup_message(mut self, message: Option<String>) -> Self {
        self.startup_message = message.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Pick the next record, skipping ones that failed this pass.
    fn select(&mut self, records: Vec<PostRecord>) -> Option<PostRecord> {
        let unprinted: Vec<PostRecord> = records.into_iter().filter(|r| !r.printed).collect();
        if unprinted.is_empty() {
            self.skipped.clear();
            return None;
        }

        let mut candidates: Vec<&PostRecord> = unprinted
            .iter()
            .filter(|r| !self.skipped.contains(&r.id))
            .collect();
        if candidates.is_empty() {
            debug!("every unprinted record failed this pass, retrying them");
            self.skipped.clear();
            candidates = unprinted.iter().collect();
        }

        let pick = match self.selection {
            Selection::Sequential => 0,
            Selection::Random { .. } => self.rng.random_range(0..candidates.len()),
        };
        Some(candidates[pick].clone())
    }

    /// Print the next unprinted record.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        if self.cancel.is_cancelled() {
            return CycleOutcome::Cancelled;
        }

        let records = match self.store.load() {
            Ok(records) => records,
            Err(error) => {
                error!("{}", error);
                return CycleOutcome::Idle { error };
            }
        };

        let Some(record) = self.select(records) else {
            return self.exhausted();
        };
        let id = record.id;
        debug!("record {}: selected (@{})", id, record.author_handle);

        let frames = match render_record(&record, &self.settings, &self.glyphs) {
            Ok(frames) => frames,
            Err(error) => return self.failed(id, error),
        };

        if self.cancel.is_cancelled() {
            return CycleOutcome::Cancelled;
        }
        if !self.session.is_connected() {
            let error = ThermoError::DeviceUnavailable("printer is not connected".to_string());
            error!("record {}: {}", id, error);
            return CycleOutcome::Idle { error };
        }

        if let Err(error) = transmit(&frames, &mut self.session) {
            if matches!(error, ThermoError::Transport(_)) {
                if let Err(e) = self.session.reconnect() {
                    warn!("record {}: reconnect failed: {}", id, e);
                }
            }
            return self.failed(id, error);
        }
        if let Err(error) = self.store.mark_printed(id) {
            return self.failed(id, error);
        }

        info!(
            "record {}: printed @{} ({} frames)",
            id,
            record.author_handle,
            frames.len()
        );
        CycleOutcome::Printed { id }
    }

    /// Skip the record for this pass on a record-scoped failure, otherwise idle.
    fn failed(&mut self, id: u64, error: ThermoError) -> CycleOutcome {
        error!("record {}: {}", id, error);
        if !error.is_record_scoped() {
            return CycleOutcome::Idle { error };
        }
        self.skipped.insert(id);
        CycleOutcome::Failed { id, error }
    }

    fn exhausted(&mut self) -> CycleOutcome {
        if !self.reset_when_exhausted {
            info!("no unprinted records left");
            return CycleOutcome::Exhausted { reset: 0 };
        }
        match self.store.reset_printed() {
            Ok(reset) => {
                info!("no unprinted records left, reset {} records", reset);
                CycleOutcome::Exhausted { reset }
            }
            Err(error) => {
                error!("{}", error);
                CycleOutcome::Idle { error }
            }
        }
    }

    /// Print the startup message, if any.
    pub fn print_startup_message(&mut self) -> Result<(), ThermoError> {
        let Some(message) = self.startup_message.clone() else {
            return Ok(());
        };
        let frames = render_banner(&message, &self.settings, &self.glyphs)?;
        transmit(&frames, &mut self.session)?;
        info!("printed startup message");
        Ok(())
    }

    /// Run cycles until cancelled, waiting the configured interval between
    /// them. Returns the number of records printed.
    pub fn run(&mut self) -> usize {
        if let Err(e) = self.print_startup_message() {
            warn!("startup message not printed: {}", e);
        }

        let mut printed = 0;
        loop {
            let wait = match self.run_cycle() {
                CycleOutcome::Cancelled => break,
                CycleOutcome::Printed { .. } => {
                    printed += 1;
                    self.interval
                }
                CycleOutcome::Exhausted { reset } if reset > 0 => {
                    self.interval.min(EXHAUSTED_RETRY)
                }
                _ => self.interval,
            };
            if !self.cancel.sleep(wait) {
                break;
            }
        }
        info!("stopped after printing {} records", printed);
        printed
    }
}
