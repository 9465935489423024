//! # thermopost CLI
//!
//! Prints social-media posts as labels on a thermal printer.
//!
//! ## Usage
//!
//! ```bash
//! # Print one unprinted post per interval until Ctrl-C
//! thermopost run
//!
//! # Same, but capture frames in memory instead of printing
//! thermopost run --dry-run --debug
//!
//! # Render a post to PNG
//! thermopost preview --png label.png --id 3
//!
//! # Show posts and their printed flag
//! thermopost list
//!
//! # Mark every post unprinted
//! thermopost reset
//! ```
//!
//! The config file comes from `--config`, else `THERMOPOST_CONFIG`, else
//! `./config.toml`.

use clap::{Parser, Subcommand};
use log::{LevelFilter, error, info};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thermopost::{
    ThermoError,
    config::Config,
    label::compose::DATE_FORMAT,
    pipeline::{CancelToken, RenderSettings, Selection, Worker, render_label},
    printer::PrinterConfig,
    store::{JsonStore, PostRecord, RecordStore},
    transport::{DeviceSession, MemorySession, SerialTransport, find_device},
};

/// Pause between attempts to open a missing printer.
const DEVICE_RETRY: Duration = Duration::from_secs(10);

/// thermopost - social-media posts on a thermal printer
#[derive(Parser, Debug)]
#[command(name = "thermopost")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print unprinted posts, one per interval, until Ctrl-C
    Run {
        /// Capture frames in memory instead of opening the printer
        #[arg(long)]
        dry_run: bool,
    },

    /// Render one post to a PNG file
    Preview {
        /// Output file
        #[arg(long, value_name = "FILE")]
        png: PathBuf,

        /// Record id (defaults to the first unprinted record)
        #[arg(long)]
        id: Option<u64>,
    },

    /// List posts and their printed flag
    List,

    /// Mark every post unprinted
    Reset,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), ThermoError> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    let config = Config::load(cli.config.as_deref())?;
    if config.debug {
        apply_log_level(true);
    }

    match cli.command {
        Commands::Run { dry_run } => run_worker(&config, dry_run),
        Commands::Preview { png, id } => preview(&config, &png, id),
        Commands::List => list(&config),
        Commands::Reset => {
            let mut store = JsonStore::new(config.store_path());
            let count = store.reset_printed()?;
            println!("Reset {} records", count);
            Ok(())
        }
    }
}

/// The filter always admits crate debug lines; the global max level gates
/// them until `--debug` or the config's `debug` asks. `RUST_LOG` wins.
fn init_logging(debug: bool) {
    let env = env_logger::Env::default().default_filter_or("info,thermopost=debug");
    env_logger::Builder::from_env(env).init();
    apply_log_level(debug);
}

fn apply_log_level(debug: bool) {
    let rust_log = std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some();
    if let Some(level) = max_log_level(debug, rust_log) {
        log::set_max_level(level);
    }
}

/// Level to impose, or `None` when `RUST_LOG` is in charge.
fn max_log_level(debug: bool, rust_log: bool) -> Option<LevelFilter> {
    match (rust_log, debug) {
        (true, _) => None,
        (false, true) => Some(LevelFilter::Debug),
        (false, false) => Some(LevelFilter::Info),
    }
}

fn run_worker(config: &Config, dry_run: bool) -> Result<(), ThermoError> {
    let printer = config.printer_config()?;
    let glyphs = config.glyph_library()?;
    let settings = RenderSettings::from_config(config)?;

    let mut store = JsonStore::new(config.store_path());
    // Fail early on an unreadable store
    let count = store.load()?.len();
    info!("{} records in {}", count, store.path().display());
    if config.schedule.reset_on_start {
        let reset = store.reset_printed()?;
        info!("reset {} records to unprinted", reset);
    }

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel()).map_err(|e| {
        ThermoError::Io(std::io::Error::other(format!(
            "Failed to install Ctrl-C handler: {}",
            e
        )))
    })?;

    let capture = MemorySession::new();
    let session: Box<dyn DeviceSession> = if dry_run {
        info!("dry run: frames are captured, not printed");
        Box::new(capture.clone())
    } else {
        match open_device_until_ready(config, &printer, &cancel) {
            Some(session) => Box::new(session),
            None => return Ok(()),
        }
    };

    info!(
        "printing on {} ({:.0} mm) every {:.1} minutes",
        printer.name,
        printer.width_mm(),
        config.schedule.interval_minutes
    );
    let mut worker = Worker::new(store, session, glyphs, settings)
        .with_selection(Selection::from_config(config))
        .with_cancel(cancel)
        .with_interval(config.interval())
        .reset_when_exhausted(config.schedule.reset_when_exhausted)
        .with_startup_message(config.schedule.startup_message.clone());
    worker.run();

    if dry_run {
        info!(
            "dry run wrote {} frames, {} bytes",
            capture.writes().len(),
            capture.bytes().len()
        );
    }
    Ok(())
}

/// Open the configured or discovered device, retrying until it appears.
/// Returns `None` if cancelled first.
fn open_device_until_ready(
    config: &Config,
    printer: &PrinterConfig,
    cancel: &CancelToken,
) -> Option<SerialTransport> {
    loop {
        match open_device(config, printer) {
            Ok(session) => return Some(session),
            Err(e) => error!("{}", e),
        }
        if !cancel.sleep(DEVICE_RETRY) {
            return None;
        }
    }
}

fn open_device(config: &Config, printer: &PrinterConfig) -> Result<SerialTransport, ThermoError> {
    let path = match (config.device_path(), printer.usb_id) {
        (Some(path), _) => path,
        (None, Some((vendor, product))) => find_device(vendor, product).ok_or_else(|| {
            ThermoError::DeviceUnavailable(format!(
                "No {} found (USB {:04x}:{:04x})",
                printer.name, vendor, product
            ))
        })?,
        (None, None) => {
            return Err(ThermoError::DeviceUnavailable(format!(
                "No device configured for {}; set printer.device",
                printer.name
            )));
        }
    };
    let session = SerialTransport::open(&path)?;
    info!("opened {}", path.display());
    Ok(session)
}

fn preview(config: &Config, png: &Path, id: Option<u64>) -> Result<(), ThermoError> {
    let glyphs = config.glyph_library()?;
    let settings = RenderSettings::from_config(config)?;
    let records = JsonStore::new(config.store_path()).load()?;

    let record = pick_record(&records, id)?;
    let bitmap = render_label(record, &settings, &glyphs)?;
    bitmap.save_png(png)?;
    println!(
        "Saved record {} ({}x{}) to {}",
        record.id,
        bitmap.width,
        bitmap.height,
        png.display()
    );
    Ok(())
}

fn pick_record(records: &[PostRecord], id: Option<u64>) -> Result<&PostRecord, ThermoError> {
    match id {
        Some(id) => records
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| ThermoError::Store(format!("No record with id {}", id))),
        None => records
            .iter()
            .find(|r| !r.printed)
            .or_else(|| records.first())
            .ok_or_else(|| ThermoError::Store("The record store is empty".to_string())),
    }
}

fn list(config: &Config) -> Result<(), ThermoError> {
    let records = JsonStore::new(config.store_path()).load()?;
    for r in &records {
        println!(
            "[{}] {:>4}  {}  @{}  {}",
            if r.printed { "x" } else { " " },
            r.id,
            r.timestamp.format(DATE_FORMAT),
            r.author_handle,
            r.title
        );
    }
    let printed = records.iter().filter(|r| r.printed).count();
    println!("\n{} of {} printed", printed, records.len());
    Ok(())
}
