//! # Printer Module
//!
//! This module provides printer-specific configurations.
//!
//! ## Modules
//!
//! - [`config`]: Printer models and their raster limits

pub mod config;

pub use config::PrinterConfig;
