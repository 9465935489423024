//! # Error Types
//!
//! This module defines the error type used throughout the thermopost library.
//!
//! Each variant corresponds to one failure kind of the print pipeline. The
//! worker reports every failed record with exactly one message of the form
//! `record <id>: <kind> error: <detail>`, using [`ThermoError::kind`].

use thiserror::Error;

/// Main error type for thermopost operations
#[derive(Debug, Error)]
pub enum ThermoError {
    /// A grapheme cluster had no metrics in any glyph source.
    ///
    /// The shaper recovers from this locally with a placeholder width, so it
    /// is only ever constructed for reporting.
    #[error("Shaping error: {0}")]
    Shaping(String),

    /// Computed label geometry is out of bounds (fatal for that record)
    #[error("Layout error: {0}")]
    Layout(String),

    /// Bitmap dimensions disagree with the declared device width
    #[error("Raster error: {0}")]
    Raster(String),

    /// Device write or connect failure (record stays unprinted)
    #[error("Transport error: {0}")]
    Transport(String),

    /// No printer device could be opened at all
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Invalid or unreadable configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Record store read/write failure
    #[error("Store error: {0}")]
    Store(String),

    /// Preview image encoding failure
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ThermoError {
    /// Short failure-kind label used in operator-facing messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Shaping(_) => "shaping",
            Self::Layout(_) => "layout",
            Self::Raster(_) => "raster",
            Self::Transport(_) => "transport",
            Self::DeviceUnavailable(_) => "device",
            Self::Config(_) => "config",
            Self::Store(_) => "store",
            Self::Image(_) => "image",
            Self::Io(_) => "io",
        }
    }

    /// Whether this failure only affects the current record.
    ///
    /// Per-record failures skip to the next selection; anything else is
    /// surfaced to the operator and the worker idles.
    pub fn is_record_scoped(&self) -> bool {
        matches!(
            self,
            Self::Shaping(_) | Self::Layout(_) | Self::Raster(_) | Self::Transport(_)
        )
    }
}
