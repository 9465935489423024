//! # Printer Models
//!
//! Hardware limits the encoder and rasterizer must respect. A label whose
//! raster width differs from `width_dots` prints skewed, so every stage
//! checks against these numbers rather than trusting the caller.
//!
//! | Model | Dots | Bytes/row | Rows per block | USB |
//! |-------|------|-----------|----------------|-----|
//! | `generic-80mm` | 576 | 72 | 255 | - |
//! | `m08f` | 1518 | 190 | 255 | `0483:5740` |
//!
//! ```
//! use thermopost::printer::PrinterConfig;
//!
//! let m08f = PrinterConfig::by_name("m08f").unwrap();
//! assert_eq!(m08f.width_bytes, 190);
//! ```

/// Raster geometry and protocol limits of one printer model.
///
/// `width_bytes` is `width_dots` rounded up to whole bytes; the M08F head
/// is 1518 dots (190 mm at 203 dpi), so its last byte carries two pad bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterConfig {
    /// Printer model name
    pub name: &'static str,

    /// Printable width in dots (pixels)
    pub width_dots: u16,

    /// Raster row width in bytes
    pub width_bytes: u16,

    /// Resolution in dots per inch
    pub dpi: u16,

    /// Maximum rows per raster block
    pub max_chunk_rows: u16,

    /// Line feed distance in dots
    pub line_spacing: u8,

    /// Whether rows must be sent bottom-first
    pub flip_vertical: bool,

    /// USB vendor/product id used for device discovery
    pub usb_id: Option<(u16, u16)>,
}

impl PrinterConfig {
    /// Common 80 mm receipt head, 72 mm printable.
    pub const GENERIC_80MM: Self = Self {
        name: "Generic 80mm",
        width_dots: 576,
        width_bytes: 72,
        dpi: 203,
        max_chunk_rows: 255,
        line_spacing: 64,
        flip_vertical: false,
        usb_id: None,
    };

    /// # Phomemo M08F Configuration
    ///
    /// A4 thermal printer attached as a USB CDC serial device
    /// (STMicroelectronics VID 0483, PID 5740).
    pub const M08F: Self = Self {
        name: "Phomemo M08F",
        width_dots: 1518,
        width_bytes: 190,
        dpi: 203,
        max_chunk_rows: 255,
        line_spacing: 64,
        flip_vertical: false,
        usb_id: Some((0x0483, 0x5740)),
    };

    /// Look up a built-in model by its config name.
    ///
    /// ```
    /// use thermopost::printer::PrinterConfig;
    ///
    /// assert_eq!(PrinterConfig::by_name("m08f"), Some(PrinterConfig::M08F));
    /// assert_eq!(PrinterConfig::by_name("nope"), None);
    /// ```
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "generic-80mm" | "80mm" => Some(Self::GENERIC_80MM),
            "m08f" | "phomemo-m08f" => Some(Self::M08F),
            _ => None,
        }
    }

    /// Names accepted by [`PrinterConfig::by_name`].
    pub fn list_models() -> &'static [&'static str] {
        &["generic-80mm", "m08f"]
    }

    /// Printable width in millimeters.
    pub fn width_mm(&self) -> f32 {
        self.width_dots as f32 * 25.4 / self.dpi as f32
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::GENERIC_80MM
    }
}

// ============================================================================
// TESTS
// ============================================================================
