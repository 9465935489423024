//! # ESC/POS Protocol Commands
//!
//! Builders for the handful of ESC/POS commands a label job needs: reset,
//! head density and speed, line spacing and paper feed. Raster blocks live
//! in [`super::graphics`].
//!
//! Parameters are single bytes except for raster sizes, which are 16-bit
//! little-endian (`0x1234` goes out as `34 12`).

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// Used for raster graphics (`GS v 0`).
pub const GS: u8 = 0x1D;

/// LF (Line Feed) - Print and advance one line
///
/// Advances the paper by the current line spacing (see [`line_spacing`]).
pub const LF: u8 = 0x0A;

/// Highest density level accepted by `ESC 7 n`
pub const MAX_DENSITY: u8 = 7;

/// Speed range accepted by `ESC s n` (1 = slowest)
pub const SPEED_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Largest number of line feeds sent in one block
pub const MAX_FEED_BLOCK: usize = 255;

// ============================================================================
// INITIALIZATION COMMANDS
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Resets the printer to its power-on defaults. Every label starts with it.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
///
/// ```
/// use thermopost::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

// ============================================================================
// HEAD CONTROL COMMANDS
// ============================================================================

/// # Set Print Density (ESC 7 n)
///
/// Selects the heating level of the print head.
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC 7 n  |
/// | Hex     | 1B 37 n  |
///
/// `n` ranges 0 (lightest) to 7 (darkest); larger values are clamped.
#[inline]
pub fn set_density(n: u8) -> Vec<u8> {
    vec![ESC, b'7', n.min(MAX_DENSITY)]
}

/// # Set Print Speed (ESC s n)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC s n  |
/// | Hex     | 1B 73 n  |
///
/// `n` ranges 1 (slow, darkest) to 5 (fast). Values outside the range are
/// clamped; callers validate configuration before reaching this point.
#[inline]
pub fn set_speed(n: u8) -> Vec<u8> {
    vec![ESC, b's', n.clamp(*SPEED_RANGE.start(), *SPEED_RANGE.end())]
}

/// # Set Line Spacing (ESC 3 n)
///
/// Sets the distance advanced by each `LF` to `n` dots.
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC 3 n  |
/// | Hex     | 1B 33 n  |
///
/// ```
/// use thermopost::protocol::commands;
///
/// assert_eq!(commands::line_spacing(64), vec![0x1B, 0x33, 0x40]);
/// ```
#[inline]
pub fn line_spacing(n: u8) -> Vec<u8> {
    vec![ESC, b'3', n]
}

// ============================================================================
// PAPER FEED COMMANDS
// ============================================================================

/// Feed `lines` blank lines as blocks of at most [`MAX_FEED_BLOCK`] `LF` bytes.
///
/// Returns no blocks for zero lines.
///
/// ```
/// use thermopost::protocol::commands;
///
/// let blocks = commands::line_feeds(300);
/// assert_eq!(blocks.len(), 2);
/// assert_eq!(blocks[0].len(), 255);
/// assert_eq!(blocks[1].len(), 45);
/// ```
pub fn line_feeds(lines: usize) -> Vec<Vec<u8>> {
    let mut blocks = Vec::new();
    let mut remaining = lines;
    while remaining > 0 {
        let n = remaining.min(MAX_FEED_BLOCK);
        blocks.push(vec![LF; n]);
        remaining -= n;
    }
    blocks
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Encode a u16 value as little-endian bytes [low, high]
///
/// ```
/// use thermopost::protocol::commands::u16_le;
///
/// assert_eq!(u16_le(0x1234), [0x34, 0x12]);
/// assert_eq!(u16_le(190), [0xBE, 0x00]);
/// ```
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert_eq!(init(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_density() {
        assert_eq!(set_density(0), vec![0x1B, 0x37, 0]);
        assert_eq!(set_density(7), vec![0x1B, 0x37, 7]);
        // Clamped to the darkest level
        assert_eq!(set_density(12), vec![0x1B, 0x37, 7]);
    }

    #[test]
    fn test_speed_clamps() {
        assert_eq!(set_speed(2), vec![0x1B, 0x73, 2]);
        assert_eq!(set_speed(0), vec![0x1B, 0x73, 1]);
        assert_eq!(set_speed(9), vec![0x1B, 0x73, 5]);
    }

    #[test]
    fn test_line_spacing() {
        assert_eq!(line_spacing(0x40), vec![0x1B, 0x33, 0x40]);
    }

    #[test]
    fn test_line_feeds_zero() {
        assert!(line_feeds(0).is_empty());
    }

    #[test]
    fn test_line_feeds_exact_block() {
        let blocks = line_feeds(255);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].iter().all(|&b| b == LF));
    }

    #[test]
    fn test_u16_le() {
        assert_eq!(u16_le(0x0000), [0x00, 0x00]);
        assert_eq!(u16_le(0x00FF), [0xFF, 0x00]);
        assert_eq!(u16_le(0xFF00), [0x00, 0xFF]);
        assert_eq!(u16_le(576), [0x40, 0x02]);
    }
}
