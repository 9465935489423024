//! # ESC/POS Raster Graphics
//!
//! Builds `GS v 0` blocks from packed rows. Rows run top to bottom in paper
//! feed order; within a row the first byte holds the leftmost eight dots,
//! most significant bit first, and a set bit burns a dot.
//!
//! ```text
//! 0xC3 = 1100_0011 = ██░░░░██
//! ```

use super::commands::{GS, u16_le};

/// Length of the `GS v 0` header in bytes.
pub const RASTER_HEADER_LEN: usize = 8;

/// # Print Raster Bit Image (GS v 0 m xL xH yL yH d1...dk)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | GS v 0 m xL xH yL yH d1...dk |
/// | Hex     | 1D 76 30 m xL xH yL yH d1...dk |
///
/// ## Parameters
///
/// - `m`: Mode (0 = normal density, 1 dot per bit)
/// - `xL, xH`: Bytes per row, little-endian
/// - `yL, yH`: Rows in this block, little-endian
/// - `d1...dk`: Image data, k = bytes per row × rows
///
/// Printers with small receive buffers limit the rows per block (255 on
/// the M08F), so a full label is sent as several of these.
///
/// ```
/// use thermopost::protocol::graphics;
///
/// let data = vec![0xAA; 72 * 100];
/// let cmd = graphics::raster(72, 100, &data);
///
/// assert_eq!(&cmd[0..4], &[0x1D, 0x76, 0x30, 0x00]);
/// assert_eq!(&cmd[4..6], &[72, 0]);  // xL xH
/// assert_eq!(&cmd[6..8], &[100, 0]); // yL yH
/// assert_eq!(cmd.len(), 8 + 72 * 100);
/// ```
pub fn raster(width_bytes: u16, rows: u16, data: &[u8]) -> Vec<u8> {
    debug_assert_eq!(
        data.len(),
        width_bytes as usize * rows as usize,
        "block of {} rows at {} bytes per row",
        rows,
        width_bytes
    );

    let [xl, xh] = u16_le(width_bytes);
    let [yl, yh] = u16_le(rows);

    let mut block = Vec::with_capacity(RASTER_HEADER_LEN + data.len());
    // m = 0: one dot per bit, no scaling
    block.extend_from_slice(&[GS, b'v', b'0', 0, xl, xh, yl, yh]);
    block.extend_from_slice(data);
    block
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_m08f_block_header() {
        let block = raster(190, 10, &vec![0xFF; 190 * 10]);
        assert_eq!(&block[..8], &[0x1D, 0x76, 0x30, 0, 190, 0, 10, 0]);
    }

    #[test]
    fn test_raster_wide_row_little_endian() {
        // 300 bytes per row = 0x012C
        let data = vec![0x00; 300];
        let block = raster(300, 1, &data);
        assert_eq!(&block[4..6], &[0x2C, 0x01]);
    }

    #[test]
    fn test_payload_follows_header_unchanged() {
        let data: Vec<u8> = (0..72 * 5).map(|i| (i % 256) as u8).collect();
        let block = raster(72, 5, &data);
        assert_eq!(&block[RASTER_HEADER_LEN..], &data[..]);
    }
}
