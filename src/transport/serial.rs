//! # Serial Transport
//!
//! Sends frames to a printer attached as a USB CDC serial device
//! (`/dev/ttyACM*`) or any other tty.
//!
//! ## Finding the Printer
//!
//! The M08F enumerates as STMicroelectronics `0483:5740`. [`find_device`]
//! walks `/sys/class/tty` and matches each tty's USB parent:
//!
//! ```text
//! /sys/class/tty/ttyACM0/device/../idVendor   → 0483
//! /sys/class/tty/ttyACM0/device/../idProduct  → 5740
//!                                             ⇒ /dev/ttyACM0
//! ```
//!
//! ## Raw Mode
//!
//! A tty is switched to raw 8-bit mode before the first write; raster
//! bytes must reach the head untranslated. A path that is not a tty (a
//! plain file, a pipe) is written as-is.
//!
//! ## Pacing
//!
//! Frames are written in chunks with a short pause between chunks, and a
//! longer pause after each frame so the head can drain its buffer.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::debug;

use super::DeviceSession;
use crate::error::ThermoError;

/// Where the kernel lists tty devices
pub const SYS_CLASS_TTY: &str = "/sys/class/tty";

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// Delay after each complete frame (milliseconds)
const FRAME_DELAY_MS: u64 = 20;

/// # Serial Printer Transport
///
/// ## Example
///
/// ```no_run
/// use thermopost::protocol::commands;
/// use thermopost::transport::{DeviceSession, SerialTransport};
///
/// let mut transport = SerialTransport::open("/dev/ttyACM0")?;
/// transport.write(&commands::init())?;
///
/// # Ok::<(), thermopost::error::ThermoError>(())
/// ```
pub struct SerialTransport {
    file: File,
    path: PathBuf,
    chunk_size: usize,
    chunk_delay: Duration,
    frame_delay: Duration,
}

impl SerialTransport {
    /// Open a printer device for writing.
    ///
    /// ## Errors
    ///
    /// [`ThermoError::DeviceUnavailable`] if the device doesn't exist, can't
    /// be opened (may need the dialout group), or can't be put in raw mode.
    pub fn open<P: AsRef<Path>>(device: P) -> Result<Self, ThermoError> {
        let path = device.as_ref();
        let file = open_raw(path)?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
            frame_delay: Duration::from_millis(FRAME_DELAY_MS),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set the chunk size for large writes. Default is 4096 bytes.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    pub fn set_chunk_delay(&mut self, delay: Duration) {
        self.chunk_delay = delay;
    }

    /// Pause after each frame. Default is 20ms.
    pub fn set_frame_delay(&mut self, delay: Duration) {
        self.frame_delay = delay;
    }

    fn write_chunked(&mut self, data: &[u8]) -> io::Result<()> {
        if data.len() <= self.chunk_size {
            return self.file.write_all(data);
        }
        for chunk in data.chunks(self.chunk_size) {
            self.file.write_all(chunk)?;
            if !self.chunk_delay.is_zero() {
                thread::sleep(self.chunk_delay);
            }
        }
        Ok(())
    }
}

impl DeviceSession for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ThermoError> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.write_chunked(bytes)
            .and_then(|_| self.file.flush())
            .map_err(|e| {
                ThermoError::Transport(format!("Write to {} failed: {}", self.path.display(), e))
            })?;
        if !self.frame_delay.is_zero() {
            thread::sleep(self.frame_delay);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.path.exists()
    }

    /// Reopen the same path. After a USB replug the old descriptor keeps
    /// failing even once the device node is back.
    fn reconnect(&mut self) -> Result<(), ThermoError> {
        self.file = open_raw(&self.path)?;
        debug!("reopened {}", self.path.display());
        Ok(())
    }
}

fn open_raw(path: &Path) -> Result<File, ThermoError> {
    let file = OpenOptions::new().write(true).open(path).map_err(|e| {
        ThermoError::DeviceUnavailable(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let fd = file.as_raw_fd();
    if unsafe { libc::isatty(fd) } == 1 {
        configure_tty_raw(fd)
            .map_err(|e| ThermoError::DeviceUnavailable(format!("{}: {}", path.display(), e)))?;
    } else {
        debug!("{} is not a tty, writing without configuration", path.display());
    }
    Ok(file)
}

/// Put a tty into raw 8N1: no CR/LF mapping, no echo, no line buffering.
///
/// Software flow control must be off too, since 0x11 (XON) and 0x13
/// (XOFF) occur in raster data.
fn configure_tty_raw(fd: i32) -> Result<(), ThermoError> {
    use std::mem::MaybeUninit;

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(ThermoError::Transport(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(ThermoError::Transport(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

// ============================================================================
// DEVICE DISCOVERY
// ============================================================================

/// Find the tty of a USB device by vendor and product id.
///
/// Returns the `/dev` path of the first match, in name order.
pub fn find_device(vendor: u16, product: u16) -> Option<PathBuf> {
    find_device_in(Path::new(SYS_CLASS_TTY), Path::new("/dev"), vendor, product)
}

/// [`find_device`] against an arbitrary sysfs tty directory.
pub fn find_device_in(
    sys_tty: &Path,
    dev_root: &Path,
    vendor: u16,
    product: u16,
) -> Option<PathBuf> {
    let mut names: Vec<String> = fs::read_dir(sys_tty)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    names
        .into_iter()
        .find(|name| usb_id_of(&sys_tty.join(name)) == Some((vendor, product)))
        .map(|name| dev_root.join(name))
}

/// USB ids of a tty's parent device. The interface directory has no ids,
/// so the lookup tries the device directory and then its parent.
fn usb_id_of(tty: &Path) -> Option<(u16, u16)> {
    let device = tty.join("device");
    [device.clone(), device.join("..")]
        .iter()
        .find_map(|dir| Some((read_hex(&dir.join("idVendor"))?, read_hex(&dir.join("idProduct"))?)))
}

fn read_hex(path: &Path) -> Option<u16> {
    let text = fs::read_to_string(path).ok()?;
    u16::from_str_radix(text.trim(), 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_tty(root: &Path, name: &str, ids: Option<(&str, &str)>) {
        let device = root.join(name).join("device");
        fs::create_dir_all(&device).unwrap();
        if let Some((vendor, product)) = ids {
            // Ids live one level up from the interface directory
            fs::write(root.join(name).join("idVendor"), format!("{}\n", vendor)).unwrap();
            fs::write(root.join(name).join("idProduct"), format!("{}\n", product)).unwrap();
        }
    }

    #[test]
    fn test_find_device_by_usb_id() {
        let sys = TempDir::new().unwrap();
        fake_tty(sys.path(), "ttyS0", None);
        fake_tty(sys.path(), "ttyACM0", Some(("1a86", "7523")));
        fake_tty(sys.path(), "ttyACM1", Some(("0483", "5740")));

        let found = find_device_in(sys.path(), Path::new("/dev"), 0x0483, 0x5740);
        assert_eq!(found, Some(PathBuf::from("/dev/ttyACM1")));
    }

    #[test]
    fn test_find_device_none() {
        let sys = TempDir::new().unwrap();
        fake_tty(sys.path(), "ttyACM0", Some(("1a86", "7523")));
        assert_eq!(find_device_in(sys.path(), Path::new("/dev"), 0x0483, 0x5740), None);
        assert_eq!(
            find_device_in(Path::new("/nonexistent"), Path::new("/dev"), 1, 2),
            None
        );
    }

    #[test]
    fn test_open_missing_device() {
        let err = SerialTransport::open("/nonexistent/ttyACM9").err().unwrap();
        assert_eq!(err.kind(), "device");
    }

    #[test]
    fn test_write_to_plain_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("capture.bin");
        fs::write(&path, b"").unwrap();

        let mut transport = SerialTransport::open(&path).unwrap();
        transport.set_frame_delay(Duration::ZERO);
        transport.set_chunk_delay(Duration::ZERO);
        transport.set_chunk_size(3);
        transport.write(&[1, 2, 3, 4, 5]).unwrap();
        transport.write(&[6]).unwrap();

        assert!(transport.is_connected());
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_reconnect_reopens_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("capture.bin");
        fs::write(&path, b"").unwrap();

        let mut transport = SerialTransport::open(&path).unwrap();
        transport.set_frame_delay(Duration::ZERO);
        transport.write(&[1]).unwrap();

        // Device node replaced while the old handle was open
        fs::remove_file(&path).unwrap();
        fs::write(&path, b"").unwrap();
        transport.reconnect().unwrap();
        transport.write(&[2]).unwrap();
        assert_eq!(fs::read(&path).unwrap(), vec![2]);

        fs::remove_file(&path).unwrap();
        assert!(!transport.is_connected());
        assert_eq!(transport.reconnect().unwrap_err().kind(), "device");
    }
}
