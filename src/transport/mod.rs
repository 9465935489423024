//! # Printer Transport Layer
//!
//! Device sessions that carry encoded frames to a printer.
//!
//! ## Available Transports
//!
//! - [`serial`]: USB CDC / serial tty in raw mode (Linux), with discovery by
//!   USB vendor and product id
//! - [`memory`]: captures frames in memory; used for `--dry-run` and tests
//!
//! Sessions are passed explicitly to whoever prints. There is no global
//! printer handle.

pub mod memory;
pub mod serial;

use crate::error::ThermoError;

pub use memory::MemorySession;
pub use serial::{SerialTransport, find_device};

/// An open connection to a printer.
pub trait DeviceSession {
    /// Write one frame completely, or fail with [`ThermoError::Transport`].
    fn write(&mut self, bytes: &[u8]) -> Result<(), ThermoError>;

    /// Whether the device still appears to be attached.
    fn is_connected(&self) -> bool;

    /// Drop the current handle and open the device again, after a failed
    /// write. Sessions without a handle to renew keep the default.
    fn reconnect(&mut self) -> Result<(), ThermoError> {
        Ok(())
    }
}

impl<T: DeviceSession + ?Sized> DeviceSession for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ThermoError> {
        (**self).write(bytes)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn reconnect(&mut self) -> Result<(), ThermoError> {
        (**self).reconnect()
    }
}
