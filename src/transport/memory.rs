//! In-memory device session.
//!
//! Records every successful write. Clones share the same buffer, so the
//! caller can keep a handle while the worker owns the session.

use std::sync::{Arc, Mutex, MutexGuard};

use super::DeviceSession;
use crate::error::ThermoError;

#[derive(Debug, Default)]
struct State {
    writes: Vec<Vec<u8>>,
    attempts: usize,
    reconnects: usize,
    fail_at: Option<usize>,
    connected: bool,
}

#[derive(Debug, Clone)]
pub struct MemorySession {
    state: Arc<Mutex<State>>,
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySession {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                connected: true,
                ..State::default()
            })),
        }
    }

    /// Session whose `n`th write (0-based, counted across the session's
    /// life) fails with a transport error.
    pub fn failing_at(n: usize) -> Self {
        let session = Self::new();
        session.lock().fail_at = Some(n);
        session
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Frames written so far.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock().writes.clone()
    }

    /// All written bytes, concatenated.
    pub fn bytes(&self) -> Vec<u8> {
        self.lock().writes.concat()
    }

    /// Write calls made, including failed ones.
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    /// Times [`DeviceSession::reconnect`] was called.
    pub fn reconnects(&self) -> usize {
        self.lock().reconnects
    }

    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }
}

impl DeviceSession for MemorySession {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ThermoError> {
        let mut state = self.lock();
        let n = state.attempts;
        state.attempts += 1;
        if !state.connected {
            return Err(ThermoError::Transport("Device disconnected".to_string()));
        }
        if state.fail_at == Some(n) {
            return Err(ThermoError::Transport(format!("Simulated failure on write {}", n)));
        }
        state.writes.push(bytes.to_vec());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    fn reconnect(&mut self) -> Result<(), ThermoError> {
        let mut state = self.lock();
        state.reconnects += 1;
        if state.connected {
            Ok(())
        } else {
            Err(ThermoError::DeviceUnavailable("Device disconnected".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_writes() {
        let session = MemorySession::new();
        let mut handle = session.clone();
        handle.write(&[1, 2]).unwrap();
        handle.write(&[3]).unwrap();
        assert_eq!(session.writes(), vec![vec![1, 2], vec![3]]);
        assert_eq!(session.bytes(), vec![1, 2, 3]);
    }

    #[test]
    fn test_fails_at_write() {
        let mut session = MemorySession::failing_at(1);
        session.write(&[1]).unwrap();
        let err = session.write(&[2]).unwrap_err();
        assert_eq!(err.kind(), "transport");
        session.write(&[3]).unwrap();
        assert_eq!(session.writes(), vec![vec![1], vec![3]]);
        assert_eq!(session.attempts(), 3);
    }

    #[test]
    fn test_disconnected() {
        let mut session = MemorySession::new();
        session.set_connected(false);
        assert!(!session.is_connected());
        assert!(session.write(&[1]).is_err());
    }
}
