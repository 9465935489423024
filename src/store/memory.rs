//! In-memory record store.
//!
//! Clones share the same list, so a test can hand one clone to the worker
//! and inspect the other.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{PostRecord, RecordStore, assign_ids};
use crate::error::ThermoError;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<PostRecord>>>,
}

impl MemoryStore {
    pub fn new(mut records: Vec<PostRecord>) -> Result<Self, ThermoError> {
        assign_ids(&mut records)?;
        Ok(Self {
            records: Arc::new(Mutex::new(records)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PostRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current state of one record.
    pub fn get(&self, id: u64) -> Option<PostRecord> {
        self.lock().iter().find(|r| r.id == id).cloned()
    }

    pub fn printed_ids(&self) -> Vec<u64> {
        self.lock().iter().filter(|r| r.printed).map(|r| r.id).collect()
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Result<Vec<PostRecord>, ThermoError> {
        Ok(self.lock().clone())
    }

    fn mark_printed(&mut self, id: u64) -> Result<(), ThermoError> {
        let mut records = self.lock();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ThermoError::Store(format!("No record with id {}", id)))?;
        record.printed = true;
        Ok(())
    }

    fn reset_printed(&mut self) -> Result<usize, ThermoError> {
        let mut records = self.lock();
        let changed = records.iter().filter(|r| r.printed).count();
        records.iter_mut().for_each(|r| r.printed = false);
        Ok(changed)
    }
}
