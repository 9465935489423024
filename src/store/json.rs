//! JSON file record store.
//!
//! Every mutation rewrites the whole file through a sibling temp file and
//! a rename, so a reader sees either the old list or the new one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;

use super::{PostRecord, RecordStore, assign_ids};
use crate::error::ThermoError;

/// Record store backed by a JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<PostRecord>, ThermoError> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            ThermoError::Store(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let mut records: Vec<PostRecord> = serde_json::from_str(&text).map_err(|e| {
            ThermoError::Store(format!("Invalid records in {}: {}", self.path.display(), e))
        })?;
        assign_ids(&mut records)?;
        Ok(records)
    }

    fn write(&self, records: &[PostRecord]) -> Result<(), ThermoError> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| ThermoError::Store(format!("Failed to serialize records: {}", e)))?;

        let tmp = self.temp_path();
        let result = fs::File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(json.as_bytes())?;
                file.write_all(b"\n")?;
                file.sync_all()
            })
            .and_then(|_| fs::rename(&tmp, &self.path));

        result.map_err(|e| {
            let _ = fs::remove_file(&tmp);
            ThermoError::Store(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "records.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RecordStore for JsonStore {
    fn load(&self) -> Result<Vec<PostRecord>, ThermoError> {
        self.read()
    }

    fn mark_printed(&mut self, id: u64) -> Result<(), ThermoError> {
        let mut records = self.read()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ThermoError::Store(format!("No record with id {}", id)))?;
        if record.printed {
            return Ok(());
        }
        record.printed = true;
        self.write(&records)?;
        debug!("marked record {} printed in {}", id, self.path.display());
        Ok(())
    }

    fn reset_printed(&mut self) -> Result<usize, ThermoError> {
        let mut records = self.read()?;
        let mut changed = 0;
        for record in records.iter_mut().filter(|r| r.printed) {
            record.printed = false;
            changed += 1;
        }
        if changed > 0 {
            self.write(&records)?;
        }
        Ok(changed)
    }
}
