//! # Record Store
//!
//! A flat list of posts, each with a `printed` flag.
//!
//! ## Record Format
//!
//! ```json
//! [
//!   {
//!     "id": 1,
//!     "author_handle": "ada",
//!     "title": "Hello",
//!     "body": "First post",
//!     "tags": ["#intro"],
//!     "timestamp": "2016-10-10",
//!     "printed": false
//!   }
//! ]
//! ```
//!
//! `id`, `body`, `tags` and `printed` may be omitted. A missing id is
//! assigned from the record's 1-based position in the list.

pub mod json;
pub mod memory;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ThermoError;

pub use json::JsonStore;
pub use memory::MemoryStore;

/// One social-media post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Stable identity; 0 in a file means "assign from position"
    #[serde(default)]
    pub id: u64,
    pub author_handle: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub timestamp: NaiveDate,
    #[serde(default)]
    pub printed: bool,
}

impl PostRecord {
    pub fn new(id: u64, author_handle: &str, timestamp: NaiveDate) -> Self {
        Self {
            id,
            author_handle: author_handle.to_string(),
            title: String::new(),
            body: String::new(),
            tags: Vec::new(),
            timestamp,
            printed: false,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// Source of post records.
///
/// `mark_printed` is idempotent: marking an already-printed record succeeds
/// without changing anything.
pub trait RecordStore {
    fn load(&self) -> Result<Vec<PostRecord>, ThermoError>;

    fn mark_printed(&mut self, id: u64) -> Result<(), ThermoError>;

    /// Clear every printed flag. Returns how many records changed.
    fn reset_printed(&mut self) -> Result<usize, ThermoError>;
}

/// Fill missing ids from position and reject duplicates.
pub(crate) fn assign_ids(records: &mut [PostRecord]) -> Result<(), ThermoError> {
    for (i, record) in records.iter_mut().enumerate() {
        if record.id == 0 {
            record.id = i as u64 + 1;
        }
    }
    let mut seen = std::collections::HashSet::new();
    for record in records.iter() {
        if !seen.insert(record.id) {
            return Err(ThermoError::Store(format!("Duplicate record id {}", record.id)));
        }
    }
    Ok(())
}
