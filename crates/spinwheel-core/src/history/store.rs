//! File-backed spin history.
//!
//! The whole history lives in one JSON document:
//!
//! ```text
//! { "history": [ { "member": ..., "time": ..., "ends_at": ..., "member_id"?: ... }, ... ] }
//! ```
//!
//! Writes go to a temporary file in the same directory which then replaces
//! the real file, so readers only ever see a complete document. All file
//! access is serialized through one lock per store; appends are
//! read-modify-write and assume a single writer process.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::SpinEntry;
use crate::clock::Clock;
use crate::error::StoreError;

/// Default file name inside the data directory.
pub const HISTORY_FILE_NAME: &str = "timeouts.json";

/// On-disk document. Entries stay raw JSON so records that no longer decode
/// are carried through rewrites untouched.
#[derive(Deserialize)]
struct StoredDocument {
    #[serde(default)]
    history: Vec<serde_json::Value>,
}

/// One entry as written; timestamps stay strings until the clock can attach
/// a zone to readings stored without one.
#[derive(Deserialize)]
struct StoredEntry {
    member: String,
    time: String,
    ends_at: String,
    #[serde(default)]
    member_id: Option<String>,
}

#[derive(Serialize)]
struct DocumentRef<'a, T> {
    history: &'a [T],
}

/// Durable, append-only log of spins.
pub struct EventStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore").field("path", &self.path).finish()
    }
}

impl EventStore {
    /// Bind a store to `path`. Nothing touches the disk until first use.
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full history, creating an empty document if none exists.
    ///
    /// Entries that do not decode are skipped with a warning; the rest are
    /// returned in file order.
    ///
    /// # Errors
    /// Returns a `StoreError` if the file cannot be created or read, or is
    /// not a history document at all.
    pub fn try_load_history(&self) -> Result<Vec<SpinEntry>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let raw = self.read_raw_locked()?;
        Ok(self.decode_all(raw))
    }

    /// Load the full history; an unreadable document yields an empty history.
    pub fn load_history(&self) -> Vec<SpinEntry> {
        self.try_load_history().unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "spin history unreadable, starting empty");
            Vec::new()
        })
    }

    /// Replace the stored history atomically.
    ///
    /// # Errors
    /// Returns a `StoreError` if the temporary file cannot be written or
    /// cannot replace the real one. The previous document is left intact.
    pub fn try_save_history(&self, history: &[SpinEntry]) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_locked(history)
    }

    /// Replace the stored history atomically, logging and discarding failures.
    pub fn save_history(&self, history: &[SpinEntry]) {
        if let Err(e) = self.try_save_history(history) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to save spin history");
        }
    }

    /// Append one entry: read the stored history, push, write it all back.
    ///
    /// Entries that do not decode are written back as they were. A document
    /// that is not a history at all is treated as empty and replaced.
    ///
    /// # Errors
    /// Returns a `StoreError` if the updated document cannot be written.
    pub fn append_entry(&self, entry: &SpinEntry) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut history = self.read_raw_locked().unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "replacing unreadable spin history");
            Vec::new()
        });
        history.push(serde_json::to_value(entry)?);
        self.write_locked(&history)
    }

    // ── Internal (lock held) ─────────────────────────────────────────

    fn read_raw_locked(&self) -> Result<Vec<serde_json::Value>, StoreError> {
        if !self.path.exists() {
            self.write_locked::<SpinEntry>(&[])?;
            return Ok(Vec::new());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let doc: StoredDocument = serde_json::from_str(&content)?;
        Ok(doc.history)
    }

    fn decode_all(&self, raw: Vec<serde_json::Value>) -> Vec<SpinEntry> {
        raw.into_iter()
            .enumerate()
            .filter_map(|(index, value)| match self.decode(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), index, error = %e, "skipping undecodable spin entry");
                    None
                }
            })
            .collect()
    }

    fn decode(&self, value: serde_json::Value) -> Result<SpinEntry, StoreError> {
        let raw: StoredEntry = serde_json::from_value(value)?;
        Ok(SpinEntry {
            time: self.parse_timestamp("time", &raw.time)?,
            ends_at: self.parse_timestamp("ends_at", &raw.ends_at)?,
            member: raw.member,
            member_id: raw.member_id,
        })
    }

    fn write_locked<T: Serialize>(&self, history: &[T]) -> Result<(), StoreError> {
        self.write_atomic(|file| {
            let mut content = serde_json::to_vec_pretty(&DocumentRef { history })?;
            content.push(b'\n');
            file.write_all(&content)
                .map_err(|e| StoreError::io(file.path(), e))
        })
    }

    /// Run `fill` against a fresh temporary file next to the store, then
    /// rename it over the real file. If `fill` fails the temporary file is
    /// removed and the real file is untouched.
    fn write_atomic<F>(&self, fill: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut NamedTempFile) -> Result<(), StoreError>,
    {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        fill(&mut tmp)?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&self.path).map_err(|e| StoreError::Persist {
            path: self.path.clone(),
            source: e.error,
        })?;
        Ok(())
    }

    /// Parse an ISO-8601 timestamp; readings without a zone are taken to be
    /// in the clock's civil timezone.
    fn parse_timestamp(
        &self,
        field: &'static str,
        raw: &str,
    ) -> Result<DateTime<FixedOffset>, StoreError> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt);
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .and_then(|naive| self.clock.localize(naive))
            .ok_or_else(|| StoreError::InvalidTimestamp {
                field,
                value: raw.to_string(),
            })
    }
}
