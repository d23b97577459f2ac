//! Progress store: cached, merge-on-update persistence of progress records.
//!
//! The in-memory cache is authoritative for the session; the key-value store
//! underneath is a best-effort durability layer. Storage failures never cross
//! this boundary — reads fall back to the default record and write failures
//! are reported in the returned status.

use std::collections::HashMap;

use crate::storage::KeyValueStore;

use super::record::{DayUpdate, ProgressRecord};

/// Namespace prefix for persisted progress keys.
pub const PROGRESS_KEY_PREFIX: &str = "habit-progress-";

/// Outcome of the persistence side effect of an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistStatus {
    Saved,
    /// The in-memory record is still authoritative; only durability was lost.
    Failed(String),
}

impl PersistStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistStatus::Saved)
    }
}

/// Result of a mutating store operation.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreUpdate {
    /// Snapshot of the record after the update.
    pub record: ProgressRecord,
    pub persisted: PersistStatus,
}

/// Owns the per-script progress records. Single writer; callers hold
/// read-only snapshots and must re-request after mutating.
pub struct ProgressStore<S: KeyValueStore> {
    store: S,
    cache: HashMap<String, ProgressRecord>,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    fn storage_key(script_id: &str) -> String {
        format!("{}{}", PROGRESS_KEY_PREFIX, script_id)
    }

    /// Snapshot of the record for `script_id`, created lazily on first read.
    ///
    /// Read failures, parse failures, and malformed shapes all fall back to
    /// the default record; the fallback is cached so later reads agree.
    pub fn get(&mut self, script_id: &str) -> ProgressRecord {
        if let Some(record) = self.cache.get(script_id) {
            return record.clone();
        }

        let key = Self::storage_key(script_id);
        let record = match self.store.read(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<ProgressRecord>(&raw) {
                Ok(record) => record,
                Err(e) => {
                    log::warn!("Progress: failed to parse record for {}: {}", script_id, e);
                    ProgressRecord::default()
                }
            },
            Ok(None) => ProgressRecord::default(),
            Err(e) => {
                log::warn!("Progress: read failed for {}: {}", script_id, e);
                ProgressRecord::default()
            }
        };

        self.cache.insert(script_id.to_string(), record.clone());
        record
    }

    /// Merge `update` into the progress for `day` and persist the record.
    pub fn update(&mut self, script_id: &str, day: u32, update: DayUpdate) -> StoreUpdate {
        let mut record = self.get(script_id);
        record.apply_day(day, update);
        self.commit(script_id, record)
    }

    /// Set the daily-reminder opt-in and persist the record.
    pub fn set_reminder(&mut self, script_id: &str, enabled: bool) -> StoreUpdate {
        let mut record = self.get(script_id);
        record.reminder = enabled;
        self.commit(script_id, record)
    }

    fn commit(&mut self, script_id: &str, record: ProgressRecord) -> StoreUpdate {
        let key = Self::storage_key(script_id);
        let persisted = match serde_json::to_string(&record) {
            Ok(raw) => match self.store.write(&key, &raw) {
                Ok(()) => PersistStatus::Saved,
                Err(e) => {
                    log::warn!("Progress: save failed for {}: {}", script_id, e);
                    PersistStatus::Failed(e.to_string())
                }
            },
            Err(e) => {
                log::warn!("Progress: serialize failed for {}: {}", script_id, e);
                PersistStatus::Failed(e.to_string())
            }
        };

        // The cache is updated regardless of the write outcome so a get() in
        // the same session observes the latest value.
        self.cache.insert(script_id.to_string(), record.clone());

        StoreUpdate { record, persisted }
    }
}
