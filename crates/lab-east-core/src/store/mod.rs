//! Local key-value store.
//!
//! Collections are kept as JSON strings under fixed keys, the same layout the
//! browser build keeps in `localStorage`. The storage medium sits behind
//! [`StorageBackend`]:
//!
//! - [`SqliteBackend`]: single-table SQLite file (or in-memory connection)
//! - [`MemoryBackend`]: `HashMap` with an optional byte quota
//!
//! [`LocalStore`] layers typed JSON access on top. Its plain `get`/`set`
//! calls never fail: errors are logged and reported as missing data or a
//! `false` return, and callers must tolerate stale state after a failed
//! write. The `try_*` variants surface the error instead.

mod memory;
mod schema;
mod sqlite;

pub use memory::*;
pub use schema::*;
pub use sqlite::*;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Fixed storage keys.
pub mod keys {
    /// Full patient collection.
    pub const PATIENTS: &str = "lab_east_patients";
    /// Highest patient sequence number ever assigned.
    pub const PATIENT_SEQUENCE: &str = "lab_east_patient_seq";
    /// Signed-in user.
    pub const CURRENT_USER: &str = "lab_east_current_user";
    /// Lab session cache of submitted tests.
    pub const SUBMITTED_TESTS: &str = "lab_east_submitted_tests";
    /// Mock bearer token of the current session.
    pub const TOKEN: &str = "token";
    /// Patient currently open on the admin dashboard.
    pub const SELECTED_PATIENT: &str = "selected_patient";
    /// Prefix of the per-patient test result cache.
    pub const PATIENT_TESTS_PREFIX: &str = "lab_east_patient_tests_";
    /// Prefix of report backups.
    pub const REPORT_PREFIX: &str = "patient_report_";

    /// Key of the cached test results for one patient.
    pub fn patient_tests(patient_id: &str) -> String {
        format!("{}{}", PATIENT_TESTS_PREFIX, patient_id)
    }

    /// Key of one report backup.
    pub fn report_backup(patient_id: &str, millis: i64) -> String {
        format!("{}{}_{}", REPORT_PREFIX, patient_id, millis)
    }
}

/// Raw string storage, synchronous and single-writer.
pub trait StorageBackend {
    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_item(&mut self, key: &str) -> StoreResult<()>;

    /// All stored keys.
    fn keys(&self) -> StoreResult<Vec<String>>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> StoreResult<()> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        (**self).keys()
    }
}

/// Typed JSON access over a [`StorageBackend`].
#[derive(Debug)]
pub struct LocalStore<B> {
    backend: B,
}

impl<B: StorageBackend> LocalStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Read and deserialize the value under `key`.
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.backend.get_item(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize and write `value` under `key`.
    pub fn try_set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> StoreResult<()> {
        let raw = serde_json::to_string(value)?;
        self.backend.set_item(key, &raw)
    }

    /// Read `key`, treating any failure as missing data.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read from local store");
                None
            }
        }
    }

    /// Write `key`. Returns `false` if the write failed.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        match self.try_set(key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to write to local store");
                false
            }
        }
    }

    /// Remove `key`. Returns `false` if the removal failed.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.backend.remove_item(key) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to remove from local store");
                false
            }
        }
    }

    /// Keys starting with `prefix`, sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        match self.backend.keys() {
            Ok(all) => {
                let mut matching: Vec<String> =
                    all.into_iter().filter(|k| k.starts_with(prefix)).collect();
                matching.sort();
                matching
            }
            Err(e) => {
                tracing::warn!(prefix, error = %e, "Failed to list local store keys");
                Vec::new()
            }
        }
    }

    /// Remove the patient collection, the current user and every cached
    /// per-patient test list. The patient ID sequence is kept.
    pub fn clear_all(&mut self) -> bool {
        let mut ok = self.remove(keys::PATIENTS);
        ok &= self.remove(keys::CURRENT_USER);
        for key in self.keys_with_prefix(keys::PATIENT_TESTS_PREFIX) {
            ok &= self.remove(&key);
        }
        ok
    }
}
