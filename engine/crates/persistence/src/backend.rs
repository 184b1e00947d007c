use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::PersistenceError;
use crate::suppression::SuppressionGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// Suppression was active; nothing reached storage.
    Suppressed,
}

/// Durable key/blob storage for per-player records.
pub trait SnapshotBackend: Send + Sync {
    fn save(&self, key: &str, blob: &[u8]) -> Result<SaveOutcome, PersistenceError>;

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError>;

    fn remove(&self, key: &str) -> Result<SaveOutcome, PersistenceError>;

    /// Every stored key, sorted.
    fn keys(&self) -> Result<Vec<String>, PersistenceError>;
}

/// Shared handle, so a caller can keep inspecting a backend it handed to a
/// store.
impl<T: SnapshotBackend + ?Sized> SnapshotBackend for Arc<T> {
    fn save(&self, key: &str, blob: &[u8]) -> Result<SaveOutcome, PersistenceError> {
        (**self).save(key, blob)
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        (**self).load(key)
    }

    fn remove(&self, key: &str) -> Result<SaveOutcome, PersistenceError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        (**self).keys()
    }
}

/// Process-local backend. Honors suppression like the durable one.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<BTreeMap<String, Vec<u8>>>,
    guard: SuppressionGuard,
}

impl MemoryBackend {
    pub fn new(guard: SuppressionGuard) -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            guard,
        }
    }

    /// Write a record regardless of suppression, e.g. to seed a test fixture.
    pub fn insert_raw(&self, key: impl Into<String>, blob: impl Into<Vec<u8>>) {
        self.records().insert(key.into(), blob.into());
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    fn records(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotBackend for MemoryBackend {
    fn save(&self, key: &str, blob: &[u8]) -> Result<SaveOutcome, PersistenceError> {
        if self.guard.is_suppressed() {
            return Ok(SaveOutcome::Suppressed);
        }
        self.records().insert(key.to_string(), blob.to_vec());
        Ok(SaveOutcome::Written)
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(self.records().get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<SaveOutcome, PersistenceError> {
        if self.guard.is_suppressed() {
            return Ok(SaveOutcome::Suppressed);
        }
        self.records().remove(key);
        Ok(SaveOutcome::Written)
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        Ok(self.records().keys().cloned().collect())
    }
}
