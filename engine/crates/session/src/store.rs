//! Snapshot Store: at most one snapshot per player, optionally mirrored to a
//! durable backend.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::{Mutex, MutexGuard, PoisonError};

use persistence::{MemoryBackend, PersistenceError, SaveOutcome, SnapshotBackend, SuppressionGuard};

use crate::snapshot::Snapshot;
use crate::world::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An active snapshot already existed; nothing was captured.
    AlreadyActive,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Keys whose records failed to parse or validate.
    pub dropped: Vec<String>,
}

pub struct SnapshotStore {
    snapshots: Mutex<BTreeMap<PlayerId, Snapshot>>,
    backend: Box<dyn SnapshotBackend>,
    guard: SuppressionGuard,
}

impl SnapshotStore {
    pub fn new(backend: Box<dyn SnapshotBackend>, guard: SuppressionGuard) -> Self {
        Self {
            snapshots: Mutex::new(BTreeMap::new()),
            backend,
            guard,
        }
    }

    /// Store backed by a process-local backend.
    pub fn in_memory() -> Self {
        let guard = SuppressionGuard::new();
        Self::new(Box::new(MemoryBackend::new(guard.clone())), guard)
    }

    pub fn guard(&self) -> &SuppressionGuard {
        &self.guard
    }

    /// Load every persisted record. Malformed records are logged and
    /// dropped; the in-memory table holds only the valid subset.
    pub fn initialize(&self) -> Result<LoadReport, PersistenceError> {
        let mut report = LoadReport::default();
        let mut loaded = BTreeMap::new();

        for key in self.backend.keys()? {
            let Ok(raw) = key.parse::<u64>() else {
                tracing::warn!(key = %key, "dropping snapshot with non-numeric key");
                report.dropped.push(key);
                continue;
            };
            let Some(bytes) = self.backend.load(&key)? else {
                continue;
            };
            match Snapshot::decode(&key, &bytes) {
                Ok(snapshot) => {
                    loaded.insert(PlayerId(raw), snapshot);
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "dropping corrupt snapshot");
                    report.dropped.push(key);
                }
            }
        }

        report.loaded = loaded.len();
        *self.table() = loaded;
        tracing::info!(
            loaded = report.loaded,
            dropped = report.dropped.len(),
            "snapshot store initialized"
        );
        Ok(report)
    }

    /// Flush every in-memory snapshot and delete stale records.
    pub fn shutdown(&self) -> Result<(), PersistenceError> {
        self.sync()?;
        tracing::info!(count = self.count(), "snapshot store shut down");
        Ok(())
    }

    pub fn sync(&self) -> Result<(), PersistenceError> {
        let table = self.table().clone();
        for (player, snapshot) in &table {
            self.save_record(*player, snapshot)?;
        }
        for key in self.backend.keys()? {
            let stale = key
                .parse::<u64>()
                .map_or(true, |raw| !table.contains_key(&PlayerId(raw)));
            if stale {
                self.backend.remove(&key)?;
            }
        }
        Ok(())
    }

    /// Mirror one player's current entry to the backend: write it when
    /// present, delete the record when absent.
    pub fn persist(&self, player: PlayerId) -> Result<SaveOutcome, PersistenceError> {
        match self.get(player) {
            Some(snapshot) => self.save_record(player, &snapshot),
            None => self.backend.remove(&player.to_string()),
        }
    }

    pub fn put(&self, player: PlayerId, snapshot: Snapshot) {
        self.table().insert(player, snapshot);
    }

    pub fn get(&self, player: PlayerId) -> Option<Snapshot> {
        self.table().get(&player).cloned()
    }

    pub fn remove(&self, player: PlayerId) -> Option<Snapshot> {
        self.table().remove(&player)
    }

    pub fn clear(&self) -> usize {
        let mut table = self.table();
        let n = table.len();
        table.clear();
        n
    }

    pub fn count(&self) -> usize {
        self.table().len()
    }

    pub fn is_active(&self, player: PlayerId) -> bool {
        self.table().get(&player).is_some_and(|s| s.is_active)
    }

    /// Atomic check-and-insert. `capture` runs under the table lock, so two
    /// concurrent callers for the same player cannot both capture.
    pub fn insert_if_inactive(
        &self,
        player: PlayerId,
        capture: impl FnOnce() -> Snapshot,
    ) -> InsertOutcome {
        match self.try_insert_if_inactive(player, || Ok::<_, Infallible>(capture())) {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        }
    }

    /// As [`Self::insert_if_inactive`], but a failed capture leaves the
    /// table untouched and hands the error back.
    pub fn try_insert_if_inactive<E>(
        &self,
        player: PlayerId,
        capture: impl FnOnce() -> Result<Snapshot, E>,
    ) -> Result<InsertOutcome, E> {
        let mut table = self.table();
        if table.get(&player).is_some_and(|s| s.is_active) {
            return Ok(InsertOutcome::AlreadyActive);
        }
        table.insert(player, capture()?);
        Ok(InsertOutcome::Inserted)
    }

    /// Atomic check-and-clear of the active flag. Returns the snapshot as it
    /// was stored, or `None` if the player was not active.
    pub fn deactivate(&self, player: PlayerId) -> Option<Snapshot> {
        let mut table = self.table();
        let entry = table.get_mut(&player).filter(|s| s.is_active)?;
        let before = entry.clone();
        entry.is_active = false;
        Some(before)
    }

    pub fn active_players(&self) -> Vec<PlayerId> {
        self.table()
            .iter()
            .filter(|(_, s)| s.is_active)
            .map(|(p, _)| *p)
            .collect()
    }

    fn save_record(
        &self,
        player: PlayerId,
        snapshot: &Snapshot,
    ) -> Result<SaveOutcome, PersistenceError> {
        let blob = snapshot.encode()?;
        self.backend.save(&player.to_string(), &blob)
    }

    // Entries are replaced whole, so a poisoned table is still consistent.
    fn table(&self) -> MutexGuard<'_, BTreeMap<PlayerId, Snapshot>> {
        self.snapshots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
