//! Wiring from [`ServerConfig`] to a running [`ArenaService`].

use arena::{ArenaService, ConfigLoadoutCatalog};
use persistence::{DirectoryBackend, MemoryBackend, PersistenceError, SnapshotBackend, SuppressionGuard};
use session::{LoadReport, SnapshotStore};

use crate::config::{PersistSection, ServerConfig};

/// Snapshot store over the configured backend. Backend and store share one
/// suppression guard.
pub fn build_store(config: &PersistSection) -> SnapshotStore {
    let guard = SuppressionGuard::new();
    let backend: Box<dyn SnapshotBackend> = if config.enabled {
        tracing::info!(dir = %config.save_dir, "arena snapshots persist to disk");
        Box::new(DirectoryBackend::new(&config.save_dir, guard.clone()))
    } else {
        tracing::warn!("snapshot persistence disabled, state is lost on restart");
        Box::new(MemoryBackend::new(guard.clone()))
    };
    SnapshotStore::new(backend, guard)
}

/// Build the service and load persisted snapshots. Corrupt records are
/// dropped and reported, not fatal.
pub fn build_service(config: &ServerConfig) -> Result<(ArenaService, LoadReport), PersistenceError> {
    let store = build_store(&config.persistence);
    let report = store.initialize()?;
    if config.arena.spawn_point.is_none() {
        tracing::warn!("arena spawn point not configured, entry is disabled");
    }
    let service = ArenaService::new(
        store,
        ConfigLoadoutCatalog::new(config.catalog.clone()),
        config.to_arena_settings(),
    );
    Ok((service, report))
}
