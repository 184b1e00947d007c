use std::path::{Path, PathBuf};

use crate::backend::{SaveOutcome, SnapshotBackend};
use crate::error::PersistenceError;
use crate::suppression::SuppressionGuard;

const EXTENSION: &str = "json";

/// One file per record under `dir`, named `<key>.json`.
pub struct DirectoryBackend {
    dir: PathBuf,
    guard: SuppressionGuard,
}

impl DirectoryBackend {
    pub fn new(dir: impl Into<PathBuf>, guard: SuppressionGuard) -> Self {
        Self {
            dir: dir.into(),
            guard,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.{EXTENSION}")))
    }
}

impl SnapshotBackend for DirectoryBackend {
    fn save(&self, key: &str, blob: &[u8]) -> Result<SaveOutcome, PersistenceError> {
        let path = self.path_for(key)?;
        if self.guard.is_suppressed() {
            tracing::debug!(key, "save suppressed");
            return Ok(SaveOutcome::Suppressed);
        }
        std::fs::create_dir_all(&self.dir)?;

        // Write to temp file first, then rename for atomicity
        let tmp_path = path.with_extension(format!("{EXTENSION}.tmp"));
        std::fs::write(&tmp_path, blob)?;
        std::fs::rename(&tmp_path, &path)?;

        tracing::debug!(key, bytes = blob.len(), path = %path.display(), "record saved");
        Ok(SaveOutcome::Written)
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, key: &str) -> Result<SaveOutcome, PersistenceError> {
        let path = self.path_for(key)?;
        if self.guard.is_suppressed() {
            tracing::debug!(key, "remove suppressed");
            return Ok(SaveOutcome::Suppressed);
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(key, path = %path.display(), "record removed");
                Ok(SaveOutcome::Written)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SaveOutcome::Written),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
