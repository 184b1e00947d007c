pub mod backend;
pub mod directory;
pub mod error;
pub mod suppression;

pub use backend::{MemoryBackend, SaveOutcome, SnapshotBackend};
pub use directory::DirectoryBackend;
pub use error::PersistenceError;
pub use suppression::{SuppressionGuard, SuppressionScope};
