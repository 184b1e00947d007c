use ecs_adapter::{EcsError, EntityId};

use crate::world::{Attribute, PlayerId};

/// A single read or write rejected by the world model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    #[error(transparent)]
    Ecs(#[from] EcsError),

    #[error("{attribute} missing on {agent}")]
    Missing { agent: EntityId, attribute: Attribute },

    #[error("{attribute} rejected on {agent}: {reason}")]
    Rejected {
        agent: EntityId,
        attribute: Attribute,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("invalid agent {agent}: {reason}")]
    InvalidAgent {
        agent: EntityId,
        reason: &'static str,
    },

    #[error("player {0} is not in session")]
    AlreadyOutside(PlayerId),

    #[error("no snapshot stored for player {0}")]
    NoSnapshot(PlayerId),

    #[error("failed to read {attribute}: {source}")]
    AttributeReadFailed {
        attribute: Attribute,
        #[source]
        source: WorldError,
    },

    #[error("failed to write {attribute}: {source}")]
    AttributeWriteFailed {
        attribute: Attribute,
        #[source]
        source: WorldError,
    },

    #[error("loadout not found: {0}")]
    LoadoutNotFound(String),

    #[error("failed to reposition {agent}: {source}")]
    RepositionFailed {
        agent: EntityId,
        #[source]
        source: WorldError,
    },

    #[error("corrupt snapshot {key}: {reason}")]
    SnapshotCorrupt { key: String, reason: String },

    #[error("session spawn point is not configured")]
    SpawnNotConfigured,
}

impl SessionError {
    /// Reply text for the command surface.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::InvalidAgent { reason, .. } => {
                format!("Your character cannot do that right now ({reason}).")
            }
            SessionError::AlreadyOutside(_) => "You are not in the arena.".to_string(),
            SessionError::NoSnapshot(_) => "No saved state was found for you.".to_string(),
            SessionError::AttributeReadFailed { attribute, .. } => {
                format!("Could not read your {attribute}. Nothing was changed.")
            }
            SessionError::AttributeWriteFailed { attribute, .. } => {
                format!("Could not update your {attribute}.")
            }
            SessionError::LoadoutNotFound(name) => format!("Unknown loadout '{name}'."),
            SessionError::RepositionFailed { .. } => {
                "Teleport failed. Try again in a moment.".to_string()
            }
            SessionError::SnapshotCorrupt { .. } => "Your saved state is unreadable.".to_string(),
            SessionError::SpawnNotConfigured => "The arena spawn point is not set.".to_string(),
        }
    }

    pub(crate) fn read(attribute: Attribute) -> impl FnOnce(WorldError) -> SessionError {
        move |source| SessionError::AttributeReadFailed { attribute, source }
    }
}
