use crate::types::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("component {component} not found on entity {entity}")]
    ComponentNotFound {
        entity: EntityId,
        component: &'static str,
    },
}
