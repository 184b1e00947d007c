pub mod allocator;
pub mod bevy_backend;
pub mod error;
pub mod types;

pub use allocator::EntityAllocator;
pub use bevy_backend::EcsAdapter;
pub use error::EcsError;
pub use types::EntityId;

pub use bevy_ecs::bundle::Bundle;
pub use bevy_ecs::component::Component;
