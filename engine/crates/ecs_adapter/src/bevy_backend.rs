use std::collections::HashMap;

use bevy_ecs::prelude::*;

use crate::allocator::EntityAllocator;
use crate::error::EcsError;
use crate::types::EntityId;

/// Hides bevy_ecs behind generation-checked `EntityId`s. Every accessor
/// fails with `EcsError` instead of panicking on a dead handle.
pub struct EcsAdapter {
    world: World,
    handles: HashMap<EntityId, Entity>,
    allocator: EntityAllocator,
}

impl EcsAdapter {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            handles: HashMap::new(),
            allocator: EntityAllocator::new(),
        }
    }

    /// Spawn an entity carrying `bundle`.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> EntityId {
        let eid = self.allocator.allocate();
        let entity = self.world.spawn(bundle).id();
        self.handles.insert(eid, entity);
        eid
    }

    pub fn spawn_empty(&mut self) -> EntityId {
        let eid = self.allocator.allocate();
        let entity = self.world.spawn_empty().id();
        self.handles.insert(eid, entity);
        eid
    }

    pub fn despawn(&mut self, eid: EntityId) -> Result<(), EcsError> {
        let entity = self.bevy(eid)?;
        self.handles.remove(&eid);
        self.allocator.release(eid);
        self.world.despawn(entity);
        tracing::trace!(entity = %eid, "despawned");
        Ok(())
    }

    pub fn is_alive(&self, eid: EntityId) -> bool {
        self.allocator.is_alive(eid) && self.handles.contains_key(&eid)
    }

    pub fn get<C: Component>(&self, eid: EntityId) -> Result<&C, EcsError> {
        let entity = self.bevy(eid)?;
        self.world
            .entity(entity)
            .get::<C>()
            .ok_or_else(|| missing::<C>(eid))
    }

    /// Mutate a component in place.
    pub fn update<C: Component, R>(
        &mut self,
        eid: EntityId,
        f: impl FnOnce(&mut C) -> R,
    ) -> Result<R, EcsError> {
        let entity = self.bevy(eid)?;
        let mut component = self
            .world
            .get_mut::<C>(entity)
            .ok_or_else(|| missing::<C>(eid))?;
        Ok(f(&mut *component))
    }

    /// Insert or overwrite a component.
    pub fn insert<C: Component>(&mut self, eid: EntityId, component: C) -> Result<(), EcsError> {
        let entity = self.bevy(eid)?;
        self.world.entity_mut(entity).insert(component);
        Ok(())
    }

    /// Remove a component, returning it if it was present.
    pub fn remove<C: Component>(&mut self, eid: EntityId) -> Result<Option<C>, EcsError> {
        let entity = self.bevy(eid)?;
        Ok(self.world.entity_mut(entity).take::<C>())
    }

    pub fn has<C: Component>(&self, eid: EntityId) -> bool {
        self.handles
            .get(&eid)
            .is_some_and(|&entity| self.world.entity(entity).contains::<C>())
    }

    /// Alive entities carrying `C`, sorted for determinism.
    pub fn entities_with<C: Component>(&self) -> Vec<EntityId> {
        let mut found: Vec<EntityId> = self
            .handles
            .iter()
            .filter(|(_, entity)| self.world.entity(**entity).contains::<C>())
            .map(|(eid, _)| *eid)
            .collect();
        found.sort();
        found
    }

    /// First entity (in id order) whose `C` satisfies `pred`.
    pub fn find<C: Component>(&self, pred: impl Fn(&C) -> bool) -> Option<EntityId> {
        self.entities_with::<C>()
            .into_iter()
            .find(|&eid| self.get::<C>(eid).is_ok_and(&pred))
    }

    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    fn bevy(&self, eid: EntityId) -> Result<Entity, EcsError> {
        if !self.allocator.is_alive(eid) {
            return Err(EcsError::EntityNotFound(eid));
        }
        self.handles
            .get(&eid)
            .copied()
            .ok_or(EcsError::EntityNotFound(eid))
    }
}

impl Default for EcsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn missing<C>(entity: EntityId) -> EcsError {
    EcsError::ComponentNotFound {
        entity,
        component: std::any::type_name::<C>(),
    }
}
