//! [`WorldAccess`] over a bevy-backed [`EcsAdapter`].
//!
//! A missing component reads as `Ok(None)` and fails a write with
//! `WorldError::Missing`. A dead handle fails both with `WorldError::Ecs`.

use ecs_adapter::{Component, EcsAdapter, EcsError, EntityId};
use session::{
    AbilityId, Attribute, Blood, BloodTypeId, BossId, InventorySlot, ItemId, PlayerId, Position,
    Progression, Vitals, WorldAccess, WorldError, WorldResult,
};

use crate::components::*;

pub const INVENTORY_SLOTS: usize = 36;
pub const ABILITY_SLOTS: usize = 8;

pub struct CharacterWorld {
    ecs: EcsAdapter,
}

impl CharacterWorld {
    pub fn new() -> Self {
        Self {
            ecs: EcsAdapter::new(),
        }
    }

    pub fn ecs(&self) -> &EcsAdapter {
        &self.ecs
    }

    pub fn ecs_mut(&mut self) -> &mut EcsAdapter {
        &mut self.ecs
    }

    /// Spawn a fresh player character with default stats at `position`.
    pub fn spawn_character(&mut self, player: PlayerId, name: &str, position: Position) -> EntityId {
        let agent = self.ecs.spawn((
            PlayerCharacter {
                platform_id: player,
            },
            CharacterName(name.to_string()),
            Translation(position),
            Health {
                current: 100.0,
                max: 100.0,
            },
            BloodState(Blood {
                blood_type: BloodTypeId(0),
                quality: 0.0,
            }),
            Experience(Progression::default()),
            Inventory::with_capacity(INVENTORY_SLOTS),
            Equipment::default(),
            AbilityBar {
                slots: vec![None; ABILITY_SLOTS],
            },
            UnlockedBosses::default(),
        ));
        tracing::debug!(agent = %agent, player = %player, name, "spawned character");
        agent
    }

    pub fn find_character(&self, player: PlayerId) -> Option<EntityId> {
        self.ecs
            .find::<PlayerCharacter>(|c| c.platform_id == player)
    }

    pub fn mark_dead(&mut self, agent: EntityId) -> Result<(), EcsError> {
        self.ecs.insert(agent, Dead)
    }

    fn read<C: Component, T>(&self, agent: EntityId, f: impl FnOnce(&C) -> T) -> WorldResult<Option<T>> {
        match self.ecs.get::<C>(agent) {
            Ok(c) => Ok(Some(f(c))),
            Err(EcsError::ComponentNotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write<C: Component, R>(
        &mut self,
        agent: EntityId,
        attribute: Attribute,
        f: impl FnOnce(&mut C) -> R,
    ) -> WorldResult<R> {
        match self.ecs.update::<C, R>(agent, f) {
            Ok(r) => Ok(r),
            Err(EcsError::ComponentNotFound { .. }) => Err(WorldError::Missing { agent, attribute }),
            Err(e) => Err(e.into()),
        }
    }

    fn alive(&self, entity: EntityId) -> WorldResult<()> {
        if self.ecs.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::EntityNotFound(entity).into())
        }
    }
}

impl Default for CharacterWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldAccess for CharacterWorld {
    fn exists(&self, agent: EntityId) -> bool {
        self.ecs.is_alive(agent)
    }

    fn is_character(&self, agent: EntityId) -> bool {
        self.ecs.has::<PlayerCharacter>(agent)
    }

    fn has_position(&self, agent: EntityId) -> bool {
        self.ecs.has::<Translation>(agent)
    }

    fn is_incapacitated(&self, agent: EntityId) -> bool {
        self.ecs.has::<Dead>(agent) || self.ecs.has::<Disabled>(agent)
    }

    fn position(&self, agent: EntityId) -> WorldResult<Option<Position>> {
        self.read::<Translation, _>(agent, |t| t.0)
    }

    fn set_position(&mut self, agent: EntityId, position: Position) -> WorldResult<()> {
        self.write::<Translation, _>(agent, Attribute::Position, |t| t.0 = position)
    }

    fn name(&self, agent: EntityId) -> WorldResult<Option<String>> {
        self.read::<CharacterName, _>(agent, |n| n.0.clone())
    }

    fn set_name(&mut self, agent: EntityId, name: &str) -> WorldResult<()> {
        if name.is_empty() {
            return Err(WorldError::Rejected {
                agent,
                attribute: Attribute::Name,
                reason: "empty name".to_string(),
            });
        }
        self.ecs.insert(agent, CharacterName(name.to_string()))?;
        Ok(())
    }

    fn vitals(&self, agent: EntityId) -> WorldResult<Option<Vitals>> {
        self.read::<Health, _>(agent, |h| Vitals {
            current: h.current,
            max: h.max,
        })
    }

    fn set_health(&mut self, agent: EntityId, health: f32) -> WorldResult<()> {
        self.write::<Health, _>(agent, Attribute::Health, |h| {
            h.current = health.clamp(0.0, h.max)
        })
    }

    fn blood(&self, agent: EntityId) -> WorldResult<Option<Blood>> {
        self.read::<BloodState, _>(agent, |b| b.0)
    }

    fn set_blood(&mut self, agent: EntityId, blood: Blood) -> WorldResult<()> {
        self.write::<BloodState, _>(agent, Attribute::Blood, |b| b.0 = blood)
    }

    fn progression(&self, agent: EntityId) -> WorldResult<Option<Progression>> {
        self.read::<Experience, _>(agent, |e| e.0)
    }

    fn set_progression(&mut self, agent: EntityId, progression: Progression) -> WorldResult<()> {
        self.write::<Experience, _>(agent, Attribute::Progression, |e| e.0 = progression)
    }

    fn inventory(&self, agent: EntityId) -> WorldResult<Option<Vec<InventorySlot>>> {
        self.read::<Inventory, _>(agent, |inv| inv.slots.clone())
    }

    fn clear_slot(&mut self, agent: EntityId, slot: usize) -> WorldResult<()> {
        let cleared = self.write::<Inventory, _>(agent, Attribute::Inventory, |inv| {
            inv.slots
                .get_mut(slot)
                .map(|s| *s = InventorySlot::default())
                .is_some()
        })?;
        if !cleared {
            return Err(WorldError::Rejected {
                agent,
                attribute: Attribute::Inventory,
                reason: format!("no slot {slot}"),
            });
        }
        Ok(())
    }

    fn equipped(&self, agent: EntityId) -> WorldResult<Vec<EntityId>> {
        self.alive(agent)?;
        Ok(self
            .read::<Equipment, _>(agent, |e| e.items.clone())?
            .unwrap_or_default())
    }

    fn item_id(&self, item: EntityId) -> WorldResult<Option<ItemId>> {
        self.read::<ItemPrefab, _>(item, |p| p.0)
    }

    fn equip(&mut self, agent: EntityId, item: EntityId) -> WorldResult<()> {
        let slot = self
            .read::<Inventory, _>(agent, |inv| {
                inv.slots.iter().position(|s| s.item_entity == Some(item))
            })?
            .flatten()
            .ok_or_else(|| WorldError::Rejected {
                agent,
                attribute: Attribute::Equipment,
                reason: format!("{item} is not carried"),
            })?;
        if !self.ecs.has::<Equipment>(agent) {
            return Err(WorldError::Missing {
                agent,
                attribute: Attribute::Equipment,
            });
        }
        self.clear_slot(agent, slot)?;
        self.write::<Equipment, _>(agent, Attribute::Equipment, |e| e.items.push(item))
    }

    fn destroy(&mut self, entity: EntityId) -> WorldResult<()> {
        if self.ecs.has::<PlayerCharacter>(entity) {
            return Err(WorldError::Rejected {
                agent: entity,
                attribute: Attribute::Item,
                reason: "refusing to destroy a player character".to_string(),
            });
        }
        for owner in self.ecs.entities_with::<Equipment>() {
            self.ecs
                .update::<Equipment, _>(owner, |e| e.items.retain(|i| *i != entity))?;
        }
        self.ecs.despawn(entity)?;
        Ok(())
    }

    fn spawn_and_grant_item(
        &mut self,
        agent: EntityId,
        item: ItemId,
        amount: u32,
    ) -> WorldResult<Option<EntityId>> {
        let free = self
            .read::<Inventory, _>(agent, Inventory::first_free)?
            .ok_or(WorldError::Missing {
                agent,
                attribute: Attribute::Inventory,
            })?;
        let Some(free) = free else {
            return Ok(None);
        };
        let entity = self.ecs.spawn(ItemPrefab(item));
        self.write::<Inventory, _>(agent, Attribute::Inventory, |inv| {
            inv.slots[free] = InventorySlot::holding(entity, item, amount);
        })?;
        Ok(Some(entity))
    }

    fn abilities(&self, agent: EntityId) -> WorldResult<Option<Vec<Option<AbilityId>>>> {
        self.read::<AbilityBar, _>(agent, |bar| bar.slots.clone())
    }

    fn set_abilities(&mut self, agent: EntityId, slots: &[Option<AbilityId>]) -> WorldResult<()> {
        self.write::<AbilityBar, _>(agent, Attribute::Abilities, |bar| {
            bar.slots = slots.to_vec()
        })
    }

    fn unlocked_bosses(&self, agent: EntityId) -> WorldResult<Option<Vec<BossId>>> {
        self.read::<UnlockedBosses, _>(agent, |b| b.0.clone())
    }

    fn set_unlocked_bosses(&mut self, agent: EntityId, bosses: &[BossId]) -> WorldResult<()> {
        self.write::<UnlockedBosses, _>(agent, Attribute::Bosses, |b| b.0 = bosses.to_vec())
    }
}
