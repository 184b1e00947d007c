//! In-memory world with per-attribute fault injection, for unit tests.

use std::collections::{HashMap, HashSet};

use ecs_adapter::{EcsError, EntityId};
use persistence::SuppressionGuard;

use crate::error::WorldError;
use crate::snapshot::ItemStack;
use crate::world::{
    AbilityId, Attribute, Blood, BloodTypeId, BossId, InventorySlot, ItemId, Position, Progression,
    Vitals, WorldAccess, WorldResult,
};

#[derive(Debug, Clone)]
struct Character {
    marker: bool,
    incapacitated: bool,
    name: Option<String>,
    position: Option<Position>,
    vitals: Option<Vitals>,
    blood: Option<Blood>,
    progression: Option<Progression>,
    slots: Vec<InventorySlot>,
    equipped: Vec<EntityId>,
    abilities: Option<Vec<Option<AbilityId>>>,
    bosses: Option<Vec<BossId>>,
}

#[derive(Default)]
pub struct MockWorld {
    next_index: u32,
    characters: HashMap<EntityId, Character>,
    items: HashMap<EntityId, ItemId>,
    failing_reads: HashSet<Attribute>,
    failing_writes: HashSet<Attribute>,
    observed: Option<SuppressionGuard>,
    writes: usize,
    unsuppressed: usize,
}

impl MockWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> EntityId {
        let id = EntityId::new(self.next_index, 0);
        self.next_index += 1;
        id
    }

    pub fn spawn_character(&mut self, name: &str) -> EntityId {
        let id = self.alloc();
        self.characters.insert(
            id,
            Character {
                marker: true,
                incapacitated: false,
                name: Some(name.to_string()),
                position: Some(Position::default()),
                vitals: Some(Vitals {
                    current: 100.0,
                    max: 100.0,
                }),
                blood: Some(Blood {
                    blood_type: BloodTypeId(1),
                    quality: 10.0,
                }),
                progression: Some(Progression::default()),
                slots: vec![InventorySlot::default(); 8],
                equipped: Vec::new(),
                abilities: Some(vec![None; 4]),
                bosses: Some(Vec::new()),
            },
        );
        id
    }

    pub fn spawn_npc(&mut self, name: &str) -> EntityId {
        let id = self.spawn_character(name);
        self.character_mut(id).marker = false;
        id
    }

    pub fn kill(&mut self, agent: EntityId) {
        self.character_mut(agent).incapacitated = true;
    }

    pub fn despawn(&mut self, agent: EntityId) {
        self.characters.remove(&agent);
    }

    pub fn remove_position(&mut self, agent: EntityId) {
        self.character_mut(agent).position = None;
    }

    pub fn remove_progression(&mut self, agent: EntityId) {
        self.character_mut(agent).progression = None;
    }

    pub fn set_position_raw(&mut self, agent: EntityId, position: Position) {
        self.character_mut(agent).position = Some(position);
    }

    pub fn set_vitals_raw(&mut self, agent: EntityId, current: f32, max: f32) {
        self.character_mut(agent).vitals = Some(Vitals { current, max });
    }

    pub fn set_blood_raw(&mut self, agent: EntityId, blood_type: BloodTypeId, quality: f32) {
        self.character_mut(agent).blood = Some(Blood {
            blood_type,
            quality,
        });
    }

    pub fn set_ability_bar(&mut self, agent: EntityId, bar: Vec<Option<AbilityId>>) {
        self.character_mut(agent).abilities = Some(bar);
    }

    pub fn set_bosses_raw(&mut self, agent: EntityId, bosses: Vec<BossId>) {
        self.character_mut(agent).bosses = Some(bosses);
    }

    pub fn set_inventory_size(&mut self, agent: EntityId, size: usize) {
        self.character_mut(agent)
            .slots
            .resize(size, InventorySlot::default());
    }

    /// Put a fresh item entity straight into `slot`.
    pub fn give(&mut self, agent: EntityId, slot: usize, item: ItemId, amount: u32) -> EntityId {
        let entity = self.alloc();
        self.items.insert(entity, item);
        let slots = &mut self.character_mut(agent).slots;
        if slots.len() <= slot {
            slots.resize(slot + 1, InventorySlot::default());
        }
        slots[slot] = InventorySlot::holding(entity, item, amount);
        entity
    }

    pub fn equip_new(&mut self, agent: EntityId, item: ItemId) -> EntityId {
        let entity = self.alloc();
        self.items.insert(entity, item);
        self.character_mut(agent).equipped.push(entity);
        entity
    }

    pub fn fail_reads(&mut self, attribute: Attribute) {
        self.failing_reads.insert(attribute);
    }

    pub fn fail_writes(&mut self, attribute: Attribute) {
        self.failing_writes.insert(attribute);
    }

    pub fn clear_faults(&mut self) {
        self.failing_reads.clear();
        self.failing_writes.clear();
    }

    /// Occupied slots in slot order.
    pub fn inventory_stacks(&self, agent: EntityId) -> Vec<ItemStack> {
        self.characters[&agent]
            .slots
            .iter()
            .filter(|s| s.is_occupied())
            .map(|s| ItemStack::new(s.item, s.amount))
            .collect()
    }

    pub fn equipped_ids(&self, agent: EntityId) -> Vec<ItemId> {
        self.characters[&agent]
            .equipped
            .iter()
            .filter_map(|e| self.items.get(e).copied())
            .collect()
    }

    pub fn live_items(&self) -> usize {
        self.items.len()
    }

    /// Count writes made while `guard` is not suppressing.
    pub fn observe_suppression(&mut self, guard: SuppressionGuard) {
        self.observed = Some(guard);
    }

    pub fn writes_seen(&self) -> usize {
        self.writes
    }

    pub fn unsuppressed_writes(&self) -> usize {
        self.unsuppressed
    }

    fn character_mut(&mut self, agent: EntityId) -> &mut Character {
        self.characters
            .get_mut(&agent)
            .unwrap_or_else(|| panic!("no mock character {agent}"))
    }

    fn read<T>(
        &self,
        agent: EntityId,
        attribute: Attribute,
        f: impl FnOnce(&Character) -> Option<T>,
    ) -> WorldResult<Option<T>> {
        if self.failing_reads.contains(&attribute) {
            return Err(injected(agent, attribute));
        }
        let c = self
            .characters
            .get(&agent)
            .ok_or(WorldError::Ecs(EcsError::EntityNotFound(agent)))?;
        Ok(f(c))
    }

    fn note_write(&mut self) {
        self.writes += 1;
        if let Some(guard) = &self.observed {
            if !guard.is_suppressed() {
                self.unsuppressed += 1;
            }
        }
    }

    fn write(
        &mut self,
        agent: EntityId,
        attribute: Attribute,
        f: impl FnOnce(&mut Character) -> WorldResult<()>,
    ) -> WorldResult<()> {
        self.note_write();
        if self.failing_writes.contains(&attribute) {
            return Err(injected(agent, attribute));
        }
        let c = self
            .characters
            .get_mut(&agent)
            .ok_or(WorldError::Ecs(EcsError::EntityNotFound(agent)))?;
        f(c)
    }
}

fn injected(agent: EntityId, attribute: Attribute) -> WorldError {
    WorldError::Rejected {
        agent,
        attribute,
        reason: "injected fault".to_string(),
    }
}

fn missing(agent: EntityId, attribute: Attribute) -> WorldError {
    WorldError::Missing { agent, attribute }
}

impl WorldAccess for MockWorld {
    fn exists(&self, agent: EntityId) -> bool {
        self.characters.contains_key(&agent)
    }

    fn is_character(&self, agent: EntityId) -> bool {
        self.characters.get(&agent).is_some_and(|c| c.marker)
    }

    fn has_position(&self, agent: EntityId) -> bool {
        self.characters
            .get(&agent)
            .is_some_and(|c| c.position.is_some())
    }

    fn is_incapacitated(&self, agent: EntityId) -> bool {
        self.characters.get(&agent).is_some_and(|c| c.incapacitated)
    }

    fn position(&self, agent: EntityId) -> WorldResult<Option<Position>> {
        self.read(agent, Attribute::Position, |c| c.position)
    }

    fn set_position(&mut self, agent: EntityId, position: Position) -> WorldResult<()> {
        self.write(agent, Attribute::Position, |c| {
            let p = c.position.as_mut().ok_or(missing(agent, Attribute::Position))?;
            *p = position;
            Ok(())
        })
    }

    fn name(&self, agent: EntityId) -> WorldResult<Option<String>> {
        self.read(agent, Attribute::Name, |c| c.name.clone())
    }

    fn set_name(&mut self, agent: EntityId, name: &str) -> WorldResult<()> {
        self.write(agent, Attribute::Name, |c| {
            c.name = Some(name.to_string());
            Ok(())
        })
    }

    fn vitals(&self, agent: EntityId) -> WorldResult<Option<Vitals>> {
        self.read(agent, Attribute::Health, |c| c.vitals)
    }

    fn set_health(&mut self, agent: EntityId, health: f32) -> WorldResult<()> {
        self.write(agent, Attribute::Health, |c| {
            let v = c.vitals.as_mut().ok_or(missing(agent, Attribute::Health))?;
            v.current = health.min(v.max);
            Ok(())
        })
    }

    fn blood(&self, agent: EntityId) -> WorldResult<Option<Blood>> {
        self.read(agent, Attribute::Blood, |c| c.blood)
    }

    fn set_blood(&mut self, agent: EntityId, blood: Blood) -> WorldResult<()> {
        self.write(agent, Attribute::Blood, |c| {
            c.blood = Some(blood);
            Ok(())
        })
    }

    fn progression(&self, agent: EntityId) -> WorldResult<Option<Progression>> {
        self.read(agent, Attribute::Progression, |c| c.progression)
    }

    fn set_progression(&mut self, agent: EntityId, progression: Progression) -> WorldResult<()> {
        self.write(agent, Attribute::Progression, |c| {
            let p = c
                .progression
                .as_mut()
                .ok_or(missing(agent, Attribute::Progression))?;
            *p = progression;
            Ok(())
        })
    }

    fn inventory(&self, agent: EntityId) -> WorldResult<Option<Vec<InventorySlot>>> {
        self.read(agent, Attribute::Inventory, |c| Some(c.slots.clone()))
    }

    fn clear_slot(&mut self, agent: EntityId, slot: usize) -> WorldResult<()> {
        self.write(agent, Attribute::Inventory, |c| {
            let s = c.slots.get_mut(slot).ok_or(WorldError::Rejected {
                agent,
                attribute: Attribute::Inventory,
                reason: format!("no slot {slot}"),
            })?;
            *s = InventorySlot::default();
            Ok(())
        })
    }

    fn equipped(&self, agent: EntityId) -> WorldResult<Vec<EntityId>> {
        self.read(agent, Attribute::Equipment, |c| Some(c.equipped.clone()))
            .map(Option::unwrap_or_default)
    }

    fn item_id(&self, item: EntityId) -> WorldResult<Option<ItemId>> {
        if self.failing_reads.contains(&Attribute::Item) {
            return Err(injected(item, Attribute::Item));
        }
        Ok(self.items.get(&item).copied())
    }

    fn equip(&mut self, agent: EntityId, item: EntityId) -> WorldResult<()> {
        self.write(agent, Attribute::Equipment, |c| {
            let slot = c
                .slots
                .iter_mut()
                .find(|s| s.item_entity == Some(item))
                .ok_or(WorldError::Rejected {
                    agent,
                    attribute: Attribute::Equipment,
                    reason: "item not carried".to_string(),
                })?;
            *slot = InventorySlot::default();
            c.equipped.push(item);
            Ok(())
        })
    }

    fn destroy(&mut self, entity: EntityId) -> WorldResult<()> {
        self.note_write();
        if self.failing_writes.contains(&Attribute::Item) {
            return Err(injected(entity, Attribute::Item));
        }
        self.items
            .remove(&entity)
            .ok_or(WorldError::Ecs(EcsError::EntityNotFound(entity)))?;
        for c in self.characters.values_mut() {
            c.equipped.retain(|e| *e != entity);
        }
        Ok(())
    }

    fn spawn_and_grant_item(
        &mut self,
        agent: EntityId,
        item: ItemId,
        amount: u32,
    ) -> WorldResult<Option<EntityId>> {
        self.note_write();
        if self.failing_writes.contains(&Attribute::Inventory) {
            return Err(injected(agent, Attribute::Inventory));
        }
        let free = self
            .characters
            .get(&agent)
            .ok_or(WorldError::Ecs(EcsError::EntityNotFound(agent)))?
            .slots
            .iter()
            .position(|s| s.item_entity.is_none());
        let Some(free) = free else {
            return Ok(None);
        };
        let entity = self.alloc();
        self.items.insert(entity, item);
        self.character_mut(agent).slots[free] = InventorySlot::holding(entity, item, amount);
        Ok(Some(entity))
    }

    fn abilities(&self, agent: EntityId) -> WorldResult<Option<Vec<Option<AbilityId>>>> {
        self.read(agent, Attribute::Abilities, |c| c.abilities.clone())
    }

    fn set_abilities(&mut self, agent: EntityId, slots: &[Option<AbilityId>]) -> WorldResult<()> {
        self.write(agent, Attribute::Abilities, |c| {
            c.abilities = Some(slots.to_vec());
            Ok(())
        })
    }

    fn unlocked_bosses(&self, agent: EntityId) -> WorldResult<Option<Vec<BossId>>> {
        self.read(agent, Attribute::Bosses, |c| c.bosses.clone())
    }

    fn set_unlocked_bosses(&mut self, agent: EntityId, bosses: &[BossId]) -> WorldResult<()> {
        self.write(agent, Attribute::Bosses, |c| {
            let b = c.bosses.as_mut().ok_or(missing(agent, Attribute::Bosses))?;
            *b = bosses.to_vec();
            Ok(())
        })
    }
}
