//! World Access Facade: one typed accessor per attribute the session layer
//! touches. Accessors return `Ok(None)` when the agent simply does not carry
//! that attribute and `Err` when the world rejected the operation.

use std::fmt;

use ecs_adapter::EntityId;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

pub type WorldResult<T> = Result<T, WorldError>;

/// Persistent player identifier (platform id), stable across reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Item prefab identifier. Zero means "no item".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i32);

impl ItemId {
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityId(pub i32);

impl AbilityId {
    /// Id 0 marks an empty ability slot.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BloodTypeId(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BossId(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Position {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vitals {
    pub current: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blood {
    pub blood_type: BloodTypeId,
    pub quality: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progression {
    pub experience: f32,
    pub level: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            experience: 0.0,
            level: 1,
        }
    }
}

/// One inventory slot as the world reports it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InventorySlot {
    pub item_entity: Option<EntityId>,
    pub item: ItemId,
    pub amount: u32,
}

impl InventorySlot {
    pub fn holding(item_entity: EntityId, item: ItemId, amount: u32) -> Self {
        Self {
            item_entity: Some(item_entity),
            item,
            amount,
        }
    }

    /// A slot counts only with a live item reference, a positive amount and
    /// a real item id.
    pub fn is_occupied(&self) -> bool {
        self.item_entity.is_some() && self.amount > 0 && !self.item.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Position,
    Name,
    Health,
    Blood,
    Progression,
    Inventory,
    Equipment,
    Item,
    Abilities,
    Bosses,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Attribute::Position => "position",
            Attribute::Name => "name",
            Attribute::Health => "health",
            Attribute::Blood => "blood",
            Attribute::Progression => "progression",
            Attribute::Inventory => "inventory",
            Attribute::Equipment => "equipment",
            Attribute::Item => "item",
            Attribute::Abilities => "abilities",
            Attribute::Bosses => "boss unlocks",
        };
        f.write_str(name)
    }
}

/// Query/mutate interface over the host's live object graph.
pub trait WorldAccess {
    fn exists(&self, agent: EntityId) -> bool;

    /// Carries the player-character marker.
    fn is_character(&self, agent: EntityId) -> bool;

    fn has_position(&self, agent: EntityId) -> bool;

    /// Dead or disabled.
    fn is_incapacitated(&self, agent: EntityId) -> bool;

    fn position(&self, agent: EntityId) -> WorldResult<Option<Position>>;

    fn set_position(&mut self, agent: EntityId, position: Position) -> WorldResult<()>;

    fn name(&self, agent: EntityId) -> WorldResult<Option<String>>;

    fn set_name(&mut self, agent: EntityId, name: &str) -> WorldResult<()>;

    fn vitals(&self, agent: EntityId) -> WorldResult<Option<Vitals>>;

    /// Set current health, keeping the maximum.
    fn set_health(&mut self, agent: EntityId, health: f32) -> WorldResult<()>;

    fn blood(&self, agent: EntityId) -> WorldResult<Option<Blood>>;

    fn set_blood(&mut self, agent: EntityId, blood: Blood) -> WorldResult<()>;

    fn progression(&self, agent: EntityId) -> WorldResult<Option<Progression>>;

    fn set_progression(&mut self, agent: EntityId, progression: Progression) -> WorldResult<()>;

    /// Full slot list, empty slots included.
    fn inventory(&self, agent: EntityId) -> WorldResult<Option<Vec<InventorySlot>>>;

    fn clear_slot(&mut self, agent: EntityId, slot: usize) -> WorldResult<()>;

    /// Every entity currently occupying an equipment slot.
    fn equipped(&self, agent: EntityId) -> WorldResult<Vec<EntityId>>;

    /// Prefab id of an item entity.
    fn item_id(&self, item: EntityId) -> WorldResult<Option<ItemId>>;

    /// Move an item the agent holds into its equipment slot.
    fn equip(&mut self, agent: EntityId, item: EntityId) -> WorldResult<()>;

    fn destroy(&mut self, entity: EntityId) -> WorldResult<()>;

    /// Create an item and place it in the agent's inventory. `Ok(None)` when
    /// the world accepted the call but produced no item (e.g. inventory full).
    fn spawn_and_grant_item(
        &mut self,
        agent: EntityId,
        item: ItemId,
        amount: u32,
    ) -> WorldResult<Option<EntityId>>;

    /// Ability bar in slot order; `None` entries are empty slots.
    fn abilities(&self, agent: EntityId) -> WorldResult<Option<Vec<Option<AbilityId>>>>;

    fn set_abilities(&mut self, agent: EntityId, slots: &[Option<AbilityId>]) -> WorldResult<()>;

    fn unlocked_bosses(&self, agent: EntityId) -> WorldResult<Option<Vec<BossId>>>;

    fn set_unlocked_bosses(&mut self, agent: EntityId, bosses: &[BossId]) -> WorldResult<()>;
}
