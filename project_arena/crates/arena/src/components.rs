use ecs_adapter::{Component, EntityId};
use serde::{Deserialize, Serialize};
use session::{AbilityId, Blood, BossId, InventorySlot, ItemId, PlayerId, Position, Progression};

/// Marks a player-controlled character and carries its platform id.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlayerCharacter {
    pub platform_id: PlayerId,
}

#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Translation(pub Position);

#[derive(Component, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharacterName(pub String);

#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct BloodState(pub Blood);

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Experience(pub Progression);

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Inventory {
    pub slots: Vec<InventorySlot>,
}

impl Inventory {
    pub fn with_capacity(slots: usize) -> Self {
        Self {
            slots: vec![InventorySlot::default(); slots],
        }
    }

    pub fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(|s| s.item_entity.is_none())
    }
}

/// Worn items, one entity per occupied equipment slot.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Equipment {
    pub items: Vec<EntityId>,
}

#[derive(Component, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbilityBar {
    pub slots: Vec<Option<AbilityId>>,
}

#[derive(Component, Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UnlockedBosses(pub Vec<BossId>);

/// Item instance; the prefab id it was spawned from.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ItemPrefab(pub ItemId);

#[derive(Component, Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dead;

#[derive(Component, Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Disabled;
