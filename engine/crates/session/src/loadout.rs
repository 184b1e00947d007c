//! Loadout Catalog: named bundles of items and abilities for session play.

use std::collections::BTreeMap;

use ecs_adapter::EntityId;

use crate::error::SessionError;
use crate::snapshot::ItemStack;
use crate::world::{AbilityId, BossId, ItemId, WorldAccess};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Loadout {
    pub name: String,
    pub weapons: Vec<ItemId>,
    /// Granted then equipped.
    pub armor_pieces: Vec<ItemId>,
    pub consumables: Vec<ItemStack>,
    /// Replaces the ability bar for the session. Empty keeps the bar cleared.
    pub abilities: Vec<AbilityId>,
}

pub trait LoadoutCatalog {
    /// Absent names are `LoadoutNotFound`.
    fn resolve(&self, name: &str) -> Result<Loadout, SessionError>;

    /// Bosses to unlock while in session, when that option is enabled.
    fn boss_roster(&self) -> Vec<BossId> {
        Vec::new()
    }
}

/// Fixed in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    loadouts: BTreeMap<String, Loadout>,
    bosses: Vec<BossId>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loadout(mut self, loadout: Loadout) -> Self {
        self.loadouts.insert(loadout.name.clone(), loadout);
        self
    }

    pub fn with_bosses(mut self, bosses: Vec<BossId>) -> Self {
        self.bosses = bosses;
        self
    }
}

impl LoadoutCatalog for StaticCatalog {
    fn resolve(&self, name: &str) -> Result<Loadout, SessionError> {
        self.loadouts
            .get(name)
            .cloned()
            .ok_or_else(|| SessionError::LoadoutNotFound(name.to_string()))
    }

    fn boss_roster(&self) -> Vec<BossId> {
        self.bosses.clone()
    }
}

/// Grant a loadout to an agent whose inventory was just cleared. Returns the
/// number of grants or equips that failed.
pub fn apply_loadout(world: &mut dyn WorldAccess, agent: EntityId, loadout: &Loadout) -> usize {
    let mut failures = 0;

    for &weapon in &loadout.weapons {
        if grant(world, agent, weapon, 1).is_none() {
            failures += 1;
        }
    }
    for &piece in &loadout.armor_pieces {
        let Some(item) = grant(world, agent, piece, 1) else {
            failures += 1;
            continue;
        };
        if let Err(e) = world.equip(agent, item) {
            tracing::warn!(agent = %agent, item = %item, error = %e, "could not equip loadout armor");
            failures += 1;
        }
    }
    for stack in &loadout.consumables {
        if grant(world, agent, stack.item, stack.amount).is_none() {
            failures += 1;
        }
    }

    if !loadout.abilities.is_empty() {
        let len = match world.abilities(agent) {
            Ok(Some(bar)) => bar.len().max(loadout.abilities.len()),
            _ => loadout.abilities.len(),
        };
        let bar: Vec<_> = (0..len).map(|i| loadout.abilities.get(i).copied()).collect();
        if let Err(e) = world.set_abilities(agent, &bar) {
            tracing::warn!(agent = %agent, error = %e, "could not set loadout abilities");
            failures += 1;
        }
    }

    tracing::debug!(agent = %agent, loadout = %loadout.name, failures, "loadout applied");
    failures
}

fn grant(world: &mut dyn WorldAccess, agent: EntityId, item: ItemId, amount: u32) -> Option<EntityId> {
    match world.spawn_and_grant_item(agent, item, amount) {
        Ok(Some(entity)) => Some(entity),
        Ok(None) => {
            tracing::warn!(agent = %agent, item = ?item, "loadout item could not be placed");
            None
        }
        Err(e) => {
            tracing::warn!(agent = %agent, item = ?item, error = %e, "loadout item grant failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWorld;
    use crate::world::Attribute;

    fn duelist() -> Loadout {
        Loadout {
            name: "duelist".to_string(),
            weapons: vec![ItemId(1)],
            armor_pieces: vec![ItemId(21), ItemId(22)],
            consumables: vec![ItemStack::new(ItemId(40), 5)],
            abilities: vec![AbilityId(7)],
        }
    }

    #[test]
    fn resolve_known_and_unknown() {
        let catalog = StaticCatalog::new().with_loadout(duelist());
        assert_eq!(catalog.resolve("duelist").unwrap().weapons, vec![ItemId(1)]);
        assert_eq!(
            catalog.resolve("nope"),
            Err(SessionError::LoadoutNotFound("nope".to_string()))
        );
        assert!(catalog.boss_roster().is_empty());
    }

    #[test]
    fn apply_grants_equips_and_sets_abilities() {
        let mut world = MockWorld::new();
        let agent = world.spawn_character("Foo");
        world.set_ability_bar(agent, vec![None, None, None]);

        assert_eq!(apply_loadout(&mut world, agent, &duelist()), 0);
        assert_eq!(
            world.inventory_stacks(agent),
            vec![ItemStack::new(ItemId(1), 1), ItemStack::new(ItemId(40), 5)]
        );
        assert_eq!(world.equipped_ids(agent), vec![ItemId(21), ItemId(22)]);
        assert_eq!(
            world.abilities(agent).unwrap().unwrap(),
            vec![Some(AbilityId(7)), None, None]
        );
    }

    #[test]
    fn apply_counts_failures_and_keeps_going() {
        let mut world = MockWorld::new();
        let agent = world.spawn_character("Foo");
        world.fail_writes(Attribute::Equipment);
        assert_eq!(apply_loadout(&mut world, agent, &duelist()), 2);
        assert_eq!(world.inventory_stacks(agent).len(), 4);
    }
}
