//! Restoration Subsystem: strip session state and replay a [`Snapshot`].
//!
//! Steps run in a fixed order. A failing step is logged and recorded in the
//! [`RestoreReport`]; the remaining steps still run. Items come back by id and
//! amount only, so per-instance state (durability, enchantments) is not
//! carried over.

use std::fmt;

use ecs_adapter::EntityId;
use persistence::SuppressionGuard;

use crate::error::WorldError;
use crate::snapshot::Snapshot;
use crate::world::{AbilityId, Blood, ItemId, Progression, WorldAccess, WorldResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStep {
    Name,
    Health,
    Blood,
    Progression,
    ClearItems,
    RegrantItems,
    Abilities,
    Bosses,
    Reposition,
}

impl fmt::Display for RestoreStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RestoreStep::Name => "name",
            RestoreStep::Health => "health",
            RestoreStep::Blood => "blood",
            RestoreStep::Progression => "progression",
            RestoreStep::ClearItems => "clear items",
            RestoreStep::RegrantItems => "regrant items",
            RestoreStep::Abilities => "abilities",
            RestoreStep::Bosses => "boss unlocks",
            RestoreStep::Reposition => "reposition",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub failed: Vec<RestoreStep>,
    pub items_granted: usize,
    /// Grants the world refused or could not place.
    pub items_missing: usize,
}

impl RestoreReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.items_missing == 0
    }

    /// Count of soft failures, for transition metrics.
    pub fn degraded(&self) -> usize {
        self.failed.len() + self.items_missing
    }

    fn record(&mut self, agent: EntityId, step: RestoreStep, result: WorldResult<()>) {
        if let Err(e) = result {
            tracing::warn!(agent = %agent, step = %step, error = %e, "restore step failed, continuing");
            if !self.failed.contains(&step) {
                self.failed.push(step);
            }
        }
    }
}

/// Destroy everything the agent carries or wears. Returns the number of
/// entities that could not be removed.
pub fn strip(world: &mut dyn WorldAccess, agent: EntityId) -> usize {
    let mut leftovers = 0;

    match world.inventory(agent) {
        Ok(Some(slots)) => {
            for (index, slot) in slots.iter().enumerate() {
                let Some(item) = slot.item_entity else {
                    continue;
                };
                if let Err(e) = world.destroy(item) {
                    tracing::warn!(agent = %agent, item = %item, error = %e, "failed to destroy inventory item");
                    leftovers += 1;
                }
                if let Err(e) = world.clear_slot(agent, index) {
                    tracing::warn!(agent = %agent, slot = index, error = %e, "failed to clear inventory slot");
                }
            }
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(agent = %agent, error = %e, "cannot read inventory to clear it");
            leftovers += 1;
        }
    }

    match world.equipped(agent) {
        Ok(items) => {
            for item in items {
                if let Err(e) = world.destroy(item) {
                    tracing::warn!(agent = %agent, item = %item, error = %e, "failed to destroy equipped item");
                    leftovers += 1;
                }
            }
        }
        Err(e) => {
            tracing::warn!(agent = %agent, error = %e, "cannot read equipment to clear it");
            leftovers += 1;
        }
    }

    leftovers
}

/// Steps 1 to 5: everything except the final reposition.
pub fn restore_state(
    world: &mut dyn WorldAccess,
    agent: EntityId,
    snapshot: &Snapshot,
    guard: &SuppressionGuard,
) -> RestoreReport {
    let _scope = guard.acquire();
    let mut report = RestoreReport::default();

    report.record(agent, RestoreStep::Name, world.set_name(agent, &snapshot.original_name));

    if snapshot.health > 0.0 {
        report.record(agent, RestoreStep::Health, world.set_health(agent, snapshot.health));
    } else {
        tracing::warn!(agent = %agent, "snapshot has no usable health, keeping current value");
    }
    let blood = Blood {
        blood_type: snapshot.blood_type,
        quality: snapshot.blood_quality,
    };
    report.record(agent, RestoreStep::Blood, world.set_blood(agent, blood));
    let progression = Progression {
        experience: snapshot.experience,
        level: snapshot.level,
    };
    report.record(
        agent,
        RestoreStep::Progression,
        optional(world.set_progression(agent, progression)),
    );

    if strip(world, agent) > 0 {
        report.failed.push(RestoreStep::ClearItems);
    }
    regrant(world, agent, snapshot, &mut report);

    let bar = ability_bar(world, agent, &snapshot.ability_ids);
    report.record(agent, RestoreStep::Abilities, world.set_abilities(agent, &bar));
    report.record(
        agent,
        RestoreStep::Bosses,
        optional(world.set_unlocked_bosses(agent, &snapshot.unlocked_bosses)),
    );

    tracing::debug!(
        agent = %agent,
        granted = report.items_granted,
        missing = report.items_missing,
        failed = report.failed.len(),
        "restored agent state"
    );
    report
}

/// All six steps, ending with a move back to the original location.
pub fn restore(
    world: &mut dyn WorldAccess,
    agent: EntityId,
    snapshot: &Snapshot,
    guard: &SuppressionGuard,
) -> RestoreReport {
    let mut report = restore_state(world, agent, snapshot, guard);
    report.record(
        agent,
        RestoreStep::Reposition,
        world.set_position(agent, snapshot.original_location),
    );
    report
}

// Worn items go first: equipping frees the slot again, so a snapshot with a
// full inventory still fits.
fn regrant(world: &mut dyn WorldAccess, agent: EntityId, snapshot: &Snapshot, report: &mut RestoreReport) {
    for stack in &snapshot.equipped_items {
        let Some(item) = grant(world, agent, stack.item, stack.amount, report) else {
            continue;
        };
        if let Err(e) = world.equip(agent, item) {
            tracing::warn!(agent = %agent, item = %item, error = %e, "could not re-equip item, left in inventory");
        }
    }
    for stack in snapshot.inventory_items.values() {
        grant(world, agent, stack.item, stack.amount, report);
    }
}

fn grant(
    world: &mut dyn WorldAccess,
    agent: EntityId,
    item: ItemId,
    amount: u32,
    report: &mut RestoreReport,
) -> Option<EntityId> {
    match world.spawn_and_grant_item(agent, item, amount) {
        Ok(Some(entity)) => {
            report.items_granted += 1;
            Some(entity)
        }
        Ok(None) => {
            tracing::warn!(agent = %agent, item = ?item, amount, "world produced no item");
            report.items_missing += 1;
            None
        }
        Err(e) => {
            tracing::warn!(agent = %agent, item = ?item, amount, error = %e, "item grant failed");
            report.items_missing += 1;
            None
        }
    }
}

/// Snapshot ids laid slot by slot over a bar as long as the current one.
/// Id 0 and slots past the stored list come back empty.
fn ability_bar(world: &dyn WorldAccess, agent: EntityId, ids: &[AbilityId]) -> Vec<Option<AbilityId>> {
    let len = match world.abilities(agent) {
        Ok(Some(bar)) => bar.len(),
        _ => ids.len(),
    };
    if ids[len.min(ids.len())..].iter().any(|id| !id.is_empty()) {
        tracing::warn!(agent = %agent, stored = ids.len(), slots = len, "ability bar too short, dropping extra abilities");
    }
    (0..len)
        .map(|i| ids.get(i).copied().filter(|id| !id.is_empty()))
        .collect()
}

// Agents without an optional attribute have nothing to restore.
fn optional(result: WorldResult<()>) -> WorldResult<()> {
    match result {
        Err(WorldError::Missing { .. }) => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::capture;
    use crate::snapshot::ItemStack;
    use crate::testing::MockWorld;
    use crate::world::{Attribute, BloodTypeId, BossId, Position};

    fn seeded() -> (MockWorld, EntityId, Snapshot) {
        let mut world = MockWorld::new();
        let agent = world.spawn_character("Foo");
        world.set_position_raw(agent, Position::new(5.0, 0.0, 5.0));
        world.set_vitals_raw(agent, 80.0, 100.0);
        world.set_blood_raw(agent, BloodTypeId(5), 42.0);
        world.give(agent, 0, ItemId(100), 3);
        world.give(agent, 2, ItemId(200), 1);
        world.equip_new(agent, ItemId(300));
        world.set_ability_bar(agent, vec![Some(AbilityId(10)), Some(AbilityId(11)), None, None]);
        world.set_bosses_raw(agent, vec![BossId(3)]);
        let snapshot = capture(&world, agent);
        (world, agent, snapshot)
    }

    fn scramble(world: &mut MockWorld, agent: EntityId) {
        strip(world, agent);
        world.set_name(agent, "[Arena] Foo").unwrap();
        world.set_health(agent, 100.0).unwrap();
        world.set_blood_raw(agent, BloodTypeId(1), 100.0);
        world.give(agent, 0, ItemId(900), 1);
        world.equip_new(agent, ItemId(901));
        world.set_ability_bar(agent, vec![Some(AbilityId(50)), None, None, Some(AbilityId(51))]);
        world.set_bosses_raw(agent, vec![BossId(1), BossId(2), BossId(3)]);
        world.set_position_raw(agent, Position::new(100.0, 0.0, 100.0));
    }

    #[test]
    fn restore_replays_snapshot() {
        let (mut world, agent, snapshot) = seeded();
        scramble(&mut world, agent);
        let guard = SuppressionGuard::new();

        let report = restore(&mut world, agent, &snapshot, &guard);
        assert!(report.is_complete(), "{report:?}");
        assert_eq!(report.items_granted, 3);
        assert_eq!(world.name(agent).unwrap().as_deref(), Some("Foo"));
        assert_eq!(world.vitals(agent).unwrap().unwrap().current, 80.0);
        let blood = world.blood(agent).unwrap().unwrap();
        assert_eq!((blood.blood_type, blood.quality), (BloodTypeId(5), 42.0));
        assert_eq!(
            world.inventory_stacks(agent),
            vec![ItemStack::new(ItemId(100), 3), ItemStack::new(ItemId(200), 1)]
        );
        assert_eq!(world.equipped_ids(agent), vec![ItemId(300)]);
        assert_eq!(
            world.abilities(agent).unwrap().unwrap(),
            vec![Some(AbilityId(10)), Some(AbilityId(11)), None, None]
        );
        assert_eq!(world.unlocked_bosses(agent).unwrap().unwrap(), vec![BossId(3)]);
        assert_eq!(world.position(agent).unwrap().unwrap(), Position::new(5.0, 0.0, 5.0));
        assert_eq!(world.live_items(), 3);
        assert!(!guard.is_suppressed());
    }

    #[test]
    fn failing_step_does_not_stop_later_steps() {
        let (mut world, agent, snapshot) = seeded();
        scramble(&mut world, agent);
        world.fail_writes(Attribute::Name);
        world.fail_writes(Attribute::Position);

        let report = restore(&mut world, agent, &snapshot, &SuppressionGuard::new());
        assert_eq!(report.failed, vec![RestoreStep::Name, RestoreStep::Reposition]);
        assert_eq!(world.name(agent).unwrap().as_deref(), Some("[Arena] Foo"));
        assert_eq!(world.vitals(agent).unwrap().unwrap().current, 80.0);
        assert_eq!(world.equipped_ids(agent), vec![ItemId(300)]);
    }

    #[test]
    fn failed_equip_leaves_item_in_inventory() {
        let (mut world, agent, snapshot) = seeded();
        scramble(&mut world, agent);
        world.fail_writes(Attribute::Equipment);

        let report = restore_state(&mut world, agent, &snapshot, &SuppressionGuard::new());
        assert_eq!(report.items_granted, 3);
        assert!(world.equipped_ids(agent).is_empty());
        assert_eq!(world.inventory_stacks(agent).len(), 3);
    }

    #[test]
    fn full_inventory_counts_missing_items() {
        let (mut world, agent, snapshot) = seeded();
        world.set_inventory_size(agent, 1);
        let report = restore_state(&mut world, agent, &snapshot, &SuppressionGuard::new());
        // The worn item is granted, equipped out of the slot, then one stack fits.
        assert_eq!(report.items_granted, 2);
        assert_eq!(report.items_missing, 1);
        assert!(!report.is_complete());
        assert_eq!(report.degraded(), 1);
        assert_eq!(world.equipped_ids(agent), vec![ItemId(300)]);
    }

    #[test]
    fn worn_items_survive_a_full_inventory() {
        let mut world = MockWorld::new();
        let agent = world.spawn_character("Foo");
        world.set_inventory_size(agent, 2);
        world.give(agent, 0, ItemId(100), 1);
        world.give(agent, 1, ItemId(200), 1);
        world.equip_new(agent, ItemId(777));
        let snapshot = capture(&world, agent);
        scramble(&mut world, agent);

        let report = restore_state(&mut world, agent, &snapshot, &SuppressionGuard::new());
        assert_eq!(report.items_missing, 0, "{report:?}");
        assert_eq!(world.equipped_ids(agent), vec![ItemId(777)]);
        assert_eq!(
            world.inventory_stacks(agent),
            vec![ItemStack::new(ItemId(100), 1), ItemStack::new(ItemId(200), 1)]
        );
    }

    #[test]
    fn strip_removes_items_and_equipment() {
        let (mut world, agent, _) = seeded();
        assert_eq!(strip(&mut world, agent), 0);
        assert!(world.inventory_stacks(agent).is_empty());
        assert!(world.equipped_ids(agent).is_empty());
        assert_eq!(world.live_items(), 0);
    }

    #[test]
    fn agent_without_progression_is_not_degraded() {
        let (mut world, agent, snapshot) = seeded();
        world.remove_progression(agent);
        let report = restore_state(&mut world, agent, &snapshot, &SuppressionGuard::new());
        assert!(report.is_complete(), "{report:?}");
    }

    #[test]
    fn extra_abilities_are_truncated_to_bar_length() {
        let (mut world, agent, mut snapshot) = seeded();
        world.set_ability_bar(agent, vec![None, None]);
        snapshot.ability_ids = vec![AbilityId(1), AbilityId(2), AbilityId(3)];
        restore_state(&mut world, agent, &snapshot, &SuppressionGuard::new());
        assert_eq!(
            world.abilities(agent).unwrap().unwrap(),
            vec![Some(AbilityId(1)), Some(AbilityId(2))]
        );
    }

    #[test]
    fn ability_slots_keep_their_positions() {
        let (mut world, agent, _) = seeded();
        world.set_ability_bar(
            agent,
            vec![Some(AbilityId(10)), None, Some(AbilityId(11)), Some(AbilityId(10))],
        );
        let snapshot = capture(&world, agent);
        world.set_ability_bar(agent, vec![Some(AbilityId(50)); 4]);

        restore_state(&mut world, agent, &snapshot, &SuppressionGuard::new());
        assert_eq!(
            world.abilities(agent).unwrap().unwrap(),
            vec![Some(AbilityId(10)), None, Some(AbilityId(11)), Some(AbilityId(10))]
        );
    }

    #[test]
    fn suppression_held_during_restore() {
        let (mut world, agent, snapshot) = seeded();
        let guard = SuppressionGuard::new();
        world.observe_suppression(guard.clone());
        restore_state(&mut world, agent, &snapshot, &guard);
        assert!(world.writes_seen() > 0);
        assert_eq!(world.unsuppressed_writes(), 0);
        assert!(!guard.is_suppressed());
    }
}
