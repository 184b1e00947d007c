//! Capture Subsystem: best-effort read of a live agent into a [`Snapshot`].
//!
//! Every attribute is read independently. An attribute that is missing or
//! whose read fails is logged and left at its default, and capture carries on.

use std::collections::BTreeMap;

use ecs_adapter::EntityId;

use crate::error::WorldError;
use crate::snapshot::{now_millis, ItemStack, Snapshot};
use crate::world::{AbilityId, Attribute, WorldAccess, WorldResult};

/// Attributes that could not be read during a capture, with the world's
/// reason for each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureReport {
    pub failed: Vec<(Attribute, WorldError)>,
}

impl CaptureReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        self.failed.iter().map(|(attribute, _)| *attribute).collect()
    }

    pub fn error_for(&self, attribute: Attribute) -> Option<&WorldError> {
        self.failed
            .iter()
            .find(|(a, _)| *a == attribute)
            .map(|(_, e)| e)
    }
}

pub fn capture(world: &dyn WorldAccess, agent: EntityId) -> Snapshot {
    capture_with_report(world, agent).0
}

pub fn capture_with_report(world: &dyn WorldAccess, agent: EntityId) -> (Snapshot, CaptureReport) {
    let mut snapshot = Snapshot {
        captured_at: now_millis(),
        ..Snapshot::default()
    };
    let mut report = CaptureReport::default();

    if let Some(position) = field(&mut report, agent, Attribute::Position, world.position(agent)) {
        snapshot.original_location = position;
    }
    if let Some(name) = field(&mut report, agent, Attribute::Name, world.name(agent)) {
        snapshot.original_name = name;
    }
    if let Some(vitals) = field(&mut report, agent, Attribute::Health, world.vitals(agent)) {
        snapshot.health = vitals.current;
    }
    if let Some(blood) = field(&mut report, agent, Attribute::Blood, world.blood(agent)) {
        snapshot.blood_type = blood.blood_type;
        snapshot.blood_quality = blood.quality;
    }
    // Not every agent carries progression; the defaults stand in.
    if let Some(progression) = field(
        &mut report,
        agent,
        Attribute::Progression,
        world.progression(agent),
    ) {
        snapshot.experience = progression.experience;
        snapshot.level = progression.level;
    }
    if let Some(slots) = field(&mut report, agent, Attribute::Inventory, world.inventory(agent)) {
        snapshot.inventory_items = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_occupied())
            .map(|(index, slot)| (index as u32, ItemStack::new(slot.item, slot.amount)))
            .collect::<BTreeMap<_, _>>();
    }
    snapshot.equipped_items = capture_equipment(world, agent, &mut report);
    if let Some(bar) = field(&mut report, agent, Attribute::Abilities, world.abilities(agent)) {
        snapshot.ability_ids = ability_ids(&bar);
    }
    if let Some(bosses) = field(&mut report, agent, Attribute::Bosses, world.unlocked_bosses(agent)) {
        snapshot.unlocked_bosses = bosses;
    }

    tracing::debug!(
        agent = %agent,
        slots = snapshot.inventory_items.len(),
        equipped = snapshot.equipped_items.len(),
        abilities = snapshot.ability_ids.len(),
        failed = report.failed.len(),
        "captured agent state"
    );
    (snapshot, report)
}

fn capture_equipment(
    world: &dyn WorldAccess,
    agent: EntityId,
    report: &mut CaptureReport,
) -> Vec<ItemStack> {
    let occupants = match world.equipped(agent) {
        Ok(occupants) => occupants,
        Err(e) => {
            record_failure(report, agent, Attribute::Equipment, &e);
            return Vec::new();
        }
    };
    let mut items = Vec::with_capacity(occupants.len());
    for occupant in occupants {
        match world.item_id(occupant) {
            Ok(Some(item)) if !item.is_none() => items.push(ItemStack::new(item, 1)),
            Ok(_) => {
                tracing::debug!(agent = %agent, item = %occupant, "skipping equipped item without an id");
            }
            Err(e) => {
                tracing::warn!(agent = %agent, item = %occupant, error = %e, "skipping unreadable equipped item");
            }
        }
    }
    items
}

/// One id per slot, empty slots as id 0, trailing empties trimmed.
fn ability_ids(bar: &[Option<AbilityId>]) -> Vec<AbilityId> {
    let mut ids: Vec<AbilityId> = bar.iter().map(|slot| slot.unwrap_or_default()).collect();
    while ids.last().is_some_and(|id| id.is_empty()) {
        ids.pop();
    }
    ids
}

fn field<T>(
    report: &mut CaptureReport,
    agent: EntityId,
    attribute: Attribute,
    read: WorldResult<Option<T>>,
) -> Option<T> {
    match read {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            tracing::debug!(agent = %agent, attribute = %attribute, "attribute absent, using default");
            None
        }
        Err(e) => {
            record_failure(report, agent, attribute, &e);
            None
        }
    }
}

fn record_failure(report: &mut CaptureReport, agent: EntityId, attribute: Attribute, e: &WorldError) {
    tracing::warn!(agent = %agent, attribute = %attribute, error = %e, "capture read failed, using default");
    report.failed.push((attribute, e.clone()));
}
