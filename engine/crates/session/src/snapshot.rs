//! The per-player record of pre-session state.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::world::{AbilityId, BloodTypeId, BossId, ItemId, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemId,
    pub amount: u32,
}

impl ItemStack {
    pub const fn new(item: ItemId, amount: u32) -> Self {
        Self { item, amount }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub original_location: Position,
    pub original_name: String,
    pub health: f32,
    pub blood_type: BloodTypeId,
    pub blood_quality: f32,
    pub experience: f32,
    pub level: u32,
    /// Sparse: only occupied slots, keyed by slot index.
    pub inventory_items: BTreeMap<u32, ItemStack>,
    pub equipped_items: Vec<ItemStack>,
    pub ability_ids: Vec<AbilityId>,
    pub unlocked_bosses: Vec<BossId>,
    pub loadout_name: String,
    pub is_active: bool,
    /// Unix millis.
    pub captured_at: u64,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            original_location: Position::default(),
            original_name: String::new(),
            health: 0.0,
            blood_type: BloodTypeId::default(),
            blood_quality: 0.0,
            experience: 0.0,
            level: 1,
            inventory_items: BTreeMap::new(),
            equipped_items: Vec::new(),
            ability_ids: Vec::new(),
            unlocked_bosses: Vec::new(),
            loadout_name: String::new(),
            is_active: false,
            captured_at: 0,
        }
    }
}

// On-disk shape. Containers are optional here so a record that lost one is
// detected instead of silently defaulted.
#[derive(Deserialize)]
struct SnapshotRecord {
    #[serde(default)]
    original_location: Position,
    #[serde(default)]
    original_name: String,
    #[serde(default)]
    health: f32,
    #[serde(default)]
    blood_type: BloodTypeId,
    #[serde(default)]
    blood_quality: f32,
    #[serde(default)]
    experience: f32,
    #[serde(default = "default_level")]
    level: u32,
    inventory_items: Option<BTreeMap<u32, ItemStack>>,
    equipped_items: Option<Vec<ItemStack>>,
    ability_ids: Option<Vec<AbilityId>>,
    #[serde(default)]
    unlocked_bosses: Vec<BossId>,
    #[serde(default)]
    loadout_name: String,
    #[serde(default)]
    is_active: bool,
    #[serde(default)]
    captured_at: u64,
}

fn default_level() -> u32 {
    1
}

impl Snapshot {
    /// Well-formed means a non-empty original name. Container presence is
    /// checked at decode time.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.original_name.trim().is_empty() {
            return Err("original name is empty");
        }
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn decode(key: &str, bytes: &[u8]) -> Result<Snapshot, SessionError> {
        let corrupt = |reason: String| SessionError::SnapshotCorrupt {
            key: key.to_string(),
            reason,
        };
        let record: SnapshotRecord =
            serde_json::from_slice(bytes).map_err(|e| corrupt(e.to_string()))?;

        let (Some(inventory_items), Some(equipped_items), Some(ability_ids)) = (
            record.inventory_items,
            record.equipped_items,
            record.ability_ids,
        ) else {
            return Err(corrupt("missing item or ability container".to_string()));
        };

        let snapshot = Snapshot {
            original_location: record.original_location,
            original_name: record.original_name,
            health: record.health,
            blood_type: record.blood_type,
            blood_quality: record.blood_quality,
            experience: record.experience,
            level: record.level,
            inventory_items,
            equipped_items,
            ability_ids,
            unlocked_bosses: record.unlocked_bosses,
            loadout_name: record.loadout_name,
            is_active: record.is_active,
            captured_at: record.captured_at,
        };
        snapshot.validate().map_err(|r| corrupt(r.to_string()))?;
        Ok(snapshot)
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
