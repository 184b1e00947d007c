//! Loadouts defined by name in configuration.

use std::collections::BTreeMap;

use serde::Deserialize;
use session::{AbilityId, BossId, ItemId, ItemStack, Loadout, LoadoutCatalog, SessionError};

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct ArmorSetEntry {
    pub boots: ItemId,
    pub chest: ItemId,
    pub gloves: ItemId,
    pub legs: ItemId,
}

impl ArmorSetEntry {
    fn pieces(&self) -> [ItemId; 4] {
        [self.boots, self.chest, self.gloves, self.legs]
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct ConsumableEntry {
    pub item: ItemId,
    #[serde(default = "one")]
    pub amount: u32,
}

fn one() -> u32 {
    1
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoadoutEntry {
    pub weapons: Vec<String>,
    pub armor_sets: Vec<String>,
    pub consumables: Vec<String>,
    pub abilities: Vec<AbilityId>,
    #[serde(default = "enabled")]
    pub enabled: bool,
}

/// The `[catalog]` table: building blocks by name, and loadouts that refer
/// to them.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    pub weapons: BTreeMap<String, ItemId>,
    pub armor_sets: BTreeMap<String, ArmorSetEntry>,
    pub consumables: BTreeMap<String, ConsumableEntry>,
    pub loadouts: BTreeMap<String, LoadoutEntry>,
    pub bosses: Vec<BossId>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let mut weapons = BTreeMap::new();
        weapons.insert("sword".to_string(), ItemId(-774462329));
        weapons.insert("crossbow".to_string(), ItemId(1389040540));

        let mut armor_sets = BTreeMap::new();
        armor_sets.insert(
            "dracula_brute".to_string(),
            ArmorSetEntry {
                boots: ItemId(1646489863),
                chest: ItemId(1033753207),
                gloves: ItemId(1039083725),
                legs: ItemId(993033515),
            },
        );

        let mut consumables = BTreeMap::new();
        consumables.insert(
            "blood_rose_potion".to_string(),
            ConsumableEntry {
                item: ItemId(828432508),
                amount: 20,
            },
        );

        let mut loadouts = BTreeMap::new();
        loadouts.insert(
            "default".to_string(),
            LoadoutEntry {
                weapons: vec!["sword".to_string(), "crossbow".to_string()],
                armor_sets: vec!["dracula_brute".to_string()],
                consumables: vec!["blood_rose_potion".to_string()],
                abilities: Vec::new(),
                enabled: true,
            },
        );

        Self {
            weapons,
            armor_sets,
            consumables,
            loadouts,
            bosses: Vec::new(),
        }
    }
}

/// [`LoadoutCatalog`] resolving names against a [`CatalogConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfigLoadoutCatalog {
    config: CatalogConfig,
}

impl ConfigLoadoutCatalog {
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    pub fn loadout_names(&self) -> Vec<&str> {
        self.config
            .loadouts
            .iter()
            .filter(|(_, l)| l.enabled)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl LoadoutCatalog for ConfigLoadoutCatalog {
    fn resolve(&self, name: &str) -> Result<Loadout, SessionError> {
        let entry = self
            .config
            .loadouts
            .get(name)
            .filter(|l| l.enabled)
            .ok_or_else(|| SessionError::LoadoutNotFound(name.to_string()))?;

        let mut loadout = Loadout {
            name: name.to_string(),
            abilities: entry.abilities.clone(),
            ..Loadout::default()
        };
        for weapon in &entry.weapons {
            match self.config.weapons.get(weapon) {
                Some(id) => loadout.weapons.push(*id),
                None => tracing::warn!(loadout = name, weapon = %weapon, "unknown weapon in loadout"),
            }
        }
        for set in &entry.armor_sets {
            match self.config.armor_sets.get(set) {
                Some(pieces) => loadout.armor_pieces.extend(pieces.pieces()),
                None => tracing::warn!(loadout = name, armor_set = %set, "unknown armor set in loadout"),
            }
        }
        for consumable in &entry.consumables {
            match self.config.consumables.get(consumable) {
                Some(c) => loadout.consumables.push(ItemStack::new(c.item, c.amount)),
                None => {
                    tracing::warn!(loadout = name, consumable = %consumable, "unknown consumable in loadout")
                }
            }
        }
        Ok(loadout)
    }

    fn boss_roster(&self) -> Vec<BossId> {
        self.config.bosses.clone()
    }
}
