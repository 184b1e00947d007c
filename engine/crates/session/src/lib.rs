//! Arena/session mode lifecycle: capture a player's live state, swap in a
//! session loadout, and put everything back on exit.

pub mod capture;
pub mod controller;
pub mod error;
pub mod loadout;
pub mod restore;
pub mod snapshot;
pub mod store;
pub mod world;

#[cfg(test)]
pub(crate) mod testing;

pub use capture::{capture, capture_with_report, CaptureReport};
pub use controller::{
    validate_agent, EnterOutcome, ExitReport, SessionController, SessionOptions, SessionStatus,
};
pub use error::{SessionError, WorldError};
pub use loadout::{apply_loadout, Loadout, LoadoutCatalog, StaticCatalog};
pub use restore::{restore, restore_state, strip, RestoreReport, RestoreStep};
pub use snapshot::{ItemStack, Snapshot};
pub use store::{InsertOutcome, LoadReport, SnapshotStore};
pub use world::{
    AbilityId, Attribute, Blood, BloodTypeId, BossId, InventorySlot, ItemId, PlayerId, Position,
    Progression, Vitals, WorldAccess, WorldResult,
};
