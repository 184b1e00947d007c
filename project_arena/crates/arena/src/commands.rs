//! The command surface: one reply per command, never a panic.

use std::fmt;

use persistence::PersistenceError;
use session::{
    EnterOutcome, PlayerId, Position, SessionController, SessionError, SessionOptions, SnapshotStore,
};

use crate::catalog::ConfigLoadoutCatalog;
use crate::parser::ArenaCommand;
use crate::world::CharacterWorld;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub ok: bool,
    pub message: String,
}

impl CommandReply {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

impl From<SessionError> for CommandReply {
    fn from(e: SessionError) -> Self {
        CommandReply::failure(e.user_message())
    }
}

impl fmt::Display for CommandReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStatus {
    pub in_session: bool,
    pub spawn_configured: bool,
}

#[derive(Debug, Clone)]
pub struct ArenaSettings {
    pub spawn_point: Option<Position>,
    pub default_loadout: String,
    pub options: SessionOptions,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            spawn_point: None,
            default_loadout: "default".to_string(),
            options: SessionOptions::default(),
        }
    }
}

pub struct ArenaService {
    controller: SessionController<ConfigLoadoutCatalog>,
    spawn_point: Option<Position>,
    default_loadout: String,
}

impl ArenaService {
    pub fn new(store: SnapshotStore, catalog: ConfigLoadoutCatalog, settings: ArenaSettings) -> Self {
        Self {
            controller: SessionController::new(store, catalog, settings.options),
            spawn_point: settings.spawn_point,
            default_loadout: settings.default_loadout,
        }
    }

    pub fn controller(&self) -> &SessionController<ConfigLoadoutCatalog> {
        &self.controller
    }

    pub fn execute(
        &self,
        world: &mut CharacterWorld,
        player: PlayerId,
        command: &ArenaCommand,
    ) -> CommandReply {
        match command {
            ArenaCommand::Enter(loadout) => self.enter(world, player, loadout.as_deref()),
            ArenaCommand::Exit => self.exit(world, player),
            ArenaCommand::Status => self.status_reply(player),
            ArenaCommand::ReturnToOrigin => self.return_to_origin(world, player),
            ArenaCommand::Loadouts => self.loadouts(),
            ArenaCommand::Count => {
                CommandReply::success(format!("{} snapshot(s) stored.", self.snapshot_count()))
            }
            ArenaCommand::ClearAll => self.clear_all_snapshots(),
            ArenaCommand::Delete(target) => self.delete_snapshot(*target),
            ArenaCommand::Help => CommandReply::success(
                "commands: enter [loadout], exit, status, return, loadouts, count, clear, delete <id>",
            ),
            ArenaCommand::Usage(usage) => CommandReply::failure(format!("Usage: {usage}")),
            ArenaCommand::Unknown(input) => CommandReply::failure(format!("Unknown command: {input}")),
        }
    }

    pub fn enter(&self, world: &mut CharacterWorld, player: PlayerId, loadout: Option<&str>) -> CommandReply {
        let Some(target) = self.spawn_point else {
            return SessionError::SpawnNotConfigured.into();
        };
        let Some(agent) = world.find_character(player) else {
            return CommandReply::failure("You have no character in the world.");
        };
        let loadout = loadout.unwrap_or(self.default_loadout.as_str());

        match self.controller.enter(world, player, agent, target, loadout) {
            Ok(EnterOutcome::Entered { degraded: 0 }) => {
                CommandReply::success(format!("Entered the arena with loadout '{loadout}'."))
            }
            Ok(EnterOutcome::Entered { degraded }) => CommandReply::success(format!(
                "Entered the arena with loadout '{loadout}' ({degraded} issue(s) logged)."
            )),
            Ok(EnterOutcome::AlreadyInSession) => CommandReply::success("You are already in the arena."),
            Err(e) => e.into(),
        }
    }

    pub fn exit(&self, world: &mut CharacterWorld, player: PlayerId) -> CommandReply {
        let Some(agent) = world.find_character(player) else {
            return CommandReply::failure("You have no character in the world.");
        };
        match self.controller.exit(world, player, agent) {
            Ok(report) if report.degraded() == 0 => {
                CommandReply::success("You left the arena. Your state was restored.")
            }
            Ok(report) => CommandReply::success(format!(
                "You left the arena. {} part(s) of your state could not be restored.",
                report.degraded()
            )),
            Err(e @ SessionError::RepositionFailed { .. }) => CommandReply::failure(format!(
                "{} Your state was restored; use 'return' to go back.",
                e.user_message()
            )),
            Err(e) => e.into(),
        }
    }

    pub fn return_to_origin(&self, world: &mut CharacterWorld, player: PlayerId) -> CommandReply {
        let Some(agent) = world.find_character(player) else {
            return CommandReply::failure("You have no character in the world.");
        };
        match self.controller.return_to_origin(world, player, agent) {
            Ok(position) => CommandReply::success(format!("Returned to {position}.")),
            Err(e) => e.into(),
        }
    }

    pub fn status(&self, player: PlayerId) -> ArenaStatus {
        ArenaStatus {
            in_session: self.controller.status(player).in_session,
            spawn_configured: self.spawn_point.is_some(),
        }
    }

    fn status_reply(&self, player: PlayerId) -> CommandReply {
        let status = self.controller.status(player);
        let spawn = if self.spawn_point.is_some() {
            "spawn configured"
        } else {
            "spawn not configured"
        };
        let state = match status.loadout {
            Some(loadout) if status.in_session => format!("In arena (loadout '{loadout}')"),
            _ => "Outside".to_string(),
        };
        CommandReply::success(format!("Arena status: {state}, {spawn}."))
    }

    fn loadouts(&self) -> CommandReply {
        let names = self.controller.catalog().loadout_names();
        if names.is_empty() {
            return CommandReply::failure("No loadouts are configured.");
        }
        CommandReply::success(format!("Loadouts: {}", names.join(", ")))
    }

    pub fn clear_all_snapshots(&self) -> CommandReply {
        let cleared = self.controller.clear_all_snapshots();
        CommandReply::success(format!("Cleared {cleared} snapshot(s)."))
    }

    pub fn delete_snapshot(&self, player: PlayerId) -> CommandReply {
        if self.controller.delete_snapshot(player) {
            CommandReply::success(format!("Deleted snapshot for player {player}."))
        } else {
            CommandReply::failure(format!("No snapshot stored for player {player}."))
        }
    }

    pub fn snapshot_count(&self) -> usize {
        self.controller.snapshot_count()
    }

    /// Flush snapshots to durable storage.
    pub fn shutdown(&self) -> Result<(), PersistenceError> {
        self.controller.store().shutdown()
    }
}
