//! Session Transition Controller: the Outside/InSession protocol per player.

use std::time::Instant;

use ecs_adapter::EntityId;
use observability::{TransitionKind, TransitionMetrics};
use persistence::SaveOutcome;

use crate::capture::capture_with_report;
use crate::error::{SessionError, WorldError};
use crate::loadout::{apply_loadout, LoadoutCatalog};
use crate::restore::{restore_state, strip, RestoreReport};
use crate::store::{InsertOutcome, SnapshotStore};
use crate::world::{Attribute, PlayerId, Position, WorldAccess};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Prepended to the display name while in session.
    pub name_prefix: String,
    /// Drop the stored snapshot when Enter cannot move the agent.
    pub rollback_failed_entry: bool,
    /// Unlock the catalog's boss roster for the session.
    pub unlock_all_bosses: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            name_prefix: "[Arena] ".to_string(),
            rollback_failed_entry: true,
            unlock_all_bosses: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterOutcome {
    /// `degraded` counts fields and grants that failed softly.
    Entered { degraded: usize },
    AlreadyInSession,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    pub restore: RestoreReport,
    /// Session items that survived the strip.
    pub leftovers: usize,
}

impl ExitReport {
    pub fn degraded(&self) -> usize {
        self.restore.degraded() + self.leftovers
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatus {
    pub in_session: bool,
    pub has_snapshot: bool,
    pub loadout: Option<String>,
}

/// Agent must exist, carry the character marker and a position, and be
/// neither dead nor disabled.
pub fn validate_agent(world: &dyn WorldAccess, agent: EntityId) -> Result<(), SessionError> {
    let reason = if !world.exists(agent) {
        "does not exist"
    } else if !world.is_character(agent) {
        "not a player character"
    } else if !world.has_position(agent) {
        "has no position"
    } else if world.is_incapacitated(agent) {
        "dead or disabled"
    } else {
        return Ok(());
    };
    tracing::warn!(agent = %agent, reason, "rejected session agent");
    Err(SessionError::InvalidAgent { agent, reason })
}

pub struct SessionController<C> {
    store: SnapshotStore,
    catalog: C,
    options: SessionOptions,
}

impl<C: LoadoutCatalog> SessionController<C> {
    pub fn new(store: SnapshotStore, catalog: C, options: SessionOptions) -> Self {
        Self {
            store,
            catalog,
            options,
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Capture the agent, move it to `target` and swap in `loadout`.
    /// A second call while in session is a successful no-op.
    pub fn enter(
        &self,
        world: &mut dyn WorldAccess,
        player: PlayerId,
        agent: EntityId,
        target: Position,
        loadout: &str,
    ) -> Result<EnterOutcome, SessionError> {
        validate_agent(&*world, agent)?;
        let start = Instant::now();

        let mut capture_failures = 0;
        let inserted = self.store.try_insert_if_inactive(player, || {
            let (mut snapshot, report) = capture_with_report(&*world, agent);
            // A record that would not load back must never stand in for the
            // player's real state.
            if let Err(reason) = snapshot.validate() {
                tracing::error!(player = %player, agent = %agent, reason, "capture unusable, enter aborted");
                let source = report.error_for(Attribute::Name).cloned().unwrap_or(WorldError::Missing {
                    agent,
                    attribute: Attribute::Name,
                });
                return Err(SessionError::read(Attribute::Name)(source));
            }
            snapshot.is_active = true;
            snapshot.loadout_name = loadout.to_string();
            capture_failures = report.failed.len();
            Ok(snapshot)
        })?;
        if inserted == InsertOutcome::AlreadyActive {
            tracing::info!(player = %player, "enter ignored, already in session");
            return Ok(EnterOutcome::AlreadyInSession);
        }
        self.persist(player);

        if let Err(source) = world.set_position(agent, target) {
            tracing::error!(player = %player, agent = %agent, error = %source, "enter reposition failed");
            if self.options.rollback_failed_entry {
                self.store.remove(player);
                self.persist(player);
                tracing::info!(player = %player, "rolled back snapshot after failed enter");
            }
            return Err(SessionError::RepositionFailed { agent, source });
        }

        let mut degraded = capture_failures;
        {
            let _scope = self.store.guard().acquire();
            degraded += strip(world, agent);

            match self.catalog.resolve(loadout) {
                Ok(resolved) => degraded += apply_loadout(world, agent, &resolved),
                Err(e) => {
                    tracing::warn!(player = %player, error = %e, "entering without a loadout");
                    degraded += 1;
                }
            }

            if self.options.unlock_all_bosses {
                let roster = self.catalog.boss_roster();
                match world.set_unlocked_bosses(agent, &roster) {
                    Ok(()) | Err(WorldError::Missing { .. }) => {}
                    Err(e) => {
                        tracing::warn!(player = %player, error = %e, "could not unlock bosses");
                        degraded += 1;
                    }
                }
            }

            degraded += self.mark_session_agent(world, player, agent);
        }

        TransitionMetrics {
            kind: TransitionKind::Enter,
            player: player.0,
            duration_us: start.elapsed().as_micros(),
            degraded_fields: degraded,
        }
        .log();
        Ok(EnterOutcome::Entered { degraded })
    }

    /// Strip the session state, replay the stored snapshot and move the agent
    /// back. A failed final move still leaves the player logically outside.
    pub fn exit(
        &self,
        world: &mut dyn WorldAccess,
        player: PlayerId,
        agent: EntityId,
    ) -> Result<ExitReport, SessionError> {
        validate_agent(&*world, agent)?;
        let start = Instant::now();

        let Some(snapshot) = self.store.deactivate(player) else {
            tracing::info!(player = %player, "exit rejected, not in session");
            return Err(SessionError::AlreadyOutside(player));
        };

        let report = {
            let _scope = self.store.guard().acquire();
            let leftovers = strip(world, agent);
            ExitReport {
                restore: restore_state(world, agent, &snapshot, self.store.guard()),
                leftovers,
            }
        };
        self.persist(player);

        let moved = world.set_position(agent, snapshot.original_location);
        TransitionMetrics {
            kind: TransitionKind::Exit,
            player: player.0,
            duration_us: start.elapsed().as_micros(),
            degraded_fields: report.degraded() + usize::from(moved.is_err()),
        }
        .log();

        moved.map_err(|source| {
            tracing::error!(player = %player, agent = %agent, error = %source, "exit reposition failed");
            SessionError::RepositionFailed { agent, source }
        })?;
        Ok(report)
    }

    /// Re-issue the teleport to the stored original location, for a player
    /// whose exit could not move them.
    pub fn return_to_origin(
        &self,
        world: &mut dyn WorldAccess,
        player: PlayerId,
        agent: EntityId,
    ) -> Result<Position, SessionError> {
        validate_agent(&*world, agent)?;
        let snapshot = self.store.get(player).ok_or(SessionError::NoSnapshot(player))?;
        if snapshot.is_active {
            return Err(SessionError::InvalidAgent {
                agent,
                reason: "still in session",
            });
        }
        world
            .set_position(agent, snapshot.original_location)
            .map_err(|source| SessionError::RepositionFailed { agent, source })?;
        tracing::info!(player = %player, to = %snapshot.original_location, "returned to origin");
        Ok(snapshot.original_location)
    }

    pub fn status(&self, player: PlayerId) -> SessionStatus {
        match self.store.get(player) {
            Some(snapshot) => SessionStatus {
                in_session: snapshot.is_active,
                has_snapshot: true,
                loadout: snapshot.is_active.then_some(snapshot.loadout_name),
            },
            None => SessionStatus::default(),
        }
    }

    /// Drop every stored snapshot, durable records included.
    pub fn clear_all_snapshots(&self) -> usize {
        let active = self.store.active_players().len();
        if active > 0 {
            tracing::warn!(active, "clearing snapshots of players still in session");
        }
        let cleared = self.store.clear();
        if let Err(e) = self.store.sync() {
            tracing::error!(error = %e, "failed to clear persisted snapshots");
        }
        tracing::info!(cleared, "cleared all snapshots");
        cleared
    }

    pub fn delete_snapshot(&self, player: PlayerId) -> bool {
        let removed = self.store.remove(player).is_some();
        if removed {
            self.persist(player);
            tracing::info!(player = %player, "deleted snapshot");
        }
        removed
    }

    pub fn snapshot_count(&self) -> usize {
        self.store.count()
    }

    // Rename with the session prefix and heal to full. Returns failures.
    fn mark_session_agent(&self, world: &mut dyn WorldAccess, player: PlayerId, agent: EntityId) -> usize {
        let mut failures = 0;
        let base = self
            .store
            .get(player)
            .map(|s| s.original_name)
            .filter(|n| !n.is_empty());
        if let Some(base) = base {
            let name = format!("{}{}", self.options.name_prefix, base);
            if let Err(e) = world.set_name(agent, &name) {
                tracing::warn!(player = %player, error = %e, "could not apply session name");
                failures += 1;
            }
        }
        match world.vitals(agent) {
            Ok(Some(vitals)) => {
                if let Err(e) = world.set_health(agent, vitals.max) {
                    tracing::warn!(player = %player, error = %e, "could not heal session agent");
                    failures += 1;
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(player = %player, error = %e, "could not read vitals to heal");
                failures += 1;
            }
        }
        failures
    }

    fn persist(&self, player: PlayerId) {
        match self.store.persist(player) {
            Ok(SaveOutcome::Written) => {}
            Ok(SaveOutcome::Suppressed) => {
                tracing::debug!(player = %player, "snapshot write suppressed");
            }
            Err(e) => tracing::error!(player = %player, error = %e, "failed to persist snapshot"),
        }
    }
}
