//! BattleService - owns every live combat session

use super::action::{Action, ActionResult};
use super::error::CombatError;
use super::events::CombatEvent;
use super::session::{CombatSession, SessionConfig};
use super::state::CombatState;
use crate::combatant::Combatant;
use crate::types::CombatantId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::info;

/// Handle for a session owned by a [`BattleService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("unknown session {0}")]
    UnknownSession(SessionId),
    #[error(transparent)]
    Combat(#[from] CombatError),
}

/// Creates sessions and routes calls to them
///
/// Each session gets its own RNG, seeded from the service seed and the
/// session id, so replaying the same calls replays the same battle.
#[derive(Debug, Default)]
pub struct BattleService {
    config: SessionConfig,
    sessions: HashMap<SessionId, CombatSession>,
    next_id: u64,
}

impl BattleService {
    pub fn new(config: SessionConfig) -> Self {
        BattleService {
            config,
            sessions: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Build and start a session
    pub fn start_combat(
        &mut self,
        allies: Vec<Combatant>,
        enemies: Vec<Combatant>,
    ) -> Result<SessionId, ServiceError> {
        let id = SessionId(self.next_id.max(1));
        self.next_id = id.0 + 1;

        let config = self
            .config
            .clone()
            .with_seed(self.config.seed.wrapping_add(id.0));
        let mut session = CombatSession::new(allies, enemies, config);
        session.start()?;

        info!(session = %id, "session opened");
        self.sessions.insert(id, session);
        Ok(id)
    }

    pub fn session(&self, id: SessionId) -> Result<&CombatSession, ServiceError> {
        self.sessions.get(&id).ok_or(ServiceError::UnknownSession(id))
    }

    fn session_mut(&mut self, id: SessionId) -> Result<&mut CombatSession, ServiceError> {
        self.sessions
            .get_mut(&id)
            .ok_or(ServiceError::UnknownSession(id))
    }

    pub fn submit_action(
        &mut self,
        id: SessionId,
        actor: CombatantId,
        action: Action,
    ) -> Result<ActionResult, ServiceError> {
        Ok(self.session_mut(id)?.execute_action(actor, action)?)
    }

    /// Advance a session's clock; returns who can act
    pub fn tick(&mut self, id: SessionId, delta: f64) -> Result<Vec<CombatantId>, ServiceError> {
        Ok(self.session_mut(id)?.tick(delta)?)
    }

    pub fn state(&self, id: SessionId) -> Result<CombatState, ServiceError> {
        Ok(self.session(id)?.state())
    }

    pub fn take_events(&mut self, id: SessionId) -> Result<Vec<CombatEvent>, ServiceError> {
        Ok(self.session_mut(id)?.take_events())
    }

    /// Close a session and hand its combatants back
    pub fn end_combat(&mut self, id: SessionId) -> Result<Vec<Combatant>, ServiceError> {
        let session = self
            .sessions
            .remove(&id)
            .ok_or(ServiceError::UnknownSession(id))?;
        info!(session = %id, state = ?session.state(), "session closed");
        Ok(session.end())
    }

    /// Ids of open sessions, oldest first
    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
