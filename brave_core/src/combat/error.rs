//! Combat errors - recoverable, caller-surfaced action failures

use super::state::CombatState;
use crate::types::CombatantId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A spendable resource an action can run short of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resource {
    Brave,
    Mp,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Brave => write!(f, "Brave"),
            Resource::Mp => write!(f, "MP"),
        }
    }
}

/// Why an action or session call was refused
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CombatError {
    #[error("Combatant {0} is dead")]
    ActorDead(CombatantId),
    #[error("Combatant {0} cannot act")]
    ActorBlocked(CombatantId),
    #[error("Combatant {actor} needs {required} {resource}, has {available}")]
    InsufficientResource {
        actor: CombatantId,
        resource: Resource,
        required: u32,
        available: u32,
    },
    #[error("Invalid target {target}: {reason}")]
    InvalidTarget {
        target: CombatantId,
        reason: String,
    },
    #[error("Combatant {0} has no active cast")]
    NoActiveCast(CombatantId),
    #[error("Combat is not active (state: {0:?})")]
    CombatNotActive(CombatState),
    #[error("Unknown combatant {0}")]
    UnknownCombatant(CombatantId),
}

impl CombatError {
    pub fn invalid_target(target: CombatantId, reason: &str) -> Self {
        CombatError::InvalidTarget {
            target,
            reason: reason.to_string(),
        }
    }

    /// Rejections that still cost the actor its turn
    pub fn consumes_turn(&self) -> bool {
        matches!(self, CombatError::ActorDead(_) | CombatError::ActorBlocked(_))
    }
}
