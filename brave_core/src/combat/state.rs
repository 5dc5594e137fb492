//! Session state machine

use serde::{Deserialize, Serialize};

/// Where a battle stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatState {
    #[default]
    NotStarted,
    InProgress,
    /// An ally is choosing an action
    PlayerTurn,
    /// An enemy is choosing an action
    EnemyTurn,
    Victory,
    Defeat,
    Fled,
}

impl CombatState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CombatState::Victory | CombatState::Defeat | CombatState::Fled)
    }

    /// Running states accept actions and ticks
    pub fn is_active(self) -> bool {
        matches!(
            self,
            CombatState::InProgress | CombatState::PlayerTurn | CombatState::EnemyTurn
        )
    }

    /// Whether `self -> next` is a legal transition. Terminal states are sticky.
    pub fn can_transition_to(self, next: CombatState) -> bool {
        match self {
            CombatState::NotStarted => next == CombatState::InProgress,
            s if s.is_terminal() => false,
            _ => next != CombatState::NotStarted,
        }
    }
}
