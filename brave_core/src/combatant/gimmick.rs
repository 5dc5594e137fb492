//! Job-specific secondary mechanics

use serde::{Deserialize, Serialize};

/// Per-job counters. Each variant holds only what its job needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GimmickState {
    #[default]
    None,
    /// Defending builds focus stacks that the next attack spends
    Marksman { defend_stacks: u8 },
    /// Consecutive kills without being hit
    Gladiator { kill_streak: u32 },
}

impl GimmickState {
    /// Add one focus stack, up to `max`. No-op for other gimmicks.
    pub fn add_focus_stack(&mut self, max: u8) -> u8 {
        match self {
            GimmickState::Marksman { defend_stacks } => {
                *defend_stacks = (*defend_stacks + 1).min(max);
                *defend_stacks
            }
            _ => 0,
        }
    }

    /// Spend all focus stacks, returning how many there were
    pub fn take_focus_stacks(&mut self) -> u8 {
        match self {
            GimmickState::Marksman { defend_stacks } => std::mem::take(defend_stacks),
            _ => 0,
        }
    }

    pub fn record_kill(&mut self) {
        if let GimmickState::Gladiator { kill_streak } = self {
            *kill_streak += 1;
        }
    }

    pub fn record_hit_taken(&mut self) {
        if let GimmickState::Gladiator { kill_streak } = self {
            *kill_streak = 0;
        }
    }
}
