//! BraveState - a combatant's Brave pool and BREAK flag

use serde::{Deserialize, Serialize};

/// Brave pool. `current` never exceeds `max`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BraveState {
    pub current: u32,
    /// Value restored on turn-start recovery
    pub init: u32,
    pub max: u32,
    /// Multiplier on Brave gained from BRV attacks
    pub efficiency: f64,
    /// Divisor on Brave lost to BRV attacks
    pub loss_resistance: f64,
    pub is_broken: bool,
    /// Turn-start checks survived since the BREAK
    pub break_turns: u32,
}

impl Default for BraveState {
    fn default() -> Self {
        BraveState::new(100, 300)
    }
}

impl BraveState {
    pub fn new(init: u32, max: u32) -> Self {
        let max = max.max(init);
        BraveState {
            current: init,
            init,
            max,
            efficiency: 1.0,
            loss_resistance: 1.0,
            is_broken: false,
            break_turns: 0,
        }
    }

    /// Add Brave up to the cap, returning the amount actually added
    pub fn restore(&mut self, amount: u32) -> u32 {
        let before = self.current;
        self.current = self.current.saturating_add(amount).min(self.max);
        self.current - before
    }

    /// Remove up to `amount`, returning the amount actually removed
    pub fn lose(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.current);
        self.current -= lost;
        lost
    }

    /// Empty the pool, returning what it held
    pub fn spend_all(&mut self) -> u32 {
        std::mem::take(&mut self.current)
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    pub fn fraction(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        self.current as f64 / self.max as f64
    }
}
