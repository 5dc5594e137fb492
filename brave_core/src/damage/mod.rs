//! Damage system - Brave and HP damage resolution
//!
//! The [`DamageResolver`] is stateless apart from its constants. It reads two
//! combatants (stats, traits, statuses) and a caller-supplied RNG and returns a
//! [`DamageResult`]; applying the result is the Brave ledger's job.

mod calculation;
mod element;
mod hit;
mod result;

pub use calculation::{AttackOptions, DamageResolver};
pub use element::element_factor;
pub use hit::{hit_rate, roll_hit};
pub use result::{DamageDetails, DamageResult};

use serde::{Deserialize, Serialize};

/// Which pool a hit is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamagePhase {
    /// Brave damage, stolen from the defender's Brave
    Brave,
    /// HP damage, paid for with the attacker's Brave
    Hp,
}
