//! Outcomes of Brave ledger operations

use crate::damage::DamageResult;
use serde::{Deserialize, Serialize};

/// Outcome of a BRV attack
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrvAttackResult {
    /// Damage rolled before the defender's loss resistance
    pub raw: u32,
    /// Damage after loss resistance
    pub actual: u32,
    /// Brave taken from the defender
    pub stolen: u32,
    /// Brave added to the attacker
    pub gained: u32,
    pub is_break: bool,
    pub is_critical: bool,
    pub miss: bool,
}

impl BrvAttackResult {
    pub fn missed() -> Self {
        BrvAttackResult {
            miss: true,
            ..Self::default()
        }
    }
}

/// Outcome of an HP attack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HpAttackResult {
    /// HP actually removed from the defender
    pub hp_damage: u32,
    /// Wound added to the defender
    pub wound: u32,
    /// Brave the attacker spent
    pub brv_consumed: u32,
    /// Whether the BREAK bonus applied
    pub is_break_bonus: bool,
    /// Whether the defender died from this hit
    pub killed: bool,
    pub damage: DamageResult,
}

/// Outcome of a BRV attack followed by an HP attack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrvHpAttackResult {
    pub brv: BrvAttackResult,
    /// `None` when the attacker had no Brave left to spend
    pub hp: Option<HpAttackResult>,
}
