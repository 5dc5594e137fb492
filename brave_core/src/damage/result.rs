//! DamageResult - outcome of a single damage roll

use serde::{Deserialize, Serialize};

/// Intermediate factors that went into a damage roll
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageDetails {
    /// Hit chance in percent; 100 when evasion was ignored
    pub hit_rate: f64,
    /// Attacker stat over defender stat + 1
    pub stat_modifier: f64,
    /// Product of outgoing trait multipliers
    pub trait_multiplier: f64,
    pub element_factor: f64,
    /// Applied crit multiplier, 1.0 without a crit
    pub critical_multiplier: f64,
    /// BREAK bonus applied to HP damage, 1.0 otherwise
    pub break_multiplier: f64,
    /// Fraction removed by the defender's reduction traits
    pub damage_reduction: f64,
}

impl Default for DamageDetails {
    fn default() -> Self {
        DamageDetails {
            hit_rate: 100.0,
            stat_modifier: 0.0,
            trait_multiplier: 1.0,
            element_factor: 1.0,
            critical_multiplier: 1.0,
            break_multiplier: 1.0,
            damage_reduction: 0.0,
        }
    }
}

/// Result of a Brave or HP damage calculation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageResult {
    /// Damage before traits, variance and crits
    pub base: u32,
    /// Damage to apply
    pub final_damage: u32,
    pub is_critical: bool,
    pub is_miss: bool,
    /// Everything applied between base and final
    pub multiplier: f64,
    pub variance: f64,
    pub details: DamageDetails,
}

impl DamageResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// A miss deals nothing
    pub fn miss(hit_rate: f64) -> Self {
        DamageResult {
            is_miss: true,
            details: DamageDetails {
                hit_rate,
                ..DamageDetails::default()
            },
            ..Self::default()
        }
    }

    pub fn summary(&self) -> String {
        if self.is_miss {
            return "Miss".to_string();
        }
        let mut parts = vec![format!("{} damage", self.final_damage)];
        if self.is_critical {
            parts.push("critical".to_string());
        }
        if self.details.break_multiplier > 1.0 {
            parts.push(format!("break x{:.2}", self.details.break_multiplier));
        }
        parts.join(", ")
    }
}
