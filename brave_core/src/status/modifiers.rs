//! StatModifiers - multiplicative stat factors folded from active statuses

use super::kind::StatusKind;
use crate::types::StatKind;
use serde::{Deserialize, Serialize};

/// Multipliers applied on top of a combatant's stats (1.0 = unchanged)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatModifiers {
    pub physical_attack: f64,
    pub magic_attack: f64,
    pub physical_defense: f64,
    pub magic_defense: f64,
    pub speed: f64,
    pub accuracy: f64,
    pub evasion: f64,
    pub critical_rate: f64,
}

impl Default for StatModifiers {
    fn default() -> Self {
        StatModifiers {
            physical_attack: 1.0,
            magic_attack: 1.0,
            physical_defense: 1.0,
            magic_defense: 1.0,
            speed: 1.0,
            accuracy: 1.0,
            evasion: 1.0,
            critical_rate: 1.0,
        }
    }
}

fn boost(strength: f64, step: f64) -> f64 {
    1.0 + strength * step
}

/// Floored at zero so stacked debuffs cannot flip a stat's sign
fn reduce(strength: f64, step: f64) -> f64 {
    (1.0 - strength * step).max(0.0)
}

impl StatModifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Multiplier for a stat; stats without a status factor stay at 1.0
    pub fn for_stat(&self, stat: StatKind) -> f64 {
        match stat {
            StatKind::Attack => self.physical_attack,
            StatKind::Magic => self.magic_attack,
            StatKind::Defense => self.physical_defense,
            StatKind::Spirit => self.magic_defense,
            StatKind::Speed => self.speed,
            StatKind::Accuracy => self.accuracy,
            StatKind::Evasion => self.evasion,
            StatKind::Luck
            | StatKind::MaxHp
            | StatKind::MaxMp
            | StatKind::InitBrave
            | StatKind::MaxBrave => 1.0,
        }
    }

    fn scale_all(&mut self, factor: f64) {
        self.physical_attack *= factor;
        self.magic_attack *= factor;
        self.physical_defense *= factor;
        self.magic_defense *= factor;
        self.speed *= factor;
        self.accuracy *= factor;
        self.evasion *= factor;
        self.critical_rate *= factor;
    }

    fn scale_attacks(&mut self, factor: f64) {
        self.physical_attack *= factor;
        self.magic_attack *= factor;
    }

    fn scale_defenses(&mut self, factor: f64) {
        self.physical_defense *= factor;
        self.magic_defense *= factor;
    }

    /// Fold one status into the modifiers. `strength` is intensity times stacks.
    pub fn apply(&mut self, kind: StatusKind, strength: f64) {
        match kind {
            StatusKind::BoostAtk => self.scale_attacks(boost(strength, 0.2)),
            StatusKind::BoostDef => self.scale_defenses(boost(strength, 0.2)),
            StatusKind::BoostSpd => self.speed *= boost(strength, 0.3),
            StatusKind::BoostAccuracy => self.accuracy *= boost(strength, 0.15),
            StatusKind::BoostCrit => self.critical_rate *= boost(strength, 0.25),
            StatusKind::BoostDodge => self.evasion *= boost(strength, 0.2),
            StatusKind::BoostMagicAtk => self.magic_attack *= boost(strength, 0.25),
            StatusKind::BoostMagicDef => self.magic_defense *= boost(strength, 0.25),
            StatusKind::BoostAllStats => self.scale_all(boost(strength, 0.15)),

            StatusKind::ReduceAtk => self.scale_attacks(reduce(strength, 0.2)),
            StatusKind::ReduceDef => self.scale_defenses(reduce(strength, 0.2)),
            StatusKind::ReduceSpd => self.speed *= reduce(strength, 0.3),
            StatusKind::ReduceAccuracy => self.accuracy *= reduce(strength, 0.15),
            StatusKind::ReduceMagicAtk => self.magic_attack *= reduce(strength, 0.25),
            StatusKind::ReduceMagicDef => self.magic_defense *= reduce(strength, 0.25),
            StatusKind::ReduceAllStats => self.scale_all(reduce(strength, 0.15)),

            // Fixed factors, independent of intensity
            StatusKind::Vulnerable => self.scale_defenses(0.5),
            StatusKind::Exposed => self.evasion *= 0.3,
            StatusKind::Weakness => self.scale_attacks(0.7),
            StatusKind::Haste => self.speed *= 1.5,
            StatusKind::Slow => self.speed *= 0.6,
            StatusKind::Focus => {
                self.accuracy *= 1.3;
                self.critical_rate *= 1.2;
            }
            StatusKind::Rage => {
                self.physical_attack *= 1.4;
                self.physical_defense *= 0.8;
            }
            StatusKind::Berserk => {
                self.scale_attacks(1.6);
                self.scale_defenses(0.6);
                self.accuracy *= 0.8;
            }
            StatusKind::Blind => self.accuracy *= 0.3,
            StatusKind::Terror => {
                self.scale_attacks(0.6);
                self.speed *= 0.7;
            }
            _ => {}
        }
    }
}
