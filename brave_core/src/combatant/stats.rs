//! Base and effective combat stats

use super::stat_value::StatValue;
use super::Combatant;
use crate::traits::{TraitContext, TraitEngine};
use crate::types::StatKind;
use serde::{Deserialize, Serialize};

/// A combatant's base stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSet {
    #[serde(default = "default_stat")]
    pub attack: u32,
    #[serde(default = "default_stat")]
    pub defense: u32,
    #[serde(default = "default_stat")]
    pub magic: u32,
    #[serde(default = "default_stat")]
    pub spirit: u32,
    #[serde(default = "default_stat")]
    pub speed: u32,
    #[serde(default = "default_luck")]
    pub luck: u32,
    #[serde(default = "default_accuracy")]
    pub accuracy: u32,
    #[serde(default = "default_stat")]
    pub evasion: u32,
}

fn default_stat() -> u32 {
    10
}
fn default_luck() -> u32 {
    5
}
fn default_accuracy() -> u32 {
    20
}

impl Default for StatSet {
    fn default() -> Self {
        StatSet {
            attack: default_stat(),
            defense: default_stat(),
            magic: default_stat(),
            spirit: default_stat(),
            speed: default_stat(),
            luck: default_luck(),
            accuracy: default_accuracy(),
            evasion: default_stat(),
        }
    }
}

impl StatSet {
    /// Base value of a combat stat; resource maximums are not part of the set
    pub fn get(&self, stat: StatKind) -> Option<u32> {
        match stat {
            StatKind::Attack => Some(self.attack),
            StatKind::Defense => Some(self.defense),
            StatKind::Magic => Some(self.magic),
            StatKind::Spirit => Some(self.spirit),
            StatKind::Speed => Some(self.speed),
            StatKind::Luck => Some(self.luck),
            StatKind::Accuracy => Some(self.accuracy),
            StatKind::Evasion => Some(self.evasion),
            StatKind::MaxHp | StatKind::MaxMp | StatKind::InitBrave | StatKind::MaxBrave => None,
        }
    }
}

/// Stats after traits and statuses, as read by damage resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveStats {
    pub attack: f64,
    pub defense: f64,
    pub magic: f64,
    pub spirit: f64,
    pub speed: f64,
    pub luck: f64,
    pub accuracy: f64,
    pub evasion: f64,
    /// Status multiplier on critical chance
    pub critical_rate: f64,
}

/// Base stat with trait flats and multipliers applied, statuses excluded
pub fn trait_adjusted(
    combatant: &Combatant,
    stat: StatKind,
    traits: &TraitEngine,
    context: &TraitContext,
) -> f64 {
    let base = combatant.stats.get(stat).unwrap_or(0);
    let mut value = StatValue::with_base(base as f64);
    value.add_flat(traits.stat_flat(combatant, stat, context));
    value.add_multiplier(traits.stat_multiplier(combatant, stat, context));
    value.compute()
}

impl EffectiveStats {
    pub fn compute(combatant: &Combatant, traits: &TraitEngine, context: &TraitContext) -> Self {
        let status_mods = combatant.statuses.stat_modifiers();
        let stat = |kind: StatKind| {
            trait_adjusted(combatant, kind, traits, context) * status_mods.for_stat(kind)
        };

        EffectiveStats {
            attack: stat(StatKind::Attack),
            defense: stat(StatKind::Defense),
            magic: stat(StatKind::Magic),
            spirit: stat(StatKind::Spirit),
            speed: stat(StatKind::Speed),
            luck: stat(StatKind::Luck),
            accuracy: stat(StatKind::Accuracy),
            evasion: stat(StatKind::Evasion),
            critical_rate: status_mods.critical_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{StatusEffect, StatusKind};
    use crate::types::{CombatantId, Side};

    fn make_combatant(traits: &[&str]) -> Combatant {
        let stats = StatSet {
            attack: 100,
            defense: 50,
            speed: 20,
            accuracy: 40,
            ..StatSet::default()
        };
        Combatant::new(CombatantId(1), "Tester", Side::Ally, stats).with_traits(traits)
    }

    #[test]
    fn test_plain_stats_pass_through() {
        let c = make_combatant(&[]);
        let stats = EffectiveStats::compute(&c, &TraitEngine::default(), &TraitContext::new());
        assert!((stats.attack - 100.0).abs() < f64::EPSILON);
        assert!((stats.defense - 50.0).abs() < f64::EPSILON);
        assert!((stats.critical_rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_traits_and_statuses_combine() {
        let mut c = make_combatant(&["physical_guard", "accuracy_boost"]);
        c.statuses.add(StatusEffect::new(StatusKind::BoostDef, 2, 1.0), true);
        let stats = EffectiveStats::compute(&c, &TraitEngine::default(), &TraitContext::new());
        // 50 × 1.2 (trait) × 1.2 (status) = 72
        assert!((stats.defense - 72.0).abs() < 1e-9);
        // (40 + 10) = 50
        assert!((stats.accuracy - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_trait_adjusted_ignores_statuses() {
        let mut c = make_combatant(&["speed_boost"]);
        c.statuses.add(StatusEffect::new(StatusKind::Haste, 2, 1.0), true);
        let speed = trait_adjusted(&c, StatKind::Speed, &TraitEngine::default(), &TraitContext::new());
        // 20 × 1.12 = 22.4
        assert!((speed - 22.4).abs() < 1e-9);
    }
}
