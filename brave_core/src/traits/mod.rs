//! Traits - declarative, conditionally-active numeric modifiers
//!
//! Trait definitions live in a shared [`TraitTable`]. A combatant only carries
//! the ids of its active traits; the [`TraitEngine`] resolves those ids against
//! the table and a [`TraitContext`] to answer questions like "what is this
//! combatant's outgoing damage multiplier right now".

mod condition;
mod modifier;
mod table;

pub use condition::{TraitCondition, TraitContext};
pub use modifier::{
    DamageQuery, TraitDefinition, TraitEffectKind, TraitModifier, TraitTarget,
};
pub use table::TraitTable;

use crate::combatant::Combatant;
use crate::config::TraitConstants;
use crate::types::StatKind;
use std::sync::Arc;
use tracing::debug;

/// What turn-start traits restored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnStartEffects {
    pub hp_restored: u32,
    pub mp_restored: u32,
}

/// What on-kill traits restored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KillBonusEffects {
    pub hp_restored: u32,
    pub mp_restored: u32,
    pub brave_restored: u32,
}

/// Evaluates a combatant's active traits
#[derive(Debug, Clone)]
pub struct TraitEngine {
    table: Arc<TraitTable>,
    constants: TraitConstants,
}

impl Default for TraitEngine {
    fn default() -> Self {
        TraitEngine::new(Arc::new(TraitTable::builtin()), TraitConstants::default())
    }
}

impl TraitEngine {
    pub fn new(table: Arc<TraitTable>, constants: TraitConstants) -> Self {
        TraitEngine { table, constants }
    }

    pub fn table(&self) -> &TraitTable {
        &self.table
    }

    /// Static lookup of a trait's modifiers
    pub fn effects_for(&self, trait_id: &str) -> &[TraitModifier] {
        self.table.effects_for(trait_id)
    }

    /// Every modifier of `kind` on the combatant whose condition holds
    fn active<'a>(
        &'a self,
        combatant: &'a Combatant,
        kind: TraitEffectKind,
        context: &'a TraitContext,
    ) -> impl Iterator<Item = &'a TraitModifier> + 'a {
        combatant
            .traits
            .iter()
            .flat_map(move |id| self.table.effects_for(id).iter())
            .filter(move |m| m.kind == kind)
            .filter(move |m| {
                m.condition
                    .as_ref()
                    .map_or(true, |c| c.evaluate(combatant, context))
            })
    }

    /// Product of damage multipliers matching the hit. Untargeted ones match all damage.
    pub fn damage_multiplier(
        &self,
        combatant: &Combatant,
        query: &DamageQuery,
        context: &TraitContext,
    ) -> f64 {
        self.active(combatant, TraitEffectKind::DamageMultiplier, context)
            .filter(|m| m.target.map_or(true, |t| t.matches_damage(query)))
            .map(|m| m.value)
            .product()
    }

    /// `Π (1 + value * (1 - hp_fraction))` over HP-scaling traits
    pub fn hp_scaling_multiplier(&self, combatant: &Combatant, context: &TraitContext) -> f64 {
        let missing = 1.0 - combatant.hp_fraction();
        self.active(combatant, TraitEffectKind::HpScalingAttack, context)
            .map(|m| 1.0 + m.value * missing)
            .product()
    }

    /// MP cost after reduction traits, the reduction capped at the configured limit
    pub fn mp_cost(&self, combatant: &Combatant, base: u32, context: &TraitContext) -> u32 {
        let reduction: f64 = self
            .active(combatant, TraitEffectKind::MpCostReduction, context)
            .map(|m| m.value)
            .sum();
        let reduction = reduction.clamp(0.0, self.constants.mp_cost_reduction_cap);
        (base as f64 * (1.0 - reduction)).floor().max(0.0) as u32
    }

    pub fn critical_bonus(&self, combatant: &Combatant, context: &TraitContext) -> f64 {
        self.active(combatant, TraitEffectKind::CriticalBonus, context)
            .map(|m| m.value)
            .sum()
    }

    /// Multiplier on the critical multiplier; 1.0 when no trait applies
    pub fn critical_damage(&self, combatant: &Combatant, context: &TraitContext) -> f64 {
        self.active(combatant, TraitEffectKind::CriticalDamage, context)
            .map(|m| m.value)
            .product()
    }

    /// Trait BREAK bonus, 0.0 when none applies
    pub fn break_bonus(&self, combatant: &Combatant, context: &TraitContext) -> f64 {
        self.active(combatant, TraitEffectKind::BreakBonus, context)
            .map(|m| m.value)
            .sum()
    }

    /// Fraction of incoming damage prevented, capped
    pub fn damage_reduction(&self, combatant: &Combatant, context: &TraitContext) -> f64 {
        let total: f64 = self
            .active(combatant, TraitEffectKind::DamageReduction, context)
            .map(|m| m.value)
            .sum();
        total.clamp(0.0, self.constants.damage_reduction_cap)
    }

    pub fn stat_multiplier(
        &self,
        combatant: &Combatant,
        stat: StatKind,
        context: &TraitContext,
    ) -> f64 {
        self.active(combatant, TraitEffectKind::StatMultiplier, context)
            .filter(|m| m.target.and_then(|t| t.stat()) == Some(stat))
            .map(|m| m.value)
            .product()
    }

    pub fn stat_flat(&self, combatant: &Combatant, stat: StatKind, context: &TraitContext) -> f64 {
        self.active(combatant, TraitEffectKind::StatFlat, context)
            .filter(|m| m.target.and_then(|t| t.stat()) == Some(stat))
            .map(|m| m.value)
            .sum()
    }

    /// Starting gauge as a fraction of the threshold
    pub fn atb_boost(&self, combatant: &Combatant, context: &TraitContext) -> f64 {
        let total: f64 = self
            .active(combatant, TraitEffectKind::AtbBoost, context)
            .map(|m| m.value)
            .sum();
        total.max(0.0)
    }

    pub fn counter_chance(&self, combatant: &Combatant, context: &TraitContext) -> f64 {
        let total: f64 = self
            .active(combatant, TraitEffectKind::Counter, context)
            .map(|m| m.value)
            .sum();
        total.clamp(0.0, 1.0)
    }

    /// Best revive fraction available, if any
    pub fn revive_fraction(&self, combatant: &Combatant, context: &TraitContext) -> Option<f64> {
        self.active(combatant, TraitEffectKind::Revive, context)
            .map(|m| m.value)
            .filter(|v| *v > 0.0)
            .reduce(f64::max)
    }

    pub fn lifesteal(&self, combatant: &Combatant, context: &TraitContext) -> f64 {
        let total: f64 = self
            .active(combatant, TraitEffectKind::Lifesteal, context)
            .map(|m| m.value)
            .sum();
        total.clamp(0.0, 1.0)
    }

    /// Apply HP/MP regeneration traits conditioned on turn start
    pub fn apply_turn_start_effects(
        &self,
        combatant: &mut Combatant,
        context: &TraitContext,
    ) -> TurnStartEffects {
        let mut effects = TurnStartEffects::default();
        if !combatant.is_alive {
            return effects;
        }

        let mut hp_rate = 0.0;
        let mut mp_rate = 0.0;
        for modifier in self.active(combatant, TraitEffectKind::HpRegen, context) {
            if modifier.condition == Some(TraitCondition::TurnStart) {
                hp_rate += modifier.value;
            }
        }
        for modifier in self.active(combatant, TraitEffectKind::MpRegen, context) {
            if modifier.condition == Some(TraitCondition::TurnStart) {
                mp_rate += modifier.value;
            }
        }

        if hp_rate > 0.0 {
            let amount = (combatant.max_hp as f64 * hp_rate).floor() as u32;
            effects.hp_restored = combatant.heal(amount);
        }
        if mp_rate > 0.0 {
            let amount = (combatant.max_mp as f64 * mp_rate).floor() as u32;
            effects.mp_restored = combatant.restore_mp(amount);
        }

        if effects.hp_restored > 0 || effects.mp_restored > 0 {
            debug!(
                combatant = %combatant.id,
                hp = effects.hp_restored,
                mp = effects.mp_restored,
                "turn-start trait regen"
            );
        }
        effects
    }

    /// Apply kill-bonus traits after the combatant defeats someone
    pub fn apply_on_kill_effects(
        &self,
        combatant: &mut Combatant,
        context: &TraitContext,
    ) -> KillBonusEffects {
        let mut effects = KillBonusEffects::default();
        if !combatant.is_alive {
            return effects;
        }

        let bonuses: Vec<(Option<TraitTarget>, f64)> = self
            .active(combatant, TraitEffectKind::KillBonus, context)
            .map(|m| (m.target, m.value))
            .collect();

        for (target, value) in bonuses {
            match target {
                Some(TraitTarget::MaxMp) => {
                    let amount = (combatant.max_mp as f64 * value).floor() as u32;
                    effects.mp_restored += combatant.restore_mp(amount);
                }
                Some(TraitTarget::InitBrave) => {
                    let amount = (combatant.brave.init as f64 * value).floor() as u32;
                    effects.brave_restored += combatant.brave.restore(amount);
                }
                _ => {
                    let amount = (combatant.max_hp as f64 * value).floor() as u32;
                    effects.hp_restored += combatant.heal(amount);
                }
            }
        }
        effects
    }
}
