//! Status effects - timed buffs, debuffs and crowd control
//!
//! A [`StatusRegistry`] belongs to one combatant. It owns the stacking and
//! duration rules and answers the gating questions the rest of the engine asks
//! (can this combatant act, use skills, is it controlled).

mod effect;
mod kind;
mod modifiers;
pub mod periodic;

pub use effect::StatusEffect;
pub use kind::{StatusCategory, StatusKind};
pub use modifiers::StatModifiers;
pub use periodic::{
    process_periodic, PeriodicConfig, PeriodicEffect, PeriodicRegistry, PeriodicResource,
    PeriodicTick, PeriodicTickResult,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Active statuses on one combatant, in application order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusRegistry {
    effects: Vec<StatusEffect>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        StatusRegistry {
            effects: Vec::new(),
        }
    }

    /// Apply an effect. Returns true if the kind was not present before.
    ///
    /// Stackable effects gain a stack (up to their cap) and refresh duration.
    /// Otherwise, with `allow_refresh`, duration and intensity become the
    /// max of old and new. Without it the existing effect is left untouched.
    /// An effect with zero duration is ignored.
    pub fn add(&mut self, effect: StatusEffect, allow_refresh: bool) -> bool {
        if effect.duration == 0 {
            debug!(kind = ?effect.kind, "zero-duration status ignored");
            return false;
        }
        if let Some(existing) = self.effects.iter_mut().find(|e| e.kind == effect.kind) {
            if existing.is_stackable {
                existing.add_stack(&effect);
                debug!(
                    kind = ?effect.kind,
                    stacks = existing.stack_count,
                    "status stacked"
                );
            } else if allow_refresh {
                existing.refresh(&effect);
                debug!(kind = ?effect.kind, duration = existing.duration, "status refreshed");
            }
            return false;
        }

        debug!(kind = ?effect.kind, duration = effect.duration, "status applied");
        self.effects.push(effect);
        true
    }

    /// Remove a kind. Returns the removed effect if it was present.
    pub fn remove(&mut self, kind: StatusKind) -> Option<StatusEffect> {
        let index = self.effects.iter().position(|e| e.kind == kind)?;
        Some(self.effects.remove(index))
    }

    /// Remove every effect of a category, returning the removed kinds
    pub fn remove_category(&mut self, category: StatusCategory) -> Vec<StatusKind> {
        let removed: Vec<StatusKind> = self
            .effects
            .iter()
            .filter(|e| e.category() == category)
            .map(|e| e.kind)
            .collect();
        self.effects.retain(|e| e.category() != category);
        removed
    }

    pub fn has(&self, kind: StatusKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn get(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Count every effect down one turn and evict the ones that ran out
    pub fn tick_durations(&mut self) -> Vec<StatusEffect> {
        let mut expired = Vec::new();
        let mut remaining = Vec::with_capacity(self.effects.len());

        for mut effect in self.effects.drain(..) {
            if effect.tick() {
                expired.push(effect);
            } else {
                remaining.push(effect);
            }
        }
        self.effects = remaining;

        if !expired.is_empty() {
            debug!(count = expired.len(), "statuses expired");
        }
        expired
    }

    /// Fold every active effect into one set of stat multipliers
    pub fn stat_modifiers(&self) -> StatModifiers {
        let mut modifiers = StatModifiers::default();
        for effect in &self.effects {
            modifiers.apply(effect.kind, effect.strength());
        }
        modifiers
    }

    pub fn can_act(&self) -> bool {
        !self.effects.iter().any(|e| e.kind.blocks_action())
    }

    pub fn can_cast(&self) -> bool {
        !self.effects.iter().any(|e| e.kind.blocks_skills())
    }

    pub fn is_controlled(&self) -> bool {
        self.effects.iter().any(|e| e.kind.is_control())
    }

    pub fn has_stealth(&self) -> bool {
        self.has(StatusKind::Stealth)
    }

    pub fn has_invincibility(&self) -> bool {
        self.has(StatusKind::Invincible) || self.has(StatusKind::TemporaryInvincible)
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}
