//! Combatant - a participant in a battle
//!
//! Combatants are built by the caller, handed to a
//! [`CombatSession`](crate::combat::CombatSession) for the battle's lifetime and
//! returned when the session ends.

mod brave;
mod gimmick;
mod stat_value;
mod stats;

pub use brave::BraveState;
pub use gimmick::GimmickState;
pub use stat_value::StatValue;
pub use stats::{trait_adjusted, EffectiveStats, StatSet};

use crate::status::StatusRegistry;
use crate::traits::{TraitContext, TraitEngine};
use crate::types::{CombatantId, Element, Side, StatKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A battle participant
///
/// Invariants kept by every mutator:
/// `current_hp <= max_hp - wound`, `brave.current <= brave.max`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub level: u32,
    pub stats: StatSet,
    pub current_hp: u32,
    pub max_hp: u32,
    pub current_mp: u32,
    pub max_mp: u32,
    pub brave: BraveState,
    pub is_alive: bool,
    /// Permanent reduction to effective max HP
    pub wound: u32,
    #[serde(default)]
    pub statuses: StatusRegistry,
    /// Active trait ids
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub gimmick: GimmickState,
    /// Per-element damage divisor; `None` falls back to spirit mitigation
    #[serde(default)]
    pub resistances: Option<HashMap<Element, f64>>,
    #[serde(default)]
    pub is_defending: bool,
    #[serde(default)]
    pub revive_used: bool,
}

impl Combatant {
    pub fn new(id: CombatantId, name: &str, side: Side, stats: StatSet) -> Self {
        Combatant {
            id,
            name: name.to_string(),
            side,
            level: 1,
            stats,
            current_hp: 100,
            max_hp: 100,
            current_mp: 0,
            max_mp: 0,
            brave: BraveState::default(),
            is_alive: true,
            wound: 0,
            statuses: StatusRegistry::new(),
            traits: Vec::new(),
            gimmick: GimmickState::None,
            resistances: None,
            is_defending: false,
            revive_used: false,
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.max(1);
        self
    }

    /// Set max HP and fill it
    pub fn with_hp(mut self, max_hp: u32) -> Self {
        self.max_hp = max_hp;
        self.current_hp = max_hp.saturating_sub(self.wound);
        self
    }

    /// Set max MP and fill it
    pub fn with_mp(mut self, max_mp: u32) -> Self {
        self.max_mp = max_mp;
        self.current_mp = max_mp;
        self
    }

    /// Set init and max Brave; current starts at init
    pub fn with_brave(mut self, init: u32, max: u32) -> Self {
        let efficiency = self.brave.efficiency;
        let loss_resistance = self.brave.loss_resistance;
        self.brave = BraveState::new(init, max);
        self.brave.efficiency = efficiency;
        self.brave.loss_resistance = loss_resistance;
        self
    }

    pub fn with_brave_multipliers(mut self, efficiency: f64, loss_resistance: f64) -> Self {
        self.brave.efficiency = efficiency.max(0.0);
        self.brave.loss_resistance = if loss_resistance > 0.0 {
            loss_resistance
        } else {
            1.0
        };
        self
    }

    pub fn with_traits(mut self, traits: &[&str]) -> Self {
        self.traits = traits.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_gimmick(mut self, gimmick: GimmickState) -> Self {
        self.gimmick = gimmick;
        self
    }

    pub fn with_resistances(mut self, resistances: HashMap<Element, f64>) -> Self {
        self.resistances = Some(resistances);
        self
    }

    /// Max HP after wound
    pub fn effective_max_hp(&self) -> u32 {
        self.max_hp.saturating_sub(self.wound)
    }

    /// Current HP as a fraction of max HP
    pub fn hp_fraction(&self) -> f64 {
        if self.max_hp == 0 {
            return 0.0;
        }
        self.current_hp as f64 / self.max_hp as f64
    }

    pub fn has_trait(&self, trait_id: &str) -> bool {
        self.traits.iter().any(|t| t == trait_id)
    }

    /// Lose up to `amount` HP. Returns the HP actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        if !self.is_alive {
            return 0;
        }
        let actual = amount.min(self.current_hp);
        self.current_hp -= actual;
        if self.current_hp == 0 {
            self.is_alive = false;
        }
        actual
    }

    /// Restore HP up to the wounded maximum. Dead combatants cannot be healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if !self.is_alive {
            return 0;
        }
        let before = self.current_hp;
        self.current_hp = self
            .current_hp
            .saturating_add(amount)
            .min(self.effective_max_hp());
        self.current_hp - before
    }

    /// Spend MP. Returns false, spending nothing, if there is not enough.
    pub fn consume_mp(&mut self, amount: u32) -> bool {
        if self.current_mp < amount {
            return false;
        }
        self.current_mp -= amount;
        true
    }

    pub fn restore_mp(&mut self, amount: u32) -> u32 {
        let before = self.current_mp;
        self.current_mp = self.current_mp.saturating_add(amount).min(self.max_mp);
        self.current_mp - before
    }

    /// Add wound, capped at `max_hp * max_fraction`. Returns the wound added.
    pub fn add_wound(&mut self, amount: u32, max_fraction: f64) -> u32 {
        let cap = (self.max_hp as f64 * max_fraction).floor() as u32;
        let before = self.wound;
        self.wound = self.wound.saturating_add(amount).min(cap.max(before));
        self.current_hp = self.current_hp.min(self.effective_max_hp());
        self.wound - before
    }

    /// Bring a dead combatant back with a fraction of max HP
    pub fn revive(&mut self, fraction: f64) -> u32 {
        if self.is_alive {
            return 0;
        }
        let hp = ((self.max_hp as f64 * fraction).floor() as u32)
            .max(1)
            .min(self.effective_max_hp().max(1));
        self.is_alive = true;
        self.current_hp = hp;
        hp
    }

    /// Scale max HP/MP by resource traits, keeping current values full
    pub fn apply_trait_maximums(&mut self, traits: &TraitEngine, context: &TraitContext) {
        let hp_mult = traits.stat_multiplier(self, StatKind::MaxHp, context);
        let hp_flat = traits.stat_flat(self, StatKind::MaxHp, context);
        let mp_mult = traits.stat_multiplier(self, StatKind::MaxMp, context);
        let mp_flat = traits.stat_flat(self, StatKind::MaxMp, context);

        let hp_full = self.current_hp == self.effective_max_hp();
        let mp_full = self.current_mp == self.max_mp;

        self.max_hp = ((self.max_hp as f64 + hp_flat) * hp_mult).max(1.0).floor() as u32;
        self.max_mp = ((self.max_mp as f64 + mp_flat) * mp_mult).max(0.0).floor() as u32;

        if hp_full && self.is_alive {
            self.current_hp = self.effective_max_hp();
        }
        if mp_full {
            self.current_mp = self.max_mp;
        }
        self.current_hp = self.current_hp.min(self.effective_max_hp());
        self.current_mp = self.current_mp.min(self.max_mp);
    }

    /// True when HP and Brave are within their bounds
    pub fn invariants_hold(&self, max_wound_fraction: f64) -> bool {
        let wound_cap = (self.max_hp as f64 * max_wound_fraction).floor() as u32;
        self.current_hp <= self.effective_max_hp()
            && self.brave.current <= self.brave.max
            && self.wound <= wound_cap
            && self.current_mp <= self.max_mp
    }
}
