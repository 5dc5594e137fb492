//! Skills - definitions and the executor seam
//!
//! The session only reads a skill's cast time, multipliers and metadata. What
//! a skill actually does is up to a [`SkillExecutor`]; [`BasicSkillExecutor`]
//! covers Brave/HP hits, heals and status application.

mod executor;

pub use executor::{BasicSkillExecutor, SkillContext, SkillExecutor, SkillOutcome};

use crate::damage::AttackOptions;
use crate::status::StatusKind;
use crate::types::{DamageKind, Element};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a skill does when it resolves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SkillEffect {
    #[default]
    BrvAttack,
    HpAttack,
    BrvHpAttack,
    /// Restore a fraction of the target's max HP
    Heal { fraction: f64 },
    ApplyStatus {
        status: StatusKind,
        duration: u32,
        #[serde(default = "default_multiplier")]
        intensity: f64,
    },
    /// Add a flat amount of Brave to the target
    BraveUp { amount: u32 },
}

impl SkillEffect {
    /// Whether the effect is aimed at the other side
    pub fn is_offensive(&self) -> bool {
        match self {
            SkillEffect::BrvAttack | SkillEffect::HpAttack | SkillEffect::BrvHpAttack => true,
            SkillEffect::ApplyStatus { status, .. } => status.category().is_harmful(),
            SkillEffect::Heal { .. } | SkillEffect::BraveUp { .. } => false,
        }
    }
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_interruptible() -> bool {
    true
}

/// A usable skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    /// BRV damage multiplier
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// HP damage multiplier
    #[serde(default = "default_multiplier")]
    pub hp_multiplier: f64,
    #[serde(default)]
    pub mp_cost: u32,
    /// Fraction of the gauge threshold needed to cast; 0 is instant
    #[serde(default)]
    pub cast_time_ratio: f64,
    #[serde(default = "default_interruptible")]
    pub interruptible: bool,
    #[serde(default)]
    pub damage_kind: DamageKind,
    #[serde(default)]
    pub element: Option<Element>,
    #[serde(default)]
    pub effect: SkillEffect,
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
}

impl Skill {
    pub fn new(id: &str, name: &str) -> Self {
        Skill {
            id: id.to_string(),
            name: name.to_string(),
            multiplier: 1.0,
            hp_multiplier: 1.0,
            mp_cost: 0,
            cast_time_ratio: 0.0,
            interruptible: true,
            damage_kind: DamageKind::Physical,
            element: None,
            effect: SkillEffect::BrvAttack,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_effect(mut self, effect: SkillEffect) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_multipliers(mut self, brv: f64, hp: f64) -> Self {
        self.multiplier = brv;
        self.hp_multiplier = hp;
        self
    }

    pub fn with_mp_cost(mut self, mp_cost: u32) -> Self {
        self.mp_cost = mp_cost;
        self
    }

    pub fn with_cast_time(mut self, ratio: f64) -> Self {
        self.cast_time_ratio = ratio.max(0.0);
        self
    }

    pub fn magical(mut self, element: Option<Element>) -> Self {
        self.damage_kind = DamageKind::Magical;
        self.element = element;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Needs charging before it resolves
    pub fn is_cast(&self) -> bool {
        self.cast_time_ratio > 0.0
    }

    /// Delivery options, with `pierce`, `defense_pierce` and
    /// `ignore_evasion` read from metadata
    pub fn attack_options(&self) -> AttackOptions {
        let pierce = self.metadata.get("pierce").and_then(Value::as_f64).unwrap_or(0.0);
        let fixed = self
            .metadata
            .get("defense_pierce")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let ignore_evasion = self
            .metadata
            .get("ignore_evasion")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        AttackOptions {
            kind: self.damage_kind,
            element: self.element,
            ignore_evasion,
            pierce: pierce.clamp(0.0, 1.0),
            defense_pierce_fixed: fixed.max(0.0),
        }
    }
}
