//! Trait modifier definitions

use super::condition::TraitCondition;
use crate::damage::DamagePhase;
use crate::types::{DamageKind, StatKind};
use serde::{Deserialize, Serialize};

/// What a trait modifier does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitEffectKind {
    /// Multiplies the target stat
    StatMultiplier,
    /// Adds to the target stat
    StatFlat,
    /// Multiplies outgoing damage matching the target
    DamageMultiplier,
    /// Fraction of incoming HP damage prevented
    DamageReduction,
    /// Fraction of MP cost waived
    MpCostReduction,
    /// Fraction of max HP restored
    HpRegen,
    /// Fraction of max MP restored
    MpRegen,
    /// Added to critical chance
    CriticalBonus,
    /// Multiplies the critical damage multiplier
    CriticalDamage,
    /// Replaces the default BREAK bonus on HP attacks
    BreakBonus,
    /// Starting gauge as a fraction of the threshold
    AtbBoost,
    /// Chance to strike back when hit
    Counter,
    /// Fraction of max HP restored on a once-per-battle revive
    Revive,
    /// Extra damage as HP drops: `1 + value * (1 - hp_fraction)`
    HpScalingAttack,
    /// Fraction of HP damage dealt returned as healing
    Lifesteal,
    /// Fraction of a resource restored after a kill
    KillBonus,
}

/// What a trait modifier applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitTarget {
    Attack,
    Defense,
    Magic,
    Spirit,
    Speed,
    Luck,
    Accuracy,
    Evasion,
    MaxHp,
    MaxMp,
    InitBrave,
    MaxBrave,
    PhysicalDamage,
    MagicalDamage,
    ElementalDamage,
    BrvDamage,
    HpDamage,
    AllDamage,
}

impl TraitTarget {
    /// Stat this target refers to, if it is a stat
    pub fn stat(self) -> Option<StatKind> {
        match self {
            TraitTarget::Attack => Some(StatKind::Attack),
            TraitTarget::Defense => Some(StatKind::Defense),
            TraitTarget::Magic => Some(StatKind::Magic),
            TraitTarget::Spirit => Some(StatKind::Spirit),
            TraitTarget::Speed => Some(StatKind::Speed),
            TraitTarget::Luck => Some(StatKind::Luck),
            TraitTarget::Accuracy => Some(StatKind::Accuracy),
            TraitTarget::Evasion => Some(StatKind::Evasion),
            TraitTarget::MaxHp => Some(StatKind::MaxHp),
            TraitTarget::MaxMp => Some(StatKind::MaxMp),
            TraitTarget::InitBrave => Some(StatKind::InitBrave),
            TraitTarget::MaxBrave => Some(StatKind::MaxBrave),
            _ => None,
        }
    }

    /// Whether a damage target covers an outgoing hit
    pub fn matches_damage(self, query: &DamageQuery) -> bool {
        match self {
            TraitTarget::AllDamage => true,
            TraitTarget::PhysicalDamage => query.kind == DamageKind::Physical,
            TraitTarget::MagicalDamage => query.kind == DamageKind::Magical,
            TraitTarget::ElementalDamage => query.is_elemental,
            TraitTarget::BrvDamage => query.phase == DamagePhase::Brave,
            TraitTarget::HpDamage => query.phase == DamagePhase::Hp,
            _ => false,
        }
    }
}

/// Describes an outgoing hit for damage multiplier lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageQuery {
    pub kind: DamageKind,
    pub phase: DamagePhase,
    pub is_elemental: bool,
}

impl DamageQuery {
    pub fn new(kind: DamageKind, phase: DamagePhase) -> Self {
        DamageQuery {
            kind,
            phase,
            is_elemental: false,
        }
    }

    pub fn elemental(mut self, is_elemental: bool) -> Self {
        self.is_elemental = is_elemental;
        self
    }
}

/// One numeric effect of a trait
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitModifier {
    /// Filled in from the owning definition when the table is built
    #[serde(default)]
    pub trait_id: String,
    pub kind: TraitEffectKind,
    pub value: f64,
    #[serde(default)]
    pub condition: Option<TraitCondition>,
    #[serde(default)]
    pub target: Option<TraitTarget>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl TraitModifier {
    pub fn new(trait_id: &str, kind: TraitEffectKind, value: f64) -> Self {
        TraitModifier {
            trait_id: trait_id.to_string(),
            kind,
            value,
            condition: None,
            target: None,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_target(mut self, target: TraitTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_condition(mut self, condition: TraitCondition) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// A named trait and its effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effects: Vec<TraitModifier>,
}
