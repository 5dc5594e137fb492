//! Trait activation conditions

use crate::combatant::Combatant;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// When a trait modifier is active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraitCondition {
    /// Holder's HP fraction strictly below the threshold
    HpBelow { threshold: f64 },
    /// Holder's HP fraction strictly above the threshold
    HpAbove { threshold: f64 },
    StanceChanged,
    OnHit,
    OnDeath,
    OnKill,
    Defending,
    TurnStart,
    CombatStart,
    TargetBroken,
    SkillCast,
    NormalAttack,
    /// Active on turns that are a multiple of `n`
    EveryNTurns { n: u32 },
    /// Active while the named context flag is set
    Flag { name: String },
}

impl TraitCondition {
    pub fn evaluate(&self, holder: &Combatant, context: &TraitContext) -> bool {
        match self {
            TraitCondition::HpBelow { threshold } => holder.hp_fraction() < *threshold,
            TraitCondition::HpAbove { threshold } => holder.hp_fraction() > *threshold,
            TraitCondition::StanceChanged => context.stance_changed,
            TraitCondition::OnHit => context.on_hit,
            TraitCondition::OnDeath => context.on_death,
            TraitCondition::OnKill => context.on_kill,
            TraitCondition::Defending => context.defending || holder.is_defending,
            TraitCondition::TurnStart => context.turn_start,
            TraitCondition::CombatStart => context.combat_start,
            TraitCondition::TargetBroken => context.target_broken,
            TraitCondition::SkillCast => context.skill_cast,
            TraitCondition::NormalAttack => context.normal_attack,
            TraitCondition::EveryNTurns { n } => {
                *n > 0 && context.turn_count > 0 && context.turn_count % n == 0
            }
            TraitCondition::Flag { name } => context.flags.contains(name),
        }
    }
}

/// Runtime facts trait conditions are checked against
#[derive(Debug, Clone, Default)]
pub struct TraitContext {
    pub turn_count: u32,
    pub turn_start: bool,
    pub combat_start: bool,
    pub stance_changed: bool,
    pub on_hit: bool,
    pub on_death: bool,
    pub on_kill: bool,
    pub defending: bool,
    pub target_broken: bool,
    pub skill_cast: bool,
    pub normal_attack: bool,
    pub flags: HashSet<String>,
}

impl TraitContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_turn(turn_count: u32) -> Self {
        TraitContext {
            turn_count,
            ..Self::default()
        }
    }

    pub fn turn_start(turn_count: u32) -> Self {
        TraitContext {
            turn_count,
            turn_start: true,
            ..Self::default()
        }
    }

    pub fn with_flag(mut self, name: &str) -> Self {
        self.flags.insert(name.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{Combatant, StatSet};
    use crate::types::{CombatantId, Side};

    fn make_holder(hp: u32) -> Combatant {
        let mut c = Combatant::new(CombatantId(1), "Holder", Side::Ally, StatSet::default())
            .with_hp(100);
        c.current_hp = hp;
        c
    }

    #[test]
    fn test_hp_thresholds() {
        let low = make_holder(20);
        let high = make_holder(80);
        let ctx = TraitContext::new();

        let below = TraitCondition::HpBelow { threshold: 0.3 };
        assert!(below.evaluate(&low, &ctx));
        assert!(!below.evaluate(&high, &ctx));

        let above = TraitCondition::HpAbove { threshold: 0.5 };
        assert!(above.evaluate(&high, &ctx));
        assert!(!above.evaluate(&low, &ctx));
    }

    #[test]
    fn test_every_n_turns() {
        let holder = make_holder(100);
        let cond = TraitCondition::EveryNTurns { n: 5 };
        assert!(!cond.evaluate(&holder, &TraitContext::at_turn(0)));
        assert!(!cond.evaluate(&holder, &TraitContext::at_turn(4)));
        assert!(cond.evaluate(&holder, &TraitContext::at_turn(5)));
        assert!(cond.evaluate(&holder, &TraitContext::at_turn(10)));
        assert!(!TraitCondition::EveryNTurns { n: 0 }.evaluate(&holder, &TraitContext::at_turn(5)));
    }

    #[test]
    fn test_named_flag() {
        let holder = make_holder(100);
        let cond = TraitCondition::Flag {
            name: "last_bullet".to_string(),
        };
        assert!(!cond.evaluate(&holder, &TraitContext::new()));
        assert!(cond.evaluate(&holder, &TraitContext::new().with_flag("last_bullet")));
    }

    #[test]
    fn test_defending_reads_holder_state() {
        let mut holder = make_holder(100);
        let ctx = TraitContext::new();
        assert!(!TraitCondition::Defending.evaluate(&holder, &ctx));
        holder.is_defending = true;
        assert!(TraitCondition::Defending.evaluate(&holder, &ctx));
    }

    #[test]
    fn test_parse_tagged_condition() {
        let cond: TraitCondition = toml::from_str("type = \"hp_below\"\nthreshold = 0.3").unwrap();
        assert_eq!(cond, TraitCondition::HpBelow { threshold: 0.3 });
    }
}
