//! Actions a combatant can take on its turn, and what came of them

use super::state::CombatState;
use crate::brave::{BrvAttackResult, HpAttackResult};
use crate::skill::{Skill, SkillOutcome};
use crate::status::StatusKind;
use crate::types::{ActionKind, CombatantId};
use serde::{Deserialize, Serialize};

/// Consumable effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemEffect {
    HealHp { amount: u32 },
    HealMp { amount: u32 },
    RestoreBrave { amount: u32 },
    /// Remove one status, or every harmful status when `status` is `None`
    Cure {
        #[serde(default)]
        status: Option<StatusKind>,
    },
}

/// A turn's chosen action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    BrvAttack {
        target: CombatantId,
    },
    HpAttack {
        target: CombatantId,
    },
    /// BRV attack followed by an HP attack on the same target
    BrvHpAttack {
        target: CombatantId,
    },
    Skill {
        skill: Skill,
        /// `None` targets the user
        #[serde(default)]
        target: Option<CombatantId>,
    },
    Item {
        item: ItemEffect,
        #[serde(default)]
        target: Option<CombatantId>,
    },
    Defend,
    Flee,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::BrvAttack { .. } => ActionKind::BrvAttack,
            Action::HpAttack { .. } => ActionKind::HpAttack,
            Action::BrvHpAttack { .. } => ActionKind::BrvHpAttack,
            Action::Skill { .. } => ActionKind::Skill,
            Action::Item { .. } => ActionKind::Item,
            Action::Defend => ActionKind::Defend,
            Action::Flee => ActionKind::Flee,
        }
    }

    pub fn target(&self) -> Option<CombatantId> {
        match self {
            Action::BrvAttack { target }
            | Action::HpAttack { target }
            | Action::BrvHpAttack { target } => Some(*target),
            Action::Skill { target, .. } | Action::Item { target, .. } => *target,
            Action::Defend | Action::Flee => None,
        }
    }
}

/// Everything an action did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub actor: CombatantId,
    pub kind: ActionKind,
    pub target: Option<CombatantId>,
    pub brv: Option<BrvAttackResult>,
    pub hp: Option<HpAttackResult>,
    pub skill: Option<SkillOutcome>,
    /// The skill began charging instead of resolving
    pub cast_started: bool,
    /// BRV counter-attack by the target
    pub counter: Option<BrvAttackResult>,
    pub healed: u32,
    pub mp_restored: u32,
    pub brave_restored: u32,
    pub cured: Vec<StatusKind>,
    pub fled: bool,
    /// Combatants that died as a result
    pub defeated: Vec<CombatantId>,
    /// Session state after the action
    pub state: CombatState,
    pub message: String,
}

impl ActionResult {
    pub fn new(actor: CombatantId, kind: ActionKind, target: Option<CombatantId>) -> Self {
        ActionResult {
            actor,
            kind,
            target,
            brv: None,
            hp: None,
            skill: None,
            cast_started: false,
            counter: None,
            healed: 0,
            mp_restored: 0,
            brave_restored: 0,
            cured: Vec::new(),
            fled: false,
            defeated: Vec::new(),
            state: CombatState::InProgress,
            message: String::new(),
        }
    }

    /// Total HP damage dealt by the action itself
    pub fn hp_damage(&self) -> u32 {
        self.hp.as_ref().map_or(0, |hp| hp.hp_damage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_and_target() {
        let action = Action::BrvHpAttack {
            target: CombatantId(5),
        };
        assert_eq!(action.kind(), ActionKind::BrvHpAttack);
        assert_eq!(action.target(), Some(CombatantId(5)));
        assert_eq!(Action::Defend.target(), None);
        assert_eq!(Action::Flee.kind(), ActionKind::Flee);
    }

    #[test]
    fn test_action_from_toml() {
        let toml = r#"
kind = "item"
target = 2

[item]
type = "heal_hp"
amount = 150
"#;
        let action: Action = toml::from_str(toml).unwrap();
        assert_eq!(
            action,
            Action::Item {
                item: ItemEffect::HealHp { amount: 150 },
                target: Some(CombatantId(2)),
            }
        );
    }
}
