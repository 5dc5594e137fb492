//! Core types shared across the combat engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a combatant within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(pub u32);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for CombatantId {
    fn from(id: u32) -> Self {
        CombatantId(id)
    }
}

/// Which side of the battle a combatant fights on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Ally,
    Enemy,
}

impl Side {
    /// The opposing side
    pub fn opponent(self) -> Side {
        match self {
            Side::Ally => Side::Enemy,
            Side::Enemy => Side::Ally,
        }
    }
}

/// Physical attacks read attack/defense, magical ones read magic/spirit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageKind {
    #[default]
    Physical,
    Magical,
}

/// Elemental affinity of an attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Fire,
    Ice,
    Lightning,
    Earth,
    Wind,
    Water,
    Holy,
    Dark,
    Poison,
}

impl Element {
    pub fn all() -> &'static [Element] {
        &[
            Element::Fire,
            Element::Ice,
            Element::Lightning,
            Element::Earth,
            Element::Wind,
            Element::Water,
            Element::Holy,
            Element::Dark,
            Element::Poison,
        ]
    }
}

/// Stats that traits and statuses can modify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
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
}

/// Action categories a combatant can take on its turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    BrvAttack,
    HpAttack,
    BrvHpAttack,
    Skill,
    Item,
    Defend,
    Flee,
}

impl ActionKind {
    /// Whether the action targets the opposing side
    pub fn is_offensive(self) -> bool {
        matches!(
            self,
            ActionKind::BrvAttack | ActionKind::HpAttack | ActionKind::BrvHpAttack
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::Ally.opponent(), Side::Enemy);
        assert_eq!(Side::Enemy.opponent(), Side::Ally);
    }

    #[test]
    fn test_combatant_id_display() {
        assert_eq!(CombatantId(7).to_string(), "#7");
    }

    #[test]
    fn test_offensive_actions() {
        assert!(ActionKind::BrvAttack.is_offensive());
        assert!(ActionKind::BrvHpAttack.is_offensive());
        assert!(!ActionKind::Defend.is_offensive());
        assert!(!ActionKind::Item.is_offensive());
    }
}
