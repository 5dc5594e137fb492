//! Status kinds and categories

use serde::{Deserialize, Serialize};

/// Broad grouping of status kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    Buff,
    Debuff,
    Dot,
    Hot,
    Cc,
    Special,
}

impl StatusCategory {
    /// Whether statuses of this category hurt their holder
    pub fn is_harmful(self) -> bool {
        matches!(
            self,
            StatusCategory::Debuff | StatusCategory::Dot | StatusCategory::Cc
        )
    }
}

/// Every status a combatant can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    // Buffs
    BoostAtk,
    BoostDef,
    BoostSpd,
    BoostAccuracy,
    BoostCrit,
    BoostDodge,
    BoostAllStats,
    BoostMagicAtk,
    BoostMagicDef,
    Blessing,
    Invincible,
    Reflect,
    Haste,
    Focus,
    Rage,
    Inspiration,
    Guardian,
    Strengthen,
    EvasionUp,
    Foresight,
    Enlightenment,
    Wisdom,
    ManaInfinite,
    HolyBlessing,
    // Shields
    Barrier,
    MagicBarrier,
    ManaShield,
    FireShield,
    IceShield,
    HolyShield,
    ShadowShield,
    // Heal over time
    Regeneration,
    MpRegen,
    ManaRegeneration,
    // Debuffs
    ReduceAtk,
    ReduceDef,
    ReduceSpd,
    ReduceAccuracy,
    ReduceAllStats,
    ReduceMagicAtk,
    ReduceMagicDef,
    Vulnerable,
    Exposed,
    Weakness,
    Weaken,
    Confusion,
    Terror,
    Despair,
    HolyWeakness,
    WeaknessExposure,
    // Damage over time
    Poison,
    Burn,
    Bleed,
    Corrode,
    Disease,
    Necrosis,
    MpDrain,
    Chill,
    Shock,
    NatureCurse,
    // Crowd control
    Stun,
    Sleep,
    Silence,
    Blind,
    Paralyze,
    Freeze,
    Petrify,
    Charm,
    Dominate,
    Root,
    Slow,
    Entangle,
    Madness,
    Taunt,
    // Special
    Curse,
    Stealth,
    Berserk,
    Counter,
    CounterAttack,
    Vampire,
    SpiritLink,
    SoulBond,
    TimeStop,
    TimeMarked,
    TimeSavepoint,
    TimeDistortion,
    Phase,
    Transcendence,
    Analyze,
    AutoTurret,
    RepairDrone,
    AbsoluteEvasion,
    TemporaryInvincible,
    ExistenceDenial,
    TruthRevelation,
    GhostFleet,
    AnimalForm,
    DivinePunishment,
    DivineJudgment,
    HeavenGate,
    Purification,
    Martyrdom,
    ElementalWeapon,
    ElementalImmunity,
    MagicField,
    Transmutation,
    PhilosophersStone,
    UndeadMinion,
    ShadowClone,
    ShadowStack,
    ShadowEcho,
    ShadowEmpowered,
    ExtraTurn,
    HolyMark,
    HolyAura,
    DragonForm,
    WarriorStance,
    Afterimage,
}

impl StatusKind {
    /// Category of this kind; heal-over-time is checked before buffs
    pub fn category(self) -> StatusCategory {
        use StatusKind::*;
        match self {
            Regeneration | MpRegen | ManaRegeneration => StatusCategory::Hot,

            BoostAtk | BoostDef | BoostSpd | BoostAccuracy | BoostCrit | BoostDodge
            | BoostAllStats | BoostMagicAtk | BoostMagicDef | Blessing | Invincible | Reflect
            | Haste | Focus | Rage | Inspiration | Guardian | Strengthen | EvasionUp
            | Foresight | Enlightenment | Wisdom | ManaInfinite | HolyBlessing | Barrier
            | MagicBarrier | ManaShield | FireShield | IceShield | HolyShield | ShadowShield => {
                StatusCategory::Buff
            }

            ReduceAtk | ReduceDef | ReduceSpd | ReduceAccuracy | ReduceAllStats
            | ReduceMagicAtk | ReduceMagicDef | Vulnerable | Exposed | Weakness | Weaken
            | Confusion | Terror | Despair | HolyWeakness | WeaknessExposure => {
                StatusCategory::Debuff
            }

            Poison | Burn | Bleed | Corrode | Disease | Necrosis | MpDrain | Chill | Shock
            | NatureCurse => StatusCategory::Dot,

            Stun | Sleep | Silence | Blind | Paralyze | Freeze | Petrify | Charm | Dominate
            | Root | Slow | Entangle | Madness | Taunt => StatusCategory::Cc,

            _ => StatusCategory::Special,
        }
    }

    /// Kinds that prevent taking any action
    pub fn blocks_action(self) -> bool {
        matches!(
            self,
            StatusKind::Stun
                | StatusKind::Sleep
                | StatusKind::Freeze
                | StatusKind::Petrify
                | StatusKind::Paralyze
                | StatusKind::TimeStop
        )
    }

    /// Kinds that prevent using skills
    pub fn blocks_skills(self) -> bool {
        matches!(self, StatusKind::Silence | StatusKind::Madness)
    }

    /// Kinds that hand control of the holder to someone else
    pub fn is_control(self) -> bool {
        matches!(
            self,
            StatusKind::Charm | StatusKind::Dominate | StatusKind::Confusion
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hot_checked_before_buff() {
        assert_eq!(StatusKind::Regeneration.category(), StatusCategory::Hot);
        assert_eq!(StatusKind::ManaRegeneration.category(), StatusCategory::Hot);
    }

    #[test]
    fn test_categories() {
        assert_eq!(StatusKind::BoostAtk.category(), StatusCategory::Buff);
        assert_eq!(StatusKind::Barrier.category(), StatusCategory::Buff);
        assert_eq!(StatusKind::Terror.category(), StatusCategory::Debuff);
        assert_eq!(StatusKind::Poison.category(), StatusCategory::Dot);
        assert_eq!(StatusKind::Slow.category(), StatusCategory::Cc);
        assert_eq!(StatusKind::Berserk.category(), StatusCategory::Special);
        assert_eq!(StatusKind::TimeStop.category(), StatusCategory::Special);
    }

    #[test]
    fn test_gating_sets() {
        assert!(StatusKind::TimeStop.blocks_action());
        assert!(StatusKind::Paralyze.blocks_action());
        assert!(!StatusKind::Silence.blocks_action());
        assert!(StatusKind::Silence.blocks_skills());
        assert!(StatusKind::Confusion.is_control());
        assert!(!StatusKind::Taunt.is_control());
    }

    #[test]
    fn test_serde_name() {
        let json = serde_json::to_string(&StatusKind::BoostMagicAtk).unwrap();
        assert_eq!(json, "\"boost_magic_atk\"");
    }
}
