//! brave_core - Brave/HP turn-based combat engine
//!
//! This library provides:
//! - Combatant: HP, MP, Brave pools, statuses and traits for one participant
//! - BraveLedger: BRV/HP attacks and the BREAK state machine
//! - DamageResolver: hit, critical, elemental and trait-adjusted damage
//! - TurnScheduler: ATB gauges that decide who acts next
//! - CastingRegistry: charged skills and their interruption
//! - CombatSession / BattleService: battle orchestration and the event stream

pub mod atb;
pub mod brave;
pub mod casting;
pub mod combat;
pub mod combatant;
pub mod config;
pub mod damage;
pub mod prelude;
pub mod skill;
pub mod status;
pub mod traits;
pub mod types;

// Re-export core types for convenience
pub use atb::{AtbGauge, GaugeFlags, SchedulingState, TurnScheduler};
pub use brave::{BraveLedger, BrvAttackResult, BrvHpAttackResult, HpAttackResult, Strike};
pub use casting::{CastInfo, CastState, CastingRegistry};
pub use combat::{
    Action, ActionResult, BattleService, CombatError, CombatEvent, CombatSession, CombatState,
    EventSink, ItemEffect, ServiceError, SessionConfig, SessionId,
};
pub use combatant::{BraveState, Combatant, EffectiveStats, GimmickState, StatSet};
pub use config::{default_constants, default_skills, CombatConstants, ConfigError};
pub use damage::{AttackOptions, DamageResolver, DamageResult};
pub use skill::{BasicSkillExecutor, Skill, SkillEffect, SkillExecutor, SkillOutcome};
pub use status::{StatusCategory, StatusEffect, StatusKind, StatusRegistry};
pub use traits::{TraitContext, TraitEngine, TraitTable};
pub use types::{ActionKind, CombatantId, DamageKind, Element, Side, StatKind};
