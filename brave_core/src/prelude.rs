//! Prelude module for convenient imports
//!
//! ```rust
//! use brave_core::prelude::*;
//! ```

// Participants
pub use crate::combatant::{Combatant, GimmickState, StatSet};
pub use crate::types::{ActionKind, CombatantId, DamageKind, Element, Side, StatKind};

// Battles
pub use crate::combat::{
    Action, ActionResult, BattleService, CombatError, CombatEvent, CombatSession, CombatState,
    EventLog, EventSink, ItemEffect, SessionConfig, SessionId,
};

// Skills and statuses
pub use crate::skill::{Skill, SkillEffect};
pub use crate::status::{StatusEffect, StatusKind};

// Config
pub use crate::config::{default_constants, default_skills, CombatConstants};
pub use crate::traits::TraitEngine;
