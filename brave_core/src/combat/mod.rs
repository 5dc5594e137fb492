//! Combat orchestration
//!
//! [`CombatSession`] runs one battle over the scheduler, ledger and cast
//! registry. [`BattleService`] owns many sessions behind opaque ids.

mod action;
mod error;
mod events;
mod service;
mod session;
mod state;

pub use action::{Action, ActionResult, ItemEffect};
pub use error::{CombatError, Resource};
pub use events::{CombatEvent, EventBus, EventLog, EventSink, NullSink};
pub use service::{BattleService, ServiceError, SessionId};
pub use session::{CombatSession, SessionConfig, TurnStart};
pub use state::CombatState;
