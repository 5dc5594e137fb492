//! Combat events - typed notifications for UI, audio and logging consumers
//!
//! The session pushes every event onto an [`EventBus`], which keeps a buffer for
//! [`take_events`](crate::combat::CombatSession::take_events) and forwards each
//! event to any subscribed [`EventSink`].

use super::state::CombatState;
use crate::status::StatusKind;
use crate::types::CombatantId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something observable that happened during a battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CombatEvent {
    CombatStarted {
        allies: Vec<CombatantId>,
        enemies: Vec<CombatantId>,
    },
    TurnStarted {
        combatant: CombatantId,
        turn: u32,
    },
    TurnEnded {
        combatant: CombatantId,
        turn: u32,
    },
    HpChanged {
        combatant: CombatantId,
        old: u32,
        new: u32,
    },
    MpChanged {
        combatant: CombatantId,
        old: u32,
        new: u32,
    },
    BraveChanged {
        combatant: CombatantId,
        old: u32,
        new: u32,
    },
    Death {
        combatant: CombatantId,
        killer: Option<CombatantId>,
    },
    Revived {
        combatant: CombatantId,
        hp: u32,
    },
    Break {
        attacker: CombatantId,
        defender: CombatantId,
    },
    BreakRecovered {
        combatant: CombatantId,
        brave: u32,
    },
    StatusApplied {
        combatant: CombatantId,
        kind: StatusKind,
        duration: u32,
    },
    StatusRemoved {
        combatant: CombatantId,
        kind: StatusKind,
    },
    GaugeReset {
        combatant: CombatantId,
    },
    CastStarted {
        caster: CombatantId,
        skill: String,
        required: u32,
    },
    CastCompleted {
        caster: CombatantId,
        skill: String,
    },
    CastInterrupted {
        caster: CombatantId,
        skill: String,
    },
    CombatEnded {
        outcome: CombatState,
    },
}

/// Receiver of combat events
pub trait EventSink {
    fn emit(&mut self, event: &CombatEvent);
}

/// An in-memory event buffer
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<CombatEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drain the buffer
    pub fn take(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &CombatEvent) {
        self.events.push(event.clone());
    }
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &CombatEvent) {}
}

/// Buffers events and fans them out to subscribers
#[derive(Default)]
pub struct EventBus {
    log: EventLog,
    subscribers: Vec<Box<dyn EventSink>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("buffered", &self.log.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.subscribers.push(sink);
    }

    pub fn buffered(&self) -> &[CombatEvent] {
        self.log.events()
    }

    pub fn take(&mut self) -> Vec<CombatEvent> {
        self.log.take()
    }
}

impl EventSink for EventBus {
    fn emit(&mut self, event: &CombatEvent) {
        self.log.emit(event);
        for subscriber in &mut self.subscribers {
            subscriber.emit(event);
        }
    }
}
