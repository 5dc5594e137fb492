//! StatusEffect - a single timed effect on a combatant

use super::kind::{StatusCategory, StatusKind};
use crate::types::CombatantId;
use serde::{Deserialize, Serialize};

/// A timed effect carried by a combatant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    /// Turns remaining
    pub duration: u32,
    /// Duration the effect was applied with, used for stack refreshes
    pub max_duration: u32,
    pub intensity: f64,
    pub stack_count: u32,
    pub max_stacks: u32,
    pub is_stackable: bool,
    pub source_id: Option<CombatantId>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl StatusEffect {
    pub fn new(kind: StatusKind, duration: u32, intensity: f64) -> Self {
        StatusEffect {
            kind,
            duration,
            max_duration: duration,
            intensity,
            stack_count: 1,
            max_stacks: 1,
            is_stackable: false,
            source_id: None,
            metadata: serde_json::Map::new(),
        }
    }

    /// Make the effect stackable up to `max_stacks`
    pub fn stackable(mut self, max_stacks: u32) -> Self {
        self.is_stackable = true;
        self.max_stacks = max_stacks.max(1);
        self
    }

    pub fn with_source(mut self, source: CombatantId) -> Self {
        self.source_id = Some(source);
        self
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn category(&self) -> StatusCategory {
        self.kind.category()
    }

    pub fn is_active(&self) -> bool {
        self.duration > 0
    }

    /// Intensity scaled by stack count
    pub fn strength(&self) -> f64 {
        self.intensity * self.stack_count as f64
    }

    /// Add a stack and refresh duration to the longer of the two
    pub fn add_stack(&mut self, incoming: &StatusEffect) {
        if self.stack_count < self.max_stacks {
            self.stack_count += 1;
        }
        self.max_duration = self.max_duration.max(incoming.max_duration);
        self.duration = self.duration.max(incoming.duration);
    }

    /// Keep the stronger duration and intensity of the two
    pub fn refresh(&mut self, incoming: &StatusEffect) {
        self.duration = self.duration.max(incoming.duration);
        self.max_duration = self.max_duration.max(incoming.max_duration);
        self.intensity = self.intensity.max(incoming.intensity);
    }

    /// Count down one turn. Returns true once the effect has run out.
    pub fn tick(&mut self) -> bool {
        self.duration = self.duration.saturating_sub(1);
        self.duration == 0
    }
}
