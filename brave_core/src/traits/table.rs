//! TraitTable - static lookup from trait id to its modifiers

use super::modifier::{TraitDefinition, TraitModifier};
use crate::config::parse_trait_table;
use std::collections::HashMap;
use tracing::warn;

/// Read-only table of trait definitions, shared between sessions
#[derive(Debug, Clone, Default)]
pub struct TraitTable {
    traits: HashMap<String, TraitDefinition>,
}

impl TraitTable {
    pub fn new() -> Self {
        TraitTable {
            traits: HashMap::new(),
        }
    }

    /// Register a trait, stamping its id onto every modifier
    pub fn register(&mut self, mut definition: TraitDefinition) {
        for effect in &mut definition.effects {
            effect.trait_id = definition.id.clone();
        }
        self.traits.insert(definition.id.clone(), definition);
    }

    pub fn get(&self, id: &str) -> Option<&TraitDefinition> {
        self.traits.get(id)
    }

    /// Modifiers of a trait; unknown ids have none
    pub fn effects_for(&self, id: &str) -> &[TraitModifier] {
        self.traits
            .get(id)
            .map(|t| t.effects.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.traits.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    /// The trait table shipped with the crate
    pub fn builtin() -> Self {
        let toml = include_str!("../../config/traits.toml");
        parse_trait_table(toml).unwrap_or_else(|err| {
            warn!(%err, "built-in trait table failed to parse");
            TraitTable::new()
        })
    }
}
