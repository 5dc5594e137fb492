//! Trait table loading

use super::ConfigError;
use crate::traits::{TraitDefinition, TraitTable};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Container for trait definitions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitsConfig {
    #[serde(default)]
    pub traits: Vec<TraitDefinition>,
}

fn build_table(config: TraitsConfig) -> Result<TraitTable, ConfigError> {
    let mut table = TraitTable::new();
    for definition in config.traits {
        if table.contains(&definition.id) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate trait id '{}'",
                definition.id
            )));
        }
        table.register(definition);
    }
    Ok(table)
}

/// Load a trait table from a TOML file
pub fn load_trait_table(path: &Path) -> Result<TraitTable, ConfigError> {
    let config: TraitsConfig = super::load_toml(path)?;
    build_table(config)
}

/// Load a trait table from a TOML string
pub fn parse_trait_table(content: &str) -> Result<TraitTable, ConfigError> {
    let config: TraitsConfig = super::parse_toml(content)?;
    build_table(config)
}
