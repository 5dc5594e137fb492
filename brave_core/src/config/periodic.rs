//! Periodic status configuration loading

use super::ConfigError;
use crate::status::{PeriodicConfig, PeriodicRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Container for periodic status configurations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicTableConfig {
    #[serde(rename = "periodic")]
    pub periodic: Vec<PeriodicConfig>,
}

fn build_registry(config: PeriodicTableConfig) -> Result<PeriodicRegistry, ConfigError> {
    let mut registry = PeriodicRegistry::new();
    for entry in config.periodic {
        if entry.rate < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "negative periodic rate for {:?}",
                entry.kind
            )));
        }
        registry.register(entry);
    }
    Ok(registry)
}

/// Load periodic configurations from a TOML file
pub fn load_periodic_configs(path: &Path) -> Result<PeriodicRegistry, ConfigError> {
    let config: PeriodicTableConfig = super::load_toml(path)?;
    build_registry(config)
}

/// Load periodic configurations from a TOML string
pub fn parse_periodic_configs(content: &str) -> Result<PeriodicRegistry, ConfigError> {
    let config: PeriodicTableConfig = super::parse_toml(content)?;
    build_registry(config)
}

/// Periodic configurations shipped with the crate
pub fn default_periodic() -> PeriodicRegistry {
    let toml = include_str!("../../config/periodic.toml");
    parse_periodic_configs(toml).unwrap_or_else(|_| PeriodicRegistry::with_defaults())
}
