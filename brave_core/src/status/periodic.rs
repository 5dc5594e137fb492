//! Periodic statuses - damage and healing resolved once per turn

use super::kind::StatusKind;
use super::StatusRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Resource a periodic status drains or restores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodicResource {
    Hp,
    Mp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodicEffect {
    Damage,
    Heal,
}

/// How much a periodic status moves per turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicConfig {
    pub kind: StatusKind,
    pub resource: PeriodicResource,
    pub effect: PeriodicEffect,
    /// Fraction of the resource's maximum per point of strength
    pub rate: f64,
    /// Smallest non-zero amount a tick can move
    #[serde(default = "default_min_amount")]
    pub min_amount: u32,
}

fn default_min_amount() -> u32 {
    1
}

impl PeriodicConfig {
    pub fn damage(kind: StatusKind, resource: PeriodicResource, rate: f64) -> Self {
        PeriodicConfig {
            kind,
            resource,
            effect: PeriodicEffect::Damage,
            rate,
            min_amount: 1,
        }
    }

    pub fn heal(kind: StatusKind, resource: PeriodicResource, rate: f64) -> Self {
        PeriodicConfig {
            kind,
            resource,
            effect: PeriodicEffect::Heal,
            rate,
            min_amount: 1,
        }
    }

    /// Amount moved for one tick at the given strength
    pub fn amount(&self, maximum: u32, strength: f64) -> u32 {
        if maximum == 0 || strength <= 0.0 || self.rate <= 0.0 {
            return 0;
        }
        let raw = (maximum as f64 * self.rate * strength).floor() as u32;
        raw.max(self.min_amount)
    }
}

/// Registry of periodic status behaviour
#[derive(Debug, Clone, Default)]
pub struct PeriodicRegistry {
    configs: HashMap<StatusKind, PeriodicConfig>,
}

impl PeriodicRegistry {
    pub fn new() -> Self {
        PeriodicRegistry {
            configs: HashMap::new(),
        }
    }

    pub fn register(&mut self, config: PeriodicConfig) {
        self.configs.insert(config.kind, config);
    }

    pub fn get(&self, kind: StatusKind) -> Option<&PeriodicConfig> {
        self.configs.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Default damage-over-time and heal-over-time rates
    pub fn with_defaults() -> Self {
        use PeriodicResource::{Hp, Mp};
        let mut registry = Self::new();

        registry.register(PeriodicConfig::damage(StatusKind::Poison, Hp, 0.05));
        registry.register(PeriodicConfig::damage(StatusKind::Burn, Hp, 0.06));
        registry.register(PeriodicConfig::damage(StatusKind::Bleed, Hp, 0.04));
        registry.register(PeriodicConfig::damage(StatusKind::Corrode, Hp, 0.03));
        registry.register(PeriodicConfig::damage(StatusKind::Disease, Hp, 0.03));
        registry.register(PeriodicConfig::damage(StatusKind::Necrosis, Hp, 0.05));
        registry.register(PeriodicConfig::damage(StatusKind::Chill, Hp, 0.02));
        registry.register(PeriodicConfig::damage(StatusKind::Shock, Hp, 0.03));
        registry.register(PeriodicConfig::damage(StatusKind::NatureCurse, Hp, 0.04));
        registry.register(PeriodicConfig::damage(StatusKind::MpDrain, Mp, 0.05));

        registry.register(PeriodicConfig::heal(StatusKind::Regeneration, Hp, 0.05));
        registry.register(PeriodicConfig::heal(StatusKind::MpRegen, Mp, 0.05));
        registry.register(PeriodicConfig::heal(StatusKind::ManaRegeneration, Mp, 0.05));

        registry
    }
}

/// One periodic status resolving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodicTick {
    pub kind: StatusKind,
    pub resource: PeriodicResource,
    pub effect: PeriodicEffect,
    pub amount: u32,
}

/// Everything the periodic statuses on one combatant want to do this turn
#[derive(Debug, Clone, Default)]
pub struct PeriodicTickResult {
    pub ticks: Vec<PeriodicTick>,
}

impl PeriodicTickResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self, resource: PeriodicResource, effect: PeriodicEffect) -> u32 {
        self.ticks
            .iter()
            .filter(|t| t.resource == resource && t.effect == effect)
            .map(|t| t.amount)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

/// Work out this turn's periodic amounts without touching the combatant
pub fn process_periodic(
    statuses: &StatusRegistry,
    registry: &PeriodicRegistry,
    max_hp: u32,
    max_mp: u32,
) -> PeriodicTickResult {
    let mut result = PeriodicTickResult::new();

    for effect in statuses.iter() {
        let Some(config) = registry.get(effect.kind) else {
            continue;
        };
        let maximum = match config.resource {
            PeriodicResource::Hp => max_hp,
            PeriodicResource::Mp => max_mp,
        };
        let amount = config.amount(maximum, effect.strength());
        if amount > 0 {
            result.ticks.push(PeriodicTick {
                kind: effect.kind,
                resource: config.resource,
                effect: config.effect,
                amount,
            });
        }
    }

    result
}
