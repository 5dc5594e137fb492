//! Combat constants configuration

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable combat constants
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombatConstants {
    #[serde(default)]
    pub brave: BraveConstants,
    #[serde(default)]
    pub damage: DamageConstants,
    #[serde(default)]
    pub hit: HitConstants,
    #[serde(default)]
    pub atb: AtbConstants,
    #[serde(default)]
    pub casting: CastingConstants,
    #[serde(default)]
    pub defend: DefendConstants,
    #[serde(default)]
    pub flee: FleeConstants,
    #[serde(default)]
    pub traits: TraitConstants,
}

impl CombatConstants {
    /// Reject values that would break the engine's bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.atb.threshold == 0 || self.atb.threshold > self.atb.max_gauge {
            return Err(ConfigError::ValidationError(format!(
                "atb.threshold must be in 1..={}, got {}",
                self.atb.max_gauge, self.atb.threshold
            )));
        }
        if self.atb.speed_divisor <= 0.0 {
            return Err(ConfigError::ValidationError(
                "atb.speed_divisor must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.damage.max_wound_fraction) {
            return Err(ConfigError::ValidationError(
                "damage.max_wound_fraction must be within 0..=1".to_string(),
            ));
        }
        if self.damage.variance_min > self.damage.variance_max {
            return Err(ConfigError::ValidationError(
                "damage.variance_min exceeds damage.variance_max".to_string(),
            ));
        }
        if self.hit.min_rate > self.hit.max_rate {
            return Err(ConfigError::ValidationError(
                "hit.min_rate exceeds hit.max_rate".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.flee.base_chance) {
            return Err(ConfigError::ValidationError(
                "flee.base_chance must be within 0..=1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BraveConstants {
    /// Init Brave gained per level above 1
    #[serde(default = "default_init_brave_per_level")]
    pub init_brave_per_level: u32,
    /// Max Brave gained per level above 1
    #[serde(default = "default_max_brave_per_level")]
    pub max_brave_per_level: u32,
    /// Used when a combatant declares no max Brave
    #[serde(default = "default_max_brave_multiplier")]
    pub max_brave_multiplier: f64,
    #[serde(default = "default_min_init_brave")]
    pub min_init_brave: u32,
    #[serde(default = "default_min_max_brave")]
    pub min_max_brave: u32,
    /// Turn-start checks a BREAK survives before clearing
    #[serde(default = "default_break_recovery_turns")]
    pub break_recovery_turns: u32,
}

impl Default for BraveConstants {
    fn default() -> Self {
        BraveConstants {
            init_brave_per_level: default_init_brave_per_level(),
            max_brave_per_level: default_max_brave_per_level(),
            max_brave_multiplier: default_max_brave_multiplier(),
            min_init_brave: default_min_init_brave(),
            min_max_brave: default_min_max_brave(),
            break_recovery_turns: default_break_recovery_turns(),
        }
    }
}

fn default_init_brave_per_level() -> u32 {
    10
}
fn default_max_brave_per_level() -> u32 {
    50
}
fn default_max_brave_multiplier() -> f64 {
    3.0
}
fn default_min_init_brave() -> u32 {
    50
}
fn default_min_max_brave() -> u32 {
    200
}
fn default_break_recovery_turns() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageConstants {
    /// BRV damage constant
    #[serde(default = "default_brv_multiplier")]
    pub brv_multiplier: f64,
    /// HP damage constant
    #[serde(default = "default_hp_multiplier")]
    pub hp_multiplier: f64,
    /// HP damage multiplier against a broken target without a trait bonus
    #[serde(default = "default_break_bonus")]
    pub break_bonus: f64,
    /// Share of HP damage converted into wound
    #[serde(default = "default_wound_rate")]
    pub wound_rate: f64,
    /// Wound can never exceed this share of max HP
    #[serde(default = "default_max_wound_fraction")]
    pub max_wound_fraction: f64,
    #[serde(default = "default_critical_multiplier")]
    pub critical_multiplier: f64,
    #[serde(default = "default_critical_base_chance")]
    pub critical_base_chance: f64,
    #[serde(default = "default_critical_cap")]
    pub critical_cap: f64,
    #[serde(default = "default_min_hp_damage")]
    pub min_hp_damage: u32,
    /// HP damage scaling per attacker level above 1
    #[serde(default = "default_level_scale")]
    pub level_scale_per_level: f64,
    #[serde(default = "default_variance_min")]
    pub variance_min: f64,
    #[serde(default = "default_variance_max")]
    pub variance_max: f64,
    /// Elemental mitigation per point of spirit when no resistance table exists
    #[serde(default = "default_elemental_mitigation_per_spirit")]
    pub elemental_mitigation_per_spirit: f64,
    #[serde(default = "default_elemental_mitigation_cap")]
    pub elemental_mitigation_cap: f64,
    /// Skill multiplier of a plain BRV attack
    #[serde(default = "default_basic_multiplier")]
    pub basic_brv_multiplier: f64,
    /// HP multiplier of a plain HP attack
    #[serde(default = "default_basic_multiplier")]
    pub basic_hp_multiplier: f64,
}

impl Default for DamageConstants {
    fn default() -> Self {
        DamageConstants {
            brv_multiplier: default_brv_multiplier(),
            hp_multiplier: default_hp_multiplier(),
            break_bonus: default_break_bonus(),
            wound_rate: default_wound_rate(),
            max_wound_fraction: default_max_wound_fraction(),
            critical_multiplier: default_critical_multiplier(),
            critical_base_chance: default_critical_base_chance(),
            critical_cap: default_critical_cap(),
            min_hp_damage: default_min_hp_damage(),
            level_scale_per_level: default_level_scale(),
            variance_min: default_variance_min(),
            variance_max: default_variance_max(),
            elemental_mitigation_per_spirit: default_elemental_mitigation_per_spirit(),
            elemental_mitigation_cap: default_elemental_mitigation_cap(),
            basic_brv_multiplier: default_basic_multiplier(),
            basic_hp_multiplier: default_basic_multiplier(),
        }
    }
}

fn default_brv_multiplier() -> f64 {
    1.5
}
fn default_hp_multiplier() -> f64 {
    0.15
}
fn default_break_bonus() -> f64 {
    1.5
}
fn default_wound_rate() -> f64 {
    0.25
}
fn default_max_wound_fraction() -> f64 {
    0.5
}
fn default_critical_multiplier() -> f64 {
    1.5
}
fn default_critical_base_chance() -> f64 {
    0.1
}
fn default_critical_cap() -> f64 {
    0.95
}
fn default_min_hp_damage() -> u32 {
    5
}
fn default_level_scale() -> f64 {
    0.3
}
fn default_variance_min() -> f64 {
    0.9
}
fn default_variance_max() -> f64 {
    1.1
}
fn default_elemental_mitigation_per_spirit() -> f64 {
    0.002
}
fn default_elemental_mitigation_cap() -> f64 {
    0.2
}
fn default_basic_multiplier() -> f64 {
    1.0
}

/// Hit rate curve, in percent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitConstants {
    #[serde(default = "default_hit_base")]
    pub base_rate: f64,
    /// Percent gained per decade of accuracy/evasion ratio
    #[serde(default = "default_hit_slope")]
    pub log_slope: f64,
    #[serde(default = "default_hit_min")]
    pub min_rate: f64,
    #[serde(default = "default_hit_max")]
    pub max_rate: f64,
}

impl Default for HitConstants {
    fn default() -> Self {
        HitConstants {
            base_rate: default_hit_base(),
            log_slope: default_hit_slope(),
            min_rate: default_hit_min(),
            max_rate: default_hit_max(),
        }
    }
}

fn default_hit_base() -> f64 {
    65.0
}
fn default_hit_slope() -> f64 {
    50.0
}
fn default_hit_min() -> f64 {
    30.0
}
fn default_hit_max() -> f64 {
    98.0
}

/// How gauge growth is derived from speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedModel {
    /// `effective_speed * delta / speed_divisor`
    #[default]
    Effective,
    /// `effective_speed / average_speed * relative_base_rate * delta`
    Relative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtbConstants {
    #[serde(default = "default_max_gauge")]
    pub max_gauge: u32,
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    #[serde(default = "default_speed_divisor")]
    pub speed_divisor: f64,
    #[serde(default = "default_confusion_factor")]
    pub confusion_factor: f64,
    #[serde(default = "default_haste_multiplier")]
    pub haste_multiplier: f64,
    #[serde(default = "default_slow_multiplier")]
    pub slow_multiplier: f64,
    #[serde(default)]
    pub speed_model: SpeedModel,
    #[serde(default = "default_relative_base_rate")]
    pub relative_base_rate: f64,
    /// Freeze every gauge while an ally is choosing an action
    #[serde(default)]
    pub wait_mode: bool,
}

impl Default for AtbConstants {
    fn default() -> Self {
        AtbConstants {
            max_gauge: default_max_gauge(),
            threshold: default_threshold(),
            speed_divisor: default_speed_divisor(),
            confusion_factor: default_confusion_factor(),
            haste_multiplier: default_haste_multiplier(),
            slow_multiplier: default_slow_multiplier(),
            speed_model: SpeedModel::default(),
            relative_base_rate: default_relative_base_rate(),
            wait_mode: false,
        }
    }
}

fn default_max_gauge() -> u32 {
    2000
}
fn default_threshold() -> u32 {
    1000
}
fn default_speed_divisor() -> f64 {
    5.0
}
fn default_confusion_factor() -> f64 {
    0.7
}
fn default_haste_multiplier() -> f64 {
    1.5
}
fn default_slow_multiplier() -> f64 {
    2.0
}
fn default_relative_base_rate() -> f64 {
    50.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastingConstants {
    /// Damage that maps to a 100% interrupt chance before the cap
    #[serde(default = "default_interrupt_damage_scale")]
    pub interrupt_damage_scale: f64,
    #[serde(default = "default_interrupt_chance_cap")]
    pub interrupt_chance_cap: f64,
}

impl Default for CastingConstants {
    fn default() -> Self {
        CastingConstants {
            interrupt_damage_scale: default_interrupt_damage_scale(),
            interrupt_chance_cap: default_interrupt_chance_cap(),
        }
    }
}

fn default_interrupt_damage_scale() -> f64 {
    100.0
}
fn default_interrupt_chance_cap() -> f64 {
    0.9
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefendConstants {
    /// Intensity of the defense buff granted by defending
    #[serde(default = "default_defend_intensity")]
    pub defense_intensity: f64,
    /// Turns the defense buff lasts, counting the defending turn's own tick
    #[serde(default = "default_defend_duration")]
    pub defense_duration: u32,
    #[serde(default = "default_focus_max_stacks")]
    pub focus_max_stacks: u8,
    #[serde(default = "default_focus_bonus_per_stack")]
    pub focus_bonus_per_stack: f64,
}

impl Default for DefendConstants {
    fn default() -> Self {
        DefendConstants {
            defense_intensity: default_defend_intensity(),
            defense_duration: default_defend_duration(),
            focus_max_stacks: default_focus_max_stacks(),
            focus_bonus_per_stack: default_focus_bonus_per_stack(),
        }
    }
}

fn default_defend_intensity() -> f64 {
    1.5
}
fn default_defend_duration() -> u32 {
    2
}
fn default_focus_max_stacks() -> u8 {
    3
}
fn default_focus_bonus_per_stack() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleeConstants {
    #[serde(default = "default_flee_chance")]
    pub base_chance: f64,
}

impl Default for FleeConstants {
    fn default() -> Self {
        FleeConstants {
            base_chance: default_flee_chance(),
        }
    }
}

fn default_flee_chance() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitConstants {
    #[serde(default = "default_mp_cost_reduction_cap")]
    pub mp_cost_reduction_cap: f64,
    #[serde(default = "default_damage_reduction_cap")]
    pub damage_reduction_cap: f64,
}

impl Default for TraitConstants {
    fn default() -> Self {
        TraitConstants {
            mp_cost_reduction_cap: default_mp_cost_reduction_cap(),
            damage_reduction_cap: default_damage_reduction_cap(),
        }
    }
}

fn default_mp_cost_reduction_cap() -> f64 {
    1.0
}
fn default_damage_reduction_cap() -> f64 {
    0.9
}

/// Load and validate constants from a TOML file
pub fn load_constants(path: &Path) -> Result<CombatConstants, ConfigError> {
    let constants: CombatConstants = super::load_toml(path)?;
    constants.validate()?;
    Ok(constants)
}

/// Load and validate constants from a TOML string
pub fn parse_constants(content: &str) -> Result<CombatConstants, ConfigError> {
    let constants: CombatConstants = super::parse_toml(content)?;
    constants.validate()?;
    Ok(constants)
}

/// Constants shipped with the crate
pub fn default_constants() -> CombatConstants {
    let toml = include_str!("../../config/constants.toml");
    parse_constants(toml).unwrap_or_default()
}
