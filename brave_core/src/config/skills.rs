//! Skill configuration loading

use super::ConfigError;
use crate::skill::Skill;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Container for skill configurations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsConfig {
    #[serde(rename = "skills")]
    pub skills: Vec<Skill>,
}

fn build_map(config: SkillsConfig) -> Result<HashMap<String, Skill>, ConfigError> {
    let mut map = HashMap::new();
    for skill in config.skills {
        if skill.cast_time_ratio < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "skill '{}' has a negative cast time",
                skill.id
            )));
        }
        map.insert(skill.id.clone(), skill);
    }
    Ok(map)
}

/// Load skill configurations from a TOML file
pub fn load_skill_configs(path: &Path) -> Result<HashMap<String, Skill>, ConfigError> {
    let config: SkillsConfig = super::load_toml(path)?;
    build_map(config)
}

/// Load skill configurations from a TOML string
pub fn parse_skill_configs(content: &str) -> Result<HashMap<String, Skill>, ConfigError> {
    let config: SkillsConfig = super::parse_toml(content)?;
    build_map(config)
}

/// Get default skill configurations
pub fn default_skills() -> HashMap<String, Skill> {
    let toml = include_str!("../../config/skills.toml");
    parse_skill_configs(toml).unwrap_or_else(|_| {
        let mut map = HashMap::new();
        map.insert("slash".to_string(), Skill::new("slash", "Slash"));
        map
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::SkillEffect;
    use crate::status::StatusKind;
    use crate::types::{DamageKind, Element};

    #[test]
    fn test_parse_skills() {
        let toml = r#"
[[skills]]
id = "firaga"
name = "Firaga"
multiplier = 2.2
mp_cost = 24
cast_time_ratio = 0.6
damage_kind = "magical"
element = "fire"

[skills.effect]
type = "brv_hp_attack"

[skills.metadata]
pierce = 0.2
"#;

        let skills = parse_skill_configs(toml).unwrap();
        let firaga = &skills["firaga"];
        assert_eq!(firaga.name, "Firaga");
        assert_eq!(firaga.effect, SkillEffect::BrvHpAttack);
        assert_eq!(firaga.damage_kind, DamageKind::Magical);
        assert_eq!(firaga.element, Some(Element::Fire));
        assert!((firaga.hp_multiplier - 1.0).abs() < f64::EPSILON);
        assert!(firaga.interruptible);
        assert!(firaga.is_cast());
        assert!((firaga.attack_options().pierce - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_skills_loads_all() {
        let skills = default_skills();
        let expected = [
            "slash",
            "rush",
            "cross_cut",
            "fire",
            "blizzara",
            "thundaga",
            "cure",
            "poison_edge",
            "protect",
            "brave_song",
        ];
        assert_eq!(skills.len(), expected.len(), "Expected every skill from config");
        for id in expected {
            assert!(skills.contains_key(id), "Missing skill: {}", id);
        }
        assert_eq!(
            skills["poison_edge"].effect,
            SkillEffect::ApplyStatus {
                status: StatusKind::Poison,
                duration: 3,
                intensity: 1.0
            }
        );
    }
}
