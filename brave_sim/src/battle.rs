//! Battle files - the two sides of a fight, described in TOML

use anyhow::{bail, Context, Result};
use brave_core::combatant::{Combatant, GimmickState, StatSet};
use brave_core::config::{default_skills, load_toml};
use brave_core::skill::Skill;
use brave_core::types::{CombatantId, Side};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct BattleFile {
    /// Used when no seed is given on the command line
    #[serde(default)]
    pub seed: Option<u64>,
    pub allies: Vec<CombatantSpec>,
    pub enemies: Vec<CombatantSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CombatantSpec {
    pub id: u32,
    pub name: String,
    #[serde(default = "default_level")]
    pub level: u32,
    pub hp: u32,
    #[serde(default)]
    pub mp: u32,
    #[serde(default = "default_brave")]
    pub brave: u32,
    #[serde(default)]
    pub max_brave: u32,
    #[serde(default)]
    pub stats: StatSet,
    #[serde(default)]
    pub traits: Vec<String>,
    /// Skill ids from the built-in skill table
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub gimmick: GimmickState,
}

fn default_level() -> u32 {
    1
}

fn default_brave() -> u32 {
    100
}

impl CombatantSpec {
    pub fn build(&self, side: Side) -> Combatant {
        let mut combatant =
            Combatant::new(CombatantId(self.id), &self.name, side, self.stats.clone())
                .with_level(self.level)
                .with_hp(self.hp)
                .with_mp(self.mp)
                .with_brave(self.brave, self.max_brave)
                .with_gimmick(self.gimmick.clone());
        combatant.traits = self.traits.clone();
        combatant
    }
}

impl BattleFile {
    pub fn load(path: &Path) -> Result<Self> {
        let battle: BattleFile = load_toml(path)
            .with_context(|| format!("failed to load battle file {}", path.display()))?;
        battle.validate()?;
        Ok(battle)
    }

    fn validate(&self) -> Result<()> {
        if self.allies.is_empty() || self.enemies.is_empty() {
            bail!("a battle needs at least one ally and one enemy");
        }
        let mut seen = HashSet::new();
        for spec in self.allies.iter().chain(&self.enemies) {
            if !seen.insert(spec.id) {
                bail!("combatant id {} is used twice", spec.id);
            }
        }
        Ok(())
    }

    pub fn allies(&self) -> Vec<Combatant> {
        self.allies.iter().map(|s| s.build(Side::Ally)).collect()
    }

    pub fn enemies(&self) -> Vec<Combatant> {
        self.enemies.iter().map(|s| s.build(Side::Enemy)).collect()
    }

    /// Each combatant's skills, resolved against the built-in table
    pub fn loadouts(&self) -> Result<HashMap<CombatantId, Vec<Skill>>> {
        let table = default_skills();
        let mut loadouts = HashMap::new();
        for spec in self.allies.iter().chain(&self.enemies) {
            let mut skills = Vec::with_capacity(spec.skills.len());
            for id in &spec.skills {
                let skill = table
                    .get(id)
                    .with_context(|| format!("{} knows unknown skill '{}'", spec.name, id))?;
                skills.push(skill.clone());
            }
            loadouts.insert(CombatantId(spec.id), skills);
        }
        Ok(loadouts)
    }
}
