//! Auto-battle policy used for both sides

use brave_core::combat::{Action, CombatSession};
use brave_core::combatant::Combatant;
use brave_core::skill::{Skill, SkillEffect};
use brave_core::types::{ActionKind, CombatantId};
use std::collections::HashMap;

/// HP fraction below which a combatant heals itself if it can
const HEAL_BELOW: f64 = 0.35;

/// Picks actions from the current session state
#[derive(Debug, Clone, Default)]
pub struct AutoPolicy {
    loadouts: HashMap<CombatantId, Vec<Skill>>,
}

impl AutoPolicy {
    pub fn new(loadouts: HashMap<CombatantId, Vec<Skill>>) -> Self {
        AutoPolicy { loadouts }
    }

    fn skills(&self, actor: CombatantId) -> &[Skill] {
        self.loadouts.get(&actor).map(Vec::as_slice).unwrap_or(&[])
    }

    fn affordable<'a>(&'a self, me: &'a Combatant) -> impl Iterator<Item = &'a Skill> + 'a {
        self.skills(me.id)
            .iter()
            .filter(move |s| s.mp_cost <= me.current_mp)
    }

    /// Choose what `actor` does with its turn
    pub fn choose(&self, session: &CombatSession, actor: CombatantId) -> Action {
        let Some(me) = session.combatant(actor) else {
            return Action::Defend;
        };

        if me.hp_fraction() < HEAL_BELOW {
            if let Some(heal) = self
                .affordable(me)
                .find(|s| matches!(s.effect, SkillEffect::Heal { .. }))
            {
                return Action::Skill {
                    skill: heal.clone(),
                    target: None,
                };
            }
        }

        // Finish broken targets first, then whoever is lowest
        let mut targets: Vec<&Combatant> = session
            .valid_targets(actor, ActionKind::BrvAttack)
            .into_iter()
            .filter_map(|id| session.combatant(id))
            .collect();
        targets.sort_by_key(|c| (!c.brave.is_broken, c.current_hp));
        let Some(target) = targets.first() else {
            return Action::Defend;
        };

        if me.brave.current > 0
            && (target.brave.is_broken || me.brave.current >= me.brave.init.saturating_mul(2))
        {
            return Action::HpAttack { target: target.id };
        }

        let casting = session.casting().is_casting(actor);
        if !casting && me.brave.current < me.brave.init {
            if let Some(skill) = self
                .affordable(me)
                .filter(|s| s.effect.is_offensive())
                .max_by(|a, b| a.multiplier.total_cmp(&b.multiplier))
            {
                return Action::Skill {
                    skill: skill.clone(),
                    target: Some(target.id),
                };
            }
        }

        Action::BrvAttack { target: target.id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brave_core::combat::SessionConfig;
    use brave_core::combatant::StatSet;
    use brave_core::types::Side;

    fn make_session(ally_hp: u32) -> CombatSession {
        let mut ally = Combatant::new(CombatantId(1), "Vaan", Side::Ally, StatSet::default())
            .with_hp(400)
            .with_mp(30);
        ally.current_hp = ally_hp;
        let enemies = vec![
            Combatant::new(CombatantId(2), "Flan", Side::Enemy, StatSet::default()).with_hp(300),
            Combatant::new(CombatantId(3), "Bomb", Side::Enemy, StatSet::default()).with_hp(100),
        ];
        let mut session = CombatSession::new(vec![ally], enemies, SessionConfig::default());
        session.start().unwrap();
        session
    }

    fn cure() -> Skill {
        Skill::new("cure", "Cure")
            .with_mp_cost(10)
            .with_effect(SkillEffect::Heal { fraction: 0.3 })
    }

    #[test]
    fn test_heals_when_low() {
        let session = make_session(50);
        let policy = AutoPolicy::new(HashMap::from([(CombatantId(1), vec![cure()])]));
        assert!(matches!(
            policy.choose(&session, CombatantId(1)),
            Action::Skill { target: None, .. }
        ));
    }

    #[test]
    fn test_builds_brave_on_weakest() {
        let session = make_session(400);
        let policy = AutoPolicy::default();
        assert_eq!(
            policy.choose(&session, CombatantId(1)),
            Action::BrvAttack {
                target: CombatantId(3)
            }
        );
    }
}
