//! Skill execution

use super::{Skill, SkillEffect};
use crate::brave::{BraveLedger, BrvAttackResult, HpAttackResult, Strike};
use crate::combat::{CombatEvent, EventSink};
use crate::combatant::Combatant;
use crate::status::{StatusEffect, StatusKind};
use crate::traits::{TraitContext, TraitEngine};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Session services a skill may use while resolving
pub struct SkillContext<'a> {
    pub ledger: &'a BraveLedger,
    pub traits: &'a TraitEngine,
    pub trait_context: &'a TraitContext,
    pub rng: &'a mut dyn RngCore,
    pub events: &'a mut dyn EventSink,
}

/// What a skill did. Side effects are already applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub brv: Option<BrvAttackResult>,
    #[serde(default)]
    pub hp: Option<HpAttackResult>,
    #[serde(default)]
    pub healed: u32,
    #[serde(default)]
    pub statuses_applied: Vec<StatusKind>,
}

impl SkillOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        SkillOutcome {
            success: false,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn succeeded(message: impl Into<String>) -> Self {
        SkillOutcome {
            success: true,
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Resolves a skill against its user and target
///
/// `target` is `None` when the skill targets its user.
pub trait SkillExecutor {
    fn execute(
        &mut self,
        skill: &Skill,
        user: &mut Combatant,
        target: Option<&mut Combatant>,
        context: &mut SkillContext<'_>,
    ) -> SkillOutcome;
}

/// Executor for the effects in [`SkillEffect`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicSkillExecutor;

impl BasicSkillExecutor {
    fn heal(target: &mut Combatant, fraction: f64, events: &mut dyn EventSink) -> u32 {
        let old = target.current_hp;
        let amount = (target.max_hp as f64 * fraction.max(0.0)).floor() as u32;
        let healed = target.heal(amount);
        if healed > 0 {
            events.emit(&CombatEvent::HpChanged {
                combatant: target.id,
                old,
                new: target.current_hp,
            });
        }
        healed
    }

    fn apply_status(
        user: crate::types::CombatantId,
        target: &mut Combatant,
        status: StatusKind,
        duration: u32,
        intensity: f64,
        events: &mut dyn EventSink,
    ) {
        let effect = StatusEffect::new(status, duration, intensity).with_source(user);
        target.statuses.add(effect, true);
        let Some(duration) = target.statuses.get(status).map(|e| e.duration) else {
            return;
        };
        events.emit(&CombatEvent::StatusApplied {
            combatant: target.id,
            kind: status,
            duration,
        });
    }
}

impl SkillExecutor for BasicSkillExecutor {
    fn execute(
        &mut self,
        skill: &Skill,
        user: &mut Combatant,
        target: Option<&mut Combatant>,
        context: &mut SkillContext<'_>,
    ) -> SkillOutcome {
        let options = skill.attack_options();
        let brv_strike = Strike {
            traits: context.traits,
            context: context.trait_context,
            options: &options,
            multiplier: skill.multiplier,
        };
        let hp_strike = Strike {
            multiplier: skill.hp_multiplier,
            ..brv_strike
        };

        match (&skill.effect, target) {
            (SkillEffect::BrvAttack, Some(target)) => {
                let result = context.ledger.brv_strike(
                    user,
                    target,
                    &brv_strike,
                    &mut context.rng,
                    &mut *context.events,
                );
                let message = if result.miss {
                    format!("{} missed", skill.name)
                } else {
                    format!("{} stole {} Brave", skill.name, result.stolen)
                };
                SkillOutcome {
                    brv: Some(result),
                    ..SkillOutcome::succeeded(message)
                }
            }
            (SkillEffect::HpAttack, Some(target)) => {
                match context.ledger.hp_attack(
                    user,
                    target,
                    &hp_strike,
                    &mut context.rng,
                    &mut *context.events,
                ) {
                    Ok(result) => SkillOutcome {
                        message: format!("{} dealt {} damage", skill.name, result.hp_damage),
                        hp: Some(result),
                        ..SkillOutcome::succeeded("")
                    },
                    Err(err) => SkillOutcome::failed(err.to_string()),
                }
            }
            (SkillEffect::BrvHpAttack, Some(target)) => {
                let result = context.ledger.brv_hp_attack(
                    user,
                    target,
                    &brv_strike,
                    &hp_strike,
                    &mut context.rng,
                    &mut *context.events,
                );
                let damage = result.hp.as_ref().map_or(0, |hp| hp.hp_damage);
                SkillOutcome {
                    brv: Some(result.brv),
                    hp: result.hp,
                    ..SkillOutcome::succeeded(format!("{} dealt {} damage", skill.name, damage))
                }
            }
            (SkillEffect::Heal { fraction }, target) => {
                let healed = match target {
                    Some(target) => Self::heal(target, *fraction, &mut *context.events),
                    None => Self::heal(user, *fraction, &mut *context.events),
                };
                SkillOutcome {
                    healed,
                    ..SkillOutcome::succeeded(format!("{} restored {} HP", skill.name, healed))
                }
            }
            (
                SkillEffect::ApplyStatus {
                    status,
                    duration,
                    intensity,
                },
                target,
            ) => {
                let user_id = user.id;
                let recipient = match target {
                    Some(target) => target,
                    None => user,
                };
                Self::apply_status(
                    user_id,
                    recipient,
                    *status,
                    *duration,
                    *intensity,
                    &mut *context.events,
                );
                SkillOutcome {
                    statuses_applied: vec![*status],
                    ..SkillOutcome::succeeded(format!("{} applied {:?}", skill.name, status))
                }
            }
            (SkillEffect::BraveUp { amount }, target) => {
                let recipient = match target {
                    Some(target) => target,
                    None => user,
                };
                let restored =
                    context
                        .ledger
                        .restore_brave(recipient, *amount, &mut *context.events);
                SkillOutcome::succeeded(format!("{} restored {} Brave", skill.name, restored))
            }
            (_, None) => SkillOutcome::failed(format!("{} needs a target", skill.name)),
        }
    }
}
