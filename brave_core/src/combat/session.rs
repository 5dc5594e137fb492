//! CombatSession - one battle, from start to teardown
//!
//! The session owns the combatants for the battle's lifetime together with the
//! scheduler, cast registry and Brave ledger. Every mutating call is atomic:
//! it validates before it mutates, so Brave, HP and gauge bounds hold after
//! any call regardless of what the caller asked for.

use super::action::{Action, ActionResult, ItemEffect};
use super::error::{CombatError, Resource};
use super::events::{CombatEvent, EventBus, EventSink};
use super::state::CombatState;
use crate::atb::TurnScheduler;
use crate::brave::{BraveLedger, BrvAttackResult, HpAttackResult, Strike};
use crate::casting::{CastInfo, CastingRegistry};
use crate::combatant::{trait_adjusted, Combatant};
use crate::config::CombatConstants;
use crate::damage::AttackOptions;
use crate::skill::{BasicSkillExecutor, Skill, SkillContext, SkillEffect, SkillExecutor, SkillOutcome};
use crate::status::{
    process_periodic, PeriodicEffect, PeriodicRegistry, PeriodicResource, StatusCategory,
    StatusEffect, StatusKind,
};
use crate::traits::{TraitContext, TraitEngine};
use crate::types::{ActionKind, CombatantId, Side, StatKind};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared read-only inputs for a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub constants: Arc<CombatConstants>,
    pub traits: Arc<TraitEngine>,
    pub periodic: Arc<PeriodicRegistry>,
    /// Seed for the session's RNG
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            constants: Arc::new(CombatConstants::default()),
            traits: Arc::new(TraitEngine::default()),
            periodic: Arc::new(PeriodicRegistry::with_defaults()),
            seed: 0,
        }
    }
}

impl SessionConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// What happened when a turn opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnStart {
    pub actor: CombatantId,
    pub turn: u32,
    pub brave_restored: u32,
}

#[derive(Debug, Clone, Copy)]
enum AttackPhases {
    Brv,
    Hp,
    BrvHp,
}

/// Resource values before a change, for emitting change events
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    id: CombatantId,
    hp: u32,
    mp: u32,
    brave: u32,
}

impl Snapshot {
    fn of(combatant: &Combatant) -> Self {
        Snapshot {
            id: combatant.id,
            hp: combatant.current_hp,
            mp: combatant.current_mp,
            brave: combatant.brave.current,
        }
    }

    fn emit_diff(&self, combatant: &Combatant, events: &mut dyn EventSink) {
        if combatant.current_hp != self.hp {
            events.emit(&CombatEvent::HpChanged {
                combatant: self.id,
                old: self.hp,
                new: combatant.current_hp,
            });
        }
        if combatant.current_mp != self.mp {
            events.emit(&CombatEvent::MpChanged {
                combatant: self.id,
                old: self.mp,
                new: combatant.current_mp,
            });
        }
        if combatant.brave.current != self.brave {
            events.emit(&CombatEvent::BraveChanged {
                combatant: self.id,
                old: self.brave,
                new: combatant.brave.current,
            });
        }
    }
}

/// Mutable access to two distinct combatants
fn pair_mut(
    roster: &mut [Combatant],
    a: CombatantId,
    b: CombatantId,
) -> Option<(&mut Combatant, &mut Combatant)> {
    let ia = roster.iter().position(|c| c.id == a)?;
    let ib = roster.iter().position(|c| c.id == b)?;
    if ia == ib {
        return None;
    }
    if ia < ib {
        let (left, right) = roster.split_at_mut(ib);
        Some((&mut left[ia], &mut right[0]))
    } else {
        let (left, right) = roster.split_at_mut(ia);
        Some((&mut right[0], &mut left[ib]))
    }
}

/// A single battle
pub struct CombatSession {
    state: CombatState,
    turn_count: u32,
    allies: Vec<CombatantId>,
    enemies: Vec<CombatantId>,
    roster: Vec<Combatant>,
    constants: Arc<CombatConstants>,
    traits: Arc<TraitEngine>,
    periodic: Arc<PeriodicRegistry>,
    ledger: BraveLedger,
    scheduler: TurnScheduler,
    casting: CastingRegistry,
    executor: Box<dyn SkillExecutor>,
    rng: ChaCha8Rng,
    events: EventBus,
    current_actor: Option<CombatantId>,
    /// Combatants whose death has been settled
    fallen: HashSet<CombatantId>,
}

impl fmt::Debug for CombatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatSession")
            .field("state", &self.state)
            .field("turn_count", &self.turn_count)
            .field("allies", &self.allies)
            .field("enemies", &self.enemies)
            .field("current_actor", &self.current_actor)
            .finish_non_exhaustive()
    }
}

impl CombatSession {
    /// Build a session. Combatants are forced onto the side they were passed
    /// in; a repeated id is dropped.
    pub fn new(allies: Vec<Combatant>, enemies: Vec<Combatant>, config: SessionConfig) -> Self {
        let mut roster: Vec<Combatant> = Vec::with_capacity(allies.len() + enemies.len());
        let mut ally_ids = Vec::new();
        let mut enemy_ids = Vec::new();

        for (side, group) in [(Side::Ally, allies), (Side::Enemy, enemies)] {
            for mut combatant in group {
                if roster.iter().any(|c| c.id == combatant.id) {
                    warn!(combatant = %combatant.id, "duplicate combatant id dropped");
                    continue;
                }
                combatant.side = side;
                match side {
                    Side::Ally => ally_ids.push(combatant.id),
                    Side::Enemy => enemy_ids.push(combatant.id),
                }
                roster.push(combatant);
            }
        }

        let constants = config.constants;
        CombatSession {
            state: CombatState::NotStarted,
            turn_count: 0,
            allies: ally_ids,
            enemies: enemy_ids,
            roster,
            ledger: BraveLedger::new(
                constants.brave.clone(),
                constants.damage.clone(),
                constants.hit.clone(),
            ),
            scheduler: TurnScheduler::new(constants.atb.clone()),
            casting: CastingRegistry::new(constants.casting.clone()),
            constants,
            traits: config.traits,
            periodic: config.periodic,
            executor: Box::new(BasicSkillExecutor),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            events: EventBus::new(),
            current_actor: None,
            fallen: HashSet::new(),
        }
    }

    /// Replace the skill executor
    pub fn with_executor(mut self, executor: Box<dyn SkillExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn state(&self) -> CombatState {
        self.state
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn allies(&self) -> &[CombatantId] {
        &self.allies
    }

    pub fn enemies(&self) -> &[CombatantId] {
        &self.enemies
    }

    pub fn current_actor(&self) -> Option<CombatantId> {
        self.current_actor
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.roster
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.roster.iter().find(|c| c.id == id)
    }

    pub fn scheduler(&self) -> &TurnScheduler {
        &self.scheduler
    }

    pub fn casting(&self) -> &CastingRegistry {
        &self.casting
    }

    pub fn constants(&self) -> &CombatConstants {
        &self.constants
    }

    /// Forward every future event to `sink`
    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.events.subscribe(sink);
    }

    /// Drain events buffered since the last call
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        self.events.take()
    }

    fn index_of(&self, id: CombatantId) -> Result<usize, CombatError> {
        self.roster
            .iter()
            .position(|c| c.id == id)
            .ok_or(CombatError::UnknownCombatant(id))
    }

    fn ensure_active(&self) -> Result<(), CombatError> {
        if self.state.is_active() {
            Ok(())
        } else {
            Err(CombatError::CombatNotActive(self.state))
        }
    }

    fn transition(&mut self, next: CombatState) {
        if self.state == next || !self.state.can_transition_to(next) {
            return;
        }
        debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
        if next.is_terminal() {
            info!(outcome = ?next, turns = self.turn_count, "combat ended");
            self.current_actor = None;
            self.events.emit(&CombatEvent::CombatEnded { outcome: next });
        }
    }

    /// Initialize Brave, trait maximums and gauges, then go live
    pub fn start(&mut self) -> Result<(), CombatError> {
        if self.state != CombatState::NotStarted {
            return Err(CombatError::CombatNotActive(self.state));
        }

        let traits = Arc::clone(&self.traits);
        let context = TraitContext {
            combat_start: true,
            ..TraitContext::new()
        };

        for combatant in &mut self.roster {
            combatant.apply_trait_maximums(&traits, &context);
            self.ledger.initialize(combatant, &traits, &context);

            let speed = trait_adjusted(combatant, StatKind::Speed, &traits, &context);
            self.scheduler.register(combatant.id, speed);
            self.scheduler.boost(combatant.id, traits.atb_boost(combatant, &context));
            self.scheduler.sync_statuses(combatant.id, &combatant.statuses);
            self.scheduler.set_alive(combatant.id, combatant.is_alive);
            if !combatant.is_alive {
                self.fallen.insert(combatant.id);
            }
        }

        self.transition(CombatState::InProgress);
        info!(
            allies = self.allies.len(),
            enemies = self.enemies.len(),
            "combat started"
        );
        self.events.emit(&CombatEvent::CombatStarted {
            allies: self.allies.clone(),
            enemies: self.enemies.clone(),
        });
        self.check_outcome();
        Ok(())
    }

    /// Advance gauges and resolve completed casts. Returns who can act.
    pub fn tick(&mut self, delta: f64) -> Result<Vec<CombatantId>, CombatError> {
        self.ensure_active()?;

        let waiting = self.constants.atb.wait_mode && self.state == CombatState::PlayerTurn;
        self.scheduler.set_paused(waiting);
        self.scheduler.tick(delta, &mut self.casting, &mut self.events);

        if self.current_actor.is_none() {
            for actor in self.scheduler.take_lost_turns() {
                if !self.state.is_active() {
                    break;
                }
                self.lose_turn(actor);
            }
        }

        for cast in self.casting.take_completed() {
            if !self.state.is_active() {
                break;
            }
            self.resolve_cast(cast);
        }

        if self.state.is_active() {
            Ok(self.scheduler.ready_order())
        } else {
            Ok(Vec::new())
        }
    }

    /// Open `actor`'s turn: count it and run turn-start Brave recovery.
    /// Calling it again for the same open turn does nothing.
    pub fn begin_turn(&mut self, actor: CombatantId) -> Result<TurnStart, CombatError> {
        self.ensure_active()?;
        let index = self.index_of(actor)?;

        if self.current_actor == Some(actor) {
            return Ok(TurnStart {
                actor,
                turn: self.turn_count,
                brave_restored: 0,
            });
        }
        if let Some(previous) = self.current_actor {
            self.end_turn(previous);
        }

        self.turn_count += 1;
        self.current_actor = Some(actor);
        let next = match self.roster[index].side {
            Side::Ally => CombatState::PlayerTurn,
            Side::Enemy => CombatState::EnemyTurn,
        };
        self.transition(next);
        self.events.emit(&CombatEvent::TurnStarted {
            combatant: actor,
            turn: self.turn_count,
        });

        let combatant = &mut self.roster[index];
        combatant.is_defending = false;
        let brave_restored = self.ledger.recover_init_brave(combatant, &mut self.events);
        debug!(combatant = %actor, turn = self.turn_count, brave_restored, "turn started");

        Ok(TurnStart {
            actor,
            turn: self.turn_count,
            brave_restored,
        })
    }

    /// A frozen combatant's turn passes without an action: Brave recovers
    /// and durations tick, as for any blocked actor
    fn lose_turn(&mut self, actor: CombatantId) {
        let Ok(index) = self.index_of(actor) else {
            return;
        };
        if !self.roster[index].is_alive {
            return;
        }

        self.turn_count += 1;
        self.events.emit(&CombatEvent::TurnStarted {
            combatant: actor,
            turn: self.turn_count,
        });
        let combatant = &mut self.roster[index];
        combatant.is_defending = false;
        self.ledger.recover_init_brave(combatant, &mut self.events);
        info!(combatant = %actor, turn = self.turn_count, "turn lost to status");

        self.tick_statuses(index);
        self.events.emit(&CombatEvent::TurnEnded {
            combatant: actor,
            turn: self.turn_count,
        });
    }

    fn end_turn(&mut self, actor: CombatantId) {
        self.events.emit(&CombatEvent::TurnEnded {
            combatant: actor,
            turn: self.turn_count,
        });
        if self.current_actor == Some(actor) {
            self.current_actor = None;
        }
        if self.state.is_active() {
            self.transition(CombatState::InProgress);
        }
    }

    /// Run one action for `actor`
    ///
    /// A dead or status-blocked actor still loses its turn: durations tick
    /// and the gauge is consumed before the error is returned. Any other
    /// failure leaves the gauge and turn hooks untouched.
    pub fn execute_action(
        &mut self,
        actor: CombatantId,
        action: Action,
    ) -> Result<ActionResult, CombatError> {
        self.ensure_active()?;
        let index = self.index_of(actor)?;
        self.begin_turn(actor)?;

        let rejection = if !self.roster[index].is_alive {
            Some(CombatError::ActorDead(actor))
        } else if !self.roster[index].statuses.can_act() {
            Some(CombatError::ActorBlocked(actor))
        } else {
            None
        };
        if let Some(err) = rejection {
            warn!(combatant = %actor, error = %err, "action rejected");
            self.tick_statuses(index);
            self.scheduler.consume(actor);
            self.end_turn(actor);
            return Err(err);
        }

        let kind = action.kind();
        let mut result = ActionResult::new(actor, kind, action.target());
        let dispatched = match action {
            Action::BrvAttack { target } => {
                self.attack(actor, target, AttackPhases::Brv, &mut result)
            }
            Action::HpAttack { target } => self.attack(actor, target, AttackPhases::Hp, &mut result),
            Action::BrvHpAttack { target } => {
                self.attack(actor, target, AttackPhases::BrvHp, &mut result)
            }
            Action::Skill { skill, target } => self.use_skill(actor, skill, target, &mut result),
            Action::Item { item, target } => self.use_item(actor, item, target, &mut result),
            Action::Defend => self.defend(actor, &mut result),
            Action::Flee => self.flee(actor, &mut result),
        };
        if let Err(err) = dispatched {
            warn!(combatant = %actor, ?kind, error = %err, "action failed");
            return Err(err);
        }

        self.finish_turn(actor, &mut result);
        result.state = self.state;
        Ok(result)
    }

    /// Post-action hooks for a successful action
    fn finish_turn(&mut self, actor: CombatantId, result: &mut ActionResult) {
        if self.state.is_active() {
            if let Ok(index) = self.index_of(actor) {
                let traits = Arc::clone(&self.traits);
                let context = TraitContext::turn_start(self.turn_count);
                let combatant = &mut self.roster[index];
                let before = Snapshot::of(combatant);
                traits.apply_turn_start_effects(combatant, &context);
                before.emit_diff(combatant, &mut self.events);

                self.apply_periodic(index);
                self.scheduler.consume(actor);
                self.tick_statuses(index);
                self.settle_casualties(None, result);
                self.check_outcome();
            }
        }
        self.end_turn(actor);
    }

    fn apply_periodic(&mut self, index: usize) {
        let combatant = &mut self.roster[index];
        if !combatant.is_alive {
            return;
        }
        let ticks = process_periodic(
            &combatant.statuses,
            &self.periodic,
            combatant.max_hp,
            combatant.max_mp,
        );
        if ticks.is_empty() {
            return;
        }

        let before = Snapshot::of(combatant);
        combatant.take_damage(ticks.total(PeriodicResource::Hp, PeriodicEffect::Damage));
        combatant.heal(ticks.total(PeriodicResource::Hp, PeriodicEffect::Heal));
        let mp_loss = ticks.total(PeriodicResource::Mp, PeriodicEffect::Damage);
        combatant.current_mp = combatant.current_mp.saturating_sub(mp_loss);
        combatant.restore_mp(ticks.total(PeriodicResource::Mp, PeriodicEffect::Heal));

        debug!(combatant = %combatant.id, ticks = ticks.ticks.len(), "periodic effects resolved");
        before.emit_diff(combatant, &mut self.events);
    }

    fn tick_statuses(&mut self, index: usize) {
        let combatant = &mut self.roster[index];
        let id = combatant.id;
        for effect in combatant.statuses.tick_durations() {
            self.events.emit(&CombatEvent::StatusRemoved {
                combatant: id,
                kind: effect.kind,
            });
        }
        self.scheduler.sync_statuses(id, &self.roster[index].statuses);
    }

    /// Emit deaths, run revive and on-kill traits, and retire the fallen
    fn settle_casualties(&mut self, killer: Option<CombatantId>, result: &mut ActionResult) {
        let traits = Arc::clone(&self.traits);
        let context = TraitContext {
            on_death: true,
            ..TraitContext::at_turn(self.turn_count)
        };
        let newly_dead: Vec<usize> = self
            .roster
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_alive && !self.fallen.contains(&c.id))
            .map(|(i, _)| i)
            .collect();

        for index in newly_dead {
            let combatant = &mut self.roster[index];
            let id = combatant.id;

            if !combatant.revive_used {
                if let Some(fraction) = traits.revive_fraction(combatant, &context) {
                    combatant.revive_used = true;
                    let hp = combatant.revive(fraction);
                    info!(combatant = %id, hp, "revived by trait");
                    self.events.emit(&CombatEvent::Revived { combatant: id, hp });
                    self.events.emit(&CombatEvent::HpChanged {
                        combatant: id,
                        old: 0,
                        new: hp,
                    });
                    continue;
                }
            }

            combatant.statuses.clear();
            combatant.is_defending = false;
            self.fallen.insert(id);
            info!(combatant = %id, killer = ?killer, "combatant defeated");
            self.events.emit(&CombatEvent::Death {
                combatant: id,
                killer,
            });
            self.casting.abort(id, &mut self.events);
            self.scheduler.set_alive(id, false);
            result.defeated.push(id);

            if let Some(killer) = killer {
                self.reward_kill(killer);
            }
        }
    }

    fn reward_kill(&mut self, killer: CombatantId) {
        let Ok(index) = self.index_of(killer) else {
            return;
        };
        let traits = Arc::clone(&self.traits);
        let context = TraitContext {
            on_kill: true,
            ..TraitContext::at_turn(self.turn_count)
        };
        let combatant = &mut self.roster[index];
        let before = Snapshot::of(combatant);
        combatant.gimmick.record_kill();
        let effects = traits.apply_on_kill_effects(combatant, &context);
        debug!(combatant = %killer, hp = effects.hp_restored, brave = effects.brave_restored, "kill bonus");
        before.emit_diff(combatant, &mut self.events);
    }

    fn check_outcome(&mut self) {
        if !self.state.is_active() {
            return;
        }
        let side_alive = |side: Side| self.roster.iter().any(|c| c.side == side && c.is_alive);
        let enemies_alive = side_alive(Side::Enemy);
        let allies_alive = side_alive(Side::Ally);

        if !enemies_alive {
            self.transition(CombatState::Victory);
        } else if !allies_alive {
            self.transition(CombatState::Defeat);
        }
    }

    /// Index of a usable target for `actor`
    fn validate_target(
        &self,
        actor: CombatantId,
        target: CombatantId,
        offensive: bool,
    ) -> Result<usize, CombatError> {
        let actor_side = self
            .combatant(actor)
            .map(|c| c.side)
            .ok_or(CombatError::UnknownCombatant(actor))?;
        let index = self
            .index_of(target)
            .map_err(|_| CombatError::invalid_target(target, "unknown combatant"))?;
        let candidate = &self.roster[index];

        if !candidate.is_alive {
            return Err(CombatError::invalid_target(target, "target is dead"));
        }
        if offensive {
            if candidate.side == actor_side {
                return Err(CombatError::invalid_target(target, "target is on the same side"));
            }
            if candidate.statuses.has_stealth() {
                return Err(CombatError::invalid_target(target, "target is hidden"));
            }
        } else if candidate.side != actor_side {
            return Err(CombatError::invalid_target(target, "target is on the other side"));
        }
        Ok(index)
    }

    /// Who `actor` may target with an action of `kind`, in roster order
    pub fn valid_targets(&self, actor: CombatantId, kind: ActionKind) -> Vec<CombatantId> {
        let Some(user) = self.combatant(actor) else {
            return Vec::new();
        };
        match kind {
            ActionKind::Flee => Vec::new(),
            ActionKind::Defend => vec![actor],
            ActionKind::Item => self
                .roster
                .iter()
                .filter(|c| c.side == user.side && c.is_alive)
                .map(|c| c.id)
                .collect(),
            ActionKind::BrvAttack
            | ActionKind::HpAttack
            | ActionKind::BrvHpAttack
            | ActionKind::Skill => self
                .roster
                .iter()
                .filter(|c| c.side != user.side && c.is_alive && !c.statuses.has_stealth())
                .map(|c| c.id)
                .collect(),
        }
    }

    fn attack(
        &mut self,
        actor: CombatantId,
        target: CombatantId,
        phases: AttackPhases,
        result: &mut ActionResult,
    ) -> Result<(), CombatError> {
        self.validate_target(actor, target, true)?;

        let traits = Arc::clone(&self.traits);
        let constants = Arc::clone(&self.constants);
        let turn = self.turn_count;
        let (attacker, defender) = pair_mut(&mut self.roster, actor, target)
            .ok_or_else(|| CombatError::invalid_target(target, "cannot target self"))?;

        if matches!(phases, AttackPhases::Hp) && attacker.brave.current == 0 {
            return Err(CombatError::InsufficientResource {
                actor,
                resource: Resource::Brave,
                required: 1,
                available: 0,
            });
        }

        let stacks = attacker.gimmick.take_focus_stacks();
        let focus = 1.0 + constants.defend.focus_bonus_per_stack * f64::from(stacks);
        let context = TraitContext {
            normal_attack: true,
            target_broken: defender.brave.is_broken,
            ..TraitContext::at_turn(turn)
        };
        let options = AttackOptions::physical();
        let brv_strike = Strike {
            traits: &traits,
            context: &context,
            options: &options,
            multiplier: constants.damage.basic_brv_multiplier * focus,
        };
        let hp_strike = Strike {
            multiplier: constants.damage.basic_hp_multiplier * focus,
            ..brv_strike
        };

        let (brv, hp) = match phases {
            AttackPhases::Brv => {
                let brv = self.ledger.brv_strike(
                    attacker,
                    defender,
                    &brv_strike,
                    &mut self.rng,
                    &mut self.events,
                );
                (Some(brv), None)
            }
            AttackPhases::Hp => {
                let hp = self.ledger.hp_attack(
                    attacker,
                    defender,
                    &hp_strike,
                    &mut self.rng,
                    &mut self.events,
                )?;
                (None, Some(hp))
            }
            AttackPhases::BrvHp => {
                let both = self.ledger.brv_hp_attack(
                    attacker,
                    defender,
                    &brv_strike,
                    &hp_strike,
                    &mut self.rng,
                    &mut self.events,
                );
                (Some(both.brv), both.hp)
            }
        };

        result.message = match (&brv, &hp) {
            (_, Some(hp)) => format!("{} dealt {} HP damage", actor, hp.hp_damage),
            (Some(brv), None) if brv.miss => format!("{} missed", actor),
            (Some(brv), None) => format!("{} stole {} Brave", actor, brv.stolen),
            (None, None) => String::new(),
        };
        self.after_attack(actor, target, brv.as_ref(), hp.as_ref(), true, result);
        result.brv = brv;
        result.hp = hp;
        Ok(())
    }

    /// BREAK gauge resets, lifesteal, cast interrupts, counters and deaths
    fn after_attack(
        &mut self,
        attacker: CombatantId,
        defender: CombatantId,
        brv: Option<&BrvAttackResult>,
        hp: Option<&HpAttackResult>,
        allow_counter: bool,
        result: &mut ActionResult,
    ) {
        if brv.is_some_and(|b| b.is_break) {
            self.scheduler.on_break(defender, &mut self.events);
        }

        if let Some(hp) = hp.filter(|hp| hp.hp_damage > 0) {
            self.apply_lifesteal(attacker, hp.hp_damage);
            if self
                .casting
                .interrupt_on_damage(defender, hp.hp_damage, &mut self.rng, &mut self.events)
            {
                self.scheduler.stop_casting(defender);
            }
        }

        let landed = brv.is_some_and(|b| !b.miss) || hp.is_some();
        if landed {
            if let Ok(index) = self.index_of(defender) {
                self.roster[index].gimmick.record_hit_taken();
            }
        }

        self.settle_casualties(Some(attacker), result);

        if allow_counter && landed {
            result.counter = self.try_counter(attacker, defender);
        }
    }

    fn apply_lifesteal(&mut self, attacker: CombatantId, damage: u32) {
        let Ok(index) = self.index_of(attacker) else {
            return;
        };
        let context = TraitContext::at_turn(self.turn_count);
        let combatant = &mut self.roster[index];
        let ratio = self.traits.lifesteal(combatant, &context);
        if ratio <= 0.0 {
            return;
        }
        let before = Snapshot::of(combatant);
        let healed = combatant.heal((damage as f64 * ratio).floor() as u32);
        debug!(combatant = %attacker, healed, "lifesteal");
        before.emit_diff(combatant, &mut self.events);
    }

    /// The defender may answer a hit with a BRV attack of its own
    fn try_counter(
        &mut self,
        attacker: CombatantId,
        defender: CombatantId,
    ) -> Option<BrvAttackResult> {
        let traits = Arc::clone(&self.traits);
        let constants = Arc::clone(&self.constants);
        let context = TraitContext {
            on_hit: true,
            ..TraitContext::at_turn(self.turn_count)
        };
        let (counterer, target) = pair_mut(&mut self.roster, defender, attacker)?;
        if !counterer.is_alive || !target.is_alive || !counterer.statuses.can_act() {
            return None;
        }

        let chance = traits.counter_chance(counterer, &context);
        if chance <= 0.0 || self.rng.gen::<f64>() >= chance {
            return None;
        }

        let options = AttackOptions::physical();
        let strike = Strike {
            traits: &traits,
            context: &context,
            options: &options,
            multiplier: constants.damage.basic_brv_multiplier,
        };
        let counter = self
            .ledger
            .brv_strike(counterer, target, &strike, &mut self.rng, &mut self.events);
        info!(combatant = %defender, target = %attacker, stolen = counter.stolen, "counter attack");

        if counter.is_break {
            self.scheduler.on_break(attacker, &mut self.events);
        }
        Some(counter)
    }

    fn use_skill(
        &mut self,
        actor: CombatantId,
        skill: Skill,
        target: Option<CombatantId>,
        result: &mut ActionResult,
    ) -> Result<(), CombatError> {
        let index = self.index_of(actor)?;
        if !self.roster[index].statuses.can_cast() {
            return Err(CombatError::ActorBlocked(actor));
        }

        let offensive = skill.effect.is_offensive();
        let target = target.filter(|t| *t != actor);
        match target {
            Some(target) => {
                self.validate_target(actor, target, offensive)?;
            }
            None if offensive => {
                return Err(CombatError::invalid_target(actor, "skill needs an enemy target"));
            }
            None => {}
        }

        let user = &self.roster[index];
        if skill.effect == SkillEffect::HpAttack && user.brave.current == 0 {
            return Err(CombatError::InsufficientResource {
                actor,
                resource: Resource::Brave,
                required: 1,
                available: 0,
            });
        }

        let context = TraitContext {
            skill_cast: true,
            ..TraitContext::at_turn(self.turn_count)
        };
        let cost = self.traits.mp_cost(user, skill.mp_cost, &context);
        if user.current_mp < cost {
            return Err(CombatError::InsufficientResource {
                actor,
                resource: Resource::Mp,
                required: cost,
                available: user.current_mp,
            });
        }

        let user = &mut self.roster[index];
        let before = Snapshot::of(user);
        user.consume_mp(cost);
        before.emit_diff(user, &mut self.events);

        if skill.is_cast() {
            let threshold = self.constants.atb.threshold;
            result.message = format!("{} began casting {}", actor, skill.name);
            self.casting
                .start_cast(actor, skill, target, threshold, &mut self.events);
            self.scheduler.start_casting(actor);
            result.cast_started = true;
            return Ok(());
        }

        let outcome = self.run_skill(actor, &skill, target)?;
        result.message = outcome.message.clone();
        self.after_skill(actor, target, &outcome, result);
        result.skill = Some(outcome);
        Ok(())
    }

    fn run_skill(
        &mut self,
        actor: CombatantId,
        skill: &Skill,
        target: Option<CombatantId>,
    ) -> Result<SkillOutcome, CombatError> {
        let traits = Arc::clone(&self.traits);
        let trait_context = TraitContext {
            skill_cast: true,
            ..TraitContext::at_turn(self.turn_count)
        };
        let CombatSession {
            roster,
            ledger,
            rng,
            events,
            executor,
            ..
        } = self;
        let mut context = SkillContext {
            ledger,
            traits: &traits,
            trait_context: &trait_context,
            rng,
            events,
        };

        let outcome = match target {
            Some(target) => {
                let (user, target) = pair_mut(roster, actor, target)
                    .ok_or_else(|| CombatError::invalid_target(target, "cannot target self"))?;
                executor.execute(skill, user, Some(target), &mut context)
            }
            None => {
                let user = roster
                    .iter_mut()
                    .find(|c| c.id == actor)
                    .ok_or(CombatError::UnknownCombatant(actor))?;
                executor.execute(skill, user, None, &mut context)
            }
        };
        debug!(combatant = %actor, skill = %skill.id, success = outcome.success, "skill resolved");
        Ok(outcome)
    }

    fn after_skill(
        &mut self,
        actor: CombatantId,
        target: Option<CombatantId>,
        outcome: &SkillOutcome,
        result: &mut ActionResult,
    ) {
        let recipient = target.unwrap_or(actor);
        if let Ok(index) = self.index_of(recipient) {
            self.scheduler
                .sync_statuses(recipient, &self.roster[index].statuses);
        }
        result.healed += outcome.healed;

        if outcome.brv.is_some() || outcome.hp.is_some() {
            self.after_attack(
                actor,
                recipient,
                outcome.brv.as_ref(),
                outcome.hp.as_ref(),
                false,
                result,
            );
        } else {
            self.settle_casualties(Some(actor), result);
        }
    }

    /// Resolve a cast that finished charging. No gauge is consumed.
    fn resolve_cast(&mut self, cast: CastInfo) {
        let caster = cast.caster;
        self.scheduler.stop_casting(caster);
        if !self.combatant(caster).is_some_and(|c| c.is_alive) {
            return;
        }

        let offensive = cast.skill.effect.is_offensive();
        let target = match cast.target {
            Some(target) if self.validate_target(caster, target, offensive).is_ok() => Some(target),
            Some(_) if offensive => self
                .valid_targets(caster, ActionKind::Skill)
                .first()
                .copied(),
            Some(_) | None => None,
        };
        if target.is_none() && (offensive || cast.target.is_some()) {
            debug!(caster = %caster, skill = %cast.skill.id, "cast fizzled without a target");
            return;
        }

        let mut result = ActionResult::new(caster, ActionKind::Skill, target);
        match self.run_skill(caster, &cast.skill, target) {
            Ok(outcome) => {
                info!(caster = %caster, skill = %cast.skill.id, "cast resolved");
                self.after_skill(caster, target, &outcome, &mut result);
            }
            Err(err) => warn!(caster = %caster, error = %err, "cast failed to resolve"),
        }
        self.check_outcome();
    }

    fn use_item(
        &mut self,
        actor: CombatantId,
        item: ItemEffect,
        target: Option<CombatantId>,
        result: &mut ActionResult,
    ) -> Result<(), CombatError> {
        let target = target.unwrap_or(actor);
        let index = if target == actor {
            self.index_of(actor)?
        } else {
            self.validate_target(actor, target, false)?
        };

        let combatant = &mut self.roster[index];
        let before = Snapshot::of(combatant);
        match item {
            ItemEffect::HealHp { amount } => result.healed = combatant.heal(amount),
            ItemEffect::HealMp { amount } => result.mp_restored = combatant.restore_mp(amount),
            ItemEffect::RestoreBrave { amount } => {
                result.brave_restored = combatant.brave.restore(amount)
            }
            ItemEffect::Cure { status: Some(kind) } => {
                result.cured = combatant.statuses.remove(kind).map(|e| e.kind).into_iter().collect();
            }
            ItemEffect::Cure { status: None } => {
                result.cured = [StatusCategory::Debuff, StatusCategory::Dot, StatusCategory::Cc]
                    .into_iter()
                    .flat_map(|category| combatant.statuses.remove_category(category))
                    .collect();
            }
        }
        before.emit_diff(combatant, &mut self.events);
        for kind in &result.cured {
            self.events.emit(&CombatEvent::StatusRemoved {
                combatant: target,
                kind: *kind,
            });
        }
        self.scheduler
            .sync_statuses(target, &self.roster[index].statuses);
        result.message = format!("{} used an item on {}", actor, target);
        Ok(())
    }

    fn defend(&mut self, actor: CombatantId, result: &mut ActionResult) -> Result<(), CombatError> {
        let index = self.index_of(actor)?;
        let defend = &self.constants.defend;
        let effect = StatusEffect::new(
            StatusKind::BoostDef,
            defend.defense_duration,
            defend.defense_intensity,
        )
        .with_source(actor);
        let max_stacks = defend.focus_max_stacks;

        let combatant = &mut self.roster[index];
        combatant.statuses.add(effect, true);
        combatant.is_defending = true;
        let stacks = combatant.gimmick.add_focus_stack(max_stacks);
        let duration = combatant
            .statuses
            .get(StatusKind::BoostDef)
            .map_or(0, |e| e.duration);

        self.events.emit(&CombatEvent::StatusApplied {
            combatant: actor,
            kind: StatusKind::BoostDef,
            duration,
        });
        debug!(combatant = %actor, focus_stacks = stacks, "defending");
        result.message = format!("{} is defending", actor);
        Ok(())
    }

    fn flee(&mut self, actor: CombatantId, result: &mut ActionResult) -> Result<(), CombatError> {
        let index = self.index_of(actor)?;
        if self.roster[index].side != Side::Ally {
            return Err(CombatError::invalid_target(actor, "only allies can flee"));
        }

        if self.rng.gen::<f64>() < self.constants.flee.base_chance {
            result.fled = true;
            result.message = "escaped".to_string();
            info!(combatant = %actor, "party fled");
            self.transition(CombatState::Fled);
        } else {
            result.message = "could not escape".to_string();
            debug!(combatant = %actor, "flee failed");
        }
        Ok(())
    }

    /// Cancel `actor`'s cast. `Ok(false)` if the cast cannot be interrupted.
    pub fn cancel_cast(&mut self, actor: CombatantId) -> Result<bool, CombatError> {
        self.ensure_active()?;
        self.index_of(actor)?;
        let cancelled = self.casting.cancel(actor, &mut self.events)?;
        if cancelled {
            self.scheduler.stop_casting(actor);
        }
        Ok(cancelled)
    }

    /// Tear the session down and hand the combatants back
    pub fn end(mut self) -> Vec<Combatant> {
        if !self.state.is_terminal() {
            info!(state = ?self.state, "combat abandoned");
        }
        self.scheduler.clear();
        self.casting.clear();
        self.roster
    }
}
