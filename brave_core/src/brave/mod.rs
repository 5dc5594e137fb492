//! Brave ledger - Brave pools, BRV/HP attacks and the BREAK state machine
//!
//! BREAK lifecycle:
//! 1. A BRV attack lands on a defender that already has 0 Brave: the defender
//!    becomes broken and the attacker steals the full hit.
//! 2. While broken, HP attacks against the defender gain the BREAK bonus.
//! 3. The broken combatant's turn-start recovery counts down
//!    `break_recovery_turns` opportunities, then clears the flag and restores
//!    init Brave.

mod result;

pub use result::{BrvAttackResult, BrvHpAttackResult, HpAttackResult};

use crate::combat::{CombatError, CombatEvent, EventSink, Resource};
use crate::combatant::Combatant;
use crate::config::{BraveConstants, DamageConstants, HitConstants};
use crate::damage::{AttackOptions, DamageResolver};
use crate::traits::{TraitContext, TraitEngine};
use crate::types::StatKind;
use rand::Rng;
use tracing::{debug, info};

/// Everything an attack needs besides the two combatants
#[derive(Debug, Clone, Copy)]
pub struct Strike<'a> {
    pub traits: &'a TraitEngine,
    pub context: &'a TraitContext,
    pub options: &'a AttackOptions,
    /// BRV multiplier for BRV attacks, HP multiplier for HP attacks
    pub multiplier: f64,
}

/// Applies Brave movement between combatants
#[derive(Debug, Clone, Default)]
pub struct BraveLedger {
    pub constants: BraveConstants,
    pub resolver: DamageResolver,
}

fn emit_brave(events: &mut dyn EventSink, combatant: &Combatant, old: u32) {
    if combatant.brave.current != old {
        events.emit(&CombatEvent::BraveChanged {
            combatant: combatant.id,
            old,
            new: combatant.brave.current,
        });
    }
}

impl BraveLedger {
    pub fn new(constants: BraveConstants, damage: DamageConstants, hit: HitConstants) -> Self {
        BraveLedger {
            constants,
            resolver: DamageResolver::new(damage, hit),
        }
    }

    /// Set init/max Brave from level and traits, then fill to init
    pub fn initialize(&self, combatant: &mut Combatant, traits: &TraitEngine, context: &TraitContext) {
        let levels = combatant.level.saturating_sub(1);
        let declared_init = combatant.brave.init;
        let declared_max = if combatant.brave.max > declared_init {
            combatant.brave.max as f64
        } else {
            declared_init as f64 * self.constants.max_brave_multiplier
        };

        let init = (declared_init + levels * self.constants.init_brave_per_level)
            .max(self.constants.min_init_brave);
        let max = (declared_max as u32 + levels * self.constants.max_brave_per_level)
            .max(self.constants.min_max_brave);

        let init = (init as f64 * traits.stat_multiplier(combatant, StatKind::InitBrave, context))
            .floor() as u32;
        let max = (max as f64 * traits.stat_multiplier(combatant, StatKind::MaxBrave, context))
            .floor() as u32;

        combatant.brave.init = init;
        combatant.brave.max = max.max(init);
        combatant.brave.current = init;
        combatant.brave.is_broken = false;
        combatant.brave.break_turns = 0;
    }

    /// Move `raw` Brave damage from defender to attacker
    ///
    /// `raw == 0` is a miss and touches nothing.
    pub fn brv_attack(
        &self,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        raw: u32,
        events: &mut dyn EventSink,
    ) -> BrvAttackResult {
        if raw == 0 {
            return BrvAttackResult::missed();
        }

        let actual = (raw as f64 / defender.brave.loss_resistance).floor() as u32;
        let defender_old = defender.brave.current;
        let was_broken = defender_old == 0;

        defender.brave.lose(actual);
        let stolen = if was_broken { actual } else { actual.min(defender_old) };

        let attacker_old = attacker.brave.current;
        let gained = attacker
            .brave
            .restore((stolen as f64 * attacker.brave.efficiency).floor() as u32);

        emit_brave(events, defender, defender_old);
        emit_brave(events, attacker, attacker_old);

        let is_break = was_broken && actual > 0;
        if is_break {
            defender.brave.is_broken = true;
            defender.brave.break_turns = 0;
            info!(attacker = %attacker.id, defender = %defender.id, "BREAK");
            events.emit(&CombatEvent::Break {
                attacker: attacker.id,
                defender: defender.id,
            });
        }

        debug!(
            attacker = %attacker.id,
            defender = %defender.id,
            raw,
            actual,
            stolen,
            gained,
            "brave attack applied"
        );
        debug_assert!(attacker.brave.current <= attacker.brave.max);

        BrvAttackResult {
            raw,
            actual,
            stolen,
            gained,
            is_break,
            is_critical: false,
            miss: false,
        }
    }

    /// Roll BRV damage and apply it
    pub fn brv_strike(
        &self,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        strike: &Strike<'_>,
        rng: &mut impl Rng,
        events: &mut dyn EventSink,
    ) -> BrvAttackResult {
        let damage = self.resolver.brv_damage(
            attacker,
            defender,
            strike.multiplier,
            strike.options,
            strike.traits,
            strike.context,
            rng,
        );
        let raw = if damage.is_miss || defender.statuses.has_invincibility() {
            0
        } else {
            damage.final_damage
        };
        let mut result = self.brv_attack(attacker, defender, raw, events);
        result.is_critical = damage.is_critical && !result.miss;
        result
    }

    /// Spend all of the attacker's Brave as HP damage
    ///
    /// Fails without touching anything if the attacker has no Brave. On
    /// success the attacker's Brave is always zero afterwards.
    pub fn hp_attack(
        &self,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        strike: &Strike<'_>,
        rng: &mut impl Rng,
        events: &mut dyn EventSink,
    ) -> Result<HpAttackResult, CombatError> {
        let pool = attacker.brave.current;
        if pool == 0 {
            return Err(CombatError::InsufficientResource {
                actor: attacker.id,
                resource: Resource::Brave,
                required: 1,
                available: 0,
            });
        }

        let is_break = defender.brave.is_broken;
        let damage = self.resolver.hp_damage(
            attacker,
            defender,
            pool,
            strike.multiplier,
            is_break,
            strike.options,
            strike.traits,
            strike.context,
            rng,
        );

        attacker.brave.spend_all();
        emit_brave(events, attacker, pool);

        let amount = if defender.statuses.has_invincibility() {
            0
        } else {
            damage.final_damage
        };
        let hp_before = defender.current_hp;
        let was_alive = defender.is_alive;
        let hp_damage = defender.take_damage(amount);
        let wound_amount = (hp_damage as f64 * self.resolver.damage.wound_rate).floor() as u32;
        let wound = defender.add_wound(wound_amount, self.resolver.damage.max_wound_fraction);

        if defender.current_hp != hp_before {
            events.emit(&CombatEvent::HpChanged {
                combatant: defender.id,
                old: hp_before,
                new: defender.current_hp,
            });
        }

        debug!(
            attacker = %attacker.id,
            defender = %defender.id,
            pool,
            hp_damage,
            wound,
            is_break,
            "hp attack applied"
        );
        debug_assert!(defender.invariants_hold(self.resolver.damage.max_wound_fraction));

        Ok(HpAttackResult {
            hp_damage,
            wound,
            brv_consumed: pool,
            is_break_bonus: is_break,
            killed: was_alive && !defender.is_alive,
            damage,
        })
    }

    /// BRV attack, then an HP attack with whatever Brave the attacker holds
    pub fn brv_hp_attack(
        &self,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        brv: &Strike<'_>,
        hp: &Strike<'_>,
        rng: &mut impl Rng,
        events: &mut dyn EventSink,
    ) -> BrvHpAttackResult {
        let brv_result = self.brv_strike(attacker, defender, brv, rng, events);
        let hp_result = if attacker.brave.current > 0 && defender.is_alive {
            self.hp_attack(attacker, defender, hp, rng, events).ok()
        } else {
            None
        };
        BrvHpAttackResult {
            brv: brv_result,
            hp: hp_result,
        }
    }

    /// Turn-start recovery. Returns the Brave restored.
    ///
    /// A broken combatant counts one opportunity per call and recovers to
    /// init once `break_recovery_turns` have passed. An unbroken combatant at
    /// 0 Brave is refilled to init.
    pub fn recover_init_brave(&self, combatant: &mut Combatant, events: &mut dyn EventSink) -> u32 {
        if !combatant.is_alive {
            return 0;
        }

        if combatant.brave.is_broken {
            combatant.brave.break_turns += 1;
            if combatant.brave.break_turns < self.constants.break_recovery_turns {
                return 0;
            }
            let restored = self.clear_break(combatant, events);
            events.emit(&CombatEvent::BreakRecovered {
                combatant: combatant.id,
                brave: combatant.brave.current,
            });
            info!(combatant = %combatant.id, brave = combatant.brave.current, "break recovered");
            return restored;
        }

        if combatant.brave.current == 0 {
            return self.reset_brave(combatant, events);
        }
        0
    }

    /// Clear BREAK and refill to init. Returns the Brave restored.
    pub fn clear_break(&self, combatant: &mut Combatant, events: &mut dyn EventSink) -> u32 {
        combatant.brave.is_broken = false;
        combatant.brave.break_turns = 0;
        self.reset_brave(combatant, events)
    }

    /// Raise current Brave to init if below it
    pub fn reset_brave(&self, combatant: &mut Combatant, events: &mut dyn EventSink) -> u32 {
        let old = combatant.brave.current;
        let target = combatant.brave.init.min(combatant.brave.max);
        if old >= target {
            return 0;
        }
        let restored = combatant.brave.restore(target - old);
        emit_brave(events, combatant, old);
        restored
    }

    /// Add Brave up to max
    pub fn restore_brave(
        &self,
        combatant: &mut Combatant,
        amount: u32,
        events: &mut dyn EventSink,
    ) -> u32 {
        let old = combatant.brave.current;
        let restored = combatant.brave.restore(amount);
        emit_brave(events, combatant, old);
        restored
    }

    pub fn is_broken(&self, combatant: &Combatant) -> bool {
        combatant.brave.is_broken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::EventLog;
    use crate::combatant::StatSet;
    use crate::types::{CombatantId, Side};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn make_combatant(id: u32, brave: u32, max: u32) -> Combatant {
        let mut c = Combatant::new(CombatantId(id), "Unit", Side::Ally, StatSet::default())
            .with_hp(1000)
            .with_brave(brave, max);
        c.brave.init = 100;
        c
    }

    #[test]
    fn test_scenario_a_drain_without_break() {
        let ledger = BraveLedger::default();
        let mut events = EventLog::new();
        let mut attacker = make_combatant(1, 500, 9999);
        let mut defender = make_combatant(2, 100, 9999);

        let result = ledger.brv_attack(&mut attacker, &mut defender, 150, &mut events);

        assert_eq!(defender.brave.current, 0);
        assert!(!result.is_break);
        assert_eq!(result.stolen, 100);
        assert_eq!(result.gained, 100);
        assert_eq!(attacker.brave.current, 600);
        assert!(!defender.brave.is_broken);
    }

    #[test]
    fn test_scenario_b_break_full_steal() {
        let ledger = BraveLedger::default();
        let mut events = EventLog::new();
        let mut attacker = make_combatant(1, 500, 9999);
        let mut defender = make_combatant(2, 100, 9999);

        ledger.brv_attack(&mut attacker, &mut defender, 150, &mut events);
        let result = ledger.brv_attack(&mut attacker, &mut defender, 50, &mut events);

        assert!(result.is_break);
        assert_eq!(result.stolen, 50);
        assert_eq!(result.gained, 50);
        assert_eq!(defender.brave.current, 0);
        assert!(defender.brave.is_broken);
        assert!(events
            .events()
            .iter()
            .any(|e| matches!(e, CombatEvent::Break { defender: CombatantId(2), .. })));
    }

    #[test]
    fn test_miss_changes_nothing() {
        let ledger = BraveLedger::default();
        let mut events = EventLog::new();
        let mut attacker = make_combatant(1, 200, 999);
        let mut defender = make_combatant(2, 0, 999);

        let result = ledger.brv_attack(&mut attacker, &mut defender, 0, &mut events);

        assert!(result.miss);
        assert!(!result.is_break);
        assert_eq!(attacker.brave.current, 200);
        assert_eq!(defender.brave.current, 0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_loss_resistance_and_efficiency() {
        let ledger = BraveLedger::default();
        let mut events = EventLog::new();
        let mut attacker = make_combatant(1, 0, 999).with_brave_multipliers(1.5, 1.0);
        attacker.brave.current = 0;
        let mut defender = make_combatant(2, 300, 999).with_brave_multipliers(1.0, 2.0);

        let result = ledger.brv_attack(&mut attacker, &mut defender, 101, &mut events);
        // 101 / 2 = 50; 50 × 1.5 = 75
        assert_eq!(result.actual, 50);
        assert_eq!(result.gained, 75);
        assert_eq!(defender.brave.current, 250);
    }

    #[test]
    fn test_gain_clamped_to_max() {
        let ledger = BraveLedger::default();
        let mut events = EventLog::new();
        let mut attacker = make_combatant(1, 280, 300);
        let mut defender = make_combatant(2, 100, 999);

        let result = ledger.brv_attack(&mut attacker, &mut defender, 100, &mut events);
        assert_eq!(result.stolen, 100);
        assert_eq!(result.gained, 20);
        assert_eq!(attacker.brave.current, 300);
    }

    #[test]
    fn test_hp_attack_requires_brave() {
        let ledger = BraveLedger::default();
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut attacker = make_combatant(1, 0, 999);
        let mut defender = make_combatant(2, 100, 999);
        let engine = TraitEngine::default();
        let context = TraitContext::new();
        let options = AttackOptions::physical();
        let strike = Strike {
            traits: &engine,
            context: &context,
            options: &options,
            multiplier: 1.0,
        };

        let err = ledger
            .hp_attack(&mut attacker, &mut defender, &strike, &mut rng, &mut events)
            .unwrap_err();
        assert!(matches!(
            err,
            CombatError::InsufficientResource {
                resource: Resource::Brave,
                ..
            }
        ));
        assert_eq!(defender.current_hp, 1000);
        assert!(events.is_empty());
    }

    #[test]
    fn test_hp_attack_zeroes_brave_and_wounds() {
        let ledger = BraveLedger::default();
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut attacker = make_combatant(1, 400, 999);
        let mut defender = make_combatant(2, 100, 999);
        let engine = TraitEngine::default();
        let context = TraitContext::new();
        let options = AttackOptions::physical();
        let strike = Strike {
            traits: &engine,
            context: &context,
            options: &options,
            multiplier: 1.0,
        };

        let result = ledger
            .hp_attack(&mut attacker, &mut defender, &strike, &mut rng, &mut events)
            .unwrap();

        assert_eq!(attacker.brave.current, 0);
        assert_eq!(result.brv_consumed, 400);
        assert!(result.hp_damage >= 5);
        assert_eq!(result.wound, (result.hp_damage as f64 * 0.25).floor() as u32);
        assert_eq!(defender.current_hp, 1000 - result.hp_damage);
        assert!(defender.invariants_hold(0.5));
    }

    #[test]
    fn test_hp_attack_break_bonus_flag() {
        let ledger = BraveLedger::default();
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut attacker = make_combatant(1, 400, 999);
        let mut defender = make_combatant(2, 0, 999);
        defender.brave.is_broken = true;
        let engine = TraitEngine::default();
        let context = TraitContext::new();
        let options = AttackOptions::physical();
        let strike = Strike {
            traits: &engine,
            context: &context,
            options: &options,
            multiplier: 1.0,
        };

        let result = ledger
            .hp_attack(&mut attacker, &mut defender, &strike, &mut rng, &mut events)
            .unwrap();
        assert!(result.is_break_bonus);
        assert!((result.damage.details.break_multiplier - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_break_recovery_window() {
        let mut constants = BraveConstants::default();
        constants.break_recovery_turns = 2;
        let ledger = BraveLedger::new(constants, DamageConstants::default(), HitConstants::default());
        let mut events = EventLog::new();
        let mut c = make_combatant(1, 0, 999);
        c.brave.is_broken = true;

        assert_eq!(ledger.recover_init_brave(&mut c, &mut events), 0);
        assert!(ledger.is_broken(&c));
        assert_eq!(ledger.recover_init_brave(&mut c, &mut events), 100);
        assert!(!ledger.is_broken(&c));
        assert_eq!(c.brave.current, 100);
        assert!(events
            .events()
            .iter()
            .any(|e| matches!(e, CombatEvent::BreakRecovered { brave: 100, .. })));
    }

    #[test]
    fn test_default_break_lasts_one_opportunity() {
        let ledger = BraveLedger::default();
        let mut events = EventLog::new();
        let mut c = make_combatant(1, 0, 999);
        c.brave.is_broken = true;

        assert_eq!(ledger.recover_init_brave(&mut c, &mut events), 100);
        assert!(!c.brave.is_broken);
    }

    #[test]
    fn test_zero_brave_recovers_to_init() {
        let ledger = BraveLedger::default();
        let mut events = EventLog::new();
        let mut c = make_combatant(1, 0, 999);
        assert_eq!(ledger.recover_init_brave(&mut c, &mut events), 100);

        c.brave.current = 40;
        assert_eq!(ledger.recover_init_brave(&mut c, &mut events), 0);
        assert_eq!(c.brave.current, 40);
    }

    #[test]
    fn test_initialize_from_level() {
        let ledger = BraveLedger::default();
        let mut c = Combatant::new(CombatantId(1), "Lv5", Side::Ally, StatSet::default())
            .with_level(5)
            .with_brave(100, 300);
        ledger.initialize(&mut c, &TraitEngine::default(), &TraitContext::new());
        // init 100 + 4 × 10 = 140; max 300 + 4 × 50 = 500
        assert_eq!(c.brave.init, 140);
        assert_eq!(c.brave.max, 500);
        assert_eq!(c.brave.current, 140);

        let mut low = Combatant::new(CombatantId(2), "Lv1", Side::Ally, StatSet::default())
            .with_brave(10, 20);
        ledger.initialize(&mut low, &TraitEngine::default(), &TraitContext::new());
        assert_eq!(low.brave.init, 50);
        assert_eq!(low.brave.max, 200);
    }

    #[test]
    fn test_initialize_with_brave_traits() {
        let ledger = BraveLedger::default();
        let mut c = Combatant::new(CombatantId(1), "Brave", Side::Ally, StatSet::default())
            .with_brave(100, 300)
            .with_traits(&["brv_boost"]);
        ledger.initialize(&mut c, &TraitEngine::default(), &TraitContext::new());
        assert!(c.brave.init >= 100);
        assert!(c.brave.max >= c.brave.init);
    }
}
