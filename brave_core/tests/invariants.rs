//! Property tests for Brave, HP, hit-rate and status-duration bounds

use brave_core::brave::{BraveLedger, Strike};
use brave_core::combat::{Action, CombatSession, NullSink, SessionConfig};
use brave_core::combatant::{Combatant, StatSet};
use brave_core::config::{CombatConstants, HitConstants};
use brave_core::damage::{hit_rate, AttackOptions};
use brave_core::status::{StatusEffect, StatusKind, StatusRegistry};
use brave_core::traits::{TraitContext, TraitEngine};
use brave_core::types::{ActionKind, CombatantId, Side};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn make_combatant(id: u32, side: Side, brave: u32, max_brave: u32, hp: u32) -> Combatant {
    Combatant::new(CombatantId(id), "Subject", side, StatSet::default())
        .with_hp(hp)
        .with_brave(brave, max_brave)
}

proptest! {
    #[test]
    fn prop_miss_changes_nothing(attacker_brave in 0u32..5000, defender_brave in 0u32..5000) {
        let ledger = BraveLedger::default();
        let mut attacker = make_combatant(1, Side::Ally, attacker_brave, 9999, 100);
        let mut defender = make_combatant(2, Side::Enemy, defender_brave, 9999, 100);

        let result = ledger.brv_attack(&mut attacker, &mut defender, 0, &mut NullSink);
        prop_assert!(result.miss);
        prop_assert_eq!(attacker.brave.current, attacker_brave);
        prop_assert_eq!(defender.brave.current, defender_brave);
    }

    #[test]
    fn prop_brv_attack_keeps_bounds(
        attacker_brave in 0u32..3000,
        attacker_max in 1u32..3000,
        defender_brave in 0u32..3000,
        raw in 0u32..10_000,
        efficiency in 0.0f64..3.0,
        resistance in 0.1f64..4.0,
    ) {
        let ledger = BraveLedger::default();
        let mut attacker = make_combatant(1, Side::Ally, attacker_brave.min(attacker_max), attacker_max, 100)
            .with_brave_multipliers(efficiency, 1.0);
        let mut defender = make_combatant(2, Side::Enemy, defender_brave, 3000, 100)
            .with_brave_multipliers(1.0, resistance);

        ledger.brv_attack(&mut attacker, &mut defender, raw, &mut NullSink);
        prop_assert!(attacker.brave.current <= attacker.brave.max);
        prop_assert!(defender.brave.current <= defender.brave.max);
    }

    #[test]
    fn prop_break_gains_full_hit(raw in 1u32..5000, efficiency in 0.5f64..2.0) {
        let ledger = BraveLedger::default();
        let mut attacker = make_combatant(1, Side::Ally, 0, 100_000, 100)
            .with_brave_multipliers(efficiency, 1.0);
        let mut defender = make_combatant(2, Side::Enemy, 0, 999, 100);

        let result = ledger.brv_attack(&mut attacker, &mut defender, raw, &mut NullSink);
        prop_assert!(result.is_break);
        prop_assert_eq!(result.actual, raw);
        prop_assert_eq!(result.gained, (raw as f64 * efficiency).floor() as u32);
        prop_assert_eq!(defender.brave.current, 0);
        prop_assert!(defender.brave.is_broken);
    }

    #[test]
    fn prop_hp_attack_zeroes_brave(brave in 1u32..5000, defender_hp in 1u32..20_000, seed in any::<u64>()) {
        let ledger = BraveLedger::default();
        let traits = TraitEngine::default();
        let context = TraitContext::new();
        let options = AttackOptions::physical();
        let strike = Strike { traits: &traits, context: &context, options: &options, multiplier: 1.0 };
        let mut rng = StdRng::seed_from_u64(seed);

        let mut attacker = make_combatant(1, Side::Ally, brave, 9999, 100);
        let mut defender = make_combatant(2, Side::Enemy, 100, 999, defender_hp);

        let result = ledger.hp_attack(&mut attacker, &mut defender, &strike, &mut rng, &mut NullSink);
        prop_assert!(result.is_ok());
        prop_assert_eq!(attacker.brave.current, 0);
        prop_assert!(defender.current_hp <= defender.effective_max_hp());
        prop_assert!(defender.invariants_hold(0.5));
    }

    #[test]
    fn prop_equal_accuracy_and_evasion_is_base_rate(stat in 1.0f64..10_000.0) {
        let constants = HitConstants::default();
        prop_assert!((hit_rate(stat, stat, &constants) - 65.0).abs() < 1e-9);
    }

    #[test]
    fn prop_hit_rate_is_clamped(accuracy in 0.0f64..10_000.0, evasion in 0.0f64..10_000.0) {
        let constants = HitConstants::default();
        let rate = hit_rate(accuracy, evasion, &constants);
        prop_assert!((constants.min_rate..=constants.max_rate).contains(&rate));
    }

    #[test]
    fn prop_duration_evicts_exactly_once(duration in 1u32..20) {
        let mut statuses = StatusRegistry::new();
        statuses.add(StatusEffect::new(StatusKind::Poison, duration, 1.0), true);

        let mut evictions = 0;
        for call in 1..=duration + 3 {
            let expired = statuses.tick_durations();
            evictions += expired.iter().filter(|e| e.kind == StatusKind::Poison).count();
            if call < duration {
                prop_assert!(statuses.has(StatusKind::Poison));
            } else {
                prop_assert!(!statuses.has(StatusKind::Poison));
            }
            if call == duration {
                prop_assert_eq!(expired.len(), 1);
            }
        }
        prop_assert_eq!(evictions, 1);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_session_keeps_bounds(seed in any::<u64>(), choices in prop::collection::vec(0u8..4, 1..60)) {
        let allies = vec![
            make_combatant(1, Side::Ally, 120, 900, 300),
            make_combatant(2, Side::Ally, 80, 600, 250),
        ];
        let enemies = vec![make_combatant(3, Side::Enemy, 150, 1200, 500)];
        let mut session = CombatSession::new(allies, enemies, SessionConfig::default().with_seed(seed));
        session.start().unwrap();
        let wound_cap = CombatConstants::default().damage.max_wound_fraction;

        let mut choices = choices.into_iter();
        for _ in 0..20_000 {
            if !session.state().is_active() {
                break;
            }
            let ready = session.tick(1.0).unwrap();
            for actor in ready {
                let Some(choice) = choices.next() else { break };
                let target = session
                    .valid_targets(actor, ActionKind::BrvAttack)
                    .first()
                    .copied()
                    .unwrap_or(actor);
                let action = match choice {
                    0 => Action::BrvAttack { target },
                    1 => Action::HpAttack { target },
                    2 => Action::BrvHpAttack { target },
                    _ => Action::Defend,
                };
                let _ = session.execute_action(actor, action);

                for combatant in session.combatants() {
                    prop_assert!(combatant.invariants_hold(wound_cap), "{:?}", combatant);
                }
                for gauge in session.scheduler().gauges() {
                    prop_assert!(gauge.current <= gauge.max);
                }
                if !session.state().is_active() {
                    break;
                }
            }
            if choices.as_slice().is_empty() {
                break;
            }
        }
    }
}
