//! Integration test: build a party -> start a session -> tick -> act -> finish
//!
//! Covers the reference scenarios end to end through the public API.

use brave_core::atb::TurnScheduler;
use brave_core::brave::BraveLedger;
use brave_core::casting::CastingRegistry;
use brave_core::combat::{
    Action, BattleService, CombatEvent, CombatSession, CombatState, EventLog, SessionConfig,
};
use brave_core::combatant::{Combatant, StatSet};
use brave_core::config::AtbConstants;
use brave_core::status::{StatusEffect, StatusKind, StatusRegistry};
use brave_core::types::{ActionKind, CombatantId, Side};

/// Helper to print a separator
fn separator(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("  {}", title);
    println!("{}\n", "=".repeat(60));
}

fn make_combatant(id: u32, name: &str, side: Side, speed: u32) -> Combatant {
    let stats = StatSet {
        attack: 60,
        defense: 20,
        magic: 40,
        spirit: 20,
        speed,
        ..StatSet::default()
    };
    Combatant::new(CombatantId(id), name, side, stats)
        .with_hp(400)
        .with_mp(40)
        .with_brave(100, 1000)
}

/// Spend Brave once it reaches init, otherwise build it
fn choose_action(session: &CombatSession, actor: CombatantId) -> Action {
    let Some(target) = session
        .valid_targets(actor, ActionKind::BrvAttack)
        .first()
        .copied()
    else {
        return Action::Defend;
    };
    let Some(me) = session.combatant(actor) else {
        return Action::Defend;
    };
    if me.brave.current >= me.brave.init {
        Action::HpAttack { target }
    } else {
        Action::BrvAttack { target }
    }
}

fn run_battle(seed: u64, max_ticks: u32) -> (CombatState, Vec<CombatEvent>, u32) {
    let allies = vec![
        make_combatant(1, "Warrior", Side::Ally, 30),
        make_combatant(2, "Mage", Side::Ally, 25),
    ];
    let enemies = vec![make_combatant(10, "Behemoth", Side::Enemy, 20).with_hp(600)];
    let mut session = CombatSession::new(allies, enemies, SessionConfig::default().with_seed(seed));
    session.start().unwrap();

    let mut events = session.take_events();
    for _ in 0..max_ticks {
        if !session.state().is_active() {
            break;
        }
        for actor in session.tick(1.0).unwrap() {
            if !session.state().is_active() {
                break;
            }
            if !session.scheduler().can_act(actor) {
                continue;
            }
            let action = choose_action(&session, actor);
            let _ = session.execute_action(actor, action);
        }
        events.extend(session.take_events());
    }
    (session.state(), events, session.turn_count())
}

#[test]
fn test_scenario_a_drain_to_zero() {
    separator("SCENARIO A: Brave drained without BREAK");
    let ledger = BraveLedger::default();
    let mut events = EventLog::new();
    let mut attacker = make_combatant(1, "Attacker", Side::Ally, 10).with_brave(500, 9999);
    let mut defender = make_combatant(2, "Defender", Side::Enemy, 10).with_brave(100, 999);

    let result = ledger.brv_attack(&mut attacker, &mut defender, 150, &mut events);
    println!("  {:?}", result);

    assert_eq!(defender.brave.current, 0);
    assert!(!result.is_break);
    assert!(!defender.brave.is_broken);
    assert_eq!(result.stolen, 100);
    assert_eq!(result.gained, 100);
    assert_eq!(attacker.brave.current, 600);
}

#[test]
fn test_scenario_b_break_on_empty_defender() {
    separator("SCENARIO B: BREAK on a 0 Brave defender");
    let ledger = BraveLedger::default();
    let mut events = EventLog::new();
    let mut attacker = make_combatant(1, "Attacker", Side::Ally, 10).with_brave(500, 9999);
    let mut defender = make_combatant(2, "Defender", Side::Enemy, 10).with_brave(100, 999);

    ledger.brv_attack(&mut attacker, &mut defender, 150, &mut events);
    let result = ledger.brv_attack(&mut attacker, &mut defender, 50, &mut events);
    println!("  {:?}", result);

    assert!(result.is_break);
    assert!(defender.brave.is_broken);
    assert_eq!(result.stolen, 50);
    assert_eq!(result.gained, 50);
    assert_eq!(attacker.brave.current, 650);
    assert!(events
        .events()
        .iter()
        .any(|e| matches!(e, CombatEvent::Break { .. })));
}

#[test]
fn test_scenario_c_faster_gauge_first() {
    separator("SCENARIO C: speed 20 beats speed 5");
    let mut scheduler = TurnScheduler::new(AtbConstants::default());
    let mut casting = CastingRegistry::default();
    let mut events = EventLog::new();
    scheduler.register(CombatantId(1), 20.0);
    scheduler.register(CombatantId(2), 5.0);

    let mut first_ready = None;
    for tick in 1..=2000 {
        let ready = scheduler.tick(1.0, &mut casting, &mut events);
        if !ready.is_empty() {
            first_ready = Some((tick, ready));
            break;
        }
    }
    let (tick, ready) = first_ready.expect("someone becomes ready");
    println!("  first ready at tick {}: {:?}", tick, ready);

    // 20 / 5 = 4 points per tick, 250 ticks to 1000
    assert_eq!(tick, 250);
    assert_eq!(ready, vec![CombatantId(1)]);
    assert!(!scheduler.can_act(CombatantId(2)));
}

#[test]
fn test_scenario_d_stun_expires() {
    separator("SCENARIO D: STUN blocks then expires");
    let mut statuses = StatusRegistry::new();
    statuses.add(StatusEffect::new(StatusKind::Stun, 3, 1.0), true);
    assert!(!statuses.can_act());

    for _ in 0..2 {
        statuses.tick_durations();
        assert!(!statuses.can_act());
    }
    let expired = statuses.tick_durations();
    assert_eq!(expired.len(), 1);
    assert!(!statuses.has(StatusKind::Stun));
    assert!(statuses.can_act());
}

#[test]
fn test_stun_wears_off_in_tick_loop() {
    separator("STUN under ticking");
    let mut enemy = make_combatant(10, "Behemoth", Side::Enemy, 20);
    enemy
        .statuses
        .add(StatusEffect::new(StatusKind::Stun, 1, 1.0), true);
    let allies = vec![make_combatant(1, "Warrior", Side::Ally, 30)];
    let mut session = CombatSession::new(allies, vec![enemy], SessionConfig::default().with_seed(8));
    session.start().unwrap();

    let mut enemy_turns = 0;
    for _ in 0..20_000 {
        session.tick(1.0).unwrap();
        for actor in session.scheduler().ready_order() {
            if actor == CombatantId(10) {
                enemy_turns += 1;
            }
            session.execute_action(actor, Action::Defend).unwrap();
        }
    }
    let enemy = session.combatant(CombatantId(10)).unwrap();
    println!("  turns={} enemy_turns={}", session.turn_count(), enemy_turns);

    assert!(!enemy.statuses.has(StatusKind::Stun));
    assert!(enemy_turns > 0);
    assert!(session.scheduler().get(CombatantId(10)).unwrap().flags.is_empty());
}

#[test]
fn test_full_battle_reaches_an_outcome() {
    separator("FULL BATTLE");
    let (state, events, turns) = run_battle(42, 100_000);
    println!("  outcome {:?} after {} turns, {} events", state, turns, events.len());

    assert!(state.is_terminal());
    assert!(matches!(events.first(), Some(CombatEvent::CombatStarted { .. })));
    assert!(matches!(
        events.last(),
        Some(CombatEvent::CombatEnded { .. }) | Some(CombatEvent::TurnEnded { .. })
    ));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, CombatEvent::CombatEnded { .. }))
            .count(),
        1
    );
    let deaths = events
        .iter()
        .filter(|e| matches!(e, CombatEvent::Death { .. }))
        .count();
    assert!(deaths >= 1);
}

#[test]
fn test_turn_events_are_paired() {
    let (_, events, _) = run_battle(5, 100_000);
    let started = events
        .iter()
        .filter(|e| matches!(e, CombatEvent::TurnStarted { .. }))
        .count();
    let ended = events
        .iter()
        .filter(|e| matches!(e, CombatEvent::TurnEnded { .. }))
        .count();
    assert_eq!(started, ended);
}

#[test]
fn test_service_round_trip() {
    separator("SERVICE");
    let mut service = BattleService::new(SessionConfig::default().with_seed(3));
    let id = service
        .start_combat(
            vec![make_combatant(1, "Warrior", Side::Ally, 50)],
            vec![make_combatant(2, "Goblin", Side::Enemy, 10).with_hp(5)],
        )
        .unwrap();

    let mut ready = Vec::new();
    while ready.is_empty() {
        ready = service.tick(id, 1.0).unwrap();
    }
    assert_eq!(ready, vec![CombatantId(1)]);

    let result = service
        .submit_action(id, CombatantId(1), Action::HpAttack { target: CombatantId(2) })
        .unwrap();
    assert_eq!(result.state, CombatState::Victory);
    assert_eq!(service.state(id).unwrap(), CombatState::Victory);

    let roster = service.end_combat(id).unwrap();
    let goblin = roster.iter().find(|c| c.id == CombatantId(2)).unwrap();
    assert!(!goblin.is_alive);
}
