//! Headless auto-battle runner
//!
//! Loads a battle file, runs both sides with the auto policy until the fight
//! ends or the tick budget runs out, and prints a summary.

mod battle;
mod policy;

use anyhow::{Context, Result};
use battle::BattleFile;
use brave_core::combat::{
    Action, CombatError, CombatEvent, CombatSession, CombatState, SessionConfig,
};
use brave_core::config::{default_constants, default_periodic, load_constants, load_trait_table};
use brave_core::traits::{TraitEngine, TraitTable};
use brave_core::types::CombatantId;
use clap::Parser;
use policy::AutoPolicy;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Brave battle simulator
#[derive(Parser, Debug)]
#[command(name = "brave_sim")]
#[command(about = "Run an auto-battle from a battle file and report the outcome")]
struct Args {
    /// Battle file to run
    #[arg(default_value = "brave_sim/battles/demo.toml")]
    battle: PathBuf,

    /// Random seed; falls back to the battle file's seed, then 0
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum ticks before the battle is abandoned
    #[arg(long, default_value_t = 100_000)]
    max_ticks: u64,

    /// Time advanced per tick
    #[arg(long, default_value_t = 1.0)]
    delta: f64,

    /// Combat constants file; the built-in constants otherwise
    #[arg(long)]
    constants: Option<PathBuf>,

    /// Trait table file; the built-in table otherwise
    #[arg(long)]
    traits: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,

    /// Print every combat event
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct BattleSummary {
    outcome: CombatState,
    ticks: u64,
    turns: u32,
    seed: u64,
    breaks: usize,
    deaths: usize,
    survivors: Vec<Survivor>,
}

#[derive(Serialize)]
struct Survivor {
    name: String,
    hp: u32,
    max_hp: u32,
    wound: u32,
}

fn build_config(args: &Args, seed: u64) -> Result<SessionConfig> {
    let constants = match &args.constants {
        Some(path) => load_constants(path)
            .with_context(|| format!("failed to load constants {}", path.display()))?,
        None => default_constants(),
    };
    let table = match &args.traits {
        Some(path) => load_trait_table(path)
            .with_context(|| format!("failed to load traits {}", path.display()))?,
        None => TraitTable::builtin(),
    };
    let traits = TraitEngine::new(Arc::new(table), constants.traits.clone());

    Ok(SessionConfig {
        constants: Arc::new(constants),
        traits: Arc::new(traits),
        periodic: Arc::new(default_periodic()),
        seed,
    })
}

/// Run the policy's action, falling back to Defend when the turn is still
/// open. Returns every rejection, each already logged.
fn take_turn(session: &mut CombatSession, actor: CombatantId, action: Action) -> Vec<CombatError> {
    let mut rejected = Vec::new();
    let Err(err) = session.execute_action(actor, action) else {
        return rejected;
    };
    warn!(combatant = %actor, error = %err, "policy action rejected");
    let retry = !err.consumes_turn();
    rejected.push(err);

    if retry {
        if let Err(err) = session.execute_action(actor, Action::Defend) {
            warn!(combatant = %actor, error = %err, "fallback defend rejected");
            rejected.push(err);
        }
    }
    rejected
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let battle = BattleFile::load(&args.battle)?;
    let seed = args.seed.or(battle.seed).unwrap_or(0);
    let policy = AutoPolicy::new(battle.loadouts()?);

    let config = build_config(&args, seed)?;
    let mut session = CombatSession::new(battle.allies(), battle.enemies(), config);
    session.start()?;
    info!(seed, battle = %args.battle.display(), "battle started");

    let mut events: Vec<CombatEvent> = session.take_events();
    let mut ticks = 0;
    while session.state().is_active() && ticks < args.max_ticks {
        ticks += 1;
        for actor in session.tick(args.delta)? {
            if !session.state().is_active() {
                break;
            }
            if !session.scheduler().can_act(actor) {
                continue;
            }
            let action = policy.choose(&session, actor);
            take_turn(&mut session, actor, action);
        }
        let fresh = session.take_events();
        if args.verbose {
            for event in &fresh {
                println!("{}", serde_json::to_string(event)?);
            }
        }
        events.extend(fresh);
    }

    let outcome = session.state();
    if outcome.is_active() {
        warn!(ticks, "tick budget exhausted");
    }

    let summary = BattleSummary {
        outcome,
        ticks,
        turns: session.turn_count(),
        seed,
        breaks: events
            .iter()
            .filter(|e| matches!(e, CombatEvent::Break { .. }))
            .count(),
        deaths: events
            .iter()
            .filter(|e| matches!(e, CombatEvent::Death { .. }))
            .count(),
        survivors: session
            .combatants()
            .iter()
            .filter(|c| c.is_alive)
            .map(|c| Survivor {
                name: c.name.clone(),
                hp: c.current_hp,
                max_hp: c.max_hp,
                wound: c.wound,
            })
            .collect(),
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Outcome: {:?} after {} ticks, {} turns (seed {})",
            summary.outcome, summary.ticks, summary.turns, summary.seed
        );
        println!("BREAKs: {}  Deaths: {}", summary.breaks, summary.deaths);
        for survivor in &summary.survivors {
            println!(
                "  {:<12} {:>5}/{:<5} wound {}",
                survivor.name, survivor.hp, survivor.max_hp, survivor.wound
            );
        }
    }

    session.end();
    Ok(())
}
