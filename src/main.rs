//! Arena Frenzy - headless runner
//!
//! Usage: `arena-frenzy [settings.json] [ticks]`
//!
//! Plays one seeded round with an autopilot and prints every returned event as
//! a JSON line. Logging goes to stderr and is controlled with `RUST_LOG`.

use std::env;
use std::fs;
use std::process::ExitCode;

use arena_frenzy::consts::NOMINAL_DT_MS;
use arena_frenzy::sim::{GamePhase, TickInput};
use arena_frenzy::{CanvasBounds, Engine, Settings};
use glam::Vec2;

const DEFAULT_TICKS: u64 = 60 * 60 * 3;
const DEFAULT_SEED: u64 = 42;
/// The autopilot backs away from enemies closer than this (px)
const DANGER_RADIUS: f32 = 150.0;
/// Ignore direction components smaller than this when picking keys
const KEY_DEADZONE: f32 = 0.3;

fn nearest(from: Vec2, points: impl Iterator<Item = Vec2>) -> Option<Vec2> {
    points.min_by(|a, b| {
        a.distance_squared(from)
            .partial_cmp(&b.distance_squared(from))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

/// Pick keys and aim the way a cautious player would: back away from the
/// nearest enemy, otherwise walk to the nearest pickup, and keep firing.
fn autopilot(engine: &Engine) -> TickInput {
    let player = engine.player().pos;
    let enemy = nearest(player, engine.enemies().iter().map(|e| e.pos));
    let pickup = nearest(
        player,
        engine
            .collectibles()
            .iter()
            .map(|c| c.pos)
            .chain(engine.powerups().iter().map(|p| p.pos)),
    );

    let heading = match (enemy, pickup) {
        (Some(e), _) if e.distance(player) < DANGER_RADIUS => (player - e).normalize_or_zero(),
        (_, Some(p)) => (p - player).normalize_or_zero(),
        _ => Vec2::ZERO,
    };

    let mut keys = Vec::new();
    if heading.x > KEY_DEADZONE {
        keys.push("KeyD");
    } else if heading.x < -KEY_DEADZONE {
        keys.push("KeyA");
    }
    if heading.y > KEY_DEADZONE {
        keys.push("KeyS");
    } else if heading.y < -KEY_DEADZONE {
        keys.push("KeyW");
    }

    let input = TickInput::with_keys(keys);
    match enemy {
        Some(target) => input.with_mouse(target.x, target.y, true),
        None => input,
    }
}

fn load_settings(path: Option<&str>) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = match path {
        Some(path) => Settings::from_json(&fs::read_to_string(path)?)?,
        None => Settings::default(),
    };
    settings.seed.get_or_insert(DEFAULT_SEED);
    Ok(settings)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    let settings = load_settings(args.first().map(String::as_str))?;
    let ticks = match args.get(1) {
        Some(raw) => raw.parse::<u64>()?,
        None => DEFAULT_TICKS,
    };

    let mut engine = Engine::new(settings, Some(CanvasBounds::new(800.0, 600.0)))?;
    engine.start_game();

    for _ in 0..ticks {
        let input = autopilot(&engine);
        if let Some(event) = engine.update(NOMINAL_DT_MS, &input) {
            println!("{}", serde_json::to_string(&event)?);
        }
        if engine.phase() != GamePhase::Playing {
            break;
        }
    }

    // Whatever the last tick left behind
    for event in engine.drain_events() {
        println!("{}", serde_json::to_string(&event)?);
    }

    let state = engine.state();
    log::info!(
        "Finished after {:.1}s: score {}, level {}, {} kills, phase {:?}",
        state.game_time / 1000.0,
        state.score,
        state.level,
        state.kills,
        state.phase
    );
    log::info!("Pool stats: {}", serde_json::to_string(&engine.pool_stats())?);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Arena Frenzy (headless) starting...");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("arena-frenzy: {err}");
            ExitCode::FAILURE
        }
    }
}
