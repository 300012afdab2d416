//! Per-frame simulation step
//!
//! One call advances the round by a clamped delta. Generated events go to the
//! queue in the order they happen; a level-up or game-over is returned
//! directly so it takes priority over anything queued in the same step.

use std::collections::HashMap;

use glam::Vec2;

use super::collision::clamp_to_bounds;
use super::combat;
use super::enemy;
use super::events::{EventQueue, GameEvent};
use super::frenzy::FrenzyEndReason;
use super::pickup;
use super::powerup;
use super::schedule::ScheduledTask;
use super::spawner;
use super::state::{CanvasBounds, GamePhase, GameState};
use super::weapon;
use crate::consts::{MAX_DT_MS, NOMINAL_DT_MS};
use crate::error::SimError;
use crate::settings::Settings;

const UP_KEYS: [&str; 3] = ["KeyW", "ArrowUp", "w"];
const DOWN_KEYS: [&str; 3] = ["KeyS", "ArrowDown", "s"];
const LEFT_KEYS: [&str; 3] = ["KeyA", "ArrowLeft", "a"];
const RIGHT_KEYS: [&str; 3] = ["KeyD", "ArrowRight", "d"];

/// Pointer snapshot in canvas coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MouseState {
    pub x: f32,
    pub y: f32,
    pub down: bool,
}

/// Input snapshot for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Key code to held state; unknown codes are ignored
    pub keys: HashMap<String, bool>,
    pub mouse: Option<MouseState>,
}

impl TickInput {
    pub fn with_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            keys: keys.into_iter().map(|k| (k.to_string(), true)).collect(),
            mouse: None,
        }
    }

    pub fn with_mouse(mut self, x: f32, y: f32, down: bool) -> Self {
        self.mouse = Some(MouseState { x, y, down });
        self
    }

    pub fn pressed(&self, code: &str) -> bool {
        self.keys.get(code).copied().unwrap_or(false)
    }

    fn any_pressed(&self, codes: &[&str]) -> bool {
        codes.iter().any(|code| self.pressed(code))
    }

    /// Unit movement direction from WASD / arrow keys, zero when idle
    pub fn move_axis(&self) -> Vec2 {
        let axis = |neg: &[&str], pos: &[&str]| {
            self.any_pressed(pos) as i32 as f32 - self.any_pressed(neg) as i32 as f32
        };
        Vec2::new(axis(&LEFT_KEYS, &RIGHT_KEYS), axis(&UP_KEYS, &DOWN_KEYS)).normalize_or_zero()
    }

    /// Fire target while the button is held. Non-finite coordinates count as no input.
    pub fn aim(&self) -> Option<Vec2> {
        let mouse = self.mouse?;
        let target = Vec2::new(mouse.x, mouse.y);
        if !target.is_finite() {
            log::warn!("Ignoring non-finite mouse position ({}, {})", mouse.x, mouse.y);
            return None;
        }
        mouse.down.then_some(target)
    }
}

/// Clamp a frame delta to `(0, MAX_DT_MS]`; bad values become the nominal delta
pub fn normalize_dt(dt_ms: f32) -> f32 {
    if !dt_ms.is_finite() || dt_ms <= 0.0 {
        log::warn!("Replacing frame delta {} with {:.2} ms", dt_ms, NOMINAL_DT_MS);
        return NOMINAL_DT_MS;
    }
    dt_ms.min(MAX_DT_MS)
}

fn run_scheduled(state: &mut GameState) {
    while let Some(task) = state.schedule.pop_due(state.game_time) {
        log::debug!("Running scheduled {:?}", task);
        match task {
            ScheduledTask::SpawnPowerUp { pos, kind, rarity } => {
                spawner::spawn_powerup_item(state, pos, kind, rarity);
            }
            ScheduledTask::SpawnEnemy { kind, pos } => {
                spawner::spawn_enemy(state, kind, pos);
            }
        }
    }
}

fn move_player(
    state: &mut GameState,
    bounds: &CanvasBounds,
    input: &TickInput,
    dt_ms: f32,
) -> Result<(), SimError> {
    let player = &mut state.player;
    player.vel = input.move_axis() * player.speed;
    let next = player.pos + player.vel * (dt_ms / 1000.0);
    if !next.is_finite() {
        return Err(SimError::NonFinitePlayer);
    }
    player.pos = clamp_to_bounds(next, player.radius, bounds);
    player.invulnerable_ms = (player.invulnerable_ms - dt_ms as f64).max(0.0);
    Ok(())
}

/// Level-up and lives check. GameOver wins over LevelUp, which is then queued.
fn check_progress(
    state: &mut GameState,
    settings: &Settings,
    events: &mut EventQueue,
) -> Option<GameEvent> {
    let level = 1 + (state.score / settings.combo.level_threshold.max(1)) as u32;
    let level_up = (level > state.level).then(|| {
        state.level = level;
        log::info!("Reached level {}", level);
        GameEvent::LevelUp { level }
    });

    if state.lives == 0 {
        state.phase = GamePhase::GameOver;
        log::info!("Game over: score {} at level {}", state.score, state.level);
        if let Some(event) = level_up {
            events.push(event);
        }
        return Some(GameEvent::GameOver {
            score: state.score,
            level: state.level,
        });
    }
    level_up
}

fn check_invariants(state: &GameState, settings: &Settings) -> Result<(), SimError> {
    if state.lives > settings.player.max_lives {
        return Err(SimError::LivesOutOfRange {
            lives: state.lives,
            max: settings.player.max_lives,
        });
    }
    if !state.player.pos.is_finite() {
        return Err(SimError::NonFinitePlayer);
    }
    let caps = state.caps;
    for (pool, len, cap) in [
        ("bullet", state.bullets.len(), caps.max_bullets),
        ("enemy", state.enemies.len(), caps.max_enemies),
        ("collectible", state.collectibles.len(), caps.max_collectibles),
    ] {
        if len > cap {
            return Err(SimError::CapExceeded { pool, len, cap });
        }
    }
    state.frenzy.validate(settings.frenzy.max_tier())
}

/// Advance a playing round by `dt_ms`.
///
/// Returns the priority event of this step, if any. Everything else the step
/// produced is appended to `events`. Outside the playing phase this is a no-op.
pub fn tick(
    state: &mut GameState,
    settings: &Settings,
    bounds: &CanvasBounds,
    input: &TickInput,
    dt_ms: f32,
    events: &mut EventQueue,
) -> Result<Option<GameEvent>, SimError> {
    if state.phase != GamePhase::Playing {
        return Ok(None);
    }
    let dt_ms = normalize_dt(dt_ms);
    state.game_time += dt_ms as f64;

    // Expiry always tears down before anything this step can re-trigger frenzy
    if let Some(tier) = state.frenzy.check_expiry(&mut state.player, state.game_time) {
        events.push(GameEvent::FrenzyEnd {
            tier,
            reason: FrenzyEndReason::Expired,
        });
    }

    run_scheduled(state);
    spawner::update_difficulty(state, settings);

    move_player(state, bounds, input, dt_ms)?;
    if let Some(target) = input.aim() {
        weapon::fire(state, settings, target);
    }

    spawner::run(state, settings, bounds, events);
    weapon::advance_bullets(state, bounds, dt_ms)?;
    enemy::steer_enemies(state, bounds, dt_ms)?;
    pickup::advance_pickups(state, dt_ms)?;

    combat::resolve_bullet_hits(state, settings, events)?;
    pickup::collect(state, settings, events)?;
    combat::resolve_contact(state, settings, events)?;

    powerup::expire_effects(&mut state.player, state.game_time);
    pickup::decay_combo(state, &settings.combo);

    let priority = check_progress(state, settings, events);
    check_invariants(state, settings)?;
    Ok(priority)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spawner::spawn_enemy;
    use crate::sim::tuning::EnemyKind;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    /// Settings with every random spawner pushed out of reach
    fn quiet() -> Settings {
        let mut settings = Settings::seeded(1);
        settings.spawn.collectible_interval_ms = 1e12;
        settings.spawn.enemy_interval_ms = 1e12;
        settings.spawn.min_enemy_interval_ms = 1e12;
        settings.spawn.powerup_interval_ms = 1e12;
        settings.boss.interval_ms = 1e12;
        settings
    }

    fn playing(settings: &Settings) -> (GameState, CanvasBounds) {
        let bounds = CanvasBounds::new(800.0, 600.0);
        let mut state = GameState::new(settings, &bounds, Pcg32::seed_from_u64(21));
        state.start_round(settings, &bounds).unwrap();
        (state, bounds)
    }

    #[test]
    fn test_normalize_dt() {
        assert_eq!(normalize_dt(16.0), 16.0);
        assert_eq!(normalize_dt(250.0), MAX_DT_MS);
        assert_eq!(normalize_dt(0.0), NOMINAL_DT_MS);
        assert_eq!(normalize_dt(-5.0), NOMINAL_DT_MS);
        assert_eq!(normalize_dt(f32::NAN), NOMINAL_DT_MS);
    }

    #[test]
    fn test_move_axis() {
        let input = TickInput::with_keys(["KeyD", "ArrowDown"]);
        let axis = input.move_axis();
        assert!((axis - Vec2::new(1.0, 1.0).normalize()).length() < 0.001);

        let mut input = TickInput::with_keys(["KeyA", "KeyD"]);
        assert_eq!(input.move_axis(), Vec2::ZERO);
        input.keys.insert("KeyD".into(), false);
        assert_eq!(input.move_axis(), Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_aim_requires_button_and_finite_coords() {
        assert_eq!(TickInput::default().aim(), None);
        assert_eq!(TickInput::default().with_mouse(1.0, 2.0, false).aim(), None);
        assert_eq!(TickInput::default().with_mouse(f32::NAN, 2.0, true).aim(), None);
        assert_eq!(
            TickInput::default().with_mouse(1.0, 2.0, true).aim(),
            Some(Vec2::new(1.0, 2.0))
        );
    }

    #[test]
    fn test_tick_is_noop_outside_playing() {
        let settings = quiet();
        let bounds = CanvasBounds::new(800.0, 600.0);
        let mut state = GameState::new(&settings, &bounds, Pcg32::seed_from_u64(1));
        let mut events = EventQueue::default();
        let out = tick(&mut state, &settings, &bounds, &TickInput::default(), 16.0, &mut events);
        assert_eq!(out, Ok(None));
        assert_eq!(state.game_time, 0.0);
    }

    #[test]
    fn test_player_moves_and_stays_in_bounds() {
        let settings = quiet();
        let (mut state, bounds) = playing(&settings);
        let mut events = EventQueue::default();
        let input = TickInput::with_keys(["ArrowRight"]);
        tick(&mut state, &settings, &bounds, &input, 100.0, &mut events).unwrap();
        assert!((state.player.pos.x - 425.0).abs() < 0.01);

        for _ in 0..100 {
            tick(&mut state, &settings, &bounds, &input, 100.0, &mut events).unwrap();
        }
        assert_eq!(state.player.pos.x, 800.0 - state.player.radius);
    }

    #[test]
    fn test_held_mouse_autofires() {
        let settings = quiet();
        let (mut state, bounds) = playing(&settings);
        let mut events = EventQueue::default();
        let input = TickInput::default().with_mouse(700.0, 300.0, true);
        tick(&mut state, &settings, &bounds, &input, 16.0, &mut events).unwrap();
        assert_eq!(state.bullets.len(), 1);
    }

    #[test]
    fn test_last_life_returns_game_over() {
        let settings = quiet();
        let (mut state, bounds) = playing(&settings);
        let mut events = EventQueue::default();
        state.lives = 1;
        let at = state.player.pos;
        spawn_enemy(&mut state, EnemyKind::Tank, at);

        let out =
            tick(&mut state, &settings, &bounds, &TickInput::default(), 16.0, &mut events).unwrap();
        assert_eq!(out, Some(GameEvent::GameOver { score: 0, level: 1 }));
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(matches!(events.pop(), Some(GameEvent::Hit { lives: 0, .. })));
    }

    #[test]
    fn test_frenzy_expiry_queues_end_event() {
        let settings = quiet();
        let (mut state, bounds) = playing(&settings);
        let mut events = EventQueue::default();
        let source = crate::sim::frenzy::FrenzySource::Combo;
        state.frenzy.start(&mut state.player, &settings.frenzy, 1, source, 0.0);
        let input = TickInput::default();
        for _ in 0..51 {
            tick(&mut state, &settings, &bounds, &input, 100.0, &mut events).unwrap();
        }
        assert!(!state.frenzy.active);
        assert_eq!(state.player.speed, settings.player.speed);
        assert_eq!(
            events.pop(),
            Some(GameEvent::FrenzyEnd { tier: 1, reason: FrenzyEndReason::Expired })
        );
    }

    #[test]
    fn test_scheduled_tasks_wait_for_game_time() {
        let settings = quiet();
        let (mut state, bounds) = playing(&settings);
        let mut events = EventQueue::default();
        state.schedule.schedule(
            150.0,
            ScheduledTask::SpawnEnemy { kind: EnemyKind::Normal, pos: Vec2::new(10.0, 10.0) },
        );
        tick(&mut state, &settings, &bounds, &TickInput::default(), 100.0, &mut events).unwrap();
        assert!(state.enemies.is_empty());
        tick(&mut state, &settings, &bounds, &TickInput::default(), 100.0, &mut events).unwrap();
        assert_eq!(state.enemies.len(), 1);
    }

    #[test]
    fn test_invariant_violation_is_an_error() {
        let settings = quiet();
        let (mut state, bounds) = playing(&settings);
        let mut events = EventQueue::default();
        state.lives = 9;
        let out = tick(&mut state, &settings, &bounds, &TickInput::default(), 16.0, &mut events);
        assert_eq!(out, Err(SimError::LivesOutOfRange { lives: 9, max: 5 }));
    }
}
