//! Difficulty curve and spawn timing
//!
//! Each spawn family has its own timer measured in game time. Spawns are
//! skipped silently when the target collection is at its quality cap.

use glam::Vec2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use super::collision::{random_edge_point, random_inner_point};
use super::events::{EventQueue, GameEvent};
use super::schedule::ScheduledTask;
use super::state::{CanvasBounds, GameState, PowerUpItem};
use super::tuning::{EnemyKind, PowerUpKind, Rarity};
use crate::consts::SPAWN_MARGIN;
use crate::settings::Settings;

/// Radius of collectible gems
pub const COLLECTIBLE_RADIUS: f32 = 8.0;
/// Radius of power-up pickups
pub const POWERUP_RADIUS: f32 = 14.0;
/// Collectibles and power-ups keep this far from the canvas edge
const PICKUP_INSET: f32 = 40.0;
/// Scatter applied to swarm members and boss rewards
const CLUSTER_JITTER: f32 = 20.0;

/// Game time of the last spawn of each family (ms)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnTimers {
    pub last_collectible: f64,
    pub last_enemy: f64,
    pub last_powerup: f64,
    pub last_boss: f64,
    /// The intensity wave runs until this time
    pub intensity_until: f64,
    pub next_intensity_roll: f64,
}

impl SpawnTimers {
    pub fn intensity_active(&self, now: f64) -> bool {
        now < self.intensity_until
    }
}

/// `base + floor(elapsed / interval) * increment`
pub fn difficulty_at(settings: &Settings, elapsed_ms: f64) -> f32 {
    let d = &settings.difficulty;
    let steps = (elapsed_ms / d.interval_ms).floor() as f32;
    d.base + steps * d.increment
}

/// Raise the difficulty to match elapsed time; never lowers it
pub fn update_difficulty(state: &mut GameState, settings: &Settings) {
    let target = difficulty_at(settings, state.game_time);
    if target > state.difficulty {
        state.difficulty = target;
        log::info!("Difficulty rose to {:.2}", target);
    }
}

/// Enemy speed factor for a difficulty
pub fn speed_scale(difficulty: f32) -> f32 {
    1.0 + (difficulty - 1.0).max(0.0) * 0.1
}

/// Wave interval at a difficulty, before the intensity wave halves it
pub fn enemy_interval(settings: &Settings, difficulty: f32) -> f64 {
    let s = &settings.spawn;
    (s.enemy_interval_ms / difficulty.max(0.01) as f64).max(s.min_enemy_interval_ms)
}

fn pick<T: Copy>(rng: &mut impl Rng, items: &[T], weight: impl Fn(T) -> f32, fallback: T) -> T {
    match WeightedIndex::new(items.iter().map(|&item| weight(item))) {
        Ok(dist) => items[dist.sample(rng)],
        Err(_) => fallback,
    }
}

/// Weighted enemy pick; frenzy tiers shift weight toward aggressive kinds
pub fn pick_enemy_kind(rng: &mut impl Rng, frenzy_tier: u8) -> EnemyKind {
    pick(
        rng,
        &EnemyKind::SPAWNABLE,
        |kind| kind.weight(frenzy_tier),
        EnemyKind::Normal,
    )
}

pub fn pick_rarity(rng: &mut impl Rng, include_legendary: bool) -> Rarity {
    const GEM_RARITIES: [Rarity; 3] = [Rarity::Common, Rarity::Rare, Rarity::Epic];
    let pool: &[Rarity] = if include_legendary {
        &Rarity::ALL
    } else {
        &GEM_RARITIES
    };
    pick(rng, pool, |r| r.stats().spawn_weight, Rarity::Common)
}

pub fn pick_powerup_kind(rng: &mut impl Rng) -> PowerUpKind {
    pick(
        rng,
        &PowerUpKind::ALL,
        |kind| kind.stats().spawn_weight,
        PowerUpKind::RapidFire,
    )
}

/// Take an enemy from the pool. Returns false at the cap.
pub fn spawn_enemy(state: &mut GameState, kind: EnemyKind, pos: Vec2) -> bool {
    if state.enemies.len() >= state.caps.max_enemies {
        return false;
    }
    let stats = kind.stats();
    let id = state.next_entity_id();
    let phase = state.rng.random_range(0.0..std::f32::consts::TAU);
    let mut enemy = state.pools.enemies.acquire();
    enemy.id = id;
    enemy.kind = kind;
    enemy.pos = pos;
    enemy.radius = stats.radius;
    enemy.health = stats.health;
    enemy.max_health = stats.health;
    enemy.speed = stats.speed * speed_scale(state.difficulty);
    enemy.phase = phase;
    state.enemies.push(enemy);
    log::debug!("Spawned {:?} #{} at ({:.0}, {:.0})", kind, id, pos.x, pos.y);
    true
}

/// Drop a score gem somewhere inside the canvas. Returns false at the cap.
pub fn spawn_collectible(
    state: &mut GameState,
    settings: &Settings,
    bounds: &CanvasBounds,
) -> bool {
    if state.collectibles.len() >= state.caps.max_collectibles {
        return false;
    }
    let rarity = pick_rarity(&mut state.rng, false);
    let pos = random_inner_point(&mut state.rng, bounds, PICKUP_INSET);
    let stats = rarity.stats();
    let id = state.next_entity_id();
    let mut gem = state.pools.collectibles.acquire();
    gem.id = id;
    gem.pos = pos;
    gem.radius = COLLECTIBLE_RADIUS;
    gem.rarity = rarity;
    gem.color = stats.color;
    gem.value = stats.collectible_value;
    gem.lifetime_ms = settings.spawn.collectible_lifetime_ms;
    state.collectibles.push(gem);
    true
}

/// Place a power-up pickup
pub fn spawn_powerup_item(state: &mut GameState, pos: Vec2, kind: PowerUpKind, rarity: Rarity) {
    let id = state.next_entity_id();
    state.powerups.push(PowerUpItem {
        id,
        pos,
        radius: POWERUP_RADIUS,
        kind,
        rarity,
        color: kind.stats().color,
        rotation: 0.0,
        age_ms: 0.0,
    });
    log::debug!("Power-up {:?} ({:?}) placed", kind, rarity);
}

/// Spawn the boss above the canvas if none is alive and enough enemy slots are free
pub fn spawn_boss(
    state: &mut GameState,
    settings: &Settings,
    bounds: &CanvasBounds,
    events: &mut EventQueue,
) -> bool {
    if state.boss().is_some() {
        return false;
    }
    if state.enemies.len() + settings.boss.headroom > state.caps.max_enemies {
        return false;
    }
    let pos = Vec2::new(bounds.width / 2.0, -SPAWN_MARGIN);
    if !spawn_enemy(state, EnemyKind::Boss, pos) {
        return false;
    }
    let health = EnemyKind::Boss.stats().health * state.difficulty;
    if let Some(boss) = state.enemies.last_mut() {
        boss.health = health;
        boss.max_health = health;
    }
    log::info!("Boss spawned with {:.0} health", health);
    events.push(GameEvent::BossSpawned { pos, health });
    true
}

fn jitter(rng: &mut impl Rng) -> Vec2 {
    Vec2::new(
        rng.random_range(-CLUSTER_JITTER..CLUSTER_JITTER),
        rng.random_range(-CLUSTER_JITTER..CLUSTER_JITTER),
    )
}

/// One enemy, or occasionally a staggered swarm of one kind
fn spawn_wave(state: &mut GameState, settings: &Settings, bounds: &CanvasBounds) {
    let now = state.game_time;
    let kind = pick_enemy_kind(&mut state.rng, state.frenzy.tier);
    let origin = random_edge_point(&mut state.rng, bounds, SPAWN_MARGIN);

    let s = &settings.spawn;
    let swarm = now >= s.swarm_warmup_ms && state.rng.random_bool(s.swarm_chance.clamp(0.0, 1.0));
    if !swarm {
        spawn_enemy(state, kind, origin);
        return;
    }

    let count = 3 + state.difficulty.floor().max(0.0) as usize;
    log::debug!("Swarm of {} {:?}", count, kind);
    for i in 0..count {
        let pos = origin + jitter(&mut state.rng);
        state
            .schedule
            .schedule(now + i as f64 * s.swarm_stagger_ms, ScheduledTask::SpawnEnemy { kind, pos });
    }
}

fn roll_intensity(state: &mut GameState, settings: &Settings) {
    let now = state.game_time;
    let s = &settings.spawn;
    if now < s.intensity_warmup_ms || now < state.spawner.next_intensity_roll {
        return;
    }
    state.spawner.next_intensity_roll = now + s.intensity_roll_interval_ms;
    if state.spawner.intensity_active(now) {
        return;
    }
    if state.rng.random_bool(s.intensity_chance.clamp(0.0, 1.0)) {
        state.spawner.intensity_until = now + s.intensity_duration_ms;
        log::debug!("Intensity wave until {:.0}", state.spawner.intensity_until);
    }
}

/// Run every spawn timer for the current tick
pub fn run(
    state: &mut GameState,
    settings: &Settings,
    bounds: &CanvasBounds,
    events: &mut EventQueue,
) {
    roll_intensity(state, settings);

    let now = state.game_time;
    let scale = if state.spawner.intensity_active(now) { 0.5 } else { 1.0 };
    let s = &settings.spawn;

    if now - state.spawner.last_collectible >= s.collectible_interval_ms * scale {
        state.spawner.last_collectible = now;
        spawn_collectible(state, settings, bounds);
    }

    if now - state.spawner.last_enemy >= enemy_interval(settings, state.difficulty) * scale {
        state.spawner.last_enemy = now;
        spawn_wave(state, settings, bounds);
    }

    if now - state.spawner.last_powerup >= s.powerup_interval_ms * scale {
        state.spawner.last_powerup = now;
        let kind = pick_powerup_kind(&mut state.rng);
        let rarity = pick_rarity(&mut state.rng, true);
        let pos = random_inner_point(&mut state.rng, bounds, PICKUP_INSET);
        spawn_powerup_item(state, pos, kind, rarity);
    }

    // The boss timer only resets once a boss actually appears
    if now - state.spawner.last_boss >= settings.boss.interval_ms
        && state.score >= settings.boss.min_score
        && spawn_boss(state, settings, bounds, events)
    {
        state.spawner.last_boss = now;
    }
}

/// Scatter `count` legendary rewards around `center`, one every stagger interval
pub fn schedule_boss_rewards(state: &mut GameState, settings: &Settings, center: Vec2) {
    let now = state.game_time;
    for i in 0..settings.boss.reward_count {
        let kind = pick_powerup_kind(&mut state.rng);
        let pos = center + jitter(&mut state.rng) * 2.0;
        state.schedule.schedule(
            now + i as f64 * settings.boss.reward_stagger_ms,
            ScheduledTask::SpawnPowerUp {
                pos,
                kind,
                rarity: Rarity::Legendary,
            },
        );
    }
}
