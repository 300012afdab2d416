//! Game state and core simulation types
//!
//! All mutable simulation state lives in [`GameState`]. It is owned by the
//! engine and only changed inside a tick or by a round reset.

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::frenzy::Frenzy;
use super::pool::{Pool, PoolHandle, PoolStats, Poolable, truncate_to_cap};
use super::powerup::{self, PowerUpEffect};
use super::schedule::Scheduler;
use super::spawner::SpawnTimers;
use super::tuning::{EnemyKind, PowerUpKind, Rarity};
use super::weapon::{Weapon, WeaponKind};
use crate::error::SimError;
use crate::settings::{PoolCaps, Settings};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Menu,
    Playing,
    Paused,
    GameOver,
    /// Terminal state after a failed tick; only a new round leaves it
    Error,
}

/// Drawable area the simulation is confined to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasBounds {
    pub width: f32,
    pub height: f32,
}

impl CanvasBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// The player entity
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub base_speed: f32,
    /// Base speed plus every active bonus
    pub speed: f32,
    /// Remaining invulnerability (ms)
    pub invulnerable_ms: f64,
    pub shielded: bool,
    /// New bullets pass through enemies
    pub pierce: bool,
    /// Collectible attraction radius; zero when no magnet is active
    pub magnet_radius: f32,
    /// Active timed effects, oldest first
    pub effects: Vec<PowerUpEffect>,
    pub weapon: Weapon,
}

impl Player {
    pub fn new(settings: &Settings, bounds: &CanvasBounds) -> Self {
        Self {
            pos: bounds.center(),
            vel: Vec2::ZERO,
            radius: settings.player.radius,
            base_speed: settings.player.speed,
            speed: settings.player.speed,
            invulnerable_ms: 0.0,
            shielded: false,
            pierce: false,
            magnet_radius: 0.0,
            effects: Vec::with_capacity(PowerUpKind::ALL.len()),
            weapon: Weapon::from_settings(&settings.weapon),
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ms > 0.0 || self.shielded
    }

    pub fn has_effect(&self, kind: PowerUpKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }
}

/// An enemy entity (pooled)
#[derive(Debug, Clone, Default)]
pub struct Enemy {
    pub(crate) handle: PoolHandle,
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    /// Drives dash cycles, zig-zag wobble and boss dives (ms)
    pub pattern_timer: f64,
    /// Per-enemy phase offset; the orbit angle for bosses
    pub phase: f32,
    /// Marked for release at the end of the current step
    pub dead: bool,
}

impl Poolable for Enemy {
    fn handle(&self) -> PoolHandle {
        self.handle
    }

    fn set_handle(&mut self, handle: PoolHandle) {
        self.handle = handle;
    }

    fn reset(&mut self) {
        *self = Self {
            handle: self.handle,
            ..Self::default()
        };
    }
}

/// A bullet entity (pooled)
#[derive(Debug, Clone, Default)]
pub struct Bullet {
    pub(crate) handle: PoolHandle,
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: f32,
    pub kind: WeaponKind,
    pub pierce: bool,
    pub color: u32,
    pub age_ms: f64,
    pub lifetime_ms: f64,
    /// Enemies already damaged; a piercing bullet hits each enemy once
    pub struck: Vec<u32>,
    pub spent: bool,
}

impl Poolable for Bullet {
    fn handle(&self) -> PoolHandle {
        self.handle
    }

    fn set_handle(&mut self, handle: PoolHandle) {
        self.handle = handle;
    }

    fn reset(&mut self) {
        let mut struck = std::mem::take(&mut self.struck);
        struck.clear();
        *self = Self {
            handle: self.handle,
            struck,
            ..Self::default()
        };
    }
}

/// A score gem (pooled)
#[derive(Debug, Clone, Default)]
pub struct Collectible {
    pub(crate) handle: PoolHandle,
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub rarity: Rarity,
    pub color: u32,
    pub value: u64,
    pub rotation: f32,
    pub age_ms: f64,
    pub lifetime_ms: f64,
    /// Set once when the collectible is about to expire
    pub warning_played: bool,
    pub collected: bool,
}

impl Poolable for Collectible {
    fn handle(&self) -> PoolHandle {
        self.handle
    }

    fn set_handle(&mut self, handle: PoolHandle) {
        self.handle = handle;
    }

    fn reset(&mut self) {
        *self = Self {
            handle: self.handle,
            ..Self::default()
        };
    }
}

/// A power-up pickup lying in the arena (not pooled)
#[derive(Debug, Clone)]
pub struct PowerUpItem {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub kind: PowerUpKind,
    pub rarity: Rarity,
    pub color: u32,
    pub rotation: f32,
    pub age_ms: f64,
}

/// The three entity pools
#[derive(Debug)]
pub struct Pools {
    pub bullets: Pool<Bullet>,
    pub enemies: Pool<Enemy>,
    pub collectibles: Pool<Collectible>,
}

impl Pools {
    pub fn new(pooling: bool, caps: PoolCaps) -> Self {
        if pooling {
            Self {
                bullets: Pool::new("bullet", caps.max_bullets),
                enemies: Pool::new("enemy", caps.max_enemies),
                collectibles: Pool::new("collectible", caps.max_collectibles),
            }
        } else {
            Self {
                bullets: Pool::unpooled("bullet"),
                enemies: Pool::unpooled("enemy"),
                collectibles: Pool::unpooled("collectible"),
            }
        }
    }

    pub fn set_caps(&mut self, caps: PoolCaps) {
        self.bullets.set_max_free(caps.max_bullets);
        self.enemies.set_max_free(caps.max_enemies);
        self.collectibles.set_max_free(caps.max_collectibles);
    }

    pub fn stats(&self) -> AllPoolStats {
        AllPoolStats {
            bullets: self.bullets.stats(),
            enemies: self.enemies.stats(),
            collectibles: self.collectibles.stats(),
        }
    }
}

/// Snapshot of every pool's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllPoolStats {
    pub bullets: PoolStats,
    pub enemies: PoolStats,
    pub collectibles: PoolStats,
}

/// Complete simulation state
#[derive(Debug)]
pub struct GameState {
    pub phase: GamePhase,
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    /// Simulated time since the round started (ms); frozen while paused
    pub game_time: f64,
    /// Never decreases within a round
    pub difficulty: f32,
    pub combo: u32,
    pub combo_multiplier: f32,
    pub kill_streak: u32,
    pub last_kill_at: Option<f64>,
    pub last_collect_at: Option<f64>,
    pub kills: u64,

    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub collectibles: Vec<Collectible>,
    pub powerups: Vec<PowerUpItem>,

    pub frenzy: Frenzy,
    pub spawner: SpawnTimers,
    pub schedule: Scheduler,
    pub pools: Pools,
    /// Caps of the active quality tier
    pub caps: PoolCaps,
    pub rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Create an idle state in the menu phase
    pub fn new(settings: &Settings, bounds: &CanvasBounds, rng: Pcg32) -> Self {
        let caps = settings.caps();
        Self {
            phase: GamePhase::Menu,
            score: 0,
            lives: settings.player.initial_lives,
            level: 1,
            game_time: 0.0,
            difficulty: settings.difficulty.base,
            combo: 0,
            combo_multiplier: 1.0,
            kill_streak: 0,
            last_kill_at: None,
            last_collect_at: None,
            kills: 0,
            player: Player::new(settings, bounds),
            enemies: Vec::with_capacity(caps.max_enemies),
            bullets: Vec::with_capacity(caps.max_bullets),
            collectibles: Vec::with_capacity(caps.max_collectibles),
            powerups: Vec::new(),
            frenzy: Frenzy::default(),
            spawner: SpawnTimers::default(),
            schedule: Scheduler::default(),
            pools: Pools::new(settings.pooling, caps),
            caps,
            rng,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    /// Return every live pooled entity to its pool
    pub fn release_all(&mut self) -> Result<(), SimError> {
        for bullet in self.bullets.drain(..) {
            self.pools.bullets.release(bullet)?;
        }
        for enemy in self.enemies.drain(..) {
            self.pools.enemies.release(enemy)?;
        }
        for collectible in self.collectibles.drain(..) {
            self.pools.collectibles.release(collectible)?;
        }
        Ok(())
    }

    /// Release entities from the back of each collection until it fits the
    /// active caps. Returns how many were released.
    pub fn enforce_caps(&mut self) -> Result<usize, SimError> {
        let caps = self.caps;
        Ok(truncate_to_cap(&mut self.bullets, &mut self.pools.bullets, caps.max_bullets)?
            + truncate_to_cap(&mut self.enemies, &mut self.pools.enemies, caps.max_enemies)?
            + truncate_to_cap(
                &mut self.collectibles,
                &mut self.pools.collectibles,
                caps.max_collectibles,
            )?)
    }

    /// Drop every live entity without releasing it and start over with empty pools
    pub fn rebuild_pools(&mut self, pooling: bool) {
        self.bullets.clear();
        self.enemies.clear();
        self.collectibles.clear();
        self.pools = Pools::new(pooling, self.caps);
    }

    /// Reset everything for a new round and enter the playing phase.
    ///
    /// Pending scheduled tasks from the previous round are dropped.
    pub fn start_round(
        &mut self,
        settings: &Settings,
        bounds: &CanvasBounds,
    ) -> Result<(), SimError> {
        self.release_all()?;
        self.powerups.clear();
        self.schedule.clear();

        powerup::clear_effects(&mut self.player);
        self.player = Player::new(settings, bounds);
        self.frenzy = Frenzy::default();
        self.spawner = SpawnTimers::default();

        self.score = 0;
        self.lives = settings.player.initial_lives;
        self.level = 1;
        self.game_time = 0.0;
        self.difficulty = settings.difficulty.base;
        self.combo = 0;
        self.combo_multiplier = 1.0;
        self.kill_streak = 0;
        self.last_kill_at = None;
        self.last_collect_at = None;
        self.kills = 0;

        self.phase = GamePhase::Playing;
        Ok(())
    }

    /// Live boss, if any
    pub fn boss(&self) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.kind.is_boss() && !e.dead)
    }
}
