//! Weapons, firing patterns and bullet lifecycle

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::is_offscreen;
use super::pool::release_where;
use super::powerup;
use super::state::{Bullet, CanvasBounds, GameState};
use crate::consts::MIN_AIM_DISTANCE;
use crate::error::SimError;
use crate::settings::{Settings, WeaponSettings};
use crate::{angle_of, direction_from_angle};

/// Weapon firing modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponKind {
    #[default]
    Basic,
    Spread,
    Explosive,
}

impl WeaponKind {
    pub fn bullet_color(self) -> u32 {
        match self {
            WeaponKind::Basic => 0xe6f7ff,
            WeaponKind::Spread => 0x7dff7d,
            WeaponKind::Explosive => 0xff9933,
        }
    }
}

/// Colour of bullets fired while the ultimate combo is active
pub const ULTIMATE_BULLET_COLOR: u32 = 0xffd700;
/// Lifetime of explosion ring bullets (ms)
pub const EXPLOSION_BULLET_LIFETIME_MS: f64 = 600.0;

/// The player's weapon
#[derive(Debug, Clone)]
pub struct Weapon {
    pub kind: WeaponKind,
    /// Shots per second, after every active modifier
    pub fire_rate: f32,
    pub damage: f32,
    pub damage_multiplier: f32,
    pub bullet_speed: f32,
    pub bullet_radius: f32,
    pub bullet_lifetime_ms: f64,
    pub last_shot_at: Option<f64>,
}

impl Weapon {
    pub fn from_settings(settings: &WeaponSettings) -> Self {
        Self {
            kind: WeaponKind::Basic,
            fire_rate: settings.fire_rate,
            damage: settings.damage,
            damage_multiplier: 1.0,
            bullet_speed: settings.bullet_speed,
            bullet_radius: settings.bullet_radius,
            bullet_lifetime_ms: settings.bullet_lifetime_ms,
            last_shot_at: None,
        }
    }

    /// Minimum time between shots (ms)
    pub fn cooldown_ms(&self) -> f64 {
        1000.0 / self.fire_rate as f64
    }

    pub fn ready(&self, now: f64) -> bool {
        self.last_shot_at
            .is_none_or(|last| now - last >= self.cooldown_ms())
    }
}

/// Bullet fan for a single trigger pull
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotPattern {
    pub count: usize,
    /// Angle between neighbouring bullets (radians)
    pub step: f32,
    pub kind: WeaponKind,
    pub color: u32,
}

impl ShotPattern {
    /// Pattern for the weapon's current mode. `ultimate` overrides it with the
    /// wide explosive fan.
    pub fn for_weapon(kind: WeaponKind, ultimate: bool, settings: &WeaponSettings) -> Self {
        if ultimate {
            return Self {
                count: 7,
                step: settings.ultimate_spread_step,
                kind: WeaponKind::Explosive,
                color: ULTIMATE_BULLET_COLOR,
            };
        }
        match kind {
            WeaponKind::Spread => Self {
                count: 5,
                step: settings.spread_step,
                kind,
                color: kind.bullet_color(),
            },
            _ => Self {
                count: 1,
                step: 0.0,
                kind,
                color: kind.bullet_color(),
            },
        }
    }

    /// Bullet angles, symmetric around `aim`
    pub fn angles(&self, aim: f32) -> impl Iterator<Item = f32> + '_ {
        let half = (self.count as f32 - 1.0) / 2.0;
        (0..self.count).map(move |i| aim + (i as f32 - half) * self.step)
    }
}

/// Take a bullet from the pool and put it in flight. Returns false at the cap.
pub fn spawn_bullet(
    state: &mut GameState,
    pos: Vec2,
    vel: Vec2,
    kind: WeaponKind,
    color: u32,
    lifetime_ms: f64,
) -> bool {
    if state.bullets.len() >= state.caps.max_bullets {
        return false;
    }
    let id = state.next_entity_id();
    let mut bullet = state.pools.bullets.acquire();
    bullet.id = id;
    bullet.pos = pos;
    bullet.vel = vel;
    bullet.radius = state.player.weapon.bullet_radius;
    bullet.damage = state.player.weapon.damage;
    bullet.kind = kind;
    bullet.pierce = state.player.pierce;
    bullet.color = color;
    bullet.lifetime_ms = lifetime_ms;
    state.bullets.push(bullet);
    true
}

/// Fire the player's weapon at a canvas point.
///
/// Rejected when the aim point is on top of the player, the weapon is still
/// cooling down, or no bullet fits under the cap.
pub fn fire(state: &mut GameState, settings: &Settings, target: Vec2) -> bool {
    let now = state.game_time;
    let aim = target - state.player.pos;
    if !aim.is_finite() || aim.length() < MIN_AIM_DISTANCE {
        return false;
    }
    if !state.player.weapon.ready(now) {
        return false;
    }

    let ultimate = powerup::has_ultimate(&state.player);
    let pattern = ShotPattern::for_weapon(state.player.weapon.kind, ultimate, &settings.weapon);
    let origin = state.player.pos;
    let speed = state.player.weapon.bullet_speed;
    let lifetime = state.player.weapon.bullet_lifetime_ms;

    let mut fired = 0;
    for angle in pattern.angles(angle_of(aim)) {
        let vel = direction_from_angle(angle) * speed;
        if !spawn_bullet(state, origin, vel, pattern.kind, pattern.color, lifetime) {
            break;
        }
        fired += 1;
    }

    if fired > 0 {
        state.player.weapon.last_shot_at = Some(now);
    }
    fired > 0
}

/// Ring of explosive bullets radiating from a point. Returns how many fit under the cap.
pub fn spawn_explosion_ring(
    state: &mut GameState,
    settings: &Settings,
    center: Vec2,
    count: usize,
) -> usize {
    if count == 0 || !center.is_finite() {
        return 0;
    }
    let step = std::f32::consts::TAU / count as f32;
    let speed = settings.weapon.explosion_bullet_speed;
    let color = WeaponKind::Explosive.bullet_color();
    (0..count)
        .take_while(|&i| {
            let vel = direction_from_angle(i as f32 * step) * speed;
            spawn_bullet(
                state,
                center,
                vel,
                WeaponKind::Explosive,
                color,
                EXPLOSION_BULLET_LIFETIME_MS,
            )
        })
        .count()
}

/// Move bullets, age them and release the expired or off-screen ones
pub fn advance_bullets(
    state: &mut GameState,
    bounds: &CanvasBounds,
    dt_ms: f32,
) -> Result<usize, SimError> {
    let dt = dt_ms / 1000.0;
    for bullet in &mut state.bullets {
        bullet.pos += bullet.vel * dt;
        bullet.age_ms += dt_ms as f64;
    }
    release_where(&mut state.bullets, &mut state.pools.bullets, |b: &Bullet| {
        b.age_ms >= b.lifetime_ms || is_offscreen(b.pos, bounds, b.radius)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GamePhase;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn playing_state(settings: &Settings) -> GameState {
        let bounds = CanvasBounds::new(800.0, 600.0);
        let mut state = GameState::new(settings, &bounds, Pcg32::seed_from_u64(1));
        state.start_round(settings, &bounds).unwrap();
        assert_eq!(state.phase, GamePhase::Playing);
        state
    }

    #[test]
    fn test_fire_rate_gating() {
        let settings = Settings::default();
        let mut state = playing_state(&settings);
        let target = Vec2::new(500.0, 300.0);

        assert!(fire(&mut state, &settings, target));
        state.game_time += 50.0;
        assert!(!fire(&mut state, &settings, target));
        state.game_time += 70.0;
        assert!(fire(&mut state, &settings, target));
        assert_eq!(state.bullets.len(), 2);
    }

    #[test]
    fn test_aim_too_close_rejected() {
        let settings = Settings::default();
        let mut state = playing_state(&settings);
        let target = state.player.pos + Vec2::new(3.0, 0.0);
        assert!(!fire(&mut state, &settings, target));
        assert!(state.bullets.is_empty());
        assert!(state.player.weapon.last_shot_at.is_none());
    }

    #[test]
    fn test_spread_fans_five_symmetric_bullets() {
        let settings = Settings::default();
        let mut state = playing_state(&settings);
        state.player.weapon.kind = WeaponKind::Spread;
        assert!(fire(&mut state, &settings, Vec2::new(500.0, 300.0)));
        assert_eq!(state.bullets.len(), 5);

        let mut angles: Vec<f32> = state.bullets.iter().map(|b| angle_of(b.vel)).collect();
        angles.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((angles[0] + angles[4]).abs() < 0.001);
        assert!((angles[2]).abs() < 0.001);
        assert!((angles[4] - 2.0 * settings.weapon.spread_step).abs() < 0.001);
    }

    #[test]
    fn test_ultimate_combo_fires_wide_explosive_fan() {
        use crate::sim::tuning::{PowerUpKind, Rarity};

        let settings = Settings::default();
        let mut state = playing_state(&settings);
        for kind in [PowerUpKind::RapidFire, PowerUpKind::SpreadShot, PowerUpKind::Explosive] {
            powerup::apply_powerup(&mut state, kind, Rarity::Common, 5);
        }
        assert!(fire(&mut state, &settings, Vec2::new(500.0, 300.0)));
        assert_eq!(state.bullets.len(), 7);
        assert!(state.bullets.iter().all(|b| {
            b.kind == WeaponKind::Explosive && b.color == ULTIMATE_BULLET_COLOR
        }));

        let mut angles: Vec<f32> = state.bullets.iter().map(|b| angle_of(b.vel)).collect();
        angles.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!(angles[3].abs() < 0.001);
        assert!((angles[6] - 3.0 * settings.weapon.ultimate_spread_step).abs() < 0.001);
        assert!((angles[0] + angles[6]).abs() < 0.001);

        // Losing one part of the combo drops back to the plain mode on the next shot
        powerup::remove_effect(&mut state.player, PowerUpKind::RapidFire);
        state.game_time += 1000.0;
        assert!(fire(&mut state, &settings, Vec2::new(500.0, 300.0)));
        assert_eq!(state.bullets.len(), 8);
        assert_ne!(state.bullets[7].color, ULTIMATE_BULLET_COLOR);
    }

    #[test]
    fn test_bullets_stop_at_cap() {
        let settings = Settings::default();
        let mut state = playing_state(&settings);
        state.caps.max_bullets = 3;
        state.player.weapon.kind = WeaponKind::Spread;
        assert!(fire(&mut state, &settings, Vec2::new(500.0, 300.0)));
        assert_eq!(state.bullets.len(), 3);

        state.game_time += 1000.0;
        assert!(!fire(&mut state, &settings, Vec2::new(500.0, 300.0)));
    }

    #[test]
    fn test_bullets_expire_back_into_pool() {
        let settings = Settings::default();
        let bounds = CanvasBounds::new(800.0, 600.0);
        let mut state = playing_state(&settings);
        spawn_bullet(&mut state, Vec2::new(400.0, 300.0), Vec2::ZERO, WeaponKind::Basic, 0, 100.0);
        assert_eq!(advance_bullets(&mut state, &bounds, 50.0).unwrap(), 0);
        assert_eq!(advance_bullets(&mut state, &bounds, 60.0).unwrap(), 1);
        assert_eq!(state.pools.bullets.stats().live(), 0);
    }

    #[test]
    fn test_explosion_ring_respects_cap() {
        let settings = Settings::default();
        let mut state = playing_state(&settings);
        state.caps.max_bullets = 5;
        assert_eq!(spawn_explosion_ring(&mut state, &settings, Vec2::new(100.0, 100.0), 12), 5);
        assert!(state.bullets.iter().all(|b| b.kind == WeaponKind::Explosive));
    }
}
