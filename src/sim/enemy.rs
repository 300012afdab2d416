//! Enemy steering
//!
//! Movement is heuristic pursuit, one behaviour per kind from the tuning
//! table. Ordinary enemies that drift far off the canvas are released; the
//! boss is soft-clamped back inside instead.

use glam::Vec2;

use super::collision::{is_offscreen, soft_clamp};
use super::pool::release_where;
use super::state::{CanvasBounds, Enemy, GameState};
use super::tuning::Movement;
use crate::consts::OFFSCREEN_MARGIN;
use crate::direction_from_angle;
use crate::error::SimError;

/// Dash phase of a dash cycle (ms)
pub const DASH_MS: f64 = 600.0;
/// Glide phase of a dash cycle (ms)
pub const GLIDE_MS: f64 = 400.0;
const DASH_FACTOR: f32 = 2.0;
const GLIDE_FACTOR: f32 = 0.5;

const ZIGZAG_FREQUENCY: f32 = 0.005;
const ZIGZAG_AMPLITUDE: f32 = 0.8;

/// Distance the boss keeps while circling (px)
pub const BOSS_ORBIT_RADIUS: f32 = 200.0;
const BOSS_ORBIT_SPEED: f32 = 0.8;
/// Time between the start of two boss dives (ms)
pub const BOSS_DIVE_PERIOD_MS: f64 = 5000.0;
const BOSS_DIVE_MS: f64 = 1200.0;
const BOSS_DIVE_FACTOR: f32 = 1.5;
const BOSS_CLAMP_STIFFNESS: f32 = 0.2;

fn steer(enemy: &mut Enemy, target: Vec2, dt: f32) -> Vec2 {
    let to_target = target - enemy.pos;
    let dir = to_target.normalize_or_zero();

    match enemy.kind.stats().movement {
        Movement::Direct => dir * enemy.speed,
        Movement::ZigZag => {
            let wobble = (enemy.pattern_timer as f32 * ZIGZAG_FREQUENCY + enemy.phase).sin();
            (dir + dir.perp() * wobble * ZIGZAG_AMPLITUDE).normalize_or_zero() * enemy.speed
        }
        Movement::Dash => {
            let cycle = enemy.pattern_timer % (DASH_MS + GLIDE_MS);
            let factor = if cycle < DASH_MS { DASH_FACTOR } else { GLIDE_FACTOR };
            dir * enemy.speed * factor
        }
        Movement::Orbit => {
            if enemy.pattern_timer % BOSS_DIVE_PERIOD_MS >= BOSS_DIVE_PERIOD_MS - BOSS_DIVE_MS {
                return dir * enemy.speed * BOSS_DIVE_FACTOR;
            }
            enemy.phase += BOSS_ORBIT_SPEED * dt;
            let station = target + direction_from_angle(enemy.phase) * BOSS_ORBIT_RADIUS;
            let offset = station - enemy.pos;
            let step = enemy.speed * dt;
            if dt > 0.0 && offset.length() < step {
                // Arrive exactly instead of overshooting the station
                offset / dt
            } else {
                offset.normalize_or_zero() * enemy.speed
            }
        }
    }
}

/// Move every enemy toward the player and release those that wandered off.
/// Returns the number released.
pub fn steer_enemies(
    state: &mut GameState,
    bounds: &CanvasBounds,
    dt_ms: f32,
) -> Result<usize, SimError> {
    let target = state.player.pos;
    let dt = dt_ms / 1000.0;

    for enemy in &mut state.enemies {
        enemy.pattern_timer += dt_ms as f64;
        enemy.vel = steer(enemy, target, dt);
        enemy.pos += enemy.vel * dt;
        if enemy.kind.is_boss() {
            enemy.pos = soft_clamp(enemy.pos, enemy.radius, bounds, BOSS_CLAMP_STIFFNESS);
        }
    }

    release_where(&mut state.enemies, &mut state.pools.enemies, |e: &Enemy| {
        !e.kind.is_boss() && is_offscreen(e.pos, bounds, OFFSCREEN_MARGIN)
    })
}
