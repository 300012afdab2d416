//! Arena Frenzy - simulation core for a 2D arena-survival shooter
//!
//! Core modules:
//! - `sim`: Per-frame simulation (pools, spawning, weapons, power-ups, frenzy)
//! - `engine`: Public facade driven once per render tick
//! - `settings`: Validated configuration and quality tiers
//! - `error`: Construction and per-tick error types
//!
//! Rendering, audio, particles and input capture live outside this crate.
//! They consume the [`sim::GameEvent`] returned from [`Engine::update`].

pub mod engine;
pub mod error;
pub mod settings;
pub mod sim;

pub use engine::Engine;
pub use error::{EngineError, SimError};
pub use settings::{PoolCaps, QualityPreset, Settings};
pub use sim::{CanvasBounds, GameEvent, TickInput};

use glam::Vec2;

/// Engine-wide constants that are not worth exposing as settings
pub mod consts {
    /// Delta used when the host passes a non-finite or non-positive frame time (ms)
    pub const NOMINAL_DT_MS: f32 = 1000.0 / 60.0;
    /// Largest delta a single tick will simulate (ms)
    pub const MAX_DT_MS: f32 = 100.0;

    /// Aim points closer than this to the player are rejected
    pub const MIN_AIM_DISTANCE: f32 = 5.0;

    /// Consecutive kills inside this window extend the kill streak (ms)
    pub const KILL_STREAK_WINDOW_MS: f64 = 3000.0;
    /// Kill streak values that emit a milestone event
    pub const KILL_STREAK_MILESTONES: [u32; 5] = [5, 10, 20, 30, 50];

    /// Non-boss enemies further than this outside the canvas are despawned
    pub const OFFSCREEN_MARGIN: f32 = 100.0;
    /// Enemies spawn this far outside the canvas edge
    pub const SPAWN_MARGIN: f32 = 30.0;

    /// Remaining collectible lifetime that trips the expiry warning (ms)
    pub const COLLECTIBLE_WARNING_MS: f64 = 2000.0;
    /// Uncollected power-up items vanish after this long (ms)
    pub const POWERUP_ITEM_LIFETIME_MS: f64 = 8000.0;

    /// Maximum number of undelivered events kept in the queue
    pub const EVENT_QUEUE_CAPACITY: usize = 256;
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Angle of a vector in radians, measured from +x
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_round_trip() {
        let theta = 0.7;
        assert!((angle_of(direction_from_angle(theta)) - theta).abs() < 0.0001);
    }
}
