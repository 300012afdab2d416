//! Error types
//!
//! `EngineError` is fatal and only produced while building an engine.
//! `SimError` is produced inside a tick; the engine converts it into the
//! terminal error phase instead of handing it to the host loop.

use thiserror::Error;

/// Construction and configuration failures
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("canvas bounds are required to construct the engine")]
    MissingCanvas,

    #[error("canvas bounds must be positive and finite, got {width}x{height}")]
    InvalidCanvas { width: f32, height: f32 },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Invariant violations detected while advancing the simulation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("player position became non-finite")]
    NonFinitePlayer,

    #[error("{pool} collection holds {len} entities, cap is {cap}")]
    CapExceeded {
        pool: &'static str,
        len: usize,
        cap: usize,
    },

    #[error("{pool} entity in slot {slot} was released twice")]
    DoubleRelease { pool: &'static str, slot: u32 },

    #[error("lives {lives} outside 0..={max}")]
    LivesOutOfRange { lives: u32, max: u32 },

    #[error("frenzy tier {tier} outside 0..={max}")]
    FrenzyTierOutOfRange { tier: u8, max: u8 },
}
