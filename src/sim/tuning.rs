//! Data-driven game balance
//!
//! Every entity kind is a closed enum with one row in a stats table. Adding a
//! kind means adding a variant and a row; call sites only ever read `stats()`.

use serde::{Deserialize, Serialize};

/// How an enemy steers toward the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    /// Straight line pursuit
    Direct,
    /// Pursuit with a sideways sine wobble
    ZigZag,
    /// Alternating dash and glide phases
    Dash,
    /// Circles the player at a distance, diving in periodically
    Orbit,
}

/// Enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    #[default]
    Normal,
    Fast,
    Tank,
    Blitz,
    Triangle,
    Square,
    Diamond,
    Hexagon,
    Boss,
}

/// Per-kind enemy stats
#[derive(Debug, Clone, Copy)]
pub struct EnemyStats {
    pub radius: f32,
    pub health: f32,
    /// Base speed (px/s) before difficulty scaling
    pub speed: f32,
    pub score: u64,
    pub color: u32,
    /// Relative spawn weight; zero means never picked at random
    pub spawn_weight: f32,
    /// Extra weight per frenzy tier, as a fraction of `spawn_weight`
    pub frenzy_bias: f32,
    pub movement: Movement,
}

const ENEMY_TABLE: [EnemyStats; 9] = [
    // Normal
    EnemyStats {
        radius: 12.0,
        health: 1.0,
        speed: 80.0,
        score: 10,
        color: 0xff4d4d,
        spawn_weight: 40.0,
        frenzy_bias: 0.0,
        movement: Movement::Direct,
    },
    // Fast
    EnemyStats {
        radius: 9.0,
        health: 1.0,
        speed: 150.0,
        score: 15,
        color: 0xffa64d,
        spawn_weight: 20.0,
        frenzy_bias: 0.5,
        movement: Movement::Direct,
    },
    // Tank
    EnemyStats {
        radius: 20.0,
        health: 5.0,
        speed: 45.0,
        score: 30,
        color: 0x8c8cff,
        spawn_weight: 10.0,
        frenzy_bias: 0.25,
        movement: Movement::Direct,
    },
    // Blitz
    EnemyStats {
        radius: 10.0,
        health: 1.0,
        speed: 120.0,
        score: 25,
        color: 0xffff4d,
        spawn_weight: 5.0,
        frenzy_bias: 0.5,
        movement: Movement::Dash,
    },
    // Triangle
    EnemyStats {
        radius: 14.0,
        health: 2.0,
        speed: 100.0,
        score: 20,
        color: 0x4dff88,
        spawn_weight: 10.0,
        frenzy_bias: 0.25,
        movement: Movement::ZigZag,
    },
    // Square
    EnemyStats {
        radius: 16.0,
        health: 3.0,
        speed: 70.0,
        score: 20,
        color: 0x4dd2ff,
        spawn_weight: 8.0,
        frenzy_bias: 0.25,
        movement: Movement::Direct,
    },
    // Diamond
    EnemyStats {
        radius: 13.0,
        health: 2.0,
        speed: 120.0,
        score: 25,
        color: 0xd24dff,
        spawn_weight: 5.0,
        frenzy_bias: 0.5,
        movement: Movement::ZigZag,
    },
    // Hexagon
    EnemyStats {
        radius: 18.0,
        health: 4.0,
        speed: 60.0,
        score: 35,
        color: 0xff4dd2,
        spawn_weight: 2.0,
        frenzy_bias: 0.5,
        movement: Movement::Direct,
    },
    // Boss
    EnemyStats {
        radius: 50.0,
        health: 40.0,
        speed: 90.0,
        score: 500,
        color: 0xff1a1a,
        spawn_weight: 0.0,
        frenzy_bias: 0.0,
        movement: Movement::Orbit,
    },
];

impl EnemyKind {
    /// Every kind that may be picked by the random spawner
    pub const SPAWNABLE: [EnemyKind; 8] = [
        EnemyKind::Normal,
        EnemyKind::Fast,
        EnemyKind::Tank,
        EnemyKind::Blitz,
        EnemyKind::Triangle,
        EnemyKind::Square,
        EnemyKind::Diamond,
        EnemyKind::Hexagon,
    ];

    #[inline]
    pub fn stats(self) -> &'static EnemyStats {
        &ENEMY_TABLE[self as usize]
    }

    pub fn is_boss(self) -> bool {
        self == EnemyKind::Boss
    }

    /// Spawn weight with the frenzy re-weighting applied
    pub fn weight(self, frenzy_tier: u8) -> f32 {
        let stats = self.stats();
        stats.spawn_weight * (1.0 + stats.frenzy_bias * frenzy_tier as f32)
    }
}

/// Rarity shared by collectibles and power-up items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, Copy)]
pub struct RarityStats {
    /// Score for a collectible of this rarity
    pub collectible_value: u64,
    pub color: u32,
    /// Multiplier on power-up durations
    pub duration_scale: f64,
    pub spawn_weight: f32,
}

const RARITY_TABLE: [RarityStats; 4] = [
    RarityStats {
        collectible_value: 10,
        color: 0x4dffff,
        duration_scale: 1.0,
        spawn_weight: 70.0,
    },
    RarityStats {
        collectible_value: 25,
        color: 0x4d88ff,
        duration_scale: 1.25,
        spawn_weight: 22.0,
    },
    RarityStats {
        collectible_value: 50,
        color: 0xb84dff,
        duration_scale: 1.5,
        spawn_weight: 7.0,
    },
    RarityStats {
        collectible_value: 100,
        color: 0xffd24d,
        duration_scale: 2.0,
        spawn_weight: 1.0,
    },
];

impl Rarity {
    pub const ALL: [Rarity; 4] = [Rarity::Common, Rarity::Rare, Rarity::Epic, Rarity::Legendary];

    #[inline]
    pub fn stats(self) -> &'static RarityStats {
        &RARITY_TABLE[self as usize]
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    RapidFire,
    SpreadShot,
    Explosive,
    Speed,
    Shield,
    Damage,
    Pierce,
    Magnet,
    Health,
}

#[derive(Debug, Clone, Copy)]
pub struct PowerUpStats {
    /// Base duration (ms); zero for instantaneous effects
    pub duration_ms: f64,
    /// Effect strength: a multiplier, an additive bonus or a radius depending on kind
    pub magnitude: f32,
    pub color: u32,
    pub spawn_weight: f32,
}

const POWERUP_TABLE: [PowerUpStats; 9] = [
    // RapidFire: fire rate multiplier
    PowerUpStats {
        duration_ms: 8000.0,
        magnitude: 2.0,
        color: 0xffe14d,
        spawn_weight: 16.0,
    },
    // SpreadShot
    PowerUpStats {
        duration_ms: 10_000.0,
        magnitude: 0.0,
        color: 0x4dff4d,
        spawn_weight: 14.0,
    },
    // Explosive
    PowerUpStats {
        duration_ms: 10_000.0,
        magnitude: 0.0,
        color: 0xff8c1a,
        spawn_weight: 12.0,
    },
    // Speed: additive px/s
    PowerUpStats {
        duration_ms: 8000.0,
        magnitude: 100.0,
        color: 0x1affd2,
        spawn_weight: 14.0,
    },
    // Shield
    PowerUpStats {
        duration_ms: 6000.0,
        magnitude: 0.0,
        color: 0x4d9bff,
        spawn_weight: 10.0,
    },
    // Damage: damage multiplier
    PowerUpStats {
        duration_ms: 10_000.0,
        magnitude: 2.0,
        color: 0xff4d4d,
        spawn_weight: 10.0,
    },
    // Pierce
    PowerUpStats {
        duration_ms: 8000.0,
        magnitude: 0.0,
        color: 0xe0e0ff,
        spawn_weight: 8.0,
    },
    // Magnet: attraction radius (px)
    PowerUpStats {
        duration_ms: 10_000.0,
        magnitude: 180.0,
        color: 0xd24dff,
        spawn_weight: 8.0,
    },
    // Health
    PowerUpStats {
        duration_ms: 0.0,
        magnitude: 1.0,
        color: 0xff66a3,
        spawn_weight: 8.0,
    },
];

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 9] = [
        PowerUpKind::RapidFire,
        PowerUpKind::SpreadShot,
        PowerUpKind::Explosive,
        PowerUpKind::Speed,
        PowerUpKind::Shield,
        PowerUpKind::Damage,
        PowerUpKind::Pierce,
        PowerUpKind::Magnet,
        PowerUpKind::Health,
    ];

    #[inline]
    pub fn stats(self) -> &'static PowerUpStats {
        &POWERUP_TABLE[self as usize]
    }

    /// Instantaneous effects never enter the effect registry
    pub fn is_instant(self) -> bool {
        self.stats().duration_ms <= 0.0
    }
}
