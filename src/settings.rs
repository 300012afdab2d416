//! Engine configuration and quality tiers
//!
//! Everything tunable is resolved once into a [`Settings`] value when the
//! engine is built. Every field has a default, so partial JSON documents are
//! accepted and filled in.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Low,
    Medium,
    #[default]
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }
}

/// Concurrent entity caps for one quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCaps {
    pub max_bullets: usize,
    pub max_enemies: usize,
    pub max_collectibles: usize,
}

/// Caps for every quality tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityCaps {
    pub low: PoolCaps,
    pub medium: PoolCaps,
    pub high: PoolCaps,
}

impl Default for QualityCaps {
    fn default() -> Self {
        Self {
            low: PoolCaps {
                max_bullets: 50,
                max_enemies: 20,
                max_collectibles: 10,
            },
            medium: PoolCaps {
                max_bullets: 100,
                max_enemies: 35,
                max_collectibles: 20,
            },
            high: PoolCaps {
                max_bullets: 200,
                max_enemies: 50,
                max_collectibles: 30,
            },
        }
    }
}

impl QualityCaps {
    pub fn for_preset(&self, preset: QualityPreset) -> PoolCaps {
        match preset {
            QualityPreset::Low => self.low,
            QualityPreset::Medium => self.medium,
            QualityPreset::High => self.high,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub initial_lives: u32,
    pub max_lives: u32,
    pub radius: f32,
    /// Base movement speed (px/s)
    pub speed: f32,
    /// Invulnerability window after a hit (ms)
    pub invulnerability_ms: f64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            initial_lives: 3,
            max_lives: 5,
            radius: 15.0,
            speed: 250.0,
            invulnerability_ms: 2000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponSettings {
    /// Shots per second
    pub fire_rate: f32,
    pub damage: f32,
    /// Bullet speed (px/s)
    pub bullet_speed: f32,
    pub bullet_radius: f32,
    pub bullet_lifetime_ms: f64,
    /// Angle between neighbouring spread bullets (radians)
    pub spread_step: f32,
    /// Angle between neighbouring bullets of the ultimate spread (radians)
    pub ultimate_spread_step: f32,
    /// Base radius for explosive chain kills; the effective reach is 1.5x
    pub chain_radius: f32,
    /// Speed of bullets produced by explosion rings (px/s)
    pub explosion_bullet_speed: f32,
}

impl Default for WeaponSettings {
    fn default() -> Self {
        Self {
            fire_rate: 10.0,
            damage: 1.0,
            bullet_speed: 600.0,
            bullet_radius: 4.0,
            bullet_lifetime_ms: 2000.0,
            spread_step: 0.15,
            ultimate_spread_step: 0.22,
            chain_radius: 60.0,
            explosion_bullet_speed: 350.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultySettings {
    pub base: f32,
    /// Elapsed time per difficulty step (ms)
    pub interval_ms: f64,
    pub increment: f32,
}

impl Default for DifficultySettings {
    fn default() -> Self {
        Self {
            base: 1.0,
            interval_ms: 30_000.0,
            increment: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    pub collectible_interval_ms: f64,
    /// Enemy wave interval at difficulty 1; divided by the current difficulty
    pub enemy_interval_ms: f64,
    pub min_enemy_interval_ms: f64,
    pub powerup_interval_ms: f64,
    pub collectible_lifetime_ms: f64,
    pub intensity_warmup_ms: f64,
    pub intensity_roll_interval_ms: f64,
    pub intensity_chance: f64,
    pub intensity_duration_ms: f64,
    pub swarm_warmup_ms: f64,
    pub swarm_chance: f64,
    pub swarm_stagger_ms: f64,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            collectible_interval_ms: 2000.0,
            enemy_interval_ms: 1500.0,
            min_enemy_interval_ms: 300.0,
            powerup_interval_ms: 12_000.0,
            collectible_lifetime_ms: 10_000.0,
            intensity_warmup_ms: 30_000.0,
            intensity_roll_interval_ms: 10_000.0,
            intensity_chance: 0.3,
            intensity_duration_ms: 8000.0,
            swarm_warmup_ms: 20_000.0,
            swarm_chance: 0.15,
            swarm_stagger_ms: 150.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboSettings {
    /// Combo resets after this long without a pickup (ms)
    pub timeout_ms: f64,
    /// Combo count per multiplier step
    pub step: u32,
    pub multiplier_increment: f32,
    pub max_multiplier: f32,
    /// Score needed per level
    pub level_threshold: u64,
}

impl Default for ComboSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 2000.0,
            step: 5,
            multiplier_increment: 0.5,
            max_multiplier: 5.0,
            level_threshold: 1000,
        }
    }
}

/// One frenzy tier; tier numbers are 1-based positions in [`FrenzySettings::tiers`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrenzyTier {
    pub combo_threshold: u32,
    pub streak_threshold: u32,
    pub duration_ms: f64,
    pub speed_boost: f32,
    pub fire_rate_multiplier: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrenzySettings {
    pub tiers: Vec<FrenzyTier>,
}

impl Default for FrenzySettings {
    fn default() -> Self {
        Self {
            tiers: vec![
                FrenzyTier {
                    combo_threshold: 6,
                    streak_threshold: 5,
                    duration_ms: 5000.0,
                    speed_boost: 50.0,
                    fire_rate_multiplier: 1.5,
                },
                FrenzyTier {
                    combo_threshold: 12,
                    streak_threshold: 10,
                    duration_ms: 6000.0,
                    speed_boost: 100.0,
                    fire_rate_multiplier: 2.0,
                },
                FrenzyTier {
                    combo_threshold: 20,
                    streak_threshold: 20,
                    duration_ms: 8000.0,
                    speed_boost: 150.0,
                    fire_rate_multiplier: 3.0,
                },
            ],
        }
    }
}

impl FrenzySettings {
    pub fn max_tier(&self) -> u8 {
        self.tiers.len().min(u8::MAX as usize) as u8
    }

    /// Tier definition for a 1-based tier number
    pub fn tier(&self, tier: u8) -> Option<&FrenzyTier> {
        (tier as usize).checked_sub(1).and_then(|i| self.tiers.get(i))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossSettings {
    pub interval_ms: f64,
    pub min_score: u64,
    /// Enemy slots that must stay free before a boss may spawn
    pub headroom: usize,
    pub reward_count: u32,
    pub reward_stagger_ms: f64,
    pub explosion_bullets: usize,
}

impl Default for BossSettings {
    fn default() -> Self {
        Self {
            interval_ms: 60_000.0,
            min_score: 500,
            headroom: 3,
            reward_count: 3,
            reward_stagger_ms: 300.0,
            explosion_bullets: 12,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Active quality tier
    pub quality: QualityPreset,
    pub quality_caps: QualityCaps,
    /// Recycle entity records through pools; `false` allocates per spawn
    pub pooling: bool,
    /// Fixed RNG seed; `None` seeds from the thread RNG
    pub seed: Option<u64>,

    pub player: PlayerSettings,
    pub weapon: WeaponSettings,
    pub difficulty: DifficultySettings,
    pub spawn: SpawnSettings,
    pub combo: ComboSettings,
    pub frenzy: FrenzySettings,
    pub boss: BossSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::High,
            quality_caps: QualityCaps::default(),
            pooling: true,
            seed: None,
            player: PlayerSettings::default(),
            weapon: WeaponSettings::default(),
            difficulty: DifficultySettings::default(),
            spawn: SpawnSettings::default(),
            combo: ComboSettings::default(),
            frenzy: FrenzySettings::default(),
            boss: BossSettings::default(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings with a fixed seed, for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Caps for the active quality tier
    pub fn caps(&self) -> PoolCaps {
        self.quality_caps.for_preset(self.quality)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), EngineError> {
        fn positive(name: &str, value: f64) -> Result<(), EngineError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(EngineError::InvalidSettings(format!(
                    "{name} must be positive, got {value}"
                )))
            }
        }

        let p = &self.player;
        if p.initial_lives == 0 || p.initial_lives > p.max_lives {
            return Err(EngineError::InvalidSettings(format!(
                "initial_lives must be in 1..={}, got {}",
                p.max_lives, p.initial_lives
            )));
        }
        positive("player.radius", p.radius as f64)?;
        positive("player.speed", p.speed as f64)?;

        let w = &self.weapon;
        positive("weapon.fire_rate", w.fire_rate as f64)?;
        positive("weapon.damage", w.damage as f64)?;
        positive("weapon.bullet_speed", w.bullet_speed as f64)?;
        positive("weapon.bullet_lifetime_ms", w.bullet_lifetime_ms)?;

        positive("difficulty.interval_ms", self.difficulty.interval_ms)?;

        let s = &self.spawn;
        positive("spawn.collectible_interval_ms", s.collectible_interval_ms)?;
        positive("spawn.enemy_interval_ms", s.enemy_interval_ms)?;
        positive("spawn.min_enemy_interval_ms", s.min_enemy_interval_ms)?;
        positive("spawn.powerup_interval_ms", s.powerup_interval_ms)?;
        positive("spawn.collectible_lifetime_ms", s.collectible_lifetime_ms)?;

        if self.combo.step == 0 || self.combo.level_threshold == 0 {
            return Err(EngineError::InvalidSettings(
                "combo.step and combo.level_threshold must be non-zero".into(),
            ));
        }
        if self.combo.max_multiplier < 1.0 {
            return Err(EngineError::InvalidSettings(
                "combo.max_multiplier must be at least 1".into(),
            ));
        }

        let tiers = &self.frenzy.tiers;
        if tiers.is_empty() || tiers.len() > u8::MAX as usize {
            return Err(EngineError::InvalidSettings(
                "frenzy.tiers must hold between 1 and 255 tiers".into(),
            ));
        }
        for pair in tiers.windows(2) {
            if pair[1].combo_threshold <= pair[0].combo_threshold
                || pair[1].streak_threshold <= pair[0].streak_threshold
            {
                return Err(EngineError::InvalidSettings(
                    "frenzy thresholds must strictly increase per tier".into(),
                ));
            }
        }
        for tier in tiers {
            positive("frenzy.duration_ms", tier.duration_ms)?;
            positive("frenzy.fire_rate_multiplier", tier.fire_rate_multiplier as f64)?;
        }

        for preset in [QualityPreset::Low, QualityPreset::Medium, QualityPreset::High] {
            let caps = self.quality_caps.for_preset(preset);
            if caps.max_bullets == 0 || caps.max_enemies == 0 || caps.max_collectibles == 0 {
                return Err(EngineError::InvalidSettings(format!(
                    "{} quality caps must be non-zero",
                    preset.as_str()
                )));
            }
        }

        Ok(())
    }
}
