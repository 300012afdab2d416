//! Frenzy tier state machine
//!
//! Tier 0 is inactive. Crossing a tier threshold starts or escalates frenzy;
//! re-crossing the current (or a lower) tier only extends it. Escalation always
//! tears the old modifiers down before applying the new tier's, so two tiers
//! are never superposed.

use serde::Serialize;

use super::events::{EventQueue, GameEvent};
use super::state::{GameState, Player};
use crate::error::SimError;
use crate::settings::{FrenzySettings, FrenzyTier};

/// What pushed the player into frenzy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FrenzySource {
    Combo,
    KillStreak,
}

/// Why a tier ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FrenzyEndReason {
    Expired,
    /// Replaced by a higher tier
    Escalated,
}

/// Result of asking for a tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrenzyOutcome {
    Started,
    Escalated { from: u8 },
    Extended { tier: u8, expires_at: f64 },
    /// Tier 0 or not configured
    Ignored,
}

/// The single frenzy record
#[derive(Debug, Clone, PartialEq)]
pub struct Frenzy {
    pub active: bool,
    pub tier: u8,
    pub expires_at: f64,
    /// Speed bonus currently added to the player
    pub speed_boost: f32,
    /// Factor currently applied to the weapon's fire rate
    pub fire_rate_multiplier: f32,
    pub source: Option<FrenzySource>,
}

impl Default for Frenzy {
    fn default() -> Self {
        Self {
            active: false,
            tier: 0,
            expires_at: 0.0,
            speed_boost: 0.0,
            fire_rate_multiplier: 1.0,
            source: None,
        }
    }
}

impl Frenzy {
    /// Request a tier at time `now`
    pub fn start(
        &mut self,
        player: &mut Player,
        settings: &FrenzySettings,
        tier: u8,
        source: FrenzySource,
        now: f64,
    ) -> FrenzyOutcome {
        let tier = tier.min(settings.max_tier());
        let Some(def) = settings.tier(tier) else {
            return FrenzyOutcome::Ignored;
        };

        if self.active && tier <= self.tier {
            let current = settings.tier(self.tier).map_or(def.duration_ms, |t| t.duration_ms);
            self.expires_at = self.expires_at.max(now + current);
            return FrenzyOutcome::Extended {
                tier: self.tier,
                expires_at: self.expires_at,
            };
        }

        let previous = self.active.then_some(self.tier);
        if previous.is_some() {
            self.teardown(player);
        }
        self.apply(player, def, tier, source, now);

        match previous {
            Some(from) => FrenzyOutcome::Escalated { from },
            None => FrenzyOutcome::Started,
        }
    }

    fn apply(
        &mut self,
        player: &mut Player,
        def: &FrenzyTier,
        tier: u8,
        source: FrenzySource,
        now: f64,
    ) {
        player.speed += def.speed_boost;
        player.weapon.fire_rate *= def.fire_rate_multiplier;
        *self = Self {
            active: true,
            tier,
            expires_at: now + def.duration_ms,
            speed_boost: def.speed_boost,
            fire_rate_multiplier: def.fire_rate_multiplier,
            source: Some(source),
        };
    }

    /// Reverse the active tier's modifiers and go back to tier 0
    pub fn teardown(&mut self, player: &mut Player) {
        if !self.active {
            return;
        }
        player.speed -= self.speed_boost;
        player.weapon.fire_rate /= self.fire_rate_multiplier;
        *self = Self::default();
    }

    /// End the tier if its time is up. Returns the tier that ended.
    pub fn check_expiry(&mut self, player: &mut Player, now: f64) -> Option<u8> {
        if self.active && now >= self.expires_at {
            let tier = self.tier;
            self.teardown(player);
            log::info!("Frenzy tier {} expired", tier);
            return Some(tier);
        }
        None
    }

    pub fn validate(&self, max_tier: u8) -> Result<(), SimError> {
        if self.tier > max_tier || self.active != (self.tier > 0) {
            return Err(SimError::FrenzyTierOutOfRange {
                tier: self.tier,
                max: max_tier,
            });
        }
        Ok(())
    }
}

/// Highest tier whose threshold lies in `(previous, current]`, or 0
pub fn tier_crossed(
    settings: &FrenzySettings,
    threshold: impl Fn(&FrenzyTier) -> u32,
    previous: u32,
    current: u32,
) -> u8 {
    settings
        .tiers
        .iter()
        .enumerate()
        .filter(|(_, t)| {
            let th = threshold(t);
            previous < th && th <= current
        })
        .map(|(i, _)| (i + 1) as u8)
        .max()
        .unwrap_or(0)
}

/// Start, escalate or extend frenzy and queue the matching events
pub fn trigger(
    state: &mut GameState,
    settings: &FrenzySettings,
    tier: u8,
    source: FrenzySource,
    events: &mut EventQueue,
) {
    if tier == 0 {
        return;
    }
    let now = state.game_time;
    match state.frenzy.start(&mut state.player, settings, tier, source, now) {
        FrenzyOutcome::Started => {
            log::info!("Frenzy tier {} started ({:?})", state.frenzy.tier, source);
            events.push(GameEvent::FrenzyStart {
                tier: state.frenzy.tier,
                source,
            });
        }
        FrenzyOutcome::Escalated { from } => {
            log::info!("Frenzy escalated {} -> {} ({:?})", from, state.frenzy.tier, source);
            events.push(GameEvent::FrenzyEnd {
                tier: from,
                reason: FrenzyEndReason::Escalated,
            });
            events.push(GameEvent::FrenzyStart {
                tier: state.frenzy.tier,
                source,
            });
        }
        FrenzyOutcome::Extended { tier, expires_at } => {
            events.push(GameEvent::FrenzyExtend { tier, expires_at });
        }
        FrenzyOutcome::Ignored => {}
    }
}
