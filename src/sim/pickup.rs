//! Collectibles, power-up pickups and the combo counter

use super::collision::circles_overlap;
use super::events::{EventQueue, GameEvent};
use super::frenzy::{self, FrenzySource};
use super::pool::release_where;
use super::powerup::{self, Applied};
use super::state::{Collectible, GameState};
use crate::consts::{COLLECTIBLE_WARNING_MS, POWERUP_ITEM_LIFETIME_MS};
use crate::error::SimError;
use crate::settings::{ComboSettings, FrenzyTier, Settings};

/// Spin of pickups (radians per ms)
const SPIN_RATE: f32 = 0.003;
/// Speed at which the magnet pulls collectibles (px/s)
pub const MAGNET_PULL_SPEED: f32 = 300.0;

/// `min(max, 1 + floor(combo / step) * increment)`, never below 1
pub fn combo_multiplier(settings: &ComboSettings, combo: u32) -> f32 {
    let steps = (combo / settings.step.max(1)) as f32;
    (1.0 + steps * settings.multiplier_increment).clamp(1.0, settings.max_multiplier.max(1.0))
}

/// Age, spin and attract pickups; release the expired ones
pub fn advance_pickups(state: &mut GameState, dt_ms: f32) -> Result<(), SimError> {
    let dt = dt_ms / 1000.0;
    let player = &state.player;

    for gem in &mut state.collectibles {
        gem.age_ms += dt_ms as f64;
        gem.rotation += SPIN_RATE * dt_ms;
        if !gem.warning_played && gem.lifetime_ms - gem.age_ms <= COLLECTIBLE_WARNING_MS {
            gem.warning_played = true;
        }
        if player.magnet_radius > 0.0 {
            let offset = player.pos - gem.pos;
            let distance = offset.length();
            if distance < player.magnet_radius && distance > 0.0 {
                gem.pos += offset / distance * (MAGNET_PULL_SPEED * dt).min(distance);
            }
        }
    }
    release_where(&mut state.collectibles, &mut state.pools.collectibles, |c: &Collectible| {
        c.age_ms >= c.lifetime_ms
    })?;

    for item in &mut state.powerups {
        item.age_ms += dt_ms as f64;
        item.rotation += SPIN_RATE * dt_ms;
    }
    state.powerups.retain(|item| item.age_ms < POWERUP_ITEM_LIFETIME_MS);
    Ok(())
}

/// Pick up everything the player touches
pub fn collect(
    state: &mut GameState,
    settings: &Settings,
    events: &mut EventQueue,
) -> Result<(), SimError> {
    let now = state.game_time;

    for index in 0..state.collectibles.len() {
        let gem = &state.collectibles[index];
        if gem.collected
            || !circles_overlap(state.player.pos, state.player.radius, gem.pos, gem.radius)
        {
            continue;
        }
        let (pos, color, value) = (gem.pos, gem.color, gem.value);
        state.collectibles[index].collected = true;

        let previous = state.combo;
        state.combo += 1;
        state.last_collect_at = Some(now);
        state.combo_multiplier = combo_multiplier(&settings.combo, state.combo);
        let gained = (value as f32 * state.combo_multiplier).round() as u64;
        state.score += gained;
        events.push(GameEvent::Collect {
            pos,
            color,
            value: gained,
            combo: state.combo,
            multiplier: state.combo_multiplier,
        });

        let tier = frenzy::tier_crossed(
            &settings.frenzy,
            |t: &FrenzyTier| t.combo_threshold,
            previous,
            state.combo,
        );
        frenzy::trigger(state, &settings.frenzy, tier, FrenzySource::Combo, events);
    }
    release_where(&mut state.collectibles, &mut state.pools.collectibles, |c: &Collectible| {
        c.collected
    })?;

    let player = &state.player;
    let (touched, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut state.powerups)
        .into_iter()
        .partition(|item| circles_overlap(player.pos, player.radius, item.pos, item.radius));
    state.powerups = rest;

    for item in touched {
        let applied =
            powerup::apply_powerup(state, item.kind, item.rarity, settings.player.max_lives);
        log::info!("Picked up {:?} ({:?}): {:?}", item.kind, item.rarity, applied);
        events.push(GameEvent::PowerUp {
            pos: item.pos,
            kind: item.kind,
            rarity: item.rarity,
            color: item.color,
            refreshed: applied == Applied::Refreshed,
        });
    }
    Ok(())
}

/// Reset the combo once the pickup window has lapsed
pub fn decay_combo(state: &mut GameState, settings: &ComboSettings) {
    if state.combo == 0 {
        return;
    }
    let lapsed = state
        .last_collect_at
        .is_none_or(|at| state.game_time - at > settings.timeout_ms);
    if lapsed {
        log::debug!("Combo of {} lapsed", state.combo);
        state.combo = 0;
        state.combo_multiplier = 1.0;
    }
}
