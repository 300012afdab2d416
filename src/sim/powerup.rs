//! Timed power-up effects on the player
//!
//! Each timed effect remembers how to undo itself. The undo runs exactly once,
//! either at expiry or when the effect is removed early. Picking up a kind that
//! is already active refreshes its timer without stacking the modifier.

use super::state::{GameState, Player};
use super::tuning::{PowerUpKind, Rarity};
use super::weapon::WeaponKind;

/// Reverses the modifier an effect applied
#[derive(Debug, Clone, Copy, PartialEq)]
enum Restore {
    /// Divide the fire rate by this factor
    FireRate(f32),
    /// Subtract this speed bonus
    Speed(f32),
    /// Divide the damage multiplier by this factor
    Damage(f32),
    /// Hand the weapon back to the newest remaining weapon mode, or basic
    WeaponMode,
    Shield,
    Pierce,
    Magnet,
}

/// An active timed effect
#[derive(Debug, Clone)]
pub struct PowerUpEffect {
    pub kind: PowerUpKind,
    pub rarity: Rarity,
    pub started_at: f64,
    pub duration: f64,
    pub expires_at: f64,
    cleanup: Option<Restore>,
}

/// What applying a pickup did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Instant effect, nothing registered
    Instant,
    /// New effect registered
    Added,
    /// Existing effect of the same kind got a new expiry
    Refreshed,
}

fn weapon_mode(kind: PowerUpKind) -> Option<WeaponKind> {
    match kind {
        PowerUpKind::SpreadShot => Some(WeaponKind::Spread),
        PowerUpKind::Explosive => Some(WeaponKind::Explosive),
        _ => None,
    }
}

/// Apply a picked-up power-up at the current game time
pub fn apply_powerup(
    state: &mut GameState,
    kind: PowerUpKind,
    rarity: Rarity,
    max_lives: u32,
) -> Applied {
    let now = state.game_time;
    let stats = kind.stats();

    if kind.is_instant() {
        if kind == PowerUpKind::Health {
            state.lives = (state.lives + stats.magnitude as u32).min(max_lives);
        }
        return Applied::Instant;
    }

    let duration = stats.duration_ms * rarity.stats().duration_scale;
    let player = &mut state.player;

    if let Some(effect) = player.effects.iter_mut().find(|e| e.kind == kind) {
        effect.started_at = now;
        effect.duration = duration;
        effect.expires_at = now + duration;
        effect.rarity = rarity;
        if let Some(mode) = weapon_mode(kind) {
            player.weapon.kind = mode;
        }
        return Applied::Refreshed;
    }

    let magnitude = stats.magnitude;
    let cleanup = match kind {
        PowerUpKind::RapidFire => {
            player.weapon.fire_rate *= magnitude;
            Restore::FireRate(magnitude)
        }
        PowerUpKind::Speed => {
            player.speed += magnitude;
            Restore::Speed(magnitude)
        }
        PowerUpKind::Damage => {
            player.weapon.damage_multiplier *= magnitude;
            Restore::Damage(magnitude)
        }
        PowerUpKind::SpreadShot => {
            player.weapon.kind = WeaponKind::Spread;
            Restore::WeaponMode
        }
        PowerUpKind::Explosive => {
            player.weapon.kind = WeaponKind::Explosive;
            Restore::WeaponMode
        }
        PowerUpKind::Shield => {
            player.shielded = true;
            Restore::Shield
        }
        PowerUpKind::Pierce => {
            player.pierce = true;
            Restore::Pierce
        }
        PowerUpKind::Magnet => {
            player.magnet_radius = magnitude;
            Restore::Magnet
        }
        PowerUpKind::Health => return Applied::Instant,
    };

    player.effects.push(PowerUpEffect {
        kind,
        rarity,
        started_at: now,
        duration,
        expires_at: now + duration,
        cleanup: Some(cleanup),
    });
    Applied::Added
}

fn run_cleanup(player: &mut Player, effect: &mut PowerUpEffect) {
    let Some(restore) = effect.cleanup.take() else {
        return;
    };
    match restore {
        Restore::FireRate(factor) => player.weapon.fire_rate /= factor,
        Restore::Speed(bonus) => player.speed -= bonus,
        Restore::Damage(factor) => player.weapon.damage_multiplier /= factor,
        Restore::WeaponMode => {
            // The effect has already been removed from the list here
            player.weapon.kind = player
                .effects
                .iter()
                .filter_map(|e| weapon_mode(e.kind).map(|mode| (e.started_at, mode)))
                .max_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, mode)| mode)
                .unwrap_or(WeaponKind::Basic);
        }
        Restore::Shield => player.shielded = false,
        Restore::Pierce => player.pierce = false,
        Restore::Magnet => player.magnet_radius = 0.0,
    }
}

/// Drop every effect whose time is up. Returns how many expired.
pub fn expire_effects(player: &mut Player, now: f64) -> usize {
    let mut expired = 0;
    let mut i = 0;
    while i < player.effects.len() {
        if now >= player.effects[i].expires_at {
            let mut effect = player.effects.remove(i);
            run_cleanup(player, &mut effect);
            log::debug!("{:?} wore off", effect.kind);
            expired += 1;
        } else {
            i += 1;
        }
    }
    expired
}

/// Remove one effect early, running its cleanup. Returns false if it was not active.
pub fn remove_effect(player: &mut Player, kind: PowerUpKind) -> bool {
    let Some(index) = player.effects.iter().position(|e| e.kind == kind) else {
        return false;
    };
    let mut effect = player.effects.remove(index);
    run_cleanup(player, &mut effect);
    true
}

/// Remove every effect, newest first
pub fn clear_effects(player: &mut Player) {
    while let Some(mut effect) = player.effects.pop() {
        run_cleanup(player, &mut effect);
    }
}

/// Rapid fire, spread shot and explosive all active at once.
///
/// Queried at shot time; never cached.
pub fn has_ultimate(player: &Player) -> bool {
    [PowerUpKind::RapidFire, PowerUpKind::SpreadShot, PowerUpKind::Explosive]
        .into_iter()
        .all(|kind| player.has_effect(kind))
}
