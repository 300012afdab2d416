//! Damage resolution, kill rewards and player contact

use glam::Vec2;

use super::collision::circles_overlap;
use super::events::{EventQueue, GameEvent};
use super::frenzy::{self, FrenzySource};
use super::pool::release_where;
use super::spawner;
use super::state::{Bullet, Enemy, GameState};
use super::weapon::{self, WeaponKind};
use crate::consts::{KILL_STREAK_MILESTONES, KILL_STREAK_WINDOW_MS};
use crate::error::SimError;
use crate::settings::{FrenzyTier, Settings};

/// Explosive kills reach this multiple of the configured chain radius
pub const CHAIN_REACH_FACTOR: f32 = 1.5;

#[derive(Debug, Clone, Copy)]
struct Kill {
    index: usize,
    chained: bool,
}

/// Apply bullet damage, chain explosions and kill rewards, then release dead
/// enemies and spent bullets
pub fn resolve_bullet_hits(
    state: &mut GameState,
    settings: &Settings,
    events: &mut EventQueue,
) -> Result<(), SimError> {
    let multiplier = state.player.weapon.damage_multiplier;
    let mut kills = Vec::new();
    let mut blasts: Vec<Vec2> = Vec::new();

    for bullet in &mut state.bullets {
        if bullet.spent {
            continue;
        }
        for (index, enemy) in state.enemies.iter_mut().enumerate() {
            if enemy.dead || bullet.struck.contains(&enemy.id) {
                continue;
            }
            if !circles_overlap(bullet.pos, bullet.radius, enemy.pos, enemy.radius) {
                continue;
            }

            enemy.health -= bullet.damage * multiplier;
            bullet.struck.push(enemy.id);
            if enemy.health <= 0.0 {
                enemy.dead = true;
                kills.push(Kill { index, chained: false });
                if bullet.kind == WeaponKind::Explosive {
                    blasts.push(enemy.pos);
                }
            }
            if !bullet.pierce {
                bullet.spent = true;
                break;
            }
        }
    }

    // One level of chaining; chained kills do not detonate further
    let reach = settings.weapon.chain_radius * CHAIN_REACH_FACTOR;
    for center in blasts {
        for (index, enemy) in state.enemies.iter_mut().enumerate() {
            if !enemy.dead && enemy.pos.distance(center) <= reach {
                enemy.dead = true;
                kills.push(Kill { index, chained: true });
            }
        }
    }

    for kill in kills {
        register_kill(state, settings, kill.index, kill.chained, events);
    }

    release_where(&mut state.enemies, &mut state.pools.enemies, |e: &Enemy| e.dead)?;
    release_where(&mut state.bullets, &mut state.pools.bullets, |b: &Bullet| b.spent)?;
    Ok(())
}

/// Streak, score, events and frenzy for one kill.
///
/// The enemy must still be in `state.enemies` at `index`; it is released later
/// in the step.
fn register_kill(
    state: &mut GameState,
    settings: &Settings,
    index: usize,
    chained: bool,
    events: &mut EventQueue,
) {
    let Some(enemy) = state.enemies.get(index) else {
        return;
    };
    let (kind, pos) = (enemy.kind, enemy.pos);
    let stats = kind.stats();
    let now = state.game_time;

    let previous = match state.last_kill_at {
        Some(at) if now - at <= KILL_STREAK_WINDOW_MS => state.kill_streak,
        _ => 0,
    };
    state.kill_streak = previous + 1;
    state.last_kill_at = Some(now);
    state.kills += 1;
    let streak = state.kill_streak;

    if kind.is_boss() {
        let score = (stats.score as f32 * state.difficulty).round() as u64;
        state.score += score;
        log::info!("Boss killed for {} points", score);
        events.push(GameEvent::BossKilled { pos, score });
        weapon::spawn_explosion_ring(state, settings, pos, settings.boss.explosion_bullets);
        spawner::schedule_boss_rewards(state, settings, pos);
    } else {
        let bonus = 2 * (streak as u64 - 1);
        let score = (stats.score as f32 * state.combo_multiplier).round() as u64 + bonus;
        state.score += score;
        events.push(GameEvent::EnemyKilled {
            pos,
            kind,
            color: stats.color,
            score,
            kill_streak: streak,
            chained,
        });
    }

    if KILL_STREAK_MILESTONES.contains(&streak) {
        log::info!("Kill streak milestone: {}", streak);
        events.push(GameEvent::KillstreakMilestone { pos, streak });
    }

    let tier = frenzy::tier_crossed(
        &settings.frenzy,
        |t: &FrenzyTier| t.streak_threshold,
        previous,
        streak,
    );
    frenzy::trigger(state, &settings.frenzy, tier, FrenzySource::KillStreak, events);
}

/// Enemy contact with the player. At most one life is lost per tick; the
/// enemy that landed the hit is destroyed unless it is the boss.
pub fn resolve_contact(
    state: &mut GameState,
    settings: &Settings,
    events: &mut EventQueue,
) -> Result<(), SimError> {
    if state.player.is_invulnerable() {
        return Ok(());
    }

    let player = &state.player;
    let Some(enemy) = state
        .enemies
        .iter_mut()
        .find(|e| !e.dead && circles_overlap(player.pos, player.radius, e.pos, e.radius))
    else {
        return Ok(());
    };
    if !enemy.kind.is_boss() {
        enemy.dead = true;
    }

    state.lives = state.lives.saturating_sub(1);
    state.player.invulnerable_ms = settings.player.invulnerability_ms;
    log::info!("Player hit, {} lives left", state.lives);
    events.push(GameEvent::Hit {
        pos: state.player.pos,
        lives: state.lives,
    });

    release_where(&mut state.enemies, &mut state.pools.enemies, |e: &Enemy| e.dead)?;
    Ok(())
}
