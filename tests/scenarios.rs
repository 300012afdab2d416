use arena_frenzy::sim::spawner::{spawn_collectible, spawn_enemy};
use arena_frenzy::sim::weapon::{WeaponKind, spawn_bullet};
use arena_frenzy::sim::{
    Bullet, EnemyKind, FrenzyEndReason, FrenzySource, GamePhase, Pool, Poolable, PowerUpKind,
    Rarity, ScheduledTask, TickInput,
};
use arena_frenzy::{CanvasBounds, Engine, EngineError, GameEvent, QualityPreset, Settings};
use glam::Vec2;
use proptest::prelude::*;

const DT: f32 = 16.0;

/// Seeded settings with the random spawners pushed out of reach
fn quiet() -> Settings {
    let mut settings = Settings::seeded(7);
    settings.spawn.collectible_interval_ms = 1e12;
    settings.spawn.enemy_interval_ms = 1e12;
    settings.spawn.min_enemy_interval_ms = 1e12;
    settings.spawn.powerup_interval_ms = 1e12;
    settings.boss.interval_ms = 1e12;
    settings
}

fn started(settings: Settings) -> Engine {
    let mut engine = Engine::new(settings, Some(CanvasBounds::new(800.0, 600.0))).unwrap();
    engine.start_game();
    engine
}

fn idle() -> TickInput {
    TickInput::default()
}

/// Run ticks and collect every event the engine hands back, then drain the rest
fn run_events(engine: &mut Engine, ticks: usize) -> Vec<GameEvent> {
    let mut out: Vec<GameEvent> = (0..ticks).filter_map(|_| engine.update(DT, &idle())).collect();
    out.extend(engine.drain_events());
    out
}

#[test]
fn construction_without_canvas_fails() {
    assert!(matches!(
        Engine::new(Settings::default(), None),
        Err(EngineError::MissingCanvas)
    ));
}

#[test]
fn shooting_is_rate_limited() {
    let mut engine = started(quiet());
    assert_eq!(engine.player().pos, Vec2::new(400.0, 300.0));
    assert_eq!(engine.player().weapon.kind, WeaponKind::Basic);

    assert!(engine.shoot(500.0, 300.0));
    engine.update(50.0, &idle());
    assert!(!engine.shoot(500.0, 300.0));
    engine.update(70.0, &idle());
    assert!(engine.shoot(500.0, 300.0));
}

#[test]
fn two_hits_kill_a_two_health_enemy() {
    let mut engine = started(quiet());
    let at = Vec2::new(150.0, 150.0);
    let state = engine.state_mut();
    spawn_enemy(state, EnemyKind::Triangle, at);
    assert_eq!(state.enemies[0].health, 2.0);
    assert_eq!(state.player.weapon.damage_multiplier, 1.0);
    spawn_bullet(state, at, Vec2::ZERO, WeaponKind::Basic, 0, 1000.0);

    assert_eq!(engine.update(DT, &idle()), None);
    assert_eq!(engine.enemies()[0].health, 1.0);

    let pos = engine.enemies()[0].pos;
    spawn_bullet(engine.state_mut(), pos, Vec2::ZERO, WeaponKind::Basic, 0, 1000.0);
    match engine.update(DT, &idle()) {
        Some(GameEvent::EnemyKilled { kind, kill_streak, .. }) => {
            assert_eq!(kind, EnemyKind::Triangle);
            assert_eq!(kill_streak, 1);
        }
        other => panic!("expected a kill event, got {other:?}"),
    }
    assert!(engine.enemies().is_empty());
}

#[test]
fn combo_frenzy_escalates_without_superposition() {
    let mut engine = started(quiet());
    let base_speed = engine.player().speed;
    let mut events = Vec::new();

    for pickup in 1..=12 {
        let state = engine.state_mut();
        let at = state.player.pos;
        let bounds = CanvasBounds::new(800.0, 600.0);
        assert!(spawn_collectible(state, &Settings::default(), &bounds));
        if let Some(gem) = state.collectibles.last_mut() {
            gem.pos = at;
        }
        events.extend(engine.update(DT, &idle()));
        assert_eq!(engine.state().combo, pickup);

        let boost = engine.frenzy().speed_boost;
        assert_eq!(engine.player().speed, base_speed + boost);
        assert!(boost <= 100.0);
    }
    events.extend(engine.drain_events());

    let frenzy: Vec<_> = events
        .into_iter()
        .filter(|e| {
            matches!(
                e,
                GameEvent::FrenzyStart { .. }
                    | GameEvent::FrenzyEnd { .. }
                    | GameEvent::FrenzyExtend { .. }
            )
        })
        .collect();
    assert_eq!(
        frenzy,
        vec![
            GameEvent::FrenzyStart { tier: 1, source: FrenzySource::Combo },
            GameEvent::FrenzyEnd { tier: 1, reason: FrenzyEndReason::Escalated },
            GameEvent::FrenzyStart { tier: 2, source: FrenzySource::Combo },
        ]
    );
    assert_eq!(engine.frenzy().tier, 2);
    assert_eq!(engine.player().speed, base_speed + 100.0);
}

#[test]
fn level_up_preempts_kill_event() {
    let mut engine = started(quiet());
    let at = Vec2::new(150.0, 150.0);
    let state = engine.state_mut();
    state.score = 990;
    spawn_enemy(state, EnemyKind::Normal, at);
    spawn_bullet(state, at, Vec2::ZERO, WeaponKind::Basic, 0, 1000.0);

    assert_eq!(engine.update(DT, &idle()), Some(GameEvent::LevelUp { level: 2 }));
    assert!(matches!(
        engine.update(DT, &idle()),
        Some(GameEvent::EnemyKilled { kill_streak: 1, .. })
    ));
}

#[test]
fn quality_round_trip_restores_caps() {
    let mut engine = started(quiet());
    let original = engine.state().caps;
    engine.set_quality(QualityPreset::Low);
    assert_eq!(engine.state().caps.max_enemies, 20);
    assert_ne!(engine.state().caps, original);
    engine.set_quality(QualityPreset::High);
    assert_eq!(engine.state().caps, original);
    assert_eq!(engine.settings().quality, QualityPreset::High);

    // Trimmed entities stay released after the caps come back up
    assert_eq!(engine.create_explosion_bullets(400.0, 300.0, 120), 120);
    engine.set_quality(QualityPreset::Low);
    engine.set_quality(QualityPreset::High);
    assert_eq!(engine.bullets().len(), 50);
    assert_eq!(engine.state().caps, original);
}

#[test]
fn double_release_does_not_corrupt_the_pool() {
    let mut engine = started(quiet());
    assert!(engine.shoot(600.0, 300.0));
    let stale = engine.bullets()[0].clone();
    assert!(engine.state().pools.bullets.is_live(stale.handle()));

    // Expire the shot, then hand the stale copy back a second time
    engine.state_mut().bullets[0].age_ms = f64::MAX;
    engine.update(DT, &idle());
    assert!(engine.bullets().is_empty());
    let before = engine.pool_stats().bullets;

    let pools = &mut engine.state_mut().pools;
    assert!(pools.bullets.release(stale).is_err());
    assert_eq!(pools.bullets.free_len(), 1);
    assert_eq!(engine.pool_stats().bullets, before);

    // The recycled record comes back under a fresh generation
    engine.state_mut().player.weapon.last_shot_at = None;
    assert!(engine.shoot(600.0, 300.0));
    assert_eq!(engine.pool_stats().bullets.created, 1);
}

#[test]
fn pausing_also_pauses_scheduled_effects() {
    let mut engine = started(quiet());
    engine.state_mut().schedule.schedule(
        100.0,
        ScheduledTask::SpawnPowerUp {
            pos: Vec2::new(100.0, 100.0),
            kind: PowerUpKind::Shield,
            rarity: Rarity::Legendary,
        },
    );

    engine.update(50.0, &idle());
    assert!(engine.pause());
    for _ in 0..100 {
        assert_eq!(engine.update(DT, &idle()), None);
    }
    assert!(engine.powerups().is_empty());

    assert!(engine.resume());
    engine.update(60.0, &idle());
    assert_eq!(engine.powerups().len(), 1);
    assert_eq!(engine.powerups()[0].rarity, Rarity::Legendary);
}

#[test]
fn restart_cancels_pending_schedule() {
    let mut engine = started(quiet());
    engine.state_mut().schedule.schedule(
        100.0,
        ScheduledTask::SpawnEnemy { kind: EnemyKind::Fast, pos: Vec2::new(50.0, 50.0) },
    );
    engine.start_game();
    run_events(&mut engine, 20);
    assert!(engine.enemies().is_empty());
}

#[test]
fn boss_kill_drops_staggered_legendary_rewards() {
    let mut engine = started(quiet());
    let at = Vec2::new(200.0, 200.0);
    let state = engine.state_mut();
    spawn_enemy(state, EnemyKind::Boss, at);
    state.enemies[0].health = 0.5;
    spawn_bullet(state, at, Vec2::ZERO, WeaponKind::Basic, 0, 1000.0);

    let events = run_events(&mut engine, 1);
    assert!(events.iter().any(|e| matches!(e, GameEvent::BossKilled { .. })));
    assert!(engine.powerups().is_empty());

    // Rewards arrive 300 ms apart
    run_events(&mut engine, 1);
    assert_eq!(engine.powerups().len(), 1);
    run_events(&mut engine, 19);
    assert_eq!(engine.powerups().len(), 2);
    run_events(&mut engine, 19);
    assert_eq!(engine.powerups().len(), 3);
    assert!(engine.powerups().iter().all(|p| p.rarity == Rarity::Legendary));
}

#[test]
fn a_full_round_ends_in_game_over() {
    let mut settings = Settings::seeded(3);
    settings.player.initial_lives = 1;
    let mut engine = started(settings);
    let mut over = None;
    for _ in 0..60 * 120 {
        if let Some(event @ GameEvent::GameOver { .. }) = engine.update(DT, &idle()) {
            over = Some(event);
            break;
        }
    }
    assert!(over.is_some(), "an idle player should eventually be caught");
    assert_eq!(engine.phase(), GamePhase::GameOver);
    assert_eq!(engine.update(DT, &idle()), None);
}

#[derive(Debug, Clone)]
enum Step {
    Tick { keys: u8, mouse: Option<(f32, f32, bool)>, dt: f32 },
    Shoot(f32, f32),
    Quality(u8),
}

fn dt() -> impl Strategy<Value = f32> {
    prop_oneof![
        8 => 1.0f32..120.0,
        1 => Just(f32::NAN),
        1 => Just(-3.0f32),
        1 => Just(0.0f32),
    ]
}

fn mouse() -> impl Strategy<Value = (f32, f32, bool)> {
    (-50.0f32..850.0, -50.0f32..650.0, any::<bool>())
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        10 => (any::<u8>(), prop::option::of(mouse()), dt())
            .prop_map(|(keys, mouse, dt)| Step::Tick { keys, mouse, dt }),
        2 => (0.0f32..800.0, 0.0f32..600.0).prop_map(|(x, y)| Step::Shoot(x, y)),
        1 => (0u8..3).prop_map(Step::Quality),
    ]
}

fn input_for(keys: u8, mouse: Option<(f32, f32, bool)>) -> TickInput {
    const CODES: [&str; 8] = [
        "KeyW",
        "KeyA",
        "KeyS",
        "KeyD",
        "ArrowUp",
        "ArrowLeft",
        "ArrowDown",
        "ArrowRight",
    ];
    let held = CODES.iter().enumerate().filter(|(i, _)| keys & (1 << i) != 0).map(|(_, c)| *c);
    let input = TickInput::with_keys(held);
    match mouse {
        Some((x, y, down)) => input.with_mouse(x, y, down),
        None => input,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_invariants_hold_for_any_input(
        seed in any::<u64>(),
        steps in prop::collection::vec(step(), 1..400)
    ) {
        let mut settings = Settings::seeded(seed);
        // Compress the round so bosses, swarms and intensity waves show up
        settings.spawn.enemy_interval_ms = 200.0;
        settings.spawn.min_enemy_interval_ms = 50.0;
        settings.spawn.collectible_interval_ms = 150.0;
        settings.spawn.powerup_interval_ms = 500.0;
        settings.spawn.swarm_warmup_ms = 0.0;
        settings.spawn.intensity_warmup_ms = 0.0;
        settings.boss.interval_ms = 2000.0;
        settings.boss.min_score = 0;
        let max_lives = settings.player.max_lives;
        let max_tier = settings.frenzy.max_tier();
        let mut engine = started(settings);

        for step in steps {
            match step {
                Step::Tick { keys, mouse, dt } => {
                    let event = engine.update(dt, &input_for(keys, mouse));
                    prop_assert!(!matches!(event, Some(GameEvent::Error { .. })), "{:?}", event);
                }
                Step::Shoot(x, y) => {
                    engine.shoot(x, y);
                }
                Step::Quality(q) => {
                    let presets = [QualityPreset::Low, QualityPreset::Medium, QualityPreset::High];
                    let preset = presets[q as usize];
                    engine.set_quality(preset);
                }
            }

            let state = engine.state();
            prop_assert!(state.lives <= max_lives);
            prop_assert!(state.bullets.len() <= state.caps.max_bullets);
            prop_assert!(state.enemies.len() <= state.caps.max_enemies);
            prop_assert!(state.collectibles.len() <= state.caps.max_collectibles);
            prop_assert!(state.frenzy.tier <= max_tier);
            prop_assert_eq!(state.frenzy.active, state.frenzy.tier > 0);
            prop_assert!(state.combo_multiplier >= 1.0);

            let stats = engine.pool_stats();
            prop_assert_eq!(stats.bullets.live(), state.bullets.len() as u64);
            prop_assert_eq!(stats.enemies.live(), state.enemies.len() as u64);
            prop_assert_eq!(stats.collectibles.live(), state.collectibles.len() as u64);

            if engine.phase() == GamePhase::GameOver {
                engine.start_game();
            }
        }
    }
}

proptest! {
    #[test]
    fn prop_pool_accounting_balances(
        ops in prop::collection::vec((any::<bool>(), any::<prop::sample::Index>()), 1..300)
    ) {
        let mut pool: Pool<Bullet> = Pool::new("bullet", 16);
        let mut live: Vec<Bullet> = Vec::new();
        let mut released: Vec<Bullet> = Vec::new();

        for (acquire, pick) in ops {
            if acquire || live.is_empty() {
                live.push(pool.acquire());
            } else {
                let bullet = live.swap_remove(pick.index(live.len()));
                released.push(bullet.clone());
                prop_assert!(pool.release(bullet).is_ok());
            }
            // Handing back an already released copy never changes the books
            if let Some(stale) = released.last() {
                let before = pool.stats();
                prop_assert!(pool.release(stale.clone()).is_err());
                prop_assert_eq!(pool.stats(), before);
            }

            let stats = pool.stats();
            prop_assert_eq!(stats.live(), live.len() as u64);
            prop_assert!(pool.free_len() <= 16);
            for bullet in &live {
                prop_assert!(pool.is_live(bullet.handle()));
            }
        }
    }
}
