//! Engine facade
//!
//! [`Engine`] owns the settings, the canvas bounds, the game state and the
//! event queue. Hosts call [`Engine::update`] once per render tick and get back
//! at most one event; anything else the tick produced waits in the queue and is
//! handed out on later ticks.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::error::{EngineError, SimError};
use crate::settings::{QualityPreset, Settings};
use crate::sim::{
    AllPoolStats, Bullet, CanvasBounds, Collectible, Enemy, EventQueue, Frenzy, GameEvent,
    GamePhase, GameState, Player, PowerUpItem, TickInput, tick, weapon,
};

/// Simulation engine driven by the host's frame loop
#[derive(Debug)]
pub struct Engine {
    settings: Settings,
    bounds: CanvasBounds,
    state: GameState,
    events: EventQueue,
}

impl Engine {
    /// Build an engine in the menu phase.
    ///
    /// The RNG is seeded from `settings.seed` when set, otherwise from the
    /// thread RNG.
    pub fn new(settings: Settings, bounds: Option<CanvasBounds>) -> Result<Self, EngineError> {
        let rng = match settings.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_rng(&mut rand::rng()),
        };
        Self::with_rng(settings, bounds, rng)
    }

    /// Build an engine around a caller-supplied generator
    pub fn with_rng(
        settings: Settings,
        bounds: Option<CanvasBounds>,
        rng: Pcg32,
    ) -> Result<Self, EngineError> {
        let bounds = bounds.ok_or(EngineError::MissingCanvas)?;
        if !bounds.is_valid() {
            return Err(EngineError::InvalidCanvas {
                width: bounds.width,
                height: bounds.height,
            });
        }
        settings.validate()?;

        let state = GameState::new(&settings, &bounds, rng);
        log::info!(
            "Engine ready: {}x{} canvas, {} quality, pooling {}",
            bounds.width,
            bounds.height,
            settings.quality.as_str(),
            if settings.pooling { "on" } else { "off" }
        );
        Ok(Self {
            settings,
            bounds,
            state,
            events: EventQueue::default(),
        })
    }

    /// Reset and start a new round. Valid from any phase.
    ///
    /// Pending events and scheduled effects of the previous round are dropped.
    pub fn start_game(&mut self) {
        self.events.clear();
        if let Err(err) = self.state.start_round(&self.settings, &self.bounds) {
            log::warn!("Pool bookkeeping was inconsistent ({err}); rebuilding pools");
            self.state.rebuild_pools(self.settings.pooling);
            if let Err(err) = self.state.start_round(&self.settings, &self.bounds) {
                self.fail(err);
                return;
            }
        }
        log::info!("Round started");
    }

    /// Advance one frame. Returns the event for this frame, if any.
    ///
    /// Does nothing outside the playing phase. A failing step puts the engine
    /// into the error phase and returns the error as an event.
    pub fn update(&mut self, dt_ms: f32, input: &TickInput) -> Option<GameEvent> {
        if self.state.phase != GamePhase::Playing {
            return None;
        }
        match tick(
            &mut self.state,
            &self.settings,
            &self.bounds,
            input,
            dt_ms,
            &mut self.events,
        ) {
            Ok(Some(event)) => Some(event),
            Ok(None) => self.events.pop(),
            Err(err) => Some(self.error_event(err)),
        }
    }

    fn error_event(&mut self, err: SimError) -> GameEvent {
        log::error!("Simulation step failed: {err}");
        self.state.phase = GamePhase::Error;
        GameEvent::Error {
            message: err.to_string(),
        }
    }

    /// Enter the error phase outside of `update`; the event is queued
    fn fail(&mut self, err: SimError) {
        let event = self.error_event(err);
        self.events.push(event);
    }

    /// Fire at a canvas point. Returns false when rate-limited, aimed at the
    /// player, at the bullet cap or not playing.
    pub fn shoot(&mut self, x: f32, y: f32) -> bool {
        self.state.phase == GamePhase::Playing
            && weapon::fire(&mut self.state, &self.settings, Vec2::new(x, y))
    }

    /// Switch quality tier. Entities above the new caps are released, newest first.
    pub fn set_quality(&mut self, preset: QualityPreset) {
        let caps = self.settings.quality_caps.for_preset(preset);
        self.settings.quality = preset;
        self.state.caps = caps;
        self.state.pools.set_caps(caps);

        match self.state.enforce_caps() {
            Ok(0) => {}
            Ok(n) => log::warn!("Released {} entities over the {} caps", n, preset.as_str()),
            Err(err) => self.fail(err),
        }
        log::info!("Quality set to {}", preset.as_str());
    }

    /// Parse a quality name ("low", "medium", "high"). Returns false for unknown names.
    pub fn set_quality_str(&mut self, level: &str) -> bool {
        match QualityPreset::from_str(level) {
            Some(preset) => {
                self.set_quality(preset);
                true
            }
            None => {
                log::warn!("Unknown quality level {:?}", level);
                false
            }
        }
    }

    /// Ring of explosive bullets at a point. Returns how many fit under the cap.
    pub fn create_explosion_bullets(&mut self, x: f32, y: f32, count: usize) -> usize {
        if self.state.phase != GamePhase::Playing {
            return 0;
        }
        weapon::spawn_explosion_ring(&mut self.state, &self.settings, Vec2::new(x, y), count)
    }

    pub fn pause(&mut self) -> bool {
        if self.state.phase != GamePhase::Playing {
            return false;
        }
        self.state.phase = GamePhase::Paused;
        log::info!("Paused");
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state.phase != GamePhase::Paused {
            return false;
        }
        self.state.phase = GamePhase::Playing;
        log::info!("Resumed");
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        match self.state.phase {
            GamePhase::Playing => self.pause(),
            GamePhase::Paused => self.resume(),
            _ => false,
        }
    }

    /// Leave the round. Entities stay where they are until the next `start_game`.
    pub fn return_to_menu(&mut self) {
        self.state.phase = GamePhase::Menu;
    }

    /// Resize the arena. Entities outside the new bounds are left to the
    /// usual clamping and off-screen rules.
    pub fn set_canvas(&mut self, bounds: CanvasBounds) -> Result<(), EngineError> {
        if !bounds.is_valid() {
            return Err(EngineError::InvalidCanvas {
                width: bounds.width,
                height: bounds.height,
            });
        }
        self.bounds = bounds;
        Ok(())
    }

    pub fn peek_event(&self) -> Option<&GameEvent> {
        self.events.peek()
    }

    /// Take every queued event
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain().collect()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn player(&self) -> &Player {
        &self.state.player
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.state.enemies
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.state.bullets
    }

    pub fn collectibles(&self) -> &[Collectible] {
        &self.state.collectibles
    }

    pub fn powerups(&self) -> &[PowerUpItem] {
        &self.state.powerups
    }

    pub fn frenzy(&self) -> &Frenzy {
        &self.state.frenzy
    }

    pub fn pool_stats(&self) -> AllPoolStats {
        self.state.pools.stats()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn bounds(&self) -> CanvasBounds {
        self.bounds
    }

    /// Mutable state access for harnesses that stage scenarios
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }
}
