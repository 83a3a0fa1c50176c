//! Toss model state
//!
//! Everything a round needs lives here; the rules that move it forward are in
//! `tick`.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::tick::{advance, resolve_fling};
use super::{GamePhase, Simulation};
use crate::consts::{ROUND_DURATION_MS, TITLE_DURATION_MS};
use crate::events::{EventBus, GameEvent};
use crate::settings::Settings;

/// Static model configuration, read once at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub seed: u64,
    pub title_duration_ms: u64,
    pub round_duration_ms: u64,
}

impl ModelConfig {
    pub fn from_settings(settings: &Settings, seed: u64) -> Self {
        Self {
            seed,
            title_duration_ms: settings.title_duration_ms,
            round_duration_ms: settings.round_duration_ms,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            title_duration_ms: TITLE_DURATION_MS,
            round_duration_ms: ROUND_DURATION_MS,
        }
    }
}

/// The elf guarding the chimney. Slides across the goal line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Goalie {
    /// Lateral position in [-1, 1]
    pub x: f32,
    /// Units per second, sign is direction
    pub speed: f32,
    /// Half-width of the blocking area
    pub reach: f32,
}

impl Default for Goalie {
    fn default() -> Self {
        Self {
            x: 0.0,
            speed: 0.6,
            reach: 0.25,
        }
    }
}

/// Reference model for the present toss game
#[derive(Debug)]
pub struct TossModel {
    pub config: ModelConfig,
    pub phase: GamePhase,
    pub score: u32,
    /// Title overlay time left before the model leaves `Loading`
    pub title_duration_ms: u64,
    /// Round clock
    pub time_left_ms: u64,
    pub goalie: Goalie,
    /// Flings thrown this round
    pub throws: u32,
    pub(crate) rng: Pcg32,
    pub(crate) bus: EventBus,
}

impl TossModel {
    /// Create a model in the `Loading` phase
    pub fn new(config: ModelConfig, bus: EventBus) -> Self {
        log::debug!("Toss model created with seed {}", config.seed);
        Self {
            phase: GamePhase::Loading,
            score: 0,
            title_duration_ms: config.title_duration_ms,
            time_left_ms: config.round_duration_ms,
            goalie: Goalie::default(),
            throws: 0,
            rng: Pcg32::seed_from_u64(config.seed),
            config,
            bus,
        }
    }

    /// Change phase and tell listeners. No-op if already there.
    pub(crate) fn set_phase(&mut self, phase: GamePhase) {
        if self.phase == phase {
            return;
        }
        log::debug!("Toss phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.bus.publish(GameEvent::GameStateChanged(phase));
    }

    pub(crate) fn add_score(&mut self, points: u32) {
        self.score += points;
        self.bus.publish(GameEvent::ScoreChanged(self.score));
    }
}

impl Simulation for TossModel {
    fn update(&mut self, delta_ms: u64) {
        advance(self, delta_ms);
    }

    fn on_fling(&mut self, radians: f32) {
        resolve_fling(self, radians);
    }

    fn reset(&mut self, full: bool) {
        self.score = 0;
        self.throws = 0;
        self.time_left_ms = self.config.round_duration_ms;
        self.goalie = Goalie::default();
        self.rng = Pcg32::seed_from_u64(self.config.seed);
        self.bus.publish(GameEvent::ScoreChanged(0));
        if full {
            self.title_duration_ms = self.config.title_duration_ms;
            self.set_phase(GamePhase::Loading);
        } else {
            self.set_phase(GamePhase::Waiting);
        }
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn title_duration_ms(&self) -> u64 {
        self.title_duration_ms
    }

    fn set_title_duration_ms(&mut self, ms: u64) {
        self.title_duration_ms = ms;
    }

    fn phase(&self) -> GamePhase {
        self.phase
    }
}
