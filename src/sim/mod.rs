//! Simulation contract and the reference toss model
//!
//! The session controller only ever talks to a model through `Simulation`.
//! `TossModel` is the model the game ships with:
//! - Fixed cutoff round timer
//! - Seeded RNG only (goalie drift)
//! - Reports score and phase changes on the event bus

pub mod model;
pub mod tick;

use serde::{Deserialize, Serialize};

pub use model::{Goalie, ModelConfig, TossModel};
pub use tick::{FlingOutcome, advance, resolve_fling};

/// Externally observable lifecycle stage of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title overlay is up
    Loading,
    /// Ready for the first fling
    Waiting,
    /// Round clock running
    Playing,
    /// Round over, final score fixed
    GameOver,
}

/// What the controller may ask of a model
pub trait Simulation: Send + 'static {
    /// Advance by `delta_ms` of wall time
    fn update(&mut self, delta_ms: u64);
    /// Throw in the given direction (radians, screen space)
    fn on_fling(&mut self, radians: f32);
    /// Back to the start. `full` replays the title sequence too.
    fn reset(&mut self, full: bool);
    fn score(&self) -> u32;
    fn title_duration_ms(&self) -> u64;
    fn set_title_duration_ms(&mut self, ms: u64);
    fn phase(&self) -> GamePhase;
}
