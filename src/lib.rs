//! Present Toss - session controller for a single-screen fling mini-game
//!
//! Core modules:
//! - `controller`: Session lifecycle, event handling, deferred game-over sequence
//! - `loading`: Three-phase bootstrap across UI/background contexts
//! - `session`: Teardown-safe single-slot handle to the live simulation
//! - `gesture`: Pointer down/up pairs to fling angles
//! - `events`: Process-wide typed event bus
//! - `sim`: Simulation contract plus the reference toss model
//! - `history`: Best score / best star persistence
//! - `audio`: Sound effect playback state
//! - `ui`: View contracts, UI execution context, update driver

pub mod audio;
pub mod controller;
pub mod events;
pub mod gesture;
pub mod history;
pub mod loading;
pub mod session;
pub mod settings;
pub mod sim;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::SessionController;
pub use events::{EventBus, GameEvent};
pub use history::{GameCategory, HistoryManager, HistoryStore};
pub use settings::{Settings, StarThresholds};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Delay between entering game over and revealing the final score (ms).
    /// Lets the model's own end-of-game animation finish first.
    pub const GAME_OVER_DELAY_MS: u64 = 2000;

    /// Update driver cadence (60 Hz)
    pub const FRAME_INTERVAL_MS: u64 = 1000 / 60;

    /// How long the title overlay stays up before play starts
    pub const TITLE_DURATION_MS: u64 = 1500;

    /// Length of one round of play
    pub const ROUND_DURATION_MS: u64 = 30_000;

    /// Default star cutoffs (goals). A score must strictly exceed a cutoff.
    pub const ONE_STAR_THRESHOLD: u32 = 5;
    pub const TWO_STAR_THRESHOLD: u32 = 10;
    pub const THREE_STAR_THRESHOLD: u32 = 15;

    /// Maximum stars a single game can earn
    pub const MAX_STARS: u8 = 3;

    /// Event bus capacity before slow listeners start lagging
    pub const EVENT_BUS_CAPACITY: usize = 128;
}

/// Angle of the vector from `from` to `to`, in (-π, π]
#[inline]
pub fn direction_angle(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    delta.y.atan2(delta.x)
}
