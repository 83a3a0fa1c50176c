//! Session settings
//!
//! Read from a JSON file at startup. Missing or unreadable files fall back to
//! defaults so a bad config never blocks the game from loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::history::GameCategory;

/// Env var naming the settings file
pub const CONFIG_PATH_ENV: &str = "PRESENT_TOSS_CONFIG";
/// Env var naming the history file (overrides `history_path`)
pub const HISTORY_PATH_ENV: &str = "PRESENT_TOSS_HISTORY";

/// Three ascending score cutoffs, one per star
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u32; 3]", into = "[u32; 3]")]
pub struct StarThresholds([u32; 3]);

impl StarThresholds {
    /// Cutoffs must be strictly ascending
    pub fn new(one: u32, two: u32, three: u32) -> Option<Self> {
        (one < two && two < three).then_some(Self([one, two, three]))
    }

    pub fn cutoffs(&self) -> [u32; 3] {
        self.0
    }

    /// Number of cutoffs the score strictly exceeds (0..=3)
    pub fn star_count(&self, score: u32) -> u8 {
        self.0.iter().filter(|&&cutoff| score > cutoff).count() as u8
    }
}

impl Default for StarThresholds {
    fn default() -> Self {
        Self([ONE_STAR_THRESHOLD, TWO_STAR_THRESHOLD, THREE_STAR_THRESHOLD])
    }
}

impl TryFrom<[u32; 3]> for StarThresholds {
    type Error = String;

    fn try_from(value: [u32; 3]) -> Result<Self, Self::Error> {
        Self::new(value[0], value[1], value[2])
            .ok_or_else(|| format!("star thresholds must be ascending, got {:?}", value))
    }
}

impl From<StarThresholds> for [u32; 3] {
    fn from(value: StarThresholds) -> Self {
        value.0
    }
}

/// Session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Persistence key for best results
    pub category: GameCategory,
    pub star_thresholds: StarThresholds,

    // === Pacing ===
    /// Delay before the final score is revealed (ms)
    pub game_over_delay_ms: u64,
    /// Update driver period (ms)
    pub frame_interval_ms: u64,
    /// Title overlay duration before load time is subtracted (ms)
    pub title_duration_ms: u64,
    /// Length of a round of play (ms)
    pub round_duration_ms: u64,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Start muted
    pub muted: bool,

    // === Storage ===
    /// Where best results live; in-memory only when unset
    pub history_path: Option<PathBuf>,

    /// Seed for the reference model (None = time based)
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            category: GameCategory::PresentToss,
            star_thresholds: StarThresholds::default(),

            game_over_delay_ms: GAME_OVER_DELAY_MS,
            frame_interval_ms: FRAME_INTERVAL_MS,
            title_duration_ms: TITLE_DURATION_MS,
            round_duration_ms: ROUND_DURATION_MS,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            history_path: None,
            seed: None,
        }
    }
}

impl Settings {
    pub fn game_over_delay(&self) -> Duration {
        Duration::from_millis(self.game_over_delay_ms)
    }

    /// Never zero; tokio intervals reject a zero period
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::info!("No settings at {} ({}), using defaults", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Invalid settings in {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load from `PRESENT_TOSS_CONFIG` (if set) and apply env overrides
    pub fn from_env() -> Self {
        let mut settings = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load(Path::new(&path)),
            Err(_) => Self::default(),
        };
        if let Ok(path) = std::env::var(HISTORY_PATH_ENV) {
            settings.history_path = Some(PathBuf::from(path));
        }
        settings
    }
}
