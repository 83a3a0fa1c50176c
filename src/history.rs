//! Best score / best star history
//!
//! One record per game category, persisted as JSON. Reads never touch disk;
//! only `save` does.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Persistence key for best results
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GameCategory {
    PresentToss,
}

/// Best results for one category. `None` means no game finished yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub best_score: Option<u32>,
    #[serde(default)]
    pub best_star_count: Option<u8>,
}

/// Persistence surface the game-over sequence writes through
pub trait HistoryStore: Send {
    fn best_star_count(&self, category: GameCategory) -> Option<u8>;
    fn set_best_star_count(&mut self, category: GameCategory, stars: u8);
    fn best_score(&self, category: GameCategory) -> Option<u32>;
    fn set_best_score(&mut self, category: GameCategory, score: u32);
    /// Durable flush of everything set so far
    fn save(&mut self);
}

/// JSON-file backed history; in-memory when no path is given
#[derive(Debug, Clone, Default)]
pub struct HistoryManager {
    records: BTreeMap<GameCategory, HistoryRecord>,
    path: Option<PathBuf>,
}

impl HistoryManager {
    /// Create empty in-memory history
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            path: None,
        }
    }

    /// Load history from a JSON file. Missing or corrupt files start fresh.
    pub fn load(path: &Path) -> Self {
        let records = match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<BTreeMap<GameCategory, HistoryRecord>>(&json) {
                Ok(records) => {
                    log::info!("Loaded history for {} games", records.len());
                    records
                }
                Err(e) => {
                    log::warn!("Corrupt history at {}: {}; starting fresh", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(_) => {
                log::info!("No history found, starting fresh");
                BTreeMap::new()
            }
        };

        Self {
            records,
            path: Some(path.to_path_buf()),
        }
    }

    /// In-memory unless a path is configured
    pub fn open(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load(path),
            None => Self::new(),
        }
    }

    pub fn record(&self, category: GameCategory) -> HistoryRecord {
        self.records.get(&category).copied().unwrap_or_default()
    }

    fn record_mut(&mut self, category: GameCategory) -> &mut HistoryRecord {
        self.records.entry(category).or_default()
    }
}

impl HistoryStore for HistoryManager {
    fn best_star_count(&self, category: GameCategory) -> Option<u8> {
        self.records.get(&category)?.best_star_count
    }

    fn set_best_star_count(&mut self, category: GameCategory, stars: u8) {
        self.record_mut(category).best_star_count = Some(stars);
    }

    fn best_score(&self, category: GameCategory) -> Option<u32> {
        self.records.get(&category)?.best_score
    }

    fn set_best_score(&mut self, category: GameCategory, score: u32) {
        self.record_mut(category).best_score = Some(score);
    }

    fn save(&mut self) {
        let Some(path) = &self.path else {
            return;
        };
        let json = match serde_json::to_string(&self.records) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize history: {}", e);
                return;
            }
        };
        // Write beside the target, then rename over it
        let tmp = path.with_extension("tmp");
        let result = std::fs::write(&tmp, json).and_then(|()| std::fs::rename(&tmp, path));
        match result {
            Ok(()) => log::info!("History saved ({} games)", self.records.len()),
            Err(e) => log::warn!("Failed to save history to {}: {}", path.display(), e),
        }
    }
}
