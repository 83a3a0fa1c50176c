//! Sound effect playback state
//!
//! Decoding and mixing belong to the platform; this tracks which effects are
//! loaded, which are playing, and the mute/volume state the bus toggles.

use std::collections::HashSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundId {
    /// Present leaves the hand
    Throw,
    /// Present gets past the goalie
    Goal,
    /// Goalie blocks the present
    Block,
    /// Present lands in the water
    Splash,
    /// Goalie pops up at the start of a round
    CharacterAppear,
    /// Out of time
    Eliminate,
    /// Shared menu click
    MenuItemClick,
    /// Shared game-over jingle
    GameOver,
}

impl SoundId {
    /// Asset name on disk
    pub fn asset_name(&self) -> &'static str {
        match self {
            SoundId::Throw => "present_throw_throw",
            SoundId::Goal => "present_throw_goal",
            SoundId::Block => "present_throw_block",
            SoundId::Splash => "swimming_ice_splash_a",
            SoundId::CharacterAppear => "present_throw_character_appear",
            SoundId::Eliminate => "tennis_eliminate",
            SoundId::MenuItemClick => "menu_item_click",
            SoundId::GameOver => "game_over",
        }
    }
}

/// Sounds the toss game needs before play starts
pub const GAME_SOUNDS: [SoundId; 8] = [
    SoundId::MenuItemClick,
    SoundId::GameOver,
    SoundId::Splash,
    SoundId::CharacterAppear,
    SoundId::Eliminate,
    SoundId::Block,
    SoundId::Goal,
    SoundId::Throw,
];

/// Fire-and-forget audio surface the controller talks to
pub trait AudioSink: Send + Sync {
    fn load(&self, id: SoundId);
    fn play(&self, id: SoundId);
    fn pause(&self, id: SoundId);
    fn mute(&self);
    fn unmute(&self);
}

#[derive(Debug)]
struct SoundState {
    loaded: HashSet<SoundId>,
    playing: HashSet<SoundId>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

/// Audio manager for the game
#[derive(Debug)]
pub struct SoundManager {
    state: Mutex<SoundState>,
}

impl Default for SoundManager {
    fn default() -> Self {
        Self::new(0.8, 1.0)
    }
}

impl SoundManager {
    pub fn new(master_volume: f32, sfx_volume: f32) -> Self {
        Self {
            state: Mutex::new(SoundState {
                loaded: HashSet::new(),
                playing: HashSet::new(),
                master_volume: master_volume.clamp(0.0, 1.0),
                sfx_volume: sfx_volume.clamp(0.0, 1.0),
                muted: false,
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SoundState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Get effective volume
    pub fn effective_volume(&self) -> f32 {
        let state = self.state();
        if state.muted {
            0.0
        } else {
            state.master_volume * state.sfx_volume
        }
    }

    pub fn is_muted(&self) -> bool {
        self.state().muted
    }

    pub fn is_playing(&self, id: SoundId) -> bool {
        self.state().playing.contains(&id)
    }
}

impl AudioSink for SoundManager {
    fn load(&self, id: SoundId) {
        if self.state().loaded.insert(id) {
            log::debug!("Loaded sound {}", id.asset_name());
        }
    }

    fn play(&self, id: SoundId) {
        let vol = self.effective_volume();
        let mut state = self.state();
        if !state.loaded.contains(&id) {
            log::warn!("Sound {} played before loading", id.asset_name());
            return;
        }
        state.playing.insert(id);
        if vol > 0.0 {
            log::debug!("Playing {} at {:.2}", id.asset_name(), vol);
        }
    }

    fn pause(&self, id: SoundId) {
        self.state().playing.remove(&id);
    }

    fn mute(&self) {
        self.state().muted = true;
        log::info!("Audio muted");
    }

    fn unmute(&self) {
        self.state().muted = false;
        log::info!("Audio unmuted");
    }
}
