// Recording fakes shared by the controller and loading tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::audio::{AudioSink, SoundId};
use crate::history::{GameCategory, HistoryManager, HistoryStore};
use crate::sim::{GamePhase, Simulation};
use crate::ui::{
    LoadingListener, ModelView, PauseView, PlaySurface, ScoreView, ShareImage, TitleOverlay, Views,
};

// Model stand-in that records what the controller asked of it.
#[derive(Debug)]
pub(crate) struct FakeSim {
    pub score: u32,
    pub phase: GamePhase,
    pub title_duration_ms: u64,
    pub updates: Vec<u64>,
    pub flings: Vec<f32>,
    pub resets: Vec<bool>,
}

impl FakeSim {
    pub(crate) fn with_score(score: u32) -> Self {
        Self {
            score,
            phase: GamePhase::Loading,
            title_duration_ms: 1500,
            updates: Vec::new(),
            flings: Vec::new(),
            resets: Vec::new(),
        }
    }
}

impl Simulation for FakeSim {
    fn update(&mut self, delta_ms: u64) {
        self.updates.push(delta_ms);
    }

    fn on_fling(&mut self, radians: f32) {
        self.flings.push(radians);
    }

    fn reset(&mut self, full: bool) {
        self.resets.push(full);
        self.score = 0;
        self.phase = if full {
            GamePhase::Loading
        } else {
            GamePhase::Waiting
        };
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

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ViewCall {
    SurfaceModel(bool),
    ScoreModel(bool),
    CurrentScore(String, bool),
    BestScore(String),
    AddStar,
    ShareImage(u8),
    AnimateEnd,
    ResetScore,
    ShowPause,
    HidePause,
    HideTitle,
    FinishedLoading,
}

// One recorder standing in for every view.
#[derive(Default)]
pub(crate) struct RecordingViews {
    calls: Mutex<Vec<ViewCall>>,
}

impl RecordingViews {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn views(self: &Arc<Self>) -> Views {
        Views::from_single(self.clone())
    }

    pub(crate) fn calls(&self) -> Vec<ViewCall> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    pub(crate) fn count(&self, call: &ViewCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn push(&self, call: ViewCall) {
        self.calls.lock().expect("calls mutex poisoned").push(call);
    }
}

impl PlaySurface for RecordingViews {
    fn set_model(&self, model: Option<Arc<dyn ModelView>>) {
        self.push(ViewCall::SurfaceModel(model.is_some()));
    }
}

impl PauseView for RecordingViews {
    fn show_pause_button(&self) {
        self.push(ViewCall::ShowPause);
    }

    fn hide_pause_button(&self) {
        self.push(ViewCall::HidePause);
    }
}

impl TitleOverlay for RecordingViews {
    fn hide_title(&self) {
        self.push(ViewCall::HideTitle);
    }
}

impl ScoreView for RecordingViews {
    fn set_model(&self, model: Option<Arc<dyn ModelView>>) {
        self.push(ViewCall::ScoreModel(model.is_some()));
    }

    fn update_current_score(&self, text: &str, live: bool) {
        self.push(ViewCall::CurrentScore(text.to_string(), live));
    }

    fn update_best_score(&self, text: &str) {
        self.push(ViewCall::BestScore(text.to_string()));
    }

    fn add_star(&self) {
        self.push(ViewCall::AddStar);
    }

    fn set_share_image(&self, image: ShareImage) {
        self.push(ViewCall::ShareImage(image.stars));
    }

    fn animate_to_end_state(&self) {
        self.push(ViewCall::AnimateEnd);
    }

    fn reset_to_start_state(&self) {
        self.push(ViewCall::ResetScore);
    }
}

impl LoadingListener for RecordingViews {
    fn on_finished_loading(&self, _elapsed: Duration) {
        self.push(ViewCall::FinishedLoading);
    }
}

// History that counts writes, so tests can assert "saved exactly once".
#[derive(Clone, Default)]
pub(crate) struct CountingHistory {
    inner: Arc<Mutex<HistoryManager>>,
    saves: Arc<AtomicU32>,
}

impl CountingHistory {
    pub(crate) fn with_record(best_score: u32, best_stars: u8) -> Self {
        let history = Self::default();
        {
            let mut inner = history.inner.lock().expect("history mutex poisoned");
            inner.set_best_score(GameCategory::PresentToss, best_score);
            inner.set_best_star_count(GameCategory::PresentToss, best_stars);
        }
        history
    }

    pub(crate) fn saves(&self) -> u32 {
        self.saves.load(Ordering::SeqCst)
    }

    pub(crate) fn best_score(&self) -> Option<u32> {
        let inner = self.inner.lock().expect("history mutex poisoned");
        inner.best_score(GameCategory::PresentToss)
    }

    pub(crate) fn best_star_count(&self) -> Option<u8> {
        let inner = self.inner.lock().expect("history mutex poisoned");
        inner.best_star_count(GameCategory::PresentToss)
    }
}

impl HistoryStore for CountingHistory {
    fn best_star_count(&self, category: GameCategory) -> Option<u8> {
        let inner = self.inner.lock().expect("history mutex poisoned");
        inner.best_star_count(category)
    }

    fn set_best_star_count(&mut self, category: GameCategory, stars: u8) {
        let mut inner = self.inner.lock().expect("history mutex poisoned");
        inner.set_best_star_count(category, stars);
    }

    fn best_score(&self, category: GameCategory) -> Option<u32> {
        let inner = self.inner.lock().expect("history mutex poisoned");
        inner.best_score(category)
    }

    fn set_best_score(&mut self, category: GameCategory, score: u32) {
        let mut inner = self.inner.lock().expect("history mutex poisoned");
        inner.set_best_score(category, score);
    }

    fn save(&mut self) {
        self.saves.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AudioCall {
    Load(SoundId),
    Play(SoundId),
    Pause(SoundId),
    Mute,
    Unmute,
}

#[derive(Default)]
pub(crate) struct RecordingAudio {
    calls: Mutex<Vec<AudioCall>>,
}

impl RecordingAudio {
    pub(crate) fn calls(&self) -> Vec<AudioCall> {
        self.calls.lock().expect("audio mutex poisoned").clone()
    }

    fn push(&self, call: AudioCall) {
        self.calls.lock().expect("audio mutex poisoned").push(call);
    }
}

impl AudioSink for RecordingAudio {
    fn load(&self, id: SoundId) {
        self.push(AudioCall::Load(id));
    }

    fn play(&self, id: SoundId) {
        self.push(AudioCall::Play(id));
    }

    fn pause(&self, id: SoundId) {
        self.push(AudioCall::Pause(id));
    }

    fn mute(&self) {
        self.push(AudioCall::Mute);
    }

    fn unmute(&self) {
        self.push(AudioCall::Unmute);
    }
}
