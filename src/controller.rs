//! Session controller
//!
//! Owns the session handle, listens on the event bus, receives frames from the
//! update driver and flings from the gesture recognizer, and runs the
//! deferred game-over sequence.
//!
//! Every operation that can race teardown (events, frames, the game-over
//! timer) checks liveness first and silently does nothing once torn down.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use tokio::task::JoinHandle;

use crate::audio::{AudioSink, GAME_SOUNDS};
use crate::events::{EventBus, EventListener, GameEvent};
use crate::gesture::{GestureRecognizer, PointerEvent};
use crate::history::HistoryStore;
use crate::session::{SessionHandle, SharedSim, lock_sim};
use crate::settings::Settings;
use crate::sim::{GamePhase, Simulation};
use crate::ui::{
    FrameTarget, ModelView, ShareImage, UiHandle, Views, format_score, spawn_update_driver,
};

/// Result of a finished game, carried from scoring to the reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GameOverSummary {
    stars: u8,
    /// Best score after this game (this game's score if it set a record)
    best_score: u32,
    /// Best results changed and need writing
    dirty: bool,
}

fn locked<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Controller for one game session
pub struct SessionController<S: Simulation> {
    me: Weak<Self>,
    settings: Settings,
    ui: UiHandle,
    bus: EventBus,
    handle: SessionHandle<S>,
    history: Mutex<Box<dyn HistoryStore>>,
    views: RwLock<Option<Views>>,
    audio: RwLock<Option<Arc<dyn AudioSink>>>,
    gestures: Mutex<Option<GestureRecognizer>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    driver: Mutex<Option<JoinHandle<()>>>,
    game_over_task: Mutex<Option<JoinHandle<()>>>,
    /// Bumped by every replay; deferred work from an earlier round is dropped
    round: AtomicU64,
    destroyed: AtomicBool,
    paused: AtomicBool,
    game_over: AtomicBool,
}

impl<S: Simulation> SessionController<S> {
    pub fn new(
        settings: Settings,
        ui: UiHandle,
        bus: EventBus,
        history: Box<dyn HistoryStore>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            settings,
            ui,
            bus,
            handle: SessionHandle::new(),
            history: Mutex::new(history),
            views: RwLock::new(None),
            audio: RwLock::new(None),
            gestures: Mutex::new(None),
            listener: Mutex::new(None),
            driver: Mutex::new(None),
            game_over_task: Mutex::new(None),
            round: AtomicU64::new(0),
            destroyed: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            game_over: AtomicBool::new(false),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn ui(&self) -> &UiHandle {
        &self.ui
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn session(&self) -> &SessionHandle<S> {
        &self.handle
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Set as soon as the model reports game over, ahead of the reveal
    pub fn is_game_over(&self) -> bool {
        self.game_over.load(Ordering::Acquire)
    }

    fn views(&self) -> Option<Views> {
        self.views
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn audio(&self) -> Option<Arc<dyn AudioSink>> {
        self.audio
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // === Loading passes (driven by `loading::load_game`) ===

    /// Phase 1, UI context: attach the child views. No model exists yet.
    pub fn attach_views(&self, views: Views) -> bool {
        if self.is_destroyed() {
            return false;
        }
        *self.views.write().unwrap_or_else(PoisonError::into_inner) = Some(views);
        log::debug!("Session views attached");
        true
    }

    /// Phase 2, background context: publish the model, bind it to the views,
    /// start listening on the bus.
    ///
    /// Returns false (and drops `sim`) if the session was torn down first.
    pub fn publish_model(&self, sim: S) -> bool {
        // Teardown detaches under the same lock, so binding and registering
        // either finish before it or not at all.
        let views = self.views.write().unwrap_or_else(PoisonError::into_inner);
        if self.is_destroyed() {
            log::debug!("Session torn down before model publish; discarding model");
            return false;
        }
        let Some(shared) = self.handle.publish(sim) else {
            log::debug!("Session handle refused model; discarding");
            return false;
        };

        if let Some(views) = views.as_ref() {
            let model: Arc<dyn ModelView> = shared.clone();
            views.play_surface.set_model(Some(model.clone()));
            views.score.set_model(Some(model));
        }

        if let Some(me) = self.me.upgrade() {
            let task = self.bus.register(me);
            if let Some(previous) = locked(&self.listener).replace(task) {
                previous.abort();
            }
        }
        true
    }

    /// Phase 3, UI context: gestures, sounds, update driver
    pub fn finish_loading(&self, audio: Arc<dyn AudioSink>) -> bool {
        if self.is_destroyed() {
            return false;
        }
        *locked(&self.gestures) = Some(GestureRecognizer::new());

        for id in GAME_SOUNDS {
            audio.load(id);
        }
        if self.settings.muted {
            audio.mute();
        }
        *self.audio.write().unwrap_or_else(PoisonError::into_inner) = Some(audio);

        self.start_driver();
        true
    }

    fn start_driver(&self) {
        let mut driver = locked(&self.driver);
        if driver.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }
        *driver = Some(spawn_update_driver(
            self.me.clone(),
            self.settings.frame_interval(),
        ));
    }

    // === Session operations ===

    /// Forward elapsed time to the model. Nothing happens while paused,
    /// before the model is published or after teardown.
    pub fn update(&self, delta_ms: f32) {
        if self.is_destroyed() || self.is_paused() {
            return;
        }
        self.handle.with(|sim| sim.update(delta_ms.max(0.0) as u64));
    }

    /// Forward a fling. The angle is passed through unchecked.
    pub fn on_fling(&self, angle: f32) {
        if self.is_destroyed() {
            return;
        }
        self.handle.with(|sim| sim.on_fling(angle));
    }

    /// Raw pointer input. False until gestures are wired in the last loading pass.
    pub fn on_touch_event(&self, event: PointerEvent) -> bool {
        let fling = {
            let mut gestures = locked(&self.gestures);
            let Some(recognizer) = gestures.as_mut() else {
                return false;
            };
            recognizer.on_pointer(event)
        };
        if let Some(fling) = fling {
            self.on_fling(fling.angle);
        }
        true
    }

    /// Start over on the same model instance
    pub fn replay(&self) {
        if self.is_destroyed() {
            return;
        }
        let Some(sim) = self.handle.get() else {
            return;
        };
        self.round.fetch_add(1, Ordering::AcqRel);
        if let Some(task) = locked(&self.game_over_task).take() {
            task.abort();
        }
        self.game_over.store(false, Ordering::Release);
        self.paused.store(false, Ordering::Release);
        if let Some(views) = self.views() {
            self.ui.run_on_ui(move || views.score.reset_to_start_state());
        }
        lock_sim(&sim).reset(false);
        log::info!("Replaying");
    }

    pub fn pause(&self) {
        if !self.paused.swap(true, Ordering::AcqRel) {
            log::debug!("Session paused");
        }
    }

    pub fn resume(&self) {
        if self.is_destroyed() {
            return;
        }
        self.paused.store(false, Ordering::Release);
        if locked(&self.gestures).is_some() {
            self.start_driver();
        }
    }

    /// Clear the handle and detach the views. Everything after this is a no-op.
    pub fn teardown(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.handle.clear();

        let views = self
            .views
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(views) = views {
            views.play_surface.set_model(None);
            views.score.set_model(None);
        }
        *locked(&self.gestures) = None;

        if let Some(driver) = locked(&self.driver).take() {
            driver.abort();
        }
        if let Some(listener) = locked(&self.listener).take() {
            listener.abort();
        }
        log::info!("Session torn down");
    }

    /// Current score, if a model is live
    pub fn score(&self) -> Option<u32> {
        self.handle.with(|sim| sim.score())
    }

    /// Stars the current score is worth
    pub fn star_count(&self) -> Option<u8> {
        self.score()
            .map(|score| self.settings.star_thresholds.star_count(score))
    }

    pub fn share_image(&self) -> ShareImage {
        ShareImage::for_stars(self.star_count().unwrap_or(0))
    }

    /// Hand over the pending game-over timer, if one is scheduled
    pub fn take_game_over_task(&self) -> Option<JoinHandle<()>> {
        locked(&self.game_over_task).take()
    }

    // === Event handling ===

    fn on_phase_changed(&self, phase: GamePhase) {
        match phase {
            GamePhase::GameOver => {
                // Duplicate notifications are not a new transition.
                if !self.game_over.swap(true, Ordering::AcqRel) {
                    self.schedule_game_over();
                }
            }
            GamePhase::Waiting => {
                self.game_over.store(false, Ordering::Release);
                if let Some(views) = self.views() {
                    self.ui.run_on_ui(move || {
                        views.title.hide_title();
                        views.pause.show_pause_button();
                    });
                }
            }
            GamePhase::Loading | GamePhase::Playing => {
                self.game_over.store(false, Ordering::Release);
            }
        }
    }

    fn schedule_game_over(&self) {
        let Some(scheduled) = self.handle.get() else {
            return;
        };
        let Some(me) = self.me.upgrade() else {
            return;
        };
        let round = self.round.load(Ordering::Acquire);
        let delay = self.settings.game_over_delay();
        log::debug!("Game over; revealing score in {}ms", delay.as_millis());

        let settle = {
            let me = me.clone();
            self.ui
                .post_delayed(delay, move || me.record_game(&scheduled, round))
        };
        let task = tokio::spawn(async move {
            let Ok(Some(Some(summary))) = settle.await else {
                return;
            };
            if summary.dirty {
                let store = me.clone();
                let saved = tokio::task::spawn_blocking(move || locked(&store.history).save());
                if let Err(e) = saved.await {
                    log::warn!("History save did not complete: {}", e);
                }
            }
            me.reveal(summary, round);
        });
        *locked(&self.game_over_task) = Some(task);
    }

    fn is_current_round(&self, round: u64) -> bool {
        !self.is_destroyed() && self.round.load(Ordering::Acquire) == round
    }

    /// Score the finished game and fold it into the best results. Runs on the
    /// UI context; writing the history to disk is left to the caller.
    ///
    /// Does nothing unless `scheduled` is still the live model and no replay
    /// started since the game ended.
    fn record_game(&self, scheduled: &SharedSim<S>, round: u64) -> Option<GameOverSummary> {
        if !self.is_current_round(round) {
            return None;
        }
        let live = self.handle.get()?;
        if !Arc::ptr_eq(&live, scheduled) {
            return None;
        }

        let score = lock_sim(&live).score();
        let stars = self.settings.star_thresholds.star_count(score);
        let category = self.settings.category;

        let mut history = locked(&self.history);
        let mut dirty = false;

        if history.best_star_count(category).is_none_or(|best| best < stars) {
            history.set_best_star_count(category, stars);
            dirty = true;
        }

        let mut best_score = history.best_score(category).unwrap_or(0);
        if history.best_score(category).is_none_or(|best| score > best) {
            history.set_best_score(category, score);
            best_score = score;
            dirty = true;
        }

        log::info!(
            "Final score {} ({} stars), best {}{}",
            score,
            stars,
            best_score,
            if dirty { ", new record" } else { "" }
        );
        Some(GameOverSummary {
            stars,
            best_score,
            dirty,
        })
    }

    /// Queue the end-of-game reveal on the UI context
    fn reveal(&self, summary: GameOverSummary, round: u64) {
        let (Some(views), Some(me)) = (self.views(), self.me.upgrade()) else {
            return;
        };
        self.ui.run_on_ui(move || {
            if !me.is_current_round(round) {
                return;
            }
            for _ in 0..summary.stars {
                views.score.add_star();
            }
            views.pause.hide_pause_button();
            views
                .score
                .update_best_score(&format_score(summary.best_score));
            views
                .score
                .set_share_image(ShareImage::for_stars(summary.stars));
            views.score.animate_to_end_state();
        });
    }
}

impl<S: Simulation> EventListener for SessionController<S> {
    fn on_event(&self, event: GameEvent) {
        if self.is_destroyed() {
            return;
        }
        match event {
            GameEvent::ScoreChanged(score) => {
                if let Some(views) = self.views() {
                    let text = format_score(score);
                    self.ui
                        .run_on_ui(move || views.score.update_current_score(&text, true));
                }
            }
            GameEvent::PlaySound(id) => {
                if let Some(audio) = self.audio() {
                    audio.play(id);
                }
            }
            GameEvent::PauseSound(id) => {
                if let Some(audio) = self.audio() {
                    audio.pause(id);
                }
            }
            GameEvent::MuteSounds(mute) => {
                if let Some(audio) = self.audio() {
                    if mute {
                        audio.mute();
                    } else {
                        audio.unmute();
                    }
                }
            }
            GameEvent::GameStateChanged(phase) => self.on_phase_changed(phase),
            GameEvent::GameLoaded(load_time_ms) => {
                self.handle.with(|sim| {
                    let remaining = sim.title_duration_ms().saturating_sub(load_time_ms);
                    sim.set_title_duration_ms(remaining);
                    log::debug!("Waiting {}ms and then hiding title", remaining);
                });
            }
        }
    }
}

impl<S: Simulation> FrameTarget for SessionController<S> {
    fn on_frame(&self, delta_ms: f32) {
        self.update(delta_ms);
    }

    fn is_live(&self) -> bool {
        !self.is_destroyed()
    }
}
