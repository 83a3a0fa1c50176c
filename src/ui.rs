//! UI side of a session
//!
//! View contracts the host implements, the single-threaded UI execution
//! context, and the fixed-cadence update driver.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::sim::{GamePhase, Simulation};

/// Read-only view of the live model for views that draw it
pub trait ModelView: Send + Sync {
    fn score(&self) -> u32;
    fn phase(&self) -> GamePhase;
}

impl<S: Simulation> ModelView for Mutex<S> {
    fn score(&self) -> u32 {
        self.lock().unwrap_or_else(PoisonError::into_inner).score()
    }

    fn phase(&self) -> GamePhase {
        self.lock().unwrap_or_else(PoisonError::into_inner).phase()
    }
}

/// Surface the model is drawn on
pub trait PlaySurface: Send + Sync {
    fn set_model(&self, model: Option<Arc<dyn ModelView>>);
}

/// Pause affordance
pub trait PauseView: Send + Sync {
    fn show_pause_button(&self);
    fn hide_pause_button(&self);
}

/// Title card shown while the model is loading
pub trait TitleOverlay: Send + Sync {
    fn hide_title(&self);
}

/// Score display and the end-of-game reveal
pub trait ScoreView: Send + Sync {
    fn set_model(&self, model: Option<Arc<dyn ModelView>>);
    /// `live` marks an in-game update (as opposed to the final tally)
    fn update_current_score(&self, text: &str, live: bool);
    fn update_best_score(&self, text: &str);
    /// One star-reveal unit
    fn add_star(&self);
    fn set_share_image(&self, image: ShareImage);
    fn animate_to_end_state(&self);
    /// Back to the in-game layout for a replay
    fn reset_to_start_state(&self);
}

/// Told once the loading pipeline has fully finished
pub trait LoadingListener: Send + Sync {
    fn on_finished_loading(&self, elapsed: Duration);
}

/// Every child view of a session
#[derive(Clone)]
pub struct Views {
    pub play_surface: Arc<dyn PlaySurface>,
    pub pause: Arc<dyn PauseView>,
    pub score: Arc<dyn ScoreView>,
    pub title: Arc<dyn TitleOverlay>,
}

impl Views {
    /// One object playing every role
    pub fn from_single<V>(view: Arc<V>) -> Self
    where
        V: PlaySurface + PauseView + ScoreView + TitleOverlay + 'static,
    {
        Self {
            play_surface: view.clone(),
            pause: view.clone(),
            score: view.clone(),
            title: view,
        }
    }
}

/// Image offered for sharing, picked by stars earned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareImage {
    pub stars: u8,
}

impl ShareImage {
    pub fn for_stars(stars: u8) -> Self {
        Self { stars }
    }

    pub fn resource_name(&self) -> String {
        format!("present_toss_share_{}", self.stars)
    }
}

/// Text shown for a score
pub fn format_score(score: u32) -> String {
    format!("{}", score)
}

pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Cloneable entry point onto the UI context
#[derive(Clone)]
pub struct UiHandle {
    tx: mpsc::UnboundedSender<UiTask>,
}

/// The UI context: one task running queued closures in order
pub struct UiContext;

impl UiContext {
    /// Spawn the UI task. It runs until every `UiHandle` is dropped.
    pub fn spawn() -> (UiHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<UiTask>();
        let task = tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                // A faulty view must not take the whole UI down with it.
                if catch_unwind(AssertUnwindSafe(task)).is_err() {
                    log::error!("UI task panicked");
                }
            }
            log::debug!("UI context stopped");
        });
        (UiHandle { tx }, task)
    }
}

impl UiHandle {
    /// Queue `task` behind everything already queued. False if the UI is gone.
    pub fn run_on_ui(&self, task: impl FnOnce() + Send + 'static) -> bool {
        self.tx.send(Box::new(task)).is_ok()
    }

    /// Run `task` on the UI context after `delay`.
    ///
    /// The handle resolves once the task has run, with its result, or `None`
    /// if the UI context went away first.
    pub fn post_delayed<R>(
        &self,
        delay: Duration,
        task: impl FnOnce() -> R + Send + 'static,
    ) -> JoinHandle<Option<R>>
    where
        R: Send + 'static,
    {
        let ui = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            ui.run_and_wait(task).await
        })
    }

    /// Run `f` on the UI context and wait for its result
    pub async fn run_and_wait<R>(&self, f: impl FnOnce() -> R + Send + 'static) -> Option<R>
    where
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        if !self.run_on_ui(move || {
            let _ = tx.send(f());
        }) {
            return None;
        }
        rx.await.ok()
    }

    /// Wait until everything queued so far has run
    pub async fn flush(&self) -> bool {
        self.run_and_wait(|| ()).await.is_some()
    }
}

/// Something the update driver ticks
pub trait FrameTarget: Send + Sync + 'static {
    fn on_frame(&self, delta_ms: f32);
    /// The driver exits once this turns false
    fn is_live(&self) -> bool;
}

/// Call `target.on_frame` every `period` with the measured elapsed time.
///
/// Holds only a weak reference; stops when the target is dropped or no longer live.
pub fn spawn_update_driver<T: FrameTarget>(target: Weak<T>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        interval.tick().await;
        let mut last = Instant::now();

        loop {
            interval.tick().await;
            let Some(target) = target.upgrade() else {
                break;
            };
            if !target.is_live() {
                break;
            }
            let now = Instant::now();
            target.on_frame(now.duration_since(last).as_secs_f32() * 1000.0);
            last = now;
        }
        log::debug!("Update driver stopped");
    })
}

/// Views that narrate to the log. Used by the headless binary.
#[derive(Debug, Default)]
pub struct LogView;

impl PlaySurface for LogView {
    fn set_model(&self, model: Option<Arc<dyn ModelView>>) {
        match model {
            Some(model) => log::info!("Play surface bound (phase {:?})", model.phase()),
            None => log::info!("Play surface detached"),
        }
    }
}

impl PauseView for LogView {
    fn show_pause_button(&self) {
        log::info!("Pause button shown");
    }

    fn hide_pause_button(&self) {
        log::info!("Pause button hidden");
    }
}

impl TitleOverlay for LogView {
    fn hide_title(&self) {
        log::info!("Title hidden");
    }
}

impl ScoreView for LogView {
    fn set_model(&self, model: Option<Arc<dyn ModelView>>) {
        if let Some(model) = model {
            log::info!("Score view bound (score {})", model.score());
        }
    }

    fn update_current_score(&self, text: &str, live: bool) {
        log::info!("Score: {}{}", text, if live { "" } else { " (final)" });
    }

    fn update_best_score(&self, text: &str) {
        log::info!("Best: {}", text);
    }

    fn add_star(&self) {
        log::info!("*");
    }

    fn set_share_image(&self, image: ShareImage) {
        log::info!("Share image: {}", image.resource_name());
    }

    fn animate_to_end_state(&self) {
        log::info!("Game over screen");
    }

    fn reset_to_start_state(&self) {
        log::info!("Score view reset");
    }
}

impl LoadingListener for LogView {
    fn on_finished_loading(&self, elapsed: Duration) {
        log::info!("Loaded in {}ms", elapsed.as_millis());
    }
}
