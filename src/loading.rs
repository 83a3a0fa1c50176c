//! Three-phase session bootstrap
//!
//! 1. UI context: attach views.
//! 2. Background context: build the model, publish it into the session handle.
//! 3. UI context: gestures, sounds, "finished loading", update driver.
//!
//! Each phase waits for the previous one. A teardown at any point abandons the
//! rest; a model built after teardown is dropped, never published.

use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;

use crate::audio::AudioSink;
use crate::controller::SessionController;
use crate::events::GameEvent;
use crate::sim::Simulation;
use crate::ui::{LoadingListener, Views};

/// How a load ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Model published and the session is running
    Ready,
    /// The session was torn down mid-load
    Abandoned,
}

/// Errors returned by the loading pipeline
#[derive(Debug)]
pub enum LoadError {
    /// Model construction panicked or was cancelled
    ModelConstruction(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::ModelConstruction(reason) => {
                write!(f, "model construction failed: {}", reason)
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// What the host hands the pipeline
pub struct LoadRequest<F> {
    pub views: Views,
    pub audio: Arc<dyn AudioSink>,
    /// Told when phase 3 completes, on the UI context
    pub listener: Option<Arc<dyn LoadingListener>>,
    /// Builds the model on the background context
    pub build_model: F,
}

/// Run all three phases for `controller`
pub async fn load_game<S, F>(
    controller: Arc<SessionController<S>>,
    request: LoadRequest<F>,
) -> Result<LoadOutcome, LoadError>
where
    S: Simulation,
    F: FnOnce() -> S + Send + 'static,
{
    let started = Instant::now();
    let LoadRequest {
        views,
        audio,
        listener,
        build_model,
    } = request;
    let ui = controller.ui().clone();

    // Phase 1
    let session = controller.clone();
    let attached = ui
        .run_and_wait(move || session.attach_views(views))
        .await
        .unwrap_or(false);
    if !attached {
        log::info!("Load abandoned before views were attached");
        return Ok(LoadOutcome::Abandoned);
    }

    // Phase 2
    let session = controller.clone();
    let published = tokio::task::spawn_blocking(move || {
        let sim = build_model();
        session.publish_model(sim)
    })
    .await
    .map_err(|e| LoadError::ModelConstruction(e.to_string()))?;
    if !published {
        log::info!("Load abandoned; model discarded");
        return Ok(LoadOutcome::Abandoned);
    }

    // Phase 3
    let session = controller.clone();
    let finished = ui
        .run_and_wait(move || {
            if !session.finish_loading(audio) {
                return None;
            }
            let elapsed = started.elapsed();
            if let Some(listener) = listener {
                listener.on_finished_loading(elapsed);
            }
            Some(elapsed)
        })
        .await
        .flatten();
    let Some(elapsed) = finished else {
        log::info!("Load abandoned before the session started");
        return Ok(LoadOutcome::Abandoned);
    };

    controller
        .bus()
        .publish(GameEvent::GameLoaded(elapsed.as_millis() as u64));
    log::info!("Session loaded in {}ms", elapsed.as_millis());
    Ok(LoadOutcome::Ready)
}
