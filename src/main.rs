//! Present Toss entry point
//!
//! Runs one headless session: load, a scripted round of flings, the
//! game-over reveal, teardown. Views narrate to the log.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use present_toss::audio::SoundManager;
use present_toss::controller::SessionController;
use present_toss::events::EventBus;
use present_toss::gesture::PointerEvent;
use present_toss::history::HistoryManager;
use present_toss::loading::{LoadOutcome, LoadRequest, load_game};
use present_toss::settings::Settings;
use present_toss::sim::{GamePhase, ModelConfig, Simulation, TossModel};
use present_toss::ui::{LogView, UiContext, Views};

/// Where the scripted player stands, in screen pixels
const THROW_ORIGIN: (f32, f32) = (360.0, 1100.0);
/// Swipe length for each scripted throw
const THROW_LENGTH: f32 = 400.0;
const THROW_INTERVAL: Duration = Duration::from_millis(700);

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();
}

async fn wait_for_phase(controller: &SessionController<TossModel>, phase: GamePhase) -> bool {
    loop {
        match controller.session().with(|sim| sim.phase()) {
            Some(current) if current == phase => return true,
            Some(_) => tokio::time::sleep(controller.settings().frame_interval()).await,
            None => return false,
        }
    }
}

/// Swipe from the throw origin, fanning left and right across throws
fn throw(controller: &SessionController<TossModel>, index: u32) {
    let (x, y) = THROW_ORIGIN;
    let spread = ((index * 37) % 61) as f32 / 60.0 - 0.5;
    let events = [
        PointerEvent::Down { x, y },
        PointerEvent::Move {
            x: x + spread * THROW_LENGTH * 0.5,
            y: y - THROW_LENGTH * 0.5,
        },
        PointerEvent::Up {
            x: x + spread * THROW_LENGTH,
            y: y - THROW_LENGTH,
        },
    ];
    for event in events {
        controller.on_touch_event(event);
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    log::info!("Present Toss starting...");

    let settings = Settings::from_env();
    let seed = settings.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    });
    log::info!("Game initialized with seed: {}", seed);

    let history = HistoryManager::open(settings.history_path.as_deref());
    let previous = history.record(settings.category);
    match (previous.best_score, previous.best_star_count) {
        (Some(score), Some(stars)) => log::info!("Best so far: {} ({} stars)", score, stars),
        _ => log::info!("No finished games yet"),
    }
    let bus = EventBus::instance().clone();
    let (ui, _ui_task) = UiContext::spawn();
    let controller = SessionController::new(settings.clone(), ui, bus.clone(), Box::new(history));

    let view = Arc::new(LogView);
    let audio = Arc::new(SoundManager::new(settings.master_volume, settings.sfx_volume));
    let model_config = ModelConfig::from_settings(&settings, seed);
    let request = LoadRequest {
        views: Views::from_single(view.clone()),
        audio,
        listener: Some(view),
        build_model: move || TossModel::new(model_config, bus),
    };

    match load_game(controller.clone(), request).await {
        Ok(LoadOutcome::Ready) => {}
        Ok(LoadOutcome::Abandoned) => {
            log::warn!("Load abandoned");
            return;
        }
        Err(e) => {
            log::error!("Failed to load: {}", e);
            return;
        }
    }

    if !wait_for_phase(&controller, GamePhase::Waiting).await {
        return;
    }

    let mut index = 0;
    while !controller.is_game_over() && !controller.is_destroyed() {
        throw(&controller, index);
        index += 1;
        tokio::time::sleep(THROW_INTERVAL).await;
    }
    log::info!("{} throws", index);

    // The timer is stored just after the game-over flag flips
    while !controller.is_destroyed() {
        if let Some(reveal) = controller.take_game_over_task() {
            let _ = reveal.await;
            break;
        }
        tokio::time::sleep(controller.settings().frame_interval()).await;
    }
    controller.ui().flush().await;
    controller.teardown();
}
