//! Process-wide event bus
//!
//! The model publishes, the session controller (and anyone else) listens.
//! Each listener gets its own delivery task, so delivery is asynchronous to the
//! publisher but keeps per-source order.

use std::sync::{Arc, OnceLock};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::audio::SoundId;
use crate::consts::EVENT_BUS_CAPACITY;
use crate::sim::GamePhase;

/// Every notification the bus carries
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    ScoreChanged(u32),
    PlaySound(SoundId),
    PauseSound(SoundId),
    MuteSounds(bool),
    GameStateChanged(GamePhase),
    /// Time spent loading, in ms
    GameLoaded(u64),
}

/// Receives events on the listener's delivery task
pub trait EventListener: Send + Sync + 'static {
    fn on_event(&self, event: GameEvent);
}

/// Cheap-to-clone publish/subscribe channel
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<GameEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { tx }
    }

    /// The shared process-wide bus
    pub fn instance() -> &'static EventBus {
        static BUS: OnceLock<EventBus> = OnceLock::new();
        BUS.get_or_init(EventBus::new)
    }

    /// Publish to every registered listener. No listeners is not an error.
    pub fn publish(&self, event: GameEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }

    /// Spawn a delivery task feeding `listener`. Must be called inside a tokio runtime.
    ///
    /// The subscription is taken before this returns, so events published
    /// afterwards are never missed.
    pub fn register(&self, listener: Arc<dyn EventListener>) -> JoinHandle<()> {
        let rx = self.tx.subscribe();
        tokio::spawn(deliver(rx, listener))
    }
}

async fn deliver(mut rx: broadcast::Receiver<GameEvent>, listener: Arc<dyn EventListener>) {
    loop {
        match rx.recv().await {
            Ok(event) => listener.on_event(event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                log::warn!("Event listener lagged, {} events dropped", n);
            }
            Err(broadcast::error::RecvError::Closed) => {
                log::debug!("Event bus closed; listener exiting");
                break;
            }
        }
    }
}
