use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::palette::types::Rgb;

/// Progress notifications published while a plan runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    RunStarted {
        groups: usize,
        pixels: usize,
        dry_run: bool,
    },
    GroupStarted {
        index: usize,
        rgb: Rgb,
        pixels: usize,
    },
    PixelDrawn {
        done: usize,
        total: usize,
    },
    Paused,
    Resumed,
    Finished {
        outcome: super::state::RunOutcome,
        pixels_drawn: usize,
    },
}

/// Fan-out of [`EngineEvent`]s. Publishing never blocks and never fails the
/// run: with no subscriber, or a lagging one, events are simply dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
