//! Pause/stop flags shared between the control monitor and the engine.
//!
//! The monitor owns the only [`ControlHandle`]; the engine only ever holds a
//! [`ControlWatch`]. Reads never block. Waiting while paused parks on the
//! channel instead of polling.
use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlFlags {
    pub paused: bool,
    pub running: bool,
}

impl Default for ControlFlags {
    fn default() -> Self {
        Self {
            paused: false,
            running: true,
        }
    }
}

/// Creates the flag cell for one engine lifetime.
pub fn control_channel() -> (ControlHandle, ControlWatch) {
    let (tx, rx) = watch::channel(ControlFlags::default());
    (ControlHandle { tx: Arc::new(tx) }, ControlWatch { rx })
}

/// Writer side.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: Arc<watch::Sender<ControlFlags>>,
}

impl ControlHandle {
    /// Flips `paused` and returns the new value.
    pub fn toggle_pause(&self) -> bool {
        let mut now = false;
        self.tx.send_modify(|f| {
            f.paused = !f.paused;
            now = f.paused;
        });
        now
    }

    pub fn set_paused(&self, paused: bool) {
        self.tx.send_modify(|f| f.paused = paused);
    }

    pub fn stop(&self) {
        self.tx.send_modify(|f| f.running = false);
    }

    pub fn flags(&self) -> ControlFlags {
        *self.tx.borrow()
    }
}

/// Reader side.
#[derive(Debug, Clone)]
pub struct ControlWatch {
    rx: watch::Receiver<ControlFlags>,
}

/// What the engine should do at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Proceed,
    /// Was paused; the caller should re-aim before continuing.
    Resumed,
    Stop,
}

impl ControlWatch {
    pub fn flags(&self) -> ControlFlags {
        *self.rx.borrow()
    }

    /// Returns immediately unless paused; while paused, waits for resume or stop.
    pub async fn checkpoint(&mut self) -> Gate {
        let mut waited = false;
        loop {
            let flags = *self.rx.borrow_and_update();
            if !flags.running {
                return Gate::Stop;
            }
            if !flags.paused {
                return if waited { Gate::Resumed } else { Gate::Proceed };
            }
            if !waited {
                tracing::info!("paused");
                waited = true;
            }
            if self.rx.changed().await.is_err() {
                // writer gone while paused: nobody can ever resume us
                tracing::warn!("control handle dropped while paused; stopping");
                return Gate::Stop;
            }
        }
    }
}
