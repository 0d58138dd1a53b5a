//! Control monitor: turns physical hotkeys into pause/stop flag changes.
//!
//! Runs alongside the engine for its whole lifetime. It owns the writer side
//! of the control channel and never waits on the engine.
pub mod device;
pub mod hotkeys;

use tokio::task::JoinHandle;

use crate::config::HotkeyConfig;
use crate::engine::control::ControlHandle;
use crate::errors::PainterResult;

pub use hotkeys::{HotkeyAction, HotkeyMap};

pub struct ControlMonitor {
    tasks: Vec<JoinHandle<()>>,
}

impl ControlMonitor {
    /// Starts one listener per usable keyboard. With `exit_on_stop` the stop
    /// key terminates the process with status 0 right after clearing
    /// `running`. Finding no keyboard is not an error.
    pub fn spawn(
        config: &HotkeyConfig,
        handle: ControlHandle,
        exit_on_stop: bool,
    ) -> PainterResult<Self> {
        let tasks = device::spawn_listeners(config, handle, exit_on_stop)?;
        if tasks.is_empty() {
            tracing::warn!("no keyboard found for hotkeys; pause and stop are unavailable");
        } else {
            tracing::info!(
                devices = tasks.len(),
                pause = %config.pause,
                stop = %config.stop,
                "control monitor running"
            );
        }
        Ok(Self { tasks })
    }

    pub fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}
