use crate::engine::control::ControlHandle;
use crate::errors::{PainterError, PainterResult};

/// Linux input-event value for a key going down. Repeats (2) and releases
/// (0) never trigger anything.
pub const KEY_DOWN: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    TogglePause,
    EmergencyStop,
}

/// Resolved key codes for the two hotkeys. Codes come from the platform's
/// input layer; this type only compares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyMap {
    pub pause: u16,
    pub stop: u16,
}

impl HotkeyMap {
    pub fn new(pause: u16, stop: u16) -> PainterResult<Self> {
        if pause == stop {
            return Err(PainterError::Config(format!(
                "pause and stop hotkeys share key code {pause}"
            )));
        }
        Ok(Self { pause, stop })
    }

    pub fn action_for(&self, code: u16, value: i32) -> Option<HotkeyAction> {
        if value != KEY_DOWN {
            return None;
        }
        if code == self.pause {
            Some(HotkeyAction::TogglePause)
        } else if code == self.stop {
            Some(HotkeyAction::EmergencyStop)
        } else {
            None
        }
    }

    /// Applies one key event to the control flags.
    pub fn apply(&self, code: u16, value: i32, handle: &ControlHandle) -> Option<HotkeyAction> {
        let action = self.action_for(code, value)?;
        match action {
            HotkeyAction::TogglePause => {
                let paused = handle.toggle_pause();
                tracing::info!(paused, "pause toggled");
            }
            HotkeyAction::EmergencyStop => {
                handle.stop();
                tracing::warn!("emergency stop");
            }
        }
        Some(action)
    }
}
