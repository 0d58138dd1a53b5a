// Physical keyboard discovery and per-device listener tasks.
use tokio::task::JoinHandle;

use crate::config::HotkeyConfig;
use crate::engine::control::ControlHandle;
use crate::errors::PainterResult;
#[cfg(target_os = "linux")]
use crate::{errors::PainterError, monitor::hotkeys::HotkeyMap};

/// True when a device name matches any ignore pattern, case-insensitively.
/// Keeps the monitor off the virtual devices the pointer driver creates.
pub fn is_ignored(name: &str, ignore: &[String]) -> bool {
    let name = name.to_ascii_lowercase();
    ignore
        .iter()
        .filter(|p| !p.is_empty())
        .any(|p| name.contains(&p.to_ascii_lowercase()))
}

/// Resolves a config key name (`"P"`, `"esc"`, `"F12"`) to an evdev key.
/// `ESCAPE` is accepted for `ESC`.
#[cfg(target_os = "linux")]
pub fn key_for(name: &str) -> PainterResult<evdev::Key> {
    use std::str::FromStr;

    let upper = name.trim().to_ascii_uppercase();
    let upper = match upper.as_str() {
        "ESCAPE" => "ESC".to_string(),
        _ => upper,
    };
    evdev::Key::from_str(&format!("KEY_{upper}"))
        .map_err(|_| PainterError::Config(format!("unknown hotkey name: {name}")))
}

#[cfg(target_os = "linux")]
pub fn resolve_keys(config: &HotkeyConfig) -> PainterResult<HotkeyMap> {
    HotkeyMap::new(key_for(&config.pause)?.code(), key_for(&config.stop)?.code())
}

/// Spawns one listener per matching keyboard. Returns no tasks when nothing
/// usable is found.
#[cfg(target_os = "linux")]
pub fn spawn_listeners(
    config: &HotkeyConfig,
    handle: ControlHandle,
    exit_on_stop: bool,
) -> PainterResult<Vec<JoinHandle<()>>> {
    use crate::monitor::hotkeys::HotkeyAction;
    use evdev::Key;

    let keys = resolve_keys(config)?;
    let mut tasks = Vec::new();
    for (path, device) in evdev::enumerate() {
        let name = device.name().unwrap_or("unknown").to_string();
        if is_ignored(&name, &config.ignore_devices) {
            tracing::debug!(device = %name, "ignoring input device");
            continue;
        }
        let relevant = device.supported_keys().is_some_and(|supported| {
            supported.contains(Key::new(keys.pause)) || supported.contains(Key::new(keys.stop))
        });
        if !relevant {
            continue;
        }

        let mut stream = match device.into_event_stream() {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(device = %name, path = %path.display(), error = %e, "cannot listen to device");
                continue;
            }
        };
        tracing::info!(device = %name, path = %path.display(), "listening for hotkeys");

        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            loop {
                let event = match stream.next_event().await {
                    Ok(ev) => ev,
                    Err(e) => {
                        tracing::warn!(device = %name, error = %e, "device stream closed");
                        break;
                    }
                };
                if event.event_type() != evdev::EventType::KEY {
                    continue;
                }
                let action = keys.apply(event.code(), event.value(), &handle);
                if action == Some(HotkeyAction::EmergencyStop) && exit_on_stop {
                    tracing::warn!("terminating on emergency stop");
                    std::process::exit(0);
                }
            }
        }));
    }
    Ok(tasks)
}

#[cfg(not(target_os = "linux"))]
pub fn spawn_listeners(
    _config: &HotkeyConfig,
    _handle: ControlHandle,
    _exit_on_stop: bool,
) -> PainterResult<Vec<JoinHandle<()>>> {
    tracing::warn!("physical hotkeys are only supported on Linux");
    Ok(Vec::new())
}
