use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{PainterError, PainterResult};

const CONFIG_FILE_NAME: &str = "pixelbrush.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub extract: ExtractTimingConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub hotkeys: HotkeyConfig,
    #[serde(default)]
    pub journal: JournalConfig,
}

/// Settle delays used while drawing. Tuned for the target UI's latency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause after each press and each release of a click.
    pub click_phase_ms: u64,
    pub move_settle_ms: u64,
    pub after_main_ms: u64,
    /// Submenu opening animation.
    pub after_palette_icon_ms: u64,
    pub after_slot_ms: u64,
    pub after_back_ms: u64,
    /// Re-settle after the pointer is re-positioned on resume.
    pub resume_settle_ms: u64,
    /// Grace period to switch to the target window before the first action.
    pub start_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            click_phase_ms: 50,
            move_settle_ms: 0,
            after_main_ms: 200,
            after_palette_icon_ms: 600,
            after_slot_ms: 200,
            after_back_ms: 400,
            resume_settle_ms: 100,
            start_delay_ms: 3000,
        }
    }
}

impl TimingConfig {
    /// All delays zeroed; used by tests and simulations.
    pub fn instant() -> Self {
        Self {
            click_phase_ms: 0,
            move_settle_ms: 0,
            after_main_ms: 0,
            after_palette_icon_ms: 0,
            after_slot_ms: 0,
            after_back_ms: 0,
            resume_settle_ms: 0,
            start_delay_ms: 0,
        }
    }

    pub fn click_phase(&self) -> Duration {
        Duration::from_millis(self.click_phase_ms)
    }

    pub fn move_settle(&self) -> Duration {
        Duration::from_millis(self.move_settle_ms)
    }

    pub fn resume_settle(&self) -> Duration {
        Duration::from_millis(self.resume_settle_ms)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }
}

/// The extractor waits longer than drawing does: it samples the screen right
/// after each transition and needs the animation fully finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractTimingConfig {
    pub after_main_ms: u64,
    pub after_palette_icon_ms: u64,
    pub after_back_ms: u64,
    pub hover_ms: u64,
}

impl Default for ExtractTimingConfig {
    fn default() -> Self {
        Self {
            after_main_ms: 200,
            after_palette_icon_ms: 1200,
            after_back_ms: 800,
            hover_ms: 100,
        }
    }
}

impl ExtractTimingConfig {
    /// Overlays the extractor's delays onto the drawing timings.
    pub fn apply_to(&self, base: &TimingConfig) -> TimingConfig {
        TimingConfig {
            after_main_ms: self.after_main_ms,
            after_palette_icon_ms: self.after_palette_icon_ms,
            after_back_ms: self.after_back_ms,
            ..base.clone()
        }
    }

    pub fn hover(&self) -> Duration {
        Duration::from_millis(self.hover_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Resample {
    /// Fast, keeps hard pixel-art edges.
    #[default]
    Nearest,
    /// Higher fidelity for photographs.
    Lanczos,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Source pixels with alpha below this are transparent and never drawn.
    pub alpha_threshold: u8,
    pub resample: Resample,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            alpha_threshold: 128,
            resample: Resample::Nearest,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    pub pause: String,
    pub stop: String,
    /// Input devices whose name contains any of these are never listened to.
    pub ignore_devices: Vec<String>,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            pause: "P".into(),
            stop: "ESC".into(),
            ignore_devices: vec!["pixelbrush".into(), "enigo".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

fn resolve_config_path() -> PainterResult<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join(CONFIG_FILE_NAME);
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    Err(PainterError::Config(format!(
        "{CONFIG_FILE_NAME} not found next to executable or in working directory"
    )))
}

/// Loads the config from `explicit`, or from the default search locations.
pub fn load_config(explicit: Option<&Path>) -> PainterResult<AppConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => resolve_config_path()?,
    };
    let content = std::fs::read_to_string(&path)?;
    let config: AppConfig = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Like [`load_config`], but a missing or broken default config is not fatal.
/// An explicitly requested file must load.
pub fn load_config_or_default(explicit: Option<&Path>) -> PainterResult<AppConfig> {
    match load_config(explicit) {
        Ok(cfg) => Ok(cfg),
        Err(e) if explicit.is_none() => {
            tracing::warn!(error = %e, "using default configuration");
            Ok(AppConfig::default())
        }
        Err(e) => Err(e),
    }
}

pub fn save_config(path: &Path, config: &AppConfig) -> PainterResult<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [timing]
            after_back_ms = 900

            [planner]
            resample = "lanczos"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.timing.after_back_ms, 900);
        assert_eq!(cfg.timing.click_phase_ms, 50);
        assert_eq!(cfg.planner.resample, Resample::Lanczos);
        assert_eq!(cfg.planner.alpha_threshold, 128);
        assert_eq!(cfg.hotkeys.pause, "P");
    }

    #[test]
    fn extract_timing_overrides_navigation_delays_only() {
        let base = TimingConfig::default();
        let merged = ExtractTimingConfig::default().apply_to(&base);
        assert_eq!(merged.after_palette_icon_ms, 1200);
        assert_eq!(merged.after_back_ms, 800);
        assert_eq!(merged.click_phase_ms, base.click_phase_ms);
    }

    #[test]
    fn save_then_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut cfg = AppConfig::default();
        cfg.hotkeys.stop = "F12".into();
        save_config(&path, &cfg).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.hotkeys.stop, "F12");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config_or_default(Some(&missing)).is_err());
    }
}
