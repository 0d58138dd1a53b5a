//! Palette colour extractor.
//!
//! Walks the picker in palette order and re-samples every entry's colour
//! from the screen at its recorded location. Main colours are clicked and
//! sampled in place; sub colours are hovered in their open submenu, never
//! clicked. Failed samples degrade to black and are counted.
use std::time::Duration;

use crate::calibration::types::PaletteFile;
use crate::config::TimingConfig;
use crate::engine::control::{ControlWatch, Gate};
use crate::errors::{PainterError, PainterResult};
use crate::executor::input::{InputSink, Pointer};
use crate::palette::navigator::{NavAction, NavTarget, Navigator, PickerLayout};
use crate::palette::types::{EntryKind, PaletteEntry, Rgb};
use crate::perception::sampling::DegradingSampler;
use crate::perception::traits::PixelSampler;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub sampled: usize,
    pub degraded: usize,
}

pub struct PaletteExtractor<S, P> {
    pointer: Pointer<S>,
    navigator: Navigator,
    sampler: DegradingSampler<P>,
    timing: TimingConfig,
    hover: Duration,
    control: ControlWatch,
}

impl<S: InputSink, P: PixelSampler> PaletteExtractor<S, P> {
    pub fn new(
        sink: S,
        sampler: P,
        resolution: (u32, u32),
        layout: PickerLayout,
        timing: TimingConfig,
        hover: Duration,
        control: ControlWatch,
    ) -> Self {
        Self {
            pointer: Pointer::new(sink, resolution, &timing),
            navigator: Navigator::new(layout),
            sampler: DegradingSampler::new(sampler),
            timing,
            hover,
            control,
        }
    }

    /// Samples every entry and writes the colours into `file.colors`, which
    /// must list the same entries in the same order.
    pub async fn extract(
        &mut self,
        entries: &[PaletteEntry],
        file: &mut PaletteFile,
    ) -> PainterResult<ExtractReport> {
        if entries.len() != file.colors.len() {
            return Err(PainterError::Calibration(format!(
                "{} parsed colours but {} records",
                entries.len(),
                file.colors.len()
            )));
        }
        self.navigator.check_reachable(entries)?;

        tracing::info!(colours = entries.len(), "extracting palette colours");
        if !self.timing.start_delay().is_zero() {
            tokio::time::sleep(self.timing.start_delay()).await;
        }

        let mut report = ExtractReport::default();
        for (i, entry) in entries.iter().enumerate() {
            let rgb = self.sample_entry(entry).await?;
            let record = &mut file.colors[i];
            record.rgb = match record.rgb.get(3) {
                Some(&alpha) => vec![rgb.0, rgb.1, rgb.2, alpha],
                None => vec![rgb.0, rgb.1, rgb.2],
            };
            report.sampled += 1;
            tracing::info!(
                index = i + 1,
                of = entries.len(),
                kind = %entry.describe(),
                rgb = %rgb,
                "colour sampled"
            );
        }

        if let Some(back) = self.navigator.finish() {
            self.perform(back).await?;
        }

        report.degraded = self.sampler.degraded();
        if report.degraded > 0 {
            tracing::warn!(degraded = report.degraded, "some samples failed and were recorded as black");
        }
        Ok(report)
    }

    async fn sample_entry(&mut self, entry: &PaletteEntry) -> PainterResult<Rgb> {
        match entry.kind {
            EntryKind::Main => {
                for action in self.navigator.select(entry)? {
                    self.perform(action).await?;
                }
                Ok(self.sampler.sample(entry.loc).await)
            }
            EntryKind::Sub { slot } => {
                for action in self.navigator.open_submenu_of(entry.loc) {
                    self.perform(action).await?;
                }
                let at = self.navigator.slot_point(slot)?;
                self.pointer.move_to(at).await?;
                self.gate().await?;
                tokio::time::sleep(self.hover).await;
                Ok(self.sampler.sample(at).await)
            }
        }
    }

    async fn perform(&mut self, action: NavAction) -> PainterResult<()> {
        tracing::debug!(action = ?action.target, x = action.point.x, y = action.point.y, "ui action");
        self.pointer.move_to(action.point).await?;
        self.gate().await?;
        self.pointer.click().await?;
        let ms = match action.target {
            NavTarget::Main => self.timing.after_main_ms,
            NavTarget::PaletteIcon => self.timing.after_palette_icon_ms,
            NavTarget::SubSlot(_) => self.timing.after_slot_ms,
            NavTarget::Back => self.timing.after_back_ms,
        };
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(())
    }

    /// A stop abandons extraction without saving anything.
    async fn gate(&mut self) -> PainterResult<()> {
        match self.control.checkpoint().await {
            Gate::Proceed => Ok(()),
            Gate::Resumed => {
                if let Some(target) = self.pointer.last_target() {
                    self.pointer.move_to(target).await?;
                    tokio::time::sleep(self.timing.resume_settle()).await;
                }
                Ok(())
            }
            Gate::Stop => Err(PainterError::Cancelled),
        }
    }

    pub fn into_sink(self) -> S {
        self.pointer.into_sink()
    }
}
