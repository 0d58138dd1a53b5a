//! Command handlers behind the `pixelbrush` binary.
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use tokio::sync::broadcast;

use crate::calibration::extractor::PaletteExtractor;
use crate::calibration::{self, Calibration};
use crate::config::{self, AppConfig, Resample};
use crate::engine::control::control_channel;
use crate::engine::event_bus::{EngineEvent, EventBus};
use crate::engine::journal::{JournalEntry, RunJournal};
use crate::engine::state::{RunMode, RunOutcome, RunReport};
use crate::engine::ExecutionEngine;
use crate::errors::{PainterError, PainterResult};
use crate::executor::input::EnigoSink;
use crate::monitor::ControlMonitor;
use crate::palette::matcher::ColorMatcher;
use crate::perception::screenshot::ScreenSampler;
use crate::planner::plan::{BackgroundSuggestion, DrawPlan, OrderedPlan};
use crate::planner::{preview, raster};

const DEFAULT_GRID: &str = "grid.json";
const DEFAULT_PALETTE: &str = "palette.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SkipBackground {
    /// Prompt once after planning
    #[default]
    Ask,
    Yes,
    No,
}

/// Draw an image onto the calibrated canvas
#[derive(Debug, Clone, Args)]
pub struct DrawArgs {
    /// Source image
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Move and navigate without clicking canvas cells
    #[arg(long)]
    pub dry_run: bool,

    /// Grid calibration file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_GRID)]
    pub grid: PathBuf,

    /// Palette calibration file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_PALETTE)]
    pub palette: PathBuf,

    /// Settings file (defaults to pixelbrush.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Leave the most common colour undrawn
    #[arg(long, value_enum, default_value_t = SkipBackground::Ask)]
    pub skip_background: SkipBackground,
}

impl DrawArgs {
    pub async fn execute(&self) -> PainterResult<()> {
        let config = config::load_config_or_default(self.config.as_deref())?;
        let calibration = calibration::load(&self.grid, &self.palette)?;
        let plan = plan_image(&self.image, &calibration, &config, self.skip_background)?;

        if plan.total_pixels() == 0 {
            tracing::info!("nothing to draw");
            return Ok(());
        }

        let mode = if self.dry_run { RunMode::DryRun } else { RunMode::Draw };
        let journal = config
            .journal
            .enabled
            .then(|| RunJournal::new(config.journal.dir.as_deref()));

        let (handle, watch) = control_channel();
        let monitor = ControlMonitor::spawn(&config.hotkeys, handle, true)?;
        let sink = EnigoSink::new()?;

        let events = EventBus::new();
        let progress = tokio::spawn(log_progress(events.subscribe()));

        let mut engine = ExecutionEngine::new(sink, &calibration, config.timing.clone(), watch, mode)
            .with_events(events);
        tracing::info!(
            delay_ms = config.timing.start_delay_ms,
            "switch to the target window; drawing starts shortly"
        );
        let result = engine.run(&plan).await;
        drop(engine);
        monitor.shutdown();
        let _ = progress.await;

        if let Some(journal) = &journal {
            record_run(journal, &self.image, mode, &plan, &result);
        }

        let report = result?;
        if report.outcome == RunOutcome::Stopped {
            tracing::warn!(drawn = report.stats.pixels_drawn, "run stopped before completion");
        }
        Ok(())
    }
}

/// Image → raster → grouped plan, with the background decision applied.
pub fn plan_image(
    image: &Path,
    calibration: &Calibration,
    config: &AppConfig,
    skip: SkipBackground,
) -> PainterResult<OrderedPlan> {
    let matcher = ColorMatcher::new(&calibration.palette)?;
    let img = raster::load_image(image)?;
    let raster = raster::rasterize(&img, config.planner.resample);
    let mut plan = DrawPlan::build(&raster, &matcher, config.planner.alpha_threshold);

    tracing::info!(
        groups = plan.groups().len(),
        pixels = plan.total_pixels(),
        "plan built"
    );
    for group in plan.groups() {
        tracing::debug!(
            colour = %group.entry.describe(),
            pixels = group.pixels.len(),
            "colour group"
        );
    }

    plan.decide_background(|suggestion| match skip {
        SkipBackground::Yes => true,
        SkipBackground::No => false,
        SkipBackground::Ask => ask_skip(suggestion),
    });
    Ok(plan.finalize())
}

fn ask_skip(suggestion: &BackgroundSuggestion) -> bool {
    print!(
        "Most common colour is {} ({} pixels, {:.1}%). Skip it as background? [Y/n] ",
        suggestion.rgb, suggestion.count, suggestion.percentage
    );
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => parse_answer(None),
        Ok(_) => parse_answer(Some(&line)),
    }
}

/// End of input means yes; only an explicit no keeps the background.
pub fn parse_answer(line: Option<&str>) -> bool {
    match line.map(|l| l.trim().to_ascii_lowercase()) {
        Some(answer) => !matches!(answer.as_str(), "n" | "no"),
        None => true,
    }
}

async fn log_progress(mut rx: broadcast::Receiver<EngineEvent>) {
    let mut last_decile = 0;
    loop {
        let event = match rx.recv().await {
            Ok(ev) => ev,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::debug!(skipped = n, "progress logger lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };
        match event {
            EngineEvent::GroupStarted { index, rgb, pixels } => {
                tracing::info!(group = index + 1, colour = %rgb, pixels, "drawing colour");
            }
            EngineEvent::PixelDrawn { done, total } if total > 0 => {
                let decile = done * 10 / total;
                if decile > last_decile {
                    last_decile = decile;
                    tracing::info!(done, total, "{}% drawn", decile * 10);
                }
            }
            EngineEvent::Paused => tracing::info!("paused; press the pause key to resume"),
            EngineEvent::Resumed => tracing::info!("resumed"),
            EngineEvent::Finished { .. } => break,
            _ => {}
        }
    }
}

fn record_run(
    journal: &RunJournal,
    image: &Path,
    mode: RunMode,
    plan: &OrderedPlan,
    result: &PainterResult<RunReport>,
) {
    let (outcome, stats, error) = match result {
        Ok(report) => (Some(report.outcome), report.stats.clone(), None),
        Err(e) => (None, Default::default(), Some(e.to_string())),
    };
    let entry = JournalEntry {
        session_id: journal.session_id.clone(),
        started_at: journal.started_at(),
        finished_at: chrono::Utc::now(),
        image: image.display().to_string(),
        dry_run: mode == RunMode::DryRun,
        skipped_background: plan.skipped.as_ref().map(|s| [s.rgb.0, s.rgb.1, s.rgb.2]),
        outcome,
        stats,
        error,
    };
    if let Err(e) = journal.append(&entry) {
        tracing::warn!(error = %e, path = %journal.path().display(), "could not write run journal");
    }
}

/// Re-sample palette colours from the screen
#[derive(Debug, Clone, Args)]
pub struct ExtractArgs {
    /// Grid calibration file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_GRID)]
    pub grid: PathBuf,

    /// Palette calibration file, updated in place
    #[arg(long, value_name = "FILE", default_value = DEFAULT_PALETTE)]
    pub palette: PathBuf,

    /// Settings file (defaults to pixelbrush.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl ExtractArgs {
    pub async fn execute(&self) -> PainterResult<()> {
        let config = config::load_config_or_default(self.config.as_deref())?;
        let grid = calibration::load_grid(&self.grid)?;
        let mut palette = calibration::load_palette(&self.palette)?;
        let calibration = Calibration::from_records(&grid, &palette)?;

        let (handle, watch) = control_channel();
        let monitor = ControlMonitor::spawn(&config.hotkeys, handle, true)?;
        let sink = EnigoSink::new()?;

        let mut extractor = PaletteExtractor::new(
            sink,
            ScreenSampler::new(),
            calibration.resolution,
            calibration.layout.clone(),
            config.extract.apply_to(&config.timing),
            config.extract.hover(),
            watch,
        );
        let result = extractor.extract(&calibration.palette, &mut palette).await;
        drop(extractor);
        monitor.shutdown();

        match result {
            Ok(report) => {
                calibration::save_palette(&self.palette, &palette)?;
                tracing::info!(
                    sampled = report.sampled,
                    degraded = report.degraded,
                    "palette extraction finished"
                );
                Ok(())
            }
            Err(PainterError::Cancelled) => {
                tracing::warn!("extraction stopped; palette left unchanged");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Render the palette-quantised canvas without touching any device
#[derive(Debug, Clone, Args)]
pub struct PreviewArgs {
    /// Source image
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Quantised 150x150 output
    #[arg(value_name = "OUTPUT", default_value = "pixelart_output.png")]
    pub output: PathBuf,

    /// Palette calibration file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_PALETTE)]
    pub palette: PathBuf,

    /// Settings file (defaults to pixelbrush.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl PreviewArgs {
    pub fn execute(&self) -> PainterResult<PathBuf> {
        let config = config::load_config_or_default(self.config.as_deref())?;
        let palette = calibration::load_palette(&self.palette)?;
        let (_, entries) = calibration::parse_palette(&palette)?;
        let matcher = ColorMatcher::new(&entries)?;

        let img = raster::load_image(&self.image)?;
        let raster = raster::rasterize(&img, Resample::Lanczos);
        let quantized = preview::quantize(&raster, &matcher, config.planner.alpha_threshold);
        preview::write_preview(&quantized, &self.output)
    }
}

/// Write the default settings file
#[derive(Debug, Clone, Args)]
pub struct InitConfigArgs {
    /// Destination
    #[arg(value_name = "FILE", default_value = "pixelbrush.toml")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl InitConfigArgs {
    pub fn execute(&self) -> PainterResult<()> {
        if self.path.exists() && !self.force {
            return Err(PainterError::Config(format!(
                "{} already exists (use --force to overwrite)",
                self.path.display()
            )));
        }
        config::save_config(&self.path, &AppConfig::default())
    }
}
