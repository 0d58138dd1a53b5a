use std::time::Duration;

use crate::calibration::Calibration;
use crate::config::TimingConfig;
use crate::engine::control::{ControlWatch, Gate};
use crate::engine::event_bus::{EngineEvent, EventBus};
use crate::engine::state::{RunMode, RunOutcome, RunReport, RunStats};
use crate::errors::PainterResult;
use crate::executor::coordinator::CoordinateMapper;
use crate::executor::input::{InputSink, Pointer};
use crate::palette::navigator::{NavAction, NavTarget, Navigator};
use crate::planner::plan::OrderedPlan;

/// Drains an ordered plan into pointer actions, one at a time.
///
/// Pause and stop are checked between the move and the click of every UI
/// action and every pixel. Device errors abort the run as-is: nothing is
/// retried and nothing is rolled back.
pub struct ExecutionEngine<S> {
    pointer: Pointer<S>,
    navigator: Navigator,
    mapper: CoordinateMapper,
    timing: TimingConfig,
    control: ControlWatch,
    events: EventBus,
    mode: RunMode,
    stats: RunStats,
}

impl<S: InputSink> ExecutionEngine<S> {
    pub fn new(
        sink: S,
        calibration: &Calibration,
        timing: TimingConfig,
        control: ControlWatch,
        mode: RunMode,
    ) -> Self {
        Self {
            pointer: Pointer::new(sink, calibration.resolution, &timing),
            navigator: Navigator::new(calibration.layout.clone()),
            mapper: calibration.mapper,
            timing,
            control,
            events: EventBus::new(),
            mode,
            stats: RunStats::default(),
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn into_sink(self) -> S {
        self.pointer.into_sink()
    }

    pub async fn run(&mut self, plan: &OrderedPlan) -> PainterResult<RunReport> {
        self.validate(plan)?;

        let total = plan.total_pixels();
        self.stats = RunStats {
            groups: plan.groups.len(),
            pixels_planned: total,
            ..RunStats::default()
        };
        self.events.publish(EngineEvent::RunStarted {
            groups: plan.groups.len(),
            pixels: total,
            dry_run: self.mode == RunMode::DryRun,
        });
        tracing::info!(
            groups = plan.groups.len(),
            pixels = total,
            mode = ?self.mode,
            "starting run"
        );

        if !self.timing.start_delay().is_zero() {
            tokio::time::sleep(self.timing.start_delay()).await;
        }

        let outcome = self.drain(plan).await?;
        self.events.publish(EngineEvent::Finished {
            outcome,
            pixels_drawn: self.stats.pixels_drawn,
        });
        tracing::info!(
            outcome = ?outcome,
            drawn = self.stats.pixels_drawn,
            nav_clicks = self.stats.nav_clicks,
            "run finished"
        );
        Ok(RunReport {
            outcome,
            stats: self.stats.clone(),
        })
    }

    /// Everything that can be wrong with the plan fails here, before any action.
    fn validate(&self, plan: &OrderedPlan) -> PainterResult<()> {
        self.navigator.check_reachable(plan.entries())?;
        for group in &plan.groups {
            for px in &group.pixels {
                self.mapper.cell_center(px.col, px.row)?;
            }
        }
        Ok(())
    }

    async fn drain(&mut self, plan: &OrderedPlan) -> PainterResult<RunOutcome> {
        let total = plan.total_pixels();

        for (index, group) in plan.groups.iter().enumerate() {
            if !self.gate().await? {
                return Ok(RunOutcome::Stopped);
            }
            self.events.publish(EngineEvent::GroupStarted {
                index,
                rgb: group.entry.rgb,
                pixels: group.pixels.len(),
            });
            tracing::info!(
                index,
                rgb = %group.entry.rgb,
                kind = %group.entry.describe(),
                pixels = group.pixels.len(),
                "drawing colour group"
            );

            for action in self.navigator.select(&group.entry)? {
                if !self.perform(action).await? {
                    return Ok(RunOutcome::Stopped);
                }
            }

            for px in &group.pixels {
                let target = self.mapper.cell_to_physical(px.col, px.row)?;
                self.pointer.move_to(target).await?;
                if !self.gate().await? {
                    return Ok(RunOutcome::Stopped);
                }
                if self.mode == RunMode::Draw {
                    self.pointer.click().await?;
                }
                self.stats.pixels_drawn += 1;
                self.events.publish(EngineEvent::PixelDrawn {
                    done: self.stats.pixels_drawn,
                    total,
                });
            }
        }

        if let Some(back) = self.navigator.finish() {
            if !self.perform(back).await? {
                return Ok(RunOutcome::Stopped);
            }
        }
        Ok(RunOutcome::Completed)
    }

    /// Move, checkpoint, click, settle. Returns false when stopped.
    async fn perform(&mut self, action: NavAction) -> PainterResult<bool> {
        tracing::debug!(
            action = ?action.target,
            x = action.point.x,
            y = action.point.y,
            "ui action"
        );
        self.pointer.move_to(action.point).await?;
        if !self.gate().await? {
            return Ok(false);
        }
        self.pointer.click().await?;
        self.stats.nav_clicks += 1;
        tokio::time::sleep(self.settle_after(action.target)).await;
        Ok(true)
    }

    fn settle_after(&self, target: NavTarget) -> Duration {
        let ms = match target {
            NavTarget::Main => self.timing.after_main_ms,
            NavTarget::PaletteIcon => self.timing.after_palette_icon_ms,
            NavTarget::SubSlot(_) => self.timing.after_slot_ms,
            NavTarget::Back => self.timing.after_back_ms,
        };
        Duration::from_millis(ms)
    }

    /// Blocks while paused. On resume the pointer is put back on its last
    /// target, since it may have been moved by hand in the meantime.
    async fn gate(&mut self) -> PainterResult<bool> {
        if self.control.flags().paused {
            self.events.publish(EngineEvent::Paused);
        }
        match self.control.checkpoint().await {
            Gate::Proceed => Ok(true),
            Gate::Resumed => {
                self.stats.pauses += 1;
                self.events.publish(EngineEvent::Resumed);
                tracing::info!("resumed");
                if let Some(target) = self.pointer.last_target() {
                    self.pointer.move_to(target).await?;
                    tokio::time::sleep(self.timing.resume_settle()).await;
                }
                Ok(true)
            }
            Gate::Stop => {
                tracing::warn!("stop requested; abandoning run");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::control::{control_channel, ControlHandle};
    use crate::errors::PainterError;
    use crate::executor::coordinator::{GridRect, GRID_CELLS};
    use crate::executor::input::{PointerButton, RecordingSink};
    use crate::palette::navigator::{MenuState, PickerLayout};
    use crate::palette::types::{PaletteEntry, Rgb, ScreenPoint};
    use crate::palette::ColorMatcher;
    use crate::planner::plan::DrawPlan;
    use image::{Rgba, RgbaImage};

    const RED: ScreenPoint = ScreenPoint::new(10, 10);
    const BLUE: ScreenPoint = ScreenPoint::new(20, 30);
    const ICON: ScreenPoint = ScreenPoint::new(500, 40);
    const BACK: ScreenPoint = ScreenPoint::new(600, 40);

    fn calibration() -> Calibration {
        let palette = vec![
            PaletteEntry::main(Rgb(255, 0, 0), RED),
            PaletteEntry::sub(Rgb(128, 0, 0), RED, 1),
            PaletteEntry::main(Rgb(0, 0, 255), BLUE),
        ];
        Calibration {
            resolution: (1920, 1080),
            mapper: CoordinateMapper::new(
                GridRect { x1: 100.0, y1: 100.0, x2: 850.0, y2: 850.0 },
                GRID_CELLS,
                GRID_CELLS,
            )
            .unwrap(),
            layout: PickerLayout {
                palette_icon: ICON,
                back: BACK,
                sub_slots: (0..9).map(|i| ScreenPoint::new(300 + i * 10, 200)).collect(),
            },
            palette,
        }
    }

    fn plan(cal: &Calibration) -> OrderedPlan {
        let mut raster = RgbaImage::from_pixel(3, 2, Rgba([250, 0, 0, 255]));
        raster.put_pixel(1, 0, Rgba([0, 0, 250, 255]));
        raster.put_pixel(2, 1, Rgba([130, 0, 0, 255]));
        let matcher = ColorMatcher::new(&cal.palette).unwrap();
        DrawPlan::build(&raster, &matcher, 128).finalize()
    }

    fn cell(col: i32, row: i32) -> ScreenPoint {
        // 5 px cells starting at 100; centre rounds 102.5 → 103
        ScreenPoint::new(103 + col * 5, 103 + row * 5)
    }

    async fn run_with(
        mode: RunMode,
        sink: &mut impl InputSink,
        control: crate::engine::control::ControlWatch,
    ) -> RunReport {
        let cal = calibration();
        let plan = plan(&cal);
        let mut engine = ExecutionEngine::new(sink, &cal, TimingConfig::instant(), control, mode);
        engine.run(&plan).await.unwrap()
    }

    #[tokio::test]
    async fn draws_groups_in_order_with_navigation() {
        let (_handle, watch) = control_channel();
        let mut sink = RecordingSink::new();
        let report = run_with(RunMode::Draw, &mut sink, watch).await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.stats.pixels_planned, 6);
        assert_eq!(report.stats.pixels_drawn, 6);
        assert_eq!(
            sink.clicks(),
            vec![
                RED,
                cell(0, 0),
                cell(2, 0),
                cell(0, 1),
                cell(1, 1),
                ICON,
                ScreenPoint::new(310, 200),
                cell(2, 1),
                BACK,
                BLUE,
                cell(1, 0),
            ]
        );
        assert_eq!(report.stats.nav_clicks, 5);
    }

    #[tokio::test]
    async fn dry_run_moves_everywhere_but_only_clicks_navigation() {
        let (_handle, watch) = control_channel();
        let mut sink = RecordingSink::new();
        let report = run_with(RunMode::DryRun, &mut sink, watch).await;

        assert_eq!(report.stats.pixels_drawn, 6);
        assert_eq!(
            sink.clicks(),
            vec![RED, ICON, ScreenPoint::new(310, 200), BACK, BLUE]
        );
        assert!(sink.moves().contains(&cell(1, 1)));
    }

    #[tokio::test]
    async fn stopped_before_start_emits_nothing() {
        let (handle, watch) = control_channel();
        handle.stop();
        let mut sink = RecordingSink::new();
        let report = run_with(RunMode::Draw, &mut sink, watch).await;

        assert_eq!(report.outcome, RunOutcome::Stopped);
        assert!(sink.events.is_empty());
    }

    /// Pauses on the n-th press and stops on the m-th, through the writer handle.
    struct Scripted {
        inner: RecordingSink,
        handle: ControlHandle,
        presses: usize,
        pause_at: Option<usize>,
        stop_at: Option<usize>,
    }

    impl InputSink for Scripted {
        fn move_absolute(&mut self, x: i32, y: i32) -> PainterResult<()> {
            self.inner.move_absolute(x, y)
        }

        fn set_button(&mut self, button: PointerButton, down: bool) -> PainterResult<()> {
            if down {
                self.presses += 1;
                if self.pause_at == Some(self.presses) {
                    self.handle.set_paused(true);
                }
                if self.stop_at == Some(self.presses) {
                    self.handle.stop();
                }
            }
            self.inner.set_button(button, down)
        }

        fn commit(&mut self) -> PainterResult<()> {
            self.inner.commit()
        }
    }

    #[tokio::test]
    async fn pause_and_resume_preserves_click_sequence() {
        let (_h, watch) = control_channel();
        let mut baseline = RecordingSink::new();
        run_with(RunMode::Draw, &mut baseline, watch).await;

        let (handle, watch) = control_channel();
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let resumer = handle.clone();
        let resume = tokio::spawn(async move {
            // resume only once the engine has actually parked
            while let Ok(ev) = rx.recv().await {
                if ev == EngineEvent::Paused {
                    resumer.set_paused(false);
                    break;
                }
            }
        });

        let mut sink = Scripted {
            inner: RecordingSink::new(),
            handle,
            presses: 0,
            // first press of the third logical click
            pause_at: Some(5),
            stop_at: None,
        };
        let cal = calibration();
        let plan = plan(&cal);
        let mut engine =
            ExecutionEngine::new(&mut sink, &cal, TimingConfig::instant(), watch, RunMode::Draw)
                .with_events(bus);
        let report = engine.run(&plan).await.unwrap();
        drop(engine);
        resume.await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.stats.pauses, 1);
        assert_eq!(sink.inner.clicks(), baseline.clicks());
        // the resume re-aims at the pending target before clicking it
        assert_eq!(sink.inner.moves().len(), baseline.moves().len() + 1);
    }

    #[tokio::test]
    async fn stop_mid_run_abandons_remaining_pixels() {
        let (handle, watch) = control_channel();
        let mut sink = Scripted {
            inner: RecordingSink::new(),
            handle,
            presses: 0,
            pause_at: None,
            stop_at: Some(3),
        };
        let report = run_with(RunMode::Draw, &mut sink, watch).await;

        assert_eq!(report.outcome, RunOutcome::Stopped);
        // red main + first cell were clicked, nothing after
        assert_eq!(sink.inner.clicks(), vec![RED, cell(0, 0)]);
        assert_eq!(report.stats.pixels_drawn, 1);
    }

    /// Red main then its slot-1 sub: the run ends inside the submenu.
    fn submenu_last_plan(cal: &Calibration) -> OrderedPlan {
        let mut raster = RgbaImage::from_pixel(2, 1, Rgba([250, 0, 0, 255]));
        raster.put_pixel(1, 0, Rgba([130, 0, 0, 255]));
        let matcher = ColorMatcher::new(&cal.palette).unwrap();
        DrawPlan::build(&raster, &matcher, 128).finalize()
    }

    #[tokio::test]
    async fn run_ending_in_submenu_closes_it() {
        let cal = calibration();
        let plan = submenu_last_plan(&cal);
        let (_handle, watch) = control_channel();
        let mut sink = RecordingSink::new();
        let mut engine =
            ExecutionEngine::new(&mut sink, &cal, TimingConfig::instant(), watch, RunMode::Draw);
        let report = engine.run(&plan).await.unwrap();
        assert_eq!(engine.navigator().state(), MenuState::Root);
        drop(engine);

        assert_eq!(report.stats.nav_clicks, 3);
        assert_eq!(
            sink.clicks(),
            vec![RED, cell(0, 0), ICON, ScreenPoint::new(310, 200), cell(1, 0), BACK]
        );
    }

    #[tokio::test]
    async fn paused_before_first_action_keeps_sequence() {
        let cal = calibration();
        let plan = submenu_last_plan(&cal);

        let (handle, watch) = control_channel();
        handle.set_paused(true);
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let resume = tokio::spawn(async move {
            while let Ok(ev) = rx.recv().await {
                if ev == EngineEvent::Paused {
                    handle.set_paused(false);
                    break;
                }
            }
        });

        let mut sink = RecordingSink::new();
        let mut engine =
            ExecutionEngine::new(&mut sink, &cal, TimingConfig::instant(), watch, RunMode::Draw)
                .with_events(bus);
        let report = engine.run(&plan).await.unwrap();
        drop(engine);
        resume.await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.stats.pauses, 1);
        assert_eq!(
            sink.clicks(),
            vec![RED, cell(0, 0), ICON, ScreenPoint::new(310, 200), cell(1, 0), BACK]
        );
    }

    #[tokio::test]
    async fn out_of_grid_pixel_fails_before_any_action() {
        let cal = calibration();
        let mut plan = plan(&cal);
        plan.groups[0].pixels[0].col = 150;

        let (_handle, watch) = control_channel();
        let mut sink = RecordingSink::new();
        let mut engine =
            ExecutionEngine::new(&mut sink, &cal, TimingConfig::instant(), watch, RunMode::Draw);
        let err = engine.run(&plan).await.unwrap_err();
        assert!(matches!(err, PainterError::OutOfGrid { .. }));
        drop(engine);
        assert!(sink.events.is_empty());
    }

    #[tokio::test]
    async fn progress_events_are_published() {
        let cal = calibration();
        let plan = plan(&cal);
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let (_handle, watch) = control_channel();
        let mut engine =
            ExecutionEngine::new(RecordingSink::new(), &cal, TimingConfig::instant(), watch, RunMode::Draw)
                .with_events(bus);
        engine.run(&plan).await.unwrap();

        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        assert!(matches!(events.first(), Some(EngineEvent::RunStarted { groups: 3, pixels: 6, .. })));
        assert_eq!(
            events.iter().filter(|e| matches!(e, EngineEvent::PixelDrawn { .. })).count(),
            6
        );
        assert!(matches!(
            events.last(),
            Some(EngineEvent::Finished { outcome: RunOutcome::Completed, pixels_drawn: 6 })
        ));
    }
}
