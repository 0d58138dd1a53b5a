// Synthetic pointer input.
use std::time::Duration;

use crate::config::TimingConfig;
use crate::errors::{PainterError, PainterResult};
use crate::palette::types::ScreenPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
}

/// An OS-level virtual pointer.
///
/// Writes may be batched by the implementation; `commit` makes everything
/// written so far visible to the OS input layer at once.
pub trait InputSink {
    fn move_absolute(&mut self, x: i32, y: i32) -> PainterResult<()>;
    fn set_button(&mut self, button: PointerButton, down: bool) -> PainterResult<()>;
    fn commit(&mut self) -> PainterResult<()>;
}

impl<S: InputSink + ?Sized> InputSink for &mut S {
    fn move_absolute(&mut self, x: i32, y: i32) -> PainterResult<()> {
        (**self).move_absolute(x, y)
    }

    fn set_button(&mut self, button: PointerButton, down: bool) -> PainterResult<()> {
        (**self).set_button(button, down)
    }

    fn commit(&mut self) -> PainterResult<()> {
        (**self).commit()
    }
}

/// Sink backed by `enigo`. Every call is delivered immediately, so `commit`
/// has nothing left to flush.
pub struct EnigoSink {
    enigo: enigo::Enigo,
}

impl EnigoSink {
    pub fn new() -> PainterResult<Self> {
        let enigo = enigo::Enigo::new(&enigo::Settings::default())
            .map_err(|e| PainterError::Device(format!("cannot open virtual pointer: {e}")))?;
        tracing::info!("virtual pointer ready");
        Ok(Self { enigo })
    }
}

impl InputSink for EnigoSink {
    fn move_absolute(&mut self, x: i32, y: i32) -> PainterResult<()> {
        use enigo::Mouse;
        self.enigo
            .move_mouse(x, y, enigo::Coordinate::Abs)
            .map_err(|e| PainterError::Device(format!("move to ({x}, {y}): {e}")))
    }

    fn set_button(&mut self, button: PointerButton, down: bool) -> PainterResult<()> {
        use enigo::Mouse;
        let button = match button {
            PointerButton::Left => enigo::Button::Left,
        };
        let (direction, label) = if down {
            (enigo::Direction::Press, "press")
        } else {
            (enigo::Direction::Release, "release")
        };
        self.enigo
            .button(button, direction)
            .map_err(|e| PainterError::Device(format!("button {label}: {e}")))
    }

    fn commit(&mut self) -> PainterResult<()> {
        Ok(())
    }
}

/// Everything a [`RecordingSink`] saw, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    Move(ScreenPoint),
    Button { down: bool },
    Commit,
}

/// In-memory sink for simulations and tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
    position: Option<ScreenPoint>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer position at every committed button press.
    pub fn presses(&self) -> Vec<ScreenPoint> {
        let mut pos = None;
        let mut out = Vec::new();
        for ev in &self.events {
            match *ev {
                SinkEvent::Move(p) => pos = Some(p),
                SinkEvent::Button { down: true } => {
                    if let Some(p) = pos {
                        out.push(p);
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// Positions of logical clicks; each one is two presses at one spot.
    pub fn clicks(&self) -> Vec<ScreenPoint> {
        self.presses().chunks(2).map(|pair| pair[0]).collect()
    }

    pub fn moves(&self) -> Vec<ScreenPoint> {
        self.events
            .iter()
            .filter_map(|ev| match ev {
                SinkEvent::Move(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self) -> Option<ScreenPoint> {
        self.position
    }
}

impl InputSink for RecordingSink {
    fn move_absolute(&mut self, x: i32, y: i32) -> PainterResult<()> {
        let p = ScreenPoint::new(x, y);
        self.position = Some(p);
        self.events.push(SinkEvent::Move(p));
        Ok(())
    }

    fn set_button(&mut self, _button: PointerButton, down: bool) -> PainterResult<()> {
        self.events.push(SinkEvent::Button { down });
        Ok(())
    }

    fn commit(&mut self) -> PainterResult<()> {
        self.events.push(SinkEvent::Commit);
        Ok(())
    }
}

/// Drives a sink with the target application's click protocol.
pub struct Pointer<S> {
    sink: S,
    width: i32,
    height: i32,
    click_phase: Duration,
    move_settle: Duration,
    last_target: Option<ScreenPoint>,
}

impl<S: InputSink> Pointer<S> {
    pub fn new(sink: S, resolution: (u32, u32), timing: &TimingConfig) -> Self {
        Self {
            sink,
            width: resolution.0 as i32,
            height: resolution.1 as i32,
            click_phase: timing.click_phase(),
            move_settle: timing.move_settle(),
            last_target: None,
        }
    }

    /// Moves to `p`, clamped to the screen.
    pub async fn move_to(&mut self, p: ScreenPoint) -> PainterResult<()> {
        let x = p.x.clamp(0, self.width);
        let y = p.y.clamp(0, self.height);
        self.sink.move_absolute(x, y)?;
        self.sink.commit()?;
        self.last_target = Some(p);
        if !self.move_settle.is_zero() {
            tokio::time::sleep(self.move_settle).await;
        }
        Ok(())
    }

    /// One logical click is a double press: the first only focuses the
    /// target window, the second acts.
    pub async fn click(&mut self) -> PainterResult<()> {
        for _ in 0..2 {
            self.sink.set_button(PointerButton::Left, true)?;
            self.sink.commit()?;
            tokio::time::sleep(self.click_phase).await;
            self.sink.set_button(PointerButton::Left, false)?;
            self.sink.commit()?;
            tokio::time::sleep(self.click_phase).await;
        }
        Ok(())
    }

    /// The point most recently moved to, before clamping.
    pub fn last_target(&self) -> Option<ScreenPoint> {
        self.last_target
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
