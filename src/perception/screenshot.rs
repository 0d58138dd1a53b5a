// Full-screen capture backed pixel sampler.
use async_trait::async_trait;

use crate::errors::{PainterError, PainterResult};
use crate::palette::types::{Rgb, ScreenPoint};
use crate::perception::traits::PixelSampler;

/// Captures the first monitor and reads one pixel out of the frame.
/// Coordinates past the frame edge are clamped onto it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScreenSampler;

impl ScreenSampler {
    pub fn new() -> Self {
        Self
    }

    fn capture_pixel(at: ScreenPoint) -> PainterResult<Rgb> {
        let monitors = xcap::Monitor::all()
            .map_err(|e| PainterError::Sampling(format!("enumerate monitors: {e}")))?;
        let monitor = monitors
            .into_iter()
            .next()
            .ok_or_else(|| PainterError::Sampling("no monitor found".into()))?;
        let frame = monitor
            .capture_image()
            .map_err(|e| PainterError::Sampling(format!("capture: {e}")))?;

        let (w, h) = (frame.width(), frame.height());
        if w == 0 || h == 0 {
            return Err(PainterError::Sampling("empty frame".into()));
        }
        let x = (at.x.max(0) as u32).min(w - 1);
        let y = (at.y.max(0) as u32).min(h - 1);
        let px = frame.get_pixel(x, y);
        Ok(Rgb(px[0], px[1], px[2]))
    }
}

#[async_trait]
impl PixelSampler for ScreenSampler {
    async fn sample(&self, at: ScreenPoint) -> PainterResult<Rgb> {
        tokio::task::spawn_blocking(move || Self::capture_pixel(at))
            .await
            .map_err(|e| PainterError::Sampling(format!("join: {e}")))?
    }
}
