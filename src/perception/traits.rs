use async_trait::async_trait;

use crate::errors::PainterResult;
use crate::palette::types::{Rgb, ScreenPoint};

/// Reads the colour currently shown at a screen position.
#[async_trait]
pub trait PixelSampler: Send + Sync {
    async fn sample(&self, at: ScreenPoint) -> PainterResult<Rgb>;
}
