use std::sync::atomic::{AtomicUsize, Ordering};

use crate::palette::types::{Rgb, ScreenPoint};
use crate::perception::traits::PixelSampler;

/// Colour recorded when a sample cannot be taken.
pub const SENTINEL: Rgb = Rgb::BLACK;

/// Wraps a sampler so failures degrade to [`SENTINEL`] instead of aborting.
///
/// A bad sample corrupts one palette entry; an abort loses the session.
/// Degraded samples are counted and reported at the end.
pub struct DegradingSampler<P> {
    inner: P,
    degraded: AtomicUsize,
}

impl<P: PixelSampler> DegradingSampler<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            degraded: AtomicUsize::new(0),
        }
    }

    pub async fn sample(&self, at: ScreenPoint) -> Rgb {
        match self.inner.sample(at).await {
            Ok(rgb) => rgb,
            Err(e) => {
                self.degraded.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(x = at.x, y = at.y, error = %e, "sample failed; recording black");
                SENTINEL
            }
        }
    }

    pub fn degraded(&self) -> usize {
        self.degraded.load(Ordering::Relaxed)
    }
}
