pub mod sampling;
pub mod screenshot;
pub mod traits;

pub use sampling::{DegradingSampler, SENTINEL};
pub use screenshot::ScreenSampler;
pub use traits::PixelSampler;
