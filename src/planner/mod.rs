pub mod plan;
pub mod preview;
pub mod raster;

pub use plan::{BackgroundSuggestion, DrawPlan, OrderedPlan, PlanGroup, QuantizedPixel};
pub use raster::{load_image, rasterize};
