pub mod coordinator;
pub mod input;

pub use coordinator::{CoordinateMapper, GridRect, GRID_CELLS};
pub use input::{EnigoSink, InputSink, Pointer, PointerButton, RecordingSink, SinkEvent};
