pub mod control;
pub mod engine;
pub mod event_bus;
pub mod journal;
pub mod state;

pub use control::{control_channel, ControlFlags, ControlHandle, ControlWatch, Gate};
pub use engine::ExecutionEngine;
pub use event_bus::{EngineEvent, EventBus};
pub use journal::{JournalEntry, RunJournal};
pub use state::{RunMode, RunOutcome, RunReport, RunStats};
