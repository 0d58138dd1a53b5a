pub mod matcher;
pub mod navigator;
pub mod types;

pub use matcher::ColorMatcher;
pub use navigator::{MenuState, NavAction, NavTarget, Navigator, PickerLayout};
pub use types::{EntryKind, PaletteEntry, Rgb, ScreenPoint};
