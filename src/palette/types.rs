use serde::{Deserialize, Serialize};

/// An opaque colour. Palette identity is the RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Squared Euclidean distance in RGB space. Orders exactly like the
    /// true distance, without the square root.
    pub fn distance_sq(self, other: Rgb) -> u32 {
        let dr = self.0 as i32 - other.0 as i32;
        let dg = self.1 as i32 - other.1 as i32;
        let db = self.2 as i32 - other.2 as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    pub fn distance(self, other: Rgb) -> f64 {
        (self.distance_sq(other) as f64).sqrt()
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RGB({},{},{})", self.0, self.1, self.2)
    }
}

/// Absolute screen position in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Always visible in the picker's root row.
    Main,
    /// Reachable through the owning main colour's submenu, at a fixed slot.
    Sub { slot: usize },
}

/// One selectable colour of the target application's picker.
///
/// For sub entries `loc` is the location of the owning main colour, so
/// `loc` doubles as the owner's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    pub rgb: Rgb,
    pub alpha: Option<u8>,
    pub kind: EntryKind,
    pub loc: ScreenPoint,
}

impl PaletteEntry {
    pub fn main(rgb: Rgb, loc: ScreenPoint) -> Self {
        Self {
            rgb,
            alpha: None,
            kind: EntryKind::Main,
            loc,
        }
    }

    pub fn sub(rgb: Rgb, owner_loc: ScreenPoint, slot: usize) -> Self {
        Self {
            rgb,
            alpha: None,
            kind: EntryKind::Sub { slot },
            loc: owner_loc,
        }
    }

    /// Fully transparent entries (eraser) never take part in matching.
    pub fn is_transparent(&self) -> bool {
        self.alpha == Some(0)
    }

    pub fn is_main(&self) -> bool {
        matches!(self.kind, EntryKind::Main)
    }

    pub fn describe(&self) -> String {
        match self.kind {
            EntryKind::Main => "MAIN colour".to_string(),
            EntryKind::Sub { slot } => format!("SUB colour #{}", slot + 1),
        }
    }
}
