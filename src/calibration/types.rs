use serde::{Deserialize, Serialize};

/// A screen point as written by the calibration tools: either `{"x":..,"y":..}`
/// or a bare `[x, y]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointRecord {
    Object { x: f64, y: f64 },
    Pair([f64; 2]),
}

impl PointRecord {
    pub fn xy(&self) -> (f64, f64) {
        match *self {
            PointRecord::Object { x, y } => (x, y),
            PointRecord::Pair([x, y]) => (x, y),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionRecord {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridRecord {
    pub top_left: PointRecord,
    pub bottom_right: PointRecord,
    #[serde(default = "default_cells")]
    pub width: u32,
    #[serde(default = "default_cells")]
    pub height: u32,
}

fn default_cells() -> u32 {
    crate::executor::coordinator::GRID_CELLS
}

/// `grid.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridFile {
    pub resolution: ResolutionRecord,
    pub grid: GridRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonsRecord {
    pub palette_icon: PointRecord,
    pub back: PointRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorKindRecord {
    Main,
    Sub,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorRecord {
    /// `[r, g, b]` or `[r, g, b, a]`.
    pub rgb: Vec<u8>,
    #[serde(rename = "type")]
    pub kind: ColorKindRecord,
    pub loc: PointRecord,
    #[serde(default = "default_sub_index")]
    pub sub_index: i64,
}

fn default_sub_index() -> i64 {
    -1
}

/// `palette.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteFile {
    pub buttons: ButtonsRecord,
    #[serde(default)]
    pub sub_positions: Vec<PointRecord>,
    pub colors: Vec<ColorRecord>,
}
