//! Calibration records: where the canvas and the colour picker sit on screen.
//!
//! Both files are produced by external calibration tools and are read-only
//! for the duration of a run. Everything is validated here, before any
//! device is opened.
pub mod extractor;
pub mod types;

use std::collections::HashSet;
use std::path::Path;

use crate::errors::{PainterError, PainterResult};
use crate::executor::coordinator::{CoordinateMapper, GridRect};
use crate::palette::navigator::PickerLayout;
use crate::palette::types::{EntryKind, PaletteEntry, Rgb, ScreenPoint};
use crate::palette::ColorMatcher;

pub use types::{ColorKindRecord, ColorRecord, GridFile, PaletteFile, PointRecord};

/// Every submenu of the target picker has this many slots.
pub const EXPECTED_SUB_SLOTS: usize = 9;

#[derive(Debug, Clone)]
pub struct Calibration {
    pub resolution: (u32, u32),
    pub mapper: CoordinateMapper,
    pub layout: PickerLayout,
    /// Declaration order, transparent entries included.
    pub palette: Vec<PaletteEntry>,
}

impl Calibration {
    pub fn from_records(grid: &GridFile, palette: &PaletteFile) -> PainterResult<Self> {
        let resolution = (grid.resolution.width, grid.resolution.height);
        if resolution.0 == 0 || resolution.1 == 0 {
            return Err(PainterError::Calibration("screen resolution is zero".into()));
        }

        let (x1, y1) = grid.grid.top_left.xy();
        let (x2, y2) = grid.grid.bottom_right.xy();
        let mapper = CoordinateMapper::new(
            GridRect { x1, y1, x2, y2 },
            grid.grid.width,
            grid.grid.height,
        )?;

        let (layout, entries) = parse_palette(palette)?;

        tracing::info!(
            width = resolution.0,
            height = resolution.1,
            colours = entries.len(),
            slots = layout.sub_slots.len(),
            "calibration loaded"
        );
        Ok(Self {
            resolution,
            mapper,
            layout,
            palette: entries,
        })
    }
}

/// Validates the palette record on its own. Used directly where no canvas
/// is involved.
pub fn parse_palette(palette: &PaletteFile) -> PainterResult<(PickerLayout, Vec<PaletteEntry>)> {
    let layout = PickerLayout {
        palette_icon: to_point(&palette.buttons.palette_icon),
        back: to_point(&palette.buttons.back),
        sub_slots: palette.sub_positions.iter().map(to_point).collect(),
    };

    let entries = palette
        .colors
        .iter()
        .enumerate()
        .map(|(i, rec)| entry_from_record(i, rec, layout.sub_slots.len()))
        .collect::<PainterResult<Vec<_>>>()?;

    // empty-after-transparency check
    ColorMatcher::new(&entries)?;

    if entries.iter().any(|e| !e.is_main()) && layout.sub_slots.len() != EXPECTED_SUB_SLOTS {
        tracing::warn!(
            slots = layout.sub_slots.len(),
            expected = EXPECTED_SUB_SLOTS,
            "unusual number of submenu slots"
        );
    }
    warn_duplicates(&entries);
    Ok((layout, entries))
}

fn to_point(p: &PointRecord) -> ScreenPoint {
    let (x, y) = p.xy();
    ScreenPoint::new(x.round() as i32, y.round() as i32)
}

fn entry_from_record(index: usize, rec: &ColorRecord, slots: usize) -> PainterResult<PaletteEntry> {
    let (rgb, alpha) = match rec.rgb.as_slice() {
        [r, g, b] => (Rgb(*r, *g, *b), None),
        [r, g, b, a] => (Rgb(*r, *g, *b), Some(*a)),
        other => {
            return Err(PainterError::Calibration(format!(
                "colour #{index}: rgb must have 3 or 4 components, got {}",
                other.len()
            )))
        }
    };

    let kind = match rec.kind {
        ColorKindRecord::Main => {
            if rec.sub_index != -1 {
                return Err(PainterError::Calibration(format!(
                    "colour #{index}: main colour with sub_index {}",
                    rec.sub_index
                )));
            }
            EntryKind::Main
        }
        ColorKindRecord::Sub => {
            if rec.sub_index < 0 || rec.sub_index as usize >= slots {
                return Err(PainterError::Calibration(format!(
                    "colour #{index}: sub_index {} outside the {slots} calibrated submenu slots",
                    rec.sub_index
                )));
            }
            EntryKind::Sub {
                slot: rec.sub_index as usize,
            }
        }
    };

    Ok(PaletteEntry {
        rgb,
        alpha,
        kind,
        loc: to_point(&rec.loc),
    })
}

fn warn_duplicates(entries: &[PaletteEntry]) {
    let mut seen = HashSet::new();
    for e in entries.iter().filter(|e| !e.is_transparent()) {
        if !seen.insert(e.rgb) {
            tracing::warn!(rgb = %e.rgb, "duplicate palette colour; only the first is ever matched");
        }
    }
}

pub fn load_grid(path: &Path) -> PainterResult<GridFile> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PainterError::Calibration(format!("cannot read {}: {e}", path.display()))
    })?;
    let grid: GridFile = serde_json::from_str(&content)?;
    tracing::debug!(path = %path.display(), "grid calibration read");
    Ok(grid)
}

pub fn load_palette(path: &Path) -> PainterResult<PaletteFile> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PainterError::Calibration(format!("cannot read {}: {e}", path.display()))
    })?;
    let palette: PaletteFile = serde_json::from_str(&content)?;
    tracing::debug!(path = %path.display(), colours = palette.colors.len(), "palette read");
    Ok(palette)
}

pub fn load(grid_path: &Path, palette_path: &Path) -> PainterResult<Calibration> {
    let grid = load_grid(grid_path)?;
    let palette = load_palette(palette_path)?;
    Calibration::from_records(&grid, &palette)
}

pub fn save_palette(path: &Path, palette: &PaletteFile) -> PainterResult<()> {
    let content = serde_json::to_string_pretty(palette)?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "palette saved");
    Ok(())
}
