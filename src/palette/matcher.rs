use crate::errors::{PainterError, PainterResult};
use crate::palette::types::{PaletteEntry, Rgb};

/// Nearest-colour lookup over a fixed palette.
///
/// Ties resolve to the entry declared first, so plans are reproducible.
#[derive(Debug, Clone)]
pub struct ColorMatcher {
    entries: Vec<PaletteEntry>,
}

impl ColorMatcher {
    /// Builds a matcher over the palette's non-transparent entries.
    /// An empty result is a calibration precondition failure.
    pub fn new(palette: &[PaletteEntry]) -> PainterResult<Self> {
        let entries: Vec<PaletteEntry> = palette
            .iter()
            .filter(|e| !e.is_transparent())
            .cloned()
            .collect();
        if entries.is_empty() {
            return Err(PainterError::Calibration(
                "palette has no opaque colours to match against".into(),
            ));
        }
        Ok(Self { entries })
    }

    pub fn nearest(&self, pixel: Rgb) -> &PaletteEntry {
        let mut best = &self.entries[0];
        let mut best_dist = pixel.distance_sq(best.rgb);
        for entry in &self.entries[1..] {
            let d = pixel.distance_sq(entry.rgb);
            // strict: the earlier entry keeps ties
            if d < best_dist {
                best = entry;
                best_dist = d;
            }
        }
        best
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }
}
