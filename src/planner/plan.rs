use std::collections::HashMap;

use image::RgbaImage;
use serde::Serialize;

use crate::palette::matcher::ColorMatcher;
use crate::palette::types::{EntryKind, PaletteEntry, Rgb};

/// One canvas cell to paint, tagged with the palette colour it matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizedPixel {
    pub col: u32,
    pub row: u32,
    pub matched: Rgb,
}

/// All cells assigned to one palette entry, in raster (row-major) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanGroup {
    pub entry: PaletteEntry,
    pub pixels: Vec<QuantizedPixel>,
}

/// The most frequent colour, offered for skipping because the user can
/// pre-fill the whole canvas with it by hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundSuggestion {
    pub rgb: Rgb,
    #[serde(skip)]
    pub entry: PaletteEntry,
    pub count: usize,
    /// Share of all opaque pixels, 0–100.
    pub percentage: f64,
}

/// Quantized cells grouped by matched colour, before ordering.
#[derive(Debug, Clone)]
pub struct DrawPlan {
    /// First-seen order; that order breaks ties everywhere below.
    groups: Vec<PlanGroup>,
    index: HashMap<Rgb, usize>,
    opaque_pixels: usize,
    skipped: Option<BackgroundSuggestion>,
    background_decided: bool,
}

impl DrawPlan {
    /// Matches every pixel with alpha ≥ `alpha_threshold`; the rest are dropped.
    pub fn build(raster: &RgbaImage, matcher: &ColorMatcher, alpha_threshold: u8) -> Self {
        let mut groups: Vec<PlanGroup> = Vec::new();
        let mut index: HashMap<Rgb, usize> = HashMap::new();
        let mut opaque_pixels = 0;

        let (width, height) = raster.dimensions();
        for row in 0..height {
            for col in 0..width {
                let px = raster.get_pixel(col, row);
                if px[3] < alpha_threshold {
                    continue;
                }
                opaque_pixels += 1;

                let entry = matcher.nearest(Rgb(px[0], px[1], px[2]));
                let slot = *index.entry(entry.rgb).or_insert_with(|| {
                    groups.push(PlanGroup {
                        entry: entry.clone(),
                        pixels: Vec::new(),
                    });
                    groups.len() - 1
                });
                groups[slot].pixels.push(QuantizedPixel {
                    col,
                    row,
                    matched: entry.rgb,
                });
            }
        }

        tracing::debug!(groups = groups.len(), opaque_pixels, "draw plan built");
        Self {
            groups,
            index,
            opaque_pixels,
            skipped: None,
            background_decided: false,
        }
    }

    /// Opaque pixels in the source, regardless of skipping.
    pub fn opaque_pixels(&self) -> usize {
        self.opaque_pixels
    }

    /// Pixels still to be drawn.
    pub fn total_pixels(&self) -> usize {
        self.groups.iter().map(|g| g.pixels.len()).sum()
    }

    pub fn group(&self, rgb: Rgb) -> Option<&PlanGroup> {
        self.index.get(&rgb).map(|&i| &self.groups[i])
    }

    pub fn groups(&self) -> &[PlanGroup] {
        &self.groups
    }

    pub fn skipped(&self) -> Option<&BackgroundSuggestion> {
        self.skipped.as_ref()
    }

    /// The largest group; the earliest-seen one wins ties.
    pub fn background_suggestion(&self) -> Option<BackgroundSuggestion> {
        if self.opaque_pixels == 0 {
            return None;
        }
        let mut best: Option<&PlanGroup> = None;
        for g in &self.groups {
            if best.map_or(true, |b| g.pixels.len() > b.pixels.len()) {
                best = Some(g);
            }
        }
        best.map(|g| BackgroundSuggestion {
            rgb: g.entry.rgb,
            entry: g.entry.clone(),
            count: g.pixels.len(),
            percentage: g.pixels.len() as f64 * 100.0 / self.opaque_pixels as f64,
        })
    }

    /// Asks `decide` once whether to skip the background colour. Later calls
    /// return the first decision without asking again.
    pub fn decide_background<F>(&mut self, decide: F) -> Option<&BackgroundSuggestion>
    where
        F: FnOnce(&BackgroundSuggestion) -> bool,
    {
        if !self.background_decided {
            self.background_decided = true;
            if let Some(suggestion) = self.background_suggestion() {
                if decide(&suggestion) {
                    self.remove_group(suggestion.rgb);
                    tracing::info!(
                        rgb = %suggestion.rgb,
                        pixels = suggestion.count,
                        "background colour skipped"
                    );
                    self.skipped = Some(suggestion);
                }
            }
        }
        self.skipped.as_ref()
    }

    fn remove_group(&mut self, rgb: Rgb) {
        if let Some(i) = self.index.remove(&rgb) {
            self.groups.remove(i);
            for slot in self.index.values_mut() {
                if *slot > i {
                    *slot -= 1;
                }
            }
        }
    }

    /// Orders groups by the picker row of their main colour, top to bottom.
    ///
    /// Ties fall back to column, then main before sub, then slot, so every
    /// submenu's colours come out as one contiguous run.
    pub fn finalize(self) -> OrderedPlan {
        let mut groups = self.groups;
        groups.sort_by_key(|g| {
            let (is_sub, slot) = match g.entry.kind {
                EntryKind::Main => (false, 0),
                EntryKind::Sub { slot } => (true, slot),
            };
            (g.entry.loc.y, g.entry.loc.x, is_sub, slot)
        });
        OrderedPlan {
            groups,
            skipped: self.skipped,
            opaque_pixels: self.opaque_pixels,
        }
    }
}

/// The finished plan: groups in drawing order.
#[derive(Debug, Clone)]
pub struct OrderedPlan {
    pub groups: Vec<PlanGroup>,
    pub skipped: Option<BackgroundSuggestion>,
    pub opaque_pixels: usize,
}

impl OrderedPlan {
    pub fn total_pixels(&self) -> usize {
        self.groups.iter().map(|g| g.pixels.len()).sum()
    }

    pub fn entries(&self) -> impl Iterator<Item = &PaletteEntry> {
        self.groups.iter().map(|g| &g.entry)
    }
}
