// Offline rendering of what the canvas will look like after a run.
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};

use crate::errors::PainterResult;
use crate::palette::matcher::ColorMatcher;
use crate::palette::types::Rgb;

/// Side length of the magnified preview.
pub const PREVIEW_SIZE: u32 = 600;

/// Replaces every opaque pixel with its palette match. Transparent pixels
/// stay transparent, as they are never drawn.
pub fn quantize(raster: &RgbaImage, matcher: &ColorMatcher, alpha_threshold: u8) -> RgbaImage {
    let mut out = RgbaImage::new(raster.width(), raster.height());
    for (x, y, px) in raster.enumerate_pixels() {
        if px[3] < alpha_threshold {
            continue;
        }
        let rgb = matcher.nearest(Rgb(px[0], px[1], px[2])).rgb;
        out.put_pixel(x, y, Rgba([rgb.0, rgb.1, rgb.2, 255]));
    }
    out
}

/// `art.png` → `art_preview.png`
pub fn preview_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pixelart".into());
    output.with_file_name(format!("{stem}_preview.png"))
}

/// Writes the quantized raster and a nearest-neighbour magnified copy.
/// Returns the preview's path.
pub fn write_preview(quantized: &RgbaImage, output: &Path) -> PainterResult<PathBuf> {
    quantized.save(output)?;
    let magnified = image::imageops::resize(quantized, PREVIEW_SIZE, PREVIEW_SIZE, FilterType::Nearest);
    let preview = preview_path(output);
    magnified.save(&preview)?;
    tracing::info!(
        output = %output.display(),
        preview = %preview.display(),
        "preview written"
    );
    Ok(preview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::types::{PaletteEntry, ScreenPoint};

    #[test]
    fn quantize_snaps_to_palette_and_keeps_holes() {
        let matcher = ColorMatcher::new(&[
            PaletteEntry::main(Rgb(0, 0, 0), ScreenPoint::new(0, 0)),
            PaletteEntry::main(Rgb(255, 255, 255), ScreenPoint::new(1, 0)),
        ])
        .unwrap();
        let mut raster = RgbaImage::from_pixel(2, 1, Rgba([30, 40, 20, 255]));
        raster.put_pixel(1, 0, Rgba([230, 230, 230, 10]));

        let q = quantize(&raster, &matcher, 128);
        assert_eq!(q.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(q.get_pixel(1, 0)[3], 0);
    }

    #[test]
    fn preview_files_are_written_side_by_side() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("art.png");
        let q = RgbaImage::from_pixel(150, 150, Rgba([1, 2, 3, 255]));

        let preview = write_preview(&q, &out).unwrap();
        assert_eq!(preview, dir.path().join("art_preview.png"));
        assert_eq!(image::open(&preview).unwrap().width(), PREVIEW_SIZE);
        assert_eq!(image::open(&out).unwrap().width(), 150);
    }
}
