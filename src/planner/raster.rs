// Source image → fixed-size RGBA raster matching the canvas grid.
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};

use crate::config::Resample;
use crate::errors::PainterResult;
use crate::executor::coordinator::GRID_CELLS;

impl Resample {
    fn filter(self) -> FilterType {
        match self {
            Resample::Nearest => FilterType::Nearest,
            Resample::Lanczos => FilterType::Lanczos3,
        }
    }
}

pub fn load_image(path: &Path) -> PainterResult<DynamicImage> {
    let img = image::open(path)?;
    tracing::info!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        "source image loaded"
    );
    Ok(img)
}

/// Resizes to exactly `GRID_CELLS`², ignoring aspect ratio like the canvas does.
pub fn rasterize(img: &DynamicImage, resample: Resample) -> RgbaImage {
    let rgba = img.to_rgba8();
    if rgba.dimensions() == (GRID_CELLS, GRID_CELLS) {
        return rgba;
    }
    image::imageops::resize(&rgba, GRID_CELLS, GRID_CELLS, resample.filter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn output_is_always_grid_sized() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(37, 500, Rgba([9, 9, 9, 255])));
        for resample in [Resample::Nearest, Resample::Lanczos] {
            let raster = rasterize(&img, resample);
            assert_eq!(raster.dimensions(), (GRID_CELLS, GRID_CELLS));
        }
    }

    #[test]
    fn nearest_keeps_flat_colours_exact() {
        let mut src = RgbaImage::from_pixel(300, 300, Rgba([200, 10, 10, 255]));
        for y in 0..300 {
            for x in 150..300 {
                src.put_pixel(x, y, Rgba([0, 0, 0, 0]));
            }
        }
        let raster = rasterize(&DynamicImage::ImageRgba8(src), Resample::Nearest);
        assert_eq!(raster.get_pixel(10, 10), &Rgba([200, 10, 10, 255]));
        assert_eq!(raster.get_pixel(140, 10)[3], 0);
    }
}
