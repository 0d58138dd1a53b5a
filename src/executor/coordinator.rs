// Grid cell → screen pixel mapping.
use crate::errors::{PainterError, PainterResult};
use crate::palette::types::ScreenPoint;

/// Logical cells per side of the target canvas.
pub const GRID_CELLS: u32 = 150;

/// Screen rectangle covered by the canvas, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    rect: GridRect,
    cols: u32,
    rows: u32,
    cell_w: f64,
    cell_h: f64,
}

impl CoordinateMapper {
    pub fn new(rect: GridRect, cols: u32, rows: u32) -> PainterResult<Self> {
        if rect.x2 <= rect.x1 || rect.y2 <= rect.y1 || cols == 0 || rows == 0 {
            return Err(PainterError::Calibration(format!(
                "degenerate grid ({}, {})-({}, {}) with {cols}x{rows} cells",
                rect.x1, rect.y1, rect.x2, rect.y2
            )));
        }
        Ok(Self {
            rect,
            cols,
            rows,
            cell_w: (rect.x2 - rect.x1) / cols as f64,
            cell_h: (rect.y2 - rect.y1) / rows as f64,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    /// Exact centre of a cell. Cells outside the grid are rejected, never clamped.
    pub fn cell_center(&self, col: u32, row: u32) -> PainterResult<(f64, f64)> {
        if col >= self.cols || row >= self.rows {
            return Err(PainterError::OutOfGrid {
                col,
                row,
                cols: self.cols,
                rows: self.rows,
            });
        }
        let x = self.rect.x1 + col as f64 * self.cell_w + self.cell_w / 2.0;
        let y = self.rect.y1 + row as f64 * self.cell_h + self.cell_h / 2.0;
        Ok((x, y))
    }

    /// Cell centre rounded to the nearest physical pixel (halves round up).
    pub fn cell_to_physical(&self, col: u32, row: u32) -> PainterResult<ScreenPoint> {
        let (x, y) = self.cell_center(col, row)?;
        Ok(ScreenPoint::new(x.round() as i32, y.round() as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> CoordinateMapper {
        let rect = GridRect { x1: 100.0, y1: 100.0, x2: 850.0, y2: 850.0 };
        CoordinateMapper::new(rect, GRID_CELLS, GRID_CELLS).unwrap()
    }

    #[test]
    fn corner_cells_map_to_their_centres() {
        let m = mapper();
        assert_eq!(m.cell_center(0, 0).unwrap(), (102.5, 102.5));
        assert_eq!(m.cell_center(149, 149).unwrap(), (847.5, 847.5));
        assert_eq!(m.cell_center(10, 3).unwrap(), (152.5, 117.5));
    }

    #[test]
    fn physical_point_rounds_half_up() {
        let m = mapper();
        assert_eq!(m.cell_to_physical(0, 0).unwrap(), ScreenPoint::new(103, 103));
        assert_eq!(m.cell_to_physical(149, 149).unwrap(), ScreenPoint::new(848, 848));
    }

    #[test]
    fn non_square_rect_uses_independent_cell_sizes() {
        let rect = GridRect { x1: 0.0, y1: 0.0, x2: 300.0, y2: 150.0 };
        let m = CoordinateMapper::new(rect, GRID_CELLS, GRID_CELLS).unwrap();
        assert_eq!(m.cell_center(1, 1).unwrap(), (3.0, 1.5));
    }

    #[test]
    fn out_of_range_cells_are_rejected() {
        let m = mapper();
        assert!(matches!(
            m.cell_center(150, 0),
            Err(PainterError::OutOfGrid { col: 150, row: 0, .. })
        ));
        assert!(m.cell_center(0, 150).is_err());
        assert!(m.cell_to_physical(200, 200).is_err());
    }

    #[test]
    fn degenerate_rect_is_a_calibration_error() {
        let rect = GridRect { x1: 100.0, y1: 100.0, x2: 100.0, y2: 400.0 };
        assert!(matches!(
            CoordinateMapper::new(rect, GRID_CELLS, GRID_CELLS),
            Err(PainterError::Calibration(_))
        ));
    }
}
