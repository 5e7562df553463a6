//! Mosaic grid geometry.
//!
//! The output canvas is `tile_columns` tile widths wide; the input image is
//! scaled to that width and as many whole tile rows as fit are laid over it.
//! Leftover height is spread evenly across the rows, so every row gets the
//! same stretched cell height.

use serde::Serialize;

use crate::error::{TessellaError, TessellaResult};
use crate::math::{GridPosition, PixelRect, PixelSize};
use crate::rational::Rational;

/// One cell of the mosaic grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub grid: GridPosition,
    /// Output-space bounds.
    pub bounds: PixelRect,
}

/// Immutable grid geometry shared by every rendered frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MosaicLayout {
    pub tile_columns: u32,
    pub tile_rows: u32,
    /// Cell size in output pixels; height includes the per-row margin.
    pub tile_size: PixelSize,
    pub canvas_size: PixelSize,
    /// Size of the input image the layout was computed for.
    pub input_size: PixelSize,
    /// Output pixels per input pixel.
    pub pixel_ratio: Rational,
    /// Column-major: all rows of column 0, then column 1, ...
    pub tiles: Vec<Tile>,
}

impl MosaicLayout {
    /// Compute the grid for `tile_columns` tiles of `tile_size` across an
    /// input image of `input_size`.
    pub fn compute(
        tile_columns: u32,
        input_size: PixelSize,
        tile_size: PixelSize,
    ) -> TessellaResult<Self> {
        if tile_columns == 0 {
            return Err(TessellaError::invalid("tile column count must be positive"));
        }
        if input_size.is_empty() {
            return Err(TessellaError::invalid(format!(
                "input image has no area ({})",
                input_size
            )));
        }
        if tile_size.is_empty() {
            return Err(TessellaError::invalid(format!(
                "tile image has no area ({})",
                tile_size
            )));
        }

        let output_width = tile_size.width as u64 * tile_columns as u64;
        let output_width = u32::try_from(output_width).map_err(|_| {
            TessellaError::invalid(format!(
                "{} columns of {} px exceed the maximum canvas width",
                tile_columns, tile_size.width
            ))
        })?;

        let pixel_ratio = Rational::new(output_width as i128, input_size.width as i128);
        let scaled_height = Rational::from(input_size.height) * pixel_ratio;
        let tile_height = Rational::from(tile_size.height);

        let tile_rows = (scaled_height / tile_height).floor();
        if tile_rows < 1 {
            return Err(TessellaError::DegenerateLayout(format!(
                "input scaled to {}x{:.2} px is shorter than one {} px tile row",
                output_width,
                scaled_height.to_f64(),
                tile_size.height
            )));
        }

        let margin = scaled_height.rem_euclid(tile_height);
        let row_margin = margin / Rational::from_integer(tile_rows);
        let cell_height = (tile_height + row_margin).floor();

        let tile_rows = u32::try_from(tile_rows)
            .map_err(|_| TessellaError::invalid("tile row count out of range"))?;
        let canvas_height = u32::try_from(scaled_height.ceil())
            .map_err(|_| TessellaError::invalid("scaled input height out of range"))?;
        let cell_size = PixelSize::new(tile_size.width, cell_height as u32);

        let tiles = grid_tiles(tile_columns, tile_rows, cell_size);

        Ok(Self {
            tile_columns,
            tile_rows,
            tile_size: cell_size,
            canvas_size: PixelSize::new(output_width, canvas_height),
            input_size,
            pixel_ratio,
            tiles,
        })
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// The tiles of one output column, top to bottom.
    pub fn column(&self, column: u32) -> &[Tile] {
        if column >= self.tile_columns {
            return &[];
        }
        let rows = self.tile_rows as usize;
        let start = column as usize * rows;
        &self.tiles[start..start + rows]
    }

    /// Map an output-space box onto the input image.
    ///
    /// Coordinates are divided by the pixel ratio and rounded half-to-even.
    /// The result always covers at least one pixel inside the input image.
    pub fn to_input_space(&self, bounds: &PixelRect) -> PixelRect {
        let map = |v: u32, limit: u32| -> u32 {
            let scaled = (Rational::from(v) / self.pixel_ratio).round_half_even();
            scaled.clamp(0, limit as i128) as u32
        };

        let width = self.input_size.width;
        let height = self.input_size.height;
        let x0 = map(bounds.x0, width.saturating_sub(1));
        let y0 = map(bounds.y0, height.saturating_sub(1));
        let x1 = map(bounds.x1, width).max(x0 + 1);
        let y1 = map(bounds.y1, height).max(y0 + 1);
        PixelRect::new(x0, y0, x1, y1)
    }
}

fn grid_tiles(columns: u32, rows: u32, cell: PixelSize) -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(columns as usize * rows as usize);
    for column in 0..columns {
        for row in 0..rows {
            tiles.push(Tile {
                grid: GridPosition::new(column, row),
                bounds: PixelRect::from_origin_size(
                    column * cell.width,
                    row * cell.height,
                    cell,
                ),
            });
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(columns: u32, input: (u32, u32), tile: (u32, u32)) -> TessellaResult<MosaicLayout> {
        MosaicLayout::compute(
            columns,
            PixelSize::new(input.0, input.1),
            PixelSize::new(tile.0, tile.1),
        )
    }

    #[test]
    fn test_reference_grid() {
        let l = layout(4, (100, 50), (10, 10)).unwrap();
        assert_eq!(l.canvas_size, PixelSize::new(40, 20));
        assert_eq!(l.pixel_ratio, Rational::new(2, 5));
        assert_eq!(l.tile_rows, 2);
        assert_eq!(l.tile_size, PixelSize::new(10, 10));
        assert_eq!(l.tile_count(), 8);
    }

    #[test]
    fn test_column_major_order() {
        let l = layout(4, (100, 50), (10, 10)).unwrap();
        assert_eq!(l.tiles[0].grid, GridPosition::new(0, 0));
        assert_eq!(l.tiles[1].grid, GridPosition::new(0, 1));
        assert_eq!(l.tiles[2].grid, GridPosition::new(1, 0));
        assert_eq!(l.tiles[7].bounds, PixelRect::new(30, 10, 40, 20));
    }

    #[test]
    fn test_column_slices() {
        let l = layout(4, (100, 50), (10, 10)).unwrap();
        let col = l.column(2);
        assert_eq!(col.len(), 2);
        assert!(col.iter().all(|t| t.grid.column == 2));
        assert!(l.column(4).is_empty());
    }

    #[test]
    fn test_margin_stretches_rows() {
        // 3 columns of 10 px over 30x47 input: scaled height 47, 4 rows,
        // margin 7 spread as 1.75 px per row -> cells 11 px tall.
        let l = layout(3, (30, 47), (10, 10)).unwrap();
        assert_eq!(l.tile_rows, 4);
        assert_eq!(l.tile_size, PixelSize::new(10, 11));
        assert_eq!(l.canvas_size, PixelSize::new(30, 47));
        assert!(l.tile_rows * l.tile_size.height <= l.canvas_size.height);
    }

    #[test]
    fn test_fractional_scaled_height_rounds_up() {
        // ratio 20/30, scaled height 25 * 2/3 = 16.67 -> canvas 17 px.
        let l = layout(2, (30, 25), (10, 8)).unwrap();
        assert_eq!(l.canvas_size, PixelSize::new(20, 17));
        assert_eq!(l.tile_rows, 2);
        assert_eq!(l.tile_size.height, 8);
    }

    #[test]
    fn test_degenerate_layout() {
        let err = layout(1, (100, 10), (10, 10)).unwrap_err();
        assert!(matches!(err, TessellaError::DegenerateLayout(_)));
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            layout(0, (100, 50), (10, 10)),
            Err(TessellaError::InvalidInput(_))
        ));
        assert!(layout(4, (0, 50), (10, 10)).is_err());
        assert!(layout(4, (100, 50), (10, 0)).is_err());
    }

    #[test]
    fn test_compute_is_idempotent() {
        let a = layout(7, (333, 211), (9, 13)).unwrap();
        let b = layout(7, (333, 211), (9, 13)).unwrap();
        assert_eq!(a.tiles, b.tiles);
        assert_eq!(a, b);
    }

    #[test]
    fn test_to_input_space() {
        let l = layout(4, (100, 50), (10, 10)).unwrap();
        let input = l.to_input_space(&l.tiles[3].bounds);
        assert_eq!(input, PixelRect::new(25, 25, 50, 50));
    }

    #[test]
    fn test_to_input_space_never_empty() {
        // Upscaling: 20 columns of 10 px over a 4x4 input.
        let l = layout(20, (4, 4), (10, 10)).unwrap();
        for tile in &l.tiles {
            let r = l.to_input_space(&tile.bounds);
            assert!(!r.is_empty());
            assert!(r.x1 <= 4 && r.y1 <= 4);
        }
    }
}
