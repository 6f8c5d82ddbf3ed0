/// Rectangular integer tile grid.
///
/// One grid instance backs one layer: the terrain layer stores drawable
/// tile codes, the fence layer stores collidable codes (non-zero = solid,
/// see `collision.rs`). Shape is fixed at load; `set` is the only write
/// path and never resizes.
///
/// Source format: one row per line, comma-separated non-negative
/// integers. Rows must all have the same length — a ragged source is
/// rejected here, not repaired (normalization is an external concern).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid source has no rows")]
    Empty,

    #[error("row {row} has {len} columns, expected {expected}")]
    Ragged { row: usize, len: usize, expected: usize },

    #[error("row {row}, column {col}: {cell:?} is not a tile code")]
    BadCell { row: usize, col: usize, cell: String },

    #[error("({row}, {col}) is outside a {height}x{width} grid")]
    OutOfRange { row: usize, col: usize, height: usize, width: usize },
}

#[derive(Clone, Debug)]
pub struct TileGrid {
    width: usize,
    height: usize,
    cells: Vec<u16>, // row-major
}

impl TileGrid {
    /// Parse a comma-separated text source into a grid.
    /// Trailing blank lines are tolerated (files end with a newline);
    /// anything else malformed is an error.
    pub fn parse(source: &str) -> Result<TileGrid, GridError> {
        let mut lines: Vec<&str> = source.lines().collect();
        while lines.last().map_or(false, |l| l.trim().is_empty()) {
            lines.pop();
        }
        if lines.is_empty() {
            return Err(GridError::Empty);
        }

        let mut cells: Vec<u16> = Vec::new();
        let mut width = 0usize;

        for (row, line) in lines.iter().enumerate() {
            let mut len = 0usize;
            for (col, raw) in line.split(',').enumerate() {
                let cell = raw.trim();
                let code: u16 = cell.parse().map_err(|_| GridError::BadCell {
                    row,
                    col,
                    cell: cell.to_string(),
                })?;
                cells.push(code);
                len += 1;
            }
            if row == 0 {
                width = len;
            } else if len != width {
                return Err(GridError::Ragged { row, len, expected: width });
            }
        }

        Ok(TileGrid { width, height: lines.len(), cells })
    }

    /// A flat grid filled with one code. The fallback when a map source
    /// fails to load: the engine never invents terrain beyond this.
    pub fn filled(width: usize, height: usize, code: u16) -> TileGrid {
        TileGrid { width, height, cells: vec![code; width * height] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Checked read. Out-of-range is an error, never a wrap.
    pub fn get(&self, row: usize, col: usize) -> Result<u16, GridError> {
        if row < self.height && col < self.width {
            Ok(self.cells[row * self.width + col])
        } else {
            Err(GridError::OutOfRange {
                row,
                col,
                height: self.height,
                width: self.width,
            })
        }
    }

    /// Non-erroring read for scan paths that probe past the edge.
    pub fn cell(&self, row: i32, col: i32) -> Option<u16> {
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row < self.height && col < self.width {
            Some(self.cells[row * self.width + col])
        } else {
            None
        }
    }

    /// Single-tile write. Out-of-range writes are dropped silently
    /// (matching the runtime tile-edit contract); the return value tells
    /// callers whether derived state needs a rebuild.
    pub fn set(&mut self, row: usize, col: usize, code: u16) -> bool {
        if row < self.height && col < self.width {
            self.cells[row * self.width + col] = code;
            true
        } else {
            false
        }
    }
}

// ── Unit tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rectangular_source() {
        let g = TileGrid::parse("0,1,2\n3,4,5\n").unwrap();
        assert_eq!(g.width(), 3);
        assert_eq!(g.height(), 2);
        assert_eq!(g.get(0, 0).unwrap(), 0);
        assert_eq!(g.get(1, 2).unwrap(), 5);
    }

    #[test]
    fn parse_trims_cell_whitespace() {
        let g = TileGrid::parse(" 0, 12 ,1\n0,0,0").unwrap();
        assert_eq!(g.get(0, 1).unwrap(), 12);
    }

    #[test]
    fn parse_rejects_ragged_rows() {
        let err = TileGrid::parse("0,1,2\n3,4\n").unwrap_err();
        assert_eq!(err, GridError::Ragged { row: 1, len: 2, expected: 3 });
    }

    #[test]
    fn parse_rejects_non_integer_cell() {
        let err = TileGrid::parse("0,x,2\n").unwrap_err();
        assert!(matches!(err, GridError::BadCell { row: 0, col: 1, .. }));
    }

    #[test]
    fn parse_rejects_empty_source() {
        assert_eq!(TileGrid::parse("\n\n").unwrap_err(), GridError::Empty);
    }

    #[test]
    fn get_out_of_range_is_error_not_wrap() {
        let g = TileGrid::parse("0,1\n2,3\n").unwrap();
        assert!(g.get(2, 0).is_err());
        assert!(g.get(0, 2).is_err());
        assert_eq!(g.cell(-1, 0), None);
        assert_eq!(g.cell(0, 5), None);
    }

    #[test]
    fn set_then_get_round_trip() {
        let mut g = TileGrid::filled(4, 3, 0);
        assert!(g.set(2, 3, 12));
        assert_eq!(g.get(2, 3).unwrap(), 12);
    }

    #[test]
    fn set_out_of_range_is_silent_noop() {
        let mut g = TileGrid::filled(2, 2, 7);
        assert!(!g.set(5, 5, 1));
        for row in 0..2 {
            for col in 0..2 {
                assert_eq!(g.get(row, col).unwrap(), 7);
            }
        }
    }
}
