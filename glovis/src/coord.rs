//! Grid cell coordinates.
//!
//! Every sensor lays its scenes out on a column/row grid (WRS path/row for
//! Landsat, h/v tiles for MODIS). A [`GridCell`] names one cell of that grid.

use std::fmt;

/// One cell of a sensor's reference grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    /// Grid column (Landsat path, MODIS horizontal tile).
    pub col: i32,
    /// Grid row (Landsat row, MODIS vertical tile).
    pub row: i32,
}

impl GridCell {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// The cell offset by `(dcol, drow)`.
    pub fn offset(&self, dcol: i32, drow: i32) -> Self {
        Self {
            col: self.col + dcol,
            row: self.row + drow,
        }
    }

    /// Pack column and row into a single key.
    ///
    /// Both values must fit in 16 bits, which holds for every supported
    /// sensor grid.
    pub fn packed(&self) -> u32 {
        ((self.col as u32 & 0xffff) << 16) | (self.row as u32 & 0xffff)
    }

    /// Reverse of [`GridCell::packed`].
    pub fn from_packed(key: u32) -> Self {
        Self {
            col: (key >> 16) as u16 as i32,
            row: (key & 0xffff) as u16 as i32,
        }
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.col, self.row)
    }
}

/// Inclusive column/row rectangle on the reference grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRange {
    pub min_col: i32,
    pub max_col: i32,
    pub min_row: i32,
    pub max_row: i32,
}

impl GridRange {
    pub const fn new(min_col: i32, max_col: i32, min_row: i32, max_row: i32) -> Self {
        Self {
            min_col,
            max_col,
            min_row,
            max_row,
        }
    }

    #[inline]
    pub fn contains(&self, cell: GridCell) -> bool {
        (self.min_col..=self.max_col).contains(&cell.col)
            && (self.min_row..=self.max_row).contains(&cell.row)
    }
}
