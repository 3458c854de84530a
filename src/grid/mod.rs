//! Fixed-resolution population histograms and their summed-area form.
//!
//! Rows follow `y` (row 0 is the southern edge of the bounding box),
//! columns follow `x`. A [`Grid`] holds raw per-cell totals; converting it
//! into a [`PrefixGrid`] consumes it, so a grid is never queried half-built.

pub mod build;
pub mod merge;
pub mod prefix;

pub use build::{HistogramBuilder, PartitionMerge, SequentialGrid, SharedLockedGrid};

use ndarray::{Array2, ArrayView2};

use crate::census::{BoundingBox, GeoPoint};
use crate::error::{PopulationError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub xdim: usize,
    pub ydim: usize,
}

impl GridShape {
    pub fn new(xdim: usize, ydim: usize) -> Result<Self> {
        if xdim == 0 || ydim == 0 {
            return Err(PopulationError::InvalidDimensions { xdim, ydim });
        }
        Ok(Self { xdim, ydim })
    }

    /// `(rows, cols)` as ndarray wants it.
    #[inline]
    pub fn dim(&self) -> (usize, usize) {
        (self.ydim, self.xdim)
    }

    #[inline]
    pub fn cells(&self) -> usize {
        self.xdim * self.ydim
    }

    /// `(row, col)` of the cell holding `p`. Points on the top or right
    /// edge of the box fall into the last row or column.
    #[inline]
    pub fn cell_of(&self, bbox: &BoundingBox, p: &GeoPoint) -> (usize, usize) {
        // float -> usize saturates: NaN from a zero-width box lands in 0
        let col = ((p.x - bbox.left) / bbox.width() * self.xdim as f64) as usize;
        let row = ((p.y - bbox.bottom) / bbox.height() * self.ydim as f64) as usize;
        (row.min(self.ydim - 1), col.min(self.xdim - 1))
    }
}

/// Raw histogram: each cell is the population of the points mapped to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Array2<i64>,
}

impl Grid {
    pub fn zeros(shape: GridShape) -> Self {
        Self {
            cells: Array2::zeros(shape.dim()),
        }
    }

    pub fn from_array(cells: Array2<i64>) -> Self {
        Self { cells }
    }

    pub fn shape(&self) -> GridShape {
        let (ydim, xdim) = self.cells.dim();
        GridShape { xdim, ydim }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> i64 {
        self.cells[[row, col]]
    }

    pub fn view(&self) -> ArrayView2<'_, i64> {
        self.cells.view()
    }

    pub fn total(&self) -> i64 {
        self.cells.sum()
    }

    /// Turn the histogram into its summed-area form. One-way.
    pub fn into_prefix(mut self) -> PrefixGrid {
        prefix::summed_area_in_place(&mut self.cells);
        PrefixGrid { cells: self.cells }
    }
}

/// Summed-area grid: `at(j, i)` is the raw total over rows `>= j` and
/// columns `<= i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixGrid {
    cells: Array2<i64>,
}

impl PrefixGrid {
    pub fn shape(&self) -> GridShape {
        let (ydim, xdim) = self.cells.dim();
        GridShape { xdim, ydim }
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> i64 {
        self.cells[[row, col]]
    }

    pub fn view(&self) -> ArrayView2<'_, i64> {
        self.cells.view()
    }
}
