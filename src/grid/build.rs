use ndarray::Array2;
use parking_lot::Mutex;

use super::merge::merge_into;
use super::{Grid, GridShape};
use crate::census::{BoundingBox, GeoPoint};
use crate::parallel::{Cutoffs, fork_join};

/// Builds the raw histogram of a point set over a bounding box.
///
/// Every implementation must return the same grid for the same input.
pub trait HistogramBuilder {
    fn name(&self) -> &'static str;
    fn build(&self, points: &[GeoPoint], bbox: &BoundingBox, shape: GridShape) -> Grid;
}

fn accumulate(cells: &mut Array2<i64>, points: &[GeoPoint], bbox: &BoundingBox, shape: GridShape) {
    for p in points {
        let (row, col) = shape.cell_of(bbox, p);
        cells[[row, col]] += p.population;
    }
}

/// Single pass on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialGrid;

impl HistogramBuilder for SequentialGrid {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn build(&self, points: &[GeoPoint], bbox: &BoundingBox, shape: GridShape) -> Grid {
        let mut cells = Array2::zeros(shape.dim());
        accumulate(&mut cells, points, bbox, shape);
        Grid::from_array(cells)
    }
}

/// Each leaf task fills a private grid; siblings are merged pairwise with
/// the quadrant merge. No shared mutable state, at the price of one full
/// grid per leaf.
#[derive(Debug, Default, Clone, Copy)]
pub struct PartitionMerge {
    pub cutoffs: Cutoffs,
}

impl PartitionMerge {
    pub fn new(cutoffs: Cutoffs) -> Self {
        Self { cutoffs }
    }
}

impl HistogramBuilder for PartitionMerge {
    fn name(&self) -> &'static str {
        "partition-merge"
    }

    fn build(&self, points: &[GeoPoint], bbox: &BoundingBox, shape: GridShape) -> Grid {
        let cutoffs = self.cutoffs;
        let cells = fork_join(
            points,
            &cutoffs,
            &|chunk: &[GeoPoint]| {
                let mut local = Array2::zeros(shape.dim());
                accumulate(&mut local, chunk, bbox, shape);
                local
            },
            &|mut left: Array2<i64>, right: Array2<i64>| {
                merge_into(left.view_mut(), right.view(), &cutoffs);
                left
            },
        );
        Grid::from_array(cells)
    }
}

/// One grid shared by every task, one lock per cell. A lock is held only
/// for a single increment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SharedLockedGrid {
    pub cutoffs: Cutoffs,
}

impl SharedLockedGrid {
    pub fn new(cutoffs: Cutoffs) -> Self {
        Self { cutoffs }
    }
}

impl HistogramBuilder for SharedLockedGrid {
    fn name(&self) -> &'static str {
        "shared-locked"
    }

    fn build(&self, points: &[GeoPoint], bbox: &BoundingBox, shape: GridShape) -> Grid {
        let cells: Array2<Mutex<i64>> = Array2::from_shape_simple_fn(shape.dim(), || Mutex::new(0));
        fork_join(
            points,
            &self.cutoffs,
            &|chunk: &[GeoPoint]| {
                for p in chunk {
                    let (row, col) = shape.cell_of(bbox, p);
                    *cells[[row, col]].lock() += p.population;
                }
            },
            &|(), ()| (),
        );
        Grid::from_array(cells.map(|cell| *cell.lock()))
    }
}
