use itertools::Itertools;
use std::fmt;

use crate::census::{BoundingBox, GeoPoint};
use crate::grid::{GridShape, PrefixGrid};
use crate::parallel::{Cutoffs, fork_join};

/// 1-indexed inclusive rectangle of grid cells, only built through
/// [`QueryRect::new`] so every corner is inside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRect {
    west: usize,
    south: usize,
    east: usize,
    north: usize,
}

impl QueryRect {
    /// `None` when the rectangle is empty or leaves the grid, which is
    /// also how an interactive session signals it is done.
    pub fn new(west: i64, south: i64, east: i64, north: i64, shape: GridShape) -> Option<Self> {
        let (xdim, ydim) = (shape.xdim as i64, shape.ydim as i64);
        if west < 1 || west > xdim || south < 1 || south > ydim {
            return None;
        }
        if east < west || east > xdim || north < south || north > ydim {
            return None;
        }
        Some(Self {
            west: west as usize,
            south: south as usize,
            east: east as usize,
            north: north as usize,
        })
    }

    #[inline]
    pub fn west(&self) -> usize {
        self.west
    }

    #[inline]
    pub fn south(&self) -> usize {
        self.south
    }

    #[inline]
    pub fn east(&self) -> usize {
        self.east
    }

    #[inline]
    pub fn north(&self) -> usize {
        self.north
    }

    /// The rectangle in projected coordinates, by linear interpolation over `bbox`.
    ///
    /// A rectangle reaching the last column or row takes the box edge as is;
    /// `width + left` can round below `right` and drop the extreme point.
    pub fn world_bounds(&self, bbox: &BoundingBox, shape: GridShape) -> BoundingBox {
        let (xdim, ydim) = (shape.xdim as f64, shape.ydim as f64);
        let right = if self.east == shape.xdim {
            bbox.right
        } else {
            self.east as f64 / xdim * bbox.width() + bbox.left
        };
        let top = if self.north == shape.ydim {
            bbox.top
        } else {
            self.north as f64 / ydim * bbox.height() + bbox.bottom
        };
        BoundingBox {
            left: (self.west - 1) as f64 / xdim * bbox.width() + bbox.left,
            right,
            bottom: (self.south - 1) as f64 / ydim * bbox.height() + bbox.bottom,
            top,
        }
    }
}

/// Four whitespace-separated integers, nothing more.
pub fn parse_query_line(line: &str) -> Option<(i64, i64, i64, i64)> {
    line.split_whitespace()
        .map(|tok| tok.parse::<i64>())
        .collect_tuple()
        .and_then(|(w, s, e, n)| Some((w.ok()?, s.ok()?, e.ok()?, n.ok()?)))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryAnswer {
    pub population: i64,
    /// Share of the dataset's total population, unrounded; `Display`
    /// rounds it once to two decimals.
    pub percentage: f64,
}

impl QueryAnswer {
    pub fn new(population: i64, total_population: i64) -> Self {
        let percentage = if total_population == 0 {
            0.0
        } else {
            population as f64 / total_population as f64 * 100.0
        };
        Self {
            population,
            percentage,
        }
    }
}

impl fmt::Display for QueryAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}%", self.population, self.percentage)
    }
}

fn sum_within(points: &[GeoPoint], bounds: &BoundingBox) -> i64 {
    points
        .iter()
        .filter(|p| bounds.contains(p.x, p.y))
        .map(|p| p.population)
        .sum()
}

/// O(n) scan on the calling thread.
pub fn linear_scan(points: &[GeoPoint], bbox: &BoundingBox, shape: GridShape, rect: &QueryRect) -> i64 {
    sum_within(points, &rect.world_bounds(bbox, shape))
}

/// Same predicate as [`linear_scan`], reduced fork-join style.
pub fn parallel_scan(
    points: &[GeoPoint],
    bbox: &BoundingBox,
    shape: GridShape,
    rect: &QueryRect,
    cutoffs: &Cutoffs,
) -> i64 {
    let bounds = rect.world_bounds(bbox, shape);
    fork_join(points, cutoffs, &|chunk: &[GeoPoint]| sum_within(chunk, &bounds), &|a: i64, b: i64| a + b)
}

/// Inclusion-exclusion over four corners of the summed-area grid.
pub fn prefix_lookup(grid: &PrefixGrid, rect: &QueryRect) -> i64 {
    let ydim = grid.shape().ydim;
    let has_north = rect.north < ydim;
    let has_west = rect.west >= 2;

    let mut sum = grid.at(rect.south - 1, rect.east - 1);
    if has_north {
        sum -= grid.at(rect.north, rect.east - 1);
    }
    if has_west {
        sum -= grid.at(rect.south - 1, rect.west - 2);
    }
    if has_north && has_west {
        sum += grid.at(rect.north, rect.west - 2);
    }
    sum
}

/// How an index answers rectangle queries.
#[derive(Debug, Clone)]
pub enum QueryEngine {
    LinearScan,
    ParallelScan(Cutoffs),
    PrefixSum(PrefixGrid),
}

impl QueryEngine {
    pub fn name(&self) -> &'static str {
        match self {
            QueryEngine::LinearScan => "linear-scan",
            QueryEngine::ParallelScan(_) => "parallel-scan",
            QueryEngine::PrefixSum(_) => "prefix-sum",
        }
    }

    pub fn population(
        &self,
        points: &[GeoPoint],
        bbox: &BoundingBox,
        shape: GridShape,
        rect: &QueryRect,
    ) -> i64 {
        match self {
            QueryEngine::LinearScan => linear_scan(points, bbox, shape, rect),
            QueryEngine::ParallelScan(cutoffs) => parallel_scan(points, bbox, shape, rect, cutoffs),
            QueryEngine::PrefixSum(grid) => prefix_lookup(grid, rect),
        }
    }
}
