use crate::error::{PopulationError, Result};

pub const DEFAULT_POINT_CUTOFF: usize = 20;
pub const DEFAULT_GRID_CUTOFF: usize = 400;

/// When recursive splitting stops and a task does its share sequentially.
///
/// `points` bounds the index-range recursion shared by the bounding box,
/// both grid builders and the parallel scan; `cells` bounds the quadrant
/// recursion of the grid merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoffs {
    pub points: usize,
    pub cells: usize,
}

impl Cutoffs {
    pub fn new(points: usize, cells: usize) -> Result<Self> {
        if points == 0 || cells == 0 {
            return Err(PopulationError::InvalidCutoff { points, cells });
        }
        Ok(Self { points, cells })
    }

    /// A range of `len` items is done sequentially below the cutoff.
    /// Singletons never split, so a cutoff of 1 still terminates.
    #[inline]
    pub fn is_leaf_range(&self, len: usize) -> bool {
        len < self.points || len <= 1
    }

    #[inline]
    pub fn is_leaf_block(&self, rows: usize, cols: usize) -> bool {
        rows * cols < self.cells || (rows <= 1 && cols <= 1)
    }
}

impl Default for Cutoffs {
    fn default() -> Self {
        Self {
            points: DEFAULT_POINT_CUTOFF,
            cells: DEFAULT_GRID_CUTOFF,
        }
    }
}

/// Fork-join reduction over a slice.
///
/// Splits at the midpoint until `cutoffs` says the range is small enough,
/// runs `leaf` on it, and folds sibling results with `combine` once both
/// halves have finished. `combine` must be associative; the split points
/// then never show up in the result.
pub fn fork_join<T, R, L, C>(items: &[T], cutoffs: &Cutoffs, leaf: &L, combine: &C) -> R
where
    T: Sync,
    R: Send,
    L: Fn(&[T]) -> R + Sync,
    C: Fn(R, R) -> R + Sync,
{
    if cutoffs.is_leaf_range(items.len()) {
        return leaf(items);
    }
    let (lo, hi) = items.split_at(items.len() / 2);
    let (left, right) = rayon::join(
        || fork_join(lo, cutoffs, leaf, combine),
        || fork_join(hi, cutoffs, leaf, combine),
    );
    combine(left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_cutoff_is_rejected() {
        assert!(matches!(
            Cutoffs::new(0, 4),
            Err(PopulationError::InvalidCutoff { points: 0, cells: 4 })
        ));
        assert!(Cutoffs::new(3, 0).is_err());
        assert!(Cutoffs::new(1, 1).is_ok());
    }

    #[test]
    fn sum_is_independent_of_cutoff() {
        let items: Vec<i64> = (1..=1000).collect();
        for points in [1, 2, 7, 20, 5000] {
            let cutoffs = Cutoffs::new(points, 1).unwrap();
            let total = fork_join(&items, &cutoffs, &|c: &[i64]| c.iter().sum::<i64>(), &|a: i64, b: i64| a + b);
            assert_eq!(total, 500_500, "points cutoff {points}");
        }
    }

    #[test]
    fn empty_input_reaches_leaf_once() {
        let items: [u8; 0] = [];
        let calls = fork_join(&items, &Cutoffs::default(), &|_c: &[u8]| 1usize, &|a: usize, b: usize| a + b);
        assert_eq!(calls, 1);
    }

    #[test]
    fn leaf_count_tracks_cutoff() {
        let items = vec![0u8; 64];
        let cutoffs = Cutoffs::new(9, 1).unwrap();
        // 64 -> 32 -> 16 -> 8: eight leaves of eight
        let leaves = fork_join(&items, &cutoffs, &|_c: &[u8]| 1usize, &|a: usize, b: usize| a + b);
        assert_eq!(leaves, 8);
    }
}
