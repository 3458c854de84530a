use ndarray::{ArrayView2, ArrayViewMut2, Axis, Zip};

use crate::parallel::Cutoffs;

/// Element-wise `dst += src`, split into quadrants until a block drops
/// below the cell cutoff. The four quadrants are disjoint views, so they
/// are added concurrently without locking.
pub fn merge_into(dst: ArrayViewMut2<'_, i64>, src: ArrayView2<'_, i64>, cutoffs: &Cutoffs) {
    debug_assert_eq!(dst.dim(), src.dim());
    let (rows, cols) = dst.dim();
    if cutoffs.is_leaf_block(rows, cols) {
        Zip::from(dst).and(src).for_each(|d, &s| *d += s);
        return;
    }

    let (rmid, cmid) = (rows / 2, cols / 2);
    let (south, north) = dst.split_at(Axis(0), rmid);
    let (sw, se) = south.split_at(Axis(1), cmid);
    let (nw, ne) = north.split_at(Axis(1), cmid);

    let (src_south, src_north) = src.split_at(Axis(0), rmid);
    let (src_sw, src_se) = src_south.split_at(Axis(1), cmid);
    let (src_nw, src_ne) = src_north.split_at(Axis(1), cmid);

    rayon::join(
        || {
            rayon::join(
                || merge_into(sw, src_sw, cutoffs),
                || merge_into(se, src_se, cutoffs),
            )
        },
        || {
            rayon::join(
                || merge_into(nw, src_nw, cutoffs),
                || merge_into(ne, src_ne, cutoffs),
            )
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn ramp(rows: usize, cols: usize, k: i64) -> Array2<i64> {
        Array2::from_shape_fn((rows, cols), |(r, c)| (r * cols + c) as i64 * k)
    }

    #[test]
    fn merge_matches_plain_addition() {
        for (rows, cols) in [(1, 1), (1, 9), (7, 1), (5, 8), (33, 17)] {
            for cells in [1, 2, 4, 400] {
                let cutoffs = Cutoffs::new(1, cells).unwrap();
                let mut dst = ramp(rows, cols, 1);
                let src = ramp(rows, cols, 3);
                merge_into(dst.view_mut(), src.view(), &cutoffs);
                assert_eq!(dst, ramp(rows, cols, 4), "{rows}x{cols} cutoff {cells}");
            }
        }
    }
}
