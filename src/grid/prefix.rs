use ndarray::Array2;

/// In-place summed-area transform.
///
/// Rows go north to south (`ydim-1` down to 0), columns west to east, so
/// the cell to the left, the one above and the diagonal are already final
/// when a cell is visited. Any other order gives wrong totals.
pub(crate) fn summed_area_in_place(cells: &mut Array2<i64>) {
    let (ydim, xdim) = cells.dim();
    for j in (0..ydim).rev() {
        for i in 0..xdim {
            let mut v = cells[[j, i]];
            if i >= 1 {
                v += cells[[j, i - 1]];
            }
            if j + 1 < ydim {
                v += cells[[j + 1, i]];
            }
            if i >= 1 && j + 1 < ydim {
                v -= cells[[j + 1, i - 1]];
            }
            cells[[j, i]] = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn two_by_two() {
        let mut g = arr2(&[[10, 50], [0, 30]]);
        summed_area_in_place(&mut g);
        assert_eq!(g, arr2(&[[10, 90], [0, 30]]));
    }

    #[test]
    fn matches_brute_force() {
        let raw = arr2(&[[1, 2, 3, 4], [5, 6, 7, 8], [9, 10, 11, 12]]);
        let mut g = raw.clone();
        summed_area_in_place(&mut g);
        let (ydim, xdim) = raw.dim();
        for j in 0..ydim {
            for i in 0..xdim {
                let mut expect = 0;
                for r in j..ydim {
                    for c in 0..=i {
                        expect += raw[[r, c]];
                    }
                }
                assert_eq!(g[[j, i]], expect, "cell ({j},{i})");
            }
        }
    }

    #[test]
    fn single_row_and_column() {
        let mut row = arr2(&[[3, 0, 4]]);
        summed_area_in_place(&mut row);
        assert_eq!(row, arr2(&[[3, 3, 7]]));

        let mut col = arr2(&[[1], [2], [3]]);
        summed_area_in_place(&mut col);
        assert_eq!(col, arr2(&[[6], [5], [3]]));
    }
}
