//! Small CSC matrix helpers used by the canonicalizer.

use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Build a CSC matrix from (row, col, value) triplets.
///
/// Duplicate entries are summed. Out-of-range triplets would be a
/// canonicalizer bug, so they panic via `CooMatrix::push`.
pub fn from_triplets(nrows: usize, ncols: usize, triplets: &[(usize, usize, f64)]) -> CscMatrix<f64> {
    if triplets.is_empty() {
        return CscMatrix::zeros(nrows, ncols);
    }
    let mut coo = CooMatrix::new(nrows, ncols);
    for &(r, c, v) in triplets {
        coo.push(r, c, v);
    }
    CscMatrix::from(&coo)
}

/// Collect the triplets of a CSC matrix.
pub fn triplets(m: &CscMatrix<f64>) -> Vec<(usize, usize, f64)> {
    m.triplet_iter().map(|(r, c, v)| (r, c, *v)).collect()
}

/// Sum of two CSC matrices of equal dimensions.
pub fn add(a: &CscMatrix<f64>, b: &CscMatrix<f64>) -> CscMatrix<f64> {
    let mut t = triplets(a);
    t.extend(triplets(b));
    from_triplets(a.nrows(), a.ncols(), &t)
}

/// Scale every entry of a CSC matrix.
pub fn scale(m: &CscMatrix<f64>, factor: f64) -> CscMatrix<f64> {
    map_values(m, |v| v * factor)
}

/// Scale row `r` of the matrix by `weights[r]`.
pub fn row_scale(m: &CscMatrix<f64>, weights: &[f64]) -> CscMatrix<f64> {
    let t: Vec<_> = m
        .triplet_iter()
        .map(|(r, c, v)| (r, c, v * weights[r]))
        .collect();
    from_triplets(m.nrows(), m.ncols(), &t)
}

/// Tile the rows of a matrix `times` times.
pub fn repeat_rows(m: &CscMatrix<f64>, times: usize) -> CscMatrix<f64> {
    let mut t = Vec::with_capacity(m.nnz() * times);
    for (r, c, v) in m.triplet_iter() {
        for k in 0..times {
            t.push((k * m.nrows() + r, c, *v));
        }
    }
    from_triplets(m.nrows() * times, m.ncols(), &t)
}

/// Extract a single row as a 1 x ncols matrix.
pub fn select_row(m: &CscMatrix<f64>, row: usize) -> CscMatrix<f64> {
    let t: Vec<_> = m
        .triplet_iter()
        .filter(|(r, _, _)| *r == row)
        .map(|(_, c, v)| (0, c, *v))
        .collect();
    from_triplets(1, m.ncols(), &t)
}

/// Stack two CSC matrices vertically. Column counts must agree.
pub fn vstack(a: &CscMatrix<f64>, b: &CscMatrix<f64>) -> CscMatrix<f64> {
    debug_assert_eq!(a.ncols(), b.ncols());
    let mut t = triplets(a);
    for (r, c, v) in b.triplet_iter() {
        t.push((a.nrows() + r, c, *v));
    }
    from_triplets(a.nrows() + b.nrows(), a.ncols(), &t)
}

/// Column sums, i.e. the 1 x ncols product of an all-ones row with `m`.
pub fn col_sums(m: &CscMatrix<f64>) -> Vec<f64> {
    let mut sums = vec![0.0; m.ncols()];
    for (_, c, v) in m.triplet_iter() {
        sums[c] += *v;
    }
    sums
}

fn map_values(m: &CscMatrix<f64>, f: impl Fn(f64) -> f64) -> CscMatrix<f64> {
    let values: Vec<f64> = m.values().iter().map(|&v| f(v)).collect();
    CscMatrix::try_from_csc_data(
        m.nrows(),
        m.ncols(),
        m.col_offsets().to_vec(),
        m.row_indices().to_vec(),
        values,
    )
    .expect("pattern unchanged")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense(m: &CscMatrix<f64>) -> Vec<Vec<f64>> {
        let mut out = vec![vec![0.0; m.ncols()]; m.nrows()];
        for (r, c, v) in m.triplet_iter() {
            out[r][c] += *v;
        }
        out
    }

    #[test]
    fn triplets_roundtrip_and_duplicates_sum() {
        let m = from_triplets(2, 2, &[(0, 0, 1.0), (0, 0, 2.0), (1, 1, 5.0)]);
        assert_eq!(dense(&m), vec![vec![3.0, 0.0], vec![0.0, 5.0]]);
    }

    #[test]
    fn add_and_scale() {
        let a = from_triplets(2, 2, &[(0, 0, 1.0), (1, 0, 2.0)]);
        let b = from_triplets(2, 2, &[(0, 0, 1.0), (0, 1, 4.0)]);
        assert_eq!(dense(&add(&a, &b)), vec![vec![2.0, 4.0], vec![2.0, 0.0]]);
        assert_eq!(dense(&scale(&a, -2.0)), vec![vec![-2.0, 0.0], vec![-4.0, 0.0]]);
    }

    #[test]
    fn row_operations() {
        let m = from_triplets(2, 2, &[(0, 0, 1.0), (1, 1, 2.0)]);
        assert_eq!(
            dense(&row_scale(&m, &[3.0, -1.0])),
            vec![vec![3.0, 0.0], vec![0.0, -2.0]]
        );
        assert_eq!(dense(&select_row(&m, 1)), vec![vec![0.0, 2.0]]);
        let tiled = repeat_rows(&select_row(&m, 0), 3);
        assert_eq!(tiled.nrows(), 3);
        assert_eq!(dense(&tiled)[2], vec![1.0, 0.0]);
    }

    #[test]
    fn column_sums() {
        let m = from_triplets(3, 2, &[(0, 0, 1.0), (1, 0, 2.0), (2, 1, -1.0)]);
        assert_eq!(col_sums(&m), vec![3.0, -1.0]);
    }

    #[test]
    fn empty_matrix() {
        let m = from_triplets(0, 4, &[]);
        assert_eq!(m.nrows(), 0);
        assert_eq!(m.ncols(), 4);
    }
}
