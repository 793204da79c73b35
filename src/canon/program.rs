//! Canonical conic data handed to solver backends.
//!
//! Two equivalent packagings exist, matching the two calling conventions
//! found among conic solvers:
//!
//! - [`SplitData`]: equalities as `A x = b`, cone rows as `h - G x ∈ K`.
//! - [`UnifiedData`]: one stacked system `M x + s = rhs` with
//!   `s ∈ {0} ⊕ K`, zero-cone rows first.
//!
//! [`ConeDims`] describes the cone membership of the rows in both forms.

use nalgebra_sparse::CscMatrix;

/// Row counts per cone.
///
/// The exponential and semidefinite slots are carried for completeness of
/// the descriptor; no atom in this crate currently produces them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConeDims {
    /// Rows pinned to zero (equality constraints).
    pub zero: usize,
    /// Rows in the nonnegative orthant.
    pub nonneg: usize,
    /// Dimension of each second-order cone block.
    pub soc: Vec<usize>,
    /// Number of exponential cones (three rows each).
    pub exp: usize,
    /// Side length of each semidefinite block.
    pub psd: Vec<usize>,
}

impl ConeDims {
    /// Number of rows outside the zero cone.
    pub fn cone_rows(&self) -> usize {
        self.nonneg
            + self.soc.iter().sum::<usize>()
            + 3 * self.exp
            + self.psd.iter().map(|n| n * (n + 1) / 2).sum::<usize>()
    }

    /// Total number of constraint rows.
    pub fn total_rows(&self) -> usize {
        self.zero + self.cone_rows()
    }
}

/// Canonical data in split form: `min cᵀx  s.t.  A x = b,  h - G x ∈ K`.
#[derive(Debug, Clone)]
pub struct SplitData {
    /// Linear objective coefficients.
    pub c: Vec<f64>,
    /// Equality constraint matrix.
    pub a: CscMatrix<f64>,
    /// Equality right-hand side.
    pub b: Vec<f64>,
    /// Cone constraint matrix.
    pub g: CscMatrix<f64>,
    /// Cone right-hand side.
    pub h: Vec<f64>,
    /// Cone membership of the rows of `g` (and the `zero` count of `a`).
    pub dims: ConeDims,
    /// Constant objective offset.
    pub offset: f64,
}

/// Canonical data in unified form: `min cᵀx  s.t.  M x + s = rhs`,
/// `s ∈ {0}^zero ⊕ K`, rows ordered zero / nonnegative / second-order.
#[derive(Debug, Clone)]
pub struct UnifiedData {
    /// Linear objective coefficients.
    pub c: Vec<f64>,
    /// Stacked constraint matrix.
    pub mat: CscMatrix<f64>,
    /// Stacked right-hand side.
    pub rhs: Vec<f64>,
    /// Cone membership of the rows.
    pub dims: ConeDims,
    /// Constant objective offset.
    pub offset: f64,
}

/// Canonical data in whichever form the target solver consumes.
#[derive(Debug, Clone)]
pub enum ProblemData {
    /// Split matrices for backends expecting `(c, A, b, G, h, dims)`.
    Split(SplitData),
    /// A single stacked bundle for backends expecting `(data, dims)`.
    Unified(UnifiedData),
}

impl ProblemData {
    /// Cone dimensions of the canonical data.
    pub fn dims(&self) -> &ConeDims {
        match self {
            ProblemData::Split(d) => &d.dims,
            ProblemData::Unified(d) => &d.dims,
        }
    }

    /// Number of optimization variables (original plus auxiliary).
    pub fn num_vars(&self) -> usize {
        match self {
            ProblemData::Split(d) => d.c.len(),
            ProblemData::Unified(d) => d.c.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_accounting() {
        let dims = ConeDims {
            zero: 2,
            nonneg: 3,
            soc: vec![3, 4],
            exp: 0,
            psd: vec![],
        };
        assert_eq!(dims.cone_rows(), 10);
        assert_eq!(dims.total_rows(), 12);
    }

    #[test]
    fn unused_cone_slots_count_rows() {
        let dims = ConeDims {
            zero: 0,
            nonneg: 1,
            soc: vec![],
            exp: 2,
            psd: vec![2],
        };
        assert_eq!(dims.cone_rows(), 1 + 6 + 3);
    }
}
