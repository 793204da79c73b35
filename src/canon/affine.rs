//! Flattened affine expressions.
//!
//! After lowering, every (sub)expression is a sum of sparse coefficient
//! blocks, one per variable, plus a constant offset:
//! `expr = sum_i(C_i * v_i) + d`. Coefficient blocks have one row per
//! output element and one column per variable element. Variables are
//! keyed in a `BTreeMap` so every iteration order, and therefore every
//! matrix the canonicalizer emits, is deterministic.

use std::collections::BTreeMap;

use nalgebra::DVector;
use nalgebra_sparse::CscMatrix;

use crate::expr::{Shape, VarId};
use crate::sparse;

/// An affine expression in flattened form.
#[derive(Debug, Clone)]
pub struct AffineExpr {
    /// Coefficient block per variable, shape (size x var_size).
    pub terms: BTreeMap<VarId, CscMatrix<f64>>,
    /// Constant offset, one entry per output element.
    pub constant: DVector<f64>,
    /// Output shape.
    pub shape: Shape,
}

impl AffineExpr {
    /// A single variable with identity coefficients.
    pub fn variable(id: VarId, shape: Shape) -> Self {
        let size = shape.size();
        let mut terms = BTreeMap::new();
        terms.insert(id, CscMatrix::identity(size));
        AffineExpr {
            terms,
            constant: DVector::zeros(size),
            shape,
        }
    }

    /// A constant expression.
    pub fn constant(values: Vec<f64>, shape: Shape) -> Self {
        debug_assert_eq!(values.len(), shape.size());
        AffineExpr {
            terms: BTreeMap::new(),
            constant: DVector::from_vec(values),
            shape,
        }
    }

    /// A scalar constant.
    pub fn scalar(value: f64) -> Self {
        AffineExpr::constant(vec![value], Shape::scalar())
    }

    /// Number of output elements.
    pub fn size(&self) -> usize {
        self.shape.size()
    }

    /// Check if the expression holds no variables.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Sum of two affine expressions, broadcasting a scalar operand.
    pub fn add(&self, other: &AffineExpr) -> AffineExpr {
        if self.size() != other.size() {
            // One side must be scalar; validated when the tree was built.
            return if self.size() == 1 {
                self.broadcast_to(other.size()).add(other)
            } else {
                self.add(&other.broadcast_to(self.size()))
            };
        }

        let mut terms = self.terms.clone();
        for (id, block) in &other.terms {
            terms
                .entry(*id)
                .and_modify(|existing| *existing = sparse::add(existing, block))
                .or_insert_with(|| block.clone());
        }
        AffineExpr {
            terms,
            constant: &self.constant + &other.constant,
            shape: self.shape,
        }
    }

    /// Difference of two affine expressions.
    pub fn sub(&self, other: &AffineExpr) -> AffineExpr {
        self.add(&other.neg())
    }

    /// Negation.
    pub fn neg(&self) -> AffineExpr {
        self.scale(-1.0)
    }

    /// Multiply by a scalar.
    pub fn scale(&self, factor: f64) -> AffineExpr {
        AffineExpr {
            terms: self
                .terms
                .iter()
                .map(|(id, block)| (*id, sparse::scale(block, factor)))
                .collect(),
            constant: &self.constant * factor,
            shape: self.shape,
        }
    }

    /// Elementwise multiply by a weight vector (one weight per row).
    pub fn elem_scale(&self, weights: &[f64]) -> AffineExpr {
        debug_assert_eq!(weights.len(), self.size());
        AffineExpr {
            terms: self
                .terms
                .iter()
                .map(|(id, block)| (*id, sparse::row_scale(block, weights)))
                .collect(),
            constant: DVector::from_iterator(
                self.size(),
                self.constant.iter().zip(weights).map(|(c, w)| c * w),
            ),
            shape: self.shape,
        }
    }

    /// Sum all elements into a scalar expression.
    pub fn sum(&self) -> AffineExpr {
        let terms = self
            .terms
            .iter()
            .map(|(id, block)| {
                let sums = sparse::col_sums(block);
                let t: Vec<_> = sums
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| **v != 0.0)
                    .map(|(c, v)| (0, c, *v))
                    .collect();
                (*id, sparse::from_triplets(1, block.ncols(), &t))
            })
            .collect();
        AffineExpr {
            terms,
            constant: DVector::from_element(1, self.constant.sum()),
            shape: Shape::scalar(),
        }
    }

    /// Extract a single element as a scalar expression.
    pub fn row(&self, index: usize) -> AffineExpr {
        AffineExpr {
            terms: self
                .terms
                .iter()
                .map(|(id, block)| (*id, sparse::select_row(block, index)))
                .collect(),
            constant: DVector::from_element(1, self.constant[index]),
            shape: Shape::scalar(),
        }
    }

    /// Broadcast a scalar expression to `n` identical rows.
    pub fn broadcast_to(&self, n: usize) -> AffineExpr {
        debug_assert_eq!(self.size(), 1);
        AffineExpr {
            terms: self
                .terms
                .iter()
                .map(|(id, block)| (*id, sparse::repeat_rows(block, n)))
                .collect(),
            constant: DVector::from_element(n, self.constant[0]),
            shape: Shape::vector(n),
        }
    }

    /// Stack expressions vertically into one vector-shaped expression.
    pub fn vstack(parts: &[AffineExpr]) -> AffineExpr {
        let total: usize = parts.iter().map(AffineExpr::size).sum();
        let mut stacked: BTreeMap<VarId, Vec<(usize, usize, f64)>> = BTreeMap::new();
        let mut widths: BTreeMap<VarId, usize> = BTreeMap::new();
        let mut constant = DVector::zeros(total);

        let mut offset = 0;
        for part in parts {
            for (id, block) in &part.terms {
                widths.insert(*id, block.ncols());
                let entry = stacked.entry(*id).or_default();
                for (r, c, v) in block.triplet_iter() {
                    entry.push((offset + r, c, *v));
                }
            }
            constant
                .rows_mut(offset, part.size())
                .copy_from(&part.constant);
            offset += part.size();
        }

        AffineExpr {
            terms: stacked
                .into_iter()
                .map(|(id, t)| (id, sparse::from_triplets(total, widths[&id], &t)))
                .collect(),
            constant,
            shape: Shape::vector(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Variable;

    fn entry(e: &AffineExpr, id: VarId, r: usize, c: usize) -> f64 {
        e.terms[&id]
            .triplet_iter()
            .filter(|(tr, tc, _)| *tr == r && *tc == c)
            .map(|(_, _, v)| *v)
            .sum()
    }

    #[test]
    fn variable_is_identity() {
        let x = Variable::vector(3);
        let e = AffineExpr::variable(x.id(), x.shape());
        assert_eq!(e.size(), 3);
        assert_eq!(entry(&e, x.id(), 1, 1), 1.0);
        assert_eq!(entry(&e, x.id(), 1, 0), 0.0);
    }

    #[test]
    fn add_merges_terms() {
        let x = Variable::vector(2);
        let e = AffineExpr::variable(x.id(), x.shape());
        let doubled = e.add(&e);
        assert_eq!(entry(&doubled, x.id(), 0, 0), 2.0);
        assert_eq!(doubled.constant[0], 0.0);
    }

    #[test]
    fn add_broadcasts_scalar() {
        let x = Variable::vector(3);
        let e = AffineExpr::variable(x.id(), x.shape());
        let shifted = e.add(&AffineExpr::scalar(2.0));
        assert_eq!(shifted.size(), 3);
        assert_eq!(shifted.constant[2], 2.0);
        assert_eq!(entry(&shifted, x.id(), 2, 2), 1.0);
    }

    #[test]
    fn sum_collapses_rows() {
        let x = Variable::vector(3);
        let e = AffineExpr::variable(x.id(), x.shape())
            .add(&AffineExpr::constant(vec![1.0, 2.0, 3.0], Shape::vector(3)));
        let s = e.sum();
        assert_eq!(s.size(), 1);
        assert_eq!(s.constant[0], 6.0);
        assert_eq!(entry(&s, x.id(), 0, 1), 1.0);
    }

    #[test]
    fn elem_scale_weights_rows() {
        let x = Variable::vector(2);
        let e = AffineExpr::variable(x.id(), x.shape()).elem_scale(&[2.0, -3.0]);
        assert_eq!(entry(&e, x.id(), 0, 0), 2.0);
        assert_eq!(entry(&e, x.id(), 1, 1), -3.0);
    }

    #[test]
    fn vstack_offsets_rows() {
        let x = Variable::scalar();
        let y = Variable::vector(2);
        let ex = AffineExpr::variable(x.id(), x.shape());
        let ey = AffineExpr::variable(y.id(), y.shape());
        let stacked = AffineExpr::vstack(&[ex, ey.scale(2.0)]);
        assert_eq!(stacked.size(), 3);
        assert_eq!(entry(&stacked, x.id(), 0, 0), 1.0);
        assert_eq!(entry(&stacked, y.id(), 1, 0), 2.0);
        assert_eq!(entry(&stacked, y.id(), 2, 1), 2.0);
    }

    #[test]
    fn row_extracts_scalar() {
        let x = Variable::vector(3);
        let e = AffineExpr::variable(x.id(), x.shape())
            .add(&AffineExpr::constant(vec![5.0, 6.0, 7.0], Shape::vector(3)));
        let r = e.row(1);
        assert_eq!(r.size(), 1);
        assert_eq!(r.constant[0], 6.0);
        assert_eq!(entry(&r, x.id(), 0, 1), 1.0);
    }
}
