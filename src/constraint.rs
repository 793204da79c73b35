//! Constraints relating two expressions.
//!
//! Like [`crate::expr::Variable`], a [`Constraint`] is a clonable handle;
//! the dual value attached after a successful solve is visible through
//! every clone, including the one the caller kept when building the
//! problem.

use std::fmt;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};
use crate::expr::{Expr, Shape, Variable};

/// The relation between the two sides of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Left side equals right side.
    Eq,
    /// Left side is at most the right side.
    Le,
    /// Left side is at least the right side.
    Ge,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Eq => write!(f, "=="),
            Relation::Le => write!(f, "<="),
            Relation::Ge => write!(f, ">="),
        }
    }
}

#[derive(Debug)]
struct ConstraintInner {
    lhs: Expr,
    relation: Relation,
    rhs: Expr,
    shape: Shape,
    dual: RwLock<Option<Vec<f64>>>,
}

/// A constraint between two expressions.
#[derive(Debug, Clone)]
pub struct Constraint {
    inner: Arc<ConstraintInner>,
}

impl Constraint {
    /// Build a constraint, validating that the two sides broadcast
    /// together.
    pub fn new(lhs: impl Into<Expr>, relation: Relation, rhs: impl Into<Expr>) -> Result<Self> {
        let (lhs, rhs) = (lhs.into(), rhs.into());
        let shape = lhs
            .shape()
            .broadcast(&rhs.shape())
            .ok_or_else(|| Error::shape(lhs.shape(), rhs.shape()))?;
        Ok(Constraint {
            inner: Arc::new(ConstraintInner {
                lhs,
                relation,
                rhs,
                shape,
                dual: RwLock::new(None),
            }),
        })
    }

    /// The left-hand side.
    pub fn lhs(&self) -> &Expr {
        &self.inner.lhs
    }

    /// The relation tag.
    pub fn relation(&self) -> Relation {
        self.inner.relation
    }

    /// The right-hand side.
    pub fn rhs(&self) -> &Expr {
        &self.inner.rhs
    }

    /// The broadcast shape of the constraint (one canonical row per
    /// element).
    pub fn shape(&self) -> Shape {
        self.inner.shape
    }

    /// The dual value (Lagrange multiplier) attached by the most recent
    /// successful solve, one entry per constraint element.
    ///
    /// Inequality duals are reported with respect to the nonnegative
    /// residual form (`lhs - rhs >= 0` or `rhs - lhs >= 0`), so they are
    /// nonnegative at an optimum. `None` before the first solve, when the
    /// solve did not reach an optimum, or when the backend does not report
    /// duals.
    pub fn dual_value(&self) -> Option<Vec<f64>> {
        self.inner.dual.read().expect("constraint lock poisoned").clone()
    }

    /// The dual value of a scalar constraint.
    pub fn scalar_dual_value(&self) -> Option<f64> {
        self.dual_value().and_then(|d| d.first().copied())
    }

    pub(crate) fn set_dual(&self, dual: Vec<f64>) {
        *self.inner.dual.write().expect("constraint lock poisoned") = Some(dual);
    }

    pub(crate) fn clear_dual(&self) {
        *self.inner.dual.write().expect("constraint lock poisoned") = None;
    }

    /// Check if the constraint follows the DCP rules.
    ///
    /// Equalities need affine sides; `<=` needs convex <= concave;
    /// `>=` needs concave >= convex.
    pub fn is_dcp(&self) -> bool {
        let (l, r) = (&self.inner.lhs, &self.inner.rhs);
        match self.inner.relation {
            Relation::Eq => l.is_affine() && r.is_affine(),
            Relation::Le => l.is_convex() && r.is_concave(),
            Relation::Ge => l.is_concave() && r.is_convex(),
        }
    }

    /// All variables on either side, deduplicated and ordered by id.
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars = Vec::new();
        self.inner.lhs.collect_variables(&mut vars);
        self.inner.rhs.collect_variables(&mut vars);
        vars.sort_by_key(Variable::id);
        vars.dedup_by_key(|v| v.id());
        vars
    }
}

impl Expr {
    /// Constrain this expression to equal `rhs`.
    pub fn eq(&self, rhs: impl Into<Expr>) -> Result<Constraint> {
        Constraint::new(self.clone(), Relation::Eq, rhs)
    }

    /// Constrain this expression to be at most `rhs`.
    pub fn le(&self, rhs: impl Into<Expr>) -> Result<Constraint> {
        Constraint::new(self.clone(), Relation::Le, rhs)
    }

    /// Constrain this expression to be at least `rhs`.
    pub fn ge(&self, rhs: impl Into<Expr>) -> Result<Constraint> {
        Constraint::new(self.clone(), Relation::Ge, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{constant, norm2, sub, sum, Variable};

    #[test]
    fn shape_validation() {
        let x = Variable::vector(3);
        let y = Variable::vector(4);
        assert!(Constraint::new(&x, Relation::Eq, &y).is_err());

        let c = Constraint::new(&x, Relation::Ge, 2.0).unwrap();
        assert_eq!(c.shape(), Shape::vector(3));
    }

    #[test]
    fn clones_share_duals() {
        let x = Variable::scalar();
        let c = Expr::from(&x).ge(1.0).unwrap();
        let alias = c.clone();
        c.set_dual(vec![2.0]);
        assert_eq!(alias.scalar_dual_value(), Some(2.0));
        alias.clear_dual();
        assert_eq!(c.dual_value(), None);
    }

    #[test]
    fn dcp_rules() {
        let x = Variable::vector(3);

        // affine == affine
        assert!(sum(&x).eq(constant(1.0)).unwrap().is_dcp());
        // convex == affine is rejected
        assert!(!norm2(&x).eq(constant(1.0)).unwrap().is_dcp());
        // convex <= affine
        assert!(norm2(&x).le(constant(2.0)).unwrap().is_dcp());
        // convex >= affine is rejected
        assert!(!norm2(&x).ge(constant(2.0)).unwrap().is_dcp());
        // affine >= convex is rejected as well
        assert!(!sum(&x).ge(norm2(&x)).unwrap().is_dcp());
    }

    #[test]
    fn variables_from_both_sides() {
        let x = Variable::scalar();
        let y = Variable::scalar();
        let c = sub(&x, &y).unwrap().ge(&y).unwrap();
        assert_eq!(c.variables().len(), 2);
    }
}
