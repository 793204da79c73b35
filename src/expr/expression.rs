//! Core expression tree.
//!
//! Expressions form an immutable tree sharing children through `Arc`.
//! There is no operator overloading: nodes are built through the explicit
//! constructor functions in this module ([`add`], [`sub`], [`scale`],
//! [`norm`], ...), each of which validates shape compatibility up front
//! and fails with [`Error::Shape`] instead of deferring the problem to
//! solve time.

use std::sync::Arc;

use super::shape::Shape;
use super::variable::{VarId, Variable};
use crate::error::{Error, Result};

/// A constant value appearing in an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// A scalar constant.
    Scalar(f64),
    /// A vector constant.
    Vector(Vec<f64>),
}

impl ConstValue {
    /// Shape of the constant.
    pub fn shape(&self) -> Shape {
        match self {
            ConstValue::Scalar(_) => Shape::scalar(),
            ConstValue::Vector(v) => Shape::vector(v.len()),
        }
    }

}

impl From<f64> for ConstValue {
    fn from(v: f64) -> Self {
        ConstValue::Scalar(v)
    }
}

impl From<Vec<f64>> for ConstValue {
    fn from(v: Vec<f64>) -> Self {
        ConstValue::Vector(v)
    }
}

impl From<&[f64]> for ConstValue {
    fn from(v: &[f64]) -> Self {
        ConstValue::Vector(v.to_vec())
    }
}

/// The order of a vector norm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormOrder {
    /// Sum of absolute values.
    One,
    /// Euclidean norm.
    Two,
    /// Largest absolute value.
    Inf,
}

/// An algebraic expression over decision variables.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A decision variable.
    Var(Variable),
    /// A constant.
    Const(ConstValue),
    /// Negation.
    Neg(Arc<Expr>),
    /// Elementwise addition (scalar operands broadcast).
    Add(Arc<Expr>, Arc<Expr>),
    /// Multiplication by a scalar constant.
    Scale(f64, Arc<Expr>),
    /// Elementwise multiplication by a constant.
    MulElem(ConstValue, Arc<Expr>),
    /// Sum of all elements.
    Sum(Arc<Expr>),
    /// Elementwise square.
    Square(Arc<Expr>),
    /// Vector norm, reducing to a scalar.
    Norm(NormOrder, Arc<Expr>),
}

impl Expr {
    /// Shape of the expression.
    pub fn shape(&self) -> Shape {
        match self {
            Expr::Var(v) => v.shape(),
            Expr::Const(c) => c.shape(),
            Expr::Neg(a) | Expr::Scale(_, a) | Expr::Square(a) => a.shape(),
            // Validated at construction, so the unwrap cannot fire.
            Expr::Add(a, b) => a
                .shape()
                .broadcast(&b.shape())
                .expect("add node with incompatible shapes"),
            Expr::MulElem(c, a) => c
                .shape()
                .broadcast(&a.shape())
                .expect("mul_elem node with incompatible shapes"),
            Expr::Sum(_) | Expr::Norm(_, _) => Shape::scalar(),
        }
    }

    /// All variables appearing in this expression, deduplicated and
    /// ordered by id.
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars: Vec<Variable> = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort_by_key(Variable::id);
        vars.dedup_by_key(|v| v.id());
        vars
    }

    pub(crate) fn collect_variables(&self, vars: &mut Vec<Variable>) {
        match self {
            Expr::Var(v) => vars.push(v.clone()),
            Expr::Const(_) => {}
            Expr::Neg(a)
            | Expr::Scale(_, a)
            | Expr::MulElem(_, a)
            | Expr::Sum(a)
            | Expr::Square(a)
            | Expr::Norm(_, a) => a.collect_variables(vars),
            Expr::Add(a, b) => {
                a.collect_variables(vars);
                b.collect_variables(vars);
            }
        }
    }

    /// Check if this expression contains no variables.
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Var(_) => false,
            Expr::Const(_) => true,
            Expr::Neg(a)
            | Expr::Scale(_, a)
            | Expr::MulElem(_, a)
            | Expr::Sum(a)
            | Expr::Square(a)
            | Expr::Norm(_, a) => a.is_constant(),
            Expr::Add(a, b) => a.is_constant() && b.is_constant(),
        }
    }

    /// The id of the variable, if this expression is a bare variable.
    pub fn variable_id(&self) -> Option<VarId> {
        match self {
            Expr::Var(v) => Some(v.id()),
            _ => None,
        }
    }
}

impl From<Variable> for Expr {
    fn from(v: Variable) -> Self {
        Expr::Var(v)
    }
}

impl From<&Variable> for Expr {
    fn from(v: &Variable) -> Self {
        Expr::Var(v.clone())
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::Const(ConstValue::Scalar(v))
    }
}

impl From<&Expr> for Expr {
    fn from(e: &Expr) -> Self {
        e.clone()
    }
}

// ============================================================================
// Constructor functions
// ============================================================================

/// Create a scalar constant.
pub fn constant(value: f64) -> Expr {
    Expr::Const(ConstValue::Scalar(value))
}

/// Create a vector constant.
pub fn constant_vec(values: impl Into<Vec<f64>>) -> Expr {
    Expr::Const(ConstValue::Vector(values.into()))
}

/// Elementwise sum of two expressions.
///
/// Fails with a shape error unless the shapes broadcast together.
pub fn add(a: impl Into<Expr>, b: impl Into<Expr>) -> Result<Expr> {
    let (a, b) = (a.into(), b.into());
    match a.shape().broadcast(&b.shape()) {
        Some(_) => Ok(Expr::Add(Arc::new(a), Arc::new(b))),
        None => Err(Error::shape(a.shape(), b.shape())),
    }
}

/// Elementwise difference of two expressions.
pub fn sub(a: impl Into<Expr>, b: impl Into<Expr>) -> Result<Expr> {
    let b = b.into();
    add(a, neg(b))
}

/// Negation of an expression.
pub fn neg(a: impl Into<Expr>) -> Expr {
    Expr::Neg(Arc::new(a.into()))
}

/// Multiply an expression by a scalar constant.
pub fn scale(factor: f64, a: impl Into<Expr>) -> Expr {
    Expr::Scale(factor, Arc::new(a.into()))
}

/// Elementwise multiplication by a constant.
///
/// Fails with a shape error unless the constant and the expression
/// broadcast together.
pub fn mul_elem(coeffs: impl Into<ConstValue>, a: impl Into<Expr>) -> Result<Expr> {
    let (coeffs, a) = (coeffs.into(), a.into());
    match coeffs.shape().broadcast(&a.shape()) {
        Some(_) => Ok(Expr::MulElem(coeffs, Arc::new(a))),
        None => Err(Error::shape(a.shape(), coeffs.shape())),
    }
}

/// Sum of all elements of an expression.
pub fn sum(a: impl Into<Expr>) -> Expr {
    Expr::Sum(Arc::new(a.into()))
}

/// Elementwise square of an expression.
pub fn square(a: impl Into<Expr>) -> Expr {
    Expr::Square(Arc::new(a.into()))
}

/// Norm of an expression, reducing to a scalar.
pub fn norm(a: impl Into<Expr>, order: NormOrder) -> Expr {
    Expr::Norm(order, Arc::new(a.into()))
}

/// L1 norm: sum of absolute values.
pub fn norm1(a: impl Into<Expr>) -> Expr {
    norm(a, NormOrder::One)
}

/// L2 (Euclidean) norm.
pub fn norm2(a: impl Into<Expr>) -> Expr {
    norm(a, NormOrder::Two)
}

/// Infinity norm: largest absolute value.
pub fn norm_inf(a: impl Into<Expr>) -> Expr {
    norm(a, NormOrder::Inf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_checks_shapes() {
        let x = Variable::vector(3);
        let y = Variable::vector(4);
        assert!(add(&x, &y).is_err());
        assert!(add(&x, 1.0).is_ok());
        assert!(add(&x, &Variable::vector(3)).is_ok());
    }

    #[test]
    fn mul_elem_checks_shapes() {
        let x = Variable::vector(3);
        assert!(mul_elem(vec![1.0, 2.0, 3.0], &x).is_ok());
        assert!(mul_elem(vec![1.0, 2.0], &x).is_err());
        assert!(mul_elem(2.0, &x).is_ok());
    }

    #[test]
    fn shapes_propagate() {
        let x = Variable::vector(3);
        let e = add(&x, 1.0).unwrap();
        assert_eq!(e.shape(), Shape::vector(3));
        assert_eq!(sum(e.clone()).shape(), Shape::scalar());
        assert_eq!(norm2(&x).shape(), Shape::scalar());
        assert_eq!(square(e).shape(), Shape::vector(3));
    }

    #[test]
    fn variables_deduplicated() {
        let x = Variable::vector(2);
        let y = Variable::scalar();
        let e = add(add(&x, &y).unwrap(), norm2(&x)).unwrap();
        let vars = e.variables();
        assert_eq!(vars.len(), 2);
        assert!(vars.contains(&x));
        assert!(vars.contains(&y));
    }

    #[test]
    fn constant_detection() {
        let e = add(constant(1.0), constant_vec(vec![1.0, 2.0])).unwrap();
        assert!(e.is_constant());
        let x = Variable::scalar();
        assert!(!add(e, &x).unwrap().is_constant());
    }
}
