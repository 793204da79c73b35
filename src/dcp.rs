//! Curvature tracking for disciplined convex programming.
//!
//! Every atom has a known curvature as a function of its argument's
//! curvature; the rules below compose them bottom-up. Nonlinear atoms are
//! classified only over affine arguments; compositions like `norm2(norm2(x))`
//! come out `Unknown` and are rejected, which keeps the canonicalizer's
//! epigraph reformulations exact.

use crate::expr::{ConstValue, Expr};

/// Curvature of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curvature {
    /// No variables at all.
    Constant,
    /// Affine in the variables (both convex and concave).
    Affine,
    /// Convex.
    Convex,
    /// Concave.
    Concave,
    /// Not classifiable under the DCP rules.
    Unknown,
}

impl Curvature {
    /// Convex in the wide sense (constant, affine, or convex).
    pub fn is_convex(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine | Curvature::Convex)
    }

    /// Concave in the wide sense (constant, affine, or concave).
    pub fn is_concave(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine | Curvature::Concave)
    }

    /// Affine (constant or affine).
    pub fn is_affine(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine)
    }

    /// Curvature of the negated expression.
    pub fn negate(self) -> Self {
        match self {
            Curvature::Convex => Curvature::Concave,
            Curvature::Concave => Curvature::Convex,
            other => other,
        }
    }
}

/// Curvature of a sum.
fn add_curvature(a: Curvature, b: Curvature) -> Curvature {
    use Curvature::*;
    match (a, b) {
        (Constant, x) | (x, Constant) => x,
        (Affine, Affine) => Affine,
        (Affine, x) | (x, Affine) => x,
        (Convex, Convex) => Convex,
        (Concave, Concave) => Concave,
        _ => Unknown,
    }
}

/// Curvature of `factor * expr`.
fn scale_curvature(factor: f64, c: Curvature) -> Curvature {
    if factor == 0.0 {
        Curvature::Constant
    } else if factor > 0.0 {
        c
    } else {
        c.negate()
    }
}

/// Curvature of an elementwise multiply by a constant.
///
/// All-nonnegative coefficients preserve curvature, all-nonpositive flip
/// it; mixed signs only preserve affineness.
fn elem_mul_curvature(coeffs: &ConstValue, c: Curvature) -> Curvature {
    let (nonneg, nonpos) = match coeffs {
        ConstValue::Scalar(v) => (*v >= 0.0, *v <= 0.0),
        ConstValue::Vector(v) => (
            v.iter().all(|&x| x >= 0.0),
            v.iter().all(|&x| x <= 0.0),
        ),
    };
    if nonneg {
        c
    } else if nonpos {
        c.negate()
    } else if c.is_affine() {
        c
    } else {
        Curvature::Unknown
    }
}

impl Expr {
    /// The curvature of this expression under the DCP rules.
    pub fn curvature(&self) -> Curvature {
        match self {
            Expr::Var(_) => Curvature::Affine,
            Expr::Const(_) => Curvature::Constant,
            Expr::Neg(a) => a.curvature().negate(),
            Expr::Add(a, b) => add_curvature(a.curvature(), b.curvature()),
            Expr::Scale(k, a) => scale_curvature(*k, a.curvature()),
            Expr::MulElem(c, a) => elem_mul_curvature(c, a.curvature()),
            Expr::Sum(a) => a.curvature(),
            Expr::Square(a) | Expr::Norm(_, a) => match a.curvature() {
                Curvature::Constant => Curvature::Constant,
                c if c.is_affine() => Curvature::Convex,
                _ => Curvature::Unknown,
            },
        }
    }

    /// Check if the expression is affine.
    pub fn is_affine(&self) -> bool {
        self.curvature().is_affine()
    }

    /// Check if the expression is convex.
    pub fn is_convex(&self) -> bool {
        self.curvature().is_convex()
    }

    /// Check if the expression is concave.
    pub fn is_concave(&self) -> bool {
        self.curvature().is_concave()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, constant, neg, norm2, scale, square, sub, sum, Variable};

    #[test]
    fn leaves() {
        let x = Variable::vector(2);
        assert_eq!(Expr::from(&x).curvature(), Curvature::Affine);
        assert_eq!(constant(3.0).curvature(), Curvature::Constant);
    }

    #[test]
    fn affine_combinations_stay_affine() {
        let x = Variable::vector(2);
        let y = Variable::vector(2);
        let e = sub(scale(2.0, &x), &y).unwrap();
        assert!(e.is_affine());
        assert!(sum(e).is_affine());
    }

    #[test]
    fn norms_of_affine_are_convex() {
        let x = Variable::vector(3);
        let e = norm2(sub(&x, constant(1.0)).unwrap());
        assert_eq!(e.curvature(), Curvature::Convex);
        assert!(!e.is_concave());
    }

    #[test]
    fn negated_convex_is_concave() {
        let x = Variable::vector(3);
        assert_eq!(neg(norm2(&x)).curvature(), Curvature::Concave);
        assert_eq!(scale(-1.0, square(&x)).curvature(), Curvature::Concave);
    }

    #[test]
    fn convex_plus_concave_is_unknown() {
        let x = Variable::vector(3);
        let e = add(norm2(&x), neg(norm2(&x))).unwrap();
        assert_eq!(e.curvature(), Curvature::Unknown);
    }

    #[test]
    fn composition_of_nonlinear_is_unknown() {
        let x = Variable::vector(3);
        assert_eq!(norm2(norm2(&x)).curvature(), Curvature::Unknown);
        assert_eq!(square(norm2(&x)).curvature(), Curvature::Unknown);
    }
}
