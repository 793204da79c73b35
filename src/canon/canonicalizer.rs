//! Reduction of a modeled problem to canonical conic form.
//!
//! One walk per objective/constraint flattens the expression tree into
//! [`AffineExpr`] blocks. Nonlinear atoms are replaced by their epigraph:
//!
//! - `norm2(z)`  → aux `t`, block `[t; z]` in a second-order cone.
//! - `square(z)` → aux `t`, per element the rotated-cone identity
//!   `z² ≤ t  ⟺  ‖[2z, 1-t]‖₂ ≤ 1+t` as a three-row second-order block.
//! - `norm1(z)`  → aux vector `t`, rows `t - z ≥ 0` and `t + z ≥ 0`,
//!   result `sum(t)`.
//! - `norm_inf(z)` → aux scalar `t` broadcast against `z`, same bounding
//!   rows, result `t`.
//!
//! Row order is fixed: user equality rows in declaration order, then user
//! inequality rows in declaration order, then auxiliary epigraph rows in
//! generation order, then second-order blocks in generation order. The
//! returned [`CanonMap`] records the row range of every user constraint
//! and the column range of every variable so solved values scatter back
//! positionally.

use std::collections::BTreeMap;

use log::debug;
use nalgebra_sparse::CscMatrix;

use super::affine::AffineExpr;
use super::program::{ConeDims, SplitData, UnifiedData};
use crate::constraint::{Constraint, Relation};
use crate::expr::{ConstValue, Expr, NormOrder, Shape, VarId, Variable};
use crate::problem::Objective;
use crate::sparse;

/// Where a constraint's dual lives in the solver's dual vectors.
#[derive(Debug, Clone, Copy)]
pub(crate) enum DualRows {
    /// Rows in the zero (equality) section.
    Zero { start: usize, len: usize },
    /// Rows in the cone section (offsets relative to its first row).
    Cone { start: usize, len: usize },
}

/// Positional bookkeeping produced alongside the canonical matrices.
#[derive(Debug, Clone)]
pub(crate) struct CanonMap {
    /// Column range (start, len) per variable, original and auxiliary.
    pub columns: BTreeMap<VarId, (usize, usize)>,
    /// Total column count.
    pub num_vars: usize,
    /// Dual row range per user constraint, in declaration order.
    pub rows: Vec<DualRows>,
}

/// Canonical residual system: rows are `M v + d`, required to be zero or
/// to lie in the nonnegative/second-order cones. Both public data forms
/// derive from this by sign conventions.
#[derive(Debug)]
pub(crate) struct Canonical {
    pub c: Vec<f64>,
    pub offset: f64,
    pub eq_mat: CscMatrix<f64>,
    pub eq_const: Vec<f64>,
    pub cone_mat: CscMatrix<f64>,
    pub cone_const: Vec<f64>,
    pub dims: ConeDims,
    pub map: CanonMap,
}

impl Canonical {
    /// Package as split matrices: `A x = b`, `h - G x ∈ K`.
    pub fn split(&self) -> SplitData {
        SplitData {
            c: self.c.clone(),
            a: self.eq_mat.clone(),
            b: self.eq_const.iter().map(|v| -v).collect(),
            g: sparse::scale(&self.cone_mat, -1.0),
            h: self.cone_const.clone(),
            dims: self.dims.clone(),
            offset: self.offset,
        }
    }

    /// Package as one stacked system: `M x + s = rhs`, `s ∈ {0} ⊕ K`.
    pub fn unified(&self) -> UnifiedData {
        UnifiedData {
            c: self.c.clone(),
            mat: sparse::vstack(
                &sparse::scale(&self.eq_mat, -1.0),
                &sparse::scale(&self.cone_mat, -1.0),
            ),
            rhs: self
                .eq_const
                .iter()
                .chain(self.cone_const.iter())
                .copied()
                .collect(),
            dims: self.dims.clone(),
            offset: self.offset,
        }
    }

    pub fn num_vars(&self) -> usize {
        self.c.len()
    }
}

/// A second-order block `[head; tail]`, head ≥ ‖tail‖₂.
struct SocBlock {
    head: AffineExpr,
    tail: AffineExpr,
}

/// Accumulates auxiliary variables and epigraph constraints while
/// lowering expression trees.
#[derive(Default)]
struct LowerCtx {
    aux: Vec<(VarId, usize)>,
    nonneg: Vec<AffineExpr>,
    soc: Vec<SocBlock>,
}

impl LowerCtx {
    fn new_aux(&mut self, shape: Shape) -> AffineExpr {
        let var = Variable::new(shape);
        self.aux.push((var.id(), shape.size()));
        AffineExpr::variable(var.id(), shape)
    }

    fn lower(&mut self, expr: &Expr) -> AffineExpr {
        match expr {
            Expr::Var(v) => AffineExpr::variable(v.id(), v.shape()),
            Expr::Const(c) => lower_constant(c),
            Expr::Neg(a) => self.lower(a).neg(),
            Expr::Add(a, b) => {
                let la = self.lower(a);
                let lb = self.lower(b);
                la.add(&lb)
            }
            Expr::Scale(k, a) => self.lower(a).scale(*k),
            Expr::MulElem(c, a) => {
                let la = self.lower(a);
                match c {
                    ConstValue::Scalar(k) => la.scale(*k),
                    ConstValue::Vector(w) => {
                        let la = if la.size() == 1 {
                            la.broadcast_to(w.len())
                        } else {
                            la
                        };
                        la.elem_scale(w)
                    }
                }
            }
            Expr::Sum(a) => self.lower(a).sum(),
            Expr::Square(a) => {
                let z = self.lower(a);
                let t = self.new_aux(z.shape);
                for i in 0..z.size() {
                    let ti = t.row(i);
                    self.soc.push(SocBlock {
                        head: ti.add(&AffineExpr::scalar(1.0)),
                        tail: AffineExpr::vstack(&[
                            z.row(i).scale(2.0),
                            AffineExpr::scalar(1.0).sub(&ti),
                        ]),
                    });
                }
                t
            }
            Expr::Norm(order, a) => {
                let z = self.lower(a);
                match order {
                    NormOrder::Two => {
                        let t = self.new_aux(Shape::scalar());
                        self.soc.push(SocBlock {
                            head: t.clone(),
                            tail: z,
                        });
                        t
                    }
                    NormOrder::One => {
                        let t = self.new_aux(z.shape);
                        self.nonneg.push(t.sub(&z));
                        self.nonneg.push(t.add(&z));
                        t.sum()
                    }
                    NormOrder::Inf => {
                        let t = self.new_aux(Shape::scalar());
                        let tb = if z.size() == 1 {
                            t.clone()
                        } else {
                            t.broadcast_to(z.size())
                        };
                        self.nonneg.push(tb.sub(&z));
                        self.nonneg.push(tb.add(&z));
                        t
                    }
                }
            }
        }
    }
}

fn lower_constant(c: &ConstValue) -> AffineExpr {
    match c {
        ConstValue::Scalar(v) => AffineExpr::scalar(*v),
        ConstValue::Vector(v) => AffineExpr::constant(v.clone(), Shape::vector(v.len())),
    }
}

/// Canonicalize an objective and its constraints.
///
/// Assumes the DCP check already passed; the epigraph relaxations below
/// are only exact for DCP problems.
pub(crate) fn canonicalize(objective: &Objective, constraints: &[Constraint]) -> Canonical {
    let mut ctx = LowerCtx::default();

    // Objective first, negated for maximization so backends always
    // minimize.
    let mut obj = ctx.lower(objective.expr());
    if !objective.is_minimize() {
        obj = obj.neg();
    }

    // Constraints in declaration order; the residual is arranged so each
    // relation becomes `residual = 0` or `residual ≥ 0`.
    let mut eq_rows: Vec<AffineExpr> = Vec::new();
    let mut ineq_rows: Vec<AffineExpr> = Vec::new();
    let mut row_map = Vec::with_capacity(constraints.len());
    let mut eq_offset = 0;
    let mut ineq_offset = 0;

    for constraint in constraints {
        let lhs = ctx.lower(constraint.lhs());
        let rhs = ctx.lower(constraint.rhs());
        let (residual, eq) = match constraint.relation() {
            Relation::Eq => (lhs.sub(&rhs), true),
            Relation::Ge => (lhs.sub(&rhs), false),
            Relation::Le => (rhs.sub(&lhs), false),
        };
        let len = residual.size();
        if eq {
            row_map.push(DualRows::Zero {
                start: eq_offset,
                len,
            });
            eq_offset += len;
            eq_rows.push(residual);
        } else {
            row_map.push(DualRows::Cone {
                start: ineq_offset,
                len,
            });
            ineq_offset += len;
            ineq_rows.push(residual);
        }
    }

    // Epigraph rows follow the user rows.
    ineq_rows.append(&mut ctx.nonneg);

    // Column layout: user variables ordered by id, auxiliaries after in
    // generation order.
    let mut user_vars: Vec<Variable> = objective.expr().variables();
    for c in constraints {
        user_vars.extend(c.variables());
    }
    user_vars.sort_by_key(Variable::id);
    user_vars.dedup_by_key(|v| v.id());

    let mut columns = BTreeMap::new();
    let mut num_vars = 0;
    for v in &user_vars {
        columns.insert(v.id(), (num_vars, v.shape().size()));
        num_vars += v.shape().size();
    }
    for (id, size) in &ctx.aux {
        columns.insert(*id, (num_vars, *size));
        num_vars += size;
    }

    // Objective vector.
    let mut c = vec![0.0; num_vars];
    for (id, block) in &obj.terms {
        let (col_start, _) = columns[id];
        for (_, col, v) in block.triplet_iter() {
            c[col_start + col] += *v;
        }
    }
    let offset = obj.constant[0];

    // Stuff sections.
    let (eq_mat, eq_const) = stuff_rows(&eq_rows, &columns, num_vars);

    let soc_dims: Vec<usize> = ctx.soc.iter().map(|b| 1 + b.tail.size()).collect();
    let mut cone_exprs = ineq_rows;
    let nonneg_count: usize = cone_exprs.iter().map(AffineExpr::size).sum();
    for block in ctx.soc {
        cone_exprs.push(block.head);
        cone_exprs.push(block.tail);
    }
    let (cone_mat, cone_const) = stuff_rows(&cone_exprs, &columns, num_vars);

    let dims = ConeDims {
        zero: eq_const.len(),
        nonneg: nonneg_count,
        soc: soc_dims,
        exp: 0,
        psd: vec![],
    };

    debug!(
        "canonicalized problem: {} vars ({} original), {} zero rows, {} nonneg rows, {} soc blocks",
        num_vars,
        user_vars.len(),
        dims.zero,
        dims.nonneg,
        dims.soc.len()
    );

    Canonical {
        c,
        offset,
        eq_mat,
        eq_const,
        cone_mat,
        cone_const,
        dims,
        map: CanonMap {
            columns,
            num_vars,
            rows: row_map,
        },
    }
}

/// Stack affine expressions into one (rows x num_vars) matrix and a
/// constant vector.
fn stuff_rows(
    exprs: &[AffineExpr],
    columns: &BTreeMap<VarId, (usize, usize)>,
    num_vars: usize,
) -> (CscMatrix<f64>, Vec<f64>) {
    let total: usize = exprs.iter().map(AffineExpr::size).sum();
    let mut triplets = Vec::new();
    let mut constant = vec![0.0; total];

    let mut row_offset = 0;
    for expr in exprs {
        for (id, block) in &expr.terms {
            let (col_start, _) = columns[id];
            for (r, col, v) in block.triplet_iter() {
                triplets.push((row_offset + r, col_start + col, *v));
            }
        }
        for (i, v) in expr.constant.iter().enumerate() {
            constant[row_offset + i] = *v;
        }
        row_offset += expr.size();
    }

    (sparse::from_triplets(total, num_vars, &triplets), constant)
}
