//! # cvxkit
//!
//! Convex optimization modeling for Rust.
//!
//! cvxkit lets you state a convex problem as an expression tree over
//! decision variables, checks it against the disciplined convex
//! programming (DCP) rules, reduces it to standard conic form, and hands
//! it to one of several pure-Rust solver backends. Primal values, dual
//! values, status and diagnostics come back attached to the exact
//! variable/constraint handles the problem was built from.
//!
//! ## Quick start
//!
//! ```ignore
//! use cvxkit::prelude::*;
//!
//! // minimize (x - y)^2  s.t.  x + y == 1,  x - y >= 1
//! let x = Variable::scalar();
//! let y = Variable::scalar();
//! let gap = sub(&x, &y)?;
//!
//! let balance = add(&x, &y)?.eq(1.0)?;
//! let margin = gap.ge(1.0)?;
//!
//! let problem = Problem::minimize(square(&gap), [balance.clone(), margin.clone()])?;
//! let value = problem.solve(SolverId::Clarabel)?;
//!
//! println!("value = {value}");                       // ~1
//! println!("x = {:?}", x.scalar_value());            // ~1
//! println!("margin dual = {:?}", margin.scalar_dual_value()); // ~2
//! ```
//!
//! ## Pipeline
//!
//! - **Expressions** (`expr`): immutable trees built through explicit,
//!   shape-checked constructors (`add`, `sub`, `scale`, `mul_elem`,
//!   `sum`, `square`, `norm1`/`norm2`/`norm_inf`). No operator
//!   overloading; shape errors surface at construction.
//! - **DCP verification** (`dcp`): curvature tracking over the tree;
//!   non-DCP problems are rejected before canonicalization.
//! - **Canonicalization** (`canon`): one walk flattens everything into
//!   sparse affine blocks; norms and squares become second-order cone
//!   epigraphs. Output is either split matrices `(c, A, b, G, h, dims)`
//!   or a unified bundle, chosen per backend.
//! - **Solver backends** (`solvers`): a closed [`SolverId`] enumeration
//!   dispatching to Clarabel (conic, with duals) or microlp (LP only, no
//!   duals), each adapter normalizing status, primal/dual vectors and
//!   diagnostics into one shared shape.
//!
//! Infeasibility and unboundedness are solve *outcomes*, not errors:
//! `solve` returns the ±∞ sentinel and records the status, leaving
//! variable values and duals unset. Errors are reserved for modeling
//! mistakes (shapes, DCP, configuration, unsupported options) and
//! backend failures.

pub mod canon;
pub mod constraint;
pub mod dcp;
pub mod error;
pub mod expr;
pub mod problem;
pub mod solvers;
pub mod sparse;

/// Convenience imports.
///
/// ```ignore
/// use cvxkit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::constraint::{Constraint, Relation};
    pub use crate::dcp::Curvature;
    pub use crate::error::{Error, Result};
    pub use crate::expr::{
        add, constant, constant_vec, mul_elem, neg, norm, norm1, norm2, norm_inf, scale, square,
        sub, sum, Expr, NormOrder, Shape, Variable,
    };
    pub use crate::problem::{Objective, Problem, SolveDiagnostics};
    pub use crate::solvers::{SettingValue, SolveOptions, SolveStatus, SolverId};
}

pub use constraint::{Constraint, Relation};
pub use error::{Error, Result};
pub use expr::{Expr, Shape, Variable};
pub use problem::{Objective, Problem};
pub use solvers::{SolveOptions, SolveStatus, SolverId};
