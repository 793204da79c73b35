//! Microlp backend adapter.
//!
//! Microlp is a pure-Rust simplex solver with a row-oriented API, so it
//! consumes the split form: equality rows from `(A, b)` and nonnegative
//! rows from `(G, h)` as `G x <= h`. Problems whose canonical form
//! contains second-order (or other nonlinear) cone blocks are rejected
//! with a configuration error before the backend runs.
//!
//! The backend has no tuning parameters, so any options-map entry is
//! rejected; the verbose flag is ignored because microlp has no log
//! output. It also reports no dual values: constraints keep their duals
//! unset after a solve through this backend.

use std::time::Instant;

use log::debug;
use microlp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem as LpProblem};

use super::{RawSolution, SolveOptions, SolveStatus};
use crate::canon::SplitData;
use crate::error::{Error, Result};

pub(crate) const NAME: &str = "microlp";

pub(crate) fn solve(data: &SplitData, options: &SolveOptions) -> Result<RawSolution> {
    if let Some((key, _)) = options.entries().next() {
        return Err(Error::UnsupportedOption {
            solver: NAME,
            option: key.to_string(),
        });
    }
    if !data.dims.soc.is_empty() || data.dims.exp > 0 || !data.dims.psd.is_empty() {
        return Err(Error::Config(
            "the microlp backend only handles linear rows; use clarabel for conic problems".into(),
        ));
    }

    let mut lp = LpProblem::new(OptimizationDirection::Minimize);
    let vars: Vec<microlp::Variable> = data
        .c
        .iter()
        .map(|&obj| lp.add_var(obj, (f64::NEG_INFINITY, f64::INFINITY)))
        .collect();

    for (row, rhs) in rows_of(&data.a).into_iter().zip(&data.b) {
        lp.add_constraint(to_linear_expr(&row, &vars), ComparisonOp::Eq, *rhs);
    }
    for (row, rhs) in rows_of(&data.g).into_iter().zip(&data.h) {
        lp.add_constraint(to_linear_expr(&row, &vars), ComparisonOp::Le, *rhs);
    }

    let started = Instant::now();
    let outcome = lp.solve();
    let solve_time = started.elapsed().as_secs_f64();

    let (status, primal) = match outcome {
        Ok(solution) => {
            let primal: Vec<f64> = vars.iter().map(|&v| solution[v]).collect();
            (SolveStatus::Optimal, primal)
        }
        Err(microlp::Error::Infeasible) => (SolveStatus::Infeasible, Vec::new()),
        Err(microlp::Error::Unbounded) => (SolveStatus::Unbounded, Vec::new()),
        Err(microlp::Error::InternalError(msg)) => {
            debug!("microlp internal error: {msg}");
            (SolveStatus::NumericalTrouble, Vec::new())
        }
    };
    debug!("microlp finished: {status} in {solve_time:.3}s");

    Ok(RawSolution {
        status,
        primal,
        dual_eq: Vec::new(),
        dual_cone: Vec::new(),
        solve_time,
        iterations: 0,
    })
}

/// Bucket the CSC triplets of `m` by row.
fn rows_of(m: &nalgebra_sparse::CscMatrix<f64>) -> Vec<Vec<(usize, f64)>> {
    let mut rows = vec![Vec::new(); m.nrows()];
    for (r, c, v) in m.triplet_iter() {
        rows[r].push((c, *v));
    }
    rows
}

fn to_linear_expr(row: &[(usize, f64)], vars: &[microlp::Variable]) -> LinearExpr {
    let mut expr = LinearExpr::empty();
    for &(col, coeff) in row {
        expr.add(vars[col], coeff);
    }
    expr
}
