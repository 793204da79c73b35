//! Clarabel backend adapter.
//!
//! Clarabel accepts the unified bundle directly: one stacked matrix,
//! right-hand side and cone list, solving `min ½xᵀPx + qᵀx` s.t.
//! `Ax + s = b, s ∈ K` (we pass P = 0). Duals come back as one vector
//! over all rows, split here into the zero-cone and cone sections.
//!
//! Recognized options: `max_iter` (int), `time_limit`, `tol_gap_abs`,
//! `tol_gap_rel`, `tol_feas` (floats). Anything else is rejected.

use clarabel::algebra::CscMatrix as ClarabelCsc;
use clarabel::solver::{
    DefaultSettings, DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use log::debug;

use super::{RawSolution, SolveOptions, SolveStatus};
use crate::canon::{ConeDims, UnifiedData};
use crate::error::{Error, Result};

pub(crate) const NAME: &str = "clarabel";

pub(crate) fn solve(data: &UnifiedData, options: &SolveOptions) -> Result<RawSolution> {
    let settings = build_settings(options)?;
    let cones = to_cones(&data.dims)?;

    let n = data.c.len();
    let p = ClarabelCsc::zeros((n, n));
    let mat = to_backend_csc(&data.mat);

    let mut solver = DefaultSolver::new(&p, &data.c, &mat, &data.rhs, &cones, settings)
        .map_err(|e| Error::Solver(format!("clarabel rejected the problem data: {e:?}")))?;
    solver.solve();

    let status = normalize_status(solver.solution.status);
    debug!(
        "clarabel finished: {status} after {} iterations in {:.3}s",
        solver.info.iterations, solver.solution.solve_time
    );

    let total = data.dims.total_rows();
    let (primal, dual_eq, dual_cone) = if status == SolveStatus::Optimal {
        if solver.solution.x.len() != n || solver.solution.z.len() != total {
            return Err(Error::Solver(
                "clarabel returned vectors of unexpected length".into(),
            ));
        }
        let z = &solver.solution.z;
        (
            solver.solution.x.clone(),
            z[..data.dims.zero].to_vec(),
            z[data.dims.zero..].to_vec(),
        )
    } else {
        (Vec::new(), Vec::new(), Vec::new())
    };

    Ok(RawSolution {
        status,
        primal,
        dual_eq,
        dual_cone,
        solve_time: solver.solution.solve_time,
        iterations: solver.info.iterations,
    })
}

fn build_settings(options: &SolveOptions) -> Result<DefaultSettings<f64>> {
    let mut builder = DefaultSettingsBuilder::default();
    builder.verbose(options.is_verbose());
    for (key, value) in options.entries() {
        match key {
            "max_iter" => {
                builder.max_iter(value.as_u32(key)?);
            }
            "time_limit" => {
                builder.time_limit(value.as_f64(key)?);
            }
            "tol_gap_abs" => {
                builder.tol_gap_abs(value.as_f64(key)?);
            }
            "tol_gap_rel" => {
                builder.tol_gap_rel(value.as_f64(key)?);
            }
            "tol_feas" => {
                builder.tol_feas(value.as_f64(key)?);
            }
            other => {
                return Err(Error::UnsupportedOption {
                    solver: NAME,
                    option: other.to_string(),
                })
            }
        }
    }
    builder
        .build()
        .map_err(|e| Error::Config(format!("invalid clarabel settings: {e:?}")))
}

fn normalize_status(status: SolverStatus) -> SolveStatus {
    match status {
        SolverStatus::Solved | SolverStatus::AlmostSolved => SolveStatus::Optimal,
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            SolveStatus::Infeasible
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => SolveStatus::Unbounded,
        _ => SolveStatus::NumericalTrouble,
    }
}

fn to_backend_csc(m: &nalgebra_sparse::CscMatrix<f64>) -> ClarabelCsc<f64> {
    ClarabelCsc::new(
        m.nrows(),
        m.ncols(),
        m.col_offsets().to_vec(),
        m.row_indices().to_vec(),
        m.values().to_vec(),
    )
}

fn to_cones(dims: &ConeDims) -> Result<Vec<SupportedConeT<f64>>> {
    if !dims.psd.is_empty() {
        return Err(Error::Config(
            "the clarabel adapter does not handle semidefinite blocks".into(),
        ));
    }
    let mut cones = Vec::new();
    if dims.zero > 0 {
        cones.push(SupportedConeT::ZeroConeT(dims.zero));
    }
    if dims.nonneg > 0 {
        cones.push(SupportedConeT::NonnegativeConeT(dims.nonneg));
    }
    for &dim in &dims.soc {
        cones.push(SupportedConeT::SecondOrderConeT(dim));
    }
    for _ in 0..dims.exp {
        cones.push(SupportedConeT::ExponentialConeT());
    }
    Ok(cones)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cone_list_order() {
        let dims = ConeDims {
            zero: 2,
            nonneg: 3,
            soc: vec![4, 5],
            exp: 0,
            psd: vec![],
        };
        let cones = to_cones(&dims).unwrap();
        assert_eq!(cones.len(), 4);
        assert!(matches!(cones[0], SupportedConeT::ZeroConeT(2)));
        assert!(matches!(cones[3], SupportedConeT::SecondOrderConeT(5)));
    }

    #[test]
    fn empty_sections_emit_no_cones() {
        let dims = ConeDims {
            zero: 0,
            nonneg: 1,
            soc: vec![],
            exp: 0,
            psd: vec![],
        };
        assert_eq!(to_cones(&dims).unwrap().len(), 1);
    }

    #[test]
    fn unknown_option_is_rejected() {
        let opts = SolveOptions::new().set("feastol", 1e-8);
        match build_settings(&opts) {
            Err(Error::UnsupportedOption { solver, option }) => {
                assert_eq!(solver, NAME);
                assert_eq!(option, "feastol");
            }
            other => panic!("expected UnsupportedOption, got {other:?}"),
        }
    }

    #[test]
    fn mistyped_option_is_rejected() {
        let opts = SolveOptions::new().set("max_iter", 1.5);
        assert!(matches!(build_settings(&opts), Err(Error::Config(_))));
    }

    #[test]
    fn recognized_options_build() {
        let opts = SolveOptions::new()
            .set("max_iter", 25)
            .set("tol_gap_rel", 1e-9);
        assert!(build_settings(&opts).is_ok());
    }
}
