//! Problem definition and the solve entry point.
//!
//! A [`Problem`] holds shared handles to its objective's variables and to
//! its constraints, not copies: after a successful solve, primal values
//! and duals are scattered back into the exact [`Variable`] and
//! [`Constraint`] instances the caller built the problem from. Solving is
//! synchronous and may be repeated (for instance once per backend); every
//! solve recanonicalizes from scratch and overwrites the previous
//! results, so compare across backends by snapshotting between calls.

use std::sync::RwLock;

use log::debug;

use crate::canon::{self, Canonical, DualRows, ProblemData};
use crate::constraint::Constraint;
use crate::error::{Error, Result};
use crate::expr::{Expr, Variable};
use crate::solvers::{dispatch, RawSolution, SolveOptions, SolveStatus, SolverId};

/// Optimization direction wrapping a scalar expression.
#[derive(Debug, Clone)]
pub enum Objective {
    /// Minimize the expression.
    Minimize(Expr),
    /// Maximize the expression.
    Maximize(Expr),
}

impl Objective {
    /// Build a minimization objective. The expression must be scalar.
    pub fn minimize(expr: impl Into<Expr>) -> Result<Self> {
        let expr = expr.into();
        Self::check_scalar(&expr)?;
        Ok(Objective::Minimize(expr))
    }

    /// Build a maximization objective. The expression must be scalar.
    pub fn maximize(expr: impl Into<Expr>) -> Result<Self> {
        let expr = expr.into();
        Self::check_scalar(&expr)?;
        Ok(Objective::Maximize(expr))
    }

    fn check_scalar(expr: &Expr) -> Result<()> {
        if expr.shape().is_scalar() {
            Ok(())
        } else {
            Err(Error::shape("()", expr.shape()))
        }
    }

    /// The expression being optimized.
    pub fn expr(&self) -> &Expr {
        match self {
            Objective::Minimize(e) | Objective::Maximize(e) => e,
        }
    }

    /// Check if this is a minimization.
    pub fn is_minimize(&self) -> bool {
        matches!(self, Objective::Minimize(_))
    }
}

/// Backend-reported diagnostics of the most recent solve.
#[derive(Debug, Clone, Copy)]
pub struct SolveDiagnostics {
    /// The backend that ran.
    pub solver: SolverId,
    /// Wall-clock seconds spent inside the backend.
    pub solve_time: f64,
    /// Iterations reported by the backend (zero if it reports none).
    pub iterations: u32,
}

/// An optimization problem: one objective plus an ordered constraint
/// list.
#[derive(Debug)]
pub struct Problem {
    objective: Objective,
    constraints: Vec<Constraint>,
    value: RwLock<Option<f64>>,
    status: RwLock<Option<SolveStatus>>,
    diagnostics: RwLock<Option<SolveDiagnostics>>,
}

impl Problem {
    /// Create a problem from an objective and constraints. Constraint
    /// order is significant: canonical rows and dual values follow it.
    pub fn new(objective: Objective, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        Problem {
            objective,
            constraints: constraints.into_iter().collect(),
            value: RwLock::new(None),
            status: RwLock::new(None),
            diagnostics: RwLock::new(None),
        }
    }

    /// Convenience: a minimization problem over a scalar expression.
    pub fn minimize(
        expr: impl Into<Expr>,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Result<Self> {
        Ok(Problem::new(Objective::minimize(expr)?, constraints))
    }

    /// Convenience: a maximization problem over a scalar expression.
    pub fn maximize(
        expr: impl Into<Expr>,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Result<Self> {
        Ok(Problem::new(Objective::maximize(expr)?, constraints))
    }

    /// The objective.
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// The constraints, in the order they were given.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// All variables of the problem, deduplicated and ordered by id.
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars = self.objective.expr().variables();
        for c in &self.constraints {
            vars.extend(c.variables());
        }
        vars.sort_by_key(Variable::id);
        vars.dedup_by_key(|v| v.id());
        vars
    }

    /// The optimal value of the most recent solve, or the sentinel for a
    /// non-optimal outcome (±∞ for infeasible/unbounded, NaN for
    /// numerical trouble). `None` before the first completed solve.
    pub fn value(&self) -> Option<f64> {
        *self.value.read().expect("problem lock poisoned")
    }

    /// The status of the most recent solve.
    pub fn status(&self) -> Option<SolveStatus> {
        *self.status.read().expect("problem lock poisoned")
    }

    /// Diagnostics of the most recent solve.
    pub fn diagnostics(&self) -> Option<SolveDiagnostics> {
        *self.diagnostics.read().expect("problem lock poisoned")
    }

    /// Check if the problem follows the disciplined-convexity rules.
    pub fn is_dcp(&self) -> bool {
        let objective_ok = match &self.objective {
            Objective::Minimize(e) => e.is_convex(),
            Objective::Maximize(e) => e.is_concave(),
        };
        objective_ok && self.constraints.iter().all(Constraint::is_dcp)
    }

    fn dcp_violation_message(&self) -> String {
        let mut violations = Vec::new();
        match &self.objective {
            Objective::Minimize(e) if !e.is_convex() => violations.push(format!(
                "objective has curvature {:?} but minimization needs a convex objective",
                e.curvature()
            )),
            Objective::Maximize(e) if !e.is_concave() => violations.push(format!(
                "objective has curvature {:?} but maximization needs a concave objective",
                e.curvature()
            )),
            _ => {}
        }
        for (i, c) in self.constraints.iter().enumerate() {
            if !c.is_dcp() {
                violations.push(format!("constraint {i} ({})", c.relation()));
            }
        }
        violations.join("; ")
    }

    fn canonical(&self) -> Result<Canonical> {
        if !self.is_dcp() {
            return Err(Error::NotDcp(self.dcp_violation_message()));
        }
        Ok(canon::canonicalize(&self.objective, &self.constraints))
    }

    /// Canonical data in the form the given backend consumes, without
    /// solving. Inspection only: no state of the problem, its variables
    /// or its constraints changes.
    pub fn get_problem_data(&self, solver: SolverId) -> Result<ProblemData> {
        let canonical = self.canonical()?;
        Ok(if solver.consumes_split() {
            ProblemData::Split(canonical.split())
        } else {
            ProblemData::Unified(canonical.unified())
        })
    }

    /// Solve with default options.
    pub fn solve(&self, solver: SolverId) -> Result<f64> {
        self.solve_with(solver, &SolveOptions::new())
    }

    /// Solve with the given options and return the objective value.
    ///
    /// Infeasibility and unboundedness are outcomes, not errors: the
    /// returned value is the sentinel (±∞, mirrored for maximization; NaN
    /// for numerical trouble), the status is recorded, and variable
    /// values and duals are left unset. Errors are reserved for malformed
    /// input (shape/DCP/configuration problems, unsupported options) and
    /// for backend failures.
    pub fn solve_with(&self, solver: SolverId, options: &SolveOptions) -> Result<f64> {
        let canonical = self.canonical()?;
        let raw = dispatch(solver, &canonical, options)?;

        self.clear_results();
        *self.status.write().expect("problem lock poisoned") = Some(raw.status);
        *self.diagnostics.write().expect("problem lock poisoned") = Some(SolveDiagnostics {
            solver,
            solve_time: raw.solve_time,
            iterations: raw.iterations,
        });

        // Canonical data always minimizes; mirror the value back for a
        // maximization.
        let sign = if self.objective.is_minimize() { 1.0 } else { -1.0 };
        let value = match raw.status {
            SolveStatus::Optimal => {
                if raw.primal.len() != canonical.num_vars() {
                    return Err(Error::Solver(
                        "backend returned a primal vector of unexpected length".into(),
                    ));
                }
                let canonical_value: f64 = canonical
                    .c
                    .iter()
                    .zip(&raw.primal)
                    .map(|(ci, xi)| ci * xi)
                    .sum::<f64>()
                    + canonical.offset;
                self.scatter(&canonical, &raw);
                sign * canonical_value
            }
            SolveStatus::Infeasible => sign * f64::INFINITY,
            SolveStatus::Unbounded => sign * f64::NEG_INFINITY,
            SolveStatus::NumericalTrouble => f64::NAN,
        };

        debug!("solve finished: {} value {value}", raw.status);
        *self.value.write().expect("problem lock poisoned") = Some(value);
        Ok(value)
    }

    fn clear_results(&self) {
        *self.value.write().expect("problem lock poisoned") = None;
        *self.status.write().expect("problem lock poisoned") = None;
        *self.diagnostics.write().expect("problem lock poisoned") = None;
        for var in self.variables() {
            var.clear_value();
        }
        for c in &self.constraints {
            c.clear_dual();
        }
    }

    /// Write the backend's primal and dual vectors back into the shared
    /// Variable/Constraint handles, using the canonical row/column map.
    fn scatter(&self, canonical: &Canonical, raw: &RawSolution) {
        for var in self.variables() {
            let (start, len) = canonical.map.columns[&var.id()];
            var.set_value(raw.primal[start..start + len].to_vec());
        }

        // Backends without dual support return empty vectors; leave the
        // constraint duals unset in that case.
        let duals_present = raw.dual_eq.len() == canonical.dims.zero
            && raw.dual_cone.len() == canonical.dims.cone_rows();
        if !duals_present {
            return;
        }
        for (constraint, rows) in self.constraints.iter().zip(&canonical.map.rows) {
            let dual = match *rows {
                DualRows::Zero { start, len } => raw.dual_eq[start..start + len].to_vec(),
                DualRows::Cone { start, len } => raw.dual_cone[start..start + len].to_vec(),
            };
            constraint.set_dual(dual);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{constant_vec, neg, norm2, sum, Variable};

    #[test]
    fn objective_must_be_scalar() {
        let x = Variable::vector(3);
        assert!(matches!(
            Objective::minimize(Expr::from(&x)),
            Err(Error::Shape { .. })
        ));
        assert!(Objective::minimize(sum(&x)).is_ok());
    }

    #[test]
    fn dcp_classification() {
        let x = Variable::vector(3);
        assert!(Problem::minimize(norm2(&x), []).unwrap().is_dcp());
        assert!(!Problem::maximize(norm2(&x), []).unwrap().is_dcp());
        assert!(Problem::maximize(neg(norm2(&x)), []).unwrap().is_dcp());
        assert!(!Problem::minimize(neg(norm2(&x)), []).unwrap().is_dcp());
    }

    #[test]
    fn non_dcp_constraint_is_reported() {
        let x = Variable::vector(2);
        let p = Problem::minimize(sum(&x), [norm2(&x).ge(1.0).unwrap()]).unwrap();
        assert!(!p.is_dcp());
        assert!(matches!(
            p.get_problem_data(SolverId::Clarabel),
            Err(Error::NotDcp(_))
        ));
    }

    #[test]
    fn variables_are_collected_across_objective_and_constraints() {
        let x = Variable::vector(2);
        let y = Variable::scalar();
        let p = Problem::minimize(sum(&x), [Expr::from(&y).ge(1.0).unwrap()]).unwrap();
        assert_eq!(p.variables().len(), 2);
    }

    #[test]
    fn fresh_problem_has_no_results() {
        let x = Variable::vector(2);
        let p = Problem::minimize(
            sum(&x),
            [Expr::from(&x).eq(constant_vec(vec![1.0, 2.0])).unwrap()],
        )
        .unwrap();
        assert_eq!(p.value(), None);
        assert_eq!(p.status(), None);
        assert!(p.diagnostics().is_none());
    }
}
