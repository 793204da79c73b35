//! A small norm-sum problem, plus a look at the canonical data.
//!
//! minimize ||x||_2 + ||x||_1  s.t.  x >= 2,  x in R^2
//!
//! The optimum sits at x = (2, 2) with value 4 + 2*sqrt(2).

use cvxkit::canon::ProblemData;
use cvxkit::prelude::*;

fn main() -> Result<()> {
    let x = Variable::named("x", Shape::vector(2));
    let objective = add(norm2(&x), norm1(&x))?;
    let problem = Problem::minimize(objective, [Expr::from(&x).ge(2.0)?])?;

    // Inspect the canonical conic form without solving.
    if let ProblemData::Unified(data) = problem.get_problem_data(SolverId::Clarabel)? {
        let dims = &data.dims;
        println!(
            "canonical form: {} vars, {} zero rows, {} nonneg rows, {} soc blocks",
            data.c.len(),
            dims.zero,
            dims.nonneg,
            dims.soc.len()
        );
    }

    let value = problem.solve_with(
        SolverId::Clarabel,
        &SolveOptions::new().set("tol_gap_rel", 1e-9),
    )?;
    println!("value = {value:.6} (expected {:.6})", 4.0 + 2.0 * 2.0_f64.sqrt());
    println!("x     = {:?}", x.value().unwrap());

    // The LP backend cannot express the second-order blocks.
    match problem.solve(SolverId::Microlp) {
        Err(Error::Config(msg)) => println!("microlp declined: {msg}"),
        other => println!("unexpected microlp outcome: {other:?}"),
    }
    Ok(())
}
