//! Duals of an equality/inequality pair.
//!
//! minimize (x - y)^2  s.t.  x + y == 1,  x - y >= 1
//!
//! The margin constraint is the active one; its dual is the derivative
//! of z^2 at z = 1, i.e. 2, while the balance equality carries ~0.

use cvxkit::prelude::*;

fn main() -> Result<()> {
    let x = Variable::named("x", Shape::scalar());
    let y = Variable::named("y", Shape::scalar());
    let gap = sub(&x, &y)?;

    let balance = add(&x, &y)?.eq(1.0)?;
    let margin = gap.ge(1.0)?;

    let problem = Problem::minimize(square(&gap), [balance.clone(), margin.clone()])?;
    let value = problem.solve(SolverId::Clarabel)?;

    println!("status        = {}", problem.status().unwrap());
    println!("value         = {value:.6}");
    println!("x             = {:.6}", x.scalar_value().unwrap());
    println!("y             = {:.6}", y.scalar_value().unwrap());
    println!("balance dual  = {:.6}", balance.scalar_dual_value().unwrap());
    println!("margin dual   = {:.6}", margin.scalar_dual_value().unwrap());

    if let Some(diag) = problem.diagnostics() {
        println!(
            "solved by {} in {:.3}s ({} iterations)",
            diag.solver, diag.solve_time, diag.iterations
        );
    }
    Ok(())
}
