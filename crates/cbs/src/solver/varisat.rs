use ::varisat::Solver as RawSolver;
use tracing::{debug, warn};

use crate::{Assignment, Cnf, SatOracle, SatOutcome};

/// [`SatOracle`] backed by the pure Rust varisat CDCL solver
///
/// Every call creates a fresh solver instance, no learned clauses or other
/// state is kept between calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Varisat;

impl SatOracle for Varisat {
	fn solve(&mut self, cnf: &Cnf) -> SatOutcome {
		let mut slv = RawSolver::new();
		slv.add_formula(cnf.formula());

		match slv.solve() {
			Ok(true) => {
				let Some(model) = slv.model() else {
					warn!("varisat reported satisfiable without a model");
					return SatOutcome::Unknown;
				};
				let mut values = vec![false; cnf.num_vars()];
				for lit in model {
					if let Some(v) = values.get_mut(lit.var().index()) {
						*v = lit.is_positive();
					}
				}
				debug!(vars = cnf.num_vars(), "varisat found a solution");
				SatOutcome::Satisfied(Assignment::from(values))
			}
			Ok(false) => SatOutcome::Unsatisfiable,
			Err(err) => {
				warn!(error = ?err, "varisat failed to solve the formula");
				SatOutcome::Unknown
			}
		}
	}
}
