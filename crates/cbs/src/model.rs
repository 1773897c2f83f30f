pub(crate) mod bool;
pub(crate) mod linear;
pub(crate) mod reformulate;

use std::ops::AddAssign;

use tracing::debug;

use crate::{
	model::reformulate::ReformulationError, Assignment, BoolExpr, BoolVar, Cnf, Literal,
	SatOracle, SatOutcome, SolveResult,
};

/// A conjunction of [`BoolExpr`] predicates over a pool of Boolean decision
/// variables.
///
/// The model keeps the predicates in their expression form. Every call to
/// [`Model::to_cnf`] or [`Model::solve`] reformulates the complete set from
/// scratch.
#[derive(Debug, Default, Clone)]
pub struct Model {
	pub(crate) cnf: Cnf,
	constraints: Vec<BoolExpr>,
}

impl Model {
	pub fn new_bool_var(&mut self) -> BoolVar {
		self.cnf.new_var()
	}

	pub fn new_bool_var_range(&mut self, len: usize) -> Vec<BoolVar> {
		(0..len).map(|_| self.new_bool_var()).collect()
	}

	pub fn num_bool_vars(&self) -> usize {
		self.cnf.num_vars()
	}

	pub fn num_constraints(&self) -> usize {
		self.constraints.len()
	}

	pub fn constraints(&self) -> impl Iterator<Item = &BoolExpr> + '_ {
		self.constraints.iter()
	}

	/// Reformulate all constraints of the model into a single [`Cnf`].
	///
	/// The variables of the model keep their identity, definitional variables
	/// introduced by the reformulation are numbered after them.
	pub fn to_cnf(&self) -> Result<Cnf, ReformulationError> {
		let mut cnf = self.cnf.clone();
		for c in &self.constraints {
			c.constrain(&mut cnf)?;
		}
		debug!(
			vars = self.num_bool_vars(),
			aux_vars = cnf.num_vars() - self.num_bool_vars(),
			clauses = cnf.num_clauses(),
			constraints = self.constraints.len(),
			"reformulated model"
		);
		Ok(cnf)
	}

	/// Find a single solution to the model.
	///
	/// `on_sol` is called with the assignment when the oracle finds a
	/// solution. A model that is unsatisfiable during reformulation is reported
	/// as such without calling the oracle.
	pub fn solve<O: SatOracle>(
		&self,
		oracle: &mut O,
		mut on_sol: impl FnMut(&Assignment),
	) -> SolveResult {
		let cnf = match self.to_cnf() {
			Ok(cnf) => cnf,
			Err(ReformulationError::TrivialUnsatisfiable) => return SolveResult::Unsatisfiable,
		};
		match oracle.solve(&cnf) {
			SatOutcome::Satisfied(sol) => {
				on_sol(&sol);
				SolveResult::Satisfied
			}
			SatOutcome::Unsatisfiable => SolveResult::Unsatisfiable,
			SatOutcome::Unknown => SolveResult::Unknown,
		}
	}

	/// Generate all solutions with regard to a list of given variables.
	///
	/// Solutions that only differ in variables not contained in `vars` are
	/// reported once. After each solution a clause excluding its projection on
	/// `vars` is added, and the oracle is called again with the extended
	/// formula.
	pub fn all_solutions<O: SatOracle>(
		&self,
		oracle: &mut O,
		vars: &[BoolVar],
		mut on_sol: impl FnMut(&Assignment),
	) -> SolveResult {
		let mut cnf = match self.to_cnf() {
			Ok(cnf) => cnf,
			Err(ReformulationError::TrivialUnsatisfiable) => return SolveResult::Unsatisfiable,
		};
		let mut num_sol = 0;
		loop {
			match oracle.solve(&cnf) {
				SatOutcome::Satisfied(sol) => {
					num_sol += 1;
					on_sol(&sol);
					let nogood = vars.iter().map(|&v| {
						let l = Literal::from(v);
						if sol.value(l) {
							!l
						} else {
							l
						}
					});
					if cnf.add_clause(nogood).is_err() {
						return SolveResult::Complete;
					}
				}
				SatOutcome::Unsatisfiable => {
					return if num_sol == 0 {
						SolveResult::Unsatisfiable
					} else {
						SolveResult::Complete
					};
				}
				SatOutcome::Unknown => {
					return if num_sol == 0 {
						SolveResult::Unknown
					} else {
						SolveResult::Satisfied
					};
				}
			}
		}
	}
}

impl AddAssign<BoolExpr> for Model {
	fn add_assign(&mut self, rhs: BoolExpr) {
		self.constraints.push(rhs);
	}
}

impl Extend<BoolExpr> for Model {
	fn extend<T: IntoIterator<Item = BoolExpr>>(&mut self, iter: T) {
		self.constraints.extend(iter);
	}
}
