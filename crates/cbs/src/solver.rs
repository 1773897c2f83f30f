pub(crate) mod varisat;

use ::varisat::{CnfFormula, ExtendFormula, Lit as RawLit, Var as RawVar};

use crate::{model::reformulate::ReformulationError, BoolVar, Literal};

/// Outcome of a full solve of a [`crate::Model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveResult {
	/// A solution was found
	Satisfied,
	/// No solution exists
	Unsatisfiable,
	/// All solutions have been enumerated
	Complete,
	/// The oracle gave up before proving either outcome
	Unknown,
}

/// Answer of a single [`SatOracle`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatOutcome {
	Satisfied(Assignment),
	Unsatisfiable,
	/// The oracle could not decide satisfiability, e.g. because a time or
	/// resource limit was reached
	Unknown,
}

/// The external satisfiability capability used to solve models.
///
/// An oracle receives the complete formula on every call and does not need
/// to retain any state between calls.
pub trait SatOracle {
	fn solve(&mut self, cnf: &Cnf) -> SatOutcome;
}

impl<F: FnMut(&Cnf) -> SatOutcome> SatOracle for F {
	fn solve(&mut self, cnf: &Cnf) -> SatOutcome {
		self(cnf)
	}
}

/// Values for the variables of a [`Cnf`], indexed by [`BoolVar::index`]
///
/// Variables that the oracle did not report are read as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
	values: Vec<bool>,
}

impl Assignment {
	pub fn value(&self, lit: impl Into<Literal>) -> bool {
		let lit = lit.into();
		let val = self.values.get(lit.var().index()).copied().unwrap_or(false);
		val != lit.is_negated()
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

impl From<Vec<bool>> for Assignment {
	fn from(values: Vec<bool>) -> Self {
		Self { values }
	}
}

/// A formula in conjunctive normal form, stored as a varisat [`CnfFormula`]
///
/// Variables are numbered from one in the order they are created.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Cnf {
	formula: CnfFormula,
}

impl Cnf {
	/// Create a new variable, numbered after all existing variables.
	///
	/// # Panics
	///
	/// Panics when the number of variables exceeds [`RawVar::max_count`].
	pub fn new_var(&mut self) -> BoolVar {
		assert!(
			self.formula.var_count() < RawVar::max_count(),
			"exceeded the maximum number of Boolean variables"
		);
		BoolVar(self.formula.new_var())
	}

	/// Add a clause to the formula.
	///
	/// An empty clause can never be satisfied and is rejected instead of
	/// stored.
	pub fn add_clause<I: IntoIterator<Item = Literal>>(
		&mut self,
		cl: I,
	) -> Result<(), ReformulationError> {
		let cl: Vec<RawLit> = cl.into_iter().map(RawLit::from).collect();
		if cl.is_empty() {
			return Err(ReformulationError::TrivialUnsatisfiable);
		}
		debug_assert!(cl.iter().all(|l| l.index() < self.formula.var_count()));
		self.formula.add_clause(&cl);
		Ok(())
	}

	pub fn num_vars(&self) -> usize {
		self.formula.var_count()
	}

	pub fn num_clauses(&self) -> usize {
		self.formula.len()
	}

	pub fn clauses(&self) -> impl Iterator<Item = impl Iterator<Item = Literal> + '_> + '_ {
		self.formula
			.iter()
			.map(|cl| cl.iter().map(|&l| Literal(l)))
	}

	/// The underlying varisat formula, e.g. to load it into a solver
	pub fn formula(&self) -> &CnfFormula {
		&self.formula
	}
}

impl Clone for Cnf {
	fn clone(&self) -> Self {
		let mut formula = CnfFormula::from(self.formula.iter());
		formula.set_var_count(self.formula.var_count());
		Self { formula }
	}
}
