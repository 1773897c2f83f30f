//! Constraint-based scheduling of persons to events.
//!
//! A [`ScheduleModel`] creates one Boolean variable for every combination of
//! person and event, and collects named groups of [`BoolExpr`] predicates
//! over these variables. Solving reformulates the predicates into a [`Cnf`]
//! that is handed to a [`SatOracle`].

pub(crate) mod model;
pub(crate) mod schedule;
pub(crate) mod solver;

pub use model::{
	bool::{BoolExpr, BoolVar, Literal},
	linear::{BoolLinExp, BoolLinear, Comparator},
	reformulate::{ReformulationError, SimplifiedBool},
	Model,
};
pub use schedule::{
	ConstraintGroup, InvalidArgument, Schedule, ScheduleError, ScheduleModel, PERSONS_PER_EVENT,
};
pub use solver::{varisat::Varisat, Assignment, Cnf, SatOracle, SatOutcome, SolveResult};

/// Type used for integer constants in linear expressions
pub type IntVal = i64;
