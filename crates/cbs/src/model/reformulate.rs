use std::{iter::once, ops::Not};

use itertools::Itertools;
use thiserror::Error;

use crate::{BoolExpr, Cnf, Literal};

/// Result of reformulating a [`BoolExpr`] into a single literal, or into a
/// constant when the expression simplifies away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimplifiedBool {
	Lit(Literal),
	Val(bool),
}

impl SimplifiedBool {
	/// Enforce that the simplified expression holds
	pub(crate) fn constrain(self, cnf: &mut Cnf) -> Result<(), ReformulationError> {
		match self {
			SimplifiedBool::Lit(l) => cnf.add_clause([l]),
			SimplifiedBool::Val(true) => Ok(()),
			SimplifiedBool::Val(false) => Err(ReformulationError::TrivialUnsatisfiable),
		}
	}
}

impl Not for SimplifiedBool {
	type Output = Self;
	fn not(self) -> Self::Output {
		match self {
			SimplifiedBool::Lit(l) => SimplifiedBool::Lit(!l),
			SimplifiedBool::Val(v) => SimplifiedBool::Val(!v),
		}
	}
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReformulationError {
	#[error("The expression is trivially unsatisfiable")]
	TrivialUnsatisfiable,
}

impl BoolExpr {
	/// Add clauses to `cnf` that force the expression to hold.
	pub(crate) fn constrain(&self, cnf: &mut Cnf) -> Result<(), ReformulationError> {
		match self {
			BoolExpr::Val(v) => SimplifiedBool::Val(*v).constrain(cnf),
			BoolExpr::Lit(l) => cnf.add_clause([*l]),
			BoolExpr::Not(e) => match &**e {
				// ¬(a ∨ b) ≡ ¬a ∧ ¬b, no reification required
				BoolExpr::Or(es) => es.iter().try_for_each(|e| (!e).constrain(cnf)),
				e => (!e.to_arg(cnf)?).constrain(cnf),
			},
			BoolExpr::And(es) => es.iter().try_for_each(|e| e.constrain(cnf)),
			BoolExpr::Or(es) => {
				let args = es
					.iter()
					.map(|e| e.to_arg(cnf))
					.collect::<Result<Vec<_>, _>>()?;
				add_clause_args(cnf, args)
			}
			BoolExpr::Implies(a, b) => {
				let a = a.to_arg(cnf)?;
				let b = b.to_arg(cnf)?;
				add_clause_args(cnf, [!a, b])
			}
			BoolExpr::Equiv(es) => {
				let args = es
					.iter()
					.map(|e| e.to_arg(cnf))
					.collect::<Result<Vec<_>, _>>()?;
				let fixed = args.iter().find_map(|a| match a {
					SimplifiedBool::Val(v) => Some(*v),
					SimplifiedBool::Lit(_) => None,
				});
				if let Some(v) = fixed {
					args.into_iter()
						.try_for_each(|a| (if v { a } else { !a }).constrain(cnf))
				} else {
					args.into_iter().tuple_windows().try_for_each(|(a, b)| {
						add_clause_args(cnf, [!a, b])?;
						add_clause_args(cnf, [a, !b])
					})
				}
			}
			BoolExpr::Linear(lin) => lin.constrain(cnf),
		}
	}

	/// Reformulate the expression into a literal that is equivalent to it,
	/// introducing definitional variables where required.
	pub(crate) fn to_arg(&self, cnf: &mut Cnf) -> Result<SimplifiedBool, ReformulationError> {
		match self {
			BoolExpr::Val(v) => Ok(SimplifiedBool::Val(*v)),
			BoolExpr::Lit(l) => Ok(SimplifiedBool::Lit(*l)),
			BoolExpr::Not(e) => Ok(!e.to_arg(cnf)?),
			BoolExpr::And(es) => {
				let args = es
					.iter()
					.map(|e| e.to_arg(cnf))
					.collect::<Result<Vec<_>, _>>()?;
				and_args(cnf, args)
			}
			BoolExpr::Or(es) => {
				let args = es
					.iter()
					.map(|e| e.to_arg(cnf))
					.collect::<Result<Vec<_>, _>>()?;
				or_args(cnf, args)
			}
			BoolExpr::Implies(a, b) => {
				let a = a.to_arg(cnf)?;
				let b = b.to_arg(cnf)?;
				or_args(cnf, [!a, b])
			}
			BoolExpr::Equiv(es) => {
				let args = es
					.iter()
					.map(|e| e.to_arg(cnf))
					.collect::<Result<Vec<_>, _>>()?;
				if args.len() < 2 {
					return Ok(SimplifiedBool::Val(true));
				}
				let all = and_args(cnf, args.iter().copied())?;
				let none = and_args(cnf, args.iter().map(|&a| !a))?;
				or_args(cnf, [all, none])
			}
			BoolExpr::Linear(lin) => lin.to_arg(cnf),
		}
	}
}

/// Add the disjunction of `args` as a clause, dropping false constants.
fn add_clause_args(
	cnf: &mut Cnf,
	args: impl IntoIterator<Item = SimplifiedBool>,
) -> Result<(), ReformulationError> {
	let mut lits = Vec::new();
	for a in args {
		match a {
			SimplifiedBool::Lit(l) => lits.push(l),
			SimplifiedBool::Val(true) => return Ok(()),
			SimplifiedBool::Val(false) => {}
		}
	}
	cnf.add_clause(lits)
}

/// Create a literal `r` such that `r ↔ ⋀ args`.
pub(crate) fn and_args(
	cnf: &mut Cnf,
	args: impl IntoIterator<Item = SimplifiedBool>,
) -> Result<SimplifiedBool, ReformulationError> {
	let mut lits = Vec::new();
	for a in args {
		match a {
			SimplifiedBool::Lit(l) => lits.push(l),
			SimplifiedBool::Val(true) => {}
			SimplifiedBool::Val(false) => return Ok(SimplifiedBool::Val(false)),
		}
	}
	lits.sort();
	lits.dedup();
	if lits.iter().any(|l| lits.binary_search(&!l).is_ok()) {
		return Ok(SimplifiedBool::Val(false));
	}
	match lits.as_slice() {
		[] => Ok(SimplifiedBool::Val(true)),
		[l] => Ok(SimplifiedBool::Lit(*l)),
		_ => {
			let r: Literal = cnf.new_var().into();
			for &l in &lits {
				cnf.add_clause([!r, l])?;
			}
			cnf.add_clause(once(r).chain(lits.iter().map(|l| !l)))?;
			Ok(SimplifiedBool::Lit(r))
		}
	}
}

/// Create a literal `r` such that `r ↔ ⋁ args`.
pub(crate) fn or_args(
	cnf: &mut Cnf,
	args: impl IntoIterator<Item = SimplifiedBool>,
) -> Result<SimplifiedBool, ReformulationError> {
	Ok(!and_args(cnf, args.into_iter().map(Not::not))?)
}
