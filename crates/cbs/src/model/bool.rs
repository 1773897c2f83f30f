use std::{
	fmt::{self, Display},
	ops::Not,
};

use itertools::Itertools;
use varisat::{Lit as RawLit, Var as RawVar};

use crate::model::linear::BoolLinear;

/// A Boolean predicate over the decision variables of a [`crate::Model`].
///
/// Expressions are plain trees and are only turned into clauses when the
/// model is reformulated. Referencing variables that were not created by the
/// model the expression is added to is a precondition violation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoolExpr {
	/// Constant truth value
	Val(bool),
	/// A (possibly negated) decision variable
	Lit(Literal),
	Not(Box<BoolExpr>),
	/// Conjunction, `true` when empty
	And(Vec<BoolExpr>),
	/// Disjunction, `false` when empty
	Or(Vec<BoolExpr>),
	Implies(Box<BoolExpr>, Box<BoolExpr>),
	/// All operands take the same value
	Equiv(Vec<BoolExpr>),
	/// Comparison of a count of true expressions against a constant
	Linear(BoolLinear),
}

impl BoolExpr {
	pub fn implies(self, rhs: impl Into<BoolExpr>) -> BoolExpr {
		BoolExpr::Implies(Box::new(self), Box::new(rhs.into()))
	}
}

impl Not for BoolExpr {
	type Output = BoolExpr;
	fn not(self) -> Self::Output {
		match self {
			BoolExpr::Lit(l) => BoolExpr::Lit(!l),
			BoolExpr::Val(v) => BoolExpr::Val(!v),
			BoolExpr::Not(e) => *e,
			e => BoolExpr::Not(Box::new(e)),
		}
	}
}

impl Not for &BoolExpr {
	type Output = BoolExpr;
	fn not(self) -> Self::Output {
		match self {
			BoolExpr::Lit(l) => BoolExpr::Lit(!*l),
			BoolExpr::Val(v) => BoolExpr::Val(!*v),
			BoolExpr::Not(e) => (**e).clone(),
			e => BoolExpr::Not(Box::new(e.clone())),
		}
	}
}

impl From<bool> for BoolExpr {
	fn from(value: bool) -> Self {
		BoolExpr::Val(value)
	}
}

impl From<BoolLinear> for BoolExpr {
	fn from(value: BoolLinear) -> Self {
		BoolExpr::Linear(value)
	}
}

impl Display for BoolExpr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BoolExpr::Val(v) => write!(f, "{v}"),
			BoolExpr::Lit(l) => write!(f, "{l}"),
			BoolExpr::Not(e) => write!(f, "¬({e})"),
			BoolExpr::And(es) if es.is_empty() => write!(f, "true"),
			BoolExpr::And(es) => write!(f, "({})", es.iter().format(" ∧ ")),
			BoolExpr::Or(es) if es.is_empty() => write!(f, "false"),
			BoolExpr::Or(es) => write!(f, "({})", es.iter().format(" ∨ ")),
			BoolExpr::Implies(a, b) => write!(f, "({a} → {b})"),
			BoolExpr::Equiv(es) if es.len() < 2 => write!(f, "true"),
			BoolExpr::Equiv(es) => write!(f, "({})", es.iter().format(" ↔ ")),
			BoolExpr::Linear(lin) => write!(f, "{lin}"),
		}
	}
}

/// A Boolean decision variable
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoolVar(pub(crate) RawVar);

impl BoolVar {
	/// Zero-based position of the variable in its model
	pub fn index(&self) -> usize {
		self.0.index()
	}
}

impl Not for BoolVar {
	type Output = Literal;
	fn not(self) -> Self::Output {
		!Literal::from(self)
	}
}
impl Not for &BoolVar {
	type Output = Literal;
	fn not(self) -> Self::Output {
		!*self
	}
}

impl Display for BoolVar {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "x{}", self.0.to_dimacs())
	}
}

impl From<BoolVar> for RawVar {
	fn from(val: BoolVar) -> Self {
		val.0
	}
}
impl From<BoolVar> for BoolExpr {
	fn from(value: BoolVar) -> Self {
		BoolExpr::Lit(value.into())
	}
}
impl From<&BoolVar> for BoolExpr {
	fn from(value: &BoolVar) -> Self {
		BoolExpr::Lit((*value).into())
	}
}

/// A Boolean decision variable or its negation
///
/// Literals are ordered by variable first, with the positive literal before
/// the negated one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal(pub(crate) RawLit);

impl Literal {
	pub fn var(&self) -> BoolVar {
		BoolVar(self.0.var())
	}
	pub fn is_negated(&self) -> bool {
		self.0.is_negative()
	}
}

impl Not for Literal {
	type Output = Literal;
	fn not(self) -> Self::Output {
		Literal(!self.0)
	}
}
impl Not for &Literal {
	type Output = Literal;
	fn not(self) -> Self::Output {
		!(*self)
	}
}

impl From<BoolVar> for Literal {
	fn from(value: BoolVar) -> Self {
		Literal(value.0.positive())
	}
}
impl From<Literal> for RawLit {
	fn from(val: Literal) -> Self {
		val.0
	}
}
impl From<Literal> for BoolExpr {
	fn from(value: Literal) -> Self {
		BoolExpr::Lit(value)
	}
}

impl Display for Literal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_negated() {
			write!(f, "¬{}", self.var())
		} else {
			write!(f, "{}", self.var())
		}
	}
}
