use std::fmt::{self, Display};

use itertools::Itertools;

use crate::{
	model::reformulate::{and_args, ReformulationError, SimplifiedBool},
	BoolExpr, Cnf, IntVal, Literal,
};

/// Comparison operator of a [`BoolLinear`] constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
	Equal,
	NotEqual,
	LessEq,
	GreaterEq,
}

impl Display for Comparator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Comparator::Equal => write!(f, "="),
			Comparator::NotEqual => write!(f, "≠"),
			Comparator::LessEq => write!(f, "≤"),
			Comparator::GreaterEq => write!(f, "≥"),
		}
	}
}

/// Sum of Boolean expressions, where every expression that holds counts as
/// one.
///
/// A sum is turned into a predicate using one of its comparison methods,
/// e.g. `vars.into_iter().collect::<BoolLinExp>().equals(2)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BoolLinExp {
	terms: Vec<BoolExpr>,
}

impl BoolLinExp {
	pub fn terms(&self) -> &[BoolExpr] {
		&self.terms
	}

	pub fn len(&self) -> usize {
		self.terms.len()
	}

	pub fn is_empty(&self) -> bool {
		self.terms.is_empty()
	}

	pub fn compare(self, cmp: Comparator, rhs: IntVal) -> BoolExpr {
		BoolExpr::Linear(BoolLinear {
			exp: self,
			cmp,
			rhs,
		})
	}

	pub fn equals(self, rhs: IntVal) -> BoolExpr {
		self.compare(Comparator::Equal, rhs)
	}

	pub fn not_equals(self, rhs: IntVal) -> BoolExpr {
		self.compare(Comparator::NotEqual, rhs)
	}

	pub fn at_most(self, rhs: IntVal) -> BoolExpr {
		self.compare(Comparator::LessEq, rhs)
	}

	pub fn at_least(self, rhs: IntVal) -> BoolExpr {
		self.compare(Comparator::GreaterEq, rhs)
	}

	pub fn less_than(self, rhs: IntVal) -> BoolExpr {
		self.compare(Comparator::LessEq, rhs.saturating_sub(1))
	}

	pub fn greater_than(self, rhs: IntVal) -> BoolExpr {
		self.compare(Comparator::GreaterEq, rhs.saturating_add(1))
	}
}

impl<E: Into<BoolExpr>> FromIterator<E> for BoolLinExp {
	fn from_iter<T: IntoIterator<Item = E>>(iter: T) -> Self {
		Self {
			terms: iter.into_iter().map_into().collect(),
		}
	}
}

impl<E: Into<BoolExpr>> Extend<E> for BoolLinExp {
	fn extend<T: IntoIterator<Item = E>>(&mut self, iter: T) {
		self.terms.extend(iter.into_iter().map_into());
	}
}

impl Display for BoolLinExp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.terms.is_empty() {
			write!(f, "0")
		} else {
			write!(f, "{}", self.terms.iter().format(" + "))
		}
	}
}

/// Predicate stating that the number of true terms of `exp` compares to `rhs`
/// according to `cmp`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoolLinear {
	pub(crate) exp: BoolLinExp,
	pub(crate) cmp: Comparator,
	pub(crate) rhs: IntVal,
}

impl BoolLinear {
	pub fn exp(&self) -> &BoolLinExp {
		&self.exp
	}

	pub fn comparator(&self) -> Comparator {
		self.cmp
	}

	pub fn rhs(&self) -> IntVal {
		self.rhs
	}

	pub(crate) fn constrain(&self, cnf: &mut Cnf) -> Result<(), ReformulationError> {
		match self.cmp {
			Comparator::Equal => {
				let counter = self.counter(cnf)?;
				counter.at_least(self.rhs).constrain(cnf)?;
				counter.at_most(self.rhs).constrain(cnf)
			}
			_ => self.to_arg(cnf)?.constrain(cnf),
		}
	}

	pub(crate) fn to_arg(&self, cnf: &mut Cnf) -> Result<SimplifiedBool, ReformulationError> {
		let counter = self.counter(cnf)?;
		Ok(match self.cmp {
			Comparator::GreaterEq => counter.at_least(self.rhs),
			Comparator::LessEq => counter.at_most(self.rhs),
			Comparator::Equal | Comparator::NotEqual => {
				let eq = and_args(
					cnf,
					[counter.at_least(self.rhs), counter.at_most(self.rhs)],
				)?;
				if self.cmp == Comparator::Equal {
					eq
				} else {
					!eq
				}
			}
		})
	}

	/// Reformulate the terms and create the unary counter outputs required to
	/// decide the comparison.
	fn counter(&self, cnf: &mut Cnf) -> Result<UnaryCounter, ReformulationError> {
		let mut offset: IntVal = 0;
		let mut lits = Vec::with_capacity(self.exp.len());
		for t in self.exp.terms() {
			match t.to_arg(cnf)? {
				SimplifiedBool::Val(true) => offset += 1,
				SimplifiedBool::Val(false) => {}
				SimplifiedBool::Lit(l) => lits.push(l),
			}
		}

		// Largest "at least j" output the comparison can refer to
		let needed = match self.cmp {
			Comparator::GreaterEq => self.rhs.saturating_sub(offset),
			_ => self.rhs.saturating_sub(offset).saturating_add(1),
		};
		let cap = needed.clamp(0, lits.len() as IntVal) as usize;
		let outputs = if cap == 0 {
			Vec::new()
		} else {
			totalizer(cnf, &lits, cap)?
		};
		Ok(UnaryCounter {
			offset,
			len: lits.len(),
			outputs,
		})
	}
}

impl Display for BoolLinear {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {} {}", self.exp, self.cmp, self.rhs)
	}
}

/// Unary representation of a count, where `outputs[j - 1]` holds if and only
/// if at least `offset + j` terms are true.
#[derive(Debug)]
struct UnaryCounter {
	offset: IntVal,
	len: usize,
	outputs: Vec<Literal>,
}

impl UnaryCounter {
	fn at_least(&self, k: IntVal) -> SimplifiedBool {
		let k = k.saturating_sub(self.offset);
		if k <= 0 {
			SimplifiedBool::Val(true)
		} else if k > self.len as IntVal {
			SimplifiedBool::Val(false)
		} else {
			SimplifiedBool::Lit(self.outputs[k as usize - 1])
		}
	}

	fn at_most(&self, k: IntVal) -> SimplifiedBool {
		!self.at_least(k.saturating_add(1))
	}
}

/// Totalizer encoding of the sum of `lits`, counting up to `cap`.
///
/// Returns `min(lits.len(), cap)` literals where the `j`-th literal is true if
/// and only if at least `j` of `lits` are true. The last output saturates when
/// the count is capped.
fn totalizer(
	cnf: &mut Cnf,
	lits: &[Literal],
	cap: usize,
) -> Result<Vec<Literal>, ReformulationError> {
	debug_assert!(!lits.is_empty() && cap > 0);
	if lits.len() == 1 {
		return Ok(vec![lits[0]]);
	}
	let (left, right) = lits.split_at(lits.len() / 2);
	let a = totalizer(cnf, left, cap)?;
	let b = totalizer(cnf, right, cap)?;
	let n = lits.len().min(cap);
	let r: Vec<Literal> = (0..n).map(|_| cnf.new_var().into()).collect();

	// a_i ∧ b_j → r_{i+j}
	for i in 0..=a.len() {
		for j in 0..=b.len() {
			if i + j == 0 {
				continue;
			}
			let mut cl = Vec::with_capacity(3);
			if i > 0 {
				cl.push(!a[i - 1]);
			}
			if j > 0 {
				cl.push(!b[j - 1]);
			}
			cl.push(r[(i + j).min(n) - 1]);
			cnf.add_clause(cl)?;
		}
	}
	// r_t → a_{i+1} ∨ b_{j+1}, where i + j + 1 = t
	for t in 1..=n {
		for i in 0..t.min(left.len() + 1) {
			let j = t - 1 - i;
			if j > right.len() {
				continue;
			}
			let mut cl = Vec::with_capacity(3);
			cl.push(!r[t - 1]);
			if i < a.len() {
				cl.push(a[i]);
			}
			if j < b.len() {
				cl.push(b[j]);
			}
			cnf.add_clause(cl)?;
		}
	}
	Ok(r)
}
