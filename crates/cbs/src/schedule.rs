//! Assignment of persons to events on top of the Boolean [`Model`].

use std::{
	collections::HashMap,
	fmt::{self, Display},
	hash::Hash,
	vec,
};

use index_vec::IndexVec;
use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
	model::reformulate::ReformulationError, Assignment, BoolExpr, BoolLinExp, BoolVar, IntVal,
	Model, SatOracle, SolveResult, Varisat,
};

/// Name of the constraint group installed by
/// [`ScheduleModel::set_persons_per_event`]
pub const PERSONS_PER_EVENT: &str = "persons_per_event";

index_vec::define_index_type! {
	struct PersonRef = u32;
}

/// Reasons why a [`ScheduleModel`] cannot be created
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidArgument {
	#[error("the number of events must be positive")]
	NoEvents,
	#[error("at least one person is required")]
	NoPersons,
	#[error("the person at position {0} occurs more than once")]
	DuplicatePerson(usize),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
	#[error("invalid argument: {0}")]
	InvalidArgument(#[from] InvalidArgument),
	/// The current constraints admit no assignment
	#[error("no schedule satisfies the constraints")]
	Unsatisfiable,
	/// The oracle gave up before the satisfiability of the constraints was
	/// decided
	#[error("the solver did not reach a conclusion")]
	Timeout,
}

impl From<ReformulationError> for ScheduleError {
	fn from(value: ReformulationError) -> Self {
		match value {
			ReformulationError::TrivialUnsatisfiable => ScheduleError::Unsatisfiable,
		}
	}
}

/// A named and replaceable set of predicates over the assignment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintGroup {
	name: String,
	description: Option<String>,
	predicates: Vec<BoolExpr>,
}

impl ConstraintGroup {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn description(&self) -> Option<&str> {
		self.description.as_deref()
	}

	pub fn predicates(&self) -> &[BoolExpr] {
		&self.predicates
	}
}

/// Scheduling model that assigns a fixed set of persons to a sequence of
/// events.
///
/// Every person has one Boolean variable per event, which is true when the
/// person is assigned to that event. Constraints on these variables are
/// organised in named groups, where setting a group with an existing name
/// replaces it. A new model requires exactly one person per event.
///
/// Solving is delegated to a [`SatOracle`], which defaults to [`Varisat`].
#[derive(Debug)]
pub struct ScheduleModel<P, O = Varisat> {
	/// Number of events
	events: usize,
	/// Persons in the order they were given
	persons: IndexVec<PersonRef, P>,
	/// Reverse lookup of persons
	index: HashMap<P, PersonRef>,
	/// Assignment variables of each person, indexed by event
	vars: IndexVec<PersonRef, Vec<BoolVar>>,
	/// Variable pool without constraints
	pool: Model,
	/// Constraint groups in order of first insertion
	constraints: Vec<ConstraintGroup>,
	/// Satisfiability oracle
	oracle: O,
	/// Assignment of the last successful solve
	solution: Option<Assignment>,
}

impl<P: Clone + Eq + Hash> ScheduleModel<P> {
	/// Create a model for `events` events and the given persons, solved using
	/// [`Varisat`].
	pub fn new(
		events: usize,
		persons: impl IntoIterator<Item = P>,
	) -> Result<Self, ScheduleError> {
		Self::with_oracle(events, persons, Varisat)
	}
}

impl<P: Clone + Eq + Hash, O: SatOracle> ScheduleModel<P, O> {
	/// Create a model for `events` events and the given persons, solved using
	/// `oracle`.
	pub fn with_oracle(
		events: usize,
		persons: impl IntoIterator<Item = P>,
		oracle: O,
	) -> Result<Self, ScheduleError> {
		if events == 0 {
			return Err(InvalidArgument::NoEvents.into());
		}
		let mut index = HashMap::new();
		let mut list = IndexVec::new();
		for (i, p) in persons.into_iter().enumerate() {
			if index.contains_key(&p) {
				return Err(InvalidArgument::DuplicatePerson(i).into());
			}
			let idx = list.push(p.clone());
			let _ = index.insert(p, idx);
		}
		if list.is_empty() {
			return Err(InvalidArgument::NoPersons.into());
		}

		let mut pool = Model::default();
		let vars = list.iter().map(|_| pool.new_bool_var_range(events)).collect();

		let mut model = Self {
			events,
			persons: list,
			index,
			vars,
			pool,
			constraints: Vec::new(),
			oracle,
			solution: None,
		};
		model.set_persons_per_event(1);
		Ok(model)
	}

	pub fn num_events(&self) -> usize {
		self.events
	}

	/// Persons in the order given at construction
	pub fn persons(&self) -> &[P] {
		&self.persons.raw
	}

	/// Variable stating whether `person` is assigned to `event`
	pub fn var(&self, person: &P, event: usize) -> Option<BoolVar> {
		self.person_vars(person)?.get(event).copied()
	}

	/// Variables of `person`, indexed by event
	pub fn person_vars(&self, person: &P) -> Option<&[BoolVar]> {
		let idx = self.index.get(person)?;
		Some(&self.vars[*idx])
	}

	/// Variables of all persons for `event`, in person order
	///
	/// # Panics
	///
	/// Panics if `event` is not smaller than [`Self::num_events`].
	pub fn event_vars(&self, event: usize) -> impl Iterator<Item = BoolVar> + '_ {
		assert!(
			event < self.events,
			"event {event} out of range for {} events",
			self.events
		);
		self.vars.iter().map(move |v| v[event])
	}

	/// Add a constraint group, or replace the group with the same name.
	///
	/// A replaced group keeps its position among the other groups. The
	/// predicates are collected immediately and are reused by every later
	/// solve. All predicates must only refer to variables of this model, see
	/// [`Self::var`], [`Self::person_vars`] and [`Self::event_vars`].
	pub fn set_constraint<E: Into<BoolExpr>>(
		&mut self,
		name: impl Into<String>,
		description: Option<&str>,
		predicates: impl IntoIterator<Item = E>,
	) {
		let group = ConstraintGroup {
			name: name.into(),
			description: description.map(str::to_owned),
			predicates: predicates.into_iter().map_into().collect(),
		};
		debug_assert!(!group.name.is_empty(), "constraint names must not be empty");
		match self.constraints.iter_mut().find(|c| c.name == group.name) {
			Some(existing) => {
				trace!(
					name = %group.name,
					predicates = group.predicates.len(),
					"replace constraint group"
				);
				*existing = group;
			}
			None => {
				trace!(
					name = %group.name,
					predicates = group.predicates.len(),
					"add constraint group"
				);
				self.constraints.push(group);
			}
		}
	}

	/// Require exactly `n` persons to be assigned to every event.
	///
	/// This replaces the [`PERSONS_PER_EVENT`] group, including the default
	/// requirement of one person per event. A value of `n` that cannot be
	/// met only surfaces as [`ScheduleError::Unsatisfiable`] when solving.
	pub fn set_persons_per_event(&mut self, n: IntVal) {
		let predicates = (0..self.events)
			.map(|e| self.event_vars(e).collect::<BoolLinExp>().equals(n))
			.collect_vec();
		self.set_constraint(
			PERSONS_PER_EVENT,
			Some(&format!(
				"The total number of persons required for each event is {n}."
			)),
			predicates,
		);
	}

	pub fn constraint(&self, name: &str) -> Option<&ConstraintGroup> {
		self.constraints.iter().find(|c| c.name == name)
	}

	/// Constraint groups in order of first insertion
	pub fn constraints(&self) -> impl Iterator<Item = &ConstraintGroup> + '_ {
		self.constraints.iter()
	}

	pub fn remove_constraint(&mut self, name: &str) -> Option<ConstraintGroup> {
		let pos = self.constraints.iter().position(|c| c.name == name)?;
		Some(self.constraints.remove(pos))
	}

	/// Solve the conjunction of all current constraint groups.
	///
	/// On success the assignment can be read using [`Self::value`]. Any
	/// previous assignment is discarded first, also when solving fails.
	pub fn solve(&mut self) -> Result<(), ScheduleError> {
		self.solution = None;
		let sol = self.find_assignment()?;
		self.solution = Some(sol);
		Ok(())
	}

	/// Value of the assignment variable of `person` and `event` in the last
	/// successful solve
	pub fn value(&self, person: &P, event: usize) -> Option<bool> {
		let sol = self.solution.as_ref()?;
		Some(sol.value(self.var(person, event)?))
	}

	/// Solve the current constraints and return the resulting schedule.
	pub fn schedule(&mut self) -> Result<Schedule<P>, ScheduleError> {
		self.solve()?;
		let rows = self
			.persons
			.iter()
			.map(|p| {
				let row = (0..self.events)
					.map(|e| u8::from(self.value(p, e) == Some(true)))
					.collect();
				(p.clone(), row)
			})
			.collect();
		Ok(Schedule {
			events: self.events,
			rows,
		})
	}

	fn find_assignment(&mut self) -> Result<Assignment, ScheduleError> {
		let mut prb = self.pool.clone();
		for group in &self.constraints {
			prb.extend(group.predicates.iter().cloned());
		}
		debug!(
			events = self.events,
			persons = self.persons.len(),
			groups = self.constraints.len(),
			predicates = prb.num_constraints(),
			"solve schedule"
		);

		let mut solution = None;
		match prb.solve(&mut self.oracle, |sol| solution = Some(sol.clone())) {
			SolveResult::Satisfied => solution.ok_or(ScheduleError::Timeout),
			SolveResult::Unsatisfiable => Err(ScheduleError::Unsatisfiable),
			SolveResult::Unknown | SolveResult::Complete => Err(ScheduleError::Timeout),
		}
	}
}

/// Assignment of persons to events, as produced by
/// [`ScheduleModel::schedule`]
///
/// Persons are kept in the order given to the model, each with one `0` or
/// `1` per event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule<P> {
	events: usize,
	rows: Vec<(P, Vec<u8>)>,
}

impl<P> Schedule<P> {
	pub fn num_events(&self) -> usize {
		self.events
	}

	/// Number of persons
	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&P, &[u8])> + '_ {
		self.rows.iter().map(|(p, row)| (p, row.as_slice()))
	}

	/// Number of persons assigned to `event`
	pub fn event_total(&self, event: usize) -> usize {
		self.rows
			.iter()
			.filter(|(_, row)| row.get(event) == Some(&1))
			.count()
	}

	/// Persons assigned to `event`
	pub fn assigned(&self, event: usize) -> impl Iterator<Item = &P> + '_ {
		self.rows
			.iter()
			.filter(move |(_, row)| row.get(event) == Some(&1))
			.map(|(p, _)| p)
	}
}

impl<P: PartialEq> Schedule<P> {
	pub fn get(&self, person: &P) -> Option<&[u8]> {
		self.rows
			.iter()
			.find(|(p, _)| p == person)
			.map(|(_, row)| row.as_slice())
	}
}

impl<P> IntoIterator for Schedule<P> {
	type Item = (P, Vec<u8>);
	type IntoIter = vec::IntoIter<(P, Vec<u8>)>;
	fn into_iter(self) -> Self::IntoIter {
		self.rows.into_iter()
	}
}

impl<P: Eq + Hash> From<Schedule<P>> for HashMap<P, Vec<u8>> {
	fn from(value: Schedule<P>) -> Self {
		value.rows.into_iter().collect()
	}
}

impl<P: Display> Display for Schedule<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}",
			self.rows.iter().format_with("\n", |(p, row), g| {
				g(&format_args!("{p}: {}", row.iter().format(" ")))
			})
		)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use expect_test::expect;
	use itertools::Itertools;

	use crate::{
		BoolExpr, BoolLinExp, Cnf, InvalidArgument, SatOutcome, Schedule, ScheduleError,
		ScheduleModel, Varisat, PERSONS_PER_EVENT,
	};

	const PERSONS: [&str; 3] = ["Rick", "Morty", "Summer"];

	fn assert_column_sums(schedule: &Schedule<&str>, n: usize) {
		for e in 0..schedule.num_events() {
			assert_eq!(schedule.event_total(e), n, "event {e} in\n{schedule}");
		}
	}

	#[test]
	fn test_invalid_construction() {
		assert_eq!(
			ScheduleModel::new(0, PERSONS).unwrap_err(),
			ScheduleError::InvalidArgument(InvalidArgument::NoEvents)
		);
		assert_eq!(
			ScheduleModel::<&str>::new(3, []).unwrap_err(),
			ScheduleError::InvalidArgument(InvalidArgument::NoPersons)
		);
		assert_eq!(
			ScheduleModel::new(3, ["Rick", "Morty", "Rick"]).unwrap_err(),
			ScheduleError::InvalidArgument(InvalidArgument::DuplicatePerson(2))
		);
	}

	#[test]
	fn test_construction() {
		let model = ScheduleModel::new(6, PERSONS).unwrap();
		assert_eq!(model.num_events(), 6);
		assert_eq!(model.persons(), &PERSONS);
		for p in PERSONS {
			assert_eq!(model.person_vars(&p).unwrap().len(), 6);
		}
		assert_eq!(model.person_vars(&"Jerry"), None);
		assert_eq!(model.event_vars(5).count(), 3);
		assert_eq!(model.var(&"Morty", 6), None);

		let all = PERSONS
			.iter()
			.flat_map(|p| model.person_vars(p).unwrap())
			.unique()
			.count();
		assert_eq!(all, 18);

		let groups = model.constraints().map(|c| c.name()).collect_vec();
		assert_eq!(groups, vec![PERSONS_PER_EVENT]);
		let default = model.constraint(PERSONS_PER_EVENT).unwrap();
		assert_eq!(default.predicates().len(), 6);
		expect!["The total number of persons required for each event is 1."]
			.assert_eq(default.description().unwrap());
		expect!["x1 + x7 + x13 = 1"].assert_eq(&default.predicates()[0].to_string());
	}

	#[test]
	fn test_default_schedule() {
		let mut model = ScheduleModel::new(3, PERSONS).unwrap();
		let schedule = model.schedule().unwrap();
		assert_eq!(schedule.len(), 3);
		assert_eq!(schedule.num_events(), 3);
		assert_column_sums(&schedule, 1);
		for (_, row) in schedule.iter() {
			assert_eq!(row.len(), 3);
			assert!(row.iter().all(|&v| v <= 1));
		}
	}

	#[test]
	fn test_persons_per_event_replaces_default() {
		let mut model = ScheduleModel::new(3, PERSONS).unwrap();
		model.set_persons_per_event(2);
		model.set_persons_per_event(2);
		assert_eq!(model.constraints().count(), 1);
		expect!["The total number of persons required for each event is 2."].assert_eq(
			model
				.constraint(PERSONS_PER_EVENT)
				.unwrap()
				.description()
				.unwrap(),
		);
		assert_column_sums(&model.schedule().unwrap(), 2);

		model.set_persons_per_event(0);
		assert_column_sums(&model.schedule().unwrap(), 0);
	}

	#[test]
	fn test_set_constraint_replaces_in_place() {
		let mut model = ScheduleModel::new(2, PERSONS).unwrap();
		let rick = model.person_vars(&"Rick").unwrap().to_vec();
		model.set_constraint("rick_busy", Some("Rick attends every event"), rick.clone());
		model.set_constraint("morty_off", None, [!model.var(&"Morty", 0).unwrap()]);
		model.set_constraint("rick_busy", None, rick.iter().map(|&v| !v));

		let names = model.constraints().map(|c| c.name()).collect_vec();
		assert_eq!(names, vec![PERSONS_PER_EVENT, "rick_busy", "morty_off"]);
		let group = model.constraint("rick_busy").unwrap();
		assert_eq!(group.description(), None);
		assert_eq!(group.predicates().len(), 2);

		let schedule = model.schedule().unwrap();
		assert_eq!(schedule.get(&"Rick"), Some([0, 0].as_slice()));
		assert_eq!(schedule.get(&"Morty").unwrap()[0], 0);
		assert_eq!(schedule.get(&"Summer").unwrap()[0], 1);
		assert_column_sums(&schedule, 1);
	}

	#[test]
	fn test_custom_constraints() {
		let mut model = ScheduleModel::new(4, PERSONS).unwrap();
		// Every person attends at least one event
		let fair = PERSONS
			.iter()
			.map(|p| {
				model
					.person_vars(p)
					.unwrap()
					.iter()
					.collect::<BoolLinExp>()
					.at_least(1)
			})
			.collect_vec();
		model.set_constraint("fair", Some("Everybody attends an event"), fair);
		// Summer never attends two consecutive events
		let summer = model.person_vars(&"Summer").unwrap().to_vec();
		model.set_constraint(
			"summer_rest",
			None,
			summer
				.iter()
				.tuple_windows()
				.map(|(&a, &b)| BoolExpr::from(a).implies(!b)),
		);
		model.set_constraint("summer_first", None, [summer[0]]);

		let schedule = model.schedule().unwrap();
		assert_column_sums(&schedule, 1);
		for (_, row) in schedule.iter() {
			assert!(row.contains(&1));
		}
		let summer = schedule.get(&"Summer").unwrap();
		assert_eq!(summer[0], 1);
		assert_eq!(summer[1], 0);
	}

	#[test]
	fn test_unsatisfiable() {
		let mut model = ScheduleModel::new(3, PERSONS).unwrap();
		model.set_persons_per_event(4);
		assert_eq!(model.schedule(), Err(ScheduleError::Unsatisfiable));
		model.set_persons_per_event(-1);
		assert_eq!(model.schedule(), Err(ScheduleError::Unsatisfiable));

		let mut model = ScheduleModel::new(2, PERSONS).unwrap();
		let nobody = PERSONS.map(|p| !model.var(&p, 1).unwrap());
		model.set_constraint("nobody", None, nobody);
		assert_eq!(model.solve(), Err(ScheduleError::Unsatisfiable));
	}

	#[test]
	fn test_failure_clears_assignment() {
		let mut model = ScheduleModel::new(2, PERSONS).unwrap();
		assert_eq!(model.value(&"Rick", 0), None);
		model.solve().unwrap();
		let total = PERSONS
			.iter()
			.filter(|p| model.value(p, 1) == Some(true))
			.count();
		assert_eq!(total, 1);
		assert_eq!(model.value(&"Rick", 2), None);

		model.set_persons_per_event(5);
		assert_eq!(model.solve(), Err(ScheduleError::Unsatisfiable));
		assert_eq!(model.value(&"Rick", 0), None);

		assert!(model.remove_constraint(PERSONS_PER_EVENT).is_some());
		assert!(model.remove_constraint(PERSONS_PER_EVENT).is_none());
		assert!(model.solve().is_ok());
		assert!(model.value(&"Rick", 0).is_some());
	}

	#[test]
	fn test_schedule_matches_stored_assignment() {
		let mut model = ScheduleModel::new(4, PERSONS).unwrap();
		model.set_persons_per_event(2);
		let schedule = model.schedule().unwrap();
		for (p, row) in schedule.iter() {
			for (e, &v) in row.iter().enumerate() {
				assert_eq!(model.value(p, e), Some(v == 1), "{p} at event {e}");
			}
		}

		model.set_persons_per_event(4);
		assert_eq!(model.schedule(), Err(ScheduleError::Unsatisfiable));
		assert_eq!(model.value(&"Rick", 0), None);
	}

	#[test]
	fn test_timeout() {
		let mut calls = 0;
		let oracle = |_: &Cnf| {
			calls += 1;
			SatOutcome::Unknown
		};
		let mut model = ScheduleModel::with_oracle(2, PERSONS, oracle).unwrap();
		assert_eq!(model.schedule(), Err(ScheduleError::Timeout));
		assert_eq!(model.schedule(), Err(ScheduleError::Timeout));
		drop(model);
		assert_eq!(calls, 2);
	}

	#[test]
	fn test_explicit_oracle() {
		let mut model = ScheduleModel::with_oracle(3, [1, 2, 3, 4], Varisat).unwrap();
		model.set_persons_per_event(3);
		let schedule = model.schedule().unwrap();
		for e in 0..3 {
			assert_eq!(schedule.assigned(e).count(), 3);
		}
	}

	#[test]
	fn test_schedule_conversions() {
		let schedule = Schedule {
			events: 3,
			rows: vec![("Rick", vec![1, 0, 1]), ("Morty", vec![0, 1, 0])],
		};
		expect![[r#"
			Rick: 1 0 1
			Morty: 0 1 0"#]]
		.assert_eq(&schedule.to_string());
		assert_eq!(schedule.assigned(1).collect_vec(), vec![&"Morty"]);
		assert_eq!(schedule.event_total(0), 1);
		assert_eq!(schedule.get(&"Summer"), None);

		let map: HashMap<_, _> = schedule.clone().into();
		assert_eq!(map.len(), 2);
		assert_eq!(map["Rick"], vec![1, 0, 1]);

		let persons = schedule.into_iter().map(|(p, _)| p).collect_vec();
		assert_eq!(persons, vec!["Rick", "Morty"]);
	}
}
