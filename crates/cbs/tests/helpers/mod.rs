use std::{collections::HashMap, fmt::Debug, hash::Hash};

use cbs::{Schedule, ScheduleModel};

pub(crate) const PERSONS: [&str; 3] = ["Rick", "Morty", "Summer"];

/// Check that `schedule` has one row of `events` zeros and ones for exactly
/// the given persons.
pub(crate) fn check_shape<P: Clone + Debug + Eq + Hash>(
	schedule: &Schedule<P>,
	persons: &[P],
	events: usize,
) {
	assert_eq!(schedule.num_events(), events);
	let map: HashMap<P, Vec<u8>> = schedule.clone().into();
	assert_eq!(map.len(), persons.len(), "persons of {schedule:?}");
	for p in persons {
		let Some(row) = map.get(p) else {
			panic!("person {p:?} missing from {schedule:?}")
		};
		assert_eq!(row.len(), events, "row of {p:?}");
		assert!(
			row.iter().all(|&v| v == 0 || v == 1),
			"row of {p:?} is not binary: {row:?}"
		);
	}
}

/// Check that exactly `n` persons are assigned to every event.
pub(crate) fn check_column_sums<P: Debug>(schedule: &Schedule<P>, n: usize) {
	for e in 0..schedule.num_events() {
		let total: usize = schedule.iter().map(|(_, row)| usize::from(row[e])).sum();
		assert_eq!(total, n, "event {e} of {schedule:?}");
	}
}

/// Solve the model and check the resulting schedule for `n` persons per
/// event.
pub(crate) fn check_schedule<P: Clone + Debug + Eq + Hash>(
	model: &mut ScheduleModel<P>,
	n: usize,
) -> Schedule<P> {
	let schedule = match model.schedule() {
		Ok(schedule) => schedule,
		Err(err) => panic!("unable to find schedule: {err}"),
	};
	check_shape(&schedule, &model.persons().to_vec(), model.num_events());
	check_column_sums(&schedule, n);
	schedule
}
