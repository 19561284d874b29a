//! Greedy placement.
//!
//! # Algorithm
//!
//! 1. Requests arrive in priority order.
//! 2. For each request, enumerate grid slots under its program's days,
//!    window and breaks.
//! 3. Sort slots by the staff member's preference weight, highest first.
//!    The sort is stable, so grid order breaks ties (or a seeded shuffle
//!    when a random seed is configured).
//! 4. Take the first slot where staff and class are free and some suitable
//!    room is free; the first such room in input order wins.
//!
//! # Complexity
//! O(r * s * (log s + m)) where r=requests, s=slots per request, m=rooms.

use std::cmp::Reverse;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::trace;

use super::state::{Relaxation, RunState, SessionPart};
use crate::availability::{EntryId, ResourceKey};
use crate::catalog::Catalog;
use crate::error::SchedulingError;
use crate::models::TimeSlot;

/// Candidate slot ordering: preference weight descending, ties by grid
/// order or by a seeded shuffle.
#[derive(Debug, Clone)]
pub struct SlotOrder {
    rng: Option<StdRng>,
}

impl SlotOrder {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: seed.map(StdRng::seed_from_u64),
        }
    }

    /// Grid order for ties.
    #[cfg(test)]
    pub fn deterministic() -> Self {
        Self { rng: None }
    }

    pub fn rank(&mut self, catalog: &Catalog, staff: usize, mut slots: Vec<TimeSlot>) -> Vec<TimeSlot> {
        if let Some(rng) = self.rng.as_mut() {
            slots.shuffle(rng);
        }
        slots.sort_by_key(|s| Reverse(catalog.preference_weight(staff, s)));
        slots
    }
}

/// First (slot, room) pair where the request fits.
///
/// `ignore` is the session being moved, whose own bookings don't count.
pub fn find_placement(
    state: &RunState<'_>,
    order: &mut SlotOrder,
    job: usize,
    duration_min: i32,
    relax: Relaxation,
    ignore: Option<EntryId>,
) -> Option<(TimeSlot, usize)> {
    let catalog = state.catalog;
    let j = catalog.job(job);
    let query = state.query(job, duration_min, relax);
    let slots = order.rank(catalog, j.staff, state.grid.slots(&query).collect());
    let rooms = catalog.suitable_rooms(job, relax.any_room_kind);
    if rooms.is_empty() {
        return None;
    }

    let index = state.index();
    slots.into_iter().find_map(|slot| {
        if !index.is_available_except(ResourceKey::Staff(j.staff), &slot, ignore)
            || !index.is_available_except(ResourceKey::Class(j.class), &slot, ignore)
        {
            return None;
        }
        rooms
            .iter()
            .copied()
            .find(|&r| index.is_available_except(ResourceKey::Room(r), &slot, ignore))
            .map(|room| (slot, room))
    })
}

/// Moves an existing session to the best alternative placement.
pub fn relocate(state: &mut RunState<'_>, order: &mut SlotOrder, id: EntryId) -> bool {
    let Some(s) = state.session(id).copied() else {
        return false;
    };
    let found = find_placement(state, order, s.job, s.slot.duration_min(), s.relax, Some(id));
    match found {
        Some((slot, room)) if (slot, room) != (s.slot, s.room) => state.try_move(id, slot, room),
        _ => false,
    }
}

/// Places one request as a whole session.
///
/// Returns `false` and leaves the state unchanged when nothing fits.
pub fn place_whole(state: &mut RunState<'_>, order: &mut SlotOrder, job: usize, relax: Relaxation) -> bool {
    let duration = state.duration_for(job);
    match find_placement(state, order, job, duration, relax, None) {
        Some((slot, room)) => {
            state.place(job, room, slot, SessionPart::Whole, relax);
            trace!(
                event = "placed",
                request = %state.catalog.job(job).request.id,
                slot = %slot,
                room = %state.catalog.rooms[room].id,
            );
            true
        }
        None => false,
    }
}

/// Places requests in the given order. Unplaceable requests join the failed
/// list with `NoAvailableSlot`.
pub fn place_all(state: &mut RunState<'_>, order: &mut SlotOrder, jobs: &[usize]) {
    for &job in jobs {
        if !place_whole(state, order, job, Relaxation::NONE) {
            let request_id = state.catalog.job(job).request.id.clone();
            trace!(event = "no_slot", request = %request_id);
            state.fail(job, SchedulingError::NoAvailableSlot { request_id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::grid::TimeGrid;
    use crate::models::{
        hm, ClassGroup, Day, Module, Program, Room, SchedulingInput, SchedulingRequest,
        SchedulingScope, TeacherPreference, TimeWindow,
    };

    fn input() -> SchedulingInput {
        SchedulingInput::new(
            SchedulingScope::new("2024/2025", 1, TimeWindow::hours((8, 0), (18, 0)))
                .with_break(TimeWindow::hours((13, 0), (14, 0))),
        )
        .with_module(Module::new("M1").with_credit(10))
        .with_module(Module::new("LAB").with_credit(10).with_kind("Laboratory"))
        .with_program(Program::new("P1", "6"))
        .with_class(ClassGroup::new("C1", "BIT1", "A", 30, "P1"))
        .with_class(ClassGroup::new("C2", "BIT2", "A", 30, "P1"))
        .with_room(Room::new("R1", "Lecture", 40))
        .with_request(SchedulingRequest::new("Q1", "C1", "M1", "S1", "P1"))
        .with_request(SchedulingRequest::new("Q2", "C2", "M1", "S2", "P1"))
        .with_request(SchedulingRequest::new("Q3", "C1", "LAB", "S3", "P1"))
        .with_preference(TeacherPreference::new(
            "S1",
            Day::Mon,
            TimeWindow::hours((9, 0), (11, 0)),
            5,
        ))
    }

    fn setup(input: &SchedulingInput) -> (Catalog, TimeGrid) {
        (
            Catalog::build(input).unwrap(),
            TimeGrid::new(&input.scope, &SchedulerConfig::default()),
        )
    }

    #[test]
    fn test_preferred_slot_first() {
        let input = input();
        let (catalog, grid) = setup(&input);
        let state = RunState::new(&catalog, &grid);
        let found = find_placement(&state, &mut SlotOrder::deterministic(), 0, 120, Relaxation::NONE, None);
        assert_eq!(found, Some((TimeSlot::new(Day::Mon, hm(9, 0), hm(11, 0)), 0)));
    }

    #[test]
    fn test_shared_room_contention() {
        let input = input();
        let (catalog, grid) = setup(&input);
        let mut state = RunState::new(&catalog, &grid);
        let mut order = SlotOrder::deterministic();
        place_all(&mut state, &mut order, &[0, 1]);
        assert_eq!(state.live_count(), 2);
        let a = state.session(0).unwrap().slot;
        let b = state.session(1).unwrap().slot;
        assert!(!a.overlaps(&b));
        // Q1 holds R1 09:00-11:00; Q2 takes the first grid slot after it.
        assert_eq!(a, TimeSlot::new(Day::Mon, hm(9, 0), hm(11, 0)));
        assert_eq!(b, TimeSlot::new(Day::Mon, hm(11, 0), hm(13, 0)));
    }

    #[test]
    fn test_no_suitable_room_fails() {
        let input = input();
        let (catalog, grid) = setup(&input);
        let mut state = RunState::new(&catalog, &grid);
        place_all(&mut state, &mut SlotOrder::deterministic(), &[2]);
        assert_eq!(state.live_count(), 0);
        assert_eq!(
            state.failed[0].cause,
            SchedulingError::NoAvailableSlot {
                request_id: "Q3".into()
            }
        );

        let relaxed = Relaxation {
            any_room_kind: true,
            ..Relaxation::NONE
        };
        assert!(place_whole(&mut state, &mut SlotOrder::deterministic(), 2, relaxed));
    }

    #[test]
    fn test_seeded_order_reproducible() {
        let input = input();
        let (catalog, grid) = setup(&input);
        let state = RunState::new(&catalog, &grid);
        let q = state.query(1, 120, Relaxation::NONE);
        let slots: Vec<TimeSlot> = grid.slots(&q).collect();

        let a = SlotOrder::new(Some(42)).rank(&catalog, 1, slots.clone());
        let b = SlotOrder::new(Some(42)).rank(&catalog, 1, slots.clone());
        assert_eq!(a, b);
        assert_eq!(SlotOrder::deterministic().rank(&catalog, 1, slots.clone()), slots);
    }

    #[test]
    fn test_relocate_moves_session() {
        let input = input();
        let (catalog, grid) = setup(&input);
        let mut state = RunState::new(&catalog, &grid);
        let mut order = SlotOrder::deterministic();
        let slot = TimeSlot::new(Day::Mon, hm(9, 0), hm(11, 0));
        let a = state.place(0, 0, slot, SessionPart::Whole, Relaxation::NONE);
        let b = state.place(1, 0, slot, SessionPart::Whole, Relaxation::NONE);
        assert!(relocate(&mut state, &mut order, b));
        assert!(!state.session(a).unwrap().slot.overlaps(&state.session(b).unwrap().slot));
    }
}
