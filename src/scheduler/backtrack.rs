//! Exhaustive backtracking search.
//!
//! Requests are assigned in ranked order. Each request gets a choice-point
//! frame listing every free (slot, room) pair at the moment it is reached,
//! ordered by preference weight and then by room continuity. A dead end
//! undoes the latest placement and advances that frame; an exhausted frame
//! is popped and its parent advances.
//!
//! The search runs on an explicit stack, so depth is bounded only by the
//! request count, and stops early once `max_steps` placements were tried.
//!
//! # Room continuity
//! A pair is pushed back when the same room ends a session of another
//! department's module exactly when this one would start, so consecutive
//! sessions in one room tend to stay within a department.

use std::cmp::Reverse;

use tracing::debug;

use super::greedy::SlotOrder;
use super::state::{Relaxation, RunState, SessionPart};
use crate::availability::{EntryId, ResourceKey};
use crate::config::BacktrackingConfig;
use crate::models::TimeSlot;

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult {
    /// Every request placed.
    Solved { steps: usize },
    /// The first frame ran out of options.
    Exhausted { steps: usize },
    /// `max_steps` reached.
    BudgetExceeded { steps: usize },
}

impl SearchResult {
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved { .. })
    }
}

#[derive(Debug)]
struct Frame {
    job: usize,
    options: Vec<(TimeSlot, usize)>,
    next: usize,
    placed: Option<EntryId>,
}

/// Backtracking search over an empty state.
#[derive(Debug, Clone)]
pub struct BacktrackingSearch {
    max_steps: usize,
}

impl BacktrackingSearch {
    pub fn new(config: &BacktrackingConfig) -> Self {
        Self {
            max_steps: config.max_steps,
        }
    }

    /// Places every job in `jobs` order into `state`.
    ///
    /// On success the state holds one whole session per job. Otherwise the
    /// state is left with no sessions placed by the search.
    pub fn solve(&self, state: &mut RunState<'_>, order: &mut SlotOrder, jobs: &[usize]) -> SearchResult {
        let mut steps = 0usize;
        let Some(&first) = jobs.first() else {
            return SearchResult::Solved { steps };
        };
        let mut stack = vec![self.frame(state, order, first)];

        let result = loop {
            let depth = stack.len();
            let Some(frame) = stack.last_mut() else {
                break SearchResult::Exhausted { steps };
            };
            if let Some(id) = frame.placed.take() {
                state.remove(id);
            }
            if frame.next >= frame.options.len() {
                stack.pop();
                continue;
            }
            if steps >= self.max_steps {
                break SearchResult::BudgetExceeded { steps };
            }
            steps += 1;

            let (slot, room) = frame.options[frame.next];
            frame.next += 1;
            let job = frame.job;
            frame.placed = Some(state.place(job, room, slot, SessionPart::Whole, Relaxation::NONE));

            if depth == jobs.len() {
                break SearchResult::Solved { steps };
            }
            let next = self.frame(state, order, jobs[depth]);
            stack.push(next);
        };

        if !result.is_solved() {
            for frame in stack.iter_mut() {
                if let Some(id) = frame.placed.take() {
                    state.remove(id);
                }
            }
        }
        debug!(event = "backtracking_end", requests = jobs.len(), ?result);
        result
    }

    fn frame(&self, state: &RunState<'_>, order: &mut SlotOrder, job: usize) -> Frame {
        let catalog = state.catalog;
        let j = catalog.job(job);
        let duration = state.duration_for(job);
        let query = state.query(job, duration, Relaxation::NONE);
        let slots = order.rank(catalog, j.staff, state.grid.slots(&query).collect());
        let rooms = catalog.suitable_rooms(job, false);

        let mut options: Vec<(TimeSlot, usize)> = Vec::new();
        for slot in slots {
            if !state.index().is_available(ResourceKey::Staff(j.staff), &slot)
                || !state.index().is_available(ResourceKey::Class(j.class), &slot)
            {
                continue;
            }
            options.extend(
                rooms
                    .iter()
                    .filter(|&&r| state.index().is_available(ResourceKey::Room(r), &slot))
                    .map(|&r| (slot, r)),
            );
        }
        // Slots are already in preference order; a stable sort keeps it.
        options.sort_by_key(|&(slot, room)| {
            (
                Reverse(catalog.preference_weight(j.staff, &slot)),
                continuity_penalty(state, job, room, &slot),
            )
        });

        Frame {
            job,
            options,
            next: 0,
            placed: None,
        }
    }
}

/// 1 when `room` ends another department's session exactly at `slot` start.
fn continuity_penalty(state: &RunState<'_>, job: usize, room: usize, slot: &TimeSlot) -> u8 {
    let department = &state.catalog.module_of(job).department;
    let clash = state
        .index()
        .bookings(ResourceKey::Room(room))
        .iter()
        .filter(|b| b.slot.day == slot.day && b.slot.end_min == slot.start_min)
        .filter_map(|b| state.session(b.entry))
        .any(|s| state.catalog.module_of(s.job).department != *department);
    u8::from(clash)
}
