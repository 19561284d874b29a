//! Post-placement optimization passes.
//!
//! # Passes (in order)
//!
//! | Pass | Scope | Move |
//! |------|-------|------|
//! | Gap minimization | staff × day | close a mid-sized idle gap |
//! | Consecutive load | staff × day | relocate the tail of an overlong run |
//! | Stream sync | class name × module | chain parallel streams back to back |
//! | Room consolidation | class × day | keep consecutive sessions in one room |
//!
//! Every move goes through [`RunState::try_move`], which rejects anything
//! that would break a hard invariant, so each pass only ever improves or
//! keeps the schedule.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use super::state::{RunState, SessionPart};
use crate::availability::EntryId;
use crate::config::OptimizerConfig;
use crate::models::{Day, TimeSlot};

/// Moves applied by one optimizer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizerReport {
    pub gaps_closed: usize,
    pub runs_split: usize,
    pub streams_aligned: usize,
    pub rooms_consolidated: usize,
}

/// Runs the passes over a run state.
#[derive(Debug, Clone)]
pub struct Optimizer {
    config: OptimizerConfig,
}

impl Optimizer {
    pub fn new(config: &OptimizerConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// All four passes, in order. No-op when disabled.
    pub fn run(&self, state: &mut RunState<'_>) -> OptimizerReport {
        if !self.config.enabled {
            return OptimizerReport::default();
        }
        let report = OptimizerReport {
            gaps_closed: self.minimize_gaps(state),
            runs_split: self.balance_load(state),
            streams_aligned: self.synchronize_streams(state),
            rooms_consolidated: self.consolidate_rooms(state),
        };
        debug!(
            event = "optimizer_end",
            gaps_closed = report.gaps_closed,
            runs_split = report.runs_split,
            streams_aligned = report.streams_aligned,
            rooms_consolidated = report.rooms_consolidated,
        );
        report
    }

    /// Closes staff gaps strictly between `gap_lower_min` and `gap_upper_min`:
    /// pull the later session back, else push the earlier one forward.
    pub fn minimize_gaps(&self, state: &mut RunState<'_>) -> usize {
        let mut closed = 0;
        for staff in 0..state.catalog.staff.len() {
            for day in Day::ALL {
                let mut i = 0;
                loop {
                    let ids = state.staff_day(staff, day);
                    if i + 1 >= ids.len() {
                        break;
                    }
                    let (prev_id, next_id) = (ids[i], ids[i + 1]);
                    i += 1;
                    let (Some(prev), Some(next)) = (slot_of(state, prev_id), slot_of(state, next_id)) else {
                        continue;
                    };
                    let Some(gap) = prev.gap_to(&next) else {
                        continue;
                    };
                    if gap <= self.config.gap_lower_min || gap >= self.config.gap_upper_min {
                        continue;
                    }
                    let back = TimeSlot::starting_at(day, prev.end_min, next.duration_min());
                    let forward = TimeSlot::starting_at(day, next.start_min - prev.duration_min(), prev.duration_min());
                    if state.relocate_to(next_id, back) || state.relocate_to(prev_id, forward) {
                        closed += 1;
                    }
                }
            }
        }
        closed
    }

    /// Breaks up staff runs longer than `max_consecutive_min` by relocating
    /// the run's last session away from the staff member's other sessions.
    pub fn balance_load(&self, state: &mut RunState<'_>) -> usize {
        let mut relocated = 0;
        for staff in 0..state.catalog.staff.len() {
            for day in Day::ALL {
                let mut attempts = state.staff_day(staff, day).len();
                while attempts > 0 {
                    attempts -= 1;
                    let ids = state.staff_day(staff, day);
                    let Some(tail) = self.overlong_run_tail(state, &ids) else {
                        break;
                    };
                    if !self.move_away(state, staff, tail) {
                        break;
                    }
                    relocated += 1;
                }
            }
        }
        relocated
    }

    fn overlong_run_tail(&self, state: &RunState<'_>, ids: &[EntryId]) -> Option<EntryId> {
        let slots: Vec<(EntryId, TimeSlot)> = ids
            .iter()
            .filter_map(|&id| slot_of(state, id).map(|s| (id, s)))
            .collect();
        let mut run_total = 0;
        for (k, &(id, slot)) in slots.iter().enumerate() {
            run_total += slot.duration_min();
            let run_ends = match slots.get(k + 1) {
                Some(&(_, next)) => next.start_min - slot.end_min > self.config.consecutive_tolerance_min,
                None => true,
            };
            if run_ends {
                if run_total > self.config.max_consecutive_min {
                    return Some(id);
                }
                run_total = 0;
            }
        }
        None
    }

    fn move_away(&self, state: &mut RunState<'_>, staff: usize, id: EntryId) -> bool {
        let Some(s) = state.session(id).copied() else {
            return false;
        };
        let query = state.query(s.job, s.slot.duration_min(), s.relax);
        let mut candidates: Vec<TimeSlot> = state.grid.slots(&query).collect();
        // Same day first; stable, so grid order is kept within each group.
        candidates.sort_by_key(|c| c.day != s.slot.day);

        let tolerance = self.config.consecutive_tolerance_min;
        for candidate in candidates {
            if candidate == s.slot {
                continue;
            }
            let adjacent = state
                .staff_day(staff, candidate.day)
                .into_iter()
                .filter(|&other| other != id)
                .filter_map(|other| slot_of(state, other))
                .any(|o| {
                    o.overlaps(&candidate)
                        || (o.end_min <= candidate.start_min && candidate.start_min - o.end_min <= tolerance)
                        || (candidate.end_min <= o.start_min && o.start_min - candidate.end_min <= tolerance)
                });
            if !adjacent && state.relocate_to(id, candidate) {
                return true;
            }
        }
        false
    }

    /// Chains parallel streams (same class name and module, distinct class
    /// groups): each stream starts `stream_offset_min` after the previous one
    /// ends on the same day, when that slot is available.
    pub fn synchronize_streams(&self, state: &mut RunState<'_>) -> usize {
        let catalog = state.catalog;
        let mut groups: BTreeMap<(&str, usize), Vec<EntryId>> = BTreeMap::new();
        for (id, s) in state.live() {
            if s.part != SessionPart::Whole {
                continue;
            }
            let key = (catalog.class_of(s.job).name.as_str(), catalog.job(s.job).module);
            groups.entry(key).or_default().push(id);
        }

        let mut aligned = 0;
        for mut ids in groups.into_values() {
            let classes: HashSet<usize> = ids
                .iter()
                .filter_map(|&id| state.session(id).map(|s| catalog.job(s.job).class))
                .collect();
            if classes.len() < 2 {
                continue;
            }
            ids.sort_by_key(|&id| slot_of(state, id).map(|s| (s.day, s.start_min, id)));

            let Some(mut prev) = slot_of(state, ids[0]) else {
                continue;
            };
            for &id in &ids[1..] {
                let Some(current) = slot_of(state, id) else {
                    continue;
                };
                let target = TimeSlot::starting_at(
                    prev.day,
                    prev.end_min + self.config.stream_offset_min,
                    current.duration_min(),
                );
                if current != target && state.relocate_to(id, target) {
                    aligned += 1;
                }
                prev = slot_of(state, id).unwrap_or(current);
            }
        }
        aligned
    }

    /// Keeps a class's consecutive sessions of a day in one room.
    ///
    /// On a room change, moving the new session into the current room costs
    /// one move and moving the current run into the new room costs one move
    /// per session, so the former is tried first.
    pub fn consolidate_rooms(&self, state: &mut RunState<'_>) -> usize {
        let mut moves = 0;
        for class in 0..state.catalog.classes.len() {
            for day in Day::ALL {
                let ids = state.class_day(class, day);
                let Some((&first, rest)) = ids.split_first() else {
                    continue;
                };
                let Some(mut current) = state.session(first).map(|s| s.room) else {
                    continue;
                };
                let mut run = vec![first];

                for &id in rest {
                    let Some(s) = state.session(id).copied() else {
                        continue;
                    };
                    if s.room == current {
                        run.push(id);
                        continue;
                    }
                    // One move never costs more than moving the whole run.
                    let joined_current = state.try_move(id, s.slot, current);
                    let joined_new = !joined_current && move_run(state, &run, s.room);

                    if joined_current {
                        moves += 1;
                    } else if joined_new {
                        moves += run.len();
                        current = s.room;
                    } else {
                        current = s.room;
                        run.clear();
                    }
                    run.push(id);
                }
            }
        }
        moves
    }
}

fn slot_of(state: &RunState<'_>, id: EntryId) -> Option<TimeSlot> {
    state.session(id).map(|s| s.slot)
}

/// Moves every session of `run` into `room`, or none of them.
fn move_run(state: &mut RunState<'_>, run: &[EntryId], room: usize) -> bool {
    let mut moved: Vec<(EntryId, TimeSlot, usize)> = Vec::new();
    for &id in run {
        let Some(s) = state.session(id).copied() else {
            continue;
        };
        if state.try_move(id, s.slot, room) {
            moved.push((id, s.slot, s.room));
        } else {
            for &(back_id, slot, old_room) in moved.iter().rev() {
                state.reposition(back_id, slot, old_room);
            }
            return false;
        }
    }
    true
}
