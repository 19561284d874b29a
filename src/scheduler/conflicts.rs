//! Conflict detection and resolution.
//!
//! Detection groups entries by shared resource and day, then checks pairs
//! within each group. Resolution relocates one side of each conflict, or
//! pulls the first side's request when neither can move.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::greedy::{relocate, SlotOrder};
use super::state::RunState;
use crate::availability::EntryId;
use crate::error::SchedulingError;
use crate::models::{Conflict, ConflictKind, Day, ScheduleEntry};

/// Every pairwise staff, room and class overlap among `entries`.
///
/// `entry_a < entry_b` are positions in `entries`. Results are ordered by
/// kind (staff, room, class), then resource id, day and position.
pub fn detect_conflicts(entries: &[ScheduleEntry]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for kind in [ConflictKind::Staff, ConflictKind::Room, ConflictKind::Class] {
        let mut groups: BTreeMap<(&str, Day), Vec<usize>> = BTreeMap::new();
        for (pos, e) in entries.iter().enumerate() {
            groups.entry((resource_of(kind, e), e.day)).or_default().push(pos);
        }
        for ((resource, _), mut members) in groups {
            members.sort_by_key(|&p| (entries[p].start_min, p));
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    // Sorted by start: nothing later can overlap `a` either.
                    if entries[b].start_min >= entries[a].end_min {
                        break;
                    }
                    let (first, second) = (a.min(b), a.max(b));
                    conflicts.push(Conflict::new(
                        first,
                        second,
                        kind,
                        format!(
                            "{kind} '{resource}' double-booked: {} and {}",
                            entries[first].slot(),
                            entries[second].slot()
                        ),
                    ));
                }
            }
        }
    }
    conflicts
}

fn resource_of(kind: ConflictKind, e: &ScheduleEntry) -> &str {
    match kind {
        ConflictKind::Staff => &e.staff_id,
        ConflictKind::Room => &e.room_id,
        ConflictKind::Class => &e.class_id,
    }
}

/// A conflict between two live sessions of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConflict {
    pub a: EntryId,
    pub b: EntryId,
    pub kind: ConflictKind,
}

/// Conflicts among the live sessions of a run.
pub fn detect_in_state(state: &RunState<'_>) -> Vec<SessionConflict> {
    let (ids, entries): (Vec<EntryId>, Vec<ScheduleEntry>) = state.entries_with_ids().into_iter().unzip();
    detect_conflicts(&entries)
        .into_iter()
        .map(|c| SessionConflict {
            a: ids[c.entry_a],
            b: ids[c.entry_b],
            kind: c.kind,
        })
        .collect()
}

/// Resolves conflicts until none remain.
///
/// Each round handles the first conflict found: relocate `a`, else `b`,
/// else pull `a`'s request onto the failed list. Returns how many requests
/// were pulled.
pub fn resolve_conflicts(state: &mut RunState<'_>, order: &mut SlotOrder) -> usize {
    let mut pulled = 0;
    let mut moved = 0;
    // Each round removes at least one conflicting session from its slot.
    let mut rounds_left = state.live_count() * 2 + 1;

    while let Some(c) = detect_in_state(state).into_iter().next() {
        if rounds_left == 0 {
            // Unreachable in practice; pull both sides so the loop ends.
            pulled += pull(state, c.a, c.kind) + pull(state, c.b, c.kind);
            continue;
        }
        rounds_left -= 1;

        if relocate(state, order, c.a) || relocate(state, order, c.b) {
            moved += 1;
            continue;
        }
        pulled += pull(state, c.a, c.kind);
    }

    if moved > 0 || pulled > 0 {
        debug!(event = "conflicts_resolved", moved, pulled);
    }
    pulled
}

fn pull(state: &mut RunState<'_>, id: EntryId, kind: ConflictKind) -> usize {
    let Some(job) = state.session(id).map(|s| s.job) else {
        return 0;
    };
    state.pull_request(job);
    let request_id = state.catalog.job(job).request.id.clone();
    warn!(event = "request_pulled", request = %request_id, %kind);
    state.fail(
        job,
        SchedulingError::UnresolvedConflict {
            request_id,
            kind: kind.to_string(),
        },
    );
    1
}
