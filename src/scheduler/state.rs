//! Mutable state of one generation run.
//!
//! Sessions live in an arena addressed by [`EntryId`]; removing a session
//! leaves a hole so ids stay stable across moves. Every placement, move and
//! removal goes through the availability index.

use crate::availability::{AvailabilityIndex, EntryId, ResourceKey, SessionResources};
use crate::catalog::Catalog;
use crate::error::SchedulingError;
use crate::grid::{SlotQuery, TimeGrid};
use crate::models::{Day, ScheduleEntry, TimeSlot};

/// Which part of its request a session covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPart {
    Whole,
    FirstHalf,
    SecondHalf,
}

/// Constraints a session was allowed to ignore when it was placed.
///
/// Moves of a session honour the same relaxations, never more.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Relaxation {
    /// Any room kind; capacity still enforced.
    pub any_room_kind: bool,
    /// Any scope day, not just the program's days.
    pub any_day: bool,
    /// Full operating window; program window and breaks ignored.
    pub edge_hours: bool,
}

impl Relaxation {
    pub const NONE: Self = Self {
        any_room_kind: false,
        any_day: false,
        edge_hours: false,
    };
}

/// One placed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub job: usize,
    pub room: usize,
    pub slot: TimeSlot,
    pub part: SessionPart,
    pub relax: Relaxation,
}

/// A request that is currently unplaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub job: usize,
    pub cause: SchedulingError,
}

/// Index + session arena + failed list.
#[derive(Debug, Clone)]
pub struct RunState<'a> {
    pub catalog: &'a Catalog,
    pub grid: &'a TimeGrid,
    index: AvailabilityIndex,
    sessions: Vec<Option<Session>>,
    pub failed: Vec<Failure>,
}

impl<'a> RunState<'a> {
    pub fn new(catalog: &'a Catalog, grid: &'a TimeGrid) -> Self {
        Self {
            catalog,
            grid,
            index: AvailabilityIndex::new(),
            sessions: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn index(&self) -> &AvailabilityIndex {
        &self.index
    }

    pub fn resources(&self, job: usize, room: usize) -> SessionResources {
        let j = self.catalog.job(job);
        SessionResources {
            staff: j.staff,
            room,
            class: j.class,
        }
    }

    pub fn session(&self, id: EntryId) -> Option<&Session> {
        self.sessions.get(id).and_then(Option::as_ref)
    }

    /// Live sessions in arena order.
    pub fn live(&self) -> impl Iterator<Item = (EntryId, &Session)> + '_ {
        self.sessions
            .iter()
            .enumerate()
            .filter_map(|(id, s)| s.as_ref().map(|s| (id, s)))
    }

    pub fn live_count(&self) -> usize {
        self.live().count()
    }

    /// Sessions of one request.
    pub fn sessions_of(&self, job: usize) -> Vec<EntryId> {
        self.live()
            .filter(|(_, s)| s.job == job)
            .map(|(id, _)| id)
            .collect()
    }

    #[cfg(test)]
    pub fn is_placed(&self, job: usize) -> bool {
        self.live().any(|(_, s)| s.job == job)
    }

    /// Session length for a request, from its module credit.
    pub fn duration_for(&self, job: usize) -> i32 {
        self.grid.duration_for(self.catalog.module_of(job).credit)
    }

    /// Grid query for a request under the given relaxation.
    pub fn query(&self, job: usize, duration_min: i32, relax: Relaxation) -> SlotQuery {
        let program = self.catalog.program_of(job);
        let days = if relax.any_day || program.days.is_empty() {
            self.grid.days().to_vec()
        } else {
            program.days.clone()
        };
        let (window, extra_breaks) = if relax.edge_hours {
            (self.grid.operating_window(), Vec::new())
        } else {
            (
                program.window.unwrap_or_else(|| self.grid.operating_window()),
                program.breaks.clone(),
            )
        };
        SlotQuery {
            days,
            window,
            extra_breaks,
            duration_min,
        }
    }

    /// Whether `slot` respects the scope grid and, unless relaxed, the
    /// request's program days, window and breaks.
    pub fn admissible(&self, job: usize, relax: Relaxation, slot: &TimeSlot) -> bool {
        if !self.grid.admits(slot) {
            return false;
        }
        let q = self.query(job, slot.duration_min(), relax);
        let window = slot.window();
        q.days.contains(&slot.day)
            && q.window.covers(&window)
            && !q.extra_breaks.iter().any(|b| b.overlaps(&window))
    }

    /// Staff, room and class all free at `slot`, disregarding `ignore`.
    pub fn is_free(&self, job: usize, room: usize, slot: &TimeSlot, ignore: Option<EntryId>) -> bool {
        self.index.is_free(&self.resources(job, room), slot, ignore)
    }

    /// Records a session and books its resources. Does not check anything.
    pub fn place(&mut self, job: usize, room: usize, slot: TimeSlot, part: SessionPart, relax: Relaxation) -> EntryId {
        let id = self.sessions.len();
        let resources = self.resources(job, room);
        self.index.book_session(&resources, slot, id);
        self.sessions.push(Some(Session {
            job,
            room,
            slot,
            part,
            relax,
        }));
        id
    }

    /// Removes a session and releases its bookings.
    pub fn remove(&mut self, id: EntryId) -> Option<Session> {
        let session = self.sessions.get_mut(id)?.take()?;
        let resources = self.resources(session.job, session.room);
        self.index.release_session(&resources, id);
        Some(session)
    }

    /// Removes every session of a request. Returns how many were removed.
    pub fn pull_request(&mut self, job: usize) -> usize {
        let ids = self.sessions_of(job);
        for &id in &ids {
            self.remove(id);
        }
        ids.len()
    }

    /// Moves a session to `slot` in `room` if the move keeps every invariant.
    pub fn try_move(&mut self, id: EntryId, slot: TimeSlot, room: usize) -> bool {
        let Some(s) = self.session(id).copied() else {
            return false;
        };
        if slot.duration_min() != s.slot.duration_min()
            || !self.admissible(s.job, s.relax, &slot)
            || !self.catalog.room_suits(s.job, room, s.relax.any_room_kind)
            || !self.is_free(s.job, room, &slot, Some(id))
        {
            return false;
        }
        self.reposition(id, slot, room);
        true
    }

    /// Moves a session to `slot`, keeping its room if possible, otherwise
    /// the first suitable free room.
    pub fn relocate_to(&mut self, id: EntryId, slot: TimeSlot) -> bool {
        let Some(s) = self.session(id).copied() else {
            return false;
        };
        if self.try_move(id, slot, s.room) {
            return true;
        }
        self.catalog
            .suitable_rooms(s.job, s.relax.any_room_kind)
            .into_iter()
            .filter(|&r| r != s.room)
            .any(|r| self.try_move(id, slot, r))
    }

    /// Unchecked move; used to undo a checked one.
    pub fn reposition(&mut self, id: EntryId, slot: TimeSlot, room: usize) {
        let Some(s) = self.session(id).copied() else {
            return;
        };
        let (from, to) = (self.resources(s.job, s.room), self.resources(s.job, room));
        self.index.release_session(&from, id);
        self.index.book_session(&to, slot, id);
        if let Some(Some(stored)) = self.sessions.get_mut(id) {
            stored.slot = slot;
            stored.room = room;
        }
    }

    pub fn fail(&mut self, job: usize, cause: SchedulingError) {
        self.failed.push(Failure { job, cause });
    }

    /// Sessions of one staff member on one day, sorted by start.
    pub fn staff_day(&self, staff: usize, day: Day) -> Vec<EntryId> {
        self.day_bookings(ResourceKey::Staff(staff), day)
    }

    /// Sessions of one class group on one day, sorted by start.
    pub fn class_day(&self, class: usize, day: Day) -> Vec<EntryId> {
        self.day_bookings(ResourceKey::Class(class), day)
    }

    fn day_bookings(&self, key: ResourceKey, day: Day) -> Vec<EntryId> {
        let mut bookings: Vec<_> = self
            .index
            .bookings(key)
            .iter()
            .filter(|b| b.slot.day == day)
            .collect();
        bookings.sort_by_key(|b| (b.slot.start_min, b.entry));
        bookings.into_iter().map(|b| b.entry).collect()
    }

    pub fn to_entry(&self, s: &Session) -> ScheduleEntry {
        let job = self.catalog.job(s.job);
        let class = self.catalog.class_of(s.job);
        ScheduleEntry {
            request_id: job.request.id.clone(),
            module_id: job.request.module_id.clone(),
            room_id: self.catalog.rooms[s.room].id.clone(),
            staff_id: job.request.staff_id.clone(),
            class_id: class.id.clone(),
            stream: class.stream.clone(),
            day: s.slot.day,
            start_min: s.slot.start_min,
            end_min: s.slot.end_min,
        }
    }

    /// Live sessions as public entries, in arena order, with their ids.
    pub fn entries_with_ids(&self) -> Vec<(EntryId, ScheduleEntry)> {
        self.live().map(|(id, s)| (id, self.to_entry(s))).collect()
    }

    /// Live sessions as public entries, ordered by (day, start, room).
    pub fn entries(&self) -> Vec<ScheduleEntry> {
        let mut entries: Vec<ScheduleEntry> = self.live().map(|(_, s)| self.to_entry(s)).collect();
        entries.sort_by(|a, b| {
            (a.day, a.start_min, &a.room_id).cmp(&(b.day, b.start_min, &b.room_id))
        });
        entries
    }
}
