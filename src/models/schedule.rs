//! Timetable (solution) model.
//!
//! A timetable is a list of placed sessions. Each session is one
//! [`ScheduleEntry`]; a request that was split during recovery owns two.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Day, TimeSlot};

/// One placed teaching session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Request this session belongs to.
    pub request_id: String,
    pub module_id: String,
    pub room_id: String,
    pub staff_id: String,
    pub class_id: String,
    pub stream: String,
    pub day: Day,
    pub start_min: i32,
    pub end_min: i32,
}

impl ScheduleEntry {
    /// The entry's slot.
    #[inline]
    pub fn slot(&self) -> TimeSlot {
        TimeSlot::new(self.day, self.start_min, self.end_min)
    }

    /// Length (minutes).
    #[inline]
    pub fn duration_min(&self) -> i32 {
        self.end_min - self.start_min
    }
}

/// Which mutual-exclusion rule a conflict breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictKind {
    /// One staff member in two places.
    Staff,
    /// One room hosting two sessions.
    Room,
    /// One class stream attending two sessions.
    Class,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictKind::Staff => "staff",
            ConflictKind::Room => "room",
            ConflictKind::Class => "class",
        })
    }
}

/// A pair of overlapping sessions sharing a resource.
///
/// `entry_a` and `entry_b` are positions in the entry list that was scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub entry_a: usize,
    pub entry_b: usize,
    pub kind: ConflictKind,
    pub description: String,
}

impl Conflict {
    /// Creates a conflict.
    pub fn new(entry_a: usize, entry_b: usize, kind: ConflictKind, description: impl Into<String>) -> Self {
        Self {
            entry_a,
            entry_b,
            kind,
            description: description.into(),
        }
    }
}

/// Sessions of one staff member, sorted by (day, start).
pub fn entries_for_staff<'a>(entries: &'a [ScheduleEntry], staff_id: &str) -> Vec<&'a ScheduleEntry> {
    sorted_by_time(entries.iter().filter(|e| e.staff_id == staff_id))
}

/// Sessions held in one room, sorted by (day, start).
pub fn entries_for_room<'a>(entries: &'a [ScheduleEntry], room_id: &str) -> Vec<&'a ScheduleEntry> {
    sorted_by_time(entries.iter().filter(|e| e.room_id == room_id))
}

/// Sessions attended by one class group, sorted by (day, start).
pub fn entries_for_class<'a>(entries: &'a [ScheduleEntry], class_id: &str) -> Vec<&'a ScheduleEntry> {
    sorted_by_time(entries.iter().filter(|e| e.class_id == class_id))
}

/// Sessions of one request.
pub fn entries_for_request<'a>(entries: &'a [ScheduleEntry], request_id: &str) -> Vec<&'a ScheduleEntry> {
    sorted_by_time(entries.iter().filter(|e| e.request_id == request_id))
}

fn sorted_by_time<'a>(it: impl Iterator<Item = &'a ScheduleEntry>) -> Vec<&'a ScheduleEntry> {
    let mut v: Vec<&ScheduleEntry> = it.collect();
    v.sort_by_key(|e| (e.day, e.start_min));
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::hm;

    fn entry(req: &str, staff: &str, room: &str, day: Day, start: i32, end: i32) -> ScheduleEntry {
        ScheduleEntry {
            request_id: req.into(),
            module_id: "M1".into(),
            room_id: room.into(),
            staff_id: staff.into(),
            class_id: "C1".into(),
            stream: "A".into(),
            day,
            start_min: start,
            end_min: end,
        }
    }

    fn sample() -> Vec<ScheduleEntry> {
        vec![
            entry("R2", "S1", "L1", Day::Tue, hm(8, 0), hm(10, 0)),
            entry("R1", "S1", "L2", Day::Mon, hm(14, 0), hm(16, 0)),
            entry("R3", "S2", "L1", Day::Mon, hm(8, 0), hm(10, 0)),
        ]
    }

    #[test]
    fn test_entry_slot() {
        let e = entry("R1", "S1", "L1", Day::Mon, hm(9, 0), hm(11, 30));
        assert_eq!(e.slot(), TimeSlot::new(Day::Mon, hm(9, 0), hm(11, 30)));
        assert_eq!(e.duration_min(), 150);
    }

    #[test]
    fn test_entries_for_staff_sorted() {
        let all = sample();
        let s1 = entries_for_staff(&all, "S1");
        assert_eq!(s1.len(), 2);
        assert_eq!(s1[0].request_id, "R1"); // Monday first
        assert_eq!(s1[1].request_id, "R2");
    }

    #[test]
    fn test_entries_for_room_and_request() {
        let all = sample();
        assert_eq!(entries_for_room(&all, "L1").len(), 2);
        assert_eq!(entries_for_room(&all, "L9").len(), 0);
        assert_eq!(entries_for_request(&all, "R3").len(), 1);
        assert_eq!(entries_for_class(&all, "C1").len(), 3);
    }

    #[test]
    fn test_conflict_kind_display() {
        assert_eq!(ConflictKind::Staff.to_string(), "staff");
        assert_eq!(ConflictKind::Room.to_string(), "room");
        assert_eq!(ConflictKind::Class.to_string(), "class");
    }
}
