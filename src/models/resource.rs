//! Teaching resources.
//!
//! Rooms are the only physical resource with attributes that affect
//! placement (kind and seating capacity). Staff and class groups are
//! identified by reference; their exclusivity is tracked by the
//! [`AvailabilityIndex`](crate::availability::AvailabilityIndex).

use serde::{Deserialize, Serialize};

use super::{Day, TimeSlot, TimeWindow};

/// A bookable room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier.
    pub id: String,
    /// Room kind (e.g., "Lecture", "Laboratory"). Matched against module kind.
    pub kind: String,
    /// Seats.
    pub capacity: u32,
}

impl Room {
    /// Creates a room.
    pub fn new(id: impl Into<String>, kind: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            capacity,
        }
    }

    /// Whether the room can host a session of `kind` for `headcount` students.
    ///
    /// With `any_kind`, only capacity is checked.
    pub fn suits(&self, kind: &str, headcount: u32, any_kind: bool) -> bool {
        self.capacity >= headcount && (any_kind || self.kind == kind)
    }
}

/// A staff member's soft preference for a day/time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherPreference {
    pub staff_id: String,
    pub day: Day,
    pub window: TimeWindow,
    /// Higher = more preferred.
    pub weight: i32,
}

impl TeacherPreference {
    /// Creates a preference.
    pub fn new(staff_id: impl Into<String>, day: Day, window: TimeWindow, weight: i32) -> Self {
        Self {
            staff_id: staff_id.into(),
            day,
            window,
            weight,
        }
    }

    /// Whether the preference applies to a slot: same day and the slot
    /// starts inside the preferred window.
    pub fn matches(&self, slot: &TimeSlot) -> bool {
        self.day == slot.day && self.window.contains(slot.start_min)
    }
}
