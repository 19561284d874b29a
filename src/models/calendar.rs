//! Weekly calendar primitives.
//!
//! # Time Model
//! Times are minutes after midnight on a teaching day. Weeks run Monday to
//! Friday; there is no date component because a timetable repeats every week
//! of its semester.
//!
//! All intervals are half-open: `[start, end)`. Two sessions that touch
//! (one ends at 10:00, the next starts at 10:00) do not overlap.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// Minutes after midnight for `hour:minute`.
#[inline]
pub const fn hm(hour: i32, minute: i32) -> i32 {
    hour * 60 + minute
}

/// Teaching day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl Day {
    /// All teaching days in week order.
    pub const ALL: [Day; 5] = [Day::Mon, Day::Tue, Day::Wed, Day::Thu, Day::Fri];

    /// Zero-based position in the week.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Day::Mon => "Monday",
            Day::Tue => "Tuesday",
            Day::Wed => "Wednesday",
            Day::Thu => "Thursday",
            Day::Fri => "Friday",
        };
        f.write_str(name)
    }
}

/// A time-of-day interval [start, end) in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Interval start (minutes, inclusive).
    pub start_min: i32,
    /// Interval end (minutes, exclusive).
    pub end_min: i32,
}

impl TimeWindow {
    /// Creates a new time window.
    pub const fn new(start_min: i32, end_min: i32) -> Self {
        Self { start_min, end_min }
    }

    /// Creates a window from `(hour, minute)` pairs.
    pub const fn hours(start: (i32, i32), end: (i32, i32)) -> Self {
        Self::new(hm(start.0, start.1), hm(end.0, end.1))
    }

    /// Length of the window (minutes).
    #[inline]
    pub fn duration_min(&self) -> i32 {
        self.end_min - self.start_min
    }

    /// Whether the window has positive length.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.end_min > self.start_min
    }

    /// Whether the window has positive length and lies within one day.
    #[inline]
    pub fn is_within_day(&self) -> bool {
        self.is_valid() && self.start_min >= 0 && self.end_min <= MINUTES_PER_DAY
    }

    /// Whether a minute falls inside the window.
    #[inline]
    pub fn contains(&self, minute: i32) -> bool {
        minute >= self.start_min && minute < self.end_min
    }

    /// Whether `other` lies entirely inside this window.
    pub fn covers(&self, other: &Self) -> bool {
        other.start_min >= self.start_min && other.end_min <= self.end_min
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_min < other.end_min && other.start_min < self.end_min
    }

    /// Overlap of two windows, if any.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let start = self.start_min.max(other.start_min);
        let end = self.end_min.min(other.end_min);
        (end > start).then(|| Self::new(start, end))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start_min / 60,
            self.start_min % 60,
            self.end_min / 60,
            self.end_min % 60
        )
    }
}

/// A candidate or committed teaching slot: a window on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub day: Day,
    pub start_min: i32,
    pub end_min: i32,
}

impl TimeSlot {
    /// Creates a slot.
    pub const fn new(day: Day, start_min: i32, end_min: i32) -> Self {
        Self {
            day,
            start_min,
            end_min,
        }
    }

    /// Creates a slot starting at `start_min` lasting `duration_min`.
    pub const fn starting_at(day: Day, start_min: i32, duration_min: i32) -> Self {
        Self::new(day, start_min, start_min + duration_min)
    }

    /// The slot's time-of-day window.
    #[inline]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_min, self.end_min)
    }

    /// Length (minutes).
    #[inline]
    pub fn duration_min(&self) -> i32 {
        self.end_min - self.start_min
    }

    /// Same day and intersecting intervals.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.day == other.day && self.window().overlaps(&other.window())
    }

    /// Minutes between the end of `self` and the start of `later` on the same
    /// day. `None` when on different days or when they overlap.
    pub fn gap_to(&self, later: &Self) -> Option<i32> {
        if self.day != later.day || later.start_min < self.end_min {
            return None;
        }
        Some(later.start_min - self.end_min)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.window())
    }
}
