//! Timetabling domain models.
//!
//! Provides the plain records a generation run consumes and produces.
//! None of these types know about storage or transport; callers load them
//! however they like and hand them over as a [`SchedulingInput`].
//!
//! # Domain Mappings
//!
//! | u-timetable | Meaning |
//! |-------------|---------|
//! | SchedulingRequest | Staff member teaches a module to a class stream |
//! | ClassGroup | One stream of a class |
//! | Room | Bookable teaching space |
//! | TimeSlot | Day + [start, end) in minutes |
//! | ScheduleEntry | One placed session |

mod calendar;
mod request;
mod resource;
mod schedule;
mod scope;

pub use calendar::{hm, Day, TimeSlot, TimeWindow, MINUTES_PER_DAY};
pub use request::{ClassGroup, Module, Program, SchedulingRequest};
pub use resource::{Room, TeacherPreference};
pub use schedule::{
    entries_for_class, entries_for_request, entries_for_room, entries_for_staff, Conflict,
    ConflictKind, ScheduleEntry,
};
pub use scope::{ScopeKey, SchedulingInput, SchedulingScope};
