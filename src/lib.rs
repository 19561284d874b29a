//! Weekly timetable generation.
//!
//! Assigns teaching sessions (a module taught by a staff member to a class
//! stream) to days, times and rooms. Hard constraints are never broken: no
//! staff member, room or class stream is double-booked, every session has
//! its credit-tier length, and every session sits inside operating hours
//! clear of breaks. Soft preferences (staff time preferences, short idle
//! gaps, stable rooms) are improved where possible.
//!
//! # Modules
//!
//! - **`models`**: Input and output records: requests, modules, programs,
//!   classes, rooms, preferences, scope, schedule entries
//! - **`grid`**: Candidate slot enumeration for a scope
//! - **`availability`**: Per-resource booking index
//! - **`catalog`**: Read-only, index-addressed snapshot of one run's input
//! - **`dispatching`**: Priority rules and the max-priority request queue
//! - **`scheduler`**: The generation engine and timetable KPIs
//! - **`validation`**: Input checks and final schedule verification
//! - **`store`**: Commit seam with per-scope write locking
//! - **`config`**: Engine tunables, loadable from TOML
//!
//! # Example
//!
//! ```
//! use u_timetable::models::*;
//! use u_timetable::scheduler::TimetableEngine;
//! use u_timetable::store::{InMemoryStore, ScheduleStore};
//!
//! let scope = SchedulingScope::new("2024/2025", 1, TimeWindow::hours((8, 0), (17, 0)))
//!     .with_break(TimeWindow::hours((12, 0), (13, 0)));
//! let input = SchedulingInput::new(scope)
//!     .with_module(Module::new("CS101").with_credit(10))
//!     .with_module(Module::new("CS201").with_credit(16).with_kind("Laboratory"))
//!     .with_program(Program::new("BSc", "6"))
//!     .with_class(ClassGroup::new("C1", "BIT1", "A", 30, "BSc"))
//!     .with_room(Room::new("R1", "Lecture", 40))
//!     .with_room(Room::new("L1", "Laboratory", 30))
//!     .with_request(SchedulingRequest::new("Q1", "C1", "CS101", "S1", "BSc"))
//!     .with_request(SchedulingRequest::new("Q2", "C1", "CS201", "S2", "BSc"));
//!
//! let store = InMemoryStore::new();
//! let outcome = TimetableEngine::default()
//!     .generate_and_commit(&input, &store)
//!     .unwrap();
//!
//! assert!(outcome.is_complete());
//! assert_eq!(store.load(&outcome.scope).unwrap().len(), 2);
//! ```

pub mod availability;
pub mod catalog;
pub mod config;
pub mod dispatching;
pub mod error;
pub mod grid;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod validation;

pub use config::SchedulerConfig;
pub use error::SchedulingError;
pub use scheduler::{Outcome, TimetableEngine};
