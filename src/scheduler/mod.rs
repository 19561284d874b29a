//! Timetable generation.
//!
//! [`TimetableEngine`] drives one run per scope: place sessions, improve them,
//! repair conflicts, retry failures, validate, and optionally commit.
//!
//! # Placement engines
//!
//! - **Greedy**: requests in priority order, each taking the most preferred
//!   free slot. Fast, not optimal.
//! - **Backtracking**: exhaustive search with an explicit frame stack, for
//!   small inputs where greedy leaves requests unplaced.
//!
//! # After placement
//!
//! | Stage | Effect |
//! |-------|--------|
//! | Optimizer | closes staff gaps, breaks up long runs, chains parallel streams, keeps classes in one room |
//! | Conflict resolver | relocates or pulls overlapping sessions |
//! | Failure handler | retries unplaced requests with one constraint relaxed |
//! | Validation | rejects the run if any invariant is broken |
//!
//! # KPI
//!
//! [`ScheduleKpi`] summarises a timetable: placement rate, staff idle time,
//! longest teaching run, class room changes and room utilization.

mod backtrack;
mod conflicts;
mod engine;
mod greedy;
mod kpi;
mod optimizer;
mod recovery;
mod state;

pub use backtrack::SearchResult;
pub use conflicts::detect_conflicts;
pub use engine::{Outcome, TimetableEngine, UnplacedRequest};
pub use kpi::ScheduleKpi;
pub use optimizer::OptimizerReport;
pub use recovery::RecoveryStrategy;
