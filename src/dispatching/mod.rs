//! Priority rules and ranking for scheduling requests.
//!
//! A request's priority is the sum of independent rules: a credit tier
//! (LOW=1, MEDIUM=2, HIGH=3) plus bonuses for lab-type modules and advanced
//! programs. Ranked requests are drained from a [`PriorityQueue`] that breaks
//! ties by insertion order.
//!
//! # Usage
//!
//! ```
//! use u_timetable::config::PriorityPolicy;
//! use u_timetable::dispatching::{PriorityRanker, RequestContext};
//! use u_timetable::models::{Module, Program};
//!
//! let ranker = PriorityRanker::from_policy(&PriorityPolicy::default());
//!
//! let module = Module::new("CHEM301").with_credit(16).with_kind("Laboratory");
//! let program = Program::new("BSc", "8");
//! assert_eq!(ranker.score(&RequestContext::new(&module, &program)), 5);
//! ```

mod context;
mod engine;
mod queue;
pub mod rules;

pub use context::RequestContext;
pub use engine::PriorityRanker;
pub use queue::PriorityQueue;

use std::fmt::Debug;

/// Points contributed by a rule.
///
/// **Higher score = higher priority.**
pub type RuleScore = i32;

/// One additive component of a request's priority.
pub trait PriorityRule: Send + Sync + Debug {
    /// Rule name (e.g., "CREDIT", "LAB").
    fn name(&self) -> &'static str;

    /// Points this rule awards the request.
    fn evaluate(&self, ctx: &RequestContext<'_>) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
