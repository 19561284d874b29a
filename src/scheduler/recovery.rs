//! Failure handling for unplaced requests.
//!
//! Up to `max_retries` passes run over the failed list, highest priority
//! first. Each request tries, in order:
//!
//! 1. Any room kind (capacity still enforced)
//! 2. Split into two half-length sessions
//! 3. Any scope day
//! 4. Edge-of-day hours: the full operating window, program window and
//!    program breaks ignored
//!
//! Each strategy relaxes exactly one constraint. Requests that exhaust the
//! passes are reported with `RetryBudgetExhausted`.

use std::cmp::Reverse;

use tracing::{debug, trace, warn};

use super::greedy::{find_placement, place_whole, SlotOrder};
use super::state::{Failure, Relaxation, RunState, SessionPart};
use crate::config::RecoveryConfig;
use crate::dispatching::RuleScore;
use crate::error::SchedulingError;
use crate::validation::split_durations;

/// Recovery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    AnyRoomKind,
    Split,
    AnyDay,
    EdgeHours,
}

impl RecoveryStrategy {
    pub const ORDER: [RecoveryStrategy; 4] = [
        RecoveryStrategy::AnyRoomKind,
        RecoveryStrategy::Split,
        RecoveryStrategy::AnyDay,
        RecoveryStrategy::EdgeHours,
    ];
}

/// A request given up on.
#[derive(Debug, Clone, PartialEq)]
pub struct Exhausted {
    pub job: usize,
    /// Why the request first became unplaced.
    pub initial: SchedulingError,
    /// Always `RetryBudgetExhausted`.
    pub cause: SchedulingError,
}

/// Retries failed requests under relaxed constraints.
#[derive(Debug, Clone)]
pub struct FailureHandler {
    max_retries: u32,
}

impl FailureHandler {
    pub fn new(config: &RecoveryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
        }
    }

    /// Drains `state.failed`. Returns the requests that stay unplaced,
    /// highest priority first.
    pub fn recover(&self, state: &mut RunState<'_>, order: &mut SlotOrder, priorities: &[RuleScore]) -> Vec<Exhausted> {
        let mut passes = 0;
        while passes < self.max_retries && !state.failed.is_empty() {
            passes += 1;
            let mut pending = std::mem::take(&mut state.failed);
            pending.sort_by_key(|f| Reverse(priority(priorities, f.job)));

            let mut recovered = 0;
            let mut still_failed = Vec::new();
            for failure in pending {
                match self.retry(state, order, failure.job) {
                    Some(strategy) => {
                        recovered += 1;
                        trace!(
                            event = "recovered",
                            request = %state.catalog.job(failure.job).request.id,
                            ?strategy,
                        );
                    }
                    None => still_failed.push(failure),
                }
            }
            debug!(
                event = "recovery_pass",
                pass = passes,
                recovered,
                remaining = still_failed.len(),
            );
            state.failed = still_failed;
        }

        let mut failed = std::mem::take(&mut state.failed);
        failed.sort_by_key(|f| Reverse(priority(priorities, f.job)));
        failed
            .into_iter()
            .map(|Failure { job, cause }| {
                let request_id = state.catalog.job(job).request.id.clone();
                warn!(event = "request_unplaced", request = %request_id, reason = %cause);
                Exhausted {
                    job,
                    initial: cause,
                    cause: SchedulingError::RetryBudgetExhausted {
                        request_id,
                        attempts: passes,
                    },
                }
            })
            .collect()
    }

    /// First strategy that places the request, if any.
    pub fn retry(&self, state: &mut RunState<'_>, order: &mut SlotOrder, job: usize) -> Option<RecoveryStrategy> {
        RecoveryStrategy::ORDER
            .into_iter()
            .find(|&strategy| apply(state, order, job, strategy))
    }
}

fn priority(priorities: &[RuleScore], job: usize) -> RuleScore {
    priorities.get(job).copied().unwrap_or_default()
}

fn apply(state: &mut RunState<'_>, order: &mut SlotOrder, job: usize, strategy: RecoveryStrategy) -> bool {
    let relax = match strategy {
        RecoveryStrategy::AnyRoomKind => Relaxation {
            any_room_kind: true,
            ..Relaxation::NONE
        },
        RecoveryStrategy::Split => return place_split(state, order, job),
        RecoveryStrategy::AnyDay => Relaxation {
            any_day: true,
            ..Relaxation::NONE
        },
        RecoveryStrategy::EdgeHours => Relaxation {
            edge_hours: true,
            ..Relaxation::NONE
        },
    };
    place_whole(state, order, job, relax)
}

/// Places both halves or neither.
fn place_split(state: &mut RunState<'_>, order: &mut SlotOrder, job: usize) -> bool {
    let (first_len, second_len) = split_durations(state.duration_for(job));
    let Some((slot, room)) = find_placement(state, order, job, first_len, Relaxation::NONE, None) else {
        return false;
    };
    let first = state.place(job, room, slot, SessionPart::FirstHalf, Relaxation::NONE);
    match find_placement(state, order, job, second_len, Relaxation::NONE, None) {
        Some((slot, room)) => {
            state.place(job, room, slot, SessionPart::SecondHalf, Relaxation::NONE);
            true
        }
        None => {
            state.remove(first);
            false
        }
    }
}
