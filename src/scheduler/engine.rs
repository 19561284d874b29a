//! Run orchestration.
//!
//! One run: validate input, build the catalog and grid, rank requests, then
//!
//! 1. place (greedy or backtracking, per [`Strategy`]),
//! 2. optimize and resolve conflicts,
//! 3. retry failed requests under relaxed constraints,
//! 4. validate the final entries.
//!
//! Nothing is emitted unless the final validation passes.

use tracing::{info, warn};

use super::backtrack::BacktrackingSearch;
use super::conflicts::resolve_conflicts;
use super::greedy::{place_all, SlotOrder};
use super::kpi::ScheduleKpi;
use super::optimizer::{Optimizer, OptimizerReport};
use super::recovery::{Exhausted, FailureHandler};
use super::state::RunState;
use crate::catalog::Catalog;
use crate::config::{SchedulerConfig, Strategy};
use crate::dispatching::{PriorityQueue, PriorityRanker, RuleScore};
use crate::error::SchedulingError;
use crate::grid::TimeGrid;
use crate::models::{ScheduleEntry, SchedulingInput, ScopeKey};
use crate::store::{ScheduleStore, ScopeGuard};
use crate::validation::{validate_input, validate_schedule};

/// A request left out of the timetable.
#[derive(Debug, Clone, PartialEq)]
pub struct UnplacedRequest {
    pub request_id: String,
    pub priority: RuleScore,
    /// Always `RetryBudgetExhausted`.
    pub cause: SchedulingError,
    /// What made the request fail before recovery.
    pub initial_cause: SchedulingError,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub scope: ScopeKey,
    /// Sessions ordered by (day, start, room).
    pub entries: Vec<ScheduleEntry>,
    /// Highest priority first.
    pub unplaced: Vec<UnplacedRequest>,
    pub kpi: ScheduleKpi,
    /// Engine whose result was adopted (`Greedy` or `Backtracking`).
    pub strategy: Strategy,
    pub optimizer: OptimizerReport,
}

impl Outcome {
    /// Whether every request was placed.
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }
}

/// Timetable generation engine.
///
/// # Example
/// ```
/// use u_timetable::models::*;
/// use u_timetable::scheduler::TimetableEngine;
///
/// let input = SchedulingInput::new(SchedulingScope::new(
///     "2024/2025", 1, TimeWindow::hours((8, 0), (17, 0)),
/// ))
/// .with_module(Module::new("CS101").with_credit(10))
/// .with_program(Program::new("BSc", "6"))
/// .with_class(ClassGroup::new("C1", "BIT1", "A", 30, "BSc"))
/// .with_room(Room::new("R1", "Lecture", 40))
/// .with_request(SchedulingRequest::new("Q1", "C1", "CS101", "S1", "BSc"));
///
/// let outcome = TimetableEngine::default().generate(&input).unwrap();
/// assert!(outcome.is_complete());
/// assert_eq!(outcome.entries[0].duration_min(), 120);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TimetableEngine {
    config: SchedulerConfig,
}

/// Post-placement result of one engine.
struct Attempt<'a> {
    state: RunState<'a>,
    exhausted: Vec<Exhausted>,
    optimizer: OptimizerReport,
}

impl TimetableEngine {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Produces a validated timetable for one scope.
    ///
    /// Requests that could not be placed are reported in
    /// [`Outcome::unplaced`]; they do not fail the run.
    ///
    /// # Errors
    /// - `InvalidConfig` when the engine configuration is out of range
    /// - `InputInconsistency` when the input fails validation
    /// - `InvariantViolation` when the final entries break an invariant
    pub fn generate(&self, input: &SchedulingInput) -> Result<Outcome, SchedulingError> {
        self.config
            .validate()
            .map_err(|e| SchedulingError::InvalidConfig(e.to_string()))?;
        validate_input(input).map_err(|errors| SchedulingError::InputInconsistency { errors })?;
        let catalog = Catalog::build(input)?;
        let grid = TimeGrid::new(&input.scope, &self.config);
        let scope = input.scope.key();

        let priorities = PriorityRanker::from_policy(&self.config.priority).rank(&catalog);
        let queue: PriorityQueue<usize> = priorities.iter().copied().enumerate().collect();
        let jobs: Vec<usize> = queue.into_sorted_vec().into_iter().map(|(job, _)| job).collect();

        info!(
            event = "run_start",
            scope = %scope,
            requests = jobs.len(),
            rooms = catalog.rooms.len(),
            strategy = ?self.config.strategy,
        );

        let small = jobs.len() <= self.config.backtracking.max_requests;
        let (strategy, attempt) = match self.config.strategy {
            Strategy::Greedy => (Strategy::Greedy, self.greedy(&catalog, &grid, &jobs, &priorities)),
            Strategy::Backtracking => match self.backtracking(&catalog, &grid, &jobs, &priorities) {
                Some(attempt) => (Strategy::Backtracking, attempt),
                None => (Strategy::Greedy, self.greedy(&catalog, &grid, &jobs, &priorities)),
            },
            Strategy::Auto => {
                let greedy = self.greedy(&catalog, &grid, &jobs, &priorities);
                if greedy.exhausted.is_empty() || !small {
                    (Strategy::Greedy, greedy)
                } else {
                    match self.backtracking(&catalog, &grid, &jobs, &priorities) {
                        Some(attempt) if attempt.exhausted.is_empty() => (Strategy::Backtracking, attempt),
                        _ => (Strategy::Greedy, greedy),
                    }
                }
            }
        };

        let entries = attempt.state.entries();
        validate_schedule(input, &entries, &self.config)
            .map_err(|violations| SchedulingError::InvariantViolation { violations })?;

        let unplaced: Vec<UnplacedRequest> = attempt
            .exhausted
            .into_iter()
            .map(|e| UnplacedRequest {
                request_id: catalog.job(e.job).request.id.clone(),
                priority: priorities[e.job],
                cause: e.cause,
                initial_cause: e.initial,
            })
            .collect();
        let kpi = ScheduleKpi::calculate(input, &entries, self.config.optimizer.consecutive_tolerance_min);

        info!(
            event = "run_end",
            scope = %scope,
            strategy = ?strategy,
            sessions = entries.len(),
            placed = kpi.placed_requests,
            unplaced = unplaced.len(),
        );

        Ok(Outcome {
            scope,
            entries,
            unplaced,
            kpi,
            strategy,
            optimizer: attempt.optimizer,
        })
    }

    /// Generates and commits under the scope's write lock.
    ///
    /// The lock is taken before generation starts, so a concurrent run on
    /// the same scope fails fast. On any error the store is left untouched.
    ///
    /// # Errors
    /// `ScopeBusy` when another run holds the scope, `Store` when the commit
    /// fails, plus every error of [`generate`](Self::generate).
    pub fn generate_and_commit<S: ScheduleStore + ?Sized>(
        &self,
        input: &SchedulingInput,
        store: &S,
    ) -> Result<Outcome, SchedulingError> {
        let guard = ScopeGuard::acquire(store, input.scope.key())?;
        let outcome = self.generate(input)?;
        guard.commit(&outcome.entries)?;
        info!(event = "run_committed", scope = %outcome.scope, entries = outcome.entries.len());
        Ok(outcome)
    }

    fn greedy<'a>(
        &self,
        catalog: &'a Catalog,
        grid: &'a TimeGrid,
        jobs: &[usize],
        priorities: &[RuleScore],
    ) -> Attempt<'a> {
        let mut state = RunState::new(catalog, grid);
        let mut order = SlotOrder::new(self.config.random_seed);
        place_all(&mut state, &mut order, jobs);
        self.repair(state, order, priorities)
    }

    /// `None` when the search does not place every request.
    fn backtracking<'a>(
        &self,
        catalog: &'a Catalog,
        grid: &'a TimeGrid,
        jobs: &[usize],
        priorities: &[RuleScore],
    ) -> Option<Attempt<'a>> {
        let mut state = RunState::new(catalog, grid);
        let mut order = SlotOrder::new(self.config.random_seed);
        let result = BacktrackingSearch::new(&self.config.backtracking).solve(&mut state, &mut order, jobs);
        if !result.is_solved() {
            warn!(event = "backtracking_failed", ?result);
            return None;
        }
        Some(self.repair(state, order, priorities))
    }

    fn repair<'a>(&self, mut state: RunState<'a>, mut order: SlotOrder, priorities: &[RuleScore]) -> Attempt<'a> {
        let optimizer = Optimizer::new(&self.config.optimizer).run(&mut state);
        resolve_conflicts(&mut state, &mut order);
        let exhausted = FailureHandler::new(&self.config.recovery).recover(&mut state, &mut order, priorities);
        Attempt {
            state,
            exhausted,
            optimizer,
        }
    }
}
