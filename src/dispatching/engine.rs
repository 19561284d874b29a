//! Additive priority ranker.
//!
//! Composes priority rules by summing their points. A request's priority is
//! the credit tier plus every applicable bonus.

use std::sync::Arc;

use super::rules::{AdvancedLevelBonus, CreditTier, LabBonus};
use super::{PriorityRule, RequestContext, RuleScore};
use crate::catalog::Catalog;
use crate::config::PriorityPolicy;

/// A composable sum of priority rules.
///
/// # Example
/// ```
/// use u_timetable::dispatching::{rules, PriorityRanker};
///
/// let ranker = PriorityRanker::new()
///     .with_rule(rules::CreditTier::default())
///     .with_rule(rules::LabBonus::new(vec!["Laboratory".into()]));
/// assert_eq!(ranker.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct PriorityRanker {
    rules: Vec<Arc<dyn PriorityRule>>,
}

impl PriorityRanker {
    /// Creates an empty ranker (every request scores 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit tier + lab bonus + advanced-level bonus.
    pub fn from_policy(policy: &PriorityPolicy) -> Self {
        Self::new()
            .with_rule(CreditTier::from_policy(policy))
            .with_rule(LabBonus::new(policy.lab_kinds.clone()))
            .with_rule(AdvancedLevelBonus::new(policy.advanced_levels.clone()))
    }

    /// Adds a rule.
    pub fn with_rule<R: PriorityRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Sum of every rule's points.
    pub fn score(&self, ctx: &RequestContext<'_>) -> RuleScore {
        self.rules.iter().map(|r| r.evaluate(ctx)).sum()
    }

    /// Per-rule breakdown, in rule order.
    pub fn evaluate(&self, ctx: &RequestContext<'_>) -> Vec<(&'static str, RuleScore)> {
        self.rules
            .iter()
            .map(|r| (r.name(), r.evaluate(ctx)))
            .collect()
    }

    /// Priority of every job in the catalog, indexed by job handle.
    pub fn rank(&self, catalog: &Catalog) -> Vec<RuleScore> {
        (0..catalog.jobs.len())
            .map(|j| self.score(&RequestContext::new(catalog.module_of(j), catalog.program_of(j))))
            .collect()
    }
}

impl std::fmt::Debug for PriorityRanker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityRanker")
            .field(
                "rules",
                &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
