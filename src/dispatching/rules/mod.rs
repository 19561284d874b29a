//! Built-in priority rules.
//!
//! # Categories
//!
//! - **Base**: CREDIT (LOW / MEDIUM / HIGH tier)
//! - **Bonus**: LAB, ADVANCED
//!
//! # Score Convention
//! All rules return higher scores for requests that should be placed first.

use super::{PriorityRule, RequestContext, RuleScore};
use crate::config::PriorityPolicy;

/// Base tier for low-credit modules.
pub const LOW: RuleScore = 1;
/// Base tier for ordinary modules.
pub const MEDIUM: RuleScore = 2;
/// Base tier for high-credit modules.
pub const HIGH: RuleScore = 3;

/// Credit tier.
///
/// Credit above `high_above` ranks HIGH, below `low_below` ranks LOW,
/// anything else MEDIUM.
#[derive(Debug, Clone, Copy)]
pub struct CreditTier {
    pub high_above: u32,
    pub low_below: u32,
}

impl CreditTier {
    pub fn from_policy(policy: &PriorityPolicy) -> Self {
        Self {
            high_above: policy.high_credit_above,
            low_below: policy.low_credit_below,
        }
    }
}

impl Default for CreditTier {
    fn default() -> Self {
        Self::from_policy(&PriorityPolicy::default())
    }
}

impl PriorityRule for CreditTier {
    fn name(&self) -> &'static str {
        "CREDIT"
    }

    fn evaluate(&self, ctx: &RequestContext<'_>) -> RuleScore {
        let credit = ctx.module.credit;
        if credit > self.high_above {
            HIGH
        } else if credit < self.low_below {
            LOW
        } else {
            MEDIUM
        }
    }

    fn description(&self) -> &'static str {
        "Credit-based base tier"
    }
}

/// +1 for lab-type modules.
///
/// Lab sessions need scarce specialised rooms, so they go first.
#[derive(Debug, Clone)]
pub struct LabBonus {
    pub kinds: Vec<String>,
}

impl LabBonus {
    pub fn new(kinds: Vec<String>) -> Self {
        Self { kinds }
    }
}

impl PriorityRule for LabBonus {
    fn name(&self) -> &'static str {
        "LAB"
    }

    fn evaluate(&self, ctx: &RequestContext<'_>) -> RuleScore {
        RuleScore::from(self.kinds.iter().any(|k| *k == ctx.module.kind))
    }

    fn description(&self) -> &'static str {
        "Lab or practical module bonus"
    }
}

/// +1 for programs at an advanced level.
#[derive(Debug, Clone)]
pub struct AdvancedLevelBonus {
    pub levels: Vec<String>,
}

impl AdvancedLevelBonus {
    pub fn new(levels: Vec<String>) -> Self {
        Self { levels }
    }
}

impl PriorityRule for AdvancedLevelBonus {
    fn name(&self) -> &'static str {
        "ADVANCED"
    }

    fn evaluate(&self, ctx: &RequestContext<'_>) -> RuleScore {
        RuleScore::from(self.levels.iter().any(|l| *l == ctx.program.level))
    }

    fn description(&self) -> &'static str {
        "Advanced program level bonus"
    }
}
