//! Engine configuration.
//!
//! Every tunable of a generation run lives here: duration tiers, priority
//! weights, optimizer thresholds, retry budget and the strategy choice.
//! Configuration can be built in code or loaded from TOML.
//!
//! # Examples
//!
//! ```
//! use u_timetable::config::{SchedulerConfig, Strategy};
//!
//! let config = SchedulerConfig::from_toml_str(r#"
//!     strategy = "greedy"
//!     random_seed = 7
//!
//!     [durations]
//!     mid_min = 120
//!
//!     [recovery]
//!     max_retries = 5
//! "#).unwrap();
//!
//! assert_eq!(config.strategy, Strategy::Greedy);
//! assert_eq!(config.durations.mid_min, 120);
//! assert_eq!(config.durations.min_min, 120);
//! assert_eq!(config.recovery.max_retries, 5);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which placement engine a run uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Greedy placement; escalate to backtracking for small inputs that
    /// still have unplaced requests after recovery.
    #[default]
    Auto,
    /// Greedy placement only.
    Greedy,
    /// Exhaustive search first, greedy if the search fails.
    Backtracking,
}

/// Main engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Placement engine.
    pub strategy: Strategy,
    /// Seed for candidate shuffling. `None` = deterministic grid/input order.
    pub random_seed: Option<u64>,
    /// Grid cursor step (minutes).
    pub slot_step_min: i32,
    /// Credit → duration rule.
    pub durations: DurationPolicy,
    /// Priority ranking parameters.
    pub priority: PriorityPolicy,
    /// Post-placement optimizer parameters.
    pub optimizer: OptimizerConfig,
    /// Failure handler parameters.
    pub recovery: RecoveryConfig,
    /// Exhaustive search limits.
    pub backtracking: BacktrackingConfig,
}

/// Session duration tiers keyed by module credit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationPolicy {
    /// Duration for credit <= `low_credit` (minutes).
    pub min_min: i32,
    /// Duration for credits strictly between the thresholds (minutes).
    pub mid_min: i32,
    /// Duration for credit >= `high_credit` (minutes).
    pub max_min: i32,
    pub low_credit: u32,
    pub high_credit: u32,
}

/// Priority ranking parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityPolicy {
    /// Credit strictly above this ranks HIGH.
    pub high_credit_above: u32,
    /// Credit strictly below this ranks LOW.
    pub low_credit_below: u32,
    /// Module kinds that earn the lab bonus.
    pub lab_kinds: Vec<String>,
    /// Program levels that earn the advanced-level bonus.
    pub advanced_levels: Vec<String>,
}

/// Optimizer thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub enabled: bool,
    /// Gaps strictly above this are candidates for closing (minutes).
    pub gap_lower_min: i32,
    /// Gaps strictly below this are candidates for closing (minutes).
    pub gap_upper_min: i32,
    /// Longest allowed consecutive teaching run (minutes).
    pub max_consecutive_min: i32,
    /// Sessions separated by at most this gap count as consecutive (minutes).
    pub consecutive_tolerance_min: i32,
    /// Offset between the end of one stream and the start of the next (minutes).
    pub stream_offset_min: i32,
}

/// Failure handler parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    pub max_retries: u32,
}

/// Exhaustive search limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktrackingConfig {
    /// Largest request count `Strategy::Auto` escalates to the search.
    pub max_requests: usize,
    /// Node budget for one search.
    pub max_steps: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Auto,
            random_seed: None,
            slot_step_min: 30,
            durations: DurationPolicy::default(),
            priority: PriorityPolicy::default(),
            optimizer: OptimizerConfig::default(),
            recovery: RecoveryConfig::default(),
            backtracking: BacktrackingConfig::default(),
        }
    }
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self {
            min_min: 120,
            mid_min: 150,
            max_min: 180,
            low_credit: 10,
            high_credit: 15,
        }
    }
}

impl DurationPolicy {
    /// Session duration (minutes) for a module credit.
    pub fn duration_for(&self, credit: u32) -> i32 {
        if credit <= self.low_credit {
            self.min_min
        } else if credit >= self.high_credit {
            self.max_min
        } else {
            self.mid_min
        }
    }
}

impl Default for PriorityPolicy {
    fn default() -> Self {
        Self {
            high_credit_above: 14,
            low_credit_below: 8,
            lab_kinds: vec!["Laboratory".into(), "Practical".into()],
            advanced_levels: vec!["7".into(), "8".into(), "9".into()],
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gap_lower_min: 30,
            gap_upper_min: 120,
            max_consecutive_min: 240,
            consecutive_tolerance_min: 15,
            stream_offset_min: 15,
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

impl Default for BacktrackingConfig {
    fn default() -> Self {
        Self {
            max_requests: 12,
            max_steps: 200_000,
        }
    }
}

impl SchedulerConfig {
    /// Creates a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the placement strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the grid cursor step.
    pub fn with_slot_step(mut self, minutes: i32) -> Self {
        self.slot_step_min = minutes;
        self
    }

    /// Disables the optimizer passes.
    pub fn without_optimizer(mut self) -> Self {
        self.optimizer.enabled = false;
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_step_min <= 0 {
            return Err(ConfigError::Invalid("slot_step_min must be positive".into()));
        }
        let d = &self.durations;
        if d.min_min <= 0 || d.mid_min <= 0 || d.max_min <= 0 {
            return Err(ConfigError::Invalid("durations must be positive".into()));
        }
        if d.low_credit >= d.high_credit {
            return Err(ConfigError::Invalid(format!(
                "low_credit ({}) must be below high_credit ({})",
                d.low_credit, d.high_credit
            )));
        }
        let o = &self.optimizer;
        if o.gap_lower_min >= o.gap_upper_min {
            return Err(ConfigError::Invalid(
                "gap_lower_min must be below gap_upper_min".into(),
            ));
        }
        if o.max_consecutive_min <= 0 || o.consecutive_tolerance_min < 0 || o.stream_offset_min < 0 {
            return Err(ConfigError::Invalid("optimizer limits out of range".into()));
        }
        Ok(())
    }
}
