//! Optimizer configuration.

use crate::pattern::DEFAULT_OFFCUT_TOLERANCE;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Quantity minimised by the optimization model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Objective {
    /// Total stock cost; with overproduction enabled, waste and surplus
    /// length are penalised at the average cost per unit length.
    #[default]
    StockCost,
    /// Total number of bars, for catalogs without cost data.
    BarCount,
}

impl std::fmt::Display for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StockCost => write!(f, "stock_cost"),
            Self::BarCount => write!(f, "bar_count"),
        }
    }
}

/// Configuration for one optimization run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OptimizerConfig {
    /// Hard wall-clock budget for the solver in milliseconds.
    pub time_limit_ms: u64,

    /// Permit producing more pieces than demanded.
    pub allow_overproduction: bool,

    /// Objective function.
    pub objective: Objective,

    /// Margin added to the total demand when bounding pattern usage.
    pub usage_margin: u32,

    /// Leftover length above which a final separating cut is counted.
    pub offcut_tolerance: f64,

    /// Forward solver log output.
    pub verbose: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 60_000,
            allow_overproduction: false,
            objective: Objective::default(),
            usage_margin: 10,
            offcut_tolerance: DEFAULT_OFFCUT_TOLERANCE,
            verbose: false,
        }
    }
}

impl OptimizerConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the solver time limit in milliseconds (at least 1 ms).
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms.max(1);
        self
    }

    /// Enables or disables overproduction.
    pub fn with_overproduction(mut self, allow: bool) -> Self {
        self.allow_overproduction = allow;
        self
    }

    /// Sets the objective.
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    /// Sets the usage bound margin.
    pub fn with_usage_margin(mut self, margin: u32) -> Self {
        self.usage_margin = margin;
        self
    }

    /// Sets the offcut tolerance.
    pub fn with_offcut_tolerance(mut self, tolerance: f64) -> Self {
        self.offcut_tolerance = tolerance.max(0.0);
        self
    }

    /// Enables solver log output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Time limit as a [`Duration`].
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }
}
