//! The optimization pipeline.
//!
//! [`CuttingStockOptimizer::optimize`] validates the instance, generates the
//! pattern catalog, builds the integer model, runs the MILP backend under the
//! configured time limit and aggregates the chosen usage counts:
//!
//! ```text
//! PatternGenerator -> PatternCatalog -> OptimizationModel -> MilpBackend -> aggregate
//! ```
//!
//! A run holds no state beyond its own inputs, so independent runs can be
//! executed concurrently.

use crate::aggregate::{aggregate, SolutionSummary};
use crate::backend::{default_backend, MilpBackend, SolveStatus};
use crate::catalog::PatternCatalog;
use crate::config::OptimizerConfig;
use crate::error::Result;
use crate::model::OptimizationModel;
use crate::program::IntegerProgram;
use crate::stock::{total_demand, validate_instance, PartDemand, StockType};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why a run ended without a cutting plan.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum NoSolutionReason {
    /// Every stock type is too short for every part.
    NoPatterns,
    /// The backend produced no usable assignment within the time limit.
    /// Infeasibility is not proven.
    NotFound { message: String },
}

impl std::fmt::Display for NoSolutionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPatterns => write!(f, "no feasible cutting pattern for any stock type"),
            Self::NotFound { message } => write!(f, "no solution found: {}", message),
        }
    }
}

/// A verified usage assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub status: SolveStatus,
    /// Pattern id -> usage count; patterns left unused are omitted.
    pub usage: BTreeMap<String, u32>,
    pub objective_value: f64,
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Solved(SolutionSummary),
    NoSolution(NoSolutionReason),
}

impl Outcome {
    /// The summary, if a plan was found.
    pub fn summary(&self) -> Option<&SolutionSummary> {
        match self {
            Self::Solved(summary) => Some(summary),
            Self::NoSolution(_) => None,
        }
    }

    /// Returns true if a plan was found.
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved(_))
    }
}

/// Statistics of a run, returned with its outcome.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunReport {
    /// Generated patterns per stock id.
    pub pattern_counts: BTreeMap<String, usize>,
    pub total_patterns: usize,
    pub num_variables: usize,
    pub num_constraints: usize,
    /// Backend name.
    pub solver: String,
    pub solver_status: SolveStatus,
    pub objective_value: Option<f64>,
    pub generation_ms: u64,
    pub solve_ms: u64,
    pub total_ms: u64,
}

/// Outcome and report of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Optimization {
    pub outcome: Outcome,
    pub report: RunReport,
}

/// Runs `model` on `backend` and verifies the rounded result.
///
/// Backend values are rounded to integers and checked against the program.
/// A violation, or a usage count outside the `u32` range, turns the run into
/// a no-solution result.
pub fn solve_usage(
    model: &OptimizationModel,
    backend: &dyn MilpBackend,
    time_limit: Duration,
) -> std::result::Result<Solution, NoSolutionReason> {
    let program = model.program();
    let outcome = backend.solve(program, time_limit);
    if !outcome.status.has_solution() {
        return Err(NoSolutionReason::NotFound {
            message: outcome.message,
        });
    }

    let values = IntegerProgram::round(&outcome.values);
    let violations = program.violations(&values);
    if !violations.is_empty() {
        log::warn!(
            "Rejecting {} solution from {}: {}",
            outcome.status,
            backend.name(),
            violations.join("; ")
        );
        return Err(NoSolutionReason::NotFound {
            message: format!("solver returned an invalid assignment: {}", violations[0]),
        });
    }

    let usage = model.usage_from_values(&values).map_err(|e| {
        log::warn!("Rejecting {} solution from {}: {}", outcome.status, backend.name(), e);
        NoSolutionReason::NotFound {
            message: e.to_string(),
        }
    })?;

    Ok(Solution {
        status: outcome.status,
        usage,
        objective_value: program.objective_value(&values),
    })
}

/// One-dimensional cutting stock optimizer.
pub struct CuttingStockOptimizer {
    config: OptimizerConfig,
    backend: Box<dyn MilpBackend>,
}

impl CuttingStockOptimizer {
    /// Creates an optimizer using the default backend of this build.
    pub fn new(config: OptimizerConfig) -> Self {
        let backend = default_backend(config.verbose);
        Self { config, backend }
    }

    /// Creates an optimizer with a specific backend.
    pub fn with_backend(config: OptimizerConfig, backend: Box<dyn MilpBackend>) -> Self {
        Self { config, backend }
    }

    /// Configuration applied to every run.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Name of the backend in use.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Computes a cutting plan.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error for malformed stock, parts or kerf.
    /// Failing to find a plan is reported through [`Outcome::NoSolution`].
    pub fn optimize(
        &self,
        stocks: &[StockType],
        parts: &[PartDemand],
        kerf: f64,
    ) -> Result<Optimization> {
        let start = Instant::now();
        validate_instance(stocks, parts, kerf)?;

        let catalog = PatternCatalog::build_with_tolerance(
            stocks,
            parts,
            kerf,
            self.config.offcut_tolerance,
        );
        let mut report = RunReport {
            pattern_counts: catalog.pattern_counts(),
            total_patterns: catalog.len(),
            solver: self.backend.name().to_string(),
            generation_ms: elapsed_ms(start),
            ..RunReport::default()
        };

        if total_demand(parts) == 0 {
            log::info!("Total demand is zero, nothing to cut");
            let summary = aggregate(&catalog, &BTreeMap::new(), stocks, parts)?;
            report.solver_status = SolveStatus::Optimal;
            report.objective_value = Some(0.0);
            report.total_ms = elapsed_ms(start);
            return Ok(Optimization {
                outcome: Outcome::Solved(summary),
                report,
            });
        }

        if catalog.is_empty() {
            log::warn!("No stock type can hold any part");
            report.total_ms = elapsed_ms(start);
            return Ok(Optimization {
                outcome: Outcome::NoSolution(NoSolutionReason::NoPatterns),
                report,
            });
        }

        let model = OptimizationModel::build(&catalog, stocks, parts, &self.config);
        report.num_variables = model.program().num_vars();
        report.num_constraints = model.program().num_constraints();

        let solve_start = Instant::now();
        let solved = solve_usage(&model, self.backend.as_ref(), self.config.time_limit());
        report.solve_ms = elapsed_ms(solve_start);

        let outcome = match solved {
            Ok(solution) => {
                log::info!(
                    "{} solution: {} patterns used, objective {:.4}",
                    solution.status,
                    solution.usage.len(),
                    solution.objective_value
                );
                report.solver_status = solution.status;
                report.objective_value = Some(solution.objective_value);
                Outcome::Solved(aggregate(&catalog, &solution.usage, stocks, parts)?)
            }
            Err(reason) => {
                log::warn!("{}", reason);
                Outcome::NoSolution(reason)
            }
        };
        report.total_ms = elapsed_ms(start);

        Ok(Optimization { outcome, report })
    }
}

impl Default for CuttingStockOptimizer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}
