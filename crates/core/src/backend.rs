//! MILP backends behind a narrow solver interface.
//!
//! A [`MilpBackend`] receives an [`IntegerProgram`] and a wall-clock budget
//! and returns a [`MilpOutcome`]. Concrete backends use the `good_lp` crate:
//!
//! - `highs` feature (default): [`HighsBackend`], HiGHS with its native time
//!   limit. A run cut short by the limit returns its best incumbent.
//! - `microlp` feature: [`MicrolpBackend`], a pure Rust branch and bound run
//!   on a worker thread; the caller stops waiting when the budget expires.
//!   A timed-out run returns nothing and its worker keeps running.
//!
//! Without either feature only [`UnavailableBackend`] exists, which never
//! finds a solution.
//!
//! Backends return raw values. Callers must not trust them without checking
//! them against the program (see [`IntegerProgram::violations`]).

use crate::program::IntegerProgram;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Status of a solver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SolveStatus {
    /// Proven optimal assignment.
    Optimal,
    /// Feasible assignment, optimality not proven (time limit reached).
    Feasible,
    /// No feasible assignment found. This is not a proof of infeasibility.
    #[default]
    NoSolution,
}

impl SolveStatus {
    /// Returns true if the status carries a usable assignment.
    pub fn has_solution(self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Optimal => write!(f, "optimal"),
            Self::Feasible => write!(f, "feasible"),
            Self::NoSolution => write!(f, "no_solution"),
        }
    }
}

/// Raw result of a backend run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MilpOutcome {
    /// Run status.
    pub status: SolveStatus,
    /// One value per program variable (empty without a solution).
    pub values: Vec<f64>,
    /// Human readable detail.
    pub message: String,
}

impl MilpOutcome {
    /// An outcome carrying an assignment.
    pub fn solved(status: SolveStatus, values: Vec<f64>) -> Self {
        Self {
            status,
            values,
            message: format!("{} solution found", status),
        }
    }

    /// An outcome without an assignment.
    pub fn no_solution(message: impl Into<String>) -> Self {
        Self {
            status: SolveStatus::NoSolution,
            values: Vec::new(),
            message: message.into(),
        }
    }
}

/// An integer programming engine.
pub trait MilpBackend: Send + Sync {
    /// Short backend name for reports.
    fn name(&self) -> &'static str;

    /// Minimises `program` within `time_limit`.
    fn solve(&self, program: &IntegerProgram, time_limit: Duration) -> MilpOutcome;
}

/// Backend used when no MILP solver is compiled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBackend;

impl MilpBackend for UnavailableBackend {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn solve(&self, _program: &IntegerProgram, _time_limit: Duration) -> MilpOutcome {
        log::warn!("MILP solver not available (compile with 'highs' or 'microlp' feature)");
        MilpOutcome::no_solution("no MILP backend compiled in")
    }
}

/// Check if a real MILP backend is compiled in.
pub fn is_milp_available() -> bool {
    cfg!(any(feature = "highs", feature = "microlp"))
}

/// The preferred backend of this build: HiGHS, then microlp, then none.
#[cfg(feature = "highs")]
pub fn default_backend(verbose: bool) -> Box<dyn MilpBackend> {
    Box::new(HighsBackend::new().with_verbose(verbose))
}

/// The preferred backend of this build: HiGHS, then microlp, then none.
#[cfg(all(feature = "microlp", not(feature = "highs")))]
pub fn default_backend(_verbose: bool) -> Box<dyn MilpBackend> {
    Box::new(MicrolpBackend::new())
}

/// The preferred backend of this build: HiGHS, then microlp, then none.
#[cfg(not(any(feature = "highs", feature = "microlp")))]
pub fn default_backend(_verbose: bool) -> Box<dyn MilpBackend> {
    Box::new(UnavailableBackend)
}

#[cfg(feature = "milp")]
mod lp {
    use crate::program::{IntegerProgram, LinearExpr, Sense};
    use good_lp::{variable, Constraint, Expression, ProblemVariables, Variable};

    /// A program translated into `good_lp` types.
    pub(super) struct LpModel {
        pub vars: ProblemVariables,
        pub handles: Vec<Variable>,
        pub objective: Expression,
        pub constraints: Vec<Constraint>,
    }

    pub(super) fn translate(program: &IntegerProgram) -> LpModel {
        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = program
            .vars
            .iter()
            .map(|v| {
                vars.add(
                    variable()
                        .integer()
                        .min(v.lower)
                        .max(v.upper)
                        .name(v.name.clone()),
                )
            })
            .collect();

        let expression = |expr: &LinearExpr| -> Expression {
            expr.terms
                .iter()
                .fold(Expression::from(expr.constant), |acc, &(var, coef)| {
                    acc + coef * handles[var.index()]
                })
        };

        let constraints = program
            .constraints
            .iter()
            .map(|c| {
                let lhs = expression(&c.expr);
                match c.sense {
                    Sense::Le => good_lp::constraint::leq(lhs, c.rhs),
                    Sense::Ge => good_lp::constraint::geq(lhs, c.rhs),
                    Sense::Eq => good_lp::constraint::eq(lhs, c.rhs),
                }
            })
            .collect();
        let objective = expression(&program.objective);

        LpModel {
            vars,
            handles,
            objective,
            constraints,
        }
    }
}

/// HiGHS backend with a native time limit.
#[cfg(feature = "highs")]
#[derive(Debug, Clone, Default)]
pub struct HighsBackend {
    verbose: bool,
}

#[cfg(feature = "highs")]
impl HighsBackend {
    /// Creates a quiet HiGHS backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forwards HiGHS log output to stdout.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[cfg(feature = "highs")]
impl MilpBackend for HighsBackend {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(&self, program: &IntegerProgram, time_limit: Duration) -> MilpOutcome {
        use good_lp::{Solution, SolverModel};
        use std::time::Instant;

        let model = lp::translate(program);
        let mut problem = model
            .vars
            .minimise(model.objective)
            .using(good_lp::highs)
            .set_verbose(self.verbose)
            .set_time_limit(time_limit.as_secs_f64());
        for constraint in model.constraints {
            problem = problem.with(constraint);
        }

        log::info!(
            "Solving with HiGHS: {} variables, {} constraints, limit {:.1}s",
            program.num_vars(),
            program.num_constraints(),
            time_limit.as_secs_f64()
        );

        let start = Instant::now();
        match problem.solve() {
            Ok(solution) => {
                let solve_time = start.elapsed();
                let values = model.handles.iter().map(|&v| solution.value(v)).collect();
                let status = highs_status(solve_time, time_limit);
                log::debug!("HiGHS finished in {:?} ({})", solve_time, status);
                MilpOutcome::solved(status, values)
            }
            Err(e) => {
                log::warn!("HiGHS found no solution: {}", e);
                MilpOutcome::no_solution(e.to_string())
            }
        }
    }
}

/// Status of a HiGHS run that returned an assignment.
///
/// HiGHS hands back its incumbent when the limit is hit, so a run that used
/// the whole budget is only known to be feasible.
#[cfg(feature = "highs")]
fn highs_status(solve_time: Duration, time_limit: Duration) -> SolveStatus {
    if solve_time >= time_limit {
        SolveStatus::Feasible
    } else {
        SolveStatus::Optimal
    }
}

/// Pure Rust backend (microlp) bounded by a caller-side deadline.
///
/// Opt-in fallback for builds without HiGHS. microlp has no time limit and no
/// incumbent of its own, so the search runs on a detached worker thread:
///
/// - when the budget expires first the run reports no solution, even if a
///   feasible plan exists, and any partial progress is discarded;
/// - the worker is not cancelled. It keeps a CPU busy until its search
///   completes, after `solve` has returned.
///
/// Prefer [`HighsBackend`] wherever time limits matter.
#[cfg(feature = "microlp")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MicrolpBackend;

#[cfg(feature = "microlp")]
impl MicrolpBackend {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }

    fn solve_blocking(program: &IntegerProgram) -> Result<Vec<f64>, String> {
        use good_lp::{Solution, SolverModel};

        let model = lp::translate(program);
        let mut problem = model
            .vars
            .minimise(model.objective)
            .using(good_lp::microlp);
        for constraint in model.constraints {
            problem = problem.with(constraint);
        }
        problem
            .solve()
            .map(|solution| model.handles.iter().map(|&v| solution.value(v)).collect())
            .map_err(|e| e.to_string())
    }
}

#[cfg(feature = "microlp")]
impl MilpBackend for MicrolpBackend {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, program: &IntegerProgram, time_limit: Duration) -> MilpOutcome {
        use std::sync::mpsc::{self, RecvTimeoutError};

        log::info!(
            "Solving with microlp: {} variables, {} constraints, limit {:.1}s",
            program.num_vars(),
            program.num_constraints(),
            time_limit.as_secs_f64()
        );

        let owned = program.clone();
        let (tx, rx) = mpsc::channel();
        let spawned = std::thread::Builder::new()
            .name("cutstock-microlp".to_string())
            .spawn(move || {
                // The receiver is gone once the deadline passed.
                let _ = tx.send(Self::solve_blocking(&owned));
            });
        if let Err(e) = spawned {
            log::error!("Failed to start solver thread: {}", e);
            return MilpOutcome::no_solution(format!("failed to start solver thread: {}", e));
        }

        match rx.recv_timeout(time_limit) {
            Ok(Ok(values)) => MilpOutcome::solved(SolveStatus::Optimal, values),
            Ok(Err(message)) => {
                log::warn!("microlp found no solution: {}", message);
                MilpOutcome::no_solution(message)
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "microlp did not finish within {:.1}s; partial results discarded, \
                     worker still running",
                    time_limit.as_secs_f64()
                );
                MilpOutcome::no_solution("time limit reached without a solution")
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::error!("microlp worker stopped without a result");
                MilpOutcome::no_solution("solver thread stopped without a result")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{LinearExpr, Sense};

    fn small_program() -> IntegerProgram {
        // min x + y  s.t.  2x + 3y >= 7, x <= 10, y <= 10
        let mut program = IntegerProgram::new();
        let x = program.add_var("x", 0.0, 10.0);
        let y = program.add_var("y", 0.0, 10.0);
        program.add_constraint(
            "cover",
            LinearExpr::new().with_term(x, 2.0).with_term(y, 3.0),
            Sense::Ge,
            7.0,
        );
        program.set_objective(LinearExpr::new().with_term(x, 1.0).with_term(y, 1.0));
        program
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SolveStatus::Optimal.to_string(), "optimal");
        assert_eq!(SolveStatus::Feasible.to_string(), "feasible");
        assert_eq!(SolveStatus::NoSolution.to_string(), "no_solution");
        assert!(SolveStatus::Feasible.has_solution());
        assert!(!SolveStatus::NoSolution.has_solution());
    }

    #[test]
    fn test_unavailable_backend() {
        let outcome = UnavailableBackend.solve(&small_program(), Duration::from_secs(1));
        assert_eq!(outcome.status, SolveStatus::NoSolution);
        assert!(outcome.values.is_empty());
    }

    #[test]
    fn test_is_milp_available() {
        assert_eq!(
            is_milp_available(),
            cfg!(any(feature = "highs", feature = "microlp"))
        );
    }

    #[test]
    #[cfg(feature = "milp")]
    fn test_default_backend_solves_small_program() {
        let program = small_program();
        let backend = default_backend(false);
        let outcome = backend.solve(&program, Duration::from_secs(10));

        assert!(outcome.status.has_solution(), "{}", outcome.message);
        let values = IntegerProgram::round(&outcome.values);
        assert!(program.is_feasible(&values));
        // 2*2 + 3*1 = 7 with x + y = 3
        assert_eq!(program.objective_value(&values), 3.0);
    }

    #[test]
    #[cfg(feature = "highs")]
    fn test_highs_status_uses_solve_time() {
        let limit = Duration::from_millis(500);
        assert_eq!(
            highs_status(Duration::from_millis(120), limit),
            SolveStatus::Optimal
        );
        assert_eq!(highs_status(limit, limit), SolveStatus::Feasible);
        assert_eq!(
            highs_status(Duration::from_millis(900), limit),
            SolveStatus::Feasible
        );
    }

    #[test]
    #[cfg(feature = "highs")]
    fn test_highs_is_the_default_backend() {
        assert_eq!(default_backend(false).name(), "highs");
        let outcome = HighsBackend::new().solve(&small_program(), Duration::from_secs(10));
        assert_eq!(outcome.status, SolveStatus::Optimal, "{}", outcome.message);
    }

    #[test]
    #[cfg(feature = "milp")]
    fn test_default_backend_reports_infeasible() {
        let mut program = small_program();
        let x = crate::program::VarId(0);
        program.add_constraint("cap", LinearExpr::new().with_term(x, 1.0), Sense::Ge, 11.0);
        let outcome = default_backend(false).solve(&program, Duration::from_secs(10));
        assert_eq!(outcome.status, SolveStatus::NoSolution);
    }
}
