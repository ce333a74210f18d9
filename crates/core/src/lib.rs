//! # U-Cutstock Core
//!
//! Pattern-based integer optimization for the one-dimensional cutting stock
//! problem: decide how many bars of each stock type to cut, and by which
//! cutting patterns, so that part demand is met at minimum stock cost while
//! accounting for the material lost to each saw cut.
//!
//! ## Pipeline
//!
//! | Stage | Type | Role |
//! |-------|------|------|
//! | Generation | [`PatternGenerator`] | Enumerates every distinct layout per stock type |
//! | Catalog | [`PatternCatalog`] | Holds the patterns of one run |
//! | Model | [`OptimizationModel`] | Usage variables, demand/availability rows, objective |
//! | Solve | [`MilpBackend`] | Integer programming under a time limit |
//! | Aggregation | [`aggregate`] | Itemised [`SolutionSummary`] |
//!
//! [`CuttingStockOptimizer`] runs the whole pipeline:
//!
//! ```rust
//! use u_cutstock_core::{CuttingStockOptimizer, OptimizerConfig, PartDemand, StockType};
//!
//! let stocks = vec![StockType::new("S1", 6000.0).with_cost(100.0).with_weight(60.0)];
//! let parts = vec![PartDemand::new("A", 2000.0, 2), PartDemand::new("B", 1000.0, 3)];
//!
//! let optimizer = CuttingStockOptimizer::new(OptimizerConfig::new().with_time_limit_ms(10_000));
//! let result = optimizer.optimize(&stocks, &parts, 3.0).unwrap();
//! if let Some(summary) = result.outcome.summary() {
//!     println!("{} bars, yield {:.1}%", summary.total_bars(), summary.yield_percentage);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Serialization support and the JSON request layer ([`request`])
//! - `highs`: HiGHS MILP backend with a native time limit (default). A run
//!   stopped by the limit returns its best plan as `Feasible`.
//! - `microlp`: Pure Rust MILP fallback for builds without a C++ toolchain.
//!   A timeout discards partial results and leaves the search running on a
//!   background thread.

pub mod aggregate;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod generator;
pub mod model;
pub mod pattern;
pub mod program;
#[cfg(feature = "serde")]
pub mod request;
pub mod solver;
pub mod stock;

// Re-exports
pub use aggregate::{aggregate, PartProduction, SolutionSummary, StockUsage, UsedPattern};
#[cfg(feature = "highs")]
pub use backend::HighsBackend;
#[cfg(feature = "microlp")]
pub use backend::MicrolpBackend;
pub use backend::{
    default_backend, is_milp_available, MilpBackend, MilpOutcome, SolveStatus, UnavailableBackend,
};
pub use catalog::PatternCatalog;
pub use config::{Objective, OptimizerConfig};
pub use error::{Error, Result};
pub use generator::{generate_patterns, PatternGenerator};
pub use model::OptimizationModel;
pub use pattern::{LayoutPiece, Pattern, PatternMetrics, DEFAULT_OFFCUT_TOLERANCE};
pub use program::{IntegerProgram, LinearConstraint, LinearExpr, Sense, VarId};
#[cfg(feature = "serde")]
pub use request::{
    solve_batch, solve_request, solve_request_with, CuttingRequest, CuttingResponse, PartSpec,
    RequestOptions, ResponseStatus, StockSpec,
};
pub use solver::{
    solve_usage, CuttingStockOptimizer, NoSolutionReason, Optimization, Outcome, RunReport,
    Solution,
};
pub use stock::{validate_instance, PartDemand, StockType};
