//! JSON request and response types.
//!
//! A [`CuttingRequest`] carries one problem instance in the exchange format
//! used by the surrounding job system:
//!
//! ```json
//! {
//!   "stock_data": { "S1": { "length": 6000, "cost": 100, "weight": 60, "available": 4 } },
//!   "parts_data": [ { "id": "A", "length": 2000, "demand": 2 } ],
//!   "saw_kerf": 3,
//!   "options": { "allow_overproduction": false }
//! }
//! ```
//!
//! [`solve_request`] runs one request, [`solve_batch`] runs independent
//! requests (one per stock profile) in parallel.

use crate::aggregate::SolutionSummary;
use crate::config::{Objective, OptimizerConfig};
use crate::error::Result;
use crate::solver::{CuttingStockOptimizer, Outcome, RunReport};
use crate::stock::{PartDemand, StockType};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stock type entry of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSpec {
    pub length: f64,

    #[serde(default)]
    pub cost: f64,

    /// Weight of one bar.
    #[serde(default)]
    pub weight: f64,

    /// Bars on hand; unlimited when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<u32>,
}

/// Part entry of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSpec {
    pub id: String,
    pub length: f64,
    pub demand: u32,
}

/// Per-request options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    #[serde(default)]
    pub allow_overproduction: bool,

    /// Solver time limit in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_seconds: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<Objective>,
}

/// One cutting stock problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuttingRequest {
    pub stock_data: BTreeMap<String, StockSpec>,
    pub parts_data: Vec<PartSpec>,

    #[serde(default)]
    pub saw_kerf: f64,

    #[serde(default)]
    pub options: RequestOptions,
}

impl CuttingRequest {
    /// Parses a request from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Stock types in id order.
    pub fn stocks(&self) -> Vec<StockType> {
        self.stock_data
            .iter()
            .map(|(id, spec)| StockType {
                id: id.clone(),
                length: spec.length,
                cost: spec.cost,
                weight: spec.weight,
                available: spec.available,
            })
            .collect()
    }

    /// Parts in request order.
    pub fn parts(&self) -> Vec<PartDemand> {
        self.parts_data
            .iter()
            .map(|p| PartDemand::new(p.id.clone(), p.length, p.demand))
            .collect()
    }

    /// `base` with this request's options applied.
    pub fn config(&self, base: &OptimizerConfig) -> OptimizerConfig {
        let mut config = base
            .clone()
            .with_overproduction(base.allow_overproduction || self.options.allow_overproduction);
        if let Some(objective) = self.options.objective {
            config = config.with_objective(objective);
        }
        match self.options.time_limit_seconds {
            Some(secs) if secs.is_finite() && secs > 0.0 => {
                config = config.with_time_limit_ms((secs * 1000.0).round() as u64);
            }
            Some(secs) => log::warn!("Ignoring invalid time limit {}s", secs),
            None => {}
        }
        config
    }
}

/// Response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    NoSolution,
}

/// Result of one request: status, the flattened summary when solved, and
/// the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuttingResponse {
    pub status: ResponseStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(flatten)]
    pub summary: Option<SolutionSummary>,

    pub report: RunReport,
}

impl CuttingResponse {
    /// Serialises the response as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Solves one request with the default configuration.
pub fn solve_request(request: &CuttingRequest) -> Result<CuttingResponse> {
    solve_request_with(request, &OptimizerConfig::default())
}

/// Solves one request on top of `base`.
pub fn solve_request_with(
    request: &CuttingRequest,
    base: &OptimizerConfig,
) -> Result<CuttingResponse> {
    let optimizer = CuttingStockOptimizer::new(request.config(base));
    let result = optimizer.optimize(&request.stocks(), &request.parts(), request.saw_kerf)?;

    let response = match result.outcome {
        Outcome::Solved(summary) => CuttingResponse {
            status: ResponseStatus::Success,
            message: Some(format!("{} solution found", result.report.solver_status)),
            summary: Some(summary),
            report: result.report,
        },
        Outcome::NoSolution(reason) => CuttingResponse {
            status: ResponseStatus::NoSolution,
            message: Some(reason.to_string()),
            summary: None,
            report: result.report,
        },
    };
    Ok(response)
}

/// Solves independent requests in parallel, keyed by profile name.
pub fn solve_batch(
    requests: &BTreeMap<String, CuttingRequest>,
    base: &OptimizerConfig,
) -> BTreeMap<String, Result<CuttingResponse>> {
    log::info!("Solving {} profiles", requests.len());
    requests
        .par_iter()
        .map(|(profile, request)| {
            let response = solve_request_with(request, base);
            if let Err(e) = &response {
                log::warn!("Profile '{}' rejected: {}", profile, e);
            }
            (profile.clone(), response)
        })
        .collect()
}
