//! Integer optimization model over a pattern catalog.
//!
//! # Formulation
//!
//! - `x[p]`: integer usage count of pattern `p`, bounded by
//!   `min(total demand + margin, available[stock(p)], u32::MAX)`.
//! - Demand, exact mode: `sum_p x[p] * yield[p][j] == demand[j]` for every part.
//! - Demand, overproduction mode: `sum_p x[p] * yield[p][j] - over[j] == demand[j]`
//!   with `over[j]` a bounded non-negative integer.
//! - Availability: `sum_{p of stock s} x[p] <= available[s]` for capped stock.
//! - Objective [`Objective::StockCost`]: `sum_p x[p] * cost[stock(p)]`; with
//!   overproduction enabled, plus `avg_cost_per_length * (sum_p x[p] * waste[p]
//!   + sum_j over[j] * length[j])`.
//! - Objective [`Objective::BarCount`]: `sum_p x[p]`.

use crate::catalog::PatternCatalog;
use crate::config::{Objective, OptimizerConfig};
use crate::error::{Error, Result};
use crate::program::{IntegerProgram, LinearExpr, Sense, VarId};
use crate::stock::{average_cost_per_length, total_demand, PartDemand, StockType};
use std::collections::{BTreeMap, HashMap};

/// The integer program for one run plus the mapping back to patterns.
#[derive(Debug, Clone)]
pub struct OptimizationModel {
    program: IntegerProgram,
    /// Usage variable of each catalog pattern, in catalog order.
    usage_vars: Vec<VarId>,
    pattern_ids: Vec<String>,
    overproduction_vars: BTreeMap<String, VarId>,
}

impl OptimizationModel {
    /// Builds the model for `catalog`.
    pub fn build(
        catalog: &PatternCatalog,
        stocks: &[StockType],
        parts: &[PartDemand],
        config: &OptimizerConfig,
    ) -> Self {
        let stock_by_id: HashMap<&str, &StockType> =
            stocks.iter().map(|s| (s.id.as_str(), s)).collect();
        // Usage counts are u32.
        let usage_cap = (total_demand(parts) + u64::from(config.usage_margin))
            .min(u64::from(u32::MAX));

        let mut program = IntegerProgram::new();
        let mut usage_vars = Vec::with_capacity(catalog.len());
        let mut upper_bounds = Vec::with_capacity(catalog.len());

        for pattern in catalog.patterns() {
            let available = stock_by_id
                .get(pattern.stock_id.as_str())
                .and_then(|s| s.available)
                .map(u64::from);
            let upper = available.map_or(usage_cap, |a| a.min(usage_cap));
            upper_bounds.push(upper as f64);
            usage_vars.push(program.add_var(format!("x_{}", pattern.id), 0.0, upper as f64));
        }

        // Demand satisfaction.
        let mut overproduction_vars = BTreeMap::new();
        for part in parts {
            let mut expr = LinearExpr::new();
            let mut max_production = 0.0;
            for (idx, pattern) in catalog.patterns().iter().enumerate() {
                let count = pattern.yield_of(&part.id);
                if count > 0 {
                    expr.add_term(usage_vars[idx], f64::from(count));
                    max_production += upper_bounds[idx] * f64::from(count);
                }
            }

            if config.allow_overproduction {
                let surplus_cap = (max_production - f64::from(part.demand)).max(0.0);
                let over = program.add_var(format!("over_{}", part.id), 0.0, surplus_cap);
                expr.add_term(over, -1.0);
                overproduction_vars.insert(part.id.clone(), over);
            }
            program.add_constraint(
                format!("demand_{}", part.id),
                expr,
                Sense::Eq,
                f64::from(part.demand),
            );
        }

        // Stock availability.
        for stock in stocks {
            let Some(available) = stock.available else {
                continue;
            };
            let mut expr = LinearExpr::new();
            for &idx in catalog.indices_for_stock(&stock.id) {
                expr.add_term(usage_vars[idx], 1.0);
            }
            if !expr.is_constant() {
                program.add_constraint(
                    format!("available_{}", stock.id),
                    expr,
                    Sense::Le,
                    f64::from(available),
                );
            }
        }

        // Objective.
        let mut objective = LinearExpr::new();
        match config.objective {
            Objective::BarCount => {
                for &var in &usage_vars {
                    objective.add_term(var, 1.0);
                }
            }
            Objective::StockCost => {
                let penalty_rate = if config.allow_overproduction {
                    average_cost_per_length(stocks)
                } else {
                    0.0
                };
                for (idx, pattern) in catalog.patterns().iter().enumerate() {
                    let cost = stock_by_id
                        .get(pattern.stock_id.as_str())
                        .map_or(0.0, |s| s.cost);
                    let waste_penalty = penalty_rate * pattern.metrics.waste.max(0.0);
                    objective.add_term(usage_vars[idx], cost + waste_penalty);
                }
                if penalty_rate > 0.0 {
                    for part in parts {
                        if let Some(&over) = overproduction_vars.get(&part.id) {
                            objective.add_term(over, penalty_rate * part.length);
                        }
                    }
                }
            }
        }
        program.set_objective(objective);

        log::debug!(
            "Model built: {} variables, {} constraints, objective {}",
            program.num_vars(),
            program.num_constraints(),
            config.objective
        );

        Self {
            program,
            usage_vars,
            pattern_ids: catalog.patterns().iter().map(|p| p.id.clone()).collect(),
            overproduction_vars,
        }
    }

    /// The integer program handed to the backend.
    pub fn program(&self) -> &IntegerProgram {
        &self.program
    }

    /// Usage variable of the catalog pattern at `index`.
    pub fn usage_var(&self, index: usize) -> VarId {
        self.usage_vars[index]
    }

    /// Overproduction variable of a part, present only in overproduction mode.
    pub fn overproduction_var(&self, part_id: &str) -> Option<VarId> {
        self.overproduction_vars.get(part_id).copied()
    }

    /// Extracts the non-zero pattern usage counts from a verified assignment.
    ///
    /// # Errors
    ///
    /// [`Error::UsageOverflow`] if a count is outside the `u32` range.
    pub fn usage_from_values(&self, values: &[f64]) -> Result<BTreeMap<String, u32>> {
        let mut usage = BTreeMap::new();
        for (var, id) in self.usage_vars.iter().zip(&self.pattern_ids) {
            let count = values.get(var.index()).copied().unwrap_or(0.0).round();
            if count < 1.0 {
                continue;
            }
            if !count.is_finite() || count > f64::from(u32::MAX) {
                return Err(Error::UsageOverflow {
                    pattern: id.clone(),
                    count,
                });
            }
            usage.insert(id.clone(), count as u32);
        }
        Ok(usage)
    }

    /// Builds a full assignment from pattern usage counts, filling the
    /// overproduction variables from the implied surplus.
    pub fn values_from_usage(
        &self,
        usage: &BTreeMap<String, u32>,
        catalog: &PatternCatalog,
        parts: &[PartDemand],
    ) -> Vec<f64> {
        let mut values = vec![0.0; self.program.num_vars()];
        for (var, id) in self.usage_vars.iter().zip(&self.pattern_ids) {
            values[var.index()] = f64::from(usage.get(id).copied().unwrap_or(0));
        }
        for part in parts {
            if let Some(over) = self.overproduction_var(&part.id) {
                let produced: u64 = catalog
                    .patterns()
                    .iter()
                    .map(|p| {
                        u64::from(usage.get(&p.id).copied().unwrap_or(0))
                            * u64::from(p.yield_of(&part.id))
                    })
                    .sum();
                values[over.index()] = produced as f64 - f64::from(part.demand);
            }
        }
        values
    }
}
