//! Solution aggregation.
//!
//! [`aggregate`] turns pattern usage counts into a [`SolutionSummary`]. It is
//! a pure function: the same catalog and usage always produce the same
//! summary, and every map is ordered so serialised summaries are identical
//! too.
//!
//! Weights are derived from each stock type's weight per unit length. Waste
//! weight is the remainder `stock - parts - kerf`, so the three components
//! always add up to the stock weight used.

use crate::catalog::PatternCatalog;
use crate::error::{Error, Result};
use crate::pattern::LayoutPiece;
use crate::stock::{PartDemand, StockType};
use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Consumption of one stock type.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StockUsage {
    pub bars_used: u64,
    pub length_mm: f64,
    pub cost: f64,
    pub weight_kg: f64,
}

/// Production of one part.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartProduction {
    pub length_mm: f64,
    pub demanded: u32,
    pub produced: u64,
    pub overproduced: u64,
    pub weight_kg: f64,
}

/// A pattern applied at least once, with its usage count.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UsedPattern {
    pub id: String,
    pub stock_id: String,
    pub usage: u32,
    pub yields: BTreeMap<String, u32>,
    pub layout: Vec<LayoutPiece>,
    pub parts_length: f64,
    pub kerf_length: f64,
    pub used_length: f64,
    pub waste: f64,
    pub cuts: u32,
}

/// Itemised result of a cutting plan.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolutionSummary {
    pub pattern_usage: BTreeMap<String, u32>,
    pub total_stock_items_used: BTreeMap<String, u64>,
    pub total_parts_produced: BTreeMap<String, u64>,
    pub total_stock_cost: f64,
    pub total_length_all_parts_produced_mm: f64,
    pub total_length_all_stock_used_mm: f64,
    pub total_kerf_length_mm: f64,
    pub total_waste_length_mm: f64,
    pub total_weight_all_stock_used_kg: f64,
    pub total_weight_all_parts_produced_kg: f64,
    pub total_weight_kerf_kg: f64,
    pub total_weight_waste_kg: f64,
    pub total_number_of_cuts: u64,
    pub yield_percentage: f64,
    pub weight_produced_per_part_kg: BTreeMap<String, f64>,
    pub stock_usage: BTreeMap<String, StockUsage>,
    pub part_production: BTreeMap<String, PartProduction>,
    pub patterns: Vec<UsedPattern>,
    pub total_objective_value: f64,
}

impl SolutionSummary {
    /// Total number of bars cut.
    pub fn total_bars(&self) -> u64 {
        self.total_stock_items_used.values().sum()
    }

    /// Returns true if every part was produced at least as often as demanded.
    pub fn meets_demand(&self) -> bool {
        self.part_production
            .values()
            .all(|p| p.produced >= u64::from(p.demanded))
    }
}

/// Builds the summary for `usage` (pattern id -> count).
///
/// Zero counts are ignored. Every declared stock type and part appears in the
/// per-stock and per-part maps, used or not.
///
/// # Errors
///
/// [`Error::UnknownPattern`] if `usage` names a pattern missing from `catalog`.
pub fn aggregate(
    catalog: &PatternCatalog,
    usage: &BTreeMap<String, u32>,
    stocks: &[StockType],
    parts: &[PartDemand],
) -> Result<SolutionSummary> {
    let stock_by_id: HashMap<&str, &StockType> =
        stocks.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut summary = SolutionSummary::default();
    for stock in stocks {
        summary.total_stock_items_used.insert(stock.id.clone(), 0);
        summary
            .stock_usage
            .insert(stock.id.clone(), StockUsage::default());
    }
    for part in parts {
        summary.total_parts_produced.insert(part.id.clone(), 0);
        summary.weight_produced_per_part_kg.insert(part.id.clone(), 0.0);
        summary.part_production.insert(
            part.id.clone(),
            PartProduction {
                demanded: part.demand,
                ..PartProduction::default()
            },
        );
    }

    for (pattern_id, &count) in usage {
        if count == 0 {
            continue;
        }
        let pattern = catalog
            .get(pattern_id)
            .ok_or_else(|| Error::UnknownPattern(pattern_id.clone()))?;
        let stock = stock_by_id.get(pattern.stock_id.as_str());
        let weight_per_length = stock.map_or(0.0, |s| s.weight_per_length());
        let bars = f64::from(count);

        summary.pattern_usage.insert(pattern_id.clone(), count);
        *summary
            .total_stock_items_used
            .entry(pattern.stock_id.clone())
            .or_insert(0) += u64::from(count);

        let stock_entry = summary
            .stock_usage
            .entry(pattern.stock_id.clone())
            .or_default();
        stock_entry.bars_used += u64::from(count);
        stock_entry.length_mm += pattern.stock_length * bars;
        stock_entry.cost += stock.map_or(0.0, |s| s.cost) * bars;
        stock_entry.weight_kg += stock.map_or(0.0, |s| s.weight) * bars;

        for piece in &pattern.layout {
            let entry = summary
                .part_production
                .entry(piece.part_id.clone())
                .or_default();
            entry.produced += u64::from(count);
            entry.length_mm += piece.length * bars;
            entry.weight_kg += piece.length * bars * weight_per_length;
        }

        summary.total_kerf_length_mm += pattern.metrics.kerf_length * bars;
        summary.total_weight_kerf_kg += pattern.metrics.kerf_length * bars * weight_per_length;
        summary.total_waste_length_mm += pattern.metrics.waste * bars;
        summary.total_number_of_cuts += u64::from(pattern.metrics.cuts) * u64::from(count);

        summary.patterns.push(UsedPattern {
            id: pattern.id.clone(),
            stock_id: pattern.stock_id.clone(),
            usage: count,
            yields: pattern.yields.clone(),
            layout: pattern.layout.clone(),
            parts_length: pattern.metrics.parts_length,
            kerf_length: pattern.metrics.kerf_length,
            used_length: pattern.metrics.used_length,
            waste: pattern.metrics.waste,
            cuts: pattern.metrics.cuts,
        });
    }

    for (part_id, production) in summary.part_production.iter_mut() {
        production.overproduced = production
            .produced
            .saturating_sub(u64::from(production.demanded));
        summary
            .total_parts_produced
            .insert(part_id.clone(), production.produced);
        summary
            .weight_produced_per_part_kg
            .insert(part_id.clone(), production.weight_kg);
        summary.total_length_all_parts_produced_mm += production.length_mm;
        summary.total_weight_all_parts_produced_kg += production.weight_kg;
    }

    for consumed in summary.stock_usage.values() {
        summary.total_stock_cost += consumed.cost;
        summary.total_length_all_stock_used_mm += consumed.length_mm;
        summary.total_weight_all_stock_used_kg += consumed.weight_kg;
    }

    summary.total_weight_waste_kg = summary.total_weight_all_stock_used_kg
        - summary.total_weight_all_parts_produced_kg
        - summary.total_weight_kerf_kg;
    summary.yield_percentage = if summary.total_length_all_stock_used_mm > 0.0 {
        summary.total_length_all_parts_produced_mm / summary.total_length_all_stock_used_mm
            * 100.0
    } else {
        0.0
    };
    summary.total_objective_value = summary.total_stock_cost;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> (Vec<StockType>, Vec<PartDemand>, PatternCatalog) {
        let stocks = vec![
            StockType::new("S1", 6000.0).with_cost(100.0).with_weight(60.0),
            StockType::new("S2", 3000.0).with_cost(55.0).with_weight(30.0),
            StockType::new("ZERO", 0.0),
        ];
        let parts = vec![
            PartDemand::new("A", 2000.0, 2),
            PartDemand::new("B", 1000.0, 3),
            PartDemand::new("C", 500.0, 0),
        ];
        let catalog = PatternCatalog::build(&stocks, &parts, 3.0);
        (stocks, parts, catalog)
    }

    fn find(catalog: &PatternCatalog, stock: &str, a: u32, b: u32, c: u32) -> String {
        catalog
            .for_stock(stock)
            .find(|p| p.yield_of("A") == a && p.yield_of("B") == b && p.yield_of("C") == c)
            .map(|p| p.id.clone())
            .expect("pattern exists")
    }

    fn plan(catalog: &PatternCatalog) -> BTreeMap<String, u32> {
        // S1: A+A+B, S2: B+B
        [
            (find(catalog, "S1", 2, 1, 0), 1),
            (find(catalog, "S2", 0, 2, 0), 1),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_totals() {
        let (stocks, parts, catalog) = instance();
        let summary = aggregate(&catalog, &plan(&catalog), &stocks, &parts).unwrap();

        assert_eq!(summary.total_stock_items_used["S1"], 1);
        assert_eq!(summary.total_stock_items_used["S2"], 1);
        assert_eq!(summary.total_parts_produced["A"], 2);
        assert_eq!(summary.total_parts_produced["B"], 3);
        assert_eq!(summary.total_stock_cost, 155.0);
        assert_eq!(summary.total_objective_value, 155.0);
        assert_eq!(summary.total_length_all_parts_produced_mm, 7000.0);
        assert_eq!(summary.total_length_all_stock_used_mm, 9000.0);
        assert_eq!(summary.total_bars(), 2);
        assert!(summary.meets_demand());

        // S1: 2 separating cuts + trailing cut; S2: 1 separating cut + trailing cut.
        assert_eq!(summary.total_number_of_cuts, 5);
        assert!((summary.total_kerf_length_mm - 15.0).abs() < 1e-9);
        assert!(
            (summary.total_length_all_parts_produced_mm
                + summary.total_kerf_length_mm
                + summary.total_waste_length_mm
                - summary.total_length_all_stock_used_mm)
                .abs()
                < 1e-9
        );
        assert!((summary.yield_percentage - 7000.0 / 9000.0 * 100.0).abs() < 1e-9);
        assert_eq!(summary.patterns.len(), 2);
    }

    #[test]
    fn test_weight_conservation() {
        let (stocks, parts, catalog) = instance();
        let summary = aggregate(&catalog, &plan(&catalog), &stocks, &parts).unwrap();

        assert_eq!(summary.total_weight_all_stock_used_kg, 90.0);
        // 0.01 kg/mm on both stock types.
        assert!((summary.total_weight_all_parts_produced_kg - 70.0).abs() < 1e-9);
        assert!((summary.total_weight_kerf_kg - 0.15).abs() < 1e-9);
        let recombined = summary.total_weight_all_parts_produced_kg
            + summary.total_weight_kerf_kg
            + summary.total_weight_waste_kg;
        assert!((summary.total_weight_all_stock_used_kg - recombined).abs() < 1e-12);
        assert!((summary.weight_produced_per_part_kg["A"] - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_initialised_for_unused_ids() {
        let (stocks, parts, catalog) = instance();
        let summary = aggregate(&catalog, &plan(&catalog), &stocks, &parts).unwrap();

        assert_eq!(summary.total_stock_items_used["ZERO"], 0);
        assert_eq!(summary.stock_usage["ZERO"], StockUsage::default());
        assert_eq!(summary.total_parts_produced["C"], 0);
        assert_eq!(summary.weight_produced_per_part_kg["C"], 0.0);
        assert_eq!(summary.part_production["C"].produced, 0);
    }

    #[test]
    fn test_empty_usage() {
        let (stocks, parts, catalog) = instance();
        let summary = aggregate(&catalog, &BTreeMap::new(), &stocks, &parts).unwrap();

        assert!(summary.pattern_usage.is_empty());
        assert_eq!(summary.total_stock_items_used.len(), 3);
        assert_eq!(summary.yield_percentage, 0.0);
        assert_eq!(summary.total_weight_waste_kg, 0.0);
        assert!(!summary.meets_demand());
    }

    #[test]
    fn test_zero_counts_skipped_and_overproduction_reported() {
        let (stocks, parts, catalog) = instance();
        let mut usage = plan(&catalog);
        usage.insert(find(&catalog, "S1", 2, 1, 0), 2);
        usage.insert(find(&catalog, "S1", 0, 0, 1), 0);
        let summary = aggregate(&catalog, &usage, &stocks, &parts).unwrap();

        assert_eq!(summary.pattern_usage.len(), 2);
        assert_eq!(summary.part_production["A"].overproduced, 2);
        assert_eq!(summary.part_production["B"].overproduced, 1);
    }

    #[test]
    fn test_unknown_pattern() {
        let (stocks, parts, catalog) = instance();
        let usage: BTreeMap<String, u32> = [("missing".to_string(), 1)].into_iter().collect();
        let err = aggregate(&catalog, &usage, &stocks, &parts).unwrap_err();
        assert!(matches!(err, Error::UnknownPattern(id) if id == "missing"));
    }

    #[test]
    fn test_idempotent() {
        let (stocks, parts, catalog) = instance();
        let usage = plan(&catalog);
        let first = aggregate(&catalog, &usage, &stocks, &parts).unwrap();
        let second = aggregate(&catalog, &usage, &stocks, &parts).unwrap();
        assert_eq!(first, second);

        #[cfg(feature = "serde")]
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_bar_counts_do_not_wrap() {
        let (stocks, parts, catalog) = instance();
        let usage: BTreeMap<String, u32> = [
            (find(&catalog, "S1", 2, 1, 0), u32::MAX),
            (find(&catalog, "S1", 0, 2, 0), u32::MAX),
        ]
        .into_iter()
        .collect();
        let summary = aggregate(&catalog, &usage, &stocks, &parts).unwrap();

        let expected = 2 * u64::from(u32::MAX);
        assert_eq!(summary.total_stock_items_used["S1"], expected);
        assert_eq!(summary.stock_usage["S1"].bars_used, expected);
        assert_eq!(summary.total_bars(), expected);
        assert_eq!(summary.total_parts_produced["B"], 3 * u64::from(u32::MAX));
    }
}
