//! The immutable pattern catalog of one optimization run.

use crate::generator::PatternGenerator;
use crate::pattern::{Pattern, DEFAULT_OFFCUT_TOLERANCE};
use crate::stock::{PartDemand, StockType};
use std::collections::{BTreeMap, HashMap};

/// All patterns generated for a run, across every stock type.
///
/// The catalog owns its patterns; the model and the aggregator refer to them
/// by index or id and never mutate them.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    patterns: Vec<Pattern>,
    by_id: HashMap<String, usize>,
    by_stock: BTreeMap<String, Vec<usize>>,
}

impl PatternCatalog {
    /// Generates the catalog for every stock type, in the given stock order.
    pub fn build(stocks: &[StockType], parts: &[PartDemand], kerf: f64) -> Self {
        Self::build_with_tolerance(stocks, parts, kerf, DEFAULT_OFFCUT_TOLERANCE)
    }

    /// Generates the catalog with a custom offcut tolerance.
    pub fn build_with_tolerance(
        stocks: &[StockType],
        parts: &[PartDemand],
        kerf: f64,
        offcut_tolerance: f64,
    ) -> Self {
        let generator = PatternGenerator::new(parts, kerf).with_offcut_tolerance(offcut_tolerance);
        let mut catalog = Self::default();
        for stock in stocks {
            // Register the stock even when nothing fits so counts stay complete.
            catalog.by_stock.entry(stock.id.clone()).or_default();
            for pattern in generator.generate(stock) {
                catalog.push(pattern);
            }
        }
        log::info!(
            "Pattern catalog: {} patterns across {} stock types",
            catalog.len(),
            stocks.len()
        );
        catalog
    }

    /// Wraps already generated patterns. Later patterns with a repeated id are dropped.
    pub fn from_patterns(patterns: Vec<Pattern>) -> Self {
        let mut catalog = Self::default();
        for pattern in patterns {
            if catalog.by_id.contains_key(&pattern.id) {
                log::warn!("Dropping pattern with repeated id '{}'", pattern.id);
                continue;
            }
            catalog.push(pattern);
        }
        catalog
    }

    fn push(&mut self, pattern: Pattern) {
        let idx = self.patterns.len();
        self.by_id.insert(pattern.id.clone(), idx);
        self.by_stock
            .entry(pattern.stock_id.clone())
            .or_default()
            .push(idx);
        self.patterns.push(pattern);
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if no pattern was generated for any stock type.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// All patterns in catalog order.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Looks up a pattern by id.
    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.index_of(id).map(|idx| &self.patterns[idx])
    }

    /// Catalog index of a pattern id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Catalog indices of the patterns cutting `stock_id`.
    pub fn indices_for_stock(&self, stock_id: &str) -> &[usize] {
        self.by_stock
            .get(stock_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Patterns cutting `stock_id`.
    pub fn for_stock<'a>(&'a self, stock_id: &str) -> impl Iterator<Item = &'a Pattern> + 'a {
        self.indices_for_stock(stock_id)
            .iter()
            .map(move |&idx| &self.patterns[idx])
    }

    /// Number of patterns per stock id (zero for stock types where nothing fits).
    pub fn pattern_counts(&self) -> BTreeMap<String, usize> {
        self.by_stock
            .iter()
            .map(|(id, indices)| (id.clone(), indices.len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stocks() -> Vec<StockType> {
        vec![
            StockType::new("LONG", 6000.0),
            StockType::new("SHORT", 1500.0),
            StockType::new("TINY", 100.0),
        ]
    }

    fn parts() -> Vec<PartDemand> {
        vec![
            PartDemand::new("A", 2000.0, 2),
            PartDemand::new("B", 1000.0, 3),
        ]
    }

    #[test]
    fn test_build_spans_stock_types() {
        let catalog = PatternCatalog::build(&stocks(), &parts(), 3.0);
        let counts = catalog.pattern_counts();

        assert_eq!(counts["LONG"], 11);
        assert_eq!(counts["SHORT"], 1); // a single B
        assert_eq!(counts["TINY"], 0);
        assert_eq!(catalog.len(), 12);
    }

    #[test]
    fn test_lookup_by_id_and_stock() {
        let catalog = PatternCatalog::build(&stocks(), &parts(), 3.0);
        let short = catalog.get("SHORT_p0").expect("pattern exists");
        assert_eq!(short.stock_id, "SHORT");
        assert_eq!(short.yield_of("B"), 1);

        assert_eq!(catalog.for_stock("LONG").count(), 11);
        assert!(catalog.for_stock("LONG").all(|p| p.stock_id == "LONG"));
        assert!(catalog.indices_for_stock("UNKNOWN").is_empty());
        assert!(catalog.get("UNKNOWN").is_none());
    }

    #[test]
    fn test_empty_when_nothing_fits() {
        let catalog = PatternCatalog::build(&[StockType::new("TINY", 100.0)], &parts(), 3.0);
        assert!(catalog.is_empty());
        assert_eq!(catalog.pattern_counts()["TINY"], 0);
    }

    #[test]
    fn test_from_patterns_drops_repeated_ids() {
        let catalog = PatternCatalog::build(&stocks(), &parts(), 3.0);
        let mut patterns = catalog.patterns().to_vec();
        patterns.push(patterns[0].clone());
        let rebuilt = PatternCatalog::from_patterns(patterns);
        assert_eq!(rebuilt.len(), catalog.len());
    }
}
