//! Pattern enumeration for a single stock type.
//!
//! The generator walks a depth-first search tree over the part catalog sorted
//! by descending length (ties broken by part id). Each tree node is a partial
//! layout; every node with at least one piece is recorded as a pattern, not
//! only the leaves. From a node that last placed part `i`, only parts `i..`
//! may be appended, so every multiset of parts is reached through exactly one
//! non-increasing sequence and permutations are never revisited.
//!
//! The search keeps an explicit stack of frames instead of recursing.
//!
//! # Complexity
//!
//! The number of patterns grows exponentially with the number of distinct
//! part lengths. There is no pruning beyond the fits-in-remaining-length check
//! and the yield dedup; catalogs of a few tens of part types are tractable.

use crate::pattern::{LayoutPiece, Pattern, DEFAULT_OFFCUT_TOLERANCE};
use crate::stock::{PartDemand, StockType};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Slack allowed when checking whether a piece fits the remaining length,
/// absorbing floating point drift from repeated subtraction.
const FIT_EPSILON: f64 = 1e-9;

/// One level of the search: the length still free and the next part to try.
#[derive(Debug, Clone, Copy)]
struct Frame {
    remaining: f64,
    cursor: usize,
}

/// Enumerates the distinct feasible cutting patterns of a stock type.
#[derive(Debug, Clone)]
pub struct PatternGenerator<'a> {
    parts: Vec<&'a PartDemand>,
    kerf: f64,
    offcut_tolerance: f64,
}

impl<'a> PatternGenerator<'a> {
    /// Creates a generator for the given part catalog and saw kerf.
    pub fn new(parts: &'a [PartDemand], kerf: f64) -> Self {
        let mut sorted: Vec<&PartDemand> = parts.iter().collect();
        sorted.sort_by(|a, b| {
            b.length
                .partial_cmp(&a.length)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        Self {
            parts: sorted,
            kerf,
            offcut_tolerance: DEFAULT_OFFCUT_TOLERANCE,
        }
    }

    /// Sets the leftover length above which a final separating cut is counted.
    pub fn with_offcut_tolerance(mut self, tolerance: f64) -> Self {
        self.offcut_tolerance = tolerance.max(0.0);
        self
    }

    /// Parts in search order (descending length, ties by id).
    pub fn search_order(&self) -> impl Iterator<Item = &PartDemand> {
        self.parts.iter().copied()
    }

    /// Generates every distinct pattern for `stock`.
    ///
    /// Pattern ids are `<stock id>_p<n>` with `n` counting from zero in
    /// discovery order.
    pub fn generate(&self, stock: &StockType) -> Vec<Pattern> {
        let mut patterns = Vec::new();
        if stock.length <= 0.0 || self.parts.is_empty() {
            return patterns;
        }

        let mut seen: HashSet<Vec<u32>> = HashSet::new();
        let mut counts = vec![0u32; self.parts.len()];
        let mut layout: Vec<usize> = Vec::new();
        let mut stack = vec![Frame {
            remaining: stock.length,
            cursor: 0,
        }];

        // Every frame above the root corresponds to one placed piece.
        while let Some(frame) = stack.last_mut() {
            if frame.cursor >= self.parts.len() {
                stack.pop();
                if let Some(idx) = layout.pop() {
                    counts[idx] -= 1;
                }
                continue;
            }

            let idx = frame.cursor;
            frame.cursor += 1;

            let part = self.parts[idx];
            let needed = if layout.is_empty() {
                part.length
            } else {
                part.length + self.kerf
            };
            if needed > frame.remaining + FIT_EPSILON {
                continue;
            }

            let remaining = frame.remaining - needed;
            layout.push(idx);
            counts[idx] += 1;

            if seen.insert(counts.clone()) {
                let id = format!("{}_p{}", stock.id, patterns.len());
                patterns.push(self.build(id, stock, &layout));
            }

            stack.push(Frame {
                remaining,
                cursor: idx,
            });
        }

        log::debug!(
            "Generated {} patterns for stock '{}' (length {})",
            patterns.len(),
            stock.id,
            stock.length
        );
        patterns
    }

    fn build(&self, id: String, stock: &StockType, layout: &[usize]) -> Pattern {
        let pieces = layout
            .iter()
            .map(|&idx| LayoutPiece::new(self.parts[idx].id.clone(), self.parts[idx].length))
            .collect();
        Pattern::from_layout(id, stock, pieces, self.kerf, self.offcut_tolerance)
    }
}

/// Convenience wrapper: generates the patterns of one stock type.
pub fn generate_patterns(stock: &StockType, parts: &[PartDemand], kerf: f64) -> Vec<Pattern> {
    PatternGenerator::new(parts, kerf).generate(stock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn scenario_a_parts() -> Vec<PartDemand> {
        vec![
            PartDemand::new("A", 2000.0, 2),
            PartDemand::new("B", 1000.0, 3),
        ]
    }

    #[test]
    fn test_scenario_a_pattern_count() {
        let stock = StockType::new("S1", 6000.0);
        let patterns = generate_patterns(&stock, &scenario_a_parts(), 3.0);

        // a=0: b=1..5, a=1: b=0..3, a=2: b=0..1
        assert_eq!(patterns.len(), 11);
        assert_eq!(patterns[0].id, "S1_p0");
        assert_eq!(patterns[0].layout.len(), 1);
        assert_eq!(patterns[0].layout[0].part_id, "A");
    }

    #[test]
    fn test_waste_invariant_holds() {
        let stock = StockType::new("S1", 6000.0);
        for pattern in generate_patterns(&stock, &scenario_a_parts(), 3.0) {
            let m = pattern.metrics;
            assert!(m.waste >= 0.0, "{} has negative waste", pattern.id);
            assert!(
                (m.waste - (stock.length - (m.parts_length + m.kerf_length))).abs() < 1e-9
            );
        }
    }

    #[test]
    fn test_yield_vectors_are_unique() {
        let stock = StockType::new("S1", 5000.0);
        let parts = vec![
            PartDemand::new("A", 1200.0, 1),
            PartDemand::new("B", 800.0, 1),
            PartDemand::new("C", 450.0, 1),
        ];
        let patterns = generate_patterns(&stock, &parts, 2.0);
        let mut seen = HashSet::new();
        for pattern in &patterns {
            let key: Vec<(String, u32)> = pattern
                .yields
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect();
            assert!(seen.insert(key), "duplicate yield in {}", pattern.id);
        }
    }

    #[test]
    fn test_sub_combinations_are_emitted() {
        let stock = StockType::new("S1", 6000.0);
        let patterns = generate_patterns(&stock, &scenario_a_parts(), 3.0);
        let has = |a: u32, b: u32| {
            patterns
                .iter()
                .any(|p| p.yield_of("A") == a && p.yield_of("B") == b)
        };
        assert!(has(1, 0));
        assert!(has(2, 0));
        assert!(has(2, 1));
        assert!(has(0, 5));
        assert!(!has(2, 2));
        assert!(!has(3, 0));
    }

    #[test]
    fn test_kerf_not_charged_before_first_piece() {
        // A piece exactly as long as the bar fits only without a leading kerf.
        let stock = StockType::new("S1", 1000.0);
        let parts = vec![PartDemand::new("A", 1000.0, 1)];
        let patterns = generate_patterns(&stock, &parts, 5.0);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].metrics.cuts, 0);
        assert_eq!(patterns[0].metrics.waste, 0.0);
    }

    #[test]
    fn test_part_longer_than_stock_never_placed() {
        let stock = StockType::new("S1", 1000.0);
        let parts = vec![
            PartDemand::new("LONG", 1500.0, 1),
            PartDemand::new("SHORT", 400.0, 1),
        ];
        let patterns = generate_patterns(&stock, &parts, 3.0);
        assert!(!patterns.is_empty());
        assert!(patterns.iter().all(|p| p.yield_of("LONG") == 0));
    }

    #[test]
    fn test_non_positive_stock_length_yields_nothing() {
        let stock = StockType::new("S0", 0.0);
        assert!(generate_patterns(&stock, &scenario_a_parts(), 3.0).is_empty());

        let stock = StockType::new("S-", -10.0);
        assert!(generate_patterns(&stock, &scenario_a_parts(), 3.0).is_empty());
    }

    #[test]
    fn test_search_order_is_longest_first_then_id() {
        let parts = vec![
            PartDemand::new("C", 500.0, 1),
            PartDemand::new("D", 260.0, 1),
            PartDemand::new("A", 700.0, 1),
            PartDemand::new("B", 500.0, 1),
        ];
        let generator = PatternGenerator::new(&parts, 4.0);
        let order: Vec<&str> = generator.search_order().map(|p| p.id.as_str()).collect();
        assert_eq!(order, ["A", "B", "C", "D"]);
    }

    #[test]
    fn test_independent_of_input_order() {
        let stock = StockType::new("S1", 3000.0);
        let parts = vec![
            PartDemand::new("A", 700.0, 1),
            PartDemand::new("B", 500.0, 1),
            PartDemand::new("C", 500.0, 1),
            PartDemand::new("D", 260.0, 1),
        ];
        let mut reversed = parts.clone();
        reversed.reverse();
        let mut rotated = parts.clone();
        rotated.rotate_left(2);

        let baseline = generate_patterns(&stock, &parts, 4.0);
        assert_eq!(baseline, generate_patterns(&stock, &reversed, 4.0));
        assert_eq!(baseline, generate_patterns(&stock, &rotated, 4.0));
    }

    #[test]
    fn test_layout_is_in_descending_length_order() {
        let stock = StockType::new("S1", 3000.0);
        let parts = vec![
            PartDemand::new("S", 300.0, 1),
            PartDemand::new("L", 900.0, 1),
        ];
        for pattern in generate_patterns(&stock, &parts, 2.0) {
            let lengths: Vec<f64> = pattern.layout.iter().map(|p| p.length).collect();
            assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_yields_match_layout() {
        let stock = StockType::new("S1", 2500.0);
        let parts = vec![
            PartDemand::new("A", 600.0, 1),
            PartDemand::new("B", 350.0, 1),
        ];
        for pattern in generate_patterns(&stock, &parts, 3.0) {
            let mut counted: BTreeMap<String, u32> = BTreeMap::new();
            for piece in &pattern.layout {
                *counted.entry(piece.part_id.clone()).or_default() += 1;
            }
            assert_eq!(counted, pattern.yields);
        }
    }
}
