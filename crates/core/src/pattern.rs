//! Cutting patterns and their length bookkeeping.
//!
//! A [`Pattern`] is one reproducible way of cutting a single stock bar: an
//! ordered layout of part pieces, the kerf lost to the saw, and the remaining
//! waste. All derived metrics are fixed when the pattern is built and satisfy
//! `waste == stock_length - (parts_length + kerf_length)`.
//!
//! # Cut counting
//!
//! A layout of `n` pieces needs `n - 1` separating cuts. When the offcut left
//! after those cuts is longer than the offcut tolerance, one more cut frees
//! the last piece from the remainder. That trailing cut consumes a full kerf
//! unless the offcut is shorter than the kerf, in which case the saw consumes
//! only the offcut.

use crate::stock::StockType;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default leftover length above which a final separating cut is counted.
pub const DEFAULT_OFFCUT_TOLERANCE: f64 = 0.01;

/// A single piece placed in a pattern layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LayoutPiece {
    /// Part identifier.
    pub part_id: String,
    /// Piece length.
    pub length: f64,
}

impl LayoutPiece {
    /// Creates a new layout piece.
    pub fn new(part_id: impl Into<String>, length: f64) -> Self {
        Self {
            part_id: part_id.into(),
            length,
        }
    }
}

/// Length metrics derived from a layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PatternMetrics {
    /// Sum of all piece lengths.
    pub parts_length: f64,
    /// Material lost to saw cuts.
    pub kerf_length: f64,
    /// `parts_length + kerf_length`.
    pub used_length: f64,
    /// `stock_length - used_length`.
    pub waste: f64,
    /// Number of saw cuts.
    pub cuts: u32,
}

impl PatternMetrics {
    /// Computes the metrics for a layout of piece lengths on a bar.
    pub fn compute(stock_length: f64, piece_lengths: &[f64], kerf: f64, tolerance: f64) -> Self {
        let parts_length: f64 = piece_lengths.iter().sum();
        let mut cuts = piece_lengths.len().saturating_sub(1) as u32;
        let mut kerf_length = f64::from(cuts) * kerf;

        let offcut = stock_length - parts_length - kerf_length;
        if !piece_lengths.is_empty() && offcut > tolerance {
            cuts += 1;
            kerf_length += kerf.min(offcut);
        }

        let used_length = parts_length + kerf_length;
        Self {
            parts_length,
            kerf_length,
            used_length,
            waste: stock_length - used_length,
            cuts,
        }
    }
}

/// A cutting pattern for one stock type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pattern {
    /// Pattern identifier, unique within a run.
    pub id: String,
    /// Identifier of the stock type this pattern cuts.
    pub stock_id: String,
    /// Length of the stock bar.
    pub stock_length: f64,
    /// Part identifier -> number of pieces produced per application.
    pub yields: BTreeMap<String, u32>,
    /// Pieces in physical cut order.
    pub layout: Vec<LayoutPiece>,
    /// Derived length metrics.
    pub metrics: PatternMetrics,
}

impl Pattern {
    /// Builds a pattern from an ordered layout, deriving yields and metrics.
    pub fn from_layout(
        id: impl Into<String>,
        stock: &StockType,
        layout: Vec<LayoutPiece>,
        kerf: f64,
        tolerance: f64,
    ) -> Self {
        let mut yields = BTreeMap::new();
        for piece in &layout {
            *yields.entry(piece.part_id.clone()).or_insert(0) += 1;
        }
        let lengths: Vec<f64> = layout.iter().map(|p| p.length).collect();
        let metrics = PatternMetrics::compute(stock.length, &lengths, kerf, tolerance);

        Self {
            id: id.into(),
            stock_id: stock.id.clone(),
            stock_length: stock.length,
            yields,
            layout,
            metrics,
        }
    }

    /// Number of pieces of `part_id` produced per application.
    pub fn yield_of(&self, part_id: &str) -> u32 {
        self.yields.get(part_id).copied().unwrap_or(0)
    }

    /// Total number of pieces in the layout.
    pub fn piece_count(&self) -> usize {
        self.layout.len()
    }

    /// Share of the bar length that ends up in parts (0.0 - 1.0).
    pub fn utilization(&self) -> f64 {
        if self.stock_length > 0.0 {
            self.metrics.parts_length / self.stock_length
        } else {
            0.0
        }
    }
}
