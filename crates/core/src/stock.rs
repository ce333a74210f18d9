//! Stock catalog and part demand types.

use crate::error::{Error, Result};
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A type of stock bar that can be cut into parts.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StockType {
    /// Stock identifier (e.g. item code).
    pub id: String,
    /// Bar length.
    pub length: f64,
    /// Cost of one bar.
    pub cost: f64,
    /// Weight of one bar.
    pub weight: f64,
    /// Number of bars on hand (`None` = unlimited).
    pub available: Option<u32>,
}

impl StockType {
    /// Creates a stock type with zero cost and weight and no availability cap.
    pub fn new(id: impl Into<String>, length: f64) -> Self {
        Self {
            id: id.into(),
            length,
            cost: 0.0,
            weight: 0.0,
            available: None,
        }
    }

    /// Sets the cost per bar.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Sets the weight per bar.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Caps the number of bars that may be used.
    pub fn with_available(mut self, available: u32) -> Self {
        self.available = Some(available);
        self
    }

    /// Weight per unit of length, or 0.0 for a degenerate (non-positive) length.
    pub fn weight_per_length(&self) -> f64 {
        if self.length > 0.0 && self.weight > 0.0 {
            self.weight / self.length
        } else {
            0.0
        }
    }

    /// Cost per unit of length, or 0.0 for a degenerate (non-positive) length.
    pub fn cost_per_length(&self) -> f64 {
        if self.length > 0.0 {
            self.cost / self.length
        } else {
            0.0
        }
    }

    /// Checks that the stock type is usable.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidStock {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.is_empty() {
            return Err(invalid("identifier must not be empty"));
        }
        if !self.length.is_finite() || self.length <= 0.0 {
            return Err(invalid("length must be a positive number"));
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(invalid("cost must be a non-negative number"));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(invalid("weight must be a non-negative number"));
        }
        Ok(())
    }
}

/// A required part: a length and how many pieces of it are needed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartDemand {
    /// Part identifier.
    pub id: String,
    /// Piece length.
    pub length: f64,
    /// Number of pieces required.
    pub demand: u32,
}

impl PartDemand {
    /// Creates a new part demand.
    pub fn new(id: impl Into<String>, length: f64, demand: u32) -> Self {
        Self {
            id: id.into(),
            length,
            demand,
        }
    }

    /// Checks that the part is usable.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::InvalidPart {
                id: self.id.clone(),
                reason: "identifier must not be empty".to_string(),
            });
        }
        if !self.length.is_finite() || self.length <= 0.0 {
            return Err(Error::InvalidPart {
                id: self.id.clone(),
                reason: "length must be a positive number".to_string(),
            });
        }
        Ok(())
    }
}

/// Validates a complete problem instance before any pattern is generated.
pub fn validate_instance(stocks: &[StockType], parts: &[PartDemand], kerf: f64) -> Result<()> {
    if !kerf.is_finite() || kerf < 0.0 {
        return Err(Error::InvalidKerf(kerf));
    }
    if stocks.is_empty() {
        return Err(Error::NoStock);
    }

    let mut stock_ids = HashSet::new();
    for stock in stocks {
        stock.validate()?;
        if !stock_ids.insert(stock.id.as_str()) {
            return Err(Error::InvalidStock {
                id: stock.id.clone(),
                reason: "identifier appears more than once".to_string(),
            });
        }
    }

    let mut part_ids = HashSet::new();
    for part in parts {
        part.validate()?;
        if !part_ids.insert(part.id.as_str()) {
            return Err(Error::DuplicatePart(part.id.clone()));
        }
    }

    Ok(())
}

/// Total number of pieces demanded across all parts.
pub fn total_demand(parts: &[PartDemand]) -> u64 {
    parts.iter().map(|p| u64::from(p.demand)).sum()
}

/// Mean cost per unit length over all stock types with a positive length.
pub fn average_cost_per_length(stocks: &[StockType]) -> f64 {
    let rates: Vec<f64> = stocks
        .iter()
        .filter(|s| s.length > 0.0)
        .map(StockType::cost_per_length)
        .collect();
    if rates.is_empty() {
        0.0
    } else {
        rates.iter().sum::<f64>() / rates.len() as f64
    }
}
