//! # Stock Types
//!
//! Stock records with threshold-derived status, and the append-only
//! consumption audit entry.
//!
//! ## Status Derivation
//! ```text
//! low_floor = max(alert_threshold, minimum)
//!
//! quantity <= 0               → OutOfStock
//! 0 < quantity <= low_floor   → LowStock
//! quantity > low_floor        → InStock
//! ```
//! The low floor is the greater of the alert threshold and the minimum
//! on-hand level, so a store that keeps its floor above the alert point
//! still sees `low_stock` once it dips under the floor. Status is a
//! **pure function** of quantity vs. thresholds and must be recomputed
//! on every mutation - the ledger never stores a stale status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Stock Status
// =============================================================================

/// Derived availability status of an ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// Quantity is above the alert threshold.
    InStock,
    /// Quantity is positive but at or below the alert threshold.
    LowStock,
    /// Quantity is zero (or below, which the ledger prevents).
    OutOfStock,
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::InStock => write!(f, "in_stock"),
            StockStatus::LowStock => write!(f, "low_stock"),
            StockStatus::OutOfStock => write!(f, "out_of_stock"),
        }
    }
}

// =============================================================================
// Stock Record
// =============================================================================

/// Per-ingredient quantity and thresholds.
///
/// Owned by the stock ledger; mutated exclusively by the consumption
/// engine (and restock operations). Quantity is never negative: the
/// ledger only decrements under a sufficiency check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRecord {
    /// Ingredient identifier.
    pub ingredient_id: String,

    /// Display name for notifications and tickets.
    pub name: String,

    /// Current quantity in portions. Fractions are common.
    pub quantity: f64,

    /// Minimum quantity the store wants to keep on hand. Raises the
    /// low-stock floor when it sits above the alert threshold.
    pub minimum: f64,

    /// Quantity at or below which a low-stock alert fires.
    pub alert_threshold: f64,

    /// Derived status. Recomputed on every mutation.
    pub status: StockStatus,

    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl StockRecord {
    /// Creates a record, deriving the initial status.
    pub fn new(ingredient_id: &str, name: &str, quantity: f64, minimum: f64, alert: f64) -> Self {
        let mut record = StockRecord {
            ingredient_id: ingredient_id.to_string(),
            name: name.to_string(),
            quantity,
            minimum,
            alert_threshold: alert,
            status: StockStatus::InStock,
            updated_at: Utc::now(),
        };
        record.recompute_status();
        record
    }

    /// Recomputes status from quantity vs. thresholds.
    pub fn recompute_status(&mut self) {
        let low_floor = self.alert_threshold.max(self.minimum);
        self.status = if self.quantity <= 0.0 {
            StockStatus::OutOfStock
        } else if self.quantity <= low_floor {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        };
    }

    /// Returns true if at least `required` portions are available.
    #[inline]
    pub fn has_at_least(&self, required: f64) -> bool {
        self.quantity >= required
    }
}

// =============================================================================
// Consumption Record
// =============================================================================

/// Immutable audit entry: one ingredient deduction for one order line.
///
/// Created once, never mutated or deleted. The audit log is append-only
/// so inventory movements stay traceable to the originating order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    /// Unique identifier.
    pub id: String,

    /// Ingredient that was deducted.
    pub ingredient_id: String,

    /// Quantity deducted, in portions.
    pub quantity: f64,

    /// Order that triggered the deduction.
    pub order_id: String,

    /// When the deduction happened.
    pub consumed_at: DateTime<Utc>,
}

impl ConsumptionRecord {
    /// Creates a new audit entry stamped with the current time.
    pub fn new(ingredient_id: &str, quantity: f64, order_id: &str) -> Self {
        ConsumptionRecord {
            id: Uuid::new_v4().to_string(),
            ingredient_id: ingredient_id.to_string(),
            quantity,
            order_id: order_id.to_string(),
            consumed_at: Utc::now(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_derivation() {
        let mut record = StockRecord::new("cheese", "Cheese", 12.0, 2.0, 5.0);
        assert_eq!(record.status, StockStatus::InStock);

        record.quantity = 5.0;
        record.recompute_status();
        assert_eq!(record.status, StockStatus::LowStock);

        record.quantity = 4.0;
        record.recompute_status();
        assert_eq!(record.status, StockStatus::LowStock);

        record.quantity = 0.0;
        record.recompute_status();
        assert_eq!(record.status, StockStatus::OutOfStock);
    }

    #[test]
    fn test_minimum_above_alert_raises_low_floor() {
        // Keep-on-hand floor above the alert point: the floor governs
        let mut record = StockRecord::new("beef", "Beef", 7.0, 6.0, 3.0);
        assert_eq!(record.status, StockStatus::InStock);

        record.quantity = 5.0;
        record.recompute_status();
        assert_eq!(record.status, StockStatus::LowStock);
    }

    #[test]
    fn test_initial_status_derived() {
        let record = StockRecord::new("ice", "Ice", 0.0, 1.0, 3.0);
        assert_eq!(record.status, StockStatus::OutOfStock);
    }

    #[test]
    fn test_has_at_least() {
        let record = StockRecord::new("cheese", "Cheese", 5.0, 2.0, 5.0);
        assert!(record.has_at_least(5.0));
        assert!(!record.has_at_least(6.0));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(StockStatus::LowStock.to_string(), "low_stock");
        assert_eq!(StockStatus::OutOfStock.to_string(), "out_of_stock");
    }
}
