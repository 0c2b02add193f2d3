//! # Inventory Error Types

use thiserror::Error;

/// Result type alias for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Inventory operation failures.
///
/// ## Design Principles
/// - Soft errors (stock races, untracked ingredients) never abort an
///   already-placed order; the engine records them and continues.
/// - Each variant carries enough context to surface a useful
///   inventory notification.
#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    /// Not enough stock for the requested deduction.
    #[error("Insufficient stock for {ingredient_id}: available {available}, required {required}")]
    InsufficientStock {
        ingredient_id: String,
        available: f64,
        required: f64,
    },

    /// No stock record exists for the ingredient.
    #[error("No stock record for ingredient {ingredient_id}")]
    IngredientNotTracked { ingredient_id: String },

    /// The catalog has no entry for a line item's referenced item.
    #[error("Catalog item {catalog_item_id} not found")]
    ItemNotInCatalog { catalog_item_id: String },

    /// The stock event channel is closed (hub shut down).
    #[error("Stock event channel closed")]
    EventChannelClosed,
}

impl InventoryError {
    /// Returns true if this error is recoverable at consumption time:
    /// the order proceeds, the deduction is skipped, and the issue is
    /// surfaced through inventory notifications.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            InventoryError::InsufficientStock { .. }
                | InventoryError::IngredientNotTracked { .. }
                | InventoryError::ItemNotInCatalog { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_categorization() {
        assert!(InventoryError::InsufficientStock {
            ingredient_id: "cheese".into(),
            available: 3.0,
            required: 5.0,
        }
        .is_soft());
        assert!(InventoryError::IngredientNotTracked {
            ingredient_id: "saffron".into()
        }
        .is_soft());
        assert!(!InventoryError::EventChannelClosed.is_soft());
    }
}
