//! # Stock Ledger
//!
//! The authoritative store of per-ingredient quantities and thresholds.
//!
//! ## Locking Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Per-Key Mutual Exclusion                            │
//! │                                                                         │
//! │  RwLock<HashMap<ingredient_id, Arc<Mutex<StockRecord>>>>                │
//! │       │                                  │                              │
//! │       │ read-lock the map just long      │ lock ONE record for the      │
//! │       │ enough to clone the Arc          │ whole read-modify-write      │
//! │       ▼                                  ▼                              │
//! │  map lock released BEFORE the record lock is taken, so:                 │
//! │  • concurrent decrements of DIFFERENT ingredients never contend         │
//! │  • concurrent decrements of the SAME ingredient are linearized          │
//! │  • no lock is held across any await outside this module                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The decrement is check-then-write under the record's own mutex:
//! two concurrent consumptions can never both observe the same
//! pre-decrement value and both pass the sufficiency check.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use expo_core::{StockRecord, StockStatus};

use crate::error::{InventoryError, InventoryResult};

// =============================================================================
// Consume Effect
// =============================================================================

/// The observable result of one successful decrement.
#[derive(Debug, Clone)]
pub struct ConsumeEffect {
    /// Quantity remaining after the decrement.
    pub remaining: f64,

    /// Status before the decrement.
    pub status_before: StockStatus,

    /// Status after the decrement (recomputed).
    pub status_after: StockStatus,
}

impl ConsumeEffect {
    /// The status crossed *into* by this decrement, if any.
    ///
    /// `Some(LowStock)` / `Some(OutOfStock)` means a threshold event
    /// should be emitted; `None` means no boundary was crossed.
    pub fn crossed_into(&self) -> Option<StockStatus> {
        if self.status_before == self.status_after {
            return None;
        }
        match self.status_after {
            StockStatus::LowStock | StockStatus::OutOfStock => Some(self.status_after),
            StockStatus::InStock => None,
        }
    }
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// Per-ingredient stock behind per-key mutexes.
///
/// Mutated exclusively by the consumption engine (and restocks).
/// Quantity never goes negative: decrements only happen under the
/// sufficiency check inside the record's own lock.
#[derive(Default)]
pub struct StockLedger {
    records: RwLock<HashMap<String, Arc<Mutex<StockRecord>>>>,
}

impl StockLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        StockLedger::default()
    }

    /// Inserts or replaces an ingredient's record.
    pub async fn upsert(&self, record: StockRecord) {
        let mut map = self.records.write().await;
        map.insert(
            record.ingredient_id.clone(),
            Arc::new(Mutex::new(record)),
        );
    }

    /// Clones the current record for an ingredient.
    pub async fn get(&self, ingredient_id: &str) -> Option<StockRecord> {
        let entry = self.entry(ingredient_id).await?;
        let record = entry.lock().await;
        Some(record.clone())
    }

    /// Current available quantity, if the ingredient is tracked.
    pub async fn available(&self, ingredient_id: &str) -> Option<f64> {
        self.get(ingredient_id).await.map(|r| r.quantity)
    }

    /// Atomic check-then-decrement for one ingredient.
    ///
    /// Holds only the ingredient's own mutex for the read-modify-write;
    /// the map lock is released before the record lock is taken.
    pub async fn try_consume(
        &self,
        ingredient_id: &str,
        required: f64,
    ) -> InventoryResult<ConsumeEffect> {
        let entry = self
            .entry(ingredient_id)
            .await
            .ok_or_else(|| InventoryError::IngredientNotTracked {
                ingredient_id: ingredient_id.to_string(),
            })?;

        let mut record = entry.lock().await;

        if !record.has_at_least(required) {
            return Err(InventoryError::InsufficientStock {
                ingredient_id: ingredient_id.to_string(),
                available: record.quantity,
                required,
            });
        }

        let status_before = record.status;
        record.quantity -= required;
        record.recompute_status();
        record.updated_at = Utc::now();

        debug!(
            ingredient = %ingredient_id,
            consumed = required,
            remaining = record.quantity,
            status = %record.status,
            "Stock decremented"
        );

        Ok(ConsumeEffect {
            remaining: record.quantity,
            status_before,
            status_after: record.status,
        })
    }

    /// Adds stock back (deliveries, corrections). Status is recomputed.
    pub async fn restock(&self, ingredient_id: &str, quantity: f64) -> InventoryResult<StockRecord> {
        let entry = self
            .entry(ingredient_id)
            .await
            .ok_or_else(|| InventoryError::IngredientNotTracked {
                ingredient_id: ingredient_id.to_string(),
            })?;

        let mut record = entry.lock().await;
        record.quantity += quantity;
        record.recompute_status();
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    /// Snapshot of every record, for operator dashboards.
    pub async fn snapshot(&self) -> Vec<StockRecord> {
        let entries: Vec<Arc<Mutex<StockRecord>>> = {
            let map = self.records.read().await;
            map.values().cloned().collect()
        };
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            out.push(entry.lock().await.clone());
        }
        out
    }

    /// Clones the per-ingredient cell, releasing the map lock immediately.
    async fn entry(&self, ingredient_id: &str) -> Option<Arc<Mutex<StockRecord>>> {
        let map = self.records.read().await;
        map.get(ingredient_id).cloned()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
