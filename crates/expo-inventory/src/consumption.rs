//! # Consumption Engine
//!
//! Expands order line items into ingredient requirements, validates
//! sufficiency, and performs the consumption.
//!
//! ## validate vs. consume
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  validate(line_items)          consume(order)                          │
//! │  ────────────────────          ──────────────                          │
//! │  • pure read                   • per-ingredient atomic decrement       │
//! │  • pre-persistence gate        • runs AFTER the order is committed     │
//! │  • any shortage rejects        • shortages are SOFT: warn, skip the    │
//! │    the whole order               ingredient, keep going                │
//! │  • aggregates requirements     • one audit record per ingredient       │
//! │    per ingredient                per order line                        │
//! │                                                                         │
//! │  validate does NOT reserve stock. A validate-then-consume race is      │
//! │  possible; consume's own check is the authoritative guard.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Why are consumption shortages soft? By the time `consume` runs, the
//! order has been persisted and payment committed. An inventory
//! under-count is a recoverable operational issue; a dropped order is not.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use expo_core::{CatalogItem, ConsumptionRecord, LineItem, Order, StockStatus};

use crate::error::{InventoryError, InventoryResult};
use crate::ledger::StockLedger;

// =============================================================================
// External Collaborator Seams
// =============================================================================

/// Supplies catalog entries (ingredient lists, categories, prep times).
///
/// The catalog service owns this data; the engine only reads it.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Looks up a catalog item by id. `None` means the item is unknown.
    async fn catalog_item(&self, catalog_item_id: &str) -> Option<CatalogItem>;
}

/// Invoked when an ingredient reaches `out_of_stock`, so the catalog
/// collaborator can disable dependent menu items.
#[async_trait]
pub trait CatalogDisableHook: Send + Sync {
    async fn disable_items_for(&self, ingredient_id: &str);
}

// =============================================================================
// Events & Reports
// =============================================================================

/// A stock threshold crossing, forwarded to the notification hub.
#[derive(Debug, Clone)]
pub struct StockEvent {
    /// Ingredient that crossed a threshold.
    pub ingredient_id: String,

    /// Display name for the notification message.
    pub ingredient_name: String,

    /// Status crossed into (`LowStock` or `OutOfStock`).
    pub status: StockStatus,

    /// Quantity remaining after the decrement.
    pub remaining: f64,

    /// Order whose consumption triggered the crossing.
    pub order_id: String,
}

/// One deficient ingredient found by `validate`.
#[derive(Debug, Clone)]
pub struct StockShortage {
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub required: f64,
    pub available: f64,
}

/// Result of the pre-persistence validation gate.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// True when every tracked ingredient has sufficient stock.
    pub valid: bool,

    /// One entry per deficient ingredient.
    pub errors: Vec<StockShortage>,
}

/// Result of best-effort consumption for one order.
#[derive(Debug)]
pub struct ConsumptionOutcome {
    /// Number of successful ingredient deductions.
    pub consumed: usize,

    /// Soft errors encountered (shortage races, untracked ingredients,
    /// unknown catalog items). The order proceeded regardless.
    pub errors: Vec<InventoryError>,
}

impl ConsumptionOutcome {
    /// True when every expansion step deducted successfully.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

// =============================================================================
// Consumption Engine
// =============================================================================

/// Validates and consumes ingredient stock for orders.
pub struct ConsumptionEngine {
    /// The shared stock ledger.
    ledger: Arc<StockLedger>,

    /// Catalog lookups (ingredient lists per item).
    catalog: Arc<dyn CatalogProvider>,

    /// Threshold-crossing events, consumed by the notification wiring.
    events_tx: mpsc::Sender<StockEvent>,

    /// Invoked when an ingredient runs out.
    disable_hook: Option<Arc<dyn CatalogDisableHook>>,

    /// Append-only consumption audit log.
    audit: Mutex<Vec<ConsumptionRecord>>,
}

impl ConsumptionEngine {
    /// Creates an engine over the given ledger and catalog.
    pub fn new(
        ledger: Arc<StockLedger>,
        catalog: Arc<dyn CatalogProvider>,
        events_tx: mpsc::Sender<StockEvent>,
    ) -> Self {
        ConsumptionEngine {
            ledger,
            catalog,
            events_tx,
            disable_hook: None,
            audit: Mutex::new(Vec::new()),
        }
    }

    /// Attaches the catalog auto-disable hook.
    pub fn with_disable_hook(mut self, hook: Arc<dyn CatalogDisableHook>) -> Self {
        self.disable_hook = Some(hook);
        self
    }

    /// Shared access to the underlying ledger.
    pub fn ledger(&self) -> &Arc<StockLedger> {
        &self.ledger
    }

    // =========================================================================
    // validate
    // =========================================================================

    /// Pre-persistence sufficiency check. Pure read: performs no
    /// mutation and reserves nothing.
    ///
    /// Requirements are aggregated per ingredient across all line items
    /// so an order needing 2×3 cheese against a stock of 5 is caught
    /// even though each line alone would fit.
    pub async fn validate(&self, line_items: &[LineItem]) -> ValidationReport {
        let requirements = self.expand(line_items).await;

        let mut errors = Vec::new();
        for (ingredient_id, required) in &requirements {
            match self.ledger.get(ingredient_id).await {
                Some(record) => {
                    if !record.has_at_least(*required) {
                        errors.push(StockShortage {
                            ingredient_id: ingredient_id.clone(),
                            ingredient_name: record.name.clone(),
                            required: *required,
                            available: record.quantity,
                        });
                    }
                }
                None => {
                    // Untracked ingredients don't gate placement; they
                    // surface as soft errors at consumption time.
                    debug!(ingredient = %ingredient_id, "Ingredient not tracked, skipping validation");
                }
            }
        }

        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }

    // =========================================================================
    // consume
    // =========================================================================

    /// Consumes stock for a persisted order. Best-effort: shortages lost
    /// to a concurrent order are warned and skipped, never fatal.
    ///
    /// One audit record is appended per ingredient per order line.
    pub async fn consume(&self, order: &Order) -> ConsumptionOutcome {
        let mut consumed = 0usize;
        let mut errors = Vec::new();

        for item in &order.line_items {
            let catalog_item = match self.catalog.catalog_item(&item.catalog_item_id).await {
                Some(entry) => entry,
                None => {
                    warn!(
                        order_id = %order.id,
                        catalog_item = %item.catalog_item_id,
                        "Catalog item missing during consumption"
                    );
                    errors.push(InventoryError::ItemNotInCatalog {
                        catalog_item_id: item.catalog_item_id.clone(),
                    });
                    continue;
                }
            };

            for portion in &catalog_item.ingredients {
                let required = portion.portion * item.quantity as f64;

                match self.ledger.try_consume(&portion.ingredient_id, required).await {
                    Ok(effect) => {
                        consumed += 1;
                        self.record(&portion.ingredient_id, required, &order.id).await;
                        self.handle_crossing(
                            &portion.ingredient_id,
                            &order.id,
                            effect.crossed_into(),
                            effect.remaining,
                        )
                        .await;
                    }
                    Err(err) => {
                        // Stock race against a concurrent order, or an
                        // untracked ingredient. The order already exists;
                        // skip this deduction and keep going.
                        warn!(
                            order_id = %order.id,
                            ingredient = %portion.ingredient_id,
                            error = %err,
                            "Skipping ingredient deduction"
                        );
                        errors.push(err);
                    }
                }
            }
        }

        ConsumptionOutcome { consumed, errors }
    }

    /// Clone of the append-only audit log.
    pub async fn audit_log(&self) -> Vec<ConsumptionRecord> {
        self.audit.lock().await.clone()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Expands line items into aggregated per-ingredient requirements.
    async fn expand(&self, line_items: &[LineItem]) -> HashMap<String, f64> {
        let mut requirements: HashMap<String, f64> = HashMap::new();
        for item in line_items {
            if let Some(entry) = self.catalog.catalog_item(&item.catalog_item_id).await {
                for portion in &entry.ingredients {
                    *requirements.entry(portion.ingredient_id.clone()).or_insert(0.0) +=
                        portion.portion * item.quantity as f64;
                }
            }
        }
        requirements
    }

    async fn record(&self, ingredient_id: &str, quantity: f64, order_id: &str) {
        let mut audit = self.audit.lock().await;
        audit.push(ConsumptionRecord::new(ingredient_id, quantity, order_id));
    }

    /// Emits a threshold event and fires the disable hook on out-of-stock.
    async fn handle_crossing(
        &self,
        ingredient_id: &str,
        order_id: &str,
        crossed_into: Option<StockStatus>,
        remaining: f64,
    ) {
        let Some(status) = crossed_into else {
            return;
        };

        let name = self
            .ledger
            .get(ingredient_id)
            .await
            .map(|r| r.name)
            .unwrap_or_else(|| ingredient_id.to_string());

        let event = StockEvent {
            ingredient_id: ingredient_id.to_string(),
            ingredient_name: name,
            status,
            remaining,
            order_id: order_id.to_string(),
        };

        if self.events_tx.send(event).await.is_err() {
            warn!(ingredient = %ingredient_id, "Stock event receiver dropped");
        }

        if status == StockStatus::OutOfStock {
            if let Some(hook) = &self.disable_hook {
                hook.disable_items_for(ingredient_id).await;
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use expo_core::{CustomerInfo, IngredientPortion, StockRecord};

    /// Fixed-map catalog for tests.
    struct TestCatalog {
        items: HashMap<String, CatalogItem>,
    }

    impl TestCatalog {
        fn new(items: Vec<CatalogItem>) -> Arc<Self> {
            Arc::new(TestCatalog {
                items: items.into_iter().map(|i| (i.id.clone(), i)).collect(),
            })
        }
    }

    #[async_trait]
    impl CatalogProvider for TestCatalog {
        async fn catalog_item(&self, id: &str) -> Option<CatalogItem> {
            self.items.get(id).cloned()
        }
    }

    struct CountingHook {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogDisableHook for CountingHook {
        async fn disable_items_for(&self, _ingredient_id: &str) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn burger_item() -> CatalogItem {
        CatalogItem {
            id: "cat-burger".to_string(),
            name: "Burger".to_string(),
            category: "mains".to_string(),
            price_cents: 899,
            ingredients: vec![
                IngredientPortion {
                    ingredient_id: "cheese".to_string(),
                    portion: 1.0,
                },
                IngredientPortion {
                    ingredient_id: "bun".to_string(),
                    portion: 1.0,
                },
            ],
            prep_minutes: 12,
            is_active: true,
        }
    }

    async fn engine_with_stock(
        cheese: f64,
    ) -> (ConsumptionEngine, mpsc::Receiver<StockEvent>) {
        let ledger = Arc::new(StockLedger::new());
        ledger
            .upsert(StockRecord::new("cheese", "Cheese", cheese, 2.0, 5.0))
            .await;
        ledger
            .upsert(StockRecord::new("bun", "Bun", 100.0, 10.0, 20.0))
            .await;

        let (tx, rx) = mpsc::channel(16);
        let engine = ConsumptionEngine::new(ledger, TestCatalog::new(vec![burger_item()]), tx);
        (engine, rx)
    }

    fn order_of_burgers(quantity: i64) -> Order {
        let item = LineItem::new("cat-burger", "Burger", quantity, 899);
        Order::new(vec![item], CustomerInfo::default())
    }

    #[tokio::test]
    async fn test_validate_rejects_shortage_without_mutation() {
        // Scenario A: stock 5, order requires 6
        let (engine, _rx) = engine_with_stock(5.0).await;
        let order = order_of_burgers(6);

        let report = engine.validate(&order.line_items).await;
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].ingredient_id, "cheese");
        assert_eq!(report.errors[0].required, 6.0);
        assert_eq!(report.errors[0].available, 5.0);

        // Pure read: nothing moved
        assert_eq!(engine.ledger().available("cheese").await, Some(5.0));
    }

    #[tokio::test]
    async fn test_validate_aggregates_across_lines() {
        let (engine, _rx) = engine_with_stock(5.0).await;
        let items = vec![
            LineItem::new("cat-burger", "Burger", 3, 899),
            LineItem::new("cat-burger", "Burger", 3, 899),
        ];
        let report = engine.validate(&items).await;
        assert!(!report.valid); // 3 + 3 > 5 even though each line fits
    }

    #[tokio::test]
    async fn test_consume_decrements_and_audits() {
        let (engine, _rx) = engine_with_stock(10.0).await;
        let order = order_of_burgers(2);

        let outcome = engine.consume(&order).await;
        assert!(outcome.is_clean());
        assert_eq!(outcome.consumed, 2); // cheese + bun
        assert_eq!(engine.ledger().available("cheese").await, Some(8.0));

        let audit = engine.audit_log().await;
        assert_eq!(audit.len(), 2);
        assert!(audit.iter().all(|r| r.order_id == order.id));
    }

    #[tokio::test]
    async fn test_consume_shortage_is_soft() {
        let (engine, _rx) = engine_with_stock(1.0).await;
        let order = order_of_burgers(2);

        let outcome = engine.consume(&order).await;
        // Cheese deduction skipped, bun deduction still happened
        assert_eq!(outcome.consumed, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].is_soft());
        assert_eq!(engine.ledger().available("cheese").await, Some(1.0));
        assert_eq!(engine.ledger().available("bun").await, Some(98.0));
    }

    #[tokio::test]
    async fn test_unknown_catalog_item_is_soft() {
        let (engine, _rx) = engine_with_stock(10.0).await;
        let item = LineItem::new("cat-ghost", "Ghost", 1, 100);
        let order = Order::new(vec![item], CustomerInfo::default());

        let outcome = engine.consume(&order).await;
        assert_eq!(outcome.consumed, 0);
        assert!(matches!(
            outcome.errors[0],
            InventoryError::ItemNotInCatalog { .. }
        ));
    }

    #[tokio::test]
    async fn test_low_stock_event_emitted() {
        // Scenario E: 12 → 4 against an alert threshold of 5
        let (engine, mut rx) = engine_with_stock(12.0).await;
        let order = order_of_burgers(8);

        engine.consume(&order).await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.ingredient_id, "cheese");
        assert_eq!(event.status, StockStatus::LowStock);
        assert_eq!(event.remaining, 4.0);
        assert_eq!(event.order_id, order.id);
    }

    #[tokio::test]
    async fn test_out_of_stock_fires_disable_hook() {
        let (engine, mut rx) = engine_with_stock(2.0).await;
        let hook = Arc::new(CountingHook {
            calls: AtomicUsize::new(0),
        });
        let engine = engine.with_disable_hook(hook.clone());

        engine.consume(&order_of_burgers(2)).await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.status, StockStatus::OutOfStock);
        assert_eq!(hook.calls.load(Ordering::SeqCst), 1);
    }
}
