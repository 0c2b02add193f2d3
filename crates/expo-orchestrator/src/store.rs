//! # Order Store
//!
//! Persistence seam for orders. The pipeline saves once at placement
//! and again after every status change; readers always see a complete
//! snapshot, never a half-updated order.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use expo_core::Order;

use crate::error::OrchestratorResult;

// =============================================================================
// Store Trait
// =============================================================================

/// Durable order storage.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts or replaces an order.
    async fn save(&self, order: Order) -> OrchestratorResult<()>;

    /// Fetches an order by id.
    async fn get(&self, order_id: &str) -> Option<Order>;

    /// Orders that have not reached a terminal status, for the
    /// coordination screens.
    async fn active(&self) -> Vec<Order>;
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Map-backed store for development and tests.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<String, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        InMemoryOrderStore::default()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save(&self, order: Order) -> OrchestratorResult<()> {
        let mut map = self.orders.write().await;
        map.insert(order.id.clone(), order);
        Ok(())
    }

    async fn get(&self, order_id: &str) -> Option<Order> {
        let map = self.orders.read().await;
        map.get(order_id).cloned()
    }

    async fn active(&self) -> Vec<Order> {
        let map = self.orders.read().await;
        let mut active: Vec<Order> = map
            .values()
            .filter(|o| !o.status().is_terminal())
            .cloned()
            .collect();
        active.sort_by_key(|o| o.created_at);
        active
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use expo_core::{CustomerInfo, LineItem, OrderStatus};

    fn order() -> Order {
        Order::new(
            vec![LineItem::new("cat-1", "Burger", 1, 899)],
            CustomerInfo::default(),
        )
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let store = InMemoryOrderStore::new();
        let order = order();
        let id = order.id.clone();
        store.save(order).await.unwrap();

        assert!(store.get(&id).await.is_some());
        assert!(store.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn test_active_excludes_terminal() {
        let store = InMemoryOrderStore::new();
        let open = order();
        let mut done = order();
        done.transition_to(OrderStatus::Cancelled).unwrap();

        store.save(open).await.unwrap();
        store.save(done).await.unwrap();

        assert_eq!(store.active().await.len(), 1);
        assert_eq!(store.len().await, 2);
    }
}
