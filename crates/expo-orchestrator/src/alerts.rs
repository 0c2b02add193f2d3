//! # Stock Alert Forwarding
//!
//! Bridges the consumption engine's threshold events onto the
//! notification hub. The inventory crate knows nothing about
//! notifications; it emits `StockEvent`s on a channel and this task
//! turns them into targeted alerts.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use expo_inventory::StockEvent;
use expo_notify::{producers, NotificationHub};

/// Spawns the forwarding loop. Runs until the event channel closes,
/// which happens when the consumption engine is dropped.
pub fn spawn_stock_alert_forwarder(
    mut events_rx: mpsc::Receiver<StockEvent>,
    hub: Arc<NotificationHub>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            debug!(
                ingredient = %event.ingredient_id,
                status = %event.status,
                remaining = event.remaining,
                "Forwarding stock alert"
            );
            let notification =
                producers::stock_alert(&event.ingredient_name, event.status, event.remaining);
            if let Err(err) = hub.publish(notification).await {
                warn!(error = %err, "Stock alert publish failed");
            }
        }
        info!("Stock alert forwarder stopping, event channel closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use expo_core::StockStatus;
    use expo_notify::{InMemoryNotificationStore, NotificationStore};

    #[tokio::test]
    async fn test_events_become_notifications() {
        let store = Arc::new(InMemoryNotificationStore::default());
        let hub = Arc::new(NotificationHub::new(store.clone()));
        let (tx, rx) = mpsc::channel(8);

        let task = spawn_stock_alert_forwarder(rx, hub);
        tx.send(StockEvent {
            ingredient_id: "ing-cheese".to_string(),
            ingredient_name: "Cheese".to_string(),
            status: StockStatus::OutOfStock,
            remaining: 0.0,
            order_id: "order-1".to_string(),
        })
        .await
        .unwrap();
        drop(tx);
        task.await.unwrap();

        let pending = store.pending_for(Some(expo_core::Role::Admin), None, 10).await;
        assert_eq!(pending.len(), 1);
        assert!(pending[0].message.contains("Cheese"));
    }
}
