//! # Notification Store
//!
//! Persistence seam for notifications.
//!
//! The hub writes every notification to the store *before* fan-out, so
//! a terminal that is offline (or crashes mid-delivery) can replay what
//! it missed on reconnect. Read/dismissed flags are terminal-driven and
//! flow back through the store.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use expo_core::{Notification, Role};

use crate::error::{NotifyError, NotifyResult};

// =============================================================================
// Store Trait
// =============================================================================

/// Durable notification storage.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persists a notification.
    async fn save(&self, notification: Notification) -> NotifyResult<()>;

    /// Marks a notification read.
    async fn mark_read(&self, notification_id: &str) -> NotifyResult<()>;

    /// Marks a notification dismissed.
    async fn mark_dismissed(&self, notification_id: &str) -> NotifyResult<()>;

    /// Undismissed notifications visible to the given identity, newest
    /// first, capped at `limit`.
    async fn pending_for(
        &self,
        role: Option<Role>,
        user_id: Option<&str>,
        limit: usize,
    ) -> Vec<Notification>;
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Ring-buffer store for development and tests. Oldest entries are
/// evicted once the capacity is reached.
pub struct InMemoryNotificationStore {
    entries: Mutex<VecDeque<Notification>>,
    capacity: usize,
}

impl InMemoryNotificationStore {
    pub fn new(capacity: usize) -> Self {
        InMemoryNotificationStore {
            entries: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Total stored notifications, for tests and dashboards.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryNotificationStore {
    fn default() -> Self {
        InMemoryNotificationStore::new(1000)
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn save(&self, notification: Notification) -> NotifyResult<()> {
        let mut entries = self.entries.lock().await;
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(notification);
        Ok(())
    }

    async fn mark_read(&self, notification_id: &str) -> NotifyResult<()> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| NotifyError::NotificationNotFound {
                notification_id: notification_id.to_string(),
            })?;
        entry.read = true;
        Ok(())
    }

    async fn mark_dismissed(&self, notification_id: &str) -> NotifyResult<()> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| NotifyError::NotificationNotFound {
                notification_id: notification_id.to_string(),
            })?;
        entry.dismissed = true;
        Ok(())
    }

    async fn pending_for(
        &self,
        role: Option<Role>,
        user_id: Option<&str>,
        limit: usize,
    ) -> Vec<Notification> {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .rev()
            .filter(|n| !n.dismissed && n.targeting.matches(role, user_id))
            .take(limit)
            .cloned()
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
