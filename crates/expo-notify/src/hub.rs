//! # Notification Hub
//!
//! Store-first fan-out of notifications to connected terminals.
//!
//! ## Delivery Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         publish(notification)                           │
//! │                                                                         │
//! │  1. PERSIST   store.save() - delivery is best-effort, the store         │
//! │               is the source of truth for replay                         │
//! │  2. SNAPSHOT  clone the session list; map lock released before I/O      │
//! │  3. TARGET    targeting.matches(role, user) per session                 │
//! │  4. SEND      serialized once, written per session; a failed write      │
//! │               disconnects that session, the loop continues              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Liveness
//! The heartbeat task marks every session stale, pings it, and waits for
//! the terminal's pong to mark it fresh. A session that misses the
//! configured number of consecutive cycles is closed and purged.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use expo_core::{
    ClientEnvelope, Notification, Role, DEFAULT_HEARTBEAT_INTERVAL_SECS,
    DEFAULT_MISSED_PING_THRESHOLD,
};

use crate::client::{ClientSession, ClientTransport, SessionId};
use crate::error::NotifyResult;
use crate::registry::ClientRegistry;
use crate::store::NotificationStore;

// =============================================================================
// Notification Hub
// =============================================================================

/// Session registry plus store-first publish.
pub struct NotificationHub {
    registry: ClientRegistry,
    store: Arc<dyn NotificationStore>,
    heartbeat_interval: Duration,
    missed_threshold: u32,
}

impl NotificationHub {
    /// A hub with default heartbeat settings.
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        NotificationHub {
            registry: ClientRegistry::new(),
            store,
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_INTERVAL_SECS),
            missed_threshold: DEFAULT_MISSED_PING_THRESHOLD,
        }
    }

    /// Overrides the heartbeat interval and missed-ping threshold.
    pub fn with_heartbeat(mut self, interval: Duration, missed_threshold: u32) -> Self {
        self.heartbeat_interval = interval;
        self.missed_threshold = missed_threshold;
        self
    }

    /// The backing store, for read/dismiss endpoints.
    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.store
    }

    // ====== Sessions ======

    /// Registers a new unauthenticated session.
    pub async fn connect(&self, transport: Arc<dyn ClientTransport>) -> SessionId {
        let session = ClientSession::new(transport);
        let id = session.id.clone();
        self.registry.insert(session).await;
        info!(session_id = %id, "Client connected");
        id
    }

    /// Attaches an identity to a session and replays what it missed.
    pub async fn authenticate(
        &self,
        session_id: &str,
        user_id: &str,
        role: Role,
    ) -> NotifyResult<usize> {
        self.registry.authenticate(session_id, user_id, role).await?;
        info!(session_id = %session_id, user_id = %user_id, role = %role, "Client authenticated");
        self.replay(session_id, 50).await
    }

    /// Removes a session and closes its transport.
    pub async fn disconnect(&self, session_id: &str) {
        if let Some(session) = self.registry.remove(session_id).await {
            session.transport.close().await;
            info!(session_id = %session_id, "Client disconnected");
        }
    }

    /// Records a pong from a terminal.
    pub async fn pong(&self, session_id: &str) -> NotifyResult<()> {
        self.registry.mark_alive(session_id).await
    }

    /// Number of connected sessions.
    pub async fn connected(&self) -> usize {
        self.registry.len().await
    }

    // ====== Publish ======

    /// Persists the notification, then fans it out to every session
    /// the targeting matches. Returns the number of deliveries.
    pub async fn publish(&self, notification: Notification) -> NotifyResult<usize> {
        self.store.save(notification.clone()).await?;

        let payload = serde_json::to_string(&ClientEnvelope::from(&notification))?;
        let sessions = self.registry.snapshot().await;

        let mut delivered = 0;
        let mut dead = Vec::new();
        for session in &sessions {
            if !notification
                .targeting
                .matches(session.role, session.user_id.as_deref())
            {
                continue;
            }
            match session.transport.send(payload.clone()).await {
                Ok(()) => delivered += 1,
                Err(err) => {
                    warn!(
                        session_id = %session.id,
                        error = %err,
                        "Delivery failed, dropping session"
                    );
                    dead.push(session.id.clone());
                }
            }
        }
        for session_id in dead {
            self.disconnect(&session_id).await;
        }

        debug!(
            notification_id = %notification.id,
            kind = ?notification.kind,
            delivered,
            "Notification published"
        );
        Ok(delivered)
    }

    /// Re-sends a session's pending notifications, newest first.
    pub async fn replay(&self, session_id: &str, limit: usize) -> NotifyResult<usize> {
        let session = self
            .registry
            .snapshot()
            .await
            .into_iter()
            .find(|s| s.id == session_id)
            .ok_or_else(|| crate::error::NotifyError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;

        let pending = self
            .store
            .pending_for(session.role, session.user_id.as_deref(), limit)
            .await;

        let mut sent = 0;
        for notification in &pending {
            let payload = serde_json::to_string(&ClientEnvelope::from(notification))?;
            if session.transport.send(payload).await.is_ok() {
                sent += 1;
            }
        }
        Ok(sent)
    }

    // ====== Heartbeat ======

    /// One liveness pass: purge sessions past the missed-ping threshold,
    /// mark the rest stale, and ping them. Returns the purged count.
    pub async fn heartbeat_cycle(&self) -> usize {
        let expired = self.registry.sweep(self.missed_threshold).await;
        let purged = expired.len();
        for session_id in expired {
            warn!(session_id = %session_id, "Heartbeat missed, purging session");
            self.disconnect(&session_id).await;
        }

        for session in self.registry.snapshot().await {
            if session.transport.ping().await.is_err() {
                warn!(session_id = %session.id, "Ping failed, purging session");
                self.disconnect(&session.id).await;
            }
        }
        purged
    }

    /// Spawns the background heartbeat loop.
    pub fn spawn_heartbeat(self: &Arc<Self>) -> HeartbeatHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let hub = self.clone();
        let interval = hub.heartbeat_interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick would ping sessions that just
            // connected; skip it.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Heartbeat loop stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        hub.heartbeat_cycle().await;
                    }
                }
            }
        });

        HeartbeatHandle { shutdown_tx, task }
    }
}

// =============================================================================
// Heartbeat Handle
// =============================================================================

/// Handle to the background heartbeat task.
pub struct HeartbeatHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl HeartbeatHandle {
    /// Signals the loop to stop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
