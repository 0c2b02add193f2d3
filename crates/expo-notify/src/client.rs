//! # Client Sessions
//!
//! One session per connected operator terminal.
//!
//! Sessions connect unauthenticated and receive only broadcasts until
//! the terminal authenticates with a user id and role. Liveness is
//! cooperative: the heartbeat marks every session stale, pings it, and
//! a pong from the terminal marks it fresh again.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use expo_core::Role;

use crate::error::NotifyResult;

/// Session identifier (UUID v4).
pub type SessionId = String;

// =============================================================================
// Client Transport
// =============================================================================

/// The write side of one connected terminal.
///
/// WebSocket framing, reconnection and backpressure live behind this
/// trait; the hub only sees serialized envelopes and ping frames.
#[async_trait]
pub trait ClientTransport: Send + Sync {
    /// Sends one serialized envelope.
    async fn send(&self, payload: String) -> NotifyResult<()>;

    /// Sends a liveness ping.
    async fn ping(&self) -> NotifyResult<()>;

    /// Closes the connection. Best-effort; errors are ignored.
    async fn close(&self);
}

// =============================================================================
// Client Session
// =============================================================================

/// A connected terminal with its identity and liveness bookkeeping.
#[derive(Clone)]
pub struct ClientSession {
    /// Unique session id.
    pub id: SessionId,

    /// Authenticated user id, if any.
    pub user_id: Option<String>,

    /// Authenticated role, if any. Unauthenticated sessions receive
    /// only broadcasts.
    pub role: Option<Role>,

    /// Cleared by each heartbeat ping, set again by the pong.
    pub alive: bool,

    /// Consecutive heartbeat cycles without a pong.
    pub missed_pings: u32,

    /// When the session connected.
    pub connected_at: DateTime<Utc>,

    /// Write side of the connection.
    pub transport: Arc<dyn ClientTransport>,
}

impl ClientSession {
    /// Creates a fresh unauthenticated session.
    pub fn new(transport: Arc<dyn ClientTransport>) -> Self {
        ClientSession {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            role: None,
            alive: true,
            missed_pings: 0,
            connected_at: Utc::now(),
            transport,
        }
    }

    /// Attaches an authenticated identity.
    pub fn authenticate(&mut self, user_id: &str, role: Role) {
        self.user_id = Some(user_id.to_string());
        self.role = Some(role);
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("alive", &self.alive)
            .field("missed_pings", &self.missed_pings)
            .finish()
    }
}
