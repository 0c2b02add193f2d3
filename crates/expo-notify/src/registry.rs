//! # Client Registry
//!
//! The shared map of connected sessions.
//!
//! Fan-out and heartbeat both snapshot the registry and iterate over
//! the snapshot, so the map lock is never held across a transport
//! write. Sessions that connect mid-iteration simply miss that one
//! delivery and catch up from the store.

use std::collections::HashMap;

use tokio::sync::RwLock;

use expo_core::Role;

use crate::client::{ClientSession, SessionId};
use crate::error::{NotifyError, NotifyResult};

/// Connected sessions keyed by session id.
#[derive(Default)]
pub struct ClientRegistry {
    sessions: RwLock<HashMap<SessionId, ClientSession>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        ClientRegistry::default()
    }

    /// Registers a session.
    pub async fn insert(&self, session: ClientSession) {
        let mut map = self.sessions.write().await;
        map.insert(session.id.clone(), session);
    }

    /// Removes a session, returning it if present.
    pub async fn remove(&self, session_id: &str) -> Option<ClientSession> {
        let mut map = self.sessions.write().await;
        map.remove(session_id)
    }

    /// Attaches an identity to a connected session.
    pub async fn authenticate(
        &self,
        session_id: &str,
        user_id: &str,
        role: Role,
    ) -> NotifyResult<()> {
        let mut map = self.sessions.write().await;
        let session = map
            .get_mut(session_id)
            .ok_or_else(|| NotifyError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;
        session.authenticate(user_id, role);
        Ok(())
    }

    /// Records a pong: the session is alive again.
    pub async fn mark_alive(&self, session_id: &str) -> NotifyResult<()> {
        let mut map = self.sessions.write().await;
        let session = map
            .get_mut(session_id)
            .ok_or_else(|| NotifyError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;
        session.alive = true;
        session.missed_pings = 0;
        Ok(())
    }

    /// One heartbeat step for every session: stale sessions accrue a
    /// missed ping, fresh ones are marked stale for the next cycle.
    /// Returns the ids that crossed the missed-ping threshold.
    pub async fn sweep(&self, missed_threshold: u32) -> Vec<SessionId> {
        let mut expired = Vec::new();
        let mut map = self.sessions.write().await;
        for session in map.values_mut() {
            if session.alive {
                session.alive = false;
                session.missed_pings = 0;
            } else {
                session.missed_pings += 1;
                if session.missed_pings >= missed_threshold {
                    expired.push(session.id.clone());
                }
            }
        }
        expired
    }

    /// Snapshot of every session.
    pub async fn snapshot(&self) -> Vec<ClientSession> {
        let map = self.sessions.read().await;
        map.values().cloned().collect()
    }

    /// Number of connected sessions.
    pub async fn len(&self) -> usize {
        let map = self.sessions.read().await;
        map.len()
    }

    /// Returns true when no sessions are connected.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
