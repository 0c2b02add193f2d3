//! # Notification Error Types

use thiserror::Error;

/// Result type alias for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Notification hub failures.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// No connected session with this id.
    #[error("Session {session_id} not found")]
    SessionNotFound { session_id: String },

    /// No stored notification with this id.
    #[error("Notification {notification_id} not found")]
    NotificationNotFound { notification_id: String },

    /// The client transport refused or dropped the write.
    /// The hub disconnects the session and moves on.
    #[error("Client transport error: {0}")]
    Transport(String),

    /// Envelope serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
