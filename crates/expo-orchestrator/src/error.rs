//! # Orchestrator Error Types

use thiserror::Error;

use expo_inventory::StockShortage;

/// Result type alias for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Order coordination failures.
///
/// Subsystem errors that should abort the pipeline bubble up through
/// `#[from]` conversions; soft subsystem errors never become an
/// `OrchestratorError` - they travel in the placement report instead.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Placement rejected before persistence: stock cannot cover the
    /// order. Nothing was written.
    #[error("Order rejected: insufficient stock for {} ingredient(s)", .shortages.len())]
    RejectedInsufficientStock { shortages: Vec<StockShortage> },

    /// No order with this id in the store.
    #[error("Order {order_id} not found")]
    OrderNotFound { order_id: String },

    /// Domain rule violation (empty order, illegal transition).
    #[error(transparent)]
    Core(#[from] expo_core::CoreError),

    /// Notification hub failure.
    #[error(transparent)]
    Notify(#[from] expo_notify::NotifyError),

    /// Print subsystem failure that is the caller's to handle
    /// (unknown job, illegal lifecycle action).
    #[error(transparent)]
    Print(#[from] expo_print::PrintError),

    /// Config file could not be read or written.
    #[error("Config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Config file is not valid TOML.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be serialized.
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Config contents fail validation.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
