//! # expo-core: Pure Domain Types for Expo POS
//!
//! This crate is the **heart** of Expo POS. It contains the domain model
//! for order coordination as pure types with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Expo POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   expo-orchestrator                             │   │
//! │  │    place_order: validate ► persist ► consume ► route ► print   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌──────────────┐  ┌───────────▼──────┐  ┌──────────────┐              │
//! │  │expo-inventory│  │    expo-print    │  │  expo-notify │              │
//! │  └──────┬───────┘  └────────┬─────────┘  └──────┬───────┘              │
//! │         │                   │                   │                      │
//! │  ┌──────▼───────────────────▼───────────────────▼───────┐              │
//! │  │               ★ expo-core (THIS CRATE) ★              │              │
//! │  │                                                       │              │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────────┐ │              │
//! │  │  │  types  │ │  stock  │ │ ticket  │ │notification │ │              │
//! │  │  │ Order   │ │ Record  │ │ Payload │ │ Targeting   │ │              │
//! │  │  │ LineItem│ │ Audit   │ │ Render  │ │ Envelope    │ │              │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └─────────────┘ │              │
//! │  │                                                       │              │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS  │              │
//! │  └───────────────────────────────────────────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, LineItem, Department, CatalogItem, Printer)
//! - [`stock`] - Stock records, thresholds, consumption audit entries
//! - [`ticket`] - Department ticket payloads and plain-text rendering
//! - [`notification`] - Notification types, targeting rules, client envelope
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Guarded Transitions**: Status enums refuse illegal moves; callers get typed errors

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod notification;
pub mod stock;
pub mod ticket;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use expo_core::Order` instead of
// `use expo_core::types::Order`

pub use error::{CoreError, CoreResult, ValidationError};
pub use notification::{
    ClientEnvelope, Notification, NotificationKind, Priority, Role, Targeting,
};
pub use stock::{ConsumptionRecord, StockRecord, StockStatus};
pub use ticket::{TicketLine, TicketPayload};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default maximum print attempts before a job is left failed for
/// manual intervention. Overridable through configuration.
pub const DEFAULT_MAX_PRINT_ATTEMPTS: u32 = 3;

/// Default heartbeat interval for connected-client liveness (seconds).
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Default number of consecutive missed heartbeat cycles before a
/// client session is forcibly disconnected.
pub const DEFAULT_MISSED_PING_THRESHOLD: u32 = 2;
