//! # expo-orchestrator: Order Coordination Pipeline
//!
//! Wires the subsystem crates into one pipeline: stock validation and
//! consumption, department routing, ticket printing, and staff
//! notification.
//!
//! ## Wiring
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Runtime Assembly                                   │
//! │                                                                         │
//! │  ExpoConfig (expo.toml + EXPO_* env)                                    │
//! │       │ router table, printers, limits, heartbeat                       │
//! │       ▼                                                                 │
//! │  ┌───────────────────┐                                                  │
//! │  │ OrderOrchestrator │  place_order / update_department_status /        │
//! │  └───────┬───────────┘  cancel_order                                    │
//! │          │                                                              │
//! │   ┌──────┼──────────────┬───────────────────┐                           │
//! │   ▼      ▼              ▼                   ▼                           │
//! │ OrderStore  ConsumptionEngine  PrintJobManager  NotificationHub         │
//! │                  │                                   ▲                  │
//! │                  └── StockEvent channel ─────────────┘                  │
//! │                      (spawn_stock_alert_forwarder)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod alerts;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod store;

pub use alerts::spawn_stock_alert_forwarder;
pub use config::{ExpoConfig, HeartbeatSettings, PrintSettings, PrinterSettings, StoreSettings};
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::{OrderOrchestrator, PlacementReport};
pub use store::{InMemoryOrderStore, OrderStore};
