//! # expo-inventory: Stock Ledger & Consumption Engine
//!
//! Validates and consumes ingredient stock as orders are placed.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Inventory Consumption Flow                          │
//! │                                                                         │
//! │  Order line items                                                       │
//! │       │                                                                 │
//! │       ▼ catalog expansion (portion × quantity)                          │
//! │  ┌──────────────────┐    validate: pure read, no reservation            │
//! │  │ConsumptionEngine │──────────────────────────────► ValidationReport   │
//! │  │                  │                                                   │
//! │  │                  │    consume: per-ingredient atomic                 │
//! │  │                  │    check-then-decrement                           │
//! │  └───────┬──────────┘                                                   │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  ┌──────────────┐  per-key Mutex   ┌───────────────────────────┐        │
//! │  │ StockLedger  │─────────────────►│ threshold crossing events │──► hub │
//! │  └──────────────┘                  └───────────────────────────┘        │
//! │          │                                                              │
//! │          ▼ out_of_stock                                                 │
//! │  catalog auto-disable hook (external collaborator)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `validate` is advisory only - it does not reserve stock. The race
//! between validate and consume is closed by consume's own atomic check,
//! which is the authoritative guard.

pub mod consumption;
pub mod error;
pub mod ledger;

pub use consumption::{
    CatalogDisableHook, CatalogProvider, ConsumptionEngine, ConsumptionOutcome, StockEvent,
    StockShortage, ValidationReport,
};
pub use error::{InventoryError, InventoryResult};
pub use ledger::{ConsumeEffect, StockLedger};
