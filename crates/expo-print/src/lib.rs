//! # expo-print: Department Router & Print Job Manager
//!
//! Routes order line items to fulfillment departments and drives
//! per-department ticket print jobs through a guarded state machine.
//!
//! ## Pipeline Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ticket Fan-Out                                   │
//! │                                                                         │
//! │  confirmed order                                                        │
//! │       │                                                                 │
//! │       ▼ category lookup (kitchen default, observable)                   │
//! │  ┌──────────────────┐                                                   │
//! │  │ DepartmentRouter │── line item → department                          │
//! │  └──────────────────┘                                                   │
//! │       │                                                                 │
//! │       ▼ one original job per (order, department)                        │
//! │  ┌──────────────────┐   frozen ticket    ┌──────────────────┐           │
//! │  │ PrintJobManager  │───────────────────►│ PrinterTransport │──► paper  │
//! │  └──────────────────┘   timeout-bounded  └──────────────────┘           │
//! │       │                                                                 │
//! │       └── retry (bounded) / reprint (fresh budget) / cancel             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod job;
pub mod manager;
pub mod printers;
pub mod router;
pub mod transport;

pub use error::{PrintError, PrintResult};
pub use job::{JobState, JobType, PrintJob};
pub use manager::PrintJobManager;
pub use printers::{InMemoryPrinterRegistry, PrinterProvider};
pub use router::{DepartmentRouter, RoutedDepartment};
pub use transport::{PrinterTransport, SimulatedPrinter};
