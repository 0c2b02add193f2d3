//! # expo-notify: Notification Hub
//!
//! Targeted real-time notifications for connected operator terminals.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Notification Flow                                │
//! │                                                                         │
//! │  producers (order placed, stock alert, print failure, ...)              │
//! │       │                                                                 │
//! │       ▼ store FIRST (replay source of truth)                            │
//! │  ┌──────────────────┐        ┌────────────────────┐                     │
//! │  │ NotificationHub  │───────►│ NotificationStore  │                     │
//! │  └───────┬──────────┘        └────────────────────┘                     │
//! │          │ targeting.matches(role, user)                                │
//! │          ▼                                                              │
//! │  ┌──────────────────┐  ping/pong   ┌───────────────────┐                │
//! │  │  ClientRegistry  │◄────────────►│ ClientTransport(s)│──► terminals   │
//! │  └──────────────────┘  heartbeat   └───────────────────┘                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Delivery is best-effort; persistence is not. A terminal that is
//! offline during publish replays its pending notifications when it
//! authenticates.

pub mod client;
pub mod error;
pub mod hub;
pub mod producers;
pub mod registry;
pub mod store;

pub use client::{ClientSession, ClientTransport, SessionId};
pub use error::{NotifyError, NotifyResult};
pub use hub::{HeartbeatHandle, NotificationHub};
pub use registry::ClientRegistry;
pub use store::{InMemoryNotificationStore, NotificationStore};
