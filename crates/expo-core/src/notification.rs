//! # Notification Types
//!
//! Typed events pushed to connected operator terminals, plus the pure
//! targeting rule that decides which sessions receive them.
//!
//! ## Targeting Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Notification Targeting                             │
//! │                                                                         │
//! │  target_roles = []  AND  target_users = []   →  BROADCAST (everyone)   │
//! │  session.role  ∈ target_roles                →  deliver                │
//! │  session.user  ∈ target_users                →  deliver                │
//! │  otherwise                                   →  skip                   │
//! │                                                                         │
//! │  Unauthenticated sessions receive ONLY broadcasts.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Department;

// =============================================================================
// Roles
// =============================================================================

/// Staff role attached to an authenticated client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Kitchen,
    Counter,
    Specialty,
    Waiter,
    Cashier,
}

impl Role {
    /// The role staffing a fulfillment department.
    pub fn for_department(department: Department) -> Role {
        match department {
            Department::Kitchen => Role::Kitchen,
            Department::Counter => Role::Counter,
            Department::Specialty => Role::Specialty,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Kitchen => write!(f, "kitchen"),
            Role::Counter => write!(f, "counter"),
            Role::Specialty => write!(f, "specialty"),
            Role::Waiter => write!(f, "waiter"),
            Role::Cashier => write!(f, "cashier"),
        }
    }
}

// =============================================================================
// Kind & Priority
// =============================================================================

/// The category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Order,
    System,
    Staff,
    Inventory,
    Alert,
}

/// Delivery priority, surfaced to the terminal UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

// =============================================================================
// Targeting
// =============================================================================

/// Who should receive a notification.
///
/// Empty role list AND empty user list means broadcast.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Targeting {
    /// Roles to deliver to.
    pub roles: Vec<Role>,

    /// Explicit user ids to deliver to.
    pub users: Vec<String>,
}

impl Targeting {
    /// Broadcast to every connected session.
    pub fn broadcast() -> Self {
        Targeting::default()
    }

    /// Target a set of roles.
    pub fn roles(roles: impl Into<Vec<Role>>) -> Self {
        Targeting {
            roles: roles.into(),
            users: Vec::new(),
        }
    }

    /// Returns true when no roles or users are named.
    pub fn is_broadcast(&self) -> bool {
        self.roles.is_empty() && self.users.is_empty()
    }

    /// The targeting rule: does a session with this identity receive
    /// the notification?
    pub fn matches(&self, role: Option<Role>, user_id: Option<&str>) -> bool {
        if self.is_broadcast() {
            return true;
        }
        if let Some(role) = role {
            if self.roles.contains(&role) {
                return true;
            }
        }
        if let Some(user) = user_id {
            if self.users.iter().any(|u| u == user) {
                return true;
            }
        }
        false
    }
}

// =============================================================================
// Notification
// =============================================================================

/// A typed event pushed to connected clients and persisted for offline
/// consumption.
///
/// Created once by a producer; the hub never mutates it. Read/dismissed
/// flags are later set by the consuming terminal through the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Category.
    pub kind: NotificationKind,

    /// Delivery priority.
    pub priority: Priority,

    /// Short title.
    pub title: String,

    /// Human-readable message body.
    pub message: String,

    /// Free-form structured payload.
    pub data: serde_json::Value,

    /// Delivery targeting.
    pub targeting: Targeting,

    /// Department tag, when the event concerns one station.
    pub department: Option<Department>,

    /// Whether the terminal should demand acknowledgement.
    pub action_required: bool,

    /// Set by the consuming terminal, never by the hub.
    pub read: bool,

    /// Set by the consuming terminal, never by the hub.
    pub dismissed: bool,

    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates a notification with empty payload and broadcast targeting.
    pub fn new(kind: NotificationKind, priority: Priority, title: &str, message: &str) -> Self {
        Notification {
            id: Uuid::new_v4().to_string(),
            kind,
            priority,
            title: title.to_string(),
            message: message.to_string(),
            data: serde_json::Value::Null,
            targeting: Targeting::broadcast(),
            department: None,
            action_required: false,
            read: false,
            dismissed: false,
            created_at: Utc::now(),
        }
    }

    /// Builder-style targeting.
    pub fn with_targeting(mut self, targeting: Targeting) -> Self {
        self.targeting = targeting;
        self
    }

    /// Builder-style payload.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Builder-style department tag.
    pub fn with_department(mut self, department: Department) -> Self {
        self.department = Some(department);
        self
    }

    /// Builder-style action-required flag.
    pub fn with_action_required(mut self) -> Self {
        self.action_required = true;
        self
    }
}

// =============================================================================
// Client Envelope
// =============================================================================

/// The JSON envelope sent to client transports.
///
/// Field names are part of the client contract - do not rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
    pub department: Option<Department>,
    pub action_required: bool,
}

impl From<&Notification> for ClientEnvelope {
    fn from(n: &Notification) -> Self {
        ClientEnvelope {
            id: n.id.clone(),
            kind: n.kind,
            priority: n.priority,
            title: n.title.clone(),
            message: n.message.clone(),
            timestamp: n.created_at,
            data: n.data.clone(),
            department: n.department,
            action_required: n.action_required,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
