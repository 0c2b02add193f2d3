//! # Domain Types
//!
//! Core domain types used throughout Expo POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │    LineItem     │   │  CatalogItem    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  status         │──▶│  department     │──▶│  category       │       │
//! │  │  dept statuses  │   │  qty / price    │   │  ingredients    │       │
//! │  │  total_cents    │   │  notes          │   │  prep_minutes   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Department    │   │   OrderStatus   │   │DepartmentStatus │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Kitchen        │   │  Pending        │   │  Pending        │       │
//! │  │  Counter        │   │  Confirmed      │   │  InProgress     │       │
//! │  │  Specialty      │   │  Preparing      │   │  Ready          │       │
//! │  └─────────────────┘   │  Ready          │   │  Served         │       │
//! │                        │  Delivered      │   └─────────────────┘       │
//! │                        │  Cancelled      │                             │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Invariants
//! - Overall order status only moves forward - the single allowed regression
//!   is into `Cancelled`.
//! - Department statuses are strictly monotonic within
//!   `Pending → InProgress → Ready → Served`.
//! - A line item's department is assigned exactly once by the router and is
//!   immutable afterwards.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Department
// =============================================================================

/// A fulfillment station to which order line items are routed for
/// preparation and ticket printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    /// Hot food preparation.
    Kitchen,
    /// Beverage counter.
    Counter,
    /// Specialty station (desserts, grill, etc.).
    Specialty,
}

impl Department {
    /// All departments, in ticket-dispatch order.
    pub const ALL: [Department; 3] = [
        Department::Kitchen,
        Department::Counter,
        Department::Specialty,
    ];
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Department::Kitchen => write!(f, "kitchen"),
            Department::Counter => write!(f, "counter"),
            Department::Specialty => write!(f, "specialty"),
        }
    }
}

impl std::str::FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kitchen" => Ok(Department::Kitchen),
            "counter" => Ok(Department::Counter),
            "specialty" => Ok(Department::Specialty),
            other => Err(format!(
                "Unknown department: '{}'. Valid options: kitchen, counter, specialty",
                other
            )),
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The overall status of an order.
///
/// ## Transition Rules
/// ```text
/// Pending ──► Confirmed ──► Preparing ──► Ready ──► Delivered
///    │            │             │           │
///    └────────────┴─────────────┴───────────┴──────► Cancelled
/// ```
/// Forward-only, except that any non-terminal status may regress to
/// `Cancelled`. `Delivered` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Position in the forward progression. Cancelled sits outside it.
    fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::Ready => Some(3),
            OrderStatus::Delivered => Some(4),
            OrderStatus::Cancelled => None,
        }
    }

    /// Returns true if the transition `self → to` is legal.
    ///
    /// The only allowed regression is into `Cancelled`, and terminal
    /// statuses never move again.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if to == OrderStatus::Cancelled {
            return true;
        }
        match (self.rank(), to.rank()) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }

    /// Returns true if no further transitions are allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Confirmed => write!(f, "confirmed"),
            OrderStatus::Preparing => write!(f, "preparing"),
            OrderStatus::Ready => write!(f, "ready"),
            OrderStatus::Delivered => write!(f, "delivered"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// =============================================================================
// Department Status
// =============================================================================

/// Per-department preparation status within an order.
///
/// Strictly monotonic: `Pending → InProgress → Ready → Served`.
/// Skipping ahead is allowed (a counter drink can go straight to Ready);
/// moving backwards never is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentStatus {
    Pending,
    InProgress,
    Ready,
    Served,
}

impl DepartmentStatus {
    fn rank(&self) -> u8 {
        match self {
            DepartmentStatus::Pending => 0,
            DepartmentStatus::InProgress => 1,
            DepartmentStatus::Ready => 2,
            DepartmentStatus::Served => 3,
        }
    }

    /// Returns true if the transition `self → to` is monotonic.
    pub fn can_advance_to(&self, to: DepartmentStatus) -> bool {
        to.rank() > self.rank()
    }

    /// Returns true if this status is at or beyond `other`.
    pub fn at_least(&self, other: DepartmentStatus) -> bool {
        self.rank() >= other.rank()
    }
}

impl Default for DepartmentStatus {
    fn default() -> Self {
        DepartmentStatus::Pending
    }
}

// =============================================================================
// Customer Info
// =============================================================================

/// Customer/table context printed on tickets and attached to notifications.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// Display name, if known.
    pub name: Option<String>,

    /// Table number for dine-in orders.
    pub table: Option<String>,

    /// Free-form note from intake (allergies, "no ice", etc.).
    pub note: Option<String>,
}

// =============================================================================
// Line Item
// =============================================================================

/// A line item in an order.
///
/// Uses the snapshot pattern: name and unit price are frozen at intake so
/// the ticket and totals stay consistent even if the catalog changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Catalog item this line references.
    pub catalog_item_id: String,

    /// Item name at time of intake (frozen).
    pub name: String,

    /// Quantity ordered.
    pub quantity: i64,

    /// Unit price in cents at time of intake (frozen).
    pub unit_price_cents: i64,

    /// Tax for this line in cents, supplied by intake.
    /// Tax *formulas* are owned by an external collaborator.
    pub tax_cents: i64,

    /// Customization notes printed on the ticket ("extra cheese").
    pub notes: Option<String>,

    /// Fulfillment department. Set exactly once by the router;
    /// immutable afterwards.
    department: Option<Department>,

    /// Per-item preparation status.
    pub status: DepartmentStatus,
}

impl LineItem {
    /// Creates a new unrouted line item.
    pub fn new(catalog_item_id: &str, name: &str, quantity: i64, unit_price_cents: i64) -> Self {
        LineItem {
            id: Uuid::new_v4().to_string(),
            catalog_item_id: catalog_item_id.to_string(),
            name: name.to_string(),
            quantity,
            unit_price_cents,
            tax_cents: 0,
            notes: None,
            department: None,
            status: DepartmentStatus::Pending,
        }
    }

    /// The assigned department, if routing has run.
    pub fn department(&self) -> Option<Department> {
        self.department
    }

    /// Assigns the fulfillment department. Fails if already assigned.
    pub fn assign_department(&mut self, department: Department) -> CoreResult<()> {
        if let Some(existing) = self.department {
            return Err(CoreError::DepartmentAlreadyAssigned {
                line_item_id: self.id.clone(),
                department: existing,
            });
        }
        self.department = Some(department);
        Ok(())
    }

    /// Line total before tax (unit price × quantity).
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer order moving from intake to delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Ordered sequence of line items.
    pub line_items: Vec<LineItem>,

    /// Total amount in cents (lines + tax), computed at intake.
    pub total_cents: i64,

    /// Customer/table context.
    pub customer: CustomerInfo,

    /// Overall status.
    status: OrderStatus,

    /// Per-department preparation status.
    department_status: HashMap<Department, DepartmentStatus>,

    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new pending order from intake data.
    pub fn new(line_items: Vec<LineItem>, customer: CustomerInfo) -> Self {
        let total_cents = line_items
            .iter()
            .map(|li| li.line_total_cents() + li.tax_cents)
            .sum();
        Order {
            id: Uuid::new_v4().to_string(),
            line_items,
            total_cents,
            customer,
            status: OrderStatus::Pending,
            department_status: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// The overall order status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Moves the overall status, enforcing forward-only transitions
    /// (regression allowed only into `Cancelled`).
    pub fn transition_to(&mut self, to: OrderStatus) -> CoreResult<()> {
        if !self.status.can_transition_to(to) {
            return Err(CoreError::InvalidOrderTransition {
                order_id: self.id.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// The status of one department within this order.
    pub fn department_status(&self, department: Department) -> DepartmentStatus {
        self.department_status
            .get(&department)
            .copied()
            .unwrap_or_default()
    }

    /// Advances one department's status, enforcing monotonicity.
    pub fn advance_department(
        &mut self,
        department: Department,
        to: DepartmentStatus,
    ) -> CoreResult<()> {
        let current = self.department_status(department);
        if !current.can_advance_to(to) {
            return Err(CoreError::InvalidDepartmentTransition {
                order_id: self.id.clone(),
                department,
                from: current,
                to,
            });
        }
        self.department_status.insert(department, to);
        Ok(())
    }

    /// Departments present among this order's routed line items.
    pub fn departments(&self) -> Vec<Department> {
        let mut seen = Vec::new();
        for item in &self.line_items {
            if let Some(dept) = item.department() {
                if !seen.contains(&dept) {
                    seen.push(dept);
                }
            }
        }
        seen
    }

    /// Line items routed to the given department.
    pub fn items_for_department(&self, department: Department) -> Vec<&LineItem> {
        self.line_items
            .iter()
            .filter(|li| li.department() == Some(department))
            .collect()
    }

    /// Returns true when every routed department has reached at least
    /// the given status.
    pub fn all_departments_at_least(&self, status: DepartmentStatus) -> bool {
        let departments = self.departments();
        !departments.is_empty()
            && departments
                .iter()
                .all(|d| self.department_status(*d).at_least(status))
    }
}

// =============================================================================
// Catalog Types (supplied by the external catalog collaborator)
// =============================================================================

/// One ingredient requirement on a catalog item: consuming one unit of
/// the item deducts `portion` units of the ingredient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientPortion {
    /// Ingredient identifier in the stock ledger.
    pub ingredient_id: String,

    /// Units of the ingredient per single item. Fractions are common
    /// (half a portion of cheese on a small pizza).
    pub portion: f64,
}

/// A menu item as supplied by the catalog service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Unique identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Category key, mapped to a department by the router.
    pub category: String,

    /// Price in cents.
    pub price_cents: i64,

    /// Ingredient requirements per single unit.
    pub ingredients: Vec<IngredientPortion>,

    /// Estimated preparation time in minutes.
    pub prep_minutes: u32,

    /// Whether the item is currently orderable.
    pub is_active: bool,
}

// =============================================================================
// Printer (supplied by the external printer registry)
// =============================================================================

/// A hardware (or simulated) ticket printer assigned to a department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Printer {
    /// Unique identifier.
    pub id: String,

    /// Human-readable name ("Kitchen Epson").
    pub name: String,

    /// Department this printer serves.
    pub department: Department,

    /// Whether the printer is active. Inactive printers are never
    /// dispatched to; the caller gets an error before job creation.
    pub is_active: bool,

    /// Number of ticket copies to print.
    pub copies: u32,

    /// Paper width in characters (typically 32 or 48).
    pub paper_width: u32,

    /// Whether to print the store logo header.
    pub include_logo: bool,

    /// Whether to print a QR code footer (rendering owned externally).
    pub include_qr: bool,

    /// When this printer last completed a ticket.
    pub last_print_at: Option<DateTime<Utc>>,

    /// Order id of the last completed ticket.
    pub last_order_id: Option<String>,

    /// Running count of completed tickets.
    pub jobs_printed: u64,
}

impl Printer {
    /// Creates an active printer with default ticket settings.
    pub fn new(name: &str, department: Department) -> Self {
        Printer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            department,
            is_active: true,
            copies: 1,
            paper_width: 32,
            include_logo: false,
            include_qr: false,
            last_print_at: None,
            last_order_id: None,
            jobs_printed: 0,
        }
    }

    /// Records a completed ticket against this printer's counters.
    pub fn record_print(&mut self, order_id: &str) {
        self.last_print_at = Some(Utc::now());
        self.last_order_id = Some(order_id.to_string());
        self.jobs_printed += 1;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
