//! # Error Types
//!
//! Domain-specific error types for expo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  expo-core errors (this file)                                          │
//! │  ├── CoreError        - Domain rule violations (status machines etc.)  │
//! │  └── ValidationError  - Order payload validation failures              │
//! │                                                                         │
//! │  Service-layer errors (separate crates)                                │
//! │  ├── InventoryError   - Stock lookup / sufficiency failures            │
//! │  ├── PrintError       - Printer dispatch / execution failures          │
//! │  └── NotifyError      - Client delivery / store failures               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → service errors → PlacementReport  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (order id, department, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::types::{Department, DepartmentStatus, OrderStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
///
/// These errors represent domain rule violations. They should be caught
/// and translated to operator-facing messages by the calling layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Overall order status may only move forward, or regress to Cancelled.
    #[error("Order {order_id} cannot move from {from:?} to {to:?}")]
    InvalidOrderTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Department statuses are monotonic (pending → in_progress → ready → served).
    #[error("Department {department} on order {order_id} cannot move from {from:?} to {to:?}")]
    InvalidDepartmentTransition {
        order_id: String,
        department: Department,
        from: DepartmentStatus,
        to: DepartmentStatus,
    },

    /// A line item's department assignment is set exactly once by routing.
    #[error("Line item {line_item_id} already routed to {department}")]
    DepartmentAlreadyAssigned {
        line_item_id: String,
        department: Department,
    },

    /// A line item must be routed before print dispatch.
    #[error("Line item {line_item_id} has no department assigned")]
    DepartmentNotAssigned { line_item_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Order payload validation errors.
///
/// These are **hard** errors: a payload that fails validation is rejected
/// before any state is created.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Order has no line items.
    #[error("Order must contain at least one line item")]
    EmptyOrder,

    /// A line item quantity must be positive.
    #[error("Line item {line_item} has non-positive quantity {quantity}")]
    NonPositiveQuantity { line_item: String, quantity: i64 },

    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A monetary amount is negative.
    #[error("{field} cannot be negative: {cents}")]
    NegativeAmount { field: String, cents: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
