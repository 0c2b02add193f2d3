//! # Notification Producers
//!
//! Builders for the notifications the coordination pipeline emits.
//! Pure functions: they shape title, message, targeting and payload;
//! the hub does the delivery.

use serde_json::json;

use expo_core::{
    Department, Notification, NotificationKind, Order, OrderStatus, Priority, Role, StockStatus,
    Targeting,
};

/// New order announcement, targeted at the fulfilling departments'
/// roles plus admins.
pub fn order_placed(order: &Order) -> Notification {
    let departments = order.departments();
    let mut roles: Vec<Role> = departments.iter().map(|d| Role::for_department(*d)).collect();
    roles.push(Role::Admin);

    let table = order
        .customer
        .table
        .as_deref()
        .map(|t| format!(" (table {})", t))
        .unwrap_or_default();

    Notification::new(
        NotificationKind::Order,
        Priority::High,
        "New order",
        &format!(
            "Order #{} placed{}: {} items, {}",
            short_ref(&order.id),
            table,
            order.line_items.len(),
            fmt_cents(order.total_cents)
        ),
    )
    .with_targeting(Targeting::roles(roles))
    .with_data(json!({
        "orderId": order.id,
        "totalCents": order.total_cents,
        "departments": departments,
        "table": order.customer.table,
    }))
    .with_action_required()
}

/// Overall order status change, broadcast so every screen stays current.
pub fn order_status_changed(order: &Order, status: OrderStatus) -> Notification {
    Notification::new(
        NotificationKind::Order,
        Priority::Normal,
        "Order status",
        &format!("Order #{} is now {}", short_ref(&order.id), status),
    )
    .with_data(json!({
        "orderId": order.id,
        "status": status,
    }))
}

/// Stock threshold alert. Out-of-stock is urgent and demands
/// acknowledgement; low stock is informational for admins and kitchen.
pub fn stock_alert(ingredient_name: &str, status: StockStatus, remaining: f64) -> Notification {
    let (priority, title) = match status {
        StockStatus::OutOfStock => (Priority::Urgent, "Out of stock"),
        StockStatus::LowStock => (Priority::High, "Low stock"),
        StockStatus::InStock => (Priority::Normal, "Stock restored"),
    };

    let notification = Notification::new(
        NotificationKind::Inventory,
        priority,
        title,
        &format!("{}: {:.1} remaining", ingredient_name, remaining),
    )
    .with_targeting(Targeting::roles(vec![Role::Admin, Role::Kitchen]))
    .with_data(json!({
        "ingredient": ingredient_name,
        "status": status,
        "remaining": remaining,
    }));

    if status == StockStatus::OutOfStock {
        notification.with_action_required()
    } else {
        notification
    }
}

/// Ticket print failure after the retry budget ran out. Targets the
/// affected station and admins; staff print manually from the screen.
pub fn print_failure(order_id: &str, department: Department, detail: &str) -> Notification {
    Notification::new(
        NotificationKind::Alert,
        Priority::Urgent,
        "Print failure",
        &format!(
            "Ticket for order #{} could not be printed at {}: {}",
            short_ref(order_id),
            department,
            detail
        ),
    )
    .with_targeting(Targeting::roles(vec![
        Role::Admin,
        Role::for_department(department),
    ]))
    .with_department(department)
    .with_data(json!({
        "orderId": order_id,
        "department": department,
    }))
    .with_action_required()
}

/// Operational broadcast (store opening, shift change, maintenance).
pub fn system_message(title: &str, message: &str) -> Notification {
    Notification::new(NotificationKind::System, Priority::Normal, title, message)
}

/// Direct message to named staff members.
pub fn staff_message(title: &str, message: &str, user_ids: Vec<String>) -> Notification {
    Notification::new(NotificationKind::Staff, Priority::Normal, title, message)
        .with_targeting(Targeting {
            roles: Vec::new(),
            users: user_ids,
        })
}

fn short_ref(order_id: &str) -> &str {
    order_id.split('-').next().unwrap_or(order_id)
}

fn fmt_cents(amount: i64) -> String {
    format!("{}.{:02}", amount / 100, (amount % 100).abs())
}

// =============================================================================
// Unit Tests
// =============================================================================
