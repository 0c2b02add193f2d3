//! # Ticket Payloads
//!
//! The formatted content of one department's ticket for one order.
//!
//! A `TicketPayload` is built once at job creation and is **immutable**
//! afterwards: retries and reprints re-send the same payload; they never
//! re-derive it from live order state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CustomerInfo, Department, LineItem, Printer};

// =============================================================================
// Ticket Line
// =============================================================================

/// One itemized line on a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketLine {
    /// Item name (frozen snapshot from the line item).
    pub name: String,

    /// Quantity.
    pub quantity: i64,

    /// Customization notes, printed indented under the line.
    pub notes: Option<String>,
}

// =============================================================================
// Ticket Payload
// =============================================================================

/// The full formatted content of one department ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketPayload {
    /// Header line ("KITCHEN TICKET").
    pub header: String,

    /// Target department.
    pub department: Department,

    /// Short order reference (first segment of the order UUID).
    pub order_ref: String,

    /// Itemized lines for this department only.
    pub lines: Vec<TicketLine>,

    /// Customer name, if known.
    pub customer_name: Option<String>,

    /// Table number, if dine-in.
    pub table: Option<String>,

    /// Subtotal of this department's lines, in cents.
    pub subtotal_cents: i64,

    /// Tax of this department's lines, in cents.
    pub tax_cents: i64,

    /// Estimated preparation time in minutes (max across this
    /// department's items - the station works lines in parallel).
    pub estimated_prep_minutes: u32,

    /// When the ticket content was built.
    pub created_at: DateTime<Utc>,
}

impl TicketPayload {
    /// Builds a ticket for one department from its routed line items.
    ///
    /// `prep_minutes` maps each line item id to its catalog prep estimate;
    /// missing entries count as zero.
    pub fn build(
        order_id: &str,
        department: Department,
        items: &[&LineItem],
        customer: &CustomerInfo,
        prep_minutes: impl Fn(&LineItem) -> u32,
    ) -> Self {
        let lines = items
            .iter()
            .map(|li| TicketLine {
                name: li.name.clone(),
                quantity: li.quantity,
                notes: li.notes.clone(),
            })
            .collect();

        TicketPayload {
            header: format!("{} TICKET", department.to_string().to_uppercase()),
            department,
            order_ref: short_ref(order_id),
            lines,
            customer_name: customer.name.clone(),
            table: customer.table.clone(),
            subtotal_cents: items.iter().map(|li| li.line_total_cents()).sum(),
            tax_cents: items.iter().map(|li| li.tax_cents).sum(),
            estimated_prep_minutes: items.iter().map(|li| prep_minutes(li)).max().unwrap_or(0),
            created_at: Utc::now(),
        }
    }

    /// Renders the ticket as plain text sized to the printer's paper width.
    ///
    /// The transport sends this text; ESC/POS control sequences, logos and
    /// QR codes are the transport's concern.
    pub fn render(&self, printer: &Printer) -> String {
        let width = printer.paper_width.max(20) as usize;
        let rule = "-".repeat(width);
        let mut out = String::new();

        out.push_str(&center(&self.header, width));
        out.push('\n');
        out.push_str(&format!("Order #{}\n", self.order_ref));
        if let Some(table) = &self.table {
            out.push_str(&format!("Table: {}\n", table));
        }
        if let Some(name) = &self.customer_name {
            out.push_str(&format!("Customer: {}\n", name));
        }
        out.push_str(&rule);
        out.push('\n');

        for line in &self.lines {
            out.push_str(&format!("{} x {}\n", line.quantity, line.name));
            if let Some(notes) = &line.notes {
                out.push_str(&format!("   > {}\n", notes));
            }
        }

        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format!(
            "Subtotal: {}\nTax: {}\n",
            cents(self.subtotal_cents),
            cents(self.tax_cents)
        ));
        if self.estimated_prep_minutes > 0 {
            out.push_str(&format!("Est. prep: {} min\n", self.estimated_prep_minutes));
        }
        out.push_str(&format!(
            "{}\n",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out
    }

    /// Returns true if the ticket has no itemized lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// First UUID segment, enough for staff to match tickets to screens.
fn short_ref(order_id: &str) -> String {
    order_id.split('-').next().unwrap_or(order_id).to_string()
}

fn center(text: &str, width: usize) -> String {
    if text.len() >= width {
        return text.to_string();
    }
    let pad = (width - text.len()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

fn cents(amount: i64) -> String {
    format!("{}.{:02}", amount / 100, (amount % 100).abs())
}

// =============================================================================
// Unit Tests
// =============================================================================
