//! # Order Orchestrator
//!
//! The single entry point that takes an order from intake to tickets
//! and notifications.
//!
//! ## Placement Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          place_order                                    │
//! │                                                                         │
//! │  1. VALIDATE   payload rules + stock sufficiency     HARD STOP          │
//! │  2. PERSIST    order saved as Confirmed                                 │
//! │  3. CONSUME    per-ingredient atomic decrement        SOFT (reported)   │
//! │  4. ROUTE      category → department per line item                      │
//! │  5. PRINT      one job per department, retried to     ISOLATED          │
//! │                budget, failures notified                                │
//! │  6. NOTIFY     order_placed to departments + admins                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Past step 2 the order exists no matter what: stock races, printer
//! outages and delivery failures degrade into notifications and report
//! entries, never into a lost order.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use expo_core::{
    CoreError, CustomerInfo, Department, DepartmentStatus, LineItem, Order, OrderStatus,
    ValidationError,
};
use expo_inventory::{CatalogProvider, ConsumptionEngine};
use expo_notify::{producers, NotificationHub};
use expo_print::{DepartmentRouter, JobState, PrintError, PrintJob, PrintJobManager};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::store::OrderStore;

// =============================================================================
// Placement Report
// =============================================================================

/// What actually happened while placing an order.
///
/// A report with soft errors is still a placed order; the entries tell
/// the operator what degraded (stock races, dead printers).
#[derive(Debug)]
pub struct PlacementReport {
    /// The placed order's id.
    pub order_id: String,

    /// Non-fatal problems encountered after the order was persisted.
    pub soft_errors: Vec<String>,

    /// Post-dispatch snapshots of the created print jobs.
    pub jobs: Vec<PrintJob>,

    /// Sessions the order_placed notification reached.
    pub notified: usize,
}

impl PlacementReport {
    /// Returns true when nothing degraded.
    pub fn is_clean(&self) -> bool {
        self.soft_errors.is_empty()
            && self.jobs.iter().all(|j| j.state() == JobState::Completed)
    }
}

// =============================================================================
// Order Orchestrator
// =============================================================================

/// Coordinates the subsystem crates for order placement and lifecycle.
pub struct OrderOrchestrator {
    store: Arc<dyn OrderStore>,
    consumption: Arc<ConsumptionEngine>,
    catalog: Arc<dyn CatalogProvider>,
    router: Arc<DepartmentRouter>,
    print: Arc<PrintJobManager>,
    hub: Arc<NotificationHub>,
}

impl OrderOrchestrator {
    pub fn new(
        store: Arc<dyn OrderStore>,
        consumption: Arc<ConsumptionEngine>,
        catalog: Arc<dyn CatalogProvider>,
        router: Arc<DepartmentRouter>,
        print: Arc<PrintJobManager>,
        hub: Arc<NotificationHub>,
    ) -> Self {
        OrderOrchestrator {
            store,
            consumption,
            catalog,
            router,
            print,
            hub,
        }
    }

    /// The notification hub, for wiring client connections.
    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    // =========================================================================
    // place_order
    // =========================================================================

    /// Places an order. Rejected orders leave no trace; placed orders
    /// survive every downstream failure.
    pub async fn place_order(
        &self,
        line_items: Vec<LineItem>,
        customer: CustomerInfo,
    ) -> OrchestratorResult<PlacementReport> {
        // Payload rules, then stock sufficiency. Both are hard stops
        // and nothing has been written yet.
        validate_payload(&line_items)?;
        let stock_report = self.consumption.validate(&line_items).await;
        if !stock_report.valid {
            info!(
                shortages = stock_report.errors.len(),
                "Order rejected for insufficient stock"
            );
            return Err(OrchestratorError::RejectedInsufficientStock {
                shortages: stock_report.errors,
            });
        }

        let mut order = Order::new(line_items, customer);
        order.transition_to(OrderStatus::Confirmed)?;
        self.store.save(order.clone()).await?;
        info!(order_id = %order.id, total_cents = order.total_cents, "Order confirmed");

        // Consume stock. The validate/consume race is real (another
        // order may have drained the ledger in between); consume's own
        // atomic check catches it and the failure is soft.
        let outcome = self.consumption.consume(&order).await;
        let mut soft_errors: Vec<String> =
            outcome.errors.iter().map(|e| e.to_string()).collect();

        // Route every line item to its department.
        let prep = self.route_items(&mut order, &mut soft_errors).await;

        // One ticket per department, each isolated from the others.
        let mut jobs = Vec::new();
        for department in order.departments() {
            match self.dispatch_ticket(&order, department, &prep).await {
                Ok(job) => {
                    if job.state() == JobState::Failed {
                        soft_errors.push(format!(
                            "ticket for {} failed: {}",
                            department,
                            job.last_error.as_deref().unwrap_or("unknown")
                        ));
                    }
                    jobs.push(job);
                }
                Err(err) => {
                    warn!(
                        order_id = %order.id,
                        department = %department,
                        error = %err,
                        "Ticket dispatch skipped"
                    );
                    soft_errors.push(format!("ticket for {} skipped: {}", department, err));
                    let failure =
                        producers::print_failure(&order.id, department, &err.to_string());
                    if let Err(publish_err) = self.hub.publish(failure).await {
                        warn!(
                            order_id = %order.id,
                            error = %publish_err,
                            "Print failure notification not delivered"
                        );
                    }
                }
            }
        }

        // Persist routing assignments made after the first save. The
        // order already exists from step 2; a failure here degrades to
        // a report entry, it never unwinds the placement.
        if let Err(err) = self.store.save(order.clone()).await {
            warn!(order_id = %order.id, error = %err, "Post-routing save failed");
            soft_errors.push(format!("order update not saved: {}", err));
        }

        let notified = match self.hub.publish(producers::order_placed(&order)).await {
            Ok(count) => count,
            Err(err) => {
                warn!(order_id = %order.id, error = %err, "Order notification failed");
                soft_errors.push(format!("order notification failed: {}", err));
                0
            }
        };
        info!(
            order_id = %order.id,
            jobs = jobs.len(),
            soft_errors = soft_errors.len(),
            notified,
            "Order placed"
        );

        Ok(PlacementReport {
            order_id: order.id,
            soft_errors,
            jobs,
            notified,
        })
    }

    /// Assigns a department to every line item and collects prep
    /// estimates for the tickets. Items whose catalog entry vanished
    /// route like an unmapped category. Runs after persistence, so
    /// routing problems land in `soft_errors` instead of failing the
    /// placement.
    async fn route_items(
        &self,
        order: &mut Order,
        soft_errors: &mut Vec<String>,
    ) -> HashMap<String, u32> {
        let mut prep = HashMap::new();
        for item in order.line_items.iter_mut() {
            let category = match self.catalog.catalog_item(&item.catalog_item_id).await {
                Some(entry) => {
                    prep.insert(entry.id.clone(), entry.prep_minutes);
                    entry.category
                }
                None => {
                    warn!(
                        catalog_item_id = %item.catalog_item_id,
                        name = %item.name,
                        "Line item references unknown catalog entry"
                    );
                    String::new()
                }
            };
            let routed = self.router.route(&category);
            if let Err(err) = item.assign_department(routed.department) {
                warn!(
                    name = %item.name,
                    department = %routed.department,
                    error = %err,
                    "Department assignment failed"
                );
                soft_errors.push(format!("routing for {} failed: {}", item.name, err));
            }
        }
        prep
    }

    /// Creates and executes one department's print job, retrying
    /// within the attempt budget. Returns the final job snapshot.
    async fn dispatch_ticket(
        &self,
        order: &Order,
        department: Department,
        prep: &HashMap<String, u32>,
    ) -> OrchestratorResult<PrintJob> {
        let job = self
            .print
            .create_job(order, department, |li| {
                prep.get(&li.catalog_item_id).copied().unwrap_or(0)
            })
            .await?;

        let mut state = self.print.execute(&job.id).await?;
        while state == JobState::Failed {
            match self.print.retry(&job.id).await {
                Ok(next) => state = next,
                Err(PrintError::RetryExhausted { .. }) => break,
                Err(err) => return Err(err.into()),
            }
        }

        let snapshot = self
            .print
            .job(&job.id)
            .await
            .ok_or(PrintError::JobNotFound { job_id: job.id })?;

        if snapshot.state() == JobState::Failed {
            let detail = snapshot.last_error.as_deref().unwrap_or("unknown");
            let failure = producers::print_failure(&order.id, department, detail);
            if let Err(err) = self.hub.publish(failure).await {
                warn!(
                    order_id = %order.id,
                    error = %err,
                    "Print failure notification not delivered"
                );
            }
        }
        Ok(snapshot)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Advances one department's status and recomputes the overall
    /// order status from the department floor.
    pub async fn update_department_status(
        &self,
        order_id: &str,
        department: Department,
        status: DepartmentStatus,
    ) -> OrchestratorResult<Order> {
        let mut order = self
            .store
            .get(order_id)
            .await
            .ok_or_else(|| OrchestratorError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;

        order.advance_department(department, status)?;

        // Overall status follows the slowest department.
        let target = if order.all_departments_at_least(DepartmentStatus::Served) {
            OrderStatus::Delivered
        } else if order.all_departments_at_least(DepartmentStatus::Ready) {
            OrderStatus::Ready
        } else {
            OrderStatus::Preparing
        };

        if order.status() != target && order.status().can_transition_to(target) {
            order.transition_to(target)?;
            info!(order_id = %order.id, status = %target, "Order status advanced");
            self.hub
                .publish(producers::order_status_changed(&order, target))
                .await?;
        }

        self.store.save(order.clone()).await?;
        Ok(order)
    }

    /// Cancels an order and any of its print jobs that have not
    /// finished. Consumed stock is not restored; returns go through
    /// an explicit restock.
    pub async fn cancel_order(&self, order_id: &str) -> OrchestratorResult<Order> {
        let mut order = self
            .store
            .get(order_id)
            .await
            .ok_or_else(|| OrchestratorError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;

        order.transition_to(OrderStatus::Cancelled)?;

        for job in self.print.jobs_for_order(order_id).await {
            if matches!(job.state(), JobState::Pending | JobState::Printing) {
                if let Err(err) = self.print.cancel(&job.id).await {
                    // A job finishing concurrently is fine
                    warn!(job_id = %job.id, error = %err, "Cancel skipped");
                }
            }
        }

        self.store.save(order.clone()).await?;
        self.hub
            .publish(producers::order_status_changed(&order, OrderStatus::Cancelled))
            .await?;
        info!(order_id = %order.id, "Order cancelled");
        Ok(order)
    }

    /// Fetches one order.
    pub async fn order(&self, order_id: &str) -> Option<Order> {
        self.store.get(order_id).await
    }

    /// Orders still in flight, for the coordination screens.
    pub async fn active_orders(&self) -> Vec<Order> {
        self.store.active().await
    }
}

/// Intake payload rules: at least one line, positive quantities,
/// non-negative money.
fn validate_payload(line_items: &[LineItem]) -> OrchestratorResult<()> {
    if line_items.is_empty() {
        return Err(CoreError::from(ValidationError::EmptyOrder).into());
    }
    for item in line_items {
        if item.quantity <= 0 {
            return Err(CoreError::from(ValidationError::NonPositiveQuantity {
                line_item: item.name.clone(),
                quantity: item.quantity,
            })
            .into());
        }
        if item.unit_price_cents < 0 {
            return Err(CoreError::from(ValidationError::NegativeAmount {
                field: format!("unit price of {}", item.name),
                cents: item.unit_price_cents,
            })
            .into());
        }
        if item.name.trim().is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "line item name".to_string(),
            })
            .into());
        }
    }
    Ok(())
}
