//! # Print Job Manager
//!
//! Owns the job registry and drives jobs through their lifecycle.
//!
//! ## Execution Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        execute(job_id)                                  │
//! │                                                                         │
//! │  1. CLAIM     lock registry, Pending → Printing, snapshot the ticket    │
//! │  2. DISPATCH  registry lock RELEASED; transport send behind a timeout   │
//! │  3. SETTLE    relock; if a cancel raced the dispatch, keep Cancelled;   │
//! │               otherwise record Completed or Failed                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The registry mutex is never held across transport I/O, so a slow
//! printer stalls only its own job. Cancellation is cooperative: an
//! in-flight write is not aborted, but a cancel that lands during the
//! dispatch wins the settle phase and the job stays `Cancelled`.
//!
//! ## Duplicate Prevention
//! At most one *original* job may exist per (order, department); the
//! claim is taken atomically with the registry insert. Extra copies go
//! through the explicit reprint path, which is exempt from the check.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{info, warn};

use expo_core::{Department, LineItem, Order, TicketPayload, DEFAULT_MAX_PRINT_ATTEMPTS};

use crate::error::{PrintError, PrintResult};
use crate::job::{JobState, PrintJob};
use crate::printers::PrinterProvider;
use crate::transport::PrinterTransport;

const DEFAULT_EXECUTE_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Job Registry
// =============================================================================

/// Jobs plus the original-ticket claims, guarded by one mutex so the
/// duplicate check and the insert are a single atomic step.
#[derive(Default)]
struct JobRegistry {
    jobs: HashMap<String, PrintJob>,
    original_claims: HashSet<(String, Department)>,
}

// =============================================================================
// Print Job Manager
// =============================================================================

/// Creates, executes, retries, reprints and cancels print jobs.
pub struct PrintJobManager {
    registry: Mutex<JobRegistry>,
    printers: Arc<dyn PrinterProvider>,
    transport: Arc<dyn PrinterTransport>,
    max_attempts: u32,
    execute_timeout: Duration,
}

impl PrintJobManager {
    /// A manager with the default attempt budget and dispatch timeout.
    pub fn new(printers: Arc<dyn PrinterProvider>, transport: Arc<dyn PrinterTransport>) -> Self {
        PrintJobManager {
            registry: Mutex::new(JobRegistry::default()),
            printers,
            transport,
            max_attempts: DEFAULT_MAX_PRINT_ATTEMPTS,
            execute_timeout: DEFAULT_EXECUTE_TIMEOUT,
        }
    }

    /// Overrides the attempt budget and dispatch timeout.
    pub fn with_limits(mut self, max_attempts: u32, execute_timeout: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.execute_timeout = execute_timeout;
        self
    }

    /// Creates the original pending job for one department of an order.
    ///
    /// Validates that the department has items and an active printer,
    /// freezes the ticket content, and atomically claims the
    /// (order, department) slot. Does not dispatch.
    pub async fn create_job(
        &self,
        order: &Order,
        department: Department,
        prep_minutes: impl Fn(&LineItem) -> u32,
    ) -> PrintResult<PrintJob> {
        let items = order.items_for_department(department);
        if items.is_empty() {
            return Err(PrintError::EmptyTicket {
                order_id: order.id.clone(),
                department,
            });
        }

        let printer =
            self.printers
                .printer_for(department)
                .await
                .ok_or(PrintError::PrinterNotFound { department })?;
        if !printer.is_active {
            return Err(PrintError::PrinterInactive {
                printer_id: printer.id.clone(),
                name: printer.name.clone(),
            });
        }

        let ticket =
            TicketPayload::build(&order.id, department, &items, &order.customer, prep_minutes);
        let job = PrintJob::new(&order.id, department, &printer.id, ticket);

        let mut registry = self.registry.lock().await;
        let claim = (order.id.clone(), department);
        if registry.original_claims.contains(&claim) {
            return Err(PrintError::DuplicateJob {
                order_id: order.id.clone(),
                department,
            });
        }
        registry.original_claims.insert(claim);
        registry.jobs.insert(job.id.clone(), job.clone());

        info!(
            job_id = %job.id,
            order_id = %order.id,
            department = %department,
            printer = %printer.name,
            "Print job created"
        );
        Ok(job)
    }

    /// Dispatches a pending job to its printer and settles the outcome.
    ///
    /// Returns the job's state after the settle phase. Transport
    /// failures and timeouts settle as `Failed` with the detail on the
    /// job; only caller mistakes (unknown job, illegal state) are `Err`.
    pub async fn execute(&self, job_id: &str) -> PrintResult<JobState> {
        // Claim phase: move to Printing and snapshot what dispatch needs.
        let (ticket, printer_id, order_id, attempt) = {
            let mut registry = self.registry.lock().await;
            let job = registry
                .jobs
                .get_mut(job_id)
                .ok_or_else(|| PrintError::JobNotFound {
                    job_id: job_id.to_string(),
                })?;
            job.begin_printing()?;
            (
                job.ticket.clone(),
                job.printer_id.clone(),
                job.order_id.clone(),
                job.attempts,
            )
        };

        // Dispatch phase: no registry lock held.
        let outcome = match self.printers.printer(&printer_id).await {
            None => Err(PrintError::Transport(format!(
                "printer {} no longer registered",
                printer_id
            ))),
            Some(printer) => {
                match timeout(self.execute_timeout, self.transport.send(&printer, &ticket)).await {
                    Ok(result) => result,
                    Err(_) => Err(PrintError::Timeout(self.execute_timeout.as_secs())),
                }
            }
        };

        // Settle phase.
        let mut registry = self.registry.lock().await;
        let job = registry
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| PrintError::JobNotFound {
                job_id: job_id.to_string(),
            })?;

        // A cancel that landed during dispatch wins. The hardware may
        // still have printed; the state machine stays Cancelled.
        if job.state() == JobState::Cancelled {
            warn!(job_id = %job_id, "Job cancelled while dispatching, outcome discarded");
            return Ok(JobState::Cancelled);
        }

        match outcome {
            Ok(()) => {
                job.complete()?;
                drop(registry);
                self.printers.record_print(&printer_id, &order_id).await;
                info!(job_id = %job_id, attempt, "Ticket printed");
                Ok(JobState::Completed)
            }
            Err(err) => {
                job.fail(&err.to_string())?;
                warn!(
                    job_id = %job_id,
                    attempt,
                    max_attempts = self.max_attempts,
                    error = %err,
                    "Print attempt failed"
                );
                Ok(JobState::Failed)
            }
        }
    }

    /// Retries a failed job if its attempt budget allows, then executes.
    pub async fn retry(&self, job_id: &str) -> PrintResult<JobState> {
        {
            let mut registry = self.registry.lock().await;
            let job = registry
                .jobs
                .get_mut(job_id)
                .ok_or_else(|| PrintError::JobNotFound {
                    job_id: job_id.to_string(),
                })?;
            job.prepare_retry(self.max_attempts)?;
        }
        self.execute(job_id).await
    }

    /// Derives a reprint from a finished job, registers it, and
    /// executes it. Returns the reprint's post-dispatch snapshot.
    pub async fn reprint(&self, job_id: &str) -> PrintResult<PrintJob> {
        let reprint = {
            let mut registry = self.registry.lock().await;
            let original =
                registry
                    .jobs
                    .get(job_id)
                    .ok_or_else(|| PrintError::JobNotFound {
                        job_id: job_id.to_string(),
                    })?;
            let reprint = original.derive_reprint()?;
            registry.jobs.insert(reprint.id.clone(), reprint.clone());
            reprint
        };

        info!(
            job_id = %reprint.id,
            original = %job_id,
            order_id = %reprint.order_id,
            "Reprint job created"
        );
        self.execute(&reprint.id).await?;
        self.job(&reprint.id)
            .await
            .ok_or_else(|| PrintError::JobNotFound {
                job_id: reprint.id.clone(),
            })
    }

    /// Cancels a job that has not finished.
    pub async fn cancel(&self, job_id: &str) -> PrintResult<()> {
        let mut registry = self.registry.lock().await;
        let job = registry
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| PrintError::JobNotFound {
                job_id: job_id.to_string(),
            })?;
        job.cancel()?;
        info!(job_id = %job_id, "Print job cancelled");
        Ok(())
    }

    /// Snapshot of one job.
    pub async fn job(&self, job_id: &str) -> Option<PrintJob> {
        let registry = self.registry.lock().await;
        registry.jobs.get(job_id).cloned()
    }

    /// Snapshots of every job belonging to an order.
    pub async fn jobs_for_order(&self, order_id: &str) -> Vec<PrintJob> {
        let registry = self.registry.lock().await;
        registry
            .jobs
            .values()
            .filter(|job| job.order_id == order_id)
            .cloned()
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printers::InMemoryPrinterRegistry;
    use crate::transport::SimulatedPrinter;
    use expo_core::{CustomerInfo, Printer};

    fn routed_order() -> Order {
        let mut burger = LineItem::new("cat-burger", "Burger", 2, 899);
        burger.assign_department(Department::Kitchen).unwrap();
        let mut cola = LineItem::new("cat-cola", "Cola", 1, 250);
        cola.assign_department(Department::Counter).unwrap();
        Order::new(vec![burger, cola], CustomerInfo::default())
    }

    async fn manager_with(
        transport: Arc<SimulatedPrinter>,
    ) -> (PrintJobManager, Arc<InMemoryPrinterRegistry>) {
        let registry = Arc::new(InMemoryPrinterRegistry::new());
        registry
            .register(Printer::new("Kitchen Epson", Department::Kitchen))
            .await;
        registry
            .register(Printer::new("Counter Star", Department::Counter))
            .await;
        let manager = PrintJobManager::new(registry.clone(), transport);
        (manager, registry)
    }

    #[tokio::test]
    async fn test_create_and_execute() {
        let (manager, registry) = manager_with(Arc::new(SimulatedPrinter::instant())).await;
        let order = routed_order();

        let job = manager
            .create_job(&order, Department::Kitchen, |_| 5)
            .await
            .unwrap();
        assert_eq!(job.state(), JobState::Pending);
        assert_eq!(job.ticket.lines.len(), 1);

        let state = manager.execute(&job.id).await.unwrap();
        assert_eq!(state, JobState::Completed);

        let job = manager.job(&job.id).await.unwrap();
        assert_eq!(job.attempts, 1);

        let printer = registry.printer(&job.printer_id).await.unwrap();
        assert_eq!(printer.jobs_printed, 1);
        assert_eq!(printer.last_order_id.as_deref(), Some(order.id.as_str()));
    }

    #[tokio::test]
    async fn test_duplicate_original_rejected_per_department() {
        let (manager, _) = manager_with(Arc::new(SimulatedPrinter::instant())).await;
        let order = routed_order();

        manager
            .create_job(&order, Department::Kitchen, |_| 0)
            .await
            .unwrap();
        let err = manager
            .create_job(&order, Department::Kitchen, |_| 0)
            .await
            .unwrap_err();
        assert!(matches!(err, PrintError::DuplicateJob { .. }));

        // A different department of the same order is its own slot
        manager
            .create_job(&order, Department::Counter, |_| 0)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_no_items_no_ticket() {
        let (manager, _) = manager_with(Arc::new(SimulatedPrinter::instant())).await;
        let order = routed_order();

        let err = manager
            .create_job(&order, Department::Specialty, |_| 0)
            .await
            .unwrap_err();
        assert!(matches!(err, PrintError::EmptyTicket { .. }));
    }

    #[tokio::test]
    async fn test_inactive_printer_rejected_at_creation() {
        let (manager, registry) = manager_with(Arc::new(SimulatedPrinter::instant())).await;
        let order = routed_order();

        let printer = registry.printer_for(Department::Kitchen).await.unwrap();
        registry.set_active(&printer.id, false).await;

        let err = manager
            .create_job(&order, Department::Kitchen, |_| 0)
            .await
            .unwrap_err();
        assert!(matches!(err, PrintError::PrinterInactive { .. }));
    }

    #[tokio::test]
    async fn test_two_failures_then_success_within_budget() {
        let transport = Arc::new(SimulatedPrinter::instant());
        let (manager, _) = manager_with(transport.clone()).await;
        let order = routed_order();

        transport.fail_next(2);
        let job = manager
            .create_job(&order, Department::Kitchen, |_| 0)
            .await
            .unwrap();

        assert_eq!(manager.execute(&job.id).await.unwrap(), JobState::Failed);
        assert_eq!(manager.retry(&job.id).await.unwrap(), JobState::Failed);
        assert_eq!(manager.retry(&job.id).await.unwrap(), JobState::Completed);

        let job = manager.job(&job.id).await.unwrap();
        assert_eq!(job.attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted_after_max_attempts() {
        let transport = Arc::new(SimulatedPrinter::instant());
        let (manager, _) = manager_with(transport.clone()).await;
        let order = routed_order();

        transport.fail_next(10);
        let job = manager
            .create_job(&order, Department::Kitchen, |_| 0)
            .await
            .unwrap();

        manager.execute(&job.id).await.unwrap();
        manager.retry(&job.id).await.unwrap();
        manager.retry(&job.id).await.unwrap();

        let err = manager.retry(&job.id).await.unwrap_err();
        assert!(matches!(err, PrintError::RetryExhausted { .. }));

        let job = manager.job(&job.id).await.unwrap();
        assert_eq!(job.state(), JobState::Failed);
        assert_eq!(job.attempts, 3);
        assert!(job.last_error.is_some());
    }

    #[tokio::test]
    async fn test_reprint_after_completion() {
        let (manager, _) = manager_with(Arc::new(SimulatedPrinter::instant())).await;
        let order = routed_order();

        let original = manager
            .create_job(&order, Department::Kitchen, |_| 0)
            .await
            .unwrap();
        manager.execute(&original.id).await.unwrap();

        let reprint = manager.reprint(&original.id).await.unwrap();
        assert_ne!(reprint.id, original.id);
        assert_eq!(reprint.state(), JobState::Completed);
        assert_eq!(reprint.ticket, original.ticket);

        assert_eq!(manager.jobs_for_order(&order.id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_pending_job() {
        let (manager, _) = manager_with(Arc::new(SimulatedPrinter::instant())).await;
        let order = routed_order();

        let job = manager
            .create_job(&order, Department::Kitchen, |_| 0)
            .await
            .unwrap();
        manager.cancel(&job.id).await.unwrap();

        let err = manager.execute(&job.id).await.unwrap_err();
        assert!(matches!(err, PrintError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_cancel_during_dispatch_wins_the_settle() {
        let transport = Arc::new(SimulatedPrinter::new(Duration::from_millis(100)));
        let registry = Arc::new(InMemoryPrinterRegistry::new());
        registry
            .register(Printer::new("Kitchen Epson", Department::Kitchen))
            .await;
        let manager = Arc::new(PrintJobManager::new(registry, transport));
        let order = routed_order();

        let job = manager
            .create_job(&order, Department::Kitchen, |_| 0)
            .await
            .unwrap();

        let exec = {
            let manager = manager.clone();
            let job_id = job.id.clone();
            tokio::spawn(async move { manager.execute(&job_id).await })
        };

        // Let the dispatch start, then cancel mid-flight.
        tokio::time::sleep(Duration::from_millis(20)).await;
        manager.cancel(&job.id).await.unwrap();

        let state = exec.await.unwrap().unwrap();
        assert_eq!(state, JobState::Cancelled);
        assert_eq!(
            manager.job(&job.id).await.unwrap().state(),
            JobState::Cancelled
        );
    }

    #[tokio::test]
    async fn test_timeout_settles_as_failed() {
        let transport = Arc::new(SimulatedPrinter::new(Duration::from_millis(200)));
        let registry = Arc::new(InMemoryPrinterRegistry::new());
        registry
            .register(Printer::new("Kitchen Epson", Department::Kitchen))
            .await;
        let manager = PrintJobManager::new(registry, transport)
            .with_limits(3, Duration::from_millis(20));
        let order = routed_order();

        let job = manager
            .create_job(&order, Department::Kitchen, |_| 0)
            .await
            .unwrap();
        assert_eq!(manager.execute(&job.id).await.unwrap(), JobState::Failed);

        let job = manager.job(&job.id).await.unwrap();
        assert!(job.last_error.unwrap().contains("did not complete"));
    }
}
