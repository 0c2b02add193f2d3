//! # Print Job State Machine
//!
//! One job is one attempt-tracked dispatch of a ticket to a printer.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Print Job Lifecycle                              │
//! │                                                                         │
//! │            begin_printing            complete                           │
//! │  Pending ──────────────────► Printing ─────────► Completed (terminal)   │
//! │     ▲                           │                                       │
//! │     │ prepare_retry             │ fail                                  │
//! │     │ (attempts < max)          ▼                                       │
//! │     └──────────────────────── Failed ──── (attempts == max: stuck,      │
//! │                                            reprint is the only exit)    │
//! │                                                                         │
//! │  Pending / Printing ────cancel────► Cancelled (terminal)                │
//! │                                                                         │
//! │  Completed / Failed ──derive_reprint──► fresh job (attempts reset)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `attempts` counts entries into `Printing`. A retry does not reset it;
//! a reprint is a brand-new job with its own budget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use expo_core::{Department, TicketPayload};

use crate::error::{PrintError, PrintResult};

// =============================================================================
// Job State & Type
// =============================================================================

/// Where a job sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Printing,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    /// Returns true if no further transitions are allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Cancelled)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Pending => write!(f, "pending"),
            JobState::Printing => write!(f, "printing"),
            JobState::Completed => write!(f, "completed"),
            JobState::Failed => write!(f, "failed"),
            JobState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Whether the job is the original ticket or an operator reprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Original,
    Reprint,
}

// =============================================================================
// Print Job
// =============================================================================

/// One ticket dispatch, with its attempt history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintJob {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Order this ticket belongs to.
    pub order_id: String,

    /// Department whose items are on the ticket.
    pub department: Department,

    /// Printer the ticket is dispatched to.
    pub printer_id: String,

    /// Frozen ticket content. Retries and reprints re-send this
    /// payload; they never re-derive it from live order state.
    pub ticket: TicketPayload,

    /// Original or reprint.
    pub job_type: JobType,

    /// Current lifecycle state. Mutated only through the guarded
    /// transition methods.
    state: JobState,

    /// Number of entries into `Printing`.
    pub attempts: u32,

    /// Detail of the most recent failure, if any.
    pub last_error: Option<String>,

    /// When the job was created.
    pub created_at: DateTime<Utc>,

    /// When the job last entered `Printing`.
    pub started_at: Option<DateTime<Utc>>,

    /// When the job reached `Completed`.
    pub completed_at: Option<DateTime<Utc>>,
}

impl PrintJob {
    /// Creates a new pending original job.
    pub fn new(
        order_id: &str,
        department: Department,
        printer_id: &str,
        ticket: TicketPayload,
    ) -> Self {
        PrintJob {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            department,
            printer_id: printer_id.to_string(),
            ticket,
            job_type: JobType::Original,
            state: JobState::Pending,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Moves `Pending → Printing` and counts the attempt.
    pub fn begin_printing(&mut self) -> PrintResult<()> {
        if self.state != JobState::Pending {
            return Err(self.invalid("begin printing"));
        }
        self.state = JobState::Printing;
        self.attempts += 1;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Moves `Printing → Completed`.
    pub fn complete(&mut self) -> PrintResult<()> {
        if self.state != JobState::Printing {
            return Err(self.invalid("complete"));
        }
        self.state = JobState::Completed;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Moves `Printing → Failed`, recording the failure detail.
    pub fn fail(&mut self, detail: &str) -> PrintResult<()> {
        if self.state != JobState::Printing {
            return Err(self.invalid("fail"));
        }
        self.state = JobState::Failed;
        self.last_error = Some(detail.to_string());
        Ok(())
    }

    /// Cancels a job that has not finished.
    ///
    /// Legal from `Pending` and `Printing`. A cancel racing an in-flight
    /// transport write does not abort the hardware; the executor observes
    /// the cancellation afterwards and leaves the state as `Cancelled`.
    pub fn cancel(&mut self) -> PrintResult<()> {
        if !matches!(self.state, JobState::Pending | JobState::Printing) {
            return Err(self.invalid("cancel"));
        }
        self.state = JobState::Cancelled;
        Ok(())
    }

    /// Returns true if a retry is currently allowed.
    pub fn can_retry(&self, max_attempts: u32) -> bool {
        self.state == JobState::Failed && self.attempts < max_attempts
    }

    /// Moves `Failed → Pending` for another attempt.
    ///
    /// The attempt counter carries over; it increments again when the
    /// retry enters `Printing`.
    pub fn prepare_retry(&mut self, max_attempts: u32) -> PrintResult<()> {
        if self.state != JobState::Failed {
            return Err(self.invalid("retry"));
        }
        if self.attempts >= max_attempts {
            return Err(PrintError::RetryExhausted {
                job_id: self.id.clone(),
                attempts: self.attempts,
                max_attempts,
            });
        }
        self.state = JobState::Pending;
        Ok(())
    }

    /// Derives a fresh reprint job carrying the same frozen ticket.
    ///
    /// Only finished work may be reprinted: `Completed` (operator wants
    /// another copy) or `Failed` with retries exhausted (fresh budget).
    pub fn derive_reprint(&self) -> PrintResult<PrintJob> {
        if !matches!(self.state, JobState::Completed | JobState::Failed) {
            return Err(self.invalid("reprint"));
        }
        Ok(PrintJob {
            id: Uuid::new_v4().to_string(),
            order_id: self.order_id.clone(),
            department: self.department,
            printer_id: self.printer_id.clone(),
            ticket: self.ticket.clone(),
            job_type: JobType::Reprint,
            state: JobState::Pending,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        })
    }

    fn invalid(&self, action: &'static str) -> PrintError {
        PrintError::InvalidTransition {
            job_id: self.id.clone(),
            state: self.state,
            action,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use expo_core::CustomerInfo;

    fn job() -> PrintJob {
        let ticket = TicketPayload::build(
            "a1b2c3d4-0000-0000-0000-000000000000",
            Department::Kitchen,
            &[],
            &CustomerInfo::default(),
            |_| 0,
        );
        PrintJob::new(
            "a1b2c3d4-0000-0000-0000-000000000000",
            Department::Kitchen,
            "printer-1",
            ticket,
        )
    }

    #[test]
    fn test_happy_path() {
        let mut job = job();
        assert_eq!(job.state(), JobState::Pending);

        job.begin_printing().unwrap();
        assert_eq!(job.state(), JobState::Printing);
        assert_eq!(job.attempts, 1);

        job.complete().unwrap();
        assert_eq!(job.state(), JobState::Completed);
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn test_complete_requires_printing() {
        let mut job = job();
        let err = job.complete().unwrap_err();
        assert!(matches!(err, PrintError::InvalidTransition { .. }));
    }

    #[test]
    fn test_retry_carries_attempt_count() {
        let mut job = job();

        job.begin_printing().unwrap();
        job.fail("paper jam").unwrap();
        assert!(job.can_retry(3));

        job.prepare_retry(3).unwrap();
        job.begin_printing().unwrap();
        assert_eq!(job.attempts, 2);
        assert_eq!(job.last_error.as_deref(), Some("paper jam"));
    }

    #[test]
    fn test_retry_budget_exhausted() {
        let mut job = job();
        for _ in 0..3 {
            job.prepare_retry(3).ok();
            job.begin_printing().unwrap();
            job.fail("offline").unwrap();
        }
        assert_eq!(job.attempts, 3);
        assert!(!job.can_retry(3));

        let err = job.prepare_retry(3).unwrap_err();
        assert!(matches!(err, PrintError::RetryExhausted { .. }));
    }

    #[test]
    fn test_cancel_only_before_finish() {
        let mut job = job();
        job.cancel().unwrap();
        assert_eq!(job.state(), JobState::Cancelled);

        // Terminal: nothing moves a cancelled job
        assert!(job.begin_printing().is_err());
        assert!(job.cancel().is_err());
    }

    #[test]
    fn test_cancelled_job_cannot_retry_or_reprint() {
        let mut job = job();
        job.cancel().unwrap();
        assert!(!job.can_retry(3));
        assert!(job.derive_reprint().is_err());
    }

    #[test]
    fn test_reprint_resets_budget_and_keeps_ticket() {
        let mut job = job();
        job.begin_printing().unwrap();
        job.complete().unwrap();

        let reprint = job.derive_reprint().unwrap();
        assert_ne!(reprint.id, job.id);
        assert_eq!(reprint.job_type, JobType::Reprint);
        assert_eq!(reprint.state(), JobState::Pending);
        assert_eq!(reprint.attempts, 0);
        assert_eq!(reprint.ticket, job.ticket);
    }

    #[test]
    fn test_reprint_requires_finished_job() {
        let job = job();
        // Still pending: nothing to reprint yet
        assert!(job.derive_reprint().is_err());
    }
}
