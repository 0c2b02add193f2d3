//! # Print Error Types

use expo_core::Department;
use thiserror::Error;

use crate::job::JobState;

/// Result type alias for print operations.
pub type PrintResult<T> = Result<T, PrintError>;

/// Print pipeline failures.
///
/// ## Design Principles
/// - Transport-level failures (I/O, timeout) are retryable; everything
///   else is a caller mistake or a configuration problem.
/// - A department's print failure is isolated: it never aborts the
///   order or the other departments' tickets.
#[derive(Debug, Clone, Error)]
pub enum PrintError {
    /// No printer is registered for the department.
    #[error("No printer registered for department {department}")]
    PrinterNotFound { department: Department },

    /// The department's printer exists but is switched off.
    #[error("Printer '{name}' ({printer_id}) is inactive")]
    PrinterInactive { printer_id: String, name: String },

    /// An original ticket for this (order, department) already exists.
    /// Reprints must go through the explicit reprint path.
    #[error("Original ticket for order {order_id} / {department} already exists")]
    DuplicateJob {
        order_id: String,
        department: Department,
    },

    /// No job with this id in the registry.
    #[error("Print job {job_id} not found")]
    JobNotFound { job_id: String },

    /// The requested action is not legal from the job's current state.
    #[error("Job {job_id} cannot {action} from state {state}")]
    InvalidTransition {
        job_id: String,
        state: JobState,
        action: &'static str,
    },

    /// The job has exhausted its attempt budget.
    #[error("Job {job_id} exhausted retries ({attempts}/{max_attempts})")]
    RetryExhausted {
        job_id: String,
        attempts: u32,
        max_attempts: u32,
    },

    /// The department has no line items, so there is nothing to print.
    #[error("Order {order_id} has no items for department {department}")]
    EmptyTicket {
        order_id: String,
        department: Department,
    },

    /// The printer hardware (or its simulation) rejected the ticket.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The printer did not acknowledge within the configured window.
    #[error("Print did not complete within {0} seconds")]
    Timeout(u64),
}

impl PrintError {
    /// Returns true if retrying the same job may succeed.
    ///
    /// Only transport-level failures qualify; state machine and
    /// configuration errors will fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PrintError::Transport(_) | PrintError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_categorization() {
        assert!(PrintError::Transport("paper jam".into()).is_retryable());
        assert!(PrintError::Timeout(10).is_retryable());
        assert!(!PrintError::PrinterNotFound {
            department: Department::Kitchen
        }
        .is_retryable());
        assert!(!PrintError::DuplicateJob {
            order_id: "o-1".into(),
            department: Department::Counter,
        }
        .is_retryable());
    }
}
