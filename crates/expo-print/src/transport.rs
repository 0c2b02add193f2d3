//! # Printer Transport
//!
//! The seam between job management and printer hardware.
//!
//! The manager renders a ticket, hands it to the transport, and waits
//! behind a timeout. ESC/POS encoding, logo bitmaps and QR rendering
//! all live behind this trait; the job layer only sees success or a
//! transport error.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use expo_core::{Printer, TicketPayload};

use crate::error::{PrintError, PrintResult};

// =============================================================================
// Transport Trait
// =============================================================================

/// Sends one rendered ticket to one printer.
#[async_trait]
pub trait PrinterTransport: Send + Sync {
    /// Dispatches the ticket. A clean return means the printer
    /// acknowledged all configured copies.
    async fn send(&self, printer: &Printer, ticket: &TicketPayload) -> PrintResult<()>;
}

// =============================================================================
// Simulated Printer
// =============================================================================

/// In-process transport for development and tests.
///
/// Sleeps for a configurable delay per ticket and can be told to fail
/// the next N sends, which is how retry paths get exercised without
/// hardware.
pub struct SimulatedPrinter {
    delay: Duration,
    failures_remaining: AtomicU32,
}

impl SimulatedPrinter {
    /// A simulator that acknowledges after `delay`.
    pub fn new(delay: Duration) -> Self {
        SimulatedPrinter {
            delay,
            failures_remaining: AtomicU32::new(0),
        }
    }

    /// An instant simulator for tests.
    pub fn instant() -> Self {
        SimulatedPrinter::new(Duration::ZERO)
    }

    /// Makes the next `n` sends fail with a transport error.
    pub fn fail_next(&self, n: u32) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    fn take_failure(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl PrinterTransport for SimulatedPrinter {
    async fn send(&self, printer: &Printer, ticket: &TicketPayload) -> PrintResult<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.take_failure() {
            return Err(PrintError::Transport(format!(
                "simulated failure on printer '{}'",
                printer.name
            )));
        }

        let text = ticket.render(printer);
        debug!(
            printer = %printer.name,
            department = %ticket.department,
            copies = printer.copies,
            bytes = text.len(),
            "Simulated ticket printed"
        );
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use expo_core::{CustomerInfo, Department};

    fn ticket() -> TicketPayload {
        TicketPayload::build(
            "a1b2c3d4-0000-0000-0000-000000000000",
            Department::Kitchen,
            &[],
            &CustomerInfo::default(),
            |_| 0,
        )
    }

    #[tokio::test]
    async fn test_instant_send_succeeds() {
        let transport = SimulatedPrinter::instant();
        let printer = Printer::new("Kitchen Epson", Department::Kitchen);
        assert!(transport.send(&printer, &ticket()).await.is_ok());
    }

    #[tokio::test]
    async fn test_injected_failures_then_recovery() {
        let transport = SimulatedPrinter::instant();
        let printer = Printer::new("Kitchen Epson", Department::Kitchen);
        transport.fail_next(2);

        assert!(transport.send(&printer, &ticket()).await.is_err());
        assert!(transport.send(&printer, &ticket()).await.is_err());
        assert!(transport.send(&printer, &ticket()).await.is_ok());
    }
}
