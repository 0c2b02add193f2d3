//! # Printer Provider
//!
//! Lookup seam between the job manager and printer configuration.
//!
//! The registry of printers is owned elsewhere (config, an admin UI);
//! the manager only needs to resolve a department to its printer and
//! report completed tickets back.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use expo_core::{Department, Printer};

// =============================================================================
// Provider Trait
// =============================================================================

/// Resolves printers for the job manager.
#[async_trait]
pub trait PrinterProvider: Send + Sync {
    /// The printer serving a department, active or not.
    /// `None` means no printer is registered at all.
    async fn printer_for(&self, department: Department) -> Option<Printer>;

    /// A printer by id, for re-resolution at execute time.
    async fn printer(&self, printer_id: &str) -> Option<Printer>;

    /// Records a completed ticket against the printer's counters.
    async fn record_print(&self, printer_id: &str, order_id: &str);
}

// =============================================================================
// In-Memory Registry
// =============================================================================

/// Printer registry backed by a shared map. One printer per id;
/// `printer_for` returns the first active match for the department,
/// falling back to any registered one so callers can report a useful
/// "inactive" error instead of "not found".
#[derive(Default)]
pub struct InMemoryPrinterRegistry {
    printers: RwLock<HashMap<String, Printer>>,
}

impl InMemoryPrinterRegistry {
    pub fn new() -> Self {
        InMemoryPrinterRegistry::default()
    }

    /// Adds or replaces a printer.
    pub async fn register(&self, printer: Printer) {
        let mut map = self.printers.write().await;
        map.insert(printer.id.clone(), printer);
    }

    /// Flips a printer's active flag. Returns false if unknown.
    pub async fn set_active(&self, printer_id: &str, active: bool) -> bool {
        let mut map = self.printers.write().await;
        match map.get_mut(printer_id) {
            Some(printer) => {
                printer.is_active = active;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl PrinterProvider for InMemoryPrinterRegistry {
    async fn printer_for(&self, department: Department) -> Option<Printer> {
        let map = self.printers.read().await;
        let mut fallback = None;
        for printer in map.values() {
            if printer.department != department {
                continue;
            }
            if printer.is_active {
                return Some(printer.clone());
            }
            fallback = Some(printer.clone());
        }
        fallback
    }

    async fn printer(&self, printer_id: &str) -> Option<Printer> {
        let map = self.printers.read().await;
        map.get(printer_id).cloned()
    }

    async fn record_print(&self, printer_id: &str, order_id: &str) {
        let mut map = self.printers.write().await;
        if let Some(printer) = map.get_mut(printer_id) {
            printer.record_print(order_id);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_active_printer_preferred() {
        let registry = InMemoryPrinterRegistry::new();
        let mut off = Printer::new("Kitchen Backup", Department::Kitchen);
        off.is_active = false;
        registry.register(off).await;
        registry
            .register(Printer::new("Kitchen Epson", Department::Kitchen))
            .await;

        let found = registry.printer_for(Department::Kitchen).await.unwrap();
        assert!(found.is_active);
        assert_eq!(found.name, "Kitchen Epson");
    }

    #[tokio::test]
    async fn test_inactive_returned_when_nothing_active() {
        let registry = InMemoryPrinterRegistry::new();
        let mut off = Printer::new("Counter Star", Department::Counter);
        off.is_active = false;
        registry.register(off).await;

        let found = registry.printer_for(Department::Counter).await.unwrap();
        assert!(!found.is_active);

        assert!(registry.printer_for(Department::Specialty).await.is_none());
    }

    #[tokio::test]
    async fn test_record_print_updates_counters() {
        let registry = InMemoryPrinterRegistry::new();
        let printer = Printer::new("Kitchen Epson", Department::Kitchen);
        let id = printer.id.clone();
        registry.register(printer).await;

        registry.record_print(&id, "order-1").await;
        let printer = registry.printer(&id).await.unwrap();
        assert_eq!(printer.jobs_printed, 1);
        assert_eq!(printer.last_order_id.as_deref(), Some("order-1"));
    }
}
