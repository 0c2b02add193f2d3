//! # Department Router
//!
//! Maps catalog categories to fulfillment departments.
//!
//! Routing is a pure table lookup. Categories without a mapping fall
//! back to the kitchen, but the fallback is observable: each routed
//! result is tagged and a counter tracks how often the default fired,
//! so a misconfigured menu shows up in logs and dashboards instead of
//! silently flooding the kitchen printer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use expo_core::Department;

// =============================================================================
// Routed Department
// =============================================================================

/// Routing result for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutedDepartment {
    /// The department the category resolved to.
    pub department: Department,

    /// True when no mapping existed and the kitchen default was used.
    pub was_defaulted: bool,
}

// =============================================================================
// Department Router
// =============================================================================

/// Category → department lookup table.
///
/// The table is fixed at construction; routing itself takes `&self`
/// and is safe to share across tasks.
pub struct DepartmentRouter {
    table: HashMap<String, Department>,
    defaulted: AtomicU64,
}

impl DepartmentRouter {
    /// Builds a router from a category → department table.
    ///
    /// Category keys are normalized to lowercase so config files can
    /// write `"Drinks"` or `"drinks"` interchangeably.
    pub fn new(table: HashMap<String, Department>) -> Self {
        let table = table
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        DepartmentRouter {
            table,
            defaulted: AtomicU64::new(0),
        }
    }

    /// A router with the stock mapping used by most stores.
    pub fn standard() -> Self {
        let mut table = HashMap::new();
        table.insert("food".to_string(), Department::Kitchen);
        table.insert("mains".to_string(), Department::Kitchen);
        table.insert("sides".to_string(), Department::Kitchen);
        table.insert("drinks".to_string(), Department::Counter);
        table.insert("beverages".to_string(), Department::Counter);
        table.insert("desserts".to_string(), Department::Specialty);
        DepartmentRouter::new(table)
    }

    /// Resolves a category to its department.
    ///
    /// Unmapped categories route to `Kitchen` with `was_defaulted` set;
    /// the miss is also logged and counted.
    pub fn route(&self, category: &str) -> RoutedDepartment {
        match self.table.get(&category.to_lowercase()) {
            Some(department) => RoutedDepartment {
                department: *department,
                was_defaulted: false,
            },
            None => {
                self.defaulted.fetch_add(1, Ordering::Relaxed);
                warn!(
                    category = %category,
                    "No department mapping for category, defaulting to kitchen"
                );
                RoutedDepartment {
                    department: Department::Kitchen,
                    was_defaulted: true,
                }
            }
        }
    }

    /// How many lookups have fallen back to the kitchen default.
    pub fn defaulted_count(&self) -> u64 {
        self.defaulted.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_categories() {
        let router = DepartmentRouter::standard();
        let routed = router.route("drinks");
        assert_eq!(routed.department, Department::Counter);
        assert!(!routed.was_defaulted);

        assert_eq!(router.route("desserts").department, Department::Specialty);
        assert_eq!(router.route("food").department, Department::Kitchen);
        assert_eq!(router.defaulted_count(), 0);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut table = HashMap::new();
        table.insert("Drinks".to_string(), Department::Counter);
        let router = DepartmentRouter::new(table);

        assert_eq!(router.route("DRINKS").department, Department::Counter);
        assert_eq!(router.route("drinks").department, Department::Counter);
        assert_eq!(router.defaulted_count(), 0);
    }

    #[test]
    fn test_unmapped_category_defaults_to_kitchen_and_is_counted() {
        let router = DepartmentRouter::standard();

        let routed = router.route("merchandise");
        assert_eq!(routed.department, Department::Kitchen);
        assert!(routed.was_defaulted);

        router.route("gift-cards");
        assert_eq!(router.defaulted_count(), 2);
    }
}
