//! # Expo Configuration
//!
//! Configuration for the order coordination pipeline.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     EXPO_STORE_ID=store-001                                             │
//! │     EXPO_PRINT_MAX_ATTEMPTS=3                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/expo-pos/expo.toml (Linux)                                │
//! │     ~/Library/Application Support/com.expo.pos/expo.toml (macOS)        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # expo.toml
//! [store]
//! id = "store-001"
//! name = "Downtown Branch"
//!
//! [print]
//! max_attempts = 3
//! timeout_secs = 10
//!
//! [heartbeat]
//! interval_secs = 30
//! missed_threshold = 2
//!
//! [routing]
//! food = "kitchen"
//! drinks = "counter"
//! desserts = "specialty"
//!
//! [[printers]]
//! name = "Kitchen Epson"
//! department = "kitchen"
//! copies = 1
//! paper_width = 32
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use expo_core::{
    Department, Printer, DEFAULT_HEARTBEAT_INTERVAL_SECS, DEFAULT_MAX_PRINT_ATTEMPTS,
    DEFAULT_MISSED_PING_THRESHOLD,
};
use expo_print::DepartmentRouter;

use crate::error::{OrchestratorError, OrchestratorResult};

// =============================================================================
// Store Settings
// =============================================================================

/// Store identity, stamped on logs and dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Store identifier.
    #[serde(default = "default_store_id")]
    pub id: String,

    /// Human-readable store name.
    #[serde(default = "default_store_name")]
    pub name: String,
}

fn default_store_id() -> String {
    "store-001".to_string()
}

fn default_store_name() -> String {
    "Main Store".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            id: default_store_id(),
            name: default_store_name(),
        }
    }
}

// =============================================================================
// Print Settings
// =============================================================================

/// Print job limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintSettings {
    /// Maximum attempts per job before it is left failed for manual
    /// intervention.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Per-dispatch timeout in seconds.
    #[serde(default = "default_print_timeout")]
    pub timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_PRINT_ATTEMPTS
}

fn default_print_timeout() -> u64 {
    10
}

impl Default for PrintSettings {
    fn default() -> Self {
        PrintSettings {
            max_attempts: default_max_attempts(),
            timeout_secs: default_print_timeout(),
        }
    }
}

// =============================================================================
// Heartbeat Settings
// =============================================================================

/// Connected-client liveness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatSettings {
    /// Seconds between heartbeat cycles.
    #[serde(default = "default_heartbeat_interval")]
    pub interval_secs: u64,

    /// Consecutive missed cycles before a session is purged.
    #[serde(default = "default_missed_threshold")]
    pub missed_threshold: u32,
}

fn default_heartbeat_interval() -> u64 {
    DEFAULT_HEARTBEAT_INTERVAL_SECS
}

fn default_missed_threshold() -> u32 {
    DEFAULT_MISSED_PING_THRESHOLD
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        HeartbeatSettings {
            interval_secs: default_heartbeat_interval(),
            missed_threshold: default_missed_threshold(),
        }
    }
}

// =============================================================================
// Printer Settings
// =============================================================================

/// One configured ticket printer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterSettings {
    /// Display name ("Kitchen Epson").
    pub name: String,

    /// Department the printer serves.
    pub department: String,

    /// Ticket copies per job.
    #[serde(default = "default_copies")]
    pub copies: u32,

    /// Paper width in characters.
    #[serde(default = "default_paper_width")]
    pub paper_width: u32,

    /// Whether the printer accepts jobs.
    #[serde(default = "default_true")]
    pub active: bool,

    /// Print the store logo header.
    #[serde(default)]
    pub include_logo: bool,

    /// Print a QR code footer.
    #[serde(default)]
    pub include_qr: bool,
}

fn default_copies() -> u32 {
    1
}

fn default_paper_width() -> u32 {
    32
}

fn default_true() -> bool {
    true
}

impl PrinterSettings {
    /// Materializes a `Printer` from this entry.
    pub fn to_printer(&self) -> OrchestratorResult<Printer> {
        let department: Department = self
            .department
            .parse()
            .map_err(OrchestratorError::InvalidConfig)?;
        let mut printer = Printer::new(&self.name, department);
        printer.copies = self.copies;
        printer.paper_width = self.paper_width;
        printer.is_active = self.active;
        printer.include_logo = self.include_logo;
        printer.include_qr = self.include_qr;
        Ok(printer)
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpoConfig {
    /// Store identity.
    #[serde(default)]
    pub store: StoreSettings,

    /// Print job limits.
    #[serde(default)]
    pub print: PrintSettings,

    /// Client liveness settings.
    #[serde(default)]
    pub heartbeat: HeartbeatSettings,

    /// Category → department routing table.
    #[serde(default)]
    pub routing: HashMap<String, String>,

    /// Configured ticket printers.
    #[serde(default)]
    pub printers: Vec<PrinterSettings>,
}

impl ExpoConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (expo.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> OrchestratorResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading expo config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads config or returns defaults if the load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load expo config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> OrchestratorResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| OrchestratorError::InvalidConfig("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;
        info!(?path, "Expo config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> OrchestratorResult<()> {
        if self.store.id.is_empty() {
            return Err(OrchestratorError::InvalidConfig(
                "store.id must not be empty".into(),
            ));
        }
        if self.print.max_attempts == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "print.max_attempts must be greater than 0".into(),
            ));
        }
        if self.print.timeout_secs == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "print.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.heartbeat.missed_threshold == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "heartbeat.missed_threshold must be greater than 0".into(),
            ));
        }
        for (category, department) in &self.routing {
            department.parse::<Department>().map_err(|e| {
                OrchestratorError::InvalidConfig(format!("routing.{}: {}", category, e))
            })?;
        }
        for printer in &self.printers {
            printer.to_printer()?;
        }
        Ok(())
    }

    /// Builds the department router from the routing table, falling
    /// back to the standard mapping when the table is empty.
    pub fn router(&self) -> OrchestratorResult<DepartmentRouter> {
        if self.routing.is_empty() {
            return Ok(DepartmentRouter::standard());
        }
        let mut table = HashMap::new();
        for (category, department) in &self.routing {
            let department: Department = department
                .parse()
                .map_err(OrchestratorError::InvalidConfig)?;
            table.insert(category.clone(), department);
        }
        Ok(DepartmentRouter::new(table))
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(id) = std::env::var("EXPO_STORE_ID") {
            debug!(store_id = %id, "Overriding store ID from environment");
            self.store.id = id;
        }
        if let Ok(name) = std::env::var("EXPO_STORE_NAME") {
            self.store.name = name;
        }
        if let Ok(attempts) = std::env::var("EXPO_PRINT_MAX_ATTEMPTS") {
            if let Ok(n) = attempts.parse::<u32>() {
                self.print.max_attempts = n;
            }
        }
        if let Ok(timeout) = std::env::var("EXPO_PRINT_TIMEOUT_SECS") {
            if let Ok(n) = timeout.parse::<u64>() {
                self.print.timeout_secs = n;
            }
        }
        if let Ok(interval) = std::env::var("EXPO_HEARTBEAT_INTERVAL_SECS") {
            if let Ok(n) = interval.parse::<u64>() {
                self.heartbeat.interval_secs = n;
            }
        }
        if let Ok(threshold) = std::env::var("EXPO_HEARTBEAT_MISSED_THRESHOLD") {
            if let Ok(n) = threshold.parse::<u32>() {
                self.heartbeat.missed_threshold = n;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "expo", "pos")
            .map(|dirs| dirs.config_dir().join("expo.toml"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
