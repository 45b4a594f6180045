/// Configuration schema and defaults for salesdash.
///
/// Sections: `[backend]`, `[polling]`, `[simulation]`, `[table]` and
/// `[logging]`. Every field has a built-in default; a config file only needs
/// the values it overrides.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Maps directly to `~/.salesdash/config.toml` and `.salesdash.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesdashConfig {
    pub backend: BackendConfig,
    pub polling: PollingConfig,
    pub simulation: SimulationConfig,
    pub table: TableConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the task backend, without the `/api` suffix.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [polling]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Task list refresh interval.
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 5_000 }
    }
}

// ---------------------------------------------------------------------------
// [simulation]
// ---------------------------------------------------------------------------

/// Delays for the offline lifecycle simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Time spent in `pending` before moving to `in progress`.
    pub pending_delay_ms: u64,
    /// Time spent in `in progress` before completing.
    pub processing_delay_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            pending_delay_ms: 500,
            processing_delay_ms: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// [table]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Rows per page in the raw-data table. Zero is treated as one.
    pub page_size: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: crate::table::DEFAULT_PAGE_SIZE,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append task events to `~/.salesdash/activity.jsonl`.
    pub activity_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { activity_log: true }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl SalesdashConfig {
    /// Annotated default config, written by `salesdash config init`.
    pub fn default_toml() -> String {
        r#"# salesdash configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (SALESDASH_*)
#   2. Project config (.salesdash.toml in current directory)
#   3. User global config (~/.salesdash/config.toml)
#   4. Built-in defaults

[backend]
base_url = "http://127.0.0.1:5000"   # SALESDASH_BACKEND_URL
timeout_ms = 10000                   # SALESDASH_TIMEOUT_MS

[polling]
interval_ms = 5000                   # SALESDASH_POLL_INTERVAL_MS

[simulation]
pending_delay_ms = 500
processing_delay_ms = 500

[table]
page_size = 20                       # SALESDASH_PAGE_SIZE

[logging]
activity_log = true                  # SALESDASH_ACTIVITY_LOG
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SalesdashConfig::default();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.polling.interval_ms, 5000);
        assert_eq!(config.simulation.pending_delay_ms, 500);
        assert_eq!(config.table.page_size, 20);
        assert!(config.logging.activity_log);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let toml_str = r#"
[backend]
base_url = "http://dash.internal:8080"

[table]
page_size = 50
"#;
        let config: SalesdashConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend.base_url, "http://dash.internal:8080");
        assert_eq!(config.backend.timeout_ms, 10_000);
        assert_eq!(config.table.page_size, 50);
        assert_eq!(config.polling, PollingConfig::default());
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let config: SalesdashConfig = toml::from_str("").unwrap();
        assert_eq!(config, SalesdashConfig::default());
    }

    #[test]
    fn default_toml_matches_built_in_defaults() {
        let config: SalesdashConfig = toml::from_str(&SalesdashConfig::default_toml()).unwrap();
        assert_eq!(config, SalesdashConfig::default());
    }
}
