/// Configuration system for salesdash.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::SalesdashConfig::default()`]
/// 2. **User global config**: `~/.salesdash/config.toml`
/// 3. **Project local config**: `.salesdash.toml` in the current directory
/// 4. **Environment variables**: `SALESDASH_*` overrides (highest precedence)
///
/// A malformed file is skipped, never fatal.
///
/// # Usage
///
/// ```rust,ignore
/// use salesdash::config;
///
/// let cfg = config::load();
/// let client = salesdash::api::BackendClient::from_config(&cfg.backend);
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::SalesdashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
pub fn load() -> SalesdashConfig {
    let mut config = SalesdashConfig::default();

    if let Some(global) = global_config_path().and_then(|p| load_toml_file(&p)) {
        config = global;
    }

    // Project file wins over the global one as a whole.
    if let Some(project) = project_config_path().and_then(|p| load_toml_file(&p)) {
        config = project;
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config
}

/// Parse a config file, or `None` when it is missing or malformed.
fn load_toml_file(path: &Path) -> Option<SalesdashConfig> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("ignoring malformed config {}: {e}", path.display());
            None
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// `~/.salesdash`, where the global config and activity log live.
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".salesdash"))
}

fn global_config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".salesdash.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply `SALESDASH_*` overrides read through `lookup`.
///
/// - `SALESDASH_BACKEND_URL`: backend base URL
/// - `SALESDASH_TIMEOUT_MS`: request timeout
/// - `SALESDASH_POLL_INTERVAL_MS`: task list refresh interval
/// - `SALESDASH_PAGE_SIZE`: raw table page size
/// - `SALESDASH_ACTIVITY_LOG`: activity log on/off (`1`/`true`/`yes`/`on`)
///
/// Unparsable numbers are ignored.
fn apply_env_overrides<F>(config: &mut SalesdashConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("SALESDASH_BACKEND_URL")
        && !val.is_empty()
    {
        config.backend.base_url = val;
    }
    if let Some(val) = lookup("SALESDASH_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.backend.timeout_ms = ms;
    }
    if let Some(val) = lookup("SALESDASH_POLL_INTERVAL_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.polling.interval_ms = ms;
    }
    if let Some(val) = lookup("SALESDASH_PAGE_SIZE")
        && let Ok(size) = val.parse::<usize>()
    {
        config.table.page_size = size;
    }
    if let Some(val) = lookup("SALESDASH_ACTIVITY_LOG") {
        config.logging.activity_log = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.salesdash/config.toml`.
///
/// Fails if the file exists, unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.salesdash/ directory")?;
    }

    fs::write(&path, SalesdashConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set one dotted key (e.g. `backend.base_url`) in the global config file.
///
/// Starts from the existing file, or from serialized defaults when there is
/// none, so the key is always known.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let source = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&SalesdashConfig::default())
            .context("failed to serialize default config")?
    };

    let output = update_toml_source(&source, key, value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Apply one dotted-key update to TOML text and re-serialize it.
fn update_toml_source(source: &str, key: &str, value: &str) -> Result<String> {
    let mut root: toml::Value = toml::from_str(source).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;
    toml::to_string_pretty(&root).context("failed to serialize updated config")
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The new value takes the type of the one it replaces.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key '{key}'");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];
    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("unknown config key '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = SalesdashConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("SALESDASH_BACKEND_URL", "http://10.0.0.2:5000"),
                ("SALESDASH_TIMEOUT_MS", "2500"),
                ("SALESDASH_POLL_INTERVAL_MS", "1000"),
                ("SALESDASH_PAGE_SIZE", "50"),
                ("SALESDASH_ACTIVITY_LOG", "off"),
            ]),
        );
        assert_eq!(config.backend.base_url, "http://10.0.0.2:5000");
        assert_eq!(config.backend.timeout_ms, 2500);
        assert_eq!(config.polling.interval_ms, 1000);
        assert_eq!(config.table.page_size, 50);
        assert!(!config.logging.activity_log);
    }

    #[test]
    fn unparsable_env_numbers_are_ignored() {
        let mut config = SalesdashConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[("SALESDASH_PAGE_SIZE", "lots"), ("SALESDASH_BACKEND_URL", "")]),
        );
        assert_eq!(config, SalesdashConfig::default());
    }

    #[test]
    fn is_truthy_accepts_variants() {
        for yes in ["1", "true", "TRUE", "yes", "on", "ON"] {
            assert!(is_truthy(yes), "{yes}");
        }
        for no in ["0", "false", "no", "off", ""] {
            assert!(!is_truthy(no), "{no}");
        }
    }

    #[test]
    fn malformed_file_is_skipped() {
        let path = std::env::temp_dir().join(format!("salesdash-bad-{}.toml", std::process::id()));
        fs::write(&path, "[backend\nbase_url = ").unwrap();
        assert!(load_toml_file(&path).is_none());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn set_toml_value_keeps_types() {
        let mut root: toml::Value = toml::from_str(
            r#"
[backend]
base_url = "http://127.0.0.1:5000"
timeout_ms = 10000

[logging]
activity_log = true
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "backend.base_url", "http://dash:9000").unwrap();
        set_toml_value(&mut root, "backend.timeout_ms", "300").unwrap();
        set_toml_value(&mut root, "logging.activity_log", "no").unwrap();

        assert_eq!(root["backend"]["base_url"].as_str(), Some("http://dash:9000"));
        assert_eq!(root["backend"]["timeout_ms"].as_integer(), Some(300));
        assert_eq!(root["logging"]["activity_log"].as_bool(), Some(false));
    }

    #[test]
    fn set_toml_value_rejects_bad_input() {
        let mut root: toml::Value = toml::from_str("[table]\npage_size = 20\n").unwrap();
        assert!(set_toml_value(&mut root, "table.page_size", "many").is_err());
        assert!(set_toml_value(&mut root, "table.colour", "red").is_err());
        assert!(set_toml_value(&mut root, "nonexistent.key", "x").is_err());
        assert!(set_toml_value(&mut root, "table.", "x").is_err());
    }

    #[test]
    fn update_from_defaults_round_trips() {
        let defaults = toml::to_string_pretty(&SalesdashConfig::default()).unwrap();
        let updated = update_toml_source(&defaults, "polling.interval_ms", "750").unwrap();
        let config: SalesdashConfig = toml::from_str(&updated).unwrap();
        assert_eq!(config.polling.interval_ms, 750);
        assert_eq!(config.table.page_size, 20);
    }

    #[test]
    fn show_effective_config_returns_toml() {
        let toml_str = show_effective_config().unwrap();
        let _: SalesdashConfig = toml::from_str(&toml_str).unwrap();
    }
}
