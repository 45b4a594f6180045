//! Activity log: one JSON line per dashboard event.
//!
//! Records task submissions, local status transitions and failed backend
//! calls so a session can be reconstructed after the fact. Entries are read
//! back by `salesdash health` for a quick count only.
//!
//! Log file: `~/.salesdash/activity.jsonl`

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::schema::LoggingConfig;
use crate::task::TaskStatus;

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// A single activity log line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    /// `"submitted"`, `"transition"` or `"fetch_failed"`.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub task_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

impl ActivityEntry {
    fn now(kind: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            kind: kind.to_string(),
            task_id: None,
            status: None,
            detail: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Handle to the activity log, resolved once from `[logging]`.
///
/// Holds the target file and whether writing is enabled. A disabled handle
/// never touches the filesystem.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    path: Option<PathBuf>,
    enabled: bool,
}

impl ActivityLog {
    /// Log to `~/.salesdash/activity.jsonl` when the config enables it.
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new(activity_log_path(), config)
    }

    pub fn new(path: Option<PathBuf>, config: &LoggingConfig) -> Self {
        Self {
            path,
            enabled: config.activity_log,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled && self.path.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// A task was accepted by the backend (or registered offline).
    pub fn submitted(&self, task_id: u64, name: Option<&str>) {
        let mut entry = ActivityEntry::now("submitted");
        entry.task_id = Some(task_id);
        entry.detail = name.map(str::to_string);
        self.record(&entry);
    }

    /// A local task moved to `status`.
    pub fn transition(&self, task_id: u64, status: TaskStatus) {
        let mut entry = ActivityEntry::now("transition");
        entry.task_id = Some(task_id);
        entry.status = Some(status.to_string());
        self.record(&entry);
    }

    /// A backend call failed; `detail` is the surfaced message.
    pub fn fetch_failure(&self, detail: &str) {
        let mut entry = ActivityEntry::now("fetch_failed");
        entry.detail = Some(detail.to_string());
        self.record(&entry);
    }

    /// Best-effort. Write failures are ignored.
    fn record(&self, entry: &ActivityEntry) {
        if !self.enabled {
            return;
        }
        if let Some(path) = &self.path {
            let _ = append_entry(path, entry);
        }
    }

    /// Every entry in the log file, skipping malformed lines. Reads even when
    /// writing is disabled.
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.path.as_deref().map(read_entries).unwrap_or_default()
    }
}

fn append_entry(path: &Path, entry: &ActivityEntry) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn read_entries(path: &Path) -> Vec<ActivityEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
        .collect()
}

/// Return the path to the activity log file.
pub fn activity_log_path() -> Option<PathBuf> {
    crate::config::data_dir().map(|dir| dir.join("activity.jsonl"))
}
