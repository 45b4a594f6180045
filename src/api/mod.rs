//! HTTP client for the task backend.
//!
//! Talks to the backend with the synchronous `ureq` client. Four endpoints:
//!
//! - `POST /api/tasks`: submit a data-collection task
//! - `GET  /api/tasks`: list tasks and their status
//! - `GET  /api/tasks/{id}/aggregated`: backend-side aggregates
//! - `GET  /api/tasks/{id}/raw`: raw records, optionally filtered and sorted
//!
//! Any non-2xx response becomes [`DashboardError::Http`] carrying the
//! response body text. Nothing is retried.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::analytics::AggregatedData;
use crate::config::schema::BackendConfig;
use crate::error::{DashboardError, Result};
use crate::records::{FilterSpec, RawRecord};
use crate::table::{SortField, SortOrder};
use crate::task::board::TaskSource;
use crate::task::TaskStatus;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body for `POST /api/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskPayload {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    /// `YYYY-MM-DD`
    pub from_date: String,
    /// `YYYY-MM-DD`
    pub to_date: String,
    #[serde(rename = "PrimeAutoSales")]
    pub prime_auto_sales: bool,
    #[serde(rename = "MetroMotors")]
    pub metro_motors: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub car_models: Vec<String>,
}

/// Response from `POST /api/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateTaskResponse {
    pub message: String,
    pub task_id: u64,
}

/// One entry of `GET /api/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    /// Backend-formatted timestamp, shown verbatim.
    pub created_at: String,
    pub status: TaskStatus,
}

impl TaskSummary {
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("Task #{}", self.id),
        }
    }
}

/// Query parameters for `GET /api/tasks/{id}/raw`.
///
/// Active filter fields are sent under their own names; empty ones are
/// omitted. `order` is only sent together with `sort_by`.
pub fn raw_query_params(filters: &FilterSpec, sort: Option<(SortField, SortOrder)>) -> Vec<(&'static str, String)> {
    let mut params: Vec<(&'static str, String)> = filters
        .active()
        .map(|(field, value)| (field.as_str(), value.to_string()))
        .collect();
    if let Some((field, order)) = sort {
        params.push(("sort_by", field.as_str().to_string()));
        params.push(("order", order.as_str().to_string()));
    }
    params
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous backend client. Cheap to construct; holds no connection.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    timeout: Duration,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Build a client from the resolved config.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(&config.base_url, Duration::from_millis(config.timeout_ms))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a new task.
    pub fn create_task(&self, payload: &CreateTaskPayload) -> Result<CreateTaskResponse> {
        let url = format!("{}/api/tasks", self.base_url);
        log::debug!("POST {url}");
        let result = ureq::post(&url).timeout(self.timeout).send_json(payload);
        decode(result, "Failed to create task")
    }

    /// List every task the backend knows about.
    pub fn get_tasks(&self) -> Result<Vec<TaskSummary>> {
        let url = format!("{}/api/tasks", self.base_url);
        log::debug!("GET {url}");
        let result = ureq::get(&url).timeout(self.timeout).call();
        decode(result, "Failed to get tasks")
    }

    /// Backend-computed aggregates for a completed task.
    pub fn get_aggregated(&self, task_id: u64) -> Result<AggregatedData> {
        let url = format!("{}/api/tasks/{task_id}/aggregated", self.base_url);
        log::debug!("GET {url}");
        let result = ureq::get(&url).timeout(self.timeout).call();
        decode(result, "Failed to get aggregated data")
    }

    /// Raw records for a task, filtered and sorted by the backend.
    pub fn get_raw(
        &self,
        task_id: u64,
        filters: &FilterSpec,
        sort: Option<(SortField, SortOrder)>,
    ) -> Result<Vec<RawRecord>> {
        let url = format!("{}/api/tasks/{task_id}/raw", self.base_url);
        log::debug!("GET {url}");
        let mut request = ureq::get(&url).timeout(self.timeout);
        for (key, value) in raw_query_params(filters, sort) {
            request = request.query(key, &value);
        }
        decode(request.call(), "Failed to get raw task data")
    }
}

impl TaskSource for BackendClient {
    fn fetch_tasks(&self) -> Result<Vec<TaskSummary>> {
        self.get_tasks()
    }
}

/// Turn a `ureq` outcome into a decoded body or a [`DashboardError`].
fn decode<T: DeserializeOwned>(
    result: std::result::Result<ureq::Response, ureq::Error>,
    context: &'static str,
) -> Result<T> {
    match result {
        Ok(resp) => resp.into_json::<T>().map_err(|e| DashboardError::Decode {
            context,
            message: e.to_string(),
        }),
        Err(ureq::Error::Status(status, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            Err(DashboardError::Http {
                context,
                status,
                body,
            })
        }
        Err(other) => Err(DashboardError::Transport {
            context,
            message: other.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
