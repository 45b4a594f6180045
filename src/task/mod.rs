//! Local task lifecycle.
//!
//! A submitted task moves `pending → in progress → completed` and nothing
//! else: there is no failure state and no step may be skipped. Each step
//! produces a new [`Task`] value that replaces the previous one wholesale in
//! the [`store::TaskStore`].
//!
//! On completion the task carries synthesized chart data. The numbers are
//! random placeholders for a real backend computation; only their shape
//! (one point per requested year, one bar per model or source) is meaningful.

pub mod board;
pub mod simulator;
pub mod store;

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

pub use board::{TaskBoard, TaskPoller, TaskSource};
pub use simulator::TaskSimulator;
pub use store::TaskStore;

/// Display name of the first dealership source.
pub const PRIME_AUTO_SALES: &str = "Prime Auto Sales";
/// Display name of the second dealership source.
pub const METRO_MOTORS: &str = "Metro Motors";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl TaskStatus {
    /// The only state this one may move to.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::InProgress),
            Self::InProgress => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in progress",
            Self::Completed => "completed",
        }
    }

    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// Which dealerships a task collects from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sources {
    pub prime_auto_sales: bool,
    pub metro_motors: bool,
}

impl Sources {
    pub fn any(self) -> bool {
        self.prime_auto_sales || self.metro_motors
    }

    /// Display names of the selected sources.
    pub fn labels(self) -> Vec<&'static str> {
        let mut labels = Vec::with_capacity(2);
        if self.prime_auto_sales {
            labels.push(PRIME_AUTO_SALES);
        }
        if self.metro_motors {
            labels.push(METRO_MOTORS);
        }
        labels
    }
}

/// What the user asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskParams {
    pub name: Option<String>,
    pub from_year: i32,
    pub to_year: i32,
    pub sources: Sources,
    pub car_models: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRows {
    pub year: i32,
    pub rows: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySales {
    pub company: String,
    pub sales: u32,
}

/// Chart series attached when a task completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub line_data: Vec<YearRows>,
    pub bar_data: Vec<CompanySales>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    #[serde(flatten)]
    pub params: TaskParams,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<TaskOutput>,
}

impl Task {
    /// A freshly accepted task.
    pub fn pending(id: u64, params: TaskParams) -> Self {
        Self {
            id,
            params,
            status: TaskStatus::Pending,
            data: None,
        }
    }

    /// Custom name, or `Task #<id>`.
    pub fn display_name(&self) -> String {
        match self.params.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("Task #{}", self.id),
        }
    }

    /// The task after one lifecycle step.
    ///
    /// Moving into `completed` attaches synthesized output; a completed task
    /// has nowhere left to go.
    pub fn advance<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Task> {
        let next = self
            .status
            .next()
            .ok_or(DashboardError::AlreadyCompleted(self.id))?;

        let data = if next.is_completed() {
            Some(synthesize_output(&self.params, rng))
        } else {
            self.data.clone()
        };

        Ok(Task {
            status: next,
            data,
            ..self.clone()
        })
    }
}

/// Placeholder output for a completed task.
///
/// - `line_data`: one point per year in `from_year..=to_year`, rows in `0..1000`.
/// - `bar_data`: one bar per requested model (sales in `0..3000`) when models
///   were given and any source is selected; otherwise one bar per selected
///   source (sales in `0..5000`).
pub fn synthesize_output<R: Rng + ?Sized>(params: &TaskParams, rng: &mut R) -> TaskOutput {
    let line_data = (params.from_year..=params.to_year)
        .map(|year| YearRows {
            year,
            rows: rng.gen_range(0..1000),
        })
        .collect();

    let bar_data = if !params.car_models.is_empty() {
        if params.sources.any() {
            params
                .car_models
                .iter()
                .map(|model| CompanySales {
                    company: model.clone(),
                    sales: rng.gen_range(0..3000),
                })
                .collect()
        } else {
            Vec::new()
        }
    } else {
        params
            .sources
            .labels()
            .into_iter()
            .map(|label| CompanySales {
                company: label.to_string(),
                sales: rng.gen_range(0..5000),
            })
            .collect()
    };

    TaskOutput {
        line_data,
        bar_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn params(models: &[&str], sources: Sources) -> TaskParams {
        TaskParams {
            name: None,
            from_year: 2021,
            to_year: 2023,
            sources,
            car_models: models.iter().map(|m| m.to_string()).collect(),
        }
    }

    const BOTH: Sources = Sources {
        prime_auto_sales: true,
        metro_motors: true,
    };

    #[test]
    fn status_walks_linearly() {
        assert_eq!(TaskStatus::Pending.next(), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::InProgress.next(), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::Completed.next(), None);
    }

    #[test]
    fn status_uses_wire_spelling() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, r#""in progress""#);
        let parsed: TaskStatus = serde_json::from_str(r#""completed""#).unwrap();
        assert_eq!(parsed, TaskStatus::Completed);
    }

    #[test]
    fn advance_attaches_data_only_on_completion() {
        let mut rng = StdRng::seed_from_u64(7);
        let task = Task::pending(1, params(&[], BOTH));

        let running = task.advance(&mut rng).unwrap();
        assert_eq!(running.status, TaskStatus::InProgress);
        assert!(running.data.is_none());

        let done = running.advance(&mut rng).unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(done.data.is_some());

        assert!(matches!(
            done.advance(&mut rng),
            Err(DashboardError::AlreadyCompleted(1))
        ));
    }

    #[test]
    fn line_data_covers_requested_years() {
        let mut rng = StdRng::seed_from_u64(1);
        let output = synthesize_output(&params(&[], BOTH), &mut rng);
        let years: Vec<i32> = output.line_data.iter().map(|p| p.year).collect();
        assert_eq!(years, [2021, 2022, 2023]);
        assert!(output.line_data.iter().all(|p| p.rows < 1000));
    }

    #[test]
    fn bar_data_follows_models_when_given() {
        let mut rng = StdRng::seed_from_u64(2);
        let output = synthesize_output(&params(&["Audi A4", "Audi A6"], BOTH), &mut rng);
        let companies: Vec<&str> = output.bar_data.iter().map(|b| b.company.as_str()).collect();
        assert_eq!(companies, ["Audi A4", "Audi A6"]);
        assert!(output.bar_data.iter().all(|b| b.sales < 3000));
    }

    #[test]
    fn bar_data_falls_back_to_sources() {
        let mut rng = StdRng::seed_from_u64(3);
        let only_metro = Sources {
            prime_auto_sales: false,
            metro_motors: true,
        };
        let output = synthesize_output(&params(&[], only_metro), &mut rng);
        assert_eq!(output.bar_data.len(), 1);
        assert_eq!(output.bar_data[0].company, METRO_MOTORS);
        assert!(output.bar_data[0].sales < 5000);
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let mut task = Task::pending(12, TaskParams::default());
        assert_eq!(task.display_name(), "Task #12");
        task.params.name = Some("Q1 pull".into());
        assert_eq!(task.display_name(), "Q1 pull");
    }
}
