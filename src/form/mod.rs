//! Create-task form state.
//!
//! Holds what the user has entered so far, applies date presets and model
//! selection helpers, and validates the whole thing into a backend payload
//! plus the parameters the local lifecycle needs. Nothing is submitted from
//! here.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};

use crate::api::CreateTaskPayload;
use crate::error::{DashboardError, Result};
use crate::task::{Sources, TaskParams};

/// Models offered by the model picker.
pub const DEFAULT_MODELS: [&str; 12] = [
    "Honda Civic",
    "Honda Accord",
    "Toyota Camry",
    "Toyota Corolla",
    "Ford Focus",
    "Ford Mustang",
    "Chevrolet Malibu",
    "Chevrolet Impala",
    "BMW 3 Series",
    "BMW 5 Series",
    "Audi A4",
    "Audi A6",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// Quick date-range choices, each ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePreset {
    LastMonth,
    Last3Months,
    Last6Months,
    LastYear,
    Last3Years,
}

impl DatePreset {
    pub const ALL: [DatePreset; 5] = [
        Self::LastMonth,
        Self::Last3Months,
        Self::Last6Months,
        Self::LastYear,
        Self::Last3Years,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LastMonth => "last-1m",
            Self::Last3Months => "last-3m",
            Self::Last6Months => "last-6m",
            Self::LastYear => "last-1y",
            Self::Last3Years => "last-3y",
        }
    }

    fn months(self) -> u32 {
        match self {
            Self::LastMonth => 1,
            Self::Last3Months => 3,
            Self::Last6Months => 6,
            Self::LastYear => 12,
            Self::Last3Years => 36,
        }
    }

    /// `(from, to)` for a range ending on `today`. Month arithmetic clamps to
    /// the last valid day (Mar 31 minus one month is Feb 28/29).
    pub fn range(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let from = today
            .checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN);
        (from, today)
    }
}

impl FromStr for DatePreset {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DashboardError::Validation(format!("unknown date preset '{s}'")))
    }
}

impl fmt::Display for DatePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub name: String,
    /// `YYYY-MM-DD` as typed; checked by [`validate`](Self::validate).
    pub from_date: String,
    pub to_date: String,
    pub sources: Sources,
    /// Selection order is kept.
    pub car_models: Vec<String>,
    pub active_preset: Option<DatePreset>,
}

/// A form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTask {
    pub payload: CreateTaskPayload,
    pub params: TaskParams,
}

impl TaskForm {
    /// Fresh form: both dates today, nothing selected, named after `now`.
    pub fn with_defaults(now: NaiveDateTime) -> Self {
        let today = now.date().format(DATE_FORMAT).to_string();
        Self {
            name: format!("Task {}", now.format("%Y-%m-%d %H:%M:%S")),
            from_date: today.clone(),
            to_date: today,
            sources: Sources::default(),
            car_models: Vec::new(),
            active_preset: None,
        }
    }

    pub fn apply_preset(&mut self, preset: DatePreset, today: NaiveDate) {
        let (from, to) = preset.range(today);
        self.from_date = from.format(DATE_FORMAT).to_string();
        self.to_date = to.format(DATE_FORMAT).to_string();
        self.active_preset = Some(preset);
    }

    /// Add the model if absent, remove it if present.
    pub fn toggle_model(&mut self, model: &str) {
        if let Some(pos) = self.car_models.iter().position(|m| m == model) {
            self.car_models.remove(pos);
        } else {
            self.car_models.push(model.to_string());
        }
    }

    pub fn select_all_models(&mut self) {
        self.car_models = DEFAULT_MODELS.iter().map(|m| m.to_string()).collect();
    }

    pub fn deselect_all_models(&mut self) {
        self.car_models.clear();
    }

    /// Check the form and build what submission needs.
    ///
    /// Requires at least one dealership and two well-formed dates with
    /// `from <= to`. A blank name is sent as absent.
    pub fn validate(&self) -> Result<ValidatedTask> {
        if !self.sources.any() {
            return Err(DashboardError::Validation(
                "Please select at least one dealership.".to_string(),
            ));
        }

        let from = parse_date(&self.from_date)?;
        let to = parse_date(&self.to_date)?;
        if from > to {
            return Err(DashboardError::Validation(format!(
                "Start date {from} is after end date {to}."
            )));
        }

        let name = Some(self.name.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let payload = CreateTaskPayload {
            name: name.clone(),
            from_date: from.format(DATE_FORMAT).to_string(),
            to_date: to.format(DATE_FORMAT).to_string(),
            prime_auto_sales: self.sources.prime_auto_sales,
            metro_motors: self.sources.metro_motors,
            car_models: self.car_models.clone(),
        };

        let params = TaskParams {
            name,
            from_year: from.year(),
            to_year: to.year(),
            sources: self.sources,
            car_models: self.car_models.clone(),
        };

        Ok(ValidatedTask { payload, params })
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| DashboardError::Validation("Invalid date format. Use YYYY-MM-DD.".to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
