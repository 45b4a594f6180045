//! Record filter: evaluates a [`RawRecord`] against a [`FilterSpec`].
//!
//! Four kinds of constraint, all ANDed together:
//!
//! | Kind      | Fields                                                   | Rule                           |
//! |-----------|----------------------------------------------------------|--------------------------------|
//! | Exact     | dealer, car_model, color, type, model_year               | case-insensitive equality      |
//! | Substring | sale_date, sales_amount, engine_capacity, horsepower     | case-insensitive contains      |
//! | Date      | sale_date_from, sale_date_to                             | inclusive ISO string compare   |
//! | Numeric   | sales_amount_min/max, engine_capacity_min/max            | inclusive numeric compare      |
//!
//! An empty value never excludes a record. A record whose value cannot be
//! parsed as a number fails any active numeric bound on that field; a bound
//! that is itself not a number is ignored.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{DashboardError, Result};

use super::{RawRecord, format_amount};

/// Every field a [`FilterSpec`] can constrain, named as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterField {
    Dealer,
    SaleDate,
    CarModel,
    SalesAmount,
    Color,
    EngineCapacity,
    ModelYear,
    Horsepower,
    Type,
    SaleDateFrom,
    SaleDateTo,
    SalesAmountMin,
    SalesAmountMax,
    EngineCapacityMin,
    EngineCapacityMax,
}

impl FilterField {
    pub const ALL: [FilterField; 15] = [
        Self::Dealer,
        Self::SaleDate,
        Self::CarModel,
        Self::SalesAmount,
        Self::Color,
        Self::EngineCapacity,
        Self::ModelYear,
        Self::Horsepower,
        Self::Type,
        Self::SaleDateFrom,
        Self::SaleDateTo,
        Self::SalesAmountMin,
        Self::SalesAmountMax,
        Self::EngineCapacityMin,
        Self::EngineCapacityMax,
    ];

    /// Wire name, also used as the query parameter name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dealer => "dealer",
            Self::SaleDate => "sale_date",
            Self::CarModel => "car_model",
            Self::SalesAmount => "sales_amount",
            Self::Color => "color",
            Self::EngineCapacity => "engine_capacity",
            Self::ModelYear => "model_year",
            Self::Horsepower => "horsepower",
            Self::Type => "type",
            Self::SaleDateFrom => "sale_date_from",
            Self::SaleDateTo => "sale_date_to",
            Self::SalesAmountMin => "sales_amount_min",
            Self::SalesAmountMax => "sales_amount_max",
            Self::EngineCapacityMin => "engine_capacity_min",
            Self::EngineCapacityMax => "engine_capacity_max",
        }
    }

    /// Parse a wire name. Accepts `-` in place of `_`.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|f| f.as_str() == normalized)
    }

    /// Whether the backend's raw endpoint understands this field.
    ///
    /// Range bounds are evaluated client-side only.
    pub fn is_server_side(self) -> bool {
        !matches!(
            self,
            Self::SaleDateFrom
                | Self::SaleDateTo
                | Self::SalesAmountMin
                | Self::SalesAmountMax
                | Self::EngineCapacityMin
                | Self::EngineCapacityMax
        )
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user's current constraints, keyed by field.
///
/// Starts empty and is edited one field at a time. Setting a field to an
/// empty (or whitespace-only) value removes the constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    values: BTreeMap<FilterField, String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for `field`, or `""` when unconstrained.
    pub fn get(&self, field: FilterField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.values.remove(&field);
        } else {
            self.values.insert(field, trimmed.to_string());
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Active constraints in field order.
    pub fn active(&self) -> impl Iterator<Item = (FilterField, &str)> {
        self.values.iter().map(|(f, v)| (*f, v.as_str()))
    }

    /// Parse a `key=value` assignment as typed on the command line.
    pub fn parse_assignment(raw: &str) -> Result<(FilterField, String)> {
        let (key, value) = raw.split_once('=').ok_or_else(|| {
            DashboardError::Validation(format!("expected key=value, got '{raw}'"))
        })?;
        let field = FilterField::parse(key)
            .ok_or_else(|| DashboardError::Validation(format!("unknown filter field '{key}'")))?;
        Ok((field, value.trim().to_string()))
    }

    /// Whether `record` satisfies every active constraint.
    pub fn matches(&self, record: &RawRecord) -> bool {
        self.active().all(|(field, value)| field_matches(record, field, value))
    }
}

/// Records passing `spec`, in input order.
pub fn apply<'a>(records: &'a [RawRecord], spec: &FilterSpec) -> Vec<&'a RawRecord> {
    records.iter().filter(|r| spec.matches(r)).collect()
}

fn field_matches(record: &RawRecord, field: FilterField, value: &str) -> bool {
    match field {
        FilterField::Dealer => equals_ignore_case(&record.dealer, value),
        FilterField::CarModel => equals_ignore_case(&record.car_model, value),
        FilterField::Color => equals_ignore_case(&record.color, value),
        FilterField::Type => equals_ignore_case(&record.kind, value),
        FilterField::ModelYear => equals_ignore_case(&record.model_year.to_string(), value),

        FilterField::SaleDate => contains_ignore_case(&record.sale_date, value),
        FilterField::SalesAmount => contains_ignore_case(&format_amount(record.sales_amount), value),
        FilterField::EngineCapacity => contains_ignore_case(&record.engine_capacity, value),
        FilterField::Horsepower => contains_ignore_case(&record.horsepower.to_string(), value),

        FilterField::SaleDateFrom => record.sale_date.as_str() >= value,
        FilterField::SaleDateTo => record.sale_date.as_str() <= value,

        FilterField::SalesAmountMin => within_bound(Some(record.sales_amount), value, |v, b| v >= b),
        FilterField::SalesAmountMax => within_bound(Some(record.sales_amount), value, |v, b| v <= b),
        FilterField::EngineCapacityMin => within_bound(record.engine_litres(), value, |v, b| v >= b),
        FilterField::EngineCapacityMax => within_bound(record.engine_litres(), value, |v, b| v <= b),
    }
}

fn equals_ignore_case(actual: &str, wanted: &str) -> bool {
    actual.to_lowercase() == wanted.to_lowercase()
}

fn contains_ignore_case(actual: &str, needle: &str) -> bool {
    actual.to_lowercase().contains(&needle.to_lowercase())
}

fn within_bound(actual: Option<f64>, bound: &str, keep: impl Fn(f64, f64) -> bool) -> bool {
    let Ok(bound) = bound.parse::<f64>() else {
        return true;
    };
    if bound.is_nan() {
        return true;
    }
    match actual {
        Some(v) if !v.is_nan() => keep(v, bound),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, model: &str, amount: f64, capacity: &str) -> RawRecord {
        RawRecord {
            id: 1,
            task_id: 1,
            dealer: "Prime Auto Sales".into(),
            sale_date: date.into(),
            car_model: model.into(),
            sales_amount: amount,
            color: "Red".into(),
            engine_capacity: capacity.into(),
            model_year: 2022,
            horsepower: 240,
            kind: "SUV".into(),
        }
    }

    #[test]
    fn empty_spec_accepts_everything() {
        let spec = FilterSpec::new();
        assert!(spec.matches(&record("2020-01-01", "Audi A4", 1.0, "")));
        assert!(spec.matches(&record("", "", 0.0, "garbage")));
    }

    #[test]
    fn whitespace_value_clears_field() {
        let mut spec = FilterSpec::new().with(FilterField::Color, "Red");
        spec.set(FilterField::Color, "   ");
        assert!(spec.is_empty());
    }

    #[test]
    fn exact_fields_ignore_case() {
        let r = record("2021-05-05", "Honda Civic", 20000.0, "2.0L");
        assert!(FilterSpec::new().with(FilterField::CarModel, "honda civic").matches(&r));
        assert!(!FilterSpec::new().with(FilterField::CarModel, "Honda").matches(&r));
        assert!(FilterSpec::new().with(FilterField::Dealer, "PRIME AUTO SALES").matches(&r));
        assert!(FilterSpec::new().with(FilterField::Type, "suv").matches(&r));
    }

    #[test]
    fn model_year_compares_string_form() {
        let r = record("2021-05-05", "Honda Civic", 20000.0, "2.0L");
        assert!(FilterSpec::new().with(FilterField::ModelYear, "2022").matches(&r));
        assert!(!FilterSpec::new().with(FilterField::ModelYear, "202").matches(&r));
    }

    #[test]
    fn substring_fields_use_contains() {
        let r = record("2021-05-05", "Honda Civic", 20000.0, "2.0L");
        assert!(FilterSpec::new().with(FilterField::SaleDate, "2021-05").matches(&r));
        assert!(FilterSpec::new().with(FilterField::SalesAmount, "200").matches(&r));
        assert!(!FilterSpec::new().with(FilterField::SalesAmount, "20000.0").matches(&r));
        assert!(FilterSpec::new().with(FilterField::EngineCapacity, "2.0l").matches(&r));
        assert!(FilterSpec::new().with(FilterField::Horsepower, "24").matches(&r));
    }

    #[test]
    fn date_range_is_inclusive() {
        let r = record("2022-01-01", "Accord", 30000.0, "2.5L");
        let spec = FilterSpec::new()
            .with(FilterField::SaleDateFrom, "2022-01-01")
            .with(FilterField::SaleDateTo, "2022-01-01");
        assert!(spec.matches(&r));
        assert!(!FilterSpec::new().with(FilterField::SaleDateTo, "2021-12-31").matches(&r));
    }

    #[test]
    fn engine_capacity_bounds_use_parsed_magnitude() {
        let r = record("2022-01-01", "Accord", 30000.0, "2.5L");
        let spec = FilterSpec::new()
            .with(FilterField::EngineCapacityMin, "2.0")
            .with(FilterField::EngineCapacityMax, "3.0");
        assert!(spec.matches(&r));
        assert!(!FilterSpec::new().with(FilterField::EngineCapacityMin, "2.6").matches(&r));
    }

    #[test]
    fn malformed_capacity_fails_active_bound() {
        let r = record("2022-01-01", "Accord", 30000.0, "n/a");
        assert!(!FilterSpec::new().with(FilterField::EngineCapacityMin, "1.0").matches(&r));
        assert!(!FilterSpec::new().with(FilterField::EngineCapacityMax, "9.0").matches(&r));
        // No bound set: the malformed value is irrelevant.
        assert!(FilterSpec::new().matches(&r));
    }

    #[test]
    fn unparsable_bound_is_ignored() {
        let r = record("2022-01-01", "Accord", 30000.0, "2.5L");
        assert!(FilterSpec::new().with(FilterField::SalesAmountMin, "lots").matches(&r));
    }

    #[test]
    fn sales_amount_bounds() {
        let r = record("2022-01-01", "Accord", 30000.0, "2.5L");
        assert!(FilterSpec::new().with(FilterField::SalesAmountMin, "30000").matches(&r));
        assert!(!FilterSpec::new().with(FilterField::SalesAmountMax, "29999").matches(&r));
    }

    #[test]
    fn apply_keeps_input_order() {
        let records = vec![
            record("2021-03-01", "Civic", 20000.0, "2.0L"),
            record("2022-01-01", "Accord", 30000.0, "2.5L"),
            record("2023-01-01", "Camry", 25000.0, "2.5L"),
        ];
        let spec = FilterSpec::new().with(FilterField::SaleDateFrom, "2022-01-01");
        let models: Vec<_> = apply(&records, &spec)
            .into_iter()
            .map(|r| r.car_model.as_str())
            .collect();
        assert_eq!(models, ["Accord", "Camry"]);
    }

    #[test]
    fn parse_assignment_accepts_dashes() {
        let (field, value) = FilterSpec::parse_assignment("sale-date-from=2022-01-01").unwrap();
        assert_eq!(field, FilterField::SaleDateFrom);
        assert_eq!(value, "2022-01-01");
        assert!(FilterSpec::parse_assignment("nope").is_err());
        assert!(FilterSpec::parse_assignment("mileage=3").is_err());
    }
}
