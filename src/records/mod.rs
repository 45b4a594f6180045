//! Raw sale records as returned by `GET /api/tasks/{id}/raw`.
//!
//! Records are immutable once fetched. Everything the dashboard shows is
//! derived from a slice of them plus the current [`filter::FilterSpec`].

pub mod filter;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use filter::{FilterField, FilterSpec};

/// Leading decimal number of a unit-suffixed value such as `"2.5L"`.
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))").expect("leading number regex must compile")
});

/// One sale observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: u64,
    pub task_id: u64,
    pub dealer: String,
    /// `YYYY-MM-DD`. Lexicographic order is chronological order.
    pub sale_date: String,
    pub car_model: String,
    pub sales_amount: f64,
    pub color: String,
    /// Unit-suffixed string, e.g. `"2.5L"`.
    pub engine_capacity: String,
    pub model_year: i32,
    pub horsepower: u32,
    #[serde(rename = "type")]
    pub kind: String,
}

impl RawRecord {
    /// Engine capacity in litres, or `None` when the value has no numeric
    /// prefix.
    pub fn engine_litres(&self) -> Option<f64> {
        parse_engine_capacity(&self.engine_capacity)
    }

    /// The four-digit year prefix of `sale_date`.
    pub fn sale_year(&self) -> Option<i32> {
        let prefix = self.sale_date.get(..4)?;
        if !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        prefix.parse().ok()
    }
}

/// Parse the numeric magnitude of an engine capacity string.
///
/// Takes the leading number and ignores whatever unit follows it:
/// `"2.5L"` → 2.5, `"3.0 L"` → 3.0, `"L"` → `None`.
pub fn parse_engine_capacity(raw: &str) -> Option<f64> {
    LEADING_NUMBER
        .captures(raw)
        .and_then(|caps| caps[1].parse::<f64>().ok())
}

/// Render a number the way the table shows it: whole values drop the
/// fractional part (`20000.0` → `"20000"`).
pub fn format_amount(value: f64) -> String {
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_capacity_strips_unit_suffix() {
        assert_eq!(parse_engine_capacity("2.5L"), Some(2.5));
        assert_eq!(parse_engine_capacity("3.0 L"), Some(3.0));
        assert_eq!(parse_engine_capacity(" 2L"), Some(2.0));
        assert_eq!(parse_engine_capacity(".8l"), Some(0.8));
    }

    #[test]
    fn engine_capacity_rejects_garbage() {
        assert_eq!(parse_engine_capacity("L"), None);
        assert_eq!(parse_engine_capacity(""), None);
        assert_eq!(parse_engine_capacity("unknown"), None);
    }

    #[test]
    fn sale_year_reads_prefix() {
        let record = RawRecord {
            sale_date: "2023-07-14".into(),
            ..Default::default()
        };
        assert_eq!(record.sale_year(), Some(2023));

        let broken = RawRecord {
            sale_date: "n/a".into(),
            ..Default::default()
        };
        assert_eq!(broken.sale_year(), None);
    }

    #[test]
    fn format_amount_drops_trailing_zero() {
        assert_eq!(format_amount(20000.0), "20000");
        assert_eq!(format_amount(2.5), "2.5");
    }

    #[test]
    fn deserializes_backend_shape() {
        let json = r#"{
            "id": 7, "task_id": 3, "dealer": "Metro Motors",
            "sale_date": "2022-01-01", "car_model": "Honda Accord",
            "sales_amount": 30000.0, "color": "Red", "engine_capacity": "2.0L",
            "model_year": 2021, "horsepower": 190, "type": "SUV"
        }"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, "SUV");
        assert_eq!(record.engine_litres(), Some(2.0));
    }
}
