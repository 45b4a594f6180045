//! Terminal rendering helpers: number formatting, table cells, bar charts.
//!
//! Everything here returns strings so the command handlers decide where
//! output goes.

use colored::{ColoredString, Colorize};

use crate::records::{RawRecord, format_amount};
use crate::table::SortField;
use crate::task::TaskStatus;

const BAR: char = '█';

/// Format a number with comma separators for readability.
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Whole-dollar amount with separators: `1234567.4` → `$1,234,567`.
pub fn format_money(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}${}", format_number(rounded.abs() as usize))
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

pub fn colorize_status(status: TaskStatus) -> ColoredString {
    match status {
        TaskStatus::Pending => status.as_str().yellow(),
        TaskStatus::InProgress => status.as_str().blue(),
        TaskStatus::Completed => status.as_str().green(),
    }
}

/// Display text of one table cell.
pub fn cell(record: &RawRecord, field: SortField) -> String {
    match field {
        SortField::Id => record.id.to_string(),
        SortField::SaleDate => record.sale_date.clone(),
        SortField::Dealer => record.dealer.clone(),
        SortField::CarModel => record.car_model.clone(),
        SortField::SalesAmount => format_amount(record.sales_amount),
        SortField::Color => record.color.clone(),
        SortField::EngineCapacity => record.engine_capacity.clone(),
        SortField::ModelYear => record.model_year.to_string(),
        SortField::Horsepower => record.horsepower.to_string(),
        SortField::Type => record.kind.clone(),
    }
}

/// Column width in the raw data table.
pub fn column_width(field: SortField) -> usize {
    match field {
        SortField::Id | SortField::ModelYear => 6,
        SortField::Horsepower => 5,
        SortField::SaleDate | SortField::SalesAmount => 11,
        SortField::EngineCapacity | SortField::Color | SortField::Type => 9,
        SortField::Dealer | SortField::CarModel => 18,
    }
}

/// Quote a CSV field when it contains a separator, quote or newline.
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Horizontal bar chart, one line per `(label, value)`.
///
/// Bars scale to the largest value; a non-zero value always gets at least
/// one block. Negative values draw no bar.
pub fn bar_chart<F>(rows: &[(String, f64)], width: usize, fmt_value: F) -> Vec<String>
where
    F: Fn(f64) -> String,
{
    let max = rows.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let label_width = rows
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0)
        .min(24);

    rows.iter()
        .map(|(label, value)| {
            let blocks = if max > 0.0 && *value > 0.0 {
                ((value / max) * width as f64).round().max(1.0) as usize
            } else {
                0
            };
            format!(
                "{:<label_width$} {} {}",
                truncate(label, label_width),
                BAR.to_string().repeat(blocks),
                fmt_value(*value),
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
