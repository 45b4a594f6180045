//! Aggregation over the filtered record set.
//!
//! Provides:
//! - **Time series**: record count per sale year, ascending
//! - **Sales by model**: total sales and record count per car model, largest first
//! - **Summary cards**: total sales and cars sold per model
//! - **Filter options**: distinct values for the choice widgets
//!
//! Every function here is a pure function of its input slice. Views call them
//! again whenever records or filters change instead of caching results.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::records::RawRecord;

// ---------------------------------------------------------------------------
// Aggregated data
// ---------------------------------------------------------------------------

/// Count of records sold in one calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub year: i32,
    pub count: usize,
}

/// Sales rolled up for one car model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSales {
    pub car_model: String,
    pub total_sales: f64,
    /// Number of records behind `total_sales`. The backend's aggregate
    /// endpoint omits it, so it decodes as 0 there.
    #[serde(default)]
    pub count: usize,
}

/// Chart-ready aggregates, matching `GET /api/tasks/{id}/aggregated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedData {
    pub time_series: Vec<TimeSeriesPoint>,
    pub sales_by_car_model: Vec<ModelSales>,
}

/// Both reductions over `records`, or `None` when there is nothing to
/// aggregate.
pub fn aggregate(records: &[&RawRecord]) -> Option<AggregatedData> {
    if records.is_empty() {
        return None;
    }
    Some(AggregatedData {
        time_series: time_series(records),
        sales_by_car_model: sales_by_model(records),
    })
}

/// Group by the year prefix of `sale_date` and count.
///
/// Records without a readable year are left out.
pub fn time_series(records: &[&RawRecord]) -> Vec<TimeSeriesPoint> {
    let mut years: BTreeMap<i32, usize> = BTreeMap::new();
    for year in records.iter().filter_map(|r| r.sale_year()) {
        *years.entry(year).or_default() += 1;
    }
    years
        .into_iter()
        .map(|(year, count)| TimeSeriesPoint { year, count })
        .collect()
}

/// Group by `car_model`, summing `sales_amount`.
///
/// Sorted by total descending; models with equal totals keep the order in
/// which they first appeared.
pub fn sales_by_model(records: &[&RawRecord]) -> Vec<ModelSales> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<ModelSales> = Vec::new();

    for record in records {
        let slot = *index.entry(record.car_model.as_str()).or_insert_with(|| {
            groups.push(ModelSales {
                car_model: record.car_model.clone(),
                total_sales: 0.0,
                count: 0,
            });
            groups.len() - 1
        });
        groups[slot].total_sales += record.sales_amount;
        groups[slot].count += 1;
    }

    groups.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));
    groups
}

// ---------------------------------------------------------------------------
// Summary cards
// ---------------------------------------------------------------------------

/// Cars sold for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelCount {
    pub model: String,
    pub count: usize,
}

/// Headline numbers shown above the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    pub total_sales: f64,
    pub records: usize,
    /// First-seen model order.
    pub cars_sold_by_model: Vec<ModelCount>,
}

pub fn summarize(records: &[&RawRecord]) -> Option<SalesSummary> {
    if records.is_empty() {
        return None;
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut cars_sold_by_model: Vec<ModelCount> = Vec::new();
    for record in records {
        match index.get(record.car_model.as_str()) {
            Some(&slot) => cars_sold_by_model[slot].count += 1,
            None => {
                index.insert(&record.car_model, cars_sold_by_model.len());
                cars_sold_by_model.push(ModelCount {
                    model: record.car_model.clone(),
                    count: 1,
                });
            }
        }
    }

    Some(SalesSummary {
        total_sales: records.iter().map(|r| r.sales_amount).sum(),
        records: records.len(),
        cars_sold_by_model,
    })
}

// ---------------------------------------------------------------------------
// Filter options
// ---------------------------------------------------------------------------

/// Distinct values offered by the filter panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub dealers: Vec<String>,
    pub car_models: Vec<String>,
    pub model_years: Vec<i32>,
    pub colors: Vec<String>,
    pub types: Vec<String>,
}

/// Collect options from the full (unfiltered) record set so that choosing a
/// value never hides the alternatives.
pub fn filter_options(records: &[RawRecord]) -> FilterOptions {
    fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
        values
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect()
    }

    FilterOptions {
        dealers: distinct(records.iter().map(|r| &r.dealer)),
        car_models: distinct(records.iter().map(|r| &r.car_model)),
        model_years: records
            .iter()
            .map(|r| r.model_year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        colors: distinct(records.iter().map(|r| &r.color)),
        types: distinct(records.iter().map(|r| &r.kind)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
