//! Derived analytics over raw sale records, plus the session activity log.

pub mod activity;
pub mod aggregate;

pub use activity::ActivityLog;
pub use aggregate::{
    AggregatedData, FilterOptions, ModelCount, ModelSales, SalesSummary, TimeSeriesPoint,
    aggregate, filter_options, sales_by_model, summarize, time_series,
};
