//! Analytics view model.
//!
//! Owns the records fetched for the selected task together with the filter
//! and table state. Every derived value (filtered rows, aggregates, summary,
//! current page) is recomputed from that state on each call; nothing derived
//! is stored.

use crate::analytics::{self, AggregatedData, FilterOptions, SalesSummary};
use crate::error::Result;
use crate::records::{self, FilterField, FilterSpec, RawRecord};
use crate::table::{Page, SortField, SortOrder, TableState};

#[derive(Debug, Clone, Default)]
pub struct AnalyticsView {
    task_id: Option<u64>,
    records: Vec<RawRecord>,
    filters: FilterSpec,
    table: TableState,
    notice: Option<String>,
}

impl AnalyticsView {
    pub fn new(page_size: usize) -> Self {
        Self {
            table: TableState::new(page_size),
            ..Self::default()
        }
    }

    pub fn task_id(&self) -> Option<u64> {
        self.task_id
    }

    /// Switch to another task, or to none.
    ///
    /// Records belong to the task they were fetched for, so they are dropped
    /// on any change. Filters and sort survive.
    pub fn select_task(&mut self, task_id: Option<u64>) {
        if self.task_id != task_id {
            self.records.clear();
            self.notice = None;
            self.table.reset_page();
        }
        self.task_id = task_id;
    }

    /// Take the outcome of a raw-data fetch.
    ///
    /// A failure leaves the loaded records as they were and is kept as an
    /// inline notice.
    pub fn load(&mut self, result: Result<Vec<RawRecord>>) {
        match result {
            Ok(records) => {
                self.records = records;
                self.notice = None;
                self.table.reset_page();
            }
            Err(e) => {
                log::warn!("Error fetching raw data: {e}");
                self.notice = Some(e.to_string());
            }
        }
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn table(&self) -> &TableState {
        &self.table
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_filter(&mut self, field: FilterField, value: impl Into<String>) {
        self.filters.set(field, value);
        self.table.reset_page();
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.table.reset_page();
    }

    pub fn select_column(&mut self, field: SortField) {
        self.table.select_column(field);
    }

    pub fn set_sort(&mut self, field: SortField, order: SortOrder) {
        self.table.sort_field = field;
        self.table.sort_order = order;
    }

    /// Jump to `page`, clamped to the pages the filtered rows fill.
    pub fn set_page(&mut self, page: usize) {
        let total = self.filtered().len();
        self.table.set_page(page, total);
    }

    pub fn next_page(&mut self) {
        let total = self.filtered().len();
        self.table.next_page(total);
    }

    pub fn prev_page(&mut self) {
        let total = self.filtered().len();
        self.table.prev_page(total);
    }

    // -- derived ------------------------------------------------------------

    pub fn filtered(&self) -> Vec<&RawRecord> {
        records::filter::apply(&self.records, &self.filters)
    }

    pub fn aggregated(&self) -> Option<AggregatedData> {
        analytics::aggregate(&self.filtered())
    }

    pub fn summary(&self) -> Option<SalesSummary> {
        analytics::summarize(&self.filtered())
    }

    /// Choices for the filter panel, drawn from all loaded records.
    pub fn options(&self) -> FilterOptions {
        analytics::filter_options(&self.records)
    }

    pub fn page(&self) -> Page<'_> {
        self.table.view(self.filtered())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
