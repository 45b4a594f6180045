//! Sorting and pagination for the raw data table.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::records::RawRecord;

/// Rows per page when nothing is configured.
pub const DEFAULT_PAGE_SIZE: usize = 20;

// ---------------------------------------------------------------------------
// Sort keys
// ---------------------------------------------------------------------------

/// A sortable table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Id,
    SaleDate,
    Dealer,
    CarModel,
    SalesAmount,
    Color,
    EngineCapacity,
    ModelYear,
    Horsepower,
    Type,
}

impl SortField {
    /// Columns in display order.
    pub const COLUMNS: [SortField; 10] = [
        Self::Id,
        Self::SaleDate,
        Self::Dealer,
        Self::CarModel,
        Self::SalesAmount,
        Self::Color,
        Self::EngineCapacity,
        Self::ModelYear,
        Self::Horsepower,
        Self::Type,
    ];

    /// Wire name, as sent in `sort_by`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::SaleDate => "sale_date",
            Self::Dealer => "dealer",
            Self::CarModel => "car_model",
            Self::SalesAmount => "sales_amount",
            Self::Color => "color",
            Self::EngineCapacity => "engine_capacity",
            Self::ModelYear => "model_year",
            Self::Horsepower => "horsepower",
            Self::Type => "type",
        }
    }

    /// Column header.
    pub fn label(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::SaleDate => "Sale Date",
            Self::Dealer => "Dealer",
            Self::CarModel => "Car Model",
            Self::SalesAmount => "Sales Amount",
            Self::Color => "Color",
            Self::EngineCapacity => "Engine Cap",
            Self::ModelYear => "Model Year",
            Self::Horsepower => "Horsepower",
            Self::Type => "Type",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::COLUMNS.into_iter().find(|f| f.as_str() == normalized)
    }

    /// Natural ordering for this column: numeric columns compare as numbers,
    /// everything else (dates included) lexicographically.
    pub fn compare(self, a: &RawRecord, b: &RawRecord) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::SaleDate => a.sale_date.cmp(&b.sale_date),
            Self::Dealer => a.dealer.cmp(&b.dealer),
            Self::CarModel => a.car_model.cmp(&b.car_model),
            Self::SalesAmount => a.sales_amount.total_cmp(&b.sales_amount),
            Self::Color => a.color.cmp(&b.color),
            Self::EngineCapacity => a.engine_capacity.cmp(&b.engine_capacity),
            Self::ModelYear => a.model_year.cmp(&b.model_year),
            Self::Horsepower => a.horsepower.cmp(&b.horsepower),
            Self::Type => a.kind.cmp(&b.kind),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Anything that is not `desc` sorts ascending, as the backend does.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable sort in either direction: ties keep their incoming order.
pub fn sort_records(records: &mut [&RawRecord], field: SortField, order: SortOrder) {
    match order {
        SortOrder::Asc => records.sort_by(|a, b| field.compare(a, b)),
        SortOrder::Desc => records.sort_by(|a, b| field.compare(b, a)),
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// One page of table rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    /// 1-based page number after clamping.
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: Vec<&'a RawRecord>,
}

/// `ceil(items / page_size)`; a zero page size is treated as 1.
pub fn total_pages(items: usize, page_size: usize) -> usize {
    items.div_ceil(page_size.max(1))
}

/// Slice out page `page` (1-based), clamped to `[1, max(total_pages, 1)]`.
pub fn paginate<'a>(records: &[&'a RawRecord], page: usize, page_size: usize) -> Page<'a> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(records.len(), page_size);
    let number = page.clamp(1, total_pages.max(1));
    let start = ((number - 1) * page_size).min(records.len());
    let end = (start + page_size).min(records.len());

    Page {
        number,
        total_pages,
        total_items: records.len(),
        items: records[start..end].to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Table state
// ---------------------------------------------------------------------------

/// Sort column, direction and current page of the raw data table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    page: usize,
    page_size: usize,
}

impl Default for TableState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl TableState {
    /// Newest sales first, page 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            sort_field: SortField::SaleDate,
            sort_order: SortOrder::Desc,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Clicking the active column flips direction; a new column starts
    /// ascending.
    pub fn select_column(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_order = self.sort_order.toggled();
        } else {
            self.sort_field = field;
            self.sort_order = SortOrder::Asc;
        }
    }

    /// Jump to `page`, clamped to `[1, last page]` for `total_items` rows.
    pub fn set_page(&mut self, page: usize, total_items: usize) {
        self.page = page.clamp(1, self.last_page(total_items));
    }

    /// Back to page 1. Called whenever the filter changes.
    pub fn reset_page(&mut self) {
        self.page = 1;
    }

    pub fn next_page(&mut self, total_items: usize) {
        self.set_page(self.page.saturating_add(1), total_items);
    }

    /// Steps back from the page actually shown, even if the stored page ran
    /// past the end after the rows shrank.
    pub fn prev_page(&mut self, total_items: usize) {
        let shown = self.page.min(self.last_page(total_items));
        self.set_page(shown.saturating_sub(1), total_items);
    }

    fn last_page(&self, total_items: usize) -> usize {
        total_pages(total_items, self.page_size).max(1)
    }

    /// Sort `rows` and cut out the current page.
    pub fn view<'a>(&self, mut rows: Vec<&'a RawRecord>) -> Page<'a> {
        sort_records(&mut rows, self.sort_field, self.sort_order);
        paginate(&rows, self.page, self.page_size)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: u64) -> Vec<RawRecord> {
        (1..=n)
            .map(|id| RawRecord {
                id,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn sort_is_stable_in_both_directions() {
        let data: Vec<RawRecord> = [("B", 1), ("A", 2), ("B", 3), ("A", 4)]
            .into_iter()
            .map(|(model, id)| RawRecord {
                id,
                car_model: model.into(),
                ..Default::default()
            })
            .collect();

        let mut asc: Vec<&RawRecord> = data.iter().collect();
        sort_records(&mut asc, SortField::CarModel, SortOrder::Asc);
        assert_eq!(asc.iter().map(|r| r.id).collect::<Vec<_>>(), [2, 4, 1, 3]);

        let mut desc: Vec<&RawRecord> = data.iter().collect();
        sort_records(&mut desc, SortField::CarModel, SortOrder::Desc);
        assert_eq!(desc.iter().map(|r| r.id).collect::<Vec<_>>(), [1, 3, 2, 4]);
    }

    #[test]
    fn numeric_columns_sort_numerically() {
        let data: Vec<RawRecord> = [9.0, 10.0, 100.0]
            .into_iter()
            .map(|amount| RawRecord {
                sales_amount: amount,
                ..Default::default()
            })
            .collect();
        let mut refs: Vec<&RawRecord> = data.iter().collect();
        sort_records(&mut refs, SortField::SalesAmount, SortOrder::Desc);
        let amounts: Vec<f64> = refs.iter().map(|r| r.sales_amount).collect();
        assert_eq!(amounts, [100.0, 10.0, 9.0]);
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(40, 20), 2);
        assert_eq!(total_pages(41, 20), 3);
    }

    #[test]
    fn last_page_holds_remainder() {
        let data = rows(45);
        let refs: Vec<&RawRecord> = data.iter().collect();
        let page = paginate(&refs, 3, 20);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items[0].id, 41);

        let even = rows(40);
        let refs: Vec<&RawRecord> = even.iter().collect();
        assert_eq!(paginate(&refs, 2, 20).items.len(), 20);
    }

    #[test]
    fn out_of_range_pages_clamp() {
        let data = rows(45);
        let refs: Vec<&RawRecord> = data.iter().collect();
        assert_eq!(paginate(&refs, 99, 20).number, 3);
        assert_eq!(paginate(&refs, 0, 20).number, 1);

        let empty = paginate(&[], 4, 20);
        assert_eq!(empty.number, 1);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn select_column_toggles_then_switches() {
        let mut table = TableState::default();
        assert_eq!(table.sort_field, SortField::SaleDate);
        assert_eq!(table.sort_order, SortOrder::Desc);

        table.select_column(SortField::SaleDate);
        assert_eq!(table.sort_order, SortOrder::Asc);

        table.select_column(SortField::Horsepower);
        assert_eq!(table.sort_field, SortField::Horsepower);
        assert_eq!(table.sort_order, SortOrder::Asc);
    }

    #[test]
    fn next_and_prev_stay_in_range() {
        let mut table = TableState::new(10);
        table.prev_page(25);
        assert_eq!(table.page(), 1);
        table.next_page(25);
        table.next_page(25);
        table.next_page(25);
        assert_eq!(table.page(), 3);
        table.reset_page();
        assert_eq!(table.page(), 1);
    }

    #[test]
    fn set_page_is_clamped_when_stored() {
        let mut table = TableState::new(20);
        table.set_page(99, 45);
        assert_eq!(table.page(), 3);
        table.prev_page(45);
        assert_eq!(table.page(), 2);

        table.set_page(0, 45);
        assert_eq!(table.page(), 1);
        table.set_page(5, 0);
        assert_eq!(table.page(), 1);
    }

    #[test]
    fn huge_page_does_not_overflow() {
        let mut table = TableState::new(20);
        table.set_page(usize::MAX, 45);
        table.next_page(45);
        assert_eq!(table.page(), 3);
    }

    #[test]
    fn field_names_round_trip_through_parse() {
        for field in SortField::COLUMNS {
            assert_eq!(SortField::parse(field.as_str()), Some(field));
        }
        assert_eq!(SortField::parse("mileage"), None);
        assert_eq!(SortOrder::parse("DESC"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("sideways"), SortOrder::Asc);
    }
}
