//! Filtering and pagination over the merged table.
//!
//! Hosts present one equality filter per column (with an `All`
//! escape) and page through the result ten rows at a time. Both
//! operations work on row indices so callers can map selections back to
//! follow-up keys.

use std::collections::BTreeMap;
use std::ops::Range;

use clash_model::{ClashRecord, ClashTable, dates};

/// Fixed page size of the review view.
pub const PAGE_SIZE: usize = 10;

/// Columns a host can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterColumn {
    ClashId,
    ViewName,
    MainZone,
    SubZone,
    Level,
    IssueType,
    IssueStatus,
    Discipline,
    AssignTo,
    Usage,
}

impl FilterColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterColumn::ClashId => "Clash ID",
            FilterColumn::ViewName => "View Name",
            FilterColumn::MainZone => "Main Zone",
            FilterColumn::SubZone => "Sub Zone",
            FilterColumn::Level => "Level",
            FilterColumn::IssueType => "Issues Type",
            FilterColumn::IssueStatus => "Issues Status",
            FilterColumn::Discipline => "Discipline",
            FilterColumn::AssignTo => "Assign To",
            FilterColumn::Usage => "Usage",
        }
    }

    /// Every filterable column, in presentation order.
    pub fn all() -> [FilterColumn; 10] {
        [
            FilterColumn::ClashId,
            FilterColumn::ViewName,
            FilterColumn::MainZone,
            FilterColumn::SubZone,
            FilterColumn::Level,
            FilterColumn::IssueType,
            FilterColumn::IssueStatus,
            FilterColumn::Discipline,
            FilterColumn::AssignTo,
            FilterColumn::Usage,
        ]
    }

    /// The record's value in this column, as compared and displayed.
    /// Missing values read as the empty string.
    pub fn value_of(&self, record: &ClashRecord) -> String {
        let opt = |value: &Option<String>| value.clone().unwrap_or_default();
        match self {
            FilterColumn::ClashId => record.clash_id.clone(),
            FilterColumn::ViewName => record.view_name.clone(),
            FilterColumn::MainZone => opt(&record.main_zone),
            FilterColumn::SubZone => opt(&record.sub_zone),
            FilterColumn::Level => opt(&record.level),
            FilterColumn::IssueType => opt(&record.issue_type),
            FilterColumn::IssueStatus => opt(&record.issue_status),
            FilterColumn::Discipline => opt(&record.discipline),
            FilterColumn::AssignTo => opt(&record.assign_to),
            FilterColumn::Usage => record.follow_up.usage.as_str().to_string(),
        }
    }
}

/// A column's current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Equals(String),
}

/// The operator's current filter choices. Columns not present select
/// `All`.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    selections: BTreeMap<FilterColumn, Selection>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: FilterColumn, selection: Selection) {
        match selection {
            // `All` is the absence of a constraint.
            Selection::All => {
                self.selections.remove(&column);
            }
            Selection::Equals(value) => {
                self.selections.insert(column, Selection::Equals(value));
            }
        }
    }

    pub fn select(&mut self, column: FilterColumn, value: impl Into<String>) {
        self.set(column, Selection::Equals(value.into()));
    }

    pub fn is_unfiltered(&self) -> bool {
        self.selections.is_empty()
    }

    /// Indices of rows passing every selected equality constraint.
    pub fn apply(&self, table: &ClashTable) -> Vec<usize> {
        table
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                self.selections.iter().all(|(column, selection)| match selection {
                    Selection::All => true,
                    Selection::Equals(value) => &column.value_of(record) == value,
                })
            })
            .map(|(index, _)| index)
            .collect()
    }
}

/// Distinct values of a column, in first-seen row order; the host
/// prepends its `All` entry.
pub fn distinct_values(table: &ClashTable, column: FilterColumn) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    let mut values = Vec::new();
    for record in table {
        let value = column.value_of(record);
        if seen.insert(value.clone()) {
            values.push(value);
        }
    }
    values
}

/// Page arithmetic over a filtered row set. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    total_rows: usize,
}

impl Pagination {
    pub fn new(total_rows: usize) -> Self {
        Self { total_rows }
    }

    pub fn total_pages(&self) -> usize {
        self.total_rows.div_ceil(PAGE_SIZE)
    }

    /// Whether a page selector is worth showing; a single page is
    /// selected implicitly.
    pub fn needs_selector(&self) -> bool {
        self.total_pages() > 1
    }

    /// Index range of a page; out-of-range pages are empty.
    pub fn page_range(&self, page: usize) -> Range<usize> {
        if page == 0 || page > self.total_pages() {
            return 0..0;
        }
        let start = (page - 1) * PAGE_SIZE;
        let end = (start + PAGE_SIZE).min(self.total_rows);
        start..end
    }
}

/// Slice one page out of a filtered index set.
pub fn page_of<'a>(rows: &'a [usize], page: usize) -> &'a [usize] {
    &rows[Pagination::new(rows.len()).page_range(page)]
}

/// Rows flagged invalid for date-dependent filters (no decodable found
/// date).
pub fn rows_missing_date(table: &ClashTable) -> Vec<usize> {
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.date_found.is_none())
        .map(|(index, _)| index)
        .collect()
}

/// Display form of a record's found date; unknown dates render empty.
pub fn display_date(record: &ClashRecord) -> String {
    record.date_found.map(dates::format_date).unwrap_or_default()
}
