use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use ustr::Ustr;

use super::RowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortingRule {
    pub column: Ustr,
    pub desc: bool,
}

impl SortingRule {
    pub fn asc(column: &str) -> Self {
        Self {
            column: Ustr::from(column),
            desc: false,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: Ustr::from(column),
            desc: true,
        }
    }
}

/// Value of one column filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Values(BTreeSet<String>),
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn values<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::Values(values.into_iter().map(Into::into).collect())
    }

    /// An empty filter matches everything and is dropped instead of stored.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Values(values) => values.is_empty(),
            Self::DateRange { from, to } => from.is_none() && to.is_none(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page_index: usize,
    pub page_size: usize,
}

impl Pagination {
    /// `page_size` is at least 1.
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size: page_size.max(1),
        }
    }

    /// Page index that keeps the current first row visible under `page_size`.
    pub fn resized(self, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_index: self.page_index * self.page_size / page_size,
            page_size,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(0, 10)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEdge {
    Left,
    Right,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPinning {
    pub left: Vec<Ustr>,
    pub right: Vec<Ustr>,
}

impl ColumnPinning {
    pub fn right(columns: &[&str]) -> Self {
        Self {
            left: Vec::new(),
            right: columns.iter().copied().map(Ustr::from).collect(),
        }
    }

    pub fn edge(&self, column: Ustr) -> Option<PinEdge> {
        if self.left.contains(&column) {
            Some(PinEdge::Left)
        } else if self.right.contains(&column) {
            Some(PinEdge::Right)
        } else {
            None
        }
    }
}

/// Every interactive parameter of one table instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableState {
    pub sorting: Vec<SortingRule>,
    pub column_filters: BTreeMap<Ustr, FilterValue>,
    pub global_filter: String,
    pub pagination: Pagination,
    pub row_selection: BTreeSet<RowId>,
    /// Absent entries are visible.
    pub column_visibility: BTreeMap<Ustr, bool>,
    pub column_pinning: ColumnPinning,
}

impl TableState {
    pub fn is_column_visible(&self, column: Ustr) -> bool {
        self.column_visibility.get(&column).copied().unwrap_or(true)
    }

    /// `(priority, desc)` when `column` takes part in sorting.
    pub fn sort_of(&self, column: Ustr) -> Option<(usize, bool)> {
        self.sorting
            .iter()
            .position(|rule| rule.column == column)
            .map(|priority| (priority, self.sorting[priority].desc))
    }

    pub fn is_selected(&self, id: RowId) -> bool {
        self.row_selection.contains(&id)
    }

    /// Sorting after a header click: unsorted, ascending, descending, unsorted.
    ///
    /// Without `multi` the column replaces any other sort rule.
    pub fn next_sorting(&self, column: Ustr, multi: bool) -> Vec<SortingRule> {
        let current = self.sort_of(column);
        let next = match current {
            None => Some(SortingRule {
                column,
                desc: false,
            }),
            Some((_, false)) => Some(SortingRule { column, desc: true }),
            Some((_, true)) => None,
        };

        if multi {
            let mut sorting = self.sorting.clone();
            match (current, next) {
                (Some((priority, _)), Some(rule)) => sorting[priority] = rule,
                (Some((priority, _)), None) => {
                    sorting.remove(priority);
                }
                (None, Some(rule)) => sorting.push(rule),
                (None, None) => {}
            }
            sorting
        } else {
            next.into_iter().collect()
        }
    }
}

/// Optional seed for a new table; unset parts take their defaults.
#[derive(Debug, Clone, Default)]
pub struct InitialTableState {
    pub sorting: Vec<SortingRule>,
    pub column_filters: BTreeMap<Ustr, FilterValue>,
    pub global_filter: String,
    pub pagination: Option<Pagination>,
    pub row_selection: BTreeSet<RowId>,
    pub column_visibility: BTreeMap<Ustr, bool>,
    pub column_pinning: ColumnPinning,
}

impl From<InitialTableState> for TableState {
    fn from(initial: InitialTableState) -> Self {
        Self {
            sorting: initial.sorting,
            column_filters: initial
                .column_filters
                .into_iter()
                .filter(|(_, value)| !value.is_empty())
                .collect(),
            global_filter: initial.global_filter,
            pagination: initial
                .pagination
                .map(|seed| Pagination::new(seed.page_index, seed.page_size))
                .unwrap_or_default(),
            row_selection: initial.row_selection,
            column_visibility: initial.column_visibility,
            column_pinning: initial.column_pinning,
        }
    }
}

/// Counters shown under a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationInfo {
    /// 1-based.
    pub current_page: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub page_count: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    /// 1-based first row on the page, 0 when there are no rows.
    pub start_row: usize,
    pub end_row: usize,
}

impl PaginationInfo {
    pub fn new(pagination: Pagination, total_count: usize, page_count: usize) -> Self {
        let current_page = pagination.page_index + 1;
        let page_size = pagination.page_size;
        let (start_row, end_row) = if total_count == 0 {
            (0, 0)
        } else {
            let start = pagination.page_index * page_size + 1;
            (start.min(total_count), (current_page * page_size).min(total_count))
        };
        Self {
            current_page,
            page_size,
            total_count,
            page_count,
            has_next_page: current_page < page_count,
            has_previous_page: page_count > 0 && current_page > 1,
            start_row,
            end_row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_clicks_cycle_sorting() {
        let name = Ustr::from("name");
        let mut state = TableState::default();

        state.sorting = state.next_sorting(name, false);
        assert_eq!(state.sorting, vec![SortingRule::asc("name")]);
        state.sorting = state.next_sorting(name, false);
        assert_eq!(state.sorting, vec![SortingRule::desc("name")]);
        state.sorting = state.next_sorting(name, false);
        assert!(state.sorting.is_empty());
    }

    #[test]
    fn multi_sort_appends_and_single_sort_replaces() {
        let mut state = TableState {
            sorting: vec![SortingRule::desc("created_at")],
            ..TableState::default()
        };

        let multi = state.next_sorting(Ustr::from("name"), true);
        assert_eq!(
            multi,
            vec![SortingRule::desc("created_at"), SortingRule::asc("name")]
        );

        state.sorting = multi;
        assert_eq!(
            state.next_sorting(Ustr::from("name"), false),
            vec![SortingRule::desc("name")]
        );
    }

    #[test]
    fn resize_keeps_first_visible_row() {
        let pagination = Pagination::new(3, 10).resized(20);
        assert_eq!(pagination, Pagination::new(1, 20));
        assert_eq!(Pagination::new(0, 0).page_size, 1);
    }

    #[test]
    fn pagination_info_counts_rows() {
        let info = PaginationInfo::new(Pagination::new(1, 10), 25, 3);
        assert_eq!((info.start_row, info.end_row), (11, 20));
        assert!(info.has_next_page);
        assert!(info.has_previous_page);

        let empty = PaginationInfo::new(Pagination::new(1, 10), 0, 0);
        assert_eq!((empty.start_row, empty.end_row), (0, 0));
        assert!(!empty.has_next_page);
        assert!(!empty.has_previous_page);
    }

    #[test]
    fn empty_filters_are_dropped_from_initial_state() {
        let initial = InitialTableState {
            column_filters: BTreeMap::from([
                (Ustr::from("email"), FilterValue::text("  ")),
                (Ustr::from("status"), FilterValue::values(["active"])),
            ]),
            ..InitialTableState::default()
        };
        let state = TableState::from(initial);
        assert_eq!(state.column_filters.len(), 1);
        assert_eq!(state.pagination, Pagination::new(0, 10));
    }

    #[test]
    fn seeded_pagination_keeps_a_positive_page_size() {
        let initial = InitialTableState {
            pagination: Some(Pagination {
                page_index: 3,
                page_size: 0,
            }),
            ..InitialTableState::default()
        };
        let state = TableState::from(initial);
        assert_eq!(state.pagination, Pagination::new(3, 1));
    }
}
