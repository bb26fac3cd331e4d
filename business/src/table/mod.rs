//! Generic data table: state, column definitions and the two controllers.
//!
//! [`ClientTable`] sorts, filters and pages an in-memory dataset itself.
//! [`ServerTable`] only describes what to request next and shows the page it is given.
//! Both implement [`TableHandle`], which is all the renderer needs.

mod action;
mod client;
mod column;
mod row_id;
mod server;
mod state;
mod view;

use std::collections::{BTreeMap, BTreeSet};

use ustr::Ustr;

pub use action::{RowActionDispatcher, RowActionEvent, RowActionKind, RowActionSlot, RowMenuItem};
pub use client::ClientTable;
pub use column::{CellValue, ColumnDef, ColumnKind, FilterFn};
pub use row_id::{RowId, RowIdMode, RowKey};
pub use server::{
    DEFAULT_SEARCH_DEBOUNCE_MS, FiltersSink, ServerTable, ServerTableFilters, SortOrder,
};
pub use state::{
    ColumnPinning, FilterValue, InitialTableState, Pagination, PaginationInfo, PinEdge,
    SortingRule, TableState,
};
pub use view::{
    BulkAction, ColumnToggle, FilterField, FilterFieldKind, FilterOption, FloatingBar,
    HeaderCell, SKELETON_COLUMNS, SKELETON_ROWS, TableBody, TableView, ToolbarConfig, ViewCell,
    ViewRow, export_rows,
};

/// A single state transition requested by the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum TableChange {
    Sorting(Vec<SortingRule>),
    /// `None` (or an empty value) removes the filter.
    ColumnFilter {
        column: Ustr,
        value: Option<FilterValue>,
    },
    ColumnFilters(BTreeMap<Ustr, FilterValue>),
    GlobalFilter(String),
    PageIndex(usize),
    PageSize(usize),
    Selection(BTreeSet<RowId>),
    ColumnVisibility {
        column: Ustr,
        visible: bool,
    },
    /// Clears search, sorting and column filters.
    ResetFilters,
}

/// A row on the current page.
#[derive(Debug)]
pub struct PageRow<'a, T> {
    pub id: RowId,
    /// Position within the page.
    pub index: usize,
    pub row: &'a T,
}

impl<T> Clone for PageRow<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PageRow<'_, T> {}

/// What the renderer, toolbar and dialogs see of either controller.
pub trait TableHandle<T> {
    fn state(&self) -> &TableState;

    fn columns(&self) -> &[ColumnDef<T>];

    /// Rows to display, in display order.
    fn page_rows(&self) -> Vec<PageRow<'_, T>>;

    /// A known row by id; known means loaded into the controller.
    fn row(&self, id: RowId) -> Option<&T>;

    /// Rows across all pages after filtering.
    fn total_row_count(&self) -> usize;

    fn page_count(&self) -> usize;

    fn apply(&mut self, change: TableChange);

    /// No data yet; render the skeleton.
    fn is_loading(&self) -> bool {
        false
    }

    /// Data shown is being refreshed; render it dimmed.
    fn is_fetching(&self) -> bool {
        false
    }

    fn visible_columns(&self) -> Vec<&ColumnDef<T>> {
        let state = self.state();
        let (mut left, mut middle, mut right) = (Vec::new(), Vec::new(), Vec::new());
        for column in self.columns() {
            if column.is_hideable() && !state.is_column_visible(column.id()) {
                continue;
            }
            match state.column_pinning.edge(column.id()).or(column.pinned()) {
                Some(PinEdge::Left) => left.push(column),
                Some(PinEdge::Right) => right.push(column),
                None => middle.push(column),
            }
        }
        left.extend(middle);
        left.extend(right);
        left
    }

    fn column(&self, id: Ustr) -> Option<&ColumnDef<T>> {
        self.columns().iter().find(|column| column.id() == id)
    }

    fn pagination_info(&self) -> PaginationInfo {
        PaginationInfo::new(
            self.state().pagination,
            self.total_row_count(),
            self.page_count(),
        )
    }

    fn can_next_page(&self) -> bool {
        self.state().pagination.page_index + 1 < self.page_count()
    }

    fn can_previous_page(&self) -> bool {
        self.page_count() > 0 && self.state().pagination.page_index > 0
    }

    fn set_page_index(&mut self, page_index: usize) {
        self.apply(TableChange::PageIndex(page_index));
    }

    fn next_page(&mut self) {
        if self.can_next_page() {
            let index = self.state().pagination.page_index + 1;
            self.set_page_index(index);
        }
    }

    fn previous_page(&mut self) {
        if self.can_previous_page() {
            let index = self.state().pagination.page_index - 1;
            self.set_page_index(index);
        }
    }

    fn first_page(&mut self) {
        if self.can_previous_page() {
            self.set_page_index(0);
        }
    }

    fn last_page(&mut self) {
        if self.can_next_page() {
            let last = self.page_count() - 1;
            self.set_page_index(last);
        }
    }

    fn set_page_size(&mut self, page_size: usize) {
        self.apply(TableChange::PageSize(page_size));
    }

    fn set_sorting(&mut self, sorting: Vec<SortingRule>) {
        self.apply(TableChange::Sorting(sorting));
    }

    /// Header click on a sortable column.
    fn toggle_sort(&mut self, column: Ustr, multi: bool) {
        if self.column(column).is_some_and(ColumnDef::is_sortable) {
            let sorting = self.state().next_sorting(column, multi);
            self.set_sorting(sorting);
        }
    }

    fn set_column_filter(&mut self, column: Ustr, value: Option<FilterValue>) {
        self.apply(TableChange::ColumnFilter { column, value });
    }

    fn set_global_filter(&mut self, value: String) {
        self.apply(TableChange::GlobalFilter(value));
    }

    fn reset_filters(&mut self) {
        self.apply(TableChange::ResetFilters);
    }

    fn set_column_visible(&mut self, column: Ustr, visible: bool) {
        self.apply(TableChange::ColumnVisibility { column, visible });
    }

    fn is_selected(&self, id: RowId) -> bool {
        self.state().is_selected(id)
    }

    fn set_row_selected(&mut self, id: RowId, selected: bool) {
        let mut selection = self.state().row_selection.clone();
        let changed = if selected {
            selection.insert(id)
        } else {
            selection.remove(&id)
        };
        if changed {
            self.apply(TableChange::Selection(selection));
        }
    }

    fn toggle_row(&mut self, id: RowId) {
        let selected = self.is_selected(id);
        self.set_row_selected(id, !selected);
    }

    fn toggle_all_page_rows(&mut self, selected: bool) {
        let page_ids: Vec<RowId> = self.page_rows().iter().map(|row| row.id).collect();
        let mut selection = self.state().row_selection.clone();
        for id in page_ids {
            if selected {
                selection.insert(id);
            } else {
                selection.remove(&id);
            }
        }
        self.apply(TableChange::Selection(selection));
    }

    fn is_all_page_rows_selected(&self) -> bool {
        let rows = self.page_rows();
        !rows.is_empty() && rows.iter().all(|row| self.is_selected(row.id))
    }

    fn is_some_page_rows_selected(&self) -> bool {
        !self.is_all_page_rows_selected() && self.page_rows().iter().any(|row| self.is_selected(row.id))
    }

    fn clear_selection(&mut self) {
        self.apply(TableChange::Selection(BTreeSet::new()));
    }

    fn selected_ids(&self) -> Vec<RowId> {
        self.state().row_selection.iter().copied().collect()
    }

    fn selected_rows(&self) -> Vec<&T> {
        self.state()
            .row_selection
            .iter()
            .filter_map(|id| self.row(*id))
            .collect()
    }
}
