use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use ustr::Ustr;

use super::column::retain_sortable;
use super::row_id::RowIds;
use super::{
    ColumnDef, FilterValue, InitialTableState, PageRow, RowId, RowIdMode, RowKey, TableChange,
    TableHandle, TableState,
};

/// Table over a dataset that is fully in memory.
///
/// Filtering, global search and sorting are derived from the rows and state and cached
/// until one of their inputs changes; paging only slices that cached order.
pub struct ClientTable<T> {
    rows: Vec<T>,
    ids: RowIds,
    columns: Vec<ColumnDef<T>>,
    state: TableState,
    /// Indices into `rows` after filtering and sorting.
    processed: Vec<usize>,
    revision: u64,
    loading: bool,
}

impl<T: RowKey> ClientTable<T> {
    pub fn new(columns: Vec<ColumnDef<T>>, initial: InitialTableState) -> Self {
        let mut state: TableState = initial.into();
        retain_sortable(&columns, &mut state.sorting);
        let mut table = Self {
            rows: Vec::new(),
            ids: RowIds::default(),
            columns,
            state,
            processed: Vec::new(),
            revision: 0,
            loading: false,
        };
        table.refresh();
        table
    }

    /// Replaces the dataset; selection keeps only ids that still exist.
    pub fn set_data(&mut self, rows: Vec<T>) {
        self.rows = rows;
        self.ids.assign(&self.rows);
        let ids = &self.ids;
        self.state.row_selection.retain(|id| ids.contains(*id));
        self.loading = false;
        self.refresh();
    }

    pub fn data(&self) -> &[T] {
        &self.rows
    }

    pub fn row_id_mode(&self) -> RowIdMode {
        self.ids.mode()
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Bumped whenever the derived row order is recomputed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Rows after filtering and sorting, before paging.
    pub fn filtered_rows(&self) -> Vec<&T> {
        self.processed.iter().map(|&index| &self.rows[index]).collect()
    }

    /// Distinct cell values of `column` with counts, over rows passing every other filter.
    pub fn faceted_values(&self, column: Ustr) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        let Some(def) = self.columns.iter().find(|def| def.id() == column) else {
            return counts;
        };
        for row in &self.rows {
            if self.passes_filters(row, Some(column)) && self.passes_search(row) {
                *counts.entry(def.value(row).display()).or_insert(0) += 1;
            }
        }
        counts
    }

    fn passes_filters(&self, row: &T, skip: Option<Ustr>) -> bool {
        self.state
            .column_filters
            .iter()
            .filter(|(column, _)| Some(**column) != skip)
            .all(|(column, filter)| {
                self.columns
                    .iter()
                    .find(|def| def.id() == *column)
                    .is_none_or(|def| def.matches(row, filter))
            })
    }

    fn passes_search(&self, row: &T) -> bool {
        let needle = self.state.global_filter.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.columns
            .iter()
            .filter(|def| def.is_searchable())
            .any(|def| def.value(row).display().to_lowercase().contains(&needle))
    }

    fn refresh(&mut self) {
        let mut processed: Vec<usize> = (0..self.rows.len())
            .filter(|&index| {
                let row = &self.rows[index];
                self.passes_filters(row, None) && self.passes_search(row)
            })
            .collect();

        let rules: Vec<_> = self
            .state
            .sorting
            .iter()
            .filter_map(|rule| {
                self.columns
                    .iter()
                    .find(|def| def.id() == rule.column && def.is_sortable())
                    .map(|def| (def, rule.desc))
            })
            .collect();
        if !rules.is_empty() {
            processed.sort_by(|&a, &b| {
                rules
                    .iter()
                    .map(|(def, desc)| {
                        let ordering = def.value(&self.rows[a]).compare(&def.value(&self.rows[b]));
                        if *desc { ordering.reverse() } else { ordering }
                    })
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        self.processed = processed;
        self.revision += 1;
        debug!(
            "client table refreshed: {} of {} rows (revision {})",
            self.processed.len(),
            self.rows.len(),
            self.revision
        );
    }

    fn set_filters(&mut self, filters: BTreeMap<Ustr, FilterValue>) {
        self.state.column_filters = filters
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .collect();
        self.state.pagination.page_index = 0;
        self.refresh();
    }

    fn clamp_page_index(&self, page_index: usize) -> usize {
        page_index.min(self.page_count().saturating_sub(1))
    }
}

impl<T: RowKey> TableHandle<T> for ClientTable<T> {
    fn state(&self) -> &TableState {
        &self.state
    }

    fn columns(&self) -> &[ColumnDef<T>] {
        &self.columns
    }

    fn page_rows(&self) -> Vec<PageRow<'_, T>> {
        let pagination = self.state.pagination;
        let start = pagination.page_index * pagination.page_size;
        self.processed
            .iter()
            .skip(start)
            .take(pagination.page_size)
            .enumerate()
            .map(|(index, &row_index)| PageRow {
                id: self.ids.ids()[row_index],
                index,
                row: &self.rows[row_index],
            })
            .collect()
    }

    fn row(&self, id: RowId) -> Option<&T> {
        self.ids.position(id).map(|index| &self.rows[index])
    }

    fn total_row_count(&self) -> usize {
        self.processed.len()
    }

    fn page_count(&self) -> usize {
        self.processed
            .len()
            .div_ceil(self.state.pagination.page_size)
    }

    fn is_loading(&self) -> bool {
        self.loading
    }

    fn apply(&mut self, change: TableChange) {
        match change {
            TableChange::Sorting(mut sorting) => {
                retain_sortable(&self.columns, &mut sorting);
                self.state.sorting = sorting;
                self.refresh();
            }
            TableChange::ColumnFilter { column, value } => {
                let mut filters = self.state.column_filters.clone();
                match value {
                    Some(value) if !value.is_empty() => {
                        filters.insert(column, value);
                    }
                    _ => {
                        filters.remove(&column);
                    }
                }
                self.set_filters(filters);
            }
            TableChange::ColumnFilters(filters) => self.set_filters(filters),
            TableChange::GlobalFilter(value) => {
                self.state.global_filter = value;
                self.refresh();
            }
            TableChange::PageIndex(page_index) => {
                self.state.pagination.page_index = self.clamp_page_index(page_index);
            }
            TableChange::PageSize(page_size) => {
                self.state.pagination = self.state.pagination.resized(page_size);
                self.state.pagination.page_index =
                    self.clamp_page_index(self.state.pagination.page_index);
            }
            TableChange::Selection(selection) => {
                let ids = &self.ids;
                self.state.row_selection = selection
                    .into_iter()
                    .filter(|id| ids.contains(*id))
                    .collect::<BTreeSet<_>>();
            }
            TableChange::ColumnVisibility { column, visible } => {
                if self
                    .columns
                    .iter()
                    .any(|def| def.id() == column && def.is_hideable())
                {
                    self.state.column_visibility.insert(column, visible);
                }
            }
            TableChange::ResetFilters => {
                self.state.global_filter.clear();
                self.state.sorting.clear();
                self.set_filters(BTreeMap::new());
            }
        }
    }
}
