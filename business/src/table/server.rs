//! Server-driven table: local state only describes what to request next.
//!
//! Every change that invalidates the current page is translated into a
//! [`ServerTableFilters`] value and handed to the sink registered with
//! [`ServerTable::on_filters_change`]. Search input goes through a [`Debouncer`] and is
//! released from [`ServerTable::tick`], which the frame loop calls with the frame clock.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use beaute_states::Debouncer;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use ustr::Ustr;

use super::column::retain_sortable;
use super::row_id::RowIds;
use super::{
    ColumnDef, FilterValue, PageRow, Pagination, RowId, RowKey, SortingRule, TableChange,
    TableHandle, TableState,
};

pub const DEFAULT_SEARCH_DEBOUNCE_MS: i64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
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
}

/// Query parameters for one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTableFilters {
    /// 1-based.
    pub page: usize,
    pub limit: usize,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
    pub columns: BTreeMap<String, FilterValue>,
}

impl Default for ServerTableFilters {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
            sort: None,
            order: None,
            columns: BTreeMap::new(),
        }
    }
}

impl ServerTableFilters {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Query pairs in wire order: paging, search, sort, then column filters by key.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_owned(), self.page.to_string()),
            ("limit".to_owned(), self.limit.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search".to_owned(), search.clone()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_owned(), sort.clone()));
        }
        if let Some(order) = self.order {
            pairs.push(("order".to_owned(), order.as_str().to_owned()));
        }
        for (key, value) in &self.columns {
            match value {
                FilterValue::Text(text) => pairs.push((key.clone(), text.trim().to_owned())),
                FilterValue::Values(values) => {
                    let joined = values.iter().map(String::as_str).collect::<Vec<_>>().join(",");
                    pairs.push((key.clone(), joined));
                }
                FilterValue::DateRange { from, to } => {
                    if let Some(from) = from {
                        pairs.push((format!("{key}_from"), from.format("%Y-%m-%d").to_string()));
                    }
                    if let Some(to) = to {
                        pairs.push((format!("{key}_to"), to.format("%Y-%m-%d").to_string()));
                    }
                }
            }
        }
        pairs.retain(|(_, value)| !value.is_empty());
        pairs
    }
}

pub type FiltersSink = Box<dyn FnMut(&ServerTableFilters) + Send>;

pub struct ServerTable<T> {
    rows: Vec<T>,
    ids: RowIds,
    columns: Vec<ColumnDef<T>>,
    state: TableState,
    filters: ServerTableFilters,
    total_count: usize,
    page_count: usize,
    search: Debouncer<String>,
    /// Last frame time seen by [`ServerTable::tick`]; stamps search input.
    clock: DateTime<Utc>,
    sink: Option<FiltersSink>,
    loading: bool,
    fetching: bool,
}

impl<T> fmt::Debug for ServerTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerTable")
            .field("rows", &self.rows.len())
            .field("filters", &self.filters)
            .field("total_count", &self.total_count)
            .field("page_count", &self.page_count)
            .field("search_pending", &self.search.is_pending())
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: RowKey> ServerTable<T> {
    /// Starts in the loading state until the first page arrives.
    ///
    /// `page` and `limit` are raised to at least 1; a sort on a column that cannot be
    /// sorted is dropped.
    pub fn new(columns: Vec<ColumnDef<T>>, mut filters: ServerTableFilters) -> Self {
        filters.page = filters.page.max(1);
        filters.limit = filters.limit.max(1);
        let sortable = filters.sort.as_deref().is_none_or(|sort| {
            columns
                .iter()
                .any(|def| def.id().as_str() == sort && def.is_sortable())
        });
        if !sortable {
            filters.sort = None;
            filters.order = None;
        }
        let mut table = Self {
            rows: Vec::new(),
            ids: RowIds::default(),
            columns,
            state: TableState::default(),
            filters,
            total_count: 0,
            page_count: 0,
            search: Debouncer::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            clock: Utc::now(),
            sink: None,
            loading: true,
            fetching: false,
        };
        table.sync_state();
        table
    }

    pub fn with_debounce_ms(mut self, millis: i64) -> Self {
        self.search = Debouncer::from_millis(millis);
        self
    }

    /// Column visibility and pinning are local preferences, never sent upstream.
    pub fn with_visibility(mut self, visibility: BTreeMap<Ustr, bool>) -> Self {
        self.state.column_visibility = visibility;
        self
    }

    pub fn on_filters_change(mut self, sink: impl FnMut(&ServerTableFilters) + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn filters(&self) -> &ServerTableFilters {
        &self.filters
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Installs the page fetched for the current filters.
    pub fn set_page(&mut self, rows: Vec<T>, total_count: usize, page_count: usize) {
        self.rows = rows;
        self.ids.assign(&self.rows);
        self.total_count = total_count;
        self.page_count = page_count;
        let ids = &self.ids;
        self.state.row_selection.retain(|id| ids.contains(*id));
        self.loading = false;
        self.fetching = false;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_fetching(&mut self, fetching: bool) {
        self.fetching = fetching;
    }

    /// Ends a failed request without touching the rows already shown.
    pub fn fetch_failed(&mut self) {
        self.loading = false;
        self.fetching = false;
    }

    /// When pending search input becomes due; lets the UI schedule a repaint.
    pub fn search_due_at(&self) -> Option<DateTime<Utc>> {
        self.search.due_at()
    }

    /// Advances the clock and releases debounced search input.
    ///
    /// Returns whether filters were emitted.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        self.clock = now;
        let Some(search) = self.search.poll(now) else {
            return false;
        };
        let search = Some(search.trim().to_owned()).filter(|search| !search.is_empty());
        if search == self.filters.search {
            return false;
        }
        self.filters.search = search;
        self.filters.page = 1;
        self.sync_state();
        self.emit();
        true
    }

    /// Merges a caller-side change (e.g. a toolbar filter builder) and emits it as is.
    pub fn update_server_filters(&mut self, update: impl FnOnce(&mut ServerTableFilters)) {
        update(&mut self.filters);
        self.filters.page = self.filters.page.max(1);
        self.filters.limit = self.filters.limit.max(1);
        self.sync_state();
        self.emit();
    }

    fn clear_filters(&mut self) {
        self.search.cancel();
        self.filters.search = None;
        self.filters.sort = None;
        self.filters.order = None;
        self.filters.columns.clear();
        self.filters.page = 1;
        self.sync_state();
        self.emit();
    }

    /// Mirrors the outbound filters into the table state the renderer reads.
    fn sync_state(&mut self) {
        self.state.pagination = Pagination::new(self.filters.page.saturating_sub(1), self.filters.limit);
        self.state.sorting = match (&self.filters.sort, self.filters.order) {
            (Some(column), order) => vec![SortingRule {
                column: Ustr::from(column),
                desc: order == Some(SortOrder::Desc),
            }],
            (None, _) => Vec::new(),
        };
        self.state.column_filters = self
            .filters
            .columns
            .iter()
            .map(|(key, value)| (Ustr::from(key), value.clone()))
            .collect();
        if !self.search.is_pending() {
            self.state.global_filter = self.filters.search.clone().unwrap_or_default();
        }
    }

    fn emit(&mut self) {
        match self.sink.as_mut() {
            Some(sink) => {
                debug!("server table filters changed: {:?}", self.filters);
                sink(&self.filters);
            }
            None => debug!("server table filters changed without a sink; local only"),
        }
    }
}

impl<T: RowKey> TableHandle<T> for ServerTable<T> {
    fn state(&self) -> &TableState {
        &self.state
    }

    fn columns(&self) -> &[ColumnDef<T>] {
        &self.columns
    }

    fn page_rows(&self) -> Vec<PageRow<'_, T>> {
        self.rows
            .iter()
            .zip(self.ids.ids())
            .enumerate()
            .map(|(index, (row, id))| PageRow { id: *id, index, row })
            .collect()
    }

    fn row(&self, id: RowId) -> Option<&T> {
        self.ids.position(id).map(|index| &self.rows[index])
    }

    fn total_row_count(&self) -> usize {
        self.total_count
    }

    fn page_count(&self) -> usize {
        self.page_count
    }

    fn is_loading(&self) -> bool {
        self.loading
    }

    fn is_fetching(&self) -> bool {
        self.fetching
    }

    fn apply(&mut self, change: TableChange) {
        match change {
            TableChange::Sorting(mut sorting) => {
                retain_sortable(&self.columns, &mut sorting);
                let first = sorting.first().copied();
                self.filters.sort = first.map(|rule| rule.column.to_string());
                self.filters.order =
                    first.map(|rule| if rule.desc { SortOrder::Desc } else { SortOrder::Asc });
                self.filters.page = 1;
                self.sync_state();
                self.emit();
            }
            TableChange::ColumnFilter { column, value } => {
                match value {
                    Some(value) if !value.is_empty() => {
                        self.filters.columns.insert(column.to_string(), value);
                    }
                    _ => {
                        self.filters.columns.remove(column.as_str());
                    }
                }
                self.filters.page = 1;
                self.sync_state();
                self.emit();
            }
            TableChange::ColumnFilters(filters) => {
                self.filters.columns = filters
                    .into_iter()
                    .filter(|(_, value)| !value.is_empty())
                    .map(|(column, value)| (column.to_string(), value))
                    .collect();
                self.filters.page = 1;
                self.sync_state();
                self.emit();
            }
            TableChange::GlobalFilter(value) => {
                self.state.global_filter = value.clone();
                self.search.push(value, self.clock);
            }
            TableChange::PageIndex(page_index) => {
                self.filters.page = page_index + 1;
                self.sync_state();
                self.emit();
            }
            TableChange::PageSize(page_size) => {
                let pagination = self.state.pagination.resized(page_size);
                self.filters.page = pagination.page_index + 1;
                self.filters.limit = pagination.page_size;
                self.sync_state();
                self.emit();
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
            TableChange::ResetFilters => self.clear_filters(),
        }
    }
}

impl<T> Drop for ServerTable<T> {
    fn drop(&mut self) {
        if self.search.cancel().is_some() {
            debug!("server table dropped with pending search; discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::{NaiveDate, TimeDelta, TimeZone};

    use super::*;
    use crate::table::CellValue;

    #[derive(Debug, Clone)]
    struct Product {
        id: u64,
        name: &'static str,
    }

    impl RowKey for Product {
        fn row_key(&self) -> Option<RowId> {
            Some(RowId::from(self.id))
        }
    }

    type Emitted = Arc<Mutex<Vec<ServerTableFilters>>>;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn ms(n: i64) -> TimeDelta {
        TimeDelta::milliseconds(n)
    }

    fn columns() -> Vec<ColumnDef<Product>> {
        vec![
            ColumnDef::select(),
            ColumnDef::data("name", "Name", |p: &Product| CellValue::text(p.name)),
        ]
    }

    fn table() -> (ServerTable<Product>, Emitted) {
        let emitted: Emitted = Arc::default();
        let sink = emitted.clone();
        let mut table = ServerTable::new(columns(), ServerTableFilters::default())
            .on_filters_change(move |filters| sink.lock().unwrap().push(filters.clone()));
        table.set_page(
            vec![
                Product { id: 1, name: "Son" },
                Product { id: 3, name: "Phấn" },
                Product { id: 5, name: "Kem" },
            ],
            45,
            5,
        );
        table.tick(t0());
        (table, emitted)
    }

    #[test]
    fn debounced_search_emits_once_with_last_value() {
        let (mut table, emitted) = table();
        table.set_page_index(2);
        emitted.lock().unwrap().clear();

        for (offset, text) in [(0, "f"), (50, "fo"), (100, "foo")] {
            table.tick(t0() + ms(offset));
            table.set_global_filter(text.into());
        }
        assert!(!table.tick(t0() + ms(500)));
        assert!(emitted.lock().unwrap().is_empty());

        assert!(table.tick(t0() + ms(600)));
        assert!(!table.tick(t0() + ms(1200)));

        let emitted = emitted.lock().unwrap();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].search.as_deref(), Some("foo"));
        assert_eq!(emitted[0].page, 1);
        assert_eq!(emitted[0].limit, 10);
    }

    #[test]
    fn sort_and_filter_changes_reset_page() {
        let (mut table, emitted) = table();
        table.set_page_index(3);
        table.set_sorting(vec![SortingRule::desc("name"), SortingRule::asc("id")]);
        table.set_page_index(2);
        table.set_column_filter(Ustr::from("status"), Some(FilterValue::values(["active"])));

        let emitted = emitted.lock().unwrap();
        let pages: Vec<usize> = emitted.iter().map(|f| f.page).collect();
        assert_eq!(pages, vec![4, 1, 3, 1]);
        assert_eq!(emitted[1].sort.as_deref(), Some("name"));
        assert_eq!(emitted[1].order, Some(SortOrder::Desc));
        assert_eq!(table.state().sorting, vec![SortingRule::desc("name")]);
    }

    #[test]
    fn paging_keeps_other_filters() {
        let (mut table, emitted) = table();
        table.set_sorting(vec![SortingRule::asc("name")]);
        table.set_column_filter(Ustr::from("role"), Some(FilterValue::text("admin")));
        let before = table.filters().clone();

        table.next_page();
        table.set_page_size(20);

        let emitted = emitted.lock().unwrap();
        let last = emitted.last().unwrap();
        assert_eq!(last.search, before.search);
        assert_eq!(last.sort, before.sort);
        assert_eq!(last.order, before.order);
        assert_eq!(last.columns, before.columns);
        assert_eq!(last.limit, 20);
        assert_eq!(emitted[emitted.len() - 2].page, 2);
    }

    #[test]
    fn sorting_skips_columns_that_cannot_be_sorted() {
        let emitted: Emitted = Arc::default();
        let sink = emitted.clone();
        let columns = vec![
            ColumnDef::select(),
            ColumnDef::data("name", "Name", |p: &Product| CellValue::text(p.name)).sortable(false),
            ColumnDef::data("sku", "SKU", |p: &Product| CellValue::text(p.name)),
        ];
        let mut table = ServerTable::new(columns, ServerTableFilters::default())
            .on_filters_change(move |filters| sink.lock().unwrap().push(filters.clone()));

        table.set_sorting(vec![SortingRule::asc("name")]);
        table.set_sorting(vec![SortingRule::asc("select"), SortingRule::desc("sku")]);

        let emitted = emitted.lock().unwrap();
        assert_eq!(emitted[0].sort, None);
        assert_eq!(emitted[0].order, None);
        assert_eq!(emitted[1].sort.as_deref(), Some("sku"));
        assert_eq!(emitted[1].order, Some(SortOrder::Desc));
        assert_eq!(table.state().sorting, vec![SortingRule::desc("sku")]);
    }

    #[test]
    fn seeded_filters_are_normalised() {
        let emitted: Emitted = Arc::default();
        let sink = emitted.clone();
        let filters = ServerTableFilters {
            page: 0,
            limit: 0,
            sort: Some("select".into()),
            order: Some(SortOrder::Asc),
            ..ServerTableFilters::default()
        };
        let mut table = ServerTable::new(columns(), filters)
            .on_filters_change(move |filters| sink.lock().unwrap().push(filters.clone()));

        assert_eq!((table.filters().page, table.filters().limit), (1, 1));
        assert_eq!(table.filters().sort, None);
        assert!(table.state().sorting.is_empty());

        table.set_column_filter(Ustr::from("status"), Some(FilterValue::values(["active"])));
        let query = emitted.lock().unwrap()[0].to_query();
        assert!(query.contains(&("limit".to_owned(), "1".to_owned())));
    }

    #[test]
    fn empty_result_disallows_navigation() {
        let (mut table, _) = table();
        table.set_page(Vec::new(), 0, 0);
        assert!(!table.can_next_page());
        assert!(!table.can_previous_page());
        let info = table.pagination_info();
        assert!(!info.has_next_page);
        assert!(!info.has_previous_page);
    }

    #[test]
    fn changes_without_sink_stay_local() {
        let mut table = ServerTable::new(columns(), ServerTableFilters::default());
        table.set_page(vec![Product { id: 1, name: "Son" }], 1, 1);
        table.set_sorting(vec![SortingRule::asc("name")]);
        table.tick(t0());
        table.set_global_filter("son".into());
        assert!(table.tick(t0() + ms(600)));
        assert_eq!(table.filters().search.as_deref(), Some("son"));
        assert_eq!(table.filters().sort.as_deref(), Some("name"));
    }

    #[test]
    fn selection_is_limited_to_current_page() {
        let (mut table, emitted) = table();
        table.toggle_row(RowId::from(1));
        table.toggle_row(RowId::from(5));
        table.toggle_row(RowId::from(9));
        assert_eq!(table.selected_ids(), vec![RowId::from(1), RowId::from(5)]);
        assert!(emitted.lock().unwrap().is_empty());

        table.set_page(vec![Product { id: 5, name: "Kem" }], 45, 5);
        assert_eq!(table.selected_ids(), vec![RowId::from(5)]);
        assert_eq!(table.selected_rows()[0].name, "Kem");
    }

    #[test]
    fn reset_filters_discards_pending_search() {
        let (mut table, emitted) = table();
        table.set_sorting(vec![SortingRule::asc("name")]);
        table.set_global_filter("kem".into());
        table.reset_filters();
        assert!(!table.tick(t0() + ms(1000)));

        let emitted = emitted.lock().unwrap();
        assert_eq!(emitted.last(), Some(&ServerTableFilters::default()));
    }

    #[test]
    fn query_pairs_follow_wire_order() {
        let mut filters = ServerTableFilters {
            page: 2,
            limit: 20,
            search: Some("son môi".into()),
            sort: Some("created_at".into()),
            order: Some(SortOrder::Desc),
            ..ServerTableFilters::default()
        };
        filters
            .columns
            .insert("status".into(), FilterValue::values(["active", "inactive"]));
        filters.columns.insert(
            "created_at".into(),
            FilterValue::DateRange {
                from: NaiveDate::from_ymd_opt(2025, 1, 1),
                to: None,
            },
        );
        filters.columns.insert("email".into(), FilterValue::text("  "));

        let query = filters.to_query();
        let pairs: Vec<(&str, &str)> = query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("page", "2"),
                ("limit", "20"),
                ("search", "son môi"),
                ("sort", "created_at"),
                ("order", "desc"),
                ("created_at_from", "2025-01-01"),
                ("status", "active,inactive"),
            ]
        );
    }
}
