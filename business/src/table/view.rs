//! Render-ready projection of a [`TableHandle`].
//!
//! The renderer draws a [`TableView`] and turns clicks back into handle calls; it never
//! reads controller internals or talks to the API.

use ustr::Ustr;

use super::{CellValue, ColumnKind, PaginationInfo, PinEdge, RowId, RowMenuItem, TableHandle};

/// Placeholder grid drawn while the first page loads; independent of the real columns.
pub const SKELETON_ROWS: usize = 5;
pub const SKELETON_COLUMNS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub column: Ustr,
    pub label: String,
    pub kind: ColumnKind,
    /// `(priority, descending)` when the column takes part in sorting.
    pub sort: Option<(usize, bool)>,
    pub sortable: bool,
    pub pin: Option<PinEdge>,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewCell {
    Checkbox(bool),
    /// 1-based across pages.
    RowNumber(usize),
    Value(CellValue),
    Actions(Vec<RowMenuItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub id: RowId,
    pub selected: bool,
    pub cells: Vec<ViewCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableBody {
    Skeleton { rows: usize, columns: usize },
    Empty(String),
    Rows(Vec<ViewRow>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Export,
    Activate,
    Deactivate,
    Delete,
}

impl BulkAction {
    pub const ALL: [Self; 4] = [Self::Export, Self::Activate, Self::Deactivate, Self::Delete];

    pub fn label(self) -> &'static str {
        match self {
            Self::Export => "Export",
            Self::Activate => "Activate",
            Self::Deactivate => "Deactivate",
            Self::Delete => "Delete",
        }
    }

    pub fn is_destructive(self) -> bool {
        self == Self::Delete
    }
}

/// Shown only while at least one row is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatingBar {
    pub selected: usize,
}

impl FloatingBar {
    pub fn label(&self) -> String {
        format!("{} selected", self.selected)
    }
}

/// Entry of the column visibility menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnToggle {
    pub column: Ustr,
    pub label: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub headers: Vec<HeaderCell>,
    pub body: TableBody,
    /// Previous rows are still shown while a refetch is in flight.
    pub dimmed: bool,
    pub floating_bar: Option<FloatingBar>,
    pub all_page_selected: bool,
    pub some_page_selected: bool,
    pub column_toggles: Vec<ColumnToggle>,
    pub pagination: PaginationInfo,
}

impl TableView {
    pub fn project<T, H>(table: &H, empty_message: &str) -> Self
    where
        H: TableHandle<T> + ?Sized,
    {
        let state = table.state();
        let columns = table.visible_columns();

        let headers = columns
            .iter()
            .map(|column| HeaderCell {
                column: column.id(),
                label: column.header().to_owned(),
                kind: column.kind(),
                sort: state.sort_of(column.id()),
                sortable: column.is_sortable(),
                pin: state.column_pinning.edge(column.id()).or(column.pinned()),
                width: column.width_hint(),
            })
            .collect();

        let body = if table.is_loading() {
            TableBody::Skeleton {
                rows: SKELETON_ROWS,
                columns: SKELETON_COLUMNS,
            }
        } else {
            let page_rows = table.page_rows();
            if page_rows.is_empty() {
                TableBody::Empty(empty_message.to_owned())
            } else {
                let offset = state.pagination.page_index * state.pagination.page_size;
                let rows = page_rows
                    .iter()
                    .map(|page_row| {
                        let selected = state.is_selected(page_row.id);
                        let cells = columns
                            .iter()
                            .map(|column| match column.kind() {
                                ColumnKind::Select => ViewCell::Checkbox(selected),
                                ColumnKind::RowNumber => {
                                    ViewCell::RowNumber(offset + page_row.index + 1)
                                }
                                ColumnKind::Data => ViewCell::Value(column.value(page_row.row)),
                                ColumnKind::Actions => ViewCell::Actions(column.menu(page_row.row)),
                            })
                            .collect();
                        ViewRow {
                            id: page_row.id,
                            selected,
                            cells,
                        }
                    })
                    .collect();
                TableBody::Rows(rows)
            }
        };

        let column_toggles = table
            .columns()
            .iter()
            .filter(|column| column.is_hideable())
            .map(|column| ColumnToggle {
                column: column.id(),
                label: column.header().to_owned(),
                visible: state.is_column_visible(column.id()),
            })
            .collect();

        let selected = state.row_selection.len();
        Self {
            headers,
            body,
            dimmed: table.is_fetching() && !table.is_loading(),
            floating_bar: (selected > 0).then_some(FloatingBar { selected }),
            all_page_selected: table.is_all_page_rows_selected(),
            some_page_selected: table.is_some_page_rows_selected(),
            column_toggles,
            pagination: table.pagination_info(),
        }
    }
}

/// Which toolbar controls a table shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolbarConfig {
    pub search: bool,
    pub filter: bool,
    pub sort: bool,
    pub view_options: bool,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            search: true,
            filter: true,
            sort: true,
            view_options: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
}

impl FilterOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterFieldKind {
    Text,
    Select(Vec<FilterOption>),
    Date,
}

/// A field offered by the advanced filter builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterField {
    pub id: Ustr,
    pub label: String,
    pub kind: FilterFieldKind,
}

impl FilterField {
    pub fn text(id: &str, label: &str) -> Self {
        Self {
            id: Ustr::from(id),
            label: label.to_owned(),
            kind: FilterFieldKind::Text,
        }
    }

    pub fn select(id: &str, label: &str, options: Vec<FilterOption>) -> Self {
        Self {
            id: Ustr::from(id),
            label: label.to_owned(),
            kind: FilterFieldKind::Select(options),
        }
    }

    pub fn date(id: &str, label: &str) -> Self {
        Self {
            id: Ustr::from(id),
            label: label.to_owned(),
            kind: FilterFieldKind::Date,
        }
    }
}

/// Selected rows as json objects keyed by column header; data columns only.
pub fn export_rows<T, H>(table: &H) -> serde_json::Value
where
    H: TableHandle<T> + ?Sized,
{
    let columns: Vec<_> = table
        .columns()
        .iter()
        .filter(|column| column.kind() == ColumnKind::Data)
        .collect();
    let rows = table
        .selected_rows()
        .into_iter()
        .map(|row| {
            let object = columns
                .iter()
                .map(|column| {
                    let value = match column.value(row) {
                        CellValue::Empty => serde_json::Value::Null,
                        CellValue::Integer(n) => serde_json::Value::from(n),
                        other => serde_json::Value::from(other.display()),
                    };
                    (column.header().to_owned(), value)
                })
                .collect::<serde_json::Map<_, _>>();
            serde_json::Value::Object(object)
        })
        .collect();
    serde_json::Value::Array(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{
        ClientTable, ColumnDef, InitialTableState, Pagination, RowActionDispatcher,
        RowActionKind, RowKey, SortingRule,
    };

    #[derive(Debug, Clone)]
    struct Brand {
        id: u64,
        name: &'static str,
        products: i64,
    }

    impl RowKey for Brand {
        fn row_key(&self) -> Option<RowId> {
            Some(RowId::from(self.id))
        }
    }

    fn brands(count: u64) -> Vec<Brand> {
        (1..=count)
            .map(|id| Brand {
                id,
                name: "Laneige",
                products: id as i64 * 3,
            })
            .collect()
    }

    fn table(initial: InitialTableState) -> ClientTable<Brand> {
        let (dispatcher, _events) = RowActionDispatcher::channel();
        ClientTable::new(
            vec![
                ColumnDef::select(),
                ColumnDef::row_number("#"),
                ColumnDef::data("name", "Name", |b: &Brand| CellValue::text(b.name)),
                ColumnDef::data("products", "Products", |b: &Brand| {
                    CellValue::Integer(b.products)
                }),
                ColumnDef::actions(dispatcher, |_: &Brand| {
                    vec![RowMenuItem::new(RowActionKind::Delete, "Delete").destructive()]
                }),
            ],
            initial,
        )
    }

    #[test]
    fn loading_table_shows_skeleton() {
        let mut table = table(InitialTableState::default());
        table.set_loading(true);
        let view = TableView::project(&table, "No results.");
        assert_eq!(
            view.body,
            TableBody::Skeleton {
                rows: SKELETON_ROWS,
                columns: SKELETON_COLUMNS,
            }
        );
        assert_ne!(view.headers.len(), SKELETON_COLUMNS);
        assert!(!view.dimmed);
    }

    #[test]
    fn empty_table_shows_message() {
        let table = table(InitialTableState::default());
        let view = TableView::project(&table, "No results.");
        assert_eq!(view.body, TableBody::Empty("No results.".into()));
        assert!(view.floating_bar.is_none());
    }

    #[test]
    fn row_numbers_continue_across_pages() {
        let mut table = table(InitialTableState {
            pagination: Some(Pagination::new(1, 2)),
            ..InitialTableState::default()
        });
        table.set_data(brands(5));
        let view = TableView::project(&table, "");
        let TableBody::Rows(rows) = view.body else {
            panic!("expected rows");
        };
        let numbers: Vec<_> = rows.iter().map(|row| row.cells[1].clone()).collect();
        assert_eq!(numbers, vec![ViewCell::RowNumber(3), ViewCell::RowNumber(4)]);
        assert!(matches!(rows[0].cells[4], ViewCell::Actions(ref items) if items.len() == 1));
        assert_eq!(view.headers.last().map(|h| h.pin), Some(Some(PinEdge::Right)));
    }

    #[test]
    fn headers_carry_sort_indicator() {
        let mut table = table(InitialTableState {
            sorting: vec![SortingRule::desc("products")],
            ..InitialTableState::default()
        });
        table.set_data(brands(2));
        let view = TableView::project(&table, "");
        let products = view
            .headers
            .iter()
            .find(|header| header.column.as_str() == "products")
            .unwrap();
        assert_eq!(products.sort, Some((0, true)));
        assert!(!view.headers[0].sortable);
    }

    #[test]
    fn floating_bar_follows_selection() {
        let mut table = table(InitialTableState::default());
        table.set_data(brands(3));
        table.toggle_row(RowId::from(2));
        let view = TableView::project(&table, "");
        assert_eq!(view.floating_bar.map(|bar| bar.label()), Some("1 selected".into()));
        assert!(view.some_page_selected);
        assert!(!view.all_page_selected);

        table.clear_selection();
        assert!(TableView::project(&table, "").floating_bar.is_none());
    }

    #[test]
    fn hidden_columns_leave_grid_but_stay_in_menu() {
        let mut table = table(InitialTableState::default());
        table.set_data(brands(1));
        table.set_column_visible(Ustr::from("products"), false);
        let view = TableView::project(&table, "");
        assert!(view.headers.iter().all(|header| header.column.as_str() != "products"));
        assert!(
            view.column_toggles
                .iter()
                .any(|toggle| toggle.column.as_str() == "products" && !toggle.visible)
        );
    }

    #[test]
    fn export_contains_selected_data_columns_only() {
        let mut table = table(InitialTableState::default());
        table.set_data(brands(3));
        table.toggle_row(RowId::from(3));
        assert_eq!(
            export_rows(&table),
            serde_json::json!([{ "Name": "Laneige", "Products": 9 }])
        );
    }
}
