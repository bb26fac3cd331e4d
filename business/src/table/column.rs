use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ustr::Ustr;

use super::action::{RowActionDispatcher, RowActionEvent, RowActionKind, RowMenuItem};
use super::state::{FilterValue, PinEdge, SortingRule};
use super::RowId;

/// What a data column reads out of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Integer(i64),
    Date(DateTime<Utc>),
    /// Rendered as a badge.
    Status { label: String, active: bool },
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// `Empty` for `None` or blank text.
    pub fn optional_text(value: Option<&str>) -> Self {
        match value {
            Some(text) if !text.trim().is_empty() => Self::text(text),
            _ => Self::Empty,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Empty => "-".to_owned(),
            Self::Text(text) => text.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Date(at) => at.format("%d/%m/%Y").to_string(),
            Self::Status { label, .. } => label.clone(),
        }
    }

    /// Value compared by text and set filters.
    fn filter_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Status { active, .. } => {
                if *active { "active" } else { "inactive" }.to_owned()
            }
            other => other.display(),
        }
    }

    /// Ordering used by client-side sorting. Empty cells sort last.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Empty, Self::Empty) => Ordering::Equal,
            (Self::Empty, _) => Ordering::Greater,
            (_, Self::Empty) => Ordering::Less,
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Status { active: a, .. }, Self::Status { active: b, .. }) => b.cmp(a),
            (Self::Text(a), Self::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (a, b) => a.display().cmp(&b.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Row checkboxes.
    Select,
    /// `page_index * page_size + row + 1`.
    RowNumber,
    Data,
    /// Trailing per-row menu.
    Actions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterFn {
    /// Case-insensitive substring.
    #[default]
    Contains,
    /// Cell value is one of the selected values.
    OneOf,
    InDateRange,
}

impl FilterFn {
    pub fn matches(self, cell: &CellValue, filter: &FilterValue) -> bool {
        match (self, filter) {
            (_, filter) if filter.is_empty() => true,
            (_, FilterValue::DateRange { from, to }) => {
                let CellValue::Date(at) = cell else {
                    return false;
                };
                let day = at.date_naive();
                from.is_none_or(|from| day >= from) && to.is_none_or(|to| day <= to)
            }
            (_, FilterValue::Values(values)) => values.contains(&cell.filter_text()),
            (Self::OneOf, FilterValue::Text(text)) => cell.filter_text() == text.trim(),
            (_, FilterValue::Text(text)) => cell
                .filter_text()
                .to_lowercase()
                .contains(&text.trim().to_lowercase()),
        }
    }
}

type Accessor<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;
type MenuBuilder<T> = Arc<dyn Fn(&T) -> Vec<RowMenuItem> + Send + Sync>;

struct RowActions<T> {
    menu: MenuBuilder<T>,
    dispatcher: RowActionDispatcher<T>,
}

/// One column of a table: how to read, sort, filter and lay it out.
pub struct ColumnDef<T> {
    id: Ustr,
    header: String,
    kind: ColumnKind,
    accessor: Option<Accessor<T>>,
    actions: Option<Arc<RowActions<T>>>,
    sortable: bool,
    hideable: bool,
    searchable: bool,
    width: f32,
    pin: Option<PinEdge>,
    filter_fn: FilterFn,
}

impl<T> Clone for ColumnDef<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            header: self.header.clone(),
            kind: self.kind,
            accessor: self.accessor.clone(),
            actions: self.actions.clone(),
            sortable: self.sortable,
            hideable: self.hideable,
            searchable: self.searchable,
            width: self.width,
            pin: self.pin,
            filter_fn: self.filter_fn,
        }
    }
}

impl<T> fmt::Debug for ColumnDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("sortable", &self.sortable)
            .field("hideable", &self.hideable)
            .finish_non_exhaustive()
    }
}

impl<T> ColumnDef<T> {
    pub const SELECT_ID: &'static str = "select";
    pub const ROW_NUMBER_ID: &'static str = "stt";
    pub const ACTIONS_ID: &'static str = "actions";

    fn base(id: &str, header: &str, kind: ColumnKind) -> Self {
        Self {
            id: Ustr::from(id),
            header: header.to_owned(),
            kind,
            accessor: None,
            actions: None,
            sortable: false,
            hideable: false,
            searchable: false,
            width: 40.0,
            pin: None,
            filter_fn: FilterFn::Contains,
        }
    }

    pub fn select() -> Self {
        Self::base(Self::SELECT_ID, "", ColumnKind::Select)
    }

    pub fn row_number(header: &str) -> Self {
        Self::base(Self::ROW_NUMBER_ID, header, ColumnKind::RowNumber).width(60.0)
    }

    /// Sortable, hideable and searchable by default.
    pub fn data(
        id: &str,
        header: &str,
        accessor: impl Fn(&T) -> CellValue + Send + Sync + 'static,
    ) -> Self {
        Self {
            accessor: Some(Arc::new(accessor)),
            sortable: true,
            hideable: true,
            searchable: true,
            width: 120.0,
            ..Self::base(id, header, ColumnKind::Data)
        }
    }

    /// Trailing menu column: never sortable or hideable, pinned right.
    pub fn actions(
        dispatcher: RowActionDispatcher<T>,
        menu: impl Fn(&T) -> Vec<RowMenuItem> + Send + Sync + 'static,
    ) -> Self {
        Self {
            actions: Some(Arc::new(RowActions {
                menu: Arc::new(menu),
                dispatcher,
            })),
            pin: Some(PinEdge::Right),
            ..Self::base(Self::ACTIONS_ID, "", ColumnKind::Actions)
        }
        .width(80.0)
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable && self.kind == ColumnKind::Data;
        self
    }

    pub fn hideable(mut self, hideable: bool) -> Self {
        self.hideable = hideable && self.kind == ColumnKind::Data;
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable && self.kind == ColumnKind::Data;
        self
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn pin(mut self, edge: PinEdge) -> Self {
        self.pin = Some(edge);
        self
    }

    pub fn filter_fn(mut self, filter_fn: FilterFn) -> Self {
        self.filter_fn = filter_fn;
        self
    }

    pub fn id(&self) -> Ustr {
        self.id
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn is_hideable(&self) -> bool {
        self.hideable
    }

    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    pub fn width_hint(&self) -> f32 {
        self.width
    }

    pub fn pinned(&self) -> Option<PinEdge> {
        self.pin
    }

    pub fn value(&self, row: &T) -> CellValue {
        self.accessor
            .as_ref()
            .map_or(CellValue::Empty, |accessor| accessor(row))
    }

    pub fn matches(&self, row: &T, filter: &FilterValue) -> bool {
        self.filter_fn.matches(&self.value(row), filter)
    }

    pub fn menu(&self, row: &T) -> Vec<RowMenuItem> {
        self.actions
            .as_ref()
            .map(|actions| (actions.menu)(row))
            .unwrap_or_default()
    }
}

/// Drops rules naming unknown or non-sortable columns.
pub(crate) fn retain_sortable<T>(columns: &[ColumnDef<T>], sorting: &mut Vec<SortingRule>) {
    sorting.retain(|rule| {
        columns
            .iter()
            .any(|def| def.id() == rule.column && def.is_sortable())
    });
}

impl<T: Clone> ColumnDef<T> {
    /// Emits a [`RowActionEvent`] for a menu selection. No-op on other columns.
    pub fn activate(&self, row: &T, row_id: RowId, kind: RowActionKind) {
        if let Some(actions) = &self.actions {
            actions.dispatcher.dispatch(RowActionEvent {
                row_id,
                row: row.clone(),
                kind,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn contains_is_case_insensitive() {
        let cell = CellValue::text("Son Môi Đỏ");
        assert!(FilterFn::Contains.matches(&cell, &FilterValue::text("môi")));
        assert!(!FilterFn::Contains.matches(&cell, &FilterValue::text("kem")));
    }

    #[test]
    fn one_of_uses_status_keys() {
        let active = CellValue::Status {
            label: "Active".into(),
            active: true,
        };
        assert!(FilterFn::OneOf.matches(&active, &FilterValue::values(["active"])));
        assert!(!FilterFn::OneOf.matches(&active, &FilterValue::values(["inactive"])));
    }

    #[test]
    fn date_range_is_inclusive() {
        let cell = CellValue::Date(Utc.with_ymd_and_hms(2024, 2, 20, 15, 0, 0).unwrap());
        let range = |from: (i32, u32, u32), to: (i32, u32, u32)| FilterValue::DateRange {
            from: NaiveDate::from_ymd_opt(from.0, from.1, from.2),
            to: NaiveDate::from_ymd_opt(to.0, to.1, to.2),
        };
        assert!(FilterFn::InDateRange.matches(&cell, &range((2024, 2, 20), (2024, 2, 20))));
        assert!(!FilterFn::InDateRange.matches(&cell, &range((2024, 2, 21), (2024, 3, 1))));
    }

    #[test]
    fn empty_cells_sort_last() {
        let mut cells = vec![CellValue::Empty, CellValue::text("b"), CellValue::text("A")];
        cells.sort_by(CellValue::compare);
        assert_eq!(
            cells,
            vec![CellValue::text("A"), CellValue::text("b"), CellValue::Empty]
        );
    }

    #[test]
    fn structural_columns_cannot_sort_or_hide() {
        let select = ColumnDef::<u8>::select().sortable(true).hideable(true);
        assert!(!select.is_sortable());
        assert!(!select.is_hideable());

        let (dispatcher, _rx) = RowActionDispatcher::<u8>::channel();
        let actions = ColumnDef::actions(dispatcher, |_| Vec::new());
        assert_eq!(actions.pinned(), Some(PinEdge::Right));
        assert!(!actions.is_sortable());
    }
}
