use crate::table::{
    CellValue, ColumnDef, ColumnPinning, FilterFn, InitialTableState, Pagination,
    RowActionDispatcher, RowActionKind, RowMenuItem, SortingRule, ToolbarConfig,
};

use super::model::Role;

pub fn roles_columns(dispatch: RowActionDispatcher<Role>) -> Vec<ColumnDef<Role>> {
    vec![
        ColumnDef::select(),
        ColumnDef::row_number("No."),
        ColumnDef::data("name", "Role Name", |role: &Role| CellValue::text(&role.name))
            .hideable(false)
            .width(200.0),
        ColumnDef::data("description", "Description", |role: &Role| {
            CellValue::optional_text(role.description.as_deref())
        })
        .sortable(false)
        .width(250.0),
        ColumnDef::data("status", "Status", |role: &Role| CellValue::Status {
            label: role.status_label().to_owned(),
            active: role.status,
        })
        .searchable(false)
        .filter_fn(FilterFn::OneOf),
        ColumnDef::data("users_count", "Users", |role: &Role| {
            role.users_count
                .and_then(|count| i64::try_from(count).ok())
                .map_or(CellValue::Empty, CellValue::Integer)
        })
        .searchable(false),
        ColumnDef::data("created_at", "Created At", |role: &Role| {
            role.created_at.map_or(CellValue::Empty, CellValue::Date)
        })
        .searchable(false)
        .filter_fn(FilterFn::InDateRange),
        ColumnDef::actions(dispatch, role_menu),
    ]
}

fn role_menu(role: &Role) -> Vec<RowMenuItem> {
    let toggle = if role.status { "Deactivate" } else { "Activate" };
    vec![
        RowMenuItem::new(RowActionKind::View, "View details"),
        RowMenuItem::new(RowActionKind::Edit, "Edit"),
        RowMenuItem::new(RowActionKind::Duplicate, "Duplicate"),
        RowMenuItem::new(RowActionKind::ToggleStatus, toggle).separated(),
        RowMenuItem::new(RowActionKind::Delete, "Delete")
            .destructive()
            .separated(),
    ]
}

/// Name descending, actions pinned right.
pub fn roles_initial_state(page_size: usize) -> InitialTableState {
    InitialTableState {
        sorting: vec![SortingRule::desc("name")],
        pagination: Some(Pagination::new(0, page_size)),
        column_pinning: ColumnPinning::right(&[ColumnDef::<Role>::ACTIONS_ID]),
        ..InitialTableState::default()
    }
}

/// Search and column toggles only.
pub fn roles_toolbar() -> ToolbarConfig {
    ToolbarConfig {
        search: true,
        filter: false,
        sort: false,
        view_options: true,
    }
}
