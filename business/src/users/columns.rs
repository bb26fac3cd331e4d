use crate::table::{
    CellValue, ColumnDef, FilterField, FilterFn, FilterOption, RowActionDispatcher,
    RowActionKind, RowMenuItem, ServerTableFilters, SortOrder,
};

use super::model::User;

pub fn users_columns(dispatch: RowActionDispatcher<User>) -> Vec<ColumnDef<User>> {
    vec![
        ColumnDef::select(),
        ColumnDef::data("username", "Username", |user: &User| {
            CellValue::text(&user.username)
        })
        .hideable(false)
        .width(150.0),
        ColumnDef::data("name", "Name", |user: &User| CellValue::text(&user.name)).width(150.0),
        ColumnDef::data("email", "Email", |user: &User| CellValue::text(&user.email))
            .width(200.0),
        ColumnDef::data("phone", "Phone Number", |user: &User| {
            CellValue::optional_text(user.phone.as_deref())
        })
        .sortable(false),
        ColumnDef::data("status", "Status", |user: &User| CellValue::Status {
            label: user.status.label().to_owned(),
            active: user.status.is_active(),
        })
        .sortable(false)
        .searchable(false)
        .filter_fn(FilterFn::OneOf),
        ColumnDef::data("created_at", "Created At", |user: &User| {
            user.created_at.map_or(CellValue::Empty, CellValue::Date)
        })
        .searchable(false)
        .filter_fn(FilterFn::InDateRange),
        ColumnDef::actions(dispatch, user_menu),
    ]
}

fn user_menu(user: &User) -> Vec<RowMenuItem> {
    let toggle = if user.status.is_active() {
        "Deactivate"
    } else {
        "Activate"
    };
    vec![
        RowMenuItem::new(RowActionKind::View, "View details"),
        RowMenuItem::new(RowActionKind::Edit, "Edit"),
        RowMenuItem::new(RowActionKind::ToggleStatus, toggle).separated(),
        RowMenuItem::new(RowActionKind::Delete, "Delete")
            .destructive()
            .separated(),
    ]
}

/// Fields offered by the advanced filter builder.
pub fn users_filter_fields() -> Vec<FilterField> {
    vec![
        FilterField::text("email", "Email"),
        FilterField::select(
            "role",
            "Role",
            vec![
                FilterOption::new("Admin", "admin"),
                FilterOption::new("Teacher", "teacher"),
                FilterOption::new("Student", "student"),
                FilterOption::new("Moderator", "moderator"),
            ],
        ),
        FilterField::select(
            "status",
            "Status",
            vec![
                FilterOption::new("Active", "active"),
                FilterOption::new("Inactive", "inactive"),
            ],
        ),
        FilterField::date("created_at", "Created At"),
    ]
}

/// Newest accounts first.
pub fn users_initial_filters(page_size: usize) -> ServerTableFilters {
    ServerTableFilters {
        sort: Some("created_at".to_owned()),
        order: Some(SortOrder::Desc),
        ..ServerTableFilters::default()
    }
    .with_limit(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnKind, PinEdge};
    use crate::users::UserStatus;

    fn user(status: UserStatus) -> User {
        User {
            id: 1,
            username: "admin_user".into(),
            name: "Nguyễn Văn Admin".into(),
            email: "admin@example.com".into(),
            phone: None,
            role: Some("admin".into()),
            status,
            created_at: None,
        }
    }

    #[test]
    fn column_layout() {
        let (dispatch, _rx) = RowActionDispatcher::channel();
        let columns = users_columns(dispatch);
        let ids: Vec<&str> = columns.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(
            ids,
            ["select", "username", "name", "email", "phone", "status", "created_at", "actions"]
        );

        let actions = columns.last().unwrap();
        assert_eq!(actions.kind(), ColumnKind::Actions);
        assert!(!actions.is_sortable() && !actions.is_hideable());
        assert_eq!(actions.pinned(), Some(PinEdge::Right));
        assert!(!columns[1].is_hideable());
        assert!(!columns[4].is_sortable());
    }

    #[test]
    fn menu_offers_matching_status_toggle() {
        let labels = |status| {
            user_menu(&user(status))
                .into_iter()
                .map(|item| item.label)
                .collect::<Vec<_>>()
        };
        assert!(labels(UserStatus::Active).contains(&"Deactivate".to_owned()));
        assert!(labels(UserStatus::Inactive).contains(&"Activate".to_owned()));
    }

    #[test]
    fn choosing_delete_emits_row_action() {
        let (dispatch, rx) = RowActionDispatcher::channel();
        let columns = users_columns(dispatch);
        let row = user(UserStatus::Active);
        columns
            .last()
            .unwrap()
            .activate(&row, crate::table::RowId::from(1), RowActionKind::Delete);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, RowActionKind::Delete);
        assert_eq!(event.row.username, "admin_user");
    }
}
