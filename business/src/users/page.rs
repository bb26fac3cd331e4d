//! Users page: a server-driven table plus its dialogs.
//!
//! The UI mutates [`UsersPage`] directly (table clicks, dialog input) and calls
//! [`UsersPage::drive`] once per frame after `ctx.sync()`. `drive` moves filter changes
//! into [`UsersQuery`], applies fetch results, routes row actions, and dispatches
//! whatever fetch or mutation is due.

use beaute_states::{State, StateCtx, Time};
use chrono::Utc;
use flume::Receiver;
use log::{debug, warn};

use crate::config::BusinessConfig;
use crate::dialogs::{BulkDeleteDialog, DeleteConfirmDialog, DialogOutcome};
use crate::list_query::{ListFetch, ListTracker};
use crate::query_cache::QueryCache;
use crate::table::{
    BulkAction, FilterField, RowActionDispatcher, RowActionEvent, RowActionKind, RowActionSlot,
    ServerTable, ServerTableFilters, TableHandle, ToolbarConfig, export_rows,
};

use super::columns::{users_columns, users_filter_fields, users_initial_filters};
use super::commands::{
    BulkDeleteUsersCommand, BulkUpdateUserStatusCommand, DeleteUserCommand,
    FetchUsersPageCommand, UserMutation, UserMutationRequest, UserMutationResult, UsersQuery,
};
use super::model::{User, UserStatus};

pub struct UsersPage {
    pub table: ServerTable<User>,
    /// Row whose View/Edit/Delete dialog is open.
    pub row_action: RowActionSlot<User>,
    pub delete_dialog: Option<DeleteConfirmDialog>,
    pub bulk_delete_dialog: Option<BulkDeleteDialog>,
    pub toolbar: ToolbarConfig,
    pub filter_fields: Vec<FilterField>,
    tracker: ListTracker,
    filter_changes: Receiver<ServerTableFilters>,
    row_actions: Receiver<RowActionEvent<User>>,
    mutation_results: Receiver<UserMutationResult>,
    pending: Vec<UserMutation>,
}

impl State for UsersPage {}

impl UsersPage {
    /// Registers the page, its inputs and its commands.
    pub fn install(ctx: &mut StateCtx, config: &BusinessConfig) {
        let filters = users_initial_filters(config.default_page_size());
        let (filters_tx, filter_changes) = flume::unbounded();
        let (dispatch, row_actions) = RowActionDispatcher::channel();
        let table = ServerTable::new(users_columns(dispatch), filters.clone())
            .with_debounce_ms(config.search_debounce_ms())
            .on_filters_change(move |filters| {
                if filters_tx.send(filters.clone()).is_err() {
                    debug!("users page dropped; filter change ignored");
                }
            });
        let (request, mutation_results) = UserMutationRequest::channel();

        ctx.add_state(UsersQuery { filters });
        ctx.add_state(ListFetch::<User>::default());
        ctx.add_state(request);
        ctx.add_state(Self {
            table,
            row_action: RowActionSlot::default(),
            delete_dialog: None,
            bulk_delete_dialog: None,
            toolbar: ToolbarConfig::default(),
            filter_fields: users_filter_fields(),
            tracker: ListTracker::default(),
            filter_changes,
            row_actions,
            mutation_results,
            pending: Vec::new(),
        });
        ctx.record_command(FetchUsersPageCommand);
        ctx.record_command(DeleteUserCommand);
        ctx.record_command(BulkDeleteUsersCommand);
        ctx.record_command(BulkUpdateUserStatusCommand);
    }

    pub fn drive(ctx: &mut StateCtx) {
        let now = ctx.state::<Time>().map_or_else(Utc::now, Time::now);
        let Some(cache) = ctx.state::<QueryCache>().cloned() else {
            warn!("UsersPage::drive: QueryCache is not registered");
            return;
        };
        let Some(mut query) = ctx.state::<UsersQuery>().cloned() else {
            warn!("UsersPage::drive: page is not installed");
            return;
        };
        let fetched = ctx
            .state_mut::<ListFetch<User>>()
            .map(std::mem::take)
            .unwrap_or_default();

        let Some(page) = ctx.state_mut::<Self>() else {
            return;
        };
        page.table.tick(now);
        if let Some(filters) = page.filter_changes.try_iter().last() {
            query.filters = filters;
        }
        if let Some(fetched) = page.tracker.accept(fetched) {
            page.apply_fetch(fetched);
        }
        page.route_row_actions();
        page.apply_mutation_results();

        let fetch = page.tracker.should_fetch(&query.key(), &cache, now);
        if fetch {
            if page.table.rows().is_empty() {
                page.table.set_loading(true);
            } else {
                page.table.set_fetching(true);
            }
        }
        let mutations = std::mem::take(&mut page.pending);

        ctx.update::<UsersQuery>(|current| *current = query);
        if fetch {
            ctx.dispatch::<FetchUsersPageCommand>();
        }
        for mutation in mutations {
            let kind = mutation.clone();
            ctx.update::<UserMutationRequest>(|request| request.mutation = Some(mutation));
            match kind {
                UserMutation::Delete { .. } => ctx.dispatch::<DeleteUserCommand>(),
                UserMutation::BulkDelete { .. } => ctx.dispatch::<BulkDeleteUsersCommand>(),
                UserMutation::BulkStatus { .. } => ctx.dispatch::<BulkUpdateUserStatusCommand>(),
            }
        }
    }

    fn apply_fetch(&mut self, fetched: ListFetch<User>) {
        match fetched {
            ListFetch::Loading { has_data, .. } => {
                if has_data || !self.table.rows().is_empty() {
                    self.table.set_fetching(true);
                } else {
                    self.table.set_loading(true);
                }
            }
            ListFetch::Loaded { page, .. } => {
                self.table
                    .set_page(page.data, page.meta.total, page.meta.page_count);
            }
            ListFetch::Failed { .. } => self.table.fetch_failed(),
            ListFetch::Idle => {}
        }
    }

    fn route_row_actions(&mut self) {
        let events: Vec<_> = self.row_actions.try_iter().collect();
        for event in events {
            match event.kind {
                RowActionKind::ToggleStatus => self.pending.push(UserMutation::BulkStatus {
                    ids: vec![event.row.id],
                    status: event.row.status.toggled(),
                }),
                RowActionKind::Delete => {
                    self.delete_dialog = Some(DeleteConfirmDialog::new(
                        event.row_id,
                        "username",
                        event.row.username.clone(),
                    ));
                    self.row_action.open(event);
                }
                RowActionKind::View | RowActionKind::Edit => {
                    self.delete_dialog = None;
                    self.row_action.open(event);
                }
                RowActionKind::Duplicate => {
                    debug!("users cannot be duplicated; ignoring row action");
                }
            }
        }
    }

    fn apply_mutation_results(&mut self) {
        let results: Vec<_> = self.mutation_results.try_iter().collect();
        for UserMutationResult { mutation, result } in results {
            match mutation {
                UserMutation::Delete { .. } => {
                    let closed = self
                        .delete_dialog
                        .as_mut()
                        .is_some_and(|dialog| dialog.finish(result) == DialogOutcome::Closed);
                    if closed {
                        self.delete_dialog = None;
                        if let Some(event) = self.row_action.take() {
                            self.table.set_row_selected(event.row_id, false);
                        }
                    }
                }
                UserMutation::BulkDelete { .. } => {
                    let done = self
                        .bulk_delete_dialog
                        .as_mut()
                        .and_then(|dialog| dialog.finish(result).ok());
                    if let Some(done) = done {
                        self.bulk_delete_dialog = None;
                        if done.clear_selection {
                            self.table.clear_selection();
                        }
                    }
                }
                UserMutation::BulkStatus { .. } => {}
            }
        }
    }

    /// Confirm button of the delete dialog.
    pub fn confirm_delete(&mut self) {
        let Some(target) = self.delete_dialog.as_mut().and_then(DeleteConfirmDialog::begin_confirm)
        else {
            return;
        };
        match self.table.row(target).or(self.row_action.active().map(|event| &event.row)) {
            Some(user) => self.pending.push(UserMutation::Delete { id: user.id }),
            None => warn!("delete confirmed for unknown row {target}"),
        }
    }

    pub fn cancel_delete(&mut self) {
        if self
            .delete_dialog
            .as_mut()
            .is_none_or(|dialog| dialog.cancel() == DialogOutcome::Closed)
        {
            self.delete_dialog = None;
            self.row_action.close();
        }
    }

    pub fn close_row_action(&mut self) {
        if self.delete_dialog.is_none() {
            self.row_action.close();
        }
    }

    /// Handles a floating bar button. Export returns the rows to hand to the clipboard.
    pub fn bulk_action(&mut self, action: BulkAction) -> Option<serde_json::Value> {
        match action {
            BulkAction::Export => return Some(export_rows(&self.table)),
            BulkAction::Activate => self.bulk_set_status(UserStatus::Active),
            BulkAction::Deactivate => self.bulk_set_status(UserStatus::Inactive),
            BulkAction::Delete => {
                let ids = self.table.selected_ids();
                if !ids.is_empty() {
                    self.bulk_delete_dialog = Some(BulkDeleteDialog::new(ids));
                }
            }
        }
        None
    }

    fn bulk_set_status(&mut self, status: UserStatus) {
        let ids = self.selected_user_ids();
        if !ids.is_empty() {
            self.pending.push(UserMutation::BulkStatus { ids, status });
        }
    }

    fn selected_user_ids(&self) -> Vec<u64> {
        self.table.selected_rows().iter().map(|user| user.id).collect()
    }

    pub fn confirm_bulk_delete(&mut self) {
        let Some(row_ids) = self
            .bulk_delete_dialog
            .as_mut()
            .and_then(BulkDeleteDialog::begin_confirm)
        else {
            return;
        };
        let ids: Vec<u64> = row_ids
            .iter()
            .filter_map(|id| self.table.row(*id).map(|user| user.id))
            .collect();
        self.pending.push(UserMutation::BulkDelete { ids });
    }

    pub fn cancel_bulk_delete(&mut self) {
        if self
            .bulk_delete_dialog
            .as_mut()
            .is_none_or(|dialog| dialog.cancel() == DialogOutcome::Closed)
        {
            self.bulk_delete_dialog = None;
        }
    }

    /// Whether a fetch for the shown filters is running.
    pub fn is_fetching(&self) -> bool {
        self.tracker.is_in_flight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{PageMeta, PaginatedResponse};
    use crate::table::{RowActionKind, RowId};
    use chrono::TimeZone;

    fn user(id: u64, username: &str) -> User {
        User {
            id,
            username: username.into(),
            name: username.into(),
            email: format!("{username}@example.com"),
            phone: None,
            role: None,
            status: UserStatus::Active,
            created_at: None,
        }
    }

    fn installed() -> StateCtx {
        let mut ctx = StateCtx::new();
        ctx.add_state(Time::at(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()));
        ctx.add_state(QueryCache::new());
        UsersPage::install(&mut ctx, &BusinessConfig::new("http://127.0.0.1:9"));
        ctx
    }

    /// Plays the part of the fetch command for the current query.
    fn serve(ctx: &mut StateCtx, users: Vec<User>) {
        UsersPage::drive(ctx);
        let key = ctx.state::<UsersQuery>().unwrap().key();
        let now = ctx.state::<Time>().unwrap().now();
        let total = users.len();
        let page = PaginatedResponse {
            data: users,
            meta: PageMeta {
                total,
                page: 1,
                page_count: 1,
                per_page: 10,
            },
        };
        ctx.state::<QueryCache>()
            .unwrap()
            .set_data(&key, page.clone(), now);
        ctx.update::<ListFetch<User>>(|fetch| *fetch = ListFetch::Loaded { key, page });
        UsersPage::drive(ctx);
    }

    fn page(ctx: &mut StateCtx) -> &mut UsersPage {
        ctx.state_mut::<UsersPage>().unwrap()
    }

    fn requested(ctx: &StateCtx) -> Option<UserMutation> {
        ctx.state::<UserMutationRequest>().unwrap().mutation.clone()
    }

    #[test]
    fn first_frame_shows_skeleton_until_rows_arrive() {
        let mut ctx = installed();
        UsersPage::drive(&mut ctx);
        assert!(page(&mut ctx).table.is_loading());
        assert!(page(&mut ctx).is_fetching());

        serve(&mut ctx, vec![user(1, "admin_user"), user(2, "linh")]);
        let page = page(&mut ctx);
        assert!(!page.table.is_loading());
        assert_eq!(page.table.rows().len(), 2);
        assert_eq!(page.table.total_row_count(), 2);
    }

    #[test]
    fn delete_action_confirms_against_username() {
        let mut ctx = installed();
        serve(&mut ctx, vec![user(1, "admin_user")]);

        let row = user(1, "admin_user");
        page(&mut ctx)
            .table
            .columns()
            .last()
            .unwrap()
            .activate(&row, RowId::from(1), RowActionKind::Delete);
        UsersPage::drive(&mut ctx);

        let users = page(&mut ctx);
        assert!(users.row_action.is_open(RowActionKind::Delete));
        let dialog = users.delete_dialog.as_mut().unwrap();
        assert_eq!(dialog.identifier(), "admin_user");
        dialog.set_input("admin");
        users.confirm_delete();
        assert!(!users.delete_dialog.as_ref().unwrap().is_loading());

        users.delete_dialog.as_mut().unwrap().set_input("admin_user");
        users.confirm_delete();
        assert!(users.delete_dialog.as_ref().unwrap().is_loading());
        users.cancel_delete();
        assert!(users.delete_dialog.is_some());

        UsersPage::drive(&mut ctx);
        assert_eq!(requested(&ctx), Some(UserMutation::Delete { id: 1 }));
    }

    #[test]
    fn status_toggle_runs_without_dialog() {
        let mut ctx = installed();
        serve(&mut ctx, vec![user(7, "linh")]);

        let row = user(7, "linh");
        page(&mut ctx)
            .table
            .columns()
            .last()
            .unwrap()
            .activate(&row, RowId::from(7), RowActionKind::ToggleStatus);
        UsersPage::drive(&mut ctx);

        assert!(page(&mut ctx).delete_dialog.is_none());
        assert_eq!(
            requested(&ctx),
            Some(UserMutation::BulkStatus {
                ids: vec![7],
                status: UserStatus::Inactive,
            })
        );
    }

    #[test]
    fn bulk_delete_targets_selected_users() {
        let mut ctx = installed();
        serve(
            &mut ctx,
            vec![user(1, "a"), user(3, "b"), user(4, "c"), user(5, "d")],
        );

        let users = page(&mut ctx);
        for id in [1, 3, 5] {
            users.table.set_row_selected(RowId::from(id), true);
        }
        assert_eq!(users.bulk_action(BulkAction::Delete), None);
        assert_eq!(users.bulk_delete_dialog.as_ref().unwrap().count(), 3);
        users.confirm_bulk_delete();
        UsersPage::drive(&mut ctx);

        assert_eq!(
            requested(&ctx),
            Some(UserMutation::BulkDelete { ids: vec![1, 3, 5] })
        );
    }

    #[test]
    fn export_copies_selected_rows() {
        let mut ctx = installed();
        serve(&mut ctx, vec![user(1, "a"), user(2, "b")]);

        let users = page(&mut ctx);
        users.table.set_row_selected(RowId::from(2), true);
        let exported = users.bulk_action(BulkAction::Export).unwrap();
        let rows = exported.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Username"], "b");
    }
}
