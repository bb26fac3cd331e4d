use beaute_states::{State, StateCtx, Time};
use chrono::Utc;
use flume::Receiver;
use log::{debug, warn};

use crate::config::BusinessConfig;
use crate::dialogs::{DialogOutcome, RoleDeleteDialog};
use crate::list_query::{ListFetch, ListTracker};
use crate::query_cache::QueryCache;
use crate::table::{
    ClientTable, RowActionDispatcher, RowActionEvent, RowActionKind, RowActionSlot, RowId,
    TableHandle, ToolbarConfig, export_rows,
};

use super::columns::{roles_columns, roles_initial_state, roles_toolbar};
use super::commands::{
    DeleteRoleCommand, DuplicateRoleCommand, FetchRolesCommand, RoleMutation,
    RoleMutationRequest, RoleMutationResult, RolesQuery, ToggleRoleStatusCommand,
};
use super::model::Role;

/// Roles page state. Driven once per frame by [`RolesPage::drive`].
pub struct RolesPage {
    pub table: ClientTable<Role>,
    pub row_action: RowActionSlot<Role>,
    pub delete_dialog: Option<RoleDeleteDialog>,
    pub toolbar: ToolbarConfig,
    tracker: ListTracker,
    row_actions: Receiver<RowActionEvent<Role>>,
    mutation_results: Receiver<RoleMutationResult>,
    pending: Vec<RoleMutation>,
}

impl State for RolesPage {}

impl RolesPage {
    pub fn install(ctx: &mut StateCtx, config: &BusinessConfig) {
        let (dispatch, row_actions) = RowActionDispatcher::channel();
        let mut table = ClientTable::new(
            roles_columns(dispatch),
            roles_initial_state(config.default_page_size()),
        );
        table.set_loading(true);
        let (request, mutation_results) = RoleMutationRequest::channel();

        ctx.add_state(RolesQuery::default());
        ctx.add_state(ListFetch::<Role>::default());
        ctx.add_state(request);
        ctx.add_state(Self {
            table,
            row_action: RowActionSlot::default(),
            delete_dialog: None,
            toolbar: roles_toolbar(),
            tracker: ListTracker::default(),
            row_actions,
            mutation_results,
            pending: Vec::new(),
        });
        ctx.record_command(FetchRolesCommand);
        ctx.record_command(DeleteRoleCommand);
        ctx.record_command(ToggleRoleStatusCommand);
        ctx.record_command(DuplicateRoleCommand);
    }

    pub fn drive(ctx: &mut StateCtx) {
        let now = ctx.state::<Time>().map_or_else(Utc::now, Time::now);
        let Some(cache) = ctx.state::<QueryCache>().cloned() else {
            warn!("RolesPage::drive: QueryCache is not registered");
            return;
        };
        let Some(key) = ctx.state::<RolesQuery>().map(RolesQuery::key) else {
            warn!("RolesPage::drive: page is not installed");
            return;
        };
        let fetched = ctx
            .state_mut::<ListFetch<Role>>()
            .map(std::mem::take)
            .unwrap_or_default();

        let Some(page) = ctx.state_mut::<Self>() else {
            return;
        };
        if let Some(fetched) = page.tracker.accept(fetched) {
            page.apply_fetch(fetched);
        }
        page.route_row_actions();
        page.apply_mutation_results();
        let fetch = page.tracker.should_fetch(&key, &cache, now);
        if fetch && page.table.data().is_empty() {
            page.table.set_loading(true);
        }
        let mutations = std::mem::take(&mut page.pending);

        if fetch {
            ctx.dispatch::<FetchRolesCommand>();
        }
        for mutation in mutations {
            let kind = mutation.clone();
            ctx.update::<RoleMutationRequest>(|request| request.mutation = Some(mutation));
            match kind {
                RoleMutation::Delete { .. } => ctx.dispatch::<DeleteRoleCommand>(),
                RoleMutation::ToggleStatus { .. } => ctx.dispatch::<ToggleRoleStatusCommand>(),
                RoleMutation::Duplicate { .. } => ctx.dispatch::<DuplicateRoleCommand>(),
            }
        }
    }

    fn apply_fetch(&mut self, fetched: ListFetch<Role>) {
        match fetched {
            ListFetch::Loading { has_data, .. } => {
                if !has_data && self.table.data().is_empty() {
                    self.table.set_loading(true);
                }
            }
            ListFetch::Loaded { page, .. } => self.table.set_data(page.data),
            ListFetch::Failed { .. } => self.table.set_loading(false),
            ListFetch::Idle => {}
        }
    }

    fn route_row_actions(&mut self) {
        let events: Vec<_> = self.row_actions.try_iter().collect();
        for event in events {
            match event.kind {
                RowActionKind::ToggleStatus => {
                    let active = !event.row.status;
                    self.set_local_status(&event.row.id, active);
                    self.pending.push(RoleMutation::ToggleStatus {
                        id: event.row.id,
                        active,
                    });
                }
                RowActionKind::Duplicate => self.pending.push(RoleMutation::Duplicate {
                    name: event.row.duplicate_name(),
                    id: event.row.id,
                }),
                RowActionKind::Delete => {
                    self.delete_dialog = Some(RoleDeleteDialog::new(
                        event.row_id,
                        event.row.name.clone(),
                        event.row.users_count.unwrap_or(0),
                    ));
                    self.row_action.open(event);
                }
                RowActionKind::View | RowActionKind::Edit => {
                    self.delete_dialog = None;
                    self.row_action.open(event);
                }
            }
        }
    }

    /// Mirrors the optimistic status flip on the rows already shown.
    fn set_local_status(&mut self, id: &str, active: bool) {
        let mut rows = self.table.data().to_vec();
        let mut changed = false;
        for role in rows.iter_mut().filter(|role| role.id == id) {
            changed |= role.status != active;
            role.status = active;
        }
        if changed {
            self.table.set_data(rows);
        }
    }

    fn apply_mutation_results(&mut self) {
        let results: Vec<_> = self.mutation_results.try_iter().collect();
        for RoleMutationResult { mutation, result } in results {
            match mutation {
                RoleMutation::Delete { .. } => {
                    let closed = self
                        .delete_dialog
                        .as_mut()
                        .is_some_and(|dialog| dialog.finish(result) == DialogOutcome::Closed);
                    if closed {
                        self.delete_dialog = None;
                        self.row_action.close();
                    }
                }
                RoleMutation::ToggleStatus { id, active } => {
                    if result.is_err() {
                        debug!("status change of role {id} refused; restoring");
                        self.set_local_status(&id, !active);
                    }
                }
                RoleMutation::Duplicate { .. } => {}
            }
        }
    }

    pub fn confirm_delete(&mut self) {
        let Some(target) = self
            .delete_dialog
            .as_mut()
            .and_then(RoleDeleteDialog::begin_confirm)
        else {
            return;
        };
        match self.role_id(target) {
            Some(id) => self.pending.push(RoleMutation::Delete { id }),
            None => warn!("delete confirmed for unknown row {target}"),
        }
    }

    fn role_id(&self, target: RowId) -> Option<String> {
        self.table
            .row(target)
            .or(self.row_action.active().map(|event| &event.row))
            .map(|role| role.id.clone())
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

    /// Selected roles as json, for the floating bar's export button.
    pub fn export_selected(&self) -> serde_json::Value {
        export_rows(&self.table)
    }

    pub fn is_fetching(&self) -> bool {
        self.tracker.is_in_flight()
    }
}
