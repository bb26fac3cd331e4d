//! Commands for the roles page. The list is fetched whole and paged client-side.

use beaute_states::{Command, CommandFuture, CommandSnapshot, Concurrency, State, Updater};
use flume::{Receiver, Sender};
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::api::PaginatedResponse;
use crate::api_error::ApiError;
use crate::list_query::QueryDeps;
use crate::query_cache::{QueryKey, query_keys};

use super::api;
use super::model::{Role, RoleFilters, RoleStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolesQuery {
    pub filters: RoleFilters,
}

impl RolesQuery {
    pub fn key(&self) -> QueryKey {
        query_keys::roles::list(&self.filters.to_query())
    }
}

impl State for RolesQuery {
    fn snapshot(&self) -> Option<Self> {
        Some(self.clone())
    }
}

#[derive(Debug, Default)]
pub struct FetchRolesCommand;

impl Command for FetchRolesCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        let inputs = QueryDeps::from_snapshot(&snap)
            .and_then(|deps| Ok((deps, snap.cloned::<RolesQuery>()?)));

        Box::pin(async move {
            let (deps, query) = match inputs {
                Ok(inputs) => inputs,
                Err(err) => {
                    error!("FetchRolesCommand: {err}");
                    return;
                }
            };
            deps.run_list_query("FetchRolesCommand", query.key(), &updater, &cancel, || {
                api::list(&deps.client, &query.filters)
            })
            .await;
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleMutation {
    Delete { id: String },
    /// Sets the role's status to `active`.
    ToggleStatus { id: String, active: bool },
    Duplicate { id: String, name: String },
}

impl RoleMutation {
    fn success_message(&self) -> String {
        match self {
            Self::Delete { .. } => "Role deleted".to_owned(),
            Self::ToggleStatus { active: true, .. } => "Role activated".to_owned(),
            Self::ToggleStatus { active: false, .. } => "Role deactivated".to_owned(),
            Self::Duplicate { name, .. } => format!("Created \"{name}\""),
        }
    }

    async fn execute(&self, deps: &QueryDeps) -> Result<(), ApiError> {
        match self {
            Self::Delete { id } => api::delete(&deps.client, id).await,
            Self::ToggleStatus { id, active } => {
                api::update_status(&deps.client, id, RoleStatus::from_active(*active))
                    .await
                    .map(|_| ())
            }
            Self::Duplicate { id, name } => api::duplicate(&deps.client, id, name).await.map(|_| ()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleMutationResult {
    pub mutation: RoleMutation,
    pub result: Result<(), ApiError>,
}

#[derive(Debug, Clone)]
pub struct RoleMutationRequest {
    pub mutation: Option<RoleMutation>,
    results: Sender<RoleMutationResult>,
}

impl RoleMutationRequest {
    pub fn channel() -> (Self, Receiver<RoleMutationResult>) {
        let (results, receiver) = flume::unbounded();
        (
            Self {
                mutation: None,
                results,
            },
            receiver,
        )
    }
}

impl State for RoleMutationRequest {
    fn snapshot(&self) -> Option<Self> {
        Some(self.clone())
    }
}

fn set_cached_status(page: &mut PaginatedResponse<Role>, id: &str, active: bool) {
    for role in page.data.iter_mut().filter(|role| role.id == id) {
        role.status = active;
    }
}

fn run_role_mutation(
    context: &'static str,
    snap: &CommandSnapshot,
    updater: Updater,
    cancel: CancellationToken,
    accepts: fn(&RoleMutation) -> bool,
) -> CommandFuture {
    let inputs = QueryDeps::from_snapshot(snap).and_then(|deps| {
        Ok((
            deps,
            snap.cloned::<RoleMutationRequest>()?,
            snap.cloned::<RolesQuery>()?,
        ))
    });

    Box::pin(async move {
        let (deps, RoleMutationRequest { mutation, results }, query) = match inputs {
            Ok(inputs) => inputs,
            Err(err) => {
                error!("{context}: {err}");
                return;
            }
        };
        let Some(mutation) = mutation.filter(accepts) else {
            error!("{context}: dispatched without a matching mutation request");
            return;
        };
        let list_key = query.key();

        info!("{context}: {mutation:?}");
        let rollback = match &mutation {
            RoleMutation::ToggleStatus { id, active } => deps
                .cache
                .update_data::<PaginatedResponse<Role>>(&list_key, |page| {
                    set_cached_status(page, id, *active);
                }),
            _ => None,
        };

        let result = deps
            .run_mutation(context, &updater, &cancel, || mutation.execute(&deps))
            .await;

        match (&result, rollback) {
            (Ok(()), _) => deps.notifications.success(mutation.success_message()),
            (Err(_), Some(previous)) => {
                warn!("{context}: rolling back {list_key}");
                deps.cache
                    .update_data::<PaginatedResponse<Role>>(&list_key, |page| *page = previous);
            }
            (Err(_), None) => {}
        }
        if let RoleMutation::Delete { id } = &mutation
            && result.is_ok()
        {
            deps.cache.remove(&query_keys::roles::detail(id));
        }
        if result.is_ok() || matches!(mutation, RoleMutation::ToggleStatus { .. }) {
            deps.cache.invalidate(&query_keys::roles::lists());
        }
        if results.send(RoleMutationResult { mutation, result }).is_err() {
            debug!("{context}: roles page is gone; result dropped");
        }
    })
}

#[derive(Debug, Default)]
pub struct DeleteRoleCommand;

impl Command for DeleteRoleCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        run_role_mutation("DeleteRoleCommand", &snap, updater, cancel, |mutation| {
            matches!(mutation, RoleMutation::Delete { .. })
        })
    }

    fn concurrency(&self) -> Concurrency {
        Concurrency::Parallel
    }
}

/// Flips the status in the cached list first and restores it when the server refuses.
#[derive(Debug, Default)]
pub struct ToggleRoleStatusCommand;

impl Command for ToggleRoleStatusCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        run_role_mutation("ToggleRoleStatusCommand", &snap, updater, cancel, |mutation| {
            matches!(mutation, RoleMutation::ToggleStatus { .. })
        })
    }

    fn concurrency(&self) -> Concurrency {
        Concurrency::Parallel
    }
}

#[derive(Debug, Default)]
pub struct DuplicateRoleCommand;

impl Command for DuplicateRoleCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        run_role_mutation("DuplicateRoleCommand", &snap, updater, cancel, |mutation| {
            matches!(mutation, RoleMutation::Duplicate { .. })
        })
    }

    fn concurrency(&self) -> Concurrency {
        Concurrency::Parallel
    }
}
