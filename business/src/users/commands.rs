//! Commands for the users page: the latest-only page fetch and the parallel mutations.

use beaute_states::{Command, CommandFuture, CommandSnapshot, Concurrency, State, Updater};
use flume::{Receiver, Sender};
use log::{debug, error, info};
use tokio_util::sync::CancellationToken;

use crate::api_error::ApiError;
use crate::list_query::QueryDeps;
use crate::query_cache::{QueryKey, query_keys};
use crate::table::ServerTableFilters;

use super::api;
use super::model::UserStatus;

/// Filters of the page being shown; input of [`FetchUsersPageCommand`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsersQuery {
    pub filters: ServerTableFilters,
}

impl UsersQuery {
    pub fn key(&self) -> QueryKey {
        query_keys::users::list(&self.filters.to_query())
    }
}

impl State for UsersQuery {
    fn snapshot(&self) -> Option<Self> {
        Some(self.clone())
    }
}

#[derive(Debug, Default)]
pub struct FetchUsersPageCommand;

impl Command for FetchUsersPageCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        let inputs = QueryDeps::from_snapshot(&snap)
            .and_then(|deps| Ok((deps, snap.cloned::<UsersQuery>()?)));

        Box::pin(async move {
            let (deps, query) = match inputs {
                Ok(inputs) => inputs,
                Err(err) => {
                    error!("FetchUsersPageCommand: {err}");
                    return;
                }
            };
            deps.run_list_query("FetchUsersPageCommand", query.key(), &updater, &cancel, || {
                api::list(&deps.client, &query.filters)
            })
            .await;
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserMutation {
    Delete { id: u64 },
    BulkDelete { ids: Vec<u64> },
    BulkStatus { ids: Vec<u64>, status: UserStatus },
}

impl UserMutation {
    fn success_message(&self) -> String {
        match self {
            Self::Delete { .. } => "User deleted".to_owned(),
            Self::BulkDelete { ids } => format!("Deleted {} users", ids.len()),
            Self::BulkStatus { ids, status } => match status {
                UserStatus::Active => format!("Activated {} users", ids.len()),
                UserStatus::Inactive => format!("Deactivated {} users", ids.len()),
            },
        }
    }

    async fn execute(&self, deps: &QueryDeps) -> Result<(), ApiError> {
        match self {
            Self::Delete { id } => api::delete(&deps.client, *id).await,
            Self::BulkDelete { ids } => api::bulk_delete(&deps.client, ids).await,
            Self::BulkStatus { ids, status } => {
                api::bulk_update_status(&deps.client, ids, *status).await
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserMutationResult {
    pub mutation: UserMutation,
    pub result: Result<(), ApiError>,
}

/// The mutation to run next, and where its result goes.
///
/// Results travel over a channel rather than a state so parallel runs finishing in the
/// same frame are all delivered.
#[derive(Debug, Clone)]
pub struct UserMutationRequest {
    pub mutation: Option<UserMutation>,
    results: Sender<UserMutationResult>,
}

impl UserMutationRequest {
    pub fn channel() -> (Self, Receiver<UserMutationResult>) {
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

impl State for UserMutationRequest {
    fn snapshot(&self) -> Option<Self> {
        Some(self.clone())
    }
}

fn run_user_mutation(
    context: &'static str,
    snap: &CommandSnapshot,
    updater: Updater,
    cancel: CancellationToken,
    accepts: fn(&UserMutation) -> bool,
) -> CommandFuture {
    let inputs = QueryDeps::from_snapshot(snap)
        .and_then(|deps| Ok((deps, snap.cloned::<UserMutationRequest>()?)));

    Box::pin(async move {
        let (deps, UserMutationRequest { mutation, results }) = match inputs {
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

        info!("{context}: {mutation:?}");
        let result = deps
            .run_mutation(context, &updater, &cancel, || mutation.execute(&deps))
            .await;
        if result.is_ok() {
            deps.cache.invalidate(&query_keys::users::lists());
            deps.notifications.success(mutation.success_message());
        }
        if results.send(UserMutationResult { mutation, result }).is_err() {
            debug!("{context}: users page is gone; result dropped");
        }
    })
}

#[derive(Debug, Default)]
pub struct DeleteUserCommand;

impl Command for DeleteUserCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        run_user_mutation("DeleteUserCommand", &snap, updater, cancel, |mutation| {
            matches!(mutation, UserMutation::Delete { .. })
        })
    }

    fn concurrency(&self) -> Concurrency {
        Concurrency::Parallel
    }
}

#[derive(Debug, Default)]
pub struct BulkDeleteUsersCommand;

impl Command for BulkDeleteUsersCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        run_user_mutation("BulkDeleteUsersCommand", &snap, updater, cancel, |mutation| {
            matches!(mutation, UserMutation::BulkDelete { .. })
        })
    }

    fn concurrency(&self) -> Concurrency {
        Concurrency::Parallel
    }
}

#[derive(Debug, Default)]
pub struct BulkUpdateUserStatusCommand;

impl Command for BulkUpdateUserStatusCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        run_user_mutation(
            "BulkUpdateUserStatusCommand",
            &snap,
            updater,
            cancel,
            |mutation| matches!(mutation, UserMutation::BulkStatus { .. }),
        )
    }

    fn concurrency(&self) -> Concurrency {
        Concurrency::Parallel
    }
}
