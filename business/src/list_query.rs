//! Plumbing shared by the list pages: the fetch result state, the per-page request
//! tracker, and the query/mutation runners used by every command.

use std::future::Future;

use beaute_states::{CommandSnapshot, State, Time, Updater};
use chrono::{DateTime, Utc};
use log::{debug, error};
use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, PaginatedResponse};
use crate::api_error::ApiError;
use crate::auth::redirect_if_unauthorized;
use crate::notifications::Notifications;
use crate::query_cache::{QueryCache, QueryKey};

/// Latest list fetch outcome, published by a fetch command and taken by its page.
#[derive(Debug, Clone, PartialEq)]
pub enum ListFetch<T> {
    Idle,
    Loading { key: QueryKey, has_data: bool },
    Loaded {
        key: QueryKey,
        page: PaginatedResponse<T>,
    },
    Failed { key: QueryKey, error: ApiError },
}

impl<T> Default for ListFetch<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> ListFetch<T> {
    pub fn key(&self) -> Option<&QueryKey> {
        match self {
            Self::Idle => None,
            Self::Loading { key, .. } | Self::Loaded { key, .. } | Self::Failed { key, .. } => {
                Some(key)
            }
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Loaded { .. } | Self::Failed { .. })
    }
}

impl<T: Send + 'static> State for ListFetch<T> {}

/// Which list key a page asked for, and whether that request is still running.
#[derive(Debug, Clone, Default)]
pub struct ListTracker {
    requested: Option<QueryKey>,
    in_flight: bool,
}

impl ListTracker {
    pub fn requested(&self) -> Option<&QueryKey> {
        self.requested.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether a fetch for `key` must be dispatched now. A new key always fetches; the
    /// current key refetches once its cached data went stale or was invalidated.
    pub fn should_fetch(&mut self, key: &QueryKey, cache: &QueryCache, now: DateTime<Utc>) -> bool {
        let changed = self.requested.as_ref() != Some(key);
        if changed || (!self.in_flight && cache.needs_fetch(key, now)) {
            self.requested = Some(key.clone());
            self.in_flight = true;
            true
        } else {
            false
        }
    }

    /// Passes through results for the requested key only.
    pub fn accept<T>(&mut self, fetch: ListFetch<T>) -> Option<ListFetch<T>> {
        if fetch.key().is_none() || fetch.key() != self.requested.as_ref() {
            return None;
        }
        if fetch.is_terminal() {
            self.in_flight = false;
        }
        Some(fetch)
    }
}

/// States every data command reads from its snapshot.
#[derive(Debug, Clone)]
pub struct QueryDeps {
    pub client: ApiClient,
    pub cache: QueryCache,
    pub notifications: Notifications,
    pub now: DateTime<Utc>,
}

impl QueryDeps {
    pub fn from_snapshot(snap: &CommandSnapshot) -> Result<Self, beaute_states::Error> {
        Ok(Self {
            client: snap.cloned::<ApiClient>()?,
            cache: snap.cloned::<QueryCache>()?,
            notifications: snap.cloned::<Notifications>()?,
            now: snap.state::<Time>().map_or_else(|_| Utc::now(), Time::now),
        })
    }

    /// Cache-first list fetch for `key` with the query retry policy.
    ///
    /// Publishes [`ListFetch`] transitions; failures also raise a notification and the
    /// login redirect on 401.
    pub async fn run_list_query<T, F, Fut>(
        &self,
        context: &str,
        key: QueryKey,
        updater: &Updater,
        cancel: &CancellationToken,
        op: F,
    ) where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<PaginatedResponse<T>, ApiError>>,
    {
        let cached = self.cache.data::<PaginatedResponse<T>>(&key);
        if let Some(page) = cached.clone()
            && !self.cache.is_stale(&key, self.now)
        {
            debug!("{context}: serving {key} from cache");
            updater.set(ListFetch::Loaded { key, page });
            return;
        }

        self.cache.set_loading(&key, self.now);
        updater.set(ListFetch::<T>::Loading {
            key: key.clone(),
            has_data: cached.is_some(),
        });

        let retry = self.cache.query_retry();
        let result = tokio::select! {
            () = cancel.cancelled() => {
                debug!("{context}: fetch for {key} superseded");
                self.cache.abandon(&key);
                return;
            }
            result = retry.run(cancel, op) => result,
        };

        match result {
            Ok(page) => {
                debug!("{context}: loaded {} rows for {key}", page.data.len());
                self.cache.set_data(&key, page.clone(), self.now);
                updater.set(ListFetch::Loaded { key, page });
            }
            Err(err) => {
                self.cache.set_error(&key, err.clone(), self.now);
                self.report(context, &err, updater);
                updater.set(ListFetch::<T>::Failed { key, error: err });
            }
        }
    }

    /// Runs a mutation with the mutation retry policy. A cancelled run reports a network
    /// error so callers still clear their in-flight flags.
    pub async fn run_mutation<R, F, Fut>(
        &self,
        context: &str,
        updater: &Updater,
        cancel: &CancellationToken,
        op: F,
    ) -> Result<R, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, ApiError>>,
    {
        let retry = self.cache.mutation_retry();
        let result = tokio::select! {
            () = cancel.cancelled() => Err(ApiError::new(0, "The request was cancelled.")),
            result = retry.run(cancel, op) => result,
        };
        if let Err(err) = &result {
            self.report(context, err, updater);
        }
        result
    }

    fn report(&self, context: &str, err: &ApiError, updater: &Updater) {
        if !redirect_if_unauthorized(err, updater) {
            self.notifications.api_error(context, err);
        } else {
            error!("{context}: {err}");
        }
    }
}
