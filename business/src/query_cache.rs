//! Keyed cache of fetched data with staleness, garbage collection and retry rules.
//!
//! [`QueryCache`] is an explicit handle: the app creates one, registers it as a state,
//! and commands reach it through their snapshot. Clones share the same entries.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use beaute_states::State;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::api_error::ApiError;

/// Ordered key segments; `["users", "list", "page=1&limit=10"]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn push(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// Appends a filter segment; pairs are sorted so equal filters give equal keys.
    pub fn with_filters(self, pairs: &[(String, String)]) -> Self {
        let mut pairs: Vec<_> = pairs.iter().filter(|(_, v)| !v.is_empty()).collect();
        pairs.sort();
        let joined = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        self.push(format!("{{{joined}}}"))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Key factories per resource: `all / lists / list(filters) / details / detail(id)`.
pub mod query_keys {
    use super::QueryKey;

    macro_rules! resource_keys {
        ($name:ident) => {
            pub mod $name {
                use super::QueryKey;

                pub fn all() -> QueryKey {
                    QueryKey::new([stringify!($name)])
                }

                pub fn lists() -> QueryKey {
                    all().push("list")
                }

                pub fn list(filters: &[(String, String)]) -> QueryKey {
                    lists().with_filters(filters)
                }

                pub fn details() -> QueryKey {
                    all().push("detail")
                }

                pub fn detail(id: impl ToString) -> QueryKey {
                    details().push(id.to_string())
                }
            }
        };
    }

    resource_keys!(users);
    resource_keys!(roles);

    pub fn permissions() -> QueryKey {
        QueryKey::new(["permissions"])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Loading,
    Success,
    Error,
}

struct Entry {
    status: QueryStatus,
    data: Option<Arc<dyn Any + Send + Sync>>,
    error: Option<ApiError>,
    updated_at: DateTime<Utc>,
    invalidated: bool,
}

/// When a failed request is tried again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub const QUERY: Self = Self::with_retries(3);
    pub const MUTATION: Self = Self::with_retries(2);
    pub const NEVER: Self = Self::with_retries(0);

    pub const fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
        }
    }

    pub const fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// `failures_before` counts failures prior to `err`. 4xx errors are never retried.
    pub fn should_retry(&self, failures_before: u32, err: &ApiError) -> bool {
        !err.is_client_error() && failures_before < self.max_retries
    }

    /// `min(base * 2^attempt, max)`
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Runs `op` until it succeeds, the policy gives up, or `cancel` fires.
    pub async fn run<T, F, Fut>(&self, cancel: &CancellationToken, mut op: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut failures = 0;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !self.should_retry(failures, &err) {
                return Err(err);
            }
            let delay = self.delay(failures);
            failures += 1;
            warn!("request failed ({err}); retry {failures} in {delay:?}");
            tokio::select! {
                () = cancel.cancelled() => return Err(err),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}

struct Inner {
    entries: BTreeMap<QueryKey, Entry>,
}

#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Mutex<Inner>>,
    stale_time: TimeDelta,
    gc_time: TimeDelta,
    query_retry: RetryPolicy,
    mutation_retry: RetryPolicy,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.lock().entries.len())
            .field("stale_time", &self.stale_time)
            .field("gc_time", &self.gc_time)
            .finish()
    }
}

impl QueryCache {
    /// 5 minute stale time, 10 minute gc time.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: BTreeMap::new(),
            })),
            stale_time: TimeDelta::minutes(5),
            gc_time: TimeDelta::minutes(10),
            query_retry: RetryPolicy::QUERY,
            mutation_retry: RetryPolicy::MUTATION,
        }
    }

    pub fn with_retry(mut self, query: RetryPolicy, mutation: RetryPolicy) -> Self {
        self.query_retry = query;
        self.mutation_retry = mutation;
        self
    }

    pub fn with_times(mut self, stale_time: TimeDelta, gc_time: TimeDelta) -> Self {
        self.stale_time = stale_time;
        self.gc_time = gc_time;
        self
    }

    pub fn query_retry(&self) -> RetryPolicy {
        self.query_retry
    }

    pub fn mutation_retry(&self) -> RetryPolicy {
        self.mutation_retry
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks `key` as loading, keeping any previous data for display.
    pub fn set_loading(&self, key: &QueryKey, now: DateTime<Utc>) {
        let mut inner = self.lock();
        match inner.entries.get_mut(key) {
            Some(entry) => entry.status = QueryStatus::Loading,
            None => {
                inner.entries.insert(
                    key.clone(),
                    Entry {
                        status: QueryStatus::Loading,
                        data: None,
                        error: None,
                        updated_at: now,
                        invalidated: false,
                    },
                );
            }
        }
    }

    pub fn set_data<T: Send + Sync + 'static>(&self, key: &QueryKey, value: T, now: DateTime<Utc>) {
        self.lock().entries.insert(
            key.clone(),
            Entry {
                status: QueryStatus::Success,
                data: Some(Arc::new(value)),
                error: None,
                updated_at: now,
                invalidated: false,
            },
        );
    }

    /// Records a failure. Previous data is kept.
    pub fn set_error(&self, key: &QueryKey, err: ApiError, now: DateTime<Utc>) {
        let mut inner = self.lock();
        let entry = inner.entries.entry(key.clone()).or_insert_with(|| Entry {
            status: QueryStatus::Error,
            data: None,
            error: None,
            updated_at: now,
            invalidated: false,
        });
        entry.status = QueryStatus::Error;
        entry.error = Some(err);
    }

    pub fn data<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.lock()
            .entries
            .get(key)
            .and_then(|entry| entry.data.as_ref())
            .and_then(|data| data.downcast_ref::<T>())
            .cloned()
    }

    /// Rewrites cached data in place and returns the previous value for rollback.
    pub fn update_data<T: Clone + Send + Sync + 'static>(
        &self,
        key: &QueryKey,
        f: impl FnOnce(&mut T),
    ) -> Option<T> {
        let mut inner = self.lock();
        let entry = inner.entries.get_mut(key)?;
        let previous = entry.data.as_ref()?.downcast_ref::<T>()?.clone();
        let mut next = previous.clone();
        f(&mut next);
        entry.data = Some(Arc::new(next));
        Some(previous)
    }

    pub fn status(&self, key: &QueryKey) -> Option<QueryStatus> {
        self.lock().entries.get(key).map(|entry| entry.status)
    }

    pub fn error(&self, key: &QueryKey) -> Option<ApiError> {
        self.lock().entries.get(key).and_then(|entry| entry.error.clone())
    }

    /// Missing, invalidated, failed, or older than the stale time.
    pub fn is_stale(&self, key: &QueryKey, now: DateTime<Utc>) -> bool {
        self.lock().entries.get(key).is_none_or(|entry| {
            entry.invalidated
                || entry.status != QueryStatus::Success
                || now - entry.updated_at >= self.stale_time
        })
    }

    /// Undoes [`QueryCache::set_loading`] for a fetch that was cancelled: entries with
    /// data go back to success, empty ones are dropped.
    pub fn abandon(&self, key: &QueryKey) {
        let mut inner = self.lock();
        let Some(entry) = inner.entries.get_mut(key) else {
            return;
        };
        if entry.status != QueryStatus::Loading {
            return;
        }
        if entry.data.is_some() {
            entry.status = QueryStatus::Success;
        } else {
            inner.entries.remove(key);
        }
    }

    /// Whether an observer of `key` should start a fetch: nothing cached yet, or a
    /// successful entry that went stale. Loading and failed entries wait for an explicit
    /// refetch so a failing endpoint is not hammered every frame.
    pub fn needs_fetch(&self, key: &QueryKey, now: DateTime<Utc>) -> bool {
        self.lock().entries.get(key).is_none_or(|entry| {
            entry.status == QueryStatus::Success
                && (entry.invalidated || now - entry.updated_at >= self.stale_time)
        })
    }

    /// Marks every entry under `prefix` stale. Returns how many matched.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut inner = self.lock();
        let mut count = 0;
        for (key, entry) in &mut inner.entries {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                count += 1;
            }
        }
        debug!("invalidated {count} entries under {prefix}");
        count
    }

    pub fn remove(&self, prefix: &QueryKey) -> usize {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, _| !key.starts_with(prefix));
        before - inner.entries.len()
    }

    /// Keys under `prefix`, in key order.
    pub fn keys(&self, prefix: &QueryKey) -> Vec<QueryKey> {
        self.lock()
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Drops entries not updated within the gc time.
    pub fn collect_garbage(&self, now: DateTime<Utc>) -> usize {
        let gc_time = self.gc_time;
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, entry| now - entry.updated_at < gc_time);
        before - inner.entries.len()
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl State for QueryCache {
    fn snapshot(&self) -> Option<Self> {
        Some(self.clone())
    }
}
