use std::any::{Any, TypeId, type_name};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::{Error, State, Updater};

pub type CommandFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// How a command behaves when it is dispatched again while a previous run is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    /// The previous run is cancelled and anything it still publishes is discarded.
    #[default]
    LatestOnly,
    /// Runs overlap; every run publishes its own results.
    Parallel,
}

/// Manual-only unit of work, usually network IO.
///
/// UI code sets input states, calls `ctx.dispatch::<C>()`, and reads results back
/// from states after `ctx.sync()`.
pub trait Command: Send + Sync + 'static {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        cancel: CancellationToken,
    ) -> CommandFuture;

    fn concurrency(&self) -> Concurrency {
        Concurrency::LatestOnly
    }
}

/// Owned copies of every snapshot-able state, taken at dispatch time.
#[derive(Default)]
pub struct CommandSnapshot {
    states: BTreeMap<TypeId, Box<dyn Any + Send>>,
}

impl CommandSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_boxed(&mut self, id: TypeId, value: Box<dyn Any + Send>) {
        self.states.insert(id, value);
    }

    /// Inserts a state copy directly. Useful for driving commands in tests.
    pub fn with<T: State>(mut self, value: T) -> Self {
        self.states.insert(TypeId::of::<T>(), Box::new(value));
        self
    }

    pub fn state<T: State>(&self) -> Result<&T, Error> {
        self.states
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .ok_or_else(|| Error::state_not_found(type_name::<T>()))
    }

    pub fn cloned<T: State + Clone>(&self) -> Result<T, Error> {
        self.state::<T>().cloned()
    }
}
