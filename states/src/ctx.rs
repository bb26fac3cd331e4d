use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use flume::{Receiver, Sender};
use log::{debug, error, warn};
use tokio_util::sync::CancellationToken;

use crate::state::{StateSlot, Update};
use crate::{
    Command, CommandSnapshot, Concurrency, Error, State, TaskHandle, TaskId, Updater,
};

struct CommandSlot {
    name: &'static str,
    command: Arc<dyn Command>,
    generation: u64,
}

/// Owns every state of one console instance plus the commands that update them.
///
/// Nothing in here is global: tests build their own `StateCtx` with fakes for the
/// API client, token store and query cache.
pub struct StateCtx {
    states: HashMap<TypeId, StateSlot>,
    commands: HashMap<TypeId, CommandSlot>,
    sender: Sender<Update>,
    receiver: Receiver<Update>,
    tasks: Vec<TaskHandle>,
}

impl Default for StateCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StateCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut states: Vec<_> = self.states.values().map(|slot| slot.name).collect();
        states.sort_unstable();
        f.debug_struct("StateCtx")
            .field("states", &states)
            .field("commands", &self.commands.len())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl StateCtx {
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            states: HashMap::new(),
            commands: HashMap::new(),
            sender,
            receiver,
            tasks: Vec::new(),
        }
    }

    /// Registers (or replaces) a state.
    pub fn add_state<T: State>(&mut self, state: T) {
        self.states.insert(TypeId::of::<T>(), StateSlot::new(state));
    }

    pub fn record_command<C: Command>(&mut self, command: C) {
        self.commands.insert(
            TypeId::of::<C>(),
            CommandSlot {
                name: type_name::<C>(),
                command: Arc::new(command),
                generation: 0,
            },
        );
    }

    pub fn state<T: State>(&self) -> Option<&T> {
        self.states
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.value.downcast_ref::<T>())
    }

    pub fn state_mut<T: State>(&mut self) -> Option<&mut T> {
        self.states
            .get_mut(&TypeId::of::<T>())
            .and_then(|slot| slot.value.downcast_mut::<T>())
    }

    /// Runs `f` against state `T`. Returns `false` when `T` was never registered.
    pub fn update<T: State>(&mut self, f: impl FnOnce(&mut T)) -> bool {
        match self.state_mut::<T>() {
            Some(state) => {
                f(state);
                true
            }
            None => {
                warn!("update: state {} is not registered", type_name::<T>());
                false
            }
        }
    }

    /// Dispatches a recorded command on the current tokio runtime, logging failures.
    pub fn dispatch<C: Command>(&mut self) {
        if let Err(err) = self.try_dispatch::<C>() {
            error!("dispatch failed: {err}");
        }
    }

    pub fn try_dispatch<C: Command>(&mut self) -> Result<TaskId, Error> {
        let name = type_name::<C>();
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime { name })?;

        let command_id = TypeId::of::<C>();
        let slot = self
            .commands
            .get_mut(&command_id)
            .ok_or_else(|| Error::command_not_found(name))?;
        slot.generation += 1;
        let generation = slot.generation;
        let command = Arc::clone(&slot.command);

        let stamp = match command.concurrency() {
            Concurrency::LatestOnly => {
                for task in self.tasks.iter().filter(|t| t.id().command() == command_id) {
                    task.cancel();
                }
                Some((command_id, generation))
            }
            Concurrency::Parallel => None,
        };

        let snapshot = self.snapshot();
        let updater = Updater::new(self.sender.clone(), stamp);
        let cancel = CancellationToken::new();
        let future = command.run(snapshot, updater, cancel.clone());

        let id = TaskId::new(command_id, generation);
        debug!("dispatch {name} generation {generation}");
        let join = runtime.spawn(future);
        self.tasks.push(TaskHandle::new(id, cancel, join));
        Ok(id)
    }

    fn snapshot(&self) -> CommandSnapshot {
        let mut snapshot = CommandSnapshot::new();
        for (id, slot) in &self.states {
            if let Some(copy) = (slot.snapshot)(slot.value.as_ref()) {
                snapshot.insert_boxed(*id, copy);
            }
        }
        snapshot
    }

    fn is_current(&self, (command, generation): (TypeId, u64)) -> bool {
        self.commands
            .get(&command)
            .is_some_and(|slot| slot.generation == generation)
    }

    /// Applies every update published since the last call. Call once per frame.
    ///
    /// Returns the number of states replaced.
    pub fn sync(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.receiver.try_recv() {
            if let Some(stamp) = update.stamp
                && !self.is_current(stamp)
            {
                debug!(
                    "dropping stale update for {} (generation {})",
                    update.name, stamp.1
                );
                continue;
            }
            match self.states.get_mut(&update.state) {
                Some(slot) => {
                    slot.value = update.value;
                    applied += 1;
                }
                None => warn!("sync: update for unregistered state {}", update.name),
            }
        }
        self.tasks.retain(|task| !task.is_finished());
        applied
    }

    /// Whether any dispatched command is still running.
    pub fn has_pending_tasks(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }

    /// Waits for every in-flight command, then applies their updates.
    pub async fn settle(&mut self) -> usize {
        for task in std::mem::take(&mut self.tasks) {
            task.join().await;
        }
        self.sync()
    }

    /// Cancels every in-flight command. Their later updates are still queued but
    /// well-behaved commands stop publishing once cancelled.
    pub fn cancel_all(&mut self) {
        for task in &self.tasks {
            task.cancel();
        }
    }
}

impl Drop for StateCtx {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
