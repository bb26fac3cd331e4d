use std::any::{TypeId, type_name};

use flume::Sender;
use log::debug;

use crate::State;
use crate::state::Update;

/// Publishes state replacements from a running command back to the frame loop.
///
/// Values are applied on the next `StateCtx::sync()`. For latest-only commands the
/// updater carries the generation it was dispatched with; `sync()` discards values
/// from any generation that has since been superseded, so a slow response for an
/// old request can never overwrite the result of a newer one.
#[derive(Debug, Clone)]
pub struct Updater {
    sender: Sender<Update>,
    stamp: Option<(TypeId, u64)>,
}

impl Updater {
    pub(crate) fn new(sender: Sender<Update>, stamp: Option<(TypeId, u64)>) -> Self {
        Self { sender, stamp }
    }

    /// An updater whose output goes nowhere, for driving commands in isolation.
    pub fn detached() -> (Self, UpdateReceiver) {
        let (sender, receiver) = flume::unbounded();
        (Self::new(sender, None), UpdateReceiver { receiver })
    }

    pub fn generation(&self) -> Option<u64> {
        self.stamp.map(|(_, generation)| generation)
    }

    pub fn set<T: State>(&self, value: T) {
        let update = Update {
            state: TypeId::of::<T>(),
            name: type_name::<T>(),
            value: Box::new(value),
            stamp: self.stamp,
        };
        if self.sender.send(update).is_err() {
            debug!("StateCtx dropped; discarding update for {}", type_name::<T>());
        }
    }
}

impl std::fmt::Debug for Update {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Update")
            .field("name", &self.name)
            .field("stamp", &self.stamp)
            .finish()
    }
}

/// Receiving end of [`Updater::detached`].
#[derive(Debug)]
pub struct UpdateReceiver {
    receiver: flume::Receiver<Update>,
}

impl UpdateReceiver {
    /// Drains every published value of type `T`, oldest first.
    pub fn drain<T: State>(&self) -> Vec<T> {
        self.receiver
            .try_iter()
            .filter(|update| update.state == TypeId::of::<T>())
            .filter_map(|update| update.value.downcast::<T>().ok())
            .map(|boxed| *boxed)
            .collect()
    }
}
