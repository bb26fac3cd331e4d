use std::any::{Any, TypeId, type_name};

/// A value stored once per type inside a [`crate::StateCtx`].
///
/// States that commands need to read implement [`State::snapshot`]; the returned
/// copy is what a command sees, so a command never holds a borrow into the frame loop.
pub trait State: Any + Send {
    /// Copy handed to commands. `None` keeps the state private to the frame loop.
    fn snapshot(&self) -> Option<Self>
    where
        Self: Sized,
    {
        None
    }
}

pub(crate) type SnapshotFn = fn(&(dyn Any + Send)) -> Option<Box<dyn Any + Send>>;

/// Type-erased storage slot for a registered state.
pub(crate) struct StateSlot {
    pub(crate) name: &'static str,
    pub(crate) value: Box<dyn Any + Send>,
    pub(crate) snapshot: SnapshotFn,
}

impl StateSlot {
    pub(crate) fn new<T: State>(value: T) -> Self {
        Self {
            name: type_name::<T>(),
            value: Box::new(value),
            snapshot: snapshot_typed::<T>,
        }
    }
}

fn snapshot_typed<T: State>(value: &(dyn Any + Send)) -> Option<Box<dyn Any + Send>> {
    value
        .downcast_ref::<T>()
        .and_then(T::snapshot)
        .map(|copy| Box::new(copy) as Box<dyn Any + Send>)
}

/// A pending state replacement produced by a command.
pub(crate) struct Update {
    pub(crate) state: TypeId,
    pub(crate) name: &'static str,
    pub(crate) value: Box<dyn Any + Send>,
    /// `(command, generation)` for latest-only commands.
    pub(crate) stamp: Option<(TypeId, u64)>,
}
