//! Handles for commands running on the tokio runtime.
//!
//! - `TaskId`: command type plus the generation it was dispatched with
//! - `TaskHandle`: the task's `CancellationToken` plus its join handle
//!
//! Cancellation is cooperative: commands race their IO against `cancel.cancelled()`
//! with `tokio::select!` and return early when asked to stop.

use std::any::TypeId;

use log::warn;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Identifies one dispatch of a command.
///
/// Dispatching the same command again yields a higher generation, which is how stale
/// results are told apart from current ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    command: TypeId,
    generation: u64,
}

impl TaskId {
    pub fn new(command: TypeId, generation: u64) -> Self {
        Self {
            command,
            generation,
        }
    }

    pub fn command(&self) -> TypeId {
        self.command
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A dispatched command: cancellation token plus join handle.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    cancel_token: CancellationToken,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub fn new(id: TaskId, cancel_token: CancellationToken, join: JoinHandle<()>) -> Self {
        Self {
            id,
            cancel_token,
            join,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Requests cooperative cancellation. The task stops at its next check point.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the task to finish. Panics inside the task are logged, not propagated.
    pub async fn join(self) {
        if let Err(err) = self.join.await
            && err.is_panic()
        {
            warn!("command task {:?} panicked: {err}", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_generations_differ() {
        let first = TaskId::new(TypeId::of::<String>(), 1);
        let second = TaskId::new(TypeId::of::<String>(), 2);
        let other = TaskId::new(TypeId::of::<i32>(), 1);

        assert_eq!(first.command(), second.command());
        assert_ne!(first, second);
        assert_ne!(first, other);
        assert!(second.generation() > first.generation());
    }

    #[tokio::test]
    async fn cancel_is_observed_by_the_task() {
        let token = CancellationToken::new();
        let child = token.clone();
        let join = tokio::spawn(async move {
            child.cancelled().await;
        });
        let handle = TaskHandle::new(TaskId::new(TypeId::of::<u8>(), 1), token, join);

        assert!(!handle.is_cancelled());
        handle.cancel();
        assert!(handle.is_cancelled());
        handle.join().await;
    }

    #[tokio::test]
    async fn cloned_token_shares_cancellation() {
        let join = tokio::spawn(async {});
        let handle = TaskHandle::new(
            TaskId::new(TypeId::of::<u8>(), 1),
            CancellationToken::new(),
            join,
        );
        let token = handle.cancellation_token();

        handle.cancel();
        assert!(token.is_cancelled());
        handle.join().await;
    }
}
