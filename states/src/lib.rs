mod command;
mod ctx;
mod debounce;
mod error;
mod state;
mod task;
mod time;
mod updater;

pub use command::{Command, CommandFuture, CommandSnapshot, Concurrency};
pub use ctx::StateCtx;
pub use debounce::Debouncer;
pub use error::Error;
pub use state::State;
pub use task::{TaskHandle, TaskId};
pub use time::Time;
pub use updater::{UpdateReceiver, Updater};
