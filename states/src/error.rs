use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("State not found: {name}")]
    StateNotFound { name: &'static str },
    #[error("Command not recorded: {name}")]
    CommandNotFound { name: &'static str },
    #[error("No tokio runtime available to run {name}")]
    NoRuntime { name: &'static str },
}

impl Error {
    pub fn state_not_found(name: &'static str) -> Self {
        Self::StateNotFound { name }
    }

    pub fn command_not_found(name: &'static str) -> Self {
        Self::CommandNotFound { name }
    }
}
