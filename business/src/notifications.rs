use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use beaute_states::State;
use log::error;

use crate::api_error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Toast queue shared between commands (producers) and the frame loop (consumer).
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    queue: Arc<Mutex<VecDeque<Notification>>>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, level: NotificationLevel, message: impl Into<String>) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Notification {
                level,
                message: message.into(),
            });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(NotificationLevel::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(NotificationLevel::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(NotificationLevel::Warning, message);
    }

    /// One toast per field message for validation errors, otherwise the summary.
    pub fn api_error(&self, context: &str, err: &ApiError) {
        error!("{context}: {err}");
        for line in err.notifications() {
            self.push(NotificationLevel::Error, line);
        }
    }

    /// Takes everything queued so far.
    pub fn drain(&self) -> Vec<Notification> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl State for Notifications {
    fn snapshot(&self) -> Option<Self> {
        Some(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn validation_errors_become_one_toast_per_message() {
        let notifications = Notifications::new();
        let err = ApiError::new(422, "invalid").with_errors(BTreeMap::from([(
            "name".to_owned(),
            vec!["is required".to_owned()],
        )]));

        notifications.api_error("create role", &err);
        notifications.success("saved");

        let drained = notifications.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, "name: is required");
        assert_eq!(drained[0].level, NotificationLevel::Error);
        assert_eq!(drained[1].level, NotificationLevel::Success);
        assert!(notifications.is_empty());
    }
}
