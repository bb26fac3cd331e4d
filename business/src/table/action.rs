use log::debug;

use super::RowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowActionKind {
    View,
    Edit,
    Duplicate,
    ToggleStatus,
    Delete,
}

impl RowActionKind {
    /// Whether the action needs a dialog rather than running straight away.
    pub fn opens_dialog(self) -> bool {
        matches!(self, Self::View | Self::Edit | Self::Delete)
    }
}

/// One entry in a row's action menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMenuItem {
    pub kind: RowActionKind,
    pub label: String,
    pub destructive: bool,
    pub separator_before: bool,
}

impl RowMenuItem {
    pub fn new(kind: RowActionKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            destructive: false,
            separator_before: false,
        }
    }

    pub fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }

    pub fn separated(mut self) -> Self {
        self.separator_before = true;
        self
    }
}

/// "Run `kind` for this row", emitted by an actions column.
#[derive(Debug, Clone, PartialEq)]
pub struct RowActionEvent<T> {
    pub row_id: RowId,
    pub row: T,
    pub kind: RowActionKind,
}

/// Sending half handed to column providers.
#[derive(Debug)]
pub struct RowActionDispatcher<T> {
    sender: flume::Sender<RowActionEvent<T>>,
}

impl<T> Clone for RowActionDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> RowActionDispatcher<T> {
    pub fn channel() -> (Self, flume::Receiver<RowActionEvent<T>>) {
        let (sender, receiver) = flume::unbounded();
        (Self { sender }, receiver)
    }

    pub fn dispatch(&self, event: RowActionEvent<T>) {
        debug!("row action {:?} on {}", event.kind, event.row_id);
        if self.sender.send(event).is_err() {
            debug!("row action dropped: page is gone");
        }
    }
}

/// The single pending dialog intent of a table. Opening replaces, closing clears.
#[derive(Debug, Clone)]
pub struct RowActionSlot<T> {
    active: Option<RowActionEvent<T>>,
}

impl<T> Default for RowActionSlot<T> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<T> RowActionSlot<T> {
    pub fn open(&mut self, event: RowActionEvent<T>) {
        self.active = Some(event);
    }

    pub fn active(&self) -> Option<&RowActionEvent<T>> {
        self.active.as_ref()
    }

    /// The pending event when it is for `kind`.
    pub fn active_for(&self, kind: RowActionKind) -> Option<&RowActionEvent<T>> {
        self.active.as_ref().filter(|event| event.kind == kind)
    }

    pub fn is_open(&self, kind: RowActionKind) -> bool {
        self.active_for(kind).is_some()
    }

    pub fn take(&mut self) -> Option<RowActionEvent<T>> {
        self.active.take()
    }

    pub fn close(&mut self) {
        self.active = None;
    }
}
