//! Confirmation dialogs that gate destructive actions.
//!
//! Each dialog is plain state held by its page while open (`Option<Dialog>`); the page
//! drops it when [`DialogOutcome::Closed`] comes back from `finish`.

use log::{debug, info};

use crate::api_error::{ApiError, ApiErrorKind};
use crate::table::RowId;

/// Field name the backend uses for a rejected typed confirmation.
pub const CONFIRMATION_FIELD: &str = "confirmation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOutcome {
    Closed,
    KeptOpen,
}

/// Single-row delete that requires retyping the row's identifying field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmDialog {
    target: RowId,
    field: &'static str,
    identifier: String,
    input: String,
    loading: bool,
    error: Option<ApiError>,
}

impl DeleteConfirmDialog {
    /// `field` names the identifying attribute, e.g. `"username"`.
    pub fn new(target: RowId, field: &'static str, identifier: impl Into<String>) -> Self {
        Self {
            target,
            field,
            identifier: identifier.into(),
            input: String::new(),
            loading: false,
            error: None,
        }
    }

    pub fn target(&self) -> RowId {
        self.target
    }

    pub fn field(&self) -> &str {
        self.field
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Bound to the text box.
    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    /// An empty identifier can never be confirmed.
    pub fn can_confirm(&self) -> bool {
        !self.loading && !self.identifier.is_empty() && self.input.trim() == self.identifier
    }

    /// Marks the mutation as started. Returns the target only when confirming is allowed.
    pub fn begin_confirm(&mut self) -> Option<RowId> {
        if !self.can_confirm() {
            return None;
        }
        self.loading = true;
        self.error = None;
        Some(self.target)
    }

    /// Ok closes and clears the input; an error keeps the dialog and the typed input,
    /// unless the server rejected the input itself.
    pub fn finish(&mut self, result: Result<(), ApiError>) -> DialogOutcome {
        self.loading = false;
        match result {
            Ok(()) => {
                self.input.clear();
                self.error = None;
                DialogOutcome::Closed
            }
            Err(err) => {
                let input_rejected = err.kind() == ApiErrorKind::Validation
                    && (!err.field_errors(self.field).is_empty()
                        || !err.field_errors(CONFIRMATION_FIELD).is_empty());
                if input_rejected {
                    debug!("delete confirmation rejected by server; clearing input");
                    self.input.clear();
                }
                self.error = Some(err);
                DialogOutcome::KeptOpen
            }
        }
    }

    /// Cancelling is ignored while the mutation runs.
    pub fn cancel(&mut self) -> DialogOutcome {
        if self.loading {
            DialogOutcome::KeptOpen
        } else {
            DialogOutcome::Closed
        }
    }
}

/// Delete every selected row. The ids are captured when the dialog opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDeleteDialog {
    ids: Vec<RowId>,
    loading: bool,
    error: Option<ApiError>,
}

/// What the page must do after a bulk delete succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDeleteDone {
    pub deleted: Vec<RowId>,
    pub clear_selection: bool,
    pub invalidate_lists: bool,
}

impl BulkDeleteDialog {
    pub fn new(ids: Vec<RowId>) -> Self {
        Self {
            ids,
            loading: false,
            error: None,
        }
    }

    pub fn ids(&self) -> &[RowId] {
        &self.ids
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn title(&self) -> String {
        match self.count() {
            1 => "Delete 1 item?".to_owned(),
            n => format!("Delete {n} items?"),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub fn begin_confirm(&mut self) -> Option<Vec<RowId>> {
        if self.loading || self.ids.is_empty() {
            return None;
        }
        self.loading = true;
        self.error = None;
        Some(self.ids.clone())
    }

    pub fn finish(&mut self, result: Result<(), ApiError>) -> Result<BulkDeleteDone, DialogOutcome> {
        self.loading = false;
        match result {
            Ok(()) => {
                info!("bulk delete of {} rows finished", self.ids.len());
                Ok(BulkDeleteDone {
                    deleted: std::mem::take(&mut self.ids),
                    clear_selection: true,
                    invalidate_lists: true,
                })
            }
            Err(err) => {
                self.error = Some(err);
                Err(DialogOutcome::KeptOpen)
            }
        }
    }

    pub fn cancel(&mut self) -> DialogOutcome {
        if self.loading {
            DialogOutcome::KeptOpen
        } else {
            DialogOutcome::Closed
        }
    }
}

/// Plain confirm for roles; warns when users still hold the role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDeleteDialog {
    target: RowId,
    name: String,
    users_count: u64,
    loading: bool,
    error: Option<ApiError>,
}

impl RoleDeleteDialog {
    pub fn new(target: RowId, name: impl Into<String>, users_count: u64) -> Self {
        Self {
            target,
            name: name.into(),
            users_count,
            loading: false,
            error: None,
        }
    }

    pub fn target(&self) -> RowId {
        self.target
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn warning(&self) -> Option<String> {
        match self.users_count {
            0 => None,
            1 => Some("This role is assigned to 1 user.".to_owned()),
            n => Some(format!("This role is assigned to {n} users.")),
        }
    }

    /// Both buttons are disabled while loading.
    pub fn buttons_enabled(&self) -> bool {
        !self.loading
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub fn begin_confirm(&mut self) -> Option<RowId> {
        if self.loading {
            return None;
        }
        self.loading = true;
        self.error = None;
        Some(self.target)
    }

    pub fn finish(&mut self, result: Result<(), ApiError>) -> DialogOutcome {
        self.loading = false;
        match result {
            Ok(()) => DialogOutcome::Closed,
            Err(err) => {
                self.error = Some(err);
                DialogOutcome::KeptOpen
            }
        }
    }

    pub fn cancel(&mut self) -> DialogOutcome {
        if self.loading {
            DialogOutcome::KeptOpen
        } else {
            DialogOutcome::Closed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_error::FieldErrors;

    fn dialog() -> DeleteConfirmDialog {
        DeleteConfirmDialog::new(RowId::from(7), "username", "mai.nguyen")
    }

    #[test]
    fn confirm_requires_exact_identifier() {
        let mut dialog = dialog();
        for input in ["", "mai", "Mai.Nguyen", "mai.nguyen2"] {
            dialog.set_input(input);
            assert!(!dialog.can_confirm(), "{input:?} must not enable confirm");
            assert_eq!(dialog.begin_confirm(), None);
        }
        dialog.set_input("  mai.nguyen ");
        assert!(dialog.can_confirm());
    }

    #[test]
    fn empty_identifier_never_enables_confirm() {
        let mut dialog = DeleteConfirmDialog::new(RowId::from(7), "username", "");
        assert!(!dialog.can_confirm());
        dialog.set_input("   ");
        assert!(!dialog.can_confirm());
        assert_eq!(dialog.begin_confirm(), None);
    }

    #[test]
    fn success_clears_input_and_closes() {
        let mut dialog = dialog();
        dialog.set_input("mai.nguyen");
        assert_eq!(dialog.begin_confirm(), Some(RowId::from(7)));
        assert!(dialog.is_loading());
        assert!(!dialog.can_confirm());
        assert_eq!(dialog.cancel(), DialogOutcome::KeptOpen);

        assert_eq!(dialog.finish(Ok(())), DialogOutcome::Closed);
        assert_eq!(dialog.input(), "");
        assert!(!dialog.is_loading());
    }

    #[test]
    fn failure_keeps_typed_input() {
        let mut dialog = dialog();
        dialog.set_input("mai.nguyen");
        dialog.begin_confirm();

        let outcome = dialog.finish(Err(ApiError::new(500, "Internal server error")));
        assert_eq!(outcome, DialogOutcome::KeptOpen);
        assert_eq!(dialog.input(), "mai.nguyen");
        assert!(dialog.can_confirm());
        assert_eq!(dialog.error().map(|err| err.status), Some(500));
    }

    #[test]
    fn rejected_confirmation_clears_input() {
        let mut dialog = dialog();
        dialog.set_input("mai.nguyen");
        dialog.begin_confirm();

        let errors = FieldErrors::from([("username".to_owned(), vec!["does not match".to_owned()])]);
        let err = ApiError::new(422, "The given data was invalid.").with_errors(errors);
        assert_eq!(dialog.finish(Err(err)), DialogOutcome::KeptOpen);
        assert_eq!(dialog.input(), "");
    }

    #[test]
    fn bulk_delete_reports_selection_reset() {
        let ids = vec![RowId::from(1), RowId::from(3), RowId::from(5)];
        let mut dialog = BulkDeleteDialog::new(ids.clone());
        assert_eq!(dialog.title(), "Delete 3 items?");
        assert_eq!(dialog.begin_confirm(), Some(ids.clone()));
        assert_eq!(dialog.begin_confirm(), None);

        let done = dialog.finish(Ok(())).unwrap();
        assert_eq!(done.deleted, ids);
        assert!(done.clear_selection);
        assert!(done.invalidate_lists);
    }

    #[test]
    fn bulk_delete_failure_stays_open() {
        let mut dialog = BulkDeleteDialog::new(vec![RowId::from(1)]);
        dialog.begin_confirm();
        assert_eq!(
            dialog.finish(Err(ApiError::network())),
            Err(DialogOutcome::KeptOpen)
        );
        assert_eq!(dialog.count(), 1);
        assert!(dialog.error().is_some());
    }

    #[test]
    fn role_dialog_warns_about_assigned_users() {
        let mut dialog = RoleDeleteDialog::new(RowId::new("r1"), "Editor", 4);
        assert_eq!(dialog.warning().as_deref(), Some("This role is assigned to 4 users."));
        assert!(RoleDeleteDialog::new(RowId::new("r2"), "Viewer", 0).warning().is_none());

        dialog.begin_confirm();
        assert!(!dialog.buttons_enabled());
        assert_eq!(dialog.cancel(), DialogOutcome::KeptOpen);
        assert_eq!(dialog.finish(Ok(())), DialogOutcome::Closed);
    }
}
