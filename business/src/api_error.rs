//! Classified failures of the remote data client.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::http::{HttpError, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// No response was received.
    Network,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    /// 422 with an optional field error map.
    Validation,
    Server,
    Unclassified,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            0 => Self::Network,
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            422 => Self::Validation,
            500..=599 => Self::Server,
            _ => Self::Unclassified,
        }
    }
}

pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// `{status, message, errors?}` as seen by tables and dialogs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub errors: Option<FieldErrors>,
}

/// Error body fields the backend may send.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    errors: Option<FieldErrors>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
        }
    }

    pub fn network() -> Self {
        Self::new(
            0,
            "Unable to reach the server. Please check your network connection.",
        )
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Classifies a non-2xx response.
    pub fn from_response(response: &Response) -> Self {
        let status = response.status;
        let body: ErrorBody = response.json().unwrap_or_default();
        let kind = ApiErrorKind::from_status(status);

        let mut message = match (kind, status) {
            (ApiErrorKind::BadRequest, _) => "Invalid request".to_owned(),
            (ApiErrorKind::Unauthorized, _) => "You need to sign in to do this".to_owned(),
            (ApiErrorKind::Forbidden, _) => {
                "You do not have permission to do this".to_owned()
            }
            (ApiErrorKind::NotFound, _) => "The requested data was not found".to_owned(),
            (ApiErrorKind::Validation, _) => "The submitted data is invalid".to_owned(),
            (ApiErrorKind::Server, 500) => "Internal server error".to_owned(),
            (ApiErrorKind::Server, 503) => "Service temporarily unavailable".to_owned(),
            _ => {
                let detail = body
                    .message
                    .clone()
                    .or_else(|| body.error.clone())
                    .or_else(|| response.text().ok().filter(|text| !text.trim().is_empty()))
                    .unwrap_or_else(|| "Unknown error".to_owned());
                format!("Error {status}: {detail}")
            }
        };
        if let Some(body_message) = body.message
            && !body_message.is_empty()
        {
            message = body_message;
        }

        let errors = match kind {
            ApiErrorKind::Validation => body.errors.filter(|errors| !errors.is_empty()),
            _ => None,
        };

        Self {
            status,
            message,
            errors,
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        ApiErrorKind::from_status(self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ApiErrorKind::Unauthorized
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn has_field_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }

    /// Messages for a single field, if the server reported any.
    pub fn field_errors(&self, field: &str) -> &[String] {
        self.errors
            .as_ref()
            .and_then(|errors| errors.get(field))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// What the operator sees: one line per field message, or the summary message.
    pub fn notifications(&self) -> Vec<String> {
        match &self.errors {
            Some(errors) if !errors.is_empty() => errors
                .iter()
                .flat_map(|(field, messages)| {
                    messages.iter().map(move |message| format!("{field}: {message}"))
                })
                .collect(),
            _ => vec![self.message.clone()],
        }
    }
}

impl From<HttpError> for ApiError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Timeout => Self::new(0, "The request timed out. Please try again."),
            HttpError::Transport(detail) => {
                log::warn!("transport failure: {detail}");
                Self::network()
            }
            HttpError::Encode(err) => Self::new(400, format!("Invalid request: {err}")),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.message, self.status)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn response(status: u16, body: &str) -> Response {
        Response {
            status,
            headers: HashMap::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn statuses_map_to_kinds() {
        assert_eq!(ApiErrorKind::from_status(0), ApiErrorKind::Network);
        assert_eq!(ApiErrorKind::from_status(403), ApiErrorKind::Forbidden);
        assert_eq!(ApiErrorKind::from_status(503), ApiErrorKind::Server);
        assert_eq!(ApiErrorKind::from_status(409), ApiErrorKind::Unclassified);
    }

    #[test]
    fn default_message_used_without_body() {
        let err = ApiError::from_response(&response(404, ""));
        assert_eq!(err.message, "The requested data was not found");
        assert_eq!(err.errors, None);
    }

    #[test]
    fn body_message_overrides_default() {
        let err = ApiError::from_response(&response(403, r#"{"message":"Admins only"}"#));
        assert_eq!(err.kind(), ApiErrorKind::Forbidden);
        assert_eq!(err.message, "Admins only");
    }

    #[test]
    fn validation_keeps_field_errors() {
        let err = ApiError::from_response(&response(
            422,
            r#"{"errors":{"name":["is required","is too short"],"email":["is taken"]}}"#,
        ));

        assert!(err.has_field_errors());
        assert_eq!(err.field_errors("email"), ["is taken".to_owned()]);
        assert_eq!(
            err.notifications(),
            vec![
                "email: is taken".to_owned(),
                "name: is required".to_owned(),
                "name: is too short".to_owned(),
            ]
        );
    }

    #[test]
    fn unknown_status_includes_detail() {
        let err = ApiError::from_response(&response(409, r#"{"error":"duplicate"}"#));
        assert_eq!(err.message, "Error 409: duplicate");
        assert_eq!(err.notifications(), vec!["Error 409: duplicate".to_owned()]);
    }

    #[test]
    fn transport_failure_is_status_zero() {
        let err = ApiError::from(HttpError::Transport("connection refused".into()));
        assert_eq!(err.kind(), ApiErrorKind::Network);
        assert!(!err.is_client_error());
    }
}
