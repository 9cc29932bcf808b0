use std::fmt;

use serde::Serialize;

/// A single problem with one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every field error found while checking one form. Collected, never
/// abort-on-first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// First error reported for `field`, if any.
    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.field(field).is_some()
    }

    /// `Ok(())` when nothing was collected, otherwise the errors as an `AppError`.
    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        Self(vec![error])
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server rejected request ({code}): {message}")]
    Api {
        code: String,
        message: String,
        location: Option<String>,
    },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("External service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Token storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Api { .. } => "API_ERROR",
            AppError::Request(_) => "EXTERNAL_REQUEST_FAILED",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::Decode(_) => "INVALID_RESPONSE",
            AppError::Hash(_) => "HASH_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Url(_) => "INVALID_URL",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Failures of the network round trip itself, as opposed to the server
    /// answering with a rejection.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::Request(_) | AppError::ServiceUnavailable(_) | AppError::Decode(_)
        )
    }

    /// Message suitable for a status line. Internal details are logged, not shown.
    pub fn status_message(&self) -> String {
        match self {
            AppError::Validation(errors) => errors.to_string(),
            AppError::Unauthorized => self.to_string(),
            AppError::NotFound(_) => self.to_string(),
            AppError::Api { message, .. } => message.clone(),
            AppError::Request(e) => {
                tracing::error!("HTTP request error: {:?}", e);
                "Failed to communicate with the calendar server".to_string()
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Calendar server unavailable: {}", msg);
                "The calendar server is unavailable".to_string()
            }
            AppError::Decode(e) => {
                tracing::error!("Failed to decode server response: {:?}", e);
                "The calendar server sent an unexpected response".to_string()
            }
            AppError::Hash(e) => {
                tracing::error!("Password hashing error: {:?}", e);
                "An internal error occurred".to_string()
            }
            AppError::Storage(e) => {
                tracing::error!("Token storage error: {:?}", e);
                "Could not access the stored session".to_string()
            }
            AppError::Url(e) => format!("Invalid URL: {}", e),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "An internal error occurred".to_string()
            }
        }
    }

    /// Field errors carried by a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            AppError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_errors_convert_to_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn collected_errors_keep_every_field() {
        let mut errors = ValidationErrors::new();
        errors.push("email", "\"email\" must be a valid email");
        errors.push("username", "\"username\" is not allowed to be empty");

        assert_eq!(errors.len(), 2);
        assert!(errors.has_field("email"));
        assert!(errors.has_field("username"));
        assert!(!errors.has_field("password"));
        assert_eq!(
            errors.to_string(),
            "\"email\" must be a valid email; \"username\" is not allowed to be empty"
        );

        match errors.into_result() {
            Err(AppError::Validation(e)) => assert_eq!(e.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn status_message_hides_internal_details() {
        let err = AppError::Internal(anyhow::anyhow!("secret stack detail"));
        assert_eq!(err.status_message(), "An internal error occurred");
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn api_error_surfaces_server_message() {
        let err = AppError::Api {
            code: "409".to_string(),
            message: "Email already registered".to_string(),
            location: Some("email".to_string()),
        };
        assert_eq!(err.status_message(), "Email already registered");
        assert!(!err.is_transport());
        assert!(AppError::ServiceUnavailable("502".to_string()).is_transport());
    }
}
