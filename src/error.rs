use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::ValidationErrors;

use crate::{db::DbError, moderation::WorkflowError};

/// Error body sent to clients
///
/// Every failure leaves the server in the same shape:
/// ```text
/// {
///   "status": "fail",
///   "message": "Invalid credentials"
/// }
/// ```
///
/// `HttpError` is what handlers work with; `ErrorResponse` is only the wire
/// format, so internal detail never leaks into it.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Fixed user-facing messages
///
/// Login failures share `InvalidCredentials` for both an unknown email and a
/// wrong password. The account-status variants are only produced after the
/// password has been confirmed.
#[derive(Debug, PartialEq)]
pub enum ErrorMessage {
    // Password validation errors
    EmptyPassword,
    ExceededMaxPasswordLength(usize),
    InvalidHashFormat,
    HashingError,

    // Authentication errors
    InvalidCredentials,
    InvalidToken,
    UserNotAuthenticated,
    CurrentPasswordIncorrect,
    AccountBlocked,
    AccountPending,
    AccountRejected,

    // Authorization errors
    PermissionDenied,
    PasswordChangeRequired,
    AdminRegistrationForbidden,
    AdminAlreadyExists,

    // User management errors
    UserAlreadyExists,
    UserNoLongerExist,

    //Else
    ServerError,
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorMessage::EmptyPassword => "Password cannot be empty".to_string(),
            ErrorMessage::ExceededMaxPasswordLength(max_length) => {
                format!("Password must not be more than {} characters", max_length)
            }
            ErrorMessage::InvalidHashFormat => "Invalid password hash format".to_string(),
            ErrorMessage::HashingError => "Error while hashing password".to_string(),
            ErrorMessage::InvalidCredentials => "Invalid credentials".to_string(),
            ErrorMessage::InvalidToken => "Token is invalid or expired".to_string(),
            ErrorMessage::UserNotAuthenticated => "Unauthorized".to_string(),
            ErrorMessage::CurrentPasswordIncorrect => "Current password is incorrect".to_string(),
            ErrorMessage::AccountBlocked => "Account is blocked".to_string(),
            ErrorMessage::AccountPending => "Account pending approval".to_string(),
            ErrorMessage::AccountRejected => "Account registration was rejected".to_string(),
            ErrorMessage::PermissionDenied => {
                "You are not allowed to perform this action".to_string()
            }
            ErrorMessage::PasswordChangeRequired => "Password change required".to_string(),
            ErrorMessage::AdminRegistrationForbidden => "Cannot register as admin".to_string(),
            ErrorMessage::AdminAlreadyExists => {
                "Admin account already exists. Only one admin allowed.".to_string()
            }
            ErrorMessage::UserAlreadyExists => "User already exists".to_string(),
            ErrorMessage::UserNoLongerExist => {
                "User belonging to this token no longer exists".to_string()
            }
            ErrorMessage::ServerError => "Server Error. Please try again later".to_string(),
        };
        write!(f, "{}", message)
    }
}

/// Internal HTTP error type used by handlers and middleware
///
/// Status and message travel together, so a handler returning
/// `Result<_, HttpError>` never has to pick one without the other.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub status: StatusCode,
}

impl HttpError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        HttpError {
            message: message.into(),
            status,
        }
    }

    /// 500. Callers log the cause before building this; the message sent out
    /// stays generic.
    pub fn server_error(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// 400 for missing or malformed input.
    pub fn bad_request(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::BAD_REQUEST)
    }

    /// 401: no usable identity.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::UNAUTHORIZED)
    }

    /// 403: identity is known but lacks the role or ownership.
    pub fn forbidden(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::FORBIDDEN)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::NOT_FOUND)
    }

    /// 409: a version check lost against a concurrent write.
    pub fn conflict(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::CONFLICT)
    }

    pub fn into_http_response(self) -> Response {
        let json_response = Json(ErrorResponse {
            status: "fail".to_string(),
            message: self.message,
        });

        (self.status, json_response).into_response()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpError: message: {}, status: {}",
            self.message, self.status
        )
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

/// Flatten validator output into one readable sentence.
///
/// Field order is sorted so the message is stable between runs. Fields that
/// share a message ("All fields are required") report it once.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let mut messages: Vec<String> = Vec::new();
    for (field, errs) in fields {
        for err in errs.iter() {
            let message = match &err.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            };
            if !messages.contains(&message) {
                messages.push(message);
            }
        }
    }

    if messages.is_empty() {
        "Invalid input".to_string()
    } else {
        messages.join(", ")
    }
}

impl From<ValidationErrors> for HttpError {
    fn from(errors: ValidationErrors) -> Self {
        HttpError::bad_request(validation_message(&errors))
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::info!("Rejected request body: {}", rejection.body_text());
        HttpError::bad_request(rejection.body_text())
    }
}

impl From<DbError> for HttpError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => HttpError::not_found("Resource not found"),
            DbError::Duplicate(what) => HttpError::bad_request(format!("{} already exists", what)),
            DbError::StaleVersion => {
                HttpError::conflict("Resource was modified concurrently, please retry")
            }
            other => {
                tracing::error!("Storage failure: {}", other);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        }
    }
}

impl From<WorkflowError> for HttpError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Forbidden(message) => HttpError::forbidden(message),
            WorkflowError::Invalid(message) => HttpError::bad_request(message),
            WorkflowError::NotFound(message) => HttpError::not_found(message),
            WorkflowError::Conflict(message) => HttpError::conflict(message),
            WorkflowError::Storage(db) => HttpError::from(db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Title is required"))]
        title: String,
        #[validate(length(min = 1, message = "Content is required"))]
        content: String,
    }

    #[test]
    fn validation_message_joins_sorted_fields() {
        let sample = Sample {
            title: String::new(),
            content: String::new(),
        };
        let err = sample.validate().unwrap_err();
        assert_eq!(
            validation_message(&err),
            "Content is required, Title is required"
        );
    }

    #[test]
    fn storage_errors_map_to_statuses() {
        assert_eq!(HttpError::from(DbError::NotFound).status, StatusCode::NOT_FOUND);
        assert_eq!(
            HttpError::from(DbError::StaleVersion).status,
            StatusCode::CONFLICT
        );
        let dup = HttpError::from(DbError::Duplicate("User".into()));
        assert_eq!(dup.status, StatusCode::BAD_REQUEST);
        assert_eq!(dup.message, "User already exists");
    }

    #[test]
    fn workflow_errors_map_to_statuses() {
        let err = HttpError::from(WorkflowError::Forbidden("nope".into()));
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "nope");
    }
}
