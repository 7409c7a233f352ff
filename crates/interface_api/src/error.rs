//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::{ValidationErrors, ValidationErrorsKind};

use domain_loyalty::{LoyaltyError, Violation};

use crate::auth::AuthError;

/// Body returned for persistence failures; the cause is only logged
const INTERNAL_MESSAGE: &str = "The request could not be completed";

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// Payload does not match the structural schema
    #[error("Malformed request: {message}")]
    Shape { message: String, details: Vec<String> },

    /// Business-rule violations, in the order they were found
    #[error("Validation failed with {} violation(s)", .0.len())]
    Validation(Vec<Violation>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details, violations) = match self {
            ApiError::Shape { message, details } => {
                (StatusCode::BAD_REQUEST, "shape_error", message, Some(details), None)
            }
            ApiError::Validation(violations) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_failed",
                format!("Program definition has {} violation(s)", violations.len()),
                None,
                Some(violations),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None, None),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized".to_string(),
                None,
                None,
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None, None),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    INTERNAL_MESSAGE.to_string(),
                    None,
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
            violations,
        };

        (status, Json(body)).into_response()
    }
}

impl From<LoyaltyError> for ApiError {
    fn from(err: LoyaltyError) -> Self {
        match err {
            LoyaltyError::ValidationFailed(violations) => ApiError::Validation(violations),
            LoyaltyError::NotFound(id) => ApiError::NotFound(format!("Loyalty program {id} not found")),
            LoyaltyError::PersistenceFailed { operation, source } => {
                ApiError::Internal(format!("{operation}: {source}"))
            }
            other @ LoyaltyError::UnknownCode { .. } => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingPermission(permission) => {
                ApiError::Forbidden(format!("Missing permission {permission}"))
            }
            AuthError::InvalidToken | AuthError::TokenExpired | AuthError::InvalidClaim(_) => {
                ApiError::Unauthorized
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details = Vec::new();
        collect_field_errors("", &errors, &mut details);
        details.sort();

        ApiError::Shape {
            message: "Request body failed structural validation".to_string(),
            details,
        }
    }
}

/// Flattens nested validator errors into `path: code` lines
fn collect_field_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                out.extend(field_errors.iter().map(|e| format!("{path}: {}", e.code)));
            }
            ValidationErrorsKind::Struct(nested) => collect_field_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_field_errors(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}
