// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every error leaves the service as
//! `{"success": false, "error": {"code", "message", "details"?}}`.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Generic message for 500 responses.
const INTERNAL_MESSAGE: &str = "An error occurred";

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input")]
    Validation(Vec<FieldError>),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("A user with this email or username already exists")]
    UserExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("No authorization token provided")]
    Unauthorized,

    /// Token failed verification. The message names which token.
    #[error("{0}")]
    InvalidToken(&'static str),

    #[error("User not found")]
    UserNotFound,

    #[error("The requested resource was not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            AppError::UserExists => "USER_EXISTS",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::InvalidToken(_) => "INVALID_TOKEN",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::NotFound => "NOT_FOUND",
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UserExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::Unauthorized | AppError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::UserNotFound | AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for a validation failure on one field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError {
            field: field.into(),
            message: message.into(),
        }])
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
}

/// Underlying cause of a 500, attached to the response as an extension.
/// Only [`expose_internal_detail`] puts it into the body.
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

fn envelope(
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Vec<FieldError>>,
) -> Response {
    let body = ErrorEnvelope {
        success: false,
        error: ErrorBody {
            code,
            message,
            details,
        },
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, details, internal) = match self {
            AppError::Validation(details) => ("Invalid input".to_string(), Some(details), None),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (INTERNAL_MESSAGE.to_string(), None, Some(msg))
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "Internal server error");
                (INTERNAL_MESSAGE.to_string(), None, Some(format!("{:#}", err)))
            }
            other => (other.to_string(), None, None),
        };

        let mut response = envelope(status, code, message, details);
        if let Some(detail) = internal {
            response.extensions_mut().insert(InternalDetail(detail));
        }
        response
    }
}

/// Middleware that replaces the generic 500 message with the underlying
/// cause. Installed only outside production.
pub async fn expose_internal_detail(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    let Some(InternalDetail(detail)) = response.extensions().get::<InternalDetail>().cloned()
    else {
        return response;
    };
    envelope(response.status(), "INTERNAL_SERVER_ERROR", detail, None)
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details = Vec::new();
        collect_field_errors("", &errors, &mut details);
        details.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation(details)
    }
}

fn collect_field_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<FieldError>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            camel_case(field)
        } else {
            format!("{}.{}", prefix, camel_case(field))
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", err.code));
                    out.push(FieldError {
                        field: path.clone(),
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_field_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_field_errors(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

/// `current_weight` -> `currentWeight`, matching the JSON field names.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
