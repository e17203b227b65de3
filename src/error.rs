//! Error taxonomy
//!
//! Every error that can surface at the HTTP boundary is a variant of
//! [`AppError`]. Elsewhere in the core, errors propagate upward via `?`
//! without being caught (the only recover-locally points are documented in
//! §7 and implemented at their call sites, not here).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

/// Machine-readable error kinds, matching §7 exactly.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("data validation failed: {0}")]
    DataValidation(String),

    #[error("variable injection failed: {0}")]
    VariableInjection(String),

    #[error("query validation failed: {0}")]
    QueryValidation(String),

    #[error("resource access denied: {0}")]
    ResourceAccessDenied(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("payment required: {0}")]
    PaymentRequired(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("invalid index options: {0}")]
    InvalidIndexOptions(String),
}

impl AppError {
    /// Machine-readable tag, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CollectionNotFound(_) => "CollectionNotFound",
            Self::DocumentNotFound(_) => "DocumentNotFound",
            Self::DuplicateEntry(_) => "DuplicateEntry",
            Self::DataValidation(_) => "DataValidation",
            Self::VariableInjection(_) => "VariableInjection",
            Self::QueryValidation(_) => "QueryValidation",
            Self::ResourceAccessDenied(_) => "ResourceAccessDenied",
            Self::Unauthorized(_) => "Unauthorized",
            Self::PaymentRequired(_) => "PaymentRequired",
            Self::Forbidden(_) => "Forbidden",
            Self::Timeout(_) => "Timeout",
            Self::DatabaseError(_) => "DatabaseError",
            Self::InvalidIndexOptions(_) => "InvalidIndexOptions",
        }
    }

    /// HTTP status per §6.1.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::CollectionNotFound(_) | Self::DocumentNotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateEntry(_) => StatusCode::CONFLICT,
            Self::DataValidation(_)
            | Self::VariableInjection(_)
            | Self::QueryValidation(_) => StatusCode::BAD_REQUEST,
            Self::ResourceAccessDenied(_) | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
            Self::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            Self::DatabaseError(_) | Self::InvalidIndexOptions(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    data: Option<()>,
    error: ErrorBody,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorEnvelope {
            data: None,
            error: ErrorBody {
                code: self.code(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        Self::DataValidation(e.to_string())
    }
}
