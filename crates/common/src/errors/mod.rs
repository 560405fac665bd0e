//! Error types for the Research Kernel data layer
//!
//! Provides:
//! - Distinct error types for contract violations and storage failures
//! - Classification of storage constraint violations
//! - HTTP status code mapping for the surrounding service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    UnknownField,
    InvalidFieldValue,
    InvalidLfn,

    // Resource errors (4xxx)
    NotFound,
    StaleRecord,

    // Conflict errors (5xxx)
    UniqueViolation,
    ForeignKeyViolation,
    NotNullViolation,
    CheckViolation,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // Internal errors (9xxx)
    NoSession,
    SessionAborted,
    UnknownDiscriminator,
    IncompleteMessage,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::UnknownField => 1001,
            ErrorCode::InvalidFieldValue => 1002,
            ErrorCode::InvalidLfn => 1003,

            ErrorCode::NotFound => 4001,
            ErrorCode::StaleRecord => 4002,

            ErrorCode::UniqueViolation => 5001,
            ErrorCode::ForeignKeyViolation => 5002,
            ErrorCode::NotNullViolation => 5003,
            ErrorCode::CheckViolation => 5004,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            ErrorCode::NoSession => 9001,
            ErrorCode::UnknownDiscriminator => 9002,
            ErrorCode::IncompleteMessage => 9003,
            ErrorCode::ConfigurationError => 9004,
            ErrorCode::SerializationError => 9005,
            ErrorCode::SessionAborted => 9006,
        }
    }
}

/// Which storage constraint rejected a write
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::Unique => "unique",
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::NotNull => "not null",
            ConstraintKind::Check => "check",
        };
        f.write_str(name)
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Contract violations
    #[error("Session not found: {operation} requires a transactional session")]
    NoSession { operation: &'static str },

    #[error("Session aborted: a flush failed ({message}); roll the session back")]
    SessionAborted { message: String },

    // Field access errors
    #[error("Unknown field {field} on {entity}")]
    UnknownField { entity: String, field: String },

    #[error("Invalid value for {entity}: {message}")]
    InvalidFieldValue { entity: String, message: String },

    #[error("Invalid LFN: {message}")]
    InvalidLfn { message: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Stale record: no {table} row matched the write")]
    StaleRecord { table: String },

    // Storage constraint violations
    #[error("Constraint violation ({kind}): {message}")]
    ConstraintViolation { kind: ConstraintKind, message: String },

    // Polymorphic message integrity
    #[error("Unknown message discriminator: {value}")]
    UnknownDiscriminator { value: String },

    #[error("Message {id} is stored as {kind} but its variant row is missing")]
    IncompleteMessage { id: i32, kind: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Internal errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NoSession { .. } => ErrorCode::NoSession,
            AppError::SessionAborted { .. } => ErrorCode::SessionAborted,
            AppError::UnknownField { .. } => ErrorCode::UnknownField,
            AppError::InvalidFieldValue { .. } => ErrorCode::InvalidFieldValue,
            AppError::InvalidLfn { .. } => ErrorCode::InvalidLfn,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::StaleRecord { .. } => ErrorCode::StaleRecord,
            AppError::ConstraintViolation { kind, .. } => match kind {
                ConstraintKind::Unique => ErrorCode::UniqueViolation,
                ConstraintKind::ForeignKey => ErrorCode::ForeignKeyViolation,
                ConstraintKind::NotNull => ErrorCode::NotNullViolation,
                ConstraintKind::Check => ErrorCode::CheckViolation,
            },
            AppError::UnknownDiscriminator { .. } => ErrorCode::UnknownDiscriminator,
            AppError::IncompleteMessage { .. } => ErrorCode::IncompleteMessage,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::UnknownField { .. }
            | AppError::InvalidFieldValue { .. }
            | AppError::InvalidLfn { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound { .. } | AppError::StaleRecord { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::ConstraintViolation { .. } => StatusCode::CONFLICT,

            // 500 Internal Server Error
            AppError::NoSession { .. }
            | AppError::SessionAborted { .. }
            | AppError::UnknownDiscriminator { .. }
            | AppError::IncompleteMessage { .. }
            | AppError::Database(_)
            | AppError::Configuration { .. }
            | AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 503 Service Unavailable
            AppError::DatabaseConnection { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Whether a storage constraint rejected the write
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, AppError::ConstraintViolation { .. })
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Classify a storage error into the constraint that rejected it, if any.
///
/// SeaORM recognises unique and foreign key violations for every backend;
/// not-null and check failures only surface in the driver message.
fn classify_constraint(err: &DbErr) -> Option<ConstraintKind> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => return Some(ConstraintKind::Unique),
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => return Some(ConstraintKind::ForeignKey),
        _ => {}
    }

    let message = err.to_string().to_lowercase();
    if message.contains("not null constraint") || message.contains("not-null constraint") {
        Some(ConstraintKind::NotNull)
    } else if message.contains("check constraint") {
        Some(ConstraintKind::Check)
    } else if message.contains("unique constraint") || message.contains("duplicate key") {
        Some(ConstraintKind::Unique)
    } else if message.contains("foreign key constraint") {
        Some(ConstraintKind::ForeignKey)
    } else {
        None
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        if let DbErr::Conn(ref inner) = err {
            return AppError::DatabaseConnection {
                message: inner.to_string(),
            };
        }

        match classify_constraint(&err) {
            Some(kind) => AppError::ConstraintViolation {
                kind,
                message: err.to_string(),
            },
            None => AppError::Database(err),
        }
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub numeric_code: u16,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                numeric_code: code.as_code(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_session_is_server_error() {
        let err = AppError::NoSession { operation: "save" };
        assert_eq!(err.code(), ErrorCode::NoSession);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("save"));
    }

    #[test]
    fn test_constraint_violation_maps_to_conflict() {
        let err = AppError::ConstraintViolation {
            kind: ConstraintKind::Unique,
            message: "duplicate".into(),
        };
        assert_eq!(err.code(), ErrorCode::UniqueViolation);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.is_client_error());
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_driver_messages_are_classified() {
        let err: AppError = DbErr::Custom("CHECK constraint failed: created_at IS NOT NULL".into()).into();
        assert_eq!(err.code(), ErrorCode::CheckViolation);

        let err: AppError =
            DbErr::Custom("null value in column \"sub\" violates not-null constraint".into()).into();
        assert_eq!(err.code(), ErrorCode::NotNullViolation);

        let err: AppError = DbErr::RecordNotFound("client".into()).into();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
    }

    #[test]
    fn test_numeric_codes_are_grouped() {
        assert_eq!(ErrorCode::UnknownField.as_code() / 1000, 1);
        assert_eq!(ErrorCode::CheckViolation.as_code() / 1000, 5);
        assert_eq!(ErrorCode::NoSession.as_code() / 1000, 9);
        assert_eq!(ErrorCode::SessionAborted.as_code() / 1000, 9);
    }
}
