//! Error taxonomy shared by the storage, service and HTTP layers.

use axum::http::StatusCode;
use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<JsonValue>,
    },
    #[error("Invalid JSON in request body: {0}")]
    InvalidJson(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Route {method} {path} not found")]
    RouteNotFound { method: String, path: String },
    #[error("Method {method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },
    #[error("Database connection failed: {0}")]
    DatabaseConnection(String),
    #[error("Database operation failed: {0}")]
    Database(sqlx::Error),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// True for failures that mean the pool lost its database, as opposed to a
    /// statement the database rejected.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::DatabaseConnection(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::DatabaseConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(e) => match sqlstate(e).as_deref() {
                Some("23505") => StatusCode::CONFLICT,
                Some("23503") | Some("42703") => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code carried in every error body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::InvalidJson(_) => "INVALID_JSON",
            Self::NotFound(_) => "NOT_FOUND",
            Self::RouteNotFound { .. } => "ROUTE_NOT_FOUND",
            Self::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            Self::DatabaseConnection(_) => "DATABASE_CONNECTION_ERROR",
            Self::Database(e) => match sqlstate(e).as_deref() {
                Some("23505") => "DUPLICATE_ENTRY",
                Some("23503") => "FOREIGN_KEY_CONSTRAINT",
                Some("42703") => "INVALID_COLUMN",
                Some("42P01") => "TABLE_NOT_FOUND",
                _ => "DATABASE_ERROR",
            },
            Self::Config(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to any client. Raw driver text never appears here.
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(e) => match sqlstate(e).as_deref() {
                Some("23505") => "Duplicate entry found".to_string(),
                Some("23503") => "Foreign key constraint violation".to_string(),
                Some("42703") => "Invalid column in query".to_string(),
                Some("42P01") => "Database table not found".to_string(),
                _ => "Database operation failed".to_string(),
            },
            Self::DatabaseConnection(_) => "Database connection failed".to_string(),
            Self::Config(_) | Self::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }

    /// Extra context for the error body. Driver and internal detail is only
    /// released when `expose_internal` is set (development mode).
    pub fn details(&self, expose_internal: bool) -> Option<JsonValue> {
        match self {
            Self::Validation { details, .. } => details.clone(),
            Self::Database(e) if expose_internal => Some(JsonValue::from(e.to_string())),
            Self::DatabaseConnection(msg) | Self::Config(msg) | Self::Internal(msg)
                if expose_internal =>
            {
                Some(JsonValue::from(msg.clone()))
            }
            _ => None,
        }
    }
}

fn sqlstate(e: &sqlx::Error) -> Option<String> {
    match e {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::DatabaseConnection(e.to_string()),
            other => Self::Database(other),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("JSON encoding failed: {}", e))
    }
}
