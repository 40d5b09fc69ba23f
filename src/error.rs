//! Typed API errors mapped to HTTP responses.
//!
//! `ApiError` carries a typed kind plus a human-readable message. Each kind
//! maps to an HTTP status through the actix `ResponseError` impl. Database
//! errors are logged with context and surfaced opaquely; a MySQL duplicate-key
//! (SQLSTATE 23000 / error 1062) is translated to `Conflict`.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    /// 400 — request failed validation; message names the offending field.
    Validation(String),
    /// 401 — missing or invalid credentials.
    Unauthorized(String),
    /// 403 — authenticated but not permitted.
    Forbidden(String),
    /// 404 — resource does not exist.
    NotFound(String),
    /// 409 — request conflicts with current state (e.g. unique constraint).
    Conflict(String),
    /// 500 — database/internal failure, surfaced opaquely.
    Database(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    fn message(&self) -> &str {
        match self {
            ApiError::Validation(m)
            | ApiError::Unauthorized(m)
            | ApiError::Forbidden(m)
            | ApiError::NotFound(m)
            | ApiError::Conflict(m)
            | ApiError::Database(m) => m,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.message() }))
    }
}

/// True when a sqlx error is a MySQL duplicate-key (SQLSTATE 23000 / 1062).
pub fn is_duplicate_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if db_err.code().as_deref() == Some("23000") {
            return true;
        }
        if let Some(mysql) = db_err.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>() {
            return mysql.number() == 1062;
        }
    }
    false
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if is_duplicate_key(&err) {
            return ApiError::Conflict("Resource already exists".to_string());
        }
        tracing::error!("database error: {:?}", err);
        ApiError::Database("A database error occurred".to_string())
    }
}
