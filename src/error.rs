//! Error types for the catalog service
//!
//! Provides unified error handling using thiserror. Every service error carries
//! a status class, a stable code and a message so the HTTP layer can map it
//! directly to a response.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

// == Error Codes ==
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const FORBIDDEN: &str = "FORBIDDEN";
pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
pub const SERVICE_ERROR: &str = "SERVICE_ERROR";

// == Status Class ==
/// HTTP-aligned classification of a service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusClass {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Internal,
    Unavailable,
    Timeout,
}

impl StatusClass {
    /// Numeric status code for this class.
    pub fn as_u16(self) -> u16 {
        match self {
            StatusClass::BadRequest => 400,
            StatusClass::Unauthorized => 401,
            StatusClass::Forbidden => 403,
            StatusClass::NotFound => 404,
            StatusClass::Internal => 500,
            StatusClass::Unavailable => 503,
            StatusClass::Timeout => 504,
        }
    }

    /// Fixed user-facing message shown in production in place of the real one.
    pub fn generic_message(self) -> &'static str {
        match self {
            StatusClass::BadRequest => "The request was invalid.",
            StatusClass::Unauthorized => "Unauthorized",
            StatusClass::Forbidden => "Forbidden",
            StatusClass::NotFound => "The requested resource was not found.",
            StatusClass::Internal => "Something went wrong. Please try again later.",
            StatusClass::Unavailable => {
                "Service temporarily unavailable. Please try again in a moment."
            }
            StatusClass::Timeout => "The request took too long. Please try again later.",
        }
    }
}

// == Field Violation ==
/// A single failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// == Store Error ==
/// Failures reported by a backing store implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store is not reachable or not initialised yet
    #[error("Data store not available: {0}")]
    Unavailable(String),

    /// The store rejected the call because of quota limits
    #[error("Data store rate limited: {0}")]
    RateLimited(String),

    /// Any other backend failure
    #[error("Data store error: {0}")]
    Backend(String),
}

// == Service Error ==
/// Unified error type for catalog services.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// One or more fields failed validation
    #[error("{message}")]
    Validation {
        message: String,
        violations: Vec<FieldViolation>,
    },

    /// The addressed entity does not exist
    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    /// No caller identity was supplied
    #[error("{message}")]
    Unauthorized { message: String },

    /// The caller may not act on this resource
    #[error("{message}")]
    Forbidden { message: String },

    /// The backing store is not wired or not reachable
    #[error("{message}")]
    Unavailable {
        code: &'static str,
        message: String,
        original: Option<anyhow::Error>,
    },

    /// The backing store did not answer in time
    #[error("{message}")]
    Timeout {
        code: &'static str,
        message: String,
        elapsed: Duration,
    },

    /// Anything else
    #[error("{message}")]
    Internal {
        code: &'static str,
        message: String,
        original: Option<anyhow::Error>,
    },
}

impl ServiceError {
    // == Constructors ==
    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        let message = violations
            .iter()
            .map(|v| v.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        ServiceError::Validation {
            message,
            violations,
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        ServiceError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn unavailable(code: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Unavailable {
            code,
            message: message.into(),
            original: None,
        }
    }

    pub fn internal(code: &'static str, source: anyhow::Error) -> Self {
        ServiceError::Internal {
            code,
            message: source.to_string(),
            original: Some(source),
        }
    }

    // == Accessors ==
    pub fn status_class(&self) -> StatusClass {
        match self {
            ServiceError::Validation { .. } => StatusClass::BadRequest,
            ServiceError::NotFound { .. } => StatusClass::NotFound,
            ServiceError::Unauthorized { .. } => StatusClass::Unauthorized,
            ServiceError::Forbidden { .. } => StatusClass::Forbidden,
            ServiceError::Unavailable { .. } => StatusClass::Unavailable,
            ServiceError::Timeout { .. } => StatusClass::Timeout,
            ServiceError::Internal { .. } => StatusClass::Internal,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation { .. } => VALIDATION_ERROR,
            ServiceError::Unauthorized { .. } => UNAUTHORIZED,
            ServiceError::Forbidden { .. } => FORBIDDEN,
            ServiceError::NotFound { code, .. }
            | ServiceError::Unavailable { code, .. }
            | ServiceError::Timeout { code, .. }
            | ServiceError::Internal { code, .. } => *code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ServiceError::Validation { message, .. }
            | ServiceError::NotFound { message, .. }
            | ServiceError::Unauthorized { message }
            | ServiceError::Forbidden { message }
            | ServiceError::Unavailable { message, .. }
            | ServiceError::Timeout { message, .. }
            | ServiceError::Internal { message, .. } => message,
        }
    }

    /// The underlying failure this error wraps, kept for logging.
    pub fn original_error(&self) -> Option<&anyhow::Error> {
        match self {
            ServiceError::Unavailable { original, .. }
            | ServiceError::Internal { original, .. } => original.as_ref(),
            _ => None,
        }
    }

    // == Redaction ==
    /// Replaces the message of server-side failures with a fixed string.
    ///
    /// 4xx messages are already written for the client and pass through.
    pub fn redacted(self, production: bool) -> Self {
        if !production {
            return self;
        }
        let generic = self.status_class().generic_message().to_string();
        match self {
            ServiceError::Unavailable { code, original, .. } => ServiceError::Unavailable {
                code,
                message: generic,
                original,
            },
            ServiceError::Timeout { code, elapsed, .. } => ServiceError::Timeout {
                code,
                message: generic,
                elapsed,
            },
            ServiceError::Internal { code, original, .. } => ServiceError::Internal {
                code,
                message: generic,
                original,
            },
            other => other,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_class().as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut body = json!({
            "error": self.message(),
            "code": self.code(),
        });
        if let ServiceError::Validation { violations, .. } = &self {
            body["violations"] = json!(violations);
        }

        (status, Json(body)).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for catalog services.
pub type Result<T> = std::result::Result<T, ServiceError>;
