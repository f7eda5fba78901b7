//! Error types for the gateway and their translation to responses.

use crate::engine::EngineError;
use kiosync_protocol::{MissingValue, ValidationError};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that can occur while handling a request.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The payload did not match its schema.
    #[error("Schema validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The request body was not JSON.
    #[error("Invalid JSON body")]
    MalformedBody,

    /// The request body exceeded the configured limit, in bytes.
    #[error("Request body exceeds {0} bytes")]
    BodyTooLarge(usize),

    /// The transport refused the request before it reached a handler.
    #[error("{0}")]
    Rejected(String),

    /// Authentication or authorization failed.
    #[error("{0}")]
    Unauthorized(String),

    /// Unknown document or route.
    #[error("Not Found")]
    NotFound,

    /// Known route, wrong method.
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// The sync engine failed.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Pipeline wiring error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Classifies this error.
    pub fn status(&self) -> ErrorStatus {
        match self {
            GatewayError::Validation(_)
            | GatewayError::MalformedBody
            | GatewayError::BodyTooLarge(_)
            | GatewayError::Rejected(_) => ErrorStatus::BadRequest,
            GatewayError::Unauthorized(_) => ErrorStatus::Unauthorized,
            GatewayError::NotFound => ErrorStatus::NotFound,
            GatewayError::MethodNotAllowed => ErrorStatus::MethodNotAllowed,
            GatewayError::Engine(_) | GatewayError::Internal(_) => ErrorStatus::InternalError,
        }
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        !self.is_server_error()
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status() == ErrorStatus::InternalError
    }

    /// Returns the message safe to show the caller.
    ///
    /// Server errors never expose their detail.
    pub fn public_message(&self) -> String {
        if self.is_server_error() {
            self.status().reason().to_string()
        } else {
            self.to_string()
        }
    }

    /// Returns the uniform error body.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            status: self.status(),
            message: self.public_message(),
        }
    }
}

impl From<MissingValue> for GatewayError {
    fn from(err: MissingValue) -> Self {
        GatewayError::Internal(err.to_string())
    }
}

/// Externally visible error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorStatus {
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 404
    NotFound,
    /// 405
    MethodNotAllowed,
    /// 500
    InternalError,
}

impl ErrorStatus {
    /// Returns the HTTP status code.
    pub fn code(self) -> u16 {
        match self {
            ErrorStatus::BadRequest => 400,
            ErrorStatus::Unauthorized => 401,
            ErrorStatus::NotFound => 404,
            ErrorStatus::MethodNotAllowed => 405,
            ErrorStatus::InternalError => 500,
        }
    }

    /// Returns the HTTP reason phrase.
    pub fn reason(self) -> &'static str {
        match self {
            ErrorStatus::BadRequest => "Bad Request",
            ErrorStatus::Unauthorized => "Unauthorized",
            ErrorStatus::NotFound => "Not Found",
            ErrorStatus::MethodNotAllowed => "Method Not Allowed",
            ErrorStatus::InternalError => "Internal Server Error",
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// The uniform error body: `{ "status": ..., "message": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Classification.
    pub status: ErrorStatus,
    /// Caller-facing message.
    pub message: String,
}

impl ErrorBody {
    /// Renders the body as JSON.
    pub fn to_json(&self) -> Value {
        json!({ "status": self.status, "message": self.message })
    }
}
