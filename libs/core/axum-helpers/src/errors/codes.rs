//! Error codes carried in every [`ErrorResponse`](super::ErrorResponse).
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! assert_eq!(ErrorCode::Validation.as_str(), "VALIDATION_ERROR");
//! assert_eq!(ErrorCode::Validation.code(), 1001);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Machine-readable error classes. Serialized as their `as_str` identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ErrorCode {
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    #[serde(rename = "JSON_EXTRACTION")]
    JsonExtraction,
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
    /// Request is valid but the current state forbids it, e.g. querying an empty catalog.
    #[serde(rename = "CONFLICT")]
    Conflict,
    #[serde(rename = "SERVICE_UNAVAILABLE")]
    ServiceUnavailable,
    #[serde(rename = "BAD_REQUEST")]
    BadRequest,
    #[serde(rename = "GATEWAY_TIMEOUT")]
    GatewayTimeout,
}

/// (identifier, numeric code, default message) per variant.
///
/// Numeric codes are stable: log queries and dashboards key on them.
const fn describe(code: ErrorCode) -> (&'static str, i32, &'static str) {
    match code {
        ErrorCode::Validation => ("VALIDATION_ERROR", 1001, "Request validation failed"),
        ErrorCode::JsonExtraction => ("JSON_EXTRACTION", 1003, "Failed to parse request body"),
        ErrorCode::NotFound => ("NOT_FOUND", 1004, "The requested resource was not found"),
        ErrorCode::Internal => ("INTERNAL_ERROR", 1005, "An internal server error occurred"),
        ErrorCode::Conflict => ("CONFLICT", 1008, "Request conflicts with current state"),
        ErrorCode::ServiceUnavailable => {
            ("SERVICE_UNAVAILABLE", 1011, "Service is temporarily unavailable")
        }
        ErrorCode::BadRequest => ("BAD_REQUEST", 1012, "Malformed request"),
        ErrorCode::GatewayTimeout => ("GATEWAY_TIMEOUT", 1013, "Upstream service timed out"),
    }
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        describe(self).0
    }

    pub const fn code(self) -> i32 {
        describe(self).1
    }

    pub const fn default_message(self) -> &'static str {
        describe(self).2
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
