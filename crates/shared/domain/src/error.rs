//! Errors returned by the directory's domain services.
//!
//! The domain layer reports failures in two structured encodings: a REST-style
//! error with a dotted `"Namespace.Reason"` code and an error carrying a nine
//! digit numeric code whose leading digit is the HTTP status class. Anything
//! else (transport failures, panics surfaced as errors) is opaque.

use std::error::Error;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{is_transient_reason, NUMERIC_CODE_CLASS_DIVISOR, NUMERIC_CODE_SERVER_CLASS};

/// Error type returned by domain collaborator calls.
pub type LogicError = Box<dyn Error + Send + Sync + 'static>;

/// Result type alias for domain collaborator calls
pub type LogicResult<T> = Result<T, LogicError>;

/// Whether a failure is worth redelivering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Infrastructure fault; a later attempt may succeed
    Internal,
    /// Bad request, not found, conflict; retrying cannot help
    External,
}

impl ErrorClass {
    /// Check if this class warrants redelivery
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorClass::Internal)
    }
}

/// REST-style domain error identified by a dotted code, e.g. `Public.NotFound`.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{code}: {cause}")]
pub struct RestError {
    pub code: String,
    pub cause: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl RestError {
    pub fn new(code: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            cause: cause.into(),
            detail: None,
        }
    }

    /// Attach structured detail
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Reason segment of the code (the part after the last dot).
    ///
    /// A code without a dot is its own reason.
    pub fn reason(&self) -> &str {
        self.code
            .rsplit_once('.')
            .map(|(_, reason)| reason)
            .unwrap_or(&self.code)
    }

    pub fn class(&self) -> ErrorClass {
        if is_transient_reason(self.reason()) {
            ErrorClass::Internal
        } else {
            ErrorClass::External
        }
    }
}

/// Domain error identified by a numeric code such as `404019001`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("error {code}: {message}")]
pub struct CodedError {
    pub code: i64,
    pub message: String,
}

impl CodedError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// HTTP status class encoded in the leading digit
    pub fn status_class(&self) -> i64 {
        self.code / NUMERIC_CODE_CLASS_DIVISOR
    }

    pub fn class(&self) -> ErrorClass {
        if self.status_class() == NUMERIC_CODE_SERVER_CLASS {
            ErrorClass::Internal
        } else {
            ErrorClass::External
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_error_reason() {
        assert_eq!(RestError::new("Public.NotFound", "x").reason(), "NotFound");
        assert_eq!(
            RestError::new("UserManagement.Anonymous.Conflict", "x").reason(),
            "Conflict"
        );
        assert_eq!(RestError::new("ServiceUnavailable", "x").reason(), "ServiceUnavailable");
    }

    #[test]
    fn test_rest_error_class() {
        assert_eq!(
            RestError::new("Public.InternalServerError", "boom").class(),
            ErrorClass::Internal
        );
        assert_eq!(
            RestError::new("Public.ServiceUnavailable", "down").class(),
            ErrorClass::Internal
        );
        assert_eq!(RestError::new("Public.BadRequest", "bad").class(), ErrorClass::External);
    }

    #[test]
    fn test_coded_error_class_boundaries() {
        assert_eq!(CodedError::new(500_000_000, "x").class(), ErrorClass::Internal);
        assert_eq!(CodedError::new(599_999_999, "x").class(), ErrorClass::Internal);
        assert_eq!(CodedError::new(499_999_999, "x").class(), ErrorClass::External);
        assert_eq!(CodedError::new(600_000_000, "x").class(), ErrorClass::External);
        assert_eq!(CodedError::new(-500_000_000, "x").class(), ErrorClass::External);
    }

    #[test]
    fn test_display() {
        let err = RestError::new("Public.NotFound", "app missing");
        assert_eq!(err.to_string(), "Public.NotFound: app missing");

        let err = CodedError::new(404_019_001, "account missing");
        assert_eq!(err.to_string(), "error 404019001: account missing");
    }
}
