//! API error types
//!
//! Errors from the record engine and the store are passed through with
//! their codes preserved. Each error carries the response status it maps
//! to; the mapping is fixed.

use std::fmt;

use serde::Serialize;

use crate::record::{RecordError, Violation};
use crate::store::StoreError;

use super::service::ServiceError;

/// Response status taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Created,
    Ok,
    NotFound,
    Conflict,
    ValidationFailed,
    InvalidRequest,
    StoreError,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Created => "created",
            Status::Ok => "ok",
            Status::NotFound => "not_found",
            Status::Conflict => "conflict",
            Status::ValidationFailed => "validation_failed",
            Status::InvalidRequest => "invalid_request",
            Status::StoreError => "store_error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Created | Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// API-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Request envelope is malformed
    VitalsInvalidRequest,
    /// `op` names no known operation
    VitalsUnknownOperation,
    /// Store failed underneath an operation
    VitalsStoreError,
}

impl ApiErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ApiErrorCode::VitalsInvalidRequest => "VITALS_INVALID_REQUEST",
            ApiErrorCode::VitalsUnknownOperation => "VITALS_UNKNOWN_OPERATION",
            ApiErrorCode::VitalsStoreError => "VITALS_STORE_ERROR",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// API error with preserved subsystem error information
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    status: Status,
    /// Original error code string (from subsystem or API)
    code: String,
    message: String,
    violations: Vec<Violation>,
}

impl ApiError {
    fn new(status: Status, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
            violations: Vec::new(),
        }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::new(
            Status::InvalidRequest,
            ApiErrorCode::VitalsInvalidRequest.code(),
            reason,
        )
    }

    pub fn unknown_operation(op: impl Into<String>) -> Self {
        Self::new(
            Status::InvalidRequest,
            ApiErrorCode::VitalsUnknownOperation.code(),
            format!("Unknown operation: {}", op.into()),
        )
    }

    /// Create from a record error (pass-through)
    pub fn from_record_error(err: RecordError) -> Self {
        let status = match &err {
            RecordError::FieldValidation(_) | RecordError::CrossFieldValidation(_) => {
                Status::ValidationFailed
            }
            RecordError::NotFound(_) => Status::NotFound,
            RecordError::Conflict(_) => Status::Conflict,
        };
        Self {
            status,
            code: err.code().code().to_string(),
            message: err.to_string(),
            violations: err.violations(),
        }
    }

    /// Create from a store error; the store's own code stays in the message
    pub fn from_store_error(err: &StoreError) -> Self {
        Self::new(
            Status::StoreError,
            ApiErrorCode::VitalsStoreError.code(),
            format!("{}: {}", err.code(), err),
        )
    }

    pub fn from_service_error(err: ServiceError) -> Self {
        match err {
            ServiceError::Record(e) => Self::from_record_error(e),
            ServiceError::Store(e) => Self::from_store_error(&e),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self::from_service_error(err)
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
