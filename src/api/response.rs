//! API response types
//!
//! Success: `{"status": .., "data": ..}`
//! Failure: `{"status": .., "code": .., "message": .., "violations": [..]}`

use serde_json::{json, Value};

use crate::record::Violation;

use super::errors::{ApiError, Status};

#[derive(Debug, Clone, PartialEq)]
pub struct SuccessResponse {
    pub status: Status,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub status: Status,
    pub code: String,
    pub message: String,
    pub violations: Vec<Violation>,
}

impl ErrorResponse {
    pub fn from_error(err: &ApiError) -> Self {
        Self {
            status: err.status(),
            code: err.code().to_string(),
            message: err.message().to_string(),
            violations: err.violations().to_vec(),
        }
    }
}

/// Unified response type
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Success(SuccessResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn created(data: Value) -> Self {
        Response::Success(SuccessResponse {
            status: Status::Created,
            data,
        })
    }

    pub fn ok(data: Value) -> Self {
        Response::Success(SuccessResponse {
            status: Status::Ok,
            data,
        })
    }

    pub fn error(err: &ApiError) -> Self {
        Response::Error(ErrorResponse::from_error(err))
    }

    pub fn status(&self) -> Status {
        match self {
            Response::Success(r) => r.status,
            Response::Error(r) => r.status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    pub fn to_value(&self) -> Value {
        match self {
            Response::Success(r) => json!({
                "status": r.status.as_str(),
                "data": r.data,
            }),
            Response::Error(r) => json!({
                "status": r.status.as_str(),
                "code": r.code,
                "message": r.message,
                "violations": r.violations,
            }),
        }
    }

    /// Single-line JSON
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}
