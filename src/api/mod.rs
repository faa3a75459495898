//! API layer for vitalsdb
//!
//! Parses JSON requests, runs them against the record service behind a
//! single mutex, and formats responses with a fixed status taxonomy.
//!
//! # Design Principles
//!
//! - Single global mutex for all operations
//! - Error codes passed through unchanged
//! - Validation failures carry every violation
//!
//! # Supported Operations
//!
//! - create
//! - get
//! - list
//! - sort
//! - update
//! - delete
//! - status

mod errors;
mod handler;
mod request;
mod response;
mod service;

pub use errors::{ApiError, ApiErrorCode, ApiResult, Status};
pub use handler::ApiHandler;
pub use request::{CreateRequest, Request, SortRequest, UpdateRequest};
pub use response::{ErrorResponse, Response, SuccessResponse};
pub use service::{RecordService, ServiceError, ServiceResult, SortKey, SortOrder};
