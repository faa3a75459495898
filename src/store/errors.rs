//! Store error types
//!
//! Error codes:
//! - VITALS_STORE_IO_ERROR: filesystem failure, operation fails
//! - VITALS_STORE_MALFORMED: store file is not a valid record set
//! - VITALS_STORE_CORRUPTED: checksum mismatch, store refuses to open

use std::io;

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Malformed store file: {0}")]
    Malformed(String),

    #[error("Store checksum mismatch: expected {expected:#010x}, computed {actual:#010x}")]
    Corrupted { expected: u32, actual: u32 },
}

impl StoreError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        StoreError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Io { .. } => "VITALS_STORE_IO_ERROR",
            StoreError::Malformed(_) => "VITALS_STORE_MALFORMED",
            StoreError::Corrupted { .. } => "VITALS_STORE_CORRUPTED",
        }
    }

    /// Returns true if the store contents can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Malformed(_) | StoreError::Corrupted { .. })
    }
}
