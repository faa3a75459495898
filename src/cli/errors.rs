//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit. Request-level
//! failures never reach this type; they are answered on stdout instead.

use std::fmt;
use std::io;

use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Config file missing, unreadable, not JSON, or failing validation
    ConfigError,
    /// stdin/stdout failure, or no request on stdin for `exec`
    IoError,
    /// `init` found an existing store file
    AlreadyInitialized,
    /// `start`/`exec` found no store file
    NotInitialized,
    /// Store file present but unusable (I/O, malformed, checksum)
    BootFailed,
}

impl CliErrorCode {
    /// Stable code string, printed before the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "VITALS_CLI_CONFIG_ERROR",
            Self::IoError => "VITALS_CLI_IO_ERROR",
            Self::AlreadyInitialized => "VITALS_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "VITALS_CLI_NOT_INITIALIZED",
            Self::BootFailed => "VITALS_CLI_BOOT_FAILED",
        }
    }
}

/// A fatal CLI failure: code plus human-readable detail.
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Refusal to overwrite an existing record store.
    pub fn already_initialized() -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            "Record store already initialized",
        )
    }

    /// Refusal to serve before `init` created the store.
    pub fn not_initialized() -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            "Record store not initialized. Run 'vitalsdb init' first.",
        )
    }

    /// The store could not be opened; `msg` carries the store error code.
    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

/// Only the config file is parsed by the CLI itself; request bodies are
/// parsed by the API layer.
impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::config_error(format!("Invalid config JSON: {}", e))
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::boot_failed(format!("{}: {}", e.code(), e))
    }
}

pub type CliResult<T> = Result<T, CliError>;
