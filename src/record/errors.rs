//! Record error types
//!
//! Error codes:
//! - VITALS_FIELD_VALIDATION_FAILED (REJECT)
//! - VITALS_CROSS_FIELD_VALIDATION_FAILED (REJECT)
//! - VITALS_NOT_FOUND (REJECT)
//! - VITALS_CONFLICT (REJECT)
//!
//! Validation never corrects input. Every violation found in a stage is
//! reported together.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Record-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordErrorCode {
    /// One or more fields violate their constraints
    VitalsFieldValidationFailed,
    /// A rule spanning several fields is violated
    VitalsCrossFieldValidationFailed,
    /// Referenced identifier is not stored
    VitalsNotFound,
    /// Identifier already stored on create
    VitalsConflict,
}

impl RecordErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            RecordErrorCode::VitalsFieldValidationFailed => "VITALS_FIELD_VALIDATION_FAILED",
            RecordErrorCode::VitalsCrossFieldValidationFailed => {
                "VITALS_CROSS_FIELD_VALIDATION_FAILED"
            }
            RecordErrorCode::VitalsNotFound => "VITALS_NOT_FOUND",
            RecordErrorCode::VitalsConflict => "VITALS_CONFLICT",
        }
    }
}

impl fmt::Display for RecordErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One field, one violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Field path (e.g., "address.pin", "allergies[1]")
    pub field: String,
    /// Name of the violated constraint
    pub constraint: String,
    /// Human-readable explanation
    pub message: String,
}

impl FieldViolation {
    pub fn new(
        field: impl Into<String>,
        constraint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            constraint: constraint.into(),
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(field, "required", "field is required")
    }

    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::new(field, "unknown_field", "field is not declared")
    }

    pub fn not_settable(field: impl Into<String>) -> Self {
        Self::new(field, "not_settable", "field cannot be set directly")
    }

    pub fn null_value(field: impl Into<String>) -> Self {
        Self::new(field, "not_null", "field cannot be null")
    }

    pub fn type_mismatch(field: impl Into<String>, expected: &str, actual: &str) -> Self {
        Self::new(field, "type", format!("expected {}, got {}", expected, actual))
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}' [{}]: {}", self.field, self.constraint, self.message)
    }
}

/// A named rule over several fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleViolation {
    /// Rule name (e.g., "emergency_contact_required")
    pub rule: String,
    /// Fields the rule inspects
    pub fields: Vec<String>,
    /// Human-readable explanation
    pub message: String,
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule '{}' ({}): {}", self.rule, self.fields.join(", "), self.message)
    }
}

/// Either kind of violation, tagged for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    Field(FieldViolation),
    CrossField(RuleViolation),
}

/// Record error with full context
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("field validation failed: {}", join(.0))]
    FieldValidation(Vec<FieldViolation>),

    #[error("cross-field validation failed: {}", join(.0))]
    CrossFieldValidation(Vec<RuleViolation>),

    #[error("record '{0}' not found")]
    NotFound(String),

    #[error("record '{0}' already exists")]
    Conflict(String),
}

impl RecordError {
    /// Returns the error code
    pub fn code(&self) -> RecordErrorCode {
        match self {
            RecordError::FieldValidation(_) => RecordErrorCode::VitalsFieldValidationFailed,
            RecordError::CrossFieldValidation(_) => {
                RecordErrorCode::VitalsCrossFieldValidationFailed
            }
            RecordError::NotFound(_) => RecordErrorCode::VitalsNotFound,
            RecordError::Conflict(_) => RecordErrorCode::VitalsConflict,
        }
    }

    /// Returns every violation carried by this error, in report order.
    pub fn violations(&self) -> Vec<Violation> {
        match self {
            RecordError::FieldValidation(v) => v.iter().cloned().map(Violation::Field).collect(),
            RecordError::CrossFieldValidation(v) => {
                v.iter().cloned().map(Violation::CrossField).collect()
            }
            RecordError::NotFound(_) | RecordError::Conflict(_) => Vec::new(),
        }
    }

    /// Returns whether this error came out of the validation pipeline.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RecordError::FieldValidation(_) | RecordError::CrossFieldValidation(_)
        )
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for record operations
pub type RecordResult<T> = Result<T, RecordError>;
