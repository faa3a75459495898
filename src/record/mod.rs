//! Record validation and derivation engine
//!
//! Turns raw patient input into a [`Record`] whose derived fields (body-mass
//! ratio and verdict) are guaranteed to match its raw fields.
//!
//! # Design Principles
//!
//! - Explicit two-phase construction (shape, then rules)
//! - Declarative per-field constraint registry
//! - Cross-field rules run only on field-valid input
//! - Derivation is explicit and happens once per construction
//! - Every violation of a stage is reported, nothing is corrected

mod cross_field;
mod derive;
mod errors;
mod fields;
mod model;
mod shape;
mod types;
mod validator;

pub use cross_field::{
    CrossFieldRule, CrossFieldValidator, DEFAULT_EMERGENCY_AGE_THRESHOLD, EMERGENCY_CONTACT_LABEL,
};
pub use derive::{body_mass_index, derive, round_half_even, Derived};
pub use errors::{
    FieldViolation, RecordError, RecordErrorCode, RecordResult, RuleViolation, Violation,
};
pub use fields::{
    Constraint, FieldRegistry, Transform, DEFAULT_EMAIL_DOMAINS, MAX_ALLERGIES, MAX_TEXT_LENGTH,
    MIN_NAME_LENGTH,
};
pub use model::Record;
pub use shape::{json_type_name, RAW_KEYS, REQUIRED_KEYS, RESERVED_KEYS};
pub use types::{
    Address, FieldValue, FlatRecord, Gender, PatientId, RawFields, Verdict, BMI_KEY, ID_KEY,
    VERDICT_KEY,
};
pub use validator::{strip_reserved, RecordValidator};
