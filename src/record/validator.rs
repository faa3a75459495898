//! Record construction pipeline
//!
//! Stages, in order:
//! 1. Shape coercion (flat map -> typed raw fields)
//! 2. Field validators (registry), then transforms
//! 3. Cross-field validator
//! 4. Derivation
//!
//! The first stage reporting anything stops the pipeline and its full
//! violation set is returned.

use serde_json::Value;

use super::cross_field::{CrossFieldValidator, DEFAULT_EMERGENCY_AGE_THRESHOLD};
use super::errors::{FieldViolation, RecordError, RecordResult};
use super::fields::{FieldRegistry, DEFAULT_EMAIL_DOMAINS};
use super::model::Record;
use super::shape::{json_type_name, RESERVED_KEYS};
use super::types::{FlatRecord, PatientId, RawFields, ID_KEY};

/// Builds records. Holds no per-call state.
#[derive(Debug)]
pub struct RecordValidator {
    fields: FieldRegistry,
    cross_field: CrossFieldValidator,
}

impl RecordValidator {
    pub fn new(fields: FieldRegistry, cross_field: CrossFieldValidator) -> Self {
        Self {
            fields,
            cross_field,
        }
    }

    /// Patient rules with the given email allow-list and emergency age.
    pub fn patient(email_domains: &[String], emergency_age_threshold: i64) -> Self {
        Self::new(
            FieldRegistry::patient(email_domains),
            CrossFieldValidator::patient(emergency_age_threshold),
        )
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    pub fn cross_field(&self) -> &CrossFieldValidator {
        &self.cross_field
    }

    /// Builds a record from an identifier and raw input.
    ///
    /// # Errors
    ///
    /// - `FieldValidation` for a bad identifier, shape, or field value
    /// - `CrossFieldValidation` when a multi-field rule fails
    pub fn build(&self, id: &str, input: &FlatRecord) -> RecordResult<Record> {
        match (PatientId::parse(id), RawFields::coerce(input)) {
            (Ok(id), Ok(raw)) => self.build_raw(id, raw),
            (id, raw) => {
                let mut violations: Vec<FieldViolation> = id.err().into_iter().collect();
                violations.extend(raw.err().unwrap_or_default());
                Err(RecordError::FieldValidation(violations))
            }
        }
    }

    /// Runs stages 2-4 on already-coerced fields.
    pub fn build_raw(&self, id: PatientId, raw: RawFields) -> RecordResult<Record> {
        let raw = self
            .fields
            .validate(raw)
            .map_err(RecordError::FieldValidation)?;

        self.cross_field
            .validate(&raw)
            .map_err(RecordError::CrossFieldValidation)?;

        Record::assemble(id, raw)
    }

    /// Rebuilds a stored flat record. Stored `bmi`/`verdict` are discarded
    /// and recomputed.
    pub fn from_flat(&self, flat: &FlatRecord) -> RecordResult<Record> {
        let id = match flat.get(ID_KEY) {
            Some(Value::String(id)) => id.as_str(),
            Some(other) => {
                return Err(RecordError::FieldValidation(vec![FieldViolation::type_mismatch(
                    ID_KEY,
                    "string",
                    json_type_name(other),
                )]))
            }
            None => {
                return Err(RecordError::FieldValidation(vec![
                    FieldViolation::missing_field(ID_KEY),
                ]))
            }
        };
        self.build(id, &strip_reserved(flat))
    }
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self::patient(
            &DEFAULT_EMAIL_DOMAINS.map(String::from),
            DEFAULT_EMERGENCY_AGE_THRESHOLD,
        )
    }
}

/// Copy of `flat` without id and derived keys.
pub fn strip_reserved(flat: &FlatRecord) -> FlatRecord {
    flat.iter()
        .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
