//! Partial-update merger
//!
//! Flow:
//! 1. Reject updates naming reserved, unknown, or cleared required fields
//! 2. Report NotFound when nothing is stored (never upsert)
//! 3. Take the stored raw fields, dropping id and derived cache
//! 4. Overlay each provided change
//! 5. Re-attach the identifier and rebuild through the full pipeline
//!
//! The merger never writes. A failed merge leaves nothing to roll back.

use crate::record::{
    strip_reserved, FieldViolation, FlatRecord, Record, RecordError, RecordResult,
    RecordValidator, RAW_KEYS, REQUIRED_KEYS, RESERVED_KEYS,
};

use super::update::{Patch, PartialUpdate};

/// Applies partial updates onto stored records.
pub struct Merger<'a> {
    validator: &'a RecordValidator,
}

impl<'a> Merger<'a> {
    /// Creates a merger backed by the given validator.
    pub fn new(validator: &'a RecordValidator) -> Self {
        Self { validator }
    }

    /// Checks which keys an update names, without looking at any record.
    pub fn check_update(&self, update: &PartialUpdate) -> RecordResult<()> {
        let mut violations = Vec::new();

        for (field, patch) in update.iter() {
            if RESERVED_KEYS.contains(&field) {
                violations.push(FieldViolation::not_settable(field));
            } else if !RAW_KEYS.contains(&field) {
                violations.push(FieldViolation::unknown_field(field));
            } else if *patch == Patch::Clear && REQUIRED_KEYS.contains(&field) {
                violations.push(FieldViolation::null_value(field));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(RecordError::FieldValidation(violations))
        }
    }

    /// Merges `update` onto `stored` and rebuilds the record.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `stored` is `None`
    /// - `FieldValidation` / `CrossFieldValidation` if the merged fields fail
    pub fn apply(
        &self,
        id: &str,
        stored: Option<&FlatRecord>,
        update: &PartialUpdate,
    ) -> RecordResult<Record> {
        self.check_update(update)?;

        let stored = stored.ok_or_else(|| RecordError::NotFound(id.to_string()))?;

        let mut merged = strip_reserved(stored);
        for (field, patch) in update.iter() {
            match patch {
                Patch::Set(value) => {
                    merged.insert(field.to_string(), value.clone());
                }
                Patch::Clear => {
                    merged.remove(field);
                }
            }
        }

        self.validator.build(id, &merged)
    }
}
