//! Record model
//!
//! A [`Record`] can only be produced by [`RecordValidator`](super::RecordValidator),
//! which runs every validation stage before derivation. Fields are private
//! and there are no setters, so derived values always match raw values.

use std::collections::BTreeMap;

use serde_json::Value;

use super::derive::{derive, Derived};
use super::errors::{FieldViolation, RecordError, RecordResult};
use super::types::{
    Address, FlatRecord, Gender, PatientId, RawFields, Verdict, BMI_KEY, ID_KEY, VERDICT_KEY,
};

/// A validated patient record with up-to-date derived fields.
#[derive(Debug, Clone)]
pub struct Record {
    id: PatientId,
    name: String,
    city: String,
    age: u8,
    gender: Gender,
    height: f64,
    weight: f64,
    email: Option<String>,
    married: Option<bool>,
    allergies: Option<Vec<String>>,
    contacts: Option<BTreeMap<String, String>>,
    address: Option<Address>,
    derived: Derived,
}

impl Record {
    /// Final stage: type the validated fields and derive.
    ///
    /// Callers must have run field and cross-field validation on `raw`.
    pub(super) fn assemble(id: PatientId, raw: RawFields) -> RecordResult<Self> {
        let gender = Gender::parse(&raw.gender).ok_or_else(|| {
            RecordError::FieldValidation(vec![FieldViolation::new(
                "gender",
                "one_of",
                format!("must be one of: {}", Gender::NAMES.join(", ")),
            )])
        })?;
        let age = u8::try_from(raw.age).map_err(|_| {
            RecordError::FieldValidation(vec![FieldViolation::new(
                "age",
                "range",
                "age out of range",
            )])
        })?;

        let derived = derive(raw.weight, raw.height);

        Ok(Self {
            id,
            name: raw.name,
            city: raw.city,
            age,
            gender,
            height: raw.height,
            weight: raw.weight,
            email: raw.email,
            married: raw.married,
            allergies: raw.allergies,
            contacts: raw.contacts,
            address: raw.address,
            derived,
        })
    }

    pub fn id(&self) -> &PatientId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    /// Height in centimeters
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Weight in kilograms
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn married(&self) -> Option<bool> {
        self.married
    }

    pub fn allergies(&self) -> &[String] {
        self.allergies.as_deref().unwrap_or(&[])
    }

    pub fn contacts(&self) -> Option<&BTreeMap<String, String>> {
        self.contacts.as_ref()
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn bmi(&self) -> f64 {
        self.derived.bmi
    }

    pub fn verdict(&self) -> Verdict {
        self.derived.verdict
    }

    /// The raw field set, as accepted by the pipeline.
    pub fn raw_fields(&self) -> RawFields {
        RawFields {
            name: self.name.clone(),
            city: self.city.clone(),
            age: i64::from(self.age),
            gender: self.gender.as_str().to_string(),
            height: self.height,
            weight: self.weight,
            email: self.email.clone(),
            married: self.married,
            allergies: self.allergies.clone(),
            contacts: self.contacts.clone(),
            address: self.address.clone(),
        }
    }

    /// Persisted form: id, raw fields, and the derived cache.
    pub fn to_flat(&self) -> FlatRecord {
        let mut map = self.raw_fields().to_flat();
        map.insert(ID_KEY.into(), Value::from(self.id.as_str()));
        map.insert(BMI_KEY.into(), Value::from(self.derived.bmi));
        map.insert(VERDICT_KEY.into(), Value::from(self.derived.verdict.as_str()));
        map
    }
}

/// Equal iff identifiers and raw fields are equal; derived fields follow.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.raw_fields() == other.raw_fields()
    }
}
