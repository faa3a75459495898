//! Record type definitions
//!
//! Flat keys of a patient record:
//! - id: store key, never derived, never updated
//! - name, city, age, gender, height, weight: required raw fields
//! - email, married, allergies, contacts, address: optional raw fields
//! - bmi, verdict: derived, written for readers but never trusted on input

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::FieldViolation;

/// Flat key-value form used for storage and transport.
pub type FlatRecord = serde_json::Map<String, Value>;

/// Flat keys that callers may never set.
pub const ID_KEY: &str = "id";
pub const BMI_KEY: &str = "bmi";
pub const VERDICT_KEY: &str = "verdict";

/// Maximum identifier length.
pub const MAX_ID_LENGTH: usize = 32;

/// Store key of a record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    /// Parses an identifier: 1..=32 ASCII letters, digits, '-' or '_'.
    pub fn parse(raw: &str) -> Result<Self, FieldViolation> {
        if raw.is_empty() {
            return Err(FieldViolation::new(ID_KEY, "min_length", "identifier is empty"));
        }
        if raw.len() > MAX_ID_LENGTH {
            return Err(FieldViolation::new(
                ID_KEY,
                "max_length",
                format!("identifier longer than {} characters", MAX_ID_LENGTH),
            ));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(FieldViolation::new(
                ID_KEY,
                "pattern",
                "identifier may only contain letters, digits, '-' and '_'",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepted genders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Others,
}

impl Gender {
    pub const NAMES: [&'static str; 3] = ["male", "female", "others"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Others => "others",
        }
    }

    /// Case-insensitive lookup.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "others" => Some(Gender::Others),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body-mass verdict buckets, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Underweight => "underweight",
            Verdict::Normal => "normal",
            Verdict::Overweight => "overweight",
            Verdict::Obese => "obese",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Postal address owned by a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    pub state: String,
    pub pin: String,
}

/// Raw fields after shape coercion, before any rule has run.
///
/// Gender stays textual here; it becomes a [`Gender`] only once the
/// registry has accepted and normalized it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFields {
    pub name: String,
    pub city: String,
    pub age: i64,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
    pub email: Option<String>,
    pub married: Option<bool>,
    pub allergies: Option<Vec<String>>,
    pub contacts: Option<BTreeMap<String, String>>,
    pub address: Option<Address>,
}

/// A single scalar handed to the field registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Integer(i64),
    Real(f64),
    /// A whole list, for item-count rules
    List(&'a [String]),
}

impl FieldValue<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "string",
            FieldValue::Integer(_) => "int",
            FieldValue::Real(_) => "float",
            FieldValue::List(_) => "array",
        }
    }

    /// Numeric view, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Real(r) => Some(*r),
            FieldValue::Text(_) | FieldValue::List(_) => None,
        }
    }
}

/// A scalar located in a record: its concrete path, the registry key
/// that governs it, and the value.
pub struct FieldEntry<'a> {
    pub path: String,
    pub key: &'static str,
    pub value: FieldValue<'a>,
}

impl RawFields {
    /// Enumerates every scalar subject to field rules, nested ones included.
    ///
    /// Contact values are governed by `contacts.*` and allergy entries by
    /// `allergies[]`; the allergy list as a whole by `allergies`.
    pub fn entries(&self) -> Vec<FieldEntry<'_>> {
        let mut out = vec![
            entry("name", "name", FieldValue::Text(&self.name)),
            entry("city", "city", FieldValue::Text(&self.city)),
            entry("age", "age", FieldValue::Integer(self.age)),
            entry("gender", "gender", FieldValue::Text(&self.gender)),
            entry("height", "height", FieldValue::Real(self.height)),
            entry("weight", "weight", FieldValue::Real(self.weight)),
        ];

        if let Some(email) = &self.email {
            out.push(entry("email", "email", FieldValue::Text(email)));
        }
        if let Some(allergies) = &self.allergies {
            out.push(entry("allergies", "allergies", FieldValue::List(allergies)));
            for (i, allergy) in allergies.iter().enumerate() {
                out.push(entry(
                    format!("allergies[{}]", i),
                    "allergies[]",
                    FieldValue::Text(allergy),
                ));
            }
        }
        if let Some(contacts) = &self.contacts {
            for (label, value) in contacts {
                out.push(entry(
                    format!("contacts.{}", label),
                    "contacts.*",
                    FieldValue::Text(value),
                ));
            }
        }
        if let Some(address) = &self.address {
            out.push(entry("address.city", "address.city", FieldValue::Text(&address.city)));
            out.push(entry("address.state", "address.state", FieldValue::Text(&address.state)));
            out.push(entry("address.pin", "address.pin", FieldValue::Text(&address.pin)));
        }

        out
    }

    /// Rewrites every text scalar through `f(key, text)`.
    pub fn map_text(&mut self, f: impl Fn(&str, &str) -> String) {
        self.name = f("name", &self.name);
        self.city = f("city", &self.city);
        self.gender = f("gender", &self.gender);
        if let Some(email) = self.email.as_mut() {
            *email = f("email", email);
        }
        if let Some(allergies) = self.allergies.as_mut() {
            for allergy in allergies.iter_mut() {
                *allergy = f("allergies[]", allergy);
            }
        }
        if let Some(contacts) = self.contacts.as_mut() {
            for value in contacts.values_mut() {
                *value = f("contacts.*", value);
            }
        }
        if let Some(address) = self.address.as_mut() {
            address.city = f("address.city", &address.city);
            address.state = f("address.state", &address.state);
            address.pin = f("address.pin", &address.pin);
        }
    }

    /// Returns whether a contact with the given label exists.
    pub fn has_contact(&self, label: &str) -> bool {
        self.contacts
            .as_ref()
            .map_or(false, |contacts| contacts.contains_key(label))
    }
}

fn entry<'a>(path: impl Into<String>, key: &'static str, value: FieldValue<'a>) -> FieldEntry<'a> {
    FieldEntry {
        path: path.into(),
        key,
        value,
    }
}
