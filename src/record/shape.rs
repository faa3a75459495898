//! Shape coercion: flat map -> [`RawFields`]
//!
//! First of the two construction phases. Checks presence, JSON types and
//! undeclared keys only; no value rules run here.
//!
//! Forbidden behaviors:
//! - String to number coercion
//! - Floats for integer fields
//! - Null values
//! - Undeclared fields

use std::collections::BTreeMap;

use serde_json::Value;

use super::errors::FieldViolation;
use super::types::{Address, FlatRecord, RawFields, BMI_KEY, ID_KEY, VERDICT_KEY};

/// Raw keys accepted at the top level of a record.
pub const RAW_KEYS: [&str; 11] = [
    "name", "city", "age", "gender", "height", "weight", "email", "married", "allergies",
    "contacts", "address",
];

/// Raw keys a record cannot exist without.
pub const REQUIRED_KEYS: [&str; 6] = ["name", "city", "age", "gender", "height", "weight"];

/// Keys that exist on a record but may never be supplied.
pub const RESERVED_KEYS: [&str; 3] = [ID_KEY, BMI_KEY, VERDICT_KEY];

const ADDRESS_KEYS: [&str; 3] = ["city", "state", "pin"];

impl RawFields {
    /// Coerces a flat map into typed raw fields, collecting every violation.
    pub fn coerce(input: &FlatRecord) -> Result<RawFields, Vec<FieldViolation>> {
        let mut ex = Extractor::default();

        for key in input.keys() {
            if RESERVED_KEYS.contains(&key.as_str()) {
                ex.violations.push(FieldViolation::not_settable(key.as_str()));
            } else if !RAW_KEYS.contains(&key.as_str()) {
                ex.violations.push(FieldViolation::unknown_field(key.as_str()));
            }
        }

        let name = ex.string(input, "", "name", true);
        let city = ex.string(input, "", "city", true);
        let age = ex.int(input, "age", true);
        let gender = ex.string(input, "", "gender", true);
        let height = ex.float(input, "height", true);
        let weight = ex.float(input, "weight", true);
        let email = ex.string(input, "", "email", false);
        let married = ex.boolean(input, "married", false);
        let allergies = ex.string_list(input, "allergies");
        let contacts = ex.string_map(input, "contacts");
        let address = ex.address(input, "address");

        if !ex.violations.is_empty() {
            return Err(ex.violations);
        }

        match (name, city, age, gender, height, weight) {
            (Some(name), Some(city), Some(age), Some(gender), Some(height), Some(weight)) => {
                Ok(RawFields {
                    name,
                    city,
                    age,
                    gender,
                    height,
                    weight,
                    email,
                    married,
                    allergies,
                    contacts,
                    address,
                })
            }
            // Every missing required field pushed a violation above
            _ => Err(ex.violations),
        }
    }

    /// Flat form of the raw fields only (no id, no derived values).
    pub fn to_flat(&self) -> FlatRecord {
        let mut map = FlatRecord::new();
        map.insert("name".into(), Value::from(self.name.as_str()));
        map.insert("city".into(), Value::from(self.city.as_str()));
        map.insert("age".into(), Value::from(self.age));
        map.insert("gender".into(), Value::from(self.gender.as_str()));
        map.insert("height".into(), Value::from(self.height));
        map.insert("weight".into(), Value::from(self.weight));
        if let Some(email) = &self.email {
            map.insert("email".into(), Value::from(email.as_str()));
        }
        if let Some(married) = self.married {
            map.insert("married".into(), Value::from(married));
        }
        if let Some(allergies) = &self.allergies {
            map.insert("allergies".into(), Value::from(allergies.clone()));
        }
        if let Some(contacts) = &self.contacts {
            let obj: FlatRecord = contacts
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect();
            map.insert("contacts".into(), Value::Object(obj));
        }
        if let Some(address) = &self.address {
            let mut obj = FlatRecord::new();
            obj.insert("city".into(), Value::from(address.city.as_str()));
            obj.insert("state".into(), Value::from(address.state.as_str()));
            obj.insert("pin".into(), Value::from(address.pin.as_str()));
            map.insert("address".into(), Value::Object(obj));
        }
        map
    }
}

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "float"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Creates a field path from prefix and field name.
fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

#[derive(Default)]
struct Extractor {
    violations: Vec<FieldViolation>,
}

impl Extractor {
    /// Returns the non-null value under `key`, recording absence or null.
    fn lookup<'v>(
        &mut self,
        map: &'v FlatRecord,
        path: &str,
        key: &str,
        required: bool,
    ) -> Option<&'v Value> {
        match map.get(key) {
            None => {
                if required {
                    self.violations.push(FieldViolation::missing_field(path));
                }
                None
            }
            Some(Value::Null) => {
                self.violations.push(FieldViolation::null_value(path));
                None
            }
            Some(value) => Some(value),
        }
    }

    fn mismatch(&mut self, path: impl Into<String>, expected: &str, value: &Value) {
        self.violations
            .push(FieldViolation::type_mismatch(path, expected, json_type_name(value)));
    }

    fn string(&mut self, map: &FlatRecord, prefix: &str, key: &str, required: bool) -> Option<String> {
        let path = make_path(prefix, key);
        let value = self.lookup(map, &path, key, required)?;
        match value.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                self.mismatch(path, "string", value);
                None
            }
        }
    }

    fn int(&mut self, map: &FlatRecord, key: &str, required: bool) -> Option<i64> {
        let value = self.lookup(map, key, key, required)?;
        match value.as_i64() {
            Some(i) => Some(i),
            // Integral, but past i64::MAX
            None if value.is_u64() => {
                self.violations.push(FieldViolation::new(
                    key,
                    "range",
                    format!("integer {} is out of range", value),
                ));
                None
            }
            None => {
                self.mismatch(key, "int", value);
                None
            }
        }
    }

    fn float(&mut self, map: &FlatRecord, key: &str, required: bool) -> Option<f64> {
        let value = self.lookup(map, key, key, required)?;
        match value.as_f64() {
            Some(f) => Some(f),
            None => {
                self.mismatch(key, "float", value);
                None
            }
        }
    }

    fn boolean(&mut self, map: &FlatRecord, key: &str, required: bool) -> Option<bool> {
        let value = self.lookup(map, key, key, required)?;
        match value.as_bool() {
            Some(b) => Some(b),
            None => {
                self.mismatch(key, "bool", value);
                None
            }
        }
    }

    fn string_list(&mut self, map: &FlatRecord, key: &str) -> Option<Vec<String>> {
        let value = self.lookup(map, key, key, false)?;
        let Some(items) = value.as_array() else {
            self.mismatch(key, "array", value);
            return None;
        };

        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let path = format!("{}[{}]", key, i);
            match item {
                Value::String(s) => out.push(s.clone()),
                Value::Null => self.violations.push(FieldViolation::null_value(path)),
                other => self.mismatch(path, "string", other),
            }
        }
        Some(out)
    }

    fn string_map(&mut self, map: &FlatRecord, key: &str) -> Option<BTreeMap<String, String>> {
        let value = self.lookup(map, key, key, false)?;
        let Some(obj) = value.as_object() else {
            self.mismatch(key, "object", value);
            return None;
        };

        let mut out = BTreeMap::new();
        for (label, item) in obj {
            let path = make_path(key, label);
            if label.trim().is_empty() {
                self.violations
                    .push(FieldViolation::new(path, "min_length", "label cannot be empty"));
                continue;
            }
            match item {
                Value::String(s) => {
                    out.insert(label.clone(), s.clone());
                }
                Value::Null => self.violations.push(FieldViolation::null_value(path)),
                other => self.mismatch(path, "string", other),
            }
        }
        Some(out)
    }

    fn address(&mut self, map: &FlatRecord, key: &str) -> Option<Address> {
        let value = self.lookup(map, key, key, false)?;
        let Some(obj) = value.as_object() else {
            self.mismatch(key, "object", value);
            return None;
        };

        for field in obj.keys() {
            if !ADDRESS_KEYS.contains(&field.as_str()) {
                self.violations
                    .push(FieldViolation::unknown_field(make_path(key, field)));
            }
        }

        let city = self.string(obj, key, "city", true);
        let state = self.string(obj, key, "state", true);
        let pin = self.string(obj, key, "pin", true);

        Some(Address {
            city: city?,
            state: state?,
            pin: pin?,
        })
    }
}
