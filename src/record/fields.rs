//! Field validators
//!
//! A registry maps each field key to an ordered list of constraints and an
//! ordered list of transforms. Constraints for one field run in order and
//! stop at the first failure for that field; every field is always checked.
//! Transforms run only once the whole record passed, and the normalized
//! record is checked again so a stored value always passes its own rules.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

use super::errors::FieldViolation;
use super::types::{FieldValue, Gender, RawFields};

/// Default mailbox domains accepted for `email`.
pub const DEFAULT_EMAIL_DOMAINS: [&str; 2] = ["hdfc.com", "icici.com"];

/// Upper bound on text field length.
pub const MAX_TEXT_LENGTH: usize = 50;

/// Lower bound on `name` length.
pub const MIN_NAME_LENGTH: usize = 2;

/// Most allergies a record may list.
pub const MAX_ALLERGIES: usize = 5;

/// A single declarative check on one scalar.
#[derive(Clone)]
pub enum Constraint {
    /// Minimum character count
    MinLength(usize),
    /// Maximum character count
    MaxLength(usize),
    /// Maximum number of list entries
    MaxItems(usize),
    /// Strictly greater than
    Gt(f64),
    /// Greater than or equal
    Ge(f64),
    /// Strictly less than
    Lt(f64),
    /// Less than or equal
    Le(f64),
    /// Membership in a fixed set
    OneOf {
        values: Vec<String>,
        ignore_case: bool,
    },
    /// Address-shaped value whose domain is in the allow-list
    DomainSuffix(Vec<String>),
    /// Full-match regular expression
    Pattern(Regex),
    /// Named check function
    Custom {
        name: &'static str,
        check: fn(&FieldValue<'_>) -> Result<(), String>,
    },
}

impl Constraint {
    /// Constraint name reported in violations.
    pub fn name(&self) -> &'static str {
        match self {
            Constraint::MinLength(_) => "min_length",
            Constraint::MaxLength(_) => "max_length",
            Constraint::MaxItems(_) => "max_items",
            Constraint::Gt(_) => "gt",
            Constraint::Ge(_) => "ge",
            Constraint::Lt(_) => "lt",
            Constraint::Le(_) => "le",
            Constraint::OneOf { .. } => "one_of",
            Constraint::DomainSuffix(_) => "domain",
            Constraint::Pattern(_) => "pattern",
            Constraint::Custom { name, .. } => *name,
        }
    }

    /// Checks one value, returning the failure message.
    pub fn check(&self, value: &FieldValue<'_>) -> Result<(), String> {
        match self {
            Constraint::MinLength(min) => {
                let len = text(value)?.chars().count();
                if len < *min {
                    return Err(format!("length {} is below minimum {}", len, min));
                }
            }
            Constraint::MaxLength(max) => {
                let len = text(value)?.chars().count();
                if len > *max {
                    return Err(format!("length {} exceeds maximum {}", len, max));
                }
            }
            Constraint::MaxItems(max) => {
                let count = list(value)?.len();
                if count > *max {
                    return Err(format!("{} entries exceed maximum {}", count, max));
                }
            }
            Constraint::Gt(bound) => {
                let n = number(value)?;
                if n <= *bound {
                    return Err(format!("must be greater than {}", bound));
                }
            }
            Constraint::Ge(bound) => {
                let n = number(value)?;
                if n < *bound {
                    return Err(format!("must be at least {}", bound));
                }
            }
            Constraint::Lt(bound) => {
                let n = number(value)?;
                if n >= *bound {
                    return Err(format!("must be less than {}", bound));
                }
            }
            Constraint::Le(bound) => {
                let n = number(value)?;
                if n > *bound {
                    return Err(format!("must be at most {}", bound));
                }
            }
            Constraint::OneOf {
                values,
                ignore_case,
            } => {
                let s = text(value)?;
                let found = values.iter().any(|v| {
                    if *ignore_case {
                        v.eq_ignore_ascii_case(s)
                    } else {
                        v == s
                    }
                });
                if !found {
                    return Err(format!("must be one of: {}", values.join(", ")));
                }
            }
            Constraint::DomainSuffix(domains) => {
                let s = text(value)?;
                let domain = match s.rsplit_once('@') {
                    Some((local, domain)) if !local.is_empty() => domain.to_ascii_lowercase(),
                    _ => return Err("must have the form local@domain".into()),
                };
                if !domains.iter().any(|d| *d == domain) {
                    return Err(format!(
                        "domain '{}' is not allowed; expected one of: {}",
                        domain,
                        domains.join(", ")
                    ));
                }
            }
            Constraint::Pattern(re) => {
                let s = text(value)?;
                if !re.is_match(s) {
                    return Err(format!("must match {}", re.as_str()));
                }
            }
            Constraint::Custom { check, .. } => check(value)?,
        }
        Ok(())
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constraint({})", self.name())
    }
}

fn text<'a>(value: &FieldValue<'a>) -> Result<&'a str, String> {
    match value {
        FieldValue::Text(s) => Ok(s),
        other => Err(format!("expected string, got {}", other.type_name())),
    }
}

fn list<'a>(value: &FieldValue<'a>) -> Result<&'a [String], String> {
    match value {
        FieldValue::List(items) => Ok(items),
        other => Err(format!("expected array, got {}", other.type_name())),
    }
}

fn number(value: &FieldValue<'_>) -> Result<f64, String> {
    value
        .as_number()
        .ok_or_else(|| format!("expected number, got {}", value.type_name()))
}

/// Normalization applied after validation succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Upper,
    Lower,
    Trim,
}

impl Transform {
    pub fn apply(&self, s: &str) -> String {
        match self {
            Transform::Upper => s.to_uppercase(),
            Transform::Lower => s.to_lowercase(),
            Transform::Trim => s.trim().to_string(),
        }
    }
}

/// Field key -> ordered constraints and transforms.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    constraints: BTreeMap<String, Vec<Constraint>>,
    transforms: BTreeMap<String, Vec<Transform>>,
}

impl FieldRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry for patient records with the given email domain allow-list.
    pub fn patient(email_domains: &[String]) -> Self {
        let mut registry = Self::new();

        registry
            .constrain("name", Constraint::MinLength(MIN_NAME_LENGTH))
            .constrain("name", Constraint::Custom {
                name: "not_blank",
                check: not_blank,
            })
            .constrain("name", Constraint::MaxLength(MAX_TEXT_LENGTH))
            .transform("name", Transform::Trim)
            .transform("name", Transform::Upper);

        registry
            .constrain("city", Constraint::Custom {
                name: "not_blank",
                check: not_blank,
            })
            .constrain("city", Constraint::MaxLength(MAX_TEXT_LENGTH))
            .transform("city", Transform::Trim);

        registry
            .constrain("age", Constraint::Gt(0.0))
            .constrain("age", Constraint::Lt(120.0));

        registry
            .constrain(
                "gender",
                Constraint::OneOf {
                    values: Gender::NAMES.iter().map(|g| g.to_string()).collect(),
                    ignore_case: true,
                },
            )
            .transform("gender", Transform::Lower);

        registry
            .constrain("height", Constraint::Gt(0.0))
            .constrain("height", Constraint::Le(300.0));

        registry
            .constrain("weight", Constraint::Gt(0.0))
            .constrain("weight", Constraint::Le(700.0));

        registry
            .constrain("email", Constraint::Pattern(email_shape()))
            .constrain("email", Constraint::DomainSuffix(email_domains.to_vec()))
            .transform("email", Transform::Lower);

        registry.constrain("allergies", Constraint::MaxItems(MAX_ALLERGIES));
        registry
            .constrain("allergies[]", Constraint::Custom {
                name: "not_blank",
                check: not_blank,
            })
            .constrain("allergies[]", Constraint::MaxLength(MAX_TEXT_LENGTH))
            .transform("allergies[]", Transform::Trim);

        registry
            .constrain("contacts.*", Constraint::Custom {
                name: "not_blank",
                check: not_blank,
            })
            .transform("contacts.*", Transform::Trim);

        for key in ["address.city", "address.state"] {
            registry
                .constrain(key, Constraint::Custom {
                    name: "not_blank",
                    check: not_blank,
                })
                .constrain(key, Constraint::MaxLength(MAX_TEXT_LENGTH))
                .transform(key, Transform::Trim);
        }
        registry.constrain("address.pin", Constraint::Pattern(pin_shape()));

        registry
    }

    /// Appends a constraint to a field's list.
    pub fn constrain(&mut self, key: impl Into<String>, constraint: Constraint) -> &mut Self {
        self.constraints.entry(key.into()).or_default().push(constraint);
        self
    }

    /// Appends a transform to a field's list.
    pub fn transform(&mut self, key: impl Into<String>, transform: Transform) -> &mut Self {
        self.transforms.entry(key.into()).or_default().push(transform);
        self
    }

    /// Returns the constraints registered for a key.
    pub fn constraints_for(&self, key: &str) -> &[Constraint] {
        self.constraints.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Checks one value against its field's constraints.
    pub fn check_field(
        &self,
        path: &str,
        key: &str,
        value: &FieldValue<'_>,
    ) -> Result<(), FieldViolation> {
        for constraint in self.constraints_for(key) {
            if let Err(message) = constraint.check(value) {
                return Err(FieldViolation::new(path, constraint.name(), message));
            }
        }
        Ok(())
    }

    /// Runs every field check, then every transform, then every check again
    /// on the normalized values.
    ///
    /// Transforms can change a value's length (`ß` upper-cases to `SS`), so
    /// the second pass rejects input whose normalized form breaks a rule.
    pub fn validate(&self, mut raw: RawFields) -> Result<RawFields, Vec<FieldViolation>> {
        self.check_all(&raw)?;
        raw.map_text(|key, s| self.normalize(key, s));
        self.check_all(&raw)?;
        Ok(raw)
    }

    fn check_all(&self, raw: &RawFields) -> Result<(), Vec<FieldViolation>> {
        let violations: Vec<FieldViolation> = raw
            .entries()
            .iter()
            .filter_map(|e| self.check_field(&e.path, e.key, &e.value).err())
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Applies a field's transforms in order.
    pub fn normalize(&self, key: &str, s: &str) -> String {
        match self.transforms.get(key) {
            Some(transforms) => transforms
                .iter()
                .fold(s.to_string(), |acc, t| t.apply(&acc)),
            None => s.to_string(),
        }
    }
}

fn not_blank(value: &FieldValue<'_>) -> Result<(), String> {
    match value {
        FieldValue::Text(s) if s.trim().is_empty() => Err("cannot be blank".into()),
        FieldValue::Text(_) => Ok(()),
        other => Err(format!("expected string, got {}", other.type_name())),
    }
}

fn email_shape() -> Regex {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern")
}

fn pin_shape() -> Regex {
    Regex::new(r"^[0-9]{6}$").expect("static pin pattern")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> FieldRegistry {
        FieldRegistry::patient(&DEFAULT_EMAIL_DOMAINS.map(String::from))
    }

    fn raw() -> RawFields {
        RawFields {
            name: " nitish ".into(),
            city: "gurgaon".into(),
            age: 30,
            gender: "Male".into(),
            height: 170.0,
            weight: 70.0,
            email: Some("Abc@ICICI.com".into()),
            married: Some(true),
            allergies: None,
            contacts: None,
            address: None,
        }
    }

    fn check(key: &str, value: FieldValue<'_>) -> Result<(), FieldViolation> {
        registry().check_field(key, key, &value)
    }

    #[test]
    fn test_age_bounds_are_exclusive() {
        assert_eq!(check("age", FieldValue::Integer(0)).unwrap_err().constraint, "gt");
        assert!(check("age", FieldValue::Integer(1)).is_ok());
        assert!(check("age", FieldValue::Integer(119)).is_ok());
        assert_eq!(check("age", FieldValue::Integer(120)).unwrap_err().constraint, "lt");
    }

    #[test]
    fn test_positive_measurements() {
        assert_eq!(check("height", FieldValue::Real(0.0)).unwrap_err().constraint, "gt");
        assert_eq!(check("weight", FieldValue::Real(-1.0)).unwrap_err().constraint, "gt");
        assert!(check("weight", FieldValue::Real(0.5)).is_ok());
    }

    #[test]
    fn test_name_length_bounds() {
        let long = "x".repeat(MAX_TEXT_LENGTH + 1);
        assert_eq!(check("name", FieldValue::Text(&long)).unwrap_err().constraint, "max_length");
        assert_eq!(check("name", FieldValue::Text("")).unwrap_err().constraint, "min_length");
        assert_eq!(check("name", FieldValue::Text("a")).unwrap_err().constraint, "min_length");
        assert!(check("name", FieldValue::Text("ab")).is_ok());
        assert!(check("name", FieldValue::Text(&"x".repeat(MAX_TEXT_LENGTH))).is_ok());
    }

    #[test]
    fn test_allergy_count_bound() {
        let five: Vec<String> = (0..MAX_ALLERGIES).map(|i| format!("a{}", i)).collect();
        assert!(check("allergies", FieldValue::List(&five)).is_ok());

        let mut six = five.clone();
        six.push("a5".into());
        let err = check("allergies", FieldValue::List(&six)).unwrap_err();
        assert_eq!(err.constraint, "max_items");
        assert_eq!(err.message, "6 entries exceed maximum 5");
    }

    #[test]
    fn test_normalized_value_is_checked_again() {
        // 30 characters before upper-casing, 60 after
        let mut input = raw();
        input.name = "ß".repeat(30);
        let violations = registry().validate(input).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "name");
        assert_eq!(violations[0].constraint, "max_length");

        // Trimming below the minimum is caught the same way
        let mut input = raw();
        input.name = " a ".into();
        let violations = registry().validate(input).unwrap_err();
        assert_eq!(violations[0].constraint, "min_length");
    }

    #[test]
    fn test_normalization_is_stable() {
        let registry = registry();
        let once = registry.validate(raw()).unwrap();
        let twice = registry.validate(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_gender_enumeration() {
        assert!(check("gender", FieldValue::Text("FEMALE")).is_ok());
        let err = check("gender", FieldValue::Text("robot")).unwrap_err();
        assert_eq!(err.constraint, "one_of");
        assert!(err.message.contains("male"));
    }

    #[test]
    fn test_email_domain_allow_list() {
        assert!(check("email", FieldValue::Text("abc@hdfc.com")).is_ok());
        let err = check("email", FieldValue::Text("abc@gmail.com")).unwrap_err();
        assert_eq!(err.constraint, "domain");
        assert!(err.message.contains("gmail.com"));
        // Shape is checked before the domain
        let err = check("email", FieldValue::Text("not-an-address")).unwrap_err();
        assert_eq!(err.constraint, "pattern");
    }

    #[test]
    fn test_pin_pattern() {
        assert!(check("address.pin", FieldValue::Text("122001")).is_ok());
        assert_eq!(
            check("address.pin", FieldValue::Text("12200")).unwrap_err().constraint,
            "pattern"
        );
    }

    #[test]
    fn test_validate_collects_all_fields() {
        let mut input = raw();
        input.age = 150;
        input.gender = "robot".into();
        input.email = Some("abc@gmail.com".into());
        let violations = registry().validate(input).unwrap_err();
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["age", "gender", "email"]);
    }

    #[test]
    fn test_transforms_run_after_success() {
        let normalized = registry().validate(raw()).unwrap();
        assert_eq!(normalized.name, "NITISH");
        assert_eq!(normalized.gender, "male");
        assert_eq!(normalized.email.as_deref(), Some("abc@icici.com"));
    }

    #[test]
    fn test_custom_constraint_registration() {
        fn even(value: &FieldValue<'_>) -> Result<(), String> {
            match value {
                FieldValue::Integer(i) if i % 2 == 0 => Ok(()),
                _ => Err("must be even".into()),
            }
        }
        let mut registry = registry();
        registry.constrain("age", Constraint::Custom { name: "even", check: even });
        let err = registry
            .check_field("age", "age", &FieldValue::Integer(31))
            .unwrap_err();
        assert_eq!(err.constraint, "even");
    }

    #[test]
    fn test_unregistered_key_passes() {
        let registry = FieldRegistry::new();
        assert!(registry
            .check_field("anything", "anything", &FieldValue::Integer(-5))
            .is_ok());
        assert_eq!(registry.normalize("anything", " a "), " a ");
    }
}
