//! Cross-field validator
//!
//! Rules that read more than one field at once. They run only after every
//! field check passed, so they see normalized values.

use std::fmt;

use super::derive::body_mass_index;
use super::errors::RuleViolation;
use super::types::RawFields;

/// Age above which an emergency contact is mandatory.
pub const DEFAULT_EMERGENCY_AGE_THRESHOLD: i64 = 60;

/// Contact label required above the threshold.
pub const EMERGENCY_CONTACT_LABEL: &str = "emergency";

type RuleCheck = Box<dyn Fn(&RawFields) -> Result<(), String> + Send + Sync>;

/// A named rule over several fields.
pub struct CrossFieldRule {
    name: &'static str,
    fields: &'static [&'static str],
    check: RuleCheck,
}

impl CrossFieldRule {
    pub fn new(
        name: &'static str,
        fields: &'static [&'static str],
        check: impl Fn(&RawFields) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            fields,
            check: Box::new(check),
        }
    }

    /// Patients older than `threshold` must list an emergency contact.
    pub fn emergency_contact(threshold: i64) -> Self {
        Self::new(
            "emergency_contact_required",
            &["age", "contacts"],
            move |raw: &RawFields| {
                if raw.age > threshold && !raw.has_contact(EMERGENCY_CONTACT_LABEL) {
                    return Err(format!(
                        "patients older than {} must have an '{}' contact",
                        threshold, EMERGENCY_CONTACT_LABEL
                    ));
                }
                Ok(())
            },
        )
    }

    /// Height and weight must give a finite body-mass ratio.
    ///
    /// Each bound holds on its own, but a tiny height against a large
    /// weight still overflows the ratio.
    pub fn bmi_computable() -> Self {
        Self::new("bmi_computable", &["height", "weight"], |raw: &RawFields| {
            if body_mass_index(raw.weight, raw.height).is_finite() {
                Ok(())
            } else {
                Err(format!(
                    "height {} cm and weight {} kg do not give a finite bmi",
                    raw.height, raw.weight
                ))
            }
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn evaluate(&self, raw: &RawFields) -> Result<(), RuleViolation> {
        (self.check)(raw).map_err(|message| RuleViolation {
            rule: self.name.to_string(),
            fields: self.fields.iter().map(|f| f.to_string()).collect(),
            message,
        })
    }
}

impl fmt::Debug for CrossFieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossFieldRule")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Ordered set of cross-field rules.
#[derive(Debug, Default)]
pub struct CrossFieldValidator {
    rules: Vec<CrossFieldRule>,
}

impl CrossFieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules for patient records.
    pub fn patient(emergency_age_threshold: i64) -> Self {
        Self::new()
            .with_rule(CrossFieldRule::emergency_contact(emergency_age_threshold))
            .with_rule(CrossFieldRule::bmi_computable())
    }

    pub fn with_rule(mut self, rule: CrossFieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Evaluates every rule and reports all violations.
    pub fn validate(&self, raw: &RawFields) -> Result<(), Vec<RuleViolation>> {
        let violations: Vec<RuleViolation> = self
            .rules
            .iter()
            .filter_map(|rule| rule.evaluate(raw).err())
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
