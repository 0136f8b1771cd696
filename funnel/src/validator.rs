//! Transition validation against the status catalog.
//!
//! Validation is pure: no side effects, no ordering dependency between
//! errors. Problems are batched (one error per missing field) so a caller
//! can display all of them at once instead of failing on the first.

use serde_json::Value;
use std::sync::Arc;

use crate::registry::StatusRegistry;
use crate::types::{FieldBag, FieldId, LeadStatus, StatusFields, SubStatus};

/// Fields that must be present to create a lead at all.
///
/// The same validator serves intake and import in `Create` mode so the
/// required-field rules have one source of truth.
pub const CREATE_REQUIRED_FIELDS: &[FieldId] = &[FieldId::Name, FieldId::Phone];

/// A single user-correctable validation problem.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A field required by the proposed status is absent or empty
    #[error("required field '{}' is missing", field.as_str())]
    MissingField { field: FieldId },

    /// A field is present but carries the wrong type
    #[error("field '{}' must be {expected}", field.as_str())]
    InvalidType {
        field: FieldId,
        expected: &'static str,
    },

    /// The proposed sub-status is not in the allowed set of the status
    #[error("sub-status '{}' is not allowed under '{}'", sub_status.as_str(), status.as_str())]
    SubStatusNotAllowed {
        status: LeadStatus,
        sub_status: SubStatus,
    },
}

impl ValidationError {
    /// The field this error is about, if any.
    pub fn field(&self) -> Option<FieldId> {
        match self {
            Self::MissingField { field } | Self::InvalidType { field, .. } => Some(*field),
            Self::SubStatusNotAllowed { .. } => None,
        }
    }
}

/// How strictly required fields are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Full status-conditional rules (the lifecycle transition path)
    Transition,
    /// Intake/import: only identity fields are mandatory
    Create,
}

/// Validates a proposed status change against the [`StatusRegistry`].
#[derive(Debug, Clone)]
pub struct TransitionValidator {
    registry: Arc<StatusRegistry>,
}

impl TransitionValidator {
    /// Create a validator over a registry.
    pub fn new(registry: Arc<StatusRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this validator consults.
    pub fn registry(&self) -> &StatusRegistry {
        &self.registry
    }

    /// Validate a proposed status / sub-status / field bag.
    ///
    /// On success returns the normalized field set: every conditional field
    /// an explicit `Option`, unset values `None`. On failure returns every
    /// problem found, batched.
    pub fn validate(
        &self,
        proposed_status: LeadStatus,
        proposed_sub_status: Option<&SubStatus>,
        bag: &FieldBag,
        mode: ValidationMode,
    ) -> Result<StatusFields, Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(sub) = proposed_sub_status {
            if !self.registry.allows_sub_status(proposed_status, sub) {
                errors.push(ValidationError::SubStatusNotAllowed {
                    status: proposed_status,
                    sub_status: sub.clone(),
                });
            }
        }

        let required: &[FieldId] = match mode {
            ValidationMode::Transition => self.registry.required_fields_of(proposed_status),
            ValidationMode::Create => CREATE_REQUIRED_FIELDS,
        };

        for field in required {
            match *field {
                // tokenDone must be boolean true, not merely present. A
                // falsy or absent value is reported as missing even when the
                // key exists. Arbitrary business rule; do not generalize.
                FieldId::TokenDone => {
                    if bag.get(&FieldId::TokenDone) != Some(&Value::Bool(true)) {
                        errors.push(ValidationError::MissingField {
                            field: FieldId::TokenDone,
                        });
                    }
                },
                field => {
                    if !is_present(bag.get(&field)) {
                        errors.push(ValidationError::MissingField { field });
                    }
                },
            }
        }

        let fields = self.normalize(bag, &mut errors);

        if errors.is_empty() {
            Ok(fields)
        } else {
            Err(errors)
        }
    }

    /// Extract the conditional fields into the single normalized shape,
    /// recording type problems for any present-but-wrong values.
    fn normalize(&self, bag: &FieldBag, errors: &mut Vec<ValidationError>) -> StatusFields {
        StatusFields {
            schedule_date: take_string(bag, FieldId::ScheduleDate, errors),
            booking_under_name: take_string(bag, FieldId::BookingUnderName, errors),
            book_date: take_string(bag, FieldId::BookDate, errors),
            agreement_value: take_number(bag, FieldId::AgreementValue, errors),
            choose_property: take_string(bag, FieldId::ChooseProperty, errors),
            token_done: take_bool(bag, FieldId::TokenDone, errors),
        }
    }
}

/// A value counts as present when it is non-null and, for strings, non-blank.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

fn take_string(bag: &FieldBag, field: FieldId, errors: &mut Vec<ValidationError>) -> Option<String> {
    match bag.get(&field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        },
        Some(_) => {
            errors.push(ValidationError::InvalidType {
                field,
                expected: "a string",
            });
            None
        },
    }
}

fn take_number(bag: &FieldBag, field: FieldId, errors: &mut Vec<ValidationError>) -> Option<f64> {
    match bag.get(&field) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(_) => {
            errors.push(ValidationError::InvalidType {
                field,
                expected: "a number",
            });
            None
        },
    }
}

fn take_bool(bag: &FieldBag, field: FieldId, errors: &mut Vec<ValidationError>) -> Option<bool> {
    match bag.get(&field) {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            errors.push(ValidationError::InvalidType {
                field,
                expected: "a boolean",
            });
            None
        },
    }
}

/// Re-express a normalized field set as a bag (for re-validation and
/// carrying fields forward through a transition).
pub fn fields_to_bag(fields: &StatusFields) -> FieldBag {
    let mut bag = FieldBag::new();
    if let Some(v) = &fields.schedule_date {
        bag.insert(FieldId::ScheduleDate, Value::String(v.clone()));
    }
    if let Some(v) = &fields.booking_under_name {
        bag.insert(FieldId::BookingUnderName, Value::String(v.clone()));
    }
    if let Some(v) = &fields.book_date {
        bag.insert(FieldId::BookDate, Value::String(v.clone()));
    }
    if let Some(v) = fields.agreement_value {
        if let Some(n) = serde_json::Number::from_f64(v) {
            bag.insert(FieldId::AgreementValue, Value::Number(n));
        }
    }
    if let Some(v) = &fields.choose_property {
        bag.insert(FieldId::ChooseProperty, Value::String(v.clone()));
    }
    if let Some(v) = fields.token_done {
        bag.insert(FieldId::TokenDone, Value::Bool(v));
    }
    bag
}
