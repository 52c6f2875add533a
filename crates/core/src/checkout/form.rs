//! Checkout form state and its reducer.
//!
//! [`FormState`] is never mutated in place by callers: each [`FormEvent`]
//! produces the next state through [`FormState::apply`]. After every event
//! the error set matches the current values for the fields it covers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::field::{CheckoutField, FormVariant};
use super::sanitize::sanitize;
use super::validate::{ValidationError, validate_field};

/// Draft values, keyed by field. Missing fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(BTreeMap<CheckoutField, String>);

impl FormData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a field, empty if never set.
    #[must_use]
    pub fn get(&self, field: CheckoutField) -> &str {
        self.0.get(&field).map_or("", String::as_str)
    }

    /// Copy of this data with one field replaced.
    #[must_use]
    pub fn with(mut self, field: CheckoutField, value: impl Into<String>) -> Self {
        self.0.insert(field, value.into());
        self
    }

    /// Build from `(name, value)` pairs, ignoring names that are not fields.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        pairs
            .into_iter()
            .filter_map(|(name, value)| Some((name.parse::<CheckoutField>().ok()?, value)))
            .fold(Self::new(), |data, (field, value)| data.with(field, value))
    }

    /// Whether every field is empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.values().all(|value| value.trim().is_empty())
    }
}

/// Current error per field. Absent means valid (or not yet checked).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<CheckoutField, ValidationError>);

impl FormErrors {
    #[must_use]
    pub fn get(&self, field: CheckoutField) -> Option<&ValidationError> {
        self.0.get(&field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CheckoutField, &ValidationError)> {
        self.0.iter().map(|(field, err)| (*field, err))
    }

    /// Copy with the entry for `field` set or cleared.
    #[must_use]
    fn with(mut self, field: CheckoutField, error: Option<ValidationError>) -> Self {
        match error {
            Some(err) => self.0.insert(field, err),
            None => self.0.remove(&field),
        };
        self
    }
}

/// Validate every required field of `variant`.
///
/// Optional fields (the apartment line) are skipped, so they never block
/// the result.
#[must_use]
pub fn validate_form(data: &FormData, variant: FormVariant) -> FormErrors {
    variant
        .required_fields()
        .fold(FormErrors::default(), |errors, field| {
            let error = validate_field(field, data.get(field), variant);
            errors.with(field, error)
        })
}

/// Something the customer did to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// A field was edited; `value` is the raw input.
    Changed { field: CheckoutField, value: String },
    /// The submit button was pressed.
    Submitted,
    /// Clear everything, e.g. after a successful order.
    Reset,
}

/// Values and errors of one form-fill session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    pub variant: FormVariant,
    pub data: FormData,
    pub errors: FormErrors,
}

impl FormState {
    /// An empty form of the given variant.
    #[must_use]
    pub fn new(variant: FormVariant) -> Self {
        Self {
            variant,
            data: FormData::new(),
            errors: FormErrors::default(),
        }
    }

    /// Compute the next state.
    #[must_use]
    pub fn apply(self, event: FormEvent) -> Self {
        match event {
            FormEvent::Changed { field, value } => {
                let cleaned = sanitize(field, &value);
                let error = validate_field(field, &cleaned, self.variant);
                Self {
                    variant: self.variant,
                    data: self.data.with(field, cleaned),
                    errors: self.errors.with(field, error),
                }
            }
            FormEvent::Submitted => Self {
                errors: validate_form(&self.data, self.variant),
                ..self
            },
            FormEvent::Reset => Self::new(self.variant),
        }
    }

    /// Whether the last full validation found nothing wrong.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn value(&self, field: CheckoutField) -> &str {
        self.data.get(field)
    }

    #[must_use]
    pub fn error(&self, field: CheckoutField) -> Option<&ValidationError> {
        self.errors.get(field)
    }
}
