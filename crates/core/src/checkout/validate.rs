//! Per-field validation rules.
//!
//! Validators are pure: they take the raw field value and return the first
//! rule it breaks, or `None`. The `Display` of [`ValidationError`] is the
//! French message shown under the input.

use serde::{Deserialize, Serialize};

use super::field::{CheckoutField, FormVariant};
use crate::types::{Email, PhoneError, PhoneNumber, phone};

/// Minimum number of characters in a trimmed first or last name.
pub const MIN_NAME_LENGTH: usize = 2;

/// Allowed length range for a trimmed postal code.
pub const POSTAL_CODE_LENGTH: std::ops::RangeInclusive<usize> = 3..=10;

/// Why a field value was rejected.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("{}", required_message(*.0))]
    Required(CheckoutField),
    #[error("{} doit contenir au moins 2 caractères", subject(*.0))]
    NameTooShort(CheckoutField),
    #[error("Seules les lettres, espaces, apostrophes et tirets sont autorisés")]
    NameCharacters,
    #[error("Veuillez entrer une adresse email valide")]
    InvalidEmail,
    #[error("Le numéro doit contenir au moins 10 chiffres")]
    PhoneTooShort,
    #[error("Le numéro ne peut pas dépasser 15 chiffres")]
    PhoneTooLong,
    #[error("Format invalide. Exemples: 06 12 34 56 78, +33 6 12 34 56 78")]
    PhoneFormat,
    #[error("Numéro invalide. Utilisez un numéro mobile (06/07) ou fixe (01-05, 09)")]
    PhonePrefix,
    #[error("Seuls les chiffres et le signe + sont autorisés")]
    PhoneCharacters,
    #[error("Numéro de rue invalide (ex: 40 ou 12B)")]
    StreetNumber,
    #[error("Le nom de ville ne peut contenir que des lettres, espaces, apostrophes et tirets")]
    CityCharacters,
    #[error("Le code postal doit contenir entre 3 et 10 caractères")]
    PostalCodeLength,
    #[error("Le code postal ne peut contenir que des lettres, chiffres, espaces et tirets")]
    PostalCodeCharacters,
}

const fn subject(field: CheckoutField) -> &'static str {
    match field {
        CheckoutField::FirstName => "Le prénom",
        CheckoutField::LastName => "Le nom",
        CheckoutField::Email => "L'adresse email",
        CheckoutField::Phone => "Le numéro de téléphone",
        CheckoutField::StreetNumber => "Le numéro de rue",
        CheckoutField::Street => "Le nom de rue",
        CheckoutField::Apartment => "Le complément d'adresse",
        CheckoutField::PostalCode => "Le code postal",
        CheckoutField::City => "La ville",
        CheckoutField::Country => "Le pays",
    }
}

fn required_message(field: CheckoutField) -> String {
    let agreement = match field {
        CheckoutField::Email | CheckoutField::City => "requise",
        _ => "requis",
    };
    format!("{} est {agreement}", subject(field))
}

/// Letters (including Latin-1 accented letters), whitespace, apostrophes
/// and hyphens.
#[must_use]
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic()
        || ('\u{C0}'..='\u{FF}').contains(&c)
        || c.is_whitespace()
        || matches!(c, '\'' | '-')
}

/// ASCII letters and digits, spaces and hyphens.
#[must_use]
pub fn is_postal_code_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '-')
}

/// Validate a single field.
#[must_use]
pub fn validate_field(
    field: CheckoutField,
    value: &str,
    variant: FormVariant,
) -> Option<ValidationError> {
    let trimmed = value.trim();
    if field.is_required() && trimmed.is_empty() {
        return Some(ValidationError::Required(field));
    }

    match field {
        CheckoutField::FirstName | CheckoutField::LastName => validate_name(field, value),
        CheckoutField::Email => Email::parse(value)
            .err()
            .map(|_| ValidationError::InvalidEmail),
        CheckoutField::Phone => validate_phone(value, variant),
        CheckoutField::StreetNumber => validate_street_number(trimmed),
        CheckoutField::City => (!trimmed.chars().all(is_name_char))
            .then_some(ValidationError::CityCharacters),
        CheckoutField::PostalCode => validate_postal_code(trimmed),
        CheckoutField::Street | CheckoutField::Country | CheckoutField::Apartment => None,
    }
}

fn validate_name(field: CheckoutField, value: &str) -> Option<ValidationError> {
    if value.trim().chars().count() < MIN_NAME_LENGTH {
        return Some(ValidationError::NameTooShort(field));
    }
    if !value.chars().all(is_name_char) {
        return Some(ValidationError::NameCharacters);
    }
    None
}

fn validate_phone(value: &str, variant: FormVariant) -> Option<ValidationError> {
    let parsed = match variant {
        FormVariant::Contact => PhoneNumber::parse_strict(value, phone::FRENCH_CALLING_CODE),
        FormVariant::Delivery => PhoneNumber::parse_relaxed(value, phone::FRENCH_CALLING_CODE),
    };

    parsed.err().map(|err| match err {
        PhoneError::Empty => ValidationError::Required(CheckoutField::Phone),
        PhoneError::TooShort => ValidationError::PhoneTooShort,
        PhoneError::TooLong => ValidationError::PhoneTooLong,
        PhoneError::InvalidPrefix => ValidationError::PhonePrefix,
        PhoneError::InvalidFormat => ValidationError::PhoneFormat,
        PhoneError::InvalidCharacters => ValidationError::PhoneCharacters,
    })
}

/// Digits, optionally followed by a single letter (`40`, `12B`).
fn validate_street_number(value: &str) -> Option<ValidationError> {
    let digits = value.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let suffix_len = value.len() - digits.len();
    let valid = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) && suffix_len <= 1;
    (!valid).then_some(ValidationError::StreetNumber)
}

fn validate_postal_code(value: &str) -> Option<ValidationError> {
    if !POSTAL_CODE_LENGTH.contains(&value.chars().count()) {
        return Some(ValidationError::PostalCodeLength);
    }
    if !value.chars().all(is_postal_code_char) {
        return Some(ValidationError::PostalCodeCharacters);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(field: CheckoutField, value: &str) -> Option<ValidationError> {
        validate_field(field, value, FormVariant::Delivery)
    }

    fn message(field: CheckoutField, value: &str) -> Option<String> {
        check(field, value).map(|err| err.to_string())
    }

    #[test]
    fn test_name_required_and_length() {
        assert_eq!(
            message(CheckoutField::FirstName, "   ").as_deref(),
            Some("Le prénom est requis")
        );
        assert_eq!(
            message(CheckoutField::LastName, "").as_deref(),
            Some("Le nom est requis")
        );
        assert_eq!(
            message(CheckoutField::FirstName, " J ").as_deref(),
            Some("Le prénom doit contenir au moins 2 caractères")
        );
        assert_eq!(check(CheckoutField::FirstName, " Jean "), None);
        assert_eq!(check(CheckoutField::LastName, "N'Guessan-Kouamé"), None);
        assert_eq!(check(CheckoutField::FirstName, "Éloïse"), None);
    }

    #[test]
    fn test_name_rejects_digits_and_symbols() {
        for value in ["Jean2", "Jean!", "Jean_Paul", "J@n", "Marie&Co", "Zoë 3"] {
            assert_eq!(
                check(CheckoutField::FirstName, value),
                Some(ValidationError::NameCharacters),
                "{value} should be rejected"
            );
        }
        assert_eq!(
            message(CheckoutField::LastName, "Dupont9").as_deref(),
            Some("Seules les lettres, espaces, apostrophes et tirets sont autorisés")
        );
    }

    #[test]
    fn test_email_rules() {
        assert_eq!(
            message(CheckoutField::Email, " ").as_deref(),
            Some("L'adresse email est requise")
        );
        assert_eq!(
            check(CheckoutField::Email, "user@example"),
            Some(ValidationError::InvalidEmail)
        );
        assert_eq!(
            check(CheckoutField::Email, "us er@example.com"),
            Some(ValidationError::InvalidEmail)
        );
        assert_eq!(check(CheckoutField::Email, "user@example.com"), None);
    }

    #[test]
    fn test_phone_strict_variant() {
        let strict = |value| validate_field(CheckoutField::Phone, value, FormVariant::Contact);
        assert_eq!(strict("06 12 34 56 78"), None);
        assert_eq!(strict("+33 6 12 34 56 78"), None);
        assert_eq!(strict("01 23 45 67 89"), None);
        assert_eq!(strict("+44 20 7123 4567"), None);
        assert_eq!(strict("06 12 34"), Some(ValidationError::PhoneTooShort));
        assert_eq!(strict("0612345678901234"), Some(ValidationError::PhoneTooLong));
        // Unrecognized shape is reported before the 00/08 prefix
        assert_eq!(strict("08 12 34 56 78"), Some(ValidationError::PhoneFormat));
        assert_eq!(strict("00 33 6 12 34 56"), Some(ValidationError::PhoneFormat));
        assert_eq!(
            strict("08 12 34 56 78").map(|err| err.to_string()).as_deref(),
            Some("Format invalide. Exemples: 06 12 34 56 78, +33 6 12 34 56 78")
        );
        assert_eq!(strict("1234567890"), Some(ValidationError::PhoneFormat));
        assert_eq!(
            strict("").map(|err| err.to_string()).as_deref(),
            Some("Le numéro de téléphone est requis")
        );
    }

    #[test]
    fn test_phone_relaxed_variant() {
        assert_eq!(check(CheckoutField::Phone, "08 12 34 56 78"), None);
        assert_eq!(check(CheckoutField::Phone, "1234567890"), None);
        assert_eq!(
            check(CheckoutField::Phone, "06 12 34 ab 78"),
            Some(ValidationError::PhoneCharacters)
        );
        assert_eq!(
            check(CheckoutField::Phone, "0612"),
            Some(ValidationError::PhoneTooShort)
        );
    }

    #[test]
    fn test_street_number() {
        assert_eq!(check(CheckoutField::StreetNumber, "40"), None);
        assert_eq!(check(CheckoutField::StreetNumber, "12B"), None);
        assert_eq!(
            check(CheckoutField::StreetNumber, "12BC"),
            Some(ValidationError::StreetNumber)
        );
        assert_eq!(
            check(CheckoutField::StreetNumber, "B12"),
            Some(ValidationError::StreetNumber)
        );
        assert_eq!(
            check(CheckoutField::StreetNumber, ""),
            Some(ValidationError::Required(CheckoutField::StreetNumber))
        );
    }

    #[test]
    fn test_street_city_country() {
        assert_eq!(check(CheckoutField::Street, "Rue de Thermes"), None);
        assert_eq!(
            check(CheckoutField::Street, " "),
            Some(ValidationError::Required(CheckoutField::Street))
        );
        assert_eq!(check(CheckoutField::City, "Boulogne-sur-Mer"), None);
        assert_eq!(
            check(CheckoutField::City, "Calais 2"),
            Some(ValidationError::CityCharacters)
        );
        assert_eq!(
            message(CheckoutField::City, "").as_deref(),
            Some("La ville est requise")
        );
        assert_eq!(check(CheckoutField::Country, "France"), None);
        assert_eq!(
            check(CheckoutField::Country, ""),
            Some(ValidationError::Required(CheckoutField::Country))
        );
    }

    #[test]
    fn test_postal_code() {
        assert_eq!(check(CheckoutField::PostalCode, "75001"), None);
        assert_eq!(check(CheckoutField::PostalCode, "SW1A 1AA"), None);
        assert_eq!(
            message(CheckoutField::PostalCode, "AB").as_deref(),
            Some("Le code postal doit contenir entre 3 et 10 caractères")
        );
        assert_eq!(
            check(CheckoutField::PostalCode, "12345678901"),
            Some(ValidationError::PostalCodeLength)
        );
        assert_eq!(
            check(CheckoutField::PostalCode, "750_01"),
            Some(ValidationError::PostalCodeCharacters)
        );
    }

    #[test]
    fn test_apartment_is_optional() {
        assert_eq!(check(CheckoutField::Apartment, ""), None);
        assert_eq!(check(CheckoutField::Apartment, "Bât. B #4"), None);
    }
}
