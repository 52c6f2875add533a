//! Input cleanup applied on every keystroke, before validation.

use super::field::CheckoutField;
use super::validate::{is_name_char, is_postal_code_char};
use crate::types::phone;

/// Characters a phone input may hold while the customer types.
fn is_phone_char(c: char) -> bool {
    c.is_ascii_digit() || c.is_whitespace() || matches!(c, '-' | '+' | '(' | ')' | '.')
}

/// Clean a raw field value.
///
/// - names and city drop characters outside the name whitelist
/// - phone keeps digits and separators, then groups complete French numbers
/// - email loses all whitespace and is lowercased
/// - postal code drops disallowed characters and is uppercased
/// - street number keeps digits and letters, uppercased
#[must_use]
pub fn sanitize(field: CheckoutField, raw: &str) -> String {
    match field {
        CheckoutField::FirstName | CheckoutField::LastName | CheckoutField::City => {
            raw.chars().filter(|&c| is_name_char(c)).collect()
        }
        CheckoutField::Phone => {
            let kept: String = raw.chars().filter(|&c| is_phone_char(c)).collect();
            phone::group_french(&kept).unwrap_or(kept)
        }
        CheckoutField::Email => raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase(),
        CheckoutField::PostalCode => raw
            .chars()
            .filter(|&c| is_postal_code_char(c))
            .collect::<String>()
            .to_uppercase(),
        CheckoutField::StreetNumber => raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_uppercase(),
        CheckoutField::Street | CheckoutField::Apartment | CheckoutField::Country => {
            raw.to_owned()
        }
    }
}
