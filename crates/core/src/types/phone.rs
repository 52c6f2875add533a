//! Phone number parsing and normalization.
//!
//! Customers type numbers in many shapes (`06 12 34 56 78`, `06.12.34.56.78`,
//! `+33 (0)6...`). Everything here works on the *stripped* form: the raw
//! input with spaces, dashes, parentheses and dots removed.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Default calling code used to internationalize national numbers.
pub const FRENCH_CALLING_CODE: &str = "+33";

/// Minimum length of a stripped phone number (a leading `+` counts).
pub const MIN_LENGTH: usize = 10;

/// Maximum length of a stripped phone number (a leading `+` counts).
pub const MAX_LENGTH: usize = 15;

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneError {
    /// The input is empty or only whitespace.
    #[error("phone number cannot be empty")]
    Empty,
    /// Fewer than [`MIN_LENGTH`] characters once separators are removed.
    #[error("phone number must have at least {MIN_LENGTH} digits")]
    TooShort,
    /// More than [`MAX_LENGTH`] characters once separators are removed.
    #[error("phone number must have at most {MAX_LENGTH} digits")]
    TooLong,
    /// Starts with `00` or `08`, which are not reachable customer lines.
    #[error("phone number prefix is not a mobile or landline prefix")]
    InvalidPrefix,
    /// Matches none of the accepted national or international shapes.
    #[error("phone number format is not recognized")]
    InvalidFormat,
    /// Contains something other than digits and a leading `+`.
    #[error("phone number may only contain digits and a leading +")]
    InvalidCharacters,
}

/// The shape a valid number was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhoneKind {
    /// `06` or `07` followed by 8 digits.
    FrenchMobile,
    /// `01`-`05` or `09` followed by 8 digits.
    FrenchLandline,
    /// `+33` followed by 9 digits, first one non-zero.
    FrenchInternational,
    /// `+` and a country code, 9 to 15 digits in total.
    International,
}

/// A phone number in international form (`+33612345678`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse with the strict French-aware rule used by the contact checkout.
    ///
    /// National numbers are rewritten with `calling_code`.
    ///
    /// # Errors
    ///
    /// Returns the first rule the input breaks, checked in order: empty,
    /// length bounds, recognized shape, `00`/`08` prefix. A `00`/`08` number
    /// never has a recognized shape, so it reports `InvalidFormat`.
    pub fn parse_strict(raw: &str, calling_code: &str) -> Result<Self, PhoneError> {
        let stripped = strip_separators(raw);
        check_length(raw, &stripped)?;

        classify(&stripped).ok_or(PhoneError::InvalidFormat)?;

        if stripped.starts_with("00") || stripped.starts_with("08") {
            return Err(PhoneError::InvalidPrefix);
        }

        Ok(Self(to_international(&stripped, calling_code)))
    }

    /// Parse with the relaxed rule used by the delivery checkout: only the
    /// character set and the length are checked.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains anything besides
    /// digits and a leading `+`, or has the wrong length.
    pub fn parse_relaxed(raw: &str, calling_code: &str) -> Result<Self, PhoneError> {
        let stripped = strip_separators(raw);
        if stripped.is_empty() {
            return Err(PhoneError::Empty);
        }

        let digits = stripped.strip_prefix('+').unwrap_or(&stripped);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::InvalidCharacters);
        }

        check_length(raw, &stripped)?;
        Ok(Self(to_international(&stripped, calling_code)))
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `PhoneNumber` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn check_length(raw: &str, stripped: &str) -> Result<(), PhoneError> {
    if raw.trim().is_empty() {
        return Err(PhoneError::Empty);
    }
    let len = stripped.chars().count();
    if len < MIN_LENGTH {
        return Err(PhoneError::TooShort);
    }
    if len > MAX_LENGTH {
        return Err(PhoneError::TooLong);
    }
    Ok(())
}

/// Remove whitespace, dashes, parentheses and dots.
#[must_use]
pub fn strip_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| !(c.is_whitespace() || matches!(c, '-' | '(' | ')' | '.')))
        .collect()
}

/// Recognize the shape of a stripped number.
#[must_use]
pub fn classify(stripped: &str) -> Option<PhoneKind> {
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());

    if let Some(rest) = stripped.strip_prefix('0') {
        if rest.len() != 9 || !all_digits(rest) {
            return None;
        }
        return match rest.chars().next() {
            Some('6' | '7') => Some(PhoneKind::FrenchMobile),
            Some('1'..='5' | '9') => Some(PhoneKind::FrenchLandline),
            _ => None,
        };
    }

    if let Some(rest) = stripped.strip_prefix("+33") {
        if rest.len() == 9 && all_digits(rest) && !rest.starts_with('0') {
            return Some(PhoneKind::FrenchInternational);
        }
    }

    let rest = stripped.strip_prefix('+')?;
    let international = (9..=15).contains(&rest.len())
        && all_digits(rest)
        && !rest.starts_with('0');
    international.then_some(PhoneKind::International)
}

/// Rewrite a national number (leading `0`) with the calling code.
#[must_use]
pub fn to_international(stripped: &str, calling_code: &str) -> String {
    stripped.strip_prefix('0').map_or_else(
        || stripped.to_owned(),
        |national| format!("{calling_code}{national}"),
    )
}

/// Group a French number for display while the customer types.
///
/// `0612345678` becomes `06 12 34 56 78`; `+33612345678` (in any spacing)
/// becomes `+33 6 12 34 56 78`. Returns `None` when the input is not one of
/// those two shapes yet.
#[must_use]
pub fn group_french(value: &str) -> Option<String> {
    if value.starts_with('0') && value.chars().count() == 10 {
        if !value.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        return Some(join_groups(value, &[2, 2, 2, 2, 2]));
    }

    if value.starts_with("+33") {
        let stripped = strip_separators(value);
        if stripped.chars().count() != 12 {
            return None;
        }
        let national = stripped.strip_prefix("+33").unwrap_or_default();
        if national.len() == 9 && national.chars().all(|c| c.is_ascii_digit()) {
            return Some(format!("+33 {}", join_groups(national, &[1, 2, 2, 2, 2])));
        }
        return Some(stripped);
    }

    None
}

fn join_groups(digits: &str, sizes: &[usize]) -> String {
    let mut chars = digits.chars();
    sizes
        .iter()
        .map(|&size| chars.by_ref().take(size).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_separators() {
        assert_eq!(strip_separators("06 12-34.56 (78)"), "0612345678");
        assert_eq!(strip_separators("+33 6 12 34 56 78"), "+33612345678");
    }

    #[test]
    fn test_classify_shapes() {
        assert_eq!(classify("0612345678"), Some(PhoneKind::FrenchMobile));
        assert_eq!(classify("0712345678"), Some(PhoneKind::FrenchMobile));
        assert_eq!(classify("0145678901"), Some(PhoneKind::FrenchLandline));
        assert_eq!(classify("0945678901"), Some(PhoneKind::FrenchLandline));
        assert_eq!(classify("+33612345678"), Some(PhoneKind::FrenchInternational));
        assert_eq!(classify("+442071234567"), Some(PhoneKind::International));
        assert_eq!(classify("0812345678"), None);
        assert_eq!(classify("1234567890"), None);
    }

    #[test]
    fn test_every_french_mobile_normalizes_to_plus_33() {
        for lead in ['6', '7'] {
            for tail in ["12345678", "00000000", "99887766"] {
                let national = format!("0{lead}{tail}");
                let spaced = group_french(&national).unwrap();
                let phone = PhoneNumber::parse_strict(&spaced, FRENCH_CALLING_CODE).unwrap();
                assert_eq!(phone.as_str(), format!("+33{lead}{tail}"));
            }
        }
    }

    #[test]
    fn test_strict_rejections() {
        let parse = |s| PhoneNumber::parse_strict(s, FRENCH_CALLING_CODE);
        assert_eq!(parse("   "), Err(PhoneError::Empty));
        assert_eq!(parse("06 12 34"), Err(PhoneError::TooShort));
        assert_eq!(parse("+1234567890123456"), Err(PhoneError::TooLong));
        assert_eq!(parse("08 12 34 56 78"), Err(PhoneError::InvalidFormat));
        assert_eq!(parse("0033612345678"), Err(PhoneError::InvalidFormat));
        assert_eq!(parse("1234567890"), Err(PhoneError::InvalidFormat));
    }

    #[test]
    fn test_strict_keeps_international_numbers() {
        let phone = PhoneNumber::parse_strict("+44 20 7123 4567", FRENCH_CALLING_CODE).unwrap();
        assert_eq!(phone.as_str(), "+442071234567");
    }

    #[test]
    fn test_relaxed_only_counts_characters() {
        let parse = |s| PhoneNumber::parse_relaxed(s, FRENCH_CALLING_CODE);
        assert_eq!(parse("0812345678").unwrap().as_str(), "+33812345678");
        assert_eq!(parse("1234567890").unwrap().as_str(), "1234567890");
        assert_eq!(parse(""), Err(PhoneError::Empty));
        assert_eq!(parse("06a2345678"), Err(PhoneError::InvalidCharacters));
        assert_eq!(parse("0612"), Err(PhoneError::TooShort));
    }

    #[test]
    fn test_group_french() {
        assert_eq!(group_french("0612345678").unwrap(), "06 12 34 56 78");
        assert_eq!(group_french("+33612345678").unwrap(), "+33 6 12 34 56 78");
        assert_eq!(group_french("+33 6 1234 5678").unwrap(), "+33 6 12 34 56 78");
        assert!(group_french("061234567").is_none());
        assert!(group_french("+4420712345").is_none());
    }
}
