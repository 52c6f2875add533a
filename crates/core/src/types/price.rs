//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (euros, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a euro price from a number of cents.
    #[must_use]
    pub fn eur_cents(cents: i64) -> Self {
        Self::new(Decimal::new(cents, 2), CurrencyCode::EUR)
    }

    /// Amount in the smallest currency unit, rounded half away from zero.
    ///
    /// Returns `None` if the amount does not fit in an `i64`.
    #[must_use]
    pub fn minor_units(&self) -> Option<i64> {
        use rust_decimal::prelude::ToPrimitive;

        (self.amount * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }
}

impl fmt::Display for Price {
    /// Formats as `12.50€`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        write!(f, "{amount:.2}{}", self.currency_code.symbol())
    }
}

/// ISO 4217 currency codes the restaurant charges in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EUR,
}

impl CurrencyCode {
    /// Currency symbol used when formatting.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::EUR => "€",
        }
    }

    /// Lowercase ISO code, as payment providers expect it.
    #[must_use]
    pub const fn as_lowercase(self) -> &'static str {
        match self {
            Self::EUR => "eur",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_eur() {
        assert_eq!(Price::eur_cents(1250).to_string(), "12.50€");
        assert_eq!(Price::eur_cents(0).to_string(), "0.00€");
        assert_eq!(
            Price::new(Decimal::new(5, 0), CurrencyCode::EUR).to_string(),
            "5.00€"
        );
    }

    #[test]
    fn test_display_rounds_to_cents() {
        let price = Price::new(Decimal::new(19995, 3), CurrencyCode::EUR);
        assert_eq!(price.to_string(), "20.00€");
    }

    #[test]
    fn test_provider_code() {
        assert_eq!(CurrencyCode::default().as_lowercase(), "eur");
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(Price::eur_cents(1250).minor_units(), Some(1250));
        let third = Price::new(Decimal::new(10005, 3), CurrencyCode::EUR);
        assert_eq!(third.minor_units(), Some(1001));
    }
}
