//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (Stripe return URLs)
//! - `STRIPE_SECRET_KEY` - Stripe secret API key (high entropy, no placeholders)
//! - `EMAILJS_SERVICE_ID` - EmailJS service for the contact form
//! - `EMAILJS_TEMPLATE_ID` - EmailJS template for the contact form
//! - `EMAILJS_PUBLIC_KEY` - EmailJS public key
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STRIPE_API_BASE` - Stripe API origin (default: <https://api.stripe.com>)
//! - `STRIPE_TIMEOUT_SECS` - Give up on a Stripe call after this long (default: 20)
//! - `EMAILJS_API_BASE` - EmailJS API origin (default: <https://api.emailjs.com>)
//! - `DELIVERY_FEE` - Flat delivery fee in euros, not negative (default: 0.00)
//! - `FREE_DELIVERY_THRESHOLD` - Subtotal from which delivery is free, not negative
//! - `DISCOUNT_RATE` - Fraction taken off the subtotal, 0 to 1 (default: 0)
//! - `PHONE_CALLING_CODE` - Prefix replacing a national leading 0 (default: +33)
//! - `CHECKOUT_VARIANT` - `delivery` or `contact` (default: delivery)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use mama_foods_core::checkout::FormVariant;
use mama_foods_core::contact::EmailTemplate;
use mama_foods_core::types::phone::FRENCH_CALLING_CODE;
use mama_foods_core::PricingRules;
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Stripe Checkout configuration
    pub stripe: StripeConfig,
    /// EmailJS configuration for the contact form
    pub emailjs: EmailJsConfig,
    /// Delivery fee and promotion
    pub pricing: PricingConfig,
    /// Calling code used to internationalize national phone numbers
    pub phone_calling_code: String,
    /// Which checkout form is shown
    pub checkout_variant: FormVariant,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Stripe Checkout configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (server-side only)
    pub secret_key: SecretString,
    /// API origin, overridable for tests
    pub api_base: String,
    /// Longest a Checkout Session request may take
    pub timeout: Duration,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// EmailJS configuration. All identifiers are public by design of the
/// EmailJS browser SDK.
#[derive(Debug, Clone)]
pub struct EmailJsConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    /// API origin, overridable for tests
    pub api_base: String,
}

impl EmailJsConfig {
    /// Template identifiers for the contact form.
    #[must_use]
    pub fn template(&self) -> EmailTemplate {
        EmailTemplate {
            service_id: self.service_id.clone(),
            template_id: self.template_id.clone(),
            public_key: self.public_key.clone(),
        }
    }
}

/// Cart pricing settings.
#[derive(Debug, Clone, Default)]
pub struct PricingConfig {
    pub delivery_fee: Decimal,
    pub free_delivery_threshold: Option<Decimal>,
    pub discount_rate: Decimal,
}

impl PricingConfig {
    #[must_use]
    pub const fn rules(&self) -> PricingRules {
        PricingRules {
            delivery_fee: self.delivery_fee,
            free_delivery_threshold: self.free_delivery_threshold,
            discount_rate: self.discount_rate,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let stripe = StripeConfig::from_env()?;
        let emailjs = EmailJsConfig::from_env()?;
        let pricing = PricingConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            stripe,
            emailjs,
            pricing,
            phone_calling_code: get_env_or_default("PHONE_CALLING_CODE", FRENCH_CALLING_CODE),
            checkout_variant: get_env_or_default("CHECKOUT_VARIANT", "delivery")
                .parse()
                .map_err(|e| ConfigError::InvalidEnvVar("CHECKOUT_VARIANT".to_string(), e))?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: get_validated_secret("STRIPE_SECRET_KEY")?,
            api_base: get_env_or_default("STRIPE_API_BASE", "https://api.stripe.com"),
            timeout: Duration::from_secs(parse_env_or_default("STRIPE_TIMEOUT_SECS", "20")?),
        })
    }
}

impl EmailJsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            service_id: get_required_env("EMAILJS_SERVICE_ID")?,
            template_id: get_required_env("EMAILJS_TEMPLATE_ID")?,
            public_key: get_required_env("EMAILJS_PUBLIC_KEY")?,
            api_base: get_env_or_default("EMAILJS_API_BASE", "https://api.emailjs.com"),
        })
    }
}

impl PricingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::parse(
            &get_env_or_default("DELIVERY_FEE", "0.00"),
            get_optional_env("FREE_DELIVERY_THRESHOLD").as_deref(),
            &get_env_or_default("DISCOUNT_RATE", "0"),
        )
    }

    /// Parse raw pricing values. Amounts may not be negative and the
    /// discount rate must lie between 0 and 1.
    fn parse(
        delivery_fee: &str,
        free_delivery_threshold: Option<&str>,
        discount_rate: &str,
    ) -> Result<Self, ConfigError> {
        let delivery_fee = parse_amount("DELIVERY_FEE", delivery_fee)?;
        let free_delivery_threshold = free_delivery_threshold
            .map(|value| parse_amount("FREE_DELIVERY_THRESHOLD", value))
            .transpose()?;

        let discount_rate: Decimal = parse_value("DISCOUNT_RATE", discount_rate)?;
        if discount_rate < Decimal::ZERO || discount_rate > Decimal::ONE {
            return Err(ConfigError::InvalidEnvVar(
                "DISCOUNT_RATE".to_string(),
                format!("{discount_rate} is not between 0 and 1"),
            ));
        }

        Ok(Self {
            delivery_fee,
            free_delivery_threshold,
            discount_rate,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a euro amount that may not be negative.
fn parse_amount(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    let amount: Decimal = parse_value(key, value)?;
    if amount < Decimal::ZERO {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("{amount} is negative"),
        ));
    }
    Ok(amount)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key from the Stripe dashboard."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            stripe: StripeConfig {
                secret_key: SecretString::from("sk_test_51NfJq2Lk8vR3mZpQ"),
                api_base: "https://api.stripe.com".to_string(),
                timeout: Duration::from_secs(20),
            },
            emailjs: EmailJsConfig {
                service_id: "service_alseuoi".to_string(),
                template_id: "template_4y6qli9".to_string(),
                public_key: "VBmtMMPVU3-HxWlVP".to_string(),
                api_base: "https://api.emailjs.com".to_string(),
            },
            pricing: PricingConfig::default(),
            phone_calling_code: FRENCH_CALLING_CODE.to_string(),
            checkout_variant: FormVariant::Delivery,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        let entropy = shannon_entropy("sk_live_51NfJq2Lk8vR3mZpQ");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-stripe-key", "STRIPE_SECRET_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("sk_test_aaaaaaaaaaaaaaaa", "STRIPE_SECRET_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("sk_test_51NfJq2Lk8vR3mZpQwXy", "STRIPE_SECRET_KEY");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_value() {
        let fee: Decimal = parse_value("DELIVERY_FEE", " 2.50 ").unwrap();
        assert_eq!(fee, Decimal::new(250, 2));

        let err = parse_value::<u16>("STOREFRONT_PORT", "http").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_pricing_rules() {
        let pricing = PricingConfig {
            delivery_fee: Decimal::new(300, 2),
            free_delivery_threshold: Some(Decimal::new(30, 0)),
            discount_rate: Decimal::ZERO,
        };
        let rules = pricing.rules();
        assert_eq!(rules.delivery_fee, Decimal::new(300, 2));
        assert_eq!(rules.free_delivery_threshold, Some(Decimal::new(30, 0)));
    }

    #[test]
    fn test_pricing_parse_defaults() {
        let pricing = PricingConfig::parse("0.00", None, "0").unwrap();
        assert_eq!(pricing.delivery_fee, Decimal::ZERO);
        assert_eq!(pricing.free_delivery_threshold, None);
        assert_eq!(pricing.discount_rate, Decimal::ZERO);

        let pricing = PricingConfig::parse("2.50", Some("30"), "1").unwrap();
        assert_eq!(pricing.delivery_fee, Decimal::new(250, 2));
        assert_eq!(pricing.free_delivery_threshold, Some(Decimal::new(30, 0)));
        assert_eq!(pricing.discount_rate, Decimal::ONE);
    }

    #[test]
    fn test_pricing_rejects_negative_amounts() {
        let err = PricingConfig::parse("-5.00", None, "0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "DELIVERY_FEE"));

        let err = PricingConfig::parse("0", Some("-1"), "0").unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "FREE_DELIVERY_THRESHOLD")
        );
    }

    #[test]
    fn test_pricing_rejects_rate_outside_unit_range() {
        for rate in ["-0.50", "1.01", "10"] {
            let err = PricingConfig::parse("0", None, rate).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "DISCOUNT_RATE"));
        }
    }

    #[test]
    fn test_stripe_config_debug_redacts_secret() {
        let debug_output = format!("{:?}", test_config());

        assert!(debug_output.contains("api.stripe.com"));
        assert!(debug_output.contains("service_alseuoi"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk_test_51NfJq2Lk8vR3mZpQ"));
    }
}
