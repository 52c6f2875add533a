//! Stripe Checkout client.
//!
//! Opens hosted Checkout Sessions for the cart. The customer pays on
//! Stripe's page and comes back to `/success?session_id=...`.

use std::time::Duration;

use async_trait::async_trait;
use mama_foods_core::checkout::{CheckoutRedirect, CustomerRecord, PaymentError, PaymentGateway};
use mama_foods_core::{CartSummary, Price};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::StripeConfig;

/// Placeholder Stripe substitutes with the session ID on redirect.
const SESSION_ID_TEMPLATE: &str = "{CHECKOUT_SESSION_ID}";

/// Name of the single line sent when a discount applies.
const ORDER_LINE_NAME: &str = "Commande Mama Food's";

/// Name of the delivery line.
const DELIVERY_LINE_NAME: &str = "Livraison";

/// Longest wait for a TCP/TLS connection to Stripe.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur when interacting with the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An amount could not be expressed in cents.
    #[error("Amount out of range: {0}")]
    InvalidAmount(Decimal),
}

impl From<StripeError> for PaymentError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::Http(e) => Self::Unavailable(e.to_string()),
            StripeError::Api { status, message } => Self::Rejected { status, message },
            StripeError::Parse(msg) => Self::InvalidResponse(msg),
            StripeError::InvalidAmount(amount) => {
                Self::InvalidResponse(format!("amount out of range: {amount}"))
            }
        }
    }
}

/// Stripe Checkout API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: String,
    base_url: String,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// `base_url` is the storefront's public URL, used for the return URLs.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build. Requests give up after `config.timeout`.
    pub fn new(config: &StripeConfig, base_url: &str) -> Result<Self, StripeError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| StripeError::Parse(format!("Invalid API key format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout))
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a Checkout Session and return its hosted payment URL.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, Stripe rejects it, or the
    /// response carries no URL.
    pub async fn create_checkout_session(
        &self,
        cart: &CartSummary,
        customer: &CustomerRecord,
    ) -> Result<CheckoutSession, StripeError> {
        let url = format!("{}/v1/checkout/sessions", self.api_base);
        let params = session_params(cart, customer, &self.base_url)?;

        let response = self.client.post(&url).form(&params).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map_or(body, |e| e.error.message.unwrap_or_default());
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| StripeError::Parse(e.to_string()))?;

        if session.url.is_none() {
            return Err(StripeError::Parse(format!(
                "session {} has no redirect URL",
                session.id
            )));
        }

        tracing::info!(session_id = %session.id, "Stripe checkout session created");
        Ok(session)
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn initiate_checkout(
        &self,
        cart: &CartSummary,
        customer: &CustomerRecord,
    ) -> Result<CheckoutRedirect, PaymentError> {
        let session = self.create_checkout_session(cart, customer).await?;
        let url = session
            .url
            .ok_or_else(|| PaymentError::InvalidResponse("missing session URL".to_string()))?;
        Ok(CheckoutRedirect { url })
    }
}

/// Build the form-encoded body of a Checkout Session request.
///
/// Every dish is its own line and delivery is an extra line. Checkout
/// Sessions accept no negative lines, so a discounted order is sent as one
/// line priced at the discounted total.
///
/// # Errors
///
/// Returns `InvalidAmount` if a price does not fit in cents.
pub fn session_params(
    cart: &CartSummary,
    customer: &CustomerRecord,
    base_url: &str,
) -> Result<Vec<(String, String)>, StripeError> {
    let mut params = vec![
        ("mode".to_string(), "payment".to_string()),
        ("locale".to_string(), "fr".to_string()),
        (
            "success_url".to_string(),
            format!("{base_url}/success?session_id={SESSION_ID_TEMPLATE}"),
        ),
        ("cancel_url".to_string(), format!("{base_url}/checkout")),
        ("customer_email".to_string(), customer.email.clone()),
        ("metadata[customer_name]".to_string(), customer.full_name.clone()),
        ("metadata[phone]".to_string(), customer.phone.clone()),
    ];

    if let Some(address) = &customer.address {
        params.extend([
            ("metadata[street]".to_string(), address.street.clone()),
            ("metadata[postal_code]".to_string(), address.postal_code.clone()),
            ("metadata[city]".to_string(), address.city.clone()),
            ("metadata[country]".to_string(), address.country.clone()),
        ]);
    }

    if cart.discount > Decimal::ZERO {
        params.extend(line_params(0, ORDER_LINE_NAME, cart.total, 1, cart)?);
        return Ok(params);
    }

    for (index, item) in cart.items.iter().enumerate() {
        params.extend(line_params(index, &item.name, item.unit_price, item.quantity, cart)?);
    }
    if cart.delivery > Decimal::ZERO {
        params.extend(line_params(
            cart.items.len(),
            DELIVERY_LINE_NAME,
            cart.delivery,
            1,
            cart,
        )?);
    }

    Ok(params)
}

/// Fields of one `line_items[index]` entry with inline price data.
fn line_params(
    index: usize,
    name: &str,
    amount: Decimal,
    quantity: u32,
    cart: &CartSummary,
) -> Result<[(String, String); 4], StripeError> {
    let cents = Price::new(amount, cart.currency)
        .minor_units()
        .ok_or(StripeError::InvalidAmount(amount))?;
    let prefix = format!("line_items[{index}]");

    Ok([
        (
            format!("{prefix}[price_data][currency]"),
            cart.currency.as_lowercase().to_string(),
        ),
        (
            format!("{prefix}[price_data][product_data][name]"),
            name.to_string(),
        ),
        (
            format!("{prefix}[price_data][unit_amount]"),
            cents.to_string(),
        ),
        (format!("{prefix}[quantity]"), quantity.to_string()),
    ])
}

/// The parts of a Checkout Session the storefront reads.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mama_foods_core::checkout::Address;
    use mama_foods_core::{Cart, Menu, PricingRules};

    use super::*;

    fn customer(address: Option<Address>) -> CustomerRecord {
        CustomerRecord {
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
            email: "jean@example.com".to_string(),
            phone: "+33612345678".to_string(),
            full_name: "Jean Dupont".to_string(),
            address,
        }
    }

    fn summary(rules: &PricingRules) -> CartSummary {
        let mut cart = Cart::new();
        cart.add("yassa-poulet", 2);
        cart.add("bissap", 1);
        cart.summarize(&Menu::default(), rules)
    }

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_lines_and_return_urls() {
        let rules = PricingRules {
            delivery_fee: Decimal::new(250, 2),
            ..PricingRules::default()
        };
        let params =
            session_params(&summary(&rules), &customer(None), "https://mamafoods.com").unwrap();

        assert_eq!(
            param(&params, "success_url"),
            Some("https://mamafoods.com/success?session_id={CHECKOUT_SESSION_ID}")
        );
        assert_eq!(param(&params, "customer_email"), Some("jean@example.com"));
        assert_eq!(param(&params, "line_items[0][price_data][unit_amount]"), Some("1450"));
        assert_eq!(param(&params, "line_items[0][quantity]"), Some("2"));
        assert_eq!(param(&params, "line_items[1][price_data][currency]"), Some("eur"));
        assert_eq!(
            param(&params, "line_items[2][price_data][product_data][name]"),
            Some("Livraison")
        );
        assert_eq!(param(&params, "line_items[2][price_data][unit_amount]"), Some("250"));
        assert!(param(&params, "metadata[street]").is_none());
    }

    #[test]
    fn test_free_delivery_has_no_delivery_line() {
        let params = session_params(
            &summary(&PricingRules::default()),
            &customer(None),
            "https://mamafoods.com",
        )
        .unwrap();
        assert!(param(&params, "line_items[2][quantity]").is_none());
    }

    #[test]
    fn test_discount_collapses_to_single_line() {
        let rules = PricingRules {
            discount_rate: Decimal::new(10, 2),
            ..PricingRules::default()
        };
        let cart = summary(&rules);
        let params = session_params(&cart, &customer(None), "https://mamafoods.com").unwrap();

        // (2 * 14.50 + 3.50) * 0.9 = 29.25
        assert_eq!(param(&params, "line_items[0][price_data][unit_amount]"), Some("2925"));
        assert_eq!(
            param(&params, "line_items[0][price_data][product_data][name]"),
            Some(ORDER_LINE_NAME)
        );
        assert!(param(&params, "line_items[1][quantity]").is_none());
    }

    #[test]
    fn test_address_goes_to_metadata() {
        let address = Address {
            street: "40 Rue de Thermes".to_string(),
            city: "Calais".to_string(),
            postal_code: "62100".to_string(),
            country: "France".to_string(),
        };
        let params = session_params(
            &summary(&PricingRules::default()),
            &customer(Some(address)),
            "https://mamafoods.com",
        )
        .unwrap();

        assert_eq!(param(&params, "metadata[street]"), Some("40 Rue de Thermes"));
        assert_eq!(param(&params, "metadata[postal_code]"), Some("62100"));
    }

    #[tokio::test]
    async fn test_stalled_stripe_call_times_out() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                open.push(stream);
            }
        });

        let config = StripeConfig {
            secret_key: secrecy::SecretString::from("sk_test_51NfJq2Lk8vR3mZpQ"),
            api_base: format!("http://{addr}"),
            timeout: Duration::from_millis(200),
        };
        let client = StripeClient::new(&config, "https://mamafoods.com").unwrap();

        let err = client
            .initiate_checkout(&summary(&PricingRules::default()), &customer(None))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Unavailable(_)));
    }

    #[test]
    fn test_errors_map_to_payment_errors() {
        let err: PaymentError = StripeError::Api {
            status: 400,
            message: "No such price".to_string(),
        }
        .into();
        assert_eq!(
            err,
            PaymentError::Rejected {
                status: 400,
                message: "No such price".to_string()
            }
        );
    }
}
