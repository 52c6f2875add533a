//! Integration tests for Mama Food's.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mama-foods-integration-tests
//! ```
//!
//! Each test boots the full storefront router on an ephemeral port with
//! in-memory fakes in place of Stripe and `EmailJS`, then drives it over
//! HTTP with a cookie-keeping client.
//!
//! # Test Categories
//!
//! - `health` - Health check, security headers, static files
//! - `cart` - Cart mutations and fragments
//! - `checkout` - Field validation, submission outcomes, confirmation
//! - `contact` - Contact form delivery

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mama_foods_core::Menu;
use mama_foods_core::checkout::{
    CheckoutRedirect, CustomerRecord, FormVariant, PaymentError, PaymentGateway,
};
use mama_foods_core::contact::{MessagingError, MessagingService, TemplateSubmission};
use mama_foods_core::CartSummary;
use mama_foods_storefront::config::{EmailJsConfig, PricingConfig, StorefrontConfig, StripeConfig};
use mama_foods_storefront::state::AppState;
use secrecy::SecretString;
use tokio::sync::Notify;

/// URL the fake gateway sends the browser to.
pub const FAKE_CHECKOUT_URL: &str = "https://checkout.stripe.com/c/pay/cs_test_fake";

/// One payment initiation seen by the fake gateway.
#[derive(Debug, Clone)]
pub struct PaymentCall {
    pub cart: CartSummary,
    pub customer: CustomerRecord,
}

/// Payment gateway that records calls and answers with a canned result.
pub struct FakePaymentGateway {
    calls: Mutex<Vec<PaymentCall>>,
    response: Mutex<Result<CheckoutRedirect, PaymentError>>,
    hold: Mutex<bool>,
    started: Notify,
    release: Notify,
}

impl Default for FakePaymentGateway {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            response: Mutex::new(Ok(CheckoutRedirect {
                url: FAKE_CHECKOUT_URL.to_string(),
            })),
            hold: Mutex::new(false),
            started: Notify::new(),
            release: Notify::new(),
        }
    }
}

impl FakePaymentGateway {
    /// Make every following call fail with `error`.
    pub fn fail_with(&self, error: PaymentError) {
        *self.response.lock().unwrap() = Err(error);
    }

    /// Block calls until [`Self::release`] is called. A held call that is
    /// never released stands for a provider that stopped answering.
    pub fn hold(&self) {
        *self.hold.lock().unwrap() = true;
    }

    /// Wait until a held call has started.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let a held call finish.
    pub fn release(&self) {
        *self.hold.lock().unwrap() = false;
        self.release.notify_one();
    }

    pub fn calls(&self) -> Vec<PaymentCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakePaymentGateway {
    async fn initiate_checkout(
        &self,
        cart: &CartSummary,
        customer: &CustomerRecord,
    ) -> Result<CheckoutRedirect, PaymentError> {
        self.calls.lock().unwrap().push(PaymentCall {
            cart: cart.clone(),
            customer: customer.clone(),
        });

        let held = *self.hold.lock().unwrap();
        if held {
            self.started.notify_one();
            self.release.notified().await;
        }

        self.response.lock().unwrap().clone()
    }
}

/// Messaging service that records submissions.
#[derive(Default)]
pub struct FakeMessagingService {
    sent: Mutex<Vec<TemplateSubmission>>,
    failing: Mutex<bool>,
}

impl FakeMessagingService {
    /// Make every following send fail.
    pub fn fail(&self) {
        *self.failing.lock().unwrap() = true;
    }

    pub fn sent(&self) -> Vec<TemplateSubmission> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingService for FakeMessagingService {
    async fn send_form(&self, submission: &TemplateSubmission) -> Result<(), MessagingError> {
        if *self.failing.lock().unwrap() {
            return Err(MessagingError::Unavailable("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(submission.clone());
        Ok(())
    }
}

/// A running storefront and a client holding its session cookie.
pub struct TestContext {
    pub client: reqwest::Client,
    pub base_url: String,
    pub payments: Arc<FakePaymentGateway>,
    pub messaging: Arc<FakeMessagingService>,
}

impl TestContext {
    /// Storefront with the delivery checkout form.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Storefront with the given checkout form variant.
    pub async fn with_variant(variant: FormVariant) -> Self {
        Self::with_config(|config| config.checkout_variant = variant).await
    }

    /// Storefront with a tweaked configuration.
    pub async fn with_config(configure: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let base_url = format!("http://{addr}");

        let mut config = test_config(addr, &base_url);
        configure(&mut config);

        let payments = Arc::new(FakePaymentGateway::default());
        let messaging = Arc::new(FakeMessagingService::default());
        let state = AppState::with_services(
            config,
            Menu::default(),
            payments.clone(),
            messaging.clone(),
        );
        let app = mama_foods_storefront::app(state);

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("test server");
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("build client");

        Self {
            client,
            base_url,
            payments,
            messaging,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.expect("GET")
    }

    /// Plain form post, as a browser without the page script would send.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST")
    }

    /// Form post made by the page script, expecting a fragment.
    pub async fn post_fragment(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("POST fragment")
    }

    /// Put `quantity` of a dish in the cart.
    pub async fn add_to_cart(&self, item_id: &str, quantity: u32) {
        let quantity = quantity.to_string();
        let response = self
            .post_fragment("/cart/add", &[("item_id", item_id), ("quantity", &quantity)])
            .await;
        assert_eq!(response.status(), 200, "adding {item_id} to the cart");
    }
}

/// A delivery checkout form that passes validation.
#[must_use]
pub fn valid_delivery_form() -> Vec<(&'static str, &'static str)> {
    vec![
        ("firstName", "Jean"),
        ("lastName", "Dupont"),
        ("email", "Jean.Dupont@Example.com"),
        ("phone", "0612345678"),
        ("streetNumber", "40"),
        ("street", "Rue de Thermes"),
        ("apartment", ""),
        ("postalCode", "62100"),
        ("city", "Calais"),
        ("country", "France"),
    ]
}

fn test_config(addr: SocketAddr, base_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: addr.ip(),
        port: addr.port(),
        base_url: base_url.to_string(),
        stripe: StripeConfig {
            secret_key: SecretString::from("sk_test_51NfJq2Lk8vR3mZpQ"),
            api_base: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(5),
        },
        emailjs: EmailJsConfig {
            service_id: "service_test".to_string(),
            template_id: "template_test".to_string(),
            public_key: "public_test".to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
        },
        pricing: PricingConfig::default(),
        phone_calling_code: "+33".to_string(),
        checkout_variant: FormVariant::Delivery,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}
