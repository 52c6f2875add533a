//! Application state shared across handlers.

use std::sync::Arc;

use mama_foods_core::checkout::PaymentGateway;
use mama_foods_core::contact::MessagingService;
use mama_foods_core::{Menu, PricingRules};

use crate::config::StorefrontConfig;
use crate::models::session::InFlightPayments;
use crate::services::{EmailJsClient, EmailJsError, StripeClient, StripeError};

/// Error building the external service clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("stripe client: {0}")]
    Stripe(#[from] StripeError),
    #[error("emailjs client: {0}")]
    EmailJs(#[from] EmailJsError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The payment and messaging
/// collaborators are trait objects so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    menu: Menu,
    payments: Arc<dyn PaymentGateway>,
    messaging: Arc<dyn MessagingService>,
    in_flight: InFlightPayments,
}

impl AppState {
    /// Create the application state with the production Stripe and EmailJS
    /// clients.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let payments = StripeClient::new(&config.stripe, &config.base_url)?;
        let messaging = EmailJsClient::new(&config.emailjs)?;

        Ok(Self::with_services(
            config,
            Menu::default(),
            Arc::new(payments),
            Arc::new(messaging),
        ))
    }

    /// Create the application state with explicit collaborators.
    #[must_use]
    pub fn with_services(
        config: StorefrontConfig,
        menu: Menu,
        payments: Arc<dyn PaymentGateway>,
        messaging: Arc<dyn MessagingService>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                menu,
                payments,
                messaging,
                in_flight: InFlightPayments::default(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the menu.
    #[must_use]
    pub fn menu(&self) -> &Menu {
        &self.inner.menu
    }

    /// Pricing rules derived from configuration.
    #[must_use]
    pub fn pricing(&self) -> PricingRules {
        self.inner.config.pricing.rules()
    }

    /// Get the payment collaborator.
    #[must_use]
    pub fn payments(&self) -> &dyn PaymentGateway {
        self.inner.payments.as_ref()
    }

    /// Get the messaging collaborator.
    #[must_use]
    pub fn messaging(&self) -> &dyn MessagingService {
        self.inner.messaging.as_ref()
    }

    /// Sessions with a payment call running.
    #[must_use]
    pub fn in_flight_payments(&self) -> &InFlightPayments {
        &self.inner.in_flight
    }
}
