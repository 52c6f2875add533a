//! Checkout submission: guard, validate, hand off to the payment provider.
//!
//! A submission runs in three steps so a caller can persist the in-flight
//! state between them:
//!
//! 1. [`CheckoutSubmission::prepare`] checks the cart, validates the form and
//!    builds the [`CustomerRecord`]. On success the phase is `Submitting`.
//! 2. [`PendingCheckout::send`] makes the single payment call.
//! 3. [`CheckoutSubmission::finish`] folds the result back into the state.
//!
//! [`CheckoutSubmission::submit`] runs all three in a row.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::customer::CustomerRecord;
use super::field::FormVariant;
use super::form::{FormErrors, FormEvent, FormState};
use crate::cart::{CartProvider, CartSummary};

/// Delay between the success banner and the redirect to the payment page.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(1);

/// Where the customer should be sent to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRedirect {
    pub url: String,
}

/// Payment provider failure. Never shown verbatim to the customer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("payment provider unreachable: {0}")]
    Unavailable(String),

    #[error("payment provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid payment provider response: {0}")]
    InvalidResponse(String),
}

/// Payment collaborator.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted payment session for this cart and customer.
    async fn initiate_checkout(
        &self,
        cart: &CartSummary,
        customer: &CustomerRecord,
    ) -> Result<CheckoutRedirect, PaymentError>;
}

/// Where a submission stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Validating,
    Invalid,
    Submitting,
    Success,
    Failed,
}

/// Page-level message shown above the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Banner {
    Redirecting,
    CartEmpty,
    Failed,
}

impl Banner {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Redirecting => "✅ Redirection vers le paiement...",
            Self::CartEmpty => "Votre panier est vide",
            Self::Failed => "Une erreur est survenue. Veuillez réessayer.",
        }
    }

    #[must_use]
    pub const fn is_error(self) -> bool {
        !matches!(self, Self::Redirecting)
    }
}

/// Result of one press of the submit button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Some required field failed; errors are also on the form state.
    Invalid(FormErrors),
    /// Nothing to pay for.
    CartEmpty,
    /// A previous submission has not finished.
    AlreadySubmitting,
    /// Payment session opened.
    Redirect { url: String, reset_after: Duration },
    /// The payment provider failed; the form keeps its data.
    Failed,
}

impl SubmissionOutcome {
    #[must_use]
    pub const fn banner(&self) -> Option<Banner> {
        match self {
            Self::CartEmpty => Some(Banner::CartEmpty),
            Self::Redirect { .. } => Some(Banner::Redirecting),
            Self::Failed => Some(Banner::Failed),
            Self::Invalid(_) | Self::AlreadySubmitting => None,
        }
    }
}

/// Everything the payment call needs, captured when submission starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCheckout {
    pub cart: CartSummary,
    pub customer: CustomerRecord,
}

impl PendingCheckout {
    /// Make the payment call.
    ///
    /// # Errors
    ///
    /// Whatever the gateway returns.
    pub async fn send(&self, gateway: &dyn PaymentGateway) -> Result<CheckoutRedirect, PaymentError> {
        gateway.initiate_checkout(&self.cart, &self.customer).await
    }
}

/// Form state plus submission progress for one visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSubmission {
    form: FormState,
    phase: CheckoutPhase,
}

impl CheckoutSubmission {
    #[must_use]
    pub fn new(variant: FormVariant) -> Self {
        Self {
            form: FormState::new(variant),
            phase: CheckoutPhase::Idle,
        }
    }

    #[must_use]
    pub const fn form(&self) -> &FormState {
        &self.form
    }

    #[must_use]
    pub const fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    /// Whether a payment call is in flight. The submit button is disabled
    /// while this holds.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.phase, CheckoutPhase::Submitting)
    }

    /// Feed a form event through the reducer.
    pub fn apply(&mut self, event: FormEvent) {
        self.form = std::mem::take(&mut self.form).apply(event);
    }

    /// Start a submission.
    ///
    /// # Errors
    ///
    /// Returns the outcome to show when the submission stops here: already in
    /// flight, empty cart, or invalid form. The gateway must not be called in
    /// those cases.
    pub fn prepare(
        &mut self,
        cart: &dyn CartProvider,
        calling_code: &str,
    ) -> Result<PendingCheckout, SubmissionOutcome> {
        if self.is_loading() {
            return Err(SubmissionOutcome::AlreadySubmitting);
        }

        let summary = cart.cart_summary();
        if summary.total_items == 0 {
            self.phase = CheckoutPhase::Idle;
            return Err(SubmissionOutcome::CartEmpty);
        }

        self.phase = CheckoutPhase::Validating;
        self.apply(FormEvent::Submitted);
        match CustomerRecord::from_form(&self.form.data, self.form.variant, calling_code) {
            Ok(customer) => {
                self.phase = CheckoutPhase::Submitting;
                Ok(PendingCheckout {
                    cart: summary,
                    customer,
                })
            }
            Err(errors) => {
                self.phase = CheckoutPhase::Invalid;
                Err(SubmissionOutcome::Invalid(errors))
            }
        }
    }

    /// Record the payment call's result.
    ///
    /// On success the form keeps its values behind the redirect banner;
    /// [`Self::settle`] clears it once the browser has moved on.
    pub fn finish(&mut self, result: Result<CheckoutRedirect, PaymentError>) -> SubmissionOutcome {
        match result {
            Ok(redirect) => {
                info!(url = %redirect.url, "payment session opened");
                self.phase = CheckoutPhase::Success;
                SubmissionOutcome::Redirect {
                    url: redirect.url,
                    reset_after: REDIRECT_DELAY,
                }
            }
            Err(e) => {
                warn!(error = %e, "payment initiation failed");
                self.phase = CheckoutPhase::Failed;
                SubmissionOutcome::Failed
            }
        }
    }

    /// Start over after a successful submission.
    ///
    /// Runs on the first request after the redirect banner was shown.
    pub fn settle(&mut self) {
        if self.phase == CheckoutPhase::Success {
            self.apply(FormEvent::Reset);
            self.phase = CheckoutPhase::Idle;
        }
    }

    /// Give up on a submission whose payment call is no longer running.
    ///
    /// The form keeps its values and can be submitted again.
    pub fn interrupt(&mut self) {
        if self.is_loading() {
            warn!("submitting phase without a running payment call");
            self.phase = CheckoutPhase::Failed;
        }
    }

    /// Run a whole submission.
    pub async fn submit(
        &mut self,
        cart: &dyn CartProvider,
        gateway: &dyn PaymentGateway,
        calling_code: &str,
    ) -> SubmissionOutcome {
        match self.prepare(cart, calling_code) {
            Ok(pending) => {
                let result = pending.send(gateway).await;
                self.finish(result)
            }
            Err(outcome) => outcome,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use rust_decimal::Decimal;

    use super::*;
    use crate::cart::{Cart, PricingRules};
    use crate::checkout::CheckoutField;
    use crate::menu::Menu;
    use crate::types::phone::FRENCH_CALLING_CODE;

    /// Records every call and answers with a canned result.
    struct FakeGateway {
        calls: Mutex<Vec<(CartSummary, CustomerRecord)>>,
        result: Result<CheckoutRedirect, PaymentError>,
    }

    impl FakeGateway {
        fn accepting() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                result: Ok(CheckoutRedirect {
                    url: "https://checkout.stripe.com/c/pay/cs_test_1".to_owned(),
                }),
            }
        }

        fn rejecting() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                result: Err(PaymentError::Rejected {
                    status: 402,
                    message: "card_declined".to_owned(),
                }),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn initiate_checkout(
            &self,
            cart: &CartSummary,
            customer: &CustomerRecord,
        ) -> Result<CheckoutRedirect, PaymentError> {
            self.calls
                .lock()
                .unwrap()
                .push((cart.clone(), customer.clone()));
            self.result.clone()
        }
    }

    fn one_dish() -> CartSummary {
        let mut cart = Cart::new();
        cart.add("yassa-poulet", 2);
        cart.summarize(&Menu::default(), &PricingRules::default())
    }

    fn typed(mut submission: CheckoutSubmission, values: &[(CheckoutField, &str)]) -> CheckoutSubmission {
        for (field, value) in values {
            submission.apply(FormEvent::Changed {
                field: *field,
                value: (*value).to_owned(),
            });
        }
        submission
    }

    fn filled_contact() -> CheckoutSubmission {
        typed(
            CheckoutSubmission::new(FormVariant::Contact),
            &[
                (CheckoutField::FirstName, " Jean "),
                (CheckoutField::LastName, "Dupont"),
                (CheckoutField::Email, "USER@Example.com "),
                (CheckoutField::Phone, "0612345678"),
            ],
        )
    }

    #[tokio::test]
    async fn test_valid_submission_calls_gateway_once() {
        let gateway = FakeGateway::accepting();
        let mut submission = filled_contact();

        let outcome = submission
            .submit(&one_dish(), &gateway, FRENCH_CALLING_CODE)
            .await;

        assert_eq!(
            outcome,
            SubmissionOutcome::Redirect {
                url: "https://checkout.stripe.com/c/pay/cs_test_1".to_owned(),
                reset_after: REDIRECT_DELAY,
            }
        );
        assert_eq!(outcome.banner(), Some(Banner::Redirecting));
        assert_eq!(gateway.call_count(), 1);

        let calls = gateway.calls.lock().unwrap();
        let (cart, customer) = calls.first().unwrap();
        assert_eq!(cart.total_items, 2);
        assert_eq!(customer.first_name, "Jean");
        assert_eq!(customer.email, "user@example.com");
        assert_eq!(customer.phone, "+33612345678");
        drop(calls);

        assert_eq!(submission.phase(), CheckoutPhase::Success);
        assert!(!submission.is_loading());
    }

    #[tokio::test]
    async fn test_form_clears_only_after_redirect_banner() {
        let gateway = FakeGateway::accepting();
        let mut submission = filled_contact();

        submission
            .submit(&one_dish(), &gateway, FRENCH_CALLING_CODE)
            .await;

        // Still filled while the banner is up
        assert_eq!(submission.form().value(CheckoutField::LastName), "Dupont");

        submission.settle();
        assert!(submission.form().data.is_blank());
        assert_eq!(submission.phase(), CheckoutPhase::Idle);
        assert_eq!(submission.form().variant, FormVariant::Contact);
    }

    #[test]
    fn test_settle_leaves_unfinished_forms_alone() {
        let mut submission = filled_contact();
        submission.settle();
        assert_eq!(submission.form().value(CheckoutField::LastName), "Dupont");

        submission.prepare(&one_dish(), FRENCH_CALLING_CODE).unwrap();
        submission.settle();
        assert!(submission.is_loading());
    }

    #[test]
    fn test_interrupted_submission_can_be_retried() {
        let mut submission = filled_contact();
        submission.prepare(&one_dish(), FRENCH_CALLING_CODE).unwrap();

        submission.interrupt();

        assert_eq!(submission.phase(), CheckoutPhase::Failed);
        assert_eq!(submission.form().value(CheckoutField::LastName), "Dupont");
        assert!(submission.prepare(&one_dish(), FRENCH_CALLING_CODE).is_ok());
    }

    #[tokio::test]
    async fn test_empty_cart_never_calls_gateway() {
        let gateway = FakeGateway::accepting();
        let mut submission = filled_contact();

        let outcome = submission
            .submit(&CartSummary::empty(), &gateway, FRENCH_CALLING_CODE)
            .await;

        assert_eq!(outcome, SubmissionOutcome::CartEmpty);
        assert_eq!(outcome.banner().unwrap().message(), "Votre panier est vide");
        assert_eq!(gateway.call_count(), 0);
        assert_eq!(submission.form().value(CheckoutField::FirstName), " Jean ");
    }

    #[tokio::test]
    async fn test_invalid_form_never_calls_gateway() {
        let gateway = FakeGateway::accepting();
        let mut submission = typed(
            CheckoutSubmission::new(FormVariant::Delivery),
            &[(CheckoutField::FirstName, "Jean")],
        );

        let outcome = submission
            .submit(&one_dish(), &gateway, FRENCH_CALLING_CODE)
            .await;

        let SubmissionOutcome::Invalid(errors) = outcome else {
            panic!("expected invalid outcome, got {outcome:?}");
        };
        assert!(errors.get(CheckoutField::Email).is_some());
        assert!(errors.get(CheckoutField::Apartment).is_none());
        assert_eq!(gateway.call_count(), 0);
        assert_eq!(submission.phase(), CheckoutPhase::Invalid);
        assert_eq!(submission.form().errors, errors);
    }

    #[tokio::test]
    async fn test_rejection_keeps_data_and_clears_loading() {
        let gateway = FakeGateway::rejecting();
        let mut submission = filled_contact();
        let before = submission.form().data.clone();

        let outcome = submission
            .submit(&one_dish(), &gateway, FRENCH_CALLING_CODE)
            .await;

        assert_eq!(outcome, SubmissionOutcome::Failed);
        assert_eq!(
            outcome.banner().unwrap().message(),
            "Une erreur est survenue. Veuillez réessayer."
        );
        assert_eq!(gateway.call_count(), 1);
        assert_eq!(submission.form().data, before);
        assert!(!submission.is_loading());
        assert_eq!(submission.phase(), CheckoutPhase::Failed);
    }

    #[test]
    fn test_double_submission_is_refused_while_in_flight() {
        let mut submission = filled_contact();
        let pending = submission.prepare(&one_dish(), FRENCH_CALLING_CODE);
        assert!(pending.is_ok());
        assert!(submission.is_loading());

        assert_eq!(
            submission.prepare(&one_dish(), FRENCH_CALLING_CODE),
            Err(SubmissionOutcome::AlreadySubmitting)
        );
    }

    #[test]
    fn test_prepare_captures_cart_totals() {
        let mut cart = Cart::new();
        cart.add("bissap", 3);
        let rules = PricingRules {
            delivery_fee: Decimal::new(250, 2),
            ..PricingRules::default()
        };
        let summary = cart.summarize(&Menu::default(), &rules);

        let mut submission = filled_contact();
        let pending = submission.prepare(&summary, FRENCH_CALLING_CODE).unwrap();
        assert_eq!(pending.cart.total, Decimal::new(1300, 2));
        assert_eq!(pending.customer.full_name, "Jean Dupont");
    }

    #[test]
    fn test_retry_after_failure_is_allowed() {
        let mut submission = filled_contact();
        let pending = submission.prepare(&one_dish(), FRENCH_CALLING_CODE);
        assert!(pending.is_ok());
        submission.finish(Err(PaymentError::Unavailable("timeout".to_owned())));

        assert!(submission.prepare(&one_dish(), FRENCH_CALLING_CODE).is_ok());
    }
}
