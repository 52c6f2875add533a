//! Checkout route handlers.
//!
//! The form state and submission phase live in the session. Each keystroke
//! posts one field to `/checkout/field`, which sanitizes, validates and
//! stores it. Submitting runs the whole form through validation, opens a
//! Stripe Checkout session and sends the browser there.
//!
//! The payment call runs on its own task: once it has started it finishes
//! and records its result even if the visitor navigates away. It holds the
//! session's payment slot while it runs, and gives up after the Stripe
//! timeout so the visitor can try again.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use mama_foods_core::checkout::{
    CheckoutField, CheckoutSubmission, FormEvent, PaymentError, REDIRECT_DELAY, SubmissionOutcome,
    UnknownField,
};
use mama_foods_core::CartSummary;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::cart::summarize;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::session::{
    clear_order, load_cart, load_checkout, save_checkout, store_checkout_result,
};
use crate::models::views::{BannerView, CartView, FieldView};
use crate::state::AppState;

/// Seconds the success page waits before going back home.
pub const SUCCESS_REDIRECT_SECONDS: u64 = 10;

/// Single field edit.
#[derive(Debug, Deserialize)]
pub struct FieldForm {
    pub field: String,
    #[serde(default)]
    pub value: String,
}

/// Query parameters Stripe appends to the success URL.
#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub session_id: Option<String>,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutShowTemplate {
    pub cart: CartView,
    pub contact_fields: Vec<FieldView>,
    /// Empty for the contact-only form.
    pub address_fields: Vec<FieldView>,
    pub banner: Option<BannerView>,
    pub loading: bool,
    /// Payment page to send the browser to after the banner.
    pub redirect_url: Option<String>,
    pub redirect_seconds: u64,
}

/// One checkout input fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/field.html")]
pub struct FieldTemplate {
    pub field: FieldView,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub order_number: String,
    pub redirect_seconds: u64,
    pub nonce: String,
}

impl CheckoutShowTemplate {
    fn new(summary: &CartSummary, submission: &CheckoutSubmission) -> Self {
        let form = submission.form();
        let views = |fields: &[CheckoutField]| {
            fields
                .iter()
                .map(|&field| FieldView::checkout(field, form))
                .collect::<Vec<_>>()
        };

        Self {
            cart: CartView::from(summary),
            contact_fields: views(&CheckoutField::CONTACT),
            address_fields: if form.variant.captures_address() {
                views(&CheckoutField::ADDRESS)
            } else {
                Vec::new()
            },
            banner: None,
            loading: submission.is_loading(),
            redirect_url: None,
            redirect_seconds: REDIRECT_DELAY.as_secs(),
        }
    }

    fn with_outcome(mut self, outcome: &SubmissionOutcome) -> Self {
        self.banner = outcome.banner().map(BannerView::from);
        if let SubmissionOutcome::Redirect { url, reset_after } = outcome {
            self.redirect_url = Some(url.clone());
            self.redirect_seconds = reset_after.as_secs();
        }
        self
    }
}

/// Status code for a submission that did not reach the payment page.
const fn outcome_status(outcome: &SubmissionOutcome) -> StatusCode {
    match outcome {
        SubmissionOutcome::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SubmissionOutcome::AlreadySubmitting => StatusCode::CONFLICT,
        SubmissionOutcome::CartEmpty
        | SubmissionOutcome::Redirect { .. }
        | SubmissionOutcome::Failed => StatusCode::OK,
    }
}

fn render_outcome(
    summary: &CartSummary,
    submission: &CheckoutSubmission,
    outcome: &SubmissionOutcome,
) -> Response {
    (
        outcome_status(outcome),
        CheckoutShowTemplate::new(summary, submission).with_outcome(outcome),
    )
        .into_response()
}

/// Display the checkout page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let cart = load_cart(&session).await?;
    let submission = load_draft(&state, &session).await?;

    Ok(CheckoutShowTemplate::new(
        &summarize(&state, &cart),
        &submission,
    ))
}

/// Sanitize, validate and store one field; returns its input fragment.
#[instrument(skip(state, session, form), fields(field = %form.field))]
pub async fn field(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<FieldForm>,
) -> Result<impl IntoResponse> {
    let variant = state.config().checkout_variant;
    let field: CheckoutField = form
        .field
        .parse()
        .map_err(|e: UnknownField| AppError::BadRequest(e.to_string()))?;
    if !variant.fields().contains(&field) {
        return Err(AppError::BadRequest(format!(
            "field '{field}' is not part of this form"
        )));
    }

    let mut submission = load_draft(&state, &session).await?;

    // The form is frozen while a payment call is in flight
    if !submission.is_loading() {
        submission.apply(FormEvent::Changed {
            field,
            value: form.value,
        });
        save_checkout(&session, &submission).await?;
    }

    Ok(FieldTemplate {
        field: FieldView::checkout(field, submission.form()),
    })
}

/// Submit the checkout form.
///
/// Posted values go through the same sanitize/validate path as single-field
/// edits before the whole form is checked. Only a valid form with a
/// non-empty cart reaches the payment gateway.
#[instrument(skip(state, session, fields))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let variant = state.config().checkout_variant;
    let cart = load_cart(&session).await?;
    let summary = summarize(&state, &cart);
    let mut submission = load_draft(&state, &session).await?;

    if submission.is_loading() {
        tracing::info!("checkout already in flight");
        return Ok(render_outcome(
            &summary,
            &submission,
            &SubmissionOutcome::AlreadySubmitting,
        ));
    }

    // A new session gets its id on first save
    if session.id().is_none() {
        session.save().await?;
    }
    let id = session
        .id()
        .ok_or_else(|| AppError::Internal("session has no id after save".to_string()))?;
    let Some(slot) = state.in_flight_payments().begin(id) else {
        tracing::info!("checkout already in flight");
        return Ok(render_outcome(
            &summary,
            &submission,
            &SubmissionOutcome::AlreadySubmitting,
        ));
    };

    let shown = variant.fields();
    for (name, value) in fields {
        match name.parse::<CheckoutField>() {
            Ok(field) if shown.contains(&field) => {
                submission.apply(FormEvent::Changed { field, value });
            }
            _ => tracing::debug!(name = %name, "ignoring unexpected form field"),
        }
    }

    let pending = match submission.prepare(&summary, &state.config().phone_calling_code) {
        Ok(pending) => pending,
        Err(outcome) => {
            save_checkout(&session, &submission).await?;
            return Ok(render_outcome(&summary, &submission, &outcome));
        }
    };

    // Persist the in-flight phase so the page shows it from other tabs
    save_checkout(&session, &submission).await?;
    session.save().await?;

    add_breadcrumb("checkout", "Payment initiated", None);

    let in_flight = submission.clone();
    let timeout = state.config().stripe.timeout;
    let task_state = state.clone();
    let task_session = session.clone();
    let task = tokio::spawn(async move {
        let _slot = slot;
        let result = tokio::time::timeout(timeout, pending.send(task_state.payments()))
            .await
            .unwrap_or_else(|_| {
                Err(PaymentError::Unavailable(format!(
                    "no answer after {} ms",
                    timeout.as_millis()
                )))
            });
        let outcome = submission.finish(result);
        if !store_checkout_result(&task_session, &in_flight, &submission).await? {
            tracing::info!("checkout draft changed during payment call, result not stored");
        }
        Ok::<_, tower_sessions::session::Error>((submission, outcome))
    });

    let (submission, outcome) = task
        .await
        .map_err(|e| AppError::Internal(format!("checkout task failed: {e}")))??;

    Ok(render_outcome(&summary, &submission, &outcome))
}

/// Load this visitor's checkout draft.
async fn load_draft(
    state: &AppState,
    session: &Session,
) -> std::result::Result<CheckoutSubmission, tower_sessions::session::Error> {
    load_checkout(
        session,
        state.config().checkout_variant,
        state.in_flight_payments(),
    )
    .await
}

/// Order confirmation after Stripe redirects back.
///
/// Clears the cart and the checkout draft, shows the Stripe session id as
/// the order number, then sends the visitor home.
#[instrument(skip(session, query, nonce))]
pub async fn success(
    session: Session,
    Query(query): Query<SuccessQuery>,
    CspNonce(nonce): CspNonce,
) -> Result<Response> {
    let Some(order_number) = query
        .session_id
        .map(|id| id.trim().to_owned())
        .filter(|id| !id.is_empty())
    else {
        return Ok(Redirect::to("/").into_response());
    };

    clear_order(&session).await?;
    tracing::info!(order_number = %order_number, "order confirmed");

    Ok(CheckoutSuccessTemplate {
        order_number,
        redirect_seconds: SUCCESS_REDIRECT_SECONDS,
        nonce,
    }
    .into_response())
}
