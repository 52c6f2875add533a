//! Contact page route handlers.
//!
//! The contact form is validated here and relayed through `EmailJS`; the
//! visitor sees the result as a banner above the form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mama_foods_core::contact::{ContactField, ContactForm, ContactOutcome, send_contact};
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::filters;
use crate::models::views::{BannerView, FieldView};
use crate::state::AppState;

/// A way to reach the restaurant.
#[derive(Clone)]
pub struct ContactMethod {
    pub title: &'static str,
    pub value: &'static str,
    /// `tel:` / `mailto:` / map link, if any.
    pub href: Option<&'static str>,
}

/// Restaurant contact details.
pub const CONTACT_METHODS: [ContactMethod; 4] = [
    ContactMethod {
        title: "Téléphone",
        value: "+33 6 41 92 48 03",
        href: Some("tel:+33641924803"),
    },
    ContactMethod {
        title: "Email",
        value: "mamafood.s@yahoo.com",
        href: Some("mailto:mamafood.s@yahoo.com"),
    },
    ContactMethod {
        title: "Adresse",
        value: "40 Rue de Thermes, 62100 Calais, France",
        href: Some("https://maps.google.com/?q=40+Rue+de+Thermes+62100+Calais"),
    },
    ContactMethod {
        title: "Horaires",
        value: "Lun-Dim: 10h-23h",
        href: None,
    },
];

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub methods: Vec<ContactMethod>,
    pub fields: Vec<FieldView>,
    pub banner: Option<BannerView>,
}

impl ContactTemplate {
    fn new(form: &ContactForm, outcome: Option<&ContactOutcome>) -> Self {
        let errors = match outcome {
            Some(ContactOutcome::Invalid(errors)) => Some(errors),
            _ => None,
        };

        Self {
            methods: CONTACT_METHODS.to_vec(),
            fields: ContactField::ALL
                .into_iter()
                .map(|field| {
                    FieldView::contact(field, form, errors.and_then(|errors| errors.get(&field)))
                })
                .collect(),
            banner: outcome.and_then(BannerView::contact),
        }
    }
}

/// Display the contact page.
#[instrument]
pub async fn show() -> impl IntoResponse {
    ContactTemplate::new(&ContactForm::default(), None)
}

/// Send the contact form.
///
/// A sent message clears the form; a failed one keeps what was typed.
#[instrument(skip(state, form), fields(subject = %form.subject))]
pub async fn submit(State(state): State<AppState>, Form(form): Form<ContactForm>) -> Response {
    let outcome = send_contact(
        &form,
        &state.config().emailjs.template(),
        state.messaging(),
    )
    .await;

    match &outcome {
        ContactOutcome::Invalid(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ContactTemplate::new(&form, Some(&outcome)),
        )
            .into_response(),
        ContactOutcome::Sent => {
            add_breadcrumb("contact", "Message sent", None);
            ContactTemplate::new(&ContactForm::default(), Some(&outcome)).into_response()
        }
        ContactOutcome::Failed => ContactTemplate::new(&form, Some(&outcome)).into_response(),
    }
}
