//! Contact form and the messaging collaborator that delivers it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::checkout::{CheckoutField, FormVariant, ValidationError, validate_field};

/// Minimum number of characters in a trimmed message body.
pub const MIN_MESSAGE_LENGTH: usize = 10;

/// Shown after the message was handed to the messaging service.
pub const SENT_MESSAGE: &str =
    "Votre message a été envoyé avec succès ! Nous vous répondrons dans les plus brefs délais.";

/// Shown when the messaging service failed.
pub const FAILED_MESSAGE: &str = "Une erreur s'est produite lors de l'envoi. Veuillez réessayer ou nous contacter directement par téléphone.";

/// A field of the contact form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactField {
    FirstName,
    LastName,
    Email,
    Phone,
    Subject,
    Message,
}

impl ContactField {
    pub const ALL: [Self; 6] = [
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::Phone,
        Self::Subject,
        Self::Message,
    ];

    /// Form name, also the template variable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstName => "firstname",
            Self::LastName => "lastname",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Subject => "subject",
            Self::Message => "message",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "Prénom *",
            Self::LastName => "Nom *",
            Self::Email => "Email *",
            Self::Phone => "Téléphone (optionnel)",
            Self::Subject => "Sujet *",
            Self::Message => "Votre message *",
        }
    }

    #[must_use]
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::FirstName => "Jean",
            Self::LastName => "Dupont",
            Self::Email => "jean.dupont@email.com",
            Self::Phone => "06 12 34 56 78",
            Self::Subject => "Ex: Demande d'information sur le menu",
            Self::Message => "Écrivez votre message ici...",
        }
    }
}

/// Why a contact form value was rejected.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactError {
    #[error("Le sujet est requis")]
    SubjectRequired,
    #[error("Le message est requis")]
    MessageRequired,
    #[error("Le message doit contenir au moins 10 caractères")]
    MessageTooShort,
    #[error("{0}")]
    Field(ValidationError),
}

/// Submitted contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    #[must_use]
    pub fn value(&self, field: ContactField) -> &str {
        match field {
            ContactField::FirstName => &self.firstname,
            ContactField::LastName => &self.lastname,
            ContactField::Email => &self.email,
            ContactField::Phone => &self.phone,
            ContactField::Subject => &self.subject,
            ContactField::Message => &self.message,
        }
    }

    /// Check every field. Names and email follow the checkout rules; the
    /// phone is optional but must be well-formed when given.
    #[must_use]
    pub fn validate(&self) -> BTreeMap<ContactField, ContactError> {
        let checkout = |field, value| {
            validate_field(field, value, FormVariant::Delivery).map(ContactError::Field)
        };

        ContactField::ALL
            .into_iter()
            .filter_map(|field| {
                let value = self.value(field);
                let error = match field {
                    ContactField::FirstName => checkout(CheckoutField::FirstName, value),
                    ContactField::LastName => checkout(CheckoutField::LastName, value),
                    ContactField::Email => checkout(CheckoutField::Email, value.trim()),
                    ContactField::Phone if value.trim().is_empty() => None,
                    ContactField::Phone => checkout(CheckoutField::Phone, value),
                    ContactField::Subject => value
                        .trim()
                        .is_empty()
                        .then_some(ContactError::SubjectRequired),
                    ContactField::Message => validate_message(value),
                };
                error.map(|e| (field, e))
            })
            .collect()
    }

    /// Template variables, one per field, trimmed.
    #[must_use]
    pub fn template_fields(&self) -> BTreeMap<String, String> {
        ContactField::ALL
            .into_iter()
            .map(|field| (field.name().to_owned(), self.value(field).trim().to_owned()))
            .collect()
    }
}

fn validate_message(value: &str) -> Option<ContactError> {
    let len = value.trim().chars().count();
    if len == 0 {
        Some(ContactError::MessageRequired)
    } else if len < MIN_MESSAGE_LENGTH {
        Some(ContactError::MessageTooShort)
    } else {
        None
    }
}

/// Identifiers of the hosted email template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

/// One message to deliver through a hosted template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateSubmission {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub fields: BTreeMap<String, String>,
}

impl TemplateSubmission {
    #[must_use]
    pub fn new(template: &EmailTemplate, fields: BTreeMap<String, String>) -> Self {
        Self {
            service_id: template.service_id.clone(),
            template_id: template.template_id.clone(),
            public_key: template.public_key.clone(),
            fields,
        }
    }
}

/// Messaging service failure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MessagingError {
    #[error("messaging service unreachable: {0}")]
    Unavailable(String),

    #[error("messaging service rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Messaging collaborator.
#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Deliver one templated message.
    async fn send_form(&self, submission: &TemplateSubmission) -> Result<(), MessagingError>;
}

/// Result of sending the contact form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactOutcome {
    Invalid(BTreeMap<ContactField, ContactError>),
    Sent,
    Failed,
}

impl ContactOutcome {
    /// Banner text, if any.
    #[must_use]
    pub const fn message(&self) -> Option<&'static str> {
        match self {
            Self::Invalid(_) => None,
            Self::Sent => Some(SENT_MESSAGE),
            Self::Failed => Some(FAILED_MESSAGE),
        }
    }
}

/// Validate the form and, if it passes, send it once.
pub async fn send_contact(
    form: &ContactForm,
    template: &EmailTemplate,
    service: &dyn MessagingService,
) -> ContactOutcome {
    let errors = form.validate();
    if !errors.is_empty() {
        return ContactOutcome::Invalid(errors);
    }

    let submission = TemplateSubmission::new(template, form.template_fields());
    match service.send_form(&submission).await {
        Ok(()) => {
            info!(subject = %form.subject.trim(), "contact message sent");
            ContactOutcome::Sent
        }
        Err(e) => {
            warn!(error = %e, "contact message failed");
            ContactOutcome::Failed
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct FakeMessaging {
        sent: Mutex<Vec<TemplateSubmission>>,
        fail: bool,
    }

    impl FakeMessaging {
        fn new(fail: bool) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl MessagingService for FakeMessaging {
        async fn send_form(&self, submission: &TemplateSubmission) -> Result<(), MessagingError> {
            self.sent.lock().unwrap().push(submission.clone());
            if self.fail {
                Err(MessagingError::Unavailable("connection refused".to_owned()))
            } else {
                Ok(())
            }
        }
    }

    fn template() -> EmailTemplate {
        EmailTemplate {
            service_id: "service_x".to_owned(),
            template_id: "template_y".to_owned(),
            public_key: "pk".to_owned(),
        }
    }

    fn valid_form() -> ContactForm {
        ContactForm {
            firstname: "Awa".to_owned(),
            lastname: "Diallo".to_owned(),
            email: "awa@example.com".to_owned(),
            phone: String::new(),
            subject: "Réservation".to_owned(),
            message: "Bonjour, une table pour six samedi ?".to_owned(),
        }
    }

    #[test]
    fn test_valid_form_has_no_errors() {
        assert!(valid_form().validate().is_empty());
    }

    #[test]
    fn test_required_fields() {
        let errors = ContactForm::default().validate();
        assert_eq!(
            errors.get(&ContactField::FirstName).unwrap().to_string(),
            "Le prénom est requis"
        );
        assert_eq!(errors.get(&ContactField::Subject), Some(&ContactError::SubjectRequired));
        assert_eq!(errors.get(&ContactField::Message), Some(&ContactError::MessageRequired));
        assert!(errors.get(&ContactField::Phone).is_none());
    }

    #[test]
    fn test_short_message_and_bad_phone() {
        let form = ContactForm {
            message: "Bonjour".to_owned(),
            phone: "12ab".to_owned(),
            ..valid_form()
        };
        let errors = form.validate();
        assert_eq!(errors.get(&ContactField::Message), Some(&ContactError::MessageTooShort));
        assert!(errors.get(&ContactField::Phone).is_some());
    }

    #[tokio::test]
    async fn test_send_contact_delivers_template_fields() {
        let service = FakeMessaging::new(false);
        let outcome = send_contact(&valid_form(), &template(), &service).await;

        assert_eq!(outcome, ContactOutcome::Sent);
        assert_eq!(outcome.message(), Some(SENT_MESSAGE));
        let sent = service.sent.lock().unwrap();
        let submission = sent.first().unwrap();
        assert_eq!(submission.service_id, "service_x");
        assert_eq!(submission.fields.get("firstname").unwrap(), "Awa");
        assert_eq!(submission.fields.len(), 6);
    }

    #[tokio::test]
    async fn test_invalid_form_is_not_sent() {
        let service = FakeMessaging::new(false);
        let outcome = send_contact(&ContactForm::default(), &template(), &service).await;

        assert!(matches!(outcome, ContactOutcome::Invalid(_)));
        assert!(service.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_service_failure_is_reported() {
        let service = FakeMessaging::new(true);
        let outcome = send_contact(&valid_form(), &template(), &service).await;
        assert_eq!(outcome, ContactOutcome::Failed);
        assert_eq!(outcome.message(), Some(FAILED_MESSAGE));
    }
}
