//! EmailJS REST client for the contact form.
//!
//! EmailJS renders the hosted template and mails it to the restaurant.
//! Server-side calls require "API access from non-browser applications"
//! to be enabled in the EmailJS account.

use std::time::Duration;

use async_trait::async_trait;
use mama_foods_core::contact::{MessagingError, MessagingService, TemplateSubmission};
use serde::Serialize;
use thiserror::Error;

use crate::config::EmailJsConfig;

/// Longest wait for an EmailJS answer.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest wait for a TCP/TLS connection to EmailJS.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur when interacting with the EmailJS API.
#[derive(Debug, Error)]
pub enum EmailJsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl From<EmailJsError> for MessagingError {
    fn from(err: EmailJsError) -> Self {
        match err {
            EmailJsError::Http(e) => Self::Unavailable(e.to_string()),
            EmailJsError::Api { status, message } => Self::Rejected { status, message },
        }
    }
}

/// Request body of `POST /api/v1.0/email/send`.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: &'a std::collections::BTreeMap<String, String>,
}

impl<'a> From<&'a TemplateSubmission> for SendRequest<'a> {
    fn from(submission: &'a TemplateSubmission) -> Self {
        Self {
            service_id: &submission.service_id,
            template_id: &submission.template_id,
            user_id: &submission.public_key,
            template_params: &submission.fields,
        }
    }
}

/// EmailJS API client.
#[derive(Clone)]
pub struct EmailJsClient {
    client: reqwest::Client,
    api_base: String,
}

impl EmailJsClient {
    /// Create a new EmailJS client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &EmailJsConfig) -> Result<Self, EmailJsError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Send one templated email.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or EmailJS answers with a non-2xx
    /// status.
    pub async fn send(&self, submission: &TemplateSubmission) -> Result<(), EmailJsError> {
        let url = format!("{}/api/v1.0/email/send", self.api_base);

        let response = self
            .client
            .post(&url)
            .json(&SendRequest::from(submission))
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailJsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl MessagingService for EmailJsClient {
    async fn send_form(&self, submission: &TemplateSubmission) -> Result<(), MessagingError> {
        Ok(self.send(submission).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_send_request_shape() {
        let submission = TemplateSubmission {
            service_id: "service_alseuoi".to_string(),
            template_id: "template_4y6qli9".to_string(),
            public_key: "VBmtMMPVU3-HxWlVP".to_string(),
            fields: BTreeMap::from([("firstname".to_string(), "Awa".to_string())]),
        };

        let json = serde_json::to_value(SendRequest::from(&submission)).unwrap();
        assert_eq!(json["service_id"], "service_alseuoi");
        assert_eq!(json["user_id"], "VBmtMMPVU3-HxWlVP");
        assert_eq!(json["template_params"]["firstname"], "Awa");
    }

    #[test]
    fn test_api_error_maps_to_rejected() {
        let err: MessagingError = EmailJsError::Api {
            status: 403,
            message: "API calls are disabled for non-browser applications".to_string(),
        }
        .into();
        assert!(matches!(err, MessagingError::Rejected { status: 403, .. }));
    }
}
