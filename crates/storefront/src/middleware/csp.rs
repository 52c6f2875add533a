//! Per-request CSP nonce.
//!
//! The nonce is generated before the handler runs, rendered on the few
//! inline `<script>` tags (redirect countdowns), and added to the
//! `script-src` directive by the security headers middleware.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// A 128-bit random nonce, base64-encoded.
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    /// Generate a new random nonce.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    /// Get the nonce value for use in templates.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }

    /// The CSP source expression, e.g. `'nonce-abc=='`.
    #[must_use]
    pub fn source(&self) -> String {
        format!("'nonce-{}'", self.0)
    }
}

/// Middleware that generates a CSP nonce and stores it in request extensions.
///
/// Runs inside `security_headers_middleware`, which reads the nonce back
/// from the response extensions.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    let nonce = CspNonce::generate();
    request.extensions_mut().insert(nonce.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(nonce);
    response
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!(
                "CSP nonce not found in request extensions - middleware may be misconfigured"
            );
            Self(String::new())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonces_are_unique_and_base64() {
        let a = CspNonce::generate();
        let b = CspNonce::generate();
        assert_ne!(a.value(), b.value());
        assert_eq!(a.value().len(), 24);
        assert!(a.source().starts_with("'nonce-"));
    }
}
