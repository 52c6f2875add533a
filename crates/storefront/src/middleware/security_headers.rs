//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to all responses. The page only talks
//! to its own origin; the browser leaves for Stripe through a top-level
//! navigation, which CSP does not restrict.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;

/// Build the CSP header value, allowing inline scripts that carry `nonce`.
#[must_use]
pub fn content_security_policy(nonce: Option<&CspNonce>) -> String {
    let script_src = nonce.map_or_else(
        || "script-src 'self'".to_string(),
        |n| format!("script-src 'self' {}", n.source()),
    );

    format!(
        "default-src 'none'; \
         {script_src}; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' data:; \
         connect-src 'self'; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: same-origin` (Stripe needs no referrer)
/// - `Content-Security-Policy` with the request's nonce
/// - `Permissions-Policy` denying sensitive features
/// - `Cache-Control: no-store` on pages (static assets keep their own)
/// - `Cross-Origin-Opener-Policy` / `Cross-Origin-Resource-Policy: same-origin`
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let is_static = request.uri().path().starts_with("/static/");
    let mut response = next.run(request).await;

    let csp = content_security_policy(response.extensions().get::<CspNonce>());
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("same-origin"));

    if let Ok(value) = HeaderValue::from_str(&csp) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             microphone=(), \
             payment=(), \
             usb=()",
        ),
    );

    if !is_static {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}
