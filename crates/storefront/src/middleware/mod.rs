//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with `request_id` field)
//! 3. Request ID (record on span, echo in response)
//! 4. Security headers (CSP with nonce, framing, isolation)
//! 5. CSP nonce (generate per-request nonce)
//! 6. Session layer (tower-sessions, in-memory store)
//! 7. Rate limiting (governor) on POST routes

pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::{api_rate_limiter, form_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
