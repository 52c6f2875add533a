//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /about                  - About page
//! GET  /menu                   - Menu with add-to-cart buttons
//!
//! # Contact
//! GET  /contact                - Contact page
//! POST /contact                - Send the contact form
//!
//! # Cart (fragments when `HX-Request` is set, redirects otherwise)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add a dish (returns count badge, triggers cart-updated)
//! POST /cart/update            - Set a quantity, 0 removes (returns cart_items fragment)
//! POST /cart/remove            - Remove a dish (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Checkout page (cart summary + form)
//! POST /checkout/field         - Sanitize and validate one field (fragment)
//! POST /checkout               - Submit: validate, pay, redirect to Stripe
//! GET  /success                - Post-payment confirmation
//! ```

pub mod cart;
pub mod checkout;
pub mod contact;
pub mod home;
pub mod pages;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, form_rate_limiter};
use crate::state::AppState;

/// Header set by the page script on requests that expect a fragment.
pub const FRAGMENT_REQUEST_HEADER: &str = "HX-Request";

/// Whether the request was made by the page script rather than a plain form.
#[must_use]
pub fn is_fragment_request(headers: &HeaderMap) -> bool {
    headers
        .get(FRAGMENT_REQUEST_HEADER)
        .is_some_and(|value| value == "true")
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .layer(api_rate_limiter());

    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .merge(mutations)
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    let field = Router::new()
        .route("/field", post(checkout::field))
        .layer(api_rate_limiter());

    let submit = Router::new()
        .route("/", post(checkout::submit))
        .layer(form_rate_limiter());

    Router::new()
        .route("/", get(checkout::show))
        .merge(field)
        .merge(submit)
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let contact_submit = Router::new()
        .route("/contact", post(contact::submit))
        .layer(form_rate_limiter());

    Router::new()
        .route("/", get(home::home))
        .route("/about", get(pages::about))
        .route("/menu", get(pages::menu))
        .route("/contact", get(contact::show))
        .merge(contact_submit)
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/success", get(checkout::success))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_is_fragment_request() {
        let mut headers = HeaderMap::new();
        assert!(!is_fragment_request(&headers));

        headers.insert(FRAGMENT_REQUEST_HEADER, HeaderValue::from_static("true"));
        assert!(is_fragment_request(&headers));
    }
}
