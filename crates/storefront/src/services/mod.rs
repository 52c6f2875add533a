//! Clients for the external services behind the storefront.
//!
//! # Services
//!
//! - `stripe` - Stripe Checkout Sessions (implements `PaymentGateway`)
//! - `emailjs` - EmailJS template mail (implements `MessagingService`)

pub mod emailjs;
pub mod stripe;

pub use emailjs::{EmailJsClient, EmailJsError};
pub use stripe::{StripeClient, StripeError};
