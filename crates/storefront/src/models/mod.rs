//! View models and session state for storefront.

pub mod session;
pub mod views;
