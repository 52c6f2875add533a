//! Mama Food's Core - Ordering logic shared by the storefront.
//!
//! # Architecture
//!
//! The core crate holds the rules of the site (menu, cart pricing, checkout
//! form validation, submission flow) and the traits the storefront
//! implements for external services. No HTTP clients and no sessions live
//! here, so every rule is testable with in-memory fakes.
//!
//! # Modules
//!
//! - [`types`] - Validated newtypes for emails, phone numbers and prices
//! - [`menu`] - The restaurant's dishes
//! - [`cart`] - Cart lines, pricing rules and the cart summary
//! - [`checkout`] - Checkout form state, validators and submission
//! - [`contact`] - Contact form and the messaging collaborator

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod contact;
pub mod menu;
pub mod types;

pub use cart::{Cart, CartLine, CartProvider, CartSummary, CartSummaryItem, PricingRules};
pub use menu::{Menu, MenuCategory, MenuItem};
pub use types::*;
