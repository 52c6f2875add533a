//! Core types for Mama Food's.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod phone;
pub mod price;

pub use email::{Email, EmailError};
pub use phone::{PhoneError, PhoneKind, PhoneNumber};
pub use price::{CurrencyCode, Price};
