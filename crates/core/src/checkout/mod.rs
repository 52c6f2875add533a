//! The checkout form: fields, sanitizing, validation, form state and
//! submission to the payment provider.

mod customer;
mod field;
mod form;
mod sanitize;
mod submission;
mod validate;

pub use customer::{Address, CustomerRecord};
pub use field::{CheckoutField, FormVariant, UnknownField};
pub use form::{FormData, FormErrors, FormEvent, FormState, validate_form};
pub use sanitize::sanitize;
pub use submission::{
    Banner, CheckoutPhase, CheckoutRedirect, CheckoutSubmission, PaymentError, PaymentGateway,
    PendingCheckout, REDIRECT_DELAY, SubmissionOutcome,
};
pub use validate::{
    MIN_NAME_LENGTH, POSTAL_CODE_LENGTH, ValidationError, is_name_char, is_postal_code_char,
    validate_field,
};
