//! Session-held visitor state.
//!
//! Each visitor's cart and checkout draft live in their session. Handlers
//! load, update and store back; the session layer writes the whole record
//! at the end of the request. The payment call outlives its request, so it
//! reloads the record before storing its result and only touches the
//! checkout draft.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use mama_foods_core::Cart;
use mama_foods_core::checkout::{CheckoutSubmission, FormVariant};
use tower_sessions::Session;
use tower_sessions::session::Id;

/// Session keys.
pub mod keys {
    /// Key for the cart lines.
    pub const CART: &str = "cart";

    /// Key for the checkout form state and submission phase.
    pub const CHECKOUT: &str = "checkout";
}

/// Load the visitor's cart, empty if none yet.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    Ok(session.get::<Cart>(keys::CART).await?.unwrap_or_default())
}

/// Store the visitor's cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART, cart).await
}

/// Load the checkout draft.
///
/// A draft saved for another form variant (after a configuration change) is
/// discarded. A paid draft starts over. A draft left submitting with no
/// payment call running for this session is interrupted so it can be sent
/// again.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_checkout(
    session: &Session,
    variant: FormVariant,
    payments: &InFlightPayments,
) -> Result<CheckoutSubmission, tower_sessions::session::Error> {
    let stored = session.get::<CheckoutSubmission>(keys::CHECKOUT).await?;
    let mut submission = stored
        .filter(|submission| submission.form().variant == variant)
        .unwrap_or_else(|| CheckoutSubmission::new(variant));

    submission.settle();
    if submission.is_loading() && !session.id().is_some_and(|id| payments.contains(id)) {
        submission.interrupt();
    }
    Ok(submission)
}

/// Store the checkout draft.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_checkout(
    session: &Session,
    submission: &CheckoutSubmission,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CHECKOUT, submission).await
}

/// Forget the cart and the checkout draft once an order is paid.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_order(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove_value(keys::CART).await?;
    session.remove_value(keys::CHECKOUT).await?;
    Ok(())
}

/// Store the result of a payment call over the draft that was sent.
///
/// Reloads the record first so writes made while the call ran are kept.
/// Returns `false` without writing if the stored draft is no longer
/// `in_flight`, e.g. after the success page cleared it.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn store_checkout_result(
    session: &Session,
    in_flight: &CheckoutSubmission,
    finished: &CheckoutSubmission,
) -> Result<bool, tower_sessions::session::Error> {
    session.load().await?;

    let stored = session.get::<CheckoutSubmission>(keys::CHECKOUT).await?;
    if stored.as_ref() != Some(in_flight) {
        return Ok(false);
    }

    save_checkout(session, finished).await?;
    session.save().await?;
    Ok(true)
}

/// Sessions whose payment call is running in this process.
#[derive(Debug, Clone, Default)]
pub struct InFlightPayments {
    running: Arc<Mutex<HashSet<Id>>>,
}

impl InFlightPayments {
    /// Claim the payment slot of a session.
    ///
    /// Returns `None` if a call is already running for it. The slot is
    /// released when the returned guard is dropped.
    #[must_use]
    pub fn begin(&self, id: Id) -> Option<PaymentSlot> {
        let inserted = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);

        inserted.then(|| PaymentSlot {
            payments: self.clone(),
            id,
        })
    }

    /// Whether a payment call is running for this session.
    #[must_use]
    pub fn contains(&self, id: Id) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }
}

/// A claimed payment slot; see [`InFlightPayments::begin`].
#[derive(Debug)]
pub struct PaymentSlot {
    payments: InFlightPayments,
    id: Id,
}

impl Drop for PaymentSlot {
    fn drop(&mut self) {
        self.payments
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}
