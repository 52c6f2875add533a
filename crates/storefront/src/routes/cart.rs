//! Cart route handlers.
//!
//! The cart lives in the session as a list of dish ids and quantities and is
//! priced against the menu on every read. Mutations answer the page script
//! with fragments and a `cart-updated` trigger, and plain forms with a
//! redirect.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use mama_foods_core::{Cart, CartSummary, Menu, PricingRules};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::is_fragment_request;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::session::{load_cart, save_cart};
use crate::models::views::CartView;
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub item_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

impl CartCountTemplate {
    /// Badge for a cart. Dishes no longer on the menu are not counted, as on
    /// the checkout page.
    #[must_use]
    pub fn for_cart(cart: &Cart, menu: &Menu) -> Self {
        Self {
            count: cart.summarize(menu, &PricingRules::default()).total_items,
        }
    }
}

/// Price the session cart.
pub(crate) fn summarize(state: &AppState, cart: &Cart) -> CartSummary {
    cart.summarize(state.menu(), &state.pricing())
}

/// Answer a cart mutation: `fragment` for the page script, a redirect to the
/// cart page otherwise.
fn mutation_response(headers: &HeaderMap, fragment: impl IntoResponse) -> Response {
    if is_fragment_request(headers) {
        (AppendHeaders([("HX-Trigger", "cart-updated")]), fragment).into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let cart = load_cart(&session).await?;
    Ok(CartShowTemplate {
        cart: CartView::from(&summarize(&state, &cart)),
    })
}

/// Add a dish to the cart.
///
/// Unknown dishes are a 404 rather than a silent no-op.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let item = state
        .menu()
        .get(&form.item_id)
        .ok_or_else(|| AppError::NotFound(format!("dish '{}'", form.item_id)))?;

    let mut cart = load_cart(&session).await?;
    cart.add(&item.id, form.quantity.unwrap_or(1));
    save_cart(&session, &cart).await?;

    add_breadcrumb("cart", "Dish added", Some(&[("item_id", item.id.as_str())]));

    Ok(mutation_response(
        &headers,
        CartCountTemplate::for_cart(&cart, state.menu()),
    ))
}

/// Set a line's quantity; zero removes it.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await?;
    cart.set_quantity(&form.item_id, form.quantity);
    save_cart(&session, &cart).await?;

    Ok(mutation_response(
        &headers,
        CartItemsTemplate {
            cart: CartView::from(&summarize(&state, &cart)),
        },
    ))
}

/// Remove a line.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await?;
    cart.remove(&form.item_id);
    save_cart(&session, &cart).await?;

    Ok(mutation_response(
        &headers,
        CartItemsTemplate {
            cart: CartView::from(&summarize(&state, &cart)),
        },
    ))
}

/// Cart count badge.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let cart = load_cart(&session).await?;
    Ok(CartCountTemplate::for_cart(&cart, state.menu()))
}
