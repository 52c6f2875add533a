//! Display data handed to templates.

use mama_foods_core::checkout::{Banner, CheckoutField, FormState};
use mama_foods_core::contact::{ContactError, ContactField, ContactForm, ContactOutcome};
use mama_foods_core::{CartSummary, CartSummaryItem, MenuItem, Price};
use rust_decimal::Decimal;

/// Cart line display data.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    /// `None` when delivery is free.
    pub delivery: Option<String>,
    /// `None` when no discount applies.
    pub discount: Option<String>,
    pub total: String,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }
}

impl From<&CartSummaryItem> for CartItemView {
    fn from(item: &CartSummaryItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            price: Price::new(item.unit_price, mama_foods_core::CurrencyCode::EUR).to_string(),
            line_price: Price::new(item.line_total(), mama_foods_core::CurrencyCode::EUR)
                .to_string(),
        }
    }
}

impl From<&CartSummary> for CartView {
    fn from(summary: &CartSummary) -> Self {
        let nonzero = |amount: Decimal, price: Price| {
            (amount > Decimal::ZERO).then(|| price.to_string())
        };

        Self {
            items: summary.items.iter().map(CartItemView::from).collect(),
            item_count: summary.total_items,
            subtotal: summary.subtotal_price().to_string(),
            delivery: nonzero(summary.delivery, summary.delivery_price()),
            discount: nonzero(summary.discount, summary.discount_price()),
            total: summary.total_price().to_string(),
        }
    }
}

/// Menu entry display data.
#[derive(Clone)]
pub struct MenuItemView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
}

impl From<&MenuItem> for MenuItemView {
    fn from(item: &MenuItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price.to_string(),
        }
    }
}

/// One input of a form with its current value and error.
#[derive(Clone)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub input_type: &'static str,
    pub max_length: usize,
    pub required: bool,
    pub value: String,
    pub error: Option<String>,
}

impl FieldView {
    /// Checkout input for `field` as it stands in `state`.
    #[must_use]
    pub fn checkout(field: CheckoutField, state: &FormState) -> Self {
        Self {
            name: field.name(),
            label: field.label(),
            placeholder: field.placeholder(),
            input_type: field.input_type(),
            max_length: field.max_length(),
            required: field.is_required(),
            value: state.value(field).to_string(),
            error: state.error(field).map(ToString::to_string),
        }
    }

    /// Contact form input.
    #[must_use]
    pub fn contact(field: ContactField, form: &ContactForm, error: Option<&ContactError>) -> Self {
        Self {
            name: field.name(),
            label: field.label(),
            placeholder: field.placeholder(),
            input_type: match field {
                ContactField::Email => "email",
                ContactField::Phone => "tel",
                ContactField::Message => "textarea",
                _ => "text",
            },
            max_length: match field {
                ContactField::Message => 2000,
                ContactField::Subject => 120,
                _ => 100,
            },
            required: field != ContactField::Phone,
            value: form.value(field).to_string(),
            error: error.map(ToString::to_string),
        }
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Status message shown above a form.
#[derive(Clone, Copy)]
pub struct BannerView {
    pub message: &'static str,
    pub is_error: bool,
}

impl From<Banner> for BannerView {
    fn from(banner: Banner) -> Self {
        Self {
            message: banner.message(),
            is_error: banner.is_error(),
        }
    }
}

impl BannerView {
    /// Banner for a contact form result, if it has one.
    #[must_use]
    pub fn contact(outcome: &ContactOutcome) -> Option<Self> {
        outcome.message().map(|message| Self {
            message,
            is_error: !matches!(outcome, ContactOutcome::Sent),
        })
    }
}
