//! Shopping cart and the read-only summary the checkout consumes.
//!
//! The [`Cart`] is the mutable, session-held list of dish ids and quantities.
//! The checkout never touches it directly: it reads a [`CartSummary`]
//! snapshot through the [`CartProvider`] port.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::menu::Menu;
use crate::types::{CurrencyCode, Price};

/// Upper bound on a single line's quantity.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// One line of the cart: a dish and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: String,
    pub quantity: u32,
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add `quantity` of a dish, merging with an existing line.
    pub fn add(&mut self, item_id: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.lines.iter_mut().find(|line| line.item_id == item_id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY);
            }
            None => self.lines.push(CartLine {
                item_id: item_id.to_owned(),
                quantity: quantity.min(MAX_LINE_QUANTITY),
            }),
        }
    }

    /// Set a line's quantity. Zero removes the line.
    pub fn set_quantity(&mut self, item_id: &str, quantity: u32) {
        if quantity == 0 {
            self.remove(item_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|line| line.item_id == item_id) {
            line.quantity = quantity.min(MAX_LINE_QUANTITY);
        }
    }

    /// Remove a line.
    pub fn remove(&mut self, item_id: &str) {
        self.lines.retain(|line| line.item_id != item_id);
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Price the cart against the menu.
    ///
    /// Lines whose dish is no longer on the menu are skipped.
    #[must_use]
    pub fn summarize(&self, menu: &Menu, pricing: &PricingRules) -> CartSummary {
        let items: Vec<CartSummaryItem> = self
            .lines
            .iter()
            .filter_map(|line| match menu.get(&line.item_id) {
                Some(item) => Some(CartSummaryItem {
                    id: item.id.clone(),
                    name: item.name.clone(),
                    quantity: line.quantity,
                    unit_price: item.price.amount,
                }),
                None => {
                    tracing::warn!(item_id = %line.item_id, "cart line references unknown dish");
                    None
                }
            })
            .collect();

        let total_items = items.iter().map(|item| item.quantity).sum();
        let subtotal: Decimal = items.iter().map(CartSummaryItem::line_total).sum();
        let delivery = if items.is_empty() {
            Decimal::ZERO
        } else {
            pricing.delivery_for(subtotal)
        };
        let discount = (subtotal * pricing.discount_rate).round_dp(2);

        CartSummary::new(items, total_items, subtotal, delivery, discount)
    }
}

/// Delivery fee and promotion settings used to price a cart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PricingRules {
    /// Flat delivery fee.
    pub delivery_fee: Decimal,
    /// Subtotal from which delivery is free.
    pub free_delivery_threshold: Option<Decimal>,
    /// Fraction of the subtotal taken off, e.g. `0.10` for 10%.
    pub discount_rate: Decimal,
}

impl PricingRules {
    fn delivery_for(&self, subtotal: Decimal) -> Decimal {
        match self.free_delivery_threshold {
            Some(threshold) if subtotal >= threshold => Decimal::ZERO,
            _ => self.delivery_fee,
        }
    }
}

/// A priced line of the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummaryItem {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl CartSummaryItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Read-only snapshot of the cart handed to the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub total_items: u32,
    pub items: Vec<CartSummaryItem>,
    pub subtotal: Decimal,
    pub delivery: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub currency: CurrencyCode,
}

impl CartSummary {
    /// Assemble a summary; the total is `subtotal + delivery - discount`,
    /// never below zero.
    #[must_use]
    pub fn new(
        items: Vec<CartSummaryItem>,
        total_items: u32,
        subtotal: Decimal,
        delivery: Decimal,
        discount: Decimal,
    ) -> Self {
        let total = (subtotal + delivery - discount).max(Decimal::ZERO);
        Self {
            total_items,
            items,
            subtotal,
            delivery,
            discount,
            total,
            currency: CurrencyCode::EUR,
        }
    }

    /// A summary with nothing in it.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_items == 0
    }

    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::new(self.total, self.currency)
    }

    #[must_use]
    pub const fn delivery_price(&self) -> Price {
        Price::new(self.delivery, self.currency)
    }

    #[must_use]
    pub const fn discount_price(&self) -> Price {
        Price::new(self.discount, self.currency)
    }

    #[must_use]
    pub const fn subtotal_price(&self) -> Price {
        Price::new(self.subtotal, self.currency)
    }
}

/// Source of the current cart summary.
pub trait CartProvider: Send + Sync {
    /// Snapshot of the cart at this moment.
    fn cart_summary(&self) -> CartSummary;
}

impl CartProvider for CartSummary {
    fn cart_summary(&self) -> CartSummary {
        self.clone()
    }
}
