//! Order log records.

use chrono::NaiveDateTime;

use hearty_house_core::schedule::PrepTime;
use hearty_house_core::{DeliveryType, OrderId, PaymentMethod, Price, UserId};

/// A submitted order as stored.
///
/// Orders written by older revisions lack most metadata, so everything beyond
/// the text and timestamp is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    /// HTML body listing items by category.
    pub order_text: String,
    /// Local time the order was placed.
    pub created_at: NaiveDateTime,
    pub phone: Option<String>,
    pub delivery_type: Option<DeliveryType>,
    pub delivery_address: Option<String>,
    pub username: Option<String>,
    pub comment: Option<String>,
    pub prep_time: Option<PrepTime>,
    pub delivery_cost: Price,
    pub payment_method: PaymentMethod,
    pub cash_amount: Option<Price>,
    pub user_id: Option<UserId>,
    pub subtotal: Option<Price>,
    pub total: Option<Price>,
}

/// An order about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_text: String,
    pub created_at: NaiveDateTime,
    pub phone: String,
    pub delivery_type: DeliveryType,
    pub delivery_address: String,
    pub username: Option<String>,
    pub comment: String,
    pub prep_time: PrepTime,
    pub subtotal: Price,
    pub delivery_cost: Price,
    pub payment_method: PaymentMethod,
    pub cash_amount: Option<Price>,
    pub user_id: UserId,
}

impl NewOrder {
    /// Subtotal plus delivery.
    #[must_use]
    pub fn total(&self) -> Price {
        self.subtotal + self.delivery_cost
    }
}
