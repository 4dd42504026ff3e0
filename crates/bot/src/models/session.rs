//! Per-conversation state.
//!
//! A [`Session`] is created fresh for every customer and lives in the
//! in-memory session cache. Each part of the conversation owns a named
//! section so handlers never guess at loosely typed keys.

use chrono::NaiveDate;

use hearty_house_core::cart::Cart;
use hearty_house_core::menu::MenuItem;
use hearty_house_core::period::OrderPeriod;
use hearty_house_core::schedule::PrepTime;
use hearty_house_core::{DeliveryType, PaymentMethod, Phone, Price};

/// Keyword that aborts whatever the user is doing.
pub const CANCEL_KEYWORD: &str = "cancel";

/// Where the customer is in the conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Step {
    /// Browsing categories and the cart.
    #[default]
    Browsing,
    /// Waiting for a shared contact.
    AwaitingPhone,
    ChoosingDeliveryType,
    ChoosingAddress,
    EnteringAddress,
    ChoosingPrepTime,
    ChoosingPaymentMethod,
    EnteringCashAmount,
    EnteringComment,
    /// Somewhere on the staff surface.
    Admin(AdminStep),
}

impl Step {
    /// Whether a checkout is in progress.
    #[must_use]
    pub const fn in_checkout(self) -> bool {
        matches!(
            self,
            Self::ChoosingDeliveryType
                | Self::ChoosingAddress
                | Self::EnteringAddress
                | Self::ChoosingPrepTime
                | Self::ChoosingPaymentMethod
                | Self::EnteringCashAmount
                | Self::EnteringComment
        )
    }
}

/// Staff-side steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminStep {
    Panel,
    EnteringCategoryName,
    ChoosingCategoryToDelete,
    ChoosingItemCategory,
    EnteringNewItemCategory,
    EnteringItemName,
    EnteringItemPrice,
    EnteringItemDescription,
    ChoosingDeleteItemCategory,
    EnteringDeleteItemIndex,
    ReviewingOrders,
    EnteringDateFrom,
    EnteringDateTo,
    EnteringBroadcast,
}

/// The category page the customer has open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Browsing {
    pub category: String,
    /// Items as rendered, so `add:{i}` resolves against what was shown.
    pub items: Vec<MenuItem>,
}

/// Answers collected during checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutDraft {
    pub delivery_type: Option<DeliveryType>,
    pub delivery_address: Option<String>,
    /// Saved addresses offered as buttons, in button order.
    pub offered_addresses: Vec<String>,
    pub prep_time: Option<PrepTime>,
    pub delivery_cost: Price,
    pub payment_method: PaymentMethod,
    pub cash_amount: Option<Price>,
}

/// Item being assembled by the add-item wizard, plus index snapshots for
/// category buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminDraft {
    /// Category names in button order.
    pub categories: Vec<String>,
    pub category: Option<String>,
    pub item_name: Option<String>,
    pub item_price: Option<Price>,
}

/// Order review filter and position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewState {
    pub period: Option<OrderPeriod>,
    /// First date of a range being typed.
    pub date_from: Option<NaiveDate>,
    pub page: usize,
}

/// Everything the bot remembers about one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub step: Step,
    /// Cached from the users table.
    pub phone: Option<Phone>,
    pub cart: Cart,
    /// Category names in the order their buttons were rendered.
    pub shown_categories: Vec<String>,
    pub browsing: Option<Browsing>,
    pub draft: CheckoutDraft,
    pub admin: AdminDraft,
    pub review: ReviewState,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the checkout draft and go back to browsing. The cart survives.
    pub fn abandon_checkout(&mut self) {
        self.draft = CheckoutDraft::default();
        self.step = Step::Browsing;
    }

    /// Forget everything except the cached phone.
    pub fn reset(&mut self) {
        let phone = self.phone.take();
        *self = Self {
            phone,
            ..Self::default()
        };
    }

    /// Leave any staff wizard, back to the panel.
    pub fn reset_admin(&mut self) {
        self.admin = AdminDraft::default();
        self.step = Step::Admin(AdminStep::Panel);
    }
}

/// Whether `text` is the cancel keyword or command.
#[must_use]
pub fn is_cancel(text: &str) -> bool {
    let text = text.trim();
    let text = text.strip_prefix('/').unwrap_or(text);
    text.eq_ignore_ascii_case(CANCEL_KEYWORD)
}
