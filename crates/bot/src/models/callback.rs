//! Typed inline-button payloads.
//!
//! Telegram limits callback data to 64 bytes, so buttons carry indices into
//! lists remembered in the session rather than names.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use thiserror::Error;

use hearty_house_core::period::OrderPeriod;
use hearty_house_core::{DeliveryType, PaymentMethod};

const SLOT_FORMAT: &str = "%Y%m%d%H%M";

/// Callback data that matches no known button.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unrecognized callback data {0:?}")]
pub struct UnknownCallback(pub String);

/// A button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    /// Open the n-th category of the rendered list.
    Category(usize),
    /// Add the n-th item of the open category.
    AddItem(usize),
    /// Back to the category list.
    Menu,
    Cart,
    ClearCart,
    Checkout,
    DeliveryType(DeliveryType),
    /// Use the n-th offered saved address.
    SavedAddress(usize),
    NewAddress,
    Slot(NaiveDateTime),
    Asap,
    /// Card or cash.
    Payment(PaymentMethod),
    Cancel,
    Admin(AdminAction),
    Orders(OrdersAction),
}

/// Staff panel buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Panel,
    ViewMenu,
    AddCategory,
    DeleteCategory,
    DeleteCategoryPick(usize),
    AddItem,
    AddItemCategory(usize),
    AddItemNewCategory,
    DeleteItem,
    DeleteItemCategory(usize),
    ViewOrders,
    Broadcast,
}

/// Period presets offered as buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodPreset {
    Today,
    ThreeDays,
    Week,
    All,
}

impl PeriodPreset {
    #[must_use]
    pub const fn period(self) -> OrderPeriod {
        match self {
            Self::Today => OrderPeriod::Today,
            Self::ThreeDays => OrderPeriod::LAST_3_DAYS,
            Self::Week => OrderPeriod::LAST_WEEK,
            Self::All => OrderPeriod::All,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::ThreeDays => "3days",
            Self::Week => "week",
            Self::All => "all",
        }
    }
}

/// Order review buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdersAction {
    /// Back to the period picker.
    Filters,
    Preset(PeriodPreset),
    /// Start typing a date range.
    Range,
    Page(usize),
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category(i) => write!(f, "cat:{i}"),
            Self::AddItem(i) => write!(f, "add:{i}"),
            Self::Menu => f.write_str("menu"),
            Self::Cart => f.write_str("cart"),
            Self::ClearCart => f.write_str("clear"),
            Self::Checkout => f.write_str("checkout"),
            Self::DeliveryType(t) => write!(f, "dt:{t}"),
            Self::SavedAddress(i) => write!(f, "addr:{i}"),
            Self::NewAddress => f.write_str("addr:new"),
            Self::Slot(at) => write!(f, "slot:{}", at.format(SLOT_FORMAT)),
            Self::Asap => f.write_str("slot:asap"),
            Self::Payment(method) => write!(f, "pay:{method}"),
            Self::Cancel => f.write_str("cancel"),
            Self::Admin(action) => write!(f, "adm:{action}"),
            Self::Orders(action) => write!(f, "ord:{action}"),
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Panel => f.write_str("panel"),
            Self::ViewMenu => f.write_str("menu"),
            Self::AddCategory => f.write_str("addcat"),
            Self::DeleteCategory => f.write_str("delcat"),
            Self::DeleteCategoryPick(i) => write!(f, "delcat:{i}"),
            Self::AddItem => f.write_str("additem"),
            Self::AddItemCategory(i) => write!(f, "additem:{i}"),
            Self::AddItemNewCategory => f.write_str("additem:new"),
            Self::DeleteItem => f.write_str("delitem"),
            Self::DeleteItemCategory(i) => write!(f, "delitem:{i}"),
            Self::ViewOrders => f.write_str("orders"),
            Self::Broadcast => f.write_str("broadcast"),
        }
    }
}

impl fmt::Display for OrdersAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filters => f.write_str("filters"),
            Self::Preset(preset) => f.write_str(preset.as_str()),
            Self::Range => f.write_str("range"),
            Self::Page(page) => write!(f, "page:{page}"),
        }
    }
}

fn index(s: &str) -> Option<usize> {
    s.parse().ok()
}

fn parse_admin(s: &str) -> Option<AdminAction> {
    let action = match s {
        "panel" => AdminAction::Panel,
        "menu" => AdminAction::ViewMenu,
        "addcat" => AdminAction::AddCategory,
        "delcat" => AdminAction::DeleteCategory,
        "additem" => AdminAction::AddItem,
        "additem:new" => AdminAction::AddItemNewCategory,
        "delitem" => AdminAction::DeleteItem,
        "orders" => AdminAction::ViewOrders,
        "broadcast" => AdminAction::Broadcast,
        _ => {
            let (head, arg) = s.split_once(':')?;
            let i = index(arg)?;
            match head {
                "delcat" => AdminAction::DeleteCategoryPick(i),
                "additem" => AdminAction::AddItemCategory(i),
                "delitem" => AdminAction::DeleteItemCategory(i),
                _ => return None,
            }
        }
    };
    Some(action)
}

fn parse_orders(s: &str) -> Option<OrdersAction> {
    let action = match s {
        "filters" => OrdersAction::Filters,
        "today" => OrdersAction::Preset(PeriodPreset::Today),
        "3days" => OrdersAction::Preset(PeriodPreset::ThreeDays),
        "week" => OrdersAction::Preset(PeriodPreset::Week),
        "all" => OrdersAction::Preset(PeriodPreset::All),
        "range" => OrdersAction::Range,
        _ => OrdersAction::Page(index(s.strip_prefix("page:")?)?),
    };
    Some(action)
}

fn parse(data: &str) -> Option<Callback> {
    let callback = match data {
        "menu" => Callback::Menu,
        "cart" => Callback::Cart,
        "clear" => Callback::ClearCart,
        "checkout" => Callback::Checkout,
        "cancel" => Callback::Cancel,
        "addr:new" => Callback::NewAddress,
        "slot:asap" => Callback::Asap,
        "pay:card" => Callback::Payment(PaymentMethod::Card),
        "pay:cash" => Callback::Payment(PaymentMethod::Cash),
        _ => {
            let (head, arg) = data.split_once(':')?;
            match head {
                "cat" => Callback::Category(index(arg)?),
                "add" => Callback::AddItem(index(arg)?),
                "addr" => Callback::SavedAddress(index(arg)?),
                "dt" => Callback::DeliveryType(arg.parse().ok()?),
                "slot" => Callback::Slot(NaiveDateTime::parse_from_str(arg, SLOT_FORMAT).ok()?),
                "adm" => Callback::Admin(parse_admin(arg)?),
                "ord" => Callback::Orders(parse_orders(arg)?),
                _ => return None,
            }
        }
    };
    Some(callback)
}

impl FromStr for Callback {
    type Err = UnknownCallback;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s).ok_or_else(|| UnknownCallback(s.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_encode_and_parse_back() {
        let slot = NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(20, 30, 0)
            .unwrap();
        let callbacks = [
            Callback::Category(3),
            Callback::AddItem(0),
            Callback::Menu,
            Callback::ClearCart,
            Callback::DeliveryType(DeliveryType::Pickup),
            Callback::SavedAddress(1),
            Callback::NewAddress,
            Callback::Slot(slot),
            Callback::Asap,
            Callback::Payment(PaymentMethod::Cash),
            Callback::Admin(AdminAction::DeleteCategoryPick(2)),
            Callback::Admin(AdminAction::AddItemNewCategory),
            Callback::Orders(OrdersAction::Preset(PeriodPreset::ThreeDays)),
            Callback::Orders(OrdersAction::Page(4)),
        ];
        for callback in callbacks {
            let data = callback.to_string();
            assert!(data.len() <= 64, "{data} too long");
            assert_eq!(data.parse::<Callback>().unwrap(), callback);
        }
    }

    #[test]
    fn test_slot_encoding() {
        let slot = NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        assert_eq!(Callback::Slot(slot).to_string(), "slot:202405100905");
    }

    #[test]
    fn test_rejects_garbage() {
        for data in ["", "cat:", "cat:x", "pay:unspecified", "dt:teleport", "adm:nope", "ord:page:-1", "user_cat_Soups"] {
            assert!(data.parse::<Callback>().is_err(), "{data} parsed");
        }
    }

    #[test]
    fn test_preset_periods() {
        assert_eq!(PeriodPreset::Week.period(), OrderPeriod::LastDays(7));
        assert_eq!(PeriodPreset::All.period(), OrderPeriod::All);
    }
}
