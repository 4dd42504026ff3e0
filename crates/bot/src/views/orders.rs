//! Order review screens.
//!
//! Each order renders as one block capped at [`DEFAULT_BLOCK_CHARS`]; blocks
//! are packed into pages with [`paginate`] so no page exceeds a message.

use chrono::NaiveDate;

use hearty_house_core::markup::{escape_html, escape_html_capped};
use hearty_house_core::pagination::{DEFAULT_BLOCK_CHARS, PageLimits, cap_block, clamp_page, paginate};
use hearty_house_core::period::OrderPeriod;
use hearty_house_core::schedule::DISPLAY_FORMAT;
use hearty_house_core::{DeliveryType, PaymentMethod};

use super::button;
use crate::config::BotConfig;
use crate::models::Order;
use crate::models::callback::{AdminAction, OrdersAction, PeriodPreset};
use crate::models::Callback;
use crate::transport::{Button, Reply};

const SEPARATOR: &str = "────────────────────";

fn filters_keyboard() -> Vec<Vec<Button>> {
    let orders = |action| Callback::Orders(action);
    vec![
        vec![button("Today", orders(OrdersAction::Preset(PeriodPreset::Today)))],
        vec![button("Last 3 days", orders(OrdersAction::Preset(PeriodPreset::ThreeDays)))],
        vec![button("Last week", orders(OrdersAction::Preset(PeriodPreset::Week)))],
        vec![button("Choose dates", orders(OrdersAction::Range))],
        vec![button("All orders", orders(OrdersAction::Preset(PeriodPreset::All)))],
        vec![button("← Admin panel", Callback::Admin(AdminAction::Panel))],
    ]
}

pub fn filters() -> Reply {
    Reply::html("<b>Orders</b>\n\nChoose a period:").with_buttons(filters_keyboard())
}

pub fn no_orders() -> Reply {
    Reply::html("No orders for the selected period.").with_buttons(filters_keyboard())
}

/// Escaped-length caps for free text in a block, so the head always leaves
/// room for the items and totals.
const USERNAME_CHARS: usize = 64;
const PHONE_CHARS: usize = 32;
const ADDRESS_CHARS: usize = 300;
const COMMENT_CHARS: usize = 500;

fn or_missing(value: Option<&str>, max_chars: usize) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .map_or_else(
            || "not specified".to_string(),
            |v| escape_html_capped(v, max_chars),
        )
}

/// One order as a block of at most `max_chars` characters.
pub fn order_block(config: &BotConfig, order: &Order, today: NaiveDate, max_chars: usize) -> String {
    let currency = &config.currency_symbol;
    let username = order
        .username
        .as_deref()
        .filter(|u| !u.is_empty())
        .map_or_else(
            || "hidden".to_string(),
            |u| format!("@{}", escape_html_capped(u, USERNAME_CHARS)),
        );

    let prep = order.prep_time.map_or_else(
        || "not specified".to_string(),
        |prep| match prep.day_marker(today) {
            Some(marker) => format!("<b>{marker}</b> {}", prep.display()),
            None => prep.display(),
        },
    );

    let address = or_missing(order.delivery_address.as_deref(), ADDRESS_CHARS);
    let fulfilment = match order.delivery_type {
        Some(DeliveryType::Delivery) => format!("🚚 Delivery: {address}"),
        Some(DeliveryType::Pickup) => format!("🏃 Pickup: {address}"),
        None => format!("Address: {address}"),
    };

    let mut head = format!(
        "<b>#{} {} ({username})</b>\n📞 {}\n⏰ Ready by: {prep}\n{fulfilment}",
        order.id,
        order.created_at.format(DISPLAY_FORMAT),
        or_missing(order.phone.as_deref(), PHONE_CHARS),
    );
    match (order.payment_method, order.cash_amount) {
        (PaymentMethod::Cash, Some(amount)) => head.push_str(&format!(
            "\n💵 Cash, change from {}",
            amount.display(currency)
        )),
        (PaymentMethod::Cash, None) => head.push_str("\n💵 Cash"),
        (PaymentMethod::Card, _) => head.push_str("\n💳 Card"),
        (PaymentMethod::Unspecified, _) => {}
    }
    head.push_str(&format!(
        "\n💬 {}\n",
        or_missing(order.comment.as_deref(), COMMENT_CHARS)
    ));

    let body = if order.order_text.trim().is_empty() {
        "(no items recorded)"
    } else {
        order.order_text.as_str()
    };

    let mut tail = String::new();
    if let Some(total) = order.total {
        tail.push_str(&format!(
            "Delivery: {}. <b>Total: {}</b>\n",
            order.delivery_cost.display(currency),
            total.display(currency)
        ));
    }
    tail.push_str(SEPARATOR);

    cap_block(&head, body, &tail, max_chars)
}

/// Render one page of `orders` with its navigation keyboard.
///
/// The requested page is clamped into range. Returns `None` when there are
/// no orders at all.
pub fn orders_page(
    config: &BotConfig,
    orders: &[Order],
    period: &OrderPeriod,
    requested_page: usize,
    today: NaiveDate,
) -> Option<(usize, Reply)> {
    if orders.is_empty() {
        return None;
    }
    let blocks: Vec<String> = orders
        .iter()
        .map(|order| order_block(config, order, today, DEFAULT_BLOCK_CHARS))
        .collect();
    let pages = paginate(&blocks, PageLimits::default());
    let page = clamp_page(requested_page, pages.len());
    let body = pages.get(page)?;

    let text = format!(
        "<b>Orders</b> · {} (page {}/{})\n\n{}",
        escape_html(&period.label()),
        page + 1,
        pages.len(),
        body.text
    );

    let mut navigation = Vec::new();
    if page > 0 {
        navigation.push(button("« Prev", Callback::Orders(OrdersAction::Page(page - 1))));
    }
    if page + 1 < pages.len() {
        navigation.push(button("Next »", Callback::Orders(OrdersAction::Page(page + 1))));
    }
    let mut keyboard = Vec::new();
    if !navigation.is_empty() {
        keyboard.push(navigation);
    }
    keyboard.push(vec![button(
        "← Back to periods",
        Callback::Orders(OrdersAction::Filters),
    )]);

    Some((page, Reply::html(text).with_buttons(keyboard)))
}
