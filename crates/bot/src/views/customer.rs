//! Customer-facing screens: menu browsing, cart and checkout.

use chrono::NaiveDate;

use hearty_house_core::cart::Cart;
use hearty_house_core::markup::{MESSAGE_MAX_CHARS, escape_html, escape_html_capped};
use hearty_house_core::menu::{Menu, MenuCategory};
use hearty_house_core::pagination::cap_block;
use hearty_house_core::schedule::{RestaurantStatus, Slot};
use hearty_house_core::{DeliveryType, OrderId, PaymentMethod, Phone, Price};

use super::{button, cancel_row, rows};
use crate::config::BotConfig;
use crate::models::{Callback, NewOrder};
use crate::transport::{Keyboard, Reply};

/// Placeholder stored when the customer leaves no comment.
pub const NO_COMMENT: &str = "No comment";
/// Longest delivery address a customer may type.
pub const MAX_ADDRESS_CHARS: usize = 300;
/// Longest order comment a customer may type.
pub const MAX_COMMENT_CHARS: usize = 1000;
const USERNAME_CHARS: usize = 64;
const PHONE_CHARS: usize = 32;
// Escaped text runs longer than what was typed.
const ADDRESS_VIEW_CHARS: usize = 2 * MAX_ADDRESS_CHARS;
const COMMENT_VIEW_CHARS: usize = 2 * MAX_COMMENT_CHARS;

pub fn phone_request(config: &BotConfig) -> Reply {
    Reply::text(format!(
        "Welcome to {}! 🍲\nTo place an order, please share your phone number.",
        config.restaurant_name
    ))
    .with_keyboard(Keyboard::RequestContact {
        label: "📱 Share phone number".to_string(),
    })
}

pub fn phone_reminder() -> Reply {
    Reply::text("Please use the button below to share your phone number.").with_keyboard(
        Keyboard::RequestContact {
            label: "📱 Share phone number".to_string(),
        },
    )
}

pub fn phone_saved(phone: &Phone) -> Reply {
    Reply::text(format!(
        "Thanks! Your number is saved: {phone}\nNow pick your dishes 👇"
    ))
    .with_keyboard(Keyboard::Remove)
}

pub fn invalid_phone() -> Reply {
    Reply::text("That does not look like a phone number. Please share your contact again.")
}

/// Category list, two per row, with a cart button showing the item count.
pub fn categories(
    config: &BotConfig,
    menu: &Menu,
    cart_len: usize,
    status: &RestaurantStatus,
) -> Reply {
    let mut text = format!(
        "🍲 <b>{}</b>\n<i>{}</i>\n\n",
        escape_html(&config.restaurant_name),
        status.render()
    );
    if menu.categories.is_empty() {
        text.push_str("The menu is empty right now. Please check back later.");
    } else {
        text.push_str("Choose a menu category:");
    }

    let category_buttons = menu
        .categories
        .iter()
        .enumerate()
        .map(|(i, category)| button(&category.name, Callback::Category(i)))
        .collect();
    let mut keyboard = rows(category_buttons, 2);

    let cart_label = if cart_len > 0 {
        format!("🛒 Cart ({cart_len})")
    } else {
        "🛒 Cart".to_string()
    };
    keyboard.push(vec![button(cart_label, Callback::Cart)]);

    Reply::html(text).with_buttons(keyboard)
}

/// Numbered dishes of one category, one add button per dish.
pub fn category_page(config: &BotConfig, category: &MenuCategory) -> Reply {
    let currency = &config.currency_symbol;
    let mut text = format!("<b>{}</b>\n\n", escape_html(&category.name));
    for (n, item) in category.items.iter().enumerate() {
        text.push_str(&format!(
            "{}. <b>{}</b> - {}\n",
            n + 1,
            escape_html(&item.name),
            item.price.display(currency)
        ));
        if !item.description.is_empty() {
            text.push_str(&escape_html(&item.description));
            text.push('\n');
        }
        text.push('\n');
    }

    let mut keyboard: Vec<_> = category
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            vec![button(
                format!("{} - {}", item.name, item.price.display(currency)),
                Callback::AddItem(i),
            )]
        })
        .collect();
    keyboard.push(vec![
        button("← Categories", Callback::Menu),
        button("🛒 Cart", Callback::Cart),
    ]);

    Reply::html(text).with_buttons(keyboard)
}

pub fn cart(config: &BotConfig, cart: &Cart) -> Reply {
    let text = format!(
        "🛒 <b>Your cart</b>\n\n{}",
        cart.render(&config.currency_symbol)
    );
    Reply::html(text).with_buttons(vec![
        vec![
            button("✅ Checkout", Callback::Checkout),
            button("🗑 Clear cart", Callback::ClearCart),
        ],
        vec![button("← Menu", Callback::Menu)],
    ])
}

pub fn delivery_choice(config: &BotConfig, subtotal: Price) -> Reply {
    let currency = &config.currency_symbol;
    let policy = &config.pricing;
    let text = format!(
        "<b>How would you like to get your order?</b>\n\n\
         Subtotal: {}\n\
         Delivery is available from {}. It is free from {}, otherwise {}.",
        subtotal.display(currency),
        policy.min_order_for_delivery.display(currency),
        policy.free_delivery_min.display(currency),
        policy.flat_delivery_fee.display(currency),
    );
    Reply::html(text).with_buttons(vec![
        vec![
            button("🚚 Delivery", Callback::DeliveryType(DeliveryType::Delivery)),
            button("🏃 Pickup", Callback::DeliveryType(DeliveryType::Pickup)),
        ],
        cancel_row(),
    ])
}

pub fn delivery_minimum(config: &BotConfig) -> String {
    format!(
        "Delivery is available for orders from {}. Add more dishes or choose pickup.",
        config
            .pricing
            .min_order_for_delivery
            .display(&config.currency_symbol)
    )
}

pub fn address_choice(addresses: &[String]) -> Reply {
    let mut keyboard: Vec<_> = addresses
        .iter()
        .enumerate()
        .map(|(i, address)| vec![button(address, Callback::SavedAddress(i))])
        .collect();
    keyboard.push(vec![button("➕ New address", Callback::NewAddress)]);
    keyboard.push(cancel_row());
    Reply::text("Choose a delivery address:").with_buttons(keyboard)
}

pub fn address_too_long() -> Reply {
    Reply::text(format!(
        "The address is too long. Please keep it under {MAX_ADDRESS_CHARS} characters:"
    ))
}

pub fn comment_too_long() -> Reply {
    Reply::text(format!(
        "The comment is too long. Please keep it under {MAX_COMMENT_CHARS} characters, or send «none»:"
    ))
}

pub fn address_prompt() -> Reply {
    Reply::text("🏠 Enter the delivery address:").with_buttons(vec![cancel_row()])
}

pub fn empty_address() -> Reply {
    Reply::text("The address cannot be empty. Please enter the delivery address:")
}

/// Slot picker. `asap` adds the "as soon as possible" button on top.
pub fn prep_time_choice(slots: &[Slot], asap: bool) -> Reply {
    let mut keyboard = Vec::new();
    if asap {
        keyboard.push(vec![button("⚡ As soon as possible", Callback::Asap)]);
    }
    let slot_buttons = slots
        .iter()
        .map(|slot| button(&slot.label, Callback::Slot(slot.at)))
        .collect();
    keyboard.extend(rows(slot_buttons, 3));
    keyboard.push(cancel_row());
    Reply::html("⏰ <b>When should the order be ready?</b>").with_buttons(keyboard)
}

pub fn payment_choice(config: &BotConfig, total: Price) -> Reply {
    Reply::html(format!(
        "<b>How will you pay?</b>\n\nOrder total: {}",
        total.display(&config.currency_symbol)
    ))
    .with_buttons(vec![
        vec![
            button("💳 Card", Callback::Payment(PaymentMethod::Card)),
            button("💵 Cash", Callback::Payment(PaymentMethod::Cash)),
        ],
        cancel_row(),
    ])
}

pub fn cash_prompt(config: &BotConfig, total: Price) -> Reply {
    let currency = &config.currency_symbol;
    Reply::text(format!(
        "Which amount will you pay in cash? The courier will bring change.\n\
         Order total: {}. Minimum: {}.",
        total.display(currency),
        config.pricing.min_cash_amount.display(currency)
    ))
}

pub fn invalid_cash(config: &BotConfig) -> Reply {
    Reply::text(format!(
        "Please enter a whole amount of at least {}, digits only.",
        config
            .pricing
            .min_cash_amount
            .display(&config.currency_symbol)
    ))
}

pub fn comment_prompt() -> Reply {
    Reply::text("💬 Add a comment to your order (or «none»):")
}

pub fn checkout_guidance() -> Reply {
    Reply::text(
        "You are in the middle of placing an order. Answer the question above, or type cancel to stop.",
    )
}

pub fn use_buttons() -> Reply {
    Reply::text("Please choose one of the options above, or type cancel to stop.")
}

pub fn checkout_lost() -> Reply {
    Reply::text("This order can no longer be completed. Please start again from the menu.")
}

/// Trimmed comment, or the placeholder for empty input and the `none` token.
#[must_use]
pub fn normalize_comment(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(hearty_house_core::menu::NONE_TOKEN) {
        NO_COMMENT.to_string()
    } else {
        trimmed.to_string()
    }
}

fn payment_line(order: &NewOrder, currency: &str) -> String {
    match (order.payment_method, order.cash_amount) {
        (PaymentMethod::Card, _) => "💳 Payment: card".to_string(),
        (PaymentMethod::Cash, Some(amount)) => {
            format!("💵 Payment: cash, change from {}", amount.display(currency))
        }
        (PaymentMethod::Cash, None) => "💵 Payment: cash".to_string(),
        (PaymentMethod::Unspecified, _) => "Payment: not specified".to_string(),
    }
}

fn fulfilment_line(delivery_type: DeliveryType, address: &str) -> String {
    let address = escape_html_capped(address, ADDRESS_VIEW_CHARS);
    match delivery_type {
        DeliveryType::Delivery => format!("🚚 Delivery: {address}"),
        DeliveryType::Pickup => format!("🏃 Pickup: {address}"),
    }
}

pub fn order_confirmation(config: &BotConfig, id: OrderId, order: &NewOrder) -> Reply {
    let currency = &config.currency_symbol;
    let head = format!("✅ <b>Order #{id} received!</b>\n");
    let mut tail = String::new();
    if order.delivery_cost > Price::ZERO {
        tail.push_str(&format!(
            "Delivery: {}\n",
            order.delivery_cost.display(currency)
        ));
    }
    tail.push_str(&format!(
        "<b>Total: {}</b>\n\n⏰ Ready by: {}\n{}\n\nWe will contact you soon. Thank you! 🍲",
        order.total().display(currency),
        order.prep_time.display(),
        fulfilment_line(order.delivery_type, &order.delivery_address),
    ));
    Reply::html(cap_block(&head, &order.order_text, &tail, MESSAGE_MAX_CHARS))
}

/// Detailed breakdown sent to every staff member.
///
/// Always fits one message: free text is capped and the item list is cut
/// first when the order is very large.
pub fn staff_notification(
    config: &BotConfig,
    id: OrderId,
    order: &NewOrder,
    today: NaiveDate,
) -> Reply {
    let currency = &config.currency_symbol;
    let prep = match order.prep_time.day_marker(today) {
        Some(marker) => format!("<b>{marker}</b> {}", order.prep_time.display()),
        None => order.prep_time.display(),
    };
    let username = order.username.as_deref().map_or_else(
        || "hidden".to_string(),
        |u| format!("@{}", escape_html_capped(u, USERNAME_CHARS)),
    );

    let head = format!(
        "🍲 <b>New order #{id} - {}</b>\n",
        escape_html(&config.restaurant_name)
    );
    let tail = format!(
        "\n📞 Phone: {phone}\n\
         {fulfilment}\n\
         ⏰ Ready by: {prep}\n\
         {payment}\n\
         Delivery cost: {delivery}\n\
         <b>Total: {total}</b>\n\
         💬 Comment: {comment}\n\
         👤 {username}\n\n\
         🕒 {created}",
        phone = escape_html_capped(&order.phone, PHONE_CHARS),
        fulfilment = fulfilment_line(order.delivery_type, &order.delivery_address),
        payment = payment_line(order, currency),
        delivery = order.delivery_cost.display(currency),
        total = order.total().display(currency),
        comment = escape_html_capped(&order.comment, COMMENT_VIEW_CHARS),
        created = order
            .created_at
            .format(hearty_house_core::schedule::DISPLAY_FORMAT),
    );
    Reply::html(cap_block(&head, &order.order_text, &tail, MESSAGE_MAX_CHARS))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDateTime;

    use hearty_house_core::UserId;
    use hearty_house_core::menu::MenuItem;
    use hearty_house_core::schedule::PrepTime;

    use super::*;

    fn config() -> BotConfig {
        BotConfig::for_tests([1])
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%d.%m.%Y %H:%M").unwrap()
    }

    fn order() -> NewOrder {
        NewOrder {
            order_text: "<b>Soups</b>\n• Borscht - 450 ₽\n\nSubtotal: 450 ₽".to_string(),
            created_at: at("10.05.2024 18:50"),
            phone: "+79001234567".to_string(),
            delivery_type: DeliveryType::Delivery,
            delivery_address: "Lenina <1>".to_string(),
            username: Some("ivan".to_string()),
            comment: "Ring & wait".to_string(),
            prep_time: PrepTime::At(at("10.05.2024 20:00")),
            subtotal: Price::new(1500),
            delivery_cost: Price::new(200),
            payment_method: PaymentMethod::Cash,
            cash_amount: Some(Price::new(2000)),
            user_id: UserId::new(42),
        }
    }

    #[test]
    fn test_categories_two_per_row_with_cart_count() {
        let mut menu = Menu::default();
        for name in ["Soups", "Mains", "Desserts"] {
            menu.add_category(name).unwrap();
        }
        let status = RestaurantStatus::Open { orders_close: None };
        let reply = categories(&config(), &menu, 3, &status);

        let Some(Keyboard::Inline(rows)) = reply.keyboard else {
            panic!("expected inline keyboard");
        };
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][1].data, "cat:1");
        assert_eq!(rows[2][0].label, "🛒 Cart (3)");
        assert!(reply.html);
    }

    #[test]
    fn test_category_page_escapes_names() {
        let category = MenuCategory {
            name: "Fish & Chips".to_string(),
            items: vec![MenuItem {
                name: "Cod <large>".to_string(),
                price: Price::new(700),
                description: String::new(),
            }],
        };
        let reply = category_page(&config(), &category);
        assert!(reply.text.contains("<b>Fish &amp; Chips</b>"));
        assert!(reply.text.contains("1. <b>Cod &lt;large&gt;</b> - 700 ₽"));
        let buttons = reply.keyboard.unwrap();
        assert_eq!(buttons.inline_buttons()[0].data, "add:0");
    }

    #[test]
    fn test_prep_time_choice_offers_asap_first() {
        let slots = vec![Slot {
            at: at("10.05.2024 20:00"),
            label: "20:00".to_string(),
        }];
        let reply = prep_time_choice(&slots, true);
        let keyboard = reply.keyboard.unwrap();
        let buttons = keyboard.inline_buttons();
        assert_eq!(buttons[0].data, "slot:asap");
        assert_eq!(buttons[1].data, "slot:202405102000");
        assert_eq!(buttons[2].data, "cancel");

        let reply = prep_time_choice(&slots, false);
        assert_eq!(reply.keyboard.unwrap().inline_buttons()[0].label, "20:00");
    }

    #[test]
    fn test_normalize_comment() {
        assert_eq!(normalize_comment("  "), NO_COMMENT);
        assert_eq!(normalize_comment("None"), NO_COMMENT);
        assert_eq!(normalize_comment(" no onions "), "no onions");
    }

    #[test]
    fn test_staff_notification_breakdown() {
        let today = at("10.05.2024 18:50").date();
        let reply = staff_notification(&config(), OrderId::new(17), &order(), today);
        let text = reply.text;
        assert!(text.contains("New order #17"));
        assert!(text.contains("🚚 Delivery: Lenina &lt;1&gt;"));
        assert!(text.contains("<b>TODAY</b> 10.05.2024 20:00"));
        assert!(text.contains("change from 2000 ₽"));
        assert!(text.contains("Delivery cost: 200 ₽"));
        assert!(text.contains("<b>Total: 1700 ₽</b>"));
        assert!(text.contains("Ring &amp; wait"));
        assert!(text.contains("@ivan"));
    }

    #[test]
    fn test_long_comment_notification_fits_one_message() {
        let today = at("10.05.2024 18:50").date();
        let mut order = order();
        order.comment = "x".repeat(4000);
        order.delivery_address = "&".repeat(4000);
        order.order_text = "• Borscht - 450 ₽\n".repeat(400);

        let text = staff_notification(&config(), OrderId::new(17), &order, today).text;
        assert!(text.chars().count() <= MESSAGE_MAX_CHARS);
        assert!(text.contains("<b>Total: 1700 ₽</b>"));
        assert!(text.contains("@ivan"));

        let text = order_confirmation(&config(), OrderId::new(17), &order).text;
        assert!(text.chars().count() <= MESSAGE_MAX_CHARS);
        assert!(text.contains("<b>Total: 1700 ₽</b>"));
    }

    #[test]
    fn test_confirmation_shows_total() {
        let reply = order_confirmation(&config(), OrderId::new(3), &order());
        assert!(reply.text.contains("Order #3"));
        assert!(reply.text.contains("Delivery: 200 ₽"));
        assert!(reply.text.contains("<b>Total: 1700 ₽</b>"));
    }
}
