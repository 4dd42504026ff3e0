//! Customer conversations: onboarding, browsing and checkout.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use hearty_house_bot::config::BotConfig;
use hearty_house_bot::db::{OrderFilter, OrderRepository, UserRepository};
use hearty_house_bot::models::{Order, Step};
use hearty_house_bot::transport::Keyboard;
use hearty_house_core::schedule::PrepTime;
use hearty_house_core::{DeliveryType, PaymentMethod, Price, SortDirection, UserId};
use hearty_house_core::markup::MESSAGE_MAX_CHARS;
use hearty_house_integration_tests::{
    ADMIN, Harness, Outbound, at, default_now, last_message_id, last_screen, notice, sample_menu,
};

const CUSTOMER: i64 = 20;

async fn all_orders(harness: &Harness) -> Vec<Order> {
    OrderRepository::new(harness.pool())
        .list(&OrderFilter {
            from: None,
            to: None,
            sort: SortDirection::OldestFirst,
            limit: 100,
        })
        .await
        .unwrap()
}

/// Registered customer with the sample menu, looking at the category list.
/// Returns the id of the category list message.
async fn browsing_customer(harness: &Harness) -> hearty_house_bot::transport::MessageRef {
    harness.seed_menu(&sample_menu()).await;
    harness.register(CUSTOMER, "+79001234567").await;
    let out = harness.text(CUSTOMER, "/start").await;
    last_message_id(&out, CUSTOMER).unwrap()
}

async fn add_to_cart(harness: &Harness, screen: hearty_house_bot::transport::MessageRef, picks: &[(usize, usize)]) {
    for &(category, item) in picks {
        harness
            .press(CUSTOMER, &format!("cat:{category}"), Some(screen))
            .await;
        harness
            .press(CUSTOMER, &format!("add:{item}"), Some(screen))
            .await;
    }
}

#[tokio::test]
async fn test_new_customer_shares_phone_before_menu() {
    let harness = Harness::new().await;
    harness.seed_menu(&sample_menu()).await;

    let out = harness.text(CUSTOMER, "/start").await;
    let reply = last_screen(&out).unwrap().reply().unwrap();
    assert!(matches!(reply.keyboard, Some(Keyboard::RequestContact { .. })));
    assert_eq!(harness.session(CUSTOMER).await.step, Step::AwaitingPhone);

    let out = harness.text(CUSTOMER, "what's on the menu?").await;
    assert!(last_screen(&out).unwrap().text().unwrap().contains("share your phone"));

    let out = harness.contact(CUSTOMER, "7 900 123-45-67").await;
    assert_eq!(out.len(), 2);
    assert!(out[0].text().unwrap().contains("+79001234567"));
    assert!(out[1].text().unwrap().contains("Choose a menu category"));
    assert_eq!(
        out[1].button_data(),
        vec!["cat:0", "cat:1", "cat:2", "cart"]
    );

    let user = UserRepository::new(harness.pool())
        .get(UserId::new(CUSTOMER))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.phone.unwrap().as_str(), "+79001234567");
    assert_eq!(harness.session(CUSTOMER).await.step, Step::Browsing);
}

#[tokio::test]
async fn test_known_customer_goes_straight_to_menu() {
    let harness = Harness::new().await;
    let screen = browsing_customer(&harness).await;
    assert!(screen.0 > 0);
    assert_eq!(harness.session(CUSTOMER).await.step, Step::Browsing);
}

#[tokio::test]
async fn test_browsing_edits_the_same_message() {
    let harness = Harness::new().await;
    let screen = browsing_customer(&harness).await;

    let out = harness.press(CUSTOMER, "cat:0", Some(screen)).await;
    let Some(Outbound::Edit { message, reply, .. }) = last_screen(&out) else {
        panic!("expected an edit, got {out:?}");
    };
    assert_eq!(*message, screen);
    assert!(reply.text.contains("1. <b>Borscht</b> - 450 ₽"));

    let out = harness.press(CUSTOMER, "add:0", Some(screen)).await;
    assert_eq!(notice(&out).unwrap().text, "Added: Borscht");

    let out = harness.press(CUSTOMER, "cat:2", Some(screen)).await;
    assert_eq!(notice(&out).unwrap().text, "This category is empty");

    let out = harness.press(CUSTOMER, "menu", Some(screen)).await;
    let labels: Vec<_> = last_screen(&out)
        .unwrap()
        .reply()
        .unwrap()
        .keyboard
        .as_ref()
        .unwrap()
        .inline_buttons()
        .iter()
        .map(|b| b.label.clone())
        .collect();
    assert!(labels.contains(&"🛒 Cart (1)".to_string()));
}

#[tokio::test]
async fn test_empty_cart_cannot_check_out() {
    let harness = Harness::new().await;
    let screen = browsing_customer(&harness).await;

    let out = harness.press(CUSTOMER, "cart", Some(screen)).await;
    let answer = notice(&out).unwrap();
    assert!(answer.alert);
    assert_eq!(answer.text, "Your cart is empty");

    let out = harness.press(CUSTOMER, "checkout", Some(screen)).await;
    assert_eq!(notice(&out).unwrap().text, "Your cart is empty");
    assert_eq!(harness.session(CUSTOMER).await.step, Step::Browsing);
}

#[tokio::test]
async fn test_pickup_order_end_to_end() {
    let harness = Harness::new().await;
    let screen = browsing_customer(&harness).await;
    add_to_cart(&harness, screen, &[(0, 0), (0, 1)]).await;

    let out = harness.press(CUSTOMER, "cart", Some(screen)).await;
    assert!(last_screen(&out).unwrap().text().unwrap().contains("Subtotal: 940 ₽"));

    harness.press(CUSTOMER, "checkout", Some(screen)).await;
    assert_eq!(
        harness.session(CUSTOMER).await.step,
        Step::ChoosingDeliveryType
    );

    let out = harness.press(CUSTOMER, "dt:pickup", Some(screen)).await;
    let buttons = last_screen(&out).unwrap().button_data();
    assert_eq!(buttons[0], "slot:asap");
    assert_eq!(buttons[1], "slot:202503141230");
    assert_eq!(buttons.last().unwrap(), "cancel");

    let out = harness
        .press(CUSTOMER, "slot:202503141230", Some(screen))
        .await;
    assert!(last_screen(&out).unwrap().text().unwrap().contains("comment"));
    assert_eq!(harness.session(CUSTOMER).await.step, Step::EnteringComment);

    let out = harness.text(CUSTOMER, "Ring the bell").await;
    let staff: Vec<_> = out
        .iter()
        .filter(|o| o.chat() == Some(UserId::new(ADMIN)))
        .collect();
    assert_eq!(staff.len(), 1);
    let staff_text = staff[0].text().unwrap();
    assert!(staff_text.contains("New order #1"));
    assert!(staff_text.contains("<b>TODAY</b> 14.03.2025 12:30"));
    assert!(staff_text.contains("@user20"));

    let customer: Vec<_> = out
        .iter()
        .filter(|o| o.chat() == Some(UserId::new(CUSTOMER)))
        .collect();
    assert!(customer[0].text().unwrap().contains("Order #1 received"));
    assert!(customer[1].text().unwrap().contains("Choose a menu category"));

    let orders = all_orders(&harness).await;
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.delivery_type, Some(DeliveryType::Pickup));
    assert_eq!(order.prep_time, Some(PrepTime::At(at("2025-03-14 12:30"))));
    assert_eq!(order.payment_method, PaymentMethod::Unspecified);
    assert_eq!(order.subtotal, Some(Price::new(940)));
    assert_eq!(order.delivery_cost, Price::ZERO);
    assert_eq!(order.comment.as_deref(), Some("Ring the bell"));
    assert_eq!(order.username.as_deref(), Some("user20"));
    assert_eq!(order.user_id, Some(UserId::new(CUSTOMER)));

    let session = harness.session(CUSTOMER).await;
    assert!(session.cart.is_empty());
    assert_eq!(session.step, Step::Browsing);
}

#[tokio::test]
async fn test_delivery_below_minimum_is_refused() {
    let harness = Harness::new().await;
    let screen = browsing_customer(&harness).await;
    add_to_cart(&harness, screen, &[(0, 0)]).await;
    harness.press(CUSTOMER, "checkout", Some(screen)).await;

    let out = harness.press(CUSTOMER, "dt:delivery", Some(screen)).await;
    let answer = notice(&out).unwrap();
    assert!(answer.alert);
    assert!(answer.text.contains("from 1000 ₽"));
    assert_eq!(
        harness.session(CUSTOMER).await.step,
        Step::ChoosingDeliveryType
    );
}

#[tokio::test]
async fn test_delivery_with_cash_and_address_book() {
    let harness = Harness::new().await;
    let screen = browsing_customer(&harness).await;
    add_to_cart(&harness, screen, &[(1, 0), (1, 1)]).await;
    harness.press(CUSTOMER, "checkout", Some(screen)).await;

    harness.press(CUSTOMER, "dt:delivery", Some(screen)).await;
    assert_eq!(harness.session(CUSTOMER).await.step, Step::EnteringAddress);

    let out = harness.text(CUSTOMER, "  Lenina 1, apt 5 ").await;
    let buttons = last_screen(&out).unwrap().button_data();
    assert_eq!(buttons[0], "slot:asap");
    assert_eq!(buttons[1], "slot:202503141300");

    harness.press(CUSTOMER, "slot:asap", Some(screen)).await;
    assert_eq!(
        harness.session(CUSTOMER).await.step,
        Step::ChoosingPaymentMethod
    );

    let out = harness.press(CUSTOMER, "pay:cash", Some(screen)).await;
    assert!(last_screen(&out).unwrap().text().unwrap().contains("1570 ₽"));

    let out = harness.text(CUSTOMER, "300").await;
    assert!(last_screen(&out).unwrap().text().unwrap().contains("at least 500 ₽"));
    assert_eq!(
        harness.session(CUSTOMER).await.step,
        Step::EnteringCashAmount
    );

    harness.text(CUSTOMER, "2000").await;
    harness.text(CUSTOMER, "none").await;

    let orders = all_orders(&harness).await;
    let order = &orders[0];
    assert_eq!(order.delivery_type, Some(DeliveryType::Delivery));
    assert_eq!(order.delivery_address.as_deref(), Some("Lenina 1, apt 5"));
    assert_eq!(order.prep_time, Some(PrepTime::Asap));
    assert_eq!(order.delivery_cost, Price::new(200));
    assert_eq!(order.total, Some(Price::new(1570)));
    assert_eq!(order.payment_method, PaymentMethod::Cash);
    assert_eq!(order.cash_amount, Some(Price::new(2000)));
    assert_eq!(order.comment.as_deref(), Some("No comment"));

    // The next delivery offers the saved address.
    let screen = last_message_id(&harness.text(CUSTOMER, "/menu").await, CUSTOMER).unwrap();
    add_to_cart(&harness, screen, &[(1, 0), (1, 1)]).await;
    harness.press(CUSTOMER, "checkout", Some(screen)).await;
    let out = harness.press(CUSTOMER, "dt:delivery", Some(screen)).await;
    assert_eq!(
        last_screen(&out).unwrap().button_data(),
        vec!["addr:0", "addr:new", "cancel"]
    );

    harness.press(CUSTOMER, "addr:0", Some(screen)).await;
    let session = harness.session(CUSTOMER).await;
    assert_eq!(session.step, Step::ChoosingPrepTime);
    assert_eq!(session.draft.delivery_address.as_deref(), Some("Lenina 1, apt 5"));
}

#[tokio::test]
async fn test_free_delivery_from_threshold() {
    let harness = Harness::new().await;
    let screen = browsing_customer(&harness).await;
    add_to_cart(&harness, screen, &[(1, 0), (1, 1), (1, 1)]).await;
    harness.press(CUSTOMER, "checkout", Some(screen)).await;
    harness.press(CUSTOMER, "dt:delivery", Some(screen)).await;
    harness.text(CUSTOMER, "Lenina 1").await;
    harness.press(CUSTOMER, "slot:asap", Some(screen)).await;
    harness.press(CUSTOMER, "pay:card", Some(screen)).await;
    harness.text(CUSTOMER, "").await;

    let order = &all_orders(&harness).await[0];
    assert_eq!(order.subtotal, Some(Price::new(2090)));
    assert_eq!(order.delivery_cost, Price::ZERO);
    assert_eq!(order.payment_method, PaymentMethod::Card);
    assert_eq!(order.cash_amount, None);
}

#[tokio::test]
async fn test_stale_slot_is_rejected() {
    let harness = Harness::new().await;
    let screen = browsing_customer(&harness).await;
    add_to_cart(&harness, screen, &[(0, 0)]).await;
    harness.press(CUSTOMER, "checkout", Some(screen)).await;
    harness.press(CUSTOMER, "dt:pickup", Some(screen)).await;

    harness.clock.set(at("2025-03-14 13:10"));
    let out = harness
        .press(CUSTOMER, "slot:202503141230", Some(screen))
        .await;
    assert!(notice(&out).unwrap().text.contains("no longer available"));
    let buttons = last_screen(&out).unwrap().button_data();
    assert_eq!(buttons[1], "slot:202503141400");

    let session = harness.session(CUSTOMER).await;
    assert_eq!(session.step, Step::ChoosingPrepTime);
    assert_eq!(session.draft.prep_time, None);
}

#[tokio::test]
async fn test_out_of_order_buttons_do_nothing() {
    let harness = Harness::new().await;
    let screen = browsing_customer(&harness).await;

    let out = harness.press(CUSTOMER, "pay:card", Some(screen)).await;
    assert_eq!(
        notice(&out).unwrap().text,
        "This action is no longer available"
    );
    let out = harness.press(CUSTOMER, "add:3", Some(screen)).await;
    assert!(notice(&out).unwrap().alert);
    let out = harness.press(CUSTOMER, "garbage", Some(screen)).await;
    assert!(notice(&out).is_some());

    let session = harness.session(CUSTOMER).await;
    assert_eq!(session.step, Step::Browsing);
    assert!(session.cart.is_empty());
}

#[tokio::test]
async fn test_commands_are_refused_mid_checkout() {
    let harness = Harness::new().await;
    let screen = browsing_customer(&harness).await;
    add_to_cart(&harness, screen, &[(0, 0)]).await;
    harness.press(CUSTOMER, "checkout", Some(screen)).await;

    let out = harness.text(CUSTOMER, "/menu").await;
    assert!(out[0].text().unwrap().contains("middle of placing an order"));
    assert_eq!(
        harness.session(CUSTOMER).await.step,
        Step::ChoosingDeliveryType
    );

    let out = harness.press(CUSTOMER, "add:0", Some(screen)).await;
    assert!(notice(&out).unwrap().text.contains("Finish or cancel"));
    assert_eq!(harness.session(CUSTOMER).await.cart.len(), 1);
}

#[tokio::test]
async fn test_cancel_clears_the_session() {
    let harness = Harness::new().await;
    let screen = browsing_customer(&harness).await;
    add_to_cart(&harness, screen, &[(1, 0), (1, 1)]).await;
    harness.press(CUSTOMER, "checkout", Some(screen)).await;
    harness.press(CUSTOMER, "dt:delivery", Some(screen)).await;

    let out = harness.text(CUSTOMER, "Cancel").await;
    assert!(last_screen(&out).unwrap().text().unwrap().contains("Choose a menu category"));

    let session = harness.session(CUSTOMER).await;
    assert_eq!(session.step, Step::Browsing);
    assert!(session.cart.is_empty());
    assert!(session.phone.is_some());
    assert!(all_orders(&harness).await.is_empty());
}

#[tokio::test]
async fn test_blocked_staff_does_not_lose_the_order() {
    let harness = Harness::new().await;
    harness.transport().block(UserId::new(ADMIN));
    let screen = browsing_customer(&harness).await;
    add_to_cart(&harness, screen, &[(0, 0)]).await;
    harness.press(CUSTOMER, "checkout", Some(screen)).await;
    harness.press(CUSTOMER, "dt:pickup", Some(screen)).await;
    harness.press(CUSTOMER, "slot:asap", Some(screen)).await;

    let out = harness.text(CUSTOMER, "thanks").await;
    assert!(out[0].text().unwrap().contains("Order #1 received"));
    assert_eq!(all_orders(&harness).await.len(), 1);
}

async fn paid_pickup_harness() -> (Harness, hearty_house_bot::transport::MessageRef) {
    let mut config = BotConfig::for_tests([ADMIN]);
    config.require_payment_for_pickup = true;
    let harness = Harness::with_config(config, default_now()).await;
    let screen = browsing_customer(&harness).await;
    add_to_cart(&harness, screen, &[(0, 0)]).await;
    harness.press(CUSTOMER, "checkout", Some(screen)).await;
    harness.press(CUSTOMER, "dt:pickup", Some(screen)).await;

    let out = harness.press(CUSTOMER, "slot:asap", Some(screen)).await;
    assert_eq!(
        harness.session(CUSTOMER).await.step,
        Step::ChoosingPaymentMethod
    );
    let buttons = last_screen(&out).unwrap().button_data();
    assert!(buttons.contains(&"pay:card".to_string()));
    assert!(buttons.contains(&"pay:cash".to_string()));
    (harness, screen)
}

#[tokio::test]
async fn test_pickup_with_required_payment_by_card() {
    let (harness, screen) = paid_pickup_harness().await;

    harness.press(CUSTOMER, "pay:card", Some(screen)).await;
    assert_eq!(harness.session(CUSTOMER).await.step, Step::EnteringComment);
    harness.text(CUSTOMER, "none").await;

    let order = &all_orders(&harness).await[0];
    assert_eq!(order.delivery_type, Some(DeliveryType::Pickup));
    assert_eq!(order.payment_method, PaymentMethod::Card);
    assert_eq!(order.cash_amount, None);
    assert_eq!(order.delivery_cost, Price::ZERO);
}

#[tokio::test]
async fn test_pickup_with_required_payment_in_cash() {
    let (harness, screen) = paid_pickup_harness().await;

    harness.press(CUSTOMER, "pay:cash", Some(screen)).await;
    assert_eq!(
        harness.session(CUSTOMER).await.step,
        Step::EnteringCashAmount
    );
    harness.text(CUSTOMER, "1000").await;
    let out = harness.text(CUSTOMER, "none").await;

    let staff = out
        .iter()
        .find(|o| o.chat() == Some(UserId::new(ADMIN)))
        .unwrap();
    assert!(staff.text().unwrap().contains("change from 1000 ₽"));

    let order = &all_orders(&harness).await[0];
    assert_eq!(order.delivery_type, Some(DeliveryType::Pickup));
    assert_eq!(order.payment_method, PaymentMethod::Cash);
    assert_eq!(order.cash_amount, Some(Price::new(1000)));
}

#[tokio::test]
async fn test_overlong_free_text_is_asked_again() {
    let harness = Harness::new().await;
    let screen = browsing_customer(&harness).await;
    add_to_cart(&harness, screen, &[(1, 0), (1, 1)]).await;
    harness.press(CUSTOMER, "checkout", Some(screen)).await;
    harness.press(CUSTOMER, "dt:delivery", Some(screen)).await;

    let out = harness.text(CUSTOMER, &"<".repeat(301)).await;
    assert!(last_screen(&out).unwrap().text().unwrap().contains("address is too long"));
    assert_eq!(harness.session(CUSTOMER).await.step, Step::EnteringAddress);

    harness.text(CUSTOMER, &"<".repeat(300)).await;
    harness.press(CUSTOMER, "slot:asap", Some(screen)).await;
    harness.press(CUSTOMER, "pay:card", Some(screen)).await;

    let out = harness.text(CUSTOMER, &"x".repeat(4000)).await;
    assert!(last_screen(&out).unwrap().text().unwrap().contains("comment is too long"));
    assert_eq!(harness.session(CUSTOMER).await.step, Step::EnteringComment);
    assert!(all_orders(&harness).await.is_empty());

    let out = harness.text(CUSTOMER, &"&".repeat(1000)).await;
    for message in &out {
        if let Some(text) = message.text() {
            assert!(text.chars().count() <= MESSAGE_MAX_CHARS);
        }
    }
    let staff = out
        .iter()
        .find(|o| o.chat() == Some(UserId::new(ADMIN)))
        .unwrap();
    assert!(staff.text().unwrap().contains("<b>Total: "));

    let order = &all_orders(&harness).await[0];
    assert_eq!(order.comment.as_deref(), Some("&".repeat(1000).as_str()));
    assert_eq!(order.delivery_address.as_deref(), Some("<".repeat(300).as_str()));
}
