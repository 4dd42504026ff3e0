//! Staff order review: presets, custom ranges and paging.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use hearty_house_bot::db::OrderRepository;
use hearty_house_bot::models::{AdminStep, NewOrder, Step};
use hearty_house_core::schedule::PrepTime;
use hearty_house_core::{DeliveryType, OrderId, PaymentMethod, Price, UserId};
use hearty_house_integration_tests::{ADMIN, Harness, at, last_message_id, last_screen, notice};

fn order(created_at: &str, body: &str) -> NewOrder {
    NewOrder {
        order_text: format!("<b>Soups</b>\n• {body} - 450 ₽\n\nSubtotal: 450 ₽"),
        created_at: at(created_at),
        phone: "+79001234567".to_string(),
        delivery_type: DeliveryType::Pickup,
        delivery_address: "Front counter".to_string(),
        username: Some("guest".to_string()),
        comment: "No comment".to_string(),
        prep_time: PrepTime::Asap,
        subtotal: Price::new(450),
        delivery_cost: Price::ZERO,
        payment_method: PaymentMethod::Unspecified,
        cash_amount: None,
        user_id: UserId::new(20),
    }
}

async fn place(harness: &Harness, created_at: &str, body: &str) -> OrderId {
    OrderRepository::new(harness.pool())
        .append(&order(created_at, body))
        .await
        .unwrap()
}

/// Orders on 1, 10, 13 and 14 March 2025; "now" is 14 March noon.
async fn spread_orders(harness: &Harness) {
    place(harness, "2025-03-01 18:00", "March first").await;
    place(harness, "2025-03-10 18:00", "March tenth").await;
    place(harness, "2025-03-13 18:00", "Yesterday").await;
    place(harness, "2025-03-14 10:00", "This morning").await;
}

async fn open_review(harness: &Harness) -> hearty_house_bot::transport::MessageRef {
    let out = harness.text(ADMIN, "/admin").await;
    let panel = last_message_id(&out, ADMIN).unwrap();
    let out = harness.press(ADMIN, "adm:orders", Some(panel)).await;
    assert!(last_screen(&out).unwrap().text().unwrap().contains("Choose a period"));
    panel
}

async fn review_text(harness: &Harness, screen: hearty_house_bot::transport::MessageRef, data: &str) -> String {
    let out = harness.press(ADMIN, data, Some(screen)).await;
    last_screen(&out).unwrap().text().unwrap().to_string()
}

#[tokio::test]
async fn test_presets_filter_by_local_date() {
    let harness = Harness::new().await;
    spread_orders(&harness).await;
    let screen = open_review(&harness).await;

    let today = review_text(&harness, screen, "ord:today").await;
    assert!(today.contains("This morning"));
    assert!(!today.contains("Yesterday"));

    let three_days = review_text(&harness, screen, "ord:3days").await;
    assert!(three_days.contains("Yesterday"));
    assert!(!three_days.contains("March tenth"));

    let week = review_text(&harness, screen, "ord:week").await;
    assert!(week.contains("March tenth"));
    assert!(!week.contains("March first"));

    let all = review_text(&harness, screen, "ord:all").await;
    assert!(all.contains("March first"));
    // Newest first by default.
    assert!(all.find("This morning").unwrap() < all.find("March first").unwrap());
}

#[tokio::test]
async fn test_custom_range() {
    let harness = Harness::new().await;
    spread_orders(&harness).await;
    let screen = open_review(&harness).await;

    harness.press(ADMIN, "ord:range", Some(screen)).await;
    assert_eq!(
        harness.session(ADMIN).await.step,
        Step::Admin(AdminStep::EnteringDateFrom)
    );

    let out = harness.text(ADMIN, "31.02.2025").await;
    assert!(last_screen(&out).unwrap().text().unwrap().starts_with("Invalid date"));

    harness.text(ADMIN, "01.03.2025").await;
    assert_eq!(
        harness.session(ADMIN).await.step,
        Step::Admin(AdminStep::EnteringDateTo)
    );

    let out = harness.text(ADMIN, "28.02.2025").await;
    assert!(last_screen(&out).unwrap().text().unwrap().contains("cannot be before"));
    assert_eq!(
        harness.session(ADMIN).await.step,
        Step::Admin(AdminStep::EnteringDateTo)
    );

    let out = harness.text(ADMIN, "10.03.2025").await;
    let text = last_screen(&out).unwrap().text().unwrap();
    assert!(text.contains("01.03.2025 - 10.03.2025"));
    assert!(text.contains("March first"));
    assert!(text.contains("March tenth"));
    assert!(!text.contains("Yesterday"));
    assert_eq!(
        harness.session(ADMIN).await.step,
        Step::Admin(AdminStep::ReviewingOrders)
    );
}

#[tokio::test]
async fn test_paging_is_clamped() {
    let harness = Harness::new().await;
    for n in 0..30 {
        place(&harness, "2025-03-14 11:00", &format!("Dish number {n}")).await;
    }
    let screen = open_review(&harness).await;

    let first = review_text(&harness, screen, "ord:today").await;
    assert!(first.contains("(page 1/"));

    let second = review_text(&harness, screen, "ord:page:1").await;
    assert!(second.contains("(page 2/"));

    let out = harness.press(ADMIN, "ord:page:1", Some(screen)).await;
    assert_eq!(notice(&out).unwrap().text, "This page is already open");

    let out = harness.press(ADMIN, "ord:page:99", Some(screen)).await;
    let last = last_screen(&out).unwrap();
    let text = last.text().unwrap();
    let pages = text
        .split("(page ")
        .nth(1)
        .and_then(|s| s.split(')').next())
        .unwrap();
    let (current, total) = pages.split_once('/').unwrap();
    assert_eq!(current, total);
    assert!(!last.button_data().iter().any(|d| d == &format!("ord:page:{total}")));
}

#[tokio::test]
async fn test_empty_period_and_stale_paging() {
    let harness = Harness::new().await;
    let screen = open_review(&harness).await;

    let out = harness.press(ADMIN, "ord:page:1", Some(screen)).await;
    assert_eq!(notice(&out).unwrap().text, "This action is no longer available");

    let text = review_text(&harness, screen, "ord:today").await;
    assert_eq!(text, "No orders for the selected period.");
}

#[tokio::test]
async fn test_customers_cannot_review_orders() {
    let harness = Harness::new().await;
    spread_orders(&harness).await;

    let out = harness.press(20, "ord:all", None).await;
    assert_eq!(out.len(), 1);
    assert!(notice(&out).is_none());
}
