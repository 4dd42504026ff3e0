//! Staff conversations: menu editing and broadcasts.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use hearty_house_bot::models::{AdminStep, Step};
use hearty_house_core::UserId;
use hearty_house_integration_tests::{
    ADMIN, Harness, last_message_id, last_screen, notice, sample_menu,
};

const CUSTOMER: i64 = 20;

async fn open_panel(harness: &Harness) -> hearty_house_bot::transport::MessageRef {
    let out = harness.text(ADMIN, "/admin").await;
    assert!(last_screen(&out).unwrap().text().unwrap().contains("Admin panel"));
    last_message_id(&out, ADMIN).unwrap()
}

fn last_text(out: &[hearty_house_integration_tests::Outbound]) -> String {
    last_screen(out).unwrap().text().unwrap().to_string()
}

#[tokio::test]
async fn test_non_admins_cannot_reach_the_panel() {
    let harness = Harness::new().await;
    harness.seed_menu(&sample_menu()).await;

    assert!(harness.text(CUSTOMER, "/admin").await.is_empty());

    let out = harness.press(CUSTOMER, "adm:delcat:0", None).await;
    assert_eq!(out.len(), 1);
    assert!(notice(&out).is_none());
    assert_eq!(harness.menu().await, sample_menu());
}

#[tokio::test]
async fn test_add_category_then_dish() {
    let harness = Harness::new().await;
    let panel = open_panel(&harness).await;

    harness.press(ADMIN, "adm:addcat", Some(panel)).await;
    assert_eq!(
        harness.session(ADMIN).await.step,
        Step::Admin(AdminStep::EnteringCategoryName)
    );
    let out = harness.text(ADMIN, "Soups").await;
    assert_eq!(last_text(&out), "Category «Soups» added.");
    assert_eq!(harness.session(ADMIN).await.step, Step::Admin(AdminStep::Panel));

    harness.press(ADMIN, "adm:addcat", Some(panel)).await;
    let out = harness.text(ADMIN, "Soups").await;
    assert!(last_text(&out).contains("already exists"));
    assert_eq!(
        harness.session(ADMIN).await.step,
        Step::Admin(AdminStep::EnteringCategoryName)
    );
    harness.text(ADMIN, "cancel").await;

    let out = harness.press(ADMIN, "adm:additem", Some(panel)).await;
    assert_eq!(
        last_screen(&out).unwrap().button_data(),
        vec!["adm:additem:0", "adm:additem:new", "adm:panel"]
    );
    harness.press(ADMIN, "adm:additem:0", Some(panel)).await;
    harness.text(ADMIN, "Borscht").await;

    let out = harness.text(ADMIN, "12a").await;
    assert!(last_text(&out).contains("positive whole number"));
    let out = harness.text(ADMIN, "0").await;
    assert!(last_text(&out).contains("positive whole number"));

    harness.text(ADMIN, "450").await;
    let out = harness.text(ADMIN, "With sour cream").await;
    assert_eq!(last_text(&out), "Dish «Borscht» added to «Soups».");

    let menu = harness.menu().await;
    let soups = menu.category("Soups").unwrap();
    assert_eq!(soups.items.len(), 1);
    assert_eq!(soups.items[0].price.amount(), 450);
    assert_eq!(soups.items[0].description, "With sour cream");
}

#[tokio::test]
async fn test_dish_in_a_new_category() {
    let harness = Harness::new().await;
    harness.seed_menu(&sample_menu()).await;
    let panel = open_panel(&harness).await;

    harness.press(ADMIN, "adm:additem", Some(panel)).await;
    harness.press(ADMIN, "adm:additem:new", Some(panel)).await;
    harness.text(ADMIN, "Drinks").await;
    harness.text(ADMIN, "Kvass").await;
    harness.text(ADMIN, "120").await;
    harness.text(ADMIN, "NONE").await;

    let menu = harness.menu().await;
    assert_eq!(menu.categories.last().unwrap().name, "Drinks");
    let kvass = &menu.category("Drinks").unwrap().items[0];
    assert_eq!(kvass.name, "Kvass");
    assert!(kvass.description.is_empty());
}

#[tokio::test]
async fn test_only_empty_categories_can_be_deleted() {
    let harness = Harness::new().await;
    harness.seed_menu(&sample_menu()).await;
    let panel = open_panel(&harness).await;

    harness.press(ADMIN, "adm:delcat", Some(panel)).await;
    let out = harness.press(ADMIN, "adm:delcat:0", Some(panel)).await;
    assert!(last_text(&out).contains("still has dishes"));
    assert_eq!(harness.menu().await.categories.len(), 3);

    harness.press(ADMIN, "adm:delcat", Some(panel)).await;
    let out = harness.press(ADMIN, "adm:delcat:2", Some(panel)).await;
    assert_eq!(last_text(&out), "Category «Desserts» deleted.");
    assert!(harness.menu().await.category("Desserts").is_none());

    // The picker is gone; its buttons are stale now.
    let out = harness.press(ADMIN, "adm:delcat:1", Some(panel)).await;
    assert_eq!(notice(&out).unwrap().text, "This action is no longer available");
}

#[tokio::test]
async fn test_delete_dish_by_number() {
    let harness = Harness::new().await;
    harness.seed_menu(&sample_menu()).await;
    let panel = open_panel(&harness).await;

    harness.press(ADMIN, "adm:delitem", Some(panel)).await;
    let out = harness.press(ADMIN, "adm:delitem:0", Some(panel)).await;
    assert!(last_text(&out).contains("1. Borscht - 450 ₽\n2. Solyanka - 490 ₽"));

    let out = harness.text(ADMIN, "5").await;
    assert_eq!(last_text(&out), "Invalid number.");
    assert_eq!(harness.menu().await, sample_menu());

    harness.press(ADMIN, "adm:delitem", Some(panel)).await;
    harness.press(ADMIN, "adm:delitem:0", Some(panel)).await;
    let out = harness.text(ADMIN, "1").await;
    assert_eq!(last_text(&out), "Removed: «Borscht»");

    let menu = harness.menu().await;
    let names: Vec<_> = menu
        .category("Soups")
        .unwrap()
        .items
        .iter()
        .map(|i| i.name.as_str())
        .collect();
    assert_eq!(names, vec!["Solyanka"]);

    let out = harness.press(ADMIN, "adm:delitem:2", Some(panel)).await;
    assert_eq!(notice(&out).unwrap().text, "This action is no longer available");
}

#[tokio::test]
async fn test_cancel_returns_to_panel() {
    let harness = Harness::new().await;
    let panel = open_panel(&harness).await;
    harness.press(ADMIN, "adm:addcat", Some(panel)).await;

    let out = harness.text(ADMIN, "/cancel").await;
    assert_eq!(last_text(&out), "Cancelled.");
    assert_eq!(harness.session(ADMIN).await.step, Step::Admin(AdminStep::Panel));
    assert!(harness.menu().await.categories.is_empty());
}

#[tokio::test]
async fn test_broadcast_reports_delivery() {
    let harness = Harness::new().await;
    for user in [20, 21, 22] {
        harness.register(user, &format!("+7900123450{user}")).await;
    }
    harness.transport().block(UserId::new(22));
    let panel = open_panel(&harness).await;

    harness.press(ADMIN, "adm:broadcast", Some(panel)).await;
    let out = harness.text(ADMIN, "We open at 9 tomorrow").await;

    let delivered: Vec<_> = out
        .iter()
        .filter(|o| o.text() == Some("We open at 9 tomorrow"))
        .filter_map(hearty_house_integration_tests::Outbound::chat)
        .collect();
    assert_eq!(delivered.len(), 2);
    assert!(!delivered.contains(&UserId::new(22)));

    assert_eq!(last_text(&out), "Broadcast finished: delivered 2, failed 1.");
    assert_eq!(harness.session(ADMIN).await.step, Step::Admin(AdminStep::Panel));
}
