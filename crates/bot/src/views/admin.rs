//! Staff panel screens.

use hearty_house_core::markup::escape_html;
use hearty_house_core::menu::{Menu, MenuCategory};

use super::{LISTING_CHARS, button, push_line, quoted, rows};
use crate::config::BotConfig;
use crate::models::Callback;
use crate::models::callback::AdminAction;
use crate::transport::{Button, Reply};

fn panel_keyboard() -> Vec<Vec<Button>> {
    [
        ("📋 View menu", AdminAction::ViewMenu),
        ("➕ Add category", AdminAction::AddCategory),
        ("➖ Delete category", AdminAction::DeleteCategory),
        ("➕ Add dish", AdminAction::AddItem),
        ("➖ Delete dish", AdminAction::DeleteItem),
        ("📦 View orders", AdminAction::ViewOrders),
        ("📢 Broadcast", AdminAction::Broadcast),
    ]
    .into_iter()
    .map(|(label, action)| vec![button(label, Callback::Admin(action))])
    .collect()
}

fn back_to_panel() -> Vec<Button> {
    vec![button("⬅ Admin panel", Callback::Admin(AdminAction::Panel))]
}

pub fn panel(config: &BotConfig) -> Reply {
    Reply::html(format!(
        "<b>Admin panel - {}</b>",
        escape_html(&config.restaurant_name)
    ))
    .with_buttons(panel_keyboard())
}

/// A one-line result followed by the panel buttons.
pub fn outcome(text: impl Into<String>) -> Reply {
    Reply::html(text).with_buttons(panel_keyboard())
}

pub fn menu_overview(config: &BotConfig, menu: &Menu) -> Reply {
    let mut text = String::from("<b>Current menu</b>\n\n");
    if menu.categories.is_empty() {
        text.push_str("The menu is empty.");
        return outcome(text);
    }

    'categories: for category in &menu.categories {
        if !push_line(
            &mut text,
            &format!("<b>{}</b>", escape_html(&category.name)),
            LISTING_CHARS,
        ) {
            break;
        }
        for item in &category.items {
            let mut line = format!(
                "• {} - {}",
                escape_html(&item.name),
                item.price.display(&config.currency_symbol)
            );
            if !item.description.is_empty() {
                line.push_str(&format!("\n  <i>{}</i>", escape_html(&item.description)));
            }
            if !push_line(&mut text, &line, LISTING_CHARS) {
                break 'categories;
            }
        }
        text.push('\n');
    }
    outcome(text)
}

/// Category buttons two per row, optionally with a "new category" button.
pub fn category_picker(
    prompt: &str,
    categories: &[String],
    action: fn(usize) -> AdminAction,
    new_category: bool,
) -> Reply {
    let buttons = categories
        .iter()
        .enumerate()
        .map(|(i, name)| button(name, Callback::Admin(action(i))))
        .collect();
    let mut keyboard = rows(buttons, 2);
    if new_category {
        keyboard.push(vec![button(
            "➕ New category",
            Callback::Admin(AdminAction::AddItemNewCategory),
        )]);
    }
    keyboard.push(back_to_panel());
    Reply::text(prompt).with_buttons(keyboard)
}

/// Numbered dishes of a category, asking which one to delete.
pub fn delete_item_list(config: &BotConfig, category: &MenuCategory) -> Reply {
    let mut text = format!("<b>Dishes in {}</b>:\n\n", quoted(&category.name));
    for (n, item) in category.items.iter().enumerate() {
        text.push_str(&format!(
            "{}. {} - {}\n",
            n + 1,
            escape_html(&item.name),
            item.price.display(&config.currency_symbol)
        ));
    }
    text.push_str("\nEnter the number of the dish to delete:");
    Reply::html(text).with_buttons(vec![back_to_panel()])
}

pub fn prompt(text: &str) -> Reply {
    Reply::text(text).with_buttons(vec![back_to_panel()])
}
