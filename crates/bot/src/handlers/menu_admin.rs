//! Staff panel and menu editing wizards.
//!
//! Edits load the stored menu, change it in memory and write the whole menu
//! back. Pickers remember the category names they showed so a button index
//! always maps to the name the staff member actually saw.

use hearty_house_core::Price;
use hearty_house_core::menu::{MenuError, MenuItem, normalize_description, parse_item_index};

use super::{BotService, CallbackResult, Turn};
use crate::db::MenuRepository;
use crate::error::AppError;
use crate::models::callback::AdminAction;
use crate::models::{AdminStep, Session, Step};
use crate::transport::{Notice, Transport};
use crate::views;
use crate::views::admin;
use crate::views::quoted;

const ITEM_NAME_PROMPT: &str = "Enter the dish name:";
const ITEM_PRICE_PROMPT: &str = "Enter the price, digits only:";
const INVALID_PRICE: &str = "The price must be a positive whole number, digits only.";

impl<T: Transport> BotService<T> {
    /// `/admin`. Silently ignored for everyone else.
    pub(super) async fn admin_panel(&self, turn: Turn<'_>, session: &mut Session) -> Result<(), AppError> {
        let config = self.state.config();
        if !config.is_admin(turn.chat()) {
            tracing::debug!("Ignoring /admin from non-admin");
            return Ok(());
        }
        session.abandon_checkout();
        session.reset_admin();
        self.send(turn.chat(), &admin::panel(config)).await?;
        Ok(())
    }

    pub(super) async fn on_menu_admin_action(
        &self,
        turn: Turn<'_>,
        session: &mut Session,
        action: AdminAction,
    ) -> CallbackResult {
        let config = self.state.config();
        let repo = MenuRepository::new(self.state.pool());

        match action {
            AdminAction::Panel => {
                session.abandon_checkout();
                session.reset_admin();
                self.show(turn, &admin::panel(config)).await?;
            }
            AdminAction::ViewMenu => {
                let menu = repo.read().await?;
                self.show(turn, &admin::menu_overview(config, &menu)).await?;
            }
            AdminAction::AddCategory => {
                session.reset_admin();
                session.step = Step::Admin(AdminStep::EnteringCategoryName);
                self.show(turn, &admin::prompt("Enter the new category name:")).await?;
            }
            AdminAction::DeleteCategory => {
                session.reset_admin();
                let menu = repo.read().await?;
                if menu.categories.is_empty() {
                    self.show(turn, &admin::outcome("The menu is empty, nothing to delete."))
                        .await?;
                    return Ok(None);
                }
                session.admin.categories = menu.categories.iter().map(|c| c.name.clone()).collect();
                session.step = Step::Admin(AdminStep::ChoosingCategoryToDelete);
                let reply = admin::category_picker(
                    "Which category should be deleted?",
                    &session.admin.categories,
                    AdminAction::DeleteCategoryPick,
                    false,
                );
                self.show(turn, &reply).await?;
            }
            AdminAction::DeleteCategoryPick(index) => {
                if session.step != Step::Admin(AdminStep::ChoosingCategoryToDelete) {
                    return Ok(Some(Notice::toast(views::STALE_ACTION)));
                }
                let Some(name) = session.admin.categories.get(index).cloned() else {
                    return Ok(Some(Notice::toast(views::STALE_ACTION)));
                };
                let mut menu = repo.read().await?;
                let text = match menu.remove_category(&name) {
                    Ok(()) => {
                        repo.replace(&menu).await?;
                        tracing::info!(category = %name, "Category deleted");
                        format!("Category {} deleted.", quoted(&name))
                    }
                    Err(MenuError::CategoryNotEmpty { .. }) => format!(
                        "Category {} still has dishes. Delete them first.",
                        quoted(&name)
                    ),
                    Err(_) => "Category not found.".to_string(),
                };
                session.reset_admin();
                self.show(turn, &admin::outcome(text)).await?;
            }
            AdminAction::AddItem => {
                session.reset_admin();
                let menu = repo.read().await?;
                if menu.categories.is_empty() {
                    self.show(turn, &admin::outcome("The menu is empty. Add a category first."))
                        .await?;
                    return Ok(None);
                }
                session.admin.categories = menu.categories.iter().map(|c| c.name.clone()).collect();
                session.step = Step::Admin(AdminStep::ChoosingItemCategory);
                let reply = admin::category_picker(
                    "Which category does the dish belong to?",
                    &session.admin.categories,
                    AdminAction::AddItemCategory,
                    true,
                );
                self.show(turn, &reply).await?;
            }
            AdminAction::AddItemCategory(index) => {
                if session.step != Step::Admin(AdminStep::ChoosingItemCategory) {
                    return Ok(Some(Notice::toast(views::STALE_ACTION)));
                }
                let Some(name) = session.admin.categories.get(index).cloned() else {
                    return Ok(Some(Notice::toast(views::STALE_ACTION)));
                };
                session.admin.category = Some(name);
                session.step = Step::Admin(AdminStep::EnteringItemName);
                self.show(turn, &admin::prompt(ITEM_NAME_PROMPT)).await?;
            }
            AdminAction::AddItemNewCategory => {
                if session.step != Step::Admin(AdminStep::ChoosingItemCategory) {
                    return Ok(Some(Notice::toast(views::STALE_ACTION)));
                }
                session.step = Step::Admin(AdminStep::EnteringNewItemCategory);
                self.show(turn, &admin::prompt("Enter the new category name:")).await?;
            }
            AdminAction::DeleteItem => {
                session.reset_admin();
                let menu = repo.read().await?;
                if menu.item_count() == 0 {
                    self.show(turn, &admin::outcome("The menu has no dishes.")).await?;
                    return Ok(None);
                }
                session.admin.categories = menu.categories.iter().map(|c| c.name.clone()).collect();
                session.step = Step::Admin(AdminStep::ChoosingDeleteItemCategory);
                let reply = admin::category_picker(
                    "Which category is the dish in?",
                    &session.admin.categories,
                    AdminAction::DeleteItemCategory,
                    false,
                );
                self.show(turn, &reply).await?;
            }
            AdminAction::DeleteItemCategory(index) => {
                if session.step != Step::Admin(AdminStep::ChoosingDeleteItemCategory) {
                    return Ok(Some(Notice::toast(views::STALE_ACTION)));
                }
                let Some(name) = session.admin.categories.get(index).cloned() else {
                    return Ok(Some(Notice::toast(views::STALE_ACTION)));
                };
                let menu = repo.read().await?;
                let Some(category) = menu.category(&name).filter(|c| !c.items.is_empty()) else {
                    return Ok(Some(Notice::alert("This category has no dishes.")));
                };
                self.show(turn, &admin::delete_item_list(config, category)).await?;
                session.admin.category = Some(name);
                session.step = Step::Admin(AdminStep::EnteringDeleteItemIndex);
            }
            AdminAction::ViewOrders | AdminAction::Broadcast => {
                return Ok(Some(Notice::toast(views::STALE_ACTION)));
            }
        }
        Ok(None)
    }

    /// Typed answers inside the menu wizards.
    #[tracing::instrument(skip(self, turn, session, text), fields(user_id = %turn.chat()))]
    pub(super) async fn on_menu_admin_text(
        &self,
        turn: Turn<'_>,
        session: &mut Session,
        step: AdminStep,
        text: &str,
    ) -> Result<(), AppError> {
        let config = self.state.config();
        let repo = MenuRepository::new(self.state.pool());
        let chat = turn.chat();

        match step {
            AdminStep::EnteringCategoryName => {
                let mut menu = repo.read().await?;
                match menu.add_category(text) {
                    Ok(()) => {
                        repo.replace(&menu).await?;
                        let name = text.trim();
                        tracing::info!(category = %name, "Category added");
                        session.reset_admin();
                        self.send(chat, &admin::outcome(format!("Category {} added.", quoted(name))))
                            .await?;
                    }
                    Err(MenuError::DuplicateCategory(name)) => {
                        self.send(
                            chat,
                            &admin::prompt(&format!(
                                "Category «{name}» already exists. Enter another name:"
                            )),
                        )
                        .await?;
                    }
                    Err(_) => {
                        self.send(chat, &admin::prompt("The name cannot be empty. Enter the category name:"))
                            .await?;
                    }
                }
            }
            AdminStep::EnteringNewItemCategory => {
                let name = text.trim();
                if name.is_empty() {
                    self.send(chat, &admin::prompt("The name cannot be empty. Enter the category name:"))
                        .await?;
                    return Ok(());
                }
                session.admin.category = Some(name.to_string());
                session.step = Step::Admin(AdminStep::EnteringItemName);
                self.send(chat, &admin::prompt(ITEM_NAME_PROMPT)).await?;
            }
            AdminStep::EnteringItemName => {
                let name = text.trim();
                if name.is_empty() {
                    self.send(chat, &admin::prompt(ITEM_NAME_PROMPT)).await?;
                    return Ok(());
                }
                session.admin.item_name = Some(name.to_string());
                session.step = Step::Admin(AdminStep::EnteringItemPrice);
                self.send(chat, &admin::prompt(ITEM_PRICE_PROMPT)).await?;
            }
            AdminStep::EnteringItemPrice => {
                let Ok(price) = Price::parse_menu_price(text) else {
                    self.send(chat, &admin::prompt(INVALID_PRICE)).await?;
                    return Ok(());
                };
                session.admin.item_price = Some(price);
                session.step = Step::Admin(AdminStep::EnteringItemDescription);
                self.send(
                    chat,
                    &admin::prompt("Enter a description (or «none»):"),
                )
                .await?;
            }
            AdminStep::EnteringItemDescription => {
                let draft = &session.admin;
                let (Some(category), Some(name), Some(price)) =
                    (draft.category.clone(), draft.item_name.clone(), draft.item_price)
                else {
                    session.reset_admin();
                    self.send(chat, &admin::outcome("The dish draft was lost. Please start again."))
                        .await?;
                    return Ok(());
                };
                let item = MenuItem {
                    name: name.clone(),
                    price,
                    description: normalize_description(text),
                };

                let mut menu = repo.read().await?;
                let text = match menu.add_item(&category, item) {
                    Ok(()) => {
                        repo.replace(&menu).await?;
                        tracing::info!(category = %category, dish = %name, "Dish added");
                        format!("Dish {} added to {}.", quoted(&name), quoted(&category))
                    }
                    Err(_) => "The dish could not be added.".to_string(),
                };
                session.reset_admin();
                self.send(chat, &admin::outcome(text)).await?;
            }
            AdminStep::EnteringDeleteItemIndex => {
                let Some(category) = session.admin.category.clone() else {
                    session.reset_admin();
                    self.send(chat, &admin::panel(config)).await?;
                    return Ok(());
                };
                let mut menu = repo.read().await?;
                let removed = parse_item_index(text).and_then(|n| menu.remove_item(&category, n));
                let text = match removed {
                    Ok(item) => {
                        repo.replace(&menu).await?;
                        tracing::info!(category = %category, dish = %item.name, "Dish deleted");
                        format!("Removed: {}", quoted(&item.name))
                    }
                    Err(_) => "Invalid number.".to_string(),
                };
                session.reset_admin();
                self.send(chat, &admin::outcome(text)).await?;
            }
            AdminStep::Panel
            | AdminStep::ChoosingCategoryToDelete
            | AdminStep::ChoosingItemCategory
            | AdminStep::ChoosingDeleteItemCategory
            | AdminStep::ReviewingOrders
            | AdminStep::EnteringDateFrom
            | AdminStep::EnteringDateTo
            | AdminStep::EnteringBroadcast => {
                session.reset_admin();
                self.send(chat, &admin::panel(config)).await?;
            }
        }
        Ok(())
    }
}
