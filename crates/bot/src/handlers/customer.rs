//! Customer onboarding, menu browsing and the cart.

use hearty_house_core::Phone;
use hearty_house_core::cart::CartLine;

use super::{BotService, CallbackResult, Turn};
use crate::db::{MenuRepository, UserRepository};
use crate::error::AppError;
use crate::models::{Browsing, Callback, Session, Step};
use crate::transport::{Notice, Sender, Transport};
use crate::views;

impl<T: Transport> BotService<T> {
    /// `/start`: greet, then either show the menu or ask for a phone.
    #[tracing::instrument(skip_all, fields(user_id = %turn.chat()))]
    pub(super) async fn start(&self, turn: Turn<'_>, session: &mut Session) -> Result<(), AppError> {
        if let Some(photo) = &self.state.config().welcome_photo {
            if let Err(err) = self.transport.send_photo(turn.chat(), photo).await {
                tracing::warn!(error = %err, "Failed to send welcome photo");
            }
        }

        let user = UserRepository::new(self.state.pool()).get(turn.chat()).await?;
        session.reset();

        match user.and_then(|u| u.phone) {
            Some(phone) => {
                session.phone = Some(phone);
                self.show_categories(turn, session).await?;
            }
            None => {
                session.phone = None;
                session.step = Step::AwaitingPhone;
                self.send(turn.chat(), &views::customer::phone_request(self.state.config()))
                    .await?;
            }
        }
        Ok(())
    }

    /// A shared contact: store the phone and continue to the menu.
    #[tracing::instrument(skip_all, fields(user_id = %from.id))]
    pub(super) async fn on_contact(
        &self,
        from: &Sender,
        session: &mut Session,
        raw_phone: &str,
    ) -> Result<(), AppError> {
        let turn = Turn { from, origin: None };
        if session.step.in_checkout() || matches!(session.step, Step::Admin(_)) {
            self.send(turn.chat(), &views::customer::use_buttons()).await?;
            return Ok(());
        }

        let Ok(phone) = Phone::parse(raw_phone) else {
            self.send(turn.chat(), &views::customer::invalid_phone()).await?;
            return Ok(());
        };

        UserRepository::new(self.state.pool())
            .save_phone(turn.chat(), &phone)
            .await?;
        tracing::info!("Customer phone saved");

        let resume_checkout = session.step == Step::AwaitingPhone && !session.cart.is_empty();
        session.phone = Some(phone.clone());
        session.step = Step::Browsing;
        self.send(turn.chat(), &views::customer::phone_saved(&phone)).await?;

        if resume_checkout {
            self.begin_checkout(turn, session).await?;
        } else {
            self.show_categories(turn, session).await?;
        }
        Ok(())
    }

    /// Menu and cart buttons.
    pub(super) async fn on_browse_action(
        &self,
        turn: Turn<'_>,
        session: &mut Session,
        callback: Callback,
    ) -> CallbackResult {
        if session.step.in_checkout() {
            let notice = match callback {
                Callback::AddItem(_) | Callback::ClearCart => {
                    Notice::alert("Finish or cancel the current order before changing the cart.")
                }
                _ => Notice::toast(views::STALE_ACTION),
            };
            return Ok(Some(notice));
        }

        match callback {
            Callback::Category(index) => self.open_category(turn, session, index).await,
            Callback::AddItem(index) => Ok(Some(add_to_cart(session, index))),
            Callback::Menu => {
                self.show_categories(turn, session).await?;
                Ok(None)
            }
            Callback::Cart => {
                if session.cart.is_empty() {
                    return Ok(Some(Notice::alert("Your cart is empty")));
                }
                self.show(turn, &views::customer::cart(self.state.config(), &session.cart))
                    .await?;
                Ok(None)
            }
            Callback::ClearCart => {
                session.cart.clear();
                self.show_categories(turn, session).await?;
                Ok(Some(Notice::toast("Cart cleared")))
            }
            Callback::Checkout => self.begin_checkout(turn, session).await,
            _ => Ok(Some(Notice::toast(views::STALE_ACTION))),
        }
    }

    async fn open_category(&self, turn: Turn<'_>, session: &mut Session, index: usize) -> CallbackResult {
        let Some(name) = session.shown_categories.get(index).cloned() else {
            return Ok(Some(Notice::toast(views::STALE_ACTION)));
        };

        let menu = MenuRepository::new(self.state.pool()).read().await?;
        let Some(category) = menu.category(&name) else {
            return Ok(Some(Notice::toast(views::STALE_ACTION)));
        };
        if category.items.is_empty() {
            return Ok(Some(Notice::toast("This category is empty")));
        }

        self.show(turn, &views::customer::category_page(self.state.config(), category))
            .await?;
        session.browsing = Some(Browsing {
            category: category.name.clone(),
            items: category.items.clone(),
        });
        if matches!(session.step, Step::Admin(_)) {
            session.step = Step::Browsing;
        }
        Ok(None)
    }
}

/// Add the `index`-th item of the open category.
fn add_to_cart(session: &mut Session, index: usize) -> Notice {
    let Some(browsing) = &session.browsing else {
        return Notice::alert("Open a category first.");
    };
    let Some(item) = browsing.items.get(index) else {
        return Notice::toast(views::STALE_ACTION);
    };
    let line = CartLine::from_item(item, &browsing.category);
    let notice = Notice::toast(format!("Added: {}", item.name));
    session.cart.add(line);
    notice
}
