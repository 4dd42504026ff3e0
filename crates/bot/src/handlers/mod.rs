//! Conversation handlers.
//!
//! [`BotService::handle`] is the single entry point for inbound events. It
//! loads the sender's session, routes the event, and stores the session back
//! only when handling succeeded, so a failed step can simply be retried.
//!
//! # Modules
//!
//! - [`customer`] - `/start`, phone onboarding, menu browsing and the cart
//! - [`checkout`] - The checkout state machine
//! - [`menu_admin`] - Staff panel and menu editing
//! - [`orders`] - Staff order review
//! - [`broadcast`] - Staff message to every customer

pub mod broadcast;
pub mod checkout;
pub mod customer;
pub mod menu_admin;
pub mod orders;

use hearty_house_core::UserId;
use hearty_house_core::schedule::restaurant_status;

use crate::db::MenuRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::callback::{AdminAction, OrdersAction};
use crate::models::session::is_cancel;
use crate::models::{AdminStep, Callback, Session, Step};
use crate::state::AppState;
use crate::transport::{Inbound, InboundKind, MessageRef, Notice, Reply, Sender, Transport, TransportError};
use crate::views;

/// Result of handling a button press: an optional toast for the button.
pub type CallbackResult = Result<Option<Notice>, AppError>;

/// Where a screen should be drawn.
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    pub from: &'a Sender,
    /// The message the pressed button belongs to. Screens replace it in
    /// place; without it they are sent as new messages.
    pub origin: Option<MessageRef>,
}

impl Turn<'_> {
    #[must_use]
    pub const fn chat(&self) -> UserId {
        self.from.id
    }
}

/// How a screen ended up on the user's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shown {
    Sent,
    Edited,
    /// The message already showed exactly this.
    Unchanged,
}

/// The bot: state plus a way to talk back.
pub struct BotService<T> {
    state: AppState,
    transport: T,
}

impl<T: Transport> BotService<T> {
    #[must_use]
    pub const fn new(state: AppState, transport: T) -> Self {
        Self { state, transport }
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Handle one inbound event to completion.
    ///
    /// Errors are reported here: the user gets a generic message, the
    /// failure goes to the logs and Sentry, and the session is left as it was.
    #[tracing::instrument(skip(self, inbound), fields(user_id = %inbound.from.id))]
    pub async fn handle(&self, inbound: Inbound) {
        let Inbound { from, kind } = inbound;
        set_sentry_user(from.id, from.username.as_deref());

        let sessions = self.state.sessions();
        let mut session = sessions.load(from.id).await;

        let outcome = match kind {
            InboundKind::Text(text) => self.on_text(&from, &mut session, &text).await,
            InboundKind::Contact { phone } => self.on_contact(&from, &mut session, &phone).await,
            InboundKind::Callback { id, data, message } => {
                let turn = Turn {
                    from: &from,
                    origin: message,
                };
                let result = self.on_callback(turn, &mut session, &data).await;
                let notice = match &result {
                    Ok(notice) => notice.clone(),
                    Err(_) => None,
                };
                if let Err(err) = self.transport.answer_callback(&id, notice.as_ref()).await {
                    tracing::warn!(error = %err, "Failed to answer callback");
                }
                result.map(|_| ())
            }
        };

        match outcome {
            Ok(()) => sessions.save(from.id, session).await,
            Err(err) => {
                err.report(from.id);
                if let Err(send_err) = self
                    .transport
                    .send_message(from.id, &Reply::text(err.user_message()))
                    .await
                {
                    tracing::warn!(error = %send_err, "Failed to report failure to user");
                }
            }
        }
    }

    async fn on_text(&self, from: &Sender, session: &mut Session, text: &str) -> Result<(), AppError> {
        let turn = Turn { from, origin: None };

        if is_cancel(text) {
            return self.cancel(turn, session).await;
        }

        let word = text.split_whitespace().next().unwrap_or_default();
        let command = word.split('@').next().unwrap_or(word);
        if command.starts_with('/') {
            if session.step.in_checkout() {
                self.send(turn.chat(), &views::customer::checkout_guidance()).await?;
                return Ok(());
            }
            return match command {
                "/start" => self.start(turn, session).await,
                "/menu" => self.show_categories(turn, session).await.map(|_| ()),
                "/admin" => self.admin_panel(turn, session).await,
                _ => {
                    self.send(turn.chat(), &views::customer::use_buttons()).await?;
                    Ok(())
                }
            };
        }

        match session.step {
            Step::AwaitingPhone => {
                self.send(turn.chat(), &views::customer::phone_reminder()).await?;
                Ok(())
            }
            Step::EnteringAddress => self.enter_address(turn, session, text).await,
            Step::EnteringCashAmount => self.enter_cash_amount(turn, session, text).await,
            Step::EnteringComment => self.enter_comment(turn, session, text).await,
            Step::ChoosingDeliveryType
            | Step::ChoosingAddress
            | Step::ChoosingPrepTime
            | Step::ChoosingPaymentMethod => {
                self.send(turn.chat(), &views::customer::use_buttons()).await?;
                Ok(())
            }
            Step::Admin(step) => self.on_admin_text(turn, session, step, text).await,
            Step::Browsing => self.show_categories(turn, session).await.map(|_| ()),
        }
    }

    async fn on_callback(&self, turn: Turn<'_>, session: &mut Session, data: &str) -> CallbackResult {
        let Ok(callback) = data.parse::<Callback>() else {
            tracing::debug!(data, "Unrecognized callback data");
            return Ok(Some(Notice::toast(views::STALE_ACTION)));
        };

        match callback {
            Callback::Admin(action) => self.on_admin_action(turn, session, action).await,
            Callback::Orders(action) => self.on_orders_action(turn, session, action).await,
            Callback::Cancel => {
                self.cancel(turn, session).await?;
                Ok(Some(Notice::toast("Cancelled")))
            }
            Callback::Category(_)
            | Callback::AddItem(_)
            | Callback::Menu
            | Callback::Cart
            | Callback::ClearCart
            | Callback::Checkout => self.on_browse_action(turn, session, callback).await,
            Callback::DeliveryType(_)
            | Callback::SavedAddress(_)
            | Callback::NewAddress
            | Callback::Slot(_)
            | Callback::Asap
            | Callback::Payment(_) => self.on_checkout_action(turn, session, callback).await,
        }
    }

    async fn on_admin_action(
        &self,
        turn: Turn<'_>,
        session: &mut Session,
        action: AdminAction,
    ) -> CallbackResult {
        if !self.state.config().is_admin(turn.chat()) {
            tracing::debug!("Ignoring staff action from non-admin");
            return Ok(None);
        }
        match action {
            AdminAction::ViewOrders => self.open_order_review(turn, session).await,
            AdminAction::Broadcast => self.start_broadcast(turn, session).await,
            _ => self.on_menu_admin_action(turn, session, action).await,
        }
    }

    async fn on_orders_action(
        &self,
        turn: Turn<'_>,
        session: &mut Session,
        action: OrdersAction,
    ) -> CallbackResult {
        if !self.state.config().is_admin(turn.chat()) {
            tracing::debug!("Ignoring order review action from non-admin");
            return Ok(None);
        }
        self.on_review_action(turn, session, action).await
    }

    async fn on_admin_text(
        &self,
        turn: Turn<'_>,
        session: &mut Session,
        step: AdminStep,
        text: &str,
    ) -> Result<(), AppError> {
        if !self.state.config().is_admin(turn.chat()) {
            session.reset();
            return Ok(());
        }
        match step {
            AdminStep::EnteringDateFrom | AdminStep::EnteringDateTo => {
                self.enter_review_date(turn, session, step, text).await
            }
            AdminStep::EnteringBroadcast => self.send_broadcast(turn, session, text).await,
            _ => self.on_menu_admin_text(turn, session, step, text).await,
        }
    }

    /// Abort whatever is going on.
    ///
    /// Staff wizards fall back to the panel; everything else clears the
    /// session and returns to the category list. Nothing persisted is undone.
    async fn cancel(&self, turn: Turn<'_>, session: &mut Session) -> Result<(), AppError> {
        if matches!(session.step, Step::Admin(_)) && self.state.config().is_admin(turn.chat()) {
            session.reset_admin();
            self.show(turn, &views::admin::outcome("Cancelled.")).await?;
            return Ok(());
        }
        session.reset();
        self.show_categories(turn, session).await?;
        Ok(())
    }

    /// Category list with the restaurant status line.
    async fn show_categories(&self, turn: Turn<'_>, session: &mut Session) -> Result<Shown, AppError> {
        let menu = MenuRepository::new(self.state.pool()).read().await?;
        let status = restaurant_status(self.state.now(), &self.state.config().hours);

        session.shown_categories = menu.categories.iter().map(|c| c.name.clone()).collect();
        session.browsing = None;
        if matches!(session.step, Step::Admin(_)) {
            session.step = Step::Browsing;
        }

        let reply = views::customer::categories(self.state.config(), &menu, session.cart.len(), &status);
        Ok(self.show(turn, &reply).await?)
    }

    async fn send(&self, chat: UserId, reply: &Reply) -> Result<(), TransportError> {
        self.transport.send_message(chat, reply).await.map(|_| ())
    }

    /// Draw a screen: edit the originating message when there is one, send a
    /// new message otherwise.
    async fn show(&self, turn: Turn<'_>, reply: &Reply) -> Result<Shown, TransportError> {
        let Some(message) = turn.origin else {
            self.send(turn.chat(), reply).await?;
            return Ok(Shown::Sent);
        };
        match self.transport.edit_message(turn.chat(), message, reply).await {
            Ok(()) => Ok(Shown::Edited),
            Err(TransportError::NotModified) => Ok(Shown::Unchanged),
            Err(TransportError::Api(reason)) => {
                tracing::debug!(%reason, "Edit refused, sending a new message instead");
                self.send(turn.chat(), reply).await?;
                Ok(Shown::Sent)
            }
            Err(err) => Err(err),
        }
    }
}
