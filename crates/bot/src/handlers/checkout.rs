//! Checkout: delivery type, address, prep time, payment, comment, order.
//!
//! Every button is checked against the step it belongs to. A button from an
//! older screen gets a short notice and leaves the session untouched.

use hearty_house_core::schedule::{PrepTime, asap_available, find_slot, generate_slots};
use hearty_house_core::{DeliveryType, PaymentMethod};

use super::{BotService, CallbackResult, Turn};
use crate::db::{OrderRepository, UserRepository};
use crate::error::AppError;
use crate::models::{Callback, NewOrder, Session, Step};
use crate::services::fan_out;
use crate::transport::{Notice, Reply, Transport};
use crate::views;

fn stale() -> CallbackResult {
    Ok(Some(Notice::toast(views::STALE_ACTION)))
}

impl<T: Transport> BotService<T> {
    /// Enter checkout from the cart. Asks for a phone first if none is known.
    pub(super) async fn begin_checkout(&self, turn: Turn<'_>, session: &mut Session) -> CallbackResult {
        if session.cart.is_empty() {
            return Ok(Some(Notice::alert("Your cart is empty")));
        }

        if session.phone.is_none() {
            let user = UserRepository::new(self.state.pool()).get(turn.chat()).await?;
            session.phone = user.and_then(|u| u.phone);
        }
        if session.phone.is_none() {
            session.step = Step::AwaitingPhone;
            self.send(turn.chat(), &views::customer::phone_request(self.state.config()))
                .await?;
            return Ok(None);
        }

        session.abandon_checkout();
        session.step = Step::ChoosingDeliveryType;
        let reply = views::customer::delivery_choice(self.state.config(), session.cart.total());
        self.show(turn, &reply).await?;
        Ok(None)
    }

    pub(super) async fn on_checkout_action(
        &self,
        turn: Turn<'_>,
        session: &mut Session,
        callback: Callback,
    ) -> CallbackResult {
        match (session.step, callback) {
            (Step::ChoosingDeliveryType, Callback::DeliveryType(kind)) => {
                self.choose_delivery_type(turn, session, kind).await
            }
            (Step::ChoosingAddress, Callback::SavedAddress(index)) => {
                let Some(address) = session.draft.offered_addresses.get(index).cloned() else {
                    return stale();
                };
                session.draft.delivery_address = Some(address);
                session.step = Step::ChoosingPrepTime;
                self.show(turn, &self.prep_time_screen(session)).await?;
                Ok(None)
            }
            (Step::ChoosingAddress, Callback::NewAddress) => {
                session.step = Step::EnteringAddress;
                self.show(turn, &views::customer::address_prompt()).await?;
                Ok(None)
            }
            (Step::ChoosingPrepTime, Callback::Slot(at)) => {
                let Some(lead) = self.lead_minutes(session) else {
                    return stale();
                };
                let config = self.state.config();
                if find_slot(self.state.now(), lead, &config.hours, at).is_none() {
                    self.show(turn, &self.prep_time_screen(session)).await?;
                    return Ok(Some(Notice::alert("That time is no longer available. Please pick another.")));
                }
                session.draft.prep_time = Some(PrepTime::At(at));
                self.after_prep_time(turn, session).await
            }
            (Step::ChoosingPrepTime, Callback::Asap) => {
                if !asap_available(self.state.now(), &self.state.config().hours) {
                    self.show(turn, &self.prep_time_screen(session)).await?;
                    return Ok(Some(Notice::alert(
                        "«As soon as possible» is no longer available. Please pick a time.",
                    )));
                }
                session.draft.prep_time = Some(PrepTime::Asap);
                self.after_prep_time(turn, session).await
            }
            (Step::ChoosingPaymentMethod, Callback::Payment(PaymentMethod::Card)) => {
                session.draft.payment_method = PaymentMethod::Card;
                session.draft.cash_amount = None;
                session.step = Step::EnteringComment;
                self.show(turn, &views::customer::comment_prompt()).await?;
                Ok(None)
            }
            (Step::ChoosingPaymentMethod, Callback::Payment(PaymentMethod::Cash)) => {
                session.draft.payment_method = PaymentMethod::Cash;
                session.step = Step::EnteringCashAmount;
                let total = session.cart.total() + session.draft.delivery_cost;
                self.show(turn, &views::customer::cash_prompt(self.state.config(), total))
                    .await?;
                Ok(None)
            }
            _ => stale(),
        }
    }

    async fn choose_delivery_type(
        &self,
        turn: Turn<'_>,
        session: &mut Session,
        kind: DeliveryType,
    ) -> CallbackResult {
        let config = self.state.config();
        let subtotal = session.cart.total();

        match kind {
            DeliveryType::Delivery => {
                if config.pricing.check_delivery_allowed(subtotal).is_err() {
                    return Ok(Some(Notice::alert(views::customer::delivery_minimum(config))));
                }
                session.draft.delivery_type = Some(DeliveryType::Delivery);
                session.draft.delivery_cost = config.pricing.delivery_cost(kind, subtotal);

                let addresses = UserRepository::new(self.state.pool())
                    .get(turn.chat())
                    .await?
                    .map(|u| u.addresses)
                    .unwrap_or_default();
                if addresses.is_empty() {
                    session.step = Step::EnteringAddress;
                    self.show(turn, &views::customer::address_prompt()).await?;
                } else {
                    let reply = views::customer::address_choice(&addresses);
                    session.draft.offered_addresses = addresses;
                    session.step = Step::ChoosingAddress;
                    self.show(turn, &reply).await?;
                }
            }
            DeliveryType::Pickup => {
                session.draft.delivery_type = Some(DeliveryType::Pickup);
                session.draft.delivery_cost = config.pricing.delivery_cost(kind, subtotal);
                session.draft.delivery_address = Some(config.pickup_address.clone());
                session.step = Step::ChoosingPrepTime;
                self.show(turn, &self.prep_time_screen(session)).await?;
            }
        }
        Ok(None)
    }

    /// Typed delivery address. Saved to the address book right away.
    #[tracing::instrument(skip_all, fields(user_id = %turn.chat()))]
    pub(super) async fn enter_address(
        &self,
        turn: Turn<'_>,
        session: &mut Session,
        text: &str,
    ) -> Result<(), AppError> {
        let address = text.trim();
        if address.is_empty() {
            self.send(turn.chat(), &views::customer::empty_address()).await?;
            return Ok(());
        }
        if address.chars().count() > views::customer::MAX_ADDRESS_CHARS {
            self.send(turn.chat(), &views::customer::address_too_long()).await?;
            return Ok(());
        }

        let added = UserRepository::new(self.state.pool())
            .add_address(turn.chat(), address)
            .await?;
        tracing::debug!(added, "Delivery address recorded");

        session.draft.delivery_address = Some(address.to_string());
        session.step = Step::ChoosingPrepTime;
        self.send(turn.chat(), &self.prep_time_screen(session)).await?;
        Ok(())
    }

    pub(super) async fn enter_cash_amount(
        &self,
        turn: Turn<'_>,
        session: &mut Session,
        text: &str,
    ) -> Result<(), AppError> {
        let config = self.state.config();
        match config.pricing.validate_cash(text) {
            Ok(amount) => {
                session.draft.cash_amount = Some(amount);
                session.step = Step::EnteringComment;
                self.send(turn.chat(), &views::customer::comment_prompt()).await?;
            }
            Err(_) => {
                self.send(turn.chat(), &views::customer::invalid_cash(config)).await?;
            }
        }
        Ok(())
    }

    /// Last step: persist the order, notify staff, confirm to the customer.
    #[tracing::instrument(skip_all, fields(user_id = %turn.chat()))]
    pub(super) async fn enter_comment(
        &self,
        turn: Turn<'_>,
        session: &mut Session,
        text: &str,
    ) -> Result<(), AppError> {
        if text.trim().chars().count() > views::customer::MAX_COMMENT_CHARS {
            self.send(turn.chat(), &views::customer::comment_too_long()).await?;
            return Ok(());
        }
        let Some(order) = self.assemble_order(turn, session, text) else {
            tracing::warn!("Checkout reached the comment step with an incomplete draft");
            session.abandon_checkout();
            self.send(turn.chat(), &views::customer::checkout_lost()).await?;
            self.show_categories(turn, session).await?;
            return Ok(());
        };

        let id = OrderRepository::new(self.state.pool()).append(&order).await?;
        tracing::info!(order_id = %id, total = %order.total(), "Order placed");

        let config = self.state.config();
        let today = self.state.now().date();
        let notification = views::customer::staff_notification(config, id, &order, today);
        let outcome = fan_out(
            &self.transport,
            config.admin_ids.iter().copied(),
            &notification,
            "order_notification",
        )
        .await;
        if outcome.delivered == 0 && !config.admin_ids.is_empty() {
            tracing::error!(order_id = %id, "No staff member received the order notification");
        }

        session.cart.clear();
        session.browsing = None;
        session.abandon_checkout();

        // The order is stored; from here on failures must not roll the session back.
        if let Err(err) = self
            .send(turn.chat(), &views::customer::order_confirmation(config, id, &order))
            .await
        {
            tracing::warn!(order_id = %id, error = %err, "Failed to send order confirmation");
        }
        if let Err(err) = self.show_categories(turn, session).await {
            tracing::warn!(order_id = %id, error = %err, "Failed to show menu after order");
        }
        Ok(())
    }

    /// Build the order from the session, or `None` if a step was lost.
    fn assemble_order(&self, turn: Turn<'_>, session: &Session, comment: &str) -> Option<NewOrder> {
        if session.cart.is_empty() {
            return None;
        }
        let draft = &session.draft;
        let delivery_type = draft.delivery_type?;
        let delivery_address = draft.delivery_address.clone()?;
        let prep_time = draft.prep_time?;
        let phone = session.phone.as_ref()?;

        let config = self.state.config();
        let subtotal = session.cart.total();
        let cash_amount = match draft.payment_method {
            PaymentMethod::Cash => Some(draft.cash_amount?),
            PaymentMethod::Card | PaymentMethod::Unspecified => None,
        };

        Some(NewOrder {
            order_text: session.cart.render(&config.currency_symbol),
            created_at: self.state.now(),
            phone: phone.as_str().to_string(),
            delivery_type,
            delivery_address,
            username: turn.from.username.clone(),
            comment: views::customer::normalize_comment(comment),
            prep_time,
            subtotal,
            delivery_cost: config.pricing.delivery_cost(delivery_type, subtotal),
            payment_method: draft.payment_method,
            cash_amount,
            user_id: turn.chat(),
        })
    }

    /// Payment when it is asked for, the comment otherwise.
    async fn after_prep_time(&self, turn: Turn<'_>, session: &mut Session) -> CallbackResult {
        let config = self.state.config();
        let ask_payment = session.draft.delivery_type == Some(DeliveryType::Delivery)
            || config.require_payment_for_pickup;

        if ask_payment {
            session.step = Step::ChoosingPaymentMethod;
            let total = session.cart.total() + session.draft.delivery_cost;
            self.show(turn, &views::customer::payment_choice(config, total)).await?;
        } else {
            session.draft.payment_method = PaymentMethod::Unspecified;
            session.draft.cash_amount = None;
            session.step = Step::EnteringComment;
            self.show(turn, &views::customer::comment_prompt()).await?;
        }
        Ok(None)
    }

    fn lead_minutes(&self, session: &Session) -> Option<u32> {
        let config = self.state.config();
        match session.draft.delivery_type? {
            DeliveryType::Delivery => Some(config.delivery_lead_minutes),
            DeliveryType::Pickup => Some(config.pickup_lead_minutes),
        }
    }

    fn prep_time_screen(&self, session: &Session) -> Reply {
        let hours = &self.state.config().hours;
        let now = self.state.now();
        let slots = self
            .lead_minutes(session)
            .map(|lead| generate_slots(now, lead, hours))
            .unwrap_or_default();
        views::customer::prep_time_choice(&slots, asap_available(now, hours))
    }
}
