//! Staff order review: period presets, custom date ranges and paging.

use hearty_house_core::period::{DateInputError, OrderPeriod, parse_date_input};

use super::{BotService, CallbackResult, Shown, Turn};
use crate::db::{OrderFilter, OrderRepository};
use crate::error::AppError;
use crate::models::callback::OrdersAction;
use crate::models::session::ReviewState;
use crate::models::{AdminStep, Session, Step};
use crate::transport::{Notice, Transport};
use crate::views;
use crate::views::admin;

const DATE_FROM_PROMPT: &str = "Enter the start date as DD.MM.YYYY (or cancel):";
const DATE_TO_PROMPT: &str = "Enter the end date as DD.MM.YYYY (or cancel):";
const BAD_DATE: &str = "Invalid date. Use DD.MM.YYYY, for example 15.03.2025";

impl<T: Transport> BotService<T> {
    pub(super) async fn open_order_review(&self, turn: Turn<'_>, session: &mut Session) -> CallbackResult {
        session.reset_admin();
        session.review = ReviewState::default();
        session.step = Step::Admin(AdminStep::ReviewingOrders);
        self.show(turn, &views::orders::filters()).await?;
        Ok(None)
    }

    pub(super) async fn on_review_action(
        &self,
        turn: Turn<'_>,
        session: &mut Session,
        action: OrdersAction,
    ) -> CallbackResult {
        match action {
            OrdersAction::Filters => self.open_order_review(turn, session).await,
            OrdersAction::Preset(preset) => {
                session.step = Step::Admin(AdminStep::ReviewingOrders);
                session.review = ReviewState {
                    period: Some(preset.period()),
                    date_from: None,
                    page: 0,
                };
                self.show_orders(turn, session).await?;
                Ok(None)
            }
            OrdersAction::Range => {
                session.review = ReviewState::default();
                session.step = Step::Admin(AdminStep::EnteringDateFrom);
                self.show(turn, &admin::prompt(DATE_FROM_PROMPT)).await?;
                Ok(None)
            }
            OrdersAction::Page(page) => {
                if session.review.period.is_none() {
                    return Ok(Some(Notice::toast(views::STALE_ACTION)));
                }
                session.review.page = page;
                if self.show_orders(turn, session).await? == Shown::Unchanged {
                    return Ok(Some(Notice::toast("This page is already open")));
                }
                Ok(None)
            }
        }
    }

    /// Typed dates of a custom range, start first.
    pub(super) async fn enter_review_date(
        &self,
        turn: Turn<'_>,
        session: &mut Session,
        step: AdminStep,
        text: &str,
    ) -> Result<(), AppError> {
        let chat = turn.chat();
        let Ok(date) = parse_date_input(text) else {
            self.send(chat, &admin::prompt(BAD_DATE)).await?;
            return Ok(());
        };

        if step == AdminStep::EnteringDateFrom {
            session.review.date_from = Some(date);
            session.step = Step::Admin(AdminStep::EnteringDateTo);
            self.send(chat, &admin::prompt(DATE_TO_PROMPT)).await?;
            return Ok(());
        }
        let Some(from) = session.review.date_from else {
            // Start date lost, ask again.
            session.step = Step::Admin(AdminStep::EnteringDateFrom);
            self.send(chat, &admin::prompt(DATE_FROM_PROMPT)).await?;
            return Ok(());
        };

        match OrderPeriod::range(from, date) {
            Ok(period) => {
                session.review = ReviewState {
                    period: Some(period),
                    date_from: None,
                    page: 0,
                };
                session.step = Step::Admin(AdminStep::ReviewingOrders);
                self.show_orders(turn, session).await?;
            }
            Err(DateInputError::EndBeforeStart { .. }) => {
                self.send(
                    chat,
                    &admin::prompt("The end date cannot be before the start date. Enter the end date:"),
                )
                .await?;
            }
            Err(DateInputError::BadFormat) => {
                self.send(chat, &admin::prompt(BAD_DATE)).await?;
            }
        }
        Ok(())
    }

    /// Render the current review page, remembering where it landed.
    #[tracing::instrument(skip_all, fields(user_id = %turn.chat()))]
    async fn show_orders(&self, turn: Turn<'_>, session: &mut Session) -> Result<Shown, AppError> {
        let Some(period) = session.review.period else {
            return Ok(self.show(turn, &views::orders::filters()).await?);
        };
        let config = self.state.config();
        let today = self.state.now().date();
        let (from, to) = period.bounds(today);
        let filter = OrderFilter {
            from,
            to,
            sort: config.orders_sort,
            limit: config.orders_max_rows,
        };

        let orders = OrderRepository::new(self.state.pool()).list(&filter).await?;
        tracing::debug!(count = orders.len(), period = %period.label(), "Orders loaded for review");

        match views::orders::orders_page(config, &orders, &period, session.review.page, today) {
            Some((page, reply)) => {
                session.review.page = page;
                Ok(self.show(turn, &reply).await?)
            }
            None => {
                session.review.page = 0;
                Ok(self.show(turn, &views::orders::no_orders()).await?)
            }
        }
    }
}
