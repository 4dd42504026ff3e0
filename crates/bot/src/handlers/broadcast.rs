//! Staff broadcast to every known customer.

use super::{BotService, CallbackResult, Turn};
use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::{AdminStep, Session, Step};
use crate::services::fan_out;
use crate::transport::{Reply, Transport};
use crate::views::admin;

impl<T: Transport> BotService<T> {
    pub(super) async fn start_broadcast(&self, turn: Turn<'_>, session: &mut Session) -> CallbackResult {
        session.reset_admin();
        session.step = Step::Admin(AdminStep::EnteringBroadcast);
        self.show(
            turn,
            &admin::prompt("Enter the message to send to every customer (or cancel):"),
        )
        .await?;
        Ok(None)
    }

    /// Send `text` to everyone in the user table and report the tally.
    #[tracing::instrument(skip_all, fields(user_id = %turn.chat()))]
    pub(super) async fn send_broadcast(
        &self,
        turn: Turn<'_>,
        session: &mut Session,
        text: &str,
    ) -> Result<(), AppError> {
        let text = text.trim();
        if text.is_empty() {
            self.send(turn.chat(), &admin::prompt("The message cannot be empty. Enter the message:"))
                .await?;
            return Ok(());
        }

        let recipients = UserRepository::new(self.state.pool()).list_ids().await?;
        let total = recipients.len();
        let outcome = fan_out(&self.transport, recipients, &Reply::text(text), "broadcast").await;
        tracing::info!(
            total,
            delivered = outcome.delivered,
            failed = outcome.failed,
            "Broadcast finished"
        );

        session.reset_admin();
        let summary = format!(
            "Broadcast finished: delivered {}, failed {}.",
            outcome.delivered, outcome.failed
        );
        self.send(turn.chat(), &admin::outcome(summary)).await?;
        Ok(())
    }
}
