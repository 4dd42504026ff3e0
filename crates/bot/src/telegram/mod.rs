//! Telegram adapter: the teloxide dispatcher and the [`TelegramTransport`].
//!
//! Only private chats are served. Each update is converted into an
//! [`Inbound`] event and handed to [`BotService::handle`]; anything the bot
//! does not understand (stickers, group messages, foreign contacts) is
//! dropped here.

pub mod transport;

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::User;

pub use transport::TelegramTransport;

use crate::handlers::BotService;
use crate::transport::{Inbound, InboundKind, MessageRef, Sender, Transport};

fn sender(user: &User) -> Option<Sender> {
    let id = i64::try_from(user.id.0).ok()?;
    Some(Sender {
        id: hearty_house_core::UserId::new(id),
        username: user.username.clone(),
    })
}

/// A private text message or shared contact.
#[must_use]
pub fn inbound_from_message(msg: &Message) -> Option<Inbound> {
    if !msg.chat.is_private() {
        return None;
    }
    let user = msg.from.as_ref()?;
    let from = sender(user)?;

    if let Some(contact) = msg.contact() {
        // Only the sender's own number counts as onboarding.
        if contact.user_id != Some(user.id) {
            return None;
        }
        return Some(Inbound {
            from,
            kind: InboundKind::Contact {
                phone: contact.phone_number.clone(),
            },
        });
    }

    let text = msg.text()?;
    Some(Inbound {
        from,
        kind: InboundKind::Text(text.to_string()),
    })
}

/// A button press carrying callback data.
#[must_use]
pub fn inbound_from_callback(query: &CallbackQuery) -> Option<Inbound> {
    let from = sender(&query.from)?;
    let data = query.data.clone()?;
    let message = query
        .message
        .as_ref()
        .and_then(|m| m.regular_message())
        .map(|m| MessageRef(m.id.0));
    Some(Inbound {
        from,
        kind: InboundKind::Callback {
            id: query.id.to_string(),
            data,
            message,
        },
    })
}

/// Long-poll Telegram until Ctrl+C.
pub async fn run<T>(bot: Bot, service: Arc<BotService<T>>)
where
    T: Transport + 'static,
{
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(
            |msg: Message, service: Arc<BotService<T>>| async move {
                if let Some(inbound) = inbound_from_message(&msg) {
                    service.handle(inbound).await;
                } else {
                    tracing::debug!(chat_id = msg.chat.id.0, "Ignoring unsupported message");
                }
                Ok::<(), teloxide::RequestError>(())
            },
        ))
        .branch(Update::filter_callback_query().endpoint(
            |query: CallbackQuery, service: Arc<BotService<T>>| async move {
                match inbound_from_callback(&query) {
                    Some(inbound) => service.handle(inbound).await,
                    None => tracing::debug!("Ignoring callback without data"),
                }
                Ok::<(), teloxide::RequestError>(())
            },
        ));

    tracing::info!("Starting Telegram long polling");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![service])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
