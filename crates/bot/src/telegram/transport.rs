//! [`Transport`] implementation over the Telegram Bot API.

use async_trait::async_trait;
use teloxide::ApiError;
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton,
    KeyboardMarkup, KeyboardRemove, MessageId, ParseMode, ReplyMarkup,
};

use hearty_house_core::UserId;

use crate::transport::{
    Button, Keyboard, MessageRef, Notice, PhotoSource, Reply, Transport, TransportError,
};

/// Talks to Telegram through a teloxide [`Bot`].
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

const fn chat_id(chat: UserId) -> ChatId {
    ChatId(chat.as_i64())
}

fn inline_markup(rows: &[Vec<Button>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.data.clone()))
            .collect::<Vec<_>>()
    }))
}

pub(crate) fn reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Inline(rows) => ReplyMarkup::InlineKeyboard(inline_markup(rows)),
        Keyboard::RequestContact { label } => ReplyMarkup::Keyboard(
            KeyboardMarkup::new(vec![vec![
                KeyboardButton::new(label.clone()).request(ButtonRequest::Contact),
            ]])
            .resize_keyboard()
            .one_time_keyboard(),
        ),
        Keyboard::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

/// Sort a teloxide failure into the transport error kinds handlers act on.
pub(crate) fn map_error(err: RequestError) -> TransportError {
    match err {
        RequestError::Api(ApiError::MessageNotModified) => TransportError::NotModified,
        RequestError::Api(
            api @ (ApiError::BotBlocked
            | ApiError::ChatNotFound
            | ApiError::UserDeactivated
            | ApiError::BotKicked
            | ApiError::BotKickedFromSupergroup),
        ) => TransportError::ChatUnavailable(api.to_string()),
        RequestError::RetryAfter(after) => TransportError::RateLimited(after.duration()),
        RequestError::Network(err) => TransportError::Network(err.to_string()),
        RequestError::Io(err) => TransportError::Network(err.to_string()),
        other => TransportError::Api(other.to_string()),
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_message(&self, chat: UserId, reply: &Reply) -> Result<MessageRef, TransportError> {
        let mut request = self.bot.send_message(chat_id(chat), reply.text.clone());
        if reply.html {
            request = request.parse_mode(ParseMode::Html);
        }
        if let Some(keyboard) = &reply.keyboard {
            request = request.reply_markup(reply_markup(keyboard));
        }
        let message = request.await.map_err(map_error)?;
        Ok(MessageRef(message.id.0))
    }

    async fn send_photo(
        &self,
        chat: UserId,
        photo: &PhotoSource,
    ) -> Result<MessageRef, TransportError> {
        let file = match photo {
            PhotoSource::File(path) => {
                tokio::fs::metadata(path).await.map_err(|err| {
                    TransportError::PhotoUnavailable(format!("{}: {err}", path.display()))
                })?;
                InputFile::file(path.clone())
            }
            PhotoSource::Url(raw) => {
                let url = url::Url::parse(raw)
                    .map_err(|err| TransportError::PhotoUnavailable(format!("{raw}: {err}")))?;
                InputFile::url(url)
            }
        };
        let message = self
            .bot
            .send_photo(chat_id(chat), file)
            .await
            .map_err(map_error)?;
        Ok(MessageRef(message.id.0))
    }

    async fn edit_message(
        &self,
        chat: UserId,
        message: MessageRef,
        reply: &Reply,
    ) -> Result<(), TransportError> {
        let mut request =
            self.bot
                .edit_message_text(chat_id(chat), MessageId(message.0), reply.text.clone());
        if reply.html {
            request = request.parse_mode(ParseMode::Html);
        }
        match &reply.keyboard {
            Some(Keyboard::Inline(rows)) => {
                request = request.reply_markup(inline_markup(rows));
            }
            // Only inline keyboards can be attached by an edit.
            Some(_) => return Err(TransportError::Api("reply keyboard on edit".to_string())),
            None => {}
        }
        request.await.map_err(map_error)?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        notice: Option<&Notice>,
    ) -> Result<(), TransportError> {
        let mut request = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(notice) = notice {
            request = request.text(notice.text.clone()).show_alert(notice.alert);
        }
        request.await.map_err(map_error)?;
        Ok(())
    }
}
