//! Chat transport boundary.
//!
//! Handlers never talk to Telegram directly. They receive [`Inbound`] events
//! and answer through the [`Transport`] trait, which is implemented by the
//! teloxide adapter in [`crate::telegram`] and by a recording fake in tests.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use hearty_house_core::UserId;

/// Errors from the chat transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Editing a message into the state it already has.
    #[error("message is not modified")]
    NotModified,

    /// The target chat blocked the bot or no longer exists.
    #[error("chat unavailable: {0}")]
    ChatUnavailable(String),

    /// Telegram asked us to slow down.
    #[error("rate limited, retry after {0:?}")]
    RateLimited(Duration),

    /// Network failure talking to the Bot API.
    #[error("network error: {0}")]
    Network(String),

    /// Any other API error.
    #[error("api error: {0}")]
    Api(String),

    /// A local photo file could not be read.
    #[error("photo unavailable: {0}")]
    PhotoUnavailable(String),
}

impl TransportError {
    /// Whether retrying the same call may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Network(_))
    }
}

/// Reference to a message previously sent by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef(pub i32);

/// An inline button carrying callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    #[must_use]
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Keyboard attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Inline buttons under the message, row by row.
    Inline(Vec<Vec<Button>>),
    /// One-time reply keyboard asking the user to share their phone.
    RequestContact { label: String },
    /// Remove any reply keyboard.
    Remove,
}

impl Keyboard {
    /// Inline buttons, if any.
    #[must_use]
    pub fn inline_buttons(&self) -> Vec<&Button> {
        match self {
            Self::Inline(rows) => rows.iter().flatten().collect(),
            Self::RequestContact { .. } | Self::Remove => Vec::new(),
        }
    }
}

/// An outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    /// Render `text` with Telegram's HTML parse mode.
    pub html: bool,
}

impl Reply {
    /// Plain text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
            html: false,
        }
    }

    /// HTML-formatted text. Callers escape user-supplied parts.
    #[must_use]
    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
            html: true,
        }
    }

    #[must_use]
    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    #[must_use]
    pub fn with_buttons(self, rows: Vec<Vec<Button>>) -> Self {
        self.with_keyboard(Keyboard::Inline(rows))
    }
}

/// Toast shown in answer to a button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    /// Show as a modal alert instead of a transient toast.
    pub alert: bool,
}

impl Notice {
    #[must_use]
    pub fn toast(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alert: false,
        }
    }

    #[must_use]
    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alert: true,
        }
    }
}

/// Where a photo comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSource {
    File(PathBuf),
    /// Remote https URL.
    Url(String),
}

/// Who sent an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub username: Option<String>,
}

/// What arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    Text(String),
    Callback {
        id: String,
        data: String,
        /// The message the button belongs to, when still accessible.
        message: Option<MessageRef>,
    },
    /// The user shared their own contact.
    Contact { phone: String },
}

/// One inbound event from a private chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub from: Sender,
    pub kind: InboundKind,
}

/// Outbound chat operations.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a new message.
    async fn send_message(&self, chat: UserId, reply: &Reply) -> Result<MessageRef, TransportError>;

    /// Send a photo without caption.
    async fn send_photo(
        &self,
        chat: UserId,
        photo: &PhotoSource,
    ) -> Result<MessageRef, TransportError>;

    /// Replace the text and inline keyboard of a message the bot sent earlier.
    async fn edit_message(
        &self,
        chat: UserId,
        message: MessageRef,
        reply: &Reply,
    ) -> Result<(), TransportError>;

    /// Acknowledge a button press, optionally with a notice.
    async fn answer_callback(
        &self,
        callback_id: &str,
        notice: Option<&Notice>,
    ) -> Result<(), TransportError>;
}

// =============================================================================
// Retry
// =============================================================================

/// Retry policy for transient transport failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    /// Upper bound on any single wait, including server-requested ones.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32, err: &TransportError) -> Duration {
        let delay = match err {
            TransportError::RateLimited(after) => *after,
            _ => self.base_delay.saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(self.max_delay)
    }
}

/// Wraps a transport and retries transient failures with exponential backoff.
#[derive(Debug, Clone)]
pub struct Retrying<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> Retrying<T> {
    #[must_use]
    pub const fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    #[must_use]
    pub const fn inner(&self) -> &T {
        &self.inner
    }
}

macro_rules! with_retry {
    ($self:ident, $op:literal, $call:expr) => {{
        let mut attempt = 0;
        loop {
            match $call.await {
                Ok(value) => break Ok(value),
                Err(err) if err.is_transient() && attempt + 1 < $self.policy.attempts => {
                    let delay = $self.policy.delay_for(attempt, &err);
                    tracing::warn!(
                        operation = $op,
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Transient transport failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => break Err(err),
            }
        }
    }};
}

#[async_trait]
impl<T: Transport> Transport for Retrying<T> {
    async fn send_message(&self, chat: UserId, reply: &Reply) -> Result<MessageRef, TransportError> {
        with_retry!(self, "send_message", self.inner.send_message(chat, reply))
    }

    async fn send_photo(
        &self,
        chat: UserId,
        photo: &PhotoSource,
    ) -> Result<MessageRef, TransportError> {
        with_retry!(self, "send_photo", self.inner.send_photo(chat, photo))
    }

    async fn edit_message(
        &self,
        chat: UserId,
        message: MessageRef,
        reply: &Reply,
    ) -> Result<(), TransportError> {
        with_retry!(
            self,
            "edit_message",
            self.inner.edit_message(chat, message, reply)
        )
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        notice: Option<&Notice>,
    ) -> Result<(), TransportError> {
        with_retry!(
            self,
            "answer_callback",
            self.inner.answer_callback(callback_id, notice)
        )
    }
}
