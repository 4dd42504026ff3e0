//! End-to-end conversation tests for the Hearty House bot.
//!
//! Tests drive [`BotService::handle`] with synthetic inbound events against an
//! in-memory `SQLite` database, a [`FixedClock`] and a [`RecordingTransport`]
//! that keeps everything the bot sent.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p hearty-house-integration-tests
//! ```
//!
//! No network or Telegram token is needed.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use hearty_house_bot::config::BotConfig;
use hearty_house_bot::db::{self, MenuRepository, UserRepository};
use hearty_house_bot::handlers::BotService;
use hearty_house_bot::models::Session;
use hearty_house_bot::services::FixedClock;
use hearty_house_bot::state::AppState;
use hearty_house_bot::transport::{
    Inbound, InboundKind, Keyboard, MessageRef, Notice, PhotoSource, Reply, Sender, Transport,
    TransportError,
};
use hearty_house_core::menu::{Menu, MenuItem};
use hearty_house_core::{Phone, Price, UserId};

/// Staff id used by [`Harness::new`].
pub const ADMIN: i64 = 1;

/// One thing the bot did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Message {
        chat: UserId,
        id: MessageRef,
        reply: Reply,
    },
    Photo {
        chat: UserId,
        photo: PhotoSource,
    },
    Edit {
        chat: UserId,
        message: MessageRef,
        reply: Reply,
    },
    Answer {
        callback_id: String,
        notice: Option<Notice>,
    },
}

impl Outbound {
    /// The chat this went to, if any.
    #[must_use]
    pub const fn chat(&self) -> Option<UserId> {
        match self {
            Self::Message { chat, .. } | Self::Photo { chat, .. } | Self::Edit { chat, .. } => {
                Some(*chat)
            }
            Self::Answer { .. } => None,
        }
    }

    /// The rendered reply for messages and edits.
    #[must_use]
    pub const fn reply(&self) -> Option<&Reply> {
        match self {
            Self::Message { reply, .. } | Self::Edit { reply, .. } => Some(reply),
            Self::Photo { .. } | Self::Answer { .. } => None,
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.reply().map(|r| r.text.as_str())
    }

    /// Callback data of every inline button, row by row.
    #[must_use]
    pub fn button_data(&self) -> Vec<String> {
        self.reply()
            .and_then(|r| r.keyboard.as_ref())
            .map(|k| k.inline_buttons().iter().map(|b| b.data.clone()).collect())
            .unwrap_or_default()
    }
}

/// Transport fake that records every call.
///
/// Message ids are handed out sequentially. Editing a message into the text
/// and keyboard it already has fails with [`TransportError::NotModified`],
/// and chats marked with [`RecordingTransport::block`] fail with
/// [`TransportError::ChatUnavailable`], the way Telegram behaves.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    log: Mutex<Vec<Outbound>>,
    contents: Mutex<HashMap<(UserId, i32), Reply>>,
    blocked: Mutex<HashSet<UserId>>,
    next_id: AtomicI32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl RecordingTransport {
    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<Outbound> {
        std::mem::take(&mut *lock(&self.log))
    }

    /// Make every call to `user` fail as if they blocked the bot.
    pub fn block(&self, user: UserId) {
        lock(&self.blocked).insert(user);
    }

    fn check_reachable(&self, chat: UserId) -> Result<(), TransportError> {
        if lock(&self.blocked).contains(&chat) {
            return Err(TransportError::ChatUnavailable(
                "Forbidden: bot was blocked by the user".to_string(),
            ));
        }
        Ok(())
    }

    fn next_ref(&self) -> MessageRef {
        MessageRef(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(&self, chat: UserId, reply: &Reply) -> Result<MessageRef, TransportError> {
        self.check_reachable(chat)?;
        let id = self.next_ref();
        lock(&self.contents).insert((chat, id.0), reply.clone());
        lock(&self.log).push(Outbound::Message {
            chat,
            id,
            reply: reply.clone(),
        });
        Ok(id)
    }

    async fn send_photo(
        &self,
        chat: UserId,
        photo: &PhotoSource,
    ) -> Result<MessageRef, TransportError> {
        self.check_reachable(chat)?;
        lock(&self.log).push(Outbound::Photo {
            chat,
            photo: photo.clone(),
        });
        Ok(self.next_ref())
    }

    async fn edit_message(
        &self,
        chat: UserId,
        message: MessageRef,
        reply: &Reply,
    ) -> Result<(), TransportError> {
        self.check_reachable(chat)?;
        if matches!(reply.keyboard, Some(Keyboard::RequestContact { .. } | Keyboard::Remove)) {
            return Err(TransportError::Api("reply keyboard on edit".to_string()));
        }
        let mut contents = lock(&self.contents);
        match contents.get(&(chat, message.0)) {
            None => return Err(TransportError::Api("message to edit not found".to_string())),
            Some(current) if current == reply => return Err(TransportError::NotModified),
            Some(_) => {}
        }
        contents.insert((chat, message.0), reply.clone());
        drop(contents);
        lock(&self.log).push(Outbound::Edit {
            chat,
            message,
            reply: reply.clone(),
        });
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        notice: Option<&Notice>,
    ) -> Result<(), TransportError> {
        lock(&self.log).push(Outbound::Answer {
            callback_id: callback_id.to_string(),
            notice: notice.cloned(),
        });
        Ok(())
    }
}

/// A bot wired to an in-memory database and a recording transport.
pub struct Harness {
    pub service: BotService<RecordingTransport>,
    pub clock: Arc<FixedClock>,
    callbacks: AtomicU64,
}

/// Friday 14 March 2025, 12:00 local time.
#[must_use]
pub fn default_now() -> NaiveDateTime {
    at("2025-03-14 12:00")
}

/// Parse `YYYY-MM-DD HH:MM`.
///
/// # Panics
///
/// Panics on malformed input; only meant for literals in tests.
#[must_use]
pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap_or_else(|e| panic!("bad time {s:?}: {e}"))
}

impl Harness {
    /// Default configuration with [`ADMIN`] as the only staff member.
    pub async fn new() -> Self {
        Self::with_config(BotConfig::for_tests([ADMIN]), default_now()).await
    }

    /// # Panics
    ///
    /// Panics if the in-memory database cannot be created.
    pub async fn with_config(config: BotConfig, now: NaiveDateTime) -> Self {
        let pool = db::create_memory_pool()
            .await
            .unwrap_or_else(|e| panic!("memory pool: {e}"));
        db::schema::initialize(&pool)
            .await
            .unwrap_or_else(|e| panic!("schema: {e}"));

        let clock = Arc::new(FixedClock::new(now));
        let state = AppState::with_clock(config, pool, clock.clone());
        Self {
            service: BotService::new(state, RecordingTransport::default()),
            clock,
            callbacks: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        self.service.state().pool()
    }

    #[must_use]
    pub fn transport(&self) -> &RecordingTransport {
        self.service.transport()
    }

    fn sender(user: i64) -> Sender {
        Sender {
            id: UserId::new(user),
            username: Some(format!("user{user}")),
        }
    }

    async fn deliver(&self, user: i64, kind: InboundKind) -> Vec<Outbound> {
        self.service
            .handle(Inbound {
                from: Self::sender(user),
                kind,
            })
            .await;
        self.transport().take()
    }

    /// The user types `text`.
    pub async fn text(&self, user: i64, text: &str) -> Vec<Outbound> {
        self.deliver(user, InboundKind::Text(text.to_string())).await
    }

    /// The user presses a button with `data` under `message`.
    pub async fn press(&self, user: i64, data: &str, message: Option<MessageRef>) -> Vec<Outbound> {
        let id = self.callbacks.fetch_add(1, Ordering::SeqCst).to_string();
        self.deliver(
            user,
            InboundKind::Callback {
                id,
                data: data.to_string(),
                message,
            },
        )
        .await
    }

    /// The user shares their own contact.
    pub async fn contact(&self, user: i64, phone: &str) -> Vec<Outbound> {
        self.deliver(
            user,
            InboundKind::Contact {
                phone: phone.to_string(),
            },
        )
        .await
    }

    /// Store a phone for `user` so `/start` skips onboarding.
    ///
    /// # Panics
    ///
    /// Panics on an invalid phone or a database failure.
    pub async fn register(&self, user: i64, phone: &str) {
        let phone = Phone::parse(phone).unwrap_or_else(|e| panic!("phone {phone:?}: {e}"));
        UserRepository::new(self.pool())
            .save_phone(UserId::new(user), &phone)
            .await
            .unwrap_or_else(|e| panic!("save phone: {e}"));
    }

    /// # Panics
    ///
    /// Panics on a database failure.
    pub async fn seed_menu(&self, menu: &Menu) {
        MenuRepository::new(self.pool())
            .replace(menu)
            .await
            .unwrap_or_else(|e| panic!("seed menu: {e}"));
    }

    /// # Panics
    ///
    /// Panics on a database failure.
    pub async fn menu(&self) -> Menu {
        MenuRepository::new(self.pool())
            .read()
            .await
            .unwrap_or_else(|e| panic!("read menu: {e}"))
    }

    /// The user's conversation state as the bot would see it next.
    pub async fn session(&self, user: i64) -> Session {
        self.service.state().sessions().load(UserId::new(user)).await
    }
}

/// Soups (Borscht 450, Solyanka 490), Mains (Pelmeni 650, Cutlet 720) and
/// an empty Desserts category.
///
/// # Panics
///
/// Never in practice; the literal menu is valid.
#[must_use]
pub fn sample_menu() -> Menu {
    let dish = |name: &str, price: i64, description: &str| MenuItem {
        name: name.to_string(),
        price: Price::new(price),
        description: description.to_string(),
    };
    let mut menu = Menu::default();
    for (category, item) in [
        ("Soups", dish("Borscht", 450, "With sour cream")),
        ("Soups", dish("Solyanka", 490, "")),
        ("Mains", dish("Pelmeni", 650, "Handmade")),
        ("Mains", dish("Cutlet", 720, "")),
    ] {
        menu.add_item(category, item)
            .unwrap_or_else(|e| panic!("sample menu: {e}"));
    }
    menu.add_category("Desserts")
        .unwrap_or_else(|e| panic!("sample menu: {e}"));
    menu
}

/// The last outbound message or edit in `outbound`.
#[must_use]
pub fn last_screen(outbound: &[Outbound]) -> Option<&Outbound> {
    outbound.iter().rev().find(|o| o.reply().is_some())
}

/// The notice a callback was answered with, if any.
#[must_use]
pub fn notice(outbound: &[Outbound]) -> Option<&Notice> {
    outbound.iter().find_map(|o| match o {
        Outbound::Answer { notice, .. } => notice.as_ref(),
        _ => None,
    })
}

/// The message id of the last new message sent to `user`.
#[must_use]
pub fn last_message_id(outbound: &[Outbound], user: i64) -> Option<MessageRef> {
    outbound.iter().rev().find_map(|o| match o {
        Outbound::Message { chat, id, .. } if *chat == UserId::new(user) => Some(*id),
        _ => None,
    })
}
