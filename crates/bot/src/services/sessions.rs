//! Session cache.
//!
//! Sessions are kept in a `moka` cache keyed by chat id. An idle session is
//! evicted after the configured time, which is how abandoned checkouts end.

use std::time::Duration;

use moka::future::Cache;

use hearty_house_core::UserId;

use crate::models::Session;

/// Upper bound on concurrently remembered conversations.
const MAX_SESSIONS: u64 = 100_000;

/// Per-conversation state store.
#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<UserId, Session>,
}

impl SessionStore {
    /// Create a store that forgets sessions idle for longer than `idle`.
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(idle)
            .build();
        Self { cache }
    }

    /// The session for `user`, or a fresh one.
    pub async fn load(&self, user: UserId) -> Session {
        self.cache.get(&user).await.unwrap_or_default()
    }

    pub async fn save(&self, user: UserId, session: Session) {
        self.cache.insert(user, session).await;
    }

    pub async fn remove(&self, user: UserId) {
        self.cache.invalidate(&user).await;
    }
}
