//! Application state shared across handlers.

use std::sync::Arc;

use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::config::BotConfig;
use crate::services::{Clock, SessionStore, SystemClock};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BotConfig,
    pool: SqlitePool,
    sessions: SessionStore,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create application state running on the system clock.
    #[must_use]
    pub fn new(config: BotConfig, pool: SqlitePool) -> Self {
        let clock = Arc::new(SystemClock::new(config.utc_offset));
        Self::with_clock(config, pool, clock)
    }

    /// Create application state with an explicit clock.
    #[must_use]
    pub fn with_clock(config: BotConfig, pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        let sessions = SessionStore::new(config.session_idle);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                sessions,
                clock,
            }),
        }
    }

    /// Get a reference to the bot configuration.
    #[must_use]
    pub fn config(&self) -> &BotConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Restaurant-local now.
    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        self.inner.clock.now()
    }
}
