//! `SQLite` storage for the menu, customers and orders.
//!
//! ## Tables
//!
//! - `categories` - Menu categories (unique names, display order = id)
//! - `menu_items` - Dishes per category (price stored as digit text)
//! - `users` - Customer chat id, phone and saved delivery addresses (JSON)
//! - `orders` - Append-only order log
//!
//! # Schema management
//!
//! [`schema::initialize`] creates missing tables and adds columns introduced
//! after a database was first created. It is idempotent and runs on bot
//! start-up and from `hh-cli migrate`.

pub mod menu;
pub mod orders;
pub mod schema;
pub mod users;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

pub use menu::MenuRepository;
pub use orders::{OrderFilter, OrderRepository};
pub use users::UserRepository;

/// Timestamp text format stored in `SQLite`. Sorts chronologically.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate category name).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique-constraint violations to [`RepositoryError::Conflict`].
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::Conflict(format!("{what} already exists"))
            }
            _ => Self::Database(err),
        }
    }
}

/// Create a connection pool for the database file at `path`.
///
/// The file is created if missing. WAL journaling lets readers proceed while
/// a writer holds the lock; writers wait up to five seconds for each other.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database cannot be opened.
pub async fn create_pool(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Create a pool over a private in-memory database.
///
/// Every `SQLite` connection to `:memory:` gets its own database, so the pool
/// holds exactly one connection that is never recycled.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be opened.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}
