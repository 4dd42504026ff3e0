//! Customer repository: phone numbers and saved delivery addresses.

use sqlx::SqlitePool;

use hearty_house_core::{Phone, UserId};

use super::RepositoryError;
use crate::models::User;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    user_id: UserId,
    phone: Option<String>,
    addresses: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let phone = row
            .phone
            .filter(|p| !p.trim().is_empty())
            .map(|p| {
                Phone::parse(&p).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
                })
            })
            .transpose()?;

        let addresses = match row.addresses.as_deref() {
            None | Some("") => Vec::new(),
            Some(json) => serde_json::from_str(json).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid address list: {e}"))
            })?,
        };

        Ok(Self {
            id: row.user_id,
            phone,
            addresses,
        })
    }
}

/// Repository for customer records.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a customer by chat id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        // Older databases declare user_id as TEXT; the cast normalizes both.
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT CAST(user_id AS INTEGER) AS user_id, phone, addresses
            FROM users
            WHERE user_id = ?
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Store the customer's phone, creating the record if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    #[tracing::instrument(skip(self, phone))]
    pub async fn save_phone(&self, id: UserId, phone: &Phone) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO users (user_id, phone) VALUES (?, ?)
            ON CONFLICT (user_id) DO UPDATE SET phone = excluded.phone
            ",
        )
        .bind(id)
        .bind(phone.as_str())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Append a delivery address unless the customer already saved it.
    ///
    /// Returns `true` when the address was added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    #[tracing::instrument(skip(self, address))]
    pub async fn add_address(&self, id: UserId, address: &str) -> Result<bool, RepositoryError> {
        let address = address.trim();
        let mut tx = self.pool.begin().await?;

        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT CAST(user_id AS INTEGER) AS user_id, phone, addresses
            FROM users
            WHERE user_id = ?
            ",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let mut user = User::try_from(row.ok_or(RepositoryError::NotFound)?)?;
        if user.addresses.iter().any(|a| a == address) {
            return Ok(false);
        }
        user.addresses.push(address.to_string());

        let json = serde_json::to_string(&user.addresses)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        sqlx::query("UPDATE users SET addresses = ? WHERE user_id = ?")
            .bind(json)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Chat ids of every known customer, for broadcasts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[tracing::instrument(skip(self))]
    pub async fn list_ids(&self) -> Result<Vec<UserId>, RepositoryError> {
        let ids: Vec<UserId> =
            sqlx::query_scalar("SELECT CAST(user_id AS INTEGER) FROM users ORDER BY rowid")
            .fetch_all(self.pool)
            .await?;
        Ok(ids)
    }
}
