//! Order log repository. Orders are only ever appended and listed.

use chrono::NaiveDateTime;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use hearty_house_core::schedule::{DISPLAY_FORMAT, PrepTime};
use hearty_house_core::{OrderId, PaymentMethod, Price, SortDirection, UserId};

use super::{RepositoryError, TIMESTAMP_FORMAT};
use crate::models::{NewOrder, Order};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_text: Option<String>,
    created_at: String,
    phone: Option<String>,
    delivery_type: Option<String>,
    delivery_address: Option<String>,
    username: Option<String>,
    comment: Option<String>,
    prep_time: Option<String>,
    delivery_cost: Option<i64>,
    payment_method: Option<String>,
    cash_amount: Option<i64>,
    user_id: Option<i64>,
    subtotal: Option<i64>,
    total: Option<i64>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let created_at = NaiveDateTime::parse_from_str(&row.created_at, TIMESTAMP_FORMAT)
            .map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid created_at {:?} on order {}: {e}",
                    row.created_at, row.id
                ))
            })?;

        let delivery_type = row
            .delivery_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .transpose()
            .map_err(RepositoryError::DataCorruption)?;

        let payment_method = row
            .payment_method
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .transpose()
            .map_err(RepositoryError::DataCorruption)?
            .unwrap_or(PaymentMethod::Unspecified);

        let prep_time = match row.prep_time.as_deref() {
            None | Some("") => None,
            Some(s) => Some(PrepTime::from_storage(s).ok_or_else(|| {
                RepositoryError::DataCorruption(format!("invalid prep_time {s:?}"))
            })?),
        };

        Ok(Self {
            id: row.id,
            order_text: row.order_text.unwrap_or_default(),
            created_at,
            phone: row.phone,
            delivery_type,
            delivery_address: row.delivery_address,
            username: row.username,
            comment: row.comment,
            prep_time,
            delivery_cost: Price::new(row.delivery_cost.unwrap_or(0)),
            payment_method,
            cash_amount: row.cash_amount.map(Price::new),
            user_id: row.user_id.map(UserId::new),
            subtotal: row.subtotal.map(Price::new),
            total: row.total.map(Price::new),
        })
    }
}

/// Which orders to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderFilter {
    /// Inclusive lower bound on `created_at`.
    pub from: Option<NaiveDateTime>,
    /// Inclusive upper bound on `created_at`.
    pub to: Option<NaiveDateTime>,
    pub sort: SortDirection,
    pub limit: u32,
}

/// Repository for the order log.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Append an order and return its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[tracing::instrument(skip(self, order), fields(user_id = %order.user_id))]
    pub async fn append(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO orders (
                order_text, order_time, created_at, phone, address, delivery_type,
                delivery_address, username, comment, prep_time, delivery_cost,
                payment_method, cash_amount, user_id, subtotal, total
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(&order.order_text)
        .bind(order.created_at.format(DISPLAY_FORMAT).to_string())
        .bind(order.created_at.format(TIMESTAMP_FORMAT).to_string())
        .bind(&order.phone)
        .bind(&order.delivery_address)
        .bind(order.delivery_type)
        .bind(&order.delivery_address)
        .bind(&order.username)
        .bind(&order.comment)
        .bind(order.prep_time.to_storage())
        .bind(order.delivery_cost.amount())
        .bind(order.payment_method)
        .bind(order.cash_amount.map(|p| p.amount()))
        .bind(order.user_id)
        .bind(order.subtotal.amount())
        .bind(order.total().amount())
        .fetch_one(self.pool)
        .await?;

        tracing::info!(order_id = %id, "Order recorded");
        Ok(id)
    }

    /// List orders matching `filter`.
    ///
    /// Rows without a usable timestamp (legacy data) are never listed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row cannot be decoded.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            r"
            SELECT id, order_text, created_at, phone, delivery_type,
                   COALESCE(delivery_address, address) AS delivery_address,
                   username, comment, prep_time, delivery_cost, payment_method,
                   cash_amount, user_id, subtotal, total
            FROM orders
            WHERE created_at IS NOT NULL
            ",
        );

        if let Some(from) = filter.from {
            query
                .push(" AND created_at >= ")
                .push_bind(from.format(TIMESTAMP_FORMAT).to_string());
        }
        if let Some(to) = filter.to {
            query
                .push(" AND created_at <= ")
                .push_bind(to.format(TIMESTAMP_FORMAT).to_string());
        }

        query.push(match filter.sort {
            SortDirection::NewestFirst => " ORDER BY created_at DESC, id DESC",
            SortDirection::OldestFirst => " ORDER BY created_at ASC, id ASC",
        });
        query.push(" LIMIT ").push_bind(i64::from(filter.limit));

        let rows: Vec<OrderRow> = query.build_query_as().fetch_all(self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}
