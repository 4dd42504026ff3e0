//! Idempotent schema creation and column migrations.

use sqlx::SqlitePool;

use super::RepositoryError;

const CREATE_TABLES: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS users (
        user_id INTEGER PRIMARY KEY,
        phone TEXT
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_text TEXT,
        order_time TEXT,
        phone TEXT,
        address TEXT,
        username TEXT,
        comment TEXT
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )
    ",
    r#"
    CREATE TABLE IF NOT EXISTS menu_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category_id INTEGER NOT NULL REFERENCES categories (id),
        name TEXT NOT NULL,
        price TEXT NOT NULL,
        "desc" TEXT
    )
    "#,
];

/// Columns added after the first release, as `(table, column definition)`.
const ADDED_COLUMNS: &[(&str, &str)] = &[
    ("users", "addresses TEXT NOT NULL DEFAULT '[]'"),
    ("orders", "delivery_type TEXT"),
    ("orders", "delivery_address TEXT"),
    ("orders", "created_at TEXT"),
    ("orders", "prep_time TEXT"),
    ("orders", "delivery_cost INTEGER NOT NULL DEFAULT 0"),
    ("orders", "payment_method TEXT"),
    ("orders", "cash_amount INTEGER"),
    ("orders", "user_id INTEGER"),
    ("orders", "subtotal INTEGER"),
    ("orders", "total INTEGER"),
];

/// Fill `created_at` for rows written before it existed, from the legacy
/// `DD.MM.YYYY HH:MM` `order_time` text.
const BACKFILL_CREATED_AT: &str = r"
    UPDATE orders
    SET created_at = substr(order_time, 7, 4) || '-' || substr(order_time, 4, 2) || '-'
        || substr(order_time, 1, 2) || 'T' || substr(order_time, 12, 5) || ':00'
    WHERE created_at IS NULL
      AND order_time GLOB '[0-9][0-9].[0-9][0-9].[0-9][0-9][0-9][0-9] [0-9][0-9]:[0-9][0-9]*'
";

const CREATE_INDEXES: &[&str] =
    &["CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders (created_at)"];

/// Create or upgrade the schema.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any statement fails.
#[tracing::instrument(skip(pool))]
pub async fn initialize(pool: &SqlitePool) -> Result<(), RepositoryError> {
    for sql in CREATE_TABLES {
        sqlx::query(sql).execute(pool).await?;
    }

    for (table, column) in ADDED_COLUMNS {
        add_column_if_missing(pool, table, column).await?;
    }

    let backfilled = sqlx::query(BACKFILL_CREATED_AT)
        .execute(pool)
        .await?
        .rows_affected();
    if backfilled > 0 {
        tracing::info!(rows = backfilled, "Backfilled order timestamps");
    }

    for sql in CREATE_INDEXES {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}

/// Add a column unless the table already has it.
async fn add_column_if_missing(
    pool: &SqlitePool,
    table: &str,
    column_def: &str,
) -> Result<(), RepositoryError> {
    let column = column_def.split_whitespace().next().unwrap_or_default();
    let existing: Vec<String> = sqlx::query_scalar(&format!(
        "SELECT name FROM pragma_table_info('{table}')"
    ))
    .fetch_all(pool)
    .await?;

    if existing.iter().any(|name| name == column) {
        return Ok(());
    }

    sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {column_def}"))
        .execute(pool)
        .await?;
    tracing::info!(table, column, "Added column");
    Ok(())
}
