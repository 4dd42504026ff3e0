//! Schema migration.
//!
//! The schema is created with `CREATE TABLE IF NOT EXISTS` and upgraded by
//! adding missing columns, so running this against an existing database is
//! always safe.
//!
//! ```bash
//! DATABASE_PATH=/var/lib/hearty/hearty_house.db hh-cli migrate
//! ```

/// Create or upgrade the schema at `DATABASE_PATH`.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::open_database().await?;
    pool.close().await;
    tracing::info!("Schema is up to date");
    Ok(())
}
