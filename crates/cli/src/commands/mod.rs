//! CLI subcommands.

pub mod menu;
pub mod migrate;
pub mod orders;

use sqlx::SqlitePool;

use hearty_house_bot::config::database_path_from_env;
use hearty_house_bot::db;

/// Open the configured database and make sure the schema is current.
pub async fn open_database() -> Result<SqlitePool, Box<dyn std::error::Error>> {
    let path = database_path_from_env();
    tracing::info!(path = %path.display(), "Opening database");
    let pool = db::create_pool(&path).await?;
    db::schema::initialize(&pool).await?;
    Ok(pool)
}
