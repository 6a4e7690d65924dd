pub mod error;
pub mod movie;

use std::str::FromStr as _;

pub use error::Error;
pub use sqlx::Error as SqlxError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;

use crate::error::Result;

pub type ChosenDB = sqlx::Sqlite;
pub type Pool = sqlx::Pool<ChosenDB>;

pub async fn new_pool(database_url: &str) -> Result<Pool, Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(50)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Applies the bundled schema migrations
pub async fn migrate(pool: &Pool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    debug!("Database schema is up to date");
    Ok(())
}
