#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use sqlx::sqlite;
use std::{str::FromStr, time::Duration};
use tokio::try_join;

pub mod config;
mod r#impl;
pub mod types;

use config::SqliteConfig;

/// SQLite implementation of every `lotbid-core` repository.
///
/// Reads go through `reader`; writes are serialized through `writer`, which
/// holds a single connection. This matches SQLite's one-writer model and
/// lets the uniqueness constraints in the schema decide every race.
///
/// # Example
///
/// ```no_run
/// # use lotbid_sqlite::{Db, config::SqliteConfig};
/// # async fn example() -> Result<(), sqlx::Error> {
/// let db = Db::open(&SqliteConfig::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Db {
    /// Connection pool for read operations
    pub reader: sqlx::Pool<sqlx::Sqlite>,
    /// Connection pool for write operations (limited to 1 connection)
    pub writer: sqlx::Pool<sqlx::Sqlite>,
}

impl Db {
    /// Open (and if configured, create) the database and apply pending
    /// migrations.
    ///
    /// Connections use WAL journaling and enforce foreign keys.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if a connection cannot be established or a
    /// migration fails.
    pub async fn open(config: &SqliteConfig) -> Result<Self, sqlx::Error> {
        let db_path = config
            .database_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());

        let options =
            sqlite::SqliteConnectOptions::from_str(db_path.as_deref().unwrap_or(":memory:"))?
                .busy_timeout(Duration::from_secs(config.busy_timeout_secs))
                .foreign_keys(true)
                .journal_mode(sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlite::SqliteSynchronous::Normal)
                .pragma("temp_store", "memory")
                .create_if_missing(config.create_if_missing);

        let reader = sqlite::SqlitePoolOptions::new()
            .max_connections(config.max_readers.max(1))
            .connect_with(options.clone());
        let writer = sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options);

        let (reader, writer) = try_join!(reader, writer)?;

        sqlx::migrate!("./schema").run(&writer).await?;

        Ok(Self { reader, writer })
    }
}

/// Classify a failed write: `Some` if the database rejected it for a
/// uniqueness violation, in which case the caller reports a conflict.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<&dyn sqlx::error::DatabaseError> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Some(&**db_err),
        _ => None,
    }
}
