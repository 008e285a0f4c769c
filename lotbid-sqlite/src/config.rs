//! Configuration for the SQLite connection.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How to open the lotbid database.
///
/// # Examples
///
/// ```
/// use lotbid_sqlite::config::SqliteConfig;
/// use std::path::PathBuf;
///
/// // A private in-memory database
/// let config = SqliteConfig::default();
///
/// // A database file, created on first use
/// let config = SqliteConfig {
///     database_path: Some(PathBuf::from("lotbid.db")),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database file. `None` opens an in-memory database shared by the
    /// reader and writer pools.
    pub database_path: Option<PathBuf>,

    /// Create the file if it does not exist
    pub create_if_missing: bool,

    /// How long a connection waits on a locked database before failing
    pub busy_timeout_secs: u64,

    /// Upper bound on concurrent read connections
    pub max_readers: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            create_if_missing: true,
            busy_timeout_secs: 5,
            max_readers: 8,
        }
    }
}
