//! Application configuration management.
//!
//! Configuration is merged from defaults, an optional file and the
//! environment, in increasing order of precedence.

use crate::Cli;
use serde::{Deserialize, Serialize};

/// The main application configuration that composes all component configs
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Web server configuration (bind address, paging, allocation depth)
    #[serde(default)]
    pub server: lotbid_axum::config::AxumConfig,

    /// Database configuration (file location, pool settings)
    #[serde(default)]
    pub database: lotbid_sqlite::config::SqliteConfig,
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file given by the CLI
    /// 3. Default values (lowest priority)
    ///
    /// Environment variables are mapped using the pattern
    /// `APP_<SECTION>__<KEY>` to `<section>.<key>`:
    ///
    /// ```bash
    /// export APP_DATABASE__DATABASE_PATH="/data/lots.db"
    /// export APP_SERVER__BIND_ADDRESS="0.0.0.0:3000"
    /// ```
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = &cli.config {
            if path.exists() {
                config = config.add_source(config::File::from(path.as_path()))
            } else {
                return Err(anyhow::anyhow!(
                    "Config file {} does not exist",
                    path.display()
                ));
            }
        }

        // APP_SERVER__BIND_ADDRESS maps to server.bind_address
        config = config.add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        config.build()?.try_deserialize().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn cli(config: Option<std::path::PathBuf>) -> Cli {
        Cli {
            config,
            secret: "secret".to_string(),
            schema: None,
        }
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let config = AppConfig::load(&cli(None)).unwrap();
        assert_eq!(config.server.page_limit, 100);
        assert!(config.database.database_path.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let path = std::env::temp_dir().join(format!("lbdemo-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[server]\npage_limit = 25\nallocation_depth = 5").unwrap();
        drop(file);

        let config = AppConfig::load(&cli(Some(path.clone()))).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.server.page_limit, 25);
        assert_eq!(config.server.allocation_depth, 5);
    }

    #[test]
    fn a_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("lbdemo-does-not-exist.toml");
        assert!(AppConfig::load(&cli(Some(path))).is_err());
    }
}
