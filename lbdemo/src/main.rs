use std::fs::File;

use lbdemo::{
    AppConfig, Cli,
    impls::{DemoApp, signing_key},
};
use lotbid_axum::{openapi, start_server};
use lotbid_sqlite::Db;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Every crate in the workspace reports through `tracing`; RUST_LOG picks
    // what reaches stdout.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::import()?;

    // If requested, dump the schema and exit.
    if let Some(path) = &cli.schema {
        serde_json::to_writer_pretty(File::create(path)?, &openapi::<DemoApp>())?;
        return Ok(());
    }

    let key = signing_key(&cli.secret)?;
    let AppConfig { server, database } = AppConfig::load(&cli)?;

    let db = Db::open(&database).await?;
    tracing::info!(path = ?database.database_path, "opened database");
    let app = DemoApp { db, key };

    start_server(server, app).await?;
    Ok(())
}
