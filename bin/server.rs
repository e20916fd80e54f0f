// Insurance Transaction Handler - Tool Server
// Serves the remediation tools over HTTP for an external orchestrator

use anyhow::{Context, Result};
use std::sync::Arc;

use insurance_txn_handler::{api, init_logging, AppConfig, RecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("Invalid environment configuration")?;
    init_logging(&config.logging);

    // The store is loaded once and shared read-only by every request
    let store = RecordStore::from_path(&config.data_file)
        .with_context(|| format!("Failed to load transactions from {}", config.data_file.display()))?;

    api::serve(Arc::new(store), &config.server.bind_address).await
}
