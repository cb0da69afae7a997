mod config;
mod dynamodb;
mod lifecycle;
mod logging;
mod utils;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use crate::config::{Config, StoreKind};
use crate::dynamodb::{DynamoDb, MemoryStore, Store, TableClient};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = Config::parse();
    logging::init_logging(config.log_level)?;

    info!("Target: {}", config.target_display());

    match config.store {
        StoreKind::Dynamodb => {
            let sdk_config = config.sdk_config().await;
            run(TableClient::new(DynamoDb::new(&sdk_config)), &config).await
        }
        StoreKind::Memory => run(TableClient::new(MemoryStore::new()), &config).await,
    }
}

async fn run<S: Store>(client: TableClient<S>, config: &Config) -> Result<()> {
    let definition = config.table_definition();
    let report =
        lifecycle::run(&client, &definition, config.wait_policy(), config.cleanup).await;

    // Step failures are reported in the log, not through the exit status.
    match report.failed_steps().as_slice() {
        [] => info!("Lifecycle finished: {} steps, none failed", report.steps.len()),
        failed => warn!(
            "Lifecycle finished: {} steps, {} failed: {failed:?}",
            report.steps.len(),
            failed.len()
        ),
    }
    Ok(())
}
