use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::Level;

use crate::dynamodb::{Capacity, KeyType, TableDefinition, WaitPolicy};

/// Which store the lifecycle runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Amazon DynamoDB (or DynamoDB Local via `--endpoint-url`).
    Dynamodb,
    /// An in-process store; needs no credentials.
    Memory,
}

/// Runs a create/put/get/update/delete lifecycle against a DynamoDB table.
///
/// Every option can also be set through the environment (a `.env` file is loaded first).
#[derive(Debug, Clone, Parser)]
#[command(name = "aws-dynamodb-crud", version)]
pub struct Config {
    /// Store backend.
    #[arg(long, env = "STORE", value_enum, default_value_t = StoreKind::Dynamodb)]
    pub store: StoreKind,

    /// AWS region.
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Custom endpoint URL, e.g. http://localhost:8000 for DynamoDB Local.
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    #[arg(long, env = "TABLE_NAME", default_value = "Orders")]
    pub table_name: String,

    /// Partition key attribute name.
    #[arg(long, env = "KEY_ATTRIBUTE", default_value = "PrimaryKey")]
    pub key_attribute: String,

    #[arg(long, env = "KEY_TYPE", value_enum, default_value_t = KeyType::String)]
    pub key_type: KeyType,

    #[arg(long, env = "READ_CAPACITY", default_value_t = 5)]
    pub read_capacity: u32,

    #[arg(long, env = "WRITE_CAPACITY", default_value_t = 5)]
    pub write_capacity: u32,

    /// Upper bound on the wait for a new table to become active, in seconds.
    #[arg(long, env = "WAIT_TIMEOUT_SECS", default_value_t = 120)]
    pub wait_timeout_secs: u64,

    /// Delay between table status checks, in milliseconds.
    #[arg(
        long,
        env = "POLL_INTERVAL_MS",
        default_value_t = 2000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_ms: u64,

    /// Delete the table once the lifecycle has run.
    #[arg(long, env = "CLEANUP")]
    pub cleanup: bool,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: Level,
}

impl Config {
    pub fn table_definition(&self) -> TableDefinition {
        TableDefinition::keyed(&self.table_name, &self.key_attribute, self.key_type)
            .with_capacity(Capacity::new(self.read_capacity, self.write_capacity))
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            timeout: Duration::from_secs(self.wait_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    /// Loads the AWS SDK configuration for the configured region and endpoint.
    pub async fn sdk_config(&self) -> aws_config::SdkConfig {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(self.region.clone()));

        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        loader.load().await
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match (self.store, &self.endpoint_url) {
            (StoreKind::Memory, _) => "in-memory store".to_string(),
            (StoreKind::Dynamodb, Some(url)) => format!("Local DynamoDB ({url})"),
            (StoreKind::Dynamodb, None) => format!("AWS DynamoDB (region: {})", self.region),
        }
    }
}
