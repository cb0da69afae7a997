//! # DynamoDB Module
//!
//! A small CRUD interface over a single-key DynamoDB table.
//!
//! ## Components
//!
//! - `TableClient`: Creates a table and reads/writes its items through an injected `Store`.
//! - `Store`: The boundary to the key-value service.
//! - `DynamoDb`: `Store` implementation over the AWS SDK.
//! - `MemoryStore`: In-process `Store` used for tests and offline runs.
//! - `Item`: An open attribute map carrying at least the primary key.
//! - `KeySchema` / `KeyType` / `KeyValue`: The table's partition key and its values.
//! - `TableDefinition`: Name, key and provisioned capacity of a table.
//! - `TableError` / `ErrorKind`: Failures, classified by the store's error code.
//!
//! ## Usage
//!
//! The AWS-backed store reads its configuration from the environment:
//!
//! - `AWS_ACCESS_KEY_ID`: Your AWS access key ID.
//! - `AWS_SECRET_ACCESS_KEY`: Your AWS secret access key.
//! - `AWS_REGION`: The AWS region where your DynamoDB tables are located.
//!
//! Optionally, you can also set:
//! - `AWS_SESSION_TOKEN`: If you're using temporary credentials.
//! - `AWS_ENDPOINT_URL`: For using a custom endpoint (e.g., DynamoDB Local).
//!
//! ## Example
//!
//! ```ignore
//! let client = TableClient::new(DynamoDb::new(&aws_config::load_from_env().await));
//!
//! let definition = TableDefinition::keyed("Orders", "PrimaryKey", KeyType::String);
//! let table = client.create_table(&definition, WaitPolicy::default()).await?;
//!
//! client
//!     .put_item(&table, Item::new().set_string("PrimaryKey", "001"))
//!     .await?;
//! let item = client.get_item(&table, "001").await?;
//! ```

mod client;
mod error;
mod item;
mod memory;
mod schema;
mod store;
mod table;
mod table_client;

pub use client::DynamoDb;
pub use error::{ErrorKind, Operation, Result, TableError};
pub use item::Item;
pub use memory::MemoryStore;
pub use schema::{KeySchema, KeyType, KeyValue};
pub use store::{DeleteReceipt, PutReceipt, Store, UpdatedAttributes};
pub use table::{Capacity, TableDefinition, TableHandle, TableStatus, WaitPolicy};
pub use table_client::TableClient;
