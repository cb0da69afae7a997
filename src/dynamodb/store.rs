//! The boundary to the remote key-value service.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;

use crate::dynamodb::{Item, Result, TableDefinition, TableStatus};

/// What the store reported for a put.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PutReceipt {
    /// The item that was overwritten, if one existed.
    pub replaced: Option<Item>,
    pub consumed_capacity_units: Option<f64>,
}

/// The post-update values of the attributes an update touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatedAttributes {
    pub attributes: Item,
}

impl UpdatedAttributes {
    #[allow(dead_code)]
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

/// What the store reported for a delete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteReceipt {
    /// The removed item; `None` when the key was already absent.
    pub deleted: Option<Item>,
}

/// Raw table and item operations against a key-value store.
///
/// Implementations issue exactly one request per call and never retry.
/// Failures are returned as classified [`TableError`](crate::dynamodb::TableError)s.
#[async_trait]
pub trait Store: Send + Sync {
    /// Issues a create request. An existing table yields an `AlreadyExists` error.
    async fn create_table(&self, definition: &TableDefinition) -> Result<()>;

    /// Returns the table's status, or `None` if the table is not visible.
    async fn describe_table(&self, table_name: &str) -> Result<Option<TableStatus>>;

    async fn delete_table(&self, table_name: &str) -> Result<()>;

    /// Unconditionally writes `item`, replacing any item with the same key.
    async fn put_item(&self, table_name: &str, item: Item) -> Result<PutReceipt>;

    async fn get_item(&self, table_name: &str, key: Item) -> Result<Option<Item>>;

    /// Sets a single attribute on the item at `key`, creating the item if absent.
    async fn update_item(
        &self,
        table_name: &str,
        key: Item,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<UpdatedAttributes>;

    /// Removes the item at `key`. A missing key is not an error.
    async fn delete_item(&self, table_name: &str, key: Item) -> Result<DeleteReceipt>;
}
