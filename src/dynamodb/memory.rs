//! In-memory [`Store`] that mimics the DynamoDB behaviors this crate depends on.
//!
//! Used by the test suite and by `--store memory` runs that have no AWS account.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::dynamodb::{
    DeleteReceipt, Item, KeySchema, KeyValue, Operation, PutReceipt, Result, Store,
    TableDefinition, TableError, TableStatus, UpdatedAttributes,
};

#[derive(Debug)]
struct MemoryTable {
    key: KeySchema,
    /// Describe calls left before the table reports `Active`.
    polls_until_active: usize,
    items: HashMap<KeyValue, Item>,
}

impl MemoryTable {
    fn is_active(&self) -> bool {
        self.polls_until_active == 0
    }

    fn key_of(&self, operation: Operation, item: &Item) -> Result<KeyValue> {
        self.key.validate_item(item).map_err(|e| {
            TableError::from_code(operation, "ValidationException", e.to_string())
        })?;
        item.get(self.key.attribute_name())
            .and_then(KeyValue::from_attribute_value)
            .ok_or_else(|| {
                TableError::from_code(
                    operation,
                    "ValidationException",
                    "The provided key element does not match the schema",
                )
            })
    }

    fn exact_key(&self, operation: Operation, key: &Item) -> Result<KeyValue> {
        if key.len() != 1 {
            return Err(TableError::from_code(
                operation,
                "ValidationException",
                "The provided key element does not match the schema",
            ));
        }
        self.key_of(operation, key)
    }
}

/// A process-local key-value store.
///
/// Clones share the same tables, so a test can keep one handle for inspection
/// while another is owned by a [`TableClient`](crate::dynamodb::TableClient).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, MemoryTable>>>,
    activation_polls: usize,
    failures: Arc<Mutex<HashMap<Operation, String>>>,
    requests: Arc<Mutex<Vec<Operation>>>,
}

impl MemoryStore {
    /// Creates a store whose tables become active immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// New tables report `Creating` for this many describe calls.
    #[allow(dead_code)]
    pub fn with_activation_polls(mut self, polls: usize) -> Self {
        self.activation_polls = polls;
        self
    }

    /// Makes the next call of `operation` fail with the given error code.
    #[allow(dead_code)]
    pub async fn fail_next(&self, operation: Operation, code: impl Into<String>) {
        self.failures.lock().await.insert(operation, code.into());
    }

    /// Operations received so far, in order.
    #[allow(dead_code)]
    pub async fn requests(&self) -> Vec<Operation> {
        self.requests.lock().await.clone()
    }

    #[allow(dead_code)]
    pub async fn item_count(&self, table_name: &str) -> Option<usize> {
        self.tables
            .read()
            .await
            .get(table_name)
            .map(|t| t.items.len())
    }

    async fn begin(&self, operation: Operation) -> Result<()> {
        self.requests.lock().await.push(operation);
        match self.failures.lock().await.remove(&operation) {
            Some(code) => {
                debug!("Injected {code} for {operation}");
                Err(TableError::from_code(operation, &code, "injected failure"))
            }
            None => Ok(()),
        }
    }
}

fn table_not_found(operation: Operation, table_name: &str) -> TableError {
    TableError::from_code(
        operation,
        "ResourceNotFoundException",
        format!("Requested resource not found: Table: {table_name} not found"),
    )
}

fn active_table<'a>(
    tables: &'a mut HashMap<String, MemoryTable>,
    operation: Operation,
    table_name: &str,
) -> Result<&'a mut MemoryTable> {
    match tables.get_mut(table_name) {
        Some(table) if table.is_active() => Ok(table),
        _ => Err(table_not_found(operation, table_name)),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_table(&self, definition: &TableDefinition) -> Result<()> {
        self.begin(Operation::CreateTable).await?;
        let mut tables = self.tables.write().await;
        if tables.contains_key(definition.name()) {
            return Err(TableError::from_code(
                Operation::CreateTable,
                "ResourceInUseException",
                format!("Table already exists: {}", definition.name()),
            ));
        }
        tables.insert(
            definition.name().to_string(),
            MemoryTable {
                key: definition.key().clone(),
                polls_until_active: self.activation_polls,
                items: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn describe_table(&self, table_name: &str) -> Result<Option<TableStatus>> {
        self.begin(Operation::DescribeTable).await?;
        let mut tables = self.tables.write().await;
        Ok(tables.get_mut(table_name).map(|table| {
            if table.is_active() {
                TableStatus::Active
            } else {
                table.polls_until_active -= 1;
                TableStatus::Creating
            }
        }))
    }

    async fn delete_table(&self, table_name: &str) -> Result<()> {
        self.begin(Operation::DeleteTable).await?;
        match self.tables.write().await.remove(table_name) {
            Some(_) => Ok(()),
            None => Err(table_not_found(Operation::DeleteTable, table_name)),
        }
    }

    async fn put_item(&self, table_name: &str, item: Item) -> Result<PutReceipt> {
        self.begin(Operation::PutItem).await?;
        let mut tables = self.tables.write().await;
        let table = active_table(&mut tables, Operation::PutItem, table_name)?;
        let key = table.key_of(Operation::PutItem, &item)?;
        let replaced = table.items.insert(key, item);
        Ok(PutReceipt {
            replaced,
            consumed_capacity_units: Some(1.0),
        })
    }

    async fn get_item(&self, table_name: &str, key: Item) -> Result<Option<Item>> {
        self.begin(Operation::GetItem).await?;
        let mut tables = self.tables.write().await;
        let table = active_table(&mut tables, Operation::GetItem, table_name)?;
        let key = table.exact_key(Operation::GetItem, &key)?;
        Ok(table.items.get(&key).cloned())
    }

    async fn update_item(
        &self,
        table_name: &str,
        key: Item,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<UpdatedAttributes> {
        self.begin(Operation::UpdateItem).await?;
        let mut tables = self.tables.write().await;
        let table = active_table(&mut tables, Operation::UpdateItem, table_name)?;
        if attribute == table.key.attribute_name() {
            return Err(TableError::from_code(
                Operation::UpdateItem,
                "ValidationException",
                format!("Cannot update attribute {attribute}. This attribute is part of the key"),
            ));
        }
        let key_value = table.exact_key(Operation::UpdateItem, &key)?;
        let current = table.items.remove(&key_value).unwrap_or(key);
        table
            .items
            .insert(key_value, current.set(attribute, value.clone()));
        Ok(UpdatedAttributes {
            attributes: Item::new().set(attribute, value),
        })
    }

    async fn delete_item(&self, table_name: &str, key: Item) -> Result<DeleteReceipt> {
        self.begin(Operation::DeleteItem).await?;
        let mut tables = self.tables.write().await;
        let table = active_table(&mut tables, Operation::DeleteItem, table_name)?;
        let key = table.exact_key(Operation::DeleteItem, &key)?;
        Ok(DeleteReceipt {
            deleted: table.items.remove(&key),
        })
    }
}
