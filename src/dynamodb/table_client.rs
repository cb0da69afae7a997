use aws_sdk_dynamodb::types::AttributeValue;
use tracing::{info, instrument, warn};

use crate::dynamodb::{
    DeleteReceipt, ErrorKind, Item, KeyValue, PutReceipt, Result, Store, TableDefinition,
    TableError, TableHandle, TableStatus, UpdatedAttributes, WaitPolicy,
};
use crate::utils::{poll_until, PollError};

/// High-level CRUD operations against one store.
///
/// The store is injected at construction, so the same code runs against
/// DynamoDB or the in-memory store. Every operation is independent: a failure
/// leaves the client usable for the next call.
#[derive(Debug)]
pub struct TableClient<S> {
    store: S,
}

impl<S: Store> TableClient<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    // --- Table Operations ---

    /// Creates the table and waits until it is active.
    ///
    /// An existing table is not an error: the call still waits for it to be
    /// active and returns its handle.
    #[instrument(skip(self, definition), fields(table = definition.name()))]
    pub async fn create_table(
        &self,
        definition: &TableDefinition,
        wait: WaitPolicy,
    ) -> Result<TableHandle> {
        definition.validate()?;
        wait.validate()?;

        match self.store.create_table(definition).await {
            Ok(()) => info!("Table '{}' is being created", definition.name()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                info!("Table '{}' already exists", definition.name())
            }
            Err(e) => return Err(e),
        }

        self.wait_until_active(definition.name(), wait).await?;
        info!("Table '{}' is active", definition.name());
        Ok(definition.handle())
    }

    /// Polls the table status until it is `Active` or the policy's timeout elapses.
    pub async fn wait_until_active(&self, table_name: &str, wait: WaitPolicy) -> Result<()> {
        wait.validate()?;
        let probe = move || async move {
            self.store
                .describe_table(table_name)
                .await
                .map(|status| (status == Some(TableStatus::Active)).then_some(()))
        };

        poll_until(probe, wait.poll_interval, wait.timeout)
            .await
            .map_err(|e| match e {
                PollError::Probe(e) => e,
                PollError::TimedOut { waited, attempts } => {
                    warn!("Gave up waiting for '{table_name}' after {waited:?}");
                    TableError::ActivationTimeout {
                        table_name: table_name.to_string(),
                        waited,
                        attempts,
                    }
                }
            })
    }

    /// Deletes the table.
    pub async fn drop_table(&self, table: &TableHandle) -> Result<()> {
        self.store.delete_table(table.name()).await
    }

    // --- Item Operations ---

    /// Writes `item`, replacing any existing item with the same key.
    pub async fn put_item(&self, table: &TableHandle, item: Item) -> Result<PutReceipt> {
        table.key().validate_item(&item)?;
        self.store.put_item(table.name(), item).await
    }

    /// Looks up the item with primary key `key`.
    pub async fn get_item(
        &self,
        table: &TableHandle,
        key: impl Into<KeyValue>,
    ) -> Result<Option<Item>> {
        let key = table.key().key_item(&key.into())?;
        self.store.get_item(table.name(), key).await
    }

    /// Sets `attribute` to `value` on the item at `key`.
    pub async fn update_item(
        &self,
        table: &TableHandle,
        key: impl Into<KeyValue>,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<UpdatedAttributes> {
        if attribute.is_empty() {
            return Err(TableError::InvalidUpdate(
                "attribute name must not be empty".to_string(),
            ));
        }
        if attribute == table.key().attribute_name() {
            return Err(TableError::InvalidUpdate(format!(
                "'{attribute}' is the primary key and cannot be updated"
            )));
        }
        let key = table.key().key_item(&key.into())?;
        self.store
            .update_item(table.name(), key, attribute, value)
            .await
    }

    /// Removes the item at `key`. Deleting a missing key succeeds.
    pub async fn delete_item(
        &self,
        table: &TableHandle,
        key: impl Into<KeyValue>,
    ) -> Result<DeleteReceipt> {
        let key = table.key().key_item(&key.into())?;
        self.store.delete_item(table.name(), key).await
    }
}
