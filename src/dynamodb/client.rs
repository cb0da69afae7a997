use async_trait::async_trait;
use aws_sdk_dynamodb::{
    types::{
        AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
        ProvisionedThroughput, ReturnConsumedCapacity, ReturnValue,
    },
    Client,
};
use tracing::{debug, info, instrument};

use crate::dynamodb::{
    DeleteReceipt, Item, Operation, PutReceipt, Result, Store, TableDefinition, TableError,
    TableStatus, UpdatedAttributes,
};

/// DynamoDB client wrapper implementing [`Store`] over the AWS SDK.
///
/// Each method issues exactly one request. SDK errors are classified by their
/// error code into [`ErrorKind`](crate::dynamodb::ErrorKind)s; nothing is retried
/// here beyond what the SDK itself does.
///
/// # DynamoDB Concepts
///
/// ## Tables
/// A table is a collection of items, and each item consists of attributes.
/// Tables are schemaless apart from the primary key, so each item may have a
/// different structure.
///
/// ## Primary Key
/// Tables managed here use a simple primary key: one partition key attribute
/// whose type is String, Number or Binary.
///
/// ## Operations
/// - **Put**: Write an item, replacing any item with the same key
/// - **Get**: Retrieve an item by its primary key
/// - **Update**: Set one attribute of an item
/// - **Delete**: Remove an item
///
/// # Example
///
/// ```ignore
/// let config = aws_config::load_from_env().await;
/// let client = TableClient::new(DynamoDb::new(&config));
/// let table = client.create_table(&definition, WaitPolicy::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DynamoDb {
    client: Client,
}

impl DynamoDb {
    /// Creates a new `DynamoDb` instance.
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

fn request_error(
    operation: Operation,
) -> impl Fn(aws_sdk_dynamodb::error::BuildError) -> TableError {
    move |e| TableError::Request {
        operation,
        message: e.to_string(),
    }
}

#[async_trait]
impl Store for DynamoDb {
    // --- Table Operations ---

    #[instrument(skip(self, definition), fields(table = definition.name()))]
    async fn create_table(&self, definition: &TableDefinition) -> Result<()> {
        let key = definition.key();
        let capacity = definition.capacity();

        let attribute_definition = AttributeDefinition::builder()
            .attribute_name(key.attribute_name())
            .attribute_type(key.key_type().scalar_type())
            .build()
            .map_err(request_error(Operation::CreateTable))?;

        let key_schema = KeySchemaElement::builder()
            .attribute_name(key.attribute_name())
            .key_type(KeyType::Hash)
            .build()
            .map_err(request_error(Operation::CreateTable))?;

        let throughput = ProvisionedThroughput::builder()
            .read_capacity_units(i64::from(capacity.read_units))
            .write_capacity_units(i64::from(capacity.write_units))
            .build()
            .map_err(request_error(Operation::CreateTable))?;

        self.client
            .create_table()
            .table_name(definition.name())
            .billing_mode(BillingMode::Provisioned)
            .attribute_definitions(attribute_definition)
            .key_schema(key_schema)
            .provisioned_throughput(throughput)
            .send()
            .await
            .map_err(|e| TableError::from_sdk(Operation::CreateTable, e))?;

        info!("Create request accepted for '{}'", definition.name());
        Ok(())
    }

    async fn describe_table(&self, table_name: &str) -> Result<Option<TableStatus>> {
        match self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
        {
            Ok(response) => {
                let status = match response.table().and_then(|t| t.table_status()) {
                    Some(aws_sdk_dynamodb::types::TableStatus::Active) => TableStatus::Active,
                    Some(aws_sdk_dynamodb::types::TableStatus::Creating) => TableStatus::Creating,
                    Some(aws_sdk_dynamodb::types::TableStatus::Updating) => TableStatus::Updating,
                    Some(aws_sdk_dynamodb::types::TableStatus::Deleting) => TableStatus::Deleting,
                    _ => TableStatus::Other,
                };
                debug!("Table '{table_name}' status: {status:?}");
                Ok(Some(status))
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception()) =>
            {
                Ok(None)
            }
            Err(err) => Err(TableError::from_sdk(Operation::DescribeTable, err)),
        }
    }

    #[instrument(skip(self))]
    async fn delete_table(&self, table_name: &str) -> Result<()> {
        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| TableError::from_sdk(Operation::DeleteTable, e))?;
        info!("Table '{table_name}' deleted");
        Ok(())
    }

    // --- Item Operations ---

    #[instrument(skip(self, item))]
    async fn put_item(&self, table_name: &str, item: Item) -> Result<PutReceipt> {
        let response = self
            .client
            .put_item()
            .table_name(table_name)
            .set_item(Some(item.attributes))
            .return_values(ReturnValue::AllOld)
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(|e| TableError::from_sdk(Operation::PutItem, e))?;

        info!("Item added to '{table_name}'");
        Ok(PutReceipt {
            consumed_capacity_units: response
                .consumed_capacity()
                .and_then(|c| c.capacity_units()),
            replaced: response.attributes.map(Item::from),
        })
    }

    #[instrument(skip(self, key))]
    async fn get_item(&self, table_name: &str, key: Item) -> Result<Option<Item>> {
        let response = self
            .client
            .get_item()
            .table_name(table_name)
            .set_key(Some(key.attributes))
            .send()
            .await
            .map_err(|e| TableError::from_sdk(Operation::GetItem, e))?;

        Ok(response.item.map(Item::from))
    }

    #[instrument(skip(self, key, value))]
    async fn update_item(
        &self,
        table_name: &str,
        key: Item,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<UpdatedAttributes> {
        let response = self
            .client
            .update_item()
            .table_name(table_name)
            .set_key(Some(key.attributes))
            .update_expression("SET #attr = :val")
            .expression_attribute_names("#attr", attribute)
            .expression_attribute_values(":val", value)
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(|e| TableError::from_sdk(Operation::UpdateItem, e))?;

        info!("Item updated in '{table_name}'");
        Ok(UpdatedAttributes {
            attributes: response.attributes.map(Item::from).unwrap_or_default(),
        })
    }

    #[instrument(skip(self, key))]
    async fn delete_item(&self, table_name: &str, key: Item) -> Result<DeleteReceipt> {
        let response = self
            .client
            .delete_item()
            .table_name(table_name)
            .set_key(Some(key.attributes))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| TableError::from_sdk(Operation::DeleteItem, e))?;

        info!("Item deleted from '{table_name}'");
        Ok(DeleteReceipt {
            deleted: response.attributes.map(Item::from),
        })
    }
}
