//! The create/put/get/update/delete run performed by the binary.
//!
//! Each step runs in its own failure scope: a failed step is recorded and
//! logged, and the remaining steps still run.

use aws_sdk_dynamodb::types::AttributeValue;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::dynamodb::{
    Item, KeyType, KeyValue, Result, Store, TableClient, TableDefinition, TableError, WaitPolicy,
};

pub const UPDATED_ATTRIBUTE: &str = "Attribute1";
pub const UPDATED_VALUE: &str = "UpdatedValue";

/// The non-key attributes of the order written by the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAttributes {
    #[serde(rename = "Attribute1")]
    pub attribute1: String,
    #[serde(rename = "Attribute2")]
    pub attribute2: String,
}

impl Default for OrderAttributes {
    fn default() -> Self {
        Self {
            attribute1: "Value1".to_string(),
            attribute2: "Value2".to_string(),
        }
    }
}

/// The key the lifecycle writes under, in the table's key type.
pub fn order_key(key_type: KeyType) -> KeyValue {
    match key_type {
        KeyType::String => KeyValue::from("001"),
        KeyType::Number => KeyValue::from(1_i64),
        KeyType::Binary => KeyValue::from(b"001".to_vec()),
    }
}

/// Builds the order item for `definition`'s key schema.
pub fn order_item(definition: &TableDefinition, attributes: &OrderAttributes) -> Result<Item> {
    let key = definition.key();
    let item = Item::from_serializable(attributes)?;
    Ok(item.set(
        key.attribute_name(),
        order_key(key.key_type()).to_attribute_value(),
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateTable,
    PutItem,
    GetItem,
    UpdateItem,
    DeleteItem,
    DropTable,
}

#[derive(Debug)]
#[allow(dead_code)]
pub enum Outcome {
    Succeeded(String),
    Failed(TableError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded(_))
    }
}

#[derive(Debug)]
pub struct StepReport {
    pub step: Step,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub struct LifecycleReport {
    pub steps: Vec<StepReport>,
}

impl LifecycleReport {
    /// The outcome of the first run of `step`, if it ran.
    #[allow(dead_code)]
    pub fn outcome(&self, step: Step) -> Option<&Outcome> {
        self.steps
            .iter()
            .find(|report| report.step == step)
            .map(|report| &report.outcome)
    }

    pub fn failures(&self) -> usize {
        self.failed_steps().len()
    }

    pub fn failed_steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .filter(|r| !r.outcome.is_success())
            .map(|r| r.step)
            .collect()
    }

    fn record(&mut self, step: Step, result: Result<String>) {
        let outcome = match result {
            Ok(detail) => {
                info!("{step:?}: {detail}");
                Outcome::Succeeded(detail)
            }
            Err(e) => {
                error!("{step:?} failed [{}]: {e}", e.kind());
                Outcome::Failed(e)
            }
        };
        self.steps.push(StepReport { step, outcome });
    }
}

/// Runs create, put, get, update and delete in order, optionally dropping the table last.
pub async fn run<S: Store>(
    client: &TableClient<S>,
    definition: &TableDefinition,
    wait: WaitPolicy,
    cleanup: bool,
) -> LifecycleReport {
    let mut report = LifecycleReport::default();
    let table = definition.handle();
    let key = order_key(definition.key().key_type());

    let created = client.create_table(definition, wait).await;
    report.record(
        Step::CreateTable,
        created.map(|handle| format!("Table '{}' ready", handle.name())),
    );

    let put = match order_item(definition, &OrderAttributes::default()) {
        Ok(item) => client.put_item(&table, item).await,
        Err(e) => Err(e),
    };
    report.record(
        Step::PutItem,
        put.map(|receipt| match receipt.replaced {
            Some(_) => "Item inserted, replacing an existing item".to_string(),
            None => "Item inserted".to_string(),
        }),
    );

    let got = client.get_item(&table, key.clone()).await;
    report.record(
        Step::GetItem,
        got.map(|item| match item {
            Some(item) => match item.deserialize::<OrderAttributes>() {
                Ok(order) => format!("Item read: {order:?}"),
                Err(_) => format!("Item read: {:?}", item.attributes()),
            },
            None => "Item not found".to_string(),
        }),
    );

    let updated = client
        .update_item(
            &table,
            key.clone(),
            UPDATED_ATTRIBUTE,
            AttributeValue::S(UPDATED_VALUE.to_string()),
        )
        .await;
    report.record(
        Step::UpdateItem,
        updated.map(|attrs| format!("Item updated: {:?}", attrs.attributes.attributes())),
    );

    let deleted = client.delete_item(&table, key).await;
    report.record(
        Step::DeleteItem,
        deleted.map(|receipt| match receipt.deleted {
            Some(_) => "Item deleted".to_string(),
            None => "No item to delete".to_string(),
        }),
    );

    if cleanup {
        let dropped = client.drop_table(&table).await;
        report.record(
            Step::DropTable,
            dropped.map(|()| format!("Table '{}' deleted", table.name())),
        );
    }

    report
}
