//! Tests for table and item operations
//!
//! These tests cover:
//! - Idempotent table creation and the bounded wait for an active table
//! - Basic CRUD operations (Put, Get, Update, Delete)
//! - Key validation at the client boundary
//! - Error classification and per-step isolation in the lifecycle
//! - Item, KeySchema, TableDefinition and Config behavior
//!
//! # Setup
//!
//! Almost everything runs against `MemoryStore` and needs no credentials.
//! `test_live_lifecycle` talks to a real DynamoDB endpoint and is ignored by
//! default. To run it, set the following in your `.env` file:
//!
//! ```text
//! AWS_ACCESS_KEY_ID=your_access_key
//! AWS_SECRET_ACCESS_KEY=your_secret_key
//! AWS_REGION=your_preferred_region
//! ```
//!
//! For DynamoDB Local, use dummy credentials and set:
//!
//! ```text
//! AWS_ENDPOINT_URL=http://localhost:8000
//! ```
//!
//! then run `cargo test -- --ignored`.
//!
//! Note: the live test may incur AWS charges if run against a real DynamoDB instance.

use crate::config::{Config, StoreKind};
use crate::dynamodb::{
    Capacity, DynamoDb, ErrorKind, Item, KeySchema, KeyType, KeyValue, MemoryStore, Operation,
    TableClient, TableDefinition, TableError, TableHandle, WaitPolicy,
};
use crate::lifecycle::{self, Outcome, Step};
use crate::utils::{poll_until, PollError};
use anyhow::Result;
use aws_sdk_dynamodb::types::AttributeValue;
use clap::Parser;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Duration;
use tracing::{info, instrument};

const TEST_TABLE_NAME: &str = "Orders";
const PRIMARY_KEY: &str = "PrimaryKey";

fn fast_wait() -> WaitPolicy {
    WaitPolicy {
        timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(1),
    }
}

fn orders_definition() -> TableDefinition {
    TableDefinition::keyed(TEST_TABLE_NAME, PRIMARY_KEY, KeyType::String)
}

fn order(key: &str) -> Item {
    Item::new()
        .set_string(PRIMARY_KEY, key)
        .set_string("Attribute1", "Value1")
        .set_string("Attribute2", "Value2")
}

#[instrument]
async fn setup_test_table(store: &MemoryStore) -> Result<TableHandle> {
    let client = TableClient::new(store.clone());
    let table = client.create_table(&orders_definition(), fast_wait()).await?;
    info!("Table ready");
    Ok(table)
}

// --- Table creation ---

#[tokio::test]
async fn test_create_table_is_idempotent() -> Result<()> {
    let client = TableClient::new(MemoryStore::new());

    let first = client.create_table(&orders_definition(), fast_wait()).await?;
    let second = client.create_table(&orders_definition(), fast_wait()).await?;

    assert_eq!(first, second);
    assert_eq!(first.name(), TEST_TABLE_NAME);
    assert_eq!(first.key().attribute_name(), PRIMARY_KEY);
    Ok(())
}

#[tokio::test]
async fn test_create_waits_until_active() -> Result<()> {
    let store = MemoryStore::new().with_activation_polls(3);
    let client = TableClient::new(store.clone());

    let table = client.create_table(&orders_definition(), fast_wait()).await?;

    let describes = store
        .requests()
        .await
        .into_iter()
        .filter(|op| *op == Operation::DescribeTable)
        .count();
    assert_eq!(describes, 4);

    // Usable straight away, no extra readiness check.
    client.put_item(&table, order("001")).await?;
    assert!(client.get_item(&table, "001").await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_item_operations_fail_while_table_is_creating() {
    let store = MemoryStore::new().with_activation_polls(usize::MAX);
    let client = TableClient::new(store.clone());
    let definition = orders_definition();

    let err = client
        .create_table(
            &definition,
            WaitPolicy {
                timeout: Duration::from_millis(30),
                poll_interval: Duration::from_millis(5),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TableError::ActivationTimeout { .. }));
    assert_eq!(err.kind(), ErrorKind::Transient);

    let err = client
        .put_item(&definition.handle(), order("001"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.code(), Some("ResourceNotFoundException"));
}

#[tokio::test]
async fn test_activation_timeout_reports_attempts() {
    let store = MemoryStore::new().with_activation_polls(usize::MAX);
    let client = TableClient::new(store);

    let err = client
        .create_table(
            &orders_definition(),
            WaitPolicy {
                timeout: Duration::ZERO,
                poll_interval: Duration::from_millis(5),
            },
        )
        .await
        .unwrap_err();

    match err {
        TableError::ActivationTimeout {
            table_name,
            attempts,
            ..
        } => {
            assert_eq!(table_name, TEST_TABLE_NAME);
            assert_eq!(attempts, 1);
        }
        other => panic!("expected activation timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_definition_sends_nothing() {
    let store = MemoryStore::new();
    let client = TableClient::new(store.clone());

    let zero_capacity = orders_definition().with_capacity(Capacity::new(0, 5));
    let err = client
        .create_table(&zero_capacity, fast_wait())
        .await
        .unwrap_err();
    assert!(matches!(err, TableError::InvalidDefinition(_)));
    assert_eq!(err.kind(), ErrorKind::Permanent);

    let unnamed = TableDefinition::keyed("", PRIMARY_KEY, KeyType::String);
    assert!(client.create_table(&unnamed, fast_wait()).await.is_err());

    assert!(store.requests().await.is_empty());
}

#[tokio::test]
async fn test_zero_poll_interval_is_rejected() {
    let store = MemoryStore::new();
    let client = TableClient::new(store.clone());
    let busy_wait = WaitPolicy {
        timeout: Duration::from_secs(5),
        poll_interval: Duration::ZERO,
    };

    let err = client
        .create_table(&orders_definition(), busy_wait)
        .await
        .unwrap_err();
    assert!(matches!(err, TableError::InvalidWaitPolicy(_)));
    assert_eq!(err.kind(), ErrorKind::Permanent);

    let err = client
        .wait_until_active(TEST_TABLE_NAME, busy_wait)
        .await
        .unwrap_err();
    assert!(matches!(err, TableError::InvalidWaitPolicy(_)));

    assert!(store.requests().await.is_empty());
}

#[tokio::test]
async fn test_create_surfaces_other_errors() {
    let store = MemoryStore::new();
    store
        .fail_next(Operation::CreateTable, "AccessDeniedException")
        .await;
    let client = TableClient::new(store);

    let err = client
        .create_table(&orders_definition(), fast_wait())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permanent);
    assert_eq!(err.code(), Some("AccessDeniedException"));
}

#[tokio::test]
async fn test_drop_table() -> Result<()> {
    let store = MemoryStore::new();
    let table = setup_test_table(&store).await?;
    let client = TableClient::new(store.clone());

    client.drop_table(&table).await?;
    assert_eq!(store.item_count(TEST_TABLE_NAME).await, None);

    let err = client.get_item(&table, "001").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    Ok(())
}

// --- Item operations ---

#[tokio::test]
#[instrument]
async fn test_order_scenario() -> Result<()> {
    let store = MemoryStore::new();
    let table = setup_test_table(&store).await?;
    let client = TableClient::new(store);

    info!("Testing put_item");
    client.put_item(&table, order("001")).await?;

    info!("Testing get_item");
    assert_eq!(client.get_item(&table, "001").await?, Some(order("001")));

    info!("Testing update_item");
    let updated = client
        .update_item(
            &table,
            "001",
            "Attribute1",
            AttributeValue::S("UpdatedValue".to_string()),
        )
        .await?;
    assert_eq!(
        updated.get("Attribute1"),
        Some(&AttributeValue::S("UpdatedValue".to_string()))
    );

    info!("Testing get_item after update");
    let expected = Item::new()
        .set_string(PRIMARY_KEY, "001")
        .set_string("Attribute1", "UpdatedValue")
        .set_string("Attribute2", "Value2");
    assert_eq!(client.get_item(&table, "001").await?, Some(expected));

    info!("Testing delete_item");
    let receipt = client.delete_item(&table, "001").await?;
    assert!(receipt.deleted.is_some());

    info!("Testing get_item after delete");
    assert_eq!(client.get_item(&table, "001").await?, None);
    Ok(())
}

#[tokio::test]
async fn test_put_overwrites_whole_item() -> Result<()> {
    let store = MemoryStore::new();
    let table = setup_test_table(&store).await?;
    let client = TableClient::new(store);

    let first = client.put_item(&table, order("002")).await?;
    assert_eq!(first.replaced, None);

    let replacement = Item::new()
        .set_string(PRIMARY_KEY, "002")
        .set_number("Quantity", 3.0)
        .set_binary("Blob", vec![1_u8, 2, 3]);
    let second = client.put_item(&table, replacement.clone()).await?;
    assert_eq!(second.replaced, Some(order("002")));

    let read = client.get_item(&table, "002").await?.expect("item present");
    assert_eq!(read, replacement);
    assert_eq!(read.get_number("Quantity"), Some(3.0));
    assert_eq!(read.get_string("Attribute1"), None);
    Ok(())
}

#[tokio::test]
async fn test_update_missing_item_creates_it() -> Result<()> {
    let store = MemoryStore::new();
    let table = setup_test_table(&store).await?;
    let client = TableClient::new(store);

    client
        .update_item(&table, "003", "Status", AttributeValue::S("new".to_string()))
        .await?;

    let expected = Item::new()
        .set_string(PRIMARY_KEY, "003")
        .set_string("Status", "new");
    assert_eq!(client.get_item(&table, "003").await?, Some(expected));
    Ok(())
}

#[tokio::test]
async fn test_update_rejects_key_attribute() -> Result<()> {
    let store = MemoryStore::new();
    let table = setup_test_table(&store).await?;
    let client = TableClient::new(store.clone());

    let err = client
        .update_item(&table, "001", PRIMARY_KEY, AttributeValue::S("002".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, TableError::InvalidUpdate(_)));
    assert!(!store.requests().await.contains(&Operation::UpdateItem));
    Ok(())
}

#[tokio::test]
async fn test_delete_missing_key_succeeds() -> Result<()> {
    let store = MemoryStore::new();
    let table = setup_test_table(&store).await?;
    let client = TableClient::new(store);

    let receipt = client.delete_item(&table, "does-not-exist").await?;
    assert_eq!(receipt.deleted, None);
    Ok(())
}

#[tokio::test]
async fn test_key_validation_happens_before_the_request() -> Result<()> {
    let store = MemoryStore::new();
    let table = setup_test_table(&store).await?;
    let client = TableClient::new(store.clone());

    let missing_key = Item::new().set_string("Attribute1", "Value1");
    let err = client.put_item(&table, missing_key).await.unwrap_err();
    assert!(matches!(err, TableError::InvalidKey { .. }));
    assert_eq!(err.kind(), ErrorKind::Permanent);

    let wrong_type = Item::new().set_number(PRIMARY_KEY, 1.0);
    assert!(client.put_item(&table, wrong_type).await.is_err());

    let err = client.get_item(&table, 1_i64).await.unwrap_err();
    assert!(matches!(err, TableError::InvalidKey { .. }));

    let requests = store.requests().await;
    assert!(!requests.contains(&Operation::PutItem));
    assert!(!requests.contains(&Operation::GetItem));
    Ok(())
}

#[tokio::test]
async fn test_number_and_binary_keys() -> Result<()> {
    let store = MemoryStore::new();
    let client = TableClient::new(store);

    let numbers = client
        .create_table(
            &TableDefinition::keyed("numbers", "id", KeyType::Number),
            fast_wait(),
        )
        .await?;
    client
        .put_item(&numbers, Item::new().set_number("id", 7.0).set_string("a", "b"))
        .await?;
    assert!(client.get_item(&numbers, 7.0).await?.is_some());

    let blobs = client
        .create_table(
            &TableDefinition::keyed("blobs", "id", KeyType::Binary),
            fast_wait(),
        )
        .await?;
    client
        .put_item(&blobs, Item::new().set_binary("id", b"k1".to_vec()))
        .await?;
    assert!(client.get_item(&blobs, b"k1".to_vec()).await?.is_some());
    assert!(client.get_item(&blobs, b"k2".to_vec()).await?.is_none());
    Ok(())
}

#[tokio::test]
#[instrument]
async fn test_number_keys_match_by_value() -> Result<()> {
    let store = MemoryStore::new();
    let client = TableClient::new(store.clone());
    let numbers = client
        .create_table(
            &TableDefinition::keyed("numbers", "id", KeyType::Number),
            fast_wait(),
        )
        .await?;

    info!("Testing lookup of an item written with a trailing zero");
    let written = Item::new()
        .set("id", AttributeValue::N("7.0".to_string()))
        .set_string("a", "first");
    client.put_item(&numbers, written.clone()).await?;
    assert_eq!(client.get_item(&numbers, 7_i64).await?, Some(written));

    info!("Testing overwrite through a differently spelled key");
    let receipt = client
        .put_item(
            &numbers,
            Item::new()
                .set("id", AttributeValue::N("0.7E1".to_string()))
                .set_string("a", "second"),
        )
        .await?;
    assert!(receipt.replaced.is_some());
    assert_eq!(store.item_count("numbers").await, Some(1));

    assert!(client.delete_item(&numbers, 7.0).await?.deleted.is_some());
    assert_eq!(store.item_count("numbers").await, Some(0));
    Ok(())
}

#[tokio::test]
async fn test_service_errors_are_classified() -> Result<()> {
    let store = MemoryStore::new();
    let table = setup_test_table(&store).await?;
    let client = TableClient::new(store.clone());

    store
        .fail_next(Operation::PutItem, "ProvisionedThroughputExceededException")
        .await;
    let err = client.put_item(&table, order("001")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transient);

    store.fail_next(Operation::GetItem, "MysteryException").await;
    let err = client.get_item(&table, "001").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);

    // Injected failures fire once; the client stays usable.
    client.put_item(&table, order("001")).await?;
    assert!(client.get_item(&table, "001").await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_operations_on_missing_table_are_not_found() {
    let client = TableClient::new(MemoryStore::new());
    let table = orders_definition().handle();

    let err = client.get_item(&table, "001").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = client.delete_item(&table, "001").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// --- Lifecycle ---

#[tokio::test]
async fn test_lifecycle_runs_every_step() {
    let store = MemoryStore::new();
    let client = TableClient::new(store.clone());

    let report = lifecycle::run(&client, &orders_definition(), fast_wait(), false).await;

    let steps: Vec<Step> = report.steps.iter().map(|r| r.step).collect();
    assert_eq!(
        steps,
        vec![
            Step::CreateTable,
            Step::PutItem,
            Step::GetItem,
            Step::UpdateItem,
            Step::DeleteItem
        ]
    );
    assert_eq!(report.failures(), 0);
    assert_eq!(store.item_count(TEST_TABLE_NAME).await, Some(0));
}

#[tokio::test]
async fn test_lifecycle_isolates_failed_steps() {
    let store = MemoryStore::new();
    store
        .fail_next(Operation::PutItem, "InternalServerError")
        .await;
    let client = TableClient::new(store);

    let report = lifecycle::run(&client, &orders_definition(), fast_wait(), false).await;

    assert_eq!(report.failures(), 1);
    assert_eq!(report.failed_steps(), vec![Step::PutItem]);
    match report.outcome(Step::PutItem) {
        Some(Outcome::Failed(e)) => assert_eq!(e.kind(), ErrorKind::Transient),
        other => panic!("expected put to fail, got {other:?}"),
    }
    match report.outcome(Step::GetItem) {
        Some(Outcome::Succeeded(detail)) => assert_eq!(detail, "Item not found"),
        other => panic!("expected not-found read, got {other:?}"),
    }
    assert!(report.outcome(Step::UpdateItem).is_some_and(Outcome::is_success));
    assert!(report.outcome(Step::DeleteItem).is_some_and(Outcome::is_success));
}

#[tokio::test]
async fn test_lifecycle_cleanup_drops_table() {
    let store = MemoryStore::new();
    let client = TableClient::new(store.clone());

    let report = lifecycle::run(&client, &orders_definition(), fast_wait(), true).await;

    assert!(report.outcome(Step::DropTable).is_some_and(Outcome::is_success));
    assert_eq!(store.item_count(TEST_TABLE_NAME).await, None);
}

#[test]
fn test_order_item_uses_table_key() -> Result<()> {
    let item = lifecycle::order_item(&orders_definition(), &Default::default())?;
    assert_eq!(item, order("001"));

    let numeric = TableDefinition::keyed("t", "id", KeyType::Number);
    let item = lifecycle::order_item(&numeric, &Default::default())?;
    assert_eq!(item.get_number("id"), Some(1.0));

    let decoded: lifecycle::OrderAttributes = item.deserialize()?;
    assert_eq!(decoded, lifecycle::OrderAttributes::default());
    Ok(())
}

// --- Building blocks ---

#[test]
fn test_item_operations() {
    let item = Item::new()
        .set_string("key1", "value1")
        .set_number("key2", 42.0);

    assert_eq!(item.get_string("key1"), Some(&"value1".to_string()));
    assert_eq!(item.get_number("key2"), Some(42.0));
    assert_eq!(item.get_string("non_existent"), None);
    assert_eq!(item.get_number("non_existent"), None);
    assert_eq!(item.len(), 2);
}

#[test]
fn test_key_schema_operations() {
    let schema = KeySchema::new(PRIMARY_KEY, KeyType::String);

    assert!(schema.validate_item(&order("001")).is_ok());
    assert!(schema.validate_item(&Item::new()).is_err());
    assert!(schema
        .validate_item(&Item::new().set_number(PRIMARY_KEY, 1.0))
        .is_err());
    assert!(schema
        .validate_item(&Item::new().set(PRIMARY_KEY, AttributeValue::Bool(true)))
        .is_err());

    let key = schema.key_item(&KeyValue::from("001")).unwrap();
    assert_eq!(key, Item::new().set_string(PRIMARY_KEY, "001"));
    assert!(schema.key_item(&KeyValue::from(1_i64)).is_err());
}

#[test]
fn test_table_definition_operations() {
    let definition = orders_definition();

    assert_eq!(definition.name(), TEST_TABLE_NAME);
    assert_eq!(definition.key().key_type(), KeyType::String);
    assert_eq!(definition.capacity(), Capacity::new(5, 5));
    assert!(definition.validate().is_ok());

    let handle = definition.handle();
    assert_eq!(handle.name(), TEST_TABLE_NAME);
    assert_eq!(handle.key(), definition.key());
}

#[test]
fn test_config_builds_table_definition() {
    let config = Config::try_parse_from([
        "aws-dynamodb-crud",
        "--store",
        "memory",
        "--table-name",
        "Invoices",
        "--key-attribute",
        "InvoiceId",
        "--key-type",
        "number",
        "--read-capacity",
        "7",
        "--write-capacity",
        "3",
        "--wait-timeout-secs",
        "10",
        "--poll-interval-ms",
        "250",
    ])
    .unwrap();

    assert_eq!(config.store, StoreKind::Memory);
    let definition = config.table_definition();
    assert_eq!(definition.name(), "Invoices");
    assert_eq!(definition.key().attribute_name(), "InvoiceId");
    assert_eq!(definition.key().key_type(), KeyType::Number);
    assert_eq!(definition.capacity(), Capacity::new(7, 3));
    assert_eq!(
        config.wait_policy(),
        WaitPolicy {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
        }
    );
    assert_eq!(config.target_display(), "in-memory store");
}

#[test]
fn test_config_rejects_zero_poll_interval() {
    let parsed = Config::try_parse_from(["aws-dynamodb-crud", "--poll-interval-ms", "0"]);
    assert!(parsed.is_err());

    let config = Config::try_parse_from(["aws-dynamodb-crud", "--poll-interval-ms", "1"]).unwrap();
    assert_eq!(config.wait_policy().poll_interval, Duration::from_millis(1));
}

#[tokio::test]
async fn test_poll_until_returns_once_ready() {
    let counter = AtomicUsize::new(0);
    let calls = &counter;
    let result: Result<usize, PollError<()>> = poll_until(
        move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok((n == 3).then_some(n))
        },
        Duration::from_millis(1),
        Duration::from_secs(5),
    )
    .await;

    assert_eq!(result.unwrap(), 3);
}

#[tokio::test]
async fn test_poll_until_stops_on_probe_error() {
    let result: Result<(), PollError<&str>> = poll_until(
        || async { Err("boom") },
        Duration::from_millis(1),
        Duration::from_secs(5),
    )
    .await;

    assert!(matches!(result, Err(PollError::Probe("boom"))));
}

#[tokio::test(start_paused = true)]
async fn test_poll_until_shortens_last_sleep() {
    let started = tokio::time::Instant::now();
    let checks = std::sync::Mutex::new(Vec::new());
    let timeout = Duration::from_secs(5);

    let result: Result<(), PollError<()>> = poll_until(
        || {
            checks.lock().unwrap().push(started.elapsed());
            async { Ok(None) }
        },
        Duration::from_secs(2),
        timeout,
    )
    .await;

    match result {
        Err(PollError::TimedOut { waited, attempts }) => {
            assert_eq!(waited, timeout);
            assert_eq!(attempts, 4);
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert_eq!(started.elapsed(), timeout);
    assert_eq!(
        *checks.lock().unwrap(),
        [0, 2, 4, 5].map(Duration::from_secs).to_vec()
    );
}

// --- Live DynamoDB ---

#[tokio::test]
#[ignore = "requires DynamoDB credentials or DynamoDB Local"]
#[instrument]
async fn test_live_lifecycle() -> Result<()> {
    dotenv::dotenv().ok();

    info!("Loading SDK config from env");
    let sdk_config = aws_config::load_from_env().await;
    let client = TableClient::new(DynamoDb::new(&sdk_config));
    let definition = TableDefinition::keyed("test-orders", PRIMARY_KEY, KeyType::String);

    let report = lifecycle::run(&client, &definition, WaitPolicy::default(), true).await;
    assert_eq!(report.failures(), 0, "{report:?}");
    Ok(())
}
