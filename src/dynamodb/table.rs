use std::time::Duration;

use crate::dynamodb::{KeySchema, KeyType, Result, TableError};

/// Provisioned read/write throughput for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub read_units: u32,
    pub write_units: u32,
}

impl Capacity {
    pub fn new(read_units: u32, write_units: u32) -> Self {
        Self {
            read_units,
            write_units,
        }
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self::new(5, 5)
    }
}

/// DynamoDB table configuration.
///
/// A table is identified by its name within an account and region and has a
/// single partition key. There is no sort key and no secondary index.
///
/// # Table Capacity
///
/// Tables are created in provisioned mode: the read and write units are fixed
/// at creation time and must both be positive.
///
/// # Example
///
/// ```ignore
/// let table = TableDefinition::new("Orders", KeySchema::new("PrimaryKey", KeyType::String))
///     .with_capacity(Capacity::new(5, 5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    name: String,
    key: KeySchema,
    capacity: Capacity,
}

impl TableDefinition {
    /// Creates a new definition with the default capacity.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the DynamoDB table.
    /// * `key` - The partition key attribute and its type.
    pub fn new(name: impl Into<String>, key: KeySchema) -> Self {
        Self {
            name: name.into(),
            key,
            capacity: Capacity::default(),
        }
    }

    /// Shorthand for a table keyed by a single attribute of `key_type`.
    pub fn keyed(
        name: impl Into<String>,
        key_attribute: impl Into<String>,
        key_type: KeyType,
    ) -> Self {
        Self::new(name, KeySchema::new(key_attribute, key_type))
    }

    pub fn with_capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    /// Returns the name of the table.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &KeySchema {
        &self.key
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Rejects definitions the store would refuse anyway.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TableError::InvalidDefinition(
                "table name must not be empty".to_string(),
            ));
        }
        if self.key.attribute_name().trim().is_empty() {
            return Err(TableError::InvalidDefinition(
                "key attribute name must not be empty".to_string(),
            ));
        }
        if self.capacity.read_units == 0 || self.capacity.write_units == 0 {
            return Err(TableError::InvalidDefinition(format!(
                "capacity must be positive, got {} read / {} write units",
                self.capacity.read_units, self.capacity.write_units
            )));
        }
        Ok(())
    }

    /// The handle item operations use once the table exists.
    pub fn handle(&self) -> TableHandle {
        TableHandle {
            name: self.name.clone(),
            key: self.key.clone(),
        }
    }
}

/// A reference to an active table, returned by table creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    name: String,
    key: KeySchema,
}

impl TableHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &KeySchema {
        &self.key
    }
}

/// Table lifecycle states as reported by DescribeTable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Active,
    Updating,
    Deleting,
    Other,
}

/// Bounds for the wait that follows table creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitPolicy {
    /// Rejects a zero poll interval.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(TableError::InvalidWaitPolicy(
                "poll interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
        }
    }
}
