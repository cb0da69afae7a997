use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

/// Represents a DynamoDB item with various attribute types.
///
/// In DynamoDB, an item is a collection of attributes, each with a name and a value.
/// Apart from the primary key attribute, items in a table are schemaless: any item
/// may carry any set of attributes.
///
/// # Example
///
/// ```ignore
/// let item = Item::new()
///     .set_string("PrimaryKey", "001")
///     .set_string("Attribute1", "Value1")
///     .set_number("Quantity", 3.0);
/// ```
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Item {
    pub(crate) attributes: HashMap<String, AttributeValue>,
}

impl Item {
    /// Creates a new empty `Item`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a serializable record into an item.
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, serde_dynamo::Error> {
        let attributes: HashMap<String, AttributeValue> = serde_dynamo::to_item(value)?;
        Ok(Self { attributes })
    }

    /// Converts the item back into a typed record.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_dynamo::Error> {
        serde_dynamo::from_item(self.attributes.clone())
    }

    /// Sets an attribute to an arbitrary value.
    pub fn set(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Sets a string attribute.
    #[allow(dead_code)]
    pub fn set_string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, AttributeValue::S(value.into()))
    }

    /// Sets a number attribute.
    ///
    /// DynamoDB stores numbers as decimal strings with high precision.
    #[allow(dead_code)]
    pub fn set_number(self, key: impl Into<String>, value: impl Into<f64>) -> Self {
        self.set(key, AttributeValue::N(value.into().to_string()))
    }

    /// Sets a binary attribute.
    #[allow(dead_code)]
    pub fn set_binary(self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.set(key, AttributeValue::B(Blob::new(value.into())))
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Gets the value of an attribute as a string.
    ///
    /// Returns `None` if the attribute doesn't exist or is not a string.
    #[allow(dead_code)]
    pub fn get_string(&self, key: &str) -> Option<&String> {
        self.attributes.get(key).and_then(|av| av.as_s().ok())
    }

    /// Gets the value of an attribute as a number (f64).
    ///
    /// Returns `None` if the attribute doesn't exist, is not a number, or can't be parsed as f64.
    #[allow(dead_code)]
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.attributes
            .get(key)
            .and_then(|av| av.as_n().ok())
            .and_then(|n| n.parse().ok())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn attributes(&self) -> &HashMap<String, AttributeValue> {
        &self.attributes
    }
}

impl From<HashMap<String, AttributeValue>> for Item {
    fn from(attributes: HashMap<String, AttributeValue>) -> Self {
        Self { attributes }
    }
}
