use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{AttributeValue, ScalarAttributeType};

use crate::dynamodb::{Item, Result, TableError};

/// The scalar type of a table's primary key attribute.
///
/// DynamoDB only allows key attributes of type String, Number or Binary.
/// Every item written to the table must carry a key value of the declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum KeyType {
    /// `S` in the DynamoDB wire format.
    String,
    /// `N` in the DynamoDB wire format.
    Number,
    /// `B` in the DynamoDB wire format.
    Binary,
}

impl KeyType {
    pub fn scalar_type(self) -> ScalarAttributeType {
        match self {
            KeyType::String => ScalarAttributeType::S,
            KeyType::Number => ScalarAttributeType::N,
            KeyType::Binary => ScalarAttributeType::B,
        }
    }

    /// Returns the type of `value` if it is a valid key scalar.
    pub fn of(value: &AttributeValue) -> Option<KeyType> {
        match value {
            AttributeValue::S(_) => Some(KeyType::String),
            AttributeValue::N(_) => Some(KeyType::Number),
            AttributeValue::B(_) => Some(KeyType::Binary),
            _ => None,
        }
    }
}

/// A primary key value.
///
/// Numbers are kept as decimal text in canonical form, so two keys are equal
/// exactly when DynamoDB would treat them as the same number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    String(String),
    Number(String),
    Binary(Vec<u8>),
}

impl KeyValue {
    pub fn key_type(&self) -> KeyType {
        match self {
            KeyValue::String(_) => KeyType::String,
            KeyValue::Number(_) => KeyType::Number,
            KeyValue::Binary(_) => KeyType::Binary,
        }
    }

    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            KeyValue::String(s) => AttributeValue::S(s.clone()),
            KeyValue::Number(n) => AttributeValue::N(n.clone()),
            KeyValue::Binary(b) => AttributeValue::B(Blob::new(b.clone())),
        }
    }

    pub fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::S(s) => Some(KeyValue::String(s.clone())),
            AttributeValue::N(n) => Some(KeyValue::Number(canonical_number(n))),
            AttributeValue::B(b) => Some(KeyValue::Binary(b.as_ref().to_vec())),
            _ => None,
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::String(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::String(value)
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Number(value.to_string())
    }
}

impl From<f64> for KeyValue {
    fn from(value: f64) -> Self {
        KeyValue::Number(canonical_number(&value.to_string()))
    }
}

/// Rewrites a DynamoDB number so that equal values have equal text.
///
/// `"7.0"`, `"07"` and `"0.7E1"` all become `"7"`. Text that is not a decimal
/// number is returned unchanged and left for the store to reject.
fn canonical_number(text: &str) -> String {
    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let (mantissa, exponent) = match unsigned.split_once(|c| c == 'e' || c == 'E') {
        Some((mantissa, exponent)) => match exponent.parse::<i64>() {
            Ok(exponent) if exponent.abs() <= MAX_EXPONENT => (mantissa, exponent),
            _ => return text.to_string(),
        },
        None => (unsigned, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{int_part}{frac_part}");
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return text.to_string();
    }

    let significant = digits.trim_matches('0');
    if significant.is_empty() {
        return "0".to_string();
    }
    // The value is 0.<significant> x 10^point.
    let leading_zeros = digits.len() - digits.trim_start_matches('0').len();
    let point = int_part.len() as i64 - leading_zeros as i64 + exponent;
    let len = significant.len() as i64;

    let magnitude = if point <= 0 {
        format!("0.{}{significant}", "0".repeat(point.unsigned_abs() as usize))
    } else if point >= len {
        format!("{significant}{}", "0".repeat((point - len) as usize))
    } else {
        let (whole, fraction) = significant.split_at(point as usize);
        format!("{whole}.{fraction}")
    };
    if negative {
        format!("-{magnitude}")
    } else {
        magnitude
    }
}

/// Well past DynamoDB's own range of 1E-130 to 9.9E+125.
const MAX_EXPONENT: i64 = 1000;

impl From<Vec<u8>> for KeyValue {
    fn from(value: Vec<u8>) -> Self {
        KeyValue::Binary(value)
    }
}

/// The single-attribute partition key schema of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    attribute_name: String,
    key_type: KeyType,
}

impl KeySchema {
    pub fn new(attribute_name: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            key_type,
        }
    }

    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Builds the key map for `value`, checking it against the declared type.
    pub fn key_item(&self, value: &KeyValue) -> Result<Item> {
        if value.key_type() != self.key_type {
            return Err(self.mismatch(value.key_type()));
        }
        Ok(Item::new().set(self.attribute_name.clone(), value.to_attribute_value()))
    }

    /// Checks that `item` carries the key attribute with the declared type.
    pub fn validate_item(&self, item: &Item) -> Result<()> {
        let value = item.get(&self.attribute_name).ok_or_else(|| TableError::InvalidKey {
            attribute: self.attribute_name.clone(),
            reason: "missing from item".to_string(),
        })?;

        match KeyType::of(value) {
            Some(found) if found == self.key_type => Ok(()),
            Some(found) => Err(self.mismatch(found)),
            None => Err(TableError::InvalidKey {
                attribute: self.attribute_name.clone(),
                reason: format!("expected {:?}, found a non-scalar value", self.key_type),
            }),
        }
    }

    fn mismatch(&self, found: KeyType) -> TableError {
        TableError::InvalidKey {
            attribute: self.attribute_name.clone(),
            reason: format!("expected {:?}, found {:?}", self.key_type, found),
        }
    }
}
