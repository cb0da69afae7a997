//! Error types for table operations.
//!
//! Every failure carries an [`ErrorKind`] derived from the store's error code so
//! callers can decide for themselves whether an operation is worth retrying.

use std::fmt;
use std::time::Duration;

use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Result type alias for the dynamodb module.
pub type Result<T> = std::result::Result<T, TableError>;

/// Closed classification of store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The table or item addressed does not exist.
    NotFound,
    /// The resource being created already exists.
    AlreadyExists,
    /// Throttling, capacity, service-side or transport trouble. May succeed later.
    Transient,
    /// The request itself is wrong (validation, permissions, conditions).
    Permanent,
    /// Unrecognized code or unparseable response.
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::Transient => "transient",
            ErrorKind::Permanent => "permanent",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// The store operation an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateTable,
    DescribeTable,
    DeleteTable,
    PutItem,
    GetItem,
    UpdateItem,
    DeleteItem,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::CreateTable => "CreateTable",
            Operation::DescribeTable => "DescribeTable",
            Operation::DeleteTable => "DeleteTable",
            Operation::PutItem => "PutItem",
            Operation::GetItem => "GetItem",
            Operation::UpdateItem => "UpdateItem",
            Operation::DeleteItem => "DeleteItem",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during table operations.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("{operation} failed ({kind}, code {}): {message}", .code.as_deref().unwrap_or("none"))]
    Service {
        operation: Operation,
        kind: ErrorKind,
        code: Option<String>,
        message: String,
    },

    #[error("Table '{table_name}' did not become active within {waited:?} ({attempts} checks)")]
    ActivationTimeout {
        table_name: String,
        waited: Duration,
        attempts: usize,
    },

    #[error("Invalid table definition: {0}")]
    InvalidDefinition(String),

    #[error("Invalid key attribute '{attribute}': {reason}")]
    InvalidKey { attribute: String, reason: String },

    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    #[error("Invalid wait policy: {0}")]
    InvalidWaitPolicy(String),

    #[error("Could not convert record: {0}")]
    Encoding(#[from] serde_dynamo::Error),

    #[error("Could not build {operation} request: {message}")]
    Request {
        operation: Operation,
        message: String,
    },
}

impl TableError {
    /// Builds a service error, classifying `code` into an [`ErrorKind`].
    pub fn from_code(operation: Operation, code: &str, message: impl Into<String>) -> Self {
        TableError::Service {
            operation,
            kind: classify_code(code),
            code: Some(code.to_string()),
            message: message.into(),
        }
    }

    /// Maps an AWS SDK error into a classified service error.
    pub(crate) fn from_sdk<E, R>(operation: Operation, err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: fmt::Debug + Send + Sync + 'static,
    {
        let message = err
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

        let (kind, code) = match &err {
            SdkError::ServiceError(_) => match err.code() {
                Some(code) => (classify_code(code), Some(code.to_string())),
                None => (ErrorKind::Unknown, None),
            },
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
                (ErrorKind::Transient, None)
            }
            SdkError::ConstructionFailure(_) => (ErrorKind::Permanent, None),
            _ => (ErrorKind::Unknown, None),
        };

        TableError::Service {
            operation,
            kind,
            code,
            message,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TableError::Service { kind, .. } => *kind,
            TableError::ActivationTimeout { .. } => ErrorKind::Transient,
            TableError::InvalidDefinition(_)
            | TableError::InvalidKey { .. }
            | TableError::InvalidUpdate(_)
            | TableError::InvalidWaitPolicy(_)
            | TableError::Encoding(_)
            | TableError::Request { .. } => ErrorKind::Permanent,
        }
    }

    /// The store's error code, if the failure came from the store.
    #[allow(dead_code)]
    pub fn code(&self) -> Option<&str> {
        match self {
            TableError::Service { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Classifies a DynamoDB error code.
pub fn classify_code(code: &str) -> ErrorKind {
    match code {
        "ResourceNotFoundException" | "TableNotFoundException" => ErrorKind::NotFound,
        "ResourceInUseException" | "TableAlreadyExistsException" => ErrorKind::AlreadyExists,
        "ProvisionedThroughputExceededException"
        | "ThrottlingException"
        | "RequestLimitExceeded"
        | "LimitExceededException"
        | "InternalServerError"
        | "InternalFailure"
        | "ServiceUnavailable"
        | "TransactionConflictException"
        | "TransactionInProgressException" => ErrorKind::Transient,
        "ValidationException"
        | "AccessDeniedException"
        | "ConditionalCheckFailedException"
        | "UnrecognizedClientException"
        | "IncompleteSignature"
        | "MissingAuthenticationToken"
        | "InvalidSignatureException"
        | "ItemCollectionSizeLimitExceededException"
        | "SerializationException" => ErrorKind::Permanent,
        _ => ErrorKind::Unknown,
    }
}
