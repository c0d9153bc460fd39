//! Error types and result types for document store operations.
//!
//! Use [`DocumentStoreResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during store initialization, configuration or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A document with the given `_id` already exists in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Duplicate key {0} in collection {1}")]
    DuplicateKey(String, String),
    /// A filter, update or request is malformed (unknown operator, type mismatch, empty batch).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    /// A required resource is absent, such as a fixture file or an unreachable engine.
    ///
    /// Queries never raise this; an empty result is not an error.
    #[error("Not found: {0}")]
    NotFound(String),
    /// A value that must be a document is not one.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl DocumentStoreError {
    /// Shorthand for building an [`DocumentStoreError::InvalidOperation`].
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        DocumentStoreError::InvalidOperation(message.into())
    }
}
