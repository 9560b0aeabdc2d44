//! Error types and result types for model persistence operations.
//!
//! Absence is reported two ways on purpose: lookups return `Ok(None)` when nothing
//! matches, while mutations that assume an existing document (`update`, `delete`)
//! fail with [`MongOrmError::DocumentNotFound`].

use bson::{Document, error::Error as BsonError};
use serde_json::Error as SerdeJsonError;
use std::error::Error as StdError;
use thiserror::Error;

/// Boxed error produced by a storage backend or its driver.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Represents all possible errors raised by the mapping layer.
#[derive(Error, Debug)]
pub enum MongOrmError {
    /// A mutation targeted zero documents.
    #[error("Document specified by query {query} was not found in collection '{collection}'")]
    DocumentNotFound {
        /// Name of the collection that was searched.
        collection: String,
        /// The filter that matched nothing.
        query: Document,
    },
    /// An insert or upsert violated a unique index.
    #[error("Operation failed due to a duplicate key on collection '{collection}' - {code:?}: {detail:?}")]
    DuplicateDocument {
        /// Name of the collection holding the conflicting document.
        collection: String,
        /// The numeric error code reported by the backend.
        code: Option<i32>,
        /// Structured detail reported by the backend, if any.
        detail: Option<Document>,
    },
    /// The model type was used before a configuration was registered for it,
    /// or its configuration has no collection name.
    #[error("Model {model} is missing a client configuration")]
    MissingConfiguration {
        /// Rust type name of the offending model.
        model: &'static str,
    },
    /// An identifier was built from a value that is neither a string nor an ObjectId.
    #[error("Expected str or ObjectId, got '{found}'")]
    TypeMismatch {
        /// Description of the BSON type that was supplied.
        found: String,
    },
    /// A string could not be parsed as a 24 character hex ObjectId.
    #[error("Invalid ObjectId: {0}")]
    InvalidId(String),
    /// A required argument combination was violated.
    #[error("Usage error: {0}")]
    Usage(String),
    /// A query document uses an operator or shape the backend cannot evaluate.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// Serialization/deserialization error when converting between BSON, JSON and models.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// An error raised by the underlying driver, passed through untouched.
    #[error(transparent)]
    Backend(BoxError),
}

impl MongOrmError {
    /// Wraps a driver error without altering it.
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        MongOrmError::Backend(err.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MongOrmError::DocumentNotFound { .. })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, MongOrmError::DuplicateDocument { .. })
    }
}

/// A specialized `Result` type for mapping layer operations.
pub type MongOrmResult<T> = Result<T, MongOrmError>;

impl From<BsonError> for MongOrmError {
    fn from(err: BsonError) -> Self {
        MongOrmError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for MongOrmError {
    fn from(err: SerdeJsonError) -> Self {
        MongOrmError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn not_found_message_names_collection_and_query() {
        let err = MongOrmError::DocumentNotFound {
            collection: "widgets".to_string(),
            query: doc! { "name": "a" },
        };

        assert!(err.is_not_found());
        assert!(!err.is_duplicate());
        let message = err.to_string();
        assert!(message.contains("'widgets'"));
        assert!(message.contains("name"));
    }

    #[test]
    fn backend_error_is_transparent() {
        let source = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = MongOrmError::backend(source);

        assert_eq!(err.to_string(), "connection refused");
        assert!(matches!(err, MongOrmError::Backend(_)));
    }
}
