//! Error types and result types for accessor operations.
//!
//! Every error is surfaced to the caller as soon as it occurs. Nothing here retries.

use thiserror::Error;

/// Represents all possible errors that can occur when accessing a collection.
#[derive(Error, Debug)]
pub enum AccessorError {
    /// The driver failed to execute a query or command (network, auth, malformed filter).
    #[error("Query error: {0}")]
    Query(String),
    /// A returned document could not be mapped into the target entity type.
    #[error("Decode error: {0}")]
    Decode(String),
    /// An entity could not be serialized into a document.
    #[error("Encode error: {0}")]
    Encode(String),
    /// A single-document read matched nothing.
    #[error("No document found in collection {collection}")]
    NotFound {
        /// The collection that was searched.
        collection: String,
    },
    /// A delete targeting exactly one document matched none.
    #[error("expected an entity to be deleted, but none were (collection {collection})")]
    NoMatch {
        /// The collection the delete ran against.
        collection: String,
    },
    /// The identifier reported for an inserted document was not an object id.
    #[error("could not get object id from inserted id, result: {0}")]
    IdentifierType(String),
    /// The underlying write failed.
    #[error("Insert error: {0}")]
    Insert(String),
    /// Error during driver initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
}

/// A specialized `Result` type for accessor operations.
pub type AccessorResult<T> = Result<T, AccessorError>;

impl AccessorError {
    /// Returns `true` for the "matched nothing" conditions ([`NotFound`](Self::NotFound)
    /// and [`NoMatch`](Self::NoMatch)) as opposed to driver or codec failures.
    pub fn is_missing(&self) -> bool {
        matches!(self, AccessorError::NotFound { .. } | AccessorError::NoMatch { .. })
    }
}
