//! Database driver abstraction consumed by the accessor.
//!
//! This module defines the contract a document database binding implements so that the
//! [`Accessor`](crate::accessor::Accessor) can run against it. The accessor adds defaults
//! (upsert, return-after-update), decoding and error mapping; everything else is the driver's.
//!
//! # Traits
//!
//! - [`StoreDriver`]: collection operations of a database
//! - [`DocumentCursor`]: a single-use iteration handle over query results
//! - [`DriverBuilder`]: factory trait for creating driver instances
//!
//! # Cursor release
//!
//! Cursors are owned values. Dropping a cursor releases it, so any code path that consumes
//! the cursor by value (including early `?` returns) releases it on exit.

use async_trait::async_trait;
use bson::{Bson, Document};
use std::fmt::Debug;

use crate::{
    error::AccessorResult,
    filter::{Filter, Sort},
};

/// Options applied to a `find` call.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Sort applied to the result set. `None` keeps natural order.
    pub sort: Option<Sort>,
}

impl FindOptions {
    pub fn sorted(sort: Sort) -> Self {
        Self { sort: Some(sort) }
    }
}

/// Which version of a document `find_one_and_replace` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnDocument {
    /// The document as it was before the replacement.
    #[default]
    Before,
    /// The document as it is after the replacement (or insertion).
    After,
}

/// Options applied to a `find_one_and_replace` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceOptions {
    /// Insert the replacement when nothing matches.
    pub upsert: bool,
    /// Which version of the document to return.
    pub return_document: ReturnDocument,
}

/// Summary of a replace operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateOutcome {
    /// Number of documents matched by the filter.
    pub matched_count: u64,
    /// Number of documents actually modified.
    pub modified_count: u64,
    /// Identifier of the inserted document when the operation upserted.
    pub upserted_id: Option<Bson>,
}

/// Single-use, stateful iteration handle over a query's matching documents.
///
/// A cursor is positioned before the first document. [`advance`](Self::advance) moves it
/// to the next document and reports whether one exists; [`current`](Self::current) reads
/// the document at the current position. Once `advance` returns `false` the cursor is
/// exhausted and must not be read again.
#[async_trait]
pub trait DocumentCursor: Send {
    /// Moves to the next document, returning `false` once the results are exhausted.
    async fn advance(&mut self) -> AccessorResult<bool>;

    /// Returns the document at the current position.
    ///
    /// Only valid after [`advance`](Self::advance) returned `true`.
    fn current(&self) -> AccessorResult<Document>;

    /// Releases the cursor. Equivalent to dropping it.
    async fn close(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}

/// Abstract interface for document database drivers.
///
/// Every method names the collection it operates on. Implementations must be thread-safe
/// (`Send + Sync`) so that independent accessor calls can run concurrently against the
/// same collection; consistency between them is the database's concern.
///
/// All methods are async. Dropping a returned future cancels the operation.
#[async_trait]
pub trait StoreDriver: Send + Sync + Debug {
    /// Cursor type returned by [`find`](Self::find).
    type Cursor: DocumentCursor;

    /// Opens a cursor over all documents in `collection` matching `filter`.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> AccessorResult<Self::Cursor>;

    /// Returns the first document matching `filter`, or `None`.
    async fn find_one(&self, collection: &str, filter: &Filter) -> AccessorResult<Option<Document>>;

    /// Inserts a document, returning the identifier the database reports for it.
    async fn insert_one(&self, collection: &str, document: Document) -> AccessorResult<Bson>;

    /// Replaces the body of the first document matching `filter`.
    ///
    /// With `upsert`, inserts `document` when nothing matches.
    async fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
        upsert: bool,
    ) -> AccessorResult<UpdateOutcome>;

    /// Atomically finds and replaces one document, returning the version selected by
    /// `options.return_document`.
    async fn find_one_and_replace(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
        options: ReplaceOptions,
    ) -> AccessorResult<Option<Document>>;

    /// Deletes at most one matching document, returning the number deleted.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> AccessorResult<u64>;

    /// Deletes every matching document, returning the number deleted.
    async fn delete_many(&self, collection: &str, filter: &Filter) -> AccessorResult<u64>;

    /// Drops a collection and all its documents. Dropping a missing collection succeeds.
    async fn drop_collection(&self, collection: &str) -> AccessorResult<()>;

    /// Lists the names of all collections.
    async fn list_collections(&self) -> AccessorResult<Vec<String>>;

    /// Releases the driver's resources (connections, pools).
    async fn shutdown(self) -> AccessorResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory trait for constructing driver instances.
#[async_trait]
pub trait DriverBuilder {
    /// The driver type this builder produces.
    type Driver: StoreDriver;

    /// Builds and initializes the driver.
    ///
    /// # Errors
    ///
    /// Returns [`AccessorError::Initialization`](crate::error::AccessorError::Initialization)
    /// if configuration or connection setup fails.
    async fn build(self) -> AccessorResult<Self::Driver>;
}
