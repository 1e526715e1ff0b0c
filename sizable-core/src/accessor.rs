//! Typed accessor over a single collection.
//!
//! An [`Accessor`] binds an entity type to one collection of a driver and wraps the
//! driver's operations with fixed options (upsert, return-after-update), decoding into the
//! entity type and error mapping. It holds no state of its own, so one accessor can be used
//! from many tasks at once.
//!
//! # Example
//!
//! ```ignore
//! let things = store.accessor::<Thing>();
//!
//! let id = things.insert_one(&thing).await?;
//! let stored = things.get_one(&Filter::by_id(id)).await?;
//! let first_page = things.retrieve_sorted_page(&Sort::new().asc("number"), 6).await?;
//! ```

use bson::{Bson, oid::ObjectId};
use std::marker::PhantomData;
use tracing::debug;

use crate::{
    driver::{FindOptions, ReplaceOptions, ReturnDocument, StoreDriver, UpdateOutcome},
    entity::{Entity, EntityExt},
    error::{AccessorError, AccessorResult},
    filter::{Filter, Sort},
    page::{self, PageWindow},
};

/// Type-safe accessor for the entities of one collection.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the driver reference
/// * `T` - The entity type
/// * `D` - The driver type
#[derive(Debug)]
pub struct Accessor<'a, T: Entity, D: StoreDriver> {
    name: String,
    driver: &'a D,
    _marker: PhantomData<T>,
}

impl<'a, T: Entity, D: StoreDriver> Accessor<'a, T, D> {
    /// Creates an accessor for the collection `name` (internal use, see [`Store`](crate::store::Store)).
    pub(crate) fn new(name: String, driver: &'a D) -> Self {
        Self {
            name,
            driver,
            _marker: PhantomData,
        }
    }

    /// Returns the name of the collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the document matching `filter` with `entity`, inserting it when nothing
    /// matches, and returns the stored document as it is after the operation.
    ///
    /// # Errors
    ///
    /// Returns [`AccessorError::NotFound`] if the driver returns no document,
    /// [`AccessorError::Decode`] if the returned document does not decode, and
    /// [`AccessorError::Insert`] if an inserted document's identifier is already taken.
    pub async fn upsert_returning_after(&self, filter: &Filter, entity: &T) -> AccessorResult<T> {
        debug!(collection = %self.name, "find one and replace (upsert, return after)");

        let options = ReplaceOptions {
            upsert: true,
            return_document: ReturnDocument::After,
        };

        match self
            .driver
            .find_one_and_replace(&self.name, filter, entity.to_document()?, options)
            .await?
        {
            Some(document) => T::from_document(document),
            None => Err(AccessorError::NotFound {
                collection: self.name.clone(),
            }),
        }
    }

    /// Replaces the document matching `filter` with `entity`, inserting it when nothing
    /// matches, and returns only the outcome counts.
    ///
    /// Zero matches is the insert case, not an error. An insert whose identifier is already
    /// taken fails with [`AccessorError::Insert`].
    pub async fn upsert(&self, filter: &Filter, entity: &T) -> AccessorResult<UpdateOutcome> {
        debug!(collection = %self.name, "replace one (upsert)");

        self.driver
            .replace_one(&self.name, filter, entity.to_document()?, true)
            .await
    }

    /// Inserts `entity` as a new document and returns its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AccessorError::Insert`] if the write fails and
    /// [`AccessorError::IdentifierType`] if the reported identifier is not an object id.
    pub async fn insert_one(&self, entity: &T) -> AccessorResult<ObjectId> {
        debug!(collection = %self.name, "insert one");

        match self
            .driver
            .insert_one(&self.name, entity.to_document()?)
            .await?
        {
            Bson::ObjectId(id) => Ok(id),
            other => Err(AccessorError::IdentifierType(other.to_string())),
        }
    }

    /// Returns the single entity matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessorError::NotFound`] if nothing matches and
    /// [`AccessorError::Decode`] if the document does not decode.
    pub async fn get_one(&self, filter: &Filter) -> AccessorResult<T> {
        debug!(collection = %self.name, "find one");

        match self.driver.find_one(&self.name, filter).await? {
            Some(document) => T::from_document(document),
            None => Err(AccessorError::NotFound {
                collection: self.name.clone(),
            }),
        }
    }

    /// Deletes exactly one document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessorError::NoMatch`] if nothing was deleted.
    pub async fn delete_one(&self, filter: &Filter) -> AccessorResult<()> {
        debug!(collection = %self.name, "delete one");

        match self.driver.delete_one(&self.name, filter).await? {
            0 => Err(AccessorError::NoMatch {
                collection: self.name.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Deletes every document matching `filter` and returns how many were deleted.
    ///
    /// Deleting nothing is not an error here.
    pub async fn delete_many(&self, filter: &Filter) -> AccessorResult<u64> {
        debug!(collection = %self.name, "delete many");

        self.driver.delete_many(&self.name, filter).await
    }

    /// Returns every entity matching `filter`.
    pub async fn find(&self, filter: &Filter) -> AccessorResult<Vec<T>> {
        let mut all = Vec::new();
        self.find_into(filter, &mut all).await?;

        Ok(all)
    }

    /// Appends every entity matching `filter` to `all`.
    ///
    /// Existing contents of `all` are kept. On a decode failure the entities decoded so far
    /// stay in `all`.
    pub async fn find_into(&self, filter: &Filter, all: &mut Vec<T>) -> AccessorResult<()> {
        debug!(collection = %self.name, "find");

        let cursor = self
            .driver
            .find(&self.name, filter, FindOptions::default())
            .await?;

        page::drain(cursor, all).await
    }

    /// Returns the entities whose identifiers are in `ids`, in the database's order.
    pub async fn find_by_ids(&self, ids: &[ObjectId]) -> AccessorResult<Vec<T>> {
        self.find(&Filter::by_ids(ids)).await
    }

    /// Appends the entities whose identifiers are in `ids` to `all`.
    pub async fn find_by_ids_into(&self, ids: &[ObjectId], all: &mut Vec<T>) -> AccessorResult<()> {
        self.find_into(&Filter::by_ids(ids), all).await
    }

    /// Returns the first `page_size` entities of the whole collection ordered by `sort`.
    pub async fn retrieve_sorted_page(&self, sort: &Sort, page_size: usize) -> AccessorResult<Vec<T>> {
        self.read_page(&Filter::new(), sort, PageWindow::first(page_size)).await
    }

    /// Returns the entities in `window` of the result set matching `filter` ordered by `sort`.
    ///
    /// A window past the end of the results yields a shorter or empty page.
    pub async fn read_page(&self, filter: &Filter, sort: &Sort, window: PageWindow) -> AccessorResult<Vec<T>> {
        let mut items = Vec::with_capacity(window.size.min(1024));
        self.read_page_into(filter, sort, window, &mut items).await?;

        Ok(items)
    }

    /// Appends the entities in `window` of the result set matching `filter` ordered by
    /// `sort` to `out`.
    ///
    /// On a decode failure the entities decoded so far stay in `out`.
    pub async fn read_page_into(
        &self,
        filter: &Filter,
        sort: &Sort,
        window: PageWindow,
        out: &mut Vec<T>,
    ) -> AccessorResult<()> {
        debug!(
            collection = %self.name,
            size = window.size,
            index = window.index,
            "read page"
        );

        let cursor = self
            .driver
            .find(&self.name, filter, FindOptions::sorted(sort.clone()))
            .await?;

        page::read_page(cursor, window, out).await
    }

    /// Drops the collection and all its documents.
    pub async fn drop_collection(&self) -> AccessorResult<()> {
        debug!(collection = %self.name, "drop collection");

        self.driver.drop_collection(&self.name).await
    }
}
