//! In-memory driver implementation.
//!
//! Collections are kept as insertion-ordered lists of BSON documents behind an async-aware
//! read-write lock, so natural order is insertion order.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use mea::rwlock::RwLock;
use tracing::{debug, trace};

use sizable_core::{
    driver::{
        DocumentCursor, DriverBuilder, FindOptions, ReplaceOptions, ReturnDocument, StoreDriver,
        UpdateOutcome,
    },
    entity::ID_FIELD,
    error::{AccessorError, AccessorResult},
    filter::Filter,
};

use crate::evaluator::{DocumentEvaluator, compare_documents};

type CollectionList = Vec<Document>;
type StoreMap = HashMap<String, CollectionList>;


/// Thread-safe in-memory driver.
///
/// `InMemoryDriver` is cloneable; clones share the same underlying collections, so it can
/// be handed to many tasks.
///
/// Identifiers are assigned with [`ObjectId::new`] when an inserted document has none.
///
/// # Example
///
/// ```ignore
/// use sizable::{store::Store, memory::InMemoryDriver};
///
/// let store = Store::new(InMemoryDriver::new());
/// let things = store.accessor::<Thing>();
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryDriver {
    /// collection_name -> documents in insertion order
    store: Arc<RwLock<StoreMap>>,
    /// Number of cursors handed out and not yet released
    open_cursors: Arc<AtomicUsize>,
}

impl InMemoryDriver {
    /// Creates a new driver with no collections.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a builder for constructing an `InMemoryDriver`.
    pub fn builder() -> InMemoryDriverBuilder {
        InMemoryDriverBuilder
    }

    /// Number of cursors opened by this driver that have not been released yet.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Stores a raw document as-is, bypassing entity encoding.
    ///
    /// Assigns an identifier when the document has none and returns it.
    pub async fn insert_raw(&self, collection: &str, document: Document) -> AccessorResult<Bson> {
        self.insert_one(collection, document).await
    }

    fn snapshot(documents: Option<&CollectionList>, filter: &Filter) -> AccessorResult<Vec<Document>> {
        let mut matched = Vec::new();

        for document in documents.into_iter().flatten() {
            if DocumentEvaluator::matches(document, filter)? {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }

    fn position(documents: &CollectionList, filter: &Filter) -> AccessorResult<Option<usize>> {
        for (index, document) in documents.iter().enumerate() {
            if DocumentEvaluator::matches(document, filter)? {
                return Ok(Some(index));
            }
        }

        Ok(None)
    }

    /// Places the `_id` on a document about to be inserted: the document's own, else an
    /// equality clause on `_id` in the filter, else a fresh one.
    fn identify(mut document: Document, filter: Option<&Filter>) -> (Bson, Document) {
        let id = match document.get(ID_FIELD) {
            Some(id) => id.clone(),
            None => filter
                .and_then(|filter| filter.equality_on(ID_FIELD))
                .cloned()
                .unwrap_or_else(|| Bson::ObjectId(ObjectId::new())),
        };

        if !document.contains_key(ID_FIELD) {
            let mut identified = Document::new();
            identified.insert(ID_FIELD, id.clone());
            for (key, value) in document {
                identified.insert(key, value);
            }
            document = identified;
        }

        (id, document)
    }

    /// Builds the replacement for `existing`, keeping its identifier.
    fn replacement(existing: &Document, mut document: Document) -> AccessorResult<Document> {
        let id = existing.get(ID_FIELD).cloned().unwrap_or(Bson::Null);

        match document.remove(ID_FIELD) {
            Some(new_id) if new_id != id => Err(AccessorError::Query(format!(
                "the (immutable) field '{ID_FIELD}' was found to have been altered to {new_id}"
            ))),
            _ => {
                let mut replaced = Document::new();
                replaced.insert(ID_FIELD, id);
                for (key, value) in document {
                    replaced.insert(key, value);
                }
                Ok(replaced)
            }
        }
    }

    /// Rejects `id` when a document in `collection` already carries it.
    fn ensure_unique(documents: &CollectionList, id: &Bson, collection: &str) -> AccessorResult<()> {
        if documents.iter().any(|document| document.get(ID_FIELD) == Some(id)) {
            return Err(AccessorError::Insert(format!(
                "duplicate key {id} in collection {collection}"
            )));
        }

        Ok(())
    }
}


/// Cursor over a snapshot of matching documents.
///
/// Counts itself in the driver's open-cursor gauge until dropped.
#[derive(Debug)]
pub struct InMemoryCursor {
    documents: std::vec::IntoIter<Document>,
    current: Option<Document>,
    open_cursors: Arc<AtomicUsize>,
}

impl InMemoryCursor {
    fn new(documents: Vec<Document>, open_cursors: Arc<AtomicUsize>) -> Self {
        open_cursors.fetch_add(1, Ordering::SeqCst);

        Self {
            documents: documents.into_iter(),
            current: None,
            open_cursors,
        }
    }
}

impl Drop for InMemoryCursor {
    fn drop(&mut self) {
        self.open_cursors.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentCursor for InMemoryCursor {
    async fn advance(&mut self) -> AccessorResult<bool> {
        self.current = self.documents.next();

        Ok(self.current.is_some())
    }

    fn current(&self) -> AccessorResult<Document> {
        self.current
            .clone()
            .ok_or_else(|| AccessorError::Query("cursor is not positioned on a document".to_string()))
    }
}


#[async_trait]
impl StoreDriver for InMemoryDriver {
    type Cursor = InMemoryCursor;

    async fn find(&self, collection: &str, filter: &Filter, options: FindOptions) -> AccessorResult<Self::Cursor> {
        let store = self.store.read().await;
        let mut matched = Self::snapshot(store.get(collection), filter)?;

        if let Some(sort) = &options.sort {
            // Stable, so ties keep insertion order.
            matched.sort_by(|a, b| compare_documents(a, b, sort));
        }

        trace!(collection, matched = matched.len(), "opened cursor");

        Ok(InMemoryCursor::new(matched, self.open_cursors.clone()))
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> AccessorResult<Option<Document>> {
        let store = self.store.read().await;

        Ok(match store.get(collection) {
            Some(documents) => Self::position(documents, filter)?.map(|index| documents[index].clone()),
            None => None,
        })
    }

    async fn insert_one(&self, collection: &str, document: Document) -> AccessorResult<Bson> {
        let mut store = self.store.write().await;
        let documents = store.entry(collection.to_string()).or_default();
        let (id, document) = Self::identify(document, None);

        Self::ensure_unique(documents, &id, collection)?;
        documents.push(document);

        Ok(id)
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
        upsert: bool,
    ) -> AccessorResult<UpdateOutcome> {
        let mut store = self.store.write().await;

        if let Some(documents) = store.get_mut(collection) {
            if let Some(index) = Self::position(documents, filter)? {
                let replaced = Self::replacement(&documents[index], document)?;
                let modified = replaced != documents[index];
                documents[index] = replaced;

                return Ok(UpdateOutcome {
                    matched_count: 1,
                    modified_count: modified as u64,
                    upserted_id: None,
                });
            }
        }

        if !upsert {
            return Ok(UpdateOutcome::default());
        }

        let documents = store.entry(collection.to_string()).or_default();
        let (id, document) = Self::identify(document, Some(filter));

        Self::ensure_unique(documents, &id, collection)?;
        documents.push(document);

        Ok(UpdateOutcome {
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id),
        })
    }

    async fn find_one_and_replace(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
        options: ReplaceOptions,
    ) -> AccessorResult<Option<Document>> {
        let mut store = self.store.write().await;

        if let Some(documents) = store.get_mut(collection) {
            if let Some(index) = Self::position(documents, filter)? {
                let replaced = Self::replacement(&documents[index], document)?;
                let before = std::mem::replace(&mut documents[index], replaced);

                return Ok(Some(match options.return_document {
                    ReturnDocument::Before => before,
                    ReturnDocument::After => documents[index].clone(),
                }));
            }
        }

        if !options.upsert {
            return Ok(None);
        }

        let documents = store.entry(collection.to_string()).or_default();
        let (id, document) = Self::identify(document, Some(filter));

        Self::ensure_unique(documents, &id, collection)?;
        documents.push(document.clone());

        Ok(match options.return_document {
            ReturnDocument::Before => None,
            ReturnDocument::After => Some(document),
        })
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> AccessorResult<u64> {
        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(0);
        };

        match Self::position(documents, filter)? {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> AccessorResult<u64> {
        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(0);
        };

        let mut keep = Vec::with_capacity(documents.len());
        for document in documents.iter() {
            keep.push(!DocumentEvaluator::matches(document, filter)?);
        }

        let before = documents.len();
        let mut keep = keep.into_iter();
        documents.retain(|_| keep.next().unwrap_or(true));
        let deleted = before - documents.len();

        Ok(deleted as u64)
    }

    async fn drop_collection(&self, collection: &str) -> AccessorResult<()> {
        debug!(collection, "dropping in-memory collection");

        self.store.write().await.remove(collection);

        Ok(())
    }

    async fn list_collections(&self) -> AccessorResult<Vec<String>> {
        Ok(
            self.store
                .read()
                .await
                .keys()
                .cloned()
                .collect()
        )
    }
}


/// Builder for constructing [`InMemoryDriver`] instances.
///
/// # Example
///
/// ```ignore
/// use sizable::{driver::DriverBuilder, memory::InMemoryDriver};
///
/// let driver = InMemoryDriver::builder().build().await?;
/// ```
#[derive(Default)]
pub struct InMemoryDriverBuilder;

#[async_trait]
impl DriverBuilder for InMemoryDriverBuilder {
    type Driver = InMemoryDriver;

    async fn build(self) -> AccessorResult<Self::Driver> {
        Ok(InMemoryDriver::new())
    }
}
