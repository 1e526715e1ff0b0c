//! MongoDB implementation of the driver contract.

use async_trait::async_trait;
use bson::{Bson, Document};
use mongodb::{
    Client, Collection as MongoCollection, Cursor,
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, ReturnDocument as MongoReturnDocument},
};
use std::time::Duration;
use tracing::debug;

use sizable_core::{
    driver::{
        DocumentCursor, DriverBuilder, FindOptions, ReplaceOptions, ReturnDocument, StoreDriver,
        UpdateOutcome,
    },
    error::{AccessorError, AccessorResult},
    filter::Filter,
};

use crate::filter::{MongoFilterTranslator, sort_document};


/// Driver over one MongoDB database.
///
/// The underlying [`Client`] is a connection pool and is cheap to clone.
#[derive(Debug, Clone)]
pub struct MongoDbDriver {
    client: Client,
    database: String,
}

impl MongoDbDriver {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbDriverBuilder {
        MongoDbDriverBuilder::new(dsn, database)
    }

    /// The name of the database this driver works in.
    pub fn database(&self) -> &str {
        &self.database
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }
}

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

fn query_error(err: mongodb::error::Error) -> AccessorError {
    AccessorError::Query(err.to_string())
}

/// Maps errors of operations that may insert: unique index violations become
/// [`AccessorError::Insert`], everything else a query error.
fn write_error(err: mongodb::error::Error) -> AccessorError {
    let duplicate = match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY,
        ErrorKind::Command(command) => command.code == DUPLICATE_KEY,
        _ => false,
    };

    if duplicate {
        AccessorError::Insert(err.to_string())
    } else {
        query_error(err)
    }
}


/// Server-side cursor over a query's results.
///
/// Dropping it kills the cursor on the server.
pub struct MongoDbCursor {
    cursor: Cursor<Document>,
}

#[async_trait]
impl DocumentCursor for MongoDbCursor {
    async fn advance(&mut self) -> AccessorResult<bool> {
        self.cursor.advance().await.map_err(query_error)
    }

    fn current(&self) -> AccessorResult<Document> {
        self.cursor
            .deserialize_current()
            .map_err(|e| AccessorError::Decode(e.to_string()))
    }
}


#[async_trait]
impl StoreDriver for MongoDbDriver {
    type Cursor = MongoDbCursor;

    async fn find(&self, collection: &str, filter: &Filter, options: FindOptions) -> AccessorResult<Self::Cursor> {
        let query = MongoFilterTranslator::translate(filter)?;
        let mongo_collection = self.get_collection(collection);
        let find = mongo_collection.find(query);

        let cursor = match &options.sort {
            Some(sort) if !sort.is_empty() => find.sort(sort_document(sort)).await,
            _ => find.await,
        }
        .map_err(query_error)?;

        Ok(MongoDbCursor { cursor })
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> AccessorResult<Option<Document>> {
        self.get_collection(collection)
            .find_one(MongoFilterTranslator::translate(filter)?)
            .await
            .map_err(query_error)
    }

    async fn insert_one(&self, collection: &str, document: Document) -> AccessorResult<Bson> {
        Ok(
            self.get_collection(collection)
                .insert_one(document)
                .await
                .map_err(|e| AccessorError::Insert(e.to_string()))?
                .inserted_id
        )
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
        upsert: bool,
    ) -> AccessorResult<UpdateOutcome> {
        let result = self
            .get_collection(collection)
            .replace_one(MongoFilterTranslator::translate(filter)?, document)
            .upsert(upsert)
            .await
            .map_err(write_error)?;

        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn find_one_and_replace(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
        options: ReplaceOptions,
    ) -> AccessorResult<Option<Document>> {
        self.get_collection(collection)
            .find_one_and_replace(MongoFilterTranslator::translate(filter)?, document)
            .upsert(options.upsert)
            .return_document(match options.return_document {
                ReturnDocument::Before => MongoReturnDocument::Before,
                ReturnDocument::After => MongoReturnDocument::After,
            })
            .await
            .map_err(write_error)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> AccessorResult<u64> {
        Ok(
            self.get_collection(collection)
                .delete_one(MongoFilterTranslator::translate(filter)?)
                .await
                .map_err(query_error)?
                .deleted_count
        )
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> AccessorResult<u64> {
        Ok(
            self.get_collection(collection)
                .delete_many(MongoFilterTranslator::translate(filter)?)
                .await
                .map_err(query_error)?
                .deleted_count
        )
    }

    async fn drop_collection(&self, collection: &str) -> AccessorResult<()> {
        debug!(database = %self.database, collection, "dropping collection");

        self.get_collection(collection)
            .drop()
            .await
            .map_err(query_error)
    }

    async fn list_collections(&self) -> AccessorResult<Vec<String>> {
        self.client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(query_error)
    }

    async fn shutdown(self) -> AccessorResult<()> {
        debug!(database = %self.database, "shutting down mongodb client");

        self.client.shutdown().await;

        Ok(())
    }
}


/// Builder for [`MongoDbDriver`].
///
/// Settings left unset keep the values from the connection string, or the MongoDB
/// driver's defaults.
pub struct MongoDbDriverBuilder {
    dsn: String,
    database: String,
    app_name: Option<String>,
    max_pool_size: Option<u32>,
    connect_timeout: Option<Duration>,
    server_selection_timeout: Option<Duration>,
}

impl MongoDbDriverBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
            app_name: None,
            max_pool_size: None,
            connect_timeout: None,
            server_selection_timeout: None,
        }
    }

    /// Application name reported to the server.
    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn max_pool_size(mut self, max_pool_size: u32) -> Self {
        self.max_pool_size = Some(max_pool_size);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// How long an operation waits for a suitable server before failing.
    pub fn server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl DriverBuilder for MongoDbDriverBuilder {
    type Driver = MongoDbDriver;

    async fn build(self) -> AccessorResult<Self::Driver> {
        let mut options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| AccessorError::Initialization(e.to_string()))?;

        if let Some(app_name) = self.app_name {
            options.app_name = Some(app_name);
        }
        if let Some(max_pool_size) = self.max_pool_size {
            options.max_pool_size = Some(max_pool_size);
        }
        if let Some(timeout) = self.connect_timeout {
            options.connect_timeout = Some(timeout);
        }
        if let Some(timeout) = self.server_selection_timeout {
            options.server_selection_timeout = Some(timeout);
        }

        debug!(database = %self.database, "connecting mongodb client");

        Ok(MongoDbDriver::new(
            Client::with_options(options)
                .map_err(|e| AccessorError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}
