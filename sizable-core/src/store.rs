//! Entry point handing out accessors for a driver.
//!
//! # Example
//!
//! ```ignore
//! use sizable::{store::Store, memory::InMemoryDriver};
//!
//! let store = Store::new(InMemoryDriver::new());
//! let things = store.accessor::<Thing>();
//! ```

use tracing::debug;

use crate::{
    accessor::Accessor,
    driver::StoreDriver,
    entity::Entity,
    error::AccessorResult,
};

/// A store bound to a specific driver implementation.
///
/// # Type Parameters
///
/// * `D` - The driver implementation type
#[derive(Debug)]
pub struct Store<D: StoreDriver> {
    driver: D,
}

impl<D: StoreDriver> Store<D> {
    /// Creates a new store over the given driver.
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    /// Returns the underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Gets an accessor for the entity type's own collection.
    ///
    /// The collection name comes from [`Entity::collection_name`].
    pub fn accessor<'a, T: Entity>(&'a self) -> Accessor<'a, T, D> {
        Accessor::new(T::collection_name().to_string(), &self.driver)
    }

    /// Gets an accessor for the entity type over the collection `name`.
    pub fn accessor_in<'a, T: Entity>(&'a self, name: &str) -> Accessor<'a, T, D> {
        Accessor::new(name.to_string(), &self.driver)
    }

    /// Drops a collection and all its documents.
    pub async fn drop_collection(&self, name: &str) -> AccessorResult<()> {
        self.driver.drop_collection(name).await
    }

    /// Lists all collections in the store.
    pub async fn list_collections(&self) -> AccessorResult<Vec<String>> {
        self.driver.list_collections().await
    }

    /// Shuts down the store, releasing the driver's resources.
    pub async fn shutdown(self) -> AccessorResult<()> {
        debug!("shutting down store");

        self.driver.shutdown().await
    }
}
