//! Typed convenience accessors over document-database collections.
//!
//! This crate is the primary entry point of the sizable project. It re-exports the core
//! types and the available drivers.
//!
//! Every accessor operation is a thin wrapper over one driver call: it fixes the options
//! (upsert, return-after-update), decodes results into the entity type and maps driver
//! results into errors. The one piece with its own logic is paged reading over a cursor.
//!
//! # Quick Start
//!
//! ```ignore
//! use sizable::{prelude::*, memory::InMemoryDriver};
//! use bson::oid::ObjectId;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Thing {
//!     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
//!     pub id: Option<ObjectId>,
//!     pub number: i32,
//!     pub user: String,
//! }
//!
//! impl Entity for Thing {
//!     fn collection_name() -> &'static str { "things" }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Store::new(InMemoryDriver::builder().build().await.unwrap());
//!     let things = store.accessor::<Thing>();
//!
//!     // Replace-or-insert keyed by number
//!     let thing = Thing { id: None, number: 1, user: "jeff".to_string() };
//!     things.upsert(&Filter::new().eq("number", 1), &thing).await.unwrap();
//!
//!     // First page of six, ordered by number
//!     let page = things
//!         .read_page(&Filter::new(), &Sort::new().asc("number"), PageWindow::new(6, 0))
//!         .await
//!         .unwrap();
//!
//!     println!("First page: {:?}", page);
//!
//!     store.shutdown().await.unwrap();
//! }
//! ```
//!
//! # Drivers
//!
//! - [`memory`] - In-process driver for development and testing
//! - [`mongodb`] - MongoDB driver (requires `mongodb` feature)

pub mod prelude;

pub use sizable_core::{accessor, driver, entity, error, filter, page, store};

// Re-export BSON types for convenience
pub use bson;

/// In-memory driver implementation.
pub mod memory {
    pub use sizable_memory::{InMemoryCursor, InMemoryDriver, InMemoryDriverBuilder};
}

/// MongoDB driver implementation.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use sizable_mongodb::{MongoDbCursor, MongoDbDriver, MongoDbDriverBuilder};
}
