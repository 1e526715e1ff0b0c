//! Typed, generic accessors over document-database collections.
//!
//! This crate is the core of the sizable project and provides:
//!
//! - **Entities** ([`entity`]) - The trait every stored record type implements
//! - **Filters and sorts** ([`filter`]) - Ordered filter clauses and sort keys
//! - **Driver abstraction** ([`driver`]) - The collection/cursor contract a database binding implements
//! - **Accessor** ([`accessor`]) - Upserts, inserts, lookups, deletes and paged reads for one collection
//! - **Pagination** ([`page`]) - Page windows and cursor-bounded page materialization
//! - **Store** ([`store`]) - Entry point handing out accessors for a driver
//! - **Error handling** ([`error`]) - Error taxonomy and result alias
//!
//! # Example
//!
//! ```ignore
//! use sizable::prelude::*;
//! use bson::oid::ObjectId;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Thing {
//!     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
//!     pub id: Option<ObjectId>,
//!     pub number: i32,
//! }
//!
//! impl Entity for Thing {
//!     fn collection_name() -> &'static str {
//!         "things"
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as sizable_core;

pub mod accessor;
pub mod driver;
pub mod entity;
pub mod error;
pub mod filter;
pub mod page;
pub mod store;
