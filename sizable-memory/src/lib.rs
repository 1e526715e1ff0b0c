//! In-memory driver for sizable.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreDriver` trait.
//! It is meant for tests, development and embedding where no database server is available.
//!
//! # Features
//!
//! - **Insertion-ordered collections** - natural order is the order documents were written
//! - **Filter and sort support** - equality, ranges, membership and existence clauses, multi-key sorts
//! - **Identifier assignment** - object ids are generated for documents inserted without one
//! - **Cursor accounting** - [`InMemoryDriver::open_cursors`] reports cursors not yet released
//!
//! # Quick Start
//!
//! ```ignore
//! use sizable::{prelude::*, memory::InMemoryDriver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Store::new(InMemoryDriver::builder().build().await?);
//!     let things = store.accessor::<Thing>();
//!
//!     things.insert_one(&Thing { id: None, number: 1 }).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as sizable_memory;

pub mod driver;
pub(crate) mod evaluator;

pub use driver::{InMemoryCursor, InMemoryDriver, InMemoryDriverBuilder};
