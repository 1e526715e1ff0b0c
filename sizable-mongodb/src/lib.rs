//! MongoDB driver for sizable.
//!
//! This crate implements the `StoreDriver` trait on top of the official async MongoDB
//! driver, so accessors run against MongoDB Atlas or a self-hosted server.
//!
//! To use this driver, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sizable = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! The driver is configured through [`MongoDbDriverBuilder`]: a connection string, the
//! database name, and optional pool and timeout settings.
//!
//! # Example
//!
//! ```ignore
//! use sizable::{prelude::*, mongodb::MongoDbDriver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let driver = MongoDbDriver::builder("mongodb://localhost:27017", "my_database")
//!         .build()
//!         .await?;
//!     let store = Store::new(driver);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as sizable_mongodb;

pub mod driver;
pub(crate) mod filter;

pub use driver::{MongoDbCursor, MongoDbDriver, MongoDbDriverBuilder};
