//! Convenient re-exports of commonly used types from sizable.
//!
//! ```ignore
//! use sizable::prelude::*;
//! ```

pub use sizable_core::{
    accessor::Accessor,
    driver::{DocumentCursor, DriverBuilder, FindOptions, ReplaceOptions, ReturnDocument, StoreDriver, UpdateOutcome},
    entity::{Entity, EntityExt, ID_FIELD},
    error::{AccessorError, AccessorResult},
    filter::{Clause, FieldOp, Filter, FilterVisitor, Sort, SortDirection},
    page::{PageWindow, read_page},
    store::Store,
};
