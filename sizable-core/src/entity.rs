//! The entity trait and document conversion helpers.
//!
//! An entity is any serde-serializable record type. The accessor never looks at its
//! fields; it only moves it through the BSON codec.

use bson::{
    Document,
    de::deserialize_from_document,
    ser::serialize_to_document,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{AccessorError, AccessorResult};

/// Name of the identifier field every persisted document carries.
pub const ID_FIELD: &str = "_id";

/// Core trait that all record types stored through an accessor must implement.
///
/// The identifier is assigned by the database on first insert. Entities usually model it
/// as an `Option<ObjectId>` renamed to `_id` and skipped while `None`, so that a fresh
/// entity serializes without one.
///
/// # Example
///
/// ```ignore
/// use sizable::entity::Entity;
/// use bson::oid::ObjectId;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Thing {
///     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
///     pub id: Option<ObjectId>,
///     pub number: i32,
///     pub user: String,
/// }
///
/// impl Entity for Thing {
///     fn collection_name() -> &'static str {
///         "things"
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Returns the default collection this entity type lives in.
    fn collection_name() -> &'static str;
}

/// Extension trait providing document conversion for entities.
///
/// Automatically implemented for every [`Entity`].
pub trait EntityExt: Entity {
    /// Serializes this entity into a BSON document.
    ///
    /// # Errors
    ///
    /// Returns [`AccessorError::Encode`] if the entity does not serialize to a document.
    fn to_document(&self) -> AccessorResult<Document>;

    /// Deserializes an entity from a BSON document.
    ///
    /// # Errors
    ///
    /// Returns [`AccessorError::Decode`] if the document does not match the entity's shape.
    fn from_document(document: Document) -> AccessorResult<Self>;
}

impl<T: Entity> EntityExt for T {
    fn to_document(&self) -> AccessorResult<Document> {
        serialize_to_document(self).map_err(|e| AccessorError::Encode(e.to_string()))
    }

    fn from_document(document: Document) -> AccessorResult<Self> {
        deserialize_from_document(document).map_err(|e| AccessorError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use bson::{doc, oid::ObjectId};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Thing {
        #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
        id: Option<ObjectId>,
        number: i32,
    }

    impl Entity for Thing {
        fn collection_name() -> &'static str {
            "things"
        }
    }

    #[test]
    fn fresh_entity_serializes_without_identifier() {
        let document = Thing { id: None, number: 3 }.to_document().unwrap();

        assert!(!document.contains_key(ID_FIELD));
        assert_eq!(document.get_i32("number").unwrap(), 3);
    }

    #[test]
    fn decoding_a_mismatched_document_is_a_decode_error() {
        let result = Thing::from_document(doc! { "number": "three" });

        assert!(matches!(result, Err(AccessorError::Decode(_))));
    }

    #[test]
    fn decoding_keeps_the_identifier() {
        let id = ObjectId::new();
        let thing = Thing::from_document(doc! { "_id": id, "number": 9 }).unwrap();

        assert_eq!(thing, Thing { id: Some(id), number: 9 });
    }
}
