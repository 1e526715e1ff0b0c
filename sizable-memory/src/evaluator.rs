//! Filter evaluation and sort ordering for in-memory documents.

use std::cmp::Ordering;
use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use sizable_core::{
    filter::{Clause, FieldOp, Filter, FilterVisitor, Sort, SortDirection},
    error::AccessorError,
};


/// Type-erased, comparable representation of BSON values.
///
/// Integers and floats are normalized to `f64`. Embedded documents keep their key order,
/// which takes part in equality.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Number(f64),
    String(&'a str),
    Map(Vec<(&'a str, Comparable<'a>)>),
    Array(Vec<Comparable<'a>>),
    ObjectId(ObjectId),
    Bool(bool),
    DateTime(DateTime),
}

impl<'a> Comparable<'a> {
    /// Position of the value's type in the cross-type sort order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::ObjectId(_) => 5,
            Comparable::Bool(_) => 6,
            Comparable::DateTime(_) => 7,
        }
    }

    /// Total order used for sorting: by type rank first, then by value.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.partial_cmp(other).unwrap_or(Ordering::Equal))
    }
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect()
            ),
            _ => Comparable::Null,
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.bytes().partial_cmp(&b.bytes()),
            _ => None,
        }
    }
}

/// Resolves a possibly dotted field path inside a document.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

/// Compares two documents by the keys of `sort`, earlier keys first.
///
/// Missing fields sort as null.
pub(crate) fn compare_documents(left: &Document, right: &Document, sort: &Sort) -> Ordering {
    for (field, direction) in sort.keys() {
        let a = lookup(left, field).map(Comparable::from).unwrap_or(Comparable::Null);
        let b = lookup(right, field).map(Comparable::from).unwrap_or(Comparable::Null);

        let ordering = match direction {
            SortDirection::Asc => a.sort_cmp(&b),
            SortDirection::Desc => b.sort_cmp(&a),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}


/// Evaluates filters against a single document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns whether `document` matches every clause of `filter`.
    pub fn matches(document: &'a Document, filter: &Filter) -> Result<bool, AccessorError> {
        DocumentEvaluator::new(document).visit_filter(filter)
    }

    fn equals(field_value: Option<&Bson>, value: &Bson) -> bool {
        match field_value {
            // A missing field equals null.
            None => matches!(value, Bson::Null),
            Some(field_value) => {
                let (left, right) = (Comparable::from(field_value), Comparable::from(value));
                if left == right {
                    return true;
                }
                // An array field matches when any element does.
                match left {
                    Comparable::Array(items) => items.iter().any(|item| item == &right),
                    _ => false,
                }
            }
        }
    }

    fn member_of(field_value: Option<&Bson>, values: &Bson) -> Result<bool, AccessorError> {
        match values {
            Bson::Array(values) => Ok(values.iter().any(|value| Self::equals(field_value, value))),
            _ => Err(AccessorError::Query("membership operators require an array value".to_string())),
        }
    }
}

impl<'a> FilterVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = AccessorError;

    fn visit_filter(&mut self, filter: &Filter) -> Result<Self::Output, Self::Error> {
        for clause in filter.clauses() {
            if !self.visit_clause(clause)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_clause(&mut self, clause: &Clause) -> Result<Self::Output, Self::Error> {
        let field_value = lookup(self.document, &clause.field);
        let value = &clause.value;

        match clause.op {
            FieldOp::Eq => Ok(Self::equals(field_value, value)),
            FieldOp::Ne => Ok(!Self::equals(field_value, value)),
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                let Some(field_value) = field_value else {
                    return Ok(false);
                };
                match Comparable::from(field_value).partial_cmp(&Comparable::from(value)) {
                    Some(ordering) => Ok(match clause.op {
                        FieldOp::Gt => ordering == Ordering::Greater,
                        FieldOp::Gte => ordering != Ordering::Less,
                        FieldOp::Lt => ordering == Ordering::Less,
                        _ => ordering != Ordering::Greater,
                    }),
                    None => Ok(false),
                }
            }
            FieldOp::AnyOf => Self::member_of(field_value, value),
            FieldOp::NoneOf => Ok(!Self::member_of(field_value, value)?),
            FieldOp::Exists => match value {
                Bson::Boolean(should_exist) => Ok(field_value.is_some() == *should_exist),
                _ => Err(AccessorError::Query("exists operator requires a boolean value".to_string())),
            },
        }
    }
}
