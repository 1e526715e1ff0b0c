//! Filter and sort construction for collection queries.
//!
//! A [`Filter`] is an ordered list of clauses, each pairing a field name with a condition.
//! All clauses must hold for a document to match. A [`Sort`] is an ordered list of
//! `(field, direction)` keys where earlier keys take precedence.
//!
//! # Example
//!
//! ```ignore
//! use sizable::filter::{Filter, Sort};
//!
//! let filter = Filter::new()
//!     .eq("user", "jeff")
//!     .gt("number", 2);
//!
//! let sort = Sort::new().asc("number");
//! ```
//!
//! Drivers consume filters through the [`FilterVisitor`] trait, either translating them
//! into a native query or evaluating them against documents.

use bson::{Bson, oid::ObjectId};

use crate::entity::ID_FIELD;

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// Ordered list of sort keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sort {
    keys: Vec<(String, SortDirection)>,
}

impl Sort {
    /// Creates an empty sort (natural order).
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an ascending key.
    pub fn asc(self, field: impl Into<String>) -> Self {
        self.by(field, SortDirection::Asc)
    }

    /// Appends a descending key.
    pub fn desc(self, field: impl Into<String>) -> Self {
        self.by(field, SortDirection::Desc)
    }

    /// Appends a key with an explicit direction.
    pub fn by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.keys.push((field.into(), direction));
        self
    }

    /// The sort keys in precedence order.
    pub fn keys(&self) -> &[(String, SortDirection)] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Field comparison operators for filter clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Equal to. Drivers write this as the literal value.
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// Field value is a member of the given array.
    AnyOf,
    /// Field value is not a member of the given array.
    NoneOf,
    /// Field presence; the value is a boolean.
    Exists,
}

/// A single `(field, condition)` pair of a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// The field name the condition applies to.
    pub field: String,
    /// The comparison operator.
    pub op: FieldOp,
    /// The operand.
    pub value: Bson,
}

/// Ordered conjunction of filter clauses. The empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// Creates an empty filter that matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a membership filter on the identifier field (`_id ∈ ids`).
    pub fn by_ids(ids: &[ObjectId]) -> Self {
        Self::new().any_of(ID_FIELD, ids.iter().copied().map(Bson::ObjectId).collect::<Vec<_>>())
    }

    /// Creates an equality filter on the identifier field.
    pub fn by_id(id: ObjectId) -> Self {
        Self::new().eq(ID_FIELD, id)
    }

    /// Appends a clause with an explicit operator.
    pub fn clause(mut self, field: impl Into<String>, op: FieldOp, value: impl Into<Bson>) -> Self {
        self.clauses.push(Clause {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.clause(field, FieldOp::Eq, value)
    }

    pub fn ne(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.clause(field, FieldOp::Ne, value)
    }

    pub fn gt(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.clause(field, FieldOp::Gt, value)
    }

    pub fn gte(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.clause(field, FieldOp::Gte, value)
    }

    pub fn lt(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.clause(field, FieldOp::Lt, value)
    }

    pub fn lte(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.clause(field, FieldOp::Lte, value)
    }

    /// Matches documents whose field value is one of `values`.
    pub fn any_of<V: Into<Bson>>(self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect::<Vec<Bson>>();
        self.clause(field, FieldOp::AnyOf, Bson::Array(values))
    }

    /// Matches documents whose field value is none of `values`.
    pub fn none_of<V: Into<Bson>>(self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect::<Vec<Bson>>();
        self.clause(field, FieldOp::NoneOf, Bson::Array(values))
    }

    pub fn exists(self, field: impl Into<String>, should_exist: bool) -> Self {
        self.clause(field, FieldOp::Exists, should_exist)
    }

    /// The clauses in the order they were added.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Returns the operand of the first equality clause on `field`, if any.
    pub fn equality_on(&self, field: &str) -> Option<&Bson> {
        self.clauses
            .iter()
            .find(|clause| clause.field == field && clause.op == FieldOp::Eq)
            .map(|clause| &clause.value)
    }
}

/// Visitor over a [`Filter`], implemented by drivers to translate or evaluate filters.
pub trait FilterVisitor {
    /// The type produced by visiting a whole filter or a single clause.
    type Output;
    /// The error type returned by a failed visit.
    type Error;

    /// Visits a whole filter.
    fn visit_filter(&mut self, filter: &Filter) -> Result<Self::Output, Self::Error>;

    /// Visits a single clause.
    fn visit_clause(&mut self, clause: &Clause) -> Result<Self::Output, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clauses_keep_insertion_order() {
        let filter = Filter::new().eq("user", "jeff").gt("number", 2);

        let fields = filter
            .clauses()
            .iter()
            .map(|clause| (clause.field.as_str(), clause.op))
            .collect::<Vec<_>>();
        assert_eq!(fields, vec![("user", FieldOp::Eq), ("number", FieldOp::Gt)]);
    }

    #[test]
    fn by_ids_builds_membership_on_identifier() {
        let ids = vec![ObjectId::new(), ObjectId::new()];
        let filter = Filter::by_ids(&ids);

        let clause = &filter.clauses()[0];
        assert_eq!(clause.field, ID_FIELD);
        assert_eq!(clause.op, FieldOp::AnyOf);
        assert_eq!(clause.value, Bson::Array(ids.into_iter().map(Bson::ObjectId).collect()));
    }

    #[test]
    fn equality_on_ignores_other_operators() {
        let filter = Filter::new().gt("number", 1).eq("number", 4);

        assert_eq!(filter.equality_on("number"), Some(&Bson::Int32(4)));
        assert_eq!(filter.equality_on("user"), None);
    }

    #[test]
    fn sort_keys_keep_precedence() {
        let sort = Sort::new().asc("user").desc("number");

        assert_eq!(
            sort.keys(),
            &[
                ("user".to_string(), SortDirection::Asc),
                ("number".to_string(), SortDirection::Desc),
            ]
        );
        assert!(Sort::new().is_empty());
    }
}
