//! Translation of sizable filters and sorts into MongoDB query documents.

use bson::{Bson, Document, doc};

use sizable_core::{
    error::AccessorError,
    filter::{Clause, FieldOp, Filter, FilterVisitor, Sort, SortDirection},
};


/// Translates filters into MongoDB query documents.
///
/// Equality clauses are written as the literal value (`{ field: value }`), every other
/// operator as `{ field: { "$op": value } }`. Operator clauses on the same field merge into
/// one operator document unless the operator is already present there; such clauses, and
/// any other condition that cannot share a key, are combined with `$and`.
pub(crate) struct MongoFilterTranslator;

impl MongoFilterTranslator {
    fn operator(op: FieldOp) -> &'static str {
        match op {
            FieldOp::Eq => "$eq",
            FieldOp::Ne => "$ne",
            FieldOp::Gt => "$gt",
            FieldOp::Gte => "$gte",
            FieldOp::Lt => "$lt",
            FieldOp::Lte => "$lte",
            FieldOp::AnyOf => "$in",
            FieldOp::NoneOf => "$nin",
            FieldOp::Exists => "$exists",
        }
    }

    /// Translates a whole filter.
    pub(crate) fn translate(filter: &Filter) -> Result<Document, AccessorError> {
        MongoFilterTranslator.visit_filter(filter)
    }
}

impl FilterVisitor for MongoFilterTranslator {
    type Output = Document;
    type Error = AccessorError;

    fn visit_filter(&mut self, filter: &Filter) -> Result<Self::Output, Self::Error> {
        let mut query = Document::new();
        let mut operator_fields = Vec::new();
        let mut conflicts = Vec::new();

        for clause in filter.clauses() {
            for (field, condition) in self.visit_clause(clause)? {
                let is_operator = clause.op != FieldOp::Eq;

                if !query.contains_key(&field) {
                    if is_operator {
                        operator_fields.push(field.clone());
                    }
                    query.insert(field, condition);
                } else if is_operator && operator_fields.contains(&field) {
                    // A repeated operator cannot share the key without overwriting.
                    let merged = match (query.get_mut(&field), &condition) {
                        (Some(Bson::Document(existing)), Bson::Document(operators))
                            if operators.keys().all(|operator| !existing.contains_key(operator)) =>
                        {
                            for (operator, value) in operators {
                                existing.insert(operator.clone(), value.clone());
                            }
                            true
                        }
                        _ => false,
                    };

                    if !merged {
                        conflicts.push(Bson::Document(doc! { field: condition }));
                    }
                } else {
                    conflicts.push(Bson::Document(doc! { field: condition }));
                }
            }
        }

        // Conditions that cannot share a key are combined with $and.
        if !conflicts.is_empty() {
            query.insert("$and", Bson::Array(conflicts));
        }

        Ok(query)
    }

    fn visit_clause(&mut self, clause: &Clause) -> Result<Self::Output, Self::Error> {
        let field = clause.field.as_str();

        Ok(match clause.op {
            FieldOp::Eq => doc! { field: clause.value.clone() },
            FieldOp::AnyOf | FieldOp::NoneOf if !matches!(clause.value, Bson::Array(_)) => {
                return Err(AccessorError::Query(
                    "membership operators require an array value".to_string(),
                ));
            }
            op => {
                let operator = Self::operator(op);
                doc! { field: { operator: clause.value.clone() } }
            }
        })
    }
}

/// Translates a sort into a MongoDB sort document, keeping key order.
pub(crate) fn sort_document(sort: &Sort) -> Document {
    sort.keys()
        .iter()
        .map(|(field, direction)| {
            (
                field.clone(),
                Bson::Int32(match direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                }),
            )
        })
        .collect()
}
