//! Query translation from the docquery AST to MongoDB query syntax.
//!
//! This module translates filter expressions and projections into the BSON
//! documents the MongoDB query engine executes.

use bson::{Document, Bson, doc};

use docquery_core::{
    document::ID_FIELD,
    query::{QueryVisitor, Expr, FieldOp, Projection, Sort, SortDirection},
    error::DocumentStoreError,
};


/// Translates docquery filter expressions into MongoDB query documents.
///
/// This struct implements the [`QueryVisitor`] trait to convert abstract
/// query expressions into MongoDB's native BSON query syntax. Dotted field
/// paths pass through unchanged, MongoDB resolves them the same way.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    /// Translates an optional filter; `None` matches every document.
    pub fn filter(expr: Option<&Expr>) -> Result<Document, DocumentStoreError> {
        match expr {
            Some(expr) => MongoQueryTranslator.visit_expr(expr),
            None => Ok(doc! {}),
        }
    }

    pub fn sort(sort: &Sort) -> Document {
        doc! {
            sort.field.clone(): match sort.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            }
        }
    }

    pub fn projection(projection: &Projection) -> Document {
        match projection {
            Projection::Include { fields, exclude_id } => {
                let mut translated = fields
                    .iter()
                    .filter(|field| field.as_str() != ID_FIELD)
                    .map(|field| (field.clone(), Bson::Int32(1)))
                    .collect::<Document>();

                // An empty inclusion would return whole documents
                if *exclude_id {
                    translated.insert(ID_FIELD, 0);
                } else {
                    translated.insert(ID_FIELD, 1);
                }

                translated
            },
            Projection::Exclude(fields) => fields
                .iter()
                .map(|field| (field.clone(), Bson::Int32(0)))
                .collect(),
        }
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        // $not only applies to operator expressions, $nor negates a whole filter
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value.clone() },
                FieldOp::Ne => doc! { "$ne": value.clone() },
                FieldOp::Gt => doc! { "$gt": value.clone() },
                FieldOp::Gte => doc! { "$gte": value.clone() },
                FieldOp::Lt => doc! { "$lt": value.clone() },
                FieldOp::Lte => doc! { "$lte": value.clone() },
                FieldOp::AnyOf | FieldOp::NoneOf => {
                    let Bson::Array(values) = value else {
                        return Err(DocumentStoreError::invalid_operation(format!(
                            "{:?} on '{}' requires an array operand",
                            op, field
                        )));
                    };

                    if *op == FieldOp::AnyOf {
                        doc! { "$in": values.clone() }
                    } else {
                        doc! { "$nin": values.clone() }
                    }
                },
            }
        })
    }
}
