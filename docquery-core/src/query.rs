//! Query construction and filtering API.
//!
//! This module provides the filter expression tree, projection, sorting and limits,
//! and a visitor trait used by backends to evaluate or translate filters.
//!
//! # Query Building
//!
//! ```ignore
//! use docquery::query::{Query, Filter, Projection, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("kategorie", "Zubehoer").or(Filter::eq("kategorie", "Noten")))
//!     .projection(Projection::include(["_id"]))
//!     .sort("preis", SortDirection::Desc)
//!     .limit(2)
//!     .build();
//! ```
//!
//! # Filter Expression API
//!
//! The [`Filter`] struct provides static methods for building filter expressions:
//!
//! - Comparison: `eq`, `ne`, `gt`, `gte`, `lt`, `lte`
//! - Existence: `exists`, `not_exists`
//! - Array membership: `any_of`, `none_of`
//! - Logical: `and`, `or`
//!
//! Field names are dotted paths into nested documents (`hersteller.name`).

use bson::Bson;
use serde::{Deserialize, Serialize};

use crate::{
    document::ID_FIELD,
    error::{DocumentStoreError, DocumentStoreResult},
};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// Sort specification for query results.
///
/// Sorting is stable: documents with equal sort keys keep their insertion order.
#[derive(Debug, Clone)]
pub struct Sort {
    /// The field path to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Field comparison operators for filter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Equal to; also matches arrays that contain the value.
    Eq,
    /// Not equal to; also matches documents lacking the field.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// The field value (or one of its elements) is one of the operand values.
    AnyOf,
    /// The field value (and each of its elements) is none of the operand values.
    NoneOf,
}

impl FieldOp {
    /// Whether this operator orders values rather than testing equality.
    pub fn is_ordering(&self) -> bool {
        matches!(self, FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte)
    }

    /// Whether this operator takes an array of candidate values.
    pub fn is_membership(&self) -> bool {
        matches!(self, FieldOp::AnyOf | FieldOp::NoneOf)
    }
}

/// A filter expression for querying documents.
///
/// Expressions can be combined using logical operators (`And`, `Or`, `Not`)
/// to build complex filter predicates.
///
/// # Example
///
/// ```ignore
/// use docquery::query::Filter;
///
/// let yomoho_above_100 = Filter::and([
///     Filter::eq("hersteller.name", "Yomoho"),
///     Filter::gt("preis", 100),
/// ]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// Logical OR of multiple expressions (any must match).
    Or(Vec<Expr>),
    /// Logical NOT of an expression (inverts the result).
    Not(Box<Expr>),
    /// Checks if a field exists or doesn't exist.
    Exists(String, bool),
    /// Field comparison expression.
    Field {
        /// The field path to compare.
        field: String,
        /// The comparison operator.
        op: FieldOp,
        /// The value to compare against.
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR.
    ///
    /// If this expression is already an OR, the other expression is appended
    /// to the list. Otherwise, a new OR expression is created.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression (logical NOT).
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Checks that the expression is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidOperation`] for empty field paths,
    /// empty `and`/`or` lists, non-array operands of `any_of`/`none_of` and
    /// ordering operands that are not numbers (decimals included), strings or datetimes.
    pub fn validate(&self) -> DocumentStoreResult<()> {
        FilterValidator.visit_expr(self)
    }
}

/// Helper struct for constructing filter expressions.
///
/// All methods accept field names and values as `Into<String>` and `Into<Bson>`.
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals the value, or where the field is
    /// an array containing the value.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    /// Matches documents that [`Filter::eq`] would not match.
    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    /// Matches documents where the field is greater than the value.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    /// Matches documents where the field is greater than or equal to the value.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    /// Matches documents where the field is less than the value.
    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    /// Matches documents where the field is less than or equal to the value.
    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    /// Matches documents where the field resolves to any value, including null.
    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    /// Matches documents where the field is missing.
    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    /// Combines multiple expressions such that all must match.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Combines multiple expressions such that any can match.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }

    /// Matches documents where the field (or one of its elements) is one of `values`.
    pub fn any_of<V: Into<Bson>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::field(field.into(), FieldOp::AnyOf, Self::array(values))
    }

    /// Matches documents where the field (and each of its elements) is none of `values`.
    pub fn none_of<V: Into<Bson>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::field(field.into(), FieldOp::NoneOf, Self::array(values))
    }

    fn array<V: Into<Bson>>(values: impl IntoIterator<Item = V>) -> Bson {
        Bson::Array(values.into_iter().map(Into::into).collect())
    }
}

/// Which fields of a matching document are returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Keep only the listed field paths. `_id` is kept unless `exclude_id` is set.
    Include {
        /// Field paths to keep.
        fields: Vec<String>,
        /// Drop `_id` as well.
        exclude_id: bool,
    },
    /// Drop the listed field paths and keep everything else.
    Exclude(Vec<String>),
}

impl Projection {
    /// Keeps only the given field paths (plus `_id`).
    pub fn include<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Projection::Include {
            fields: fields.into_iter().map(Into::into).collect(),
            exclude_id: false,
        }
    }

    /// Drops the given field paths.
    pub fn exclude<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Projection::Exclude(fields.into_iter().map(Into::into).collect())
    }

    /// Drops `_id` from an inclusion projection.
    ///
    /// On an exclusion projection `_id` is added to the excluded fields.
    pub fn exclude_id(self) -> Self {
        match self {
            Projection::Include { fields, .. } => Projection::Include { fields, exclude_id: true },
            Projection::Exclude(mut fields) => {
                if !fields.iter().any(|field| field == ID_FIELD) {
                    fields.push(ID_FIELD.to_string());
                }
                Projection::Exclude(fields)
            }
        }
    }
}

/// A structured query for retrieving and filtering documents.
///
/// Filtering happens first, then sorting, then `skip` and `limit`, and the
/// projection is applied last. Use [`QueryBuilder`] for ergonomic construction.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Optional filter expression to match documents.
    pub filter: Option<Expr>,
    /// Optional projection of the returned documents.
    pub projection: Option<Projection>,
    /// Sort specification for results.
    pub sort: Option<Sort>,
    /// Number of documents to skip.
    pub skip: Option<usize>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl Query {
    /// Creates a new empty query that matches every document.
    pub fn new() -> Self {
        Query::default()
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Creates a query with only a filter.
    pub fn filtered(filter: Expr) -> Self {
        Query { filter: Some(filter), ..Query::default() }
    }

    /// Checks the filter and projection for malformed input.
    pub fn validate(&self) -> DocumentStoreResult<()> {
        if let Some(filter) = &self.filter {
            filter.validate()?;
        }

        match &self.projection {
            Some(Projection::Include { fields, .. }) | Some(Projection::Exclude(fields)) => {
                fields.iter().try_for_each(|field| validate_path(field))
            }
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Sets the filter expression for this query.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Sets the projection applied to returned documents.
    pub fn projection(mut self, projection: Projection) -> Self {
        self.query.projection = Some(projection);
        self
    }

    /// Sets the sort specification for the query results.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort { field: field.into(), direction });
        self
    }

    /// Sets the number of documents to skip after sorting.
    pub fn skip(mut self, skip: usize) -> Self {
        self.query.skip = Some(skip);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> Query {
        self.query
    }
}

pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}

/// Rejects an empty path or a path with an empty segment (`a..b`).
pub(crate) fn validate_path(path: &str) -> DocumentStoreResult<()> {
    if path.split('.').any(str::is_empty) {
        return Err(DocumentStoreError::invalid_operation(format!(
            "invalid field path '{}'",
            path
        )));
    }

    Ok(())
}

struct FilterValidator;

impl QueryVisitor for FilterValidator {
    type Output = ();
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            return Err(DocumentStoreError::invalid_operation("and requires at least one expression"));
        }

        exprs.iter().try_for_each(|expr| self.visit_expr(expr))
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            return Err(DocumentStoreError::invalid_operation("or requires at least one expression"));
        }

        exprs.iter().try_for_each(|expr| self.visit_expr(expr))
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        self.visit_expr(expr)
    }

    fn visit_exists(&mut self, field: &str, _should_exist: bool) -> Result<Self::Output, Self::Error> {
        validate_path(field)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        validate_path(field)?;

        if op.is_membership() && !matches!(value, Bson::Array(_)) {
            return Err(DocumentStoreError::invalid_operation(format!(
                "{:?} on '{}' requires an array operand",
                op, field
            )));
        }

        if op.is_ordering() {
            match value {
                Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) | Bson::String(_) | Bson::DateTime(_) => {}
                other => {
                    return Err(DocumentStoreError::invalid_operation(format!(
                        "{:?} on '{}' cannot compare against {:?}",
                        op,
                        field,
                        other.element_type()
                    )));
                }
            }
        }

        Ok(())
    }
}
