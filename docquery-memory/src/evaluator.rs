//! Query expression evaluation for in-memory document filtering.
//!
//! This module provides the recursive matcher for filter expressions, and the
//! value ordering used for sorting.

use std::{cmp::Ordering, collections::HashMap};
use bson::{Bson, Document, datetime::DateTime};

use docquery_core::{
    document::DocumentPath,
    query::{QueryVisitor, Expr, FieldOp},
    error::{DocumentStoreError, DocumentStoreResult},
};


/// A numeric value, kept exact for integers.
///
/// `Int32` and `Int64` become [`Number::Int`]; `Double` and `Decimal128`
/// become [`Number::Float`]. Integers compare against floats without rounding
/// the integer, so ids above 2^53 stay distinct.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

/// 2^63 as a float, the first value above `i64::MAX`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl Number {
    pub(crate) fn from_bson(value: &Bson) -> Option<Self> {
        match value {
            Bson::Int32(value) => Some(Number::Int(*value as i64)),
            Bson::Int64(value) => Some(Number::Int(*value)),
            Bson::Double(value) => Some(Number::Float(*value)),
            Bson::Decimal128(value) => value.to_string().parse::<f64>().ok().map(Number::Float),
            _ => None,
        }
    }

    pub(crate) fn as_f64(&self) -> f64 {
        match self {
            Number::Int(value) => *value as f64,
            Number::Float(value) => *value,
        }
    }

    /// Total numeric order; NaN sorts below every other number.
    pub(crate) fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.cmp(b),
            (Number::Int(a), Number::Float(b)) => cmp_int_float(*a, *b),
            (Number::Float(a), Number::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (Number::Float(a), Number::Float(b)) => match (a.is_nan(), b.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            },
        }
    }
}

fn cmp_int_float(int: i64, float: f64) -> Ordering {
    if float.is_nan() || float < -I64_BOUND {
        return Ordering::Greater;
    }
    if float >= I64_BOUND {
        return Ordering::Less;
    }

    let whole = float.trunc();

    match int.cmp(&(whole as i64)) {
        Ordering::Equal if float > whole => Ordering::Less,
        Ordering::Equal if float < whole => Ordering::Greater,
        ordering => ordering,
    }
}

/// Type-erased, comparable representation of BSON values.
///
/// Every numeric type lands in [`Comparable::Number`] so that `Int32(100)`,
/// `Int64(100)`, `Double(100.0)` and `Decimal128("100")` compare equal.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value of any BSON number type
    Number(Number),
    /// DateTime value
    DateTime(DateTime),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Any other BSON value, compared by exact equality only
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        if let Some(number) = Number::from_bson(bson) {
            return Comparable::Number(number);
        }

        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> Comparable<'a> {
    /// Rank of the value's type class in the sort order.
    fn type_rank(&self) -> u8 {
        match self {
            Comparable::Null => 1,
            Comparable::Number(_) => 2,
            Comparable::String(_) => 3,
            Comparable::Map(_) => 4,
            Comparable::Array(_) => 5,
            Comparable::Other(_) => 6,
            Comparable::Bool(_) => 8,
            Comparable::DateTime(_) => 9,
        }
    }

    /// A total order over all values, used for sorting.
    ///
    /// Values of different type classes order by [`Comparable::type_rank`].
    pub(crate) fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Number(a), Comparable::Number(b)) => a.compare(b),
            (Comparable::String(a), Comparable::String(b)) => a.cmp(b),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.cmp(b),
            (Comparable::Array(a), Comparable::Array(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(left, right)| left.total_cmp(right))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }

    /// Whether this value equals `target`, or is an array containing `target`.
    fn matches_eq(&self, target: &Comparable<'_>) -> bool {
        self == target
            || matches!(self, Comparable::Array(items) if items.iter().any(|item| item == target))
    }

    /// Whether this value (or any of its elements) satisfies `op` against `target`.
    fn matches_ordering(&self, op: &FieldOp, target: &Comparable<'_>) -> bool {
        let satisfies = |value: &Comparable<'_>| match value.partial_cmp(target) {
            Some(ordering) => match op {
                FieldOp::Gt => ordering == Ordering::Greater,
                FieldOp::Gte => ordering != Ordering::Less,
                FieldOp::Lt => ordering == Ordering::Less,
                FieldOp::Lte => ordering != Ordering::Greater,
                _ => false,
            },
            None => false,
        };

        match self {
            Comparable::Array(items) => items.iter().any(satisfies),
            value => satisfies(value),
        }
    }
}

impl<'a, 'b> PartialEq<Comparable<'b>> for Comparable<'a> {
    fn eq(&self, other: &Comparable<'b>) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a.compare(b).is_eq(),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(left, right)| left == right)
            }
            (Comparable::Map(a), Comparable::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| b.get(key).is_some_and(|other| value == other))
            }
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a, 'b> PartialOrd<Comparable<'b>> for Comparable<'a> {
    fn partial_cmp(&self, other: &Comparable<'b>) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => Some(a.compare(b)),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Compares two optional field values for sorting; a missing value sorts like null.
pub(crate) fn sort_cmp(left: Option<&Bson>, right: Option<&Bson>) -> Ordering {
    let left = left.map(Comparable::from).unwrap_or(Comparable::Null);
    let right = right.map(Comparable::from).unwrap_or(Comparable::Null);

    left.total_cmp(&right)
}

/// Whether `value` equals `target` under numeric normalization.
pub(crate) fn values_equal(value: &Bson, target: &Bson) -> bool {
    Comparable::from(value) == Comparable::from(target)
}


pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocumentStoreResult<bool> {
        self.visit_expr(expr)
    }

    /// Evaluates `expr` against `document`, treating a missing filter as a match.
    pub fn matches(document: &'a Document, expr: Option<&Expr>) -> DocumentStoreResult<bool> {
        match expr {
            Some(expr) => DocumentEvaluator::new(document).evaluate(expr),
            None => Ok(true),
        }
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        expr: Option<&Expr>,
    ) -> DocumentStoreResult<Vec<&'a Document>> {
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::matches(document, expr)? {
                matched.push(document);
            }
        }

        Ok(matched)
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(self.document.lookup_path(field).is_some() == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let target = Comparable::from(value);
        let resolved = self.document
            .lookup_path(field)
            .map(Comparable::from);

        let Some(field_value) = resolved else {
            // Only the negated operators match a missing field
            return Ok(matches!(op, FieldOp::Ne | FieldOp::NoneOf));
        };

        match op {
            FieldOp::Eq => Ok(field_value.matches_eq(&target)),
            FieldOp::Ne => Ok(!field_value.matches_eq(&target)),
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                Ok(field_value.matches_ordering(op, &target))
            },
            FieldOp::AnyOf | FieldOp::NoneOf => {
                let Comparable::Array(candidates) = &target else {
                    return Err(DocumentStoreError::invalid_operation(format!(
                        "{:?} on '{}' requires an array operand",
                        op, field
                    )));
                };

                let any = candidates
                    .iter()
                    .any(|candidate| field_value.matches_eq(candidate));

                Ok(if *op == FieldOp::AnyOf { any } else { !any })
            },
        }
    }
}
