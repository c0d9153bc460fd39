//! Field update operators.
//!
//! An [`Update`] is an ordered, non-empty list of [`UpdateOp`]s applied to every
//! document a filter selects. Build them with [`Updates`]:
//!
//! ```ignore
//! use docquery::update::Updates;
//!
//! let reprice = Updates::set("preis", 3800);
//! let tag_books = Updates::add_to_set("schlagworte", "buch");
//! let both = reprice.and(tag_books);
//! ```

use bson::Bson;

use crate::{
    document::ID_FIELD,
    error::{DocumentStoreError, DocumentStoreResult},
    query::validate_path,
};

/// A single field update operation.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Overwrite the field, creating it (and missing parents) if absent.
    Set(String, Bson),
    /// Remove the field if present.
    Unset(String),
    /// Add a number to the field, creating it with the operand if absent.
    Inc(String, Bson),
    /// Append the value to the array field unless an equal element is already present.
    /// A missing field becomes a single-element array.
    AddToSet(String, Bson),
}

impl UpdateOp {
    /// The field path this operation writes to.
    pub fn field(&self) -> &str {
        match self {
            UpdateOp::Set(field, _)
            | UpdateOp::Unset(field)
            | UpdateOp::Inc(field, _)
            | UpdateOp::AddToSet(field, _) => field,
        }
    }
}

/// An ordered list of update operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    ops: Vec<UpdateOp>,
}

impl Update {
    /// Creates an update from raw operations.
    pub fn new(ops: Vec<UpdateOp>) -> Self {
        Self { ops }
    }

    /// Returns the operations in application order.
    pub fn ops(&self) -> &[UpdateOp] {
        &self.ops
    }

    /// Appends the operations of `other` to this update.
    pub fn and(mut self, other: Update) -> Self {
        self.ops.extend(other.ops);
        self
    }

    /// Checks that the update is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidOperation`] if the update is empty,
    /// writes to `_id`, has a malformed path, increments by a non-number or
    /// touches the same path (or a parent and a child path) twice.
    pub fn validate(&self) -> DocumentStoreResult<()> {
        if self.ops.is_empty() {
            return Err(DocumentStoreError::invalid_operation("update requires at least one operation"));
        }

        for (index, op) in self.ops.iter().enumerate() {
            let field = op.field();
            validate_path(field)?;

            if field == ID_FIELD || field.starts_with("_id.") {
                return Err(DocumentStoreError::invalid_operation(format!(
                    "the field '{}' is immutable",
                    ID_FIELD
                )));
            }

            if let UpdateOp::Inc(_, value) = op {
                if !matches!(value, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_)) {
                    return Err(DocumentStoreError::invalid_operation(format!(
                        "cannot increment '{}' by a non-numeric value",
                        field
                    )));
                }
            }

            if let Some(other) = self.ops[..index].iter().find(|other| paths_conflict(other.field(), field)) {
                return Err(DocumentStoreError::invalid_operation(format!(
                    "updating the path '{}' would create a conflict at '{}'",
                    field,
                    other.field()
                )));
            }
        }

        Ok(())
    }
}

fn paths_conflict(left: &str, right: &str) -> bool {
    let is_prefix = |short: &str, long: &str| {
        long.len() > short.len() && long.starts_with(short) && long.as_bytes()[short.len()] == b'.'
    };

    left == right || is_prefix(left, right) || is_prefix(right, left)
}

/// Helper struct for constructing updates.
pub struct Updates;

impl Updates {
    /// Overwrites `field` with `value`.
    pub fn set(field: impl Into<String>, value: impl Into<Bson>) -> Update {
        Update::new(vec![UpdateOp::Set(field.into(), value.into())])
    }

    /// Removes `field`.
    pub fn unset(field: impl Into<String>) -> Update {
        Update::new(vec![UpdateOp::Unset(field.into())])
    }

    /// Adds `amount` to the numeric `field`.
    pub fn inc(field: impl Into<String>, amount: impl Into<Bson>) -> Update {
        Update::new(vec![UpdateOp::Inc(field.into(), amount.into())])
    }

    /// Adds `value` to the array `field` unless already present.
    pub fn add_to_set(field: impl Into<String>, value: impl Into<Bson>) -> Update {
        Update::new(vec![UpdateOp::AddToSet(field.into(), value.into())])
    }

    /// Concatenates several updates into one.
    pub fn combine(updates: impl IntoIterator<Item = Update>) -> Update {
        updates
            .into_iter()
            .fold(Update::default(), Update::and)
    }
}

/// Which of the matching documents an update touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateScope {
    /// The first match in collection order.
    One,
    /// Every match.
    Many,
}

pub trait UpdateVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_set(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error>;
    fn visit_unset(&mut self, field: &str) -> Result<Self::Output, Self::Error>;
    fn visit_inc(&mut self, field: &str, amount: &Bson) -> Result<Self::Output, Self::Error>;
    fn visit_add_to_set(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error>;

    fn visit_op(&mut self, op: &UpdateOp) -> Result<Self::Output, Self::Error> {
        match op {
            UpdateOp::Set(field, value) => self.visit_set(field, value),
            UpdateOp::Unset(field) => self.visit_unset(field),
            UpdateOp::Inc(field, amount) => self.visit_inc(field, amount),
            UpdateOp::AddToSet(field, value) => self.visit_add_to_set(field, value),
        }
    }
}
