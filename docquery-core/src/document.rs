//! Helpers for working with BSON documents stored in a collection.
//!
//! Documents are plain [`bson::Document`] values. This module adds what the
//! collection layer needs on top of them: dotted path access (`hersteller.name`),
//! `_id` resolution at insert time and a canonical key for `_id` comparison.

use bson::{Bson, Document};
use uuid::Uuid;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Name of the identity field every stored document carries.
pub const ID_FIELD: &str = "_id";

/// How a collection derives the `_id` of a document inserted without one.
///
/// # Example
///
/// ```ignore
/// use docquery::document::IdStrategy;
///
/// // Products are identified by their name
/// let products = store
///     .collection("produkte")
///     .with_id_strategy(IdStrategy::from_field("name"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// Generate a fresh UUID string.
    #[default]
    Generate,
    /// Copy the value of the named field, falling back to a fresh UUID string
    /// when the field is absent as well.
    FromField(String),
}

impl IdStrategy {
    /// Creates a strategy that derives the `_id` from the given field.
    pub fn from_field(field: impl Into<String>) -> Self {
        IdStrategy::FromField(field.into())
    }

    /// Ensures `document` carries an `_id` and returns it.
    ///
    /// An explicit `_id` always wins. A derived `_id` is placed at the front
    /// of the document.
    pub fn resolve(&self, document: &mut Document) -> Bson {
        if let Some(id) = document.get(ID_FIELD) {
            return id.clone();
        }

        let id = match self {
            IdStrategy::FromField(field) => document
                .lookup_path(field)
                .cloned()
                .unwrap_or_else(generate_id),
            IdStrategy::Generate => generate_id(),
        };

        let mut resolved = Document::new();
        resolved.insert(ID_FIELD, id.clone());
        for (key, value) in std::mem::take(document) {
            resolved.insert(key, value);
        }
        *document = resolved;

        id
    }
}

fn generate_id() -> Bson {
    Bson::String(Uuid::new_v4().to_string())
}

/// Returns the canonical key used to compare `_id` values.
///
/// Numbers are normalized so that `Int32(5)`, `Int64(5)`, `Double(5.0)` and
/// `Decimal128("5")` produce the same key. Integers are keyed exactly.
pub fn id_key(id: &Bson) -> String {
    match id {
        Bson::Int32(value) => format!("num:i:{}", value),
        Bson::Int64(value) => format!("num:i:{}", value),
        Bson::Double(value) => float_key(*value),
        Bson::Decimal128(value) => match value.to_string().parse::<f64>() {
            Ok(value) => float_key(value),
            Err(_) => format!("bson:{}", id),
        },
        Bson::String(value) => format!("str:{}", value),
        other => format!("bson:{}", other),
    }
}

fn float_key(value: f64) -> String {
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

    if value.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&value) {
        format!("num:i:{}", value as i64)
    } else {
        format!("num:f:{}", value)
    }
}

/// Dotted path access on documents.
///
/// A path is a sequence of segments separated by dots. A segment addresses a
/// field of a nested document, or an element of an array when it is numeric.
pub trait DocumentPath {
    /// Resolves `path`, returning `None` if any segment is missing.
    fn lookup_path(&self, path: &str) -> Option<&Bson>;

    /// Writes `value` at `path` and returns the previous value.
    ///
    /// Missing intermediate documents are created. Traversing through a value
    /// that is neither a document nor an array (or an array index that is out of
    /// bounds) is an [`DocumentStoreError::InvalidOperation`].
    fn set_path(&mut self, path: &str, value: Bson) -> DocumentStoreResult<Option<Bson>>;

    /// Removes the value at `path` and returns it.
    fn remove_path(&mut self, path: &str) -> Option<Bson>;
}

impl DocumentPath for Document {
    fn lookup_path(&self, path: &str) -> Option<&Bson> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;

        for segment in segments {
            current = match current {
                Bson::Document(doc) => doc.get(segment)?,
                Bson::Array(array) => array.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        Some(current)
    }

    fn set_path(&mut self, path: &str, value: Bson) -> DocumentStoreResult<Option<Bson>> {
        match path.split_once('.') {
            None => Ok(self.insert(path, value)),
            Some((head, rest)) => {
                if !self.contains_key(head) {
                    self.insert(head, Document::new());
                }

                match self.get_mut(head) {
                    Some(child) => set_in_value(child, path, rest, value),
                    None => Err(DocumentStoreError::invalid_operation(format!(
                        "cannot create field '{}'",
                        head
                    ))),
                }
            }
        }
    }

    fn remove_path(&mut self, path: &str) -> Option<Bson> {
        match path.split_once('.') {
            None => self.remove(path),
            Some((head, rest)) => match self.get_mut(head)? {
                Bson::Document(doc) => doc.remove_path(rest),
                Bson::Array(array) => {
                    // Array elements are nulled, not shifted, to keep sibling indexes stable.
                    let (index, rest) = match rest.split_once('.') {
                        Some((index, rest)) => (index, Some(rest)),
                        None => (rest, None),
                    };
                    let element = array.get_mut(index.parse::<usize>().ok()?)?;
                    match rest {
                        Some(rest) => element.as_document_mut()?.remove_path(rest),
                        None => Some(std::mem::replace(element, Bson::Null)),
                    }
                }
                _ => None,
            },
        }
    }
}

fn set_in_value(
    target: &mut Bson,
    full_path: &str,
    rest: &str,
    value: Bson,
) -> DocumentStoreResult<Option<Bson>> {
    match target {
        Bson::Document(doc) => doc.set_path(rest, value),
        Bson::Array(array) => {
            let (index, tail) = match rest.split_once('.') {
                Some((index, tail)) => (index, Some(tail)),
                None => (rest, None),
            };
            let element = index
                .parse::<usize>()
                .ok()
                .and_then(|index| array.get_mut(index))
                .ok_or_else(|| {
                    DocumentStoreError::invalid_operation(format!(
                        "cannot address array element '{}' in path '{}'",
                        index, full_path
                    ))
                })?;

            match tail {
                Some(tail) => set_in_value(element, full_path, tail, value),
                None => Ok(Some(std::mem::replace(element, value))),
            }
        }
        other => Err(DocumentStoreError::invalid_operation(format!(
            "cannot create field in path '{}': element has type {:?}",
            full_path,
            other.element_type()
        ))),
    }
}
