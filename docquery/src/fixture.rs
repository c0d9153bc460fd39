//! JSON fixtures for harness scenarios.
//!
//! A fixture is one document stored as `<dir>/<name>.json`. Integers that fit
//! in 32 bits load as `Int32`, the way MongoDB's relaxed extended JSON reads
//! them; everything else keeps its natural BSON type.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use bson::{Bson, Document};
use tracing::debug;

use docquery_core::error::{DocumentStoreError, DocumentStoreResult};

/// The product catalog, in insertion order.
pub const DEFAULT_FIXTURES: [&str; 6] = [
    "klavier",
    "weihnachtsliederbuch",
    "geige",
    "stimmgeraet",
    "guitar",
    "trompete",
];

/// The `fixtures/` directory shipped with this crate.
pub fn default_fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Loads the fixture `name` from `dir`.
///
/// # Errors
///
/// - [`DocumentStoreError::NotFound`] if the file does not exist
/// - [`DocumentStoreError::Serialization`] if it is not valid JSON
/// - [`DocumentStoreError::InvalidDocument`] if the JSON root is not an object
pub fn load_fixture(dir: &Path, name: &str) -> DocumentStoreResult<Document> {
    let path = dir.join(format!("{}.json", name));
    let text = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DocumentStoreError::NotFound(format!("fixture {}", path.display())),
        _ => DocumentStoreError::Initialization(format!("cannot read fixture {}: {}", path.display(), e)),
    })?;

    // Parsing straight into Bson keeps the file's field order
    let value = serde_json::from_str::<Bson>(&text)?;

    match narrow_integers(value) {
        Bson::Document(document) => {
            debug!(fixture = name, fields = document.len(), "loaded fixture");
            Ok(document)
        },
        other => Err(DocumentStoreError::InvalidDocument(format!(
            "fixture {} must be a JSON object, found {:?}",
            path.display(),
            other.element_type()
        ))),
    }
}

/// Loads fixtures in the given order.
pub fn load_fixtures<S: AsRef<str>>(dir: &Path, names: &[S]) -> DocumentStoreResult<Vec<Document>> {
    names
        .iter()
        .map(|name| load_fixture(dir, name.as_ref()))
        .collect()
}

fn narrow_integers(value: Bson) -> Bson {
    match value {
        Bson::Int64(number) => i32::try_from(number)
            .map(Bson::Int32)
            .unwrap_or(Bson::Int64(number)),
        Bson::Array(items) => Bson::Array(items.into_iter().map(narrow_integers).collect()),
        Bson::Document(document) => Bson::Document(
            document
                .into_iter()
                .map(|(key, value)| (key, narrow_integers(value)))
                .collect(),
        ),
        other => other,
    }
}
