//! Projection of in-memory query results.

use bson::{Bson, Document};

use docquery_core::{
    document::{DocumentPath, ID_FIELD},
    query::Projection,
};


/// Reshapes `document` according to `projection`.
///
/// Inclusion keeps the document's own field order. Dotted paths keep the
/// named sub-fields of nested documents.
pub(crate) fn project(document: Document, projection: &Projection) -> Document {
    match projection {
        Projection::Include { fields, exclude_id } => {
            let mut paths = fields
                .iter()
                .map(String::as_str)
                .filter(|field| !(*exclude_id && *field == ID_FIELD))
                .collect::<Vec<_>>();

            if !*exclude_id && !paths.contains(&ID_FIELD) {
                paths.push(ID_FIELD);
            }

            include(&document, &paths)
        },
        Projection::Exclude(fields) => {
            let mut document = document;

            for field in fields {
                document.remove_path(field);
            }

            document
        },
    }
}

fn include(document: &Document, paths: &[&str]) -> Document {
    let mut projected = Document::new();

    for (key, value) in document {
        if paths.contains(&key.as_str()) {
            projected.insert(key, value.clone());
            continue;
        }

        let nested = paths
            .iter()
            .filter_map(|path| path.strip_prefix(key.as_str())?.strip_prefix('.'))
            .collect::<Vec<_>>();

        if nested.is_empty() {
            continue;
        }

        if let Bson::Document(child) = value {
            projected.insert(key, include(child, &nested));
        }
    }

    projected
}
