//! In-memory storage implementation for document stores.
//!
//! Documents are kept as BSON in per-collection [`IndexMap`]s keyed by their
//! normalized `_id`, so scans see documents in insertion order.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use indexmap::IndexMap;
use mea::rwlock::RwLock;
use bson::Document;
use tracing::{debug, trace};

use docquery_core::{
    document::{DocumentPath, IdStrategy, ID_FIELD, id_key},
    query::{Expr, Query, SortDirection},
    results::UpdateResult,
    update::{Update, UpdateScope},
    error::{DocumentStoreError, DocumentStoreResult},
    backend::{StoreBackend, StoreBackendBuilder},
};

use crate::{
    evaluator::{DocumentEvaluator, sort_cmp},
    projection::project,
    updater::DocumentUpdater,
};

type CollectionMap = IndexMap<String, Document>;
type StoreMap = HashMap<String, CollectionMap>;


/// Thread-safe in-memory document storage backend.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Performance
///
/// Queries and updates scan every document of a collection; there are no indexes.
///
/// # Example
///
/// ```ignore
/// use docquery_memory::InMemoryStore;
/// use docquery_core::{backend::StoreBackend, query::Query};
/// use bson::doc;
///
/// let store = InMemoryStore::new();
///
/// store.insert_documents(vec![doc! { "_id": "Klavier", "preis": 3000 }], "produkte").await?;
///
/// let docs = store.find_documents(Query::new(), "produkte").await?;
/// assert_eq!(docs.len(), 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection name -> (normalized `_id` -> document)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`, optionally seeded
    /// with documents.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use docquery_memory::InMemoryStore;
    ///
    /// let store = InMemoryStore::builder()
    ///     .with_documents("produkte", vec![doc! { "_id": "Geige" }])
    ///     .build()
    ///     .await?;
    /// ```
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

fn insert_into(
    collection_map: &mut CollectionMap,
    documents: Vec<Document>,
    collection: &str,
) -> DocumentStoreResult<()> {
    for document in documents {
        let id = document
            .get(ID_FIELD)
            .ok_or_else(|| DocumentStoreError::InvalidDocument(format!(
                "document without {} cannot be stored in {}",
                ID_FIELD, collection
            )))?;
        let key = id_key(id);

        if collection_map.contains_key(&key) {
            return Err(DocumentStoreError::DuplicateKey(id.to_string(), collection.to_string()));
        }

        trace!(collection, key = %key, "storing document");
        collection_map.insert(key, document);
    }

    Ok(())
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_documents(&self, documents: Vec<Document>, collection: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        insert_into(collection_map, documents, collection)
    }

    async fn find_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        let mut matched = DocumentEvaluator::filter_documents(
            collection_map.values(),
            query.filter.as_ref(),
        )?;

        // Vec::sort_by is stable, ties keep insertion order
        if let Some(sort) = &query.sort {
            matched.sort_by(|a, b| {
                let left = a.lookup_path(&sort.field);
                let right = b.lookup_path(&sort.field);

                match sort.direction {
                    SortDirection::Asc => sort_cmp(left, right),
                    SortDirection::Desc => sort_cmp(right, left),
                }
            });
        }

        let documents = matched
            .into_iter()
            .skip(query.skip.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .map(|document| match &query.projection {
                Some(projection) => project(document, projection),
                None => document,
            })
            .collect::<Vec<_>>();

        debug!(collection, count = documents.len(), "evaluated query");

        Ok(documents)
    }

    async fn count_documents(&self, filter: Option<Expr>, collection: &str) -> DocumentStoreResult<u64> {
        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(0),
        };

        let matched = DocumentEvaluator::filter_documents(collection_map.values(), filter.as_ref())?;

        Ok(matched.len() as u64)
    }

    async fn update_documents(
        &self,
        filter: Expr,
        update: Update,
        scope: UpdateScope,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        let mut store = self.store.write().await;
        let collection_map = match store.get_mut(collection) {
            Some(col) => col,
            None => return Ok(UpdateResult::default()),
        };

        let mut result = UpdateResult::default();

        for document in collection_map.values_mut() {
            if !DocumentEvaluator::matches(document, Some(&filter))? {
                continue;
            }

            result.matched_count += 1;

            if DocumentUpdater::apply(document, &update)? {
                result.modified_count += 1;
            }

            if matches!(scope, UpdateScope::One) {
                break;
            }
        }

        Ok(result)
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        // The collection stays known after a drop, only its documents go
        if let Some(collection_map) = self.store.write().await.get_mut(name) {
            collection_map.clear();
        }

        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        let mut names = self.store
            .read()
            .await
            .keys()
            .cloned()
            .collect::<Vec<_>>();

        names.sort();

        Ok(names)
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// Seeded documents without `_id` get a generated one. Building fails with
/// [`DocumentStoreError::DuplicateKey`] if two seeded documents share an `_id`.
///
/// # Example
///
/// ```ignore
/// use docquery_memory::InMemoryStore;
/// use docquery_core::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStoreBuilder {
    seed: Vec<(String, Vec<Document>)>,
}

impl InMemoryStoreBuilder {
    /// Adds documents to be present in `collection` once the store is built.
    pub fn with_documents(mut self, collection: impl Into<String>, documents: Vec<Document>) -> Self {
        self.seed.push((collection.into(), documents));
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let backend = InMemoryStore::new();

        {
            let mut store = backend.store.write().await;
            let id_strategy = IdStrategy::default();

            for (collection, documents) in self.seed {
                let documents = documents
                    .into_iter()
                    .map(|mut document| {
                        id_strategy.resolve(&mut document);
                        document
                    })
                    .collect::<Vec<_>>();

                let collection_map = store.entry(collection.clone()).or_default();
                insert_into(collection_map, documents, &collection)?;
            }
        }

        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docquery_core::{query::Filter, update::Updates};

    #[tokio::test]
    async fn numeric_ids_collide_across_representations() {
        let store = InMemoryStore::new();

        store.insert_documents(vec![doc! { "_id": 1 }], "produkte").await.unwrap();
        let result = store.insert_documents(vec![doc! { "_id": 1.0 }], "produkte").await;

        assert!(matches!(result, Err(DocumentStoreError::DuplicateKey(_, _))));
    }

    #[tokio::test]
    async fn document_without_id_is_rejected() {
        let store = InMemoryStore::new();

        let result = store.insert_documents(vec![doc! { "preis": 1 }], "produkte").await;

        assert!(matches!(result, Err(DocumentStoreError::InvalidDocument(_))));
    }

    #[tokio::test]
    async fn update_one_stops_at_first_match() {
        let store = InMemoryStore::new();
        store
            .insert_documents(
                vec![doc! { "_id": "a", "preis": 1 }, doc! { "_id": "b", "preis": 1 }],
                "produkte",
            )
            .await
            .unwrap();

        let result = store
            .update_documents(Filter::eq("preis", 1), Updates::set("preis", 2), UpdateScope::One, "produkte")
            .await
            .unwrap();

        assert_eq!(result, UpdateResult::new(1, 1));
        assert_eq!(store.count_documents(Some(Filter::eq("preis", 2)), "produkte").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_collection_reads_empty() {
        let store = InMemoryStore::new();

        assert!(store.find_documents(Query::new(), "leer").await.unwrap().is_empty());
        assert_eq!(store.count_documents(None, "leer").await.unwrap(), 0);
        assert_eq!(
            store
                .update_documents(Filter::exists("_id"), Updates::set("a", 1), UpdateScope::Many, "leer")
                .await
                .unwrap(),
            UpdateResult::default()
        );
        store.drop_collection("leer").await.unwrap();
        assert!(store.list_collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn builder_seeds_collections() {
        let store = InMemoryStore::builder()
            .with_documents("produkte", vec![doc! { "_id": "Geige" }, doc! { "preis": 5 }])
            .build()
            .await
            .unwrap();

        assert_eq!(store.count_documents(None, "produkte").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn builder_rejects_duplicate_seed() {
        let result = InMemoryStore::builder()
            .with_documents("produkte", vec![doc! { "_id": "Geige" }, doc! { "_id": "Geige" }])
            .build()
            .await;

        assert!(matches!(result, Err(DocumentStoreError::DuplicateKey(_, _))));
    }
}
