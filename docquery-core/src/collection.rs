//! The operation surface for a single named collection.
//!
//! A [`Collection`] borrows its backend from a [`DocumentStore`](crate::store::DocumentStore).
//! It resolves `_id`s and validates filters and updates before delegating to
//! the backend, so every backend sees the same well-formed requests.
//!
//! # Example
//!
//! ```ignore
//! use docquery::prelude::*;
//! use bson::doc;
//!
//! let products = store.collection("produkte");
//!
//! let inserted = products
//!     .insert_one(doc! { "_id": "New York Jazz Lounge", "kategorie": "Musik" })
//!     .await?;
//! assert!(inserted.acknowledged);
//!
//! let result = products
//!     .update_many(Filter::exists("seiten"), Updates::add_to_set("schlagworte", "buch"))
//!     .await?;
//! ```

use bson::Document;
use tracing::debug;

use crate::{
    backend::StoreBackend,
    document::IdStrategy,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, Query},
    results::{InsertManyResult, InsertOneResult, UpdateResult},
    update::{Update, UpdateScope},
};

/// A handle to one collection of a backend.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend reference
/// * `B` - The storage backend type
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
    id_strategy: IdStrategy,
}

impl<'a, B: StoreBackend> Clone for Collection<'a, B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            backend: self.backend,
            id_strategy: self.id_strategy.clone(),
        }
    }
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    /// Creates a new collection reference (internal use).
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend, id_strategy: IdStrategy::default() }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns how documents inserted without `_id` get one.
    pub fn id_strategy(&self) -> &IdStrategy {
        &self.id_strategy
    }

    /// Replaces the `_id` strategy of this handle.
    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    /// Inserts a single document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DuplicateKey`] if the resolved `_id` is already taken.
    pub async fn insert_one(&self, mut document: Document) -> DocumentStoreResult<InsertOneResult> {
        let inserted_id = self.id_strategy.resolve(&mut document);

        self.backend
            .insert_documents(vec![document], &self.name)
            .await?;

        debug!(collection = %self.name, id = %inserted_id, "inserted document");

        Ok(InsertOneResult { inserted_id, acknowledged: true })
    }

    /// Inserts documents in order.
    ///
    /// Insertion stops at the first duplicate `_id`; documents inserted before it
    /// stay in the collection and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidOperation`] for an empty batch and
    /// [`DocumentStoreError::DuplicateKey`] on the first `_id` collision.
    pub async fn insert_many(&self, documents: Vec<Document>) -> DocumentStoreResult<InsertManyResult> {
        if documents.is_empty() {
            return Err(DocumentStoreError::invalid_operation("insert_many requires at least one document"));
        }

        let mut inserted_ids = Vec::with_capacity(documents.len());
        let documents = documents
            .into_iter()
            .map(|mut document| {
                inserted_ids.push(self.id_strategy.resolve(&mut document));
                document
            })
            .collect::<Vec<_>>();

        self.backend
            .insert_documents(documents, &self.name)
            .await?;

        debug!(collection = %self.name, count = inserted_ids.len(), "inserted documents");

        Ok(InsertManyResult { inserted_ids, acknowledged: true })
    }

    /// Runs a query and returns the materialized result.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidOperation`] for a malformed filter or projection.
    pub async fn find(&self, query: Query) -> DocumentStoreResult<Vec<Document>> {
        query.validate()?;

        let documents = self.backend
            .find_documents(query, &self.name)
            .await?;

        debug!(collection = %self.name, count = documents.len(), "found documents");

        Ok(documents)
    }

    /// Returns every document in insertion order.
    pub async fn find_all(&self) -> DocumentStoreResult<Vec<Document>> {
        self.find(Query::new()).await
    }

    /// Returns the first document matching `filter`, if any.
    pub async fn find_one(&self, filter: Expr) -> DocumentStoreResult<Option<Document>> {
        Ok(self
            .find(Query::builder().filter(filter).limit(1).build())
            .await?
            .into_iter()
            .next())
    }

    /// Counts documents matching `filter`, or every document when `None`.
    pub async fn count_documents(&self, filter: Option<Expr>) -> DocumentStoreResult<u64> {
        if let Some(filter) = &filter {
            filter.validate()?;
        }

        self.backend
            .count_documents(filter, &self.name)
            .await
    }

    /// Applies `update` to the first document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidOperation`] for a malformed filter or update,
    /// or if the update cannot be applied to the matched document.
    pub async fn update_one(&self, filter: Expr, update: Update) -> DocumentStoreResult<UpdateResult> {
        self.update(filter, update, UpdateScope::One).await
    }

    /// Applies `update` to every document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidOperation`] for a malformed filter or update,
    /// or if the update cannot be applied to a matched document.
    pub async fn update_many(&self, filter: Expr, update: Update) -> DocumentStoreResult<UpdateResult> {
        self.update(filter, update, UpdateScope::Many).await
    }

    async fn update(&self, filter: Expr, update: Update, scope: UpdateScope) -> DocumentStoreResult<UpdateResult> {
        filter.validate()?;
        update.validate()?;

        let result = self.backend
            .update_documents(filter, update, scope, &self.name)
            .await?;

        debug!(
            collection = %self.name,
            ?scope,
            matched = result.matched_count,
            modified = result.modified_count,
            "updated documents"
        );

        Ok(result)
    }

    /// Removes every document from the collection. Idempotent.
    pub async fn drop(&self) -> DocumentStoreResult<()> {
        self.backend
            .drop_collection(&self.name)
            .await?;

        debug!(collection = %self.name, "dropped collection");

        Ok(())
    }
}
