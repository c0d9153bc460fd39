//! Storage backend abstraction for the document store.
//!
//! The [`StoreBackend`] trait provides a unified async interface over the storage
//! operations the harness needs: insertion, querying, counting, updating and
//! dropping collections. Implementations are thread-safe (`Send + Sync`).
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`DynStoreBackend`]: A trait for dynamic dispatch over backend implementations
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! Backends receive requests that the [`Collection`](crate::collection::Collection)
//! layer has already validated, with every document carrying its `_id`.

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::{
    error::DocumentStoreResult,
    query::{Expr, Query},
    results::UpdateResult,
    update::{Update, UpdateScope},
};

/// Abstract interface for document storage backends.
///
/// # Error Handling
///
/// Operations return [`DocumentStoreResult<T>`](crate::error::DocumentStoreResult).
/// Inserting a document whose `_id` already exists must fail with
/// [`DocumentStoreError::DuplicateKey`](crate::error::DocumentStoreError::DuplicateKey).
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts documents into a collection in order, creating the collection if needed.
    ///
    /// Insertion stops at the first document whose `_id` already exists. Documents
    /// inserted before the failure stay in the collection.
    ///
    /// # Arguments
    ///
    /// * `documents` - Documents that already carry an `_id`
    /// * `collection` - The name of the collection to insert into
    async fn insert_documents(
        &self,
        documents: Vec<Document>,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Queries documents in a collection.
    ///
    /// Filters, sorts (stably), skips, limits and finally projects. A missing
    /// collection yields an empty result.
    ///
    /// # Arguments
    ///
    /// * `query` - The [`Query`] to run
    /// * `collection` - The name of the collection to query
    async fn find_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Document>>;

    /// Counts the documents matching `filter`, or all documents if `None`.
    async fn count_documents(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> DocumentStoreResult<u64>;

    /// Applies `update` to the first (`UpdateScope::One`) or every
    /// (`UpdateScope::Many`) document matching `filter`.
    ///
    /// # Returns
    ///
    /// The number of matched documents and the number of documents whose
    /// content actually changed.
    async fn update_documents(
        &self,
        filter: Expr,
        update: Update,
        scope: UpdateScope,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult>;

    /// Removes every document of a collection. Dropping a missing collection is not an error.
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;

    /// Lists the names of all collections in the store.
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;

    /// Checks that the backend is reachable.
    ///
    /// The default implementation always succeeds.
    async fn ping(&self) -> DocumentStoreResult<()> {
        Ok(())
    }

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op, but backends with external
    /// connections should override this.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn insert_documents(
        &self,
        documents: Vec<Document>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        <B as StoreBackend>::insert_documents(*self, documents, collection)
            .await
    }

    async fn find_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Document>> {
        <B as StoreBackend>::find_documents(*self, query, collection)
            .await
    }

    async fn count_documents(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> DocumentStoreResult<u64> {
        <B as StoreBackend>::count_documents(*self, filter, collection)
            .await
    }

    async fn update_documents(
        &self,
        filter: Expr,
        update: Update,
        scope: UpdateScope,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        <B as StoreBackend>::update_documents(*self, filter, update, scope, collection)
            .await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        <B as StoreBackend>::drop_collection(*self, name).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        <B as StoreBackend>::list_collections(*self).await
    }

    async fn ping(&self) -> DocumentStoreResult<()> {
        <B as StoreBackend>::ping(*self).await
    }
}

#[async_trait]
pub trait DynStoreBackend: Send + Sync + Debug {
    async fn insert_documents(
        &self,
        documents: Vec<Document>,
        collection: &str,
    ) -> DocumentStoreResult<()>;
    async fn find_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Document>>;
    async fn count_documents(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> DocumentStoreResult<u64>;
    async fn update_documents(
        &self,
        filter: Expr,
        update: Update,
        scope: UpdateScope,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult>;
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;
    async fn ping(&self) -> DocumentStoreResult<()>;
    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()>;
}

#[async_trait]
impl<B: StoreBackend + Send + Sync + 'static> DynStoreBackend for B {
    async fn insert_documents(
        &self,
        documents: Vec<Document>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        StoreBackend::insert_documents(self, documents, collection).await
    }

    async fn find_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Document>> {
        StoreBackend::find_documents(self, query, collection).await
    }

    async fn count_documents(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> DocumentStoreResult<u64> {
        StoreBackend::count_documents(self, filter, collection).await
    }

    async fn update_documents(
        &self,
        filter: Expr,
        update: Update,
        scope: UpdateScope,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        StoreBackend::update_documents(self, filter, update, scope, collection).await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        StoreBackend::drop_collection(self, name).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        StoreBackend::list_collections(self).await
    }

    async fn ping(&self) -> DocumentStoreResult<()> {
        StoreBackend::ping(self).await
    }

    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()> {
        StoreBackend::shutdown(*self).await
    }
}

/// A backend chosen at runtime can be used wherever a [`StoreBackend`] is expected.
#[async_trait]
impl StoreBackend for Box<dyn DynStoreBackend> {
    async fn insert_documents(
        &self,
        documents: Vec<Document>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        <dyn DynStoreBackend as DynStoreBackend>::insert_documents(&**self, documents, collection)
            .await
    }

    async fn find_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Document>> {
        <dyn DynStoreBackend as DynStoreBackend>::find_documents(&**self, query, collection)
            .await
    }

    async fn count_documents(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> DocumentStoreResult<u64> {
        <dyn DynStoreBackend as DynStoreBackend>::count_documents(&**self, filter, collection)
            .await
    }

    async fn update_documents(
        &self,
        filter: Expr,
        update: Update,
        scope: UpdateScope,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        <dyn DynStoreBackend as DynStoreBackend>::update_documents(&**self, filter, update, scope, collection)
            .await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        <dyn DynStoreBackend as DynStoreBackend>::drop_collection(&**self, name).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        <dyn DynStoreBackend as DynStoreBackend>::list_collections(&**self).await
    }

    async fn ping(&self) -> DocumentStoreResult<()> {
        <dyn DynStoreBackend as DynStoreBackend>::ping(&**self).await
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        <dyn DynStoreBackend as DynStoreBackend>::shutdown_boxed(self).await
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
