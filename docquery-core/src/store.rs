//! Main document store interface.
//!
//! [`DocumentStore`] owns a backend and hands out [`Collection`] handles by name.
//! A store whose backend is only known at runtime is a
//! `DocumentStore<Box<dyn DynStoreBackend>>`, see [`DocumentStore::into_dyn`].
//!
//! # Example
//!
//! ```ignore
//! use docquery::{prelude::*, memory::InMemoryStore};
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let products = store.collection("produkte");
//! ```

use tracing::info;

use crate::{
    backend::{self, StoreBackend},
    collection::Collection,
    error::DocumentStoreResult,
};

/// A document store bound to a specific backend implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns a reference to the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Gets a collection handle with the given name.
    ///
    /// Collections are created lazily by their first insert.
    pub fn collection<'a>(&'a self, name: &str) -> Collection<'a, B> {
        Collection::new(name.to_string(), &self.backend)
    }

    /// Lists all collections in the store.
    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_collections().await
    }

    /// Removes every document of the named collection.
    pub async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.backend.drop_collection(name).await
    }

    /// Checks that the backend is reachable.
    pub async fn ping(&self) -> DocumentStoreResult<()> {
        self.backend.ping().await
    }

    /// Shuts down the backend, consuming the store.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await?;

        info!("document store shut down");

        Ok(())
    }
}

impl<B: StoreBackend + 'static> DocumentStore<B> {
    /// Erases the backend type.
    pub fn into_dyn(self) -> DocumentStore<Box<dyn backend::DynStoreBackend>> {
        DocumentStore::new(Box::new(self.backend) as Box<dyn backend::DynStoreBackend>)
    }
}
