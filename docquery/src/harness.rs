//! Scenario lifecycle around a live store.
//!
//! [`Harness::start`] acquires the engine once. Every [`Harness::run`] starts
//! from an empty collection, inserts the configured fixtures, runs the
//! scenario and drops the collection again. The drop happens on every exit
//! path: when setup fails, when the scenario returns an error, and when it
//! panics (the panic is resumed after teardown).
//!
//! # Example
//!
//! ```ignore
//! use docquery::prelude::*;
//!
//! let harness = Harness::start(HarnessConfig::from_env()?).await?;
//!
//! let jazz = harness
//!     .run(|products| async move {
//!         products.count_documents(Some(Filter::eq("schlagworte", "jazz"))).await
//!     })
//!     .await?;
//! assert_eq!(jazz, 2);
//!
//! harness.shutdown().await?;
//! ```

use std::{future::Future, panic::AssertUnwindSafe};

use futures::FutureExt;
use tracing::{debug, info, warn};

use docquery_core::{
    backend::{DynStoreBackend, StoreBackendBuilder},
    collection::Collection,
    error::DocumentStoreResult,
    store::DocumentStore,
};
use docquery_memory::InMemoryStore;

use crate::{
    config::{BackendConfig, HarnessConfig},
    fixture::load_fixtures,
};

/// A store whose backend was chosen from configuration.
pub type DynDocumentStore = DocumentStore<Box<dyn DynStoreBackend>>;

/// Owns the engine connection for a series of scenarios.
///
/// [`Harness::shutdown`] releases the engine explicitly. When a scenario
/// panic unwinds past the caller, dropping the `Harness` releases it as well:
/// the in-memory store is freed and the MongoDB client closes its pool and
/// monitors once its last handle is dropped. The collection has already been
/// dropped by then.
pub struct Harness {
    config: HarnessConfig,
    store: DynDocumentStore,
}

impl Harness {
    /// Connects to the configured backend and checks that it answers.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::Initialization`](crate::error::DocumentStoreError::Initialization) if the backend cannot be constructed
    /// - [`DocumentStoreError::NotFound`](crate::error::DocumentStoreError::NotFound) if the engine is unreachable
    pub async fn start(config: HarnessConfig) -> DocumentStoreResult<Self> {
        let store = connect(&config).await?;

        store.ping().await?;

        info!(
            backend = ?config.backend,
            database = %config.database,
            collection = %config.collection,
            "harness started"
        );

        Ok(Self { config, store })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn store(&self) -> &DynDocumentStore {
        &self.store
    }

    /// The collection scenarios run against.
    pub fn collection(&self) -> Collection<'_, Box<dyn DynStoreBackend>> {
        self.store.collection(&self.config.collection)
    }

    /// Runs one scenario between fixture setup and collection teardown.
    ///
    /// The scenario's own error wins over a teardown error; a failed teardown
    /// after a successful scenario is returned as the result. A panic is
    /// resumed after teardown, leaving the harness intact for
    /// [`Harness::shutdown`] or drop.
    pub async fn run<'a, F, Fut, T>(&'a self, scenario: F) -> DocumentStoreResult<T>
    where
        F: FnOnce(Collection<'a, Box<dyn DynStoreBackend>>) -> Fut,
        Fut: Future<Output = DocumentStoreResult<T>> + 'a,
    {
        let collection = self.collection();

        let outcome = AssertUnwindSafe(async {
            self.setup(&collection).await?;
            scenario(collection.clone()).await
        })
        .catch_unwind()
        .await;

        let teardown = collection.drop().await;

        if let Err(error) = &teardown {
            warn!(collection = %self.config.collection, %error, "teardown failed");
        }

        match outcome {
            Err(panic) => std::panic::resume_unwind(panic),
            Ok(result) => {
                let value = result?;
                teardown?;
                Ok(value)
            },
        }
    }

    /// Releases the engine.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.store.shutdown().await?;

        info!("harness shut down");

        Ok(())
    }

    async fn setup(&self, collection: &Collection<'_, Box<dyn DynStoreBackend>>) -> DocumentStoreResult<()> {
        collection.drop().await?;

        let fixtures = load_fixtures(&self.config.fixture_dir, &self.config.fixtures)?;

        if !fixtures.is_empty() {
            collection.insert_many(fixtures).await?;
        }

        debug!(collection = %self.config.collection, fixtures = self.config.fixtures.len(), "fixtures inserted");

        Ok(())
    }
}

async fn connect(config: &HarnessConfig) -> DocumentStoreResult<DynDocumentStore> {
    match &config.backend {
        BackendConfig::Memory => Ok(DocumentStore::new(InMemoryStore::builder().build().await?).into_dyn()),
        #[cfg(feature = "mongodb")]
        BackendConfig::MongoDb { uri } => Ok(
            DocumentStore::new(
                docquery_mongodb::MongoDbStore::builder(uri, &config.database)
                    .build()
                    .await?,
            )
            .into_dyn(),
        ),
        #[cfg(not(feature = "mongodb"))]
        BackendConfig::MongoDb { .. } => Err(docquery_core::error::DocumentStoreError::Initialization(
            "docquery was built without the mongodb feature".to_string(),
        )),
    }
}
