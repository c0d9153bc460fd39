//! Main docquery crate: a query and update harness for document stores.
//!
//! This crate is the entry point for running document query scenarios. It
//! re-exports the core types, provides access to the storage backends, loads
//! JSON fixtures and runs scenarios with guaranteed setup and teardown.
//!
//! # Features
//!
//! - **Composable filters** - `eq`, `gt`, `any_of`, `exists`, `and`, `or` and more over dotted paths
//! - **Queries** - Stable sorting, skip, limit and projection
//! - **Updates** - `set`, `unset`, `inc` and `add_to_set` with matched/modified counts
//! - **Multiple backends** - An in-memory engine, and MongoDB behind the `mongodb` feature
//! - **Scenario harness** - Fixtures inserted before and the collection dropped after every scenario
//!
//! # Quick Start
//!
//! ```ignore
//! use docquery::{prelude::*, memory::InMemoryStore};
//! use docquery::bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!     let products = store.collection("produkte");
//!
//!     products.insert_one(doc! { "_id": "Klavier", "preis": 3000 }).await?;
//!
//!     let expensive = products
//!         .find(
//!             Query::builder()
//!                 .filter(Filter::gt("preis", 100))
//!                 .sort("preis", SortDirection::Desc)
//!                 .limit(2)
//!                 .build(),
//!         )
//!         .await?;
//!
//!     store.shutdown().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Harness
//!
//! ```ignore
//! use docquery::prelude::*;
//!
//! let harness = Harness::start(HarnessConfig::from_env()?).await?;
//!
//! let result = harness
//!     .run(|products| async move {
//!         products
//!             .update_many(Filter::exists("seiten"), Updates::add_to_set("schlagworte", "buch"))
//!             .await
//!     })
//!     .await?;
//!
//! harness.shutdown().await?;
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory engine, the default
//! - `mongodb` - MongoDB backend (requires the `mongodb` feature)

pub mod config;
pub mod fixture;
pub mod harness;
pub mod prelude;

pub use docquery_core::{backend, collection, document, error, query, results, store, update};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docquery_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docquery_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
