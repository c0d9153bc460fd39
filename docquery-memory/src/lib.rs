//! In-memory document storage backend for docquery.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It evaluates filters, sorts, projections and updates itself, and serves as the
//! reference engine the harness runs against when no database is configured.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Insertion order** - Unsorted queries return documents in the order they were inserted
//! - **Full query support** - Dotted paths, array matching, stable sorting, skip, limit and projection
//! - **Update operators** - `set`, `unset`, `inc` and `add_to_set` with matched/modified counts
//!
//! # Quick Start
//!
//! ```ignore
//! use docquery::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let store = DocumentStore::new(backend);
//!     let products = store.collection("produkte");
//!
//!     products.insert_one(doc! { "_id": "Klavier", "preis": 3000 }).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod store;
mod evaluator;
mod projection;
mod updater;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
