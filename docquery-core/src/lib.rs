//! Core of the docquery document query and update harness.
//!
//! This crate provides everything a backend needs to agree on:
//!
//! - **Document helpers** ([`document`]) - Dotted path access and `_id` resolution on BSON documents
//! - **Query and filtering API** ([`query`]) - Filter expressions, projection, sorting and limits
//! - **Update API** ([`update`]) - Field update operators such as `set` and `add_to_set`
//! - **Operation results** ([`results`]) - Insert and update acknowledgements
//! - **Store backend abstraction** ([`backend`]) - Traits implemented by the in-memory and MongoDB backends
//! - **Collections interface** ([`collection`]) - The operation surface for a single named collection
//! - **Document store** ([`store`]) - Entry point that hands out collections
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use docquery::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let products = store.collection("produkte");
//!
//! products.insert_one(doc! { "_id": "Klavier", "preis": 3000 }).await?;
//!
//! let expensive = products
//!     .find(Query::builder().filter(Filter::gt("preis", 100)).build())
//!     .await?;
//! ```

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod query;
pub mod results;
pub mod store;
pub mod update;
