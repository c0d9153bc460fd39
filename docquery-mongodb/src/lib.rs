//! MongoDB backend implementation for docquery.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait.
//! Filters, projections and updates are translated into MongoDB's query language
//! and executed by the server.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docquery = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! The builder takes a connection string and a database name. Building pings
//! the server, so an unreachable server fails early with `NotFound`.
//!
//! # Example
//!
//! ```ignore
//! use docquery::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStore::builder("mongodb://localhost:27017", "onlinemusicshop")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod store;
mod query;
mod update;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
