//! Convenient re-exports of commonly used types from docquery.
//!
//! ```ignore
//! use docquery::prelude::*;
//! ```
//!
//! This provides access to:
//! - Stores, collections and backend traits
//! - Query, filter and update construction
//! - Operation results and error types
//! - The scenario harness and its configuration

pub use docquery_core::{
    collection::Collection,
    store::DocumentStore,
    document::{DocumentPath, IdStrategy},
    backend::{StoreBackend, DynStoreBackend, StoreBackendBuilder},
    query::{Query, QueryVisitor, Expr, Sort, SortDirection, FieldOp, QueryBuilder, Filter, Projection},
    update::{Update, UpdateOp, UpdateScope, UpdateVisitor, Updates},
    results::{InsertManyResult, InsertOneResult, UpdateResult},
    error::{DocumentStoreError, DocumentStoreResult},
};

pub use crate::{
    config::{BackendConfig, HarnessConfig},
    harness::{DynDocumentStore, Harness},
};
