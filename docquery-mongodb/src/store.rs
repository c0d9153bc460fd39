use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document, Bson, doc};
use mongodb::{
    Client, Collection as MongoCollection,
    error::{Error as MongoError, ErrorKind, InsertManyError, WriteFailure},
    options::{ClientOptions, FindOptions},
};
use tracing::{debug, info};

use docquery_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::ID_FIELD,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, Query},
    results::UpdateResult,
    update::{Update, UpdateScope},
};

use crate::{query::MongoQueryTranslator, update::MongoUpdateTranslator};

const DUPLICATE_KEY: i32 = 11000;
const NAMESPACE_NOT_FOUND: i32 = 26;
/// BadValue, TypeMismatch, PathNotViable, ConflictingUpdateOperators
const REJECTED_UPDATE: [i32; 4] = [2, 14, 28, 40];

/// A [`StoreBackend`] that delegates every operation to a MongoDB server.
///
/// Collections live in a single database. Filters and updates are
/// translated to the server's query language; sort ties follow the server's
/// natural order.
#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    /// Wraps an already connected client. No ping is sent.
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    /// Starts a [`MongoDbStoreBuilder`] for the given connection string and database.
    pub fn builder(uri: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(uri, database)
    }

    /// The database all collections live in.
    pub fn database(&self) -> &str {
        &self.database
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }
}

/// Index of the first document rejected for a duplicate `_id`, if that is why the write failed.
fn duplicate_key_index(error: &MongoError) -> Option<usize> {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY => Some(0),
        ErrorKind::InsertMany(InsertManyError { write_errors: Some(write_errors), .. }) => write_errors
            .iter()
            .find(|write_error| write_error.code == DUPLICATE_KEY)
            .map(|write_error| write_error.index),
        _ => None,
    }
}

fn write_error_code(error: &MongoError) -> Option<i32> {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => Some(write_error.code),
        ErrorKind::Command(command_error) => Some(command_error.code),
        _ => None,
    }
}

fn backend_error(error: MongoError) -> DocumentStoreError {
    DocumentStoreError::Backend(error.to_string())
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_documents(&self, documents: Vec<Document>, collection: &str) -> DocumentStoreResult<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let ids = documents
            .iter()
            .map(|document| document.get(ID_FIELD).cloned().unwrap_or(Bson::Null))
            .collect::<Vec<_>>();

        self.get_collection(collection)
            .insert_many(documents)
            .ordered(true)
            .await
            .map_err(|e| match duplicate_key_index(&e) {
                Some(index) => DocumentStoreError::DuplicateKey(
                    ids.get(index).cloned().unwrap_or(Bson::Null).to_string(),
                    collection.to_string(),
                ),
                None => backend_error(e),
            })?;

        debug!(collection, count = ids.len(), "inserted into mongodb");

        Ok(())
    }

    async fn find_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        // MongoDB reads a limit of 0 as "no limit"
        if query.limit == Some(0) {
            return Ok(vec![]);
        }

        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(limit as i64);
        }
        if let Some(skip) = query.skip {
            options.skip = Some(skip as u64);
        }
        if let Some(sort) = &query.sort {
            options.sort = Some(MongoQueryTranslator::sort(sort));
        }
        if let Some(projection) = &query.projection {
            options.projection = Some(MongoQueryTranslator::projection(projection));
        }

        self.get_collection(collection)
            .find(MongoQueryTranslator::filter(query.filter.as_ref())?)
            .with_options(options)
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)
    }

    async fn count_documents(&self, filter: Option<Expr>, collection: &str) -> DocumentStoreResult<u64> {
        self.get_collection(collection)
            .count_documents(MongoQueryTranslator::filter(filter.as_ref())?)
            .await
            .map_err(backend_error)
    }

    async fn update_documents(
        &self,
        filter: Expr,
        update: Update,
        scope: UpdateScope,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        let filter = MongoQueryTranslator::filter(Some(&filter))?;
        let update = MongoUpdateTranslator::translate(&update)?;
        let target = self.get_collection(collection);

        let result = match scope {
            UpdateScope::One => target.update_one(filter, update).await,
            UpdateScope::Many => target.update_many(filter, update).await,
        }
        .map_err(|e| match write_error_code(&e) {
            Some(code) if REJECTED_UPDATE.contains(&code) => DocumentStoreError::InvalidOperation(e.to_string()),
            _ => backend_error(e),
        })?;

        Ok(UpdateResult::new(result.matched_count, result.modified_count))
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        match self.get_collection(name).drop().await {
            Err(e) if write_error_code(&e) != Some(NAMESPACE_NOT_FOUND) => Err(backend_error(e)),
            _ => Ok(()),
        }
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        let mut names = self.client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(backend_error)?;

        names.sort();

        Ok(names)
    }

    async fn ping(&self) -> DocumentStoreResult<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| DocumentStoreError::NotFound(format!("mongodb is not reachable: {}", e)))?;

        Ok(())
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        info!(database = %self.database, "mongodb client shut down");

        Ok(())
    }
}

pub struct MongoDbStoreBuilder {
    uri: String,
    database: String,
    server_selection_timeout: Option<Duration>,
}

impl MongoDbStoreBuilder {
    /// Creates a builder for `database` on the server at the connection string `uri`.
    pub fn new(uri: &str, database: &str) -> Self {
        Self {
            uri: uri.to_string(),
            database: database.to_string(),
            server_selection_timeout: None,
        }
    }

    /// How long to wait for a reachable server before operations fail.
    pub fn server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    /// Connects and pings the server.
    ///
    /// A malformed URI is [`DocumentStoreError::Initialization`], an unreachable
    /// server is [`DocumentStoreError::NotFound`].
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let mut options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        if self.server_selection_timeout.is_some() {
            options.server_selection_timeout = self.server_selection_timeout;
        }

        let store = MongoDbStore::new(
            Client::with_options(options)
                .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            self.database,
        );

        store.ping().await?;

        info!(database = %store.database, "connected to mongodb");

        Ok(store)
    }
}
