//! Harness configuration.
//!
//! A [`HarnessConfig`] names the backend, the database and collection the
//! scenarios run against, and the fixtures inserted before each scenario.
//! Build one with [`HarnessConfig::builder`] or read it from the environment
//! with [`HarnessConfig::from_env`]:
//!
//! | variable | default |
//! |---|---|
//! | `DOCQUERY_BACKEND` | `memory` (or `mongodb`) |
//! | `DOCQUERY_MONGODB_URI` | required for `mongodb` |
//! | `DOCQUERY_DATABASE` | `onlinemusicshop` |
//! | `DOCQUERY_COLLECTION` | `produkte` |
//! | `DOCQUERY_FIXTURE_DIR` | this crate's `fixtures/` |
//! | `DOCQUERY_FIXTURES` | the product catalog, comma separated |

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use docquery_core::error::{DocumentStoreError, DocumentStoreResult};

use crate::fixture::{DEFAULT_FIXTURES, default_fixture_dir};

pub const DEFAULT_DATABASE: &str = "onlinemusicshop";
pub const DEFAULT_COLLECTION: &str = "produkte";

/// Which engine the harness runs against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// The in-memory reference engine.
    #[default]
    Memory,
    /// A MongoDB server reachable at `uri`.
    MongoDb {
        uri: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub backend: BackendConfig,
    pub database: String,
    pub collection: String,
    pub fixture_dir: PathBuf,
    pub fixtures: Vec<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            fixture_dir: default_fixture_dir(),
            fixtures: DEFAULT_FIXTURES.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl HarnessConfig {
    pub fn builder() -> HarnessConfigBuilder {
        HarnessConfigBuilder::default()
    }

    /// Reads the configuration from `DOCQUERY_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Initialization`] for an unknown backend name,
    /// or for `mongodb` without `DOCQUERY_MONGODB_URI`.
    pub fn from_env() -> DocumentStoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`HarnessConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DocumentStoreResult<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut builder = HarnessConfig::builder();

        match var("DOCQUERY_BACKEND").as_deref().map(str::trim) {
            None | Some("memory") => {},
            Some("mongodb") => {
                let uri = var("DOCQUERY_MONGODB_URI").ok_or_else(|| {
                    DocumentStoreError::Initialization(
                        "DOCQUERY_MONGODB_URI must be set for the mongodb backend".to_string(),
                    )
                })?;
                builder = builder.mongodb(uri);
            },
            Some(other) => {
                return Err(DocumentStoreError::Initialization(format!(
                    "unknown backend '{}', expected 'memory' or 'mongodb'",
                    other
                )));
            },
        }

        if let Some(database) = var("DOCQUERY_DATABASE") {
            builder = builder.database(database);
        }
        if let Some(collection) = var("DOCQUERY_COLLECTION") {
            builder = builder.collection(collection);
        }
        if let Some(dir) = var("DOCQUERY_FIXTURE_DIR") {
            builder = builder.fixture_dir(dir);
        }
        if let Some(fixtures) = var("DOCQUERY_FIXTURES") {
            builder = builder.fixtures(
                fixtures
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty()),
            );
        }

        Ok(builder.build())
    }
}

#[derive(Debug, Clone, Default)]
pub struct HarnessConfigBuilder {
    config: HarnessConfig,
}

impl HarnessConfigBuilder {
    pub fn memory(mut self) -> Self {
        self.config.backend = BackendConfig::Memory;
        self
    }

    pub fn mongodb(mut self, uri: impl Into<String>) -> Self {
        self.config.backend = BackendConfig::MongoDb { uri: uri.into() };
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = database.into();
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.config.collection = collection.into();
        self
    }

    pub fn fixture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.fixture_dir = dir.into();
        self
    }

    /// Replaces the fixture list; an empty list starts scenarios from an empty collection.
    pub fn fixtures<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.config.fixtures = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> HarnessConfig {
        self.config
    }
}
