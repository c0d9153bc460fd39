#![allow(dead_code)]

use std::ops::Deref;

use bson::Document;
use testcontainers_modules::{
    mongo::Mongo,
    testcontainers::{runners::AsyncRunner, ContainerAsync},
};
use tracing_subscriber::EnvFilter;

use docquery::prelude::*;

const MONGO_PORT: u16 = 27017;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A harness plus the `mongo` container it runs against, if one was started.
///
/// Fields drop in order: the client goes first, then the container is removed.
pub struct Scenario {
    harness: Harness,
    engine: Option<ContainerAsync<Mongo>>,
}

impl Deref for Scenario {
    type Target = Harness;

    fn deref(&self) -> &Harness {
        &self.harness
    }
}

impl Scenario {
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.harness.shutdown().await?;

        if let Some(engine) = self.engine {
            engine
                .rm()
                .await
                .map_err(|error| DocumentStoreError::Backend(error.to_string()))?;
        }

        Ok(())
    }
}

/// Starts a harness for the backend selected by `DOCQUERY_*`.
///
/// With `DOCQUERY_BACKEND=mongodb` and no `DOCQUERY_MONGODB_URI`, a `mongo`
/// container is started for the scenario. Against MongoDB each scenario gets
/// its own collection so tests can run in parallel.
pub async fn start(scenario: &str) -> Scenario {
    init_tracing();

    let wants_mongodb = std::env::var("DOCQUERY_BACKEND").is_ok_and(|backend| backend.trim() == "mongodb");
    let engine = match std::env::var("DOCQUERY_MONGODB_URI") {
        Err(_) if wants_mongodb => Some(Mongo::default().start().await.unwrap()),
        _ => None,
    };

    let engine_uri = match &engine {
        Some(container) => Some(format!(
            "mongodb://{}:{}",
            container.get_host().await.unwrap(),
            container.get_host_port_ipv4(MONGO_PORT).await.unwrap()
        )),
        None => None,
    };

    let mut config = HarnessConfig::from_lookup(|key| match (key, &engine_uri) {
        ("DOCQUERY_MONGODB_URI", Some(uri)) => Some(uri.clone()),
        _ => std::env::var(key).ok(),
    })
    .unwrap();

    if matches!(config.backend, BackendConfig::MongoDb { .. }) {
        config.collection = format!("{}_{}", config.collection, scenario);
    }

    Scenario {
        harness: Harness::start(config).await.unwrap(),
        engine,
    }
}

/// Starts a harness on a fresh in-memory store.
pub async fn start_memory(config: HarnessConfig) -> Harness {
    init_tracing();

    Harness::start(config).await.unwrap()
}

pub fn ids(documents: &[Document]) -> Vec<String> {
    documents
        .iter()
        .map(|document| document.get_str("_id").unwrap().to_string())
        .collect()
}

pub fn sorted_ids(documents: &[Document]) -> Vec<String> {
    let mut ids = ids(documents);
    ids.sort();
    ids
}
