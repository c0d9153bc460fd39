//! Runs against the server named by `DOCQUERY_MONGODB_URI`, or against a
//! throwaway `mongo` container started for each test. Without either (no
//! container engine on the host) the server tests are skipped.

use std::time::Duration;

use bson::{doc, Decimal128, Document};
use testcontainers_modules::{
    mongo::Mongo,
    testcontainers::{runners::AsyncRunner, ContainerAsync},
};

use docquery_core::{
    backend::StoreBackendBuilder,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Filter, Projection, Query, SortDirection},
    results::UpdateResult,
    store::DocumentStore,
    update::Updates,
};
use docquery_mongodb::{MongoDbStore, MongoDbStoreBuilder};

const DATABASE: &str = "docquery_test";
const MONGO_PORT: u16 = 27017;

/// A connected store and, when one was started, the container serving it.
///
/// Dropping the engine removes the container, so a failing test releases it too.
struct Engine {
    store: DocumentStore<MongoDbStore>,
    container: Option<ContainerAsync<Mongo>>,
}

impl Engine {
    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.store.shutdown().await?;

        if let Some(container) = self.container {
            container
                .rm()
                .await
                .map_err(|error| DocumentStoreError::Backend(error.to_string()))?;
        }

        Ok(())
    }
}

async fn connect() -> Option<Engine> {
    let (uri, container) = match std::env::var("DOCQUERY_MONGODB_URI") {
        Ok(uri) => (uri, None),
        Err(_) => {
            let container = match Mongo::default().start().await {
                Ok(container) => container,
                Err(error) => {
                    eprintln!("skipping, no mongo container available: {}", error);
                    return None;
                },
            };
            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(MONGO_PORT).await.unwrap();

            (format!("mongodb://{}:{}", host, port), Some(container))
        },
    };

    let backend = MongoDbStoreBuilder::new(&uri, DATABASE)
        .server_selection_timeout(Duration::from_secs(10))
        .build()
        .await
        .unwrap();

    Some(Engine { store: DocumentStore::new(backend), container })
}

fn catalog() -> Vec<Document> {
    vec![
        doc! { "_id": "Klavier", "preis": 3000, "hersteller": { "name": "Yomoho" } },
        doc! { "_id": "Geige", "preis": 1200 },
        doc! { "_id": "Trompete", "preis": 450, "hersteller": { "name": "Yomoho" }, "schlagworte": ["jazz"] },
        doc! { "_id": "Liederbuch", "preis": 12.99, "seiten": 64, "schlagworte": ["buch"] },
    ]
}

#[tokio::test]
async fn unreachable_server_is_not_found() {
    let result = MongoDbStore::builder("mongodb://127.0.0.1:1", DATABASE)
        .server_selection_timeout(Duration::from_millis(200))
        .build()
        .await;

    assert!(matches!(result, Err(DocumentStoreError::NotFound(_))));
}

#[tokio::test]
async fn queries_run_on_the_server() {
    let Some(engine) = connect().await else { return };
    let store = &engine.store;
    let products = store.collection("queries_run_on_the_server");
    products.drop().await.unwrap();
    products.insert_many(catalog()).await.unwrap();

    let yomoho = products
        .find(
            Query::builder()
                .filter(Filter::and([Filter::eq("hersteller.name", "Yomoho"), Filter::gt("preis", 100)]))
                .sort("preis", SortDirection::Desc)
                .projection(Projection::include(["_id"]))
                .build(),
        )
        .await
        .unwrap();
    let jazz = products.count_documents(Some(Filter::eq("schlagworte", "jazz"))).await.unwrap();

    assert_eq!(yomoho, vec![doc! { "_id": "Klavier" }, doc! { "_id": "Trompete" }]);
    assert_eq!(jazz, 1);

    products.drop().await.unwrap();
    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn duplicate_ids_map_to_duplicate_key() {
    let Some(engine) = connect().await else { return };
    let store = &engine.store;
    let products = store.collection("duplicate_ids_map_to_duplicate_key");
    products.drop().await.unwrap();
    products.insert_many(catalog()).await.unwrap();

    let result = products
        .insert_many(vec![doc! { "_id": "Cello" }, doc! { "_id": "Geige" }, doc! { "_id": "Bratsche" }])
        .await;

    assert!(matches!(result, Err(DocumentStoreError::DuplicateKey(_, _))));
    assert_eq!(products.count_documents(None).await.unwrap(), 5);

    products.drop().await.unwrap();
    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn update_counts_match_memory_semantics() {
    let Some(engine) = connect().await else { return };
    let store = &engine.store;
    let products = store.collection("update_counts_match_memory_semantics");
    products.drop().await.unwrap();
    products.insert_many(catalog()).await.unwrap();

    let tagged = products
        .update_many(Filter::exists("seiten"), Updates::add_to_set("schlagworte", "buch"))
        .await
        .unwrap();
    let repriced = products
        .update_one(Filter::eq("_id", "Klavier"), Updates::set("preis", 3800))
        .await
        .unwrap();
    let rejected = products
        .update_one(Filter::eq("_id", "Liederbuch"), Updates::add_to_set("seiten", 1))
        .await;

    assert_eq!(tagged, UpdateResult::new(1, 0));
    assert_eq!(repriced, UpdateResult::new(1, 1));
    assert!(matches!(rejected, Err(DocumentStoreError::InvalidOperation(_))));

    products.drop().await.unwrap();
    products.drop().await.unwrap();
    assert_eq!(products.count_documents(None).await.unwrap(), 0);
    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn decimal_prices_compare_with_integers() {
    let Some(engine) = connect().await else { return };
    let store = &engine.store;
    let products = store.collection("decimal_prices_compare_with_integers");
    products.drop().await.unwrap();
    products.insert_many(catalog()).await.unwrap();

    let decimal = |text: &str| bson::Bson::Decimal128(text.parse::<Decimal128>().unwrap());
    let repriced = products
        .update_one(Filter::eq("_id", "Klavier"), Updates::set("preis", decimal("3800")))
        .await
        .unwrap();
    let above_100 = products.count_documents(Some(Filter::gt("preis", decimal("100")))).await.unwrap();
    let at_3800 = products.count_documents(Some(Filter::eq("preis", 3800))).await.unwrap();

    assert_eq!(repriced, UpdateResult::new(1, 1));
    assert_eq!(above_100, 3);
    assert_eq!(at_3800, 1);

    products.drop().await.unwrap();
    engine.shutdown().await.unwrap();
}
