mod common;

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tempfile::tempdir;

use docquery::{
    bson::doc,
    fixture::default_fixture_dir,
    prelude::*,
};

#[tokio::test]
async fn setup_inserts_fixtures_in_order() {
    let harness = common::start_memory(HarnessConfig::default()).await;

    let found = harness
        .run(|products| async move { products.find_all().await })
        .await
        .unwrap();

    assert_eq!(
        common::ids(&found),
        vec!["Klavier", "Weihnachtsliederbuch", "Geige", "Stimmgeraet", "Funky Guitar 5", "Trompete"]
    );

    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn teardown_follows_a_successful_scenario() {
    let harness = common::start_memory(HarnessConfig::default()).await;

    harness
        .run(|products| async move {
            products.insert_one(doc! { "_id": "Cello" }).await?;
            products.count_documents(None).await
        })
        .await
        .unwrap();

    assert_eq!(harness.collection().count_documents(None).await.unwrap(), 0);

    // Every run starts from the fixtures again
    let count = harness
        .run(|products| async move { products.count_documents(None).await })
        .await
        .unwrap();
    assert_eq!(count, 6);

    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn teardown_follows_a_panicking_scenario() {
    let harness = common::start_memory(HarnessConfig::default()).await;

    let outcome = AssertUnwindSafe(harness.run(|products| async move {
        let count = products.count_documents(None).await?;
        assert_eq!(count, 0, "scenario sees the fixtures");
        Ok::<_, DocumentStoreError>(count)
    }))
    .catch_unwind()
    .await;

    assert!(outcome.is_err());
    assert_eq!(harness.collection().count_documents(None).await.unwrap(), 0);

    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn harness_survives_a_panicking_scenario() {
    let harness = common::start_memory(HarnessConfig::default()).await;

    let outcome = AssertUnwindSafe(harness.run(|products| async move {
        let count = products.count_documents(None).await?;
        if count == 6 {
            panic!("scenario failed with {} products", count);
        }
        Ok::<_, DocumentStoreError>(count)
    }))
    .catch_unwind()
    .await;
    assert!(outcome.is_err());

    let count = harness
        .run(|products| async move { products.count_documents(None).await })
        .await
        .unwrap();
    assert_eq!(count, 6);

    // Dropping without shutdown releases the store
    drop(harness);
}

#[tokio::test]
async fn scenario_error_is_returned_after_teardown() {
    let harness = common::start_memory(HarnessConfig::default()).await;

    let result = harness
        .run(|products| async move {
            products.insert_one(doc! { "_id": "Geige" }).await
        })
        .await;

    assert!(matches!(result, Err(DocumentStoreError::DuplicateKey(_, _))));
    assert_eq!(harness.collection().count_documents(None).await.unwrap(), 0);

    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn missing_fixture_aborts_the_scenario() {
    let config = HarnessConfig::builder()
        .fixtures(["klavier", "cembalo"])
        .build();
    let harness = common::start_memory(config).await;

    let result = harness
        .run(|products| async move { products.count_documents(None).await })
        .await;

    assert!(matches!(result, Err(DocumentStoreError::NotFound(_))));
    assert_eq!(harness.collection().count_documents(None).await.unwrap(), 0);

    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn empty_fixture_list_starts_empty() {
    let config = HarnessConfig::builder()
        .collection("leer")
        .fixtures(Vec::<String>::new())
        .build();
    let harness = common::start_memory(config).await;

    let count = harness
        .run(|products| async move { products.count_documents(None).await })
        .await
        .unwrap();

    assert_eq!(count, 0);
    assert_eq!(harness.collection().name(), "leer");

    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn fixtures_load_from_a_custom_directory() {
    let dir = tempdir().unwrap();
    std::fs::copy(default_fixture_dir().join("geige.json"), dir.path().join("geige.json")).unwrap();

    let config = HarnessConfig::builder()
        .fixture_dir(dir.path())
        .fixtures(["geige"])
        .build();
    let harness = common::start_memory(config).await;

    let found = harness
        .run(|products| async move { products.find_all().await })
        .await
        .unwrap();

    assert_eq!(common::ids(&found), vec!["Geige"]);

    harness.shutdown().await.unwrap();
}

#[cfg(not(feature = "mongodb"))]
#[tokio::test]
async fn mongodb_backend_requires_the_feature() {
    let config = HarnessConfig::builder()
        .mongodb("mongodb://localhost:27017")
        .build();

    let result = Harness::start(config).await;

    assert!(matches!(result, Err(DocumentStoreError::Initialization(_))));
}
