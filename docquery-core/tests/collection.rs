use std::sync::Mutex;

use async_trait::async_trait;
use bson::{doc, Bson, Document};

use docquery_core::{
    backend::StoreBackend,
    document::IdStrategy,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, Filter, Query},
    results::UpdateResult,
    store::DocumentStore,
    update::{Update, UpdateScope, Updates},
};

/// Records what reaches the backend so the collection layer can be observed in isolation.
#[derive(Debug, Default)]
struct RecordingBackend {
    inserted: Mutex<Vec<Document>>,
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingBackend {
    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoreBackend for RecordingBackend {
    async fn insert_documents(&self, documents: Vec<Document>, _collection: &str) -> DocumentStoreResult<()> {
        self.calls.lock().unwrap().push("insert");
        self.inserted.lock().unwrap().extend(documents);
        Ok(())
    }

    async fn find_documents(&self, _query: Query, _collection: &str) -> DocumentStoreResult<Vec<Document>> {
        self.calls.lock().unwrap().push("find");
        Ok(self.inserted.lock().unwrap().clone())
    }

    async fn count_documents(&self, _filter: Option<Expr>, _collection: &str) -> DocumentStoreResult<u64> {
        self.calls.lock().unwrap().push("count");
        Ok(self.inserted.lock().unwrap().len() as u64)
    }

    async fn update_documents(
        &self,
        _filter: Expr,
        _update: Update,
        scope: UpdateScope,
        _collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        self.calls.lock().unwrap().push(match scope {
            UpdateScope::One => "update_one",
            UpdateScope::Many => "update_many",
        });
        Ok(UpdateResult::new(1, 1))
    }

    async fn drop_collection(&self, _name: &str) -> DocumentStoreResult<()> {
        self.calls.lock().unwrap().push("drop");
        self.inserted.lock().unwrap().clear();
        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(vec!["produkte".to_string()])
    }
}

#[tokio::test]
async fn insert_one_resolves_id_from_configured_field() {
    let store = DocumentStore::new(RecordingBackend::default());
    let products = store
        .collection("produkte")
        .with_id_strategy(IdStrategy::from_field("name"));

    let result = products
        .insert_one(doc! { "name": "Cembalo", "preis": 9000 })
        .await
        .unwrap();

    assert_eq!(result.inserted_id, Bson::from("Cembalo"));
    assert!(result.acknowledged);

    let inserted = store.backend().inserted.lock().unwrap().clone();
    assert_eq!(inserted, vec![doc! { "_id": "Cembalo", "name": "Cembalo", "preis": 9000 }]);
}

#[tokio::test]
async fn insert_many_reports_ids_in_input_order() {
    let store = DocumentStore::new(RecordingBackend::default());
    let products = store.collection("produkte");

    let result = products
        .insert_many(vec![doc! { "_id": "Klavier" }, doc! { "kategorie": "Noten" }, doc! { "_id": 7 }])
        .await
        .unwrap();

    assert_eq!(result.inserted_ids.len(), 3);
    assert_eq!(result.inserted_ids[0], Bson::from("Klavier"));
    assert!(result.inserted_ids[1].as_str().is_some());
    assert_eq!(result.inserted_ids[2], Bson::Int32(7));
}

#[tokio::test]
async fn empty_batch_never_reaches_backend() {
    let store = DocumentStore::new(RecordingBackend::default());

    let result = store.collection("produkte").insert_many(vec![]).await;

    assert!(matches!(result, Err(DocumentStoreError::InvalidOperation(_))));
    assert!(store.backend().calls().is_empty());
}

#[tokio::test]
async fn malformed_filters_and_updates_never_reach_backend() {
    let store = DocumentStore::new(RecordingBackend::default());
    let products = store.collection("produkte");

    let find = products.find(Query::filtered(Filter::gt("preis", Bson::Null))).await;
    let count = products.count_documents(Some(Filter::or(Vec::new()))).await;
    let update = products.update_one(Filter::eq("_id", "Klavier"), Updates::set("_id", "Cembalo")).await;
    let empty = products.update_many(Filter::exists("seiten"), Update::default()).await;

    assert!(matches!(find, Err(DocumentStoreError::InvalidOperation(_))));
    assert!(matches!(count, Err(DocumentStoreError::InvalidOperation(_))));
    assert!(matches!(update, Err(DocumentStoreError::InvalidOperation(_))));
    assert!(matches!(empty, Err(DocumentStoreError::InvalidOperation(_))));
    assert!(store.backend().calls().is_empty());
}

#[tokio::test]
async fn update_scope_follows_method() {
    let store = DocumentStore::new(RecordingBackend::default());
    let products = store.collection("produkte");

    products.update_one(Filter::eq("_id", "Klavier"), Updates::set("preis", 3800)).await.unwrap();
    products.update_many(Filter::exists("seiten"), Updates::add_to_set("schlagworte", "buch")).await.unwrap();
    products.drop().await.unwrap();

    assert_eq!(store.backend().calls(), vec!["update_one", "update_many", "drop"]);
}

#[tokio::test]
async fn dynamic_store_delegates_to_backend() {
    let store = DocumentStore::new(RecordingBackend::default()).into_dyn();

    store.collection("produkte").insert_one(doc! { "_id": "Geige" }).await.unwrap();

    assert_eq!(store.collection("produkte").count_documents(None).await.unwrap(), 1);
    assert_eq!(store.list_collections().await.unwrap(), vec!["produkte".to_string()]);
    store.shutdown().await.unwrap();
}
