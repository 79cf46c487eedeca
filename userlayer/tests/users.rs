mod common;

use userlayer::{
    bson::{Bson, Document, doc},
    collection::Inserted,
    error::DocumentStoreError,
    memory::InMemoryStore,
    store::DocumentStore,
    user::User,
};

use common::{CountingBackend, seeded_backend};

#[tokio::test]
async fn insert_rejects_missing_and_empty_data_without_touching_backend() {
    let backend = CountingBackend::new();
    let store = DocumentStore::new(backend.clone());
    let users = store.users();

    for data in [Bson::Null, Bson::from("x@y.com"), Bson::Document(doc! {}), Bson::Array(vec![])] {
        let err = users.insert(data.clone()).await.unwrap_err();
        assert!(
            matches!(err, DocumentStoreError::InvalidInsertData(_)),
            "unexpected error for {data:?}: {err:?}"
        );
    }

    assert!(users.insert_one(Bson::Null).await.is_err());
    assert!(users.insert_many(doc! { "email": "x@y.com" }).await.is_err());

    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn insert_rejects_input_without_email_without_touching_backend() {
    let backend = CountingBackend::new();
    let store = DocumentStore::new(backend.clone());

    let err = store.users().insert(doc! { "name": "Nobody" }).await.unwrap_err();

    assert!(matches!(err, DocumentStoreError::InvalidInsertData(_)));
    assert!(err.is_normalization());
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn insert_defaults_and_preserves_auth_strategy() {
    let store = DocumentStore::new(InMemoryStore::new());
    let users = store.users();

    let local = users.insert_one(doc! { "email": "a@b.com" }).await.unwrap();
    let admin = users
        .insert_one(doc! { "email": "c@d.com", "authStrategy": "admin" })
        .await
        .unwrap();

    assert_eq!(local.auth_strategy, "local");
    assert_eq!(admin.auth_strategy, "admin");

    let stored = users.find_one("a@b.com").await.unwrap().unwrap();
    assert_eq!(stored.get_str("authStrategy").unwrap(), "local");
    assert!(stored.get_document("settings").unwrap().is_empty());
    assert!(stored.get_str("createdAt").unwrap().ends_with('Z'));
}

#[tokio::test]
async fn insert_then_find_one_by_string_id() {
    let store = DocumentStore::new(InMemoryStore::new());
    let users = store.users();

    let inserted = users.insert(doc! { "email": "x@y.com" }).await.unwrap();
    assert!(matches!(inserted, Inserted::One(User { ref id, .. }) if id == "x@y.com"));

    let found = users.find_one("x@y.com").await.unwrap().unwrap();

    assert_eq!(found.get_str("id").unwrap(), "x@y.com");
    assert_eq!(found.get_str("authStrategy").unwrap(), "local");
}

#[tokio::test]
async fn insert_many_reports_ids_in_order() {
    let store = DocumentStore::new(InMemoryStore::new());

    let result = store
        .users()
        .insert(vec![doc! { "email": "a@b.com" }, doc! { "email": "c@d.com" }])
        .await
        .unwrap();

    match result {
        Inserted::Many(result) => {
            assert_eq!(result.inserted_ids, vec!["a@b.com".to_string(), "c@d.com".to_string()]);
            assert_eq!(result.count, 2);
        }
        other => panic!("expected a bulk result, got {other:?}"),
    }
}

#[tokio::test]
async fn string_shorthand_targets_the_same_records_as_id_mapping() {
    let store = DocumentStore::new(seeded_backend().await);
    let users = store.users();

    assert_eq!(
        users.find("ada@example.com").await.unwrap(),
        users.find(doc! { "id": "ada@example.com" }).await.unwrap()
    );
    assert_eq!(
        users.update_one(("ada@example.com", doc! { "name": "Ada L." })).await.unwrap(),
        users.update_one((doc! { "id": "ada@example.com" }, doc! { "name": "Ada L." })).await.unwrap()
    );

    let by_string = users.delete_one("ada@example.com").await.unwrap();
    let by_mapping = users.delete_one(doc! { "id": "grace@example.com" }).await.unwrap();
    assert_eq!(by_string.deleted_count, 1);
    assert_eq!(by_mapping.deleted_count, 1);
}

#[tokio::test]
async fn delete_one_on_empty_collection_is_a_no_op_in_both_styles() {
    let store = DocumentStore::new(InMemoryStore::new());
    let users = store.users();

    let awaited = users.delete_one(doc! {}).await;
    let completed = users.delete_one(doc! {}).complete(|result| result).await;

    assert_eq!(awaited.as_ref().map(|r| r.deleted_count), Ok(0));
    assert_eq!(awaited, completed);
    assert_eq!(
        serde_json::to_string(&awaited.unwrap()).unwrap(),
        r#"{"deletedCount":0}"#
    );
}

#[tokio::test]
async fn update_one_changes_exactly_one_of_two_matches() {
    let store = DocumentStore::new(InMemoryStore::new());
    let users = store.users();

    users
        .insert(vec![doc! { "email": "a@b.com" }, doc! { "email": "c@d.com" }])
        .await
        .unwrap();

    let result = users
        .update_one((doc! { "authStrategy": "local" }, doc! { "authStrategy": "admin" }))
        .await
        .unwrap();

    assert_eq!(result.matched_count, 1);
    assert_eq!(result.modified_count, 1);
    assert_eq!(result.upserted_id, None);
    assert_eq!(users.find(doc! { "authStrategy": "admin" }).await.unwrap().len(), 1);
    assert_eq!(users.find(doc! { "authStrategy": "local" }).await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_with_payload_only_applies_to_every_record() {
    let store = DocumentStore::new(seeded_backend().await);
    let users = store.users();

    let result = users.update(doc! { "authStrategy": "google" }).await.unwrap();

    assert_eq!(result.matched_count, 2);
    assert_eq!(result.modified_count, 2);
    assert_eq!(users.find(doc! { "authStrategy": "google" }).await.unwrap().len(), 2);
}

#[tokio::test]
async fn update_one_with_lone_id_matches_without_modifying() {
    let store = DocumentStore::new(InMemoryStore::new());

    let empty = store.users().update_one("ghost@example.com").await.unwrap();
    assert_eq!(empty.matched_count, 0);

    let store = DocumentStore::new(seeded_backend().await);
    let result = store.users().update_one("ada@example.com").await.unwrap();
    assert_eq!(result.matched_count, 1);
    assert_eq!(result.modified_count, 0);
}

#[tokio::test]
async fn delete_with_empty_filter_removes_everything() {
    let store = DocumentStore::new(InMemoryStore::new());
    let users = store.users();

    users
        .insert(vec![doc! { "email": "a@b.com" }, doc! { "email": "c@d.com" }])
        .await
        .unwrap();

    assert_eq!(users.delete(doc! {}).await.unwrap().deleted_count, 2);
    assert!(users.find(()).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_insert_fails_and_keeps_first_record() {
    let store = DocumentStore::new(InMemoryStore::new());
    let users = store.users();

    users.insert_one(doc! { "email": "a@b.com", "name": "First" }).await.unwrap();
    let err = users
        .insert_one(doc! { "email": "a@b.com", "name": "Second" })
        .await
        .unwrap_err();

    assert!(matches!(err, DocumentStoreError::DocumentAlreadyExists(ref id, _) if id == "a@b.com"));
    assert!(!err.is_normalization());

    let stored = users.find_one("a@b.com").await.unwrap().unwrap();
    assert_eq!(stored.get_str("name").unwrap(), "First");
}

#[tokio::test]
async fn find_with_projection_returns_selected_fields() {
    let store = DocumentStore::new(seeded_backend().await);
    let users = store.users();

    let projected = users
        .find((doc! { "id": "ada@example.com" }, doc! { "name": 1 }))
        .await
        .unwrap();
    assert_eq!(projected, vec![doc! { "id": "ada@example.com", "name": "Ada" }]);

    let everyone = users.find((doc! {}, doc! { "name": 1, "id": 0 })).await.unwrap();
    assert_eq!(everyone.len(), 2);
    assert!(everyone.iter().all(|user| user.keys().eq(["name"])));

    let full = users.find((doc! {}, doc! {})).await.unwrap();
    assert!(full.iter().all(|user| user.contains_key("createdAt")));
}

#[tokio::test]
async fn missing_and_empty_filters_match_everything() {
    let store = DocumentStore::new(seeded_backend().await);
    let users = store.users();

    assert_eq!(users.find(()).await.unwrap().len(), 2);
    assert_eq!(users.find(doc! {}).await.unwrap().len(), 2);
    assert_eq!(users.find(None::<Document>).await.unwrap().len(), 2);
    assert!(users.find_one(()).await.unwrap().is_some());
}

#[tokio::test]
async fn find_one_returns_none_when_nothing_matches() {
    let store = DocumentStore::new(seeded_backend().await);

    assert_eq!(store.users().find_one("nobody@example.com").await.unwrap(), None);
}

#[tokio::test]
async fn positional_arguments_are_classified() {
    let backend = CountingBackend::new();
    let store = DocumentStore::new(backend.clone());
    let users = store.users();

    users.insert(doc! { "email": "a@b.com", "name": "Ada" }).await.unwrap();

    let projected = users
        .find(vec![Bson::from("a@b.com"), Bson::Document(doc! { "name": 1 })])
        .await
        .unwrap();
    assert_eq!(projected, vec![doc! { "id": "a@b.com", "name": "Ada" }]);

    let calls = backend.calls();
    let err = users.find(vec![Bson::Int32(42)]).await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidQuery(_)));
    let err = users
        .update(vec![Bson::from("a@b.com"), Bson::from("not a payload")])
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidQuery(_)));
    let err = users
        .find(vec![Bson::Document(doc! { "$where": "true" })])
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidQuery(_)));
    assert_eq!(backend.calls(), calls);

    let literal = users
        .find(vec![Bson::Document(doc! { "id": { "$ne": "" } })])
        .await
        .unwrap();
    assert!(literal.is_empty());

    let removed = users.delete(vec![Bson::Null]).await.unwrap();
    assert_eq!(removed.deleted_count, 1);
}

#[tokio::test]
async fn backend_errors_pass_through_unchanged() {
    let store = DocumentStore::new(seeded_backend().await);

    let err = store
        .users()
        .update_one(("ada@example.com", doc! { "id": "someone-else@example.com" }))
        .await
        .unwrap_err();

    assert!(matches!(err, DocumentStoreError::Backend(_)));
}

#[tokio::test]
async fn dynamic_store_behaves_like_the_static_one() {
    let store = DocumentStore::new(InMemoryStore::new()).into_dyn();
    let users = store.users();

    users.insert(doc! { "email": "a@b.com" }).await.unwrap();
    assert!(users.find_one("a@b.com").await.unwrap().is_some());
    assert_eq!(store.list_collections().await.unwrap(), vec!["users".to_string()]);

    assert!(store.as_static::<InMemoryStore>().is_some());
    let store = store.into_static::<InMemoryStore>().unwrap();
    assert_eq!(store.users().delete(()).await.unwrap().deleted_count, 1);
    store.shutdown().await.unwrap();
}
