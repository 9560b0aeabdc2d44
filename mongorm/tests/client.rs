use futures::TryStreamExt;
use mongorm::{
    bson::{DateTime, doc},
    memory::InMemoryStore,
    prelude::*,
};
use serde::{Deserialize, Serialize};

fn widget_indexes() -> Vec<Index> {
    vec![
        Index::new("name").unique(true),
        Index::new("owner").compound_with("created", IndexKind::Descending),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[model(collection = "widgets", indexes = widget_indexes)]
struct Widget {
    #[serde(rename = "_id")]
    id: Oid,
    created: DateTime,
    name: String,
    #[serde(default)]
    owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[model(collection = "notes")]
struct Note {
    #[serde(rename = "_id")]
    id: Oid,
    created: DateTime,
    body: String,
}

fn widget(name: &str, created_millis: i64) -> Widget {
    Widget {
        id: Oid::new(),
        created: DateTime::from_millis(created_millis),
        name: name.to_string(),
        owner: None,
    }
}

async fn client() -> Client<InMemoryStore> {
    let mut client = Client::new(InMemoryStore::builder().build().await.unwrap());
    client.register::<Widget>().unwrap();
    client
}

async fn names(client: &Client<InMemoryStore>, query: FindQuery) -> Vec<String> {
    Widget::find(client, query)
        .await
        .unwrap()
        .try_collect::<Vec<_>>()
        .await
        .unwrap()
        .into_iter()
        .map(|widget| widget.name)
        .collect()
}

#[tokio::test]
async fn save_then_find_by_id_round_trips() {
    let client = client().await;
    let mut saved = widget("sprocket", 1_000);
    saved.owner = Some("bob".to_string());

    saved.save(&client).await.unwrap();

    let found = Widget::find_one(&client, Lookup::by_id(saved.id)).await.unwrap();
    assert_eq!(found, Some(saved.clone()));

    let by_hex = client
        .find_one::<Widget>(Lookup::by_id(saved.id.to_hex()))
        .await
        .unwrap();
    assert_eq!(by_hex, Some(saved));
}

#[tokio::test]
async fn save_is_idempotent() {
    let client = client().await;
    let mut saved = widget("sprocket", 1_000);

    saved.save(&client).await.unwrap();
    saved.name = "cog".to_string();
    saved.save(&client).await.unwrap();

    assert_eq!(client.backend().count("widgets").await, 1);

    let found = Widget::find_one(&client, Lookup::by_id(saved.id)).await.unwrap().unwrap();
    assert_eq!(found.name, "cog");
}

#[tokio::test]
async fn update_of_missing_document_is_not_found() {
    let client = client().await;
    let missing = widget("ghost", 1_000);

    let err = missing.update(&client).await.unwrap_err();

    match err {
        MongOrmError::DocumentNotFound { collection, query } => {
            assert_eq!(collection, "widgets");
            assert_eq!(query, doc! { "_id": missing.id });
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(client.backend().count("widgets").await, 0);
}

#[tokio::test]
async fn update_replaces_existing_document() {
    let client = client().await;
    let mut saved = widget("sprocket", 1_000);
    saved.save(&client).await.unwrap();

    saved.owner = Some("alice".to_string());
    saved.update(&client).await.unwrap();

    let found = Widget::find_one(&client, Lookup::by_id(saved.id)).await.unwrap().unwrap();
    assert_eq!(found.owner.as_deref(), Some("alice"));
}

#[tokio::test]
async fn delete_then_lookup_is_absent() {
    let client = client().await;
    let saved = widget("sprocket", 1_000);
    saved.save(&client).await.unwrap();
    assert!(saved.exists(&client).await.unwrap());

    saved.delete(&client).await.unwrap();

    assert!(!saved.exists(&client).await.unwrap());
    assert_eq!(Widget::find_one(&client, Lookup::by_id(saved.id)).await.unwrap(), None);
    assert!(saved.delete(&client).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn find_and_delete_by_id() {
    let client = client().await;
    let saved = widget("sprocket", 1_000);
    saved.save(&client).await.unwrap();

    Widget::find_and_delete(&client, saved.id.to_hex()).await.unwrap();
    assert_eq!(client.backend().count("widgets").await, 0);

    let err = Widget::find_and_delete(&client, None::<Oid>).await.unwrap_err();
    assert!(matches!(err, MongOrmError::Usage(_)));

    let err = Widget::find_and_delete(&client, "not-an-id").await.unwrap_err();
    assert!(matches!(err, MongOrmError::InvalidId(_)));
}

#[tokio::test]
async fn find_and_delete_by_instance() {
    let client = client().await;
    let saved = widget("sprocket", 1_000);
    saved.save(&client).await.unwrap();

    Widget::find_and_delete(&client, Instance(&saved)).await.unwrap();
    assert_eq!(Widget::find_one(&client, Lookup::by_id(saved.id)).await.unwrap(), None);

    let err = Widget::find_and_delete(&client, Some(Instance(&saved))).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn find_one_with_keyword_filters() {
    let client = client().await;
    let mut owned = widget("sprocket", 1_000);
    owned.owner = Some("bob".to_string());
    owned.save(&client).await.unwrap();
    widget("cog", 2_000).save(&client).await.unwrap();

    let found = Widget::find_one(&client, Lookup::new().filter("owner", "bob"))
        .await
        .unwrap();
    assert_eq!(found.map(|w| w.name), Some("sprocket".to_string()));

    let lookup = Lookup::by_id(owned.id).query(doc! { "name": "cog" });
    assert_eq!(Widget::find_one(&client, lookup).await.unwrap(), None);

    let none = Widget::find_one(&client, Lookup::new().filter("owner", "nobody"))
        .await
        .unwrap();
    assert_eq!(none, None);
}

#[tokio::test]
async fn lookup_rejects_bad_ids() {
    let client = client().await;

    let err = Widget::find_one(&client, Lookup::by_id("xyz")).await.unwrap_err();
    assert!(matches!(err, MongOrmError::InvalidId(_)));

    let err = Widget::find_one(&client, Lookup::by_id(42)).await.unwrap_err();
    assert!(matches!(err, MongOrmError::TypeMismatch { .. }));
}

#[tokio::test]
async fn find_defaults_to_created_ascending() {
    let client = client().await;
    for (name, created) in [("c", 3_000), ("a", 1_000), ("b", 2_000)] {
        widget(name, created).save(&client).await.unwrap();
    }

    assert_eq!(names(&client, FindQuery::all()).await, vec!["a", "b", "c"]);

    let page = FindQuery::builder().skip(1).limit(1).build();
    assert_eq!(names(&client, page).await, vec!["b"]);

    let newest_first = FindQuery::builder().sort("created", SortDirection::Desc).build();
    assert_eq!(names(&client, newest_first).await, vec!["c", "b", "a"]);
}

#[tokio::test]
async fn find_is_restartable() {
    let client = client().await;
    widget("a", 1_000).save(&client).await.unwrap();

    assert_eq!(names(&client, FindQuery::all()).await, vec!["a"]);

    widget("b", 2_000).save(&client).await.unwrap();
    assert_eq!(names(&client, FindQuery::all()).await, vec!["a", "b"]);
}

#[tokio::test]
async fn find_with_filters() {
    let client = client().await;
    for (name, owner, created) in [("a", "bob", 1_000), ("b", "alice", 2_000), ("c", "bob", 3_000)] {
        let mut item = widget(name, created);
        item.owner = Some(owner.to_string());
        item.save(&client).await.unwrap();
    }

    let bobs = FindQuery::builder().filter("owner", "bob").build();
    assert_eq!(names(&client, bobs).await, vec!["a", "c"]);

    let later = FindQuery::builder()
        .query(doc! { "created": { "$gt": DateTime::from_millis(1_500) } })
        .sort("name", SortDirection::Desc)
        .build();
    assert_eq!(names(&client, later).await, vec!["c", "b"]);
}

#[tokio::test]
async fn unique_index_violation_names_collection() {
    let client = client().await;
    assert_eq!(client.create_schema().await.unwrap().len(), 2);

    widget("sprocket", 1_000).save(&client).await.unwrap();
    let err = widget("sprocket", 2_000).save(&client).await.unwrap_err();

    assert!(err.is_duplicate());
    match err {
        MongOrmError::DuplicateDocument { collection, code, .. } => {
            assert_eq!(collection, "widgets");
            assert_eq!(code, Some(mongorm::memory::DUPLICATE_KEY_CODE));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(client.backend().count("widgets").await, 1);
}

#[tokio::test]
async fn unregistered_model_is_missing_configuration() {
    let client = client().await;
    let note = Note {
        id: Oid::new(),
        created: DateTime::now(),
        body: "hello".to_string(),
    };

    let err = note.save(&client).await.unwrap_err();
    assert!(matches!(err, MongOrmError::MissingConfiguration { .. }));

    let err = Note::find_one(&client, Lookup::new()).await.unwrap_err();
    assert!(matches!(err, MongOrmError::MissingConfiguration { .. }));

    let mut client = client;
    let err = client.register_with::<Note>(ModelConfig::new("")).unwrap_err();
    assert!(matches!(err, MongOrmError::MissingConfiguration { .. }));
}

#[tokio::test]
async fn create_schema_skips_models_without_indexes() {
    let mut client = client().await;
    client.register::<Note>().unwrap();

    let created = client.create_schema().await.unwrap();

    assert_eq!(created, vec!["name_1".to_string(), "owner_1_created_-1".to_string()]);
    assert_eq!(client.backend().index_names("widgets").await, created);
    assert!(client.backend().index_names("notes").await.is_empty());

    // Repeating with identical definitions succeeds
    assert_eq!(client.create_schema_for::<Widget>().await.unwrap(), created);
}

#[tokio::test]
async fn register_with_overrides_declared_configuration() {
    let mut client = client().await;
    client
        .register_with::<Widget>(
            ModelConfig::new("gadgets")
                .index(Index::new("name").name("by_name"))
                .index(Index::new(""))
                .index(Index::new("owner").compound_with("owner", IndexKind::Ascending)),
        )
        .unwrap();

    let indexes = Widget::list_indexes(&client).unwrap();
    assert_eq!(indexes.len(), 1);
    assert_eq!(indexes[0].field(), "name");

    assert_eq!(client.create_schema().await.unwrap(), vec!["by_name".to_string()]);

    widget("sprocket", 1_000).save(&client).await.unwrap();
    assert_eq!(client.backend().count("gadgets").await, 1);
    assert_eq!(client.backend().count("widgets").await, 0);
}

#[tokio::test]
async fn stored_document_shape() {
    let client = client().await;
    let saved = widget("sprocket", 1_000);
    saved.save(&client).await.unwrap();

    let document = client
        .collection("widgets")
        .find_one(doc! { "_id": saved.id })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(document.get_object_id("_id").unwrap(), *saved.id.as_object_id());
    assert_eq!(document.get_datetime("created").unwrap(), &saved.created);
    assert!(!document.contains_key("owner"));
}

#[tokio::test]
async fn shutdown_consumes_client() {
    let client = client().await;
    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn widgets_lifecycle() {
    let client = client().await;
    let item = widget("a", 1_000);

    item.save(&client).await.unwrap();

    let found = Widget::find_one(&client, Lookup::by_id(item.id)).await.unwrap().unwrap();
    assert_eq!((found.id, found.name.as_str()), (item.id, "a"));

    item.delete(&client).await.unwrap();
    assert_eq!(Widget::find_one(&client, Lookup::by_id(item.id)).await.unwrap(), None);

    let err = Widget::find_and_delete(&client, item.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn duplicate_name_is_rejected() {
    let client = client().await;
    client.create_schema_for::<Widget>().await.unwrap();

    widget("dup", 1_000).save(&client).await.unwrap();
    let err = widget("dup", 2_000).save(&client).await.unwrap_err();

    assert!(err.is_duplicate());
    assert!(err.to_string().contains("widgets"));
}
