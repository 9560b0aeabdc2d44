//! The client binding registered models to a storage backend.
//!
//! A [`Client`] owns one backend handle and the [`ModelConfig`] of every model registered
//! with it. Every typed operation resolves its collection from that registry, builds the
//! filter document, issues one backend call and hydrates or maps the result.
//!
//! # Example
//!
//! ```ignore
//! use mongorm::{prelude::*, memory::InMemoryStore};
//!
//! let mut client = Client::new(InMemoryStore::builder().build().await?);
//! client.register::<Widget>()?;
//! client.create_schema().await?;
//!
//! client.save(&widget).await?;
//! let found = client.find_one::<Widget>(Lookup::by_id(widget.id())).await?;
//! ```

use bson::doc;
use futures::{StreamExt, stream::BoxStream};
use std::{any::TypeId, collections::HashMap};
use tracing::{debug, info};

use crate::{
    backend::StoreBackend,
    collection::Collection,
    config::ModelConfig,
    error::{MongOrmError, MongOrmResult},
    id::IntoOid,
    index::{Index, IndexOptions},
    model::{Model, ModelExt},
    query::{FindQuery, ID_FIELD, Lookup},
};

/// A lazy, forward-only stream of hydrated models. Each `find` call produces a new one.
pub type ModelStream<M> = BoxStream<'static, MongOrmResult<M>>;

/// Maps registered models onto collections of a single backend.
#[derive(Debug)]
pub struct Client<B: StoreBackend> {
    backend: B,
    configs: Vec<ModelConfig>,
    registry: HashMap<TypeId, usize>,
}

impl<B: StoreBackend> Client<B> {
    /// Creates a client with no registered models.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            configs: Vec::new(),
            registry: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Registers `M` with the configuration declared by its [`Model`] impl.
    pub fn register<M: Model>(&mut self) -> MongOrmResult<&mut Self> {
        self.register_with::<M>(ModelConfig::of::<M>())
    }

    /// Registers `M` with an explicit configuration, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`MongOrmError::MissingConfiguration`] when the collection name is empty.
    pub fn register_with<M: Model>(&mut self, config: ModelConfig) -> MongOrmResult<&mut Self> {
        config.validate::<M>()?;

        match self.registry.get(&TypeId::of::<M>()) {
            Some(&position) => self.configs[position] = config,
            None => {
                self.registry.insert(TypeId::of::<M>(), self.configs.len());
                self.configs.push(config);
            }
        }

        Ok(self)
    }

    /// The registered configuration of `M`.
    pub fn config<M: Model>(&self) -> MongOrmResult<&ModelConfig> {
        self.registry
            .get(&TypeId::of::<M>())
            .map(|&position| &self.configs[position])
            .ok_or(MongOrmError::MissingConfiguration {
                model: std::any::type_name::<M>(),
            })
    }

    /// An untyped handle on the named collection.
    pub fn collection(&self, name: &str) -> Collection<'_, B> {
        Collection::new(name.to_string(), &self.backend)
    }

    /// The collection `M` is registered against.
    pub fn collection_for<M: Model>(&self) -> MongOrmResult<Collection<'_, B>> {
        Ok(self.collection(self.config::<M>()?.collection()))
    }

    /// The usable index descriptors registered for `M`.
    pub fn list_indexes<M: Model>(&self) -> MongOrmResult<Vec<Index>> {
        Ok(self.config::<M>()?.list_indexes())
    }

    /// Finds one model by id, base query and keyword filters.
    ///
    /// Returns `Ok(None)` when nothing matches.
    pub async fn find_one<M: Model>(&self, lookup: Lookup) -> MongOrmResult<Option<M>> {
        let collection = self.collection_for::<M>()?;
        let filter = lookup.into_filter()?;

        debug!(collection = collection.name(), %filter, "find_one");

        collection
            .find_one(filter)
            .await?
            .map(M::from_document)
            .transpose()
    }

    /// Streams the models matching `query`, sorted by `created` ascending unless a sort is given.
    pub async fn find<M: Model>(&self, query: FindQuery) -> MongOrmResult<ModelStream<M>> {
        let collection = self.collection_for::<M>()?;
        let filter = query.filter_document();
        let options = query.options();

        debug!(collection = collection.name(), %filter, sort = %options.sort, "find");

        Ok(
            collection
                .find(filter, options)
                .await?
                .map(|document| document.and_then(M::from_document))
                .boxed()
        )
    }

    /// Replaces the stored document of `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`MongOrmError::DocumentNotFound`] when no document has the instance's id.
    pub async fn update<M: Model>(&self, instance: &M) -> MongOrmResult<()> {
        let collection = self.collection_for::<M>()?;
        let query = doc! { ID_FIELD: instance.id() };

        debug!(collection = collection.name(), id = %instance.id(), "update");

        let outcome = collection
            .replace_one(query.clone(), instance.to_document()?, false)
            .await?;

        if outcome.matched_count == 0 {
            return Err(MongOrmError::DocumentNotFound {
                collection: collection.name().to_string(),
                query,
            });
        }

        Ok(())
    }

    /// Replaces the stored document of `instance`, inserting it if absent.
    pub async fn save<M: Model>(&self, instance: &M) -> MongOrmResult<()> {
        let collection = self.collection_for::<M>()?;

        debug!(collection = collection.name(), id = %instance.id(), "save");

        collection
            .replace_one(doc! { ID_FIELD: instance.id() }, instance.to_document()?, true)
            .await?;

        Ok(())
    }

    /// Deletes the stored document of `instance`.
    pub async fn delete<M: Model>(&self, instance: &M) -> MongOrmResult<()> {
        self.delete_by_id::<M>(instance.id()).await
    }

    /// Deletes the document of model `M` with the given id.
    ///
    /// # Errors
    ///
    /// - [`MongOrmError::Usage`] when the id is `None`.
    /// - [`MongOrmError::DocumentNotFound`] when nothing was removed.
    pub async fn delete_by_id<M: Model>(&self, id: impl IntoOid) -> MongOrmResult<()> {
        let id = id.into_oid()?;
        let collection = self.collection_for::<M>()?;
        let query = doc! { ID_FIELD: id };

        debug!(collection = collection.name(), %id, "delete");

        if collection.delete_one(query.clone()).await? == 0 {
            return Err(MongOrmError::DocumentNotFound {
                collection: collection.name().to_string(),
                query,
            });
        }

        Ok(())
    }

    /// Creates the declared indexes of every registered model, in registration order.
    ///
    /// Models without indexes are skipped. Returns the names of the created indexes.
    pub async fn create_schema(&self) -> MongOrmResult<Vec<String>> {
        let mut created = Vec::new();

        for config in &self.configs {
            created.extend(self.create_indexes(config).await?);
        }

        Ok(created)
    }

    /// Creates the declared indexes of `M`.
    pub async fn create_schema_for<M: Model>(&self) -> MongOrmResult<Vec<String>> {
        self.create_indexes(self.config::<M>()?).await
    }

    async fn create_indexes(&self, config: &ModelConfig) -> MongOrmResult<Vec<String>> {
        let indexes = config.list_indexes();
        if indexes.is_empty() {
            return Ok(Vec::new());
        }

        let collection = self.collection(config.collection());
        let mut created = Vec::with_capacity(indexes.len());

        for index in indexes {
            let name = index
                .create(&collection, IndexOptions::default())
                .await?;

            info!(collection = collection.name(), index = %name, "Created index");
            created.push(name);
        }

        Ok(created)
    }

    /// Shuts the backend down, consuming the client.
    pub async fn shutdown(self) -> MongOrmResult<()> {
        self.backend.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bson::{DateTime, Document};
    use serde::{Deserialize, Serialize};
    use std::sync::Mutex;

    use crate::{
        backend::{DocumentStream, ReplaceOutcome},
        id::Oid,
        index::IndexDefinition,
        query::FindOptions,
    };

    /// Records every replace call and reports a fixed match count.
    #[derive(Debug, Default)]
    struct RecordingBackend {
        matched_count: u64,
        replaced: Mutex<Vec<(String, Document, bool)>>,
        indexes: Mutex<Vec<(String, IndexDefinition)>>,
    }

    #[async_trait]
    impl StoreBackend for RecordingBackend {
        async fn find_one(&self, _: &str, _: Document) -> MongOrmResult<Option<Document>> {
            Ok(None)
        }

        async fn find(&self, _: &str, _: Document, _: FindOptions) -> MongOrmResult<DocumentStream> {
            Ok(futures::stream::empty::<MongOrmResult<Document>>().boxed())
        }

        async fn replace_one(
            &self,
            collection: &str,
            filter: Document,
            _: Document,
            upsert: bool,
        ) -> MongOrmResult<ReplaceOutcome> {
            self.replaced
                .lock()
                .unwrap()
                .push((collection.to_string(), filter, upsert));

            Ok(ReplaceOutcome {
                matched_count: self.matched_count,
                upserted_id: None,
            })
        }

        async fn delete_one(&self, _: &str, _: Document) -> MongOrmResult<u64> {
            Ok(self.matched_count)
        }

        async fn create_index(&self, collection: &str, index: IndexDefinition) -> MongOrmResult<String> {
            let name = index.resolved_name();
            self.indexes
                .lock()
                .unwrap()
                .push((collection.to_string(), index));
            Ok(name)
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Widget {
        #[serde(rename = "_id")]
        id: Oid,
        created: DateTime,
    }

    impl Model for Widget {
        fn id(&self) -> Oid {
            self.id
        }

        fn created(&self) -> DateTime {
            self.created
        }

        fn collection_name() -> &'static str {
            "widgets"
        }

        fn indexes() -> Vec<Index> {
            vec![Index::new("created").expire_after_seconds(10)]
        }
    }

    fn widget() -> Widget {
        Widget { id: Oid::new(), created: DateTime::now() }
    }

    #[tokio::test]
    async fn update_and_save_differ_only_in_upsert() {
        let mut client = Client::new(RecordingBackend { matched_count: 1, ..Default::default() });
        client.register::<Widget>().unwrap();
        let widget = widget();

        client.update(&widget).await.unwrap();
        client.save(&widget).await.unwrap();

        let replaced = client.backend().replaced.lock().unwrap().clone();
        assert_eq!(
            replaced,
            vec![
                ("widgets".to_string(), doc! { "_id": widget.id }, false),
                ("widgets".to_string(), doc! { "_id": widget.id }, true),
            ]
        );
    }

    #[tokio::test]
    async fn zero_matches_are_not_found() {
        let mut client = Client::new(RecordingBackend::default());
        client.register::<Widget>().unwrap();

        assert!(client.update(&widget()).await.unwrap_err().is_not_found());
        assert!(client.delete(&widget()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn create_schema_passes_descriptor_options() {
        let mut client = Client::new(RecordingBackend::default());
        client.register::<Widget>().unwrap();

        assert_eq!(client.create_schema().await.unwrap(), vec!["created_1".to_string()]);

        let indexes = client.backend().indexes.lock().unwrap().clone();
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].0, "widgets");
        assert_eq!(indexes[0].1.options.expire_after, Some(std::time::Duration::from_secs(10)));
        assert_eq!(indexes[0].1.options.sparse, Some(true));
    }

    #[test]
    fn unregistered_model_is_missing_configuration() {
        let client = Client::new(RecordingBackend::default());

        let err = client.collection_for::<Widget>().unwrap_err();
        assert!(matches!(err, MongOrmError::MissingConfiguration { .. }));
    }
}
