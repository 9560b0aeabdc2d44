use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use bson::{Bson, Document};
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    error::{Error as DriverError, ErrorKind, WriteFailure},
    options::{
        ClientOptions, CreateIndexOptions, FindOptions as DriverFindOptions,
        IndexOptions as DriverIndexOptions,
    },
};
use tracing::debug;
use mongorm_core::{
    backend::{DocumentStream, ReplaceOutcome, StoreBackend, StoreBackendBuilder},
    error::{MongOrmError, MongOrmResult},
    index::IndexDefinition,
    query::FindOptions,
};

/// Server error code for unique index violations.
pub const DUPLICATE_KEY_CODE: i32 = 11000;


#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    /// The underlying driver client, for operations the mapping layer does not cover.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    async fn shutdown(self) -> MongOrmResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

/// Maps a driver error, reporting unique index violations as duplicates.
fn map_error(collection: &str, err: DriverError) -> MongOrmError {
    let duplicate = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(failure)) if failure.code == DUPLICATE_KEY_CODE => {
            Some((failure.code, failure.details.clone()))
        }
        ErrorKind::Command(failure) if failure.code == DUPLICATE_KEY_CODE => {
            Some((failure.code, None))
        }
        _ => None,
    };

    match duplicate {
        Some((code, detail)) => MongOrmError::DuplicateDocument {
            collection: collection.to_string(),
            code: Some(code),
            detail,
        },
        None => MongOrmError::backend(err),
    }
}

fn find_options(options: FindOptions) -> DriverFindOptions {
    let mut driver_options = DriverFindOptions::default();

    if !options.sort.is_empty() {
        driver_options.sort = Some(options.sort);
    }
    if let Some(skip) = options.skip {
        driver_options.skip = Some(skip);
    }
    if let Some(limit) = options.limit {
        driver_options.limit = Some(i64::try_from(limit).unwrap_or(i64::MAX));
    }

    driver_options
}

fn index_model(index: IndexDefinition) -> (IndexModel, CreateIndexOptions) {
    let mut index_options = DriverIndexOptions::default();
    index_options.name = index.options.name;
    index_options.unique = index.options.unique;
    index_options.sparse = index.options.sparse;
    index_options.expire_after = index.options.expire_after;

    let mut create_options = CreateIndexOptions::default();
    create_options.comment = index.options.comment.map(Bson::String);

    (
        IndexModel::builder()
            .keys(index.keys)
            .options(index_options)
            .build(),
        create_options,
    )
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn find_one(&self, collection: &str, filter: Document) -> MongOrmResult<Option<Document>> {
        self.get_collection(collection)
            .find_one(filter)
            .await
            .map_err(|e| map_error(collection, e))
    }

    async fn find(&self, collection: &str, filter: Document, options: FindOptions) -> MongOrmResult<DocumentStream> {
        Ok(
            self.get_collection(collection)
                .find(filter)
                .with_options(find_options(options))
                .await
                .map_err(|e| map_error(collection, e))?
                .map_err(MongOrmError::backend)
                .boxed()
        )
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> MongOrmResult<ReplaceOutcome> {
        let result = self.get_collection(collection)
            .replace_one(filter, replacement)
            .upsert(upsert)
            .await
            .map_err(|e| map_error(collection, e))?;

        Ok(ReplaceOutcome {
            matched_count: result.matched_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> MongOrmResult<u64> {
        Ok(
            self.get_collection(collection)
                .delete_one(filter)
                .await
                .map_err(|e| map_error(collection, e))?
                .deleted_count
        )
    }

    async fn create_index(&self, collection: &str, index: IndexDefinition) -> MongOrmResult<String> {
        let (model, options) = index_model(index);

        debug!(collection, keys = %model.keys, "Creating index");

        Ok(
            self.get_collection(collection)
                .create_index(model)
                .with_options(options)
                .await
                .map_err(|e| map_error(collection, e))?
                .index_name
        )
    }

    async fn shutdown(self) -> MongOrmResult<()> {
        self.shutdown().await
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> MongOrmResult<Self::Backend> {
        Ok(MongoDbStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| MongOrmError::Initialization(e.to_string()))?,
            )
            .map_err(|e| MongOrmError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}
