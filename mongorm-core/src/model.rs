//! Model traits binding Rust types to persisted documents.
//!
//! Every persisted type implements [`Model`]: it carries an [`Oid`] stored under `_id`, a
//! creation timestamp stored under `created`, and names the collection it lives in.
//! [`ModelExt`] adds document/JSON conversions and [`ModelOps`] adds the active-record
//! style persistence methods, both through blanket implementations.
//!
//! # Example
//!
//! ```ignore
//! use mongorm::prelude::*;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Widget {
//!     #[serde(rename = "_id")]
//!     pub id: Oid,
//!     pub created: bson::DateTime,
//!     pub name: String,
//! }
//!
//! impl Model for Widget {
//!     fn id(&self) -> Oid { self.id }
//!     fn created(&self) -> bson::DateTime { self.created }
//!     fn collection_name() -> &'static str { "widgets" }
//!     fn indexes() -> Vec<Index> { vec![Index::new("name").unique(true)] }
//! }
//!
//! let widget = Widget { id: Oid::new(), created: bson::DateTime::now(), name: "a".into() };
//! widget.save(&client).await?;
//! assert!(widget.exists(&client).await?);
//! ```

use async_trait::async_trait;
use bson::{Bson, DateTime, Document, de::deserialize_from_bson, ser::serialize_to_bson};
use chrono::{DateTime as ChronoDateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, to_value};

use crate::{
    backend::StoreBackend,
    client::{Client, ModelStream},
    error::{MongOrmError, MongOrmResult},
    id::{IntoOid, Oid},
    index::Index,
    query::{FindQuery, Lookup},
};

/// Core trait that every persisted model implements.
///
/// Implementations serialize the id under `_id` (`#[serde(rename = "_id")]`) and the
/// creation timestamp under `created`. The `#[derive(Model)]` macro writes this impl.
pub trait Model: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// The identifier of this instance.
    fn id(&self) -> Oid;

    /// When this instance was created.
    fn created(&self) -> DateTime;

    /// The collection this model is stored in.
    fn collection_name() -> &'static str;

    /// Index descriptors declared on the model.
    fn indexes() -> Vec<Index> {
        Vec::new()
    }
}

/// Conversion helpers, implemented for every [`Model`].
pub trait ModelExt: Model {
    /// Serializes the model into the persisted document shape.
    ///
    /// Top-level fields holding `None` are omitted.
    fn to_document(&self) -> MongOrmResult<Document>;

    /// Hydrates a model from a persisted document.
    fn from_document(document: Document) -> MongOrmResult<Self>;

    /// Renders the model as JSON: ids as hex strings, datetimes as RFC 3339, nulls omitted.
    fn to_json(&self) -> MongOrmResult<Value>;

    /// The creation timestamp as a chrono value.
    fn created_at(&self) -> ChronoDateTime<Utc>;
}

impl<M: Model> ModelExt for M {
    fn to_document(&self) -> MongOrmResult<Document> {
        match serialize_to_bson(self)? {
            Bson::Document(document) => Ok(
                document
                    .into_iter()
                    .filter(|(_, value)| !matches!(value, Bson::Null))
                    .collect()
            ),
            other => Err(MongOrmError::Serialization(format!(
                "model {} serialized to {:?}, expected a document",
                std::any::type_name::<M>(),
                other.element_type(),
            ))),
        }
    }

    fn from_document(document: Document) -> MongOrmResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(document))?)
    }

    fn to_json(&self) -> MongOrmResult<Value> {
        render_json(serialize_to_bson(self)?)
    }

    fn created_at(&self) -> ChronoDateTime<Utc> {
        self.created().to_chrono()
    }
}

fn render_json(value: Bson) -> MongOrmResult<Value> {
    Ok(match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(dt.to_chrono().to_rfc3339()),
        Bson::Document(document) => Value::Object(
            document
                .into_iter()
                .filter(|(_, value)| !matches!(value, Bson::Null))
                .map(|(key, value)| Ok((key, render_json(value)?)))
                .collect::<MongOrmResult<Map<String, Value>>>()?,
        ),
        Bson::Array(values) => Value::Array(
            values
                .into_iter()
                .map(render_json)
                .collect::<MongOrmResult<Vec<_>>>()?,
        ),
        other => to_value(&other)?,
    })
}

/// Borrows a model instance so it can be passed wherever an id is expected.
///
/// ```ignore
/// Widget::find_and_delete(&client, Instance(&widget)).await?;
/// ```
#[derive(Debug)]
pub struct Instance<'a, M: Model>(pub &'a M);

impl<M: Model> IntoOid for Instance<'_, M> {
    fn into_oid(self) -> MongOrmResult<Oid> {
        Ok(self.0.id())
    }
}

/// Persistence methods available on every [`Model`].
///
/// Each method resolves the model's registered configuration from `client` and fails
/// with [`MongOrmError::MissingConfiguration`] when the model was never registered.
#[async_trait]
pub trait ModelOps: Model {
    /// Updates the stored document or inserts a new one.
    async fn save<B: StoreBackend>(&self, client: &Client<B>) -> MongOrmResult<()>;

    /// Replaces the stored document; fails with `DocumentNotFound` if it does not exist.
    async fn update<B: StoreBackend>(&self, client: &Client<B>) -> MongOrmResult<()>;

    /// Deletes this instance; fails with `DocumentNotFound` if nothing was removed.
    async fn delete<B: StoreBackend>(&self, client: &Client<B>) -> MongOrmResult<()>;

    /// Whether a document with this instance's id is stored.
    async fn exists<B: StoreBackend>(&self, client: &Client<B>) -> MongOrmResult<bool>;

    /// Finds one instance by id, query and keyword filters. Absence is `Ok(None)`.
    async fn find_one<B: StoreBackend>(client: &Client<B>, lookup: Lookup) -> MongOrmResult<Option<Self>>;

    /// Streams the instances matching `query`.
    async fn find<B: StoreBackend>(client: &Client<B>, query: FindQuery) -> MongOrmResult<ModelStream<Self>>;

    /// Deletes the instance with the given id.
    ///
    /// `id` is anything convertible into an [`Oid`]: a hex string, an id, or a model
    /// instance wrapped in [`Instance`]. `None` fails with [`MongOrmError::Usage`].
    async fn find_and_delete<B, I>(client: &Client<B>, id: I) -> MongOrmResult<()>
    where
        B: StoreBackend,
        I: IntoOid + Send;

    /// The index descriptors registered for this model.
    fn list_indexes<B: StoreBackend>(client: &Client<B>) -> MongOrmResult<Vec<Index>>;
}

#[async_trait]
impl<M: Model> ModelOps for M {
    async fn save<B: StoreBackend>(&self, client: &Client<B>) -> MongOrmResult<()> {
        client.save(self).await
    }

    async fn update<B: StoreBackend>(&self, client: &Client<B>) -> MongOrmResult<()> {
        client.update(self).await
    }

    async fn delete<B: StoreBackend>(&self, client: &Client<B>) -> MongOrmResult<()> {
        client.delete(self).await
    }

    async fn exists<B: StoreBackend>(&self, client: &Client<B>) -> MongOrmResult<bool> {
        Ok(
            client
                .find_one::<M>(Lookup::by_id(self.id()))
                .await?
                .is_some()
        )
    }

    async fn find_one<B: StoreBackend>(client: &Client<B>, lookup: Lookup) -> MongOrmResult<Option<Self>> {
        client.find_one::<M>(lookup).await
    }

    async fn find<B: StoreBackend>(client: &Client<B>, query: FindQuery) -> MongOrmResult<ModelStream<Self>> {
        client.find::<M>(query).await
    }

    async fn find_and_delete<B, I>(client: &Client<B>, id: I) -> MongOrmResult<()>
    where
        B: StoreBackend,
        I: IntoOid + Send,
    {
        client.delete_by_id::<M>(id).await
    }

    fn list_indexes<B: StoreBackend>(client: &Client<B>) -> MongOrmResult<Vec<Index>> {
        client.list_indexes::<M>()
    }
}
