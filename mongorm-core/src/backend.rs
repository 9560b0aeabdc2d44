//! Storage backend abstraction.
//!
//! The [`StoreBackend`] trait is the single seam between the mapping layer and a concrete
//! database. Each method corresponds to exactly one driver call; the mapping layer adds no
//! retries, locking or caching on top of it.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use mongorm::backend::StoreBackend;
//! use bson::doc;
//!
//! let outcome = backend
//!     .replace_one("widgets", doc! { "_id": id }, doc! { "_id": id, "name": "a" }, true)
//!     .await?;
//! assert_eq!(outcome.matched_count, 0);
//! ```

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::stream::BoxStream;
use std::fmt::Debug;

use crate::{
    error::MongOrmResult,
    index::IndexDefinition,
    query::FindOptions,
};

/// A lazy, forward-only stream of raw documents produced by a backend query.
pub type DocumentStream = BoxStream<'static, MongOrmResult<Document>>;

/// Result of a replace operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaceOutcome {
    /// Number of documents that matched the filter.
    pub matched_count: u64,
    /// The id of the inserted document when the replace turned into an insert.
    pub upserted_id: Option<Bson>,
}

/// Abstract interface for document storage backends.
///
/// All implementations must be thread-safe. Concurrent calls are as safe as the
/// underlying driver makes them; callers get no additional synchronization.
///
/// Unique index violations must be reported as
/// [`MongOrmError::DuplicateDocument`](crate::error::MongOrmError::DuplicateDocument).
/// Any other driver error is returned as
/// [`MongOrmError::Backend`](crate::error::MongOrmError::Backend) without alteration.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Returns the first document matching `filter`, or `None`.
    async fn find_one(&self, collection: &str, filter: Document) -> MongOrmResult<Option<Document>>;

    /// Streams every document matching `filter`, honoring sort, skip and limit.
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> MongOrmResult<DocumentStream>;

    /// Replaces the first document matching `filter` with `replacement`.
    ///
    /// When `upsert` is set and nothing matches, `replacement` is inserted instead.
    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> MongOrmResult<ReplaceOutcome>;

    /// Deletes the first document matching `filter`, returning how many were removed.
    async fn delete_one(&self, collection: &str, filter: Document) -> MongOrmResult<u64>;

    /// Creates an index, returning its name.
    async fn create_index(&self, collection: &str, index: IndexDefinition) -> MongOrmResult<String>;

    /// Releases backend resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> MongOrmResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn find_one(&self, collection: &str, filter: Document) -> MongOrmResult<Option<Document>> {
        (**self).find_one(collection, filter).await
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> MongOrmResult<DocumentStream> {
        (**self).find(collection, filter, options).await
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> MongOrmResult<ReplaceOutcome> {
        (**self)
            .replace_one(collection, filter, replacement, upsert)
            .await
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> MongOrmResult<u64> {
        (**self).delete_one(collection, filter).await
    }

    async fn create_index(&self, collection: &str, index: IndexDefinition) -> MongOrmResult<String> {
        (**self).create_index(collection, index).await
    }
}

/// Factory trait for asynchronously building backends.
#[async_trait]
pub trait StoreBackendBuilder: Send + Sync {
    type Backend: StoreBackend;

    /// Builds the backend, connecting to the database if needed.
    async fn build(self) -> MongOrmResult<Self::Backend>;
}
