//! Untyped collection handles.
//!
//! A [`Collection`] pairs a collection name with a backend reference. It works with raw
//! BSON documents and is what index descriptors are realized against; typed access goes
//! through the [`Client`](crate::client::Client).
//!
//! # Example
//!
//! ```ignore
//! use mongorm::index::{Index, IndexOptions};
//!
//! let widgets = client.collection("widgets");
//! Index::new("name").unique(true).create(&widgets, IndexOptions::default()).await?;
//! ```

use bson::Document;

use crate::{
    backend::{DocumentStream, ReplaceOutcome, StoreBackend},
    error::MongOrmResult,
    index::IndexDefinition,
    query::FindOptions,
};

/// A named collection backed by a storage backend.
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    /// Creates a new collection reference (internal use).
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn find_one(&self, filter: Document) -> MongOrmResult<Option<Document>> {
        self.backend
            .find_one(&self.name, filter)
            .await
    }

    pub async fn find(&self, filter: Document, options: FindOptions) -> MongOrmResult<DocumentStream> {
        self.backend
            .find(&self.name, filter, options)
            .await
    }

    pub async fn replace_one(
        &self,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> MongOrmResult<ReplaceOutcome> {
        self.backend
            .replace_one(&self.name, filter, replacement, upsert)
            .await
    }

    pub async fn delete_one(&self, filter: Document) -> MongOrmResult<u64> {
        self.backend
            .delete_one(&self.name, filter)
            .await
    }

    pub async fn create_index(&self, index: IndexDefinition) -> MongOrmResult<String> {
        self.backend
            .create_index(&self.name, index)
            .await
    }
}
