//! Main mongorm crate providing a thin object-document mapping layer over MongoDB.
//!
//! This crate is the primary entry point for users of the mongorm project.
//! It re-exports the core types and functionality from the sub-crates and provides
//! convenient access to the storage backends.
//!
//! # Features
//!
//! - **Typed models** - Define models with Serde and `#[derive(Model)]`
//! - **Explicit configuration** - Models are registered with a client at startup
//! - **Declarative indexes** - Single, compound and TTL indexes created on demand
//! - **Multiple backends** - In-memory storage for tests, MongoDB for production
//!
//! # Quick Start
//!
//! ```ignore
//! use mongorm::{prelude::*, memory::InMemoryStore};
//! use serde::{Serialize, Deserialize};
//!
//! fn widget_indexes() -> Vec<Index> {
//!     vec![Index::new("name").unique(true)]
//! }
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Model)]
//! #[model(collection = "widgets", indexes = widget_indexes)]
//! pub struct Widget {
//!     #[serde(rename = "_id")]
//!     pub id: Oid,
//!     pub created: bson::DateTime,
//!     pub name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> MongOrmResult<()> {
//!     let mut client = Client::new(InMemoryStore::builder().build().await?);
//!     client.register::<Widget>()?;
//!     client.create_schema().await?;
//!
//!     let widget = Widget { id: Oid::new(), created: bson::DateTime::now(), name: "a".into() };
//!     widget.save(&client).await?;
//!
//!     let found = Widget::find_one(&client, Lookup::new().filter("name", "a")).await?;
//!     assert_eq!(found.map(|w| w.id), Some(widget.id));
//!
//!     client.shutdown().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - [`mongodb`] - MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use mongorm_core::{backend, client, collection, config, error, id, index, model, query};
pub use mongorm_macros::Model;

// Re-export BSON types for convenience
pub use bson;

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// In-memory storage backend implementations.
pub mod memory {
    pub use mongorm_memory::{DUPLICATE_KEY_CODE, InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use mongorm_mongodb::{DUPLICATE_KEY_CODE, MongoDbStore, MongoDbStoreBuilder};
}

#[cfg(test)]
mod tests {
    use super::VERSION;

    #[test]
    fn version_is_semver() {
        let parts: Vec<&str> = VERSION.split('.').collect();

        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|part| part.parse::<u32>().is_ok()));
    }
}
