//! Convenient re-exports of commonly used types from mongorm.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use mongorm::prelude::*;
//! ```
//!
//! This provides access to:
//! - Model traits and the `Model` derive
//! - Identifiers and index descriptors
//! - The client, its configuration and query types
//! - Store backends and builders
//! - Error types

pub use mongorm_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    client::{Client, ModelStream},
    collection::Collection,
    config::ModelConfig,
    id::{IntoOid, Oid},
    index::{Index, IndexKind, IndexOptions},
    model::{Instance, Model, ModelExt, ModelOps},
    query::{FindQuery, Lookup, SortDirection},
    error::{MongOrmError, MongOrmResult},
};
pub use mongorm_macros::Model;
