//! A thin object-document mapping layer binding typed models to MongoDB collections.
//!
//! This crate is the core of the mongorm project and provides:
//!
//! - **Identifiers** ([`id`]) - Validated ObjectId wrapper accepting strings or native ids
//! - **Index descriptors** ([`index`]) - Declarative single, compound and TTL index definitions
//! - **Model traits** ([`model`]) - The persisted model contract and its conversions
//! - **Model configuration** ([`config`]) - Explicit per-model registration data
//! - **Query types** ([`query`]) - Lookups, filters, sorting and pagination
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Collections** ([`collection`]) - Untyped collection handles
//! - **Client** ([`client`]) - Typed CRUD over registered models
//! - **Error handling** ([`error`]) - Error types and result types
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
//!     fn id(&self) -> Oid {
//!         self.id
//!     }
//!
//!     fn created(&self) -> bson::DateTime {
//!         self.created
//!     }
//!
//!     fn collection_name() -> &'static str {
//!         "widgets"
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongorm_core;

pub mod backend;
pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod id;
pub mod index;
pub mod model;
pub mod query;
