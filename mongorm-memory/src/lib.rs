//! In-memory document storage backend for mongorm.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is meant for development
//! and tests that should not need a running MongoDB server.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Query evaluation** - Equality, comparison, `$in`, `$exists` and logical operators
//! - **Sorting and pagination** - Multi-key sorts with skip and limit
//! - **Unique indexes** - Duplicate keys are rejected with the server's error code
//!
//! # Quick Start
//!
//! ```ignore
//! use mongorm::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let mut client = Client::new(backend);
//!     client.register::<User>()?;
//!
//!     client.save(&User::new("Alice")).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongorm_memory;

pub mod store;
mod evaluator;

pub use store::{DUPLICATE_KEY_CODE, InMemoryStore, InMemoryStoreBuilder};
