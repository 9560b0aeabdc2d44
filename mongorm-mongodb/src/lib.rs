//! MongoDB backend implementation for mongorm.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait.
//! Every backend method maps onto exactly one driver call; filters, sorts and index
//! keys are passed to the server as built.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! mongorm = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Errors
//!
//! Unique index violations (server code 11000) surface as
//! `MongOrmError::DuplicateDocument`. All other driver errors are wrapped unchanged.
//!
//! # Example
//!
//! ```ignore
//! use mongorm::{backend::StoreBackendBuilder, mongodb::MongoDbStore, prelude::*};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStore::builder("mongodb://localhost:27017", "my_database")
//!         .build()
//!         .await?;
//!
//!     let mut client = Client::new(store);
//!     client.register::<Widget>()?;
//!     client.create_schema().await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongorm_mongodb;

pub mod store;

pub use store::{DUPLICATE_KEY_CODE, MongoDbStore, MongoDbStoreBuilder};
