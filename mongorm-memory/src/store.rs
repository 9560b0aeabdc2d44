//! In-memory storage implementation for the mapping layer.
//!
//! Collections are kept as insertion-ordered vectors of BSON documents behind an
//! async-safe read-write lock. Unique indexes, including the implicit one on `_id`,
//! are enforced on every write.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use mea::rwlock::RwLock;
use bson::{Bson, Document, doc, oid::ObjectId};
use tracing::debug;

use mongorm_core::{
    backend::{DocumentStream, ReplaceOutcome, StoreBackend, StoreBackendBuilder},
    error::{MongOrmError, MongOrmResult},
    index::IndexDefinition,
    query::{FindOptions, ID_FIELD},
};

use crate::evaluator::{DocumentEvaluator, compare_by, lookup};

/// Error code reported for unique index violations, matching the MongoDB server.
pub const DUPLICATE_KEY_CODE: i32 = 11000;

type StoreMap = HashMap<String, CollectionState>;

#[derive(Debug, Default)]
struct CollectionState {
    documents: Vec<Document>,
    indexes: Vec<(String, IndexDefinition)>,
}

impl CollectionState {
    /// Fails if `candidate` collides with any document other than the one at `replacing`.
    fn check_unique(&self, collection: &str, candidate: &Document, replacing: Option<usize>) -> MongOrmResult<()> {
        let id_index = (ID_FIELD.to_string(), doc! { ID_FIELD: 1 }, false);
        let unique_indexes = self
            .indexes
            .iter()
            .filter(|(_, index)| index.options.unique.unwrap_or(false))
            .map(|(name, index)| (name.clone(), index.keys.clone(), index.options.sparse.unwrap_or(false)));

        for (name, keys, sparse) in std::iter::once(id_index).chain(unique_indexes) {
            let Some(candidate_keys) = index_keys(&keys, candidate, sparse) else {
                continue;
            };

            let conflict = self
                .documents
                .iter()
                .enumerate()
                .filter(|(position, _)| Some(*position) != replacing)
                .filter_map(|(_, existing)| index_keys(&keys, existing, sparse))
                .flatten()
                .find(|existing| candidate_keys.contains(existing));

            if let Some(key) = conflict {
                return Err(MongOrmError::DuplicateDocument {
                    collection: collection.to_string(),
                    code: Some(DUPLICATE_KEY_CODE),
                    detail: Some(doc! {
                        "index": name,
                        "keyPattern": keys,
                        "keyValue": Bson::Array(key),
                    }),
                });
            }
        }

        Ok(())
    }
}

/// The index entries a document contributes, or `None` when a sparse index skips it.
///
/// Array values are indexed per element, so a compound key over array fields yields the
/// cartesian product of their elements.
fn index_keys(keys: &Document, document: &Document, sparse: bool) -> Option<Vec<Vec<Bson>>> {
    let values: Vec<Option<&Bson>> = keys
        .keys()
        .map(|field| lookup(document, field))
        .collect();

    if sparse && values.iter().all(Option::is_none) {
        return None;
    }

    let mut entries: Vec<Vec<Bson>> = vec![Vec::new()];
    for value in values {
        let elements = match value {
            Some(Bson::Array(items)) if !items.is_empty() => items.clone(),
            Some(other) => vec![other.clone()],
            None => vec![Bson::Null],
        };

        entries = entries
            .into_iter()
            .flat_map(|entry| {
                elements.iter().map(move |element| {
                    let mut entry = entry.clone();
                    entry.push(element.clone());
                    entry
                })
            })
            .collect();
    }

    entries.dedup();
    Some(entries)
}


/// Thread-safe in-memory storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// Queries scan every document in a collection; indexes are only used to enforce
/// uniqueness.
///
/// # Example
///
/// ```ignore
/// use mongorm_memory::InMemoryStore;
/// use mongorm::backend::StoreBackend;
/// use bson::doc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///
///     let outcome = store
///         .replace_one("widgets", doc! { "_id": 1 }, doc! { "name": "a" }, true)
///         .await?;
///     assert_eq!(outcome.upserted_id, Some(1.into()));
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection name -> documents and index definitions
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Number of documents stored in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map(|state| state.documents.len())
            .unwrap_or(0)
    }

    /// Names of the indexes created on `collection`, in creation order.
    pub async fn index_names(&self, collection: &str) -> Vec<String> {
        self.store
            .read()
            .await
            .get(collection)
            .map(|state| state.indexes.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn find_one(&self, collection: &str, filter: Document) -> MongOrmResult<Option<Document>> {
        let store = self.store.read().await;
        let Some(state) = store.get(collection) else {
            return Ok(None);
        };

        for document in &state.documents {
            if DocumentEvaluator::new(document).matches(&filter)? {
                return Ok(Some(document.clone()));
            }
        }

        Ok(None)
    }

    async fn find(&self, collection: &str, filter: Document, options: FindOptions) -> MongOrmResult<DocumentStream> {
        let store = self.store.read().await;
        let mut documents = match store.get(collection) {
            Some(state) => DocumentEvaluator::filter_documents(&state.documents, &filter)?,
            None => vec![],
        };

        // Stable sort keeps insertion order between equal keys
        documents.sort_by(|a, b| compare_by(&options.sort, a, b));

        let documents = documents
            .into_iter()
            .skip(options.skip.unwrap_or(0) as usize)
            .take(options.limit.map(|limit| limit as usize).unwrap_or(usize::MAX))
            .map(Ok)
            .collect::<Vec<_>>();

        Ok(stream::iter(documents).boxed())
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> MongOrmResult<ReplaceOutcome> {
        let mut store = self.store.write().await;
        let state = store
            .entry(collection.to_string())
            .or_default();

        let mut matched = None;
        for (position, document) in state.documents.iter().enumerate() {
            if DocumentEvaluator::new(document).matches(&filter)? {
                matched = Some(position);
                break;
            }
        }

        match matched {
            Some(position) => {
                let existing_id = state.documents[position].get(ID_FIELD).cloned();
                let mut replacement = replacement;

                match (replacement.get(ID_FIELD), &existing_id) {
                    (Some(new_id), Some(old_id)) if new_id != old_id => {
                        return Err(MongOrmError::InvalidQuery(format!(
                            "replacement would change the immutable field '_id' from {old_id} to {new_id}"
                        )));
                    }
                    (None, Some(old_id)) => {
                        replacement.insert(ID_FIELD, old_id.clone());
                    }
                    _ => {}
                }

                state.check_unique(collection, &replacement, Some(position))?;
                state.documents[position] = replacement;

                Ok(ReplaceOutcome {
                    matched_count: 1,
                    upserted_id: None,
                })
            }
            None if upsert => {
                let mut replacement = replacement;
                if !replacement.contains_key(ID_FIELD) {
                    let id = match filter.get(ID_FIELD) {
                        Some(id) if !matches!(id, Bson::Document(_)) => id.clone(),
                        _ => Bson::ObjectId(ObjectId::new()),
                    };
                    replacement.insert(ID_FIELD, id);
                }

                state.check_unique(collection, &replacement, None)?;

                let upserted_id = replacement.get(ID_FIELD).cloned();
                debug!(collection, id = ?upserted_id, "Upserted document");
                state.documents.push(replacement);

                Ok(ReplaceOutcome {
                    matched_count: 0,
                    upserted_id,
                })
            }
            None => Ok(ReplaceOutcome::default()),
        }
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> MongOrmResult<u64> {
        let mut store = self.store.write().await;
        let Some(state) = store.get_mut(collection) else {
            return Ok(0);
        };

        for position in 0..state.documents.len() {
            if DocumentEvaluator::new(&state.documents[position]).matches(&filter)? {
                state.documents.remove(position);
                return Ok(1);
            }
        }

        Ok(0)
    }

    async fn create_index(&self, collection: &str, index: IndexDefinition) -> MongOrmResult<String> {
        let mut store = self.store.write().await;
        let state = store
            .entry(collection.to_string())
            .or_default();
        let name = index.resolved_name();

        if let Some((_, existing)) = state.indexes.iter().find(|(existing, _)| existing == &name) {
            if existing == &index {
                return Ok(name);
            }
            return Err(MongOrmError::backend(format!(
                "An existing index has the same name as the requested index: {name} on {collection}"
            )));
        }

        if index.options.unique.unwrap_or(false) {
            let sparse = index.options.sparse.unwrap_or(false);
            let mut seen: Vec<Vec<Bson>> = Vec::new();

            for document in &state.documents {
                let Some(keys) = index_keys(&index.keys, document, sparse) else {
                    continue;
                };
                if let Some(key) = keys.iter().find(|key| seen.contains(key)) {
                    return Err(MongOrmError::DuplicateDocument {
                        collection: collection.to_string(),
                        code: Some(DUPLICATE_KEY_CODE),
                        detail: Some(doc! { "index": name.clone(), "keyValue": Bson::Array(key.clone()) }),
                    });
                }
                seen.extend(keys);
            }
        }

        state.indexes.push((name.clone(), index));

        Ok(name)
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new [`InMemoryStore`] instance.
    ///
    /// This always succeeds and returns a freshly initialized store.
    async fn build(self) -> MongOrmResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
