//! Declarative index descriptors.
//!
//! An [`Index`] describes a single (possibly compound) index on a model's collection.
//! Descriptors are declared alongside the model via [`Model::indexes`](crate::model::Model::indexes)
//! and realized once during schema provisioning with [`Index::create`].
//!
//! # Example
//!
//! ```ignore
//! use mongorm::index::{Index, IndexKind};
//!
//! let by_owner = Index::new("owner")
//!     .compound_with("created", IndexKind::Descending)
//!     .name("owner_recent");
//!
//! let expiring = Index::new("created").expire_after_seconds(3600);
//! ```

use bson::{Bson, Document};
use std::{collections::HashSet, time::Duration};

use crate::{
    backend::StoreBackend,
    collection::Collection,
    error::MongOrmResult,
};

/// The direction or kind of an index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexKind {
    #[default]
    Ascending,
    Descending,
    /// Legacy planar geospatial index.
    Geo2d,
    /// Spherical geospatial index.
    GeoSphere,
    Hashed,
    Text,
}

impl IndexKind {
    /// The value used for this kind in an index key document.
    pub fn key_value(&self) -> Bson {
        match self {
            IndexKind::Ascending => Bson::Int32(1),
            IndexKind::Descending => Bson::Int32(-1),
            IndexKind::Geo2d => Bson::String("2d".to_string()),
            IndexKind::GeoSphere => Bson::String("2dsphere".to_string()),
            IndexKind::Hashed => Bson::String("hashed".to_string()),
            IndexKind::Text => Bson::String("text".to_string()),
        }
    }
}

impl From<IndexKind> for Bson {
    fn from(kind: IndexKind) -> Self {
        kind.key_value()
    }
}

/// Backend-neutral options passed along with an index creation.
///
/// Every field is optional; unset fields fall back to the backend's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexOptions {
    pub name: Option<String>,
    pub comment: Option<String>,
    /// Time-to-live applied to the indexed date field.
    pub expire_after: Option<Duration>,
    pub unique: Option<bool>,
    pub sparse: Option<bool>,
}

impl IndexOptions {
    /// Fills every unset field from `defaults`.
    pub fn or(self, defaults: IndexOptions) -> IndexOptions {
        IndexOptions {
            name: self.name.or(defaults.name),
            comment: self.comment.or(defaults.comment),
            expire_after: self.expire_after.or(defaults.expire_after),
            unique: self.unique.or(defaults.unique),
            sparse: self.sparse.or(defaults.sparse),
        }
    }
}

/// A fully resolved index creation request: ordered keys plus options.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub keys: Document,
    pub options: IndexOptions,
}

impl IndexDefinition {
    /// The explicit name, or the conventional `field_dir` name derived from the keys.
    pub fn resolved_name(&self) -> String {
        match &self.options.name {
            Some(name) => name.clone(),
            None => self
                .keys
                .iter()
                .map(|(field, value)| match value {
                    Bson::String(s) => format!("{field}_{s}"),
                    Bson::Int32(n) => format!("{field}_{n}"),
                    Bson::Int64(n) => format!("{field}_{n}"),
                    other => format!("{field}_{other}"),
                })
                .collect::<Vec<_>>()
                .join("_"),
        }
    }
}

/// An immutable description of one index.
///
/// Defaults: ascending, not unique, sparse, no expiry, no compound fields.
/// Indexes are sparse by default so that partially populated fields never block inserts.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    field: String,
    kind: IndexKind,
    unique: bool,
    sparse: bool,
    expire_after_seconds: Option<u64>,
    compound_with: Vec<(String, IndexKind)>,
    name: Option<String>,
    comment: Option<String>,
}

impl Index {
    /// Creates an ascending, sparse, non-unique index on `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: IndexKind::Ascending,
            unique: false,
            sparse: true,
            expire_after_seconds: None,
            compound_with: Vec::new(),
            name: None,
            comment: None,
        }
    }

    pub fn kind(mut self, kind: IndexKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }

    /// Turns the index into a TTL index expiring documents `seconds` after the indexed date.
    pub fn expire_after_seconds(mut self, seconds: u64) -> Self {
        self.expire_after_seconds = Some(seconds);
        self
    }

    /// Appends a secondary key. Keys keep their declaration order.
    pub fn compound_with(mut self, field: impl Into<String>, kind: IndexKind) -> Self {
        self.compound_with.push((field.into(), kind));
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn index_kind(&self) -> IndexKind {
        self.kind
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_sparse(&self) -> bool {
        self.sparse
    }

    pub fn expiry(&self) -> Option<u64> {
        self.expire_after_seconds
    }

    pub fn compound_fields(&self) -> &[(String, IndexKind)] {
        &self.compound_with
    }

    /// The ordered key document: primary field first, then compound fields.
    pub fn keys(&self) -> Document {
        std::iter::once((self.field.clone(), self.kind))
            .chain(self.compound_with.iter().cloned())
            .map(|(field, kind)| (field, kind.key_value()))
            .collect()
    }

    /// Whether the descriptor names a usable set of fields.
    ///
    /// Field names must be non-empty and no field may appear twice.
    pub fn is_well_formed(&self) -> bool {
        let mut seen = HashSet::new();

        std::iter::once(self.field.as_str())
            .chain(self.compound_with.iter().map(|(field, _)| field.as_str()))
            .all(|field| !field.trim().is_empty() && seen.insert(field))
    }

    /// The options carried by this descriptor.
    pub fn options(&self) -> IndexOptions {
        IndexOptions {
            name: self.name.clone(),
            comment: self.comment.clone(),
            expire_after: self.expire_after_seconds.map(Duration::from_secs),
            unique: Some(self.unique),
            sparse: Some(self.sparse),
        }
    }

    /// Resolves the creation request; fields set in `overrides` win over the descriptor's.
    pub fn definition(&self, overrides: IndexOptions) -> IndexDefinition {
        IndexDefinition {
            keys: self.keys(),
            options: overrides.or(self.options()),
        }
    }

    /// Creates this index on `collection`, returning the backend's index name.
    ///
    /// # Errors
    ///
    /// Backend errors, including conflicts with an existing incompatible index, are
    /// returned unchanged.
    pub async fn create<B: StoreBackend>(
        &self,
        collection: &Collection<'_, B>,
        overrides: IndexOptions,
    ) -> MongOrmResult<String> {
        collection
            .create_index(self.definition(overrides))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn defaults() {
        let index = Index::new("name");

        assert_eq!(index.index_kind(), IndexKind::Ascending);
        assert!(!index.is_unique());
        assert!(index.is_sparse());
        assert_eq!(index.expiry(), None);
        assert!(index.compound_fields().is_empty());
        assert_eq!(index.keys(), doc! { "name": 1 });
    }

    #[test]
    fn compound_keys_keep_declaration_order() {
        let index = Index::new("owner")
            .kind(IndexKind::Hashed)
            .compound_with("b", IndexKind::Descending)
            .compound_with("a", IndexKind::Text);

        let keys: Vec<_> = index.keys().into_iter().collect();
        assert_eq!(
            keys,
            vec![
                ("owner".to_string(), Bson::String("hashed".to_string())),
                ("b".to_string(), Bson::Int32(-1)),
                ("a".to_string(), Bson::String("text".to_string())),
            ]
        );
    }

    #[test]
    fn kind_key_values() {
        assert_eq!(IndexKind::Geo2d.key_value(), Bson::String("2d".to_string()));
        assert_eq!(IndexKind::GeoSphere.key_value(), Bson::String("2dsphere".to_string()));
        assert_eq!(Bson::from(IndexKind::Descending), Bson::Int32(-1));
    }

    #[test]
    fn overrides_take_precedence() {
        let index = Index::new("created")
            .unique(true)
            .expire_after_seconds(60)
            .name("created_ttl")
            .comment("expire sessions");

        let definition = index.definition(IndexOptions {
            name: Some("custom".to_string()),
            sparse: Some(false),
            ..Default::default()
        });

        assert_eq!(definition.options.name.as_deref(), Some("custom"));
        assert_eq!(definition.options.sparse, Some(false));
        assert_eq!(definition.options.unique, Some(true));
        assert_eq!(definition.options.expire_after, Some(Duration::from_secs(60)));
        assert_eq!(definition.options.comment.as_deref(), Some("expire sessions"));
    }

    #[test]
    fn resolved_name_follows_key_convention() {
        let definition = Index::new("owner")
            .compound_with("created", IndexKind::Descending)
            .definition(IndexOptions::default());
        assert_eq!(definition.resolved_name(), "owner_1_created_-1");

        let named = Index::new("owner").name("by_owner").definition(IndexOptions::default());
        assert_eq!(named.resolved_name(), "by_owner");
    }

    #[test]
    fn well_formed_checks_fields() {
        assert!(Index::new("a").compound_with("b", IndexKind::Ascending).is_well_formed());
        assert!(!Index::new("").is_well_formed());
        assert!(!Index::new("a").compound_with("a", IndexKind::Descending).is_well_formed());
        assert!(!Index::new("a").compound_with(" ", IndexKind::Descending).is_well_formed());
    }
}
