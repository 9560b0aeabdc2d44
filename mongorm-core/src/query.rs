//! Query construction for model lookups.
//!
//! Query conventions:
//!
//! - Keyword filters are merged into the base query document last, so they override
//!   any key of the same name.
//! - An explicit id is validated into an [`Oid`](crate::id::Oid) and stored under `_id`.
//! - When no sort is given, results are ordered by `created` ascending.
//!
//! # Example
//!
//! ```ignore
//! use mongorm::query::{FindQuery, Lookup, SortDirection};
//! use bson::doc;
//!
//! let one = Lookup::by_id("65f1c0ffee00000000000001").filter("active", true);
//!
//! let page = FindQuery::builder()
//!     .query(doc! { "score": { "$gte": 10 } })
//!     .filter("owner", "alice")
//!     .sort("score", SortDirection::Desc)
//!     .skip(20)
//!     .limit(10)
//!     .build();
//! ```

use bson::{Bson, Document, doc};

use crate::{error::MongOrmResult, id::Oid};

/// Field holding a model's creation time; the default sort key.
pub const CREATED_FIELD: &str = "created";

/// Field holding a model's identifier.
pub const ID_FIELD: &str = "_id";

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

impl SortDirection {
    pub fn key_value(&self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// Sort specification for one key.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// A single-document lookup: optional id, base query and keyword filters.
#[derive(Debug, Clone, Default)]
pub struct Lookup {
    id: Option<Bson>,
    query: Document,
    filters: Document,
}

impl Lookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks a document up by its id, given as a hex string or native ObjectId.
    pub fn by_id(id: impl Into<Bson>) -> Self {
        Self::new().id(id)
    }

    pub fn id(mut self, id: impl Into<Bson>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the base filter document.
    pub fn query(mut self, query: Document) -> Self {
        self.query = query;
        self
    }

    /// Adds a keyword equality filter.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Builds the filter document sent to the backend.
    ///
    /// # Errors
    ///
    /// Fails when the id is neither a string nor an ObjectId, or is malformed.
    pub fn into_filter(self) -> MongOrmResult<Document> {
        let mut filter = self.query;

        if let Some(id) = self.id {
            filter.insert(ID_FIELD, Oid::validate(id)?);
        }
        for (field, value) in self.filters {
            filter.insert(field, value);
        }

        Ok(filter)
    }
}

impl From<Oid> for Lookup {
    fn from(id: Oid) -> Self {
        Lookup::by_id(id)
    }
}

impl From<Document> for Lookup {
    fn from(query: Document) -> Self {
        Lookup::new().query(query)
    }
}

/// A multi-document query with sorting and pagination.
#[derive(Debug, Clone, Default)]
pub struct FindQuery {
    pub query: Document,
    pub filters: Document,
    pub sort: Vec<Sort>,
    /// Number of documents to skip; `0` skips nothing.
    pub skip: u64,
    /// Maximum number of documents; `0` means unlimited.
    pub limit: u64,
}

impl FindQuery {
    /// A query matching every document in the collection.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn builder() -> FindQueryBuilder {
        FindQueryBuilder::new()
    }

    /// The base query with keyword filters merged over it.
    pub fn filter_document(&self) -> Document {
        let mut filter = self.query.clone();
        for (field, value) in &self.filters {
            filter.insert(field.clone(), value.clone());
        }
        filter
    }

    /// The sort keys as an ordered `{field: 1 | -1}` document.
    pub fn sort_document(&self) -> Document {
        if self.sort.is_empty() {
            return doc! { CREATED_FIELD: SortDirection::Asc.key_value() };
        }

        self.sort
            .iter()
            .map(|sort| (sort.field.clone(), Bson::Int32(sort.direction.key_value())))
            .collect()
    }

    /// Backend options derived from this query.
    pub fn options(&self) -> FindOptions {
        FindOptions {
            sort: self.sort_document(),
            skip: (self.skip > 0).then_some(self.skip),
            limit: (self.limit > 0).then_some(self.limit),
        }
    }
}

impl From<Document> for FindQuery {
    fn from(query: Document) -> Self {
        FindQuery { query, ..Default::default() }
    }
}

/// Sorting and pagination handed to a backend alongside a filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Document,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct FindQueryBuilder {
    query: FindQuery,
}

impl FindQueryBuilder {
    pub fn new() -> Self {
        FindQueryBuilder { query: FindQuery::default() }
    }

    /// Sets the base filter document.
    pub fn query(mut self, query: Document) -> Self {
        self.query.query = query;
        self
    }

    /// Adds a keyword equality filter.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.query.filters.insert(field.into(), value.into());
        self
    }

    /// Appends a sort key. Keys apply in the order they are added.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort.push(Sort { field: field.into(), direction });
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.query.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = limit;
        self
    }

    pub fn build(self) -> FindQuery {
        self.query
    }
}
