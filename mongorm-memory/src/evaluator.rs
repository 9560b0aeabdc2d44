//! Query document evaluation for in-memory filtering and sorting.
//!
//! Supports the subset of the MongoDB query language used by the mapping layer:
//! implicit equality (with array membership), `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`,
//! `$in`, `$nin`, `$exists`, `$not`, and the logical `$and`, `$or` and `$nor`.

use std::cmp::Ordering;
use bson::{Bson, DateTime, Document, oid::ObjectId};

use mongorm_core::error::{MongOrmError, MongOrmResult};


/// Comparable representation of BSON values.
///
/// Integers compare exactly against integers; mixed integer and double comparisons go
/// through f64 so that `1`, `1i64` and `1.0` compare equal.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Int(i64),
    Double(f64),
    String(&'a str),
    Map(Vec<(&'a str, Comparable<'a>)>),
    Array(Vec<Comparable<'a>>),
    ObjectId(ObjectId),
    Bool(bool),
    DateTime(DateTime),
    /// Any other BSON type, compared by raw equality only.
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null | Bson::Undefined => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Double(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<Vec<_>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> Comparable<'a> {
    /// Position in the cross-type sort order.
    fn type_rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Int(_) | Comparable::Double(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::ObjectId(_) => 5,
            Comparable::Bool(_) => 6,
            Comparable::DateTime(_) => 7,
            Comparable::Other(_) => 8,
        }
    }

    /// Total order used for sorting: type rank first, then value.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        self.type_rank()
            .cmp(&other.type_rank())
            .then_with(|| self.partial_cmp(other).unwrap_or(Ordering::Equal))
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Int(a), Comparable::Int(b)) => a == b,
            (Comparable::Double(a), Comparable::Double(b)) => a == b,
            (Comparable::Int(a), Comparable::Double(b)) => (*a as f64) == *b,
            (Comparable::Double(a), Comparable::Int(b)) => *a == (*b as f64),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Int(b)) => a.partial_cmp(b),
            (Comparable::Double(a), Comparable::Double(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Double(b)) => (*a as f64).partial_cmp(b),
            (Comparable::Double(a), Comparable::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves a possibly dotted field path inside a document.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            Bson::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Compares two documents by an ordered `{field: 1 | -1}` sort document.
pub(crate) fn compare_by(sort: &Document, left: &Document, right: &Document) -> Ordering {
    for (field, direction) in sort {
        let a = lookup(left, field).map(Comparable::from).unwrap_or(Comparable::Null);
        let b = lookup(right, field).map(Comparable::from).unwrap_or(Comparable::Null);

        let ordering = match direction {
            Bson::Int32(d) if *d < 0 => b.sort_cmp(&a),
            Bson::Int64(d) if *d < 0 => b.sort_cmp(&a),
            Bson::Double(d) if *d < 0.0 => b.sort_cmp(&a),
            _ => a.sort_cmp(&b),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}


pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Whether the document satisfies every clause of `filter`.
    pub fn matches(&self, filter: &Document) -> MongOrmResult<bool> {
        for (key, condition) in filter {
            let matched = match key.as_str() {
                "$and" => self.all(clauses(key, condition)?)?,
                "$or" => self.any(clauses(key, condition)?)?,
                "$nor" => !self.any(clauses(key, condition)?)?,
                op if op.starts_with('$') => {
                    return Err(MongOrmError::InvalidQuery(format!("unsupported top-level operator {op}")));
                }
                field => self.matches_field(lookup(self.document, field), condition)?,
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        filter: &Document,
    ) -> MongOrmResult<Vec<Document>> {
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::new(document).matches(filter)? {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }

    fn all(&self, filters: Vec<&Document>) -> MongOrmResult<bool> {
        for filter in filters {
            if !self.matches(filter)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn any(&self, filters: Vec<&Document>) -> MongOrmResult<bool> {
        for filter in filters {
            if self.matches(filter)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn matches_field(&self, value: Option<&Bson>, condition: &Bson) -> MongOrmResult<bool> {
        match condition {
            Bson::Document(operators) if is_operator_document(operators) => {
                for (op, operand) in operators {
                    if !self.apply_operator(value, op, operand)? {
                        return Ok(false);
                    }
                }

                Ok(true)
            }
            _ => Ok(equals(value, condition)),
        }
    }

    fn apply_operator(&self, value: Option<&Bson>, op: &str, operand: &Bson) -> MongOrmResult<bool> {
        Ok(match op {
            "$eq" => equals(value, operand),
            "$ne" => !equals(value, operand),
            "$gt" | "$gte" | "$lt" | "$lte" => {
                let Some(value) = value else {
                    return Ok(false);
                };

                candidates(value).any(|candidate| {
                    match Comparable::from(candidate).partial_cmp(&Comparable::from(operand)) {
                        Some(ordering) => match op {
                            "$gt" => ordering == Ordering::Greater,
                            "$gte" => ordering != Ordering::Less,
                            "$lt" => ordering == Ordering::Less,
                            _ => ordering != Ordering::Greater,
                        },
                        None => false,
                    }
                })
            }
            "$in" => operand_array(op, operand)?
                .iter()
                .any(|item| equals(value, item)),
            "$nin" => !operand_array(op, operand)?
                .iter()
                .any(|item| equals(value, item)),
            "$exists" => value.is_some() == truthy(operand),
            "$not" => !self.matches_field(value, operand)?,
            other => return Err(MongOrmError::InvalidQuery(format!("unsupported operator {other}"))),
        })
    }
}

fn clauses<'b>(key: &str, condition: &'b Bson) -> MongOrmResult<Vec<&'b Document>> {
    match condition {
        Bson::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| {
                item.as_document()
                    .ok_or_else(|| MongOrmError::InvalidQuery(format!("{key} entries must be documents")))
            })
            .collect(),
        _ => Err(MongOrmError::InvalidQuery(format!("{key} requires a non-empty array"))),
    }
}

fn operand_array<'b>(op: &str, operand: &'b Bson) -> MongOrmResult<&'b Vec<Bson>> {
    operand
        .as_array()
        .ok_or_else(|| MongOrmError::InvalidQuery(format!("{op} requires an array")))
}

fn is_operator_document(document: &Document) -> bool {
    !document.is_empty() && document.keys().all(|key| key.starts_with('$'))
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

/// The value itself followed by its elements when it is an array.
fn candidates(value: &Bson) -> impl Iterator<Item = &Bson> {
    std::iter::once(value).chain(
        value
            .as_array()
            .map(|items| items.iter())
            .into_iter()
            .flatten(),
    )
}

/// Equality with missing fields treated as null and array fields matching any element.
fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    let expected = Comparable::from(expected);

    match value {
        None => expected == Comparable::Null,
        Some(value) => candidates(value).any(|candidate| Comparable::from(candidate) == expected),
    }
}
