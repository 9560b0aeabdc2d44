//! Validated document identifiers.
//!
//! [`Oid`] wraps the driver's native [`ObjectId`] and can always be built from either the
//! native value or its 24 character hex encoding. Any other BSON shape is rejected with
//! [`MongOrmError::TypeMismatch`].
//!
//! # Example
//!
//! ```ignore
//! use mongorm::id::Oid;
//!
//! let id = Oid::new();
//! let parsed = Oid::validate(id.to_hex())?;
//! assert_eq!(id, parsed);
//! ```

use bson::{Bson, oid::ObjectId};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
use std::{fmt, str::FromStr};

use crate::error::{MongOrmError, MongOrmResult};

/// The canonical identifier stored under `_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid(ObjectId);

impl Oid {
    /// Generates a fresh identifier.
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// Parses the hex encoding of an identifier.
    pub fn parse_str(value: &str) -> MongOrmResult<Self> {
        ObjectId::parse_str(value)
            .map(Self)
            .map_err(|e| MongOrmError::InvalidId(format!("'{value}': {e}")))
    }

    /// Validates a string or native ObjectId into a canonical identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MongOrmError::TypeMismatch`] for any other BSON type and
    /// [`MongOrmError::InvalidId`] for strings that are not a valid hex encoding.
    pub fn validate(value: impl Into<Bson>) -> MongOrmResult<Self> {
        match value.into() {
            Bson::ObjectId(oid) => Ok(Self(oid)),
            Bson::String(s) => Self::parse_str(&s),
            other => Err(MongOrmError::TypeMismatch {
                found: format!("{:?}", other.element_type()),
            }),
        }
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    pub fn as_object_id(&self) -> &ObjectId {
        &self.0
    }
}

impl Default for Oid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl FromStr for Oid {
    type Err = MongOrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl From<ObjectId> for Oid {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl From<Oid> for ObjectId {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl From<Oid> for Bson {
    fn from(oid: Oid) -> Self {
        Bson::ObjectId(oid.0)
    }
}

impl TryFrom<Bson> for Oid {
    type Error = MongOrmError;

    fn try_from(value: Bson) -> Result<Self, Self::Error> {
        Self::validate(value)
    }
}

impl TryFrom<&str> for Oid {
    type Error = MongOrmError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse_str(value)
    }
}

impl TryFrom<String> for Oid {
    type Error = MongOrmError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_str(&value)
    }
}

impl Serialize for Oid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Oid::validate(Bson::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}

/// Arguments accepted wherever an identifier may be given as a string or a native id.
pub trait IntoOid {
    fn into_oid(self) -> MongOrmResult<Oid>;
}

impl IntoOid for Oid {
    fn into_oid(self) -> MongOrmResult<Oid> {
        Ok(self)
    }
}

impl IntoOid for &Oid {
    fn into_oid(self) -> MongOrmResult<Oid> {
        Ok(*self)
    }
}

impl IntoOid for ObjectId {
    fn into_oid(self) -> MongOrmResult<Oid> {
        Ok(Oid(self))
    }
}

impl IntoOid for &str {
    fn into_oid(self) -> MongOrmResult<Oid> {
        Oid::parse_str(self)
    }
}

impl IntoOid for String {
    fn into_oid(self) -> MongOrmResult<Oid> {
        Oid::parse_str(&self)
    }
}

impl IntoOid for &String {
    fn into_oid(self) -> MongOrmResult<Oid> {
        Oid::parse_str(self)
    }
}

impl IntoOid for Bson {
    fn into_oid(self) -> MongOrmResult<Oid> {
        Oid::validate(self)
    }
}

impl<T: IntoOid> IntoOid for Option<T> {
    fn into_oid(self) -> MongOrmResult<Oid> {
        self.ok_or_else(|| MongOrmError::Usage("an id must be specified when not providing a model instance".to_string()))?
            .into_oid()
    }
}
