use bson::Bson;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Name under which a record's identifier is exposed to queries.
pub const ID_FIELD: &str = "id";

/// Store-assigned record identifier. Identifiers increase monotonically, so id order
/// is insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl RecordId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The identifier as a query value (an `Int64`, saturating at `i64::MAX`).
    #[must_use]
    pub fn to_bson(self) -> Bson {
        Bson::Int64(i64::try_from(self.0).unwrap_or(i64::MAX))
    }
}

impl From<u64> for RecordId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A wrapper for `chrono::DateTime<Utc>` that serializes as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SerializableDateTime(pub DateTime<Utc>);

impl SerializableDateTime {
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl Serialize for SerializableDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for SerializableDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let dt =
            DateTime::parse_from_rfc3339(&s).map_err(serde::de::Error::custom)?.with_timezone(&Utc);
        Ok(Self(dt))
    }
}
