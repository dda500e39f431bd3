use crate::types::{ID_FIELD, RecordId, SerializableDateTime};
use bson::{Bson, Document as BsonDocument};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub created_at: SerializableDateTime,
    pub updated_at: SerializableDateTime,
}

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        let now = SerializableDateTime::now();
        Self { created_at: now, updated_at: now }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub data: BsonDocument,
    pub metadata: Metadata,
}

impl Record {
    #[must_use]
    pub fn new(id: RecordId, data: BsonDocument) -> Self {
        Self { id, data, metadata: Metadata::new() }
    }

    /// Resolves a field for comparison. `id` maps to the identifier; a stored
    /// `Null` reads the same as an absent key.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Cow<'_, Bson>> {
        if name == ID_FIELD {
            return Some(Cow::Owned(self.id.to_bson()));
        }
        match self.data.get(name) {
            None | Some(Bson::Null) => None,
            Some(v) => Some(Cow::Borrowed(v)),
        }
    }

    /// The record as a single document, identifier first.
    #[must_use]
    pub fn to_document(&self) -> BsonDocument {
        let mut out = BsonDocument::new();
        out.insert(ID_FIELD, self.id.to_bson());
        for (k, v) in &self.data {
            out.insert(k.clone(), v.clone());
        }
        out
    }

    /// Overwrites the patched fields, leaving the rest untouched. Returns whether
    /// any stored value changed.
    pub fn merge(&mut self, patch: &BsonDocument) -> bool {
        let mut changed = false;
        for (k, v) in patch {
            let old = self.data.insert(k.clone(), v.clone());
            if old.as_ref() != Some(v) {
                changed = true;
            }
        }
        if changed {
            self.metadata.updated_at = SerializableDateTime::now();
        }
        changed
    }
}
